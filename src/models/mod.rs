pub mod appointment;
pub mod client;
pub mod conversation;
pub mod hours;
pub mod intent;
pub mod reply;
pub mod service;

pub use appointment::{Appointment, AppointmentStatus};
pub use client::Client;
pub use conversation::{ConversationContext, ConversationState, SlotData};
pub use hours::OpeningHours;
pub use intent::{AgentAction, ClassifiedReply, ExtractedData};
pub use reply::{Choice, Reply};
pub use service::Service;
