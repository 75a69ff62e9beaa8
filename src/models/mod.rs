pub mod client;
pub mod message;

pub use client::{ApiEnvelope, ClientRecord, LookupOutcome, Veiculo};
pub use message::{ChatMessage, Platform};
