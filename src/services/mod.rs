pub mod cache;
pub mod client_data;
pub mod identifier;
pub mod mock_data;
pub mod openai;
pub mod progress;
pub mod responder;
pub mod session;
pub mod twilio;

pub use cache::MemoryCache;
pub use client_data::ClientDataService;
pub use openai::OpenAiService;
pub use responder::Responder;
pub use session::{SessionData, SessionStore};
pub use twilio::TwilioService;
