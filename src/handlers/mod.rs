pub mod chat;
pub mod health;
pub mod whatsapp;

pub use chat::*;
pub use health::*;
pub use whatsapp::*;
