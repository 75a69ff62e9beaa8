// Biblioteca da assistente virtual Clara (CarGlass)
// Expõe módulos para uso em testes e no binário

pub mod config;
pub mod handlers;
pub mod models;
pub mod services;
pub mod utils;

use services::{ClientDataService, Responder, SessionStore, TwilioService};

/// Estado compartilhado da aplicação.
#[derive(Clone)]
pub struct AppState {
    pub settings: config::Settings,
    pub sessions: SessionStore,
    pub clients: ClientDataService,
    pub responder: Responder,
    pub twilio: Option<TwilioService>,
}
