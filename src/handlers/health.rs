use axum::extract::State;
use axum::response::Json;
use serde_json::{json, Value};
use std::sync::Arc;

use crate::utils::logging::*;
use crate::AppState;

/// GET /health - contadores de sessão/cache e flags de configuração.
pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<Value> {
    log_health_check();

    Json(json!({
        "status": "healthy",
        "service": "carglass-clara",
        "version": env!("CARGO_PKG_VERSION"),
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "sessions": state.sessions.session_count().await,
        "whatsapp_sessions": state.sessions.whatsapp_session_count().await,
        "cache_items": state.clients.cache_len().await,
        "config": {
            "debug": state.settings.app.debug,
            "use_real_api": state.settings.carglass.use_real_api,
            "openai_configured": state.settings.openai_configured(),
            "twilio_configured": state.settings.twilio.is_configured(),
            "session_timeout_secs": state.settings.session.timeout_secs,
            "cache_ttl_secs": state.settings.carglass.cache_ttl
        }
    }))
}
