use axum::extract::State;
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Json, Response};
use axum::Form;
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::time::Instant;

use crate::services::responder;
use crate::services::twilio::TwilioService;
use crate::utils::logging::*;
use crate::utils::{AppError, AppResult};
use crate::AppState;

const TWIML_EMPTY: &str = r#"<?xml version="1.0" encoding="UTF-8"?><Response></Response>"#;

/// POST /whatsapp/webhook - mensagens recebidas via Twilio.
///
/// O payload chega form-encoded (`From`, `Body`, `MessageSid`). A resposta
/// da Clara sai por fora, pela API REST do Twilio; o corpo HTTP devolvido é
/// sempre um TwiML vazio.
pub async fn whatsapp_webhook(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Form(params): Form<BTreeMap<String, String>>,
) -> Result<Response, AppError> {
    let start_time = Instant::now();
    log_request_received("/whatsapp/webhook", "POST");

    let twilio = state
        .twilio
        .as_ref()
        .ok_or_else(|| AppError::ConfigError("Twilio não configurado".to_string()))?;

    verify_twilio_signature(twilio, &headers, &params)?;

    let from = params
        .get("From")
        .cloned()
        .ok_or_else(|| AppError::ValidationError("Campo 'From' ausente no payload".to_string()))?;
    let body = params
        .get("Body")
        .cloned()
        .ok_or_else(|| AppError::ValidationError("Campo 'Body' ausente no payload".to_string()))?;
    let message_sid = params.get("MessageSid").cloned().unwrap_or_default();

    log_whatsapp_received(&from, &message_sid);

    let session = state.sessions.get_or_create_whatsapp_session(&from).await;
    let messages = responder::process_user_message(
        &state.responder,
        &state.sessions,
        &state.clients,
        &session.session_id,
        &body,
    )
    .await?;

    if let Some(reply) = messages.last().filter(|m| m.role == "assistant") {
        twilio
            .send_whatsapp_message(&from, &reply.content)
            .await
            .map_err(|e| AppError::TwilioApi(e.to_string()))?;
    }

    log_request_processed(
        "/whatsapp/webhook",
        200,
        start_time.elapsed().as_millis() as u64,
    );

    Ok((
        StatusCode::OK,
        [(header::CONTENT_TYPE, "application/xml")],
        TWIML_EMPTY,
    )
        .into_response())
}

/// GET /whatsapp/status - flags de configuração e sessões ativas do canal.
pub async fn whatsapp_status(State(state): State<Arc<AppState>>) -> Json<Value> {
    log_request_received("/whatsapp/status", "GET");

    Json(json!({
        "twilio_configured": state.twilio.is_some(),
        "whatsapp_number": state.settings.twilio.whatsapp_number,
        "active_sessions": state.sessions.whatsapp_session_count().await,
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

fn verify_twilio_signature(
    twilio: &TwilioService,
    headers: &HeaderMap,
    params: &BTreeMap<String, String>,
) -> AppResult<()> {
    let signature = headers
        .get("X-Twilio-Signature")
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| {
            AppError::SignatureError("Header X-Twilio-Signature ausente".to_string())
        })?;

    let url = webhook_url(headers);
    if !twilio.validate_signature(&url, params, signature) {
        log_validation_error("twilio_signature", "Assinatura inválida");
        return Err(AppError::SignatureError(
            "Assinatura do webhook inválida".to_string(),
        ));
    }

    Ok(())
}

/// Reconstrói a URL pública do webhook, como o Twilio a assinou. Atrás do
/// proxy do Cloud Run o esquema vem em X-Forwarded-Proto.
fn webhook_url(headers: &HeaderMap) -> String {
    let proto = headers
        .get("X-Forwarded-Proto")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("https");
    let host = headers
        .get(header::HOST)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("localhost");
    format!("{}://{}/whatsapp/webhook", proto, host)
}
