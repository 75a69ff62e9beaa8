use tracing::{debug, error, info, warn};

pub fn log_request_received(endpoint: &str, method: &str) {
    info!("Request received: {} {}", method, endpoint);
}

pub fn log_request_processed(endpoint: &str, status: u16, duration_ms: u64) {
    info!("Request processed: {} - Status: {} - Duration: {}ms",
          endpoint, status, duration_ms);
}

pub fn log_config_loaded(env: &str) {
    info!("Configuration loaded successfully for environment: {}", env);
}

pub fn log_server_startup(port: u16) {
    info!("🚀 Clara CarGlass assistant starting on port {}", port);
}

pub fn log_server_ready(port: u16) {
    info!("✅ Server ready and listening on http://0.0.0.0:{}", port);
}

pub fn log_health_check() {
    debug!("Health check requested");
}

pub fn log_session_created(platform: &str, session_id: &str) {
    info!("Nova sessão criada ({}): {}", platform, session_id);
}

pub fn log_sessions_evicted(count: usize) {
    info!("🧹 {} sessão(ões) expirada(s) removida(s)", count);
}

pub fn log_identifier_detected(tipo: &str) {
    info!("Identificador detectado: {}", tipo);
}

pub fn log_lookup_fallback(tipo: &str, error: &str) {
    warn!("API CarGlass falhou para consulta por {}, usando dados simulados: {}", tipo, error);
}

pub fn log_whatsapp_received(from: &str, message_sid: &str) {
    info!("📱 Mensagem WhatsApp recebida de {} (sid: {})", from, message_sid);
}

pub fn log_twilio_sent(to: &str) {
    info!("Mensagem enviada com sucesso via Twilio para {}", to);
}

pub fn log_twilio_error(status: u16, error: &str) {
    error!("Twilio API error: Status: {} - Error: {}", status, error);
}

pub fn log_openai_fallback(error: &str) {
    warn!("OpenAI indisponível, usando resposta de fallback: {}", error);
}

pub fn log_intent_matched(name: &str) {
    debug!("Intent matched: {}", name);
}

pub fn log_validation_error(field: &str, message: &str) {
    warn!("Validation error: {} - {}", field, message);
}

pub fn log_info(message: &str) {
    info!("{}", message);
}

pub fn log_error(message: &str) {
    error!("{}", message);
}

pub fn log_warning(message: &str) {
    warn!("{}", message);
}
