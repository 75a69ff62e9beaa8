/// Clara - assistente virtual da CarGlass
///
/// Arquitetura:
/// - Widget web conversa por /send_message, com sessão por cookie
/// - WhatsApp entra pelo webhook do Twilio e a resposta sai pela API REST
/// - Identificação por CPF/telefone/placa/ordem, consulta com cache e
///   fallback para dados simulados quando a API real está fora
///
/// Todo o estado vive em memória; reiniciar o processo zera sessões e cache.

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use carglass_clara::config::Settings;
use carglass_clara::handlers::{
    get_messages, health_check, index, reset, send_message, whatsapp_status, whatsapp_webhook,
};
use carglass_clara::services::{ClientDataService, OpenAiService, Responder, SessionStore, TwilioService};
use carglass_clara::utils::logging::*;
use carglass_clara::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Carregar variáveis de ambiente do arquivo .env (se existir)
    if dotenvy::dotenv().is_err() {
        // Em produção não existe .env - variáveis vêm do ambiente
        tracing::debug!("Arquivo .env não encontrado - usando variáveis de ambiente do sistema");
    }

    // Inicializar tracing
    tracing_subscriber::fmt::init();

    // Carregar configurações
    let settings = Settings::new()
        .map_err(|e| anyhow::anyhow!("Falha ao carregar configurações: {}", e))?;

    log_config_loaded(&std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string()));
    log_info(&format!(
        "Modo API: {}",
        if settings.carglass.use_real_api { "REAL" } else { "SIMULAÇÃO" }
    ));

    // OpenAI é opcional: sem chave, perguntas livres usam as frases de fallback
    let openai = settings
        .openai
        .api_key
        .clone()
        .and_then(|key| OpenAiService::new(key, settings.openai.model.clone()));
    if openai.is_none() {
        log_warning("⚠️ OPENAI_API_KEY não configurada. Perguntas livres usarão fallback.");
    }

    // Twilio é opcional: sem credenciais, o canal de WhatsApp fica inativo
    let twilio = match (
        &settings.twilio.account_sid,
        &settings.twilio.auth_token,
        &settings.twilio.whatsapp_number,
    ) {
        (Some(sid), Some(token), Some(number))
            if !sid.is_empty() && !token.is_empty() && !number.is_empty() =>
        {
            log_info("✅ Twilio configurado - canal de WhatsApp ativo");
            Some(TwilioService::new(sid.clone(), token.clone(), number.clone()))
        }
        _ => {
            log_warning("⚠️ Twilio não configurado - endpoints de WhatsApp inativos");
            None
        }
    };

    let app_state = Arc::new(AppState {
        sessions: SessionStore::new(settings.session.timeout_secs),
        clients: ClientDataService::new(&settings),
        responder: Responder::new(openai),
        twilio,
        settings,
    });

    // Limpeza periódica de sessões expiradas e do cache (a cada 60s)
    {
        let state = Arc::clone(&app_state);
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(std::time::Duration::from_secs(60));
            loop {
                interval.tick().await;
                state.sessions.evict_expired().await;
                state.clients.cache_cleanup().await;
            }
        });
    }

    let app = Router::new()
        // Widget web
        .route("/", get(index))
        .route("/get_messages", get(get_messages))
        .route("/send_message", post(send_message))
        .route("/reset", post(reset))

        // Health check
        .route("/health", get(health_check))

        // WhatsApp via Twilio
        .route("/whatsapp/webhook", post(whatsapp_webhook))
        .route("/whatsapp/status", get(whatsapp_status))

        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(Arc::clone(&app_state));

    // No Cloud Run, usar a variável de ambiente PORT
    let port = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse::<u16>().ok())
        .unwrap_or(app_state.settings.server.port);
    let listener =
        TcpListener::bind(format!("{}:{}", app_state.settings.server.host, port)).await?;

    log_server_startup(port);
    log_server_ready(port);

    // Graceful shutdown com signal handling
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    log_info("🛑 Servidor encerrado");
    Ok(())
}

/// Signal handler para graceful shutdown
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            log_info("🛑 Received Ctrl+C, shutting down gracefully...");
        },
        _ = terminate => {
            log_info("🛑 Received SIGTERM, shutting down gracefully...");
        }
    }
}
