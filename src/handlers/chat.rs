use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Json};
use axum::Form;
use axum_extra::extract::cookie::{Cookie, CookieJar};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tokio::time::Instant;

use crate::models::Platform;
use crate::services::responder;
use crate::utils::logging::*;
use crate::utils::text::current_time;
use crate::AppState;

const SESSION_COOKIE: &str = "clara_session";

const APOLOGY: &str =
    "Desculpe, ocorreu um erro. Nossa equipe foi notificada. Tente novamente em instantes.";

#[derive(Debug, Deserialize)]
pub struct SendMessageForm {
    #[serde(default)]
    pub message: String,
}

/// Garante que o navegador tem uma sessão viva, criando sessão e cookie
/// quando necessário. Devolve o jar (possivelmente atualizado) e o id.
async fn ensure_session(state: &AppState, jar: CookieJar) -> (CookieJar, String) {
    if let Some(cookie) = jar.get(SESSION_COOKIE) {
        let id = cookie.value().to_string();
        if state.sessions.get_session(&id).await.is_some() {
            return (jar, id);
        }
    }

    let session = state.sessions.create_session(Platform::Web, None).await;
    let id = session.session_id.clone();
    let jar = jar.add(Cookie::build((SESSION_COOKIE, id.clone())).path("/").build());
    (jar, id)
}

/// GET / - página do widget de chat.
pub async fn index(State(state): State<Arc<AppState>>, jar: CookieJar) -> impl IntoResponse {
    log_request_received("/", "GET");
    let (jar, _session_id) = ensure_session(&state, jar).await;
    (jar, Html(include_str!("../../static/index.html")))
}

/// GET /get_messages - histórico da sessão atual.
pub async fn get_messages(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
) -> impl IntoResponse {
    log_request_received("/get_messages", "GET");
    let (jar, session_id) = ensure_session(&state, jar).await;
    let messages = state.sessions.messages(&session_id).await;
    (jar, Json(json!({ "messages": messages })))
}

/// POST /send_message - processa uma mensagem do usuário e devolve o
/// histórico atualizado. Qualquer falha interna vira um pedido de desculpas
/// genérico com HTTP 500; nada estruturado vaza para o usuário final.
pub async fn send_message(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Form(form): Form<SendMessageForm>,
) -> impl IntoResponse {
    let start_time = Instant::now();
    log_request_received("/send_message", "POST");

    let (jar, session_id) = ensure_session(&state, jar).await;

    match responder::process_user_message(
        &state.responder,
        &state.sessions,
        &state.clients,
        &session_id,
        &form.message,
    )
    .await
    {
        Ok(messages) => {
            log_request_processed("/send_message", 200, start_time.elapsed().as_millis() as u64);
            (StatusCode::OK, jar, Json(json!({ "messages": messages })))
        }
        Err(e) => {
            log_error(&format!("Erro ao processar mensagem: {}", e));
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                jar,
                Json(json!({
                    "error": "Erro ao processar mensagem",
                    "messages": [{
                        "role": "assistant",
                        "content": APOLOGY,
                        "time": current_time()
                    }]
                })),
            )
        }
    }
}

/// POST /reset - descarta a sessão atual e recria uma nova, só com a
/// mensagem de boas-vindas. Chamadas repetidas têm o mesmo efeito.
pub async fn reset(State(state): State<Arc<AppState>>, jar: CookieJar) -> impl IntoResponse {
    log_request_received("/reset", "POST");

    if let Some(cookie) = jar.get(SESSION_COOKIE) {
        state.sessions.remove_session(cookie.value()).await;
    }

    let session = state.sessions.create_session(Platform::Web, None).await;
    let jar = jar.add(
        Cookie::build((SESSION_COOKIE, session.session_id.clone()))
            .path("/")
            .build(),
    );
    (jar, Json(json!({ "messages": session.messages })))
}
