use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::models::{ChatMessage, ClientRecord, Platform};
use crate::utils::logging::*;

pub const WELCOME_WEB: &str = "Olá! Sou Clara, sua assistente virtual da CarGlass. \
Digite seu CPF, telefone ou placa do veículo para começarmos.";

pub const WELCOME_WHATSAPP: &str = "Olá! 👋 Sou Clara, assistente virtual da CarGlass. \
Me envie seu CPF, telefone, placa do veículo ou número da ordem de serviço para começarmos.";

/// Estado de uma conversa em andamento.
#[derive(Debug, Clone)]
pub struct SessionData {
    pub session_id: String,
    pub created_at: DateTime<Utc>,
    pub last_activity: DateTime<Utc>,
    pub client_identified: bool,
    pub client_record: Option<ClientRecord>,
    pub messages: Vec<ChatMessage>,
    pub platform: Platform,
    pub phone_number: Option<String>,
}

impl SessionData {
    fn new(platform: Platform, phone_number: Option<String>) -> Self {
        let now = Utc::now();
        let welcome = match platform {
            Platform::Web => WELCOME_WEB,
            Platform::Whatsapp => WELCOME_WHATSAPP,
        };
        Self {
            session_id: Uuid::new_v4().to_string(),
            created_at: now,
            last_activity: now,
            client_identified: false,
            client_record: None,
            messages: vec![ChatMessage::assistant(welcome)],
            platform,
            phone_number,
        }
    }
}

/// Armazém de sessões em memória com expiração deslizante.
///
/// Sessões de WhatsApp são indexadas também pelo número de telefone, para
/// que mensagens sucessivas do mesmo contato caiam na mesma conversa.
#[derive(Clone)]
pub struct SessionStore {
    sessions: Arc<RwLock<HashMap<String, SessionData>>>,
    phone_index: Arc<RwLock<HashMap<String, String>>>,
    timeout: Duration,
}

impl SessionStore {
    pub fn new(timeout_secs: u64) -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            phone_index: Arc::new(RwLock::new(HashMap::new())),
            timeout: Duration::seconds(timeout_secs as i64),
        }
    }

    /// Cria uma sessão nova, já semeada com a mensagem de boas-vindas do canal.
    pub async fn create_session(
        &self,
        platform: Platform,
        phone_number: Option<String>,
    ) -> SessionData {
        let session = SessionData::new(platform, phone_number.clone());

        {
            let mut sessions = self.sessions.write().await;
            sessions.insert(session.session_id.clone(), session.clone());
        }
        if let Some(phone) = phone_number {
            let mut index = self.phone_index.write().await;
            index.insert(phone, session.session_id.clone());
        }

        log_session_created(platform.as_str(), &session.session_id);
        self.evict_expired().await;
        session
    }

    /// Busca uma sessão viva. Encontrar a sessão renova `last_activity`
    /// (expiração deslizante); sessões vencidas são removidas na leitura.
    pub async fn get_session(&self, session_id: &str) -> Option<SessionData> {
        if session_id.is_empty() {
            return None;
        }

        let removed = {
            let mut sessions = self.sessions.write().await;
            match sessions.get_mut(session_id) {
                Some(session) if Utc::now() - session.last_activity <= self.timeout => {
                    session.last_activity = Utc::now();
                    return Some(session.clone());
                }
                Some(_) => sessions.remove(session_id),
                None => None,
            }
        };

        if let Some(session) = removed {
            self.drop_phone_index(&session).await;
        }
        None
    }

    /// Recupera a sessão do contato de WhatsApp, criando uma nova se o
    /// contato ainda não tem conversa viva.
    pub async fn get_or_create_whatsapp_session(&self, phone: &str) -> SessionData {
        let existing_id = { self.phone_index.read().await.get(phone).cloned() };
        if let Some(id) = existing_id {
            if let Some(session) = self.get_session(&id).await {
                return session;
            }
        }
        self.create_session(Platform::Whatsapp, Some(phone.to_string())).await
    }

    /// Remove a sessão e, se houver, a entrada do índice por telefone.
    pub async fn remove_session(&self, session_id: &str) {
        let removed = { self.sessions.write().await.remove(session_id) };
        if let Some(session) = removed {
            self.drop_phone_index(&session).await;
        }
    }

    async fn drop_phone_index(&self, session: &SessionData) {
        if let Some(ref phone) = session.phone_number {
            self.phone_index.write().await.remove(phone);
        }
    }

    pub async fn push_message(&self, session_id: &str, role: &str, content: &str) {
        let mut sessions = self.sessions.write().await;
        if let Some(session) = sessions.get_mut(session_id) {
            session.messages.push(ChatMessage::new(role, content));
            session.last_activity = Utc::now();
        }
    }

    /// Marca a sessão como identificada e guarda o registro do cliente.
    /// A transição é de mão única; só o reset recria uma sessão anônima.
    pub async fn set_identified(&self, session_id: &str, record: ClientRecord) {
        let mut sessions = self.sessions.write().await;
        if let Some(session) = sessions.get_mut(session_id) {
            session.client_identified = true;
            session.client_record = Some(record);
            session.last_activity = Utc::now();
        }
    }

    pub async fn messages(&self, session_id: &str) -> Vec<ChatMessage> {
        self.sessions
            .read()
            .await
            .get(session_id)
            .map(|s| s.messages.clone())
            .unwrap_or_default()
    }

    /// Varre e remove sessões paradas há mais que o timeout.
    pub async fn evict_expired(&self) {
        let now = Utc::now();
        let expired: Vec<SessionData> = {
            let mut sessions = self.sessions.write().await;
            let expired_ids: Vec<String> = sessions
                .iter()
                .filter(|(_, s)| now - s.last_activity > self.timeout)
                .map(|(id, _)| id.clone())
                .collect();
            expired_ids
                .iter()
                .filter_map(|id| sessions.remove(id))
                .collect()
        };

        for session in &expired {
            self.drop_phone_index(session).await;
        }
        if !expired.is_empty() {
            log_sessions_evicted(expired.len());
        }
    }

    pub async fn session_count(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn whatsapp_session_count(&self) -> usize {
        self.phone_index.read().await.len()
    }

    #[cfg(test)]
    pub(crate) async fn rewind_activity(&self, session_id: &str, secs: i64) {
        let mut sessions = self.sessions.write().await;
        if let Some(session) = sessions.get_mut(session_id) {
            session.last_activity = session.last_activity - Duration::seconds(secs);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Veiculo;

    fn test_record() -> ClientRecord {
        ClientRecord {
            nome: "Carlos Silva".to_string(),
            cpf: "12345678900".to_string(),
            telefone: "11987654321".to_string(),
            ordem: "ORD12345".to_string(),
            status: "Em andamento".to_string(),
            tipo_servico: "Troca de Parabrisa".to_string(),
            veiculo: Veiculo {
                modelo: "Honda Civic".to_string(),
                placa: "ABC1234".to_string(),
                ano: "2022".to_string(),
            },
        }
    }

    #[tokio::test]
    async fn test_create_session_seeds_welcome() {
        let store = SessionStore::new(1800);
        let session = store.create_session(Platform::Web, None).await;

        assert!(!session.client_identified);
        assert_eq!(session.messages.len(), 1);
        assert_eq!(session.messages[0].role, "assistant");
        assert!(session.messages[0].content.contains("Clara"));
    }

    #[tokio::test]
    async fn test_get_session_before_and_after_timeout() {
        let store = SessionStore::new(1800);
        let session = store.create_session(Platform::Web, None).await;

        assert!(store.get_session(&session.session_id).await.is_some());

        // Simula inatividade além do timeout
        store.rewind_activity(&session.session_id, 3600).await;
        assert!(store.get_session(&session.session_id).await.is_none());
        assert_eq!(store.session_count().await, 0);
    }

    #[tokio::test]
    async fn test_get_session_refreshes_activity() {
        let store = SessionStore::new(1800);
        let session = store.create_session(Platform::Web, None).await;

        // Quase expirada; a leitura renova a janela
        store.rewind_activity(&session.session_id, 1700).await;
        assert!(store.get_session(&session.session_id).await.is_some());
        store.rewind_activity(&session.session_id, 1700).await;
        assert!(store.get_session(&session.session_id).await.is_some());
    }

    #[tokio::test]
    async fn test_whatsapp_session_reuse_by_phone() {
        let store = SessionStore::new(1800);
        let first = store
            .get_or_create_whatsapp_session("whatsapp:+5511999999999")
            .await;
        let second = store
            .get_or_create_whatsapp_session("whatsapp:+5511999999999")
            .await;

        assert_eq!(first.session_id, second.session_id);
        assert_eq!(store.whatsapp_session_count().await, 1);
    }

    #[tokio::test]
    async fn test_remove_session_drops_phone_index() {
        let store = SessionStore::new(1800);
        let session = store
            .get_or_create_whatsapp_session("whatsapp:+5511988888888")
            .await;

        store.remove_session(&session.session_id).await;
        assert_eq!(store.session_count().await, 0);
        assert_eq!(store.whatsapp_session_count().await, 0);

        // Próximo contato do mesmo telefone cria sessão nova
        let fresh = store
            .get_or_create_whatsapp_session("whatsapp:+5511988888888")
            .await;
        assert_ne!(fresh.session_id, session.session_id);
    }

    #[tokio::test]
    async fn test_evict_expired_cleans_both_indexes() {
        let store = SessionStore::new(1800);
        let session = store
            .get_or_create_whatsapp_session("whatsapp:+5511977777777")
            .await;

        store.rewind_activity(&session.session_id, 7200).await;
        store.evict_expired().await;

        assert_eq!(store.session_count().await, 0);
        assert_eq!(store.whatsapp_session_count().await, 0);
    }

    #[tokio::test]
    async fn test_reset_cycle_is_idempotent() {
        // Dois resets seguidos: cada um entrega uma sessão nova só com a
        // mensagem de boas-vindas
        let store = SessionStore::new(1800);
        let mut current = store.create_session(Platform::Web, None).await;

        for _ in 0..2 {
            store.remove_session(&current.session_id).await;
            let fresh = store.create_session(Platform::Web, None).await;

            assert_ne!(fresh.session_id, current.session_id);
            assert_eq!(fresh.messages.len(), 1);
            assert_eq!(fresh.messages[0].content, WELCOME_WEB);
            assert!(!fresh.client_identified);
            current = fresh;
        }
        assert_eq!(store.session_count().await, 1);
    }

    #[tokio::test]
    async fn test_set_identified_keeps_record() {
        let store = SessionStore::new(1800);
        let session = store.create_session(Platform::Web, None).await;

        store.set_identified(&session.session_id, test_record()).await;

        let loaded = store.get_session(&session.session_id).await.unwrap();
        assert!(loaded.client_identified);
        assert_eq!(loaded.client_record.unwrap().nome, "Carlos Silva");
    }
}
