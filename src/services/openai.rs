use reqwest::Client;
use serde_json::{json, Value};

use crate::models::ClientRecord;
use crate::utils::logging::*;
use crate::utils::{AppError, AppResult};

const OPENAI_URL: &str = "https://api.openai.com/v1/chat/completions";

/// Respostas a perguntas livres via API da OpenAI, com os dados do cliente
/// embutidos no system prompt. A falha aqui nunca chega ao usuário: o
/// compositor escolhe o fallback pelo `Result`.
#[derive(Clone)]
pub struct OpenAiService {
    client: Client,
    api_key: String,
    model: String,
}

impl OpenAiService {
    pub fn new(api_key: String, model: String) -> Option<Self> {
        if api_key.is_empty() {
            return None;
        }
        log_info(&format!("✅ OpenAI service inicializado (modelo: {})", model));
        Some(Self {
            client: Client::new(),
            api_key,
            model,
        })
    }

    pub async fn answer(&self, pergunta: &str, record: &ClientRecord) -> AppResult<String> {
        let system_message = format!(
            "Você é Clara, assistente virtual da CarGlass. Cliente: {}\n\
             Status: {}\n\
             Serviço: {}\n\n\
             Seja simpática e objetiva. Central: 0800-727-2327",
            record.nome, record.status, record.tipo_servico
        );

        let request_body = json!({
            "model": self.model,
            "messages": [
                {"role": "system", "content": system_message},
                {"role": "user", "content": pergunta}
            ],
            "max_tokens": 150,
            "temperature": 0.7
        });

        let response = self
            .client
            .post(OPENAI_URL)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&request_body)
            .send()
            .await?;

        if !response.status().is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(AppError::OpenAiApi(error_text));
        }

        let json_response: Value = response.json().await?;
        let content = json_response
            .get("choices")
            .and_then(|c| c.get(0))
            .and_then(|choice| choice.get("message"))
            .and_then(|msg| msg.get("content"))
            .and_then(|c| c.as_str())
            .ok_or_else(|| AppError::OpenAiApi("Formato de resposta inesperado".to_string()))?;

        Ok(content.trim().to_string())
    }
}
