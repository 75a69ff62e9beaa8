use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use hmac::{Hmac, Mac};
use reqwest::Client;
use sha1::Sha1;
use std::collections::BTreeMap;

use crate::utils::logging::*;

#[derive(Debug, thiserror::Error)]
pub enum TwilioError {
    #[error("Twilio HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Twilio API error: HTTP {status} - {body}")]
    Api { status: u16, body: String },
    #[error("invalid auth token: {0}")]
    InvalidKey(String),
}

/// Cliente mínimo da API REST do Twilio para mensagens de WhatsApp.
/// A resposta ao webhook vai por fora (REST), nunca dentro do TwiML.
#[derive(Clone)]
pub struct TwilioService {
    client: Client,
    account_sid: String,
    auth_token: String,
    whatsapp_number: String,
}

impl TwilioService {
    pub fn new(account_sid: String, auth_token: String, whatsapp_number: String) -> Self {
        // Aceita o número com ou sem o prefixo "whatsapp:"
        let whatsapp_number = if whatsapp_number.starts_with("whatsapp:") {
            whatsapp_number
        } else {
            format!("whatsapp:{}", whatsapp_number)
        };
        Self {
            client: Client::new(),
            account_sid,
            auth_token,
            whatsapp_number,
        }
    }

    /// Envia uma mensagem de WhatsApp pela API de Messages.
    pub async fn send_whatsapp_message(&self, to: &str, body: &str) -> Result<(), TwilioError> {
        let url = format!(
            "https://api.twilio.com/2010-04-01/Accounts/{}/Messages.json",
            self.account_sid
        );

        let params = [
            ("From", self.whatsapp_number.as_str()),
            ("To", to),
            ("Body", body),
        ];

        let response = self
            .client
            .post(&url)
            .basic_auth(&self.account_sid, Some(&self.auth_token))
            .form(&params)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            log_twilio_error(status, &body);
            return Err(TwilioError::Api { status, body });
        }

        log_twilio_sent(to);
        Ok(())
    }

    /// Valida o header `X-Twilio-Signature`: HMAC-SHA1 da URL completa
    /// concatenada com os parâmetros do formulário em ordem de chave,
    /// codificado em base64.
    pub fn validate_signature(
        &self,
        url: &str,
        params: &BTreeMap<String, String>,
        signature: &str,
    ) -> bool {
        match Self::compute_signature(&self.auth_token, url, params) {
            Ok(expected) => constant_time_eq(expected.as_bytes(), signature.as_bytes()),
            Err(_) => false,
        }
    }

    fn compute_signature(
        auth_token: &str,
        url: &str,
        params: &BTreeMap<String, String>,
    ) -> Result<String, TwilioError> {
        let mut payload = url.to_string();
        for (key, value) in params {
            payload.push_str(key);
            payload.push_str(value);
        }

        let mut mac = Hmac::<Sha1>::new_from_slice(auth_token.as_bytes())
            .map_err(|e| TwilioError::InvalidKey(e.to_string()))?;
        mac.update(payload.as_bytes());
        Ok(BASE64.encode(mac.finalize().into_bytes()))
    }
}

// Comparação de tempo constante para evitar timing attacks
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut result = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        result |= x ^ y;
    }
    result == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_service() -> TwilioService {
        TwilioService::new(
            "AC00000000000000000000000000000000".to_string(),
            "token-secreto-de-teste".to_string(),
            "+14155238886".to_string(),
        )
    }

    fn webhook_params() -> BTreeMap<String, String> {
        BTreeMap::from([
            ("From".to_string(), "whatsapp:+5511999999999".to_string()),
            ("Body".to_string(), "12345678900".to_string()),
            ("MessageSid".to_string(), "SM0000".to_string()),
        ])
    }

    #[test]
    fn test_signature_roundtrip() {
        let service = test_service();
        let url = "https://clara.example.com/whatsapp/webhook";
        let params = webhook_params();

        let signature =
            TwilioService::compute_signature("token-secreto-de-teste", url, &params).unwrap();
        assert!(service.validate_signature(url, &params, &signature));
    }

    #[test]
    fn test_signature_rejects_tampered_body() {
        let service = test_service();
        let url = "https://clara.example.com/whatsapp/webhook";
        let params = webhook_params();

        let signature =
            TwilioService::compute_signature("token-secreto-de-teste", url, &params).unwrap();

        let mut tampered = params.clone();
        tampered.insert("Body".to_string(), "98765432100".to_string());
        assert!(!service.validate_signature(url, &tampered, &signature));

        // URL diferente também invalida
        assert!(!service.validate_signature(
            "https://clara.example.com/outro",
            &params,
            &signature
        ));
    }

    #[test]
    fn test_signature_rejects_wrong_token() {
        let url = "https://clara.example.com/whatsapp/webhook";
        let params = webhook_params();

        let signature =
            TwilioService::compute_signature("outro-token", url, &params).unwrap();
        assert!(!test_service().validate_signature(url, &params, &signature));
    }

    #[test]
    fn test_whatsapp_prefix_normalization() {
        let with_prefix = TwilioService::new(
            "AC0".to_string(),
            "t".to_string(),
            "whatsapp:+14155238886".to_string(),
        );
        assert_eq!(with_prefix.whatsapp_number, "whatsapp:+14155238886");

        let without_prefix = test_service();
        assert_eq!(without_prefix.whatsapp_number, "whatsapp:+14155238886");
    }
}
