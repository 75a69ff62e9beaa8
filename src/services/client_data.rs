use reqwest::Client;
use std::time::Duration;

use crate::config::Settings;
use crate::models::{ApiEnvelope, LookupOutcome};
use crate::services::cache::MemoryCache;
use crate::services::identifier::IdentifierKind;
use crate::services::mock_data;
use crate::utils::logging::*;
use crate::utils::{AppError, AppResult};

const API_TIMEOUT: Duration = Duration::from_secs(10);

/// Consulta de dados do cliente: cache, depois API real (quando habilitada),
/// com fallback silencioso para a base simulada.
#[derive(Clone)]
pub struct ClientDataService {
    client: Client,
    api_url: String,
    use_real_api: bool,
    cache_ttl: i64,
    cache: MemoryCache<LookupOutcome>,
}

impl ClientDataService {
    pub fn new(settings: &Settings) -> Self {
        Self {
            client: Client::new(),
            api_url: settings.carglass.api_url.clone(),
            use_real_api: settings.carglass.use_real_api,
            cache_ttl: settings.carglass.cache_ttl as i64,
            cache: MemoryCache::new(),
        }
    }

    /// Busca o registro do cliente pelo identificador classificado.
    ///
    /// Erros da API real (conexão, timeout, HTTP não-200) nunca chegam ao
    /// chamador: são sinal para cair na base simulada. Todo resultado,
    /// inclusive "não encontrado", entra no cache pelo TTL configurado.
    pub async fn lookup(&self, tipo: IdentifierKind, valor: &str) -> LookupOutcome {
        let cache_key = format!("client:{}:{}", tipo, valor);
        if let Some(cached) = self.cache.get(&cache_key).await {
            return cached;
        }

        if self.use_real_api {
            match self.fetch_from_api(tipo, valor).await {
                Ok(outcome) => {
                    self.cache.set(cache_key, outcome.clone(), self.cache_ttl).await;
                    return outcome;
                }
                Err(e) => log_lookup_fallback(tipo.as_str(), &e.to_string()),
            }
        }

        let outcome = mock_data::lookup_mock(tipo, valor);
        self.cache.set(cache_key, outcome.clone(), self.cache_ttl).await;
        outcome
    }

    async fn fetch_from_api(&self, tipo: IdentifierKind, valor: &str) -> AppResult<LookupOutcome> {
        let endpoint = format!("{}/{}/{}", self.api_url, tipo, urlencoding::encode(valor));

        let response = self
            .client
            .get(&endpoint)
            .timeout(API_TIMEOUT)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(AppError::CarglassApi(format!("HTTP {}", response.status())));
        }

        let envelope: ApiEnvelope = response.json().await?;
        match envelope {
            ApiEnvelope { sucesso: true, dados: Some(record), .. } => {
                Ok(LookupOutcome::Found(record))
            }
            ApiEnvelope { mensagem, .. } => Ok(LookupOutcome::NotFound {
                mensagem: mensagem
                    .unwrap_or_else(|| format!("Cliente não encontrado para {}", tipo)),
            }),
        }
    }

    pub async fn cache_len(&self) -> usize {
        self.cache.len().await
    }

    pub async fn cache_cleanup(&self) {
        self.cache.cleanup().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::settings::*;
    use httpmock::prelude::*;
    use serde_json::json;

    fn settings_with(api_url: &str, use_real_api: bool) -> Settings {
        Settings {
            server: ServerSettings { host: "0.0.0.0".to_string(), port: 8080 },
            app: AppSettings {
                secret_key: "test".to_string(),
                debug: false,
            },
            carglass: CarglassSettings {
                api_url: api_url.to_string(),
                use_real_api,
                cache_ttl: 300,
            },
            session: SessionSettings { timeout_secs: 1800 },
            openai: OpenAiSettings { api_key: None, model: "gpt-4-turbo".to_string() },
            twilio: TwilioSettings::default(),
        }
    }

    #[tokio::test]
    async fn test_mock_only_lookup_is_cached() {
        let service = ClientDataService::new(&settings_with("http://unused", false));

        let outcome = service.lookup(IdentifierKind::Cpf, "12345678900").await;
        assert!(outcome.is_found());
        assert_eq!(service.cache_len().await, 1);

        // Segunda consulta sai do cache (mesmo resultado)
        let again = service.lookup(IdentifierKind::Cpf, "12345678900").await;
        assert!(again.is_found());
        assert_eq!(service.cache_len().await, 1);
    }

    #[tokio::test]
    async fn test_real_api_success_is_parsed_and_cached() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET).path("/cpf/12345678900");
                then.status(200).json_body(json!({
                    "sucesso": true,
                    "dados": {
                        "nome": "Carlos Silva",
                        "cpf": "12345678900",
                        "telefone": "11987654321",
                        "ordem": "ORD12345",
                        "status": "Em andamento",
                        "tipo_servico": "Troca de Parabrisa",
                        "veiculo": {"modelo": "Honda Civic", "placa": "ABC1234", "ano": "2022"}
                    }
                }));
            })
            .await;

        let service = ClientDataService::new(&settings_with(&server.base_url(), true));

        let outcome = service.lookup(IdentifierKind::Cpf, "12345678900").await;
        match outcome {
            LookupOutcome::Found(record) => assert_eq!(record.nome, "Carlos Silva"),
            LookupOutcome::NotFound { .. } => panic!("API respondeu com sucesso"),
        }
        mock.assert_async().await;

        // Repetição não bate de novo na API (cache)
        let again = service.lookup(IdentifierKind::Cpf, "12345678900").await;
        assert!(again.is_found());
        assert_eq!(mock.hits_async().await, 1);
    }

    #[tokio::test]
    async fn test_real_api_failure_falls_back_to_mock() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/cpf/12345678900");
                then.status(500);
            })
            .await;

        let service = ClientDataService::new(&settings_with(&server.base_url(), true));

        // Erro HTTP cai silenciosamente na base simulada
        let outcome = service.lookup(IdentifierKind::Cpf, "12345678900").await;
        match outcome {
            LookupOutcome::Found(record) => assert_eq!(record.nome, "Carlos Silva"),
            LookupOutcome::NotFound { .. } => panic!("fallback deveria encontrar o mock"),
        }
    }

    #[tokio::test]
    async fn test_real_api_not_found_envelope() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/cpf/11111111111");
                then.status(200).json_body(json!({
                    "sucesso": false,
                    "mensagem": "Cliente não encontrado para cpf"
                }));
            })
            .await;

        let service = ClientDataService::new(&settings_with(&server.base_url(), true));

        let outcome = service.lookup(IdentifierKind::Cpf, "11111111111").await;
        match outcome {
            LookupOutcome::NotFound { mensagem } => {
                assert!(mensagem.contains("não encontrado"));
            }
            LookupOutcome::Found(_) => panic!("envelope indicava falha"),
        }
        // Resultado negativo também é cacheado
        assert_eq!(service.cache_len().await, 1);
    }

    #[tokio::test]
    async fn test_unreachable_api_falls_back_to_mock() {
        // Porta sem listener: erro de conexão imediato
        let service =
            ClientDataService::new(&settings_with("http://127.0.0.1:1/api/status", true));

        let outcome = service.lookup(IdentifierKind::Telefone, "11987654321").await;
        match outcome {
            LookupOutcome::Found(record) => assert_eq!(record.nome, "Carlos Silva"),
            LookupOutcome::NotFound { .. } => panic!("fallback deveria encontrar o mock"),
        }
    }
}
