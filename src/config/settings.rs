use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Settings {
    pub server: ServerSettings,
    pub app: AppSettings,
    pub carglass: CarglassSettings,
    pub session: SessionSettings,
    pub openai: OpenAiSettings,
    #[serde(default)]
    pub twilio: TwilioSettings,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AppSettings {
    pub secret_key: String,
    pub debug: bool,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct CarglassSettings {
    pub api_url: String,
    pub use_real_api: bool,
    pub cache_ttl: u64,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SessionSettings {
    pub timeout_secs: u64,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct OpenAiSettings {
    #[serde(default)]
    pub api_key: Option<String>,
    pub model: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct TwilioSettings {
    #[serde(default)]
    pub account_sid: Option<String>,
    #[serde(default)]
    pub auth_token: Option<String>,
    #[serde(default)]
    pub whatsapp_number: Option<String>,
}

impl TwilioSettings {
    pub fn is_configured(&self) -> bool {
        self.account_sid.as_deref().map_or(false, |v| !v.is_empty())
            && self.auth_token.as_deref().map_or(false, |v| !v.is_empty())
            && self.whatsapp_number.as_deref().map_or(false, |v| !v.is_empty())
    }
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let mut builder = Config::builder()
            // Valores padrão (funcionam sem nenhum arquivo de configuração)
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 8080_i64)?
            .set_default("app.secret_key", "carglass-secreto-render-key")?
            .set_default("app.debug", false)?
            .set_default("carglass.api_url", "http://10.10.100.240:3000/api/status")?
            .set_default("carglass.use_real_api", true)?
            .set_default("carglass.cache_ttl", 300_i64)?
            .set_default("session.timeout_secs", 1800_i64)?
            .set_default("openai.model", "gpt-4-turbo")?
            // Arquivo de configuração base
            .add_source(File::with_name("config/default").required(false))
            // Arquivo específico do ambiente
            .add_source(File::with_name(&format!("config/{}", run_mode)).required(false));

        // Variáveis de ambiente herdadas das versões anteriores do assistente
        if let Ok(v) = std::env::var("SECRET_KEY") {
            builder = builder.set_override("app.secret_key", v)?;
        }
        if let Ok(v) = std::env::var("DEBUG") {
            builder = builder.set_override("app.debug", v.to_lowercase() == "true")?;
        }
        if let Ok(v) = std::env::var("OPENAI_API_KEY") {
            builder = builder.set_override("openai.api_key", v)?;
        }
        if let Ok(v) = std::env::var("OPENAI_MODEL") {
            builder = builder.set_override("openai.model", v)?;
        }
        if let Ok(v) = std::env::var("CARGLASS_API_URL") {
            builder = builder.set_override("carglass.api_url", v)?;
        }
        if let Ok(v) = std::env::var("USE_REAL_API") {
            builder = builder.set_override("carglass.use_real_api", v.to_lowercase() == "true")?;
        }
        if let Some(v) = env_i64("SESSION_TIMEOUT") {
            builder = builder.set_override("session.timeout_secs", v)?;
        }
        if let Some(v) = env_i64("CACHE_TTL") {
            builder = builder.set_override("carglass.cache_ttl", v)?;
        }
        if let Ok(v) = std::env::var("TWILIO_ACCOUNT_SID") {
            builder = builder.set_override("twilio.account_sid", v)?;
        }
        if let Ok(v) = std::env::var("TWILIO_AUTH_TOKEN") {
            builder = builder.set_override("twilio.auth_token", v)?;
        }
        if let Ok(v) = std::env::var("TWILIO_WHATSAPP_NUMBER") {
            builder = builder.set_override("twilio.whatsapp_number", v)?;
        }

        // Prefixo próprio para overrides pontuais (CLARA_SERVER__PORT etc.)
        builder = builder.add_source(Environment::with_prefix("CLARA").separator("__"));

        let s = builder.build()?;

        s.try_deserialize()
    }

    pub fn openai_configured(&self) -> bool {
        self.openai.api_key.as_deref().map_or(false, |k| !k.is_empty())
    }
}

fn env_i64(name: &str) -> Option<i64> {
    std::env::var(name).ok().and_then(|v| v.parse::<i64>().ok())
}
