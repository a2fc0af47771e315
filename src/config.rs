use config::{Config, ConfigError, Environment, File, FileFormat};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Server {
    pub addr: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Database {
    pub uri: String,
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Storage {
    pub bucket: String,
    pub region: String,
    /// Custom S3 endpoint (MinIO, LocalStack).
    #[serde(default)]
    pub endpoint: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OpenAi {
    #[serde(default)]
    pub api_key: Option<String>,
    pub base_url: String,
    pub chat_model: String,
    pub vision_model: String,
    pub image_model: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct YouTube {
    #[serde(default)]
    pub api_key: Option<String>,
    pub base_url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Identity {
    pub api_url: String,
    /// Backend API secret, used by user sync.
    #[serde(default)]
    pub secret_key: Option<String>,
    /// `whsec_`-prefixed webhook signing secret.
    #[serde(default)]
    pub webhook_secret: Option<String>,
    /// PEM public key for RS256 session tokens.
    #[serde(default)]
    pub jwt_public_key: Option<String>,
    /// Shared secret for HS256 session tokens (local setups).
    #[serde(default)]
    pub jwt_secret: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub server: Server,
    pub database: Database,
    pub storage: Storage,
    pub openai: OpenAi,
    pub youtube: YouTube,
    pub identity: Identity,
    /// Serve from in-memory stores instead of MongoDB and S3.
    #[serde(default)]
    pub demo_mode: bool,
}

impl Settings {
    /// Defaults, then `notebench.toml` if present, then `NOTEBENCH__SECTION__KEY`
    /// environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_with(Environment::with_prefix("NOTEBENCH"))
    }

    fn load_with(env: Environment) -> Result<Self, ConfigError> {
        let config = Config::builder()
            .set_default("server.addr", "0.0.0.0:3000")?
            .set_default("database.uri", "mongodb://localhost:27017")?
            .set_default("database.name", "notebench")?
            .set_default("storage.bucket", "notebench")?
            .set_default("storage.region", "us-east-1")?
            .set_default("openai.base_url", "https://api.openai.com/v1")?
            .set_default("openai.chat_model", "gpt-3.5-turbo")?
            .set_default("openai.vision_model", "gpt-4o")?
            .set_default("openai.image_model", "dall-e-3")?
            .set_default("youtube.base_url", "https://www.googleapis.com/youtube/v3")?
            .set_default("identity.api_url", "https://api.clerk.com")?
            .set_default("demo_mode", false)?
            .add_source(
                File::with_name("notebench.toml")
                    .format(FileFormat::Toml)
                    .required(false),
            )
            .add_source(
                env.prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(vars: &[(&str, &str)]) -> Environment {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Environment::with_prefix("NOTEBENCH").source(Some(map))
    }

    #[test]
    fn test_defaults() {
        let settings = Settings::load_with(env(&[])).unwrap();
        assert_eq!(settings.server.addr, "0.0.0.0:3000");
        assert_eq!(settings.database.name, "notebench");
        assert_eq!(settings.openai.image_model, "dall-e-3");
        assert!(settings.openai.api_key.is_none());
        assert!(settings.storage.endpoint.is_none());
        assert!(!settings.demo_mode);
    }

    #[test]
    fn test_environment_overrides() {
        let settings = Settings::load_with(env(&[
            ("NOTEBENCH__DATABASE__URI", "mongodb://db:27017"),
            ("NOTEBENCH__STORAGE__ENDPOINT", "http://minio:9000"),
            ("NOTEBENCH__OPENAI__API_KEY", "sk-test"),
            ("NOTEBENCH__DEMO_MODE", "true"),
        ]))
        .unwrap();

        assert_eq!(settings.database.uri, "mongodb://db:27017");
        assert_eq!(settings.storage.endpoint.as_deref(), Some("http://minio:9000"));
        assert_eq!(settings.openai.api_key.as_deref(), Some("sk-test"));
        assert!(settings.demo_mode);
    }
}
