//! Application settings loaded via OrthoConfig.
//!
//! Every field can come from the environment (`DETECT_*`), a config file,
//! or CLI flags; accessors supply the development defaults so the binary
//! runs with no configuration at all.

use std::path::PathBuf;

use ortho_config::OrthoConfig;
use serde::Deserialize;

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8000";
const DEFAULT_DATA_DIR: &str = "./detect_auto_pg";
const DEFAULT_GENERATION_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_GENERATION_MODEL: &str = "gpt-4o-mini";

/// Configuration values controlling the server process.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "DETECT")]
pub struct AppSettings {
    /// Socket address the HTTP server binds to.
    pub bind_addr: Option<String>,
    /// PostgreSQL connection string. When unset, a file-backed embedded
    /// cluster is started for development.
    pub database_url: Option<String>,
    /// Data directory for the embedded development cluster.
    pub data_dir: Option<PathBuf>,
    /// API key for the text-generation provider.
    pub generation_api_key: Option<String>,
    /// Base URL of the chat-completions API.
    pub generation_base_url: Option<String>,
    /// Model identifier sent with every generation call.
    pub generation_model: Option<String>,
    /// HS256 signing secret for bearer tokens.
    pub token_secret: Option<String>,
    /// Bearer token lifetime in minutes.
    pub token_expiry_minutes: Option<i64>,
}

impl AppSettings {
    /// Bind address, defaulting to all interfaces on port 8000.
    pub fn bind_addr(&self) -> &str {
        self.bind_addr.as_deref().unwrap_or(DEFAULT_BIND_ADDR)
    }

    /// Explicit database URL, when one is configured.
    pub fn database_url(&self) -> Option<&str> {
        self.database_url.as_deref()
    }

    /// Data directory for the embedded development cluster.
    pub fn data_dir(&self) -> PathBuf {
        self.data_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR))
    }

    /// Generation API base URL.
    pub fn generation_base_url(&self) -> &str {
        self.generation_base_url
            .as_deref()
            .unwrap_or(DEFAULT_GENERATION_BASE_URL)
    }

    /// Generation model identifier.
    pub fn generation_model(&self) -> &str {
        self.generation_model
            .as_deref()
            .unwrap_or(DEFAULT_GENERATION_MODEL)
    }

    /// Generation API key, when one is configured.
    pub fn generation_api_key(&self) -> Option<&str> {
        self.generation_api_key.as_deref()
    }

    /// Token signing secret, when one is configured.
    pub fn token_secret(&self) -> Option<&str> {
        self.token_secret.as_deref()
    }

    /// Bearer token lifetime in minutes.
    pub fn token_expiry_minutes(&self) -> i64 {
        self.token_expiry_minutes
            .unwrap_or(backend::outbound::security::DEFAULT_EXPIRY_MINUTES)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn empty_settings() -> AppSettings {
        AppSettings {
            bind_addr: None,
            database_url: None,
            data_dir: None,
            generation_api_key: None,
            generation_base_url: None,
            generation_model: None,
            token_secret: None,
            token_expiry_minutes: None,
        }
    }

    #[rstest]
    fn defaults_cover_development() {
        let settings = empty_settings();
        assert_eq!(settings.bind_addr(), "0.0.0.0:8000");
        assert_eq!(settings.database_url(), None);
        assert_eq!(settings.generation_model(), "gpt-4o-mini");
        assert_eq!(settings.token_expiry_minutes(), 30);
    }

    #[rstest]
    fn explicit_values_win() {
        let settings = AppSettings {
            bind_addr: Some("127.0.0.1:9000".to_owned()),
            token_expiry_minutes: Some(5),
            ..empty_settings()
        };
        assert_eq!(settings.bind_addr(), "127.0.0.1:9000");
        assert_eq!(settings.token_expiry_minutes(), 5);
    }
}
