use crate::agent::{DEFAULT_BASE_URL, DEFAULT_MODEL};

const DEFAULT_DATABASE_URL: &str = "sqlite://gemini_chat.db?mode=rwc";
const DEFAULT_PORT: u16 = 8080;

/// Process settings read from the environment (and `.env`, if present).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub database_url: String,
    pub gemini_base_url: String,
    pub gemini_model: String,
    pub port: u16,
    /// Seeds the stored key when none has been saved yet.
    pub initial_api_key: Option<String>,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let non_empty = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        Self {
            database_url: non_empty("DATABASE_URL")
                .unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string()),
            gemini_base_url: non_empty("GEMINI_API_BASE_URL")
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            gemini_model: non_empty("GEMINI_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            port: non_empty("PORT")
                .and_then(|p| p.parse().ok())
                .unwrap_or(DEFAULT_PORT),
            initial_api_key: non_empty("GEMINI_API_KEY"),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    #[test]
    fn defaults_apply_when_unset_or_blank() {
        let config = AppConfig::from_lookup(|name| (name == "GEMINI_MODEL").then(|| "  ".to_string()));
        assert_eq!(config.database_url, DEFAULT_DATABASE_URL);
        assert_eq!(config.gemini_base_url, DEFAULT_BASE_URL);
        assert_eq!(config.gemini_model, DEFAULT_MODEL);
        assert_eq!(config.port, 8080);
        assert_eq!(config.initial_api_key, None);
    }

    #[test]
    fn environment_overrides_defaults() {
        let env: HashMap<&str, &str> = HashMap::from([
            ("DATABASE_URL", "sqlite::memory:"),
            ("GEMINI_API_BASE_URL", "http://127.0.0.1:9000"),
            ("GEMINI_MODEL", "gemini-pro"),
            ("PORT", "3000"),
            ("GEMINI_API_KEY", "abc"),
        ]);
        let config = AppConfig::from_lookup(|name| env.get(name).map(|v| v.to_string()));
        assert_eq!(config.database_url, "sqlite::memory:");
        assert_eq!(config.gemini_base_url, "http://127.0.0.1:9000");
        assert_eq!(config.gemini_model, "gemini-pro");
        assert_eq!(config.port, 3000);
        assert_eq!(config.initial_api_key.as_deref(), Some("abc"));
    }

    #[test]
    fn unparseable_port_falls_back() {
        let config = AppConfig::from_lookup(|name| (name == "PORT").then(|| "http".to_string()));
        assert_eq!(config.port, 8080);
    }
}
