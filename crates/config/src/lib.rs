use std::env;
use std::fs;
use std::ops::RangeInclusive;
use std::path::Path;

use anyhow::Result;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Accepted values for `server.num_ideas`.
pub const NUM_IDEAS_RANGE: RangeInclusive<usize> = 0..=10;

/// Accepted values for `server.num_results`.
pub const NUM_RESULTS_RANGE: RangeInclusive<usize> = 0..=6;

// ── Validation errors ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("an OpenAI API key is required (pass --api-key or set OPENAI_API_KEY)")]
    MissingApiKey,
    #[error("num-ideas must be an integer and 0 <= num-ideas <= 10 (got {0})")]
    NumIdeasOutOfRange(usize),
    #[error("num-results must be an integer and 0 <= num-results <= 6 (got {0})")]
    NumResultsOutOfRange(usize),
}

// ── Sections ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Listings rendered per suggestion phrase (one page column each).
    pub num_results: usize,
    /// Suggestion phrases requested from the completion service.
    pub num_ideas: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8888,
            num_results: 5,
            num_ideas: 5,
        }
    }
}

impl ServerConfig {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Completion-service settings.  The sampling parameters are sent verbatim
/// with every suggestion request.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Secret bearer token.  Overridden by `OPENAI_API_KEY` when set.
    pub api_key: String,
    /// Base URL of an OpenAI-compatible API.  Overridden by
    /// `OPENAI_BASE_URL` when set.
    pub api_base: String,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub top_p: f32,
    pub frequency_penalty: f32,
    pub presence_penalty: f32,
    pub timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            api_base: "https://api.openai.com/v1".to_string(),
            model: "text-davinci-003".to_string(),
            temperature: 0.7,
            max_tokens: 256,
            top_p: 1.0,
            frequency_penalty: 0.0,
            presence_penalty: 0.0,
            timeout_secs: 30,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MarketplaceConfig {
    /// Search page template.  `{query}` is replaced by the form-encoded phrase.
    pub search_url: String,
    pub user_agent: String,
    pub timeout_secs: u64,
}

impl Default for MarketplaceConfig {
    fn default() -> Self {
        Self {
            search_url: "https://www.etsy.com/search?q={query}".to_string(),
            user_agent: "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 \
                (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36"
                .to_string(),
            timeout_secs: 15,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub llm: LlmConfig,
    pub marketplace: MarketplaceConfig,
}

impl AppConfig {
    /// Load a TOML config file.  A missing file yields the defaults; a file
    /// that exists but does not parse is an error.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let mut config = Self::default();
        if let Ok(raw) = fs::read_to_string(path) {
            config = toml::from_str(&raw)?;
        }

        if let Ok(key) = env::var("OPENAI_API_KEY") {
            if !key.trim().is_empty() {
                config.llm.api_key = key;
            }
        }

        if let Ok(base) = env::var("OPENAI_BASE_URL") {
            if !base.trim().is_empty() {
                config.llm.api_base = base;
            }
        }

        Ok(config)
    }

    /// Reject settings the server cannot run with.  Called once at startup,
    /// before the listener is bound.
    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        if self.llm.api_key.trim().is_empty() {
            return Err(ConfigError::MissingApiKey);
        }
        if !NUM_IDEAS_RANGE.contains(&self.server.num_ideas) {
            return Err(ConfigError::NumIdeasOutOfRange(self.server.num_ideas));
        }
        if !NUM_RESULTS_RANGE.contains(&self.server.num_results) {
            return Err(ConfigError::NumResultsOutOfRange(self.server.num_results));
        }
        Ok(())
    }
}

// ── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn valid() -> AppConfig {
        let mut cfg = AppConfig::default();
        cfg.llm.api_key = "sk-test".to_string();
        cfg
    }

    #[test]
    fn defaults_match_cli_defaults() {
        let cfg = AppConfig::default();
        assert_eq!(cfg.server.host, "127.0.0.1");
        assert_eq!(cfg.server.port, 8888);
        assert_eq!(cfg.server.num_results, 5);
        assert_eq!(cfg.server.num_ideas, 5);
        assert_eq!(cfg.server.bind_addr(), "127.0.0.1:8888");
    }

    #[test]
    fn default_sampling_parameters() {
        let llm = LlmConfig::default();
        assert_eq!(llm.model, "text-davinci-003");
        assert!((llm.temperature - 0.7).abs() < f32::EPSILON);
        assert_eq!(llm.max_tokens, 256);
        assert!((llm.top_p - 1.0).abs() < f32::EPSILON);
        assert_eq!(llm.frequency_penalty, 0.0);
        assert_eq!(llm.presence_penalty, 0.0);
    }

    #[test]
    fn default_search_url_has_placeholder() {
        let market = MarketplaceConfig::default();
        assert!(market.search_url.contains("{query}"));
        assert!(market.search_url.starts_with("https://www.etsy.com/search"));
    }

    // ── load_from ──────────────────────────────────────────────────────────

    #[test]
    fn load_from_missing_file_returns_defaults() {
        let dir = TempDir::new().unwrap();
        let cfg = AppConfig::load_from(dir.path().join("nonexistent.toml")).unwrap();
        assert_eq!(cfg.server.port, 8888);
        assert_eq!(cfg.llm.model, "text-davinci-003");
    }

    #[test]
    fn load_from_partial_toml_fills_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("partial.toml");
        fs::write(
            &path,
            r#"
[server]
port = 9000
num_ideas = 3

[marketplace]
timeout_secs = 5
"#,
        )
        .unwrap();

        let cfg = AppConfig::load_from(&path).unwrap();
        assert_eq!(cfg.server.port, 9000);
        assert_eq!(cfg.server.num_ideas, 3);
        assert_eq!(cfg.server.num_results, 5);
        assert_eq!(cfg.server.host, "127.0.0.1");
        assert_eq!(cfg.marketplace.timeout_secs, 5);
        assert_eq!(cfg.llm.max_tokens, 256);
    }

    #[test]
    fn load_from_invalid_toml_returns_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bad.toml");
        fs::write(&path, "this is not valid toml {{{{").unwrap();
        assert!(AppConfig::load_from(&path).is_err());
    }

    #[test]
    fn env_api_key_overrides_config() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("key.toml");
        fs::write(
            &path,
            r#"
[llm]
api_key = "from-file"
"#,
        )
        .unwrap();

        // SAFETY: no other test in this crate touches OPENAI_API_KEY.
        unsafe { env::set_var("OPENAI_API_KEY", "from-env") };
        let cfg = AppConfig::load_from(&path).unwrap();
        assert_eq!(cfg.llm.api_key, "from-env");
        unsafe { env::remove_var("OPENAI_API_KEY") };
    }

    // ── validate ───────────────────────────────────────────────────────────

    #[test]
    fn validate_accepts_defaults_with_key() {
        assert_eq!(valid().validate(), Ok(()));
    }

    #[test]
    fn validate_rejects_blank_api_key() {
        let mut cfg = valid();
        cfg.llm.api_key = "   ".to_string();
        assert_eq!(cfg.validate(), Err(ConfigError::MissingApiKey));
    }

    #[test]
    fn validate_accepts_bounds_inclusive() {
        let mut cfg = valid();
        cfg.server.num_ideas = 0;
        cfg.server.num_results = 0;
        assert!(cfg.validate().is_ok());
        cfg.server.num_ideas = 10;
        cfg.server.num_results = 6;
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn validate_rejects_too_many_ideas() {
        let mut cfg = valid();
        cfg.server.num_ideas = 11;
        assert_eq!(cfg.validate(), Err(ConfigError::NumIdeasOutOfRange(11)));
    }

    #[test]
    fn validate_rejects_too_many_results() {
        let mut cfg = valid();
        cfg.server.num_results = 7;
        assert_eq!(cfg.validate(), Err(ConfigError::NumResultsOutOfRange(7)));
    }

    #[test]
    fn config_error_messages_name_the_flag() {
        assert!(ConfigError::NumIdeasOutOfRange(42).to_string().contains("num-ideas"));
        assert!(ConfigError::NumResultsOutOfRange(9).to_string().contains("num-results"));
    }
}
