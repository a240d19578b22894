use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::DEFAULT_MAX_INPUT_CHARS;

pub const DEFAULT_PROVIDER_TIMEOUT_MS: u64 = 8_000;
pub const DEFAULT_GAZETTE_SEARCH_URL: &str = "https://peraturan.bpk.go.id/Search";
pub const DEFAULT_SUPREME_COURT_SEARCH_URL: &str = "https://putusan3.mahkamahagung.go.id/search.html";
pub const DEFAULT_WEB_SEARCH_URL: &str = "https://html.duckduckgo.com/html/";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config: {0}")]
    Read(String),
    #[error("Failed to parse config: {0}")]
    Parse(String),
    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// Verifier settings. Layered as defaults, optional YAML file, environment, CLI flags.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VerifierConfig {
    pub provider_timeout_ms: u64,
    /// General web search is off unless an operator opts in.
    pub enable_fallback_search: bool,
    pub max_input_chars: usize,
    pub gazette_search_url: String,
    pub supreme_court_search_url: String,
    pub web_search_url: String,
    pub user_agent: String,
}

impl Default for VerifierConfig {
    fn default() -> Self {
        Self {
            provider_timeout_ms: DEFAULT_PROVIDER_TIMEOUT_MS,
            enable_fallback_search: false,
            max_input_chars: DEFAULT_MAX_INPUT_CHARS,
            gazette_search_url: DEFAULT_GAZETTE_SEARCH_URL.to_string(),
            supreme_court_search_url: DEFAULT_SUPREME_COURT_SEARCH_URL.to_string(),
            web_search_url: DEFAULT_WEB_SEARCH_URL.to_string(),
            user_agent: format!("pasalcheck/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

/// Read a YAML config file. Missing keys keep their defaults.
pub fn load_config(path: &Path) -> Result<VerifierConfig, ConfigError> {
    let raw = std::fs::read_to_string(path).map_err(|e| ConfigError::Read(e.to_string()))?;
    if raw.trim().is_empty() {
        return Ok(VerifierConfig::default());
    }
    let cfg: VerifierConfig = serde_yaml::from_str(&raw).map_err(|e| ConfigError::Parse(e.to_string()))?;
    Ok(cfg)
}

impl VerifierConfig {
    pub fn provider_timeout(&self) -> Duration {
        Duration::from_millis(self.provider_timeout_ms)
    }

    /// Override from the process environment (PROVIDER_TIMEOUT_MS, ENABLE_FALLBACK_SEARCH, MAX_INPUT_CHARS).
    pub fn apply_env(&mut self) -> Result<(), ConfigError> {
        self.apply_env_from(|key| std::env::var(key).ok())
    }

    /// Same as [`apply_env`](Self::apply_env) with an explicit lookup, so callers need not touch the real environment.
    pub fn apply_env_from<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("PROVIDER_TIMEOUT_MS") {
            self.provider_timeout_ms = v
                .trim()
                .parse::<u64>()
                .map_err(|_| ConfigError::Invalid(format!("PROVIDER_TIMEOUT_MS={}", v)))?;
        }
        if let Some(v) = lookup("ENABLE_FALLBACK_SEARCH") {
            self.enable_fallback_search = parse_flag(&v)
                .ok_or_else(|| ConfigError::Invalid(format!("ENABLE_FALLBACK_SEARCH={}", v)))?;
        }
        if let Some(v) = lookup("MAX_INPUT_CHARS") {
            self.max_input_chars = v
                .trim()
                .parse::<usize>()
                .map_err(|_| ConfigError::Invalid(format!("MAX_INPUT_CHARS={}", v)))?;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.provider_timeout_ms == 0 {
            return Err(ConfigError::Invalid("provider_timeout_ms must be > 0".into()));
        }
        if self.max_input_chars == 0 {
            return Err(ConfigError::Invalid("max_input_chars must be > 0".into()));
        }
        for (name, url) in [
            ("gazette_search_url", &self.gazette_search_url),
            ("supreme_court_search_url", &self.supreme_court_search_url),
            ("web_search_url", &self.web_search_url),
        ] {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(ConfigError::Invalid(format!("{} is not an http(s) URL: {}", name, url)));
            }
        }
        Ok(())
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" | "" => Some(false),
        _ => None,
    }
}
