use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::services::analyzer::ValidationPolicy;

#[derive(Debug, thiserror::Error)]
#[error("{key} has an invalid value: {value:?}")]
pub struct ConfigError {
    pub key: &'static str,
    pub value: String,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub frontend_url: String,

    pub gemini_api_key: String,
    pub gemini_model: String,
    pub gemini_base_url: String,
    pub model_timeout_secs: u64,

    pub mood_log_path: PathBuf,
    pub recent_entries: usize,
    pub max_entry_chars: u64,
    pub strict_mood_validation: bool,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into()),
            port: parse_var("PORT", 8080)?,
            frontend_url: env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:3000".into()),

            gemini_api_key: env::var("GEMINI_API_KEY").unwrap_or_default(),
            gemini_model: env::var("GEMINI_MODEL")
                .unwrap_or_else(|_| "gemini-flash-latest".into()),
            gemini_base_url: env::var("GEMINI_BASE_URL")
                .unwrap_or_else(|_| "https://generativelanguage.googleapis.com".into()),
            model_timeout_secs: parse_var("MODEL_TIMEOUT_SECS", 30)?,

            mood_log_path: env::var("MOOD_LOG_PATH")
                .unwrap_or_else(|_| "mood_history.csv".into())
                .into(),
            recent_entries: parse_var("RECENT_ENTRIES", 5)?,
            max_entry_chars: parse_var("MAX_ENTRY_CHARS", 10_000)?,
            strict_mood_validation: parse_var("STRICT_MOOD_VALIDATION", false)?,
        })
    }

    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn model_timeout(&self) -> Duration {
        Duration::from_secs(self.model_timeout_secs)
    }

    pub fn model_configured(&self) -> bool {
        !self.gemini_api_key.trim().is_empty()
    }

    pub fn validation_policy(&self) -> ValidationPolicy {
        if self.strict_mood_validation {
            ValidationPolicy::Strict
        } else {
            ValidationPolicy::Permissive
        }
    }
}

#[cfg(test)]
impl Config {
    pub fn for_tests(mood_log_path: PathBuf) -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: 0,
            frontend_url: "http://localhost:3000".into(),
            gemini_api_key: String::new(),
            gemini_model: "gemini-flash-latest".into(),
            gemini_base_url: "http://127.0.0.1:9".into(),
            model_timeout_secs: 1,
            mood_log_path,
            recent_entries: 5,
            max_entry_chars: 10_000,
            strict_mood_validation: false,
        }
    }
}

/// Unset or empty means default; anything else must parse.
fn parse_var<T: FromStr>(key: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(key) {
        Ok(value) if !value.trim().is_empty() => value
            .trim()
            .parse()
            .map_err(|_| ConfigError { key, value }),
        _ => Ok(default),
    }
}
