// Configuration loading and parsing (config/chat.toml + environment).
//
// The only knob the core reads is the backend base URL. Resolution order:
// `RAG_CHAT_API_URL` environment variable, then `config/chat.toml`, then
// the built-in default. The log filter is resolved the same way from
// `RAG_CHAT_LOG` / the config file.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Default backend base URL when neither the environment nor the config
/// file provides one.
pub const DEFAULT_BASE_URL: &str = "http://localhost:8002";

/// Default tracing env-filter directive.
pub const DEFAULT_LOG_FILTER: &str = "rag_chat=info,warn";

/// Environment variable overriding the backend base URL.
pub const BASE_URL_ENV: &str = "RAG_CHAT_API_URL";

/// Environment variable overriding the log filter.
pub const LOG_FILTER_ENV: &str = "RAG_CHAT_LOG";

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {message}")]
    ReadError { path: PathBuf, message: String },

    #[error("failed to parse config file {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("validation error for field `{field}`: {message}")]
    ValidationError { field: String, message: String },
}

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct Config {
    /// Backend base URL, normalized without a trailing slash.
    pub base_url: String,
    /// Tracing env-filter directive for the log file.
    pub log_filter: String,
}

// ---------------------------------------------------------------------------
// chat.toml structs
// ---------------------------------------------------------------------------

/// Raw deserialization target for config/chat.toml. Every section and field
/// is optional; missing values fall back to the defaults above.
#[derive(Debug, Clone, Default, Deserialize)]
struct ChatFile {
    #[serde(default)]
    backend: BackendSection,
    #[serde(default)]
    log: LogSection,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct BackendSection {
    base_url: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct LogSection {
    filter: Option<String>,
}

// ---------------------------------------------------------------------------
// Loading logic
// ---------------------------------------------------------------------------

/// Assemble a validated Config from an optional parsed file and optional
/// environment overrides. Environment wins over file, file wins over the
/// built-in defaults.
fn assemble(
    file: Option<ChatFile>,
    env_base_url: Option<String>,
    env_log_filter: Option<String>,
) -> Result<Config, ConfigError> {
    let file = file.unwrap_or_default();

    let base_url = env_base_url
        .or(file.backend.base_url)
        .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
    let log_filter = env_log_filter
        .or(file.log.filter)
        .unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string());

    let config = Config {
        base_url: base_url.trim_end_matches('/').to_string(),
        log_filter,
    };
    validate(&config)?;
    Ok(config)
}

/// Load configuration relative to `base_dir`, reading `config/chat.toml`
/// when it exists. Environment overrides are passed in explicitly so this
/// stays deterministic under test.
pub(crate) fn load_config_from(
    base_dir: &Path,
    env_base_url: Option<String>,
    env_log_filter: Option<String>,
) -> Result<Config, ConfigError> {
    let path = base_dir.join("config").join("chat.toml");

    let file = if path.exists() {
        let text = std::fs::read_to_string(&path).map_err(|e| ConfigError::ReadError {
            path: path.clone(),
            message: e.to_string(),
        })?;
        Some(
            toml::from_str(&text).map_err(|e| ConfigError::ParseError {
                path: path.clone(),
                source: e,
            })?,
        )
    } else {
        None
    };

    assemble(file, env_base_url, env_log_filter)
}

/// Convenience wrapper: loads config relative to the current working
/// directory with environment overrides applied.
pub fn load_config() -> Result<Config, ConfigError> {
    let cwd = std::env::current_dir().map_err(|e| ConfigError::ReadError {
        path: PathBuf::from("."),
        message: e.to_string(),
    })?;
    load_config_from(
        &cwd,
        std::env::var(BASE_URL_ENV).ok(),
        std::env::var(LOG_FILTER_ENV).ok(),
    )
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

fn validate(config: &Config) -> Result<(), ConfigError> {
    if config.base_url.is_empty() {
        return Err(ConfigError::ValidationError {
            field: "backend.base_url".into(),
            message: "must not be empty".into(),
        });
    }

    if !config.base_url.starts_with("http://") && !config.base_url.starts_with("https://") {
        return Err(ConfigError::ValidationError {
            field: "backend.base_url".into(),
            message: format!(
                "must start with http:// or https://, got `{}`",
                config.base_url
            ),
        });
    }

    if config.log_filter.is_empty() {
        return Err(ConfigError::ValidationError {
            field: "log.filter".into(),
            message: "must not be empty".into(),
        });
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
