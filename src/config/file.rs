//! TOML configuration file loading
//!
//! Supports `~/.config/wakeline/config.toml` as a persistent config
//! source. All fields are optional — the file is a partial overlay on top
//! of defaults.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::Result;

/// Top-level TOML configuration file schema
#[derive(Debug, Default, Deserialize)]
pub struct WakelineConfigFile {
    /// Engine windows and wake phrases
    #[serde(default)]
    pub engine: EngineFileConfig,

    /// HTTP server configuration
    #[serde(default)]
    pub server: ServerFileConfig,

    /// LLM configuration for the answer collaborator
    #[serde(default)]
    pub llm: LlmFileConfig,

    /// API keys for external services
    #[serde(default)]
    pub api_keys: ApiKeysFileConfig,
}

/// Engine-related configuration
#[derive(Debug, Default, Deserialize)]
pub struct EngineFileConfig {
    /// Complete wake phrases (e.g. `["hey omi", "hey, omi"]`)
    pub trigger_phrases: Option<Vec<String>>,

    /// First halves of a split wake phrase
    pub partial_first: Option<Vec<String>>,

    /// Second halves of a split wake phrase
    pub partial_second: Option<Vec<String>>,

    /// Split-phrase completion window in seconds
    pub partial_window_secs: Option<f64>,

    /// Question aggregation window in seconds
    pub aggregation_window_secs: Option<f64>,

    /// Re-trigger cooldown in seconds
    pub cooldown_secs: Option<f64>,

    /// Minimum interval between expiry sweeps in seconds
    pub sweep_interval_secs: Option<u64>,

    /// Idle session expiry in seconds
    pub session_expiry_secs: Option<u64>,
}

/// Server configuration
#[derive(Debug, Default, Deserialize)]
pub struct ServerFileConfig {
    /// Port to listen on
    pub port: Option<u16>,
}

/// LLM configuration
#[derive(Debug, Default, Deserialize)]
pub struct LlmFileConfig {
    /// Model identifier (e.g. "gpt-4")
    pub model: Option<String>,

    /// Max tokens per completion
    pub max_tokens: Option<u32>,

    /// Sampling temperature
    pub temperature: Option<f64>,

    /// Request timeout in seconds
    pub timeout_secs: Option<u64>,
}

/// API keys configuration
#[derive(Debug, Default, Deserialize)]
pub struct ApiKeysFileConfig {
    pub openai: Option<String>,
    pub openweather: Option<String>,
}

/// Default config file path: `~/.config/wakeline/config.toml`
#[must_use]
pub fn default_path() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|dirs| dirs.config_dir().join("wakeline").join("config.toml"))
}

/// Load and parse a config file, returning `None` when it does not exist
///
/// # Errors
///
/// Returns an error when the file exists but cannot be read or parsed.
pub fn load(path: &Path) -> Result<Option<WakelineConfigFile>> {
    if !path.exists() {
        return Ok(None);
    }

    let contents = std::fs::read_to_string(path)?;
    let parsed = toml::from_str(&contents)?;

    tracing::debug!(path = %path.display(), "loaded config file");
    Ok(Some(parsed))
}
