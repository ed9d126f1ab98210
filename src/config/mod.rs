//! Configuration for the wakeline gateway
//!
//! Precedence, lowest to highest: built-in defaults, the TOML config file,
//! environment variables. CLI flags are applied on top by `main`.

pub mod file;

use std::path::Path;
use std::time::Duration;

use secrecy::SecretString;

use crate::engine::{EngineConfig, TriggerConfig};
use crate::error::Result;

use file::WakelineConfigFile;

/// Gateway configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Engine windows and wake phrases
    pub engine: EngineConfig,

    /// HTTP server configuration
    pub server: ServerConfig,

    /// Chat-completion parameters for the answer collaborator
    pub llm: LlmConfig,

    /// API keys for external services
    pub api_keys: ApiKeys,
}

/// HTTP server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Port to listen on
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { port: 5000 }
    }
}

/// Chat-completion parameters for the answer collaborator
#[derive(Debug, Clone)]
pub struct LlmConfig {
    /// Model identifier
    pub model: String,

    /// Max tokens per completion
    pub max_tokens: u32,

    /// Sampling temperature
    pub temperature: f64,

    /// Request timeout
    pub timeout: Duration,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            model: "gpt-4".to_string(),
            max_tokens: 150,
            temperature: 0.7,
            timeout: Duration::from_secs(30),
        }
    }
}

/// API keys for external services
#[derive(Debug, Clone, Default)]
pub struct ApiKeys {
    /// `OpenAI` API key (answer generation, intent analysis)
    pub openai: Option<SecretString>,

    /// `OpenWeatherMap` API key (weather intents)
    pub openweather: Option<SecretString>,
}

impl Config {
    /// Load configuration from defaults, config file, and environment
    ///
    /// When `path` is `None` the default location
    /// (`~/.config/wakeline/config.toml`) is consulted; a missing file is
    /// not an error.
    ///
    /// # Errors
    ///
    /// Returns an error when an existing config file cannot be read or
    /// parsed.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let from_file = match path {
            Some(path) => file::load(path)?,
            None => file::default_path()
                .map(|path| file::load(&path))
                .transpose()?
                .flatten(),
        }
        .unwrap_or_default();

        let mut config = Self::from_file(from_file);
        config.apply_env();
        Ok(config)
    }

    /// Build a config from a (possibly empty) file overlay on defaults
    fn from_file(overlay: WakelineConfigFile) -> Self {
        let engine_defaults = EngineConfig::default();
        let trigger_defaults = TriggerConfig::default();
        let llm_defaults = LlmConfig::default();

        let engine = EngineConfig {
            trigger: TriggerConfig {
                phrases: overlay
                    .engine
                    .trigger_phrases
                    .unwrap_or(trigger_defaults.phrases),
                partial_first: overlay
                    .engine
                    .partial_first
                    .unwrap_or(trigger_defaults.partial_first),
                partial_second: overlay
                    .engine
                    .partial_second
                    .unwrap_or(trigger_defaults.partial_second),
                partial_window: overlay
                    .engine
                    .partial_window_secs
                    .map_or(trigger_defaults.partial_window, Duration::from_secs_f64),
            },
            aggregation_window: overlay
                .engine
                .aggregation_window_secs
                .map_or(engine_defaults.aggregation_window, Duration::from_secs_f64),
            cooldown: overlay
                .engine
                .cooldown_secs
                .map_or(engine_defaults.cooldown, Duration::from_secs_f64),
            sweep_interval: overlay
                .engine
                .sweep_interval_secs
                .map_or(engine_defaults.sweep_interval, Duration::from_secs),
            session_expiry: overlay
                .engine
                .session_expiry_secs
                .map_or(engine_defaults.session_expiry, Duration::from_secs),
        };

        let llm = LlmConfig {
            model: overlay.llm.model.unwrap_or(llm_defaults.model),
            max_tokens: overlay.llm.max_tokens.unwrap_or(llm_defaults.max_tokens),
            temperature: overlay.llm.temperature.unwrap_or(llm_defaults.temperature),
            timeout: overlay
                .llm
                .timeout_secs
                .map_or(llm_defaults.timeout, Duration::from_secs),
        };

        Self {
            engine,
            server: ServerConfig {
                port: overlay
                    .server
                    .port
                    .unwrap_or_else(|| ServerConfig::default().port),
            },
            llm,
            api_keys: ApiKeys {
                openai: overlay.api_keys.openai.map(SecretString::from),
                openweather: overlay.api_keys.openweather.map(SecretString::from),
            },
        }
    }

    /// Overlay environment variables onto the config
    fn apply_env(&mut self) {
        if let Some(key) = non_empty_env("OPENAI_API_KEY") {
            self.api_keys.openai = Some(SecretString::from(key));
        }

        if let Some(key) = non_empty_env("OPENWEATHER_API_KEY") {
            self.api_keys.openweather = Some(SecretString::from(key));
        }

        if let Some(port) = std::env::var("WAKELINE_PORT")
            .ok()
            .and_then(|raw| raw.parse().ok())
        {
            self.server.port = port;
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_file(WakelineConfigFile::default())
    }
}

/// Environment variable value, treating empty as unset
fn non_empty_env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|value| !value.is_empty())
}
