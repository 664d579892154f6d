//! Runtime configuration for chat-relay.
//!
//! Non-secret settings come from an optional JSON file; the provider API key
//! comes from the process environment or an environment file (`.env`).

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use clap::Parser;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Environment variable holding the provider API key.
pub const API_KEY_ENV: &str = "OPENAI_API_KEY";

/// Default system prompt of the static chat template.
pub const DEFAULT_SYSTEM_PROMPT: &str = "당신은 주어진 articles를 기반으로 question을 답해야 합니다. \
답할 수 있는 경우 답과 함께 근거 article를 붙여 서술하고, \
알 수 없는 경우 '모르겠습니다.'라고 답변하세요.";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("missing required setting {0}")]
    MissingApiKey(&'static str),

    #[error("failed to read config file {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config file {path:?}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to load environment file {path:?}: {source}")]
    EnvFile {
        path: PathBuf,
        #[source]
        source: dotenvy::Error,
    },
}

/// Command-line arguments.
#[derive(Parser, Debug, Clone)]
#[command(name = "chat-relay", about = "Streaming chat relay for hosted LLMs")]
pub struct Cli {
    /// Path to configuration file (JSON).
    #[arg(short, long, default_value = "config.json")]
    pub config: PathBuf,

    /// HTTP listen address (overrides the config file).
    #[arg(long)]
    pub listen: Option<String>,

    /// Environment file holding the provider API key.
    #[arg(long, default_value = ".env")]
    pub env_file: PathBuf,

    /// Enable verbose logging.
    #[arg(short, long)]
    pub verbose: bool,
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Server configuration.
    pub server: ServerConfig,

    /// Model provider configuration.
    pub provider: ProviderConfig,

    /// Prompt template configuration.
    pub prompt: PromptConfig,
}

/// HTTP server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    /// Listen address (e.g. "0.0.0.0:8000").
    pub listen: String,

    /// Capacity of the per-request token channel.
    pub token_buffer: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: "0.0.0.0:8000".to_string(),
            token_buffer: 32,
        }
    }
}

/// Hosted model provider settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProviderConfig {
    /// Base URL of the OpenAI-compatible API.
    pub api_base: String,

    /// Chat model name.
    pub model: String,

    /// Sampling temperature.
    pub temperature: f32,

    /// Connect timeout in seconds. Streams themselves are not cut off.
    pub connect_timeout_secs: u64,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            api_base: "https://api.openai.com/v1".to_string(),
            model: "gpt-3.5-turbo".to_string(),
            temperature: 0.0,
            connect_timeout_secs: 10,
        }
    }
}

/// Static prompt template settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PromptConfig {
    /// System message placed before the conversation history.
    pub system: String,
}

impl Default for PromptConfig {
    fn default() -> Self {
        Self {
            system: DEFAULT_SYSTEM_PROMPT.to_string(),
        }
    }
}

impl Config {
    /// Load configuration from a JSON file, falling back to defaults for missing fields.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            let data = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
                path: path.to_path_buf(),
                source,
            })?;
            serde_json::from_str(&data).map_err(|source| ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            })
        } else {
            tracing::warn!("Config file not found at {:?}, using defaults", path);
            Ok(Config::default())
        }
    }
}

/// Secret settings that never live in the config file.
#[derive(Clone)]
pub struct Secrets {
    pub api_key: String,
}

impl std::fmt::Debug for Secrets {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Secrets").field("api_key", &"<redacted>").finish()
    }
}

impl Secrets {
    /// Read the API key from the process environment, falling back to the
    /// environment file (if present).
    pub fn load(env_file: &Path) -> Result<Self, ConfigError> {
        Self::load_with(env_file, |key| std::env::var(key).ok())
    }

    /// Like [`Secrets::load`], with the process environment replaced by `env`.
    pub fn load_with<F>(env_file: &Path, env: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let file_vars = read_env_file(env_file)?;
        Self::from_lookup(|key| env(key).or_else(|| file_vars.get(key).cloned()))
    }

    /// Build from an arbitrary variable lookup. Empty values count as missing.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        match lookup(API_KEY_ENV) {
            Some(api_key) if !api_key.trim().is_empty() => Ok(Self { api_key }),
            _ => Err(ConfigError::MissingApiKey(API_KEY_ENV)),
        }
    }
}

/// Parse an environment file without touching the process environment.
/// A missing file yields no variables.
pub fn read_env_file(path: &Path) -> Result<HashMap<String, String>, ConfigError> {
    let env_err = |source: dotenvy::Error| ConfigError::EnvFile {
        path: path.to_path_buf(),
        source,
    };
    match dotenvy::from_path_iter(path) {
        Ok(iter) => {
            let vars = iter.collect::<Result<HashMap<_, _>, _>>().map_err(env_err)?;
            tracing::debug!(path = ?path, vars = vars.len(), "Loaded environment file");
            Ok(vars)
        }
        Err(e) if e.not_found() => Ok(HashMap::new()),
        Err(e) => Err(env_err(e)),
    }
}
