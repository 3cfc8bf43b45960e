//! Daemon configuration.
//!
//! Loaded from `~/.symcheck/config.toml` (or an explicit path). Every field
//! has a default, so a missing file yields a working configuration. The
//! completion-service credential is never stored here; only the name of the
//! environment variable that holds it.

use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Name of the config file inside the home directory.
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// Errors raised while loading configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The config file exists but could not be read.
    #[error("Failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// The config file is not valid TOML for this schema.
    #[error("Invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    /// A value parsed but is unusable.
    #[error("Invalid config value: {0}")]
    Invalid(String),
}

/// Top-level daemon configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SymcheckConfig {
    /// Root directory for config and data.
    pub home_dir: PathBuf,
    /// Data directory. Defaults to `<home_dir>/data`.
    pub data_dir: Option<PathBuf>,
    /// Address the HTTP API binds to.
    pub api_listen: String,
    /// Default log filter when `RUST_LOG` is unset.
    pub log_level: String,
    /// Completion service settings.
    pub completion: CompletionConfig,
    /// History store settings.
    pub history: HistoryConfig,
}

impl Default for SymcheckConfig {
    fn default() -> Self {
        Self {
            home_dir: default_home_dir(),
            data_dir: None,
            api_listen: "127.0.0.1:8000".to_string(),
            log_level: "info".to_string(),
            completion: CompletionConfig::default(),
            history: HistoryConfig::default(),
        }
    }
}

impl SymcheckConfig {
    /// Effective data directory.
    pub fn data_dir(&self) -> PathBuf {
        self.data_dir
            .clone()
            .unwrap_or_else(|| self.home_dir.join("data"))
    }

    /// Absolute path of the history database file.
    pub fn history_db_path(&self) -> PathBuf {
        if self.history.db_file.is_absolute() {
            self.history.db_file.clone()
        } else {
            self.data_dir().join(&self.history.db_file)
        }
    }

    /// Parse `api_listen` into a socket address.
    pub fn listen_addr(&self) -> Result<SocketAddr, ConfigError> {
        self.api_listen.parse().map_err(|e| {
            ConfigError::Invalid(format!("api_listen '{}': {e}", self.api_listen))
        })
    }

    /// Check the values that have no sensible fallback.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.listen_addr()?;
        if self.completion.api_key_env.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "completion.api_key_env must name an environment variable".to_string(),
            ));
        }
        if self.completion.max_tokens == 0 {
            return Err(ConfigError::Invalid(
                "completion.max_tokens must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// Completion service (LLM provider) settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CompletionConfig {
    /// Provider name, used for logging.
    pub provider: String,
    /// OpenAI-compatible API base URL.
    pub base_url: String,
    /// Environment variable holding the API key.
    pub api_key_env: String,
    /// Candidate models, most capable first.
    pub candidates: Vec<String>,
    /// Upper bound on generated tokens per call.
    pub max_tokens: u32,
    /// Per-request timeout for one candidate attempt.
    pub request_timeout_secs: u64,
}

/// OpenAI-compatible endpoint of the Groq API.
pub const GROQ_BASE_URL: &str = "https://api.groq.com/openai/v1";

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            provider: "groq".to_string(),
            base_url: GROQ_BASE_URL.to_string(),
            api_key_env: "GROQ_API_KEY".to_string(),
            candidates: default_candidates(),
            max_tokens: 800,
            request_timeout_secs: 60,
        }
    }
}

/// Default candidate chain: long context first, balanced next, fast last.
pub fn default_candidates() -> Vec<String> {
    vec![
        "mixtral-8x7b-32768".to_string(),
        "llama-3.1-70b-versatile".to_string(),
        "llama-3.1-8b-instant".to_string(),
    ]
}

/// History store settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoryConfig {
    /// Database file, relative to the data directory unless absolute.
    pub db_file: PathBuf,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            db_file: PathBuf::from("symptom_history.db"),
        }
    }
}

/// `~/.symcheck`, or `./.symcheck` when no home directory is known.
pub fn default_home_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".symcheck")
}

/// Load configuration from `path`, or from the default home when `None`.
///
/// A missing file is not an error; defaults are returned instead.
pub fn load_config(path: Option<&Path>) -> Result<SymcheckConfig, ConfigError> {
    let path = path
        .map(Path::to_path_buf)
        .unwrap_or_else(|| default_home_dir().join(CONFIG_FILE_NAME));

    if !path.exists() {
        return Ok(SymcheckConfig::default());
    }

    let raw = std::fs::read_to_string(&path).map_err(|source| ConfigError::Read {
        path: path.clone(),
        source,
    })?;
    let config: SymcheckConfig =
        toml::from_str(&raw).map_err(|source| ConfigError::Parse { path, source })?;
    config.validate()?;
    Ok(config)
}
