use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::ai::{AiError, ModelLadder, RetryPolicy};

/// Free-tier models tried in order; the first is the default
pub const DEFAULT_MODELS: [&str; 4] = [
    "meta-llama/llama-3.3-70b-instruct:free",
    "google/gemini-2.0-flash-exp:free",
    "mistralai/mistral-small-3.1-24b-instruct:free",
    "deepseek/deepseek-chat-v3-0324:free",
];

pub const DEFAULT_PORT: u16 = 3000;

pub const DEFAULT_GATEWAY_URL: &str = "https://openrouter.ai/api/v1/chat/completions";

/// Configuration for the studymate server
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// URL for the database connection
    pub database_url: String,
    /// Port the HTTP API listens on
    pub port: u16,
    /// Chat-completions endpoint of the LLM gateway
    pub gateway_url: String,
    /// Bearer token for the gateway
    pub api_key: Option<String>,
    /// Model fallback ladder, highest priority first
    pub models: Vec<String>,
    /// Wait before retrying the same model after a rate limit
    pub rate_limit_delay_ms: u64,
    /// Wait before retrying after a network failure
    pub network_retry_delay_ms: u64,
    /// Timeout for one gateway request
    pub request_timeout_secs: u64,
}

/// Update structure for Config with all fields optional
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ConfigUpdate {
    #[serde(default)]
    pub database_url: Option<String>,
    #[serde(default)]
    pub port: Option<u16>,
    #[serde(default)]
    pub gateway_url: Option<String>,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub models: Option<Vec<String>>,
    #[serde(default)]
    pub rate_limit_delay_ms: Option<u64>,
    #[serde(default)]
    pub network_retry_delay_ms: Option<u64>,
    #[serde(default)]
    pub request_timeout_secs: Option<u64>,
    /// Server address used by the command-line client
    #[serde(default)]
    pub server_url: Option<String>,
}

/// Command line arguments for the server
#[derive(Parser, Debug, Default)]
#[clap(name = "studymate", about = "Study companion API server")]
pub struct CliArgs {
    /// Database URL
    #[clap(long, env = "DATABASE_URL")]
    pub database_url: Option<String>,

    /// Port to listen on
    #[clap(long, env = "STUDYMATE_PORT")]
    pub port: Option<u16>,

    /// LLM gateway chat-completions URL
    #[clap(long, env = "STUDYMATE_GATEWAY_URL")]
    pub gateway_url: Option<String>,

    /// LLM gateway API key
    #[clap(long, env = "STUDYMATE_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Comma-separated model ladder
    #[clap(long, env = "STUDYMATE_MODELS", value_delimiter = ',')]
    pub models: Option<Vec<String>>,

    /// Delay after a rate limit, in milliseconds
    #[clap(long, env = "STUDYMATE_RATE_LIMIT_DELAY_MS")]
    pub rate_limit_delay_ms: Option<u64>,

    /// Delay after a network failure, in milliseconds
    #[clap(long, env = "STUDYMATE_NETWORK_RETRY_DELAY_MS")]
    pub network_retry_delay_ms: Option<u64>,

    /// Gateway request timeout, in seconds
    #[clap(long, env = "STUDYMATE_REQUEST_TIMEOUT_SECS")]
    pub request_timeout_secs: Option<u64>,

    /// Debug mode
    #[clap(long, env = "STUDYMATE_DEBUG", default_value_t = false)]
    pub debug: bool,
}

impl Config {
    /// Applies a config update to the current configuration
    pub fn apply_update(self, update: ConfigUpdate) -> Self {
        Self {
            database_url: update.database_url.unwrap_or(self.database_url),
            port: update.port.unwrap_or(self.port),
            gateway_url: update.gateway_url.unwrap_or(self.gateway_url),
            api_key: update.api_key.or(self.api_key),
            models: update.models.unwrap_or(self.models),
            rate_limit_delay_ms: update.rate_limit_delay_ms.unwrap_or(self.rate_limit_delay_ms),
            network_retry_delay_ms: update.network_retry_delay_ms.unwrap_or(self.network_retry_delay_ms),
            request_timeout_secs: update.request_timeout_secs.unwrap_or(self.request_timeout_secs),
        }
    }

    /// Retry budget built from the configured delays
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            rate_limit_delay: Duration::from_millis(self.rate_limit_delay_ms),
            network_retry_delay: Duration::from_millis(self.network_retry_delay_ms),
            ..RetryPolicy::default()
        }
    }

    /// The model ladder
    ///
    /// ### Errors
    ///
    /// Returns `AiError::InvalidConfig` if no non-blank model is configured
    pub fn model_ladder(&self) -> Result<ModelLadder, AiError> {
        ModelLadder::new(self.models.iter().cloned())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Returns the base (default) configuration
pub fn base_config(config_path: Option<PathBuf>) -> Config {
    let database_url = config_path.map_or("studymate.db".to_string(), |path| {
        path.join("studymate.db").to_string_lossy().to_string()
    });

    Config {
        database_url,
        port: DEFAULT_PORT,
        gateway_url: DEFAULT_GATEWAY_URL.to_string(),
        api_key: None,
        models: DEFAULT_MODELS.iter().map(|m| m.to_string()).collect(),
        rate_limit_delay_ms: 2000,
        network_retry_delay_ms: 1000,
        request_timeout_secs: 60,
    }
}

/// Loads configuration from a TOML file
///
/// A missing path or file yields an empty update.
///
/// ### Errors
///
/// Returns a message if the file exists but cannot be read or parsed
pub fn config_from_file(config_path: Option<PathBuf>) -> Result<ConfigUpdate, String> {
    let Some(config_path) = config_path else {
        return Ok(ConfigUpdate::default());
    };

    if !config_path.exists() {
        info!("Config file not found at {:?}, using defaults", config_path);
        return Ok(ConfigUpdate::default());
    }

    let content = fs::read_to_string(&config_path).map_err(|e| {
        warn!("Failed to read config file: {}", e);
        format!("Failed to read config file: {}", e)
    })?;

    let update = toml::from_str::<ConfigUpdate>(&content).map_err(|e| {
        warn!("Failed to parse config file: {}", e);
        format!("Failed to parse config file: {}", e)
    })?;

    info!("Loaded configuration from {:?}", config_path);
    Ok(update)
}

/// Loads configuration from command line arguments and environment variables
pub fn config_from_args(args: CliArgs) -> ConfigUpdate {
    ConfigUpdate {
        database_url: args.database_url,
        port: args.port,
        gateway_url: args.gateway_url,
        api_key: args.api_key,
        models: args.models,
        rate_limit_delay_ms: args.rate_limit_delay_ms,
        network_retry_delay_ms: args.network_retry_delay_ms,
        request_timeout_secs: args.request_timeout_secs,
        server_url: None,
    }
}

/// Platform configuration directory, if it exists
pub fn get_config_dir_path() -> Option<PathBuf> {
    let Some(proj_dirs) = ProjectDirs::from("com", "studymate", "studymate") else {
        warn!("Could not determine XDG config directory, skipping config file");
        return None;
    };

    let path = proj_dirs.config_dir().to_path_buf();
    if path.exists() {
        Some(path)
    } else {
        info!("Config path not found at {:?}, using defaults", path);
        None
    }
}

/// Gets the complete configuration by combining defaults with
/// values from config file, environment variables, and command line arguments
/// in order of increasing precedence
pub fn get_config(args: CliArgs) -> Config {
    let config_path = get_config_dir_path();
    let base = base_config(config_path.clone());

    let file_update = config_from_file(config_path.map(|p| p.join("config.toml"))).unwrap_or_default();
    let config = base.apply_update(file_update).apply_update(config_from_args(args));

    info!(
        "Final configuration: database_url={}, port={}, gateway_url={}, models={}",
        config.database_url,
        config.port,
        config.gateway_url,
        config.models.join(",")
    );

    config
}
