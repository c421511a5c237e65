//! Environment-driven configuration for the GraphRAG retrieval agent.
//!
//! Settings are loaded and validated once at startup (via `init_config`) and exposed through a
//! global, read-only view via `get_config`. The configuration powers the MCP server, the CLI, and
//! covers:
//!
//! - Graph connectivity (`GRAPH_ENDPOINT`, `GRAPH_USERNAME`, `GRAPH_PASSWORD`, `GRAPH_DATABASE`).
//! - Vector index identity (`VECTOR_INDEX_NAME`, `VECTOR_DIMENSION`).
//! - Embedding model identity (`EMBEDDING_MODEL_ID`).
//! - Retrieval limits (`RETRIEVAL_DEFAULT_LIMIT`, `RETRIEVAL_MAX_LIMIT`).
//! - Per-call timeout (`TIMEOUT_PER_CALL_MILLIS`).
//! - Log sink override (`RUSTY_GRAPH_LOG_FILE?`).

use serde::Deserialize;
use std::env;
use std::sync::OnceLock;
use thiserror::Error;

/// Errors encountered while loading configuration from environment variables.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Required environment variable was not provided.
    #[error("Missing environment variable: {0}")]
    MissingVariable(String),
    /// Environment variable contained a value that could not be parsed or violated a range rule.
    #[error("Invalid value for environment variable: {0}")]
    InvalidValue(String),
}

impl ConfigError {
    /// Stable numeric error code for this variant, per the closed error taxonomy.
    pub fn code(&self) -> u32 {
        match self {
            Self::MissingVariable(_) => 1001,
            Self::InvalidValue(_) => 1002,
        }
    }
}

/// Runtime configuration for the GraphRAG retrieval agent.
#[derive(Debug, Deserialize)]
pub struct Config {
    /// Bolt endpoint of the graph database (e.g. `bolt://localhost:7687`).
    pub graph_endpoint: String,
    /// Username used to authenticate against the graph database.
    pub graph_username: String,
    /// Password used to authenticate against the graph database.
    pub graph_password: String,
    /// Name of the graph database to connect to.
    pub graph_database: String,
    /// Name of the vector index queried for nearest-neighbor chunk search.
    pub vector_index_name: String,
    /// Expected dimensionality of chunk embeddings and query vectors.
    pub vector_dimension: usize,
    /// Identifier of the embedding model used to encode queries.
    pub embedding_model_id: String,
    /// Default number of results returned when callers omit `limit`.
    pub retrieval_default_limit: usize,
    /// Maximum number of results allowed per retrieval request.
    pub retrieval_max_limit: usize,
    /// Per-call timeout, in milliseconds, applied to embed/search/expand stages.
    pub timeout_per_call_millis: u64,
    /// Optional override for the rolling log file path.
    pub log_file: Option<String>,
}

impl Config {
    /// Load configuration from environment variables, performing validation along the way.
    pub fn from_env() -> Result<Self, ConfigError> {
        let retrieval_default_limit = load_usize_with_default("RETRIEVAL_DEFAULT_LIMIT", 5)?;
        let retrieval_max_limit = load_usize_with_default("RETRIEVAL_MAX_LIMIT", 50)?;
        let timeout_per_call_millis = load_u64_with_default("TIMEOUT_PER_CALL_MILLIS", 30_000)?;
        let vector_dimension: usize = load_env("VECTOR_DIMENSION")?
            .parse()
            .map_err(|_| ConfigError::InvalidValue("VECTOR_DIMENSION".to_string()))?;

        if retrieval_default_limit == 0 {
            return Err(ConfigError::InvalidValue(
                "RETRIEVAL_DEFAULT_LIMIT must be at least 1".into(),
            ));
        }
        if retrieval_max_limit == 0 {
            return Err(ConfigError::InvalidValue(
                "RETRIEVAL_MAX_LIMIT must be at least 1".into(),
            ));
        }
        if retrieval_default_limit > retrieval_max_limit {
            return Err(ConfigError::InvalidValue(
                "RETRIEVAL_DEFAULT_LIMIT cannot exceed RETRIEVAL_MAX_LIMIT".into(),
            ));
        }
        if vector_dimension == 0 {
            return Err(ConfigError::InvalidValue(
                "VECTOR_DIMENSION must be at least 1".into(),
            ));
        }

        Ok(Self {
            graph_endpoint: load_env("GRAPH_ENDPOINT")?,
            graph_username: load_env("GRAPH_USERNAME")?,
            graph_password: load_env("GRAPH_PASSWORD")?,
            graph_database: load_env("GRAPH_DATABASE")?,
            vector_index_name: load_env("VECTOR_INDEX_NAME")?,
            vector_dimension,
            embedding_model_id: load_env("EMBEDDING_MODEL_ID")?,
            retrieval_default_limit,
            retrieval_max_limit,
            timeout_per_call_millis,
            log_file: load_env_optional("RUSTY_GRAPH_LOG_FILE"),
        })
    }
}

fn load_usize_with_default(key: &str, default: usize) -> Result<usize, ConfigError> {
    match load_env_optional(key) {
        Some(value) => value
            .parse()
            .map_err(|_| ConfigError::InvalidValue(key.to_string())),
        None => Ok(default),
    }
}

fn load_u64_with_default(key: &str, default: u64) -> Result<u64, ConfigError> {
    match load_env_optional(key) {
        Some(value) => value
            .parse()
            .map_err(|_| ConfigError::InvalidValue(key.to_string())),
        None => Ok(default),
    }
}

fn load_env(key: &str) -> Result<String, ConfigError> {
    env::var(key).map_err(|_| ConfigError::MissingVariable(key.to_string()))
}

fn load_env_optional(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

/// Global configuration cache populated during process start.
pub static CONFIG: OnceLock<Config> = OnceLock::new();

/// Retrieve the loaded configuration, panicking if initialization has not occurred.
pub fn get_config() -> &'static Config {
    CONFIG.get().expect("Config not initialized")
}

/// Retrieve the loaded configuration if `init_config` has already run, without panicking.
pub fn get_config_if_set() -> Option<&'static Config> {
    CONFIG.get()
}

/// Load configuration from the environment and install it in the global cache.
///
/// Reads `APP_CONFIG_PATH` first and, if set, loads that file via `dotenvy` instead of the
/// default `.env` discovery; this is how the CLI's `--config` flag takes effect.
pub fn init_config() {
    match env::var("APP_CONFIG_PATH") {
        Ok(path) => {
            dotenvy::from_path(path).ok();
        }
        Err(_) => {
            dotenvy::dotenv().ok();
        }
    }
    let config = Config::from_env().expect("Failed to load config from environment");
    tracing::debug!(
        graph_endpoint = %config.graph_endpoint,
        graph_database = %config.graph_database,
        vector_index_name = %config.vector_index_name,
        vector_dimension = config.vector_dimension,
        embedding_model_id = %config.embedding_model_id,
        retrieval_default_limit = config.retrieval_default_limit,
        retrieval_max_limit = config.retrieval_max_limit,
        timeout_per_call_millis = config.timeout_per_call_millis,
        log_file = ?config.log_file,
        "Loaded configuration"
    );
    CONFIG.set(config).expect("Failed to set config");
}
