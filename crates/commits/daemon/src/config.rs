//! Configuration for commitsd

use commits_credit::CreditPolicy;
use commits_parser::ParserConfig;
use serde::{Deserialize, Serialize};
use std::net::{Ipv4Addr, SocketAddr};

use crate::error::DaemonError;

/// Main daemon configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DaemonConfig {
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Storage configuration
    #[serde(default)]
    pub storage: StorageConfig,

    /// Expression parsing
    #[serde(default)]
    pub parser: ParserConfig,

    /// Credit scoring rates
    #[serde(default)]
    pub credit: CreditPolicy,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Listen address
    pub listen_addr: SocketAddr,

    /// Enable CORS
    #[serde(default = "default_true")]
    pub enable_cors: bool,

    /// Request timeout in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: SocketAddr::from((Ipv4Addr::LOCALHOST, 8080)),
            enable_cors: true,
            request_timeout_secs: default_request_timeout(),
        }
    }
}

/// Storage configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum StorageConfig {
    /// In-memory storage (for development/testing)
    #[default]
    Memory,

    /// PostgreSQL storage
    Postgres {
        /// Connection URL
        url: String,

        /// Maximum connections in pool
        #[serde(default = "default_pool_size")]
        max_connections: u32,

        /// Connection timeout in seconds
        #[serde(default = "default_connection_timeout")]
        connect_timeout_secs: u64,
    },
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level or `EnvFilter` directive
    #[serde(default = "default_log_level")]
    pub level: String,

    /// JSON format
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

// Default value helpers
fn default_true() -> bool {
    true
}

fn default_request_timeout() -> u64 {
    30
}

fn default_pool_size() -> u32 {
    10
}

fn default_connection_timeout() -> u64 {
    5
}

fn default_log_level() -> String {
    "info".to_string()
}

impl DaemonConfig {
    /// Load configuration: defaults, then the optional file, then
    /// `COMMITS_` environment variables (`COMMITS_SERVER__LISTEN_ADDR`).
    pub fn load(path: Option<&str>) -> Result<Self, config::ConfigError> {
        let mut builder = config::Config::builder();

        // Add default configuration
        builder = builder.add_source(config::Config::try_from(&DaemonConfig::default())?);

        // Add file configuration if provided
        if let Some(path) = path {
            builder = builder.add_source(config::File::with_name(path).required(false));
        }

        builder = builder.add_source(
            config::Environment::with_prefix("COMMITS")
                .prefix_separator("_")
                .separator("__")
                .list_separator(",")
                .with_list_parse_key("parser.deadline_keywords")
                .with_list_parse_key("parser.completion_markers")
                .try_parsing(true),
        );

        builder.build()?.try_deserialize()
    }

    /// Reject settings the parser or credit engine would refuse.
    pub fn validate(&self) -> Result<(), DaemonError> {
        self.parser
            .validate()
            .map_err(|e| DaemonError::Config(format!("parser: {e}")))?;
        self.credit
            .validate()
            .map_err(|e| DaemonError::Config(format!("credit: {e}")))?;
        if self.server.request_timeout_secs == 0 {
            return Err(DaemonError::Config(
                "server.request_timeout_secs must be positive".to_string(),
            ));
        }
        Ok(())
    }
}
