use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

/// Environment variable naming a YAML configuration file.
pub const CONFIG_ENV: &str = "FERRULE_CONFIG";
/// Environment variable overriding `server.listen_addr`.
pub const LISTEN_ENV: &str = "LISTEN";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid config: {0}")]
    Parse(#[from] serde_yaml::Error),
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub http: HttpConfig,
    pub static_files: Option<StaticFilesConfig>,
    pub log_level: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub listen_addr: String,
    /// Listen backlog. Kept shallow so overload surfaces immediately.
    pub backlog: i32,
    /// Registry capacity, i.e. the ceiling on concurrent connections.
    pub max_connections: usize,
    /// Maximum number of readiness events captured per wait.
    pub max_events: usize,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Size of one header-storage region. A single header key or value
    /// larger than this is rejected, so it should be at least
    /// `max_header_bytes`.
    pub arena_region_size: usize,
    pub read_chunk_size: usize,
    pub initial_buffer_size: usize,
    /// Ceiling on the request line plus header block, terminator included.
    pub max_header_bytes: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StaticFilesConfig {
    pub root: PathBuf,
    #[serde(default = "default_index")]
    pub index: String,
}

fn default_index() -> String {
    "index.html".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            http: HttpConfig::default(),
            static_files: None,
            log_level: "info".to_string(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: "127.0.0.1:8080".to_string(),
            backlog: 0,
            max_connections: 1024,
            max_events: 1024,
        }
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            arena_region_size: 8 * 1024,
            read_chunk_size: 1024,
            initial_buffer_size: 1024,
            max_header_bytes: 8 * 1024,
        }
    }
}

impl Config {
    /// Loads the file named by `FERRULE_CONFIG` (or defaults when unset),
    /// then applies the `LISTEN` override.
    pub fn load() -> Result<Self, ConfigError> {
        let mut cfg = match std::env::var_os(CONFIG_ENV) {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };

        if let Ok(listen_addr) = std::env::var(LISTEN_ENV) {
            cfg.server.listen_addr = listen_addr;
        }

        Ok(cfg)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml_str(&raw)
    }

    pub fn from_yaml_str(raw: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(raw)?)
    }

    /// The configured log level, falling back to `INFO` on unknown names.
    pub fn tracing_level(&self) -> tracing::Level {
        self.log_level.parse().unwrap_or(tracing::Level::INFO)
    }
}
