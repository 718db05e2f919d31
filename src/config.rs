//! Configuration for the report pipeline and upload server
//!
//! Loads configuration from config.yml file

use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::{Error, Result};

/// Default constants (fallback if config.yml not found)
pub const DATA_DIR: &str = "data";
pub const UPLOAD_FILE: &str = "data_dump.csv";
pub const REPORTS_DIR: &str = "reports";
pub const BIND_ADDR: &str = "127.0.0.1:5000";
pub const MAX_UPLOAD_MB: usize = 50;

/// YAML config structures
#[derive(Debug, Deserialize)]
struct YamlConfig {
    paths: Option<PathsConfig>,
    input: Option<InputConfig>,
    server: Option<ServerConfig>,
    metrics: Option<MetricsConfig>,
}

#[derive(Debug, Default, Deserialize)]
struct PathsConfig {
    data_dir: Option<String>,
    upload_file: Option<String>,
    reports_dir: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct InputConfig {
    delimiter: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ServerConfig {
    bind: Option<String>,
    max_upload_mb: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
struct MetricsConfig {
    addr: Option<String>,
}

/// Main configuration struct
#[derive(Debug, Clone)]
pub struct Config {
    pub data_dir: PathBuf,
    pub upload_file: String,
    pub reports_dir: PathBuf,
    pub delimiter: u8,
    pub bind_addr: String,
    pub max_upload_mb: usize,
    pub metrics_addr: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

impl Config {
    /// Load configuration from config.yml or use defaults
    /// Environment variables take precedence over config.yml values
    pub fn new() -> Self {
        Self::load_from_file("config.yml")
            .or_else(|_| Self::load_from_file("../config.yml"))
            .unwrap_or_else(|_| Self::defaults())
    }

    /// Resolve a value: prefer env var if config value looks like ${VAR}
    fn resolve_env_string(value: Option<String>, env_key: Option<&str>) -> Option<String> {
        if let Some(ref v) = value {
            if let Some(var_name) = v.strip_prefix("${").and_then(|s| s.strip_suffix('}')) {
                return std::env::var(var_name).ok().filter(|s| !s.is_empty());
            }
        }
        if let Some(key) = env_key {
            if let Ok(env_val) = std::env::var(key) {
                if !env_val.is_empty() {
                    return Some(env_val);
                }
            }
        }
        value.filter(|s| !s.is_empty())
    }

    /// Parse a single-byte field delimiter; `\t` and `tab` are accepted for TSV.
    fn parse_delimiter(value: &str) -> Result<u8> {
        match value {
            "\\t" | "\t" | "tab" => Ok(b'\t'),
            s if s.len() == 1 && s.is_ascii() => Ok(s.as_bytes()[0]),
            other => Err(Error::ConfigError(format!(
                "delimiter must be a single ASCII character, got {:?}",
                other
            ))),
        }
    }

    /// Load .env file into environment variables using dotenvy
    fn load_dotenv() {
        if dotenvy::dotenv().is_err() {
            let _ = dotenvy::from_filename("../.env");
        }
    }

    /// Load configuration from a specific file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::load_dotenv();

        let content = fs::read_to_string(path.as_ref())
            .map_err(|e| Error::ConfigError(format!("Failed to read config file: {}", e)))?;

        let yaml: YamlConfig = serde_yaml::from_str(&content)
            .map_err(|e| Error::ConfigError(format!("Failed to parse config file: {}", e)))?;

        let paths = yaml.paths.unwrap_or_default();
        let input = yaml.input.unwrap_or_default();
        let server = yaml.server.unwrap_or_default();
        let metrics = yaml.metrics.unwrap_or_default();

        let delimiter = match Self::resolve_env_string(input.delimiter, None) {
            Some(d) => Self::parse_delimiter(&d)?,
            None => b',',
        };

        let max_upload_mb = server.max_upload_mb.unwrap_or(MAX_UPLOAD_MB);
        if max_upload_mb == 0 {
            return Err(Error::ConfigError(
                "server.max_upload_mb must be positive".to_string(),
            ));
        }

        Ok(Self {
            data_dir: Self::resolve_env_string(paths.data_dir, Some("CHAT_REPORT_DATA_DIR"))
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DATA_DIR)),
            upload_file: Self::resolve_env_string(paths.upload_file, None)
                .unwrap_or_else(|| UPLOAD_FILE.to_string()),
            reports_dir: Self::resolve_env_string(
                paths.reports_dir,
                Some("CHAT_REPORT_REPORTS_DIR"),
            )
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(REPORTS_DIR)),
            delimiter,
            bind_addr: Self::resolve_env_string(server.bind, Some("CHAT_REPORT_BIND"))
                .unwrap_or_else(|| BIND_ADDR.to_string()),
            max_upload_mb,
            metrics_addr: Self::resolve_env_string(metrics.addr, Some("METRICS_ADDR")),
        })
    }

    /// Create config with defaults, still honouring env overrides
    pub fn defaults() -> Self {
        Self {
            data_dir: Self::resolve_env_string(None, Some("CHAT_REPORT_DATA_DIR"))
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DATA_DIR)),
            upload_file: UPLOAD_FILE.to_string(),
            reports_dir: Self::resolve_env_string(None, Some("CHAT_REPORT_REPORTS_DIR"))
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(REPORTS_DIR)),
            delimiter: b',',
            bind_addr: Self::resolve_env_string(None, Some("CHAT_REPORT_BIND"))
                .unwrap_or_else(|| BIND_ADDR.to_string()),
            max_upload_mb: MAX_UPLOAD_MB,
            metrics_addr: Self::resolve_env_string(None, Some("METRICS_ADDR")),
        }
    }

    /// Config rooted in an explicit working directory; used by tests and embedders.
    pub fn rooted_at<P: AsRef<Path>>(root: P) -> Self {
        let root = root.as_ref();
        Self {
            data_dir: root.join(DATA_DIR),
            upload_file: UPLOAD_FILE.to_string(),
            reports_dir: root.join(REPORTS_DIR),
            delimiter: b',',
            bind_addr: BIND_ADDR.to_string(),
            max_upload_mb: MAX_UPLOAD_MB,
            metrics_addr: None,
        }
    }

    /// Fixed location uploads are persisted to (overwritten on every upload).
    pub fn upload_path(&self) -> PathBuf {
        self.data_dir.join(&self.upload_file)
    }

    /// Upload body limit in bytes.
    pub fn max_upload_bytes(&self) -> usize {
        self.max_upload_mb * 1024 * 1024
    }
}
