use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    NotFound(String),

    #[error("Failed to read configuration file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid JSON configuration: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid YAML configuration: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(rename = "@context")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<serde_json::Value>,

    #[serde(default)]
    pub system_config: SystemConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemConfig {
    #[serde(default = "default_conf_version")]
    pub conf_version: Option<String>,

    /// Root of the upload cache; copies live in `<cache_dir>/uploads`
    #[serde(default = "default_cache_dir")]
    pub cache_dir: String,

    /// `tracing_subscriber` filter directive, overridden by `RUST_LOG`
    #[serde(default = "default_log_filter")]
    pub log_filter: String,
}

fn default_conf_version() -> Option<String> {
    Some("v1.0.0".to_string())
}

fn default_cache_dir() -> String {
    std::env::temp_dir()
        .join("langid-predict")
        .to_string_lossy()
        .to_string()
}

fn default_log_filter() -> String {
    "langid_predict=info".to_string()
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            conf_version: default_conf_version(),
            cache_dir: default_cache_dir(),
            log_filter: default_log_filter(),
        }
    }
}

impl SystemConfig {
    pub fn cache_path(&self) -> PathBuf {
        PathBuf::from(&self.cache_dir)
    }
}

impl Config {
    /// Load a JSON/JSON-LD or YAML config, picked by file extension.
    pub fn load(path: &str) -> Result<Self, ConfigError> {
        let content = read_config_text(path)?;

        let path_lower = path.to_lowercase();
        if path_lower.ends_with(".jsonld") || path_lower.ends_with(".json") {
            Ok(serde_json::from_str(&content)?)
        } else {
            Ok(serde_yaml::from_str(&content)?)
        }
    }
}

/// Read a config file and substitute `${VAR}` with environment values.
/// Unset variables are left untouched.
pub fn read_config_text(config_path: &str) -> Result<String, ConfigError> {
    if !Path::new(config_path).exists() {
        return Err(ConfigError::NotFound(config_path.to_string()));
    }

    let bytes = fs::read(config_path).map_err(|source| ConfigError::Read {
        path: config_path.to_string(),
        source,
    })?;
    let content = decode_text(&bytes);

    Ok(substitute_env_vars(&content))
}

fn substitute_env_vars(content: &str) -> String {
    let pattern = match Regex::new(r"\$\{(\w+)\}") {
        Ok(pattern) => pattern,
        Err(_) => return content.to_string(),
    };
    pattern
        .replace_all(content, |caps: &regex::Captures| {
            std::env::var(&caps[1]).unwrap_or_else(|_| caps[0].to_string())
        })
        .into_owned()
}

/// UTF-8 with optional BOM, falling back to GBK for legacy files.
fn decode_text(bytes: &[u8]) -> String {
    let bytes = bytes.strip_prefix(&[0xEF, 0xBB, 0xBF]).unwrap_or(bytes);
    match std::str::from_utf8(bytes) {
        Ok(text) => text.to_string(),
        Err(_) => {
            let (cow, _, _) = encoding_rs::GBK.decode(bytes);
            cow.into_owned()
        }
    }
}
