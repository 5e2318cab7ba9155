use std::net::SocketAddr;
use std::path::PathBuf;

use crate::advisory::{DEFAULT_MODEL, DEFAULT_OLLAMA_URL};

/// Application-level constants
pub const APP_NAME: &str = "BioScan";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default bind address for the HTTP API.
pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:8080";

/// Default timeout for a single language model call.
pub const DEFAULT_OLLAMA_TIMEOUT_SECS: u64 = 120;

/// Get the application data directory
/// ~/BioScan/ on all platforms. Falls back to the working directory when no
/// home directory can be determined.
pub fn app_data_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_NAME)
}

/// Default SQLite database file.
pub fn database_path() -> PathBuf {
    app_data_dir().join("bioscan.db")
}

/// Log filter used when `RUST_LOG` is unset.
pub fn default_log_filter() -> &'static str {
    "bioscan_lib=info,bioscan=info,tower_http=warn"
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: &'static str, value: String },
}

/// Runtime configuration, read from the environment.
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    /// `None` keeps all profiles in memory.
    pub database_path: Option<PathBuf>,
    pub ollama_url: String,
    pub model: String,
    pub ollama_timeout_secs: u64,
    /// Create the demo roster at startup and log its bearer tokens.
    pub seed_demo: bool,
    /// Give profiles created on first login demo devices and vitals.
    pub demo_data: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 8080)),
            database_path: Some(database_path()),
            ollama_url: DEFAULT_OLLAMA_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            ollama_timeout_secs: DEFAULT_OLLAMA_TIMEOUT_SECS,
            seed_demo: false,
            demo_data: false,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup (the environment in production).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(raw) = lookup("BIOSCAN_BIND_ADDR") {
            config.bind_addr = raw.parse().map_err(|_| ConfigError::InvalidValue {
                key: "BIOSCAN_BIND_ADDR",
                value: raw.clone(),
            })?;
        }
        if let Some(raw) = lookup("BIOSCAN_DB_PATH") {
            config.database_path = match raw.as_str() {
                ":memory:" => None,
                path => Some(PathBuf::from(path)),
            };
        }
        if let Some(raw) = lookup("OLLAMA_HOST") {
            config.ollama_url = if raw.starts_with("http://") || raw.starts_with("https://") {
                raw
            } else {
                format!("http://{raw}")
            };
        }
        if let Some(raw) = lookup("BIOSCAN_MODEL") {
            if !raw.trim().is_empty() {
                config.model = raw.trim().to_string();
            }
        }
        if let Some(raw) = lookup("BIOSCAN_OLLAMA_TIMEOUT_SECS") {
            config.ollama_timeout_secs = match raw.parse::<u64>() {
                Ok(secs) if secs > 0 => secs,
                _ => {
                    return Err(ConfigError::InvalidValue {
                        key: "BIOSCAN_OLLAMA_TIMEOUT_SECS",
                        value: raw,
                    })
                }
            };
        }
        if let Some(raw) = lookup("BIOSCAN_SEED_DEMO") {
            config.seed_demo = parse_flag("BIOSCAN_SEED_DEMO", &raw)?;
        }
        if let Some(raw) = lookup("BIOSCAN_DEMO_DATA") {
            config.demo_data = parse_flag("BIOSCAN_DEMO_DATA", &raw)?;
        }

        Ok(config)
    }
}

fn parse_flag(key: &'static str, raw: &str) -> Result<bool, ConfigError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            key,
            value: raw.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn app_data_dir_ends_with_app_name() {
        assert!(app_data_dir().ends_with("BioScan"));
        assert!(database_path().starts_with(app_data_dir()));
    }

    #[test]
    fn app_version_matches_cargo() {
        assert_eq!(APP_VERSION, "0.1.0");
    }

    #[test]
    fn empty_environment_gives_defaults() {
        let config = AppConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.bind_addr.to_string(), DEFAULT_BIND_ADDR);
        assert!(!config.seed_demo);
    }

    #[test]
    fn environment_overrides_apply() {
        let config = AppConfig::from_lookup(lookup(&[
            ("BIOSCAN_BIND_ADDR", "0.0.0.0:9000"),
            ("BIOSCAN_DB_PATH", ":memory:"),
            ("OLLAMA_HOST", "gpu-box:11434"),
            ("BIOSCAN_MODEL", "mistral"),
            ("BIOSCAN_OLLAMA_TIMEOUT_SECS", "30"),
            ("BIOSCAN_SEED_DEMO", "1"),
            ("BIOSCAN_DEMO_DATA", "true"),
        ]))
        .unwrap();
        assert_eq!(config.bind_addr.port(), 9000);
        assert!(config.database_path.is_none());
        assert_eq!(config.ollama_url, "http://gpu-box:11434");
        assert_eq!(config.model, "mistral");
        assert_eq!(config.ollama_timeout_secs, 30);
        assert!(config.seed_demo);
        assert!(config.demo_data);
    }

    #[test]
    fn invalid_values_are_rejected() {
        assert!(AppConfig::from_lookup(lookup(&[("BIOSCAN_BIND_ADDR", "nowhere")])).is_err());
        assert!(AppConfig::from_lookup(lookup(&[("BIOSCAN_OLLAMA_TIMEOUT_SECS", "0")])).is_err());
        assert!(AppConfig::from_lookup(lookup(&[("BIOSCAN_SEED_DEMO", "maybe")])).is_err());
    }
}
