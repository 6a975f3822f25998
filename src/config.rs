//! Defines the client configuration: where the backend lives and where the
//! client keeps its local state.

use std::env;
use std::path::PathBuf;

/// The environment variable overriding the backend base URL.
pub const API_URL_VAR: &str = "MONETA_API_URL";

/// The environment variable overriding the data directory.
pub const DATA_DIR_VAR: &str = "MONETA_DATA_DIR";

/// The backend used when nothing else is configured, the address the
/// reference backend serves on locally.
pub const DEFAULT_API_URL: &str = "http://127.0.0.1:8000";

/// Where the backend is and where to keep local state such as the saved
/// bearer token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Base URL of the backend API, without a trailing slash.
    pub base_url: String,
    /// Directory for durable client state.
    pub data_dir: PathBuf,
}

impl ClientConfig {
    /// Create a config from explicit values.
    pub fn new(base_url: impl Into<String>, data_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_url: base_url.into(),
            data_dir: data_dir.into(),
        }
    }

    /// Build a config from optional overrides, falling back to the
    /// environment and then to defaults.
    ///
    /// The default data directory is `~/.moneta`, or `./.moneta` when no
    /// home directory is known.
    pub fn resolve(base_url: Option<String>, data_dir: Option<PathBuf>) -> Self {
        let base_url = base_url
            .or_else(|| env::var(API_URL_VAR).ok())
            .unwrap_or_else(|| DEFAULT_API_URL.to_owned());

        let data_dir = data_dir
            .or_else(|| env::var_os(DATA_DIR_VAR).map(PathBuf::from))
            .unwrap_or_else(default_data_dir);

        Self { base_url, data_dir }
    }
}

fn default_data_dir() -> PathBuf {
    match env::var_os("HOME") {
        Some(home) => PathBuf::from(home).join(".moneta"),
        None => PathBuf::from(".moneta"),
    }
}

#[cfg(test)]
mod resolve_tests {
    use std::path::PathBuf;

    use super::ClientConfig;

    #[test]
    fn explicit_values_win() {
        let config = ClientConfig::resolve(
            Some("https://money.example.com".to_owned()),
            Some(PathBuf::from("/tmp/moneta")),
        );

        assert_eq!(config.base_url, "https://money.example.com");
        assert_eq!(config.data_dir, PathBuf::from("/tmp/moneta"));
    }

    #[test]
    fn data_dir_defaults_under_the_home_directory() {
        let config = ClientConfig::resolve(Some("http://localhost:8000".to_owned()), None);

        assert!(config.data_dir.ends_with(".moneta"));
    }
}
