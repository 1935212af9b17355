// Configuration module for anitime
// Handles the XDG-compliant config directory and the TOML configuration file

use anyhow::{Context, Result};
use serde::Deserialize;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::services::jikan::{JikanClient, JIKAN_API_BASE};

const APP_NAME: &str = "anitime";
const CONFIG_FILENAME: &str = "config.toml";

/// TOML configuration file structure
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ConfigFile {
    /// Server configuration
    pub server: ServerConfig,

    /// API naming and mount point
    pub api: ApiConfig,

    /// Upstream catalog (Jikan) configuration
    pub jikan: JikanConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Server port (default: 8000)
    pub port: u16,

    /// Bind address (default: 0.0.0.0)
    pub bind_address: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 8000,
            bind_address: "0.0.0.0".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Name shown in the welcome message
    pub project_name: String,

    pub version: String,

    /// Path prefix for the versioned API (default: /api/v1)
    pub prefix: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            project_name: "AniTime API".to_string(),
            version: "1.0.0".to_string(),
            prefix: "/api/v1".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct JikanConfig {
    /// Jikan v4 base URL
    pub base_url: String,

    /// Per-request timeout in seconds (default: 30)
    pub timeout_secs: u64,

    /// Result limit when the caller gives none (default: 10)
    pub default_limit: u32,
}

impl Default for JikanConfig {
    fn default() -> Self {
        Self {
            base_url: JIKAN_API_BASE.to_string(),
            timeout_secs: 30,
            default_limit: 10,
        }
    }
}

/// Application configuration - combines TOML file with environment overrides
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Directory config.toml was looked up in
    pub config_dir: PathBuf,

    /// Server port
    pub port: u16,

    /// Bind address
    pub bind_address: String,

    pub api: ApiConfig,

    pub jikan: JikanConfig,
}

impl AppConfig {
    /// Load configuration from TOML file and environment
    ///
    /// Priority (highest to lowest):
    /// 1. Environment variables
    /// 2. TOML config file
    /// 3. Default values
    pub fn load() -> Self {
        let config_dir = Self::find_config_dir();
        let config_file = Self::load_config_file(&config_dir);

        Self::from_file(config_dir, config_file).with_env_overrides()
    }

    /// Build configuration from a parsed config file, without looking at the environment
    pub fn from_file(config_dir: PathBuf, config_file: ConfigFile) -> Self {
        let mut api = config_file.api;
        api.prefix = normalize_prefix(&api.prefix);

        Self {
            config_dir,
            port: config_file.server.port,
            bind_address: config_file.server.bind_address,
            api,
            jikan: config_file.jikan,
        }
    }

    /// Find the config directory (for locating config.toml)
    fn find_config_dir() -> PathBuf {
        // Environment variable takes priority
        if let Ok(path) = std::env::var("ANITIME_CONFIG_DIR") {
            return PathBuf::from(path);
        }

        // Then XDG config dir
        if let Some(dir) = dirs::config_dir() {
            return dir.join(APP_NAME);
        }

        // Fallback to current directory
        std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
    }

    /// Load and parse the TOML config file
    fn load_config_file(config_dir: &Path) -> ConfigFile {
        let config_path = config_dir.join(CONFIG_FILENAME);

        if !config_path.exists() {
            tracing::debug!(
                "No config file found at {}, using defaults",
                config_path.display()
            );
            return ConfigFile::default();
        }

        match std::fs::read_to_string(&config_path) {
            Ok(contents) => match toml::from_str(&contents) {
                Ok(config) => {
                    tracing::info!("Loaded configuration from {}", config_path.display());
                    config
                }
                Err(e) => {
                    tracing::warn!(
                        "Failed to parse config file {}: {}. Using defaults.",
                        config_path.display(),
                        e
                    );
                    ConfigFile::default()
                }
            },
            Err(e) => {
                tracing::warn!(
                    "Failed to read config file {}: {}. Using defaults.",
                    config_path.display(),
                    e
                );
                ConfigFile::default()
            }
        }
    }

    /// Apply environment overrides on top of file values
    fn with_env_overrides(mut self) -> Self {
        if let Some(port) = Self::env_port() {
            self.port = port;
        }

        if let Ok(bind_address) = std::env::var("ANITIME_BIND_ADDRESS") {
            self.bind_address = bind_address;
        }

        if let Ok(prefix) = std::env::var("ANITIME_API_PREFIX") {
            self.api.prefix = normalize_prefix(&prefix);
        }

        if let Ok(base_url) = std::env::var("JIKAN_BASE_URL") {
            self.jikan.base_url = base_url;
        }

        if let Some(timeout) = std::env::var("JIKAN_TIMEOUT_SECS")
            .ok()
            .and_then(|t| t.parse().ok())
        {
            self.jikan.timeout_secs = timeout;
        }

        self
    }

    fn env_port() -> Option<u16> {
        std::env::var("ANITIME_PORT")
            .ok()
            .and_then(|p| p.parse().ok())
    }

    /// Address the server binds to
    pub fn socket_addr(&self) -> Result<SocketAddr> {
        format!("{}:{}", self.bind_address, self.port)
            .parse()
            .with_context(|| {
                format!(
                    "Invalid bind address {}:{}",
                    self.bind_address, self.port
                )
            })
    }

    /// Build the catalog client described by this configuration
    pub fn jikan_client(&self) -> JikanClient {
        JikanClient::with_base_url(
            &self.jikan.base_url,
            Duration::from_secs(self.jikan.timeout_secs),
        )
    }

    /// Log configuration status
    pub fn log_config(&self) {
        tracing::info!("Configuration directory: {}", self.config_dir.display());
        tracing::info!("Server listening on {}:{}", self.bind_address, self.port);
        tracing::info!(
            "{} v{} mounted at {}",
            self.api.project_name,
            self.api.version,
            if self.api.prefix.is_empty() { "/" } else { self.api.prefix.as_str() }
        );
        tracing::info!("Catalog upstream: {}", self.jikan.base_url);
        tracing::debug!(
            "Catalog timeout: {}s, default limit: {}",
            self.jikan.timeout_secs,
            self.jikan.default_limit
        );
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::from_file(PathBuf::from("."), ConfigFile::default())
    }
}

/// "/api/v1/" and "api/v1" both become "/api/v1"; "/" and "" become ""
fn normalize_prefix(prefix: &str) -> String {
    let trimmed = prefix.trim().trim_matches('/');
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("/{}", trimmed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_file() {
        let config = ConfigFile::default();
        assert_eq!(config.server.port, 8000);
        assert_eq!(config.server.bind_address, "0.0.0.0");
        assert_eq!(config.api.prefix, "/api/v1");
        assert_eq!(config.api.project_name, "AniTime API");
        assert_eq!(config.jikan.base_url, "https://api.jikan.moe/v4");
        assert_eq!(config.jikan.default_limit, 10);
    }

    #[test]
    fn test_parse_config_toml() {
        let toml_str = r#"
[server]
port = 9000
bind_address = "127.0.0.1"

[api]
prefix = "/api/v2/"

[jikan]
base_url = "http://localhost:8080/v4"
timeout_secs = 5
"#;
        let config: ConfigFile = toml::from_str(toml_str).unwrap();
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.bind_address, "127.0.0.1");
        assert_eq!(config.jikan.base_url, "http://localhost:8080/v4");
        assert_eq!(config.jikan.timeout_secs, 5);
        assert_eq!(config.jikan.default_limit, 10); // default

        let app = AppConfig::from_file(PathBuf::from("/tmp"), config);
        assert_eq!(app.api.prefix, "/api/v2");
        assert_eq!(app.socket_addr().unwrap().to_string(), "127.0.0.1:9000");
    }

    #[test]
    fn test_partial_config_toml() {
        // Only specify what you need
        let toml_str = r#"
[api]
project_name = "Watch Planner"
"#;
        let config: ConfigFile = toml::from_str(toml_str).unwrap();
        assert_eq!(config.server.port, 8000); // default
        assert_eq!(config.api.project_name, "Watch Planner"); // from file
        assert_eq!(config.api.version, "1.0.0"); // default
    }

    #[test]
    fn test_normalize_prefix() {
        assert_eq!(normalize_prefix("/api/v1"), "/api/v1");
        assert_eq!(normalize_prefix("api/v1/"), "/api/v1");
        assert_eq!(normalize_prefix("/"), "");
        assert_eq!(normalize_prefix(""), "");
    }

    #[test]
    fn test_invalid_bind_address() {
        let mut config = AppConfig::default();
        config.bind_address = "not an address".to_string();
        assert!(config.socket_addr().is_err());
    }

    #[test]
    fn test_jikan_client_from_config() {
        let mut config = AppConfig::default();
        config.jikan.base_url = "http://127.0.0.1:3000/v4/".to_string();
        assert_eq!(config.jikan_client().base_url(), "http://127.0.0.1:3000/v4");
    }
}
