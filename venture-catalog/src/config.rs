//! Configuration management using Figment
//!
//! Configuration is loaded from multiple sources with the following precedence (highest to lowest):
//! 1. Environment variables (prefix: CATALOG_)
//! 2. Current working directory: ./config.toml
//! 3. XDG config directory: ~/.config/venture-catalog/{service_name}/config.toml
//! 4. System directory: /etc/venture-catalog/{service_name}/config.toml
//! 5. Default values

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::Result;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Service configuration
    pub service: ServiceConfig,

    /// Database configuration (required by the service binary)
    #[serde(default)]
    pub database: Option<DatabaseConfig>,

    /// List-read paging defaults
    #[serde(default)]
    pub pagination: PaginationConfig,

    /// Enumerations offered to organizations and innovations
    #[serde(default)]
    pub catalog: CatalogConfig,
}

/// Service-level configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Service name
    pub name: String,

    /// Port to listen on
    #[serde(default = "default_port")]
    pub port: u16,

    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Request body size limit in MB
    #[serde(default = "default_body_limit_mb")]
    pub body_limit_mb: usize,

    /// CORS mode: permissive, restrictive
    #[serde(default = "default_cors_mode")]
    pub cors_mode: String,
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Database connection URL
    pub url: String,

    /// Maximum number of connections in the pool
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    /// Minimum idle connections
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,

    /// Connection timeout in seconds
    #[serde(default = "default_connection_timeout")]
    pub connection_timeout_secs: u64,

    /// Maximum retry attempts for establishing database connection
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Delay between retry attempts in seconds
    #[serde(default = "default_retry_delay")]
    pub retry_delay_secs: u64,

    /// Apply the bundled schema migrations at startup
    #[serde(default = "default_false")]
    pub run_migrations: bool,
}

impl DatabaseConfig {
    /// Pool acquire timeout
    pub fn connection_timeout(&self) -> Duration {
        Duration::from_secs(self.connection_timeout_secs)
    }
}

/// Paging defaults applied to list reads
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaginationConfig {
    /// Limit used when the caller supplies none
    #[serde(default = "default_page_limit")]
    pub default_limit: i64,

    /// Upper bound a caller-supplied limit is clamped to
    #[serde(default = "default_max_page_limit")]
    pub max_limit: i64,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            default_limit: default_page_limit(),
            max_limit: default_max_page_limit(),
        }
    }
}

/// Enumerations that deployments may extend
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogConfig {
    /// Permitted organization categories
    #[serde(default = "default_categories")]
    pub categories: Vec<String>,

    /// Permitted innovation sectors
    #[serde(default = "default_sectors")]
    pub sectors: Vec<String>,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            categories: default_categories(),
            sectors: default_sectors(),
        }
    }
}

fn default_port() -> u16 {
    8080
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_timeout() -> u64 {
    30
}

fn default_body_limit_mb() -> usize {
    1
}

fn default_cors_mode() -> String {
    "permissive".to_string()
}

fn default_max_connections() -> u32 {
    20
}

fn default_min_connections() -> u32 {
    2
}

fn default_connection_timeout() -> u64 {
    10
}

fn default_max_retries() -> u32 {
    5
}

fn default_retry_delay() -> u64 {
    2
}

fn default_false() -> bool {
    false
}

fn default_page_limit() -> i64 {
    50
}

fn default_max_page_limit() -> i64 {
    100
}

fn default_categories() -> Vec<String> {
    [
        "AI/ML",
        "FinTech",
        "HealthTech",
        "EdTech",
        "CleanTech",
        "E-commerce",
        "SaaS",
        "IoT",
        "Blockchain",
        "Other",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

fn default_sectors() -> Vec<String> {
    [
        "Computing",
        "FinTech",
        "Healthcare",
        "Education",
        "Energy",
        "Transportation",
        "Telecommunications",
        "Manufacturing",
        "Agriculture",
        "Retail",
        "Entertainment",
        "Other",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

impl Config {
    /// Load configuration for a specific service name
    ///
    /// Searches ./config.toml, the XDG config directory and /etc/venture-catalog,
    /// merging lower priority files first. Environment variables (CATALOG_ prefix)
    /// override all file-based configs.
    pub fn load_for_service(service_name: &str) -> Result<Self> {
        let config_paths = Self::find_config_paths(service_name);

        tracing::debug!("Searching for config files in order:");
        for path in &config_paths {
            tracing::debug!("  - {}", path.display());
        }

        let mut figment = Figment::new().merge(Serialized::defaults(Config::default()));

        for path in config_paths.iter().rev() {
            if path.exists() {
                tracing::info!("Loading configuration from: {}", path.display());
                figment = figment.merge(Toml::file(path));
            }
        }

        figment = figment.merge(Env::prefixed("CATALOG_").split("_"));

        let config = figment.extract()?;
        Ok(config)
    }

    /// Load configuration from a specific file
    ///
    /// Bypasses the XDG search; environment variables still apply.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(path.as_ref()))
            .merge(Env::prefixed("CATALOG_").split("_"))
            .extract()?;

        Ok(config)
    }

    /// Config file paths for a service, highest priority first
    fn find_config_paths(service_name: &str) -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from("config.toml")];

        let xdg_dirs = xdg::BaseDirectories::with_prefix("venture-catalog");
        let config_file_path = Path::new(service_name).join("config.toml");
        if let Ok(path) = xdg_dirs.place_config_file(&config_file_path) {
            paths.push(path);
        }

        paths.push(
            PathBuf::from("/etc/venture-catalog")
                .join(service_name)
                .join("config.toml"),
        );

        paths
    }

    /// Get database URL
    pub fn database_url(&self) -> Option<&str> {
        self.database.as_ref().map(|db| db.url.as_str())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            service: ServiceConfig {
                name: "catalog-api".to_string(),
                port: default_port(),
                log_level: default_log_level(),
                timeout_secs: default_timeout(),
                body_limit_mb: default_body_limit_mb(),
                cors_mode: default_cors_mode(),
            },
            database: None,
            pagination: PaginationConfig::default(),
            catalog: CatalogConfig::default(),
        }
    }
}
