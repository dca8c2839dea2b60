//! Configuration management using Figment
//!
//! Configuration is loaded from multiple sources with the following precedence (highest to lowest):
//! 1. Environment variables (prefix: `CRUD_`, nested keys separated by `__`)
//! 2. Current working directory: ./config.toml
//! 3. XDG config directory: ~/.config/crud-scaffold/{service_name}/config.toml
//! 4. System directory: /etc/crud-scaffold/{service_name}/config.toml
//! 5. Default values
//!
//! For example `CRUD_SERVICE__ENVIRONMENT=production` switches the service into
//! a sensitive deployment tier.

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use crate::error::Result;

const CONFIG_DIR_PREFIX: &str = "crud-scaffold";
const ENV_PREFIX: &str = "CRUD_";

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Service configuration
    pub service: ServiceConfig,
}

/// Service-level configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Service name
    pub name: String,

    /// Port to listen on
    #[serde(default = "default_port")]
    pub port: u16,

    /// Log level or `EnvFilter` directive
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Deployment environment name (local, dev, test, staging, production, demo)
    #[serde(default = "default_environment")]
    pub environment: String,
}

impl ServiceConfig {
    /// Request timeout as a [`Duration`]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Deployment tier the service runs in
///
/// Parsing is case-insensitive and never fails: names outside the known tiers
/// are kept as [`DeploymentEnvironment::Other`], which is treated as
/// non-sensitive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeploymentEnvironment {
    /// Developer workstation (`local` or `development`)
    Local,
    /// Shared development tier
    Dev,
    /// Automated test tier
    Test,
    /// Pre-production tier
    Staging,
    /// Production
    Production,
    /// Customer-facing demo tier
    Demo,
    /// Any other tier name
    Other(String),
}

impl DeploymentEnvironment {
    /// Whether internal error details must be withheld from clients.
    ///
    /// True for production, staging and demo.
    #[must_use]
    pub fn is_sensitive(&self) -> bool {
        matches!(self, Self::Production | Self::Staging | Self::Demo)
    }
}

impl FromStr for DeploymentEnvironment {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let env = match s.trim().to_ascii_lowercase().as_str() {
            "local" | "development" => Self::Local,
            "dev" => Self::Dev,
            "test" => Self::Test,
            "staging" => Self::Staging,
            "production" => Self::Production,
            "demo" => Self::Demo,
            _ => Self::Other(s.trim().to_string()),
        };
        Ok(env)
    }
}

impl fmt::Display for DeploymentEnvironment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Local => write!(f, "local"),
            Self::Dev => write!(f, "dev"),
            Self::Test => write!(f, "test"),
            Self::Staging => write!(f, "staging"),
            Self::Production => write!(f, "production"),
            Self::Demo => write!(f, "demo"),
            Self::Other(name) => write!(f, "{}", name),
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

fn default_environment() -> String {
    "dev".to_string()
}

impl Config {
    /// Load configuration from all sources
    ///
    /// The service name is inferred from the running binary.
    pub fn load() -> Result<Self> {
        let service_name = std::env::current_exe()
            .ok()
            .and_then(|p| p.file_stem().map(|s| s.to_string_lossy().into_owned()))
            .unwrap_or_else(|| CONFIG_DIR_PREFIX.to_string());

        Self::load_for_service(&service_name)
    }

    /// Load configuration for a specific service name
    pub fn load_for_service(service_name: &str) -> Result<Self> {
        let config_paths = Self::find_config_paths(service_name);

        tracing::debug!("Searching for config files in order:");
        for path in &config_paths {
            tracing::debug!("  - {}", path.display());
        }

        let mut figment = Figment::new().merge(Serialized::defaults(Config::named(service_name)));

        // Lowest priority first so higher priority files override
        for path in config_paths.iter().rev() {
            if path.exists() {
                tracing::info!("Loading configuration from: {}", path.display());
                figment = figment.merge(Toml::file(path));
            }
        }

        figment = figment.merge(Env::prefixed(ENV_PREFIX).split("__"));

        let config = figment.extract()?;
        Ok(config)
    }

    /// Load configuration from a specific file
    ///
    /// Bypasses the XDG and system directories. Environment variables still apply.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(path.as_ref()))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()?;

        Ok(config)
    }

    /// Config file paths in priority order (highest first)
    fn find_config_paths(service_name: &str) -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from("config.toml")];

        let xdg_dirs = xdg::BaseDirectories::with_prefix(CONFIG_DIR_PREFIX);
        if let Some(path) = xdg_dirs.find_config_file(Path::new(service_name).join("config.toml")) {
            paths.push(path);
        }

        paths.push(
            PathBuf::from("/etc")
                .join(CONFIG_DIR_PREFIX)
                .join(service_name)
                .join("config.toml"),
        );

        paths
    }

    /// Default configuration carrying the given service name
    fn named(service_name: &str) -> Self {
        let mut config = Self::default();
        config.service.name = service_name.to_string();
        config
    }

    /// The configured deployment tier
    pub fn deployment_environment(&self) -> DeploymentEnvironment {
        match self.service.environment.parse() {
            Ok(env) => env,
            Err(never) => match never {},
        }
    }

    /// Whether the configured tier must redact internal error details
    pub fn is_sensitive_environment(&self) -> bool {
        self.deployment_environment().is_sensitive()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            service: ServiceConfig {
                name: CONFIG_DIR_PREFIX.to_string(),
                port: default_port(),
                log_level: default_log_level(),
                timeout_secs: default_timeout(),
                environment: default_environment(),
            },
        }
    }
}
