use anyhow::Context;
use noticeboard_persistence::{DatabaseConfig, DEFAULT_PAGE_SIZE};
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::PathBuf;

/// Default config template created when no config exists
const DEFAULT_CONFIG: &str = r#"
server:
  host: "0.0.0.0"
  port: 1204

database:
  path: "noticeboard.db"  # Set via NOTICEBOARD_DATABASE_PATH env var
  max_connections: 20
  min_connections: 1
  max_lifetime_secs: 10
  idle_timeout_secs: 15
  connect_retries: 5
  retry_delay_secs: 3

api:
  page_size: 20

logging:
  level: "info"  # trace, debug, info, warn, error
  json: false
  # directory: "logs"  # enables a daily rotated log file

auth:
  # Basic auth credentials, one entry per tenant
  tenants: []
  # tenants:
  #   - id: "alice"
  #     secret: "change-me"
"#;

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    1204
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl ServerConfig {
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ApiConfig {
    /// Messages per listing page
    #[serde(default = "default_page_size")]
    pub page_size: i64,
}

fn default_page_size() -> i64 {
    DEFAULT_PAGE_SIZE
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    #[serde(default = "default_level")]
    pub level: String,
    #[serde(default)]
    pub json: bool,
    #[serde(default)]
    pub directory: Option<String>,
}

fn default_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
            json: false,
            directory: None,
        }
    }
}

/// Basic auth secret for one tenant
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct TenantCredential {
    pub id: String,
    pub secret: String,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct AuthConfig {
    #[serde(default)]
    pub tenants: Vec<TenantCredential>,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub auth: AuthConfig,
}

impl Config {
    /// Get the global config path: ~/.noticeboard/noticeboard.yaml
    fn global_config_path() -> anyhow::Result<PathBuf> {
        let home = dirs::home_dir().context("could not find home directory")?;
        Ok(home.join(".noticeboard").join("noticeboard.yaml"))
    }

    /// Ensure global config directory and file exist, creating defaults if needed
    fn ensure_global_config() -> anyhow::Result<PathBuf> {
        let config_path = Self::global_config_path()?;
        let config_dir = config_path
            .parent()
            .context("config path has no parent directory")?;

        if !config_dir.exists() {
            fs::create_dir_all(config_dir)?;
            eprintln!("Created config directory: {}", config_dir.display());
        }

        if !config_path.exists() {
            fs::write(&config_path, DEFAULT_CONFIG.trim())?;
            eprintln!("Created default config: {}", config_path.display());
            eprintln!("Add tenant credentials under auth.tenants before serving requests.");
        }

        Ok(config_path)
    }

    /// Load configuration with layered approach:
    /// 1. Built-in defaults
    /// 2. Global config: ~/.noticeboard/noticeboard.yaml (auto-created if missing)
    /// 3. Local override: ./noticeboard.{yaml,toml,json} (optional)
    /// 4. Environment variables, e.g. NOTICEBOARD__SERVER__PORT
    /// 5. NOTICEBOARD_DATABASE_PATH (highest priority)
    pub fn load() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let global_config_path = Self::ensure_global_config()?;

        let mut config_builder = config::Config::builder()
            .add_source(config::File::from(global_config_path))
            .add_source(config::File::with_name("noticeboard").required(false))
            .add_source(config::Environment::with_prefix("NOTICEBOARD").separator("__"));

        if let Ok(path) = env::var("NOTICEBOARD_DATABASE_PATH") {
            config_builder = config_builder.set_override("database.path", path)?;
        }

        let config: Self = config_builder
            .build()?
            .try_deserialize()
            .context("invalid configuration")?;
        Ok(config)
    }
}
