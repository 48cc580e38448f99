//! Connection pool configuration

use serde::Deserialize;
use std::time::Duration;

/// Database and pool settings
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct DatabaseConfig {
    /// SQLite database file, created when missing
    #[serde(default = "default_path")]
    pub path: String,

    /// Upper bound on open connections
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    /// Connections kept open while idle
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,

    /// Connections older than this are recycled
    #[serde(default = "default_max_lifetime_secs")]
    pub max_lifetime_secs: u64,

    /// Idle connections are closed after this long
    #[serde(default = "default_idle_timeout_secs")]
    pub idle_timeout_secs: u64,

    /// Connection attempts before startup gives up
    #[serde(default = "default_connect_retries")]
    pub connect_retries: u32,

    /// Pause between connection attempts
    #[serde(default = "default_retry_delay_secs")]
    pub retry_delay_secs: u64,
}

fn default_path() -> String {
    "noticeboard.db".to_string()
}

fn default_max_connections() -> u32 {
    20
}

fn default_min_connections() -> u32 {
    1
}

fn default_max_lifetime_secs() -> u64 {
    10
}

fn default_idle_timeout_secs() -> u64 {
    15
}

fn default_connect_retries() -> u32 {
    5
}

fn default_retry_delay_secs() -> u64 {
    3
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_path(),
            max_connections: default_max_connections(),
            min_connections: default_min_connections(),
            max_lifetime_secs: default_max_lifetime_secs(),
            idle_timeout_secs: default_idle_timeout_secs(),
            connect_retries: default_connect_retries(),
            retry_delay_secs: default_retry_delay_secs(),
        }
    }
}

impl DatabaseConfig {
    /// Config for a database file with all pool settings at their defaults
    pub fn with_path(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn max_lifetime(&self) -> Duration {
        Duration::from_secs(self.max_lifetime_secs)
    }

    #[must_use]
    pub fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.idle_timeout_secs)
    }

    #[must_use]
    pub fn retry_delay(&self) -> Duration {
        Duration::from_secs(self.retry_delay_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_pool_bounds() {
        let config = DatabaseConfig::default();
        assert_eq!(config.max_connections, 20);
        assert_eq!(config.max_lifetime(), Duration::from_secs(10));
        assert_eq!(config.idle_timeout(), Duration::from_secs(15));
        assert_eq!(config.connect_retries, 5);
    }

    #[test]
    fn test_yaml_partial_override() {
        let yaml = r#"
            path: /var/lib/noticeboard/board.db
            max_connections: 4
        "#;
        let config: DatabaseConfig = serde_yaml::from_str(yaml).expect("valid yaml");
        assert_eq!(config.path, "/var/lib/noticeboard/board.db");
        assert_eq!(config.max_connections, 4);
        assert_eq!(config.retry_delay(), Duration::from_secs(3));
    }
}
