//! Root configuration types.

use serde::{Deserialize, Serialize};

use super::defaults::default_port;
use super::logging::LoggingConfig;
use super::server::ServerConfig;

/// Root configuration struct.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Config {
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Shared secret protecting the admin snapshot endpoint. `None` disables
    /// the endpoint entirely.
    #[serde(default)]
    pub admin_password: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: default_port(),
            server: ServerConfig::default(),
            logging: LoggingConfig::default(),
            admin_password: None,
        }
    }
}
