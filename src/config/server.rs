//! Server and admission-layer configuration types.

use serde::{Deserialize, Serialize};

use super::defaults::{
    default_connection_rate_window_secs, default_cors_origins, default_max_connections_per_ip,
    default_max_connections_per_window, default_reconnect_grace_secs,
    default_room_cleanup_interval,
};

/// Server behavior configuration: room lifecycle, reconnection, and
/// per-IP admission limits.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ServerConfig {
    /// Interval for the idle-room reaping sweep (seconds).
    #[serde(default = "default_room_cleanup_interval")]
    pub room_cleanup_interval: u64,
    /// How long a disconnected seat is held open for reattachment (seconds).
    #[serde(default = "default_reconnect_grace_secs")]
    pub reconnect_grace_secs: u64,
    /// Maximum concurrent connections accepted from a single IP.
    #[serde(default = "default_max_connections_per_ip")]
    pub max_connections_per_ip: usize,
    /// Maximum new connections a single IP may open per rate window.
    #[serde(default = "default_max_connections_per_window")]
    pub max_connections_per_window: u32,
    /// Width of the connection-open rate window (seconds).
    #[serde(default = "default_connection_rate_window_secs")]
    pub connection_rate_window_secs: u64,
    /// Allowed CORS origins, comma-separated, or `"*"` for any origin.
    #[serde(default = "default_cors_origins")]
    pub cors_origins: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            room_cleanup_interval: default_room_cleanup_interval(),
            reconnect_grace_secs: default_reconnect_grace_secs(),
            max_connections_per_ip: default_max_connections_per_ip(),
            max_connections_per_window: default_max_connections_per_window(),
            connection_rate_window_secs: default_connection_rate_window_secs(),
            cors_origins: default_cors_origins(),
        }
    }
}
