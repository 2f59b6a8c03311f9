//! Default value functions for configuration fields, used by serde's
//! `#[serde(default = ...)]` attributes.

use super::logging::LogFormat;

pub const fn default_port() -> u16 {
    8080
}

pub const fn default_room_cleanup_interval() -> u64 {
    60
}

/// Reconnection grace window: a disconnected slot is held this long before
/// its seat is vacated for good.
pub const fn default_reconnect_grace_secs() -> u64 {
    30
}

pub const fn default_max_connections_per_ip() -> usize {
    10
}

pub const fn default_max_connections_per_window() -> u32 {
    5
}

pub const fn default_connection_rate_window_secs() -> u64 {
    1
}

pub fn default_cors_origins() -> String {
    "*".to_string()
}

pub const fn default_log_format() -> LogFormat {
    LogFormat::Json
}
