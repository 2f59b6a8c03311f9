use std::collections::HashMap;
use std::net::IpAddr;
use std::sync::Arc;

use tokio::sync::RwLock;
use tokio::time::{Duration, Instant};

/// Admission-layer rate limiting configuration (per remote IP).
#[derive(Debug, Clone)]
pub struct AdmissionLimitConfig {
    /// Maximum concurrent connections from a single IP.
    pub max_connections_per_ip: usize,
    /// Maximum new connections a single IP may open per `time_window`.
    pub max_connections_per_window: u32,
    pub time_window: Duration,
}

impl Default for AdmissionLimitConfig {
    fn default() -> Self {
        Self {
            max_connections_per_ip: 10,
            max_connections_per_window: 5,
            time_window: Duration::from_secs(1),
        }
    }
}

#[derive(Debug, Clone)]
struct RateWindow {
    attempts: u32,
    window_start: Instant,
}

impl RateWindow {
    fn new() -> Self {
        Self {
            attempts: 0,
            window_start: Instant::now(),
        }
    }

    fn maybe_reset(&mut self, window: Duration) {
        if self.window_start.elapsed() >= window {
            self.attempts = 0;
            self.window_start = Instant::now();
        }
    }
}

/// Tracks concurrent connection counts and connection-open rate per IP.
/// Loopback addresses always bypass both checks.
pub struct ConnectionAdmission {
    config: AdmissionLimitConfig,
    live_connections: Arc<RwLock<HashMap<IpAddr, usize>>>,
    open_attempts: Arc<RwLock<HashMap<IpAddr, RateWindow>>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdmissionError {
    TooManyConnections,
    RateLimited,
}

impl ConnectionAdmission {
    pub fn new(config: AdmissionLimitConfig) -> Self {
        Self {
            config,
            live_connections: Arc::new(RwLock::new(HashMap::new())),
            open_attempts: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    fn is_exempt(ip: IpAddr) -> bool {
        ip.is_loopback()
    }

    /// Attempt to admit a new connection from `ip`. On success, the caller
    /// owns a reserved slot that must be released with `release`.
    pub async fn try_admit(&self, ip: IpAddr) -> Result<(), AdmissionError> {
        if Self::is_exempt(ip) {
            return Ok(());
        }

        {
            let mut attempts = self.open_attempts.write().await;
            let entry = attempts.entry(ip).or_insert_with(RateWindow::new);
            entry.maybe_reset(self.config.time_window);
            if entry.attempts >= self.config.max_connections_per_window {
                return Err(AdmissionError::RateLimited);
            }
            entry.attempts += 1;
        }

        let mut live = self.live_connections.write().await;
        let count = live.entry(ip).or_insert(0);
        if *count >= self.config.max_connections_per_ip {
            return Err(AdmissionError::TooManyConnections);
        }
        *count += 1;
        Ok(())
    }

    pub async fn release(&self, ip: IpAddr) {
        if Self::is_exempt(ip) {
            return;
        }
        let mut live = self.live_connections.write().await;
        if let Some(count) = live.get_mut(&ip) {
            *count = count.saturating_sub(1);
            if *count == 0 {
                live.remove(&ip);
            }
        }
    }

    pub async fn current_connections(&self, ip: IpAddr) -> usize {
        self.live_connections.read().await.get(&ip).copied().unwrap_or(0)
    }

    /// Drop rate-window bookkeeping for IPs idle since before `max_age` ago.
    pub async fn cleanup_stale_windows(&self, max_age: Duration) {
        let mut attempts = self.open_attempts.write().await;
        attempts.retain(|_, window| window.window_start.elapsed() < max_age);
    }

    pub fn start_cleanup_task(self: Arc<Self>) {
        let admission = self;
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(admission.config.time_window * 4);
            loop {
                interval.tick().await;
                admission
                    .cleanup_stale_windows(admission.config.time_window * 4)
                    .await;
            }
        });
    }
}
