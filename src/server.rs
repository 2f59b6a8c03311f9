use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::time::timeout;
use tracing::info;

use crate::config::Config;
use crate::matchmaking::Matchmaker;
use crate::protocol::GameType;
use crate::rate_limit::{AdmissionLimitConfig, ConnectionAdmission};
use crate::rooms::RoomRegistry;
use crate::session::{SessionRegistry, SharedSessionRegistry};

/// Top-level coordinator bundling every shared resource a connection task or
/// the admin endpoint needs. Cheap to clone: every field is an `Arc`.
pub struct CoordinatorServer {
    pub sessions: SharedSessionRegistry,
    pub rooms: Arc<RoomRegistry>,
    pub matchmaker: Arc<Matchmaker>,
    pub admission: Arc<ConnectionAdmission>,
    pub config: Config,
    started_at: chrono::DateTime<Utc>,
    rooms_created_total: AtomicU64,
    connections_total: AtomicU64,
}

impl CoordinatorServer {
    pub fn new(config: Config) -> Arc<Self> {
        let admission_config = AdmissionLimitConfig {
            max_connections_per_ip: config.server.max_connections_per_ip,
            max_connections_per_window: config.server.max_connections_per_window,
            time_window: Duration::from_secs(config.server.connection_rate_window_secs),
        };
        Arc::new(Self {
            sessions: Arc::new(SessionRegistry::new()),
            rooms: Arc::new(RoomRegistry::new()),
            matchmaker: Arc::new(Matchmaker::new()),
            admission: Arc::new(ConnectionAdmission::new(admission_config)),
            config,
            started_at: Utc::now(),
            rooms_created_total: AtomicU64::new(0),
            connections_total: AtomicU64::new(0),
        })
    }

    pub fn note_room_created(&self) {
        self.rooms_created_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn note_connection(&self) {
        self.connections_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn rooms_created_total(&self) -> u64 {
        self.rooms_created_total.load(Ordering::Relaxed)
    }

    pub fn connections_total(&self) -> u64 {
        self.connections_total.load(Ordering::Relaxed)
    }

    pub fn uptime(&self) -> chrono::Duration {
        Utc::now() - self.started_at
    }

    /// Liveness check used by `/health`: the session registry responds
    /// within a short budget instead of being wedged behind a held lock.
    pub async fn health_check(&self) -> bool {
        timeout(Duration::from_millis(50), async { self.sessions.len() })
            .await
            .is_ok()
    }

    /// Spawn the idle-room reaping sweep. Rooms with no connected players
    /// and no activity within the configured window are dropped.
    pub fn spawn_idle_reaper(self: &Arc<Self>) {
        let server = Arc::clone(self);
        let interval = Duration::from_secs(server.config.server.room_cleanup_interval);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                ticker.tick().await;
                server.reap_idle_rooms().await;
            }
        });
    }

    async fn reap_idle_rooms(&self) {
        let grace = chrono::Duration::seconds(self.config.server.reconnect_grace_secs as i64 * 4);
        for (game_type, code, room) in self.rooms.all() {
            let should_remove = {
                let guard = room.read().await;
                guard.is_empty() || (guard.connected_count() == 0 && guard.idle_for() > grace)
            };
            if should_remove {
                self.rooms.remove(game_type, &code);
                info!(%code, %game_type, "reaped idle room");
            }
        }
    }

    pub fn admission_release_on_ip(&self, ip: std::net::IpAddr) {
        let admission = Arc::clone(&self.admission);
        tokio::spawn(async move {
            admission.release(ip).await;
        });
    }
}

/// Construct a [`CoordinatorServer`] and start its background tasks
/// (idle-room reaping, admission-window cleanup).
pub fn bootstrap(config: Config) -> Arc<CoordinatorServer> {
    let server = CoordinatorServer::new(config);
    server.spawn_idle_reaper();
    Arc::clone(&server.admission).start_cleanup_task();
    server
}
