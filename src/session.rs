use std::net::IpAddr;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tracing::warn;

use crate::protocol::{GameType, ServerEvent, SessionId};

/// Bound on the number of undelivered events a single session may queue.
/// A session whose client stops reading (or is too slow) fills this buffer
/// and is disconnected rather than let its backlog grow without limit.
pub const OUTBOX_CAPACITY: usize = 256;

/// A live identity bound to one websocket connection. `room` tracks which
/// namespace/code the session currently occupies, if any, so the dispatcher
/// can resolve "the caller's room" without a linear scan.
#[derive(Debug, Clone)]
pub struct Session {
    pub id: SessionId,
    pub ip: IpAddr,
    pub connected_at: DateTime<Utc>,
    pub room: Option<(GameType, String)>,
}

type Outbox = mpsc::Sender<ServerEvent>;

/// Registry of every connected session, keyed by session id. Sending to a
/// session that has already disconnected is a harmless no-op: the channel's
/// receiver is gone and `send` returns an error the caller ignores.
#[derive(Default)]
pub struct SessionRegistry {
    sessions: DashMap<SessionId, Session>,
    outboxes: DashMap<SessionId, Outbox>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, id: SessionId, ip: IpAddr, outbox: Outbox) {
        self.sessions.insert(
            id,
            Session {
                id,
                ip,
                connected_at: Utc::now(),
                room: None,
            },
        );
        self.outboxes.insert(id, outbox);
    }

    pub fn remove(&self, id: SessionId) -> Option<Session> {
        self.outboxes.remove(&id);
        self.sessions.remove(&id).map(|(_, s)| s)
    }

    pub fn get(&self, id: SessionId) -> Option<Session> {
        self.sessions.get(&id).map(|s| s.clone())
    }

    pub fn set_room(&self, id: SessionId, room: Option<(GameType, String)>) {
        if let Some(mut entry) = self.sessions.get_mut(&id) {
            entry.room = room;
        }
    }

    /// Replace a session's id while reusing its live channel, used when a
    /// `reattach` seats a reconnecting client under a new session id while
    /// the room still keys the slot by the old one.
    pub fn rebind(&self, old: SessionId, new: SessionId, ip: IpAddr, outbox: Outbox) {
        self.outboxes.remove(&old);
        self.sessions.remove(&old);
        self.insert(new, ip, outbox);
    }

    /// Queue an event for delivery. A session whose outbox is full is
    /// considered unhealthy and is closed: its outbox entry is dropped,
    /// which ends the connection's send task and drives disconnect cleanup.
    pub fn send(&self, id: SessionId, event: ServerEvent) {
        let full = match self.outboxes.get(&id) {
            Some(outbox) => matches!(outbox.try_send(event), Err(TrySendError::Full(_))),
            None => false,
        };
        if full {
            warn!(session = %id, "outbox full, closing session");
            self.outboxes.remove(&id);
        }
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

/// A resolved (room, position) pair for a session that has already joined
/// a room, shared between the dispatcher and the server's broadcast helpers.
#[derive(Debug, Clone)]
pub struct RoomHandle {
    pub game_type: GameType,
    pub code: String,
}

impl From<(GameType, String)> for RoomHandle {
    fn from((game_type, code): (GameType, String)) -> Self {
        Self { game_type, code }
    }
}

pub type SharedSessionRegistry = Arc<SessionRegistry>;
