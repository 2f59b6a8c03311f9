use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::RwLock;

use crate::protocol::{room_codes, GameType, Room};

/// One namespace of rooms (either dhiha-ei or digu); room codes are unique
/// within a namespace but may collide across namespaces.
#[derive(Default)]
struct Namespace {
    rooms: DashMap<String, Arc<RwLock<Room>>>,
}

impl Namespace {
    fn unique_code(&self) -> String {
        loop {
            let candidate = room_codes::generate_candidate();
            if !self.rooms.contains_key(&candidate) {
                return candidate;
            }
        }
    }
}

/// Holds both game namespaces. Each room is behind its own `RwLock` so
/// concurrent operations against different rooms never contend.
pub struct RoomRegistry {
    dhiha_ei: Namespace,
    digu: Namespace,
}

impl RoomRegistry {
    pub fn new() -> Self {
        Self {
            dhiha_ei: Namespace::default(),
            digu: Namespace::default(),
        }
    }

    fn namespace(&self, game_type: GameType) -> &Namespace {
        match game_type {
            GameType::DhihaEi => &self.dhiha_ei,
            GameType::Digu => &self.digu,
        }
    }

    pub fn create(&self, game_type: GameType, max_players: u8) -> (String, Arc<RwLock<Room>>) {
        let namespace = self.namespace(game_type);
        let code = namespace.unique_code();
        let room = Arc::new(RwLock::new(Room::new(code.clone(), game_type, max_players)));
        namespace.rooms.insert(code.clone(), Arc::clone(&room));
        (code, room)
    }

    pub fn get(&self, game_type: GameType, code: &str) -> Option<Arc<RwLock<Room>>> {
        self.namespace(game_type)
            .rooms
            .get(code)
            .map(|r| Arc::clone(&r))
    }

    pub fn remove(&self, game_type: GameType, code: &str) {
        self.namespace(game_type).rooms.remove(code);
    }

    pub fn room_count(&self, game_type: GameType) -> usize {
        self.namespace(game_type).rooms.len()
    }

    /// Snapshot of (namespace, code, room) for every live room, used by the
    /// admin endpoint and the idle-reaper sweep.
    pub fn all(&self) -> Vec<(GameType, String, Arc<RwLock<Room>>)> {
        let mut out = Vec::new();
        for entry in &self.dhiha_ei.rooms {
            out.push((GameType::DhihaEi, entry.key().clone(), Arc::clone(entry.value())));
        }
        for entry in &self.digu.rooms {
            out.push((GameType::Digu, entry.key().clone(), Arc::clone(entry.value())));
        }
        out
    }
}

impl Default for RoomRegistry {
    fn default() -> Self {
        Self::new()
    }
}
