use std::collections::VecDeque;

use tokio::sync::Mutex;

use crate::protocol::{clamp_digu_max_players, GameType, SessionId};

#[derive(Debug, Clone)]
pub struct QueueEntry {
    pub sid: SessionId,
    pub player_name: String,
}

/// FIFO matchmaking queues. dhiha-ei has one queue (fixed 4-player rooms);
/// digu is partitioned by requested room size, since a 2-player queue entry
/// and a 4-player queue entry can't be matched into the same room.
pub struct Matchmaker {
    dhiha_ei: Mutex<VecDeque<QueueEntry>>,
    digu: Mutex<[VecDeque<QueueEntry>; 3]>, // index 0 -> size 2, 1 -> size 3, 2 -> size 4
}

fn digu_bucket(max_players: u8) -> usize {
    (max_players.clamp(2, 4) - 2) as usize
}

impl Matchmaker {
    pub fn new() -> Self {
        Self {
            dhiha_ei: Mutex::new(VecDeque::new()),
            digu: Mutex::new([VecDeque::new(), VecDeque::new(), VecDeque::new()]),
        }
    }

    /// Enqueue a session. For dhiha-ei, returns a full group of exactly 4
    /// once available; for digu, a full group of `requested_max_players`
    /// (clamped to 2..=4, defaulting to 4).
    pub async fn join(
        &self,
        game_type: GameType,
        sid: SessionId,
        player_name: String,
        requested_max_players: Option<u8>,
    ) -> Option<(u8, Vec<QueueEntry>)> {
        let entry = QueueEntry { sid, player_name };
        match game_type {
            GameType::DhihaEi => {
                let mut queue = self.dhiha_ei.lock().await;
                queue.push_back(entry);
                if queue.len() >= 4 {
                    let group: Vec<_> = queue.drain(..4).collect();
                    return Some((4, group));
                }
                None
            }
            GameType::Digu => {
                let max_players = clamp_digu_max_players(requested_max_players);
                let mut buckets = self.digu.lock().await;
                let bucket = &mut buckets[digu_bucket(max_players)];
                bucket.push_back(entry);
                if bucket.len() >= max_players as usize {
                    let group: Vec<_> = bucket.drain(..max_players as usize).collect();
                    return Some((max_players, group));
                }
                None
            }
        }
    }

    /// Snapshot of queue depths for the admin endpoint: `dhiha_ei` count and
    /// `digu` counts by bucketed room size.
    pub async fn queue_lengths(&self) -> serde_json::Value {
        let dhiha_ei = self.dhiha_ei.lock().await.len();
        let digu = self.digu.lock().await;
        serde_json::json!({
            "dhiha_ei": dhiha_ei,
            "digu": { "2": digu[0].len(), "3": digu[1].len(), "4": digu[2].len() },
        })
    }

    /// Remove a session from whichever queue holds it. Idempotent: removing
    /// a session that isn't queued is a no-op.
    pub async fn leave(&self, game_type: GameType, sid: SessionId) {
        match game_type {
            GameType::DhihaEi => {
                let mut queue = self.dhiha_ei.lock().await;
                queue.retain(|e| e.sid != sid);
            }
            GameType::Digu => {
                let mut buckets = self.digu.lock().await;
                for bucket in buckets.iter_mut() {
                    bucket.retain(|e| e.sid != sid);
                }
            }
        }
    }
}

impl Default for Matchmaker {
    fn default() -> Self {
        Self::new()
    }
}
