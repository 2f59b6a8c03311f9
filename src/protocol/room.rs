use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

use super::error_codes::CoordinatorError;
use super::ids::{GameType, Position, SessionId};

/// Lifecycle state of a room. `Playing -> Waiting` never occurs (see data
/// model invariants); `Finished` is terminal and only reachable from
/// `Playing`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RoomStatus {
    Waiting,
    Playing,
    Finished,
}

/// A single occupied or grace-held seat. `oder_id` is the field name
/// preserved verbatim from the wire protocol.
#[derive(Debug, Clone)]
pub struct PlayerSlot {
    pub oder_id: SessionId,
    pub name: String,
    pub ready: bool,
    pub connected: bool,
    pub last_seen_at: DateTime<Utc>,
}

/// Wire projection of a `PlayerSlot`. `last_seen_at` is bookkeeping only and
/// never crosses the wire.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerSlotView {
    pub oder_id: SessionId,
    pub name: String,
    pub ready: bool,
    pub connected: bool,
}

impl From<&PlayerSlot> for PlayerSlotView {
    fn from(slot: &PlayerSlot) -> Self {
        Self {
            oder_id: slot.oder_id,
            name: slot.name.clone(),
            ready: slot.ready,
            connected: slot.connected,
        }
    }
}

/// Team A occupies positions 0 and 2; team B occupies 1 and 3. Only
/// meaningful for dhiha-ei.
fn opposite_team_positions(from: Position, max_players: u8) -> Vec<Position> {
    let team_a = from % 2 == 0;
    (0..max_players).filter(|&p| (p % 2 == 0) != team_a).collect()
}

pub struct Room {
    pub code: String,
    pub game_type: GameType,
    pub status: RoomStatus,
    pub host_position: Position,
    pub max_players: u8,
    pub players: HashMap<Position, PlayerSlot>,
    pub created_at: DateTime<Utc>,
    pub game_state: Option<Value>,
    pub hands_by_position: HashMap<Position, Value>,
    pub last_activity: DateTime<Utc>,
}

impl Room {
    pub fn new(code: String, game_type: GameType, max_players: u8) -> Self {
        let now = Utc::now();
        Self {
            code,
            game_type,
            status: RoomStatus::Waiting,
            host_position: 0,
            max_players,
            players: HashMap::new(),
            created_at: now,
            game_state: None,
            hands_by_position: HashMap::new(),
            last_activity: now,
        }
    }

    fn lowest_free_position(&self) -> Option<Position> {
        (0..self.max_players).find(|p| !self.players.contains_key(p))
    }

    fn touch(&mut self) {
        self.last_activity = Utc::now();
    }

    /// Insert the first occupant of a freshly created room at position 0.
    pub fn seat_creator(&mut self, sid: SessionId, name: String) {
        self.players.insert(
            0,
            PlayerSlot {
                oder_id: sid,
                name,
                ready: false,
                connected: true,
                last_seen_at: Utc::now(),
            },
        );
        self.host_position = 0;
        self.touch();
    }

    /// Seat a joining player at the lowest free position.
    pub fn join(&mut self, sid: SessionId, name: String) -> Result<Position, CoordinatorError> {
        match self.status {
            RoomStatus::Playing => return Err(CoordinatorError::GameInProgress),
            RoomStatus::Finished => return Err(CoordinatorError::RoomNotFound),
            RoomStatus::Waiting => {}
        }
        let position = self.lowest_free_position().ok_or(CoordinatorError::RoomFull)?;
        self.players.insert(
            position,
            PlayerSlot {
                oder_id: sid,
                name,
                ready: false,
                connected: true,
                last_seen_at: Utc::now(),
            },
        );
        self.touch();
        Ok(position)
    }

    pub fn position_of(&self, sid: SessionId) -> Option<Position> {
        self.players
            .iter()
            .find(|(_, slot)| slot.oder_id == sid)
            .map(|(pos, _)| *pos)
    }

    pub fn is_host(&self, sid: SessionId) -> bool {
        self.players
            .get(&self.host_position)
            .is_some_and(|slot| slot.oder_id == sid)
    }

    /// Recompute `host_position` as the minimum occupied position. A no-op on
    /// an empty room (the room is deleted by the caller in that case).
    fn migrate_host(&mut self) {
        if let Some(min_pos) = self.players.keys().min().copied() {
            self.host_position = min_pos;
        }
    }

    /// Remove the slot occupied by `sid`, returning its former position. Runs
    /// host migration. Does not decide room deletion; the caller checks
    /// `self.players.is_empty()`.
    pub fn remove_slot(&mut self, sid: SessionId) -> Option<Position> {
        let position = self.position_of(sid)?;
        self.players.remove(&position);
        self.migrate_host();
        self.touch();
        Some(position)
    }

    /// Mark a slot disconnected without removing it (grace window start).
    pub fn mark_disconnected(&mut self, sid: SessionId) -> Option<Position> {
        let position = self.position_of(sid)?;
        if let Some(slot) = self.players.get_mut(&position) {
            slot.connected = false;
            slot.last_seen_at = Utc::now();
        }
        Some(position)
    }

    /// Reclaim a grace-held slot for a new session id.
    pub fn reattach(&mut self, previous_sid: SessionId, new_sid: SessionId) -> Option<Position> {
        let position = self
            .players
            .iter()
            .find(|(_, slot)| slot.oder_id == previous_sid)
            .map(|(pos, _)| *pos)?;
        if let Some(slot) = self.players.get_mut(&position) {
            slot.oder_id = new_sid;
            slot.connected = true;
            slot.last_seen_at = Utc::now();
        }
        self.touch();
        Some(position)
    }

    pub fn set_ready(&mut self, sid: SessionId, ready: bool) -> Result<(), CoordinatorError> {
        let position = self.position_of(sid).ok_or(CoordinatorError::NotInRoom)?;
        #[allow(clippy::unwrap_used)]
        let slot = self.players.get_mut(&position).unwrap();
        slot.ready = ready;
        self.touch();
        Ok(())
    }

    fn all_seated_and_ready(&self) -> bool {
        self.players.len() as u8 == self.max_players
            && self.players.values().all(|slot| slot.ready)
    }

    /// Swap the slot at `from_position` with a slot on the opposite team,
    /// preferring an empty slot over an occupied one. dhiha-ei only.
    pub fn swap_player(
        &mut self,
        sid: SessionId,
        from_position: Position,
    ) -> Result<(), CoordinatorError> {
        if !self.is_host(sid) {
            return Err(CoordinatorError::NotHost);
        }
        if !self.players.contains_key(&from_position) {
            return Err(CoordinatorError::Internal(format!(
                "position {from_position} is not occupied"
            )));
        }
        let candidates = opposite_team_positions(from_position, self.max_players);
        let target = candidates
            .iter()
            .find(|p| !self.players.contains_key(p))
            .or_else(|| candidates.iter().find(|p| self.players.contains_key(p)))
            .copied();

        let Some(target) = target else {
            return Ok(());
        };

        match (
            self.players.remove(&from_position),
            self.players.remove(&target),
        ) {
            (Some(a), Some(b)) => {
                self.players.insert(from_position, b);
                self.players.insert(target, a);
            }
            (Some(a), None) => {
                self.players.insert(target, a);
            }
            (None, maybe_b) => {
                if let Some(b) = maybe_b {
                    self.players.insert(target, b);
                }
            }
        }
        self.migrate_host();
        self.touch();
        Ok(())
    }

    /// Host starts the game: all slots must be seated and ready.
    pub fn start_game(
        &mut self,
        sid: SessionId,
        game_state: Value,
        hands: HashMap<String, Value>,
    ) -> Result<(), CoordinatorError> {
        if !self.is_host(sid) {
            return Err(CoordinatorError::NotHost);
        }
        if !self.all_seated_and_ready() {
            return Err(CoordinatorError::Internal(
                "not all seats are filled and ready".into(),
            ));
        }
        self.hands_by_position = hands
            .into_iter()
            .filter_map(|(k, v)| k.parse::<Position>().ok().map(|p| (p, v)))
            .collect();
        self.game_state = Some(game_state);
        self.status = RoomStatus::Playing;
        self.touch();
        Ok(())
    }

    /// Host deals a new round within an already-playing room. Unlike
    /// `start_game`, seating/ready state is irrelevant once play has begun.
    pub fn start_new_round(
        &mut self,
        sid: SessionId,
        game_state: Value,
        hands: HashMap<String, Value>,
    ) -> Result<(), CoordinatorError> {
        if !self.is_host(sid) {
            return Err(CoordinatorError::NotHost);
        }
        self.hands_by_position = hands
            .into_iter()
            .filter_map(|(k, v)| k.parse::<Position>().ok().map(|p| (p, v)))
            .collect();
        self.game_state = Some(game_state);
        self.touch();
        Ok(())
    }

    pub fn hand_for(&self, position: Position) -> Value {
        self.hands_by_position
            .get(&position)
            .cloned()
            .unwrap_or(Value::Null)
    }

    /// Extract the current turn position from the opaque `gameState` blob,
    /// checking both field spellings the source client uses.
    pub fn current_turn_position(&self) -> Option<Position> {
        let state = self.game_state.as_ref()?;
        state
            .get("currentPlayerIndex")
            .or_else(|| state.get("currentTurn"))
            .and_then(Value::as_u64)
            .map(|n| n as Position)
    }

    /// Validate that `sid` owns the current turn before relaying a
    /// turn-scoped event.
    pub fn check_turn(&self, sid: SessionId) -> Result<Position, CoordinatorError> {
        let position = self.position_of(sid).ok_or(CoordinatorError::NotInRoom)?;
        match self.current_turn_position() {
            Some(turn) if turn == position => Ok(position),
            Some(_) => Err(CoordinatorError::NotYourTurn),
            None => Ok(position),
        }
    }

    pub fn update_game_state(&mut self, game_state: Value) {
        self.game_state = Some(game_state);
        self.touch();
    }

    pub fn finish(&mut self) {
        self.status = RoomStatus::Finished;
        self.touch();
    }

    pub fn snapshot_players(&self) -> HashMap<String, PlayerSlotView> {
        self.players
            .iter()
            .map(|(pos, slot)| (pos.to_string(), PlayerSlotView::from(slot)))
            .collect()
    }

    pub fn connected_count(&self) -> usize {
        self.players.values().filter(|s| s.connected).count()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    pub fn age(&self) -> chrono::Duration {
        Utc::now() - self.created_at
    }

    pub fn idle_for(&self) -> chrono::Duration {
        Utc::now() - self.last_activity
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn new_room(max_players: u8) -> Room {
        Room::new("AB23CD".into(), GameType::DhihaEi, max_players)
    }

    #[test]
    fn host_starts_at_position_zero() {
        let mut room = new_room(4);
        let sid = Uuid::new_v4();
        room.seat_creator(sid, "Host".into());
        assert_eq!(room.host_position, 0);
        assert!(room.is_host(sid));
    }

    #[test]
    fn join_fills_lowest_free_position() {
        let mut room = new_room(4);
        let host = Uuid::new_v4();
        room.seat_creator(host, "Host".into());
        let p1 = room.join(Uuid::new_v4(), "B".into()).unwrap();
        assert_eq!(p1, 1);
        let p2 = room.join(Uuid::new_v4(), "C".into()).unwrap();
        assert_eq!(p2, 2);
    }

    #[test]
    fn join_rejects_full_room() {
        let mut room = new_room(2);
        room.seat_creator(Uuid::new_v4(), "A".into());
        room.join(Uuid::new_v4(), "B".into()).unwrap();
        assert_eq!(
            room.join(Uuid::new_v4(), "C".into()).unwrap_err(),
            CoordinatorError::RoomFull
        );
    }

    #[test]
    fn join_rejects_playing_room() {
        let mut room = new_room(1);
        let host = Uuid::new_v4();
        room.seat_creator(host, "A".into());
        room.set_ready(host, true).unwrap();
        room.start_game(host, Value::Null, HashMap::new()).unwrap();
        assert_eq!(
            room.join(Uuid::new_v4(), "X".into()).unwrap_err(),
            CoordinatorError::GameInProgress
        );
    }

    #[test]
    fn host_migrates_to_lowest_remaining_position() {
        let mut room = new_room(4);
        let host = Uuid::new_v4();
        let p1 = Uuid::new_v4();
        room.seat_creator(host, "Host".into());
        room.join(p1, "B".into()).unwrap();
        room.remove_slot(host);
        assert_eq!(room.host_position, 1);
        assert!(room.is_host(p1));
    }

    #[test]
    fn room_empties_after_last_slot_removed() {
        let mut room = new_room(2);
        let host = Uuid::new_v4();
        room.seat_creator(host, "Host".into());
        room.remove_slot(host);
        assert!(room.is_empty());
    }

    #[test]
    fn swap_prefers_free_slot_on_opposite_team() {
        let mut room = new_room(4);
        let host = Uuid::new_v4();
        room.seat_creator(host, "Host".into());
        // position 2 occupied, opposite team (1,3) both empty -> goes to 1
        let p2 = Uuid::new_v4();
        room.players.insert(
            2,
            PlayerSlot {
                oder_id: p2,
                name: "C".into(),
                ready: false,
                connected: true,
                last_seen_at: Utc::now(),
            },
        );
        room.swap_player(host, 2).unwrap();
        assert_eq!(room.position_of(p2), Some(1));
        assert!(!room.players.contains_key(&2));
    }

    #[test]
    fn swap_exchanges_when_opposite_team_full() {
        let mut room = new_room(4);
        let host = Uuid::new_v4();
        room.seat_creator(host, "Host".into());
        let occupant = |name: &str| PlayerSlot {
            oder_id: Uuid::new_v4(),
            name: name.into(),
            ready: false,
            connected: true,
            last_seen_at: Utc::now(),
        };
        let slot1 = occupant("B");
        let slot1_id = slot1.oder_id;
        let slot2 = occupant("D");
        let slot3 = occupant("E");
        let slot3_id = slot3.oder_id;
        room.players.insert(1, slot1);
        room.players.insert(2, slot3);
        room.players.insert(3, slot2);

        room.swap_player(host, 2).unwrap();
        // opposite team of position 2 (even) is {1,3}, both occupied -> swap with 1
        assert_eq!(room.position_of(slot3_id), Some(1));
        assert_eq!(room.position_of(slot1_id), Some(2));
        assert!(room.players.contains_key(&0));
        assert!(room.players.contains_key(&3));
    }

    #[test]
    fn turn_check_rejects_wrong_position() {
        let mut room = new_room(2);
        let host = Uuid::new_v4();
        let other = Uuid::new_v4();
        room.seat_creator(host, "A".into());
        room.join(other, "B".into()).unwrap();
        room.update_game_state(serde_json::json!({"currentPlayerIndex": 0}));
        assert!(room.check_turn(host).is_ok());
        assert_eq!(room.check_turn(other).unwrap_err(), CoordinatorError::NotYourTurn);
    }

    #[test]
    fn start_game_requires_all_ready() {
        let mut room = new_room(2);
        let host = Uuid::new_v4();
        let other = Uuid::new_v4();
        room.seat_creator(host, "A".into());
        room.join(other, "B".into()).unwrap();
        room.set_ready(host, true).unwrap();
        assert!(room.start_game(host, Value::Null, HashMap::new()).is_err());
        room.set_ready(other, true).unwrap();
        assert!(room.start_game(host, Value::Null, HashMap::new()).is_ok());
        assert_eq!(room.status, RoomStatus::Playing);
    }

    #[test]
    fn reattach_restores_slot_under_new_session_id() {
        let mut room = new_room(2);
        let host = Uuid::new_v4();
        room.seat_creator(host, "A".into());
        room.mark_disconnected(host);
        assert!(!room.players[&0].connected);
        let new_sid = Uuid::new_v4();
        let pos = room.reattach(host, new_sid).unwrap();
        assert_eq!(pos, 0);
        assert!(room.players[&0].connected);
        assert_eq!(room.players[&0].oder_id, new_sid);
    }
}
