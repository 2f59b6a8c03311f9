use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::ids::{GameType, Position, SessionId};
use super::room::PlayerSlotView;

/// An inbound frame, decoded from `{ event: string, data: object }`.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
#[serde(rename_all_fields = "camelCase")]
pub enum ClientEvent {
    CreateRoom {
        player_name: String,
    },
    JoinRoom {
        room_id: String,
        player_name: String,
    },
    LeaveRoom,
    SetReady {
        ready: bool,
    },
    StartGame {
        game_state: Value,
        hands: HashMap<String, Value>,
    },
    SwapPlayer {
        from_position: Position,
    },
    CardPlayed {
        card: Value,
        position: Position,
    },
    UpdateGameState {
        game_state: Value,
    },
    NewRound {
        game_state: Value,
        hands: HashMap<String, Value>,
    },
    CreateDiguRoom {
        player_name: String,
        max_players: Option<u8>,
    },
    JoinDiguRoom {
        room_id: String,
        player_name: String,
    },
    LeaveDiguRoom,
    DiguSetReady {
        ready: bool,
    },
    StartDiguGame {
        game_state: Value,
        hands: HashMap<String, Value>,
    },
    DiguDrawCard {
        source: String,
        #[serde(default)]
        card: Option<Value>,
        position: Position,
    },
    DiguDiscardCard {
        card: Value,
        position: Position,
    },
    DiguDeclare {
        melds: Value,
        is_valid: bool,
        position: Position,
    },
    DiguUpdateState {
        game_state: Value,
    },
    DiguGameOver {
        results: Value,
    },
    DiguNewMatch {
        game_state: Value,
        hands: HashMap<String, Value>,
    },
    PingKeepalive,
    JoinQueue {
        game_type: GameType,
        player_name: String,
        max_players: Option<u8>,
    },
    LeaveQueue,
    Reattach {
        room_id: String,
        previous_oder_id: SessionId,
    },
}

impl ClientEvent {
    /// Name as it appears on the wire, for logging and dispatcher metrics.
    pub fn name(&self) -> &'static str {
        match self {
            Self::CreateRoom { .. } => "create_room",
            Self::JoinRoom { .. } => "join_room",
            Self::LeaveRoom => "leave_room",
            Self::SetReady { .. } => "set_ready",
            Self::StartGame { .. } => "start_game",
            Self::SwapPlayer { .. } => "swap_player",
            Self::CardPlayed { .. } => "card_played",
            Self::UpdateGameState { .. } => "update_game_state",
            Self::NewRound { .. } => "new_round",
            Self::CreateDiguRoom { .. } => "create_digu_room",
            Self::JoinDiguRoom { .. } => "join_digu_room",
            Self::LeaveDiguRoom => "leave_digu_room",
            Self::DiguSetReady { .. } => "digu_set_ready",
            Self::StartDiguGame { .. } => "start_digu_game",
            Self::DiguDrawCard { .. } => "digu_draw_card",
            Self::DiguDiscardCard { .. } => "digu_discard_card",
            Self::DiguDeclare { .. } => "digu_declare",
            Self::DiguUpdateState { .. } => "digu_update_state",
            Self::DiguGameOver { .. } => "digu_game_over",
            Self::DiguNewMatch { .. } => "digu_new_match",
            Self::PingKeepalive => "ping_keepalive",
            Self::JoinQueue { .. } => "join_queue",
            Self::LeaveQueue => "leave_queue",
            Self::Reattach { .. } => "reattach",
        }
    }
}

/// Players keyed by position, as rendered to the wire (`"0"`, `"1"`, ...).
pub type PlayersPayload = HashMap<String, PlayerSlotView>;

/// An outbound frame. Every variant is reported either to a single session or
/// broadcast to a room's members; the dispatcher never mixes the two for one
/// emission.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
#[serde(rename_all_fields = "camelCase")]
pub enum ServerEvent {
    Connected {
        sid: SessionId,
    },
    RoomCreated {
        room_id: String,
        position: Position,
        players: PlayersPayload,
    },
    RoomJoined {
        room_id: String,
        position: Position,
        players: PlayersPayload,
        max_players: u8,
    },
    PlayersChanged {
        players: PlayersPayload,
    },
    PositionChanged {
        players: PlayersPayload,
    },
    GameStarted {
        game_state: Value,
        hand: Value,
        position: Position,
        players: PlayersPayload,
    },
    RemoteCardPlayed {
        card: Value,
        position: Position,
    },
    GameStateUpdated {
        game_state: Value,
    },
    RoundStarted {
        game_state: Value,
        hand: Value,
        position: Position,
        players: PlayersPayload,
    },
    PlayerDisconnected {
        position: Position,
        players: PlayersPayload,
    },
    MatchmakingMatched {
        room_id: String,
        position: Position,
        players: PlayersPayload,
    },
    DiguRoomCreated {
        room_id: String,
        position: Position,
        players: PlayersPayload,
    },
    DiguRoomJoined {
        room_id: String,
        position: Position,
        players: PlayersPayload,
        max_players: u8,
    },
    DiguPlayersChanged {
        players: PlayersPayload,
    },
    DiguGameStarted {
        game_state: Value,
        hand: Value,
        position: Position,
        players: PlayersPayload,
    },
    DiguDrawCard {
        source: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        card: Option<Value>,
        position: Position,
    },
    DiguDiscardCard {
        card: Value,
        position: Position,
    },
    DiguDeclare {
        melds: Value,
        is_valid: bool,
        position: Position,
    },
    DiguUpdateState {
        game_state: Value,
    },
    DiguGameOver {
        results: Value,
    },
    DiguRoundStarted {
        game_state: Value,
        hand: Value,
        position: Position,
        players: PlayersPayload,
    },
    DiguPlayerDisconnected {
        position: Position,
        players: PlayersPayload,
    },
    Error {
        message: &'static str,
    },
}
