use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;
use tracing::{info, warn};

use crate::protocol::{
    clamp_digu_max_players, validation, ClientEvent, CoordinatorError, GameType, Position, Room,
    ServerEvent, SessionId,
};
use crate::server::CoordinatorServer;
use crate::session::Session;

/// Grace window before a disconnected slot is permanently vacated (spec-mandated
/// reconnection window, much shorter than a typical cross-region deployment).
pub const RECONNECT_GRACE: Duration = Duration::from_secs(30);

/// Entry point invoked by the websocket connection task for every decoded
/// inbound frame. Never panics: any `CoordinatorError` becomes an `error`
/// reply to the caller alone, per the propagation policy.
pub async fn dispatch(server: &Arc<CoordinatorServer>, sid: SessionId, event: ClientEvent) {
    let name = event.name();
    let result = route(server, sid, event).await;
    if let Err(err) = result {
        warn!(%sid, event = name, error = %err, "event rejected");
        server.sessions.send(sid, ServerEvent::Error { message: err.wire_message() });
    }
}

async fn route(
    server: &Arc<CoordinatorServer>,
    sid: SessionId,
    event: ClientEvent,
) -> Result<(), CoordinatorError> {
    match event {
        ClientEvent::CreateRoom { player_name } => create_room(server, sid, player_name).await,
        ClientEvent::JoinRoom { room_id, player_name } => {
            join_room(server, sid, GameType::DhihaEi, room_id, player_name).await
        }
        ClientEvent::LeaveRoom => leave_room(server, sid, GameType::DhihaEi).await,
        ClientEvent::SetReady { ready } => set_ready(server, sid, GameType::DhihaEi, ready).await,
        ClientEvent::StartGame { game_state, hands } => {
            start_game(server, sid, GameType::DhihaEi, game_state, hands).await
        }
        ClientEvent::SwapPlayer { from_position } => swap_player(server, sid, from_position).await,
        ClientEvent::CardPlayed { card, position } => {
            card_played(server, sid, card, position).await
        }
        ClientEvent::UpdateGameState { game_state } => {
            update_game_state(server, sid, GameType::DhihaEi, game_state).await
        }
        ClientEvent::NewRound { game_state, hands } => {
            new_round(server, sid, GameType::DhihaEi, game_state, hands).await
        }
        ClientEvent::CreateDiguRoom { player_name, max_players } => {
            create_digu_room(server, sid, player_name, max_players).await
        }
        ClientEvent::JoinDiguRoom { room_id, player_name } => {
            join_room(server, sid, GameType::Digu, room_id, player_name).await
        }
        ClientEvent::LeaveDiguRoom => leave_room(server, sid, GameType::Digu).await,
        ClientEvent::DiguSetReady { ready } => set_ready(server, sid, GameType::Digu, ready).await,
        ClientEvent::StartDiguGame { game_state, hands } => {
            start_game(server, sid, GameType::Digu, game_state, hands).await
        }
        ClientEvent::DiguDrawCard { source, card, position } => {
            digu_relay(server, sid, ServerEvent::DiguDrawCard { source, card, position }).await
        }
        ClientEvent::DiguDiscardCard { card, position } => {
            digu_relay(server, sid, ServerEvent::DiguDiscardCard { card, position }).await
        }
        ClientEvent::DiguDeclare { melds, is_valid, position } => {
            digu_relay(server, sid, ServerEvent::DiguDeclare { melds, is_valid, position }).await
        }
        ClientEvent::DiguUpdateState { game_state } => {
            update_game_state(server, sid, GameType::Digu, game_state).await
        }
        ClientEvent::DiguGameOver { results } => digu_game_over(server, sid, results).await,
        ClientEvent::DiguNewMatch { game_state, hands } => {
            new_round(server, sid, GameType::Digu, game_state, hands).await
        }
        ClientEvent::PingKeepalive => {
            // Liveness only; no reply is emitted.
            Ok(())
        }
        ClientEvent::JoinQueue { game_type, player_name, max_players } => {
            join_queue(server, sid, game_type, player_name, max_players).await
        }
        ClientEvent::LeaveQueue => {
            // A queued session has no room bound yet, so the game type it
            // queued under isn't recoverable from session state; leave both.
            server.matchmaker.leave(GameType::DhihaEi, sid).await;
            server.matchmaker.leave(GameType::Digu, sid).await;
            Ok(())
        }
        ClientEvent::Reattach { room_id, previous_oder_id } => {
            reattach(server, sid, room_id, previous_oder_id).await
        }
    }
}

fn session_of(server: &CoordinatorServer, sid: SessionId) -> Result<Session, CoordinatorError> {
    server.sessions.get(sid).ok_or(CoordinatorError::NotInRoom)
}

async fn create_room(
    server: &Arc<CoordinatorServer>,
    sid: SessionId,
    player_name: String,
) -> Result<(), CoordinatorError> {
    create_room_for(server, sid, GameType::DhihaEi, player_name, 4).await
}

async fn create_digu_room(
    server: &Arc<CoordinatorServer>,
    sid: SessionId,
    player_name: String,
    max_players: Option<u8>,
) -> Result<(), CoordinatorError> {
    let capacity = clamp_digu_max_players(max_players);
    create_room_for(server, sid, GameType::Digu, player_name, capacity).await
}

async fn create_room_for(
    server: &Arc<CoordinatorServer>,
    sid: SessionId,
    game_type: GameType,
    player_name: String,
    max_players: u8,
) -> Result<(), CoordinatorError> {
    let name = validation::validate_player_name(&player_name)
        .map_err(|_| CoordinatorError::InvalidPayload)?;
    let (code, room) = server.rooms.create(game_type, max_players);
    {
        let mut guard = room.write().await;
        guard.seat_creator(sid, name);
    }
    server.note_room_created();
    server.sessions.set_room(sid, Some((game_type, code.clone())));

    let guard = room.read().await;
    let players = guard.snapshot_players();
    let event = match game_type {
        GameType::DhihaEi => ServerEvent::RoomCreated { room_id: code, position: 0, players },
        GameType::Digu => ServerEvent::DiguRoomCreated { room_id: code, position: 0, players },
    };
    server.sessions.send(sid, event);
    info!(%sid, %game_type, "room created");
    Ok(())
}

async fn join_room(
    server: &Arc<CoordinatorServer>,
    sid: SessionId,
    game_type: GameType,
    room_id: String,
    player_name: String,
) -> Result<(), CoordinatorError> {
    let code = validation::validate_room_code(&room_id).map_err(|_| CoordinatorError::InvalidPayload)?;
    let name = validation::validate_player_name(&player_name)
        .map_err(|_| CoordinatorError::InvalidPayload)?;
    let room = server
        .rooms
        .get(game_type, &code)
        .ok_or(CoordinatorError::RoomNotFound)?;

    let (position, players, max_players) = {
        let mut guard = room.write().await;
        let position = guard.join(sid, name)?;
        (position, guard.snapshot_players(), guard.max_players)
    };
    server.sessions.set_room(sid, Some((game_type, code.clone())));

    let joined_event = match game_type {
        GameType::DhihaEi => ServerEvent::RoomJoined {
            room_id: code.clone(),
            position,
            players: players.clone(),
            max_players,
        },
        GameType::Digu => ServerEvent::DiguRoomJoined {
            room_id: code.clone(),
            position,
            players: players.clone(),
            max_players,
        },
    };
    server.sessions.send(sid, joined_event);

    let changed_event = match game_type {
        GameType::DhihaEi => ServerEvent::PlayersChanged { players },
        GameType::Digu => ServerEvent::DiguPlayersChanged { players },
    };
    broadcast_except(server, &room, changed_event, sid).await;
    Ok(())
}

async fn leave_room(
    server: &Arc<CoordinatorServer>,
    sid: SessionId,
    game_type: GameType,
) -> Result<(), CoordinatorError> {
    let session = session_of(server, sid)?;
    let (_, code) = session.room.ok_or(CoordinatorError::NotInRoom)?;
    let room = server
        .rooms
        .get(game_type, &code)
        .ok_or(CoordinatorError::RoomNotFound)?;

    let empty = {
        let mut guard = room.write().await;
        guard.remove_slot(sid);
        guard.is_empty()
    };
    server.sessions.set_room(sid, None);

    if empty {
        server.rooms.remove(game_type, &code);
    } else {
        let players = room.read().await.snapshot_players();
        let event = match game_type {
            GameType::DhihaEi => ServerEvent::PlayersChanged { players },
            GameType::Digu => ServerEvent::DiguPlayersChanged { players },
        };
        broadcast_all(server, &room, event).await;
    }
    Ok(())
}

async fn set_ready(
    server: &Arc<CoordinatorServer>,
    sid: SessionId,
    game_type: GameType,
    ready: bool,
) -> Result<(), CoordinatorError> {
    let room = room_of(server, sid, game_type).await?;
    {
        let mut guard = room.write().await;
        guard.set_ready(sid, ready)?;
    }
    let players = room.read().await.snapshot_players();
    let event = match game_type {
        GameType::DhihaEi => ServerEvent::PlayersChanged { players },
        GameType::Digu => ServerEvent::DiguPlayersChanged { players },
    };
    broadcast_all(server, &room, event).await;
    Ok(())
}

async fn start_game(
    server: &Arc<CoordinatorServer>,
    sid: SessionId,
    game_type: GameType,
    game_state: serde_json::Value,
    hands: std::collections::HashMap<String, serde_json::Value>,
) -> Result<(), CoordinatorError> {
    let room = room_of(server, sid, game_type).await?;
    {
        let mut guard = room.write().await;
        guard.start_game(sid, game_state, hands)?;
    }
    broadcast_game_started(server, &room, game_type).await;
    Ok(())
}

async fn new_round(
    server: &Arc<CoordinatorServer>,
    sid: SessionId,
    game_type: GameType,
    game_state: serde_json::Value,
    hands: std::collections::HashMap<String, serde_json::Value>,
) -> Result<(), CoordinatorError> {
    let room = room_of(server, sid, game_type).await?;
    {
        let mut guard = room.write().await;
        guard.start_new_round(sid, game_state, hands)?;
    }
    broadcast_round_started(server, &room, game_type).await;
    Ok(())
}

async fn swap_player(
    server: &Arc<CoordinatorServer>,
    sid: SessionId,
    from_position: Position,
) -> Result<(), CoordinatorError> {
    let room = room_of(server, sid, GameType::DhihaEi).await?;
    {
        let mut guard = room.write().await;
        guard.swap_player(sid, from_position)?;
    }
    let players = room.read().await.snapshot_players();
    broadcast_all(server, &room, ServerEvent::PositionChanged { players }).await;
    Ok(())
}

async fn card_played(
    server: &Arc<CoordinatorServer>,
    sid: SessionId,
    card: serde_json::Value,
    position: Position,
) -> Result<(), CoordinatorError> {
    let room = room_of(server, sid, GameType::DhihaEi).await?;
    {
        let guard = room.read().await;
        guard.check_turn(sid)?;
    }
    broadcast_except(server, &room, ServerEvent::RemoteCardPlayed { card, position }, sid).await;
    Ok(())
}

async fn update_game_state(
    server: &Arc<CoordinatorServer>,
    sid: SessionId,
    game_type: GameType,
    game_state: serde_json::Value,
) -> Result<(), CoordinatorError> {
    let room = room_of(server, sid, game_type).await?;
    {
        let mut guard = room.write().await;
        guard.update_game_state(game_state.clone());
    }
    let event = match game_type {
        GameType::DhihaEi => ServerEvent::GameStateUpdated { game_state },
        GameType::Digu => ServerEvent::DiguUpdateState { game_state },
    };
    broadcast_except(server, &room, event, sid).await;
    Ok(())
}

async fn digu_relay(
    server: &Arc<CoordinatorServer>,
    sid: SessionId,
    event: ServerEvent,
) -> Result<(), CoordinatorError> {
    let room = room_of(server, sid, GameType::Digu).await?;
    {
        let guard = room.read().await;
        guard.check_turn(sid)?;
    }
    broadcast_except(server, &room, event, sid).await;
    Ok(())
}

async fn digu_game_over(
    server: &Arc<CoordinatorServer>,
    sid: SessionId,
    results: serde_json::Value,
) -> Result<(), CoordinatorError> {
    let room = room_of(server, sid, GameType::Digu).await?;
    {
        let mut guard = room.write().await;
        if !guard.is_host(sid) {
            return Err(CoordinatorError::NotHost);
        }
        guard.finish();
    }
    broadcast_all(server, &room, ServerEvent::DiguGameOver { results }).await;
    Ok(())
}

async fn join_queue(
    server: &Arc<CoordinatorServer>,
    sid: SessionId,
    game_type: GameType,
    player_name: String,
    max_players: Option<u8>,
) -> Result<(), CoordinatorError> {
    let name = validation::validate_player_name(&player_name)
        .map_err(|_| CoordinatorError::InvalidPayload)?;
    let capacity = match game_type {
        GameType::DhihaEi => 4,
        GameType::Digu => clamp_digu_max_players(max_players),
    };
    let Some((size, group)) = server.matchmaker.join(game_type, sid, name, max_players).await
    else {
        return Ok(());
    };
    debug_assert_eq!(size, capacity);

    let (code, room) = server.rooms.create(game_type, capacity);
    server.note_room_created();
    {
        let mut guard = room.write().await;
        for entry in &group {
            let _ = guard.join(entry.sid, entry.player_name.clone());
        }
    }
    let (players, max_players) = {
        let guard = room.read().await;
        (guard.snapshot_players(), guard.max_players)
    };

    for entry in &group {
        server.sessions.set_room(entry.sid, Some((game_type, code.clone())));
        let position = players
            .iter()
            .find(|(_, slot)| slot.oder_id == entry.sid)
            .and_then(|(pos, _)| pos.parse::<Position>().ok())
            .unwrap_or(0);
        let event = match game_type {
            GameType::DhihaEi => ServerEvent::MatchmakingMatched {
                room_id: code.clone(),
                position,
                players: players.clone(),
            },
            GameType::Digu => ServerEvent::MatchmakingMatched {
                room_id: code.clone(),
                position,
                players: players.clone(),
            },
        };
        server.sessions.send(entry.sid, event);
    }
    let _ = max_players;
    Ok(())
}

async fn reattach(
    server: &Arc<CoordinatorServer>,
    sid: SessionId,
    room_id: String,
    previous_oder_id: SessionId,
) -> Result<(), CoordinatorError> {
    let code = validation::validate_room_code(&room_id).map_err(|_| CoordinatorError::InvalidPayload)?;
    for game_type in [GameType::DhihaEi, GameType::Digu] {
        if let Some(room) = server.rooms.get(game_type, &code) {
            let position = {
                let mut guard = room.write().await;
                guard.reattach(previous_oder_id, sid)
            };
            if let Some(position) = position {
                server.sessions.set_room(sid, Some((game_type, code.clone())));
                let players = room.read().await.snapshot_players();
                let event = match game_type {
                    GameType::DhihaEi => ServerEvent::RoomJoined {
                        room_id: code.clone(),
                        position,
                        players: players.clone(),
                        max_players: room.read().await.max_players,
                    },
                    GameType::Digu => ServerEvent::DiguRoomJoined {
                        room_id: code.clone(),
                        position,
                        players: players.clone(),
                        max_players: room.read().await.max_players,
                    },
                };
                server.sessions.send(sid, event);
                let changed = match game_type {
                    GameType::DhihaEi => ServerEvent::PlayersChanged { players },
                    GameType::Digu => ServerEvent::DiguPlayersChanged { players },
                };
                broadcast_except(server, &room, changed, sid).await;
                return Ok(());
            }
        }
    }
    Err(CoordinatorError::RoomNotFound)
}

async fn room_of(
    server: &CoordinatorServer,
    sid: SessionId,
    game_type: GameType,
) -> Result<Arc<RwLock<Room>>, CoordinatorError> {
    let session = session_of(server, sid)?;
    let (bound_type, code) = session.room.ok_or(CoordinatorError::NotInRoom)?;
    if bound_type != game_type {
        return Err(CoordinatorError::NotInRoom);
    }
    server.rooms.get(game_type, &code).ok_or(CoordinatorError::RoomNotFound)
}

async fn broadcast_all(server: &CoordinatorServer, room: &Arc<RwLock<Room>>, event: ServerEvent) {
    let guard = room.read().await;
    for slot in guard.players.values() {
        server.sessions.send(slot.oder_id, event.clone());
    }
}

async fn broadcast_except(
    server: &CoordinatorServer,
    room: &Arc<RwLock<Room>>,
    event: ServerEvent,
    exclude: SessionId,
) {
    let guard = room.read().await;
    for slot in guard.players.values() {
        if slot.oder_id != exclude {
            server.sessions.send(slot.oder_id, event.clone());
        }
    }
}

async fn broadcast_game_started(
    server: &CoordinatorServer,
    room: &Arc<RwLock<Room>>,
    game_type: GameType,
) {
    let guard = room.read().await;
    let players = guard.snapshot_players();
    for (position, slot) in &guard.players {
        let hand = guard.hand_for(*position);
        let event = match game_type {
            GameType::DhihaEi => ServerEvent::GameStarted {
                game_state: guard.game_state.clone().unwrap_or(serde_json::Value::Null),
                hand,
                position: *position,
                players: players.clone(),
            },
            GameType::Digu => ServerEvent::DiguGameStarted {
                game_state: guard.game_state.clone().unwrap_or(serde_json::Value::Null),
                hand,
                position: *position,
                players: players.clone(),
            },
        };
        server.sessions.send(slot.oder_id, event);
    }
}

async fn broadcast_round_started(
    server: &CoordinatorServer,
    room: &Arc<RwLock<Room>>,
    game_type: GameType,
) {
    let guard = room.read().await;
    let players = guard.snapshot_players();
    for (position, slot) in &guard.players {
        let hand = guard.hand_for(*position);
        let event = match game_type {
            GameType::DhihaEi => ServerEvent::RoundStarted {
                game_state: guard.game_state.clone().unwrap_or(serde_json::Value::Null),
                hand,
                position: *position,
                players: players.clone(),
            },
            GameType::Digu => ServerEvent::DiguRoundStarted {
                game_state: guard.game_state.clone().unwrap_or(serde_json::Value::Null),
                hand,
                position: *position,
                players: players.clone(),
            },
        };
        server.sessions.send(slot.oder_id, event);
    }
}

/// Called by the websocket connection task when a socket drops. Marks the
/// slot disconnected, broadcasts a presence-only `players_changed` (the seat
/// is still held, just marked `connected: false`), and schedules grace
/// expiry. Reconnection within `RECONNECT_GRACE` is handled by `reattach`;
/// `player_disconnected` itself is only emitted once the grace window lapses
/// and the seat is actually vacated, by `finalize_disconnect`.
pub async fn handle_disconnect(server: &Arc<CoordinatorServer>, sid: SessionId) {
    let Some(session) = server.sessions.remove(sid) else {
        return;
    };
    let Some((game_type, code)) = session.room else {
        // Not seated in a room yet: drop any matchmaking queue entry so a
        // disconnect-while-queued doesn't leave a ghost entry behind.
        server.matchmaker.leave(GameType::DhihaEi, sid).await;
        server.matchmaker.leave(GameType::Digu, sid).await;
        return;
    };
    let Some(room) = server.rooms.get(game_type, &code) else {
        return;
    };

    let position = {
        let mut guard = room.write().await;
        guard.mark_disconnected(sid)
    };
    if position.is_some() {
        let players = room.read().await.snapshot_players();
        let event = match game_type {
            GameType::DhihaEi => ServerEvent::PlayersChanged { players },
            GameType::Digu => ServerEvent::DiguPlayersChanged { players },
        };
        broadcast_all(server, &room, event).await;
    }

    let server = Arc::clone(server);
    tokio::spawn(async move {
        tokio::time::sleep(RECONNECT_GRACE).await;
        finalize_disconnect(&server, game_type, code, sid).await;
    });
}

async fn finalize_disconnect(
    server: &Arc<CoordinatorServer>,
    game_type: GameType,
    code: String,
    sid: SessionId,
) {
    let Some(room) = server.rooms.get(game_type, &code) else {
        return;
    };
    let (removed_position, empty) = {
        let mut guard = room.write().await;
        // Only remove if the slot is still held by `sid` and still disconnected;
        // a successful `reattach` rebinds the slot to a new session id first.
        let still_disconnected = guard
            .players
            .values()
            .any(|slot| slot.oder_id == sid && !slot.connected);
        let removed_position = if still_disconnected {
            let position = guard.position_of(sid);
            guard.remove_slot(sid);
            position
        } else {
            None
        };
        (removed_position, guard.is_empty())
    };
    if empty {
        server.rooms.remove(game_type, &code);
        return;
    }
    if let Some(position) = removed_position {
        let players = room.read().await.snapshot_players();
        let event = match game_type {
            GameType::DhihaEi => ServerEvent::PlayerDisconnected { position, players },
            GameType::Digu => ServerEvent::DiguPlayerDisconnected { position, players },
        };
        broadcast_all(server, &room, event).await;
    }
}
