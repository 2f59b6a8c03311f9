use std::sync::Arc;

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use serde_json::json;
use subtle::ConstantTimeEq;

use crate::server::CoordinatorServer;

const PASSWORD_HEADER: &str = "x-admin-password";

/// Admin snapshot endpoint: current rooms (hands and game state stripped),
/// live session count, matchmaking queue depths, and uptime/counters.
/// Requires `X-Admin-Password` to match the configured secret via a
/// constant-time comparison; unauthorized requests get a bare 401.
pub async fn admin_snapshot(
    State(server): State<Arc<CoordinatorServer>>,
    headers: HeaderMap,
) -> Response {
    let Some(expected) = &server.config.admin_password else {
        return StatusCode::NOT_FOUND.into_response();
    };

    let supplied = headers
        .get(PASSWORD_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");

    if !passwords_match(expected, supplied) {
        return StatusCode::UNAUTHORIZED.into_response();
    }

    let all_rooms = server.rooms.all();
    let mut room_summaries = Vec::with_capacity(all_rooms.len());
    for (game_type, code, room) in all_rooms {
        let guard = room.read().await;
        room_summaries.push(json!({
            "code": code,
            "gameType": game_type.as_str(),
            "status": guard.status,
            "maxPlayers": guard.max_players,
            "players": guard.snapshot_players(),
            "createdAt": guard.created_at,
        }));
    }

    let body = json!({
        "rooms": room_summaries,
        "sessions": server.sessions.len(),
        "queues": server.matchmaker.queue_lengths().await,
        "uptimeSeconds": server.uptime().num_seconds(),
        "counters": {
            "roomsCreatedTotal": server.rooms_created_total(),
            "connectionsTotal": server.connections_total(),
        },
    });

    axum::Json(body).into_response()
}

fn passwords_match(expected: &str, supplied: &str) -> bool {
    let expected = expected.as_bytes();
    let supplied = supplied.as_bytes();
    if expected.len() != supplied.len() {
        return false;
    }
    expected.ct_eq(supplied).into()
}
