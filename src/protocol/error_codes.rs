use thiserror::Error;

/// Typed coordinator errors. Every variant carries a fixed wire label used
/// verbatim as the `message` field of an outbound `error` event (see
/// `CoordinatorError::wire_message`); the `Display` impl (derived by
/// `thiserror`) carries the longer, human-readable diagnostic used in logs.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CoordinatorError {
    #[error("frame was malformed or failed schema validation")]
    InvalidPayload,

    #[error("session is not bound to a room")]
    NotInRoom,

    #[error("event submitted by a session whose position is not the current turn")]
    NotYourTurn,

    #[error("host-only event submitted by a non-host session")]
    NotHost,

    #[error("room code does not match any room in this namespace")]
    RoomNotFound,

    #[error("room has no free slots")]
    RoomFull,

    #[error("room is in the playing state and cannot be joined")]
    GameInProgress,

    #[error("remote IP has reached the concurrent connection cap")]
    TooManyConnections,

    #[error("remote IP is opening connections faster than the allowed rate")]
    RateLimited,

    #[error("connection closed for inactivity")]
    Timeout,

    #[error("unhandled internal error: {0}")]
    Internal(String),
}

impl CoordinatorError {
    /// The exact string sent in `error { message }` to the offending session.
    pub fn wire_message(&self) -> &'static str {
        match self {
            Self::InvalidPayload => "invalid_payload",
            Self::NotInRoom => "not_in_room",
            Self::NotYourTurn => "not_your_turn",
            Self::NotHost => "not_host",
            Self::RoomNotFound => "room_not_found",
            Self::RoomFull => "room_full",
            Self::GameInProgress => "game_in_progress",
            Self::TooManyConnections => "too_many_connections",
            Self::RateLimited => "rate_limited",
            Self::Timeout => "timeout",
            Self::Internal(_) => "internal",
        }
    }
}
