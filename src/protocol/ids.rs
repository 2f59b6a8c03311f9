use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Opaque id assigned to a transport connection for its lifetime.
pub type SessionId = Uuid;

/// A player's seat index within a room, `0..maxPlayers-1`.
pub type Position = u8;

/// Which of the two supported card games a room or queue entry belongs to.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum GameType {
    DhihaEi,
    Digu,
}

impl GameType {
    /// Fixed room size for dhiha-ei; `None` for digu, which is sized at creation.
    pub const fn fixed_max_players(self) -> Option<u8> {
        match self {
            Self::DhihaEi => Some(4),
            Self::Digu => None,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::DhihaEi => "dhiha-ei",
            Self::Digu => "digu",
        }
    }
}

impl std::fmt::Display for GameType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Clamp a requested digu room size to the server-enforced bound.
///
/// The wire protocol does not bound `maxPlayers` for digu explicitly; Open
/// Questions in the coordination design resolve this as a server-side clamp.
pub fn clamp_digu_max_players(requested: Option<u8>) -> u8 {
    requested.unwrap_or(4).clamp(2, 4)
}
