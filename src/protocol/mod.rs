// Protocol module: wire message types, validation, and room state machine.

pub mod error_codes;
pub mod ids;
pub mod messages;
pub mod room;
pub mod room_codes;
pub mod validation;

pub use error_codes::CoordinatorError;
pub use ids::{clamp_digu_max_players, GameType, Position, SessionId};
pub use messages::{ClientEvent, PlayersPayload, ServerEvent};
pub use room::{PlayerSlot, PlayerSlotView, Room, RoomStatus};
