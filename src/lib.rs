#![cfg_attr(not(test), deny(clippy::panic))]
#![allow(
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::module_name_repetitions,
    clippy::too_many_arguments,
    clippy::too_many_lines,
    clippy::similar_names
)]

//! # Thaasbai
//!
//! Realtime coordination server for two Maldivian card games, Dhiha Ei and
//! Digu: session bookkeeping, room lifecycle, matchmaking, and wire-protocol
//! dispatch over WebSocket. In-memory only; one process holds all state.

/// Admin snapshot endpoint.
pub mod admin;

/// Server configuration and environment variables.
pub mod config;

/// Event routing: decodes client frames and drives room/session state.
pub mod dispatcher;

/// Structured logging configuration.
pub mod logging;

/// FIFO matchmaking queues for both game types.
pub mod matchmaking;

/// Wire message types, validation, and room state machine.
pub mod protocol;

/// Per-IP connection admission limiting.
pub mod rate_limit;

/// Room namespace registry (dhiha-ei and digu, isolated).
pub mod rooms;

/// Live session registry and per-session outbound channels.
pub mod session;

/// Top-level server orchestration and background tasks.
pub mod server;

/// WebSocket connection handling and HTTP routes.
pub mod websocket;
