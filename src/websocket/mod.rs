// WebSocket module: upgrade handler and HTTP route wiring.
//
// - handler: WebSocket upgrade handler and per-connection read/write loop
// - routes: HTTP route setup (ws, health, admin)

mod handler;
mod routes;

pub use handler::websocket_handler;
pub use routes::{create_router, run_server};
