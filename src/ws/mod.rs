//! WebSocket module: live session event streaming.
//!
//! - [`messages`]: event and command envelopes.
//! - [`manager`]: per-session client tracking and broadcast.
//! - [`handler`]: Axum upgrade handler.

pub mod handler;
pub mod manager;
pub mod messages;

pub use handler::ws_handler;
pub use manager::WsManager;
pub use messages::WsEvent;
