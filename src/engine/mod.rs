//! Rules engine: a thin wrapper over `shakmaty` plus the domain types the
//! rest of the crate shares.

pub mod game;
pub mod types;

pub use game::ChessGame;
pub use types::*;
