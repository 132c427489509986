//! Per-player game sessions: the game, its chat, the click handler, and the
//! AI turn that follows every human move.

pub mod game_session;
pub mod interaction;
pub mod turn;

pub use game_session::{AiTurnOutcome, AiTurnTicket, GameSession, HUMAN};
pub use interaction::{ClickOutcome, InteractionHandler, Selection};
pub use turn::{run_ai_turn, spawn_ai_turn};
