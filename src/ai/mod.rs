pub mod persona;
pub mod policy;
pub mod selector;

pub use policy::{AiMoveSource, AppliedAiMove, apply_ai_move};
pub use selector::{AiMoveResponse, MoveSelector, SelectionRequest, Suggestion, SuggestionSource};
