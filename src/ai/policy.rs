//! Validation and application of the AI's move.
//!
//! The suggested move is tried first. If the rules engine refuses it, the
//! move is replaced by a uniformly random legal move computed from the
//! position as it stands now, and the service's comment is dropped. Either
//! way, exactly one Black move is played unless the game is already over.

use rand::Rng;
use rand::seq::SliceRandom;
use serde::Serialize;
use tracing::warn;

use crate::engine::{ChessGame, MoveOutcome, MoveRecord};

use super::selector::{Suggestion, SuggestionSource};

/// How the played move was arrived at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AiMoveSource {
    /// The service's move was legal and played.
    Service,
    /// The service failed; the selector's random pick was played.
    ServiceUnavailable,
    /// The service answered with a move the rules engine refused.
    IllegalSuggestion,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppliedAiMove {
    pub record: MoveRecord,
    /// Text to append to the chat, if any.
    pub comment: Option<String>,
    pub source: AiMoveSource,
}

/// Play Black's reply on `game`. `None` only when no move could be played,
/// which means the game was already over.
pub fn apply_ai_move<R: Rng + ?Sized>(
    game: &mut ChessGame,
    suggestion: &Suggestion,
    rng: &mut R,
) -> Option<AppliedAiMove> {
    if game.is_game_over() {
        return None;
    }

    match game.apply_san(&suggestion.response.chosen_move) {
        MoveOutcome::Applied(record) => {
            let comment = suggestion.response.comment.trim();
            Some(AppliedAiMove {
                record,
                comment: (!comment.is_empty()).then(|| comment.to_string()),
                source: match suggestion.source {
                    SuggestionSource::Service => AiMoveSource::Service,
                    SuggestionSource::Fallback => AiMoveSource::ServiceUnavailable,
                },
            })
        }
        MoveOutcome::Rejected(reason) => {
            warn!(
                suggested = %suggestion.response.chosen_move,
                %reason,
                "suggested move rejected, playing a random legal move"
            );
            random_legal_move(game, rng).map(|record| AppliedAiMove {
                record,
                comment: None,
                source: AiMoveSource::IllegalSuggestion,
            })
        }
    }
}

fn random_legal_move<R: Rng + ?Sized>(game: &mut ChessGame, rng: &mut R) -> Option<MoveRecord> {
    let mut legal = game.legal_moves();
    legal.shuffle(rng);
    legal.iter().find_map(|san| game.apply_san(san).applied())
}
