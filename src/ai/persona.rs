//! The Egyptian's voice: system instruction, output schema and the fixed
//! lines it speaks when the service lets it down.

use serde_json::{Value, json};

use crate::engine::Difficulty;

pub const SYSTEM_INSTRUCTION: &str = r#"You are a wise Ancient Egyptian Grandmaster, playing a game of chess against a challenger.
You speak Arabic. Your tone is regal, ancient, wise, and slightly intimidating, but fair.
You are playing the BLACK pieces.
Your goal is to choose the best chess move from the provided list of legal moves based on the current board state (FEN) and the difficulty level.

Response Format:
You must return a JSON object with two fields:
1. "move": The SAN (Standard Algebraic Notation) string of the move you chose (e.g., "Nf6", "e5", "O-O").
2. "comment": A short, one-sentence commentary in Arabic about your move or the current state of the game. Use Egyptian metaphors (Nile, Pyramids, Ra, Anubis, Desert, etc.).

Difficulty Guidance:
- Novice (مبتدئ): Make decent moves but overlook complex traps. Be encouraging.
- Scholar (حكيم): Play solidly. Comment on strategy.
- Egyptian (مصري): Play ruthless, best-possible moves. Be arrogant and show your dominance."#;

/// Said when the move-suggestion service fails and a random move is played.
pub const FALLBACK_COMMENT: &str = "لقد شتتت الآلهة انتباهي... سأتحرك بصمت.";

/// First message of a brand-new session.
pub const WELCOME_MESSAGE: &str = "أهلاً بك أيها المتحدي. هل تظن أنك تملك الحكمة لهزيمة المصري؟";

/// Sole message after "new game".
pub const NEW_GAME_MESSAGE: &str = "لنبدأ من جديد. النيل يجدد نفسه، وكذلك نحن.";

/// Schema for the two-field reply, in Gemini's OpenAPI subset.
pub fn response_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "move": {
                "type": "STRING",
                "description": "The chosen chess move in SAN format."
            },
            "comment": {
                "type": "STRING",
                "description": "A brief comment in Arabic."
            }
        },
        "required": ["move", "comment"]
    })
}

/// One-line hint matching the guidance block of the system instruction.
pub fn difficulty_hint(difficulty: Difficulty) -> &'static str {
    match difficulty {
        Difficulty::Novice => "Make decent moves but overlook complex traps. Be encouraging.",
        Difficulty::Scholar => "Play solidly. Comment on strategy.",
        Difficulty::Egyptian => {
            "Play ruthless, best-possible moves. Be arrogant and show your dominance."
        }
    }
}
