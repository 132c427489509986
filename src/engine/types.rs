use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Color
// ---------------------------------------------------------------------------

/// The two sides in a chess game.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Color {
    White,
    Black,
}

impl Color {
    pub fn as_str(self) -> &'static str {
        match self {
            Color::White => "white",
            Color::Black => "black",
        }
    }
}

impl std::ops::Not for Color {
    type Output = Self;
    fn not(self) -> Self {
        match self {
            Color::White => Color::Black,
            Color::Black => Color::White,
        }
    }
}

impl From<shakmaty::Color> for Color {
    fn from(c: shakmaty::Color) -> Self {
        match c {
            shakmaty::Color::White => Color::White,
            shakmaty::Color::Black => Color::Black,
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Difficulty
// ---------------------------------------------------------------------------

/// How hard the Egyptian tries. Only shapes the persona hint sent to the
/// move-suggestion service; it never constrains legality.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Novice,
    #[default]
    Scholar,
    #[serde(alias = "egyptian-expert", alias = "expert")]
    Egyptian,
}

impl Difficulty {
    pub const ALL: [Difficulty; 3] = [Difficulty::Novice, Difficulty::Scholar, Difficulty::Egyptian];

    /// Parse from either the English id or the Arabic label (case-insensitive).
    pub fn from_str_loose(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "novice" | "مبتدئ" => Some(Difficulty::Novice),
            "scholar" | "حكيم" => Some(Difficulty::Scholar),
            "egyptian" | "egyptian-expert" | "expert" | "مصري" => Some(Difficulty::Egyptian),
            _ => None,
        }
    }

    /// Stable English identifier used in the API.
    pub fn as_str(self) -> &'static str {
        match self {
            Difficulty::Novice => "novice",
            Difficulty::Scholar => "scholar",
            Difficulty::Egyptian => "egyptian",
        }
    }

    /// Arabic label shown to the player and sent in the prompt.
    pub fn label(self) -> &'static str {
        match self {
            Difficulty::Novice => "مبتدئ",
            Difficulty::Scholar => "حكيم",
            Difficulty::Egyptian => "مصري",
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// GameStatus
// ---------------------------------------------------------------------------

/// Current status of a game.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GameStatus {
    Active,
    Check,
    Checkmate,
    Stalemate,
    Draw(DrawReason),
}

impl GameStatus {
    pub fn as_str(&self) -> &str {
        match self {
            GameStatus::Active => "active",
            GameStatus::Check => "check",
            GameStatus::Checkmate => "checkmate",
            GameStatus::Stalemate => "stalemate",
            GameStatus::Draw(reason) => reason.as_str(),
        }
    }

    pub fn is_game_over(&self) -> bool {
        matches!(
            self,
            GameStatus::Checkmate | GameStatus::Stalemate | GameStatus::Draw(_)
        )
    }

    /// Stalemate and every other drawn ending collapse into one flag.
    pub fn is_drawish(&self) -> bool {
        matches!(self, GameStatus::Stalemate | GameStatus::Draw(_))
    }
}

impl fmt::Display for GameStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reason for a draw other than stalemate.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DrawReason {
    FiftyMoveRule,
    ThreefoldRepetition,
    InsufficientMaterial,
}

impl DrawReason {
    pub fn as_str(&self) -> &str {
        match self {
            DrawReason::FiftyMoveRule => "fifty_move_rule",
            DrawReason::ThreefoldRepetition => "threefold_repetition",
            DrawReason::InsufficientMaterial => "insufficient_material",
        }
    }
}

// ---------------------------------------------------------------------------
// Moves
// ---------------------------------------------------------------------------

/// A ply that the rules engine accepted.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MoveRecord {
    /// SAN including any check/mate suffix, e.g. `"Qxf7#"`.
    pub san: String,
    pub from: String,
    pub to: String,
    pub color: Color,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub promotion: Option<char>,
}

/// Result of asking the rules engine to play a move. A thrown error and a
/// null return are the same thing here: the move was not played.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MoveOutcome {
    Applied(MoveRecord),
    Rejected(String),
}

impl MoveOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, MoveOutcome::Applied(_))
    }

    pub fn applied(self) -> Option<MoveRecord> {
        match self {
            MoveOutcome::Applied(record) => Some(record),
            MoveOutcome::Rejected(_) => None,
        }
    }
}

// ---------------------------------------------------------------------------
// ChessError
// ---------------------------------------------------------------------------

/// Domain errors surfaced by the rules-engine wrapper.
#[derive(Debug, thiserror::Error)]
pub enum ChessError {
    #[error("illegal move: {0}")]
    IllegalMove(String),

    #[error("invalid FEN string: {0}")]
    InvalidFen(String),

    #[error("game is already over: {0}")]
    GameOver(String),
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
