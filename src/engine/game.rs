//! Rules-engine wrapper around `shakmaty`.
//!
//! `ChessGame` owns the position, the SAN move history, and the repetition
//! keys needed for draw detection. Every move attempt comes back as a
//! [`MoveOutcome`]; nothing in here panics on bad input from a player or the
//! move-suggestion service.

use shakmaty::fen::Fen;
use shakmaty::san::{San, SanPlus};
use shakmaty::{CastlingMode, Chess, EnPassantMode, File, Move, Position, Rank, Role, Square};

use crate::engine::types::{
    ChessError, Color, DrawReason, GameStatus, MoveOutcome, MoveRecord,
};

/// A chess game: current position plus everything derived from its history.
#[derive(Clone, Debug)]
pub struct ChessGame {
    position: Chess,
    history: Vec<MoveRecord>,
    /// Position keys (placement, side, castling, en passant) of every position
    /// reached, including the current one.
    repetition_keys: Vec<String>,
}

impl ChessGame {
    // -----------------------------------------------------------------
    // Constructors
    // -----------------------------------------------------------------

    /// Standard starting position.
    pub fn new() -> Self {
        Self::with_position(Chess::default())
    }

    /// Start from an arbitrary FEN.
    pub fn from_fen(fen: &str) -> Result<Self, ChessError> {
        let parsed: Fen = fen
            .trim()
            .parse()
            .map_err(|e| ChessError::InvalidFen(format!("{e}")))?;
        let position: Chess = parsed
            .into_position(CastlingMode::Standard)
            .map_err(|e| ChessError::InvalidFen(format!("{e}")))?;
        Ok(Self::with_position(position))
    }

    fn with_position(position: Chess) -> Self {
        let key = repetition_key(&position);
        Self {
            position,
            history: Vec::new(),
            repetition_keys: vec![key],
        }
    }

    /// Back to the standard starting position with an empty history.
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    // -----------------------------------------------------------------
    // Position queries
    // -----------------------------------------------------------------

    /// Current position as FEN.
    pub fn current_position(&self) -> String {
        Fen::from_position(self.position.clone(), EnPassantMode::Legal).to_string()
    }

    pub fn side_to_move(&self) -> Color {
        self.position.turn().into()
    }

    pub fn in_check(&self) -> bool {
        self.position.is_check()
    }

    pub fn is_checkmate(&self) -> bool {
        self.position.is_checkmate()
    }

    /// Stalemate, insufficient material, fifty-move rule or threefold
    /// repetition.
    pub fn is_drawish(&self) -> bool {
        self.status().is_drawish()
    }

    pub fn is_game_over(&self) -> bool {
        self.status().is_game_over()
    }

    pub fn status(&self) -> GameStatus {
        let pos = &self.position;
        if pos.is_checkmate() {
            GameStatus::Checkmate
        } else if pos.is_stalemate() {
            GameStatus::Stalemate
        } else if pos.is_insufficient_material() {
            GameStatus::Draw(DrawReason::InsufficientMaterial)
        } else if pos.halfmoves() >= 100 {
            GameStatus::Draw(DrawReason::FiftyMoveRule)
        } else if self.repetition_count() >= 3 {
            GameStatus::Draw(DrawReason::ThreefoldRepetition)
        } else if pos.is_check() {
            GameStatus::Check
        } else {
            GameStatus::Active
        }
    }

    fn repetition_count(&self) -> usize {
        match self.repetition_keys.last() {
            Some(current) => self.repetition_keys.iter().filter(|k| *k == current).count(),
            None => 0,
        }
    }

    /// Piece on a square as `(color, fen letter)`, e.g. `(White, 'N')`.
    pub fn piece_at(&self, square: &str) -> Option<(Color, char)> {
        let sq: Square = square.parse().ok()?;
        self.position
            .board()
            .piece_at(sq)
            .map(|p| (p.color.into(), p.char()))
    }

    /// 8×8 board for rendering. Row 0 is rank 8; White pieces uppercase.
    pub fn board_rows(&self) -> Vec<Vec<Option<String>>> {
        let board = self.position.board();
        (0..8u32)
            .rev()
            .map(|rank| {
                (0..8u32)
                    .map(|file| {
                        let sq = Square::from_coords(File::new(file), Rank::new(rank));
                        board.piece_at(sq).map(|p| p.char().to_string())
                    })
                    .collect()
            })
            .collect()
    }

    // -----------------------------------------------------------------
    // Moves
    // -----------------------------------------------------------------

    /// All legal moves in SAN, in generation order.
    pub fn legal_moves(&self) -> Vec<String> {
        self.position
            .legal_moves()
            .iter()
            .map(|m| {
                let mut scratch = self.position.clone();
                SanPlus::from_move_and_play_unchecked(&mut scratch, m).to_string()
            })
            .collect()
    }

    /// Destination squares reachable from `from`. Castling is reported as
    /// the king's landing square.
    pub fn legal_destinations(&self, from: &str) -> Vec<String> {
        let Ok(from_sq) = from.parse::<Square>() else {
            return Vec::new();
        };
        let mut out: Vec<String> = Vec::new();
        for m in self.position.legal_moves().iter() {
            if m.from() != Some(from_sq) {
                continue;
            }
            let dest = king_landing_square(m).to_string();
            if !out.contains(&dest) {
                out.push(dest);
            }
        }
        out
    }

    /// Play a move given as from/to squares. A missing promotion piece
    /// defaults to a queen; a promotion piece on a non-promoting move is
    /// ignored.
    pub fn apply_move(&mut self, from: &str, to: &str, promotion: Option<char>) -> MoveOutcome {
        if self.is_game_over() {
            return MoveOutcome::Rejected(format!("game is over: {}", self.status()));
        }
        let (Ok(from_sq), Ok(to_sq)) = (from.parse::<Square>(), to.parse::<Square>()) else {
            return MoveOutcome::Rejected(format!("invalid square in {from}{to}"));
        };
        let wanted = match promotion {
            Some(c) => match Role::from_char(c.to_ascii_lowercase()) {
                Some(role) if role != Role::Pawn && role != Role::King => role,
                _ => return MoveOutcome::Rejected(format!("invalid promotion piece: {c}")),
            },
            None => Role::Queen,
        };

        let legal = self.position.legal_moves();
        let found = legal.iter().find(|m| {
            m.from() == Some(from_sq)
                && king_landing_square(m) == to_sq
                && m.promotion().is_none_or(|role| role == wanted)
        });

        match found {
            Some(m) => {
                let m = m.clone();
                MoveOutcome::Applied(self.play(&m))
            }
            None => MoveOutcome::Rejected(format!("{from}{to} is not a legal move")),
        }
    }

    /// Play a move given in SAN. Check/mate suffixes and annotation marks are
    /// tolerated, and a pawn reaching the last rank without a promotion piece
    /// promotes to a queen.
    pub fn apply_san(&mut self, san: &str) -> MoveOutcome {
        if self.is_game_over() {
            return MoveOutcome::Rejected(format!("game is over: {}", self.status()));
        }
        match self.resolve_san(san) {
            Some(m) => MoveOutcome::Applied(self.play(&m)),
            None => MoveOutcome::Rejected(format!("{san} is not a legal move")),
        }
    }

    fn resolve_san(&self, san: &str) -> Option<Move> {
        let cleaned = san.trim().trim_end_matches(|c| c == '!' || c == '?');
        let parsed: SanPlus = cleaned.parse().ok()?;
        match parsed.san.to_move(&self.position) {
            Ok(m) => Some(m),
            Err(_) => queen_promotion(&parsed.san)?.to_move(&self.position).ok(),
        }
    }

    fn play(&mut self, m: &Move) -> MoveRecord {
        let color = self.side_to_move();
        let from = m.from().map(|sq| sq.to_string()).unwrap_or_default();
        let to = king_landing_square(m).to_string();
        let promotion = m.promotion().map(|role| role.char());
        let san = SanPlus::from_move_and_play_unchecked(&mut self.position, m).to_string();

        self.repetition_keys.push(repetition_key(&self.position));
        let record = MoveRecord {
            san,
            from,
            to,
            color,
            promotion,
        };
        self.history.push(record.clone());
        record
    }

    // -----------------------------------------------------------------
    // History
    // -----------------------------------------------------------------

    pub fn history_san(&self) -> Vec<String> {
        self.history.iter().map(|r| r.san.clone()).collect()
    }

    pub fn move_history(&self) -> &[MoveRecord] {
        &self.history
    }

    pub fn last_move(&self) -> Option<&MoveRecord> {
        self.history.last()
    }
}

impl Default for ChessGame {
    fn default() -> Self {
        Self::new()
    }
}

/// Where the king lands for castling moves; the plain destination otherwise.
fn king_landing_square(m: &Move) -> Square {
    match m {
        Move::Castle { king, rook } => {
            let file = if rook.file() == File::H { File::G } else { File::C };
            Square::from_coords(file, king.rank())
        }
        _ => m.to(),
    }
}

fn queen_promotion(san: &San) -> Option<San> {
    match san {
        San::Normal {
            role: Role::Pawn,
            file,
            rank,
            capture,
            to,
            promotion: None,
        } if to.rank() == Rank::First || to.rank() == Rank::Eighth => Some(San::Normal {
            role: Role::Pawn,
            file: *file,
            rank: *rank,
            capture: *capture,
            to: *to,
            promotion: Some(Role::Queen),
        }),
        _ => None,
    }
}

/// FEN without the move counters.
fn repetition_key(pos: &Chess) -> String {
    Fen::from_position(pos.clone(), EnPassantMode::Legal)
        .to_string()
        .split_whitespace()
        .take(4)
        .collect::<Vec<_>>()
        .join(" ")
}

// =========================================================================
// Tests
// =========================================================================
