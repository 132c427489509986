use chrono::{DateTime, Utc};
use rand::Rng;
use tracing::debug;
use uuid::Uuid;

use crate::ai::persona::{NEW_GAME_MESSAGE, WELCOME_MESSAGE};
use crate::ai::{AppliedAiMove, SelectionRequest, Suggestion, apply_ai_move};
use crate::chat::{ChatLog, Sender};
use crate::engine::{ChessError, ChessGame, Color, Difficulty, GameStatus, MoveOutcome, MoveRecord};

use super::interaction::{ClickOutcome, InteractionHandler};

/// The human always plays White.
pub const HUMAN: Color = Color::White;

/// Work handed to the AI task when Black's turn starts.
#[derive(Debug, Clone)]
pub struct AiTurnTicket {
    /// Session epoch at the time the turn started.
    pub epoch: u64,
    pub request: SelectionRequest,
}

/// What became of an AI turn when its result came back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AiTurnOutcome {
    Played(AppliedAiMove),
    /// The session was reset after the turn started; result discarded.
    Stale,
    /// Nothing to play: the game ended before the result arrived.
    Skipped,
}

/// One player's game against the Egyptian.
#[derive(Debug, Clone)]
pub struct GameSession {
    pub id: String,
    pub game: ChessGame,
    pub difficulty: Difficulty,
    pub chat: ChatLog,
    pub interaction: InteractionHandler,
    /// Bumped by every new game; AI results from older epochs are dropped.
    pub epoch: u64,
    pub ai_thinking: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl GameSession {
    pub fn new(difficulty: Difficulty) -> Self {
        Self::with_game(ChessGame::new(), difficulty)
    }

    /// Start from an arbitrary position.
    pub fn from_fen(fen: &str, difficulty: Difficulty) -> Result<Self, ChessError> {
        Ok(Self::with_game(ChessGame::from_fen(fen)?, difficulty))
    }

    fn with_game(game: ChessGame, difficulty: Difficulty) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            game,
            difficulty,
            chat: ChatLog::seeded(WELCOME_MESSAGE),
            interaction: InteractionHandler::new(),
            epoch: 0,
            ai_thinking: false,
            created_at: now,
            updated_at: now,
        }
    }

    // -----------------------------------------------------------------
    // Human side
    // -----------------------------------------------------------------

    /// Whether the board accepts input from the human right now.
    pub fn input_enabled(&self) -> bool {
        !self.ai_thinking && self.game.side_to_move() == HUMAN && !self.game.is_game_over()
    }

    pub fn click(&mut self, square: &str) -> ClickOutcome {
        let enabled = self.input_enabled();
        let outcome = self.interaction.click(&mut self.game, square, enabled);
        if matches!(outcome, ClickOutcome::Moved { .. }) {
            self.touch();
        }
        outcome
    }

    /// Play a human move given as squares.
    pub fn human_move(
        &mut self,
        from: &str,
        to: &str,
        promotion: Option<char>,
    ) -> Result<MoveRecord, ChessError> {
        if self.game.is_game_over() {
            return Err(ChessError::GameOver(self.game.status().to_string()));
        }
        if !self.input_enabled() {
            return Err(ChessError::IllegalMove("it is not White's turn".to_string()));
        }
        match self.game.apply_move(from, to, promotion) {
            MoveOutcome::Applied(record) => {
                self.interaction.clear();
                self.touch();
                Ok(record)
            }
            MoveOutcome::Rejected(reason) => Err(ChessError::IllegalMove(reason)),
        }
    }

    // -----------------------------------------------------------------
    // AI side
    // -----------------------------------------------------------------

    /// Start Black's turn if one is due and none is in flight.
    pub fn begin_ai_turn(&mut self) -> Option<AiTurnTicket> {
        if self.ai_thinking || self.game.side_to_move() == HUMAN || self.game.is_game_over() {
            return None;
        }
        let legal_moves = self.game.legal_moves();
        if legal_moves.is_empty() {
            return None;
        }
        self.ai_thinking = true;
        Some(AiTurnTicket {
            epoch: self.epoch,
            request: SelectionRequest {
                fen: self.game.current_position(),
                legal_moves,
                difficulty: self.difficulty,
                history: self.game.history_san(),
            },
        })
    }

    /// Apply the selector's answer for the turn started at `epoch`.
    pub fn finish_ai_turn<R: Rng + ?Sized>(
        &mut self,
        epoch: u64,
        suggestion: &Suggestion,
        rng: &mut R,
    ) -> AiTurnOutcome {
        if epoch != self.epoch {
            debug!(session_id = %self.id, epoch, current = self.epoch, "dropping stale AI result");
            return AiTurnOutcome::Stale;
        }
        self.ai_thinking = false;

        let Some(applied) = apply_ai_move(&mut self.game, suggestion, rng) else {
            return AiTurnOutcome::Skipped;
        };
        if let Some(comment) = &applied.comment {
            self.chat.push(Sender::Ai, comment.clone());
        }
        self.touch();
        AiTurnOutcome::Played(applied)
    }

    // -----------------------------------------------------------------
    // Session controls
    // -----------------------------------------------------------------

    /// Back to the start position with a fresh chat. Difficulty is kept.
    pub fn new_game(&mut self) {
        self.epoch += 1;
        self.game.reset();
        self.chat.reset(NEW_GAME_MESSAGE);
        self.interaction.clear();
        self.ai_thinking = false;
        self.touch();
    }

    pub fn set_difficulty(&mut self, difficulty: Difficulty) {
        self.difficulty = difficulty;
        self.touch();
    }

    // -----------------------------------------------------------------
    // Derived view
    // -----------------------------------------------------------------

    /// Bilingual status line for the board header.
    pub fn status_message(&self) -> &'static str {
        let side = self.game.side_to_move();
        if self.game.is_checkmate() {
            if side == HUMAN { "خسرت! (You Lost)" } else { "فزت! (You Won)" }
        } else if self.game.is_drawish() {
            "تعادل (Draw)"
        } else if self.game.in_check() {
            "كش! (Check!)"
        } else if side != HUMAN {
            "المصري يفكر... (The Egyptian is thinking)"
        } else {
            "دورك (Your Turn)"
        }
    }

    /// `white_wins`, `black_wins` or `draw`, once the game has ended.
    pub fn result(&self) -> Option<&'static str> {
        match self.game.status() {
            GameStatus::Checkmate => Some(match self.game.side_to_move() {
                Color::White => "black_wins",
                Color::Black => "white_wins",
            }),
            status if status.is_drawish() => Some("draw"),
            _ => None,
        }
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}
