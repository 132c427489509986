//! Click-to-select, click-to-move handling for the human side.

use serde::Serialize;

use crate::engine::{ChessGame, MoveOutcome, MoveRecord};

/// What is highlighted on the board.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "lowercase")]
pub enum Selection {
    #[default]
    Idle,
    Selected {
        square: String,
        destinations: Vec<String>,
    },
}

/// Result of one click.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ClickOutcome {
    /// Input is disabled, or an idle click landed on an empty or enemy square.
    Ignored,
    Selected {
        square: String,
        destinations: Vec<String>,
    },
    Deselected,
    Moved { record: MoveRecord },
    /// A move attempt failed and the clicked square was not selectable.
    Cleared,
}

#[derive(Debug, Clone, Default)]
pub struct InteractionHandler {
    selection: Selection,
}

impl InteractionHandler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn selected_square(&self) -> Option<&str> {
        match &self.selection {
            Selection::Selected { square, .. } => Some(square),
            Selection::Idle => None,
        }
    }

    pub fn clear(&mut self) {
        self.selection = Selection::Idle;
    }

    /// Handle a click on `square`. With `enabled == false` every click is
    /// ignored and nothing changes. Promotions resolve to a queen.
    pub fn click(&mut self, game: &mut ChessGame, square: &str, enabled: bool) -> ClickOutcome {
        if !enabled {
            return ClickOutcome::Ignored;
        }
        let square = square.trim().to_ascii_lowercase();

        let Some(from) = self.selected_square().map(str::to_string) else {
            return self.try_select(game, &square).unwrap_or(ClickOutcome::Ignored);
        };

        if from == square {
            self.clear();
            return ClickOutcome::Deselected;
        }

        if let MoveOutcome::Applied(record) = game.apply_move(&from, &square, None) {
            self.clear();
            return ClickOutcome::Moved { record };
        }

        self.try_select(game, &square).unwrap_or_else(|| {
            self.clear();
            ClickOutcome::Cleared
        })
    }

    /// Select `square` if it holds a piece of the side to move.
    fn try_select(&mut self, game: &ChessGame, square: &str) -> Option<ClickOutcome> {
        let (color, _) = game.piece_at(square)?;
        if color != game.side_to_move() {
            return None;
        }
        let destinations = game.legal_destinations(square);
        self.selection = Selection::Selected {
            square: square.to_string(),
            destinations: destinations.clone(),
        };
        Some(ClickOutcome::Selected {
            square: square.to_string(),
            destinations,
        })
    }
}
