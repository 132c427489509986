use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::chat::ChatMessage;
use crate::engine::{Difficulty, MoveRecord};
use crate::session::{ClickOutcome, GameSession, Selection};

// ---------------------------------------------------------------------------
// Request models
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSessionRequest {
    pub difficulty: Option<String>,
    pub fen: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClickRequest {
    pub square: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoveRequest {
    pub from: String,
    pub to: String,
    pub promotion: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DifficultyRequest {
    pub difficulty: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegalMovesQuery {
    pub from: Option<String>,
}

// ---------------------------------------------------------------------------
// Response models
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime: u64,
    pub sessions: usize,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteResponse {
    pub success: bool,
    pub message: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DifficultyInfo {
    pub id: Difficulty,
    pub label: String,
}

impl From<Difficulty> for DifficultyInfo {
    fn from(d: Difficulty) -> Self {
        Self {
            id: d,
            label: d.label().to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LastMove {
    pub from: String,
    pub to: String,
    pub san: String,
}

/// Everything a client needs to draw the board, header and chat.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionResponse {
    pub id: String,
    /// Rank 8 first; FEN letters, White uppercase.
    pub board: Vec<Vec<Option<String>>>,
    pub fen: String,
    pub status: String,
    pub status_message: String,
    pub current_player: String,
    pub check: bool,
    pub checkmate: bool,
    pub draw: bool,
    pub game_over: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<String>,
    pub difficulty: DifficultyInfo,
    pub move_history: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_move: Option<LastMove>,
    pub selection: Selection,
    pub ai_thinking: bool,
    pub input_enabled: bool,
    pub chat: Vec<ChatMessage>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&GameSession> for SessionResponse {
    fn from(session: &GameSession) -> Self {
        let game = &session.game;
        let status = game.status();
        Self {
            id: session.id.clone(),
            board: game.board_rows(),
            fen: game.current_position(),
            status: status.as_str().to_string(),
            status_message: session.status_message().to_string(),
            current_player: game.side_to_move().as_str().to_string(),
            check: game.in_check(),
            checkmate: game.is_checkmate(),
            draw: game.is_drawish(),
            game_over: status.is_game_over(),
            result: session.result().map(str::to_string),
            difficulty: session.difficulty.into(),
            move_history: game.history_san(),
            last_move: game.last_move().map(|m| LastMove {
                from: m.from.clone(),
                to: m.to.clone(),
                san: m.san.clone(),
            }),
            selection: session.interaction.selection().clone(),
            ai_thinking: session.ai_thinking,
            input_enabled: session.input_enabled(),
            chat: session.chat.messages().to_vec(),
            created_at: session.created_at,
            updated_at: session.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSummary {
    pub id: String,
    pub status: String,
    pub difficulty: Difficulty,
    pub move_count: usize,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListSessionsResponse {
    pub sessions: Vec<SessionSummary>,
    pub total: usize,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClickResponse {
    pub outcome: ClickOutcome,
    pub session: SessionResponse,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MoveResponse {
    #[serde(rename = "move")]
    pub played: MoveRecord,
    pub session: SessionResponse,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LegalMovesResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from: Option<String>,
    pub moves: Vec<String>,
    pub count: usize,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatResponse {
    pub messages: Vec<ChatMessage>,
    pub count: usize,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LlmStatusResponse {
    pub enabled: bool,
    pub available: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
    pub timeout_ms: u64,
    pub move_delay_ms: u64,
    pub difficulties: Vec<DifficultyInfo>,
}
