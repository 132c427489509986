//! WebSocket message types for live session events.

use serde::{Deserialize, Serialize};

use crate::ai::{AiMoveSource, AppliedAiMove};
use crate::chat::ChatMessage;
use crate::engine::MoveRecord;
use crate::session::GameSession;

// ---------------------------------------------------------------------------
// Server → Client events
// ---------------------------------------------------------------------------

/// Envelope sent from server to every subscribed WebSocket client.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WsEvent {
    /// Discriminator so clients can switch on event type.
    #[serde(rename = "type")]
    pub event_type: WsEventType,
    #[serde(flatten)]
    pub payload: WsPayload,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WsEventType {
    Subscribed,
    MoveMade,
    AiThinking,
    AiMoveComplete,
    ChatMessage,
    GameOver,
    NewGame,
    Error,
    Pong,
}

#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum WsPayload {
    State(SessionStatePayload),
    MoveMade(MoveMadePayload),
    AiThinking(AiThinkingPayload),
    AiMoveComplete(AiMoveCompletePayload),
    ChatMessage(ChatMessagePayload),
    GameOver(GameOverPayload),
    Error(ErrorPayload),
    Pong(PongPayload),
}

/// Position summary shared by `subscribed` and `new_game`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionStatePayload {
    pub session_id: String,
    pub fen: String,
    pub status: String,
    pub status_message: String,
    pub current_player: String,
    pub difficulty: String,
    pub move_count: usize,
    pub check: bool,
    pub ai_thinking: bool,
}

impl SessionStatePayload {
    fn from_session(session: &GameSession) -> Self {
        let game = &session.game;
        Self {
            session_id: session.id.clone(),
            fen: game.current_position(),
            status: game.status().as_str().to_string(),
            status_message: session.status_message().to_string(),
            current_player: game.side_to_move().as_str().to_string(),
            difficulty: session.difficulty.as_str().to_string(),
            move_count: game.move_history().len(),
            check: game.in_check(),
            ai_thinking: session.ai_thinking,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MoveMadePayload {
    pub session_id: String,
    pub san: String,
    pub from: String,
    pub to: String,
    pub player: String,
    pub fen: String,
    pub status: String,
    pub move_count: usize,
    pub check: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AiThinkingPayload {
    pub session_id: String,
    pub difficulty: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AiMoveCompletePayload {
    pub session_id: String,
    pub san: String,
    pub from: String,
    pub to: String,
    pub fen: String,
    pub status: String,
    pub source: AiMoveSource,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    pub thinking_time_ms: u64,
    pub move_count: usize,
    pub check: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessagePayload {
    pub session_id: String,
    pub message: ChatMessage,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GameOverPayload {
    pub session_id: String,
    pub result: String,
    pub status: String,
    pub fen: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorPayload {
    pub message: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PongPayload {
    pub timestamp: u64,
}

// ---------------------------------------------------------------------------
// Client → Server commands
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WsCommand {
    Ping,
}

// ---------------------------------------------------------------------------
// Convenience constructors
// ---------------------------------------------------------------------------

impl WsEvent {
    fn new(event_type: WsEventType, payload: WsPayload) -> Self {
        WsEvent {
            event_type,
            payload,
        }
    }

    pub fn subscribed(session: &GameSession) -> Self {
        Self::new(
            WsEventType::Subscribed,
            WsPayload::State(SessionStatePayload::from_session(session)),
        )
    }

    pub fn new_game(session: &GameSession) -> Self {
        Self::new(
            WsEventType::NewGame,
            WsPayload::State(SessionStatePayload::from_session(session)),
        )
    }

    /// A human move; `session` already reflects it.
    pub fn move_made(session: &GameSession, record: &MoveRecord) -> Self {
        let game = &session.game;
        Self::new(
            WsEventType::MoveMade,
            WsPayload::MoveMade(MoveMadePayload {
                session_id: session.id.clone(),
                san: record.san.clone(),
                from: record.from.clone(),
                to: record.to.clone(),
                player: record.color.as_str().to_string(),
                fen: game.current_position(),
                status: game.status().as_str().to_string(),
                move_count: game.move_history().len(),
                check: game.in_check(),
            }),
        )
    }

    pub fn ai_thinking(session_id: &str, difficulty: &str) -> Self {
        Self::new(
            WsEventType::AiThinking,
            WsPayload::AiThinking(AiThinkingPayload {
                session_id: session_id.to_string(),
                difficulty: difficulty.to_string(),
            }),
        )
    }

    pub fn ai_move_complete(
        session: &GameSession,
        applied: &AppliedAiMove,
        thinking_time_ms: u64,
    ) -> Self {
        let game = &session.game;
        Self::new(
            WsEventType::AiMoveComplete,
            WsPayload::AiMoveComplete(AiMoveCompletePayload {
                session_id: session.id.clone(),
                san: applied.record.san.clone(),
                from: applied.record.from.clone(),
                to: applied.record.to.clone(),
                fen: game.current_position(),
                status: game.status().as_str().to_string(),
                source: applied.source,
                comment: applied.comment.clone(),
                thinking_time_ms,
                move_count: game.move_history().len(),
                check: game.in_check(),
            }),
        )
    }

    pub fn chat_message(session_id: &str, message: &ChatMessage) -> Self {
        Self::new(
            WsEventType::ChatMessage,
            WsPayload::ChatMessage(ChatMessagePayload {
                session_id: session_id.to_string(),
                message: message.clone(),
            }),
        )
    }

    pub fn game_over(session: &GameSession, result: &str) -> Self {
        Self::new(
            WsEventType::GameOver,
            WsPayload::GameOver(GameOverPayload {
                session_id: session.id.clone(),
                result: result.to_string(),
                status: session.game.status().as_str().to_string(),
                fen: session.game.current_position(),
            }),
        )
    }

    pub fn error(message: &str) -> Self {
        Self::new(
            WsEventType::Error,
            WsPayload::Error(ErrorPayload {
                message: message.to_string(),
            }),
        )
    }

    pub fn pong() -> Self {
        let ts = chrono::Utc::now().timestamp_millis().max(0) as u64;
        Self::new(WsEventType::Pong, WsPayload::Pong(PongPayload { timestamp: ts }))
    }

    /// Serialize to JSON text for sending over WebSocket.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self)
            .unwrap_or_else(|_| r#"{"type":"error","message":"serialization failed"}"#.to_string())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
