//! Move Selector: asks the move-suggestion service for one move plus a
//! comment, and never fails.
//!
//! Whatever goes wrong on the way (no provider, transport error, timeout,
//! non-2xx, empty or non-JSON body, missing field) collapses into one failure
//! class, answered with a uniformly random move from the legal set and
//! [`FALLBACK_COMMENT`]. A successful reply is returned untouched: checking
//! it against the rules engine is the caller's job (see [`super::policy`]).

use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::AppConfig;
use crate::engine::Difficulty;
use crate::llm::{LlmError, LlmProvider, LlmRequest, provider_from_config};

use super::persona::{FALLBACK_COMMENT, SYSTEM_INSTRUCTION, difficulty_hint, response_schema};

/// At most this many trailing history moves go into the prompt.
pub const RECENT_HISTORY_LEN: usize = 5;

/// The service's two-field answer. Untrusted until the rules engine accepts
/// the move.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AiMoveResponse {
    #[serde(rename = "move")]
    pub chosen_move: String,
    pub comment: String,
}

/// Where a response came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SuggestionSource {
    Service,
    Fallback,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Suggestion {
    pub response: AiMoveResponse,
    pub source: SuggestionSource,
}

/// Everything the selector needs about the position. Built under the session
/// lock, then moved into the AI task.
#[derive(Debug, Clone)]
pub struct SelectionRequest {
    pub fen: String,
    /// Non-empty: an empty set means the game is over and nobody should ask.
    pub legal_moves: Vec<String>,
    pub difficulty: Difficulty,
    pub history: Vec<String>,
}

impl SelectionRequest {
    /// Trailing slice of the history that goes into the prompt.
    pub fn recent_history(&self) -> &[String] {
        let start = self.history.len().saturating_sub(RECENT_HISTORY_LEN);
        &self.history[start..]
    }
}

pub struct MoveSelector {
    provider: Option<Arc<dyn LlmProvider>>,
    timeout: Duration,
}

impl MoveSelector {
    pub fn new(provider: Option<Arc<dyn LlmProvider>>, timeout: Duration) -> Self {
        Self { provider, timeout }
    }

    /// Build from configuration. Without a usable provider every turn takes
    /// the random fallback.
    pub fn from_config(config: &AppConfig) -> Self {
        let provider = match provider_from_config(&config.llm) {
            Ok(p) => {
                tracing::info!(provider = p.name(), "move suggestions via LLM");
                Some(p)
            }
            Err(e) => {
                warn!(error = %e, "no LLM provider; the Egyptian will play random moves");
                None
            }
        };
        Self::new(provider, config.ai_timeout())
    }

    pub fn provider_name(&self) -> Option<&str> {
        self.provider.as_deref().map(|p| p.name())
    }

    /// Obtain one suggestion. Never errors.
    pub async fn select(&self, request: &SelectionRequest) -> Suggestion {
        match self.ask(request).await {
            Ok(response) => {
                debug!(suggested = %response.chosen_move, "move suggestion received");
                Suggestion {
                    response,
                    source: SuggestionSource::Service,
                }
            }
            Err(e) => {
                warn!(error = %e, "move suggestion unavailable, choosing at random");
                Suggestion {
                    response: random_fallback(&request.legal_moves),
                    source: SuggestionSource::Fallback,
                }
            }
        }
    }

    async fn ask(&self, request: &SelectionRequest) -> Result<AiMoveResponse, LlmError> {
        let provider = self.provider.as_ref().ok_or(LlmError::Disabled)?;
        let llm_request = build_request(request);

        let raw = tokio::time::timeout(self.timeout, provider.generate(&llm_request))
            .await
            .map_err(|_| LlmError::Timeout(self.timeout.as_millis() as u64))??;

        parse_response(&raw)
    }
}

/// The prompt: position, difficulty, recent history, and the full legal list.
pub fn build_request(request: &SelectionRequest) -> LlmRequest {
    let legal = serde_json::to_string(&request.legal_moves).unwrap_or_else(|_| "[]".to_string());
    let user_message = format!(
        "Current Game State (FEN): {fen}\n\
         Difficulty Level: {label} ({hint})\n\
         Recent Move History: {history}\n\
         \n\
         List of Legal Moves for Black:\n\
         {legal}\n\
         \n\
         Please select exactly one move from the \"Legal Moves\" list.\n\
         Return JSON only, in the form {{\"move\": \"...\", \"comment\": \"...\"}}.",
        fen = request.fen,
        label = request.difficulty.label(),
        hint = difficulty_hint(request.difficulty),
        history = request.recent_history().join(", "),
    );
    LlmRequest::new(SYSTEM_INSTRUCTION, user_message).with_schema(response_schema())
}

/// Parse the service reply. Tolerates code fences and prose around the JSON
/// object; both fields must be present and the move non-empty.
pub fn parse_response(raw: &str) -> Result<AiMoveResponse, LlmError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(LlmError::EmptyResponse);
    }
    let body = match (trimmed.find('{'), trimmed.rfind('}')) {
        (Some(start), Some(end)) if start < end => &trimmed[start..=end],
        _ => return Err(LlmError::ParseError(format!("no JSON object in: {trimmed}"))),
    };

    let parsed: AiMoveResponse =
        serde_json::from_str(body).map_err(|e| LlmError::ParseError(e.to_string()))?;

    let chosen_move = parsed.chosen_move.trim().to_string();
    if chosen_move.is_empty() {
        return Err(LlmError::ParseError("empty move field".to_string()));
    }
    Ok(AiMoveResponse {
        chosen_move,
        comment: parsed.comment.trim().to_string(),
    })
}

/// Random legal move with the apologetic comment.
pub fn fallback_response<R: Rng + ?Sized>(legal_moves: &[String], rng: &mut R) -> AiMoveResponse {
    AiMoveResponse {
        chosen_move: legal_moves.choose(rng).cloned().unwrap_or_default(),
        comment: FALLBACK_COMMENT.to_string(),
    }
}

fn random_fallback(legal_moves: &[String]) -> AiMoveResponse {
    let mut rng = rand::thread_rng();
    fallback_response(legal_moves, &mut rng)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
