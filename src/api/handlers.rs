use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;

use crate::engine::{Difficulty, MoveRecord};
use crate::session::{AiTurnTicket, ClickOutcome, GameSession, spawn_ai_turn};
use crate::ws::WsEvent;

use super::errors::ApiError;
use super::models::*;
use super::state::SharedState;

// =========================================================================
// Health
// =========================================================================

/// GET /health
pub async fn health(State(state): State<SharedState>) -> Json<HealthResponse> {
    let sessions = state.sessions.read().await.len();
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime: state.start_time.elapsed().as_secs(),
        sessions,
    })
}

// =========================================================================
// Sessions
// =========================================================================

/// POST /api/sessions
pub async fn create_session(
    State(state): State<SharedState>,
    input: Option<Json<CreateSessionRequest>>,
) -> Result<(StatusCode, Json<SessionResponse>), ApiError> {
    let input = input.map(|Json(i)| i).unwrap_or_default();

    let difficulty = match input.difficulty.as_deref() {
        Some(d) => parse_difficulty(d)?,
        None => state.config.default_difficulty,
    };
    let mut session = match input.fen.as_deref() {
        Some(fen) => GameSession::from_fen(fen, difficulty)?,
        None => GameSession::new(difficulty),
    };

    // A position with Black to move starts with the Egyptian's turn.
    let ticket = session.begin_ai_turn();
    let id = session.id.clone();
    let response = SessionResponse::from(&session);
    state.sessions.write().await.insert(id.clone(), session);

    tracing::info!(session_id = %id, %difficulty, "session created");
    if let Some(ticket) = ticket {
        spawn_ai_turn(&state, &id, ticket);
    }

    Ok((StatusCode::CREATED, Json(response)))
}

/// GET /api/sessions
pub async fn list_sessions(State(state): State<SharedState>) -> Json<ListSessionsResponse> {
    let sessions = state.sessions.read().await;
    let mut list: Vec<SessionSummary> = sessions
        .values()
        .map(|s| SessionSummary {
            id: s.id.clone(),
            status: s.game.status().as_str().to_string(),
            difficulty: s.difficulty,
            move_count: s.game.move_history().len(),
            created_at: s.created_at,
        })
        .collect();
    list.sort_by(|a, b| b.created_at.cmp(&a.created_at));

    let total = list.len();
    Json(ListSessionsResponse {
        sessions: list,
        total,
    })
}

/// GET /api/sessions/{id}
pub async fn get_session(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<Json<SessionResponse>, ApiError> {
    let sessions = state.sessions.read().await;
    let session = sessions
        .get(&id)
        .ok_or_else(|| ApiError::SessionNotFound(id.clone()))?;
    Ok(Json(SessionResponse::from(session)))
}

/// DELETE /api/sessions/{id}
pub async fn delete_session(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<Json<DeleteResponse>, ApiError> {
    state
        .sessions
        .write()
        .await
        .remove(&id)
        .ok_or_else(|| ApiError::SessionNotFound(id.clone()))?;
    state.ws.drop_session(&id).await;

    tracing::info!(session_id = %id, "session deleted");
    Ok(Json(DeleteResponse {
        success: true,
        message: "Session deleted".to_string(),
    }))
}

// =========================================================================
// Human moves
// =========================================================================

/// POST /api/sessions/{id}/click
pub async fn click(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    Json(input): Json<ClickRequest>,
) -> Result<Json<ClickResponse>, ApiError> {
    let (outcome, response, followup) = {
        let mut sessions = state.sessions.write().await;
        let session = sessions
            .get_mut(&id)
            .ok_or_else(|| ApiError::SessionNotFound(id.clone()))?;

        let outcome = session.click(&input.square);
        let followup = match &outcome {
            ClickOutcome::Moved { record } => Some(after_human_move(session, record)),
            _ => None,
        };
        (outcome, SessionResponse::from(&*session), followup)
    };

    if let Some(followup) = followup {
        followup.dispatch(&state, &id).await;
    }
    Ok(Json(ClickResponse {
        outcome,
        session: response,
    }))
}

/// POST /api/sessions/{id}/moves
pub async fn make_move(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    Json(input): Json<MoveRequest>,
) -> Result<Json<MoveResponse>, ApiError> {
    let promotion = parse_promotion(input.promotion.as_deref())?;

    let (played, response, followup) = {
        let mut sessions = state.sessions.write().await;
        let session = sessions
            .get_mut(&id)
            .ok_or_else(|| ApiError::SessionNotFound(id.clone()))?;

        let record = session.human_move(&input.from, &input.to, promotion)?;
        let followup = after_human_move(session, &record);
        (record, SessionResponse::from(&*session), followup)
    };

    followup.dispatch(&state, &id).await;
    Ok(Json(MoveResponse {
        played,
        session: response,
    }))
}

/// Events to publish and the AI turn to start once the lock is released.
struct Followup {
    events: Vec<WsEvent>,
    ticket: Option<AiTurnTicket>,
}

impl Followup {
    async fn dispatch(self, state: &SharedState, session_id: &str) {
        for event in self.events {
            state.ws.broadcast(session_id, event).await;
        }
        if let Some(ticket) = self.ticket {
            spawn_ai_turn(state, session_id, ticket);
        }
    }
}

fn after_human_move(session: &mut GameSession, record: &MoveRecord) -> Followup {
    tracing::debug!(session_id = %session.id, san = %record.san, "human move played");
    let mut events = vec![WsEvent::move_made(session, record)];
    if let Some(result) = session.result() {
        events.push(WsEvent::game_over(session, result));
    }
    Followup {
        events,
        ticket: session.begin_ai_turn(),
    }
}

// =========================================================================
// Session controls
// =========================================================================

/// PUT /api/sessions/{id}/difficulty
pub async fn set_difficulty(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    Json(input): Json<DifficultyRequest>,
) -> Result<Json<SessionResponse>, ApiError> {
    let difficulty = parse_difficulty(&input.difficulty)?;
    let mut sessions = state.sessions.write().await;
    let session = sessions
        .get_mut(&id)
        .ok_or_else(|| ApiError::SessionNotFound(id.clone()))?;
    session.set_difficulty(difficulty);
    Ok(Json(SessionResponse::from(&*session)))
}

/// POST /api/sessions/{id}/new-game
pub async fn new_game(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<Json<SessionResponse>, ApiError> {
    let (response, event) = {
        let mut sessions = state.sessions.write().await;
        let session = sessions
            .get_mut(&id)
            .ok_or_else(|| ApiError::SessionNotFound(id.clone()))?;
        session.new_game();
        (SessionResponse::from(&*session), WsEvent::new_game(session))
    };

    tracing::info!(session_id = %id, "new game");
    state.ws.broadcast(&id, event).await;
    Ok(Json(response))
}

// =========================================================================
// Queries
// =========================================================================

/// GET /api/sessions/{id}/legal-moves?from=e2
pub async fn legal_moves(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    Query(query): Query<LegalMovesQuery>,
) -> Result<Json<LegalMovesResponse>, ApiError> {
    let sessions = state.sessions.read().await;
    let session = sessions
        .get(&id)
        .ok_or_else(|| ApiError::SessionNotFound(id.clone()))?;

    let moves = match query.from.as_deref() {
        Some(from) => session.game.legal_destinations(&from.to_ascii_lowercase()),
        None => session.game.legal_moves(),
    };
    Ok(Json(LegalMovesResponse {
        from: query.from,
        count: moves.len(),
        moves,
    }))
}

/// GET /api/sessions/{id}/chat
pub async fn chat_log(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<Json<ChatResponse>, ApiError> {
    let sessions = state.sessions.read().await;
    let session = sessions
        .get(&id)
        .ok_or_else(|| ApiError::SessionNotFound(id.clone()))?;
    let messages = session.chat.messages().to_vec();
    Ok(Json(ChatResponse {
        count: messages.len(),
        messages,
    }))
}

/// GET /api/llm/status
pub async fn llm_status(State(state): State<SharedState>) -> Json<LlmStatusResponse> {
    let provider = state.selector.provider_name().map(str::to_string);
    Json(LlmStatusResponse {
        enabled: state.config.llm.enabled,
        available: provider.is_some(),
        provider,
        timeout_ms: state.config.ai_timeout_ms,
        move_delay_ms: state.config.ai_move_delay_ms,
        difficulties: Difficulty::ALL.into_iter().map(DifficultyInfo::from).collect(),
    })
}

// =========================================================================
// Helpers
// =========================================================================

fn parse_difficulty(s: &str) -> Result<Difficulty, ApiError> {
    Difficulty::from_str_loose(s).ok_or_else(|| {
        ApiError::InvalidRequest(format!(
            "unknown difficulty '{s}', expected novice, scholar or egyptian"
        ))
    })
}

fn parse_promotion(p: Option<&str>) -> Result<Option<char>, ApiError> {
    let Some(p) = p.map(str::trim).filter(|p| !p.is_empty()) else {
        return Ok(None);
    };
    let mut chars = p.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) if "qrbnQRBN".contains(c) => Ok(Some(c.to_ascii_lowercase())),
        _ => Err(ApiError::InvalidRequest(format!(
            "invalid promotion piece '{p}', expected q, r, b or n"
        ))),
    }
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use axum::body::Body;
    use axum::http::{Method, Request};
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    use super::*;
    use crate::ai::MoveSelector;
    use crate::api::router::create_router;
    use crate::api::state::AppState;
    use crate::config::AppConfig;

    /// Provider-less selector and a long pacing delay, so the AI never
    /// answers while a test is looking.
    fn test_state() -> SharedState {
        let config = AppConfig {
            ai_move_delay_ms: 60_000,
            ..AppConfig::default()
        };
        AppState::with_selector(config, MoveSelector::new(None, Duration::from_millis(10)))
    }

    async fn send(
        state: &SharedState,
        method: Method,
        uri: &str,
        body: Option<serde_json::Value>,
    ) -> (StatusCode, serde_json::Value) {
        let app = create_router(state.clone());
        let mut req = Request::builder().method(method).uri(uri);
        let body = match body {
            Some(json) => {
                req = req.header("content-type", "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };
        let resp = app.oneshot(req.body(body).unwrap()).await.unwrap();
        let status = resp.status();
        let bytes = resp.into_body().collect().await.unwrap().to_bytes();
        let json = if bytes.is_empty() {
            serde_json::Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, json)
    }

    async fn create(state: &SharedState, body: serde_json::Value) -> String {
        let (status, json) = send(state, Method::POST, "/api/sessions", Some(body)).await;
        assert_eq!(status, StatusCode::CREATED, "{json}");
        json["id"].as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn health_reports_ok() {
        let state = test_state();
        let (status, json) = send(&state, Method::GET, "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["status"], "ok");
        assert_eq!(json["sessions"], 0);
    }

    #[tokio::test]
    async fn create_session_returns_initial_board() {
        let state = test_state();
        let (status, json) = send(
            &state,
            Method::POST,
            "/api/sessions",
            Some(serde_json::json!({"difficulty": "novice"})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(json["currentPlayer"], "white");
        assert_eq!(json["difficulty"]["id"], "novice");
        assert_eq!(json["difficulty"]["label"], "مبتدئ");
        assert_eq!(json["board"][0][4], "k");
        assert_eq!(json["board"][7][4], "K");
        assert_eq!(json["chat"].as_array().unwrap().len(), 1);
        assert_eq!(json["selection"]["state"], "idle");
        assert_eq!(json["inputEnabled"], true);
        assert!(json.get("lastMove").is_none());
    }

    #[tokio::test]
    async fn create_without_body_uses_default_difficulty() {
        let state = test_state();
        let (status, json) = send(&state, Method::POST, "/api/sessions", None).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(json["difficulty"]["id"], "scholar");
    }

    #[tokio::test]
    async fn create_rejects_bad_input() {
        let state = test_state();
        let (status, json) = send(
            &state,
            Method::POST,
            "/api/sessions",
            Some(serde_json::json!({"difficulty": "grandmaster"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"]["code"], "INVALID_REQUEST");

        let (status, json) = send(
            &state,
            Method::POST,
            "/api/sessions",
            Some(serde_json::json!({"fen": "not a fen"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"]["code"], "INVALID_FEN");
    }

    #[tokio::test]
    async fn unknown_session_is_404() {
        let state = test_state();
        let (status, json) = send(&state, Method::GET, "/api/sessions/nope", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(json["error"]["code"], "SESSION_NOT_FOUND");
    }

    #[tokio::test]
    async fn human_move_starts_ai_turn() {
        let state = test_state();
        let id = create(&state, serde_json::json!({})).await;

        let (status, json) = send(
            &state,
            Method::POST,
            &format!("/api/sessions/{id}/moves"),
            Some(serde_json::json!({"from": "e2", "to": "e4"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK, "{json}");
        assert_eq!(json["move"]["san"], "e4");
        assert_eq!(json["session"]["currentPlayer"], "black");
        assert_eq!(json["session"]["moveHistory"], serde_json::json!(["e4"]));
        assert_eq!(json["session"]["aiThinking"], true);
        assert_eq!(json["session"]["inputEnabled"], false);
        assert_eq!(json["session"]["lastMove"]["from"], "e2");
        assert_eq!(
            json["session"]["statusMessage"],
            "المصري يفكر... (The Egyptian is thinking)"
        );

        // Out of turn while the AI is thinking.
        let (status, json) = send(
            &state,
            Method::POST,
            &format!("/api/sessions/{id}/moves"),
            Some(serde_json::json!({"from": "d2", "to": "d4"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"]["code"], "ILLEGAL_MOVE");
    }

    #[tokio::test]
    async fn illegal_move_is_rejected_without_change() {
        let state = test_state();
        let id = create(&state, serde_json::json!({})).await;
        let (status, json) = send(
            &state,
            Method::POST,
            &format!("/api/sessions/{id}/moves"),
            Some(serde_json::json!({"from": "e2", "to": "e5"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"]["code"], "ILLEGAL_MOVE");

        let (_, json) = send(&state, Method::GET, &format!("/api/sessions/{id}"), None).await;
        assert_eq!(json["moveHistory"], serde_json::json!([]));
        assert_eq!(json["chat"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn bad_promotion_piece_is_400() {
        let state = test_state();
        let id = create(&state, serde_json::json!({})).await;
        let (status, json) = send(
            &state,
            Method::POST,
            &format!("/api/sessions/{id}/moves"),
            Some(serde_json::json!({"from": "e2", "to": "e4", "promotion": "king"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"]["code"], "INVALID_REQUEST");
    }

    #[tokio::test]
    async fn click_select_then_deselect() {
        let state = test_state();
        let id = create(&state, serde_json::json!({})).await;
        let uri = format!("/api/sessions/{id}/click");

        let (status, json) =
            send(&state, Method::POST, &uri, Some(serde_json::json!({"square": "g1"}))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["outcome"]["kind"], "selected");
        assert_eq!(json["session"]["selection"]["square"], "g1");
        let fen = json["session"]["fen"].clone();

        let (_, json) =
            send(&state, Method::POST, &uri, Some(serde_json::json!({"square": "g1"}))).await;
        assert_eq!(json["outcome"]["kind"], "deselected");
        assert_eq!(json["session"]["selection"]["state"], "idle");
        assert_eq!(json["session"]["fen"], fen);
    }

    #[tokio::test]
    async fn click_pair_plays_move() {
        let state = test_state();
        let id = create(&state, serde_json::json!({})).await;
        let uri = format!("/api/sessions/{id}/click");

        send(&state, Method::POST, &uri, Some(serde_json::json!({"square": "e2"}))).await;
        let (_, json) =
            send(&state, Method::POST, &uri, Some(serde_json::json!({"square": "e4"}))).await;
        assert_eq!(json["outcome"]["kind"], "moved");
        assert_eq!(json["outcome"]["record"]["san"], "e4");
        assert_eq!(json["session"]["currentPlayer"], "black");

        let (_, json) =
            send(&state, Method::POST, &uri, Some(serde_json::json!({"square": "e7"}))).await;
        assert_eq!(json["outcome"]["kind"], "ignored");
    }

    #[tokio::test]
    async fn new_game_resets_board_and_chat() {
        let state = test_state();
        let id = create(&state, serde_json::json!({"difficulty": "egyptian"})).await;
        send(
            &state,
            Method::POST,
            &format!("/api/sessions/{id}/moves"),
            Some(serde_json::json!({"from": "e2", "to": "e4"})),
        )
        .await;

        let (status, json) = send(
            &state,
            Method::POST,
            &format!("/api/sessions/{id}/new-game"),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            json["fen"],
            "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1"
        );
        assert_eq!(json["moveHistory"], serde_json::json!([]));
        assert_eq!(json["chat"].as_array().unwrap().len(), 1);
        assert_eq!(
            json["chat"][0]["text"],
            "لنبدأ من جديد. النيل يجدد نفسه، وكذلك نحن."
        );
        assert_eq!(json["aiThinking"], false);
        assert_eq!(json["difficulty"]["id"], "egyptian");
    }

    #[tokio::test]
    async fn difficulty_can_be_changed() {
        let state = test_state();
        let id = create(&state, serde_json::json!({})).await;
        let (status, json) = send(
            &state,
            Method::PUT,
            &format!("/api/sessions/{id}/difficulty"),
            Some(serde_json::json!({"difficulty": "مصري"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["difficulty"]["id"], "egyptian");
    }

    #[tokio::test]
    async fn legal_moves_all_and_from_square() {
        let state = test_state();
        let id = create(&state, serde_json::json!({})).await;

        let (_, json) = send(
            &state,
            Method::GET,
            &format!("/api/sessions/{id}/legal-moves"),
            None,
        )
        .await;
        assert_eq!(json["count"], 20);

        let (_, json) = send(
            &state,
            Method::GET,
            &format!("/api/sessions/{id}/legal-moves?from=b1"),
            None,
        )
        .await;
        assert_eq!(json["from"], "b1");
        assert_eq!(json["count"], 2);
    }

    #[tokio::test]
    async fn list_and_delete_sessions() {
        let state = test_state();
        let id = create(&state, serde_json::json!({})).await;
        create(&state, serde_json::json!({})).await;

        let (_, json) = send(&state, Method::GET, "/api/sessions", None).await;
        assert_eq!(json["total"], 2);

        let (status, json) =
            send(&state, Method::DELETE, &format!("/api/sessions/{id}"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["success"], true);

        let (status, _) =
            send(&state, Method::DELETE, &format!("/api/sessions/{id}"), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn chat_endpoint_lists_messages() {
        let state = test_state();
        let id = create(&state, serde_json::json!({})).await;
        let (_, json) =
            send(&state, Method::GET, &format!("/api/sessions/{id}/chat"), None).await;
        assert_eq!(json["count"], 1);
        assert_eq!(json["messages"][0]["sender"], "ai");
    }

    #[tokio::test]
    async fn llm_status_without_provider() {
        let state = test_state();
        let (_, json) = send(&state, Method::GET, "/api/llm/status", None).await;
        assert_eq!(json["available"], false);
        assert!(json.get("provider").is_none());
        assert_eq!(json["difficulties"].as_array().unwrap().len(), 3);
    }

    #[test]
    fn promotion_parsing() {
        assert_eq!(parse_promotion(None).unwrap(), None);
        assert_eq!(parse_promotion(Some("")).unwrap(), None);
        assert_eq!(parse_promotion(Some("N")).unwrap(), Some('n'));
        assert!(parse_promotion(Some("k")).is_err());
        assert!(parse_promotion(Some("qq")).is_err());
    }
}
