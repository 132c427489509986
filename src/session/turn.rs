//! Background task that plays Black's reply.
//!
//! The session lock is never held across the pacing delay or the LLM call.
//! The task captures the session epoch when the turn starts; if the session
//! is deleted or a new game begins meanwhile, the result is dropped. The
//! move's events go out while the write lock is still held, so they can never
//! trail a `new_game` event for the same session.

use std::time::Instant;

use tracing::{debug, info};

use crate::api::state::SharedState;
use crate::ws::WsEvent;

use super::game_session::{AiTurnOutcome, AiTurnTicket};

/// Run the turn described by `ticket` in the background. The ticket comes
/// from [`GameSession::begin_ai_turn`](crate::session::GameSession::begin_ai_turn), taken under the session lock.
pub fn spawn_ai_turn(state: &SharedState, session_id: &str, ticket: AiTurnTicket) {
    tokio::spawn(run_ai_turn(state.clone(), session_id.to_string(), ticket));
}

/// Drive one AI turn to completion.
pub async fn run_ai_turn(state: SharedState, session_id: String, ticket: AiTurnTicket) {
    state
        .ws
        .broadcast(
            &session_id,
            WsEvent::ai_thinking(&session_id, ticket.request.difficulty.as_str()),
        )
        .await;

    let delay = state.config.ai_move_delay();
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }

    if !is_current(&state, &session_id, ticket.epoch).await {
        debug!(session_id = %session_id, "session changed during AI delay, abandoning turn");
        return;
    }

    let started = Instant::now();
    let suggestion = state.selector.select(&ticket.request).await;
    let thinking_time_ms = started.elapsed().as_millis() as u64;

    let mut sessions = state.sessions.write().await;
    let Some(session) = sessions.get_mut(&session_id) else {
        debug!(session_id = %session_id, "session deleted during AI turn");
        return;
    };

    let outcome = session.finish_ai_turn(ticket.epoch, &suggestion, &mut rand::thread_rng());
    let applied = match outcome {
        AiTurnOutcome::Played(applied) => applied,
        AiTurnOutcome::Stale => return,
        AiTurnOutcome::Skipped => {
            debug!(session_id = %session_id, "game ended before AI result arrived");
            return;
        }
    };

    info!(
        session_id = %session_id,
        san = %applied.record.san,
        source = ?applied.source,
        thinking_time_ms,
        "AI move played"
    );

    let mut events = vec![WsEvent::ai_move_complete(
        session,
        &applied,
        thinking_time_ms,
    )];
    if let Some(msg) = applied.comment.as_ref().and(session.chat.last()) {
        events.push(WsEvent::chat_message(&session_id, msg));
    }
    if let Some(result) = session.result() {
        events.push(WsEvent::game_over(session, result));
    }

    for event in events {
        state.ws.broadcast(&session_id, event).await;
    }
    drop(sessions);
}

async fn is_current(state: &SharedState, session_id: &str, epoch: u64) -> bool {
    let sessions = state.sessions.read().await;
    sessions.get(session_id).is_some_and(|s| s.epoch == epoch)
}
