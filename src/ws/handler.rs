//! WebSocket upgrade handler: streams a session's events to the client.

use axum::extract::ws::{Message, WebSocket};
use axum::extract::{Path, State, WebSocketUpgrade};
use axum::response::IntoResponse;
use futures::{SinkExt, StreamExt};
use tracing::debug;

use crate::api::state::SharedState;

use super::manager::ClientId;
use super::messages::{WsCommand, WsEvent};

/// GET /ws/sessions/{id}
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    Path(id): Path<String>,
    State(state): State<SharedState>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, id, state))
}

async fn handle_socket(socket: WebSocket, session_id: String, state: SharedState) {
    let initial_event = {
        let sessions = state.sessions.read().await;
        sessions.get(&session_id).map(WsEvent::subscribed)
    };
    let (mut sink, mut stream) = socket.split();

    let Some(initial_event) = initial_event else {
        let err = WsEvent::error(&format!("session not found: {session_id}"));
        let _ = sink.send(Message::Text(err.to_json().into())).await;
        let _ = sink.close().await;
        return;
    };

    let (client_id, mut rx) = state.ws.subscribe(&session_id).await;

    if sink
        .send(Message::Text(initial_event.to_json().into()))
        .await
        .is_err()
    {
        cleanup(&state, &session_id, client_id).await;
        return;
    }

    // Manager → socket.
    let mut writer = tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            if sink
                .send(Message::Text(event.to_json().into()))
                .await
                .is_err()
            {
                break;
            }
        }
        let _ = sink.close().await;
    });

    // Socket → server.
    let reader_state = state.clone();
    let reader_sid = session_id.clone();
    let mut reader = tokio::spawn(async move {
        while let Some(Ok(msg)) = stream.next().await {
            match msg {
                Message::Text(text) => {
                    handle_client_message(&reader_state, &reader_sid, client_id, &text).await;
                }
                Message::Close(_) => break,
                _ => {}
            }
        }
    });

    tokio::select! {
        _ = &mut writer => { reader.abort(); }
        _ = &mut reader => { writer.abort(); }
    }

    cleanup(&state, &session_id, client_id).await;
}

async fn handle_client_message(
    state: &SharedState,
    session_id: &str,
    client_id: ClientId,
    text: &str,
) {
    let reply = match serde_json::from_str::<WsCommand>(text) {
        Ok(WsCommand::Ping) => WsEvent::pong(),
        Err(e) => {
            debug!(session_id, "invalid WS command: {e}");
            WsEvent::error(&format!("invalid command: {e}"))
        }
    };
    state.ws.send_to(session_id, client_id, reply).await;
}

async fn cleanup(state: &SharedState, session_id: &str, client_id: ClientId) {
    state.ws.unsubscribe(session_id, client_id).await;
    debug!(session_id, client_id, "WS session cleaned up");
}
