//! Tracks the WebSocket clients watching each session and fans events out
//! to them.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::{RwLock, mpsc};
use tracing::{debug, warn};

use super::messages::WsEvent;

/// Sending half of a client's queue; the socket task owns the receiver.
pub type ClientSender = mpsc::UnboundedSender<WsEvent>;

pub type ClientId = u64;

#[derive(Debug)]
pub struct WsManager {
    /// session_id → { client_id → sender }
    subs: RwLock<HashMap<String, HashMap<ClientId, ClientSender>>>,
    next_id: AtomicU64,
}

impl WsManager {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Register a client for a session.
    pub async fn subscribe(
        &self,
        session_id: &str,
    ) -> (ClientId, mpsc::UnboundedReceiver<WsEvent>) {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = mpsc::unbounded_channel();

        self.subs
            .write()
            .await
            .entry(session_id.to_string())
            .or_default()
            .insert(id, tx);

        debug!(session_id, client_id = id, "WS client subscribed");
        (id, rx)
    }

    pub async fn unsubscribe(&self, session_id: &str, client_id: ClientId) {
        let mut subs = self.subs.write().await;
        if let Some(clients) = subs.get_mut(session_id) {
            clients.remove(&client_id);
            if clients.is_empty() {
                subs.remove(session_id);
            }
        }
        debug!(session_id, client_id, "WS client unsubscribed");
    }

    /// Queue `event` for one client only.
    pub async fn send_to(&self, session_id: &str, client_id: ClientId, event: WsEvent) {
        let subs = self.subs.read().await;
        if let Some(tx) = subs.get(session_id).and_then(|c| c.get(&client_id)) {
            let _ = tx.send(event);
        }
    }

    /// Queue `event` for every client of a session, dropping dead ones.
    pub async fn broadcast(&self, session_id: &str, event: WsEvent) {
        let stale: Vec<ClientId> = {
            let subs = self.subs.read().await;
            let Some(clients) = subs.get(session_id) else {
                return;
            };
            clients
                .iter()
                .filter(|(_, tx)| tx.send(event.clone()).is_err())
                .map(|(&cid, _)| cid)
                .collect()
        };

        if stale.is_empty() {
            return;
        }
        let mut subs = self.subs.write().await;
        if let Some(clients) = subs.get_mut(session_id) {
            for cid in &stale {
                clients.remove(cid);
                warn!(session_id, client_id = cid, "removed stale WS client");
            }
            if clients.is_empty() {
                subs.remove(session_id);
            }
        }
    }

    /// Close every client of a deleted session.
    pub async fn drop_session(&self, session_id: &str) {
        if let Some(clients) = self.subs.write().await.remove(session_id) {
            debug!(session_id, clients = clients.len(), "WS clients released");
        }
    }

    pub async fn subscriber_count(&self, session_id: &str) -> usize {
        self.subs.read().await.get(session_id).map_or(0, |c| c.len())
    }

    pub async fn total_connections(&self) -> usize {
        self.subs.read().await.values().map(|c| c.len()).sum()
    }
}

impl Default for WsManager {
    fn default() -> Self {
        Self {
            subs: RwLock::new(HashMap::new()),
            next_id: AtomicU64::new(1),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn subscribe_returns_unique_ids() {
        let mgr = WsManager::new();
        let (id1, _rx1) = mgr.subscribe("s1").await;
        let (id2, _rx2) = mgr.subscribe("s1").await;
        assert_ne!(id1, id2);
        assert_eq!(mgr.subscriber_count("s1").await, 2);
    }

    #[tokio::test]
    async fn unsubscribe_forgets_empty_session() {
        let mgr = WsManager::new();
        let (id1, _rx1) = mgr.subscribe("s1").await;
        mgr.unsubscribe("s1", id1).await;
        assert_eq!(mgr.subscriber_count("s1").await, 0);
        assert_eq!(mgr.total_connections().await, 0);
    }

    #[tokio::test]
    async fn broadcast_stays_within_session() {
        let mgr = WsManager::new();
        let (_a, mut rx1) = mgr.subscribe("s1").await;
        let (_b, mut rx2) = mgr.subscribe("s1").await;
        let (_c, mut rx3) = mgr.subscribe("s2").await;

        mgr.broadcast("s1", WsEvent::ai_thinking("s1", "scholar")).await;

        assert_eq!(rx1.recv().await.unwrap().to_json(), rx2.recv().await.unwrap().to_json());
        assert!(rx3.try_recv().is_err());
    }

    #[tokio::test]
    async fn send_to_targets_one_client() {
        let mgr = WsManager::new();
        let (a, mut rx1) = mgr.subscribe("s1").await;
        let (_b, mut rx2) = mgr.subscribe("s1").await;

        mgr.send_to("s1", a, WsEvent::pong()).await;

        assert!(rx1.recv().await.is_some());
        assert!(rx2.try_recv().is_err());
    }

    #[tokio::test]
    async fn broadcast_removes_stale_clients() {
        let mgr = WsManager::new();
        let (_a, rx1) = mgr.subscribe("s1").await;
        let (_b, _rx2) = mgr.subscribe("s1").await;
        drop(rx1);

        mgr.broadcast("s1", WsEvent::pong()).await;
        assert_eq!(mgr.subscriber_count("s1").await, 1);
    }

    #[tokio::test]
    async fn drop_session_closes_receivers() {
        let mgr = WsManager::new();
        let (_a, mut rx) = mgr.subscribe("s1").await;
        mgr.drop_session("s1").await;
        assert!(rx.recv().await.is_none());
        assert_eq!(mgr.total_connections().await, 0);
    }

    #[tokio::test]
    async fn broadcast_to_unknown_session_is_noop() {
        let mgr = WsManager::new();
        mgr.broadcast("nope", WsEvent::pong()).await;
        mgr.unsubscribe("nope", 999).await;
    }
}
