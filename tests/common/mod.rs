//! Shared helpers: a scripted LLM provider and a real server on a free port.

#![allow(dead_code)]

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use tokio::net::TcpListener;

use egyptian_chess::ai::MoveSelector;
use egyptian_chess::api::router::create_router;
use egyptian_chess::api::state::AppState;
use egyptian_chess::config::AppConfig;
use egyptian_chess::llm::{LlmError, LlmProvider, LlmRequest};

/// Answers every request the same way and counts the calls.
pub struct ScriptedProvider {
    reply: Result<String, String>,
    delay: Duration,
    calls: Arc<AtomicUsize>,
}

impl ScriptedProvider {
    pub fn replying(text: &str) -> Self {
        Self {
            reply: Ok(text.to_string()),
            delay: Duration::ZERO,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn failing() -> Self {
        Self {
            reply: Err("connection reset by peer".to_string()),
            delay: Duration::ZERO,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn calls(&self) -> Arc<AtomicUsize> {
        self.calls.clone()
    }
}

impl LlmProvider for ScriptedProvider {
    fn generate<'a>(
        &'a self,
        _request: &'a LlmRequest,
    ) -> Pin<Box<dyn Future<Output = Result<String, LlmError>> + Send + 'a>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Box::pin(async move {
            tokio::time::sleep(self.delay).await;
            self.reply.clone().map_err(LlmError::RequestFailed)
        })
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

pub struct TestServer {
    pub base: String,
    pub calls: Arc<AtomicUsize>,
    pub client: reqwest::Client,
}

impl TestServer {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub async fn post(&self, path: &str, body: serde_json::Value) -> (u16, serde_json::Value) {
        let resp = self
            .client
            .post(format!("{}{path}", self.base))
            .json(&body)
            .send()
            .await
            .unwrap();
        let status = resp.status().as_u16();
        (status, resp.json().await.unwrap())
    }

    pub async fn get(&self, path: &str) -> serde_json::Value {
        self.client
            .get(format!("{}{path}", self.base))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap()
    }

    pub async fn create_session(&self, body: serde_json::Value) -> String {
        let (status, json) = self.post("/api/sessions", body).await;
        assert_eq!(status, 201, "{json}");
        json["id"].as_str().unwrap().to_string()
    }

    /// Poll until the Egyptian has answered and it is White's turn again.
    pub async fn wait_for_white(&self, id: &str) -> serde_json::Value {
        for _ in 0..100 {
            let json = self.get(&format!("/api/sessions/{id}")).await;
            if json["aiThinking"] == false && json["currentPlayer"] == "white" {
                return json;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        panic!("AI never finished its turn");
    }
}

/// Start a server whose AI is driven by `provider`, with no pacing delay.
pub async fn start_server(provider: ScriptedProvider) -> TestServer {
    start_server_with_delay(provider, 0).await
}

/// Start a server that waits `delay_ms` before each AI request.
pub async fn start_server_with_delay(provider: ScriptedProvider, delay_ms: u64) -> TestServer {
    let config = AppConfig {
        ai_move_delay_ms: delay_ms,
        ai_timeout_ms: 2_000,
        ..AppConfig::default()
    };
    let calls = provider.calls();
    let selector = MoveSelector::new(Some(Arc::new(provider)), config.ai_timeout());
    let app = create_router(AppState::with_selector(config, selector));

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    TestServer {
        base: format!("http://127.0.0.1:{}", addr.port()),
        calls,
        client: reqwest::Client::new(),
    }
}
