use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use tokio::sync::RwLock;

use crate::ai::MoveSelector;
use crate::config::AppConfig;
use crate::session::GameSession;
use crate::ws::WsManager;

/// Sessions stored by UUID.
pub type SessionStore = RwLock<HashMap<String, GameSession>>;

/// Shared application state passed to all handlers via Axum's State extractor.
pub struct AppState {
    pub sessions: SessionStore,
    pub config: AppConfig,
    pub start_time: Instant,
    pub selector: Arc<MoveSelector>,
    pub ws: Arc<WsManager>,
}

pub type SharedState = Arc<AppState>;

impl AppState {
    pub fn new(config: AppConfig) -> SharedState {
        let selector = MoveSelector::from_config(&config);
        Self::with_selector(config, selector)
    }

    /// Build with a ready-made selector, e.g. one backed by a scripted
    /// provider.
    pub fn with_selector(config: AppConfig, selector: MoveSelector) -> SharedState {
        Arc::new(AppState {
            sessions: RwLock::new(HashMap::new()),
            config,
            start_time: Instant::now(),
            selector: Arc::new(selector),
            ws: WsManager::new(),
        })
    }
}
