//! HTTP API for Deskmate
//!
//! Each request is one interaction event against one session.

mod handlers;
mod types;

pub use handlers::create_router;
#[allow(unused_imports)] // Public API re-exports
pub use types::*;

use crate::flow::ChatFlow;
use crate::llm::ModelRegistry;
use crate::session::SessionStore;
use std::sync::Arc;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub sessions: Arc<SessionStore>,
    pub flow: Arc<ChatFlow>,
    pub llm_registry: Arc<ModelRegistry>,
}

impl AppState {
    pub fn new(flow: ChatFlow, llm_registry: Arc<ModelRegistry>) -> Self {
        Self {
            sessions: Arc::new(SessionStore::new()),
            flow: Arc::new(flow),
            llm_registry,
        }
    }
}
