//! Session setup run at the top of every interaction cycle

use crate::config::AppConfig;
use crate::error::InitializationError;
use crate::llm::{LlmConfig, ModelRegistry};
use crate::session::{Mode, Session, SessionHandle, SessionStore};
use crate::telemetry;
use std::path::PathBuf;
use std::sync::Arc;

pub const APP_BOOT_MESSAGE: &str = "Application booted";

/// Prepares configuration, logging and session defaults
pub struct Initializer {
    registry: Arc<ModelRegistry>,
    log_dir: Option<PathBuf>,
    default_mode: Mode,
}

impl Initializer {
    pub fn new(config: &AppConfig, registry: Arc<ModelRegistry>) -> Self {
        Self {
            registry,
            log_dir: config.log_dir.clone(),
            default_mode: config.default_mode,
        }
    }

    /// Create a fresh session: new id, default mode, empty history
    pub async fn open_session(&self, store: &SessionStore) -> (String, SessionHandle) {
        store.create(self.default_mode).await
    }

    /// Run setup for `session`.
    ///
    /// Fails when no LLM backend is configured or the logger cannot be
    /// installed; in that case the session is left uninitialized. Boot
    /// completion is logged once per session.
    pub fn initialize(&self, session: &mut Session) -> Result<(), InitializationError> {
        if !self.registry.has_models() {
            return Err(InitializationError::MissingCredential {
                hint: LlmConfig::credential_hint(),
            });
        }

        telemetry::init(self.log_dir.as_deref())?;

        if !session.is_initialized() {
            session.mark_initialized();
            tracing::info!(
                session_id = %session.id(),
                mode = %session.mode(),
                created_at = %session.created_at(),
                model = %self.registry.default_model_id(),
                "{APP_BOOT_MESSAGE}"
            );
        }
        Ok(())
    }
}
