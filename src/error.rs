//! Error taxonomy for one interaction cycle
//!
//! Every error is terminal for the cycle that raised it: it is logged with its
//! category and full detail, the user sees only the generic message, and the
//! session history is left untouched.

use crate::llm::{LlmError, LlmErrorKind};
use crate::session::Mode;
use serde::Serialize;
use thiserror::Error;

/// Indicator rendered in front of user-facing error banners
pub const ERROR_ICON: &str = "\u{26a0}";

const ADMIN_CONTACT_SUFFIX: &str = "Please contact the administrator if the problem persists.";

/// Setup failed before anything could be rendered
#[derive(Debug, Error)]
pub enum InitializationError {
    #[error("no LLM backend configured; set {hint}")]
    MissingCredential { hint: String },
    #[error("failed to install logger: {0}")]
    Logger(String),
}

/// A stored message cannot be replayed
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("message {index} is malformed: {reason}")]
    Malformed { index: usize, reason: &'static str },
}

/// The LLM backend did not produce a reply
#[derive(Debug, Error)]
#[error("LLM request to {model} failed: {source}")]
pub struct LlmDispatchError {
    pub model: String,
    #[source]
    pub source: LlmError,
}

impl LlmDispatchError {
    pub fn kind(&self) -> LlmErrorKind {
        self.source.kind
    }
}

/// The reply does not have the shape the current mode expects
#[derive(Debug, Error)]
pub enum PresentationError {
    #[error("{mode} reply is not a JSON object: {source}")]
    NotJson {
        mode: Mode,
        #[source]
        source: serde_json::Error,
    },
    #[error("{mode} reply has an unexpected shape: {source}")]
    Shape {
        mode: Mode,
        #[source]
        source: serde_json::Error,
    },
    #[error("{mode} reply has an empty `{field}`")]
    EmptyField { mode: Mode, field: &'static str },
    #[error("reply was requested in {requested} mode but presented in {presented} mode")]
    ModeMismatch { requested: Mode, presented: Mode },
}

/// A mode value outside the two supported modes reached the cycle
#[derive(Debug, Error)]
#[error("unrecognized mode {value:?}")]
pub struct UnreachableModeError {
    pub value: String,
}

/// Any failure that ends an interaction cycle
#[derive(Debug, Error)]
pub enum ChatError {
    #[error(transparent)]
    Initialization(#[from] InitializationError),
    #[error(transparent)]
    Render(#[from] RenderError),
    #[error(transparent)]
    LlmDispatch(#[from] LlmDispatchError),
    #[error(transparent)]
    Presentation(#[from] PresentationError),
    #[error(transparent)]
    UnreachableMode(#[from] UnreachableModeError),
}

impl ChatError {
    /// Stable tag used in log records
    pub fn category(&self) -> &'static str {
        match self {
            ChatError::Initialization(_) => "initialization",
            ChatError::Render(_) => "conversation_log",
            ChatError::LlmDispatch(_) => "llm_response",
            ChatError::Presentation(_) => "display_answer",
            ChatError::UnreachableMode(_) => "unreachable_mode",
        }
    }

    /// Generic, non-leaking text for the user
    pub fn user_message(&self) -> String {
        let summary = match self {
            ChatError::Initialization(_) => "Initialization failed.",
            ChatError::Render(_) => "Failed to display the conversation history.",
            ChatError::LlmDispatch(_) => "Failed to get an answer.",
            ChatError::Presentation(_) => "Failed to display the answer.",
            ChatError::UnreachableMode(_) => "The selected mode is not available.",
        };
        build_error_message(summary)
    }

    /// Log the full detail and produce the banner shown to the user
    pub fn report(&self) -> ErrorBanner {
        tracing::error!(
            category = self.category(),
            error = %self,
            detail = ?self,
            "Interaction cycle aborted"
        );
        ErrorBanner {
            icon: ERROR_ICON,
            category: self.category(),
            message: self.user_message(),
        }
    }
}

/// Append the administrator hint to a user-facing error summary
pub fn build_error_message(message: &str) -> String {
    format!("{message}\n{ADMIN_CONTACT_SUFFIX}")
}

/// User-visible error indicator
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorBanner {
    pub icon: &'static str,
    pub category: &'static str,
    pub message: String,
}
