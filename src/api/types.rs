//! API request and response types

use crate::render::PageView;
use serde::{Deserialize, Serialize};

/// Fields posted by the HTML page's two forms
#[derive(Debug, Default, Deserialize)]
pub struct PageForm {
    pub mode: Option<String>,
    pub message: Option<String>,
}

/// Request to change the session's mode
#[derive(Debug, Deserialize)]
pub struct ModeRequest {
    pub mode: String,
}

/// Request to send a chat message
#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub message: String,
    /// Mode shown to the user when they sent the message
    #[serde(default)]
    pub mode: Option<String>,
}

/// Response for session creation
#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub session_id: String,
    pub page: PageView,
}

/// Response for lifecycle actions
#[derive(Debug, Serialize)]
pub struct SuccessResponse {
    pub success: bool,
}

/// Model information with metadata
#[derive(Debug, Serialize)]
pub struct ModelInfo {
    pub id: String,
    pub provider: String,
    pub description: String,
}

/// Response for model list
#[derive(Debug, Serialize)]
pub struct ModelsResponse {
    pub models: Vec<ModelInfo>,
    pub default: String,
}

/// Error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
        }
    }
}
