//! Mock implementations for testing
//!
//! These mocks let the interaction cycle run without network I/O.

use crate::llm::{LlmError, LlmRequest, LlmResponse, LlmService, ModelRegistry, Usage};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::io;
use std::sync::{Arc, Mutex};

pub const MOCK_MODEL_ID: &str = "mock-model";

/// Mock LLM that returns queued responses in order
pub struct MockLlm {
    responses: Mutex<VecDeque<Result<LlmResponse, LlmError>>>,
    /// Record of all requests made
    pub requests: Mutex<Vec<LlmRequest>>,
}

impl MockLlm {
    pub fn new() -> Self {
        Self {
            responses: Mutex::new(VecDeque::new()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Queue a successful reply with the given text
    pub fn queue_text(&self, text: impl Into<String>) {
        self.responses.lock().unwrap().push_back(Ok(LlmResponse {
            content: vec![text.into()],
            end_turn: true,
            usage: Usage {
                input_tokens: 12,
                output_tokens: 8,
                ..Usage::default()
            },
        }));
    }

    /// Queue an error response
    pub fn queue_error(&self, error: LlmError) {
        self.responses.lock().unwrap().push_back(Err(error));
    }

    pub fn recorded_requests(&self) -> Vec<LlmRequest> {
        self.requests.lock().unwrap().clone()
    }
}

impl Default for MockLlm {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LlmService for MockLlm {
    async fn complete(&self, request: &LlmRequest) -> Result<LlmResponse, LlmError> {
        self.requests.lock().unwrap().push(request.clone());
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(LlmError::network("No mock response queued")))
    }

    fn model_id(&self) -> &str {
        MOCK_MODEL_ID
    }
}

/// A well-formed search-mode reply
pub fn search_payload(answer: &str, source: &str, page: u32) -> String {
    serde_json::json!({
        "matched": true,
        "answer": answer,
        "source": source,
        "page": page,
        "related": [{ "source": "docs/handbook/overview.pdf", "page": 1 }]
    })
    .to_string()
}

/// A well-formed contact-mode reply
pub fn contact_payload(answer: &str, source: &str) -> String {
    serde_json::json!({
        "answer": answer,
        "sources": [{ "source": source }]
    })
    .to_string()
}

/// Registry whose only (and default) model is `mock`
pub fn registry_with(mock: &Arc<MockLlm>) -> ModelRegistry {
    ModelRegistry::from_services(vec![Arc::clone(mock) as Arc<dyn LlmService>])
}

#[derive(Clone, Default)]
struct SharedBuf(Arc<Mutex<Vec<u8>>>);

impl io::Write for SharedBuf {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// JSON log records emitted on this thread while the value is alive
pub struct CapturedLogs {
    buf: SharedBuf,
    _guard: tracing::subscriber::DefaultGuard,
}

impl CapturedLogs {
    pub fn records(&self) -> Vec<serde_json::Value> {
        let bytes = self.buf.0.lock().unwrap().clone();
        String::from_utf8(bytes)
            .unwrap()
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect()
    }

    /// Records whose event message is `message`
    pub fn with_message(&self, message: &str) -> Vec<serde_json::Value> {
        self.records()
            .into_iter()
            .filter(|r| r["fields"]["message"] == message)
            .collect()
    }
}

/// Route this thread's tracing output into memory. Works with
/// `#[tokio::test]`, whose runtime polls on the test thread.
pub fn capture_logs() -> CapturedLogs {
    let buf = SharedBuf::default();
    let writer = buf.clone();
    let subscriber = tracing_subscriber::fmt()
        .json()
        .with_max_level(tracing::Level::DEBUG)
        .with_writer(move || writer.clone())
        .finish();
    CapturedLogs {
        buf,
        _guard: tracing::subscriber::set_default(subscriber),
    }
}
