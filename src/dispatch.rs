//! Sends one user message to the LLM backend
//!
//! The dispatcher knows which JSON shape each mode wants and asks the model
//! for it, but never looks inside the reply; that is the presenter's job.

use crate::error::LlmDispatchError;
use crate::llm::{LlmError, LlmMessage, LlmRequest, ModelRegistry, SystemContent, Usage};
use crate::present::NO_DOC_MATCH_ANSWER;
use crate::session::{Message, Mode, Role};
use std::sync::Arc;

const MAX_REPLY_TOKENS: u32 = 1024;

const BASE_PROMPT: &str = r"You are the assistant behind a company's internal help desk. Employees ask about internal documents, policies, procedures and services. Answer only from what you know about the company's documents; never invent file paths.

Reply with a single JSON object and nothing else.";

const SEARCH_PROMPT: &str = r#"The user is searching for a document. Identify the single document that best answers the request.

Shape:
{"matched": true, "answer": "<one or two sentences on why this document fits>", "source": "<path of the document>", "page": <page number or null>, "related": [{"source": "<path>", "page": <number or null>}]}

If no document fits, reply {"matched": false, "answer": "", "related": []}."#;

/// Formatted at runtime so the no-match sentinel stays in one place
fn contact_prompt() -> String {
    format!(
        r#"The user is making an inquiry. Answer it directly and list the documents the answer is based on.

Shape:
{{"answer": "<answer in markdown>", "sources": [{{"source": "<path>", "page": <page number or null>}}]}}

If nothing relevant is known, reply {{"answer": "{NO_DOC_MATCH_ANSWER}", "sources": []}}."#
    )
}

/// Raw reply from the backend, opaque to everything but the presenter
#[derive(Debug, Clone)]
pub struct LlmReply {
    /// Mode the request was built for
    pub mode: Mode,
    pub model: String,
    pub text: String,
    pub usage: Usage,
}

/// Forwards chat messages to the configured default model
pub struct ResponseDispatcher {
    registry: Arc<ModelRegistry>,
    history_limit: usize,
}

impl ResponseDispatcher {
    pub fn new(registry: Arc<ModelRegistry>, history_limit: usize) -> Self {
        Self {
            registry,
            history_limit,
        }
    }

    /// One attempt, no retry: any failure goes straight back to the user.
    pub async fn get_response(
        &self,
        mode: Mode,
        history: &[Message],
        message: &str,
    ) -> Result<LlmReply, LlmDispatchError> {
        let model_id = self.registry.default_model_id().to_string();
        let llm = self.registry.default().ok_or_else(|| LlmDispatchError {
            model: model_id.clone(),
            source: LlmError::unavailable("No LLM available"),
        })?;

        let request = self.build_request(mode, history, message);
        let response = llm
            .complete(&request)
            .await
            .map_err(|source| LlmDispatchError {
                model: model_id.clone(),
                source,
            })?;

        if !response.end_turn {
            // A cut-off reply is rarely valid JSON; the presenter will reject it
            tracing::warn!(model = %model_id, "LLM reply did not end its turn");
        }

        Ok(LlmReply {
            mode,
            model: model_id,
            text: response.text(),
            usage: response.usage,
        })
    }

    fn build_request(&self, mode: Mode, history: &[Message], message: &str) -> LlmRequest {
        let mode_prompt = match mode {
            Mode::Search => SEARCH_PROMPT.to_string(),
            Mode::Contact => contact_prompt(),
        };

        let mut messages: Vec<LlmMessage> = recent_history(history, self.history_limit)
            .iter()
            .map(|m| match m.role {
                Role::User => LlmMessage::user(m.content.clone()),
                Role::Assistant => LlmMessage::assistant(m.content.clone()),
            })
            .collect();
        messages.push(LlmMessage::user(message));

        LlmRequest {
            system: vec![SystemContent::cached(BASE_PROMPT), SystemContent::new(mode_prompt)],
            messages,
            max_tokens: Some(MAX_REPLY_TOKENS),
            json_output: true,
        }
    }
}

/// The last `limit` messages, starting on a user turn
fn recent_history(history: &[Message], limit: usize) -> &[Message] {
    let mut start = history.len().saturating_sub(limit);
    while history.get(start).is_some_and(|m| m.role != Role::User) {
        start += 1;
    }
    history.get(start..).unwrap_or_default()
}
