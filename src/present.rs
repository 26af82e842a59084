//! Mode-specific presentation of LLM replies
//!
//! Each mode expects its own JSON shape. The presenter validates the shape
//! and turns it into the markdown that is shown to the user and stored as
//! the assistant's message.

use crate::dispatch::LlmReply;
use crate::error::PresentationError;
use crate::session::Mode;
use serde::Deserialize;
use std::fmt::Write;

/// Answer the model gives in contact mode when it has nothing relevant
pub const NO_DOC_MATCH_ANSWER: &str = "No relevant information was found.";

const NO_DOC_MATCH_MESSAGE: &str = "No internal document matched your request. Try rephrasing it, or switch to Inquiry mode to ask directly.";
const SEARCH_LEAD: &str = "This document is the most likely to contain what you are looking for.";
const RELATED_HEADING: &str = "Other candidate documents:";
const SOURCES_HEADING: &str = "Sources:";

/// Reference to a document page
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
struct DocRef {
    source: String,
    #[serde(default)]
    page: Option<u32>,
}

impl DocRef {
    fn to_markdown(&self) -> String {
        match self.page {
            Some(page) => format!("`{}` (page {page})", self.source),
            None => format!("`{}`", self.source),
        }
    }
}

#[derive(Debug, Deserialize)]
struct SearchPayload {
    matched: bool,
    #[serde(default)]
    answer: String,
    #[serde(default)]
    source: Option<String>,
    #[serde(default)]
    page: Option<u32>,
    #[serde(default)]
    related: Vec<DocRef>,
}

#[derive(Debug, Deserialize)]
struct ContactPayload {
    answer: String,
    #[serde(default)]
    sources: Vec<DocRef>,
}

/// Render `reply` for `mode`; the result is both displayed and persisted
pub fn present(mode: Mode, reply: &LlmReply) -> Result<String, PresentationError> {
    if reply.mode != mode {
        return Err(PresentationError::ModeMismatch {
            requested: reply.mode,
            presented: mode,
        });
    }
    match mode {
        Mode::Search => render_search_result(reply),
        Mode::Contact => render_contact_result(reply),
    }
}

pub fn render_search_result(reply: &LlmReply) -> Result<String, PresentationError> {
    let payload: SearchPayload = parse_payload(Mode::Search, &reply.text)?;

    if !payload.matched {
        return Ok(NO_DOC_MATCH_MESSAGE.to_string());
    }

    let source = payload
        .source
        .filter(|s| !s.trim().is_empty())
        .ok_or(PresentationError::EmptyField {
            mode: Mode::Search,
            field: "source",
        })?;
    let main = DocRef {
        source,
        page: payload.page,
    };

    let mut content = format!("{SEARCH_LEAD}\n\n{}", main.to_markdown());
    if !payload.answer.trim().is_empty() {
        let _ = write!(content, "\n\n{}", payload.answer.trim());
    }

    let related = unique_refs(payload.related.into_iter().filter(|r| *r != main));
    push_ref_list(&mut content, RELATED_HEADING, &related);
    Ok(content)
}

pub fn render_contact_result(reply: &LlmReply) -> Result<String, PresentationError> {
    let payload: ContactPayload = parse_payload(Mode::Contact, &reply.text)?;

    let answer = payload.answer.trim();
    if answer.is_empty() {
        return Err(PresentationError::EmptyField {
            mode: Mode::Contact,
            field: "answer",
        });
    }

    let mut content = answer.to_string();
    if answer != NO_DOC_MATCH_ANSWER {
        push_ref_list(&mut content, SOURCES_HEADING, &unique_refs(payload.sources));
    }
    Ok(content)
}

fn parse_payload<T: serde::de::DeserializeOwned>(
    mode: Mode,
    text: &str,
) -> Result<T, PresentationError> {
    let value: serde_json::Value = serde_json::from_str(strip_code_fence(text))
        .map_err(|source| PresentationError::NotJson { mode, source })?;
    serde_json::from_value(value).map_err(|source| PresentationError::Shape { mode, source })
}

/// Models sometimes wrap JSON in a ```json fence despite instructions
fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let body = rest.trim_start_matches(|c: char| c.is_ascii_alphanumeric());
    body.strip_suffix("```").unwrap_or(body).trim()
}

/// Drop blank and repeated references, keeping first-seen order
fn unique_refs(refs: impl IntoIterator<Item = DocRef>) -> Vec<DocRef> {
    let mut seen: Vec<DocRef> = Vec::new();
    for r in refs {
        if !r.source.trim().is_empty() && !seen.contains(&r) {
            seen.push(r);
        }
    }
    seen
}

fn push_ref_list(content: &mut String, heading: &str, refs: &[DocRef]) {
    if refs.is_empty() {
        return;
    }
    let _ = write!(content, "\n\n{heading}");
    for r in refs {
        let _ = write!(content, "\n- {}", r.to_markdown());
    }
}
