//! Conversation renderer
//!
//! Builds the page model re-derived on every interaction: title, mode
//! selector, greeting, and a read-only replay of the stored history.

mod html;

pub use html::render_document;

use crate::error::{ErrorBanner, RenderError};
use crate::session::{Message, Mode, Role, Session};
use pulldown_cmark::{CowStr, Event, Options, Parser, Tag};
use serde::Serialize;

pub const APP_NAME: &str = "Deskmate";
pub const CHAT_INPUT_HELPER_TEXT: &str = "Type your question here";
/// Link schemes allowed through in rendered markdown; anything else becomes `#`
const SAFE_URL_SCHEMES: [&str; 3] = ["http", "https", "mailto"];
const GREETING: &str = "Hello! I am the company help desk assistant. Choose a mode in the sidebar, then type your question in the box at the bottom.";

/// Everything the client needs to draw one page
#[derive(Debug, Clone, Serialize)]
pub struct PageView {
    pub session_id: String,
    /// `None` only when initialization failed
    pub title: Option<&'static str>,
    pub mode_selector: Option<ModeSelector>,
    pub greeting: Option<Greeting>,
    pub messages: Vec<RenderedMessage>,
    pub error: Option<ErrorBanner>,
    /// Whether the page offers the chat input in this cycle
    pub accepts_input: bool,
    pub input_placeholder: &'static str,
}

impl PageView {
    /// Page that shows only the error banner
    pub fn halted(session_id: &str, error: ErrorBanner) -> Self {
        Self {
            session_id: session_id.to_string(),
            title: None,
            mode_selector: None,
            greeting: None,
            messages: Vec::new(),
            error: Some(error),
            accepts_input: false,
            input_placeholder: CHAT_INPUT_HELPER_TEXT,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModeSelector {
    pub selected: Mode,
    pub options: Vec<ModeOption>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModeOption {
    pub value: Mode,
    pub label: &'static str,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Greeting {
    pub text: &'static str,
    pub hints: Vec<ModeHint>,
}

/// Usage hint for one mode, shown with the greeting
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModeHint {
    pub mode: Mode,
    pub label: &'static str,
    pub description: &'static str,
    pub example: &'static str,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenderedMessage {
    pub role: Role,
    pub content: String,
    /// Safe HTML for display
    pub html: String,
}

pub fn display_title() -> &'static str {
    APP_NAME
}

/// Apply the requested mode (if any) to the session and describe the selector
pub fn display_mode_selector(session: &mut Session, requested: Option<Mode>) -> ModeSelector {
    if let Some(mode) = requested {
        if mode != session.mode() {
            tracing::info!(from = %session.mode(), to = %mode, "Mode changed");
            session.set_mode(mode);
        }
    }
    ModeSelector {
        selected: session.mode(),
        options: Mode::ALL
            .iter()
            .map(|&value| ModeOption {
                value,
                label: value.label(),
            })
            .collect(),
    }
}

/// Greeting with per-mode hints, until the conversation has started
pub fn display_initial_greeting(messages: &[Message]) -> Option<Greeting> {
    if !messages.is_empty() {
        return None;
    }
    Some(Greeting {
        text: GREETING,
        hints: Mode::ALL.iter().map(|&mode| mode_hint(mode)).collect(),
    })
}

fn mode_hint(mode: Mode) -> ModeHint {
    match mode {
        Mode::Search => ModeHint {
            mode,
            label: mode.label(),
            description: "Find the internal document that matches what you type.",
            example: "Where is the meeting minutes template for the sales team?",
        },
        Mode::Contact => ModeHint {
            mode,
            label: mode.label(),
            description: "Ask a question and get an answer built from internal documents.",
            example: "How many days of paid leave do new employees get?",
        },
    }
}

/// Replay stored messages for display. Never mutates history.
pub fn replay_history(messages: &[Message]) -> Result<Vec<RenderedMessage>, RenderError> {
    messages
        .iter()
        .enumerate()
        .map(|(index, message)| {
            if message.content.trim().is_empty() {
                return Err(RenderError::Malformed {
                    index,
                    reason: "blank content",
                });
            }
            let expected = if index % 2 == 0 {
                Role::User
            } else {
                Role::Assistant
            };
            if message.role != expected {
                return Err(RenderError::Malformed {
                    index,
                    reason: "role out of sequence",
                });
            }
            Ok(render_message(message))
        })
        .collect()
}

pub fn render_message(message: &Message) -> RenderedMessage {
    let html = match message.role {
        Role::User => format!("<p>{}</p>", escape_html(&message.content)),
        Role::Assistant => markdown_to_html(&message.content),
    };
    RenderedMessage {
        role: message.role,
        content: message.content.clone(),
        html,
    }
}

/// Render markdown, treating any raw HTML in the source as text and
/// neutralizing link and image targets with a scheme outside `SAFE_URL_SCHEMES`
pub fn markdown_to_html(markdown: &str) -> String {
    let parser = Parser::new_ext(markdown, Options::ENABLE_TABLES).map(|event| match event {
        Event::Html(raw) | Event::InlineHtml(raw) => Event::Text(raw),
        Event::Start(Tag::Link {
            link_type,
            dest_url,
            title,
            id,
        }) if !is_safe_url(&dest_url) => Event::Start(Tag::Link {
            link_type,
            dest_url: CowStr::Borrowed("#"),
            title,
            id,
        }),
        Event::Start(Tag::Image {
            link_type,
            dest_url,
            title,
            id,
        }) if !is_safe_url(&dest_url) => Event::Start(Tag::Image {
            link_type,
            dest_url: CowStr::Borrowed("#"),
            title,
            id,
        }),
        other => other,
    });
    let mut out = String::with_capacity(markdown.len() * 3 / 2);
    pulldown_cmark::html::push_html(&mut out, parser);
    out
}

/// Relative targets pass; absolute ones need an allowed scheme.
/// Browsers ignore whitespace and control characters inside a scheme.
fn is_safe_url(url: &str) -> bool {
    let cleaned: String = url
        .chars()
        .filter(|c| !c.is_whitespace() && !c.is_control())
        .collect();
    match cleaned.split_once(':') {
        Some((scheme, _)) if !scheme.contains(['/', '?', '#']) => SAFE_URL_SCHEMES
            .iter()
            .any(|allowed| scheme.eq_ignore_ascii_case(allowed)),
        _ => true,
    }
}

pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    // Writing into a String cannot fail
    let _ = pulldown_cmark_escape::escape_html(&mut out, text);
    out
}
