//! Per-session conversation state
//!
//! A session is created on first visit and lives in memory until the
//! process exits or the client deletes it. History is append-only and
//! only grows one user/assistant exchange at a time.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};

use crate::error::UnreachableModeError;

/// Answer presentation mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    /// Point the user at the matching internal document
    #[default]
    Search,
    /// Answer an inquiry and list the sources used
    Contact,
}

impl Mode {
    pub const ALL: [Mode; 2] = [Mode::Search, Mode::Contact];

    pub fn as_str(self) -> &'static str {
        match self {
            Mode::Search => "search",
            Mode::Contact => "contact",
        }
    }

    /// Label shown in the mode selector
    pub fn label(self) -> &'static str {
        match self {
            Mode::Search => "Document search",
            Mode::Contact => "Inquiry",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Mode {
    type Err = UnreachableModeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "search" => Ok(Mode::Search),
            "contact" => Ok(Mode::Contact),
            _ => Err(UnreachableModeError {
                value: s.to_string(),
            }),
        }
    }
}

/// Author of a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Assistant,
}

/// A single entry in the conversation log
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// State for one browser session
#[derive(Debug)]
pub struct Session {
    id: String,
    mode: Mode,
    initialized: bool,
    messages: Vec<Message>,
    created_at: DateTime<Utc>,
}

impl Session {
    pub fn new(mode: Mode) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            mode,
            initialized: false,
            messages: Vec::new(),
            created_at: Utc::now(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: Mode) {
        self.mode = mode;
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub fn mark_initialized(&mut self) {
        self.initialized = true;
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Append one completed exchange.
    ///
    /// This is the only way history grows, so the log always alternates
    /// user/assistant starting with the user.
    pub fn record_exchange(&mut self, user: impl Into<String>, assistant: impl Into<String>) {
        self.messages.push(Message::user(user));
        self.messages.push(Message::assistant(assistant));
    }

    /// Push a single message without pairing, for exercising replay validation
    #[cfg(test)]
    pub fn push_unchecked(&mut self, message: Message) {
        self.messages.push(message);
    }
}

pub type SessionHandle = Arc<Mutex<Session>>;

/// All live sessions, keyed by session id
#[derive(Default)]
pub struct SessionStore {
    sessions: RwLock<HashMap<String, SessionHandle>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a session with the given starting mode and return its id
    pub async fn create(&self, mode: Mode) -> (String, SessionHandle) {
        let session = Session::new(mode);
        let id = session.id().to_string();
        let handle = Arc::new(Mutex::new(session));
        self.sessions
            .write()
            .await
            .insert(id.clone(), Arc::clone(&handle));
        (id, handle)
    }

    pub async fn get(&self, id: &str) -> Option<SessionHandle> {
        self.sessions.read().await.get(id).cloned()
    }

    pub async fn remove(&self, id: &str) -> bool {
        self.sessions.write().await.remove(id).is_some()
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }
}
