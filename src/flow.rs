//! One interaction cycle, top to bottom
//!
//! Every user action (page load, mode switch, message submit) becomes a
//! `UiEvent`, and the whole page is re-derived from the session for it:
//! initialize, render title/selector/greeting, replay history, then (only
//! if the event carries a message) dispatch, present, and record.

#[cfg(test)]
mod proptests;

use crate::dispatch::ResponseDispatcher;
use crate::error::{ChatError, UnreachableModeError};
use crate::init::Initializer;
use crate::present::present;
use crate::render::{
    display_initial_greeting, display_mode_selector, display_title, render_message,
    replay_history, PageView, CHAT_INPUT_HELPER_TEXT,
};
use crate::session::{Message, Mode, Session};
use crate::telemetry;
use tracing::Instrument;

/// A single user interaction
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiEvent {
    /// Plain page view
    Load,
    /// Mode selector changed
    SelectMode { mode: String },
    /// Chat input submitted, with the mode the page showed at the time
    Submit {
        message: String,
        mode: Option<String>,
    },
}

impl UiEvent {
    /// Build from loosely-typed form fields
    pub fn from_fields(mode: Option<String>, message: Option<String>) -> Self {
        match (mode, message) {
            (mode, Some(message)) => UiEvent::Submit { message, mode },
            (Some(mode), None) => UiEvent::SelectMode { mode },
            (None, None) => UiEvent::Load,
        }
    }

    fn requested_mode(&self) -> Result<Option<Mode>, UnreachableModeError> {
        match self {
            UiEvent::Load => Ok(None),
            UiEvent::SelectMode { mode } => mode.parse().map(Some),
            UiEvent::Submit { mode, .. } => mode.as_deref().map(str::parse::<Mode>).transpose(),
        }
    }
}

/// Non-blocking poll for the message carried by this event, if any
pub fn read_next_message(event: &UiEvent) -> Option<String> {
    match event {
        UiEvent::Submit { message, .. } => {
            let trimmed = message.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
        UiEvent::Load | UiEvent::SelectMode { .. } => None,
    }
}

/// Runs interaction cycles against a session
pub struct ChatFlow {
    initializer: Initializer,
    dispatcher: ResponseDispatcher,
}

impl ChatFlow {
    pub fn new(initializer: Initializer, dispatcher: ResponseDispatcher) -> Self {
        Self {
            initializer,
            dispatcher,
        }
    }

    pub fn initializer(&self) -> &Initializer {
        &self.initializer
    }

    /// Handle one event. Errors end up in the page, never in the history.
    pub async fn run_page(&self, session: &mut Session, event: UiEvent) -> PageView {
        let span = telemetry::session_span(session.id());
        self.run_cycle(session, event).instrument(span).await
    }

    async fn run_cycle(&self, session: &mut Session, event: UiEvent) -> PageView {
        if let Err(e) = self.initializer.initialize(session) {
            return PageView::halted(session.id(), ChatError::from(e).report());
        }

        let (requested, mode_error) = match event.requested_mode() {
            Ok(mode) => (mode, None),
            Err(e) => (None, Some(ChatError::from(e))),
        };

        let mut page = PageView {
            session_id: session.id().to_string(),
            title: Some(display_title()),
            mode_selector: Some(display_mode_selector(session, requested)),
            greeting: display_initial_greeting(session.messages()),
            messages: Vec::new(),
            error: None,
            accepts_input: false,
            input_placeholder: CHAT_INPUT_HELPER_TEXT,
        };

        match replay_history(session.messages()) {
            Ok(messages) => page.messages = messages,
            Err(e) => {
                page.error = Some(ChatError::from(e).report());
                return page;
            }
        }
        page.accepts_input = true;

        if let Some(e) = mode_error {
            page.error = Some(e.report());
            return page;
        }

        let Some(message) = read_next_message(&event) else {
            return page;
        };

        let mode = session.mode();
        tracing::info!(text = %message, application_mode = %mode, "User message received");

        match self.respond(session.messages(), mode, &message).await {
            Ok(content) => {
                tracing::info!(text = %content, application_mode = %mode, "Assistant response");
                let user = Message::user(message);
                let assistant = Message::assistant(content);
                page.messages.push(render_message(&user));
                page.messages.push(render_message(&assistant));
                page.greeting = None;
                session.record_exchange(user.content, assistant.content);
            }
            Err(e) => {
                // Show what the user sent, but do not keep it
                page.messages.push(render_message(&Message::user(message)));
                page.error = Some(e.report());
            }
        }
        page
    }

    async fn respond(
        &self,
        history: &[Message],
        mode: Mode,
        message: &str,
    ) -> Result<String, ChatError> {
        let reply = self.dispatcher.get_response(mode, history, message).await?;
        tracing::debug!(
            model = %reply.model,
            tokens = reply.usage.total(),
            "LLM reply received"
        );
        Ok(present(mode, &reply)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crate::llm::{LlmConfig, LlmError, ModelRegistry};
    use crate::session::Role;
    use crate::testing::{capture_logs, contact_payload, registry_with, search_payload, MockLlm};
    use std::sync::Arc;

    fn flow_with(registry: ModelRegistry) -> ChatFlow {
        let registry = Arc::new(registry);
        ChatFlow::new(
            Initializer::new(&AppConfig::default(), Arc::clone(&registry)),
            ResponseDispatcher::new(registry, 10),
        )
    }

    fn submit(message: &str, mode: Mode) -> UiEvent {
        UiEvent::Submit {
            message: message.to_string(),
            mode: Some(mode.to_string()),
        }
    }

    #[test]
    fn test_read_next_message_gates_on_non_empty() {
        assert_eq!(read_next_message(&UiEvent::Load), None);
        assert_eq!(
            read_next_message(&UiEvent::SelectMode {
                mode: "contact".into()
            }),
            None
        );
        assert_eq!(read_next_message(&submit("   ", Mode::Search)), None);
        assert_eq!(
            read_next_message(&submit(" hi ", Mode::Search)),
            Some("hi".to_string())
        );
    }

    #[test]
    fn test_event_from_fields() {
        assert_eq!(UiEvent::from_fields(None, None), UiEvent::Load);
        assert_eq!(
            UiEvent::from_fields(Some("search".into()), None),
            UiEvent::SelectMode {
                mode: "search".into()
            }
        );
        assert_eq!(
            UiEvent::from_fields(None, Some("hi".into())),
            UiEvent::Submit {
                message: "hi".into(),
                mode: None
            }
        );
    }

    #[tokio::test]
    async fn test_search_scenario() {
        let mock = Arc::new(MockLlm::new());
        mock.queue_text(search_payload("Daily forecast sheet.", "docs/weather.pdf", 2));
        let flow = flow_with(registry_with(&mock));
        let mut session = Session::new(Mode::Search);

        let page = flow
            .run_page(&mut session, submit("weather today", Mode::Search))
            .await;

        assert!(page.error.is_none());
        let messages = session.messages();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0], Message::user("weather today"));
        assert_eq!(messages[1].role, Role::Assistant);
        assert!(messages[1].content.contains("`docs/weather.pdf` (page 2)"));
        assert_eq!(page.messages.len(), 2);
        assert!(page.greeting.is_none());
    }

    #[tokio::test]
    async fn test_contact_scenario() {
        let mock = Arc::new(MockLlm::new());
        mock.queue_text(contact_payload(
            "Call the support desk at extension 4400.",
            "docs/support.md",
        ));
        let flow = flow_with(registry_with(&mock));
        let mut session = Session::new(Mode::Search);

        let page = flow
            .run_page(&mut session, submit("connect me to support", Mode::Contact))
            .await;

        assert!(page.error.is_none());
        assert_eq!(session.mode(), Mode::Contact);
        let messages = session.messages();
        assert_eq!(messages[0], Message::user("connect me to support"));
        assert!(messages[1]
            .content
            .starts_with("Call the support desk at extension 4400."));
    }

    #[tokio::test]
    async fn test_dispatch_failure_leaves_history_empty() {
        let mock = Arc::new(MockLlm::new());
        mock.queue_error(LlmError::network("Connection failed"));
        let flow = flow_with(registry_with(&mock));
        let mut session = Session::new(Mode::Search);

        let page = flow
            .run_page(&mut session, submit("weather today", Mode::Search))
            .await;

        let error = page.error.unwrap();
        assert_eq!(error.category, "llm_response");
        assert!(!error.message.contains("Connection failed"));
        assert!(session.messages().is_empty());
        // The pending message is shown but not stored
        assert_eq!(page.messages.len(), 1);
        assert!(page.accepts_input);
    }

    #[tokio::test]
    async fn test_presentation_failure_leaves_history_unchanged() {
        let mock = Arc::new(MockLlm::new());
        mock.queue_text(search_payload("ok", "a.pdf", 1));
        mock.queue_text("not json at all");
        let flow = flow_with(registry_with(&mock));
        let mut session = Session::new(Mode::Search);

        flow.run_page(&mut session, submit("first", Mode::Search))
            .await;
        let page = flow
            .run_page(&mut session, submit("second", Mode::Search))
            .await;

        assert_eq!(page.error.unwrap().category, "display_answer");
        assert_eq!(session.messages().len(), 2);
    }

    #[tokio::test]
    async fn test_missing_credential_halts_before_rendering() {
        let flow = flow_with(ModelRegistry::new(&LlmConfig::default()));
        let mut session = Session::new(Mode::Search);

        let page = flow
            .run_page(&mut session, submit("weather today", Mode::Search))
            .await;

        assert_eq!(page.error.unwrap().category, "initialization");
        assert!(page.title.is_none());
        assert!(page.mode_selector.is_none());
        assert!(page.messages.is_empty());
        assert!(!page.accepts_input);
        assert!(session.messages().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_mode_fails_loudly_without_dispatch() {
        let mock = Arc::new(MockLlm::new());
        let flow = flow_with(registry_with(&mock));
        let mut session = Session::new(Mode::Search);

        let page = flow
            .run_page(
                &mut session,
                UiEvent::Submit {
                    message: "hello".into(),
                    mode: Some("billing".into()),
                },
            )
            .await;

        assert_eq!(page.error.unwrap().category, "unreachable_mode");
        assert_eq!(session.mode(), Mode::Search);
        assert!(mock.recorded_requests().is_empty());
        assert!(session.messages().is_empty());
    }

    #[tokio::test]
    async fn test_malformed_history_aborts_render() {
        let mock = Arc::new(MockLlm::new());
        let flow = flow_with(registry_with(&mock));
        let mut session = Session::new(Mode::Search);
        session.push_unchecked(Message::user(""));

        let page = flow
            .run_page(&mut session, submit("hello", Mode::Search))
            .await;

        assert_eq!(page.error.unwrap().category, "conversation_log");
        assert!(!page.accepts_input);
        assert!(mock.recorded_requests().is_empty());
        assert_eq!(session.messages().len(), 1);
    }

    #[tokio::test]
    async fn test_load_and_mode_switch_do_not_dispatch() {
        let mock = Arc::new(MockLlm::new());
        let flow = flow_with(registry_with(&mock));
        let mut session = Session::new(Mode::Search);

        let page = flow.run_page(&mut session, UiEvent::Load).await;
        assert!(page.greeting.is_some());
        assert!(page.error.is_none());
        assert!(session.is_initialized());

        let page = flow
            .run_page(
                &mut session,
                UiEvent::SelectMode {
                    mode: "contact".into(),
                },
            )
            .await;
        assert_eq!(page.mode_selector.unwrap().selected, Mode::Contact);
        assert!(mock.recorded_requests().is_empty());
    }

    #[tokio::test]
    async fn test_history_sent_as_context() {
        let mock = Arc::new(MockLlm::new());
        mock.queue_text(contact_payload("First answer.", "a.md"));
        mock.queue_text(contact_payload("Second answer.", "b.md"));
        let flow = flow_with(registry_with(&mock));
        let mut session = Session::new(Mode::Contact);

        flow.run_page(&mut session, submit("one", Mode::Contact))
            .await;
        flow.run_page(&mut session, submit("two", Mode::Contact))
            .await;

        let requests = mock.recorded_requests();
        assert_eq!(requests[1].messages.len(), 3);
        assert_eq!(requests[1].messages[0].text, "one");
        assert_eq!(session.messages().len(), 4);
    }

    #[tokio::test]
    async fn test_missing_credential_is_logged_with_category() {
        let logs = capture_logs();
        let flow = flow_with(ModelRegistry::new(&LlmConfig::default()));
        let mut session = Session::new(Mode::Search);

        flow.run_page(&mut session, submit("weather today", Mode::Search))
            .await;

        let errors = logs.with_message("Interaction cycle aborted");
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0]["level"], "ERROR");
        assert_eq!(errors[0]["fields"]["category"], "initialization");
        assert!(errors[0]["fields"]["error"]
            .as_str()
            .unwrap()
            .contains("OPENAI_API_KEY"));
        assert!(logs.with_message("User message received").is_empty());
    }

    #[tokio::test]
    async fn test_successful_cycle_logs_boot_inbound_and_outbound() {
        let logs = capture_logs();
        let mock = Arc::new(MockLlm::new());
        mock.queue_text(contact_payload("Dial 4400.", "docs/support.md"));
        mock.queue_text(contact_payload("Room 2B.", "docs/office.md"));
        let flow = flow_with(registry_with(&mock));
        let mut session = Session::new(Mode::Contact);

        flow.run_page(&mut session, submit("support number?", Mode::Contact))
            .await;
        flow.run_page(&mut session, submit("where is IT?", Mode::Contact))
            .await;

        // Boot completion is logged once per session
        assert_eq!(logs.with_message(crate::init::APP_BOOT_MESSAGE).len(), 1);

        let inbound = logs.with_message("User message received");
        assert_eq!(inbound.len(), 2);
        assert_eq!(inbound[0]["fields"]["text"], "support number?");
        assert_eq!(inbound[0]["fields"]["application_mode"], "contact");

        let outbound = logs.with_message("Assistant response");
        assert_eq!(outbound.len(), 2);
        assert!(outbound[1]["fields"]["text"]
            .as_str()
            .unwrap()
            .starts_with("Room 2B."));
        assert_eq!(outbound[1]["fields"]["application_mode"], "contact");
        assert!(logs.with_message("Interaction cycle aborted").is_empty());
    }

    #[tokio::test]
    async fn test_dispatch_failure_is_logged_without_outbound_record() {
        let logs = capture_logs();
        let mock = Arc::new(MockLlm::new());
        mock.queue_error(LlmError::network("Connection failed"));
        let flow = flow_with(registry_with(&mock));
        let mut session = Session::new(Mode::Search);

        flow.run_page(&mut session, submit("weather today", Mode::Search))
            .await;

        let errors = logs.with_message("Interaction cycle aborted");
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0]["fields"]["category"], "llm_response");
        // Full detail goes to the log even though the banner is generic
        assert!(errors[0]["fields"]["error"]
            .as_str()
            .unwrap()
            .contains("Connection failed"));
        assert_eq!(logs.with_message("User message received").len(), 1);
        assert!(logs.with_message("Assistant response").is_empty());
    }
}
