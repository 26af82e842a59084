//! Property-based tests for the interaction cycle
//!
//! Whatever mix of successes and failures the backend produces, history
//! only ever grows by complete user/assistant pairs.

use super::*;
use crate::config::AppConfig;
use crate::llm::LlmError;
use crate::session::Role;
use crate::testing::{contact_payload, registry_with, search_payload, MockLlm};
use proptest::prelude::*;
use std::sync::Arc;

#[derive(Debug, Clone, Copy)]
enum Outcome {
    Answer,
    BackendDown,
    WrongShape,
    BlankInput,
}

fn arb_mode() -> impl Strategy<Value = Mode> {
    prop_oneof![Just(Mode::Search), Just(Mode::Contact)]
}

fn arb_outcome() -> impl Strategy<Value = Outcome> {
    prop_oneof![
        3 => Just(Outcome::Answer),
        1 => Just(Outcome::BackendDown),
        1 => Just(Outcome::WrongShape),
        1 => Just(Outcome::BlankInput),
    ]
}

fn arb_step() -> impl Strategy<Value = (Mode, Outcome, String)> {
    (arb_mode(), arb_outcome(), "[a-zA-Z][a-zA-Z ?]{0,30}")
}

fn queue(mock: &MockLlm, mode: Mode, outcome: Outcome) {
    match (outcome, mode) {
        (Outcome::Answer, Mode::Search) => mock.queue_text(search_payload("fits", "a.pdf", 1)),
        (Outcome::Answer, Mode::Contact) => mock.queue_text(contact_payload("Sure.", "b.md")),
        (Outcome::BackendDown, _) => mock.queue_error(LlmError::server_error("503")),
        // Swap the shapes so each mode gets the other's payload
        (Outcome::WrongShape, Mode::Search) => mock.queue_text(contact_payload("x", "y")),
        (Outcome::WrongShape, Mode::Contact) => mock.queue_text("[1, 2, 3]"),
        (Outcome::BlankInput, _) => {}
    }
}

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap()
}

proptest! {
    #[test]
    fn history_grows_by_alternating_pairs(steps in prop::collection::vec(arb_step(), 0..12)) {
        let mock = Arc::new(MockLlm::new());
        let registry = Arc::new(registry_with(&mock));
        let flow = ChatFlow::new(
            Initializer::new(&AppConfig::default(), Arc::clone(&registry)),
            ResponseDispatcher::new(registry, 6),
        );
        let mut session = Session::new(Mode::Search);
        let rt = runtime();
        let mut successes = 0usize;

        for (mode, outcome, text) in steps {
            queue(&mock, mode, outcome);
            let message = match outcome {
                Outcome::BlankInput => "   ".to_string(),
                _ => text,
            };
            let before = session.messages().len();
            let page = rt.block_on(flow.run_page(
                &mut session,
                UiEvent::Submit { message, mode: Some(mode.to_string()) },
            ));

            let after = session.messages().len();
            match outcome {
                Outcome::Answer => {
                    prop_assert!(page.error.is_none());
                    prop_assert_eq!(after, before + 2);
                    successes += 1;
                }
                Outcome::BackendDown | Outcome::WrongShape => {
                    prop_assert!(page.error.is_some());
                    prop_assert_eq!(after, before);
                }
                Outcome::BlankInput => {
                    prop_assert!(page.error.is_none());
                    prop_assert_eq!(after, before);
                }
            }
        }

        let messages = session.messages();
        prop_assert_eq!(messages.len(), 2 * successes);
        for (i, message) in messages.iter().enumerate() {
            let expected = if i % 2 == 0 { Role::User } else { Role::Assistant };
            prop_assert_eq!(message.role, expected);
        }
    }

    #[test]
    fn every_mode_is_presentable(mode in arb_mode()) {
        let mock = Arc::new(MockLlm::new());
        queue(&mock, mode, Outcome::Answer);
        let registry = Arc::new(registry_with(&mock));
        let flow = ChatFlow::new(
            Initializer::new(&AppConfig::default(), Arc::clone(&registry)),
            ResponseDispatcher::new(registry, 6),
        );
        let mut session = Session::new(mode);

        let page = runtime().block_on(flow.run_page(
            &mut session,
            UiEvent::Submit { message: "question".into(), mode: Some(mode.to_string()) },
        ));

        prop_assert!(page.error.is_none());
        prop_assert_eq!(session.messages().len(), 2);
    }

    #[test]
    fn replay_is_read_only(exchanges in 0usize..8) {
        let mut session = Session::new(Mode::Contact);
        for i in 0..exchanges {
            session.record_exchange(format!("q{i}"), format!("a{i}"));
        }
        let first = replay_history(session.messages()).unwrap();
        let second = replay_history(session.messages()).unwrap();
        prop_assert_eq!(first, second);
        prop_assert_eq!(session.messages().len(), exchanges * 2);
    }
}
