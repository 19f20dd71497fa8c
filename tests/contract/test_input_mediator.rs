//! Contract Tests for the Input Mediator
//!
//! Line buffer reuse across requests, confirmation vocabularies, and the
//! prompt bookkeeping every request performs.

use std::sync::Arc;

use cantus_console::engine::{ConfirmVocabulary, InputRequest, InputValue};
use cantus_console::session::SessionState;
use cantus_console::terminal::{InputMediator, MemoryTerminal, Renderer, Terminal};
use cantus_console::Error;

struct Fixture {
    terminal: Arc<MemoryTerminal>,
    mediator: InputMediator,
    session: SessionState,
}

fn fixture(lines: &[&str]) -> Fixture {
    let terminal = Arc::new(MemoryTerminal::new().with_input(lines.iter().copied()));
    let renderer = Arc::new(Renderer::new(terminal.clone()));
    Fixture {
        terminal,
        mediator: InputMediator::new(renderer),
        session: SessionState::new("ada", false, false),
    }
}

impl Fixture {
    fn request(&self, request: InputRequest) -> InputValue {
        self.mediator.request(request, &self.session).unwrap()
    }

    fn word(&self) -> String {
        match self.request(InputRequest::ReadWord) {
            InputValue::Text(word) => word,
            other => panic!("expected text, got {:?}", other),
        }
    }

    fn confirm(&self, vocabulary: ConfirmVocabulary) -> bool {
        match self.request(InputRequest::Confirm(vocabulary)) {
            InputValue::Bool(answer) => answer,
            other => panic!("expected bool, got {:?}", other),
        }
    }

    fn hints(&self, vocabulary: ConfirmVocabulary) -> usize {
        self.terminal.output().matches(vocabulary.usage_hint()).count()
    }
}

#[test]
fn test_read_word_leaves_rest_for_next_request() {
    let f = fixture(&["abc def"]);

    assert_eq!(f.word(), "abc");
    assert_eq!(f.word(), "def");
    assert_eq!(f.terminal.lines_read(), 1);
}

#[test]
fn test_read_line_takes_remainder_of_buffer() {
    let f = fixture(&["first second third", "next line"]);

    assert_eq!(f.word(), "first");
    assert_eq!(
        f.request(InputRequest::ReadLine),
        InputValue::Text("second third".to_string())
    );
    assert_eq!(
        f.request(InputRequest::ReadLine),
        InputValue::Text("next line".to_string())
    );
}

#[test]
fn test_read_line_on_empty_buffer_returns_blank_lines() {
    let f = fixture(&[""]);
    assert_eq!(
        f.request(InputRequest::ReadLine),
        InputValue::Text(String::new())
    );
}

#[test]
fn test_read_char_consumes_one_character() {
    let f = fixture(&["xy", "  z"]);

    assert_eq!(f.request(InputRequest::ReadChar), InputValue::Char('x'));
    assert_eq!(f.request(InputRequest::ReadChar), InputValue::Char('y'));
    assert_eq!(f.request(InputRequest::ReadChar), InputValue::Char('z'));
    assert_eq!(f.terminal.lines_read(), 2);
}

#[test]
fn test_blank_lines_are_skipped_when_a_word_is_needed() {
    let f = fixture(&["", "   ", "\tword"]);

    assert_eq!(f.word(), "word");
    assert_eq!(f.terminal.lines_read(), 3);
}

#[test]
fn test_confirm_yes_no_accepts_case_and_padding() {
    let f = fixture(&["Y", "yes", " YES ", "n", "NO"]);
    let vocabulary = ConfirmVocabulary::YesNo;

    assert!(f.confirm(vocabulary));
    assert!(f.confirm(vocabulary));
    assert!(f.confirm(vocabulary));
    assert!(!f.confirm(vocabulary));
    assert!(!f.confirm(vocabulary));
}

#[test]
fn test_confirm_reprompts_until_valid() {
    let f = fixture(&["maybe", "perhaps later", "n"]);

    assert!(!f.confirm(ConfirmVocabulary::YesNo));
    // One hint per attempt: maybe, perhaps, later, n
    assert_eq!(f.hints(ConfirmVocabulary::YesNo), 4);
}

#[test]
fn test_confirm_ok_cancel_vocabulary() {
    let f = fixture(&["yes", "ok", "cancel"]);
    let vocabulary = ConfirmVocabulary::OkCancel;

    assert!(f.confirm(vocabulary));
    assert!(!f.confirm(vocabulary));
    assert_eq!(f.hints(vocabulary), 3);
}

#[test]
fn test_end_of_input_fails_request() {
    let f = fixture(&[]);
    let result = f.mediator.request(InputRequest::ReadWord, &f.session);
    assert!(matches!(result, Err(Error::InputClosed)));
}

#[test]
fn test_request_clears_prompted_flag() {
    let f = fixture(&["42"]);
    f.session.set_prompted(true);

    f.word();
    assert!(!f.session.is_prompted());
}

#[test]
fn test_request_clears_prompt_from_current_line() {
    let f = fixture(&["42"]);
    f.terminal.write_raw("ada@Cantus> ").unwrap();

    f.word();
    assert_eq!(f.terminal.screen(), vec!["42"]);
}
