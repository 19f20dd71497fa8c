//! Property-based tests for input buffering
//!
//! These tests use proptest to check that the line buffer never loses or
//! invents characters, and that the mediator answers word requests the same
//! way however the input is split across terminal lines.

use std::sync::Arc;

use cantus_console::engine::{InputRequest, InputValue};
use cantus_console::session::SessionState;
use cantus_console::terminal::{InputMediator, LineBuffer, MemoryTerminal, Renderer};
use proptest::prelude::*;

fn is_separator(c: char) -> bool {
    c <= ' '
}

proptest! {
    #[test]
    fn test_word_and_rest_reassemble(s in "[ -~\t]{0,80}") {
        let mut buffer = LineBuffer::new(s.clone());
        buffer.strip_leading();
        let stripped = buffer.as_str().to_string();

        let word = buffer.take_word();
        prop_assert!(!word.chars().any(is_separator));
        prop_assert_eq!(format!("{}{}", word, buffer.as_str()), stripped);
    }

    #[test]
    fn test_strip_leading_is_idempotent(s in "\\PC{0,80}") {
        let mut once = LineBuffer::new(s);
        once.strip_leading();
        let mut twice = once.clone();
        twice.strip_leading();

        prop_assert_eq!(&once, &twice);
        prop_assert!(once.as_str().chars().next().map_or(true, |c| !is_separator(c)));
    }

    #[test]
    fn test_take_line_stops_before_break(line in "[a-z ]{0,40}", rest in "[a-z ]{0,40}") {
        let mut buffer = LineBuffer::new(format!("{}\n{}", line, rest));
        prop_assert_eq!(buffer.take_line(), line);
        prop_assert_eq!(buffer.as_str(), format!("\n{}", rest));
    }

    #[test]
    fn test_take_char_consumes_exactly_one(s in "\\PC{1,40}") {
        let mut buffer = LineBuffer::new(s.clone());
        let first = buffer.take_char();
        prop_assert_eq!(first, s.chars().next());
        prop_assert_eq!(buffer.as_str().chars().count(), s.chars().count() - 1);
    }

    #[test]
    fn test_words_survive_any_line_split(
        words in prop::collection::vec("[a-z0-9]{1,8}", 1..8),
        split in 0usize..8,
    ) {
        let split = split.min(words.len());
        let lines = [words[..split].join(" "), words[split..].join("  ")];

        let terminal = Arc::new(MemoryTerminal::new().with_input(lines.iter().cloned()));
        let mediator = InputMediator::new(Arc::new(Renderer::new(terminal)));
        let session = SessionState::new("ada", false, false);

        for expected in &words {
            let got = mediator.request(InputRequest::ReadWord, &session).unwrap();
            prop_assert_eq!(got, InputValue::Text(expected.clone()));
        }
    }
}
