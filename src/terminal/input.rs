//! Evaluator input requests
//!
//! Answers `read`/`readline`/`readchar`/`confirm` calls from whichever
//! thread is evaluating. One terminal line can satisfy several requests:
//! what a request does not consume stays in the [`LineBuffer`] for the next.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use super::Renderer;
use crate::engine::{ConfirmVocabulary, InputRequest, InputValue};
use crate::error::{Error, Result};
use crate::session::SessionState;

/// Terminal input not yet consumed by a request
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LineBuffer {
    pending: String,
}

/// Whitespace and control characters: everything up to and including space
fn is_separator(c: char) -> bool {
    c <= ' '
}

impl LineBuffer {
    pub fn new(pending: impl Into<String>) -> Self {
        Self {
            pending: pending.into(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn as_str(&self) -> &str {
        &self.pending
    }

    pub fn fill(&mut self, text: &str) {
        self.pending.push_str(text);
    }

    /// Drop leading whitespace and control characters
    pub fn strip_leading(&mut self) {
        let start = self
            .pending
            .find(|c: char| !is_separator(c))
            .unwrap_or(self.pending.len());
        self.pending.drain(..start);
    }

    /// Up to (not including) the next line break, or everything
    pub fn take_line(&mut self) -> String {
        match self.pending.find(['\n', '\r']) {
            Some(end) => {
                let line = self.pending[..end].to_string();
                self.pending.drain(..end);
                line
            }
            None => std::mem::take(&mut self.pending),
        }
    }

    pub fn take_char(&mut self) -> Option<char> {
        let c = self.pending.chars().next()?;
        self.pending.drain(..c.len_utf8());
        Some(c)
    }

    /// Up to the first whitespace or control character, or everything
    pub fn take_word(&mut self) -> String {
        match self.pending.find(is_separator) {
            Some(end) => {
                let word = self.pending[..end].to_string();
                self.pending.drain(..end);
                word
            }
            None => std::mem::take(&mut self.pending),
        }
    }
}

/// Services evaluator input requests against the terminal
pub struct InputMediator {
    renderer: Arc<Renderer>,
    buffer: Mutex<LineBuffer>,
}

impl std::fmt::Debug for InputMediator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InputMediator")
            .field("buffer", &*self.lock())
            .finish()
    }
}

impl InputMediator {
    pub fn new(renderer: Arc<Renderer>) -> Self {
        Self {
            renderer,
            buffer: Mutex::new(LineBuffer::default()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, LineBuffer> {
        self.buffer.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Input still held for later requests
    pub fn pending(&self) -> String {
        self.lock().as_str().to_string()
    }

    /// Answer one input request, blocking on the terminal when the buffer
    /// cannot satisfy it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InputClosed`] if the terminal reaches end of input
    /// before the request is satisfied.
    pub fn request(&self, request: InputRequest, session: &SessionState) -> Result<InputValue> {
        self.renderer.clear_current_line(session.prompt().width())?;

        let mut buffer = self.lock();
        let answer = match request {
            InputRequest::ReadLine => self.read_line(&mut buffer).map(InputValue::Text),
            InputRequest::ReadChar => self.read_char(&mut buffer).map(InputValue::Char),
            InputRequest::ReadWord => self.read_word(&mut buffer).map(InputValue::Text),
            InputRequest::Confirm(vocabulary) => {
                self.confirm(&mut buffer, vocabulary).map(InputValue::Bool)
            }
        };
        drop(buffer);

        // Whoever asked for input owns the screen now; the read loop must
        // re-issue the prompt itself
        session.set_prompted(false);
        answer
    }

    fn read_terminal(&self) -> Result<String> {
        let line = self.renderer.terminal().read_line()?;
        self.renderer.mark_line_terminated();
        line.ok_or(Error::InputClosed)
    }

    /// Refill until something other than separators is buffered
    fn refill(&self, buffer: &mut LineBuffer) -> Result<()> {
        buffer.strip_leading();
        while buffer.is_empty() {
            let line = self.read_terminal()?;
            buffer.fill(&line);
            buffer.strip_leading();
        }
        Ok(())
    }

    fn read_line(&self, buffer: &mut LineBuffer) -> Result<String> {
        buffer.strip_leading();
        if buffer.is_empty() {
            return self.read_terminal();
        }
        Ok(buffer.take_line())
    }

    fn read_char(&self, buffer: &mut LineBuffer) -> Result<char> {
        self.refill(buffer)?;
        buffer.take_char().ok_or(Error::InputClosed)
    }

    fn read_word(&self, buffer: &mut LineBuffer) -> Result<String> {
        self.refill(buffer)?;
        Ok(buffer.take_word())
    }

    fn confirm(&self, buffer: &mut LineBuffer, vocabulary: ConfirmVocabulary) -> Result<bool> {
        loop {
            self.renderer.write_line(vocabulary.usage_hint())?;
            let word = self.read_word(buffer)?;
            match vocabulary.interpret(&word) {
                Some(answer) => return Ok(answer),
                None => trace!("Unrecognized confirmation '{}'", word),
            }
        }
    }
}
