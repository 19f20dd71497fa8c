//! Prompt-aware output rendering
//!
//! Output can arrive from the feeder worker while a prompt is on screen.
//! The renderer wipes the prompt line, stitches piecemeal output back onto
//! the row it started on, and re-draws the prompt in block mode.
//!
//! Each public operation holds the cursor lock for its whole duration, so a
//! render started on one thread is never interleaved with one started on
//! another.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use super::Terminal;
use crate::error::Result;
use crate::session::{SessionMode, SessionState};

/// Where the last emitted output left the cursor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderCursor {
    /// Column the last unterminated output ended at
    pub last_column: u16,
    /// Whether the last output ended with a line terminator
    pub line_terminated: bool,
}

impl Default for RenderCursor {
    fn default() -> Self {
        Self {
            last_column: 0,
            line_terminated: true,
        }
    }
}

pub struct Renderer {
    terminal: Arc<dyn Terminal>,
    cursor: Mutex<RenderCursor>,
}

impl std::fmt::Debug for Renderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Renderer")
            .field("cursor", &*self.lock())
            .finish()
    }
}

fn ends_line(text: &str) -> bool {
    text.ends_with('\n') || text.ends_with('\r')
}

/// Column the cursor sits at after writing `text` from `start`
fn column_after(start: u16, text: &str) -> u16 {
    let (base, tail) = match text.rfind(['\n', '\r']) {
        Some(at) => (0, &text[at + 1..]),
        None => (start, text),
    };
    let width = u16::try_from(tail.chars().count()).unwrap_or(u16::MAX);
    base.saturating_add(width)
}

impl Renderer {
    pub fn new(terminal: Arc<dyn Terminal>) -> Self {
        Self {
            terminal,
            cursor: Mutex::new(RenderCursor::default()),
        }
    }

    pub fn terminal(&self) -> &Arc<dyn Terminal> {
        &self.terminal
    }

    fn lock(&self) -> MutexGuard<'_, RenderCursor> {
        self.cursor.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Snapshot of the cursor bookkeeping
    pub fn cursor(&self) -> RenderCursor {
        *self.lock()
    }

    /// Blank the current row over `width` cells and return to its start
    pub fn clear_current_line(&self, width: usize) -> Result<()> {
        let _guard = self.lock();
        self.clear_line_locked(width)
    }

    fn clear_line_locked(&self, width: usize) -> Result<()> {
        if !self.terminal.supports_cursor() {
            return Ok(());
        }

        self.terminal.move_to_column(0)?;

        // Cursor goes back to column 0 even if the blanking write fails
        let terminal = &self.terminal;
        let _restore = scopeguard::guard((), |_| {
            if let Err(e) = terminal.move_to_column(0) {
                warn!("Failed to restore cursor after clearing line: {}", e);
            }
        });
        self.terminal.write_raw(&" ".repeat(width))
    }

    /// Wipe the prompt row and, when the last output was left open, step
    /// back onto the row it ended on. Returns the column output resumes at.
    fn resume_output_line(&self, cursor: &RenderCursor, width: usize) -> Result<u16> {
        self.clear_line_locked(width)?;
        if cursor.line_terminated {
            return Ok(0);
        }
        self.terminal.move_up(1)?;
        self.terminal.move_to_column(cursor.last_column)?;
        Ok(cursor.last_column)
    }

    /// Show evaluator output that may arrive while a prompt is displayed
    pub fn on_output_arrived(&self, text: &str, session: &SessionState) -> Result<()> {
        let mut cursor = self.lock();

        if !self.terminal.supports_cursor() {
            cursor.line_terminated = ends_line(text);
            return self.terminal.write_raw(text);
        }

        let prompt = session.prompt();
        let start = match self.resume_output_line(&cursor, prompt.width()) {
            Ok(column) => column,
            Err(e) => {
                warn!("Cursor positioning failed, writing output as is: {}", e);
                0
            }
        };

        cursor.line_terminated = ends_line(text);
        self.terminal.write_raw(text)?;

        if !cursor.line_terminated {
            cursor.last_column = column_after(start, text);
            self.terminal.write_raw("\n")?;
        }

        if session.mode() == SessionMode::Block {
            self.terminal.write_raw(prompt.text())?;
            session.set_prompted(true);
        }
        Ok(())
    }

    /// Wipe the whole visible terminal
    pub fn on_clear_requested(&self) -> Result<()> {
        let mut cursor = self.lock();
        *cursor = RenderCursor::default();
        self.terminal.clear_screen()
    }

    /// Print the session's current prompt
    pub fn print_prompt(&self, session: &SessionState) -> Result<()> {
        let _guard = self.lock();
        self.terminal.write_raw(session.prompt().text())?;
        session.set_prompted(true);
        Ok(())
    }

    /// Replace the prompt line with a completed result and its terminator
    pub fn print_result(&self, text: &str, session: &SessionState) -> Result<()> {
        let mut cursor = self.lock();
        self.clear_line_locked(session.prompt().width())?;
        cursor.line_terminated = true;
        self.terminal.write_raw(&format!("{}\n", text))
    }

    /// Replace the prompt line with an error message on the error stream
    pub fn print_failure(&self, message: &str, session: &SessionState) -> Result<()> {
        let mut cursor = self.lock();
        self.clear_line_locked(session.prompt().width())?;
        cursor.line_terminated = true;
        self.terminal.write_error(&format!("{}\n", message))
    }

    /// Write a full line without touching the prompt
    pub fn write_line(&self, text: &str) -> Result<()> {
        let mut cursor = self.lock();
        cursor.line_terminated = true;
        self.terminal.write_raw(&format!("{}\n", text))
    }

    /// Write a full line to the error stream
    pub fn write_error_line(&self, text: &str) -> Result<()> {
        let mut cursor = self.lock();
        cursor.line_terminated = true;
        self.terminal.write_error(&format!("{}\n", text))
    }

    /// The user ended a line by pressing enter
    pub fn mark_line_terminated(&self) {
        self.lock().line_terminated = true;
    }
}
