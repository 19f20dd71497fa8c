//! In-memory terminal
//!
//! Emulates a screen of character cells with a cursor, echoes scripted input
//! the way a line-mode console does, and keeps separate transcripts of
//! everything written. Used by the test suites and by embedders that want to
//! drive a session without a real console.

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};

use super::Terminal;
use crate::error::Result;

#[derive(Debug, Default)]
struct Screen {
    rows: Vec<Vec<char>>,
    column: usize,
    row: usize,
    input: VecDeque<String>,
    output: String,
    errors: String,
    lines_read: usize,
    clears: usize,
}

impl Screen {
    fn put(&mut self, text: &str) {
        for c in text.chars() {
            match c {
                '\n' => {
                    self.row += 1;
                    self.column = 0;
                }
                '\r' => self.column = 0,
                c => {
                    while self.rows.len() <= self.row {
                        self.rows.push(Vec::new());
                    }
                    let line = &mut self.rows[self.row];
                    while line.len() <= self.column {
                        line.push(' ');
                    }
                    line[self.column] = c;
                    self.column += 1;
                }
            }
        }
    }
}

/// Scriptable terminal with an emulated screen
#[derive(Debug)]
pub struct MemoryTerminal {
    screen: Mutex<Screen>,
    cursor_control: bool,
}

impl Default for MemoryTerminal {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryTerminal {
    /// Terminal with cursor positioning
    pub fn new() -> Self {
        Self {
            screen: Mutex::new(Screen::default()),
            cursor_control: true,
        }
    }

    /// Terminal without cursor positioning, like a pipe
    pub fn plain() -> Self {
        Self {
            cursor_control: false,
            ..Self::new()
        }
    }

    /// Queue input lines; reads past the last one report end of input
    pub fn with_input<I, S>(self, lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for line in lines {
            self.push_input(line);
        }
        self
    }

    pub fn push_input(&self, line: impl Into<String>) {
        self.lock().input.push_back(line.into());
    }

    fn lock(&self) -> MutexGuard<'_, Screen> {
        self.screen.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Visible rows with trailing blanks removed
    pub fn screen(&self) -> Vec<String> {
        let screen = self.lock();
        let mut rows: Vec<String> = screen
            .rows
            .iter()
            .map(|row| row.iter().collect::<String>().trim_end().to_string())
            .collect();
        while rows.last().is_some_and(|row| row.is_empty()) {
            rows.pop();
        }
        rows
    }

    /// Everything written to the output stream, in order
    pub fn output(&self) -> String {
        self.lock().output.clone()
    }

    /// Everything written to the error stream, in order
    pub fn errors(&self) -> String {
        self.lock().errors.clone()
    }

    /// Input lines consumed so far
    pub fn lines_read(&self) -> usize {
        self.lock().lines_read
    }

    /// Input lines not yet consumed
    pub fn remaining_input(&self) -> usize {
        self.lock().input.len()
    }

    /// Zero-based (column, row) of the emulated cursor
    pub fn cursor_position(&self) -> (usize, usize) {
        let screen = self.lock();
        (screen.column, screen.row)
    }

    pub fn clear_count(&self) -> usize {
        self.lock().clears
    }
}

impl Terminal for MemoryTerminal {
    fn read_line(&self) -> Result<Option<String>> {
        let mut screen = self.lock();
        let line = screen.input.pop_front();
        if let Some(line) = &line {
            screen.lines_read += 1;
            let echo = format!("{}\n", line);
            screen.put(&echo);
        }
        Ok(line)
    }

    fn write_raw(&self, text: &str) -> Result<()> {
        let mut screen = self.lock();
        screen.output.push_str(text);
        screen.put(text);
        Ok(())
    }

    fn write_error(&self, text: &str) -> Result<()> {
        let mut screen = self.lock();
        screen.errors.push_str(text);
        screen.put(text);
        Ok(())
    }

    fn move_to_column(&self, column: u16) -> Result<()> {
        self.lock().column = column as usize;
        Ok(())
    }

    fn move_up(&self, rows: u16) -> Result<()> {
        let mut screen = self.lock();
        screen.row = screen.row.saturating_sub(rows as usize);
        Ok(())
    }

    fn clear_screen(&self) -> Result<()> {
        let mut screen = self.lock();
        screen.rows.clear();
        screen.column = 0;
        screen.row = 0;
        screen.clears += 1;
        Ok(())
    }

    fn supports_cursor(&self) -> bool {
        self.cursor_control
    }
}
