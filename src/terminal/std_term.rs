//! Process console backed by crossterm

use std::io::{self, BufRead, IsTerminal, Write};

use crossterm::cursor::{MoveTo, MoveToColumn, MoveUp};
use crossterm::terminal::{Clear, ClearType};
use crossterm::{execute, queue};

use super::Terminal;
use crate::error::{Error, Result};

/// The process's stdin/stdout/stderr
#[derive(Debug)]
pub struct StdTerminal {
    interactive: bool,
}

impl StdTerminal {
    pub fn new() -> Self {
        let interactive = io::stdout().is_terminal() && io::stdin().is_terminal();
        debug!("Standard terminal, cursor control: {}", interactive);
        Self { interactive }
    }
}

impl Default for StdTerminal {
    fn default() -> Self {
        Self::new()
    }
}

fn write_failed(e: io::Error) -> Error {
    Error::TerminalWriteFailed {
        reason: e.to_string(),
    }
}

impl Terminal for StdTerminal {
    fn read_line(&self) -> Result<Option<String>> {
        let mut line = String::new();
        let read = io::stdin().lock().read_line(&mut line)?;
        if read == 0 {
            return Ok(None);
        }
        while line.ends_with('\n') || line.ends_with('\r') {
            line.pop();
        }
        Ok(Some(line))
    }

    fn write_raw(&self, text: &str) -> Result<()> {
        let mut out = io::stdout().lock();
        out.write_all(text.as_bytes()).map_err(write_failed)?;
        out.flush().map_err(write_failed)
    }

    fn write_error(&self, text: &str) -> Result<()> {
        let mut err = io::stderr().lock();
        err.write_all(text.as_bytes()).map_err(write_failed)?;
        err.flush().map_err(write_failed)
    }

    fn move_to_column(&self, column: u16) -> Result<()> {
        if !self.interactive {
            return Ok(());
        }
        execute!(io::stdout(), MoveToColumn(column)).map_err(write_failed)
    }

    fn move_up(&self, rows: u16) -> Result<()> {
        // MoveUp(0) still moves one row
        if !self.interactive || rows == 0 {
            return Ok(());
        }
        execute!(io::stdout(), MoveUp(rows)).map_err(write_failed)
    }

    fn clear_screen(&self) -> Result<()> {
        if !self.interactive {
            return Ok(());
        }
        let mut out = io::stdout();
        queue!(out, Clear(ClearType::All), Clear(ClearType::Purge), MoveTo(0, 0))
            .map_err(write_failed)?;
        out.flush().map_err(write_failed)
    }

    fn supports_cursor(&self) -> bool {
        self.interactive
    }
}
