//! Terminal access
//!
//! Everything the console does to the screen and keyboard goes through the
//! [`Terminal`] trait so the cursor bookkeeping in [`Renderer`] and the
//! buffering in [`InputMediator`] can run against either the real console
//! ([`StdTerminal`]) or an in-memory screen ([`MemoryTerminal`]).

pub mod input;
pub mod memory;
pub mod renderer;
pub mod std_term;

pub use input::{InputMediator, LineBuffer};
pub use memory::MemoryTerminal;
pub use renderer::{RenderCursor, Renderer};
pub use std_term::StdTerminal;

use crate::error::Result;

/// Minimal terminal backend
///
/// Cursor movement is relative only. Asking a real console where its cursor
/// is means reading the answer back from stdin, which would compete with a
/// pending line read.
///
/// Implementations must be usable from the foreground loop and the feeder
/// worker alike; callers serialize access through the protocol, so
/// implementations only need interior mutability, not ordering guarantees.
pub trait Terminal: Send + Sync {
    /// Block for one line of input, without its terminator.
    /// `Ok(None)` means end of input.
    fn read_line(&self) -> Result<Option<String>>;

    /// Write text at the cursor
    fn write_raw(&self, text: &str) -> Result<()>;

    /// Write text to the error stream
    fn write_error(&self, text: &str) -> Result<()>;

    /// Move the cursor to a zero-based column of the current row
    fn move_to_column(&self, column: u16) -> Result<()>;

    /// Move the cursor up `rows` rows, keeping its column
    fn move_up(&self, rows: u16) -> Result<()>;

    /// Clear the whole visible buffer and home the cursor
    fn clear_screen(&self) -> Result<()>;

    /// Whether cursor positioning is available. When false, renderers fall
    /// back to plain sequential writes.
    fn supports_cursor(&self) -> bool;
}
