//! Session mode and prompt state
//!
//! Owned by the session controller and shared by reference with the
//! renderer, the input mediator and the notification pump.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

/// How input lines are handled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionMode {
    /// Each line is evaluated on its own and its value printed
    Normal,
    /// Lines accumulate into one fragment run by the feeder
    Block,
}

/// Prompt text shown before each read
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    text: String,
}

impl Prompt {
    /// `{user}@Cantus> `
    pub fn normal(user: &str) -> Self {
        Self {
            text: format!("{}@Cantus> ", user),
        }
    }

    /// Same width as `self`, dots then a space
    pub fn continuation(&self) -> Self {
        let width = self.width();
        let mut text = ".".repeat(width.saturating_sub(1));
        text.push(' ');
        Self { text }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Width in terminal cells
    pub fn width(&self) -> usize {
        self.text.chars().count()
    }
}

#[derive(Debug)]
struct View {
    mode: SessionMode,
    prompt: Prompt,
}

/// Mutable state of one console session
#[derive(Debug)]
pub struct SessionState {
    user: String,
    always_block: bool,
    exit_after_complete: bool,
    view: Mutex<View>,
    /// Set when something other than the read loop already printed the prompt
    prompted: AtomicBool,
}

impl SessionState {
    pub fn new(user: impl Into<String>, always_block: bool, exit_after_complete: bool) -> Self {
        let user = user.into();
        let prompt = Prompt::normal(&user);
        Self {
            user,
            always_block,
            exit_after_complete,
            view: Mutex::new(View {
                mode: Self::resting_mode(always_block),
                prompt,
            }),
            prompted: AtomicBool::new(false),
        }
    }

    fn resting_mode(always_block: bool) -> SessionMode {
        if always_block {
            SessionMode::Block
        } else {
            SessionMode::Normal
        }
    }

    fn view(&self) -> MutexGuard<'_, View> {
        self.view.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn user(&self) -> &str {
        &self.user
    }

    pub fn always_block(&self) -> bool {
        self.always_block
    }

    pub fn exit_after_complete(&self) -> bool {
        self.exit_after_complete
    }

    pub fn mode(&self) -> SessionMode {
        self.view().mode
    }

    pub fn prompt(&self) -> Prompt {
        self.view().prompt.clone()
    }

    /// A block-open marker was seen: switch to the continuation prompt
    pub fn enter_block(&self) {
        let mut view = self.view();
        view.mode = SessionMode::Block;
        view.prompt = Prompt::normal(&self.user).continuation();
    }

    /// A blank line closed the block. Forced block sessions keep their mode.
    pub fn leave_block(&self) {
        if self.always_block {
            return;
        }
        let mut view = self.view();
        view.mode = SessionMode::Normal;
        view.prompt = Prompt::normal(&self.user);
    }

    /// A block finished executing
    pub fn reset_after_completion(&self) {
        let mut view = self.view();
        view.mode = Self::resting_mode(self.always_block);
        view.prompt = Prompt::normal(&self.user);
    }

    pub fn is_prompted(&self) -> bool {
        self.prompted.load(Ordering::SeqCst)
    }

    pub fn set_prompted(&self, prompted: bool) {
        self.prompted.store(prompted, Ordering::SeqCst);
    }
}
