//! # Key Bindings
//!
//! Maps DOM-style key events onto editor actions.
//!
//! Block-level bindings apply to the text block holding focus:
//! - `Enter` (no shift) commits the block and opens a new one below
//! - `Backspace` on an empty block merges it away
//!
//! Global bindings are captured at window level:
//! - `Ctrl/Cmd+Z` undo
//! - `Ctrl/Cmd+Shift+Z` and `Ctrl/Cmd+Y` redo
//! - `Escape` closes the zoom overlay

use serde::{Deserialize, Serialize};

/// A key press, shaped like a DOM `KeyboardEvent`
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyEvent {
    /// `KeyboardEvent.key` value, e.g. `"Enter"`, `"z"`, `"Escape"`
    pub key: String,
    #[serde(default)]
    pub ctrl: bool,
    #[serde(default)]
    pub meta: bool,
    #[serde(default)]
    pub shift: bool,
}

impl KeyEvent {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            ..Self::default()
        }
    }

    pub fn with_ctrl(mut self) -> Self {
        self.ctrl = true;
        self
    }

    pub fn with_meta(mut self) -> Self {
        self.meta = true;
        self
    }

    pub fn with_shift(mut self) -> Self {
        self.shift = true;
        self
    }

    /// Ctrl on most platforms, Cmd on macOS
    fn command(&self) -> bool {
        self.ctrl || self.meta
    }

    fn is_letter(&self, letter: char) -> bool {
        let mut chars = self.key.chars();
        matches!((chars.next(), chars.next()), (Some(c), None) if c.eq_ignore_ascii_case(&letter))
    }
}

/// Action bound to a key inside a text block
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockAction {
    /// Open a new block below the current one
    Commit,
    /// Remove the current block if it is empty
    MergeBackspace,
}

/// Action bound to a window-level key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GlobalAction {
    Undo,
    Redo,
    CloseZoom,
}

/// Resolve a key pressed inside a text block
pub fn resolve_block_key(event: &KeyEvent) -> Option<BlockAction> {
    match event.key.as_str() {
        "Enter" if !event.shift => Some(BlockAction::Commit),
        "Backspace" => Some(BlockAction::MergeBackspace),
        _ => None,
    }
}

/// Resolve a key captured at window level
pub fn resolve_global_key(event: &KeyEvent) -> Option<GlobalAction> {
    if event.key == "Escape" {
        return Some(GlobalAction::CloseZoom);
    }
    if !event.command() {
        return None;
    }
    if event.is_letter('z') {
        return Some(if event.shift {
            GlobalAction::Redo
        } else {
            GlobalAction::Undo
        });
    }
    if event.is_letter('y') {
        return Some(GlobalAction::Redo);
    }
    None
}

/// Result of offering a key event to the editor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyOutcome {
    /// The editor acted; the default browser action must be prevented
    Handled,
    /// Not ours; let the default action run
    Ignored,
}

impl KeyOutcome {
    pub fn prevents_default(self) -> bool {
        self == KeyOutcome::Handled
    }
}
