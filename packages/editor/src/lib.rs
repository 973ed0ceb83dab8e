//! # Tradebook Editor
//!
//! Block-based content editor core used for "before/after" trade
//! documentation.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │ host: rendering, DOM events, timers         │
//! └─────────────────────────────────────────────┘
//!          ↓ keys / paste / clicks / timers
//! ┌─────────────────────────────────────────────┐
//! │ session: EditSession                        │
//! │  - document store + mutations               │
//! │  - undo stack (snapshot timeline)           │
//! │  - paste ingestion (async image decode)     │
//! │  - focus controller                         │
//! │  - zoom overlay state machine               │
//! └─────────────────────────────────────────────┘
//!          ↓ on every committed change
//! ┌─────────────────────────────────────────────┐
//! │ owning form: persists the block array       │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! ## Core Principles
//!
//! 1. **Copy-on-write document**: every change builds a new document and
//!    replaces the live one, so history snapshots are never aliased
//! 2. **Never empty**: a document always holds at least one block
//! 3. **Images are immutable**: image blocks are inserted and removed, never
//!    edited
//! 4. **Failures are absorbed**: bad indices, failed decodes and history
//!    boundaries are no-ops, never errors surfaced to the host
//!
//! ## Usage
//!
//! ```rust,ignore
//! use tradebook_editor::{decode_image, EditSession, EditorConfig, KeyEvent, PasteOutcome};
//!
//! let mut session = EditSession::new(EditorConfig::default())
//!     .on_change(|doc| save(doc.to_json().unwrap()));
//!
//! session.update_block_content(0, "Entry on the 15m FVG");
//! session.handle_block_key(0, &KeyEvent::new("Enter"));
//!
//! if let PasteOutcome::Pending(ticket) = session.begin_paste(1, &items) {
//!     let completion = decode_image(ticket).await;
//!     session.complete_paste(completion);
//! }
//!
//! session.undo();
//! ```

mod config;
mod document;
mod errors;
mod focus;
mod keymap;
mod listeners;
mod mutations;
mod paste;
mod session;
mod undo_stack;
mod zoom;

pub use config::{EditorConfig, ZoomConfig};
pub use document::{Block, BlockIdGenerator, BlockKind, Document};
pub use errors::EditorError;
pub use focus::FocusController;
pub use keymap::{
    resolve_block_key, resolve_global_key, BlockAction, GlobalAction, KeyEvent, KeyOutcome,
};
pub use listeners::{ListenerGuard, ListenerKind, ListenerRegistry};
pub use mutations::{Mutation, MutationError};
pub use paste::{
    decode_image, encode_data_uri, first_image, ClipboardItem, ClipboardItemKind,
    PasteCompletion, PasteError, PasteOutcome, PasteTicket,
};
pub use session::{ChangeListener, EditSession};
pub use undo_stack::{UndoStack, DEFAULT_HISTORY_CAPACITY};
pub use zoom::{
    fit_centered, Rect, Size, TimerKind, TimerRequest, TimerToken, ZoomExit, ZoomFrame,
    ZoomOverlay, ZoomPhase, ZoomTarget,
};
