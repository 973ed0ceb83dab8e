//! # Edit Session
//!
//! One mounted block editor: the live document plus everything that reacts
//! to it.
//!
//! An EditSession owns the document and is the only producer of mutations.
//! Every committed change replaces the document wholesale, is observed by
//! the undo stack and is handed to the owning form through the change
//! callback, which is the only persistence path.
//!
//! All entry points (keys, paste, clicks, timers) run to completion. The one
//! asynchronous gap is image decoding: `begin_paste` hands out a ticket,
//! the host decodes it with [`decode_image`](crate::decode_image), and
//! `complete_paste` inserts the result. The session stays usable meanwhile.

use std::collections::{HashSet, VecDeque};

use crate::config::EditorConfig;
use crate::document::{Block, BlockIdGenerator, BlockKind, Document};
use crate::focus::FocusController;
use crate::keymap::{
    resolve_block_key, resolve_global_key, BlockAction, GlobalAction, KeyEvent, KeyOutcome,
};
use crate::listeners::{ListenerGuard, ListenerKind, ListenerRegistry};
use crate::mutations::Mutation;
use crate::paste::{first_image, ClipboardItem, PasteCompletion, PasteOutcome, PasteTicket};
use crate::undo_stack::UndoStack;
use crate::zoom::{Rect, Size, TimerRequest, TimerToken, ZoomExit, ZoomFrame, ZoomOverlay};

/// Callback receiving the document after every committed change
pub type ChangeListener = Box<dyn FnMut(&Document)>;

pub struct EditSession {
    document: Document,
    ids: BlockIdGenerator,
    history: UndoStack,
    focus: FocusController,
    zoom: ZoomOverlay,
    listeners: ListenerRegistry,
    _keydown: ListenerGuard,

    /// Paste tickets handed out and not yet completed
    pending_pastes: HashSet<u64>,
    next_ticket: u64,

    /// Timers the host still has to schedule
    timers: VecDeque<TimerRequest>,

    on_change: Option<ChangeListener>,
}

impl EditSession {
    /// Mount an editor holding a single empty text block
    pub fn new(config: EditorConfig) -> Self {
        Self::with_content(config, Vec::new())
    }

    /// Mount an editor seeded with existing blocks
    pub fn with_content(config: EditorConfig, initial: Vec<Block>) -> Self {
        Self::with_ids(config, initial, BlockIdGenerator::new())
    }

    /// Mount with an explicit id generator
    pub fn with_ids(config: EditorConfig, initial: Vec<Block>, mut ids: BlockIdGenerator) -> Self {
        let document = Document::seeded(initial, &mut ids);

        let mut history = UndoStack::with_capacity(config.history_capacity);
        history.observe(&document);

        let listeners = ListenerRegistry::new();
        let keydown = listeners.install(ListenerKind::KeyDown);
        let zoom = ZoomOverlay::new(config.zoom.clone(), listeners.clone());

        Self {
            document,
            ids,
            history,
            focus: FocusController::new(),
            zoom,
            listeners,
            _keydown: keydown,
            pending_pastes: HashSet::new(),
            next_ticket: 0,
            timers: VecDeque::new(),
            on_change: None,
        }
    }

    /// Register the change callback
    pub fn on_change(mut self, listener: impl FnMut(&Document) + 'static) -> Self {
        self.set_on_change(listener);
        self
    }

    pub fn set_on_change(&mut self, listener: impl FnMut(&Document) + 'static) {
        self.on_change = Some(Box::new(listener));
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn history(&self) -> &UndoStack {
        &self.history
    }

    pub fn focus(&self) -> &FocusController {
        &self.focus
    }

    pub fn zoom(&self) -> &ZoomOverlay {
        &self.zoom
    }

    /// Window listeners held by this session
    pub fn listeners(&self) -> ListenerRegistry {
        self.listeners.clone()
    }

    // ---- document store ----

    /// Insert a block after `after` (`None` prepends)
    ///
    /// Returns the new block's index. Text blocks receive focus on the next
    /// render.
    pub fn insert_block(
        &mut self,
        after: Option<usize>,
        kind: BlockKind,
        content: impl Into<String>,
    ) -> Option<usize> {
        let block = Block {
            id: self.ids.new_id(),
            kind,
            content: content.into(),
        };
        let index = after.map_or(0, |after| after + 1);

        if !self.commit(vec![Mutation::InsertBlocks {
            after,
            blocks: vec![block],
        }]) {
            return None;
        }

        if kind == BlockKind::Text {
            self.focus.request(index);
        }
        Some(index)
    }

    /// Replace the content of a text block
    pub fn update_block_content(&mut self, index: usize, content: impl Into<String>) -> bool {
        self.commit(vec![Mutation::UpdateContent {
            index,
            content: content.into(),
        }])
    }

    /// Commit key: open a new empty text block below `index`
    ///
    /// The content of `index` is left as it is.
    pub fn split_or_advance(&mut self, index: usize) -> Option<usize> {
        self.insert_block(Some(index), BlockKind::Text, "")
    }

    /// Remove the block at `index`
    ///
    /// The sole block of a document is never removed: a text block is
    /// cleared instead, an image block is replaced by an empty text block.
    /// Otherwise focus moves to the nearest text block at or before
    /// `index - 1`.
    pub fn remove_block(&mut self, index: usize) -> bool {
        let Some(block) = self.document.get(index) else {
            tracing::debug!(index, len = self.document.len(), "remove_block out of range");
            return false;
        };

        if self.document.len() == 1 {
            let mutation = if block.is_text() {
                Mutation::UpdateContent {
                    index,
                    content: String::new(),
                }
            } else {
                Mutation::ReplaceBlock {
                    index,
                    block: Block::text(self.ids.new_id(), ""),
                }
            };
            let changed = self.commit(vec![mutation]);
            if changed {
                self.focus.request(index);
            }
            return changed;
        }

        if !self.commit(vec![Mutation::RemoveBlock { index }]) {
            return false;
        }

        if let Some(target) =
            FocusController::nearest_text_at_or_before(&self.document, index.saturating_sub(1))
        {
            self.focus.request(target);
        }
        true
    }

    /// Backspace in an empty text block while other blocks exist
    pub fn merge_backspace(&mut self, index: usize) -> bool {
        let guard = self
            .document
            .get(index)
            .is_some_and(|block| block.is_text() && block.content.is_empty())
            && self.document.len() > 1;

        if !guard {
            return false;
        }
        self.remove_block(index)
    }

    /// Click in the empty area below the last block
    ///
    /// Focuses the last block if it is text, otherwise appends a text block.
    pub fn click_below(&mut self) -> Option<usize> {
        let last = self.document.last_index();
        if self.document.get(last).is_some_and(|block| block.is_text()) {
            self.focus.request(last);
            return Some(last);
        }
        self.insert_block(Some(last), BlockKind::Text, "")
    }

    // ---- keyboard ----

    /// Key pressed inside the text block at `index`
    pub fn handle_block_key(&mut self, index: usize, event: &KeyEvent) -> KeyOutcome {
        let handled = match resolve_block_key(event) {
            Some(BlockAction::Commit) => self.split_or_advance(index).is_some(),
            Some(BlockAction::MergeBackspace) => self.merge_backspace(index),
            None => false,
        };

        if handled {
            KeyOutcome::Handled
        } else {
            KeyOutcome::Ignored
        }
    }

    /// Key captured at window level
    ///
    /// While the zoom overlay is opening or open it owns `Escape` and the
    /// undo/redo bindings are suppressed.
    pub fn handle_global_key(&mut self, event: &KeyEvent) -> KeyOutcome {
        match resolve_global_key(event) {
            Some(GlobalAction::CloseZoom) if self.zoom.is_active() => {
                self.close_zoom(ZoomExit::Escape);
                KeyOutcome::Handled
            }
            Some(GlobalAction::Undo) if !self.zoom.is_active() => {
                self.undo();
                KeyOutcome::Handled
            }
            Some(GlobalAction::Redo) if !self.zoom.is_active() => {
                self.redo();
                KeyOutcome::Handled
            }
            _ => KeyOutcome::Ignored,
        }
    }

    // ---- history ----

    pub fn undo(&mut self) -> bool {
        match self.history.undo() {
            Some(restored) => {
                self.replace_document(restored);
                true
            }
            None => false,
        }
    }

    pub fn redo(&mut self) -> bool {
        match self.history.redo() {
            Some(restored) => {
                self.replace_document(restored);
                true
            }
            None => false,
        }
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    // ---- focus ----

    /// User moved focus into the block at `index`
    pub fn set_focused(&mut self, index: usize) -> bool {
        self.focus.set_focused(&self.document, index)
    }

    /// Position of the block holding focus, following it across edits
    pub fn focused(&self) -> Option<usize> {
        self.focus.focused(&self.document)
    }

    /// Host finished rendering; resolve any pending focus move
    pub fn commit_render(&mut self) -> Option<usize> {
        self.focus.commit_render(&self.document)
    }

    // ---- paste ----

    /// Paste event on the block at `index`
    ///
    /// When the clipboard holds an image a ticket is returned for decoding
    /// and the default paste must be prevented.
    pub fn begin_paste(&mut self, index: usize, items: &[ClipboardItem]) -> PasteOutcome {
        let Some(image) = first_image(items) else {
            return PasteOutcome::NotHandled;
        };
        if self.document.get(index).is_none() {
            tracing::debug!(index, "paste on unknown block ignored");
            return PasteOutcome::NotHandled;
        }

        self.next_ticket += 1;
        let ticket = PasteTicket {
            id: self.next_ticket,
            target: index,
            mime: image.mime.clone(),
            data: image.data.clone(),
        };
        self.pending_pastes.insert(ticket.id);
        tracing::debug!(ticket = ticket.id, index, mime = %ticket.mime, "image paste pending");

        PasteOutcome::Pending(ticket)
    }

    /// Insert a decoded image
    ///
    /// A blank text block at the target is converted in place and followed
    /// by a new empty text block. Otherwise an image block and an empty
    /// text block are inserted after the target. Returns the image block's
    /// index; failed decodes and targets that no longer exist are dropped.
    pub fn complete_paste(&mut self, completion: PasteCompletion) -> Option<usize> {
        if !self.pending_pastes.remove(&completion.ticket) {
            tracing::debug!(ticket = completion.ticket, "unknown paste ticket ignored");
            return None;
        }

        let content = match completion.result {
            Ok(content) => content,
            Err(e) => {
                tracing::warn!(ticket = completion.ticket, error = %e, "dropping pasted image");
                return None;
            }
        };

        let target = completion.target;
        let Some(block) = self.document.get(target) else {
            tracing::warn!(
                ticket = completion.ticket,
                target,
                len = self.document.len(),
                "paste target no longer exists"
            );
            return None;
        };

        let trailing = Block::text(self.ids.new_id(), "");
        let (mutations, image_index) = if block.is_blank_text() {
            (
                vec![
                    Mutation::ConvertToImage { index: target, content },
                    Mutation::InsertBlocks {
                        after: Some(target),
                        blocks: vec![trailing],
                    },
                ],
                target,
            )
        } else {
            let image = Block::image(self.ids.new_id(), content);
            (
                vec![Mutation::InsertBlocks {
                    after: Some(target),
                    blocks: vec![image, trailing],
                }],
                target + 1,
            )
        };

        if !self.commit(mutations) {
            return None;
        }
        self.focus.request(image_index + 1);
        Some(image_index)
    }

    /// Number of pastes still being decoded
    pub fn pending_pastes(&self) -> usize {
        self.pending_pastes.len()
    }

    // ---- zoom ----

    /// Click on the image block at `index`, whose thumbnail is at `origin`
    pub fn open_zoom(&mut self, index: usize, origin: Rect) -> bool {
        let Some(block) = self.document.get(index).filter(|block| block.is_image()) else {
            return false;
        };
        let source = block.content.clone();

        match self.zoom.open(source, origin) {
            Some(timer) => {
                self.timers.push_back(timer);
                true
            }
            None => false,
        }
    }

    /// Enlarged image finished loading
    pub fn image_loaded(&mut self, natural: Size) {
        self.zoom.image_loaded(natural);
    }

    /// Backdrop or enlarged image clicked, or `Escape` pressed
    pub fn close_zoom(&mut self, exit: ZoomExit) -> bool {
        match self.zoom.close(exit) {
            Some(timer) => {
                self.timers.push_back(timer);
                true
            }
            None => false,
        }
    }

    /// Page scrolled
    pub fn on_scroll(&mut self) -> bool {
        match self.zoom.on_scroll() {
            Some(timer) => {
                self.timers.push_back(timer);
                true
            }
            None => false,
        }
    }

    /// A timer handed out by `take_timers` fired
    pub fn fire_timer(&mut self, token: TimerToken) -> bool {
        self.zoom.fire(token)
    }

    /// Drain the timers the host must schedule
    pub fn take_timers(&mut self) -> Vec<TimerRequest> {
        self.timers.drain(..).collect()
    }

    pub fn zoom_frame(&self, viewport: Size) -> Option<ZoomFrame<'_>> {
        self.zoom.frame(viewport)
    }

    // ---- internals ----

    /// Apply mutations to a copy of the document, all or nothing
    ///
    /// Rejected mutations and changes that leave the document as it was
    /// commit nothing.
    fn commit(&mut self, mutations: Vec<Mutation>) -> bool {
        let mut next = self.document.clone();
        for mutation in &mutations {
            if let Err(e) = mutation.apply(&mut next) {
                tracing::debug!(mutation = mutation.name(), error = %e, "mutation rejected");
                return false;
            }
        }

        if next == self.document {
            return false;
        }

        tracing::trace!(
            mutations = mutations.len(),
            blocks = next.len(),
            "committing document change"
        );
        self.replace_document(next);
        true
    }

    fn replace_document(&mut self, next: Document) {
        self.document = next;
        self.history.observe(&self.document);
        if let Some(listener) = self.on_change.as_mut() {
            listener(&self.document);
        }
    }
}
