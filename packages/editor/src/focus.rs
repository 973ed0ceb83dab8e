//! # Focus Controller
//!
//! Keeps keyboard focus in step with structural edits.
//!
//! Only text blocks can hold focus. After an edit the block that should
//! receive focus may not be rendered yet, so focus moves are queued as a
//! single pending instruction and resolved by `commit_render` once the
//! host has rendered the new document. A later instruction overwrites an
//! earlier one that was never consumed.

use crate::Document;

#[derive(Debug, Clone, Default)]
pub struct FocusController {
    /// Block index to focus after the next render
    pending: Option<usize>,

    /// Id of the block currently holding focus
    ///
    /// Tracked by id so focus follows its block when edits or history
    /// restores shift positions.
    focused: Option<String>,
}

impl FocusController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue focus for the block at `index` once it is rendered
    pub fn request(&mut self, index: usize) {
        self.pending = Some(index);
    }

    pub fn pending(&self) -> Option<usize> {
        self.pending
    }

    /// Id of the focused block
    pub fn focused_id(&self) -> Option<&str> {
        self.focused.as_deref()
    }

    /// Current position of the focused block in `doc`
    pub fn focused(&self, doc: &Document) -> Option<usize> {
        let id = self.focused.as_deref()?;
        doc.blocks()
            .iter()
            .position(|block| block.id == id && block.is_text())
    }

    /// Record focus moved by the user (e.g. a click into a block)
    pub fn set_focused(&mut self, doc: &Document, index: usize) -> bool {
        if !is_focusable(doc, index) {
            return false;
        }
        self.focused = doc.get(index).map(|block| block.id.clone());
        true
    }

    pub fn blur(&mut self) {
        self.focused = None;
    }

    /// Consume the pending instruction after a render pass
    ///
    /// Returns the index that received focus. An instruction whose target
    /// no longer exists or is not a text block is dropped, and focus on a
    /// block that left the document is cleared.
    pub fn commit_render(&mut self, doc: &Document) -> Option<usize> {
        if self.focused.is_some() && self.focused(doc).is_none() {
            self.focused = None;
        }

        let target = self.pending.take()?;
        if !is_focusable(doc, target) {
            tracing::debug!(target, "dropping focus request for non-focusable block");
            return None;
        }
        self.focused = doc.get(target).map(|block| block.id.clone());
        Some(target)
    }

    /// Indices of blocks that carry a focus handle, in order
    pub fn handles(doc: &Document) -> Vec<usize> {
        doc.text_indices().collect()
    }

    /// Nearest text block at or before `index`
    pub fn nearest_text_at_or_before(doc: &Document, index: usize) -> Option<usize> {
        let upper = index.min(doc.last_index());
        (0..=upper).rev().find(|&i| is_focusable(doc, i))
    }
}

fn is_focusable(doc: &Document, index: usize) -> bool {
    doc.get(index).is_some_and(|block| block.is_text())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Block, BlockIdGenerator};

    fn doc(blocks: Vec<Block>) -> Document {
        Document::seeded(blocks, &mut BlockIdGenerator::from_seed("test"))
    }

    #[test]
    fn test_pending_focus_applies_after_render() {
        let d = doc(vec![Block::text("a", ""), Block::text("b", "")]);
        let mut focus = FocusController::new();

        focus.request(1);
        assert_eq!(focus.focused(&d), None);

        assert_eq!(focus.commit_render(&d), Some(1));
        assert_eq!(focus.focused(&d), Some(1));
        assert_eq!(focus.focused_id(), Some("b"));
        assert_eq!(focus.pending(), None);
    }

    #[test]
    fn test_request_for_image_is_dropped() {
        let d = doc(vec![Block::text("a", ""), Block::image("b", "img")]);
        let mut focus = FocusController::new();

        focus.request(1);
        assert_eq!(focus.commit_render(&d), None);
        assert_eq!(focus.focused(&d), None);
    }

    #[test]
    fn test_later_request_wins() {
        let d = doc(vec![Block::text("a", ""), Block::text("b", "")]);
        let mut focus = FocusController::new();

        focus.request(1);
        focus.request(0);
        assert_eq!(focus.commit_render(&d), Some(0));
    }

    #[test]
    fn test_stale_focus_cleared_on_render() {
        let mut focus = FocusController::new();
        let d = doc(vec![Block::text("a", ""), Block::text("b", "")]);
        assert!(focus.set_focused(&d, 1));

        let shrunk = doc(vec![Block::text("a", "")]);
        assert_eq!(focus.commit_render(&shrunk), None);
        assert_eq!(focus.focused(&shrunk), None);
        assert_eq!(focus.focused_id(), None);
    }

    #[test]
    fn test_focus_follows_block_when_positions_shift() {
        let mut focus = FocusController::new();
        let d = doc(vec![Block::text("a", ""), Block::text("b", "")]);
        assert!(focus.set_focused(&d, 1));

        let prepended = doc(vec![
            Block::text("z", ""),
            Block::text("a", ""),
            Block::text("b", ""),
        ]);
        assert_eq!(focus.commit_render(&prepended), None);
        assert_eq!(focus.focused(&prepended), Some(2));

        let first_removed = doc(vec![Block::text("b", "")]);
        assert_eq!(focus.focused(&first_removed), Some(0));
    }

    #[test]
    fn test_handles_only_for_text_blocks() {
        let d = doc(vec![
            Block::image("a", "img"),
            Block::text("b", ""),
            Block::image("c", "img"),
        ]);
        assert_eq!(FocusController::handles(&d), vec![1]);
    }

    #[test]
    fn test_nearest_text_walks_back_over_images() {
        let d = doc(vec![
            Block::text("a", ""),
            Block::image("b", "img"),
            Block::image("c", "img"),
        ]);
        assert_eq!(FocusController::nearest_text_at_or_before(&d, 2), Some(0));

        let images_first = doc(vec![Block::image("a", "img"), Block::text("b", "")]);
        assert_eq!(FocusController::nearest_text_at_or_before(&images_first, 0), None);
    }
}
