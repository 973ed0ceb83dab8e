//! # Block Document
//!
//! The document model edited by the block editor.
//!
//! A Document is an ordered sequence of blocks in top-to-bottom reading
//! order. Each block is either text (a plain, possibly empty string) or an
//! image (an opaque reference such as a data URI or a resolved URL).
//!
//! ## Invariants
//!
//! - A document always holds at least one block
//! - Image content is never rewritten; an image block can only be removed
//! - Positions are contiguous: inserting shifts every later block right by one
//!
//! The serialized shape is the one stored with a trade:
//!
//! ```text
//! [
//!   { "id": "…-1", "type": "text",  "content": "Entry on the 15m FVG" },
//!   { "id": "…-2", "type": "image", "content": "data:image/png;base64,…" }
//! ]
//! ```

use serde::{Deserialize, Deserializer, Serialize};

use crate::EditorError;

/// Kind of content a block carries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlockKind {
    Text,
    Image,
}

/// Atomic unit of editor content
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    /// Identifier, stable for the block's lifetime
    pub id: String,

    #[serde(rename = "type")]
    pub kind: BlockKind,

    /// Text for text blocks, an opaque image reference for image blocks
    pub content: String,
}

impl Block {
    pub fn text(id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind: BlockKind::Text,
            content: content.into(),
        }
    }

    pub fn image(id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind: BlockKind::Image,
            content: content.into(),
        }
    }

    pub fn is_text(&self) -> bool {
        self.kind == BlockKind::Text
    }

    pub fn is_image(&self) -> bool {
        self.kind == BlockKind::Image
    }

    /// Text block whose content is empty or whitespace-only
    pub fn is_blank_text(&self) -> bool {
        self.is_text() && self.content.trim().is_empty()
    }
}

/// Ordered sequence of blocks
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Document {
    blocks: Vec<Block>,
}

/// Rejects an empty array; use [`Document::from_json`] to load stored
/// content that may be empty
impl<'de> Deserialize<'de> for Document {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let blocks = Vec::<Block>::deserialize(deserializer)?;
        if blocks.is_empty() {
            return Err(serde::de::Error::custom("a document holds at least one block"));
        }
        Ok(Self { blocks })
    }
}

impl Document {
    /// Document holding a single empty text block
    pub fn empty(ids: &mut BlockIdGenerator) -> Self {
        Self {
            blocks: vec![Block::text(ids.new_id(), "")],
        }
    }

    /// Seed a document from existing blocks
    ///
    /// An empty seed yields a single empty text block, so the result always
    /// satisfies the non-empty invariant.
    pub fn seeded(blocks: Vec<Block>, ids: &mut BlockIdGenerator) -> Self {
        if blocks.is_empty() {
            Self::empty(ids)
        } else {
            Self { blocks }
        }
    }

    /// Parse the stored JSON array of blocks
    pub fn from_json(json: &str, ids: &mut BlockIdGenerator) -> Result<Self, EditorError> {
        let blocks: Vec<Block> = serde_json::from_str(json)?;
        Ok(Self::seeded(blocks, ids))
    }

    pub fn to_json(&self) -> Result<String, EditorError> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn get(&self, index: usize) -> Option<&Block> {
        self.blocks.get(index)
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    /// Always false: every constructor yields at least one block
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn last_index(&self) -> usize {
        self.blocks.len().saturating_sub(1)
    }

    /// Indices of all text blocks, in order
    pub fn text_indices(&self) -> impl Iterator<Item = usize> + '_ {
        self.blocks
            .iter()
            .enumerate()
            .filter(|(_, block)| block.is_text())
            .map(|(index, _)| index)
    }

    pub fn into_blocks(self) -> Vec<Block> {
        self.blocks
    }

    pub(crate) fn blocks_mut(&mut self) -> &mut Vec<Block> {
        &mut self.blocks
    }
}

/// Generates block ids that are unique within the process
///
/// Each generator draws a random seed once and appends a sequential
/// counter, so two sessions never hand out the same id and a session never
/// reuses one.
#[derive(Debug, Clone)]
pub struct BlockIdGenerator {
    seed: String,
    count: u64,
}

impl BlockIdGenerator {
    pub fn new() -> Self {
        Self::from_seed(uuid::Uuid::new_v4().simple().to_string())
    }

    pub fn from_seed(seed: impl Into<String>) -> Self {
        Self {
            seed: seed.into(),
            count: 0,
        }
    }

    /// Generate next sequential id
    pub fn new_id(&mut self) -> String {
        self.count += 1;
        format!("{}-{}", self.seed, self.count)
    }

    pub fn seed(&self) -> &str {
        &self.seed
    }
}

impl Default for BlockIdGenerator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_document_has_one_text_block() {
        let mut ids = BlockIdGenerator::from_seed("doc");
        let doc = Document::empty(&mut ids);

        assert_eq!(doc.len(), 1);
        assert!(doc.blocks()[0].is_blank_text());
        assert_eq!(doc.blocks()[0].id, "doc-1");
    }

    #[test]
    fn test_empty_seed_falls_back_to_default() {
        let mut ids = BlockIdGenerator::from_seed("doc");
        let doc = Document::seeded(vec![], &mut ids);

        assert_eq!(doc.len(), 1);
        assert!(!doc.is_empty());
    }

    #[test]
    fn test_serialized_shape() {
        let mut ids = BlockIdGenerator::from_seed("doc");
        let doc = Document::seeded(
            vec![Block::text("a", "note"), Block::image("b", "data:image/png;base64,AA==")],
            &mut ids,
        );

        let value: serde_json::Value = serde_json::from_str(&doc.to_json().unwrap()).unwrap();
        assert_eq!(
            value,
            serde_json::json!([
                { "id": "a", "type": "text", "content": "note" },
                { "id": "b", "type": "image", "content": "data:image/png;base64,AA==" }
            ])
        );
    }

    #[test]
    fn test_from_json_rejects_unknown_block_type() {
        let mut ids = BlockIdGenerator::from_seed("doc");
        let result = Document::from_json(r#"[{"id":"a","type":"video","content":""}]"#, &mut ids);
        assert!(result.is_err());
    }

    #[test]
    fn test_from_json_empty_array() {
        let mut ids = BlockIdGenerator::from_seed("doc");
        let doc = Document::from_json("[]", &mut ids).unwrap();
        assert_eq!(doc.len(), 1);
    }

    #[test]
    fn test_deserialize_rejects_empty_document() {
        assert!(serde_json::from_str::<Document>("[]").is_err());

        let doc: Document =
            serde_json::from_str(r#"[{"id":"a","type":"text","content":"note"}]"#).unwrap();
        assert_eq!(doc.blocks(), &[Block::text("a", "note")]);
    }

    #[test]
    fn test_blank_text_detection() {
        assert!(Block::text("a", "  \n\t").is_blank_text());
        assert!(!Block::text("a", "x").is_blank_text());
        assert!(!Block::image("a", "").is_blank_text());
    }

    #[test]
    fn test_text_indices_skip_images() {
        let mut ids = BlockIdGenerator::from_seed("doc");
        let doc = Document::seeded(
            vec![Block::text("a", ""), Block::image("b", "img"), Block::text("c", "")],
            &mut ids,
        );
        assert_eq!(doc.text_indices().collect::<Vec<_>>(), vec![0, 2]);
    }

    #[test]
    fn test_sequential_ids() {
        let mut ids = BlockIdGenerator::from_seed("seed");

        assert_eq!(ids.new_id(), "seed-1");
        assert_eq!(ids.new_id(), "seed-2");
        assert_eq!(ids.seed(), "seed");
    }

    #[test]
    fn test_generators_do_not_collide() {
        let mut a = BlockIdGenerator::new();
        let mut b = BlockIdGenerator::new();
        assert_ne!(a.new_id(), b.new_id());
    }
}
