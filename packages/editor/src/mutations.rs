//! # Document Mutations
//!
//! The only legal ways to change a block document.
//!
//! ## Design Principles
//!
//! 1. **Index-addressed**: Every operation is relative to the block holding
//!    focus, so blocks are addressed by position rather than by id
//! 2. **Validated**: A mutation is checked in full before anything changes
//! 3. **Invariant-preserving**: No mutation can empty a document or rewrite
//!    an image
//!
//! ## Mutation Semantics
//!
//! ### InsertBlocks
//! - Inserts immediately after `after` (`None` prepends)
//! - Later blocks shift right by the number inserted
//!
//! ### UpdateContent
//! - Atomic replacement of a text block's content
//! - Rejected on image blocks
//!
//! ### ConvertToImage
//! - Turns a blank text block into an image block, keeping its id
//!
//! ### ReplaceBlock
//! - Swaps a block for another one at the same position
//! - The replacement must carry a new id, so an image can only be replaced
//!   wholesale, never edited
//!
//! ### RemoveBlock
//! - Deletes one block
//! - Rejected when it is the last block left

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::document::{Block, BlockKind, Document};

/// Structural operations on a block document
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Mutation {
    /// Insert blocks after a position (`None` = at the top)
    InsertBlocks {
        after: Option<usize>,
        blocks: Vec<Block>,
    },

    /// Replace the content of a text block
    UpdateContent {
        index: usize,
        content: String,
    },

    /// Turn a blank text block into an image block
    ConvertToImage {
        index: usize,
        content: String,
    },

    /// Swap the block at a position for a new one
    ReplaceBlock {
        index: usize,
        block: Block,
    },

    /// Remove a block
    RemoveBlock {
        index: usize,
    },
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MutationError {
    #[error("Index {index} out of range for document of {len} blocks")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("Block {0} is an image and cannot be edited")]
    ImmutableImage(usize),

    #[error("Cannot remove the only block of a document")]
    WouldEmptyDocument,

    #[error("Block {0} is not a blank text block")]
    NotBlank(usize),

    #[error("Nothing to insert")]
    EmptyInsert,

    #[error("Replacement for block {0} reuses its id")]
    ReusedId(usize),
}

impl Mutation {
    /// Apply mutation to a document with validation
    pub fn apply(&self, doc: &mut Document) -> Result<(), MutationError> {
        self.validate(doc)?;

        let blocks = doc.blocks_mut();
        match self {
            Mutation::InsertBlocks { after, blocks: new_blocks } => {
                let at = after.map_or(0, |after| after + 1);
                blocks.splice(at..at, new_blocks.iter().cloned());
            }

            Mutation::UpdateContent { index, content } => {
                blocks[*index].content = content.clone();
            }

            Mutation::ConvertToImage { index, content } => {
                let block = &mut blocks[*index];
                block.kind = BlockKind::Image;
                block.content = content.clone();
            }

            Mutation::ReplaceBlock { index, block } => {
                blocks[*index] = block.clone();
            }

            Mutation::RemoveBlock { index } => {
                blocks.remove(*index);
            }
        }

        Ok(())
    }

    /// Check that this mutation can be applied to the document
    pub fn validate(&self, doc: &Document) -> Result<(), MutationError> {
        match self {
            Mutation::InsertBlocks { after, blocks } => {
                if blocks.is_empty() {
                    return Err(MutationError::EmptyInsert);
                }
                if let Some(after) = after {
                    check_index(doc, *after)?;
                }
                Ok(())
            }

            Mutation::UpdateContent { index, .. } => {
                let block = check_index(doc, *index)?;
                if block.is_image() {
                    return Err(MutationError::ImmutableImage(*index));
                }
                Ok(())
            }

            Mutation::ConvertToImage { index, .. } => {
                let block = check_index(doc, *index)?;
                if !block.is_blank_text() {
                    return Err(MutationError::NotBlank(*index));
                }
                Ok(())
            }

            Mutation::ReplaceBlock { index, block } => {
                let current = check_index(doc, *index)?;
                if current.id == block.id {
                    return Err(MutationError::ReusedId(*index));
                }
                Ok(())
            }

            Mutation::RemoveBlock { index } => {
                check_index(doc, *index)?;
                if doc.len() == 1 {
                    return Err(MutationError::WouldEmptyDocument);
                }
                Ok(())
            }
        }
    }

    /// Debug name for logging
    pub fn name(&self) -> &'static str {
        match self {
            Mutation::InsertBlocks { .. } => "InsertBlocks",
            Mutation::UpdateContent { .. } => "UpdateContent",
            Mutation::ConvertToImage { .. } => "ConvertToImage",
            Mutation::ReplaceBlock { .. } => "ReplaceBlock",
            Mutation::RemoveBlock { .. } => "RemoveBlock",
        }
    }
}

fn check_index(doc: &Document, index: usize) -> Result<&Block, MutationError> {
    doc.get(index).ok_or(MutationError::IndexOutOfRange {
        index,
        len: doc.len(),
    })
}
