use tradebook_editor::{BlockKind, Document};

/// Token standing in for an image in plain-text summaries
pub const IMAGE_PLACEHOLDER: &str = "[Image]";

/// Plain-text rendition of a document for list views and search
///
/// Text blocks are joined by newlines and images become a placeholder.
/// Blank text blocks are skipped.
pub fn plain_text_summary(doc: &Document) -> String {
    doc.blocks()
        .iter()
        .filter_map(|block| match block.kind {
            BlockKind::Text if block.content.trim().is_empty() => None,
            BlockKind::Text => Some(block.content.as_str()),
            BlockKind::Image => Some(IMAGE_PLACEHOLDER),
        })
        .collect::<Vec<_>>()
        .join("\n")
}
