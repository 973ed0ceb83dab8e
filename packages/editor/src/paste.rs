//! # Paste Ingestion
//!
//! Turns a clipboard paste into image blocks without blocking the editor.
//!
//! ## Flow
//!
//! ```text
//! paste event ──→ classify ──→ PasteTicket ──→ decode_image ──→ complete_paste
//!   (sync)        first image    (target index      (async,          (sync, applies
//!                 item only       captured now)      blocking pool)   insertion policy)
//! ```
//!
//! Only the first image item of a paste is ingested. Text items are left to
//! the default text input behaviour. While a ticket is being decoded the
//! editor stays fully interactive; the image lands relative to the index
//! captured when the paste was observed.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Coarse classification of a clipboard item
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClipboardItemKind {
    Text,
    Image,
    Other,
}

/// One entry of a paste event's clipboard data
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClipboardItem {
    /// MIME type, e.g. `image/png` or `text/plain`
    pub mime: String,

    /// Raw payload; empty when the item could not be read as a file
    #[serde(default)]
    pub data: Vec<u8>,
}

impl ClipboardItem {
    pub fn new(mime: impl Into<String>, data: impl Into<Vec<u8>>) -> Self {
        Self {
            mime: mime.into(),
            data: data.into(),
        }
    }

    pub fn kind(&self) -> ClipboardItemKind {
        if self.mime.contains("image") {
            ClipboardItemKind::Image
        } else if self.mime.starts_with("text") {
            ClipboardItemKind::Text
        } else {
            ClipboardItemKind::Other
        }
    }
}

/// Image payload waiting to be decoded
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PasteTicket {
    pub id: u64,

    /// Index of the block that received the paste
    pub target: usize,

    pub mime: String,
    pub data: Vec<u8>,
}

/// Result of decoding one ticket, handed back to the session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PasteCompletion {
    pub ticket: u64,
    pub target: usize,

    /// Self-contained content token (a data URI) on success
    pub result: Result<String, PasteError>,
}

/// Outcome of offering a paste event to the editor
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PasteOutcome {
    /// No image in the clipboard; default paste proceeds
    NotHandled,

    /// An image was found; default paste must be prevented
    Pending(PasteTicket),
}

impl PasteOutcome {
    pub fn prevents_default(&self) -> bool {
        matches!(self, PasteOutcome::Pending(_))
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PasteError {
    #[error("Clipboard item {0} carries no data")]
    EmptyPayload(u64),

    #[error("Unsupported clipboard type: {0}")]
    UnsupportedType(String),

    #[error("Image decode was aborted: {0}")]
    DecodeAborted(String),
}

/// Find the first image item of a paste event
pub fn first_image(items: &[ClipboardItem]) -> Option<&ClipboardItem> {
    items
        .iter()
        .find(|item| item.kind() == ClipboardItemKind::Image)
}

/// Encode an image payload as a `data:` URI
pub fn encode_data_uri(mime: &str, data: &[u8]) -> Result<String, PasteError> {
    if !mime.contains("image") {
        return Err(PasteError::UnsupportedType(mime.to_string()));
    }
    Ok(format!("data:{};base64,{}", mime, STANDARD.encode(data)))
}

impl PasteTicket {
    /// Decode synchronously, for hosts that already read the payload
    /// asynchronously
    pub fn decode_now(self) -> PasteCompletion {
        let result = if self.data.is_empty() {
            Err(PasteError::EmptyPayload(self.id))
        } else {
            encode_data_uri(&self.mime, &self.data)
        };

        PasteCompletion {
            ticket: self.id,
            target: self.target,
            result,
        }
    }
}

/// Decode a ticket's payload off the calling task
///
/// Must be awaited inside a tokio runtime.
pub async fn decode_image(ticket: PasteTicket) -> PasteCompletion {
    let (id, target) = (ticket.id, ticket.target);

    match tokio::task::spawn_blocking(move || ticket.decode_now()).await {
        Ok(completion) => completion,
        Err(e) => PasteCompletion {
            ticket: id,
            target,
            result: Err(PasteError::DecodeAborted(e.to_string())),
        },
    }
}
