//! Replay script format
//!
//! ```json
//! {
//!   "initial": [{ "id": "a", "type": "text", "content": "Plan" }],
//!   "viewport": { "width": 1280, "height": 800 },
//!   "events": [
//!     { "type": "input", "index": 0, "content": "Plan: short the sweep" },
//!     { "type": "keyDown", "index": 0, "key": "Enter" },
//!     { "type": "pasteImage", "index": 1, "path": "chart.png" },
//!     { "type": "globalKey", "key": "z", "ctrl": true }
//!   ]
//! }
//! ```

use serde::Deserialize;
use std::path::{Path, PathBuf};
use tradebook_editor::{Block, BlockKind, Rect, Size};

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplayScript {
    /// Stored blocks to seed the session with
    #[serde(default)]
    pub initial: Vec<Block>,

    /// Viewport used to lay out the zoom overlay
    #[serde(default = "default_viewport")]
    pub viewport: Size,

    pub events: Vec<ReplayEvent>,
}

fn default_viewport() -> Size {
    Size::new(1280.0, 800.0)
}

impl ReplayScript {
    pub fn parse(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}

/// One host interaction
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ReplayEvent {
    /// Key pressed inside the block at `index`
    KeyDown {
        index: usize,
        key: String,
        #[serde(default)]
        shift: bool,
    },

    /// Key captured at window level
    GlobalKey {
        key: String,
        #[serde(default)]
        ctrl: bool,
        #[serde(default)]
        meta: bool,
        #[serde(default)]
        shift: bool,
    },

    /// Text typed into a block
    Input { index: usize, content: String },

    /// Block inserted after `after`, or at the front
    Insert {
        #[serde(default)]
        after: Option<usize>,
        kind: BlockKind,
        #[serde(default)]
        content: String,
    },

    Remove { index: usize },

    /// Image file pasted into the block at `index`
    PasteImage {
        index: usize,
        path: PathBuf,
        /// Inferred from the file extension when omitted
        #[serde(default)]
        mime: Option<String>,
    },

    ClickBelow,

    /// Thumbnail of the image block at `index` clicked
    OpenZoom { index: usize, origin: Rect },

    /// Natural size of the enlarged image
    ImageLoaded { width: f64, height: f64 },

    Scroll,

    /// Overlay dismissed by a click
    CloseZoom {
        #[serde(default)]
        on: CloseTarget,
    },

    /// Fire every scheduled timer, including ones scheduled while firing
    FlushTimers,

    Undo,

    Redo,
}

/// What was clicked to dismiss the overlay
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CloseTarget {
    #[default]
    Backdrop,
    Image,
}

impl ReplayEvent {
    pub fn name(&self) -> &'static str {
        match self {
            ReplayEvent::KeyDown { .. } => "keyDown",
            ReplayEvent::GlobalKey { .. } => "globalKey",
            ReplayEvent::Input { .. } => "input",
            ReplayEvent::Insert { .. } => "insert",
            ReplayEvent::Remove { .. } => "remove",
            ReplayEvent::PasteImage { .. } => "pasteImage",
            ReplayEvent::ClickBelow => "clickBelow",
            ReplayEvent::OpenZoom { .. } => "openZoom",
            ReplayEvent::ImageLoaded { .. } => "imageLoaded",
            ReplayEvent::Scroll => "scroll",
            ReplayEvent::CloseZoom { .. } => "closeZoom",
            ReplayEvent::FlushTimers => "flushTimers",
            ReplayEvent::Undo => "undo",
            ReplayEvent::Redo => "redo",
        }
    }
}

/// Mime type for an image file, from its extension
pub fn image_mime_for(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    match ext.as_str() {
        "png" => Some("image/png"),
        "jpg" | "jpeg" => Some("image/jpeg"),
        "gif" => Some("image/gif"),
        "webp" => Some("image/webp"),
        "svg" => Some("image/svg+xml"),
        _ => None,
    }
}
