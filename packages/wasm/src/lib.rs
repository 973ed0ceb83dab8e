use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::rc::Rc;

use serde::Serialize;
use wasm_bindgen::prelude::*;

use tradebook_editor::{
    BlockIdGenerator, ClipboardItem, ClipboardItemKind, Document, EditSession, EditorConfig,
    EditorError, KeyEvent, PasteOutcome, Rect, Size, TimerToken, ZoomExit,
};

mod summary;

pub use summary::{plain_text_summary, IMAGE_PLACEHOLDER};

#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
}

/// Timer the page must schedule with `setTimeout`
#[wasm_bindgen]
pub struct ScheduledTimer {
    handle: u32,
    delay_ms: u32,
}

#[wasm_bindgen]
impl ScheduledTimer {
    #[wasm_bindgen(getter)]
    pub fn handle(&self) -> u32 {
        self.handle
    }

    #[wasm_bindgen(getter, js_name = delayMs)]
    pub fn delay_ms(&self) -> u32 {
        self.delay_ms
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ZoomView<'a> {
    source: &'a str,
    x: f64,
    y: f64,
    width: f64,
    height: f64,
    backdrop_visible: bool,
}

/// Block editor bound to one documentation field of the trade form
///
/// Mutating calls return whether the browser's default action must be
/// prevented (or whether anything happened). After each call the form
/// polls `takeChange()` for the document JSON to hand to its `onChange`.
#[wasm_bindgen]
pub struct BlockEditor {
    session: EditSession,
    outbox: Rc<RefCell<Option<String>>>,
    timers: HashMap<u32, TimerToken>,
    unscheduled: VecDeque<ScheduledTimer>,
    next_handle: u32,
}

#[wasm_bindgen]
impl BlockEditor {
    /// Mount an editor, optionally seeded with a stored block array and a
    /// configuration object (both as JSON)
    #[wasm_bindgen(constructor)]
    pub fn new(initial: Option<String>, config: Option<String>) -> Result<BlockEditor, JsValue> {
        Self::mount(initial.as_deref(), config.as_deref())
            .map_err(|e| JsValue::from_str(&format!("Editor error: {}", e)))
    }

    /// Latest committed document JSON, if it changed since the last call
    #[wasm_bindgen(js_name = takeChange)]
    pub fn take_change(&mut self) -> Option<String> {
        self.outbox.borrow_mut().take()
    }

    #[wasm_bindgen(js_name = documentJson)]
    pub fn document_json(&self) -> Result<String, JsValue> {
        self.session
            .document()
            .to_json()
            .map_err(|e| JsValue::from_str(&format!("Serialization error: {}", e)))
    }

    /// Plain-text rendition stored next to the blocks
    pub fn summary(&self) -> String {
        plain_text_summary(self.session.document())
    }

    #[wasm_bindgen(js_name = blockKeyDown)]
    pub fn block_key_down(&mut self, index: usize, key: String, shift: bool) -> bool {
        let event = KeyEvent {
            key,
            shift,
            ..KeyEvent::default()
        };
        self.session.handle_block_key(index, &event).prevents_default()
    }

    #[wasm_bindgen(js_name = globalKeyDown)]
    pub fn global_key_down(&mut self, key: String, ctrl: bool, meta: bool, shift: bool) -> bool {
        let event = KeyEvent {
            key,
            ctrl,
            meta,
            shift,
        };
        self.session.handle_global_key(&event).prevents_default()
    }

    #[wasm_bindgen(js_name = updateBlock)]
    pub fn update_block(&mut self, index: usize, content: String) -> bool {
        self.session.update_block_content(index, content)
    }

    /// The "add block below" handle next to a block
    #[wasm_bindgen(js_name = addBlockBelow)]
    pub fn add_block_below(&mut self, index: usize) -> bool {
        self.session.split_or_advance(index).is_some()
    }

    #[wasm_bindgen(js_name = removeBlock)]
    pub fn remove_block(&mut self, index: usize) -> bool {
        self.session.remove_block(index)
    }

    #[wasm_bindgen(js_name = clickBelow)]
    pub fn click_below(&mut self) {
        self.session.click_below();
    }

    #[wasm_bindgen(js_name = setFocused)]
    pub fn set_focused(&mut self, index: usize) -> bool {
        self.session.set_focused(index)
    }

    /// Current position of the focused block, `undefined` when none
    #[wasm_bindgen(js_name = focusedIndex)]
    pub fn focused_index(&self) -> Option<usize> {
        self.session.focused()
    }

    /// Index of the block to focus after this render, if any
    #[wasm_bindgen(js_name = commitRender)]
    pub fn commit_render(&mut self) -> Option<usize> {
        self.session.commit_render()
    }

    pub fn undo(&mut self) -> bool {
        self.session.undo()
    }

    pub fn redo(&mut self) -> bool {
        self.session.redo()
    }

    #[wasm_bindgen(js_name = canUndo)]
    pub fn can_undo(&self) -> bool {
        self.session.can_undo()
    }

    #[wasm_bindgen(js_name = canRedo)]
    pub fn can_redo(&self) -> bool {
        self.session.can_redo()
    }

    /// Whether a clipboard item type is handled as an image
    ///
    /// The paste handler uses this to decide, synchronously, whether to
    /// prevent the default paste before reading the file.
    #[wasm_bindgen(js_name = isImageType)]
    pub fn is_image_type(mime: &str) -> bool {
        ClipboardItem::new(mime, Vec::new()).kind() == ClipboardItemKind::Image
    }

    /// Insert an image whose bytes the page has read from the clipboard
    ///
    /// `index` is the block that received the paste event.
    #[wasm_bindgen(js_name = pasteImage)]
    pub fn paste_image(&mut self, index: usize, mime: String, bytes: Vec<u8>) -> bool {
        let items = [ClipboardItem::new(mime, bytes)];
        match self.session.begin_paste(index, &items) {
            PasteOutcome::Pending(ticket) => {
                self.session.complete_paste(ticket.decode_now()).is_some()
            }
            PasteOutcome::NotHandled => false,
        }
    }

    #[wasm_bindgen(js_name = openZoom)]
    pub fn open_zoom(&mut self, index: usize, x: f64, y: f64, width: f64, height: f64) -> bool {
        self.session.open_zoom(index, Rect::new(x, y, width, height))
    }

    #[wasm_bindgen(js_name = imageLoaded)]
    pub fn image_loaded(&mut self, natural_width: f64, natural_height: f64) {
        self.session
            .image_loaded(Size::new(natural_width, natural_height));
    }

    /// Backdrop click
    #[wasm_bindgen(js_name = clickBackdrop)]
    pub fn click_backdrop(&mut self) -> bool {
        self.close(ZoomExit::Backdrop)
    }

    /// Click on the enlarged image
    #[wasm_bindgen(js_name = clickZoomedImage)]
    pub fn click_zoomed_image(&mut self) -> bool {
        self.close(ZoomExit::Image)
    }

    #[wasm_bindgen(js_name = onScroll)]
    pub fn on_scroll(&mut self) -> bool {
        self.session.on_scroll()
    }

    /// Next timer to schedule; poll after every call until it returns
    /// `undefined`
    #[wasm_bindgen(js_name = nextTimer)]
    pub fn next_timer(&mut self) -> Option<ScheduledTimer> {
        self.collect_timers();
        self.unscheduled.pop_front()
    }

    #[wasm_bindgen(js_name = fireTimer)]
    pub fn fire_timer(&mut self, handle: u32) -> bool {
        match self.timers.remove(&handle) {
            Some(token) => self.session.fire_timer(token),
            None => false,
        }
    }

    /// Overlay geometry as JSON, `undefined` when nothing is mounted
    #[wasm_bindgen(js_name = zoomFrame)]
    pub fn zoom_frame(&self, viewport_width: f64, viewport_height: f64) -> Option<String> {
        let frame = self
            .session
            .zoom_frame(Size::new(viewport_width, viewport_height))?;
        let view = ZoomView {
            source: frame.source,
            x: frame.rect.x,
            y: frame.rect.y,
            width: frame.rect.width,
            height: frame.rect.height,
            backdrop_visible: frame.backdrop_visible,
        };
        serde_json::to_string(&view).ok()
    }
}

impl BlockEditor {
    fn mount(initial: Option<&str>, config: Option<&str>) -> Result<Self, EditorError> {
        let config: EditorConfig = match config {
            Some(json) => serde_json::from_str(json)?,
            None => EditorConfig::default(),
        };

        let mut ids = BlockIdGenerator::new();
        let blocks = match initial {
            Some(json) => Document::from_json(json, &mut ids)?.into_blocks(),
            None => Vec::new(),
        };

        let outbox = Rc::new(RefCell::new(None));
        let sink = Rc::clone(&outbox);
        let session = EditSession::with_ids(config, blocks, ids).on_change(move |doc| {
            *sink.borrow_mut() = doc.to_json().ok();
        });

        Ok(Self {
            session,
            outbox,
            timers: HashMap::new(),
            unscheduled: VecDeque::new(),
            next_handle: 0,
        })
    }

    fn close(&mut self, exit: ZoomExit) -> bool {
        self.session.close_zoom(exit)
    }

    /// Hand out handles for timers the session requested since the last poll
    fn collect_timers(&mut self) {
        for request in self.session.take_timers() {
            let handle = self.next_handle;
            self.next_handle = self.next_handle.wrapping_add(1);
            self.timers.insert(handle, request.token);
            self.unscheduled.push_back(ScheduledTimer {
                handle,
                delay_ms: u32::try_from(request.delay.as_millis()).unwrap_or(u32::MAX),
            });
        }
    }
}
