//! Drives an editor session from a replay script
//!
//! Events are applied in order. Rejected interactions (bad indices,
//! suppressed keys) are no-ops in the session and are only logged here.
//! Timers are queued and fire only on `flushTimers`, so a script controls
//! exactly when transitions happen.

use anyhow::{anyhow, Context, Result};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use tradebook_editor::{
    decode_image, ClipboardItem, Document, EditSession, EditorConfig, KeyEvent, PasteOutcome,
    Rect, Size, TimerRequest, ZoomExit,
};

use crate::script::{image_mime_for, CloseTarget, ReplayEvent, ReplayScript};

/// Upper bound on timers fired by one `flushTimers`
const MAX_TIMERS_PER_FLUSH: usize = 64;

/// State of the session after the last event
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplayReport<'a> {
    pub document: &'a Document,
    pub can_undo: bool,
    pub can_redo: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub zoom: Option<ZoomSnapshot>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ZoomSnapshot {
    pub source: String,
    pub rect: Rect,
    pub backdrop_visible: bool,
}

pub struct Replayer {
    session: EditSession,
    viewport: Size,
    /// Directory image paths are resolved against
    base_dir: PathBuf,
    timers: Vec<TimerRequest>,
    changes: usize,
}

impl Replayer {
    pub fn new(config: EditorConfig, script: &ReplayScript, base_dir: impl Into<PathBuf>) -> Self {
        Self {
            session: EditSession::with_content(config, script.initial.clone()),
            viewport: script.viewport,
            base_dir: base_dir.into(),
            timers: Vec::new(),
            changes: 0,
        }
    }

    pub fn session(&self) -> &EditSession {
        &self.session
    }

    /// Number of events that changed something
    pub fn changes(&self) -> usize {
        self.changes
    }

    pub async fn run(&mut self, events: &[ReplayEvent]) -> Result<()> {
        for (step, event) in events.iter().enumerate() {
            let changed = self
                .apply(event)
                .await
                .with_context(|| format!("event #{} ({})", step, event.name()))?;
            self.collect_timers();

            if changed {
                self.changes += 1;
            }
            debug!(step, event = event.name(), changed, "replayed event");
        }

        info!(
            events = events.len(),
            changes = self.changes,
            blocks = self.session.document().len(),
            "replay finished"
        );
        Ok(())
    }

    pub async fn apply(&mut self, event: &ReplayEvent) -> Result<bool> {
        let s = &mut self.session;

        let changed = match event {
            ReplayEvent::KeyDown { index, key, shift } => {
                let mut event = KeyEvent::new(key.as_str());
                event.shift = *shift;
                s.handle_block_key(*index, &event).prevents_default()
            }
            ReplayEvent::GlobalKey {
                key,
                ctrl,
                meta,
                shift,
            } => {
                let event = KeyEvent {
                    key: key.clone(),
                    ctrl: *ctrl,
                    meta: *meta,
                    shift: *shift,
                };
                s.handle_global_key(&event).prevents_default()
            }
            ReplayEvent::Input { index, content } => {
                s.update_block_content(*index, content.as_str())
            }
            ReplayEvent::Insert {
                after,
                kind,
                content,
            } => s.insert_block(*after, *kind, content.as_str()).is_some(),
            ReplayEvent::Remove { index } => s.remove_block(*index),
            ReplayEvent::PasteImage { index, path, mime } => {
                self.paste_image(*index, path, mime.as_deref()).await?
            }
            ReplayEvent::ClickBelow => s.click_below().is_some(),
            ReplayEvent::OpenZoom { index, origin } => s.open_zoom(*index, *origin),
            ReplayEvent::ImageLoaded { width, height } => {
                s.image_loaded(Size::new(*width, *height));
                true
            }
            ReplayEvent::Scroll => s.on_scroll(),
            ReplayEvent::CloseZoom { on } => s.close_zoom(match on {
                CloseTarget::Backdrop => ZoomExit::Backdrop,
                CloseTarget::Image => ZoomExit::Image,
            }),
            ReplayEvent::FlushTimers => self.flush_timers()? > 0,
            ReplayEvent::Undo => s.undo(),
            ReplayEvent::Redo => s.redo(),
        };

        Ok(changed)
    }

    async fn paste_image(&mut self, index: usize, path: &Path, mime: Option<&str>) -> Result<bool> {
        let path = self.base_dir.join(path);
        let mime = match mime {
            Some(mime) => mime.to_string(),
            None => image_mime_for(&path)
                .ok_or_else(|| anyhow!("Cannot infer image type of {}", path.display()))?
                .to_string(),
        };
        let bytes = tokio::fs::read(&path)
            .await
            .with_context(|| format!("Cannot read {}", path.display()))?;

        let items = [ClipboardItem::new(mime, bytes)];
        let ticket = match self.session.begin_paste(index, &items) {
            PasteOutcome::Pending(ticket) => ticket,
            PasteOutcome::NotHandled => return Ok(false),
        };

        let completion = decode_image(ticket).await;
        Ok(self.session.complete_paste(completion).is_some())
    }

    fn collect_timers(&mut self) {
        self.timers.extend(self.session.take_timers());
    }

    /// Fire queued timers shortest delay first until none are left
    fn flush_timers(&mut self) -> Result<usize> {
        let mut fired = 0;

        while !self.timers.is_empty() {
            if fired >= MAX_TIMERS_PER_FLUSH {
                return Err(anyhow!("timers kept rescheduling after {} firings", fired));
            }

            self.timers.sort_by_key(|timer| timer.delay);
            let timer = self.timers.remove(0);
            if self.session.fire_timer(timer.token) {
                fired += 1;
            }
            self.collect_timers();
        }

        Ok(fired)
    }

    pub fn report(&self) -> ReplayReport<'_> {
        let zoom = self.session.zoom_frame(self.viewport).map(|frame| ZoomSnapshot {
            source: frame.source.to_string(),
            rect: frame.rect,
            backdrop_visible: frame.backdrop_visible,
        });

        ReplayReport {
            document: self.session.document(),
            can_undo: self.session.can_undo(),
            can_redo: self.session.can_redo(),
            zoom,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use tradebook_editor::{Block, BlockKind, ZoomPhase};

    fn replayer(json: &str, dir: &Path) -> (Replayer, ReplayScript) {
        let script = ReplayScript::parse(json).unwrap();
        (Replayer::new(EditorConfig::default(), &script, dir), script)
    }

    #[tokio::test]
    async fn test_typing_and_undo() {
        let dir = TempDir::new().unwrap();
        let (mut r, script) = replayer(
            r#"{ "events": [
                { "type": "input", "index": 0, "content": "Bias: bearish" },
                { "type": "keyDown", "index": 0, "key": "Enter" },
                { "type": "input", "index": 1, "content": "Wait for NY" },
                { "type": "globalKey", "key": "z", "ctrl": true }
            ] }"#,
            dir.path(),
        );

        r.run(&script.events).await.unwrap();

        let doc = r.session().document();
        assert_eq!(doc.len(), 2);
        assert_eq!(doc.blocks()[0].content, "Bias: bearish");
        assert_eq!(doc.blocks()[1].content, "");
        assert!(r.session().can_redo());
        assert_eq!(r.changes(), 4);
    }

    #[tokio::test]
    async fn test_out_of_range_events_are_absorbed() {
        let dir = TempDir::new().unwrap();
        let (mut r, script) = replayer(
            r#"{ "events": [
                { "type": "input", "index": 7, "content": "lost" },
                { "type": "remove", "index": 3 },
                { "type": "undo" }
            ] }"#,
            dir.path(),
        );

        r.run(&script.events).await.unwrap();
        assert_eq!(r.changes(), 0);
        assert_eq!(r.session().document().len(), 1);
    }

    #[tokio::test]
    async fn test_paste_image_from_file() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("chart.png"), [0x89, b'P', b'N', b'G']).unwrap();

        let (mut r, script) = replayer(
            r#"{
                "initial": [{ "id": "a", "type": "text", "content": "" }],
                "events": [{ "type": "pasteImage", "index": 0, "path": "chart.png" }]
            }"#,
            dir.path(),
        );

        r.run(&script.events).await.unwrap();

        let blocks = r.session().document().blocks();
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0].kind, BlockKind::Image);
        assert!(blocks[0].content.starts_with("data:image/png;base64,"));
        assert!(blocks[1].is_blank_text());
    }

    #[tokio::test]
    async fn test_paste_of_missing_file_fails_with_context() {
        let dir = TempDir::new().unwrap();
        let (mut r, script) = replayer(
            r#"{ "events": [{ "type": "pasteImage", "index": 0, "path": "gone.png" }] }"#,
            dir.path(),
        );

        let err = r.run(&script.events).await.unwrap_err();
        assert!(format!("{:#}", err).contains("pasteImage"));
    }

    #[tokio::test]
    async fn test_zoom_lifecycle_with_flush() {
        let dir = TempDir::new().unwrap();
        let (mut r, script) = replayer(
            r#"{
                "initial": [{ "id": "a", "type": "image", "content": "img" }],
                "viewport": { "width": 1000, "height": 500 },
                "events": [
                    {
                        "type": "openZoom",
                        "index": 0,
                        "origin": { "x": 10, "y": 20, "width": 100, "height": 50 }
                    },
                    { "type": "imageLoaded", "width": 200, "height": 100 },
                    { "type": "flushTimers" }
                ]
            }"#,
            dir.path(),
        );

        r.run(&script.events).await.unwrap();
        assert_eq!(r.session().zoom().phase(), ZoomPhase::Open);

        let report = r.report();
        let zoom = report.zoom.unwrap();
        assert!(zoom.backdrop_visible);
        assert_eq!(zoom.rect, Rect::new(50.0, 25.0, 900.0, 450.0));

        r.apply(&ReplayEvent::Scroll).await.unwrap();
        r.collect_timers();
        assert_eq!(r.flush_timers().unwrap(), 1);
        assert!(r.report().zoom.is_none());
    }

    #[tokio::test]
    async fn test_report_serializes_document() {
        let dir = TempDir::new().unwrap();
        let (r, _) = replayer(
            r#"{ "initial": [{ "id": "a", "type": "text", "content": "Plan" }], "events": [] }"#,
            dir.path(),
        );

        let json = serde_json::to_value(r.report()).unwrap();
        assert_eq!(
            json["document"],
            serde_json::to_value(vec![Block::text("a", "Plan")]).unwrap()
        );
        assert_eq!(json["canUndo"], false);
        assert!(json.get("zoom").is_none());
    }
}
