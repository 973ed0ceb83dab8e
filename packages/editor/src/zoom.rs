//! # Image Zoom Overlay
//!
//! Presents one image enlarged over the page with an animated transition
//! from the thumbnail's on-screen rectangle.
//!
//! ## Lifecycle
//!
//! ```text
//!            open            reveal timer
//! Closed ─────────→ Opening ─────────────→ Open
//!   ↑                  │                    │
//!   │ unmount timer    │ close              │ close (backdrop, image,
//!   │                  ↓                    │        Escape, scroll)
//!   └───────────── Closing ←────────────────┘
//! ```
//!
//! Transitions that wait use single-shot timers. Each scheduled timer
//! carries the generation it was issued in; any state change bumps the
//! generation, so a timer that fires late (a reveal after a close, an
//! unmount after a reopen) is recognised as stale and ignored.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::config::ZoomConfig;
use crate::listeners::{ListenerGuard, ListenerKind, ListenerRegistry};

/// Screen rectangle in CSS pixels
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self { x, y, width, height }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    fn is_drawable(&self) -> bool {
        self.width.is_finite() && self.height.is_finite() && self.width > 0.0 && self.height > 0.0
    }
}

/// Largest rectangle with the image's aspect ratio that fits inside
/// `fraction` of the viewport on both axes, centered in the viewport
///
/// Returns `None` when either size has no area.
pub fn fit_centered(viewport: Size, natural: Size, fraction: f64) -> Option<Rect> {
    if !viewport.is_drawable() || !natural.is_drawable() {
        return None;
    }

    let max_width = viewport.width * fraction;
    let max_height = viewport.height * fraction;
    let ratio = natural.width / natural.height;

    let mut width = max_width;
    let mut height = width / ratio;
    if height > max_height {
        height = max_height;
        width = height * ratio;
    }

    Some(Rect {
        x: (viewport.width - width) / 2.0,
        y: (viewport.height - height) / 2.0,
        width,
        height,
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ZoomPhase {
    #[default]
    Closed,
    /// Mounted at the thumbnail's geometry, waiting for the reveal timer
    Opening,
    /// Showing the enlarged image
    Open,
    /// Animating back to the thumbnail, waiting for the unmount timer
    Closing,
}

/// What dismissed the overlay
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZoomExit {
    Backdrop,
    Image,
    Escape,
    Scroll,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerKind {
    /// Start the zoom-in transition
    Reveal,
    /// Unmount after the zoom-out transition
    Unmount,
}

/// Identifies one scheduled timer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerToken {
    generation: u64,
    kind: TimerKind,
}

impl TimerToken {
    pub fn kind(&self) -> TimerKind {
        self.kind
    }
}

/// Single-shot timer the host must schedule
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerRequest {
    pub token: TimerToken,
    pub delay: Duration,
}

/// Image currently shown by the overlay
#[derive(Debug, Clone, PartialEq)]
pub struct ZoomTarget {
    pub source: String,
    /// Thumbnail rectangle when the zoom was triggered
    pub origin: Rect,
    /// Natural pixel size, known once the image has loaded
    pub natural: Option<Size>,
}

/// What to render for the overlay
#[derive(Debug, Clone, PartialEq)]
pub struct ZoomFrame<'a> {
    pub source: &'a str,
    pub rect: Rect,
    pub backdrop_visible: bool,
}

#[derive(Debug)]
pub struct ZoomOverlay {
    config: ZoomConfig,
    phase: ZoomPhase,
    target: Option<ZoomTarget>,
    generation: u64,
    listeners: ListenerRegistry,
    scroll_listener: Option<ListenerGuard>,
}

impl ZoomOverlay {
    pub fn new(config: ZoomConfig, listeners: ListenerRegistry) -> Self {
        Self {
            config,
            phase: ZoomPhase::Closed,
            target: None,
            generation: 0,
            listeners,
            scroll_listener: None,
        }
    }

    pub fn phase(&self) -> ZoomPhase {
        self.phase
    }

    pub fn target(&self) -> Option<&ZoomTarget> {
        self.target.as_ref()
    }

    /// Overlay is mounted (any phase but `Closed`)
    pub fn is_mounted(&self) -> bool {
        self.phase != ZoomPhase::Closed
    }

    /// Overlay shows the enlarged geometry
    pub fn is_zoomed(&self) -> bool {
        self.phase == ZoomPhase::Open
    }

    /// Overlay is opening or open and owns `Escape`
    pub fn is_active(&self) -> bool {
        matches!(self.phase, ZoomPhase::Opening | ZoomPhase::Open)
    }

    /// Mount the overlay over the thumbnail at `origin`
    ///
    /// Ignored while the overlay is already opening or open. Opening during
    /// `Closing` takes over; the pending unmount becomes stale.
    pub fn open(&mut self, source: impl Into<String>, origin: Rect) -> Option<TimerRequest> {
        if self.is_active() {
            tracing::debug!(phase = ?self.phase, "zoom already active, ignoring open");
            return None;
        }

        self.target = Some(ZoomTarget {
            source: source.into(),
            origin,
            natural: None,
        });
        self.phase = ZoomPhase::Opening;
        if self.scroll_listener.is_none() {
            self.scroll_listener = Some(self.listeners.install(ListenerKind::Scroll));
        }

        Some(self.schedule(TimerKind::Reveal, self.config.open_delay()))
    }

    /// Start the reverse transition
    pub fn close(&mut self, exit: ZoomExit) -> Option<TimerRequest> {
        if !self.is_active() {
            return None;
        }

        tracing::debug!(?exit, "closing zoom overlay");
        self.phase = ZoomPhase::Closing;
        self.scroll_listener = None;

        Some(self.schedule(TimerKind::Unmount, self.config.close_duration()))
    }

    /// Page scrolled; closes the overlay if it is listening
    pub fn on_scroll(&mut self) -> Option<TimerRequest> {
        if !self.listeners.is_installed(ListenerKind::Scroll) {
            return None;
        }
        self.close(ZoomExit::Scroll)
    }

    /// Record the natural size once the enlarged image has loaded
    pub fn image_loaded(&mut self, natural: Size) {
        if let Some(target) = &mut self.target {
            target.natural = Some(natural);
        }
    }

    /// A timer scheduled by this overlay fired
    ///
    /// Returns true when it caused a transition.
    pub fn fire(&mut self, token: TimerToken) -> bool {
        if token.generation != self.generation {
            tracing::debug!(kind = ?token.kind, "ignoring stale zoom timer");
            return false;
        }

        match (token.kind, self.phase) {
            (TimerKind::Reveal, ZoomPhase::Opening) => {
                self.phase = ZoomPhase::Open;
                true
            }
            (TimerKind::Unmount, ZoomPhase::Closing) => {
                self.phase = ZoomPhase::Closed;
                self.target = None;
                true
            }
            _ => false,
        }
    }

    /// Geometry to render for the current phase
    ///
    /// Until the enlarged image's natural size is known the overlay stays
    /// at the thumbnail's rectangle.
    pub fn frame(&self, viewport: Size) -> Option<ZoomFrame<'_>> {
        let target = self.target.as_ref()?;

        let rect = match (self.phase, target.natural) {
            (ZoomPhase::Open, Some(natural)) => {
                fit_centered(viewport, natural, self.config.viewport_fraction)
                    .unwrap_or(target.origin)
            }
            _ => target.origin,
        };

        Some(ZoomFrame {
            source: &target.source,
            rect,
            backdrop_visible: self.phase == ZoomPhase::Open,
        })
    }

    fn schedule(&mut self, kind: TimerKind, delay: Duration) -> TimerRequest {
        self.generation += 1;
        TimerRequest {
            token: TimerToken {
                generation: self.generation,
                kind,
            },
            delay,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn overlay() -> (ZoomOverlay, ListenerRegistry) {
        let listeners = ListenerRegistry::new();
        (ZoomOverlay::new(ZoomConfig::default(), listeners.clone()), listeners)
    }

    fn thumb() -> Rect {
        Rect::new(40.0, 300.0, 200.0, 100.0)
    }

    #[test]
    fn test_fit_wide_image_is_width_bound() {
        let rect = fit_centered(Size::new(1000.0, 800.0), Size::new(2000.0, 1000.0), 0.9).unwrap();

        assert_eq!(rect.width, 900.0);
        assert_eq!(rect.height, 450.0);
        assert_eq!(rect.x, 50.0);
        assert_eq!(rect.y, 175.0);
    }

    #[test]
    fn test_fit_tall_image_is_height_bound() {
        let rect = fit_centered(Size::new(1000.0, 500.0), Size::new(400.0, 800.0), 0.9).unwrap();

        assert_eq!(rect.height, 450.0);
        assert_eq!(rect.width, 225.0);
        assert_eq!(rect.x, 387.5);
        assert_eq!(rect.y, 25.0);
    }

    #[test]
    fn test_fit_rejects_degenerate_sizes() {
        assert_eq!(fit_centered(Size::new(1000.0, 500.0), Size::new(0.0, 800.0), 0.9), None);
        assert_eq!(fit_centered(Size::new(0.0, 0.0), Size::new(10.0, 10.0), 0.9), None);
    }

    #[test]
    fn test_open_then_reveal() {
        let (mut zoom, _) = overlay();

        let reveal = zoom.open("img", thumb()).unwrap();
        assert_eq!(zoom.phase(), ZoomPhase::Opening);
        assert_eq!(reveal.token.kind(), TimerKind::Reveal);
        assert_eq!(reveal.delay, Duration::from_millis(10));

        assert!(zoom.fire(reveal.token));
        assert!(zoom.is_zoomed());
    }

    #[test]
    fn test_close_then_unmount() {
        let (mut zoom, _) = overlay();
        let reveal = zoom.open("img", thumb()).unwrap();
        zoom.fire(reveal.token);

        let unmount = zoom.close(ZoomExit::Backdrop).unwrap();
        assert_eq!(zoom.phase(), ZoomPhase::Closing);
        assert_eq!(unmount.delay, Duration::from_millis(300));
        assert!(zoom.is_mounted());

        assert!(zoom.fire(unmount.token));
        assert_eq!(zoom.phase(), ZoomPhase::Closed);
        assert!(zoom.target().is_none());
    }

    #[test]
    fn test_late_reveal_does_not_reopen() {
        let (mut zoom, _) = overlay();
        let reveal = zoom.open("img", thumb()).unwrap();
        let unmount = zoom.close(ZoomExit::Escape).unwrap();

        assert!(!zoom.fire(reveal.token));
        assert_eq!(zoom.phase(), ZoomPhase::Closing);

        assert!(zoom.fire(unmount.token));
        assert!(!zoom.fire(reveal.token));
        assert_eq!(zoom.phase(), ZoomPhase::Closed);
    }

    #[test]
    fn test_reopen_during_close_survives_old_unmount() {
        let (mut zoom, _) = overlay();
        let reveal = zoom.open("a", thumb()).unwrap();
        zoom.fire(reveal.token);
        let unmount = zoom.close(ZoomExit::Image).unwrap();

        let reveal = zoom.open("b", thumb()).unwrap();
        assert!(!zoom.fire(unmount.token));
        assert!(zoom.fire(reveal.token));
        assert_eq!(zoom.target().unwrap().source, "b");
    }

    #[test]
    fn test_open_ignored_while_active() {
        let (mut zoom, _) = overlay();
        zoom.open("a", thumb()).unwrap();
        assert!(zoom.open("b", thumb()).is_none());
        assert_eq!(zoom.target().unwrap().source, "a");
    }

    #[test]
    fn test_close_when_closed_is_noop() {
        let (mut zoom, _) = overlay();
        assert!(zoom.close(ZoomExit::Backdrop).is_none());
        assert!(zoom.on_scroll().is_none());
    }

    #[test]
    fn test_scroll_listener_scoped_to_active_overlay() {
        let (mut zoom, listeners) = overlay();
        assert!(!listeners.is_installed(ListenerKind::Scroll));

        zoom.open("img", thumb()).unwrap();
        assert!(listeners.is_installed(ListenerKind::Scroll));

        let unmount = zoom.on_scroll().unwrap();
        assert_eq!(unmount.token.kind(), TimerKind::Unmount);
        assert!(!listeners.is_installed(ListenerKind::Scroll));
    }

    #[test]
    fn test_frame_follows_phase() {
        let (mut zoom, _) = overlay();
        let viewport = Size::new(1000.0, 800.0);
        assert!(zoom.frame(viewport).is_none());

        let reveal = zoom.open("img", thumb()).unwrap();
        let frame = zoom.frame(viewport).unwrap();
        assert_eq!(frame.rect, thumb());
        assert!(!frame.backdrop_visible);

        zoom.fire(reveal.token);
        assert_eq!(zoom.frame(viewport).unwrap().rect, thumb());

        zoom.image_loaded(Size::new(2000.0, 1000.0));
        let frame = zoom.frame(viewport).unwrap();
        assert_eq!(frame.rect, Rect::new(50.0, 175.0, 900.0, 450.0));
        assert!(frame.backdrop_visible);

        zoom.close(ZoomExit::Backdrop);
        assert_eq!(zoom.frame(viewport).unwrap().rect, thumb());
    }
}
