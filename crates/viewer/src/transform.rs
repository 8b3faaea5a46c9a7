use foundation::math::Vec2;
use gpu::ZoomTransform;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Who produced a broadcast.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BroadcastSource {
    Viewer(String),
    /// Seed for a newly mounted viewer; skips the pointer check.
    Init,
}

/// Viewport-independent transform shared between viewers.
///
/// `dx`, `dy` are the translation divided by half the sender's width and height.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransformBroadcast {
    pub k: f64,
    pub dx: f64,
    pub dy: f64,
    pub source: BroadcastSource,
}

impl TransformBroadcast {
    pub fn normalize(t: ZoomTransform, viewport: [f64; 2], source: BroadcastSource) -> Self {
        Self {
            k: t.k,
            dx: t.x / half(viewport[0]),
            dy: t.y / half(viewport[1]),
            source,
        }
    }

    pub fn denormalize(&self, viewport: [f64; 2]) -> ZoomTransform {
        ZoomTransform::new(self.dx * half(viewport[0]), self.dy * half(viewport[1]), self.k)
    }

    pub fn is_from(&self, viewer: &str) -> bool {
        matches!(&self.source, BroadcastSource::Viewer(name) if name == viewer)
    }

    pub fn reseeded(&self) -> Self {
        Self {
            source: BroadcastSource::Init,
            ..self.clone()
        }
    }
}

fn half(extent: f64) -> f64 {
    if extent > 0.0 { extent * 0.5 } else { 1.0 }
}

/// Screen-space rectangle of a viewer, in page pixels.
#[derive(Debug, Copy, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    pub fn contains(&self, p: Vec2) -> bool {
        p.x >= self.left
            && p.x <= self.left + self.width
            && p.y >= self.top
            && p.y <= self.top + self.height
    }

    /// Page coordinates to this rectangle's local frame.
    pub fn to_local(&self, p: Vec2) -> Vec2 {
        Vec2::new(p.x - self.left, p.y - self.top)
    }

    pub fn size(&self) -> [f64; 2] {
        [self.width, self.height]
    }
}

/// A pan/zoom gesture on one viewer, carrying the pointer that caused it.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct GestureEvent {
    pub transform: ZoomTransform,
    /// Pointer in page coordinates.
    pub pointer: Vec2,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum GestureKind {
    Zoom,
    Pan,
    Unchanged,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GestureOutcome {
    pub transform: ZoomTransform,
    pub kind: GestureKind,
    pub broadcast: Option<TransformBroadcast>,
}

/// Per-viewer pan/zoom state machine.
#[derive(Debug, Clone)]
pub struct TransformBroadcaster {
    viewer: String,
    min_scale: f64,
    enabled: bool,
    current: ZoomTransform,
}

impl TransformBroadcaster {
    pub fn new(viewer: impl Into<String>, min_scale: f64) -> Self {
        Self {
            viewer: viewer.into(),
            min_scale,
            enabled: true,
            current: ZoomTransform::IDENTITY,
        }
    }

    pub fn current(&self) -> ZoomTransform {
        self.current
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Gesture handling is switched off while a lasso is drawn.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub fn reset(&mut self) {
        self.current = ZoomTransform::IDENTITY;
    }

    fn clamp(&self, t: ZoomTransform) -> ZoomTransform {
        let k = if t.k.is_finite() { t.k.max(self.min_scale) } else { self.current.k };
        ZoomTransform::new(t.x, t.y, k)
    }

    /// Applies a local gesture. Returns `None` while disabled.
    ///
    /// The broadcast is withheld when viewers are dissociated and the pointer
    /// is outside `rect`.
    pub fn local_gesture(
        &mut self,
        event: GestureEvent,
        rect: Rect,
        dissociate: bool,
    ) -> Option<GestureOutcome> {
        if !self.enabled {
            return None;
        }
        let next = self.clamp(event.transform);
        let kind = if next.k != self.current.k {
            GestureKind::Zoom
        } else if next.x != self.current.x || next.y != self.current.y {
            GestureKind::Pan
        } else {
            GestureKind::Unchanged
        };
        self.current = next;

        let participates = !dissociate || rect.contains(event.pointer);
        let broadcast = if kind != GestureKind::Unchanged && participates {
            Some(TransformBroadcast::normalize(
                next,
                rect.size(),
                BroadcastSource::Viewer(self.viewer.clone()),
            ))
        } else {
            if !participates {
                debug!(viewer = %self.viewer, "broadcast withheld: dissociated");
            }
            None
        };
        Some(GestureOutcome {
            transform: next,
            kind,
            broadcast,
        })
    }

    /// Applies a sibling's broadcast; the result is never re-broadcast.
    pub fn remote(
        &mut self,
        broadcast: &TransformBroadcast,
        rect: Rect,
        pointer: Option<Vec2>,
        dissociate: bool,
    ) -> Option<ZoomTransform> {
        if broadcast.is_from(&self.viewer) {
            debug!(viewer = %self.viewer, "own broadcast ignored");
            return None;
        }
        let seeding = broadcast.source == BroadcastSource::Init;
        if dissociate && !seeding && !pointer.is_some_and(|p| rect.contains(p)) {
            debug!(viewer = %self.viewer, "remote transform skipped: dissociated");
            return None;
        }
        let next = self.clamp(broadcast.denormalize(rect.size()));
        self.current = next;
        Some(next)
    }
}
