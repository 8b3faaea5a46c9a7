use tracing::debug;

use crate::frame::Frame;

/// What a scheduled paint must do.
///
/// `Relayout` supersedes `Repaint` when both are requested in one frame.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum PaintKind {
    /// Redraw with existing layout (pan, tint change).
    Repaint,
    /// Recompute screen-space layout before drawing (zoom, resize, new points).
    Relayout,
}

/// Coalesces paint requests so that at most one paint runs per frame.
#[derive(Debug, Default, Clone)]
pub struct PaintScheduler {
    pending: Option<PaintKind>,
    last_frame: Option<u64>,
    coalesced: u64,
}

impl PaintScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedules a paint; returns `true` if none was pending before.
    pub fn request(&mut self, kind: PaintKind) -> bool {
        match self.pending {
            None => {
                self.pending = Some(kind);
                true
            }
            Some(prev) => {
                self.coalesced += 1;
                self.pending = Some(prev.max(kind));
                debug!(?prev, ?kind, "paint coalesced");
                false
            }
        }
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn pending(&self) -> Option<PaintKind> {
        self.pending
    }

    /// Takes the pending paint for `frame`.
    ///
    /// A second call within the same frame returns `None` and leaves any new
    /// request pending for the next frame.
    pub fn take(&mut self, frame: Frame) -> Option<PaintKind> {
        if self.last_frame == Some(frame.index) {
            return None;
        }
        let kind = self.pending.take()?;
        self.last_frame = Some(frame.index);
        Some(kind)
    }

    /// Drops any pending paint.
    pub fn cancel(&mut self) {
        self.pending = None;
    }

    /// Requests folded into an already pending paint.
    pub fn coalesced_count(&self) -> u64 {
        self.coalesced
    }
}
