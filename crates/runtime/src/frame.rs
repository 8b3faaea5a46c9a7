use foundation::time::Time;

/// Refresh rate assumed by [`Frame::display`].
pub const DISPLAY_HZ: f64 = 60.0;

/// One display refresh as seen by the paint scheduler.
///
/// Paints are keyed by `index`; `time` only feeds logs and instrumentation.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Frame {
    pub index: u64,
    /// Seconds between refreshes.
    pub interval_s: f64,
    /// Start of this refresh, counted from frame 0.
    pub time: Time,
}

impl Frame {
    pub fn new(index: u64, interval_s: f64) -> Self {
        Self {
            index,
            interval_s,
            time: Time(index as f64 * interval_s),
        }
    }

    /// Frame `index` of a display refreshing at [`DISPLAY_HZ`].
    pub fn display(index: u64) -> Self {
        Self::new(index, 1.0 / DISPLAY_HZ)
    }

    pub fn next(self) -> Self {
        Self::new(self.index + 1, self.interval_s)
    }

    pub fn is_after(self, other: Frame) -> bool {
        self.index > other.index
    }
}
