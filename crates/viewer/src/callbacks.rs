use crate::config::CustomScale;

/// A domain error surfaced to the user without touching render state.
#[derive(Debug, Clone, PartialEq)]
pub struct Alert {
    pub viewer: String,
    pub message: String,
}

/// Hooks into the surrounding UI. Every method defaults to a no-op.
pub trait ViewerCallbacks {
    fn on_legend_changed(&mut self, _viewer: &str, _legend: &serde_json::Value) {}

    fn on_scale_changed(&mut self, _viewer: &str, _scale: &CustomScale) {}

    fn on_alert(&mut self, _alert: Alert) {}

    /// `false` once a request fails to reach the data source, `true` on the next reply.
    fn on_connectivity(&mut self, _connected: bool) {}
}

/// Callbacks that ignore everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoCallbacks;

impl ViewerCallbacks for NoCallbacks {}
