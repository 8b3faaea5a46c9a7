//! Multi-viewer point-cloud engine: pan/zoom sync, lasso selection, colour
//! and label pipeline, and selection translation between datasets.

pub mod callbacks;
pub mod config;
pub mod error;
pub mod hub;
pub mod lasso;
pub mod pipeline;
pub mod transform;
pub mod translation;
pub mod viewer;

pub use callbacks::{Alert, NoCallbacks, ViewerCallbacks};
pub use config::{CustomScale, DataSelection, FeatureSelection, ViewerConfig, ViewerSettings};
pub use error::ViewerError;
pub use hub::{ControlEvent, PageHub};
pub use lasso::{ClosedLasso, LassoEngine, LassoState};
pub use transform::{
    BroadcastSource, GestureEvent, GestureKind, Rect, TransformBroadcast, TransformBroadcaster,
};
pub use translation::{SelectionView, TranslationStatus};
pub use viewer::{LoadState, Viewer};
