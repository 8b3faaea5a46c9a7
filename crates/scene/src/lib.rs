pub mod lasso;
pub mod picking;
pub mod points;
pub mod selection;
pub mod trajectory;

pub use lasso::{ClusterOverlap, LassoSelection, SelectionId, SelectionSnapshot, SelectionStore};
pub use picking::pick_polygon;
pub use points::{CellId, CoordinateError, CoordinateSet, Point, PointStore};
pub use selection::SelectionSet;
pub use trajectory::Trajectory;
