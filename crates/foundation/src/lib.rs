pub mod arena;
pub mod bounds;
pub mod color;
pub mod geometry;
pub mod math;
pub mod time;

// Foundation crate: small, well-tested primitives only.
pub use arena::*;
pub use bounds::*;
pub use color::*;
pub use geometry::*;
pub use time::*;
