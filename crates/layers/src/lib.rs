pub mod labels;
pub mod layer;

pub use labels::*;
pub use layer::*;
