pub mod commands;
pub mod renderer;
pub mod transform;

pub use commands::*;
pub use renderer::*;
pub use transform::*;
