pub mod colors;
pub mod outbox;
pub mod protocol;
pub mod request;
pub mod source;

pub use colors::*;
pub use outbox::*;
pub use protocol::*;
pub use request::*;
pub use source::*;
