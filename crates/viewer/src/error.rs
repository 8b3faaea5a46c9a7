use scene::CoordinateError;
use streaming::DecodeError;

#[derive(Debug, thiserror::Error)]
pub enum ViewerError {
    #[error("invalid coordinates: {0}")]
    Coordinates(#[from] CoordinateError),
    #[error("undecodable colours: {0}")]
    Decode(#[from] DecodeError),
    #[error("{0}")]
    Domain(String),
    #[error("data source unreachable: {0}")]
    Transport(String),
    #[error("invalid configuration: {0}")]
    Config(#[from] serde_json::Error),
}
