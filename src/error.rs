use thiserror::Error;

pub type Result<T> = std::result::Result<T, PiError>;

#[derive(Error, Debug)]
pub enum PiError {
    /// Precondition violation. The only error `compute` ever surfaces.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    /// Unexpected arithmetic fault inside an iteration step. Absorbed by the
    /// engine and reported through the event stream, never returned to callers.
    #[error("numeric fault: {0}")]
    Numeric(String),
}
