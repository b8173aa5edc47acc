use thiserror::Error;

use crate::config::ConfigError;
use crate::logging::LoggingError;
use crate::prompt::RequestError;
use crate::session::SessionError;

/// Unified result type for the prompt pad crate.
pub type Result<T> = std::result::Result<T, PadError>;

/// Errors surfaced by the runtime and the application plugins.
#[derive(Debug, Error)]
pub enum PadError {
    #[error("layout tree is empty")]
    EmptyLayout,
    #[error("zone `{0}` not found")]
    ZoneNotFound(String),
    #[error("terminal backend error: {0}")]
    Backend(String),
    #[error("session store error: {0}")]
    Session(#[from] SessionError),
    #[error("prompt request error: {0}")]
    Request(#[from] RequestError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("logging error: {0}")]
    Logging(#[from] LoggingError),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
