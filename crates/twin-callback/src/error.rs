use thiserror::Error;
use twin_core::TwinError;

/// Error type handlers return.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

pub type Result<T> = std::result::Result<T, CallbackError>;

#[derive(Debug, Error)]
pub enum CallbackError {
    /// A handler failed; handlers that already ran are not undone.
    #[error("handler `{handler}` failed for {event} at `{path}`: {source}")]
    Handler {
        handler: String,
        event: String,
        path: String,
        #[source]
        source: BoxError,
    },

    /// A binding path could not be walked on the twin graph.
    #[error(transparent)]
    Twin(#[from] TwinError),
}

impl CallbackError {
    /// Name of the failing handler, if a handler failed.
    #[must_use]
    pub fn handler(&self) -> Option<&str> {
        match self {
            Self::Handler { handler, .. } => Some(handler),
            Self::Twin(_) => None,
        }
    }
}
