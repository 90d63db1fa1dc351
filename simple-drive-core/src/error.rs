use thiserror::Error as ThisError;

/// Error taxonomy for blob operations.
///
/// `Backend` always wraps the underlying cause; the two documented `exists`
/// asymmetries (see `BlobStorageBackend`) are the only places a transport
/// failure is swallowed instead of surfaced.
#[derive(Debug, ThisError)]
pub enum Error {
    #[error("blob {0} already exists")]
    AlreadyExists(String),

    #[error("blob {0} not found")]
    NotFound(String),

    #[error("invalid payload encoding: {0}")]
    InvalidPayload(String),

    #[error("{0} operation not supported")]
    Unsupported(&'static str),

    #[error("storage backend error: {0:#}")]
    Backend(anyhow::Error),

    #[error("storage configuration error: {0}")]
    Config(String),
}

impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Error {
        Error::Backend(err)
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
