use ::thiserror::Error;

/// The error taxonomy shared across the whole workspace. HTTP
/// handlers in the daemon crate map these to status codes; the control
/// loop maps `DeviceUnavailable`/`NetworkError`/`PersistenceError` into
/// `RuntimeState` instead of propagating them.
#[derive(Debug, Error)]
pub enum Error {
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("input device unavailable: {0}")]
    DeviceUnavailable(String),

    #[error("network error: {0}")]
    Network(String),

    #[error("persistence error: {0}")]
    Persistence(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl Error {
    pub fn validation(msg: impl Into<String>) -> Self {
        Error::Validation(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Error::NotFound(msg.into())
    }

    /// A short machine-readable tag for the JSON error envelope.
    pub fn kind(&self) -> &'static str {
        match self {
            Error::Validation(_) => "validation",
            Error::NotFound(_) => "not_found",
            Error::DeviceUnavailable(_) => "device_unavailable",
            Error::Network(_) => "network",
            Error::Persistence(_) => "persistence",
            Error::Internal(_) => "internal",
        }
    }
}

pub type Result<T> = ::std::result::Result<T, Error>;
