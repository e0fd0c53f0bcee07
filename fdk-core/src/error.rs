//! Error types for File Driver Kit

use thiserror::Error;

/// Result type alias
pub type FdkResult<T> = Result<T, FdkError>;

/// Main error type
#[derive(Error, Debug)]
pub enum FdkError {
    #[error("Unknown driver: '{0}'")]
    UnknownDriver(String),

    #[error("Driver '{0}' is already registered")]
    DuplicateRegistration(String),

    #[error("Cannot construct driver '{driver}': {message}")]
    Construction { driver: String, message: String },

    #[error("Path not found: {0}")]
    NotFound(String),

    #[error("Already exists: {0}")]
    AlreadyExists(String),

    #[error("Not a directory: {0}")]
    NotADirectory(String),

    #[error("Not a file: {0}")]
    NotAFile(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Authentication failed: {0}")]
    AuthFailed(String),

    #[error("Provider API error ({provider}): {message}")]
    ProviderApi { provider: String, message: String },

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Unsupported operation: {0}")]
    Unsupported(String),
}

impl FdkError {
    pub fn construction(driver: impl Into<String>, message: impl Into<String>) -> Self {
        FdkError::Construction {
            driver: driver.into(),
            message: message.into(),
        }
    }

    /// Map an `std::io::Error` raised while operating on `path` onto the
    /// driver taxonomy.
    pub fn from_io(err: std::io::Error, path: impl Into<String>) -> Self {
        match err.kind() {
            std::io::ErrorKind::NotFound => FdkError::NotFound(path.into()),
            std::io::ErrorKind::AlreadyExists => FdkError::AlreadyExists(path.into()),
            _ => FdkError::Io(err),
        }
    }

    /// Whether this is a generic backend failure rather than one of the
    /// precise path conditions.
    pub fn is_io_kind(&self) -> bool {
        matches!(
            self,
            FdkError::Io(_)
                | FdkError::Network(_)
                | FdkError::AuthFailed(_)
                | FdkError::ProviderApi { .. }
                | FdkError::Serialization(_)
                | FdkError::Unsupported(_)
        )
    }
}
