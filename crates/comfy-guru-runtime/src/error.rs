use std::fmt;
use std::path::PathBuf;

/// Result type for comfy-guru-runtime operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur in the runtime layer
#[derive(Debug)]
pub enum Error {
    /// Catalog or scan failure
    Engine(comfy_guru_engine::Error),

    /// IO operation failed
    Io(std::io::Error),

    /// Malformed settings or unusable configuration
    Config(String),

    /// A log file passed by the caller does not exist
    NotFound(PathBuf),

    /// The platform follower could not be started
    Tail(String),
}

impl Error {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound(_))
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Engine(err) => write!(f, "{}", err),
            Error::Io(err) => write!(f, "IO error: {}", err),
            Error::Config(msg) => write!(f, "Configuration error: {}", msg),
            Error::NotFound(path) => write!(f, "Log file not found: {}", path.display()),
            Error::Tail(msg) => write!(f, "Failed to tail log: {}", msg),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Engine(err) => Some(err),
            Error::Io(err) => Some(err),
            Error::Config(_) | Error::NotFound(_) | Error::Tail(_) => None,
        }
    }
}

impl From<comfy_guru_engine::Error> for Error {
    fn from(err: comfy_guru_engine::Error) -> Self {
        match err {
            comfy_guru_engine::Error::NotFound(path) => Error::NotFound(path),
            other => Error::Engine(other),
        }
    }
}

impl From<comfy_guru_core::Error> for Error {
    fn from(err: comfy_guru_core::Error) -> Self {
        match err {
            comfy_guru_core::Error::Io(err) => Error::Io(err),
            comfy_guru_core::Error::Config(msg) => Error::Config(msg),
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err)
    }
}
