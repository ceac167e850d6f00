use std::fmt;

/// Result type for comfy-guru-discovery operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur while enumerating installations
#[derive(Debug)]
pub enum Error {
    /// A glob pattern could not be built from an installation path
    Glob(glob::PatternError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Glob(err) => write!(f, "Glob pattern error: {}", err),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Glob(err) => Some(err),
        }
    }
}

impl From<glob::PatternError> for Error {
    fn from(err: glob::PatternError) -> Self {
        Error::Glob(err)
    }
}
