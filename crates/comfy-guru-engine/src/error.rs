use std::fmt;
use std::path::PathBuf;

/// Result type for comfy-guru-engine operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur while loading catalogs or scanning logs
#[derive(Debug)]
pub enum Error {
    /// Reading a catalog or log failed
    Io(std::io::Error),

    /// The catalog is not valid JSON
    Json(serde_json::Error),

    /// The catalog parsed but has the wrong shape, or an argument is unusable
    Config(String),

    /// The requested log file does not exist
    NotFound(PathBuf),

    /// A catalog regex failed to compile
    InvalidPattern {
        category: String,
        pattern: String,
        source: regex::Error,
    },
}

impl Error {
    /// Malformed catalog data, as opposed to a missing or unreadable file
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Error::Json(_) | Error::Config(_) | Error::InvalidPattern { .. }
        )
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Io(err) => write!(f, "IO error: {}", err),
            Error::Json(err) => write!(f, "Configuration error: malformed pattern catalog: {}", err),
            Error::Config(msg) => write!(f, "Configuration error: {}", msg),
            Error::NotFound(path) => write!(f, "Log file not found: {}", path.display()),
            Error::InvalidPattern {
                category,
                pattern,
                source,
            } => write!(
                f,
                "Configuration error: invalid pattern {:?} in category {}: {}",
                pattern, category, source
            ),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(err) => Some(err),
            Error::Json(err) => Some(err),
            Error::InvalidPattern { source, .. } => Some(source),
            Error::Config(_) | Error::NotFound(_) => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Json(err)
    }
}
