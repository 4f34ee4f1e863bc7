use thiserror::Error;

/// Coarse classification used by the panel to decide how a failure is shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Input,
    BackendFailure,
    UnsupportedFormat,
    Config,
}

#[derive(Debug, Error)]
pub enum KueError {
    #[error("invalid input: {0}")]
    Input(String),

    #[error("{backend} failed: {message}")]
    BackendFailure {
        backend: &'static str,
        message: String,
    },

    #[error("unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("configuration error: {0}")]
    Config(String),
}

impl KueError {
    pub fn backend(backend: &'static str, err: impl std::fmt::Display) -> Self {
        KueError::BackendFailure {
            backend,
            message: err.to_string(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            KueError::Input(_) => ErrorKind::Input,
            KueError::BackendFailure { .. } => ErrorKind::BackendFailure,
            KueError::UnsupportedFormat(_) => ErrorKind::UnsupportedFormat,
            KueError::Config(_) => ErrorKind::Config,
        }
    }
}

pub type KueResult<T> = Result<T, KueError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_error_message() {
        let err = KueError::backend("search", "index unavailable");
        assert_eq!(err.kind(), ErrorKind::BackendFailure);
        assert_eq!(err.to_string(), "search failed: index unavailable");
    }

    #[test]
    fn test_unsupported_kind() {
        let err = KueError::UnsupportedFormat("notes.txt".to_string());
        assert_eq!(err.kind(), ErrorKind::UnsupportedFormat);
    }
}
