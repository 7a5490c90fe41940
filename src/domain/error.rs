use thiserror::Error;

/// Fatal, run-level failures. Row-level problems during an import are not
/// errors; they are counted and reported as skipped rows.
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("failed to read file: {0}")]
    File(String),

    #[error("failed to parse file: {0}")]
    Parse(String),

    #[error("unsupported file type: {0}")]
    UnsupportedFormat(String),

    #[error("invalid pattern rule: {0}")]
    Pattern(String),

    #[error("database error: {0}")]
    Database(String),

    #[error("invalid request: {0}")]
    InvalidRequest(String),
}
