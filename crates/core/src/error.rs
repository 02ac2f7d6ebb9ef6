// Central Error Type for the Engine

use thiserror::Error;

use crate::domain::{ErrorInfo, ErrorKind};

/// Engine-level error type mirroring the wire taxonomy
#[derive(Error, Debug)]
pub enum ProbeError {
    #[error("operation timed out after {0}ms")]
    Timeout(u64),

    #[error("operation cancelled by caller")]
    Cancelled,

    #[error("access denied: {0}")]
    AccessDenied(String),

    #[error("path not found: {0}")]
    PathNotFound(String),

    #[error("unsupported on this platform: {0}")]
    UnsupportedPlatform(String),

    #[error("unsupported operation kind: {0}")]
    UnsupportedOperation(String),

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("query failed: {0}")]
    Query(String),

    #[error("process spawn failed: {0}")]
    SpawnFailed(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("internal error: {0}")]
    Unknown(String),
}

impl ProbeError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ProbeError::Timeout(_) => ErrorKind::Timeout,
            ProbeError::Cancelled => ErrorKind::Cancelled,
            ProbeError::AccessDenied(_) => ErrorKind::AccessDenied,
            ProbeError::PathNotFound(_) => ErrorKind::PathNotFound,
            ProbeError::UnsupportedPlatform(_) => ErrorKind::UnsupportedPlatform,
            ProbeError::UnsupportedOperation(_) => ErrorKind::UnsupportedOperation,
            ProbeError::InvalidRequest(_) => ErrorKind::InvalidRequest,
            ProbeError::Query(_) => ErrorKind::QueryError,
            ProbeError::SpawnFailed(_) => ErrorKind::ProcessSpawnError,
            ProbeError::Serialization(_) | ProbeError::Unknown(_) => ErrorKind::Unknown,
        }
    }

    /// Shape for embedding into a normally-shaped result
    pub fn to_error_info(&self) -> ErrorInfo {
        ErrorInfo::new(self.kind(), self.to_string())
    }
}

/// Result type alias using ProbeError
pub type Result<T> = std::result::Result<T, ProbeError>;
