// Wire-Level Error Shapes
// Embedded in results, never thrown across the facade boundary

use serde::{Deserialize, Serialize};

/// Closed error taxonomy shared by every operation kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    Timeout,
    Cancelled,
    AccessDenied,
    PathNotFound,
    UnsupportedPlatform,
    UnsupportedOperation,
    InvalidRequest,
    QueryError,
    ProcessSpawnError,
    Unknown,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ErrorKind::Timeout => "TIMEOUT",
            ErrorKind::Cancelled => "CANCELLED",
            ErrorKind::AccessDenied => "ACCESS_DENIED",
            ErrorKind::PathNotFound => "PATH_NOT_FOUND",
            ErrorKind::UnsupportedPlatform => "UNSUPPORTED_PLATFORM",
            ErrorKind::UnsupportedOperation => "UNSUPPORTED_OPERATION",
            ErrorKind::InvalidRequest => "INVALID_REQUEST",
            ErrorKind::QueryError => "QUERY_ERROR",
            ErrorKind::ProcessSpawnError => "PROCESS_SPAWN_ERROR",
            ErrorKind::Unknown => "UNKNOWN",
        };
        write!(f, "{}", s)
    }
}

/// Error payload embedded in a normally-shaped result
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorInfo {
    pub kind: ErrorKind,
    pub message: String,

    /// Optional stack/trace text from the underlying fault
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl ErrorInfo {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            detail: None,
        }
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }
}
