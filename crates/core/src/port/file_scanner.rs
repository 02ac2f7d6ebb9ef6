// File Scanner Port
// Abstraction over the bounded filesystem walk

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::domain::{FileEntry, FileScanOptions};
use crate::error::Result;

/// File scanner trait
///
/// # Errors
/// - `ProbeError::PathNotFound` if the root path does not exist
/// - `ProbeError::AccessDenied` if the root itself is unreadable
/// - `ProbeError::Cancelled` once the token fires
///
/// Unreadable subtrees below the root are skipped, not surfaced.
#[async_trait]
pub trait FileScanner: Send + Sync {
    async fn scan(
        &self,
        options: &FileScanOptions,
        cancel: CancellationToken,
    ) -> Result<Vec<FileEntry>>;
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;

    /// Mock scanner returning a fixed entry list
    pub struct MockFileScanner {
        entries: Vec<FileEntry>,
    }

    impl MockFileScanner {
        pub fn new(entries: Vec<FileEntry>) -> Self {
            Self { entries }
        }
    }

    #[async_trait]
    impl FileScanner for MockFileScanner {
        async fn scan(
            &self,
            _options: &FileScanOptions,
            _cancel: CancellationToken,
        ) -> Result<Vec<FileEntry>> {
            Ok(self.entries.clone())
        }
    }
}
