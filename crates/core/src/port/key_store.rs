// Hierarchical Key-Store Port
// Abstraction over a registry-like key/value tree

use std::collections::BTreeMap;

use async_trait::async_trait;
use thiserror::Error;

/// Key-store access errors
#[derive(Error, Debug)]
pub enum KeyStoreError {
    #[error("key not found: {0}")]
    NotFound(String),

    #[error("access denied: {0}")]
    AccessDenied(String),

    #[error("key store unavailable: {0}")]
    Unsupported(String),

    #[error("key store fault: {0}")]
    Other(String),
}

/// Key store trait
///
/// Paths are backslash-separated, rooted at a hive name
/// (e.g. `HKEY_LOCAL_MACHINE\SOFTWARE\Vendor`). `list_subkeys` returns
/// child *names* in enumeration order, not full paths.
#[async_trait]
pub trait KeyStore: Send + Sync {
    async fn read_values(&self, key_path: &str) -> Result<BTreeMap<String, String>, KeyStoreError>;

    async fn list_subkeys(&self, key_path: &str) -> Result<Vec<String>, KeyStoreError>;
}

/// Join a key path with a child name
pub fn join_key(parent: &str, child: &str) -> String {
    format!("{}\\{}", parent.trim_end_matches('\\'), child)
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use std::collections::HashMap;

    /// One mock key: its values, child names, and an access flag
    #[derive(Debug, Clone, Default)]
    pub struct MockKey {
        pub values: BTreeMap<String, String>,
        pub subkeys: Vec<String>,
        pub denied: bool,
    }

    /// In-memory key store, keyed by full path
    #[derive(Debug, Default)]
    pub struct InMemoryKeyStore {
        keys: HashMap<String, MockKey>,
    }

    impl InMemoryKeyStore {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn insert(&mut self, path: impl Into<String>, key: MockKey) -> &mut Self {
            self.keys.insert(path.into(), key);
            self
        }

        fn lookup(&self, path: &str) -> Result<&MockKey, KeyStoreError> {
            match self.keys.get(path) {
                Some(key) if key.denied => Err(KeyStoreError::AccessDenied(path.to_string())),
                Some(key) => Ok(key),
                None => Err(KeyStoreError::NotFound(path.to_string())),
            }
        }
    }

    #[async_trait]
    impl KeyStore for InMemoryKeyStore {
        async fn read_values(
            &self,
            key_path: &str,
        ) -> Result<BTreeMap<String, String>, KeyStoreError> {
            Ok(self.lookup(key_path)?.values.clone())
        }

        async fn list_subkeys(&self, key_path: &str) -> Result<Vec<String>, KeyStoreError> {
            Ok(self.lookup(key_path)?.subkeys.clone())
        }
    }
}
