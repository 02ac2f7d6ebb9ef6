// Registry Query Service
// Depth-bounded recursive walk over the hierarchical key-store port

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use tracing::debug;

use crate::domain::{RegistryNode, RegistryQueryOptions};
use crate::error::{ProbeError, Result};
use crate::port::key_store::join_key;
use crate::port::{KeyStore, KeyStoreError};

/// Walks a registry-like tree to a bounded depth.
///
/// Access failure on a subtree omits that branch and continues; access
/// failure on the root fails the whole call.
pub struct RegistryQueryService {
    store: Arc<dyn KeyStore>,
}

impl RegistryQueryService {
    pub fn new(store: Arc<dyn KeyStore>) -> Self {
        Self { store }
    }

    pub async fn query(&self, options: &RegistryQueryOptions) -> Result<RegistryNode> {
        self.read_node(options.root_key.clone(), 0, options)
            .await
            .map_err(|err| match err {
                KeyStoreError::NotFound(path) => ProbeError::PathNotFound(path),
                KeyStoreError::AccessDenied(path) => ProbeError::AccessDenied(path),
                KeyStoreError::Unsupported(msg) => ProbeError::UnsupportedPlatform(msg),
                KeyStoreError::Other(msg) => ProbeError::Query(msg),
            })
    }

    /// Boxed future to support async recursion.
    ///
    /// A node at `max_depth` never enumerates subkeys, so its child list is
    /// empty even when real subkeys exist.
    fn read_node<'a>(
        &'a self,
        key_path: String,
        depth: u32,
        options: &'a RegistryQueryOptions,
    ) -> Pin<Box<dyn Future<Output = std::result::Result<RegistryNode, KeyStoreError>> + Send + 'a>>
    {
        Box::pin(async move {
            let values = if options.include_values {
                Some(self.store.read_values(&key_path).await?)
            } else {
                None
            };

            let mut children = Vec::new();
            if depth < options.max_depth {
                for name in self.store.list_subkeys(&key_path).await? {
                    let child_path = join_key(&key_path, &name);
                    match self.read_node(child_path, depth + 1, options).await {
                        Ok(node) => children.push(node),
                        Err(err) => {
                            // Inaccessible branch: omit and keep walking
                            debug!(key = %key_path, child = %name, error = %err, "skipping subtree");
                        }
                    }
                }
            }

            Ok(RegistryNode {
                key_path,
                values,
                children,
            })
        })
    }
}
