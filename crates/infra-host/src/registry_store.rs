// Registry Key Store
// Windows-only; every other host reports an unavailable store

use std::collections::BTreeMap;

use async_trait::async_trait;

use hostprobe_core::port::{KeyStore, KeyStoreError};

/// Key store backed by the Windows registry.
///
/// Paths are hive-rooted, e.g. `HKEY_LOCAL_MACHINE\SOFTWARE\Vendor`.
#[derive(Default)]
pub struct HostKeyStore;

impl HostKeyStore {
    pub fn new() -> Self {
        Self
    }
}

#[cfg(windows)]
mod windows_impl {
    use super::*;
    use std::io;

    use winreg::enums::{
        HKEY_CLASSES_ROOT, HKEY_CURRENT_CONFIG, HKEY_CURRENT_USER, HKEY_LOCAL_MACHINE, HKEY_USERS,
        KEY_READ,
    };
    use winreg::RegKey;

    fn split_hive(key_path: &str) -> Result<(RegKey, String), KeyStoreError> {
        let (hive, rest) = match key_path.split_once('\\') {
            Some((hive, rest)) => (hive, rest.to_string()),
            None => (key_path, String::new()),
        };
        let root = match hive.to_ascii_uppercase().as_str() {
            "HKEY_LOCAL_MACHINE" | "HKLM" => RegKey::predef(HKEY_LOCAL_MACHINE),
            "HKEY_CURRENT_USER" | "HKCU" => RegKey::predef(HKEY_CURRENT_USER),
            "HKEY_CLASSES_ROOT" | "HKCR" => RegKey::predef(HKEY_CLASSES_ROOT),
            "HKEY_USERS" | "HKU" => RegKey::predef(HKEY_USERS),
            "HKEY_CURRENT_CONFIG" | "HKCC" => RegKey::predef(HKEY_CURRENT_CONFIG),
            _ => return Err(KeyStoreError::NotFound(key_path.to_string())),
        };
        Ok((root, rest))
    }

    fn map_error(err: io::Error, key_path: &str) -> KeyStoreError {
        match err.kind() {
            io::ErrorKind::NotFound => KeyStoreError::NotFound(key_path.to_string()),
            io::ErrorKind::PermissionDenied => KeyStoreError::AccessDenied(key_path.to_string()),
            _ => KeyStoreError::Other(format!("{}: {}", key_path, err)),
        }
    }

    fn open(key_path: &str) -> Result<RegKey, KeyStoreError> {
        let (root, rest) = split_hive(key_path)?;
        if rest.is_empty() {
            return Ok(root);
        }
        root.open_subkey_with_flags(&rest, KEY_READ)
            .map_err(|err| map_error(err, key_path))
    }

    pub(super) fn read_values(key_path: &str) -> Result<BTreeMap<String, String>, KeyStoreError> {
        let key = open(key_path)?;
        let mut values = BTreeMap::new();
        for item in key.enum_values() {
            let (name, value) = item.map_err(|err| map_error(err, key_path))?;
            values.insert(name, value.to_string());
        }
        Ok(values)
    }

    pub(super) fn list_subkeys(key_path: &str) -> Result<Vec<String>, KeyStoreError> {
        let key = open(key_path)?;
        let mut names = Vec::new();
        for item in key.enum_keys() {
            names.push(item.map_err(|err| map_error(err, key_path))?);
        }
        Ok(names)
    }
}

#[async_trait]
impl KeyStore for HostKeyStore {
    #[cfg(windows)]
    async fn read_values(&self, key_path: &str) -> Result<BTreeMap<String, String>, KeyStoreError> {
        let path = key_path.to_string();
        tokio::task::spawn_blocking(move || windows_impl::read_values(&path))
            .await
            .map_err(|err| KeyStoreError::Other(format!("registry task failed: {}", err)))?
    }

    #[cfg(not(windows))]
    async fn read_values(
        &self,
        _key_path: &str,
    ) -> Result<BTreeMap<String, String>, KeyStoreError> {
        Err(KeyStoreError::Unsupported(
            "registry queries are only available on Windows".to_string(),
        ))
    }

    #[cfg(windows)]
    async fn list_subkeys(&self, key_path: &str) -> Result<Vec<String>, KeyStoreError> {
        let path = key_path.to_string();
        tokio::task::spawn_blocking(move || windows_impl::list_subkeys(&path))
            .await
            .map_err(|err| KeyStoreError::Other(format!("registry task failed: {}", err)))?
    }

    #[cfg(not(windows))]
    async fn list_subkeys(&self, _key_path: &str) -> Result<Vec<String>, KeyStoreError> {
        Err(KeyStoreError::Unsupported(
            "registry queries are only available on Windows".to_string(),
        ))
    }
}

#[cfg(all(test, not(windows)))]
mod tests {
    use super::*;

    #[tokio::test]
    async fn non_windows_host_reports_unavailable_store() {
        let store = HostKeyStore::new();
        let err = store.read_values("HKLM\\SOFTWARE").await.unwrap_err();
        assert!(matches!(err, KeyStoreError::Unsupported(_)));
    }
}
