//! End-to-end query kinds (filesystem scan, registry, WMI) through the
//! facade and the real host adapters.

use std::fs;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use hostprobe_core::application::ProbeFacade;
use hostprobe_core::domain::{FileEntry, FileScanOptions, ProbeRequest};
use hostprobe_core::port::SystemTimeProvider;
use hostprobe_infra_host::{HostKeyStore, HostWmiProvider, TokioFileScanner, TokioProcessRunner};

fn facade() -> ProbeFacade {
    ProbeFacade::new(
        Arc::new(TokioProcessRunner::new(Arc::new(SystemTimeProvider))),
        Arc::new(HostWmiProvider::new()),
        Arc::new(HostKeyStore::new()),
        Arc::new(TokioFileScanner::new()),
    )
}

#[tokio::test]
async fn file_scan_returns_entries_as_json_array() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("a.log"), b"x").unwrap();
    fs::create_dir(dir.path().join("sub")).unwrap();
    fs::write(dir.path().join("sub/b.log"), b"xy").unwrap();

    let json = facade()
        .execute(
            ProbeRequest::FileScan(FileScanOptions::new(dir.path().to_string_lossy())),
            CancellationToken::new(),
        )
        .await
        .unwrap();

    let entries: Vec<FileEntry> = serde_json::from_str(&json).unwrap();
    assert_eq!(entries.len(), 3);
    assert!(entries.iter().any(|e| e.is_directory));
}

#[tokio::test]
async fn file_scan_missing_root_yields_error_envelope() {
    let json = facade()
        .execute(
            ProbeRequest::FileScan(FileScanOptions::new("/no/such/root")),
            CancellationToken::new(),
        )
        .await
        .unwrap();

    let body: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(body["error"]["kind"], "PATH_NOT_FOUND");
}

#[tokio::test]
async fn file_scan_via_raw_dispatch_applies_defaults() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("x.txt"), b"x").unwrap();

    let json = facade()
        .execute_raw(
            "fileScan",
            serde_json::json!({"rootPath": dir.path().to_string_lossy()}),
            CancellationToken::new(),
        )
        .await
        .unwrap();

    let entries: Vec<FileEntry> = serde_json::from_str(&json).unwrap();
    assert_eq!(entries.len(), 1);
}

#[tokio::test]
async fn malformed_scan_payload_fails_fast() {
    let err = facade()
        .execute_raw(
            "fileScan",
            serde_json::json!({"maxDepth": 1}),
            CancellationToken::new(),
        )
        .await
        .unwrap_err();
    assert!(err.to_string().contains("invalid request"));
}

#[cfg(not(windows))]
#[tokio::test]
async fn wmi_unsupported_off_windows() {
    use hostprobe_core::domain::WmiQueryRequest;

    let json = facade()
        .execute(
            ProbeRequest::Wmi(WmiQueryRequest::new("SELECT * FROM Win32_OperatingSystem")),
            CancellationToken::new(),
        )
        .await
        .unwrap();

    let body: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(body["error"]["kind"], "UNSUPPORTED_PLATFORM");
}

#[cfg(not(windows))]
#[tokio::test]
async fn registry_unsupported_off_windows() {
    let json = facade()
        .execute_raw(
            "registry",
            serde_json::json!({"rootKey": "HKEY_LOCAL_MACHINE\\SOFTWARE"}),
            CancellationToken::new(),
        )
        .await
        .unwrap();

    let body: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(body["error"]["kind"], "UNSUPPORTED_PLATFORM");
}

#[cfg(windows)]
#[tokio::test]
async fn registry_reads_local_machine_software() {
    use hostprobe_core::domain::{RegistryNode, RegistryQueryOptions};

    let mut options = RegistryQueryOptions::new("HKEY_LOCAL_MACHINE\\SOFTWARE");
    options.max_depth = 1;
    options.include_values = false;

    let json = facade()
        .execute(ProbeRequest::Registry(options), CancellationToken::new())
        .await
        .unwrap();

    let node: RegistryNode = serde_json::from_str(&json).unwrap();
    assert_eq!(node.key_path, "HKEY_LOCAL_MACHINE\\SOFTWARE");
    assert!(node.depth() <= 1);
}
