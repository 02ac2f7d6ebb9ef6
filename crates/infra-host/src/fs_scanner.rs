// Filesystem Scanner Implementation
// Depth-bounded async walk with hidden/extension filtering and
// symlink-cycle avoidance

use std::collections::HashSet;
use std::future::Future;
use std::io;
use std::path::{Path, PathBuf};
use std::pin::Pin;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use hostprobe_core::domain::{FileEntry, FileScanOptions};
use hostprobe_core::error::{ProbeError, Result};
use hostprobe_core::port::FileScanner;

/// Scanner backed by `tokio::fs`.
///
/// Depth 0 = the root's direct children. Unreadable subtrees are skipped;
/// only root-level failures abort the scan.
#[derive(Default)]
pub struct TokioFileScanner;

impl TokioFileScanner {
    pub fn new() -> Self {
        Self
    }
}

/// Lowercased extension allow-list, `None` when the filter is inactive
fn extension_filter(options: &FileScanOptions) -> Option<Vec<String>> {
    options
        .include_extensions
        .as_ref()
        .filter(|exts| !exts.is_empty())
        .map(|exts| {
            exts.iter()
                .map(|e| e.trim_start_matches('.').to_ascii_lowercase())
                .collect()
        })
}

fn map_root_error(err: io::Error, path: &str) -> ProbeError {
    match err.kind() {
        io::ErrorKind::NotFound => ProbeError::PathNotFound(path.to_string()),
        io::ErrorKind::PermissionDenied => ProbeError::AccessDenied(path.to_string()),
        _ => ProbeError::Unknown(format!("{}: {}", path, err)),
    }
}

fn is_hidden(name: &str) -> bool {
    name.starts_with('.')
}

fn to_entry(path: &Path, meta: &std::fs::Metadata, is_directory: bool) -> FileEntry {
    let modified_at: Option<DateTime<Utc>> = meta.modified().ok().map(DateTime::from);
    FileEntry {
        path: path.to_string_lossy().into_owned(),
        size_bytes: meta.len(),
        modified_at,
        is_directory,
    }
}

#[async_trait]
impl FileScanner for TokioFileScanner {
    async fn scan(
        &self,
        options: &FileScanOptions,
        cancel: CancellationToken,
    ) -> Result<Vec<FileEntry>> {
        let root = PathBuf::from(&options.root_path);
        let meta = tokio::fs::metadata(&root)
            .await
            .map_err(|err| map_root_error(err, &options.root_path))?;
        if !meta.is_dir() {
            return Err(ProbeError::InvalidRequest(format!(
                "root path is not a directory: {}",
                options.root_path
            )));
        }

        let extensions = extension_filter(options);
        let mut visited: HashSet<PathBuf> = HashSet::new();
        if let Ok(canonical) = tokio::fs::canonicalize(&root).await {
            visited.insert(canonical);
        }

        let mut entries = Vec::new();
        walk_dir(
            root,
            0,
            options,
            extensions.as_deref(),
            &mut visited,
            &mut entries,
            &cancel,
        )
        .await?;
        Ok(entries)
    }
}

/// Boxed future to support async recursion; each directory step is a
/// cancellation check point.
#[allow(clippy::too_many_arguments)]
fn walk_dir<'a>(
    dir: PathBuf,
    depth: u32,
    options: &'a FileScanOptions,
    extensions: Option<&'a [String]>,
    visited: &'a mut HashSet<PathBuf>,
    entries: &'a mut Vec<FileEntry>,
    cancel: &'a CancellationToken,
) -> Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>> {
    Box::pin(async move {
        if cancel.is_cancelled() {
            return Err(ProbeError::Cancelled);
        }

        let mut reader = match tokio::fs::read_dir(&dir).await {
            Ok(reader) => reader,
            Err(err) if depth == 0 => return Err(map_root_error(err, &dir.to_string_lossy())),
            Err(err) => {
                // Inaccessible branch: omit and keep walking
                debug!(dir = %dir.display(), error = %err, "skipping unreadable directory");
                return Ok(());
            }
        };

        loop {
            let entry = match reader.next_entry().await {
                Ok(Some(entry)) => entry,
                Ok(None) => break,
                Err(err) if depth == 0 => {
                    return Err(map_root_error(err, &dir.to_string_lossy()))
                }
                Err(err) => {
                    debug!(dir = %dir.display(), error = %err, "directory read aborted");
                    break;
                }
            };

            let name = entry.file_name().to_string_lossy().into_owned();
            if !options.include_hidden && is_hidden(&name) {
                continue;
            }

            let path = entry.path();
            let file_type = match entry.file_type().await {
                Ok(ft) => ft,
                Err(err) => {
                    debug!(path = %path.display(), error = %err, "skipping unreadable entry");
                    continue;
                }
            };

            let is_symlink = file_type.is_symlink();
            // Follow the link for metadata only when the policy allows it
            let meta = if is_symlink && options.follow_symlinks {
                tokio::fs::metadata(&path).await
            } else {
                tokio::fs::symlink_metadata(&path).await
            };
            let meta = match meta {
                Ok(meta) => meta,
                Err(err) => {
                    debug!(path = %path.display(), error = %err, "skipping broken entry");
                    continue;
                }
            };

            let treat_as_dir = meta.is_dir() && (!is_symlink || options.follow_symlinks);

            if !treat_as_dir {
                if let Some(allowed) = extensions {
                    let ext = path
                        .extension()
                        .map(|e| e.to_string_lossy().to_ascii_lowercase());
                    match ext {
                        Some(ext) if allowed.iter().any(|a| *a == ext) => {}
                        _ => continue,
                    }
                }
                entries.push(to_entry(&path, &meta, false));
                continue;
            }

            // Directories are emitted and recursed into while depth allows
            entries.push(to_entry(&path, &meta, true));

            if depth < options.max_depth {
                // Never re-enter a physical directory already seen on this
                // walk - cyclic links terminate regardless of the flag
                let physical = match tokio::fs::canonicalize(&path).await {
                    Ok(p) => p,
                    Err(err) => {
                        debug!(path = %path.display(), error = %err, "cannot resolve directory");
                        continue;
                    }
                };
                if !visited.insert(physical) {
                    debug!(path = %path.display(), "cycle detected, not re-entering");
                    continue;
                }
                walk_dir(path, depth + 1, options, extensions, visited, entries, cancel).await?;
            }
        }

        Ok(())
    })
}
