// Probe Result Models
// Owned exclusively by the invocation that produced them; immutable after construction

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::error::{ErrorInfo, ErrorKind};

/// Normalized result of a command execution.
///
/// `duration_ms` and `success` are derived at construction and kept on the
/// wire so callers can branch on a single boolean:
/// `success == (exit_code == 0 && error.is_none() && !timed_out)`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecResult {
    pub exit_code: i32,
    pub std_out: String,
    pub std_err: String,
    pub timed_out: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorInfo>,

    pub started_at: DateTime<Utc>,
    pub ended_at: DateTime<Utc>,

    pub duration_ms: i64,
    pub success: bool,
}

impl ExecResult {
    fn build(
        exit_code: i32,
        std_out: String,
        std_err: String,
        timed_out: bool,
        error: Option<ErrorInfo>,
        started_at: DateTime<Utc>,
        ended_at: DateTime<Utc>,
    ) -> Self {
        // Clock skew must never produce a negative duration
        let duration_ms = (ended_at - started_at).num_milliseconds().max(0);
        let success = exit_code == 0 && error.is_none() && !timed_out;
        Self {
            exit_code,
            std_out,
            std_err,
            timed_out,
            error,
            started_at,
            ended_at,
            duration_ms,
            success,
        }
    }

    /// Process ran to completion (any exit code)
    pub fn completed(
        exit_code: i32,
        std_out: String,
        std_err: String,
        started_at: DateTime<Utc>,
        ended_at: DateTime<Utc>,
    ) -> Self {
        Self::build(exit_code, std_out, std_err, false, None, started_at, ended_at)
    }

    /// Process was force-terminated by the deadline or an external cancel.
    /// `kind` distinguishes the two; output reflects what was captured
    /// before termination.
    pub fn terminated(
        kind: ErrorKind,
        message: impl Into<String>,
        std_out: String,
        std_err: String,
        started_at: DateTime<Utc>,
        ended_at: DateTime<Utc>,
    ) -> Self {
        Self::build(
            -1,
            std_out,
            std_err,
            true,
            Some(ErrorInfo::new(kind, message)),
            started_at,
            ended_at,
        )
    }

    /// Process never ran or failed outside its own exit path
    pub fn failed(
        error: ErrorInfo,
        started_at: DateTime<Utc>,
        ended_at: DateTime<Utc>,
    ) -> Self {
        Self::build(
            -1,
            String::new(),
            String::new(),
            false,
            Some(error),
            started_at,
            ended_at,
        )
    }
}

/// One filesystem entry produced by a scan (transient, never persisted)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileEntry {
    pub path: String,
    pub size_bytes: u64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modified_at: Option<DateTime<Utc>>,

    pub is_directory: bool,
}

/// One node of a registry query result.
///
/// Forms a rooted tree with no cycles by construction: a node at
/// `max_depth` has an empty child list even if real subkeys exist.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistryNode {
    pub key_path: String,

    /// Present only when the query requested values
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub values: Option<BTreeMap<String, String>>,

    pub children: Vec<RegistryNode>,
}

impl RegistryNode {
    /// Maximum child depth below this node (0 = leaf)
    pub fn depth(&self) -> u32 {
        self.children
            .iter()
            .map(|c| c.depth() + 1)
            .max()
            .unwrap_or(0)
    }
}
