// Probe Request Models
// Immutable once constructed; all wire fields are lowerCamelCase

use std::collections::HashMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Default command timeout when the request carries none (5 minutes)
pub const DEFAULT_TIMEOUT_MS: u64 = 300_000;

/// Default WMI namespace when the request carries none
pub const DEFAULT_WMI_NAMESPACE: &str = "ROOT\\CIMV2";

/// Default filesystem scan depth
pub const DEFAULT_SCAN_DEPTH: u32 = 3;

/// Default registry query depth
pub const DEFAULT_REGISTRY_DEPTH: u32 = 2;

fn default_true() -> bool {
    true
}

fn default_scan_depth() -> u32 {
    DEFAULT_SCAN_DEPTH
}

fn default_registry_depth() -> u32 {
    DEFAULT_REGISTRY_DEPTH
}

/// Command execution request shared by all shell/interpreter kinds
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecRequest {
    pub command: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub working_dir: Option<String>,

    /// Environment overlay applied on top of the inherited environment
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub env: Option<HashMap<String, String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_ms: Option<u64>,

    #[serde(default = "default_true")]
    pub capture_stderr: bool,

    #[serde(default)]
    pub use_login_shell: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interpreter_path: Option<String>,
}

impl ExecRequest {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            working_dir: None,
            env: None,
            timeout_ms: None,
            capture_stderr: true,
            use_login_shell: false,
            interpreter_path: None,
        }
    }

    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = Some(timeout_ms);
        self
    }

    /// Configured timeout, or the 5-minute default when absent
    pub fn effective_timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms.unwrap_or(DEFAULT_TIMEOUT_MS))
    }
}

/// Instrumentation (WMI-style) query request
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WmiQueryRequest {
    pub query: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_ms: Option<u64>,
}

impl WmiQueryRequest {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            namespace: None,
            timeout_ms: None,
        }
    }

    pub fn effective_namespace(&self) -> &str {
        self.namespace.as_deref().unwrap_or(DEFAULT_WMI_NAMESPACE)
    }

    pub fn effective_timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms.unwrap_or(DEFAULT_TIMEOUT_MS))
    }
}

/// Hierarchical key-store (registry) query options
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistryQueryOptions {
    pub root_key: String,

    /// Depth 0 = root only, no descent
    #[serde(default = "default_registry_depth")]
    pub max_depth: u32,

    #[serde(default = "default_true")]
    pub include_values: bool,
}

impl RegistryQueryOptions {
    pub fn new(root_key: impl Into<String>) -> Self {
        Self {
            root_key: root_key.into(),
            max_depth: DEFAULT_REGISTRY_DEPTH,
            include_values: true,
        }
    }
}

/// Bounded filesystem scan options
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileScanOptions {
    pub root_path: String,

    /// Depth 0 = root's direct children only
    #[serde(default = "default_scan_depth")]
    pub max_depth: u32,

    /// Case-insensitive extension allow-list; empty/absent = no filter
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub include_extensions: Option<Vec<String>>,

    #[serde(default)]
    pub follow_symlinks: bool,

    #[serde(default)]
    pub include_hidden: bool,
}

impl FileScanOptions {
    pub fn new(root_path: impl Into<String>) -> Self {
        Self {
            root_path: root_path.into(),
            max_depth: DEFAULT_SCAN_DEPTH,
            include_extensions: None,
            follow_symlinks: false,
            include_hidden: false,
        }
    }
}

/// Command flavor selecting how the argument vector is built
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ExecKind {
    /// Native shell: `cmd.exe /C` on Windows, `sh -c` elsewhere
    Cmd,
    /// PowerShell-style interpreter
    Powershell,
    /// Python-style interpreter
    Python,
    /// POSIX shell, optionally as a login shell
    Bash,
}

impl std::fmt::Display for ExecKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExecKind::Cmd => write!(f, "cmd"),
            ExecKind::Powershell => write!(f, "powershell"),
            ExecKind::Python => write!(f, "python"),
            ExecKind::Bash => write!(f, "bash"),
        }
    }
}

/// Tagged union over the seven probe operation kinds.
///
/// Matched exhaustively at the facade, so an unknown tag is rejected at
/// parse time instead of failing a runtime cast.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", content = "request", rename_all = "camelCase")]
pub enum ProbeRequest {
    Cmd(ExecRequest),
    Powershell(ExecRequest),
    Python(ExecRequest),
    Bash(ExecRequest),
    Wmi(WmiQueryRequest),
    Registry(RegistryQueryOptions),
    FileScan(FileScanOptions),
}

impl ProbeRequest {
    /// Every known operation tag, in dispatch order
    pub const KIND_TAGS: [&'static str; 7] = [
        "cmd",
        "powershell",
        "python",
        "bash",
        "wmi",
        "registry",
        "fileScan",
    ];

    pub fn kind_tag(&self) -> &'static str {
        match self {
            ProbeRequest::Cmd(_) => "cmd",
            ProbeRequest::Powershell(_) => "powershell",
            ProbeRequest::Python(_) => "python",
            ProbeRequest::Bash(_) => "bash",
            ProbeRequest::Wmi(_) => "wmi",
            ProbeRequest::Registry(_) => "registry",
            ProbeRequest::FileScan(_) => "fileScan",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exec_kind_displays_as_its_tag() {
        assert_eq!(ExecKind::Cmd.to_string(), "cmd");
        assert_eq!(ExecKind::Powershell.to_string(), "powershell");
        assert_eq!(ExecKind::Python.to_string(), "python");
        assert_eq!(ExecKind::Bash.to_string(), "bash");
    }

    #[test]
    fn exec_request_defaults_apply_on_deserialize() {
        let req: ExecRequest = serde_json::from_str(r#"{"command":"echo hi"}"#).unwrap();
        assert_eq!(req.command, "echo hi");
        assert!(req.capture_stderr);
        assert!(!req.use_login_shell);
        assert!(req.timeout_ms.is_none());
        assert_eq!(req.effective_timeout(), Duration::from_millis(300_000));
    }

    #[test]
    fn exec_request_uses_camel_case_field_names() {
        let req = ExecRequest::new("ls").with_timeout_ms(1000);
        let json = serde_json::to_value(&req).unwrap();
        assert!(json.get("timeoutMs").is_some());
        assert!(json.get("captureStderr").is_some());
        assert!(json.get("useLoginShell").is_some());
        assert!(json.get("timeout_ms").is_none());
    }

    #[test]
    fn scan_options_default_depth_is_three() {
        let opts: FileScanOptions = serde_json::from_str(r#"{"rootPath":"/tmp"}"#).unwrap();
        assert_eq!(opts.max_depth, 3);
        assert!(!opts.follow_symlinks);
        assert!(!opts.include_hidden);
    }

    #[test]
    fn registry_options_default_depth_is_two() {
        let opts: RegistryQueryOptions =
            serde_json::from_str(r#"{"rootKey":"HKEY_LOCAL_MACHINE\\SOFTWARE"}"#).unwrap();
        assert_eq!(opts.max_depth, 2);
        assert!(opts.include_values);
    }

    #[test]
    fn wmi_request_default_namespace() {
        let req = WmiQueryRequest::new("SELECT * FROM Win32_OperatingSystem");
        assert_eq!(req.effective_namespace(), "ROOT\\CIMV2");
    }

    #[test]
    fn probe_request_parses_tagged_form() {
        let json = r#"{"kind":"bash","request":{"command":"echo hello"}}"#;
        let parsed: ProbeRequest = serde_json::from_str(json).unwrap();
        match parsed {
            ProbeRequest::Bash(req) => assert_eq!(req.command, "echo hello"),
            other => panic!("unexpected kind: {}", other.kind_tag()),
        }
    }

    #[test]
    fn probe_request_rejects_unknown_tag() {
        let json = r#"{"kind":"telnet","request":{"command":"x"}}"#;
        assert!(serde_json::from_str::<ProbeRequest>(json).is_err());
    }

    #[test]
    fn kind_tag_round_trips_through_serde() {
        let req = ProbeRequest::FileScan(FileScanOptions::new("/tmp"));
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["kind"], "fileScan");
    }
}
