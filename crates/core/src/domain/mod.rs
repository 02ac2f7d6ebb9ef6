// Domain Layer - Probe request/response models

pub mod error;
pub mod request;
pub mod result;

pub use error::{ErrorInfo, ErrorKind};
pub use request::{
    ExecKind, ExecRequest, FileScanOptions, ProbeRequest, RegistryQueryOptions, WmiQueryRequest,
    DEFAULT_TIMEOUT_MS, DEFAULT_WMI_NAMESPACE,
};
pub use result::{ExecResult, FileEntry, RegistryNode};
