// Execution Facade
// Single entry point: dispatches a tagged probe request to the matching
// service and serializes the typed result to JSON.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::application::command;
use crate::application::registry::RegistryQueryService;
use crate::application::wmi::InstrumentationQueryService;
use crate::domain::{
    ExecKind, ExecRequest, ExecResult, FileEntry, FileScanOptions, ProbeRequest, RegistryNode,
    RegistryQueryOptions, WmiQueryRequest,
};
use crate::error::{ProbeError, Result};
use crate::port::{FileScanner, InstrumentationProvider, KeyStore, ProcessRunner, WmiRow};

/// Dispatch facade over the seven probe operation kinds.
///
/// Operational failures never cross this boundary as errors: command kinds
/// embed them in the `ExecResult`, query kinds serialize to an
/// `{"error": ...}` envelope. The only fail-fast paths are an unknown
/// operation tag and a payload that does not match the kind's shape.
pub struct ProbeFacade {
    runner: Arc<dyn ProcessRunner>,
    instrumentation: InstrumentationQueryService,
    registry: RegistryQueryService,
    scanner: Arc<dyn FileScanner>,
}

impl ProbeFacade {
    pub fn new(
        runner: Arc<dyn ProcessRunner>,
        provider: Arc<dyn InstrumentationProvider>,
        store: Arc<dyn KeyStore>,
        scanner: Arc<dyn FileScanner>,
    ) -> Self {
        Self {
            runner,
            instrumentation: InstrumentationQueryService::new(provider),
            registry: RegistryQueryService::new(store),
            scanner,
        }
    }

    /// Dispatch a pre-parsed request and serialize its result.
    pub async fn execute(
        &self,
        request: ProbeRequest,
        cancel: CancellationToken,
    ) -> Result<String> {
        let kind = request.kind_tag();
        info!(kind, "dispatching probe request");

        match request {
            ProbeRequest::Cmd(req) => self.exec_to_json(ExecKind::Cmd, &req, cancel).await,
            ProbeRequest::Powershell(req) => {
                self.exec_to_json(ExecKind::Powershell, &req, cancel).await
            }
            ProbeRequest::Python(req) => self.exec_to_json(ExecKind::Python, &req, cancel).await,
            ProbeRequest::Bash(req) => self.exec_to_json(ExecKind::Bash, &req, cancel).await,
            ProbeRequest::Wmi(req) => {
                envelope(self.query_wmi(&req, cancel).await)
            }
            ProbeRequest::Registry(options) => {
                envelope(self.query_registry(&options).await)
            }
            ProbeRequest::FileScan(options) => {
                envelope(self.scan_files(&options, cancel).await)
            }
        }
    }

    /// Dispatch a raw (kind, payload) pair.
    ///
    /// Fails fast, before any I/O, with `UnsupportedOperation` for an
    /// unknown tag and `InvalidRequest` for a payload of the wrong shape.
    pub async fn execute_raw(
        &self,
        kind: &str,
        payload: serde_json::Value,
        cancel: CancellationToken,
    ) -> Result<String> {
        if !ProbeRequest::KIND_TAGS.contains(&kind) {
            warn!(kind, "rejecting unknown operation kind");
            return Err(ProbeError::UnsupportedOperation(kind.to_string()));
        }

        let tagged = serde_json::json!({ "kind": kind, "request": payload });
        let request: ProbeRequest = serde_json::from_value(tagged)
            .map_err(|err| ProbeError::InvalidRequest(err.to_string()))?;

        self.execute(request, cancel).await
    }

    /// Typed entry point: run a command of the given kind.
    pub async fn run_command(
        &self,
        kind: ExecKind,
        request: &ExecRequest,
        cancel: CancellationToken,
    ) -> ExecResult {
        let spec = command::build_spec(kind, request);
        info!(kind = %kind, program = %spec.program, "running command");
        self.runner.run(spec, request, cancel).await
    }

    /// Typed entry point: instrumentation query.
    pub async fn query_wmi(
        &self,
        request: &WmiQueryRequest,
        cancel: CancellationToken,
    ) -> Result<Vec<WmiRow>> {
        self.instrumentation.query(request, cancel).await
    }

    /// Typed entry point: registry tree query.
    pub async fn query_registry(&self, options: &RegistryQueryOptions) -> Result<RegistryNode> {
        self.registry.query(options).await
    }

    /// Typed entry point: bounded filesystem scan.
    pub async fn scan_files(
        &self,
        options: &FileScanOptions,
        cancel: CancellationToken,
    ) -> Result<Vec<FileEntry>> {
        self.scanner.scan(options, cancel).await
    }

    async fn exec_to_json(
        &self,
        kind: ExecKind,
        request: &ExecRequest,
        cancel: CancellationToken,
    ) -> Result<String> {
        let result = self.run_command(kind, request, cancel).await;
        Ok(serde_json::to_string(&result)?)
    }
}

/// Serialize a query outcome, folding operational failures into an error
/// envelope so every kind returns a normally-shaped JSON body.
fn envelope<T: serde::Serialize>(outcome: Result<T>) -> Result<String> {
    match outcome {
        Ok(value) => Ok(serde_json::to_string(&value)?),
        Err(err) => {
            let body = serde_json::json!({ "error": err.to_error_info() });
            Ok(serde_json::to_string(&body)?)
        }
    }
}
