// Process Runner Port
// Abstraction over spawning a host process and collecting its output

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::domain::{ExecRequest, ExecResult};

/// Program name plus fully-built argument vector.
///
/// Built by the command executors; the runner performs no shell
/// re-interpretation of its own.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
}

impl CommandSpec {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }
}

/// Process runner trait
///
/// The contract never errors: every failure (spawn, timeout, cancellation)
/// is embedded into the returned `ExecResult`. Implementations must
/// guarantee the spawned process tree is terminated or confirmed exited on
/// every return path.
#[async_trait]
pub trait ProcessRunner: Send + Sync {
    async fn run(
        &self,
        spec: CommandSpec,
        request: &ExecRequest,
        cancel: CancellationToken,
    ) -> ExecResult;
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use std::sync::{Arc, Mutex};

    use chrono::Utc;

    use crate::domain::{ErrorInfo, ErrorKind};

    /// Mock runner behavior
    #[derive(Debug, Clone)]
    pub enum MockBehavior {
        /// Exit 0 with the given stdout
        Succeed(String),
        /// Exit with the given non-zero code
        ExitWith(i32),
        /// Report a spawn failure
        SpawnFail(String),
        /// Report a timeout termination
        TimeOut,
    }

    /// Mock process runner that records every spec it receives
    pub struct MockProcessRunner {
        behavior: MockBehavior,
        specs: Arc<Mutex<Vec<CommandSpec>>>,
    }

    impl MockProcessRunner {
        pub fn new(behavior: MockBehavior) -> Self {
            Self {
                behavior,
                specs: Arc::new(Mutex::new(Vec::new())),
            }
        }

        pub fn received_specs(&self) -> Vec<CommandSpec> {
            self.specs.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ProcessRunner for MockProcessRunner {
        async fn run(
            &self,
            spec: CommandSpec,
            _request: &ExecRequest,
            _cancel: CancellationToken,
        ) -> ExecResult {
            self.specs.lock().unwrap().push(spec);
            let now = Utc::now();
            match &self.behavior {
                MockBehavior::Succeed(out) => {
                    ExecResult::completed(0, out.clone(), String::new(), now, now)
                }
                MockBehavior::ExitWith(code) => {
                    ExecResult::completed(*code, String::new(), String::new(), now, now)
                }
                MockBehavior::SpawnFail(msg) => ExecResult::failed(
                    ErrorInfo::new(ErrorKind::ProcessSpawnError, msg.clone()),
                    now,
                    now,
                ),
                MockBehavior::TimeOut => ExecResult::terminated(
                    ErrorKind::Timeout,
                    "deadline exceeded",
                    String::new(),
                    String::new(),
                    now,
                    now,
                ),
            }
        }
    }
}
