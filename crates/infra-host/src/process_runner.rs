// Process Runner Implementation
// Spawns the child with piped output, drains stdout/stderr concurrently
// with the exit wait, and force-terminates the process tree when the
// deadline or the caller's cancellation fires first.

use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::AsyncReadExt;
use tokio::process::{Child, Command};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use hostprobe_core::domain::{ErrorInfo, ErrorKind, ExecRequest, ExecResult};
use hostprobe_core::port::{CommandSpec, ProcessRunner, TimeProvider};

/// Process runner backed by `tokio::process`.
///
/// The contract never errors: spawn failures, timeouts and cancellations
/// are all embedded into the returned `ExecResult`, and the spawned
/// process tree is terminated or confirmed exited on every return path.
pub struct TokioProcessRunner {
    time_provider: Arc<dyn TimeProvider>,
}

/// How long a pipe drain may keep running after the process tree was
/// killed. The group kill is best-effort: a descendant that left the
/// process group still holds the write end open and would otherwise
/// block the return forever.
const DRAIN_GRACE: Duration = Duration::from_millis(500);

enum WaitOutcome {
    Exited(std::process::ExitStatus),
    TimedOut,
    Cancelled,
    WaitFailed(std::io::Error),
}

impl TokioProcessRunner {
    pub fn new(time_provider: Arc<dyn TimeProvider>) -> Self {
        Self { time_provider }
    }

    fn build_command(spec: &CommandSpec, request: &ExecRequest) -> Command {
        let mut command = Command::new(&spec.program);
        command
            .args(&spec.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped());

        command.stderr(if request.capture_stderr {
            Stdio::piped()
        } else {
            Stdio::null()
        });

        if let Some(dir) = &request.working_dir {
            command.current_dir(dir);
        }
        // Overlay on top of the inherited environment
        if let Some(env) = &request.env {
            command.envs(env);
        }

        // Own process group so the whole tree can be signalled on kill
        #[cfg(unix)]
        command.process_group(0);

        command.kill_on_drop(true);
        command
    }
}

#[async_trait]
impl ProcessRunner for TokioProcessRunner {
    async fn run(
        &self,
        spec: CommandSpec,
        request: &ExecRequest,
        cancel: CancellationToken,
    ) -> ExecResult {
        let started_at = self.time_provider.now();
        let timeout = request.effective_timeout();
        let scope = cancel.child_token();

        info!(
            program = %spec.program,
            timeout_ms = timeout.as_millis() as u64,
            "starting process"
        );

        let mut child = match Self::build_command(&spec, request).spawn() {
            Ok(child) => child,
            Err(err) => {
                let ended_at = self.time_provider.now();
                return ExecResult::failed(
                    ErrorInfo::new(
                        ErrorKind::ProcessSpawnError,
                        format!("failed to spawn {}: {}", spec.program, err),
                    ),
                    started_at,
                    ended_at,
                );
            }
        };

        let pid = child.id();

        // Drain both pipes concurrently with the exit wait. An unread full
        // pipe buffer would otherwise deadlock the child before it exits.
        let stdout_task = drain(child.stdout.take());
        let stderr_task = drain(child.stderr.take());

        let outcome = tokio::select! {
            status = child.wait() => match status {
                Ok(status) => WaitOutcome::Exited(status),
                Err(err) => WaitOutcome::WaitFailed(err),
            },
            _ = scope.cancelled() => WaitOutcome::Cancelled,
            _ = tokio::time::sleep(timeout) => WaitOutcome::TimedOut,
        };

        let killed = !matches!(outcome, WaitOutcome::Exited(_));
        if killed {
            kill_process_tree(&mut child, pid).await;
        }

        // The drains are always awaited before the result is finalized.
        // After a kill the pipes normally hit EOF at once, but an escaped
        // descendant can keep the write end open, so the join is bounded
        // and the output captured so far is returned.
        let bound = killed.then_some(DRAIN_GRACE);
        let std_out = stdout_task.finish(bound).await;
        let std_err = stderr_task.finish(bound).await;
        let ended_at = self.time_provider.now();

        let result = match outcome {
            WaitOutcome::Exited(status) => {
                let exit_code = status.code().unwrap_or(-1);
                ExecResult::completed(exit_code, std_out, std_err, started_at, ended_at)
            }
            WaitOutcome::TimedOut => ExecResult::terminated(
                ErrorKind::Timeout,
                format!("process exceeded {}ms deadline", timeout.as_millis()),
                std_out,
                std_err,
                started_at,
                ended_at,
            ),
            WaitOutcome::Cancelled => ExecResult::terminated(
                ErrorKind::Cancelled,
                "process cancelled by caller",
                std_out,
                std_err,
                started_at,
                ended_at,
            ),
            WaitOutcome::WaitFailed(err) => ExecResult::failed(
                ErrorInfo::new(ErrorKind::Unknown, format!("wait failed: {}", err)),
                started_at,
                ended_at,
            ),
        };

        info!(
            program = %spec.program,
            exit_code = result.exit_code,
            timed_out = result.timed_out,
            duration_ms = result.duration_ms,
            "process finished"
        );
        result
    }
}

/// A pipe drain whose captured bytes survive abandoning the read task.
struct PipeDrain {
    buf: Arc<Mutex<Vec<u8>>>,
    task: JoinHandle<()>,
}

impl PipeDrain {
    /// Await the drain, optionally bounded. Past the bound the task is
    /// aborted and whatever arrived so far is returned.
    async fn finish(self, bound: Option<Duration>) -> String {
        let PipeDrain { buf, mut task } = self;
        match bound {
            None => {
                if let Err(err) = (&mut task).await {
                    warn!(error = %err, "output drain task failed");
                }
            }
            Some(grace) => match tokio::time::timeout(grace, &mut task).await {
                Ok(Err(err)) => warn!(error = %err, "output drain task failed"),
                Ok(Ok(())) => {}
                Err(_) => {
                    warn!(
                        grace_ms = grace.as_millis() as u64,
                        "pipe still open after kill, abandoning drain"
                    );
                    task.abort();
                }
            },
        }
        let bytes = buf.lock().await;
        String::from_utf8_lossy(&bytes).into_owned()
    }
}

fn drain<R>(pipe: Option<R>) -> PipeDrain
where
    R: tokio::io::AsyncRead + Unpin + Send + 'static,
{
    let buf = Arc::new(Mutex::new(Vec::new()));
    let sink = buf.clone();
    let task = tokio::spawn(async move {
        let Some(mut reader) = pipe else { return };
        let mut chunk = [0u8; 8192];
        loop {
            match reader.read(&mut chunk).await {
                Ok(0) => break,
                Ok(n) => sink.lock().await.extend_from_slice(&chunk[..n]),
                // Read error mid-stream: keep whatever arrived before it
                Err(_) => break,
            }
        }
    });
    PipeDrain { buf, task }
}

/// Best-effort termination of the whole process tree. Failures are logged
/// and swallowed so they never mask the timeout/cancellation outcome.
async fn kill_process_tree(child: &mut Child, pid: Option<u32>) {
    #[cfg(unix)]
    {
        use nix::sys::signal::{killpg, Signal};
        use nix::unistd::Pid;

        // The child was spawned as its own process group leader
        if let Some(pid) = pid {
            if let Err(err) = killpg(Pid::from_raw(pid as i32), Signal::SIGKILL) {
                warn!(pid, error = %err, "failed to signal process group");
            }
        }
    }

    #[cfg(windows)]
    {
        if let Some(pid) = pid {
            match Command::new("taskkill")
                .args(["/F", "/T", "/PID", &pid.to_string()])
                .output()
                .await
            {
                Ok(output) if !output.status.success() => {
                    warn!(pid, "taskkill reported failure");
                }
                Err(err) => warn!(pid, error = %err, "failed to run taskkill"),
                _ => {}
            }
        }
    }

    // Direct kill also reaps the child, confirming termination
    if let Err(err) = child.kill().await {
        warn!(error = %err, "failed to kill child process");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::time::Duration;

    use hostprobe_core::port::SystemTimeProvider;

    fn runner() -> TokioProcessRunner {
        TokioProcessRunner::new(Arc::new(SystemTimeProvider))
    }

    fn sh(command: &str) -> CommandSpec {
        CommandSpec::new("sh", vec!["-c".to_string(), command.to_string()])
    }

    #[tokio::test]
    async fn captures_stdout_on_success() {
        let request = ExecRequest::new("echo hello");
        let result = runner()
            .run(sh("echo hello"), &request, CancellationToken::new())
            .await;

        assert!(result.success);
        assert_eq!(result.exit_code, 0);
        assert!(result.std_out.contains("hello"));
        assert!(!result.timed_out);
        assert!(result.error.is_none());
        assert!(result.started_at <= result.ended_at);
        assert!(result.duration_ms >= 0);
    }

    #[tokio::test]
    async fn nonzero_exit_is_not_success() {
        let request = ExecRequest::new("exit 3");
        let result = runner()
            .run(sh("exit 3"), &request, CancellationToken::new())
            .await;

        assert_eq!(result.exit_code, 3);
        assert!(!result.success);
        assert!(result.error.is_none());
    }

    #[tokio::test]
    async fn captures_stderr_when_enabled() {
        let request = ExecRequest::new("echo oops >&2");
        let result = runner()
            .run(sh("echo oops >&2"), &request, CancellationToken::new())
            .await;

        assert!(result.std_err.contains("oops"));
    }

    #[tokio::test]
    async fn stderr_empty_when_capture_disabled() {
        let mut request = ExecRequest::new("echo oops >&2");
        request.capture_stderr = false;
        let result = runner()
            .run(sh("echo oops >&2"), &request, CancellationToken::new())
            .await;

        assert!(result.success);
        assert!(result.std_err.is_empty());
    }

    #[tokio::test]
    async fn env_overlay_reaches_the_child() {
        let mut request = ExecRequest::new("echo $PROBE_MARKER");
        request.env = Some(HashMap::from([(
            "PROBE_MARKER".to_string(),
            "overlay-value".to_string(),
        )]));
        let result = runner()
            .run(sh("echo $PROBE_MARKER"), &request, CancellationToken::new())
            .await;

        assert!(result.std_out.contains("overlay-value"));
    }

    #[tokio::test]
    async fn working_dir_is_applied() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("marker.txt"), b"x").unwrap();

        let mut request = ExecRequest::new("ls");
        request.working_dir = Some(dir.path().to_string_lossy().into_owned());
        let result = runner()
            .run(sh("ls"), &request, CancellationToken::new())
            .await;

        assert!(result.std_out.contains("marker.txt"));
    }

    #[tokio::test]
    async fn spawn_failure_is_embedded() {
        let request = ExecRequest::new("whatever");
        let spec = CommandSpec::new("hostprobe-no-such-binary", vec![]);
        let result = runner().run(spec, &request, CancellationToken::new()).await;

        assert_eq!(result.exit_code, -1);
        assert!(!result.timed_out);
        assert_eq!(result.error.unwrap().kind, ErrorKind::ProcessSpawnError);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn timeout_kills_the_process() {
        use nix::sys::signal::kill;
        use nix::unistd::Pid;

        let dir = tempfile::tempdir().unwrap();
        let pid_file = dir.path().join("pid");
        let script = format!("echo $$ > {}; sleep 10", pid_file.display());

        let request = ExecRequest::new(script.clone()).with_timeout_ms(300);
        let result = runner()
            .run(sh(&script), &request, CancellationToken::new())
            .await;

        assert!(result.timed_out);
        assert_eq!(result.exit_code, -1);
        assert!(!result.success);
        assert_eq!(result.error.as_ref().unwrap().kind, ErrorKind::Timeout);

        // The shell wrote its own pid before sleeping; it must be gone now
        let pid: i32 = std::fs::read_to_string(&pid_file)
            .unwrap()
            .trim()
            .parse()
            .unwrap();
        // Give the kernel a moment to reap the group
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(kill(Pid::from_raw(pid), None).is_err(), "process still alive");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn escaped_descendant_does_not_block_the_return() {
        // setsid moves the grandchild out of the process group, so the
        // group kill misses it and it keeps the stdout write end open
        let script = "echo before; setsid sleep 3 & sleep 10";
        let request = ExecRequest::new(script).with_timeout_ms(300);

        let started = std::time::Instant::now();
        let result = runner()
            .run(sh(script), &request, CancellationToken::new())
            .await;
        let elapsed = started.elapsed();

        assert!(result.timed_out);
        assert_eq!(result.error.as_ref().unwrap().kind, ErrorKind::Timeout);
        // Deadline plus both drain grace windows, with headroom
        assert!(
            elapsed < Duration::from_secs(2),
            "run() held past the drain grace: {elapsed:?}"
        );
        // Output written before the kill survives the abandoned drain
        assert!(result.std_out.contains("before"));
    }

    #[tokio::test]
    async fn caller_cancel_is_distinguishable_from_timeout() {
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(100)).await;
            trigger.cancel();
        });

        let request = ExecRequest::new("sleep 10").with_timeout_ms(60_000);
        let result = runner().run(sh("sleep 10"), &request, cancel).await;

        assert!(result.timed_out);
        assert_eq!(result.exit_code, -1);
        assert_eq!(result.error.unwrap().kind, ErrorKind::Cancelled);
    }

    #[tokio::test]
    async fn duration_never_negative_even_with_skewed_clock() {
        use chrono::{TimeZone, Utc};
        use hostprobe_core::port::time_provider::mocks::ScriptedTimeProvider;

        // Clock steps backwards between start and end
        let clock = ScriptedTimeProvider::new(vec![
            Utc.timestamp_millis_opt(2000).unwrap(),
            Utc.timestamp_millis_opt(1000).unwrap(),
        ]);
        let runner = TokioProcessRunner::new(Arc::new(clock));

        let request = ExecRequest::new("true");
        let result = runner
            .run(sh("true"), &request, CancellationToken::new())
            .await;

        assert!(result.success);
        assert_eq!(result.duration_ms, 0);
    }

    #[tokio::test]
    async fn large_output_does_not_deadlock() {
        // Well past the OS pipe buffer; requires the drains to run
        // concurrently with the exit wait
        let script = "yes 0123456789abcdef | head -n 40000";
        let request = ExecRequest::new(script).with_timeout_ms(30_000);
        let result = runner()
            .run(sh(script), &request, CancellationToken::new())
            .await;

        assert!(result.success);
        assert!(result.std_out.len() > 400_000);
    }

    #[tokio::test]
    async fn partial_output_retained_on_timeout() {
        let script = "echo before-sleep; sleep 10";
        let request = ExecRequest::new(script).with_timeout_ms(300);
        let result = runner()
            .run(sh(script), &request, CancellationToken::new())
            .await;

        assert!(result.timed_out);
        assert!(result.std_out.contains("before-sleep"));
    }
}
