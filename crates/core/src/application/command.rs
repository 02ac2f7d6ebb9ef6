// Command Executors
// Argument-vector construction per exec kind. No timeout or cancellation
// logic lives here - all of it is inherited from the process runner.

use crate::domain::{ExecKind, ExecRequest};
use crate::port::CommandSpec;

/// Build the program + argument vector for one exec kind.
///
/// Differences between kinds are confined to interpreter resolution and
/// flag layout; the command text is always passed as a single argument,
/// never re-tokenized.
pub fn build_spec(kind: ExecKind, request: &ExecRequest) -> CommandSpec {
    match kind {
        ExecKind::Cmd => native_shell_spec(request),
        ExecKind::Powershell => powershell_spec(request),
        ExecKind::Python => python_spec(request),
        ExecKind::Bash => bash_spec(request),
    }
}

fn native_shell_spec(request: &ExecRequest) -> CommandSpec {
    if cfg!(windows) {
        CommandSpec::new("cmd.exe", vec!["/C".to_string(), request.command.clone()])
    } else {
        let flag = if request.use_login_shell { "-lc" } else { "-c" };
        CommandSpec::new("sh", vec![flag.to_string(), request.command.clone()])
    }
}

fn powershell_spec(request: &ExecRequest) -> CommandSpec {
    let program = request
        .interpreter_path
        .clone()
        .unwrap_or_else(|| default_powershell().to_string());
    CommandSpec::new(
        program,
        vec![
            "-NoProfile".to_string(),
            "-NonInteractive".to_string(),
            "-Command".to_string(),
            request.command.clone(),
        ],
    )
}

fn python_spec(request: &ExecRequest) -> CommandSpec {
    let program = request
        .interpreter_path
        .clone()
        .unwrap_or_else(|| default_python().to_string());
    CommandSpec::new(program, vec!["-c".to_string(), request.command.clone()])
}

fn bash_spec(request: &ExecRequest) -> CommandSpec {
    let flag = if request.use_login_shell { "-lc" } else { "-c" };
    CommandSpec::new("bash", vec![flag.to_string(), request.command.clone()])
}

fn default_powershell() -> &'static str {
    if cfg!(windows) {
        "powershell"
    } else {
        "pwsh"
    }
}

fn default_python() -> &'static str {
    if cfg!(windows) {
        "python"
    } else {
        "python3"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bash_spec_passes_command_as_single_argument() {
        let req = ExecRequest::new("echo 'a b' | wc -w");
        let spec = build_spec(ExecKind::Bash, &req);
        assert_eq!(spec.program, "bash");
        assert_eq!(spec.args, vec!["-c", "echo 'a b' | wc -w"]);
    }

    #[test]
    fn bash_login_shell_uses_lc_flag() {
        let mut req = ExecRequest::new("env");
        req.use_login_shell = true;
        let spec = build_spec(ExecKind::Bash, &req);
        assert_eq!(spec.args[0], "-lc");
    }

    #[test]
    fn interpreter_path_overrides_python_default() {
        let mut req = ExecRequest::new("print(1)");
        req.interpreter_path = Some("/opt/python/bin/python3.12".to_string());
        let spec = build_spec(ExecKind::Python, &req);
        assert_eq!(spec.program, "/opt/python/bin/python3.12");
        assert_eq!(spec.args, vec!["-c", "print(1)"]);
    }

    #[test]
    fn interpreter_path_overrides_powershell_default() {
        let mut req = ExecRequest::new("Get-Date");
        req.interpreter_path = Some("pwsh-preview".to_string());
        let spec = build_spec(ExecKind::Powershell, &req);
        assert_eq!(spec.program, "pwsh-preview");
        assert_eq!(spec.args[0], "-NoProfile");
        assert_eq!(spec.args[3], "Get-Date");
    }

    #[cfg(unix)]
    #[test]
    fn cmd_kind_falls_back_to_sh_on_unix() {
        let req = ExecRequest::new("echo hi");
        let spec = build_spec(ExecKind::Cmd, &req);
        assert_eq!(spec.program, "sh");
        assert_eq!(spec.args, vec!["-c", "echo hi"]);
    }
}
