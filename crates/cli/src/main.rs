//! Hostprobe CLI - Local harness for the probe execution engine
//!
//! Wires the facade against the real host adapters, executes one tagged
//! request and prints the JSON result. Ctrl+C cancels the running probe.

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use hostprobe_core::application::ProbeFacade;
use hostprobe_core::domain::{
    ExecKind, ExecRequest, FileScanOptions, ProbeRequest, RegistryQueryOptions, WmiQueryRequest,
};
use hostprobe_core::port::SystemTimeProvider;
use hostprobe_infra_host::{HostKeyStore, HostWmiProvider, TokioFileScanner, TokioProcessRunner};

#[derive(Parser)]
#[command(name = "hostprobe")]
#[command(about = "Run one probe operation on this host", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a shell/interpreter command
    Run {
        /// Command text
        command: String,

        /// Exec kind: cmd, powershell, python or bash
        #[arg(short, long, default_value = "bash")]
        kind: String,

        /// Timeout in milliseconds (default: 5 minutes)
        #[arg(short, long)]
        timeout_ms: Option<u64>,

        /// Working directory
        #[arg(short, long)]
        working_dir: Option<String>,

        /// Run as a login shell
        #[arg(long)]
        login: bool,

        /// Interpreter path override
        #[arg(long)]
        interpreter: Option<String>,
    },

    /// Run an instrumentation (WMI) query
    Wmi {
        /// WQL query text
        query: String,

        /// Namespace (default: ROOT\CIMV2)
        #[arg(short, long)]
        namespace: Option<String>,
    },

    /// Read a registry subtree
    Registry {
        /// Root key path, e.g. HKEY_LOCAL_MACHINE\SOFTWARE
        root_key: String,

        /// Maximum descent depth
        #[arg(short, long, default_value = "2")]
        max_depth: u32,

        /// Skip value collection
        #[arg(long)]
        no_values: bool,
    },

    /// Scan a directory tree
    Scan {
        /// Root path
        root_path: String,

        /// Maximum descent depth
        #[arg(short, long, default_value = "3")]
        max_depth: u32,

        /// Extension allow-list (repeatable)
        #[arg(short, long)]
        extension: Vec<String>,

        /// Follow directory symlinks
        #[arg(long)]
        follow_symlinks: bool,

        /// Include hidden entries
        #[arg(long)]
        hidden: bool,
    },

    /// Execute a raw (kind, payload) pair, as the transport would
    Raw {
        /// Operation kind tag
        kind: String,

        /// Request payload as a JSON string
        payload: String,
    },
}

fn init_logging() {
    let log_format = std::env::var("HOSTPROBE_LOG_FORMAT").unwrap_or_else(|_| "pretty".to_string());

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("hostprobe=info"))
        .expect("Failed to create env filter");

    match log_format.as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().json())
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().pretty())
                .init();
        }
    }
}

fn parse_exec_kind(kind: &str) -> Result<ExecKind> {
    match kind {
        "cmd" => Ok(ExecKind::Cmd),
        "powershell" => Ok(ExecKind::Powershell),
        "python" => Ok(ExecKind::Python),
        "bash" => Ok(ExecKind::Bash),
        other => anyhow::bail!("unknown exec kind: {other}"),
    }
}

enum Invocation {
    Typed(ProbeRequest),
    Raw {
        kind: String,
        payload: serde_json::Value,
    },
}

fn build_request(command: Commands) -> Result<Invocation> {
    let request = match command {
        Commands::Run {
            command,
            kind,
            timeout_ms,
            working_dir,
            login,
            interpreter,
        } => {
            let mut req = ExecRequest::new(command);
            req.timeout_ms = timeout_ms;
            req.working_dir = working_dir;
            req.use_login_shell = login;
            req.interpreter_path = interpreter;
            match parse_exec_kind(&kind)? {
                ExecKind::Cmd => ProbeRequest::Cmd(req),
                ExecKind::Powershell => ProbeRequest::Powershell(req),
                ExecKind::Python => ProbeRequest::Python(req),
                ExecKind::Bash => ProbeRequest::Bash(req),
            }
        }
        Commands::Wmi { query, namespace } => {
            let mut req = WmiQueryRequest::new(query);
            req.namespace = namespace;
            ProbeRequest::Wmi(req)
        }
        Commands::Registry {
            root_key,
            max_depth,
            no_values,
        } => {
            let mut options = RegistryQueryOptions::new(root_key);
            options.max_depth = max_depth;
            options.include_values = !no_values;
            ProbeRequest::Registry(options)
        }
        Commands::Scan {
            root_path,
            max_depth,
            extension,
            follow_symlinks,
            hidden,
        } => {
            let mut options = FileScanOptions::new(root_path);
            options.max_depth = max_depth;
            options.include_extensions = (!extension.is_empty()).then_some(extension);
            options.follow_symlinks = follow_symlinks;
            options.include_hidden = hidden;
            ProbeRequest::FileScan(options)
        }
        Commands::Raw { kind, payload } => {
            let payload: serde_json::Value =
                serde_json::from_str(&payload).context("payload is not valid JSON")?;
            return Ok(Invocation::Raw { kind, payload });
        }
    };
    Ok(Invocation::Typed(request))
}

#[tokio::main]
async fn main() -> Result<()> {
    init_logging();

    let cli = Cli::parse();

    // DI wiring against the real host adapters
    let facade = ProbeFacade::new(
        Arc::new(TokioProcessRunner::new(Arc::new(SystemTimeProvider))),
        Arc::new(HostWmiProvider::new()),
        Arc::new(HostKeyStore::new()),
        Arc::new(TokioFileScanner::new()),
    );

    let cancel = CancellationToken::new();
    let ctrl_c_cancel = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("interrupt received, cancelling probe");
            ctrl_c_cancel.cancel();
        }
    });

    let json = match build_request(cli.command)? {
        Invocation::Typed(request) => facade.execute(request, cancel).await?,
        Invocation::Raw { kind, payload } => facade.execute_raw(&kind, payload, cancel).await?,
    };

    println!("{json}");
    Ok(())
}
