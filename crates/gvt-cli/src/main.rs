//! gvt CLI — snapshot, inspect and restore individual files.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process;

use clap::error::{ContextKind, ContextValue, ErrorKind};
use clap::{ArgAction, Parser, Subcommand};
use gvt_core::{GvtError, Repository, VersionId};
use tracing::error;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "gvt", about = "gvt — single-user file versioning", version)]
struct Cli {
    /// Working area root (defaults to the current directory).
    #[arg(short = 'C', long = "dir", env = "GVT_DIR", global = true)]
    dir: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize a repository in the working area.
    Init,

    /// Start tracking a file.
    Add {
        /// File to add, relative to the working area.
        file: Option<String>,

        /// Version message.
        #[arg(short, long)]
        message: Option<String>,
    },

    /// Record the current content of a tracked file.
    Commit {
        /// File to commit, relative to the working area.
        file: Option<String>,

        /// Version message.
        #[arg(short, long)]
        message: Option<String>,
    },

    /// Stop tracking a file. The working copy is kept.
    Detach {
        /// File to detach.
        file: Option<String>,

        /// Version message.
        #[arg(short, long)]
        message: Option<String>,
    },

    /// Restore the working area to a version.
    Checkout {
        /// Version number.
        #[arg(value_name = "VERSION")]
        target: Option<String>,

        /// Output format: "human" (default) or "json".
        #[arg(long, default_value = "human")]
        format: String,
    },

    /// List versions, newest first.
    History {
        /// Show only the last N versions.
        #[arg(long, value_name = "N", allow_hyphen_values = true)]
        last: Option<String>,

        /// Output format: "human" (default) or "json".
        #[arg(long, default_value = "human")]
        format: String,
    },

    /// Show a version's full message (the active version by default).
    Version {
        /// Version number.
        #[arg(value_name = "VERSION")]
        id: Option<String>,

        /// Output format: "human" (default) or "json".
        #[arg(long, default_value = "human")]
        format: String,
    },
}

/// Outcome of one invocation: exit code, stdout message, stderr detail.
#[derive(Debug, PartialEq)]
struct Report {
    code: i32,
    message: String,
    detail: Option<String>,
}

impl Report {
    fn ok(message: impl Into<String>) -> Self {
        Self::exit(0, message)
    }

    fn exit(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            detail: None,
        }
    }

    /// A failure whose cause is printed to stderr for the operator.
    fn system(code: i32, message: impl Into<String>, err: &GvtError) -> Self {
        error!(error = %err, "underlying system problem");
        Self {
            code,
            message: message.into(),
            detail: Some(format!("{err:?}")),
        }
    }

    fn emit(&self) {
        if let Some(ref detail) = self.detail {
            eprintln!("error: {detail}");
        }
        if self.message.ends_with('\n') {
            print!("{}", self.message);
        } else {
            println!("{}", self.message);
        }
    }
}

const NOT_INITIALIZED: &str =
    "Current directory is not initialized. Please use init command to initialize.";
const SYSTEM_PROBLEM: &str = "Underlying system problem. See ERR for details.";

fn main() {
    let cli = match Cli::try_parse_from(normalize_args(std::env::args_os())) {
        Ok(cli) => cli,
        Err(e) => match unknown_command(&e) {
            Some(report) => {
                report.emit();
                process::exit(report.code);
            }
            None => e.exit(),
        },
    };
    init_logging(cli.verbose);

    let root = match cli.dir.clone() {
        Some(dir) => dir,
        None => std::env::current_dir().unwrap_or_else(|e| {
            eprintln!("error: cannot determine current directory: {e}");
            process::exit(1);
        }),
    };

    let report = run(&cli, &root);
    report.emit();
    process::exit(report.code);
}

/// Accept the single-dash `-last` spelling alongside `--last`.
fn normalize_args(args: impl Iterator<Item = OsString>) -> Vec<OsString> {
    args.map(|a| if a == "-last" { OsString::from("--last") } else { a })
        .collect()
}

/// The `Unknown command <x>.` reply for a word that names no subcommand.
///
/// Other parse errors keep clap's own usage output.
fn unknown_command(err: &clap::Error) -> Option<Report> {
    if err.kind() != ErrorKind::InvalidSubcommand {
        return None;
    }
    match err.get(ContextKind::InvalidSubcommand) {
        Some(ContextValue::String(name)) => {
            Some(Report::exit(1, format!("Unknown command {name}.")))
        }
        _ => None,
    }
}

/// Log to stderr; `RUST_LOG` overrides the `-v` level.
fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| level.into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn run(cli: &Cli, root: &Path) -> Report {
    let Some(ref command) = cli.command else {
        return Report::exit(1, "Please specify command.");
    };

    match command {
        Commands::Init => cmd_init(root),
        Commands::Add { file, message } => {
            with_repo(root, |repo| cmd_add(repo, file.as_deref(), message.as_deref()))
        }
        Commands::Commit { file, message } => {
            with_repo(root, |repo| cmd_commit(repo, file.as_deref(), message.as_deref()))
        }
        Commands::Detach { file, message } => {
            with_repo(root, |repo| cmd_detach(repo, file.as_deref(), message.as_deref()))
        }
        Commands::Checkout { target, format } => {
            with_repo(root, |repo| cmd_checkout(repo, target.as_deref(), format))
        }
        Commands::History { last, format } => {
            with_repo(root, |repo| cmd_history(repo, last.as_deref(), format))
        }
        Commands::Version { id, format } => {
            with_repo(root, |repo| cmd_version(repo, id.as_deref(), format))
        }
    }
}

/// Open the repository at `root` and hand it to `f`.
fn with_repo(root: &Path, f: impl FnOnce(&Repository) -> Report) -> Report {
    match Repository::open(root) {
        Ok(repo) => f(&repo),
        Err(e) => common_failure(&e),
    }
}

/// Replies shared by every command.
fn common_failure(err: &GvtError) -> Report {
    match err {
        GvtError::NotInitialized => Report::exit(-2, NOT_INITIALIZED),
        GvtError::NoSuchVersion(arg) => Report::exit(60, format!("Invalid version number: {arg}")),
        GvtError::InvalidPath(path) => Report::exit(1, format!("Invalid file path: {path}")),
        e if e.is_system() => Report::system(-3, SYSTEM_PROBLEM, e),
        e => Report::exit(1, e.to_string()),
    }
}

fn cmd_init(root: &Path) -> Report {
    match Repository::init(root) {
        Ok(_) => Report::ok("Current directory initialized successfully."),
        Err(GvtError::AlreadyInitialized) => {
            Report::exit(10, "Current directory is already initialized.")
        }
        Err(e) => common_failure(&e),
    }
}

fn cmd_add(repo: &Repository, file: Option<&str>, message: Option<&str>) -> Report {
    let Some(file) = file else {
        return Report::exit(20, "Please specify file to add.");
    };

    match repo.add(file, message) {
        Ok(_) => Report::ok(format!("File added successfully. File: {file}")),
        Err(GvtError::AlreadyTracked(_)) => Report::ok(format!("File already added. File: {file}")),
        Err(GvtError::SourceFileMissing(_)) => {
            Report::exit(21, format!("File not found. File: {file}"))
        }
        Err(e) if e.is_system() => Report::system(
            22,
            format!("File cannot be added. See ERR for details. File: {file}"),
            &e,
        ),
        Err(e) => common_failure(&e),
    }
}

fn cmd_commit(repo: &Repository, file: Option<&str>, message: Option<&str>) -> Report {
    let Some(file) = file else {
        return Report::exit(50, "Please specify file to commit.");
    };

    match repo.commit(file, message) {
        Ok(_) => Report::ok(format!("File committed successfully. File: {file}")),
        Err(GvtError::NotTracked(_)) => {
            Report::ok(format!("File is not added to gvt. File: {file}"))
        }
        Err(GvtError::SourceFileMissing(_)) => {
            Report::exit(51, format!("File not found. File: {file}"))
        }
        Err(e) if e.is_system() => Report::system(
            52,
            format!("File cannot be committed, see ERR for details. File: {file}"),
            &e,
        ),
        Err(e) => common_failure(&e),
    }
}

fn cmd_detach(repo: &Repository, file: Option<&str>, message: Option<&str>) -> Report {
    let Some(file) = file else {
        return Report::exit(30, "Please specify file to detach.");
    };

    match repo.detach(file, message) {
        Ok(_) => Report::ok(format!("File detached successfully. File: {file}")),
        Err(GvtError::NotTracked(_)) => {
            Report::ok(format!("File is not added to gvt. File: {file}"))
        }
        Err(e) if e.is_system() => Report::system(
            31,
            format!("File cannot be detached, see ERR for details. File: {file}"),
            &e,
        ),
        Err(e) => common_failure(&e),
    }
}

fn cmd_checkout(repo: &Repository, target: Option<&str>, format: &str) -> Report {
    let Some(target) = target else {
        return Report::exit(60, "Invalid version number: ");
    };

    let result = repo
        .resolve_version(target)
        .and_then(|id| repo.checkout(id));

    match result {
        Ok(report) => match format {
            "json" => to_json(&report),
            _ => Report::ok(format!("Checkout successful for version: {}", report.version)),
        },
        Err(e) => common_failure(&e),
    }
}

fn cmd_history(repo: &Repository, last: Option<&str>, format: &str) -> Report {
    // Non-positive shows nothing; unparsable shows everything.
    let limit = last.and_then(|s| s.trim().parse::<i64>().ok()).map(|n| {
        if n <= 0 {
            0
        } else {
            usize::try_from(n).unwrap_or(usize::MAX)
        }
    });

    let entries = match repo
        .history(limit)
        .and_then(|history| history.collect::<Result<Vec<_>, _>>())
    {
        Ok(entries) => entries,
        Err(e) => return common_failure(&e),
    };

    match format {
        "json" => to_json(&entries),
        _ => {
            let mut out = String::new();
            for entry in &entries {
                out.push_str(&format!("{}: {}\n", entry.id, entry.summary));
            }
            Report::ok(out)
        }
    }
}

fn cmd_version(repo: &Repository, id: Option<&str>, format: &str) -> Report {
    let result = match id {
        Some(arg) => repo.resolve_version(arg).map(Some),
        None => Ok(None::<VersionId>),
    }
    .and_then(|id| repo.describe_version(id));

    match result {
        Ok(info) => match format {
            "json" => to_json(&info),
            _ => Report::ok(format!("Version: {}\n{}", info.id, info.message)),
        },
        Err(e) => common_failure(&e),
    }
}

fn to_json<T: serde::Serialize>(value: &T) -> Report {
    match serde_json::to_string_pretty(value) {
        Ok(json) => Report::ok(json),
        Err(e) => Report::exit(-3, format!("{SYSTEM_PROBLEM} ({e})")),
    }
}
