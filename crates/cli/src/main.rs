// clean-templates - remove duplicate catalog templates from the document store

mod credentials;
mod exit_codes;
mod firestore;
mod interrupt;
mod settings;
mod summary;

use std::io;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use sitebook_recon::{CancelToken, RunStatus};

use credentials::TargetFlags;
use exit_codes::{run_exit_code, EXIT_ERROR, EXIT_SUCCESS, EXIT_USAGE};
use firestore::FirestoreStore;

#[derive(Parser)]
#[command(name = "clean-templates")]
#[command(about = "Remove duplicate catalog templates, keeping one record per tenant and value")]
#[command(long_version = long_version())]
#[command(version)]
#[command(after_help = "\
Examples:
  clean-templates
  clean-templates --dry-run
  clean-templates --type boq_units --type stock_units
  clean-templates --json --output report.json
  FIRESTORE_EMULATOR_HOST=localhost:8080 FIREBASE_PROJECT_ID=demo clean-templates

Exit codes: 0 success, 3 partial failure, 4 failure, 5 missing credentials,
6 invalid config, 7 cancelled.")]
struct Cli {
    /// Config file (default: <config dir>/sitebook/clean-templates.toml when present)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Firebase project id (default: FIREBASE_PROJECT_ID or GOOGLE_CLOUD_PROJECT env)
    #[arg(long)]
    project: Option<String>,

    /// Firestore database id
    #[arg(long)]
    database: Option<String>,

    /// OAuth access token (default: FIRESTORE_ACCESS_TOKEN or GOOGLE_OAUTH_ACCESS_TOKEN env)
    #[arg(long)]
    access_token: Option<String>,

    /// Only process this catalog type (repeatable; overrides the config list)
    #[arg(long = "type", value_name = "TYPE")]
    types: Vec<String>,

    /// Report what would be deleted without deleting
    #[arg(long)]
    dry_run: bool,

    /// Print the JSON report to stdout
    #[arg(long)]
    json: bool,

    /// Write the JSON report to a file
    #[arg(long)]
    output: Option<PathBuf>,

    /// Log progress (RUST_LOG overrides)
    #[arg(long, short = 'v')]
    verbose: bool,

    /// Suppress the human report on stderr
    #[arg(long, short = 'q')]
    quiet: bool,
}

fn long_version() -> &'static str {
    if cfg!(debug_assertions) {
        concat!(
            env!("CARGO_PKG_VERSION"),
            " (", env!("GIT_COMMIT_HASH"), ")",
            "\nengine:  sitebook-recon ", env!("CARGO_PKG_VERSION"),
            "\nbuild:   debug",
            "\ntarget:  ", env!("TARGET"),
        )
    } else {
        concat!(
            env!("CARGO_PKG_VERSION"),
            " (", env!("GIT_COMMIT_HASH"), ")",
            "\nengine:  sitebook-recon ", env!("CARGO_PKG_VERSION"),
            "\nbuild:   release",
            "\ntarget:  ", env!("TARGET"),
        )
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "info" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .try_init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cmd_clean_templates(cli) {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(CliError { code, message, hint }) => {
            if !message.is_empty() {
                eprintln!("error: {}", message);
            }
            if let Some(hint) = hint {
                eprintln!("hint:  {}", hint);
            }
            ExitCode::from(code)
        }
    }
}

#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

impl CliError {
    pub fn args(msg: impl Into<String>) -> Self {
        Self { code: EXIT_USAGE, message: msg.into(), hint: None }
    }

    pub fn io(msg: impl Into<String>) -> Self {
        Self { code: EXIT_ERROR, message: msg.into(), hint: None }
    }

    /// Add a hint to an existing error.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

// ============================================================================
// clean-templates
// ============================================================================

fn cmd_clean_templates(cli: Cli) -> Result<(), CliError> {
    if cli.types.iter().any(|t| t.trim().is_empty()) {
        return Err(CliError::args("--type must not be empty"));
    }

    let mut config = settings::load_config(cli.config.as_deref())?;
    if !cli.types.is_empty() {
        config.types = cli.types;
    }
    if cli.dry_run {
        config.dry_run = true;
    }

    let target = credentials::resolve_target(TargetFlags {
        project: cli.project,
        database: cli.database,
        access_token: cli.access_token,
    })?;
    tracing::info!(
        project = %target.project,
        database = %target.database,
        emulator = target.emulator,
        "connecting to document store"
    );
    let store = FirestoreStore::new(&target, &config)?;

    let cancel: CancelToken = Arc::new(AtomicBool::new(false));
    interrupt::install(cancel.clone());

    let report = sitebook_recon::run(&store, &config, Some(&cancel));

    if cli.json || cli.output.is_some() {
        let json_str = serde_json::to_string_pretty(&report)
            .map_err(|e| CliError::io(format!("JSON serialization error: {e}")))?;

        if let Some(ref path) = cli.output {
            std::fs::write(path, &json_str)
                .map_err(|e| CliError::io(format!("cannot write output: {e}")))?;
            eprintln!("wrote {}", path.display());
        }

        if cli.json {
            println!("{json_str}");
        }
    }

    if !cli.quiet {
        summary::write_report(&mut io::stderr().lock(), &report)
            .map_err(|e| CliError::io(e.to_string()))?;
    }

    match run_exit_code(report.status) {
        EXIT_SUCCESS => Ok(()),
        code => {
            let err = CliError {
                code,
                message: format!("reconciliation finished with {}", report.status),
                hint: None,
            };
            Err(match report.status {
                RunStatus::Cancelled => err.with_hint("committed batches stay applied; re-run to finish"),
                _ => err.with_hint("re-running is safe: records already reconciled are left alone"),
            })
        }
    }
}
