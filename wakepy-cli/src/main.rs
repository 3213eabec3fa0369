//! Thin command-line front end over `wakepy-core`.
//!
//! Enters a Mode, holds it until the process is interrupted, and exits.
//! The `methods` subcommand instead runs the candidate-selection and
//! platform-filter stages without activating anything, for inspection.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::info;
use wakepy_core::error::ConfigError;
use wakepy_core::platform;
use wakepy_core::prioritize::{self, Filter};
use wakepy_core::{EnterError, Mode, OnFail, KEEP_PRESENTING, KEEP_RUNNING};

#[derive(Parser)]
#[command(name = "wakepy", about = "Keep the system awake for as long as this process runs.")]
struct Cli {
    /// Select `keep.running` (inhibit idle suspend only).
    #[arg(short = 'r', long, conflicts_with = "presenting")]
    running: bool,

    /// Select `keep.presenting` (also inhibit screensaver/lock). Default.
    #[arg(short = 'p', long, conflicts_with = "running")]
    presenting: bool,

    /// Increase verbosity; repeatable.
    #[arg(short = 'v', long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// List every registered method for the selected mode, in priority
    /// order, with its would-be activation status.
    Methods,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    wakepy_core::register_default_methods().or_else(ignore_already_registered)?;

    let mode_name = if cli.running { KEEP_RUNNING } else { KEEP_PRESENTING };

    match cli.command {
        Some(Command::Methods) => methods_report(mode_name, cli.verbose),
        None => hold_mode(mode_name),
    }
}

/// `register_default_methods` fails with `DuplicateName` if called
/// twice in one process; harmless here since `main` only calls it once,
/// but kept tolerant in case a future embedder already populated the
/// registry before invoking this binary's logic as a library.
fn ignore_already_registered(err: ConfigError) -> Result<(), ConfigError> {
    match err {
        ConfigError::DuplicateName { .. } => Ok(()),
        other => Err(other),
    }
}

fn hold_mode(mode_name: &'static str) -> Result<()> {
    let mut mode = Mode::builder(mode_name).on_fail(OnFail::Error).build();
    match mode.enter() {
        Ok(_) => {
            let method = mode.method().map(|m| m.name.as_str()).unwrap_or("?");
            info!(mode = mode_name, method, "activated; press Ctrl-C to release");
        },
        Err(EnterError::Activation(err)) => {
            anyhow::bail!(err);
        },
        Err(EnterError::Config(err)) => {
            anyhow::bail!(err);
        },
    }

    wait_for_interrupt()?;
    mode.exit();
    Ok(())
}

fn wait_for_interrupt() -> Result<()> {
    let interrupted = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&interrupted);
    ctrlc::set_handler(move || flag.store(true, Ordering::SeqCst))?;
    while !interrupted.load(Ordering::SeqCst) {
        std::thread::sleep(std::time::Duration::from_millis(200));
    }
    Ok(())
}

fn methods_report(mode_name: &'static str, verbose: u8) -> Result<()> {
    let registry = wakepy_core::registry::global().lock().unwrap();
    let fake_success = wakepy_core::env::fake_success_requested();
    let plan = prioritize::plan(&registry, mode_name, &Filter::None, &[], fake_success, platform::current())?;

    for unsupported in &plan.platform_unsupported {
        println!("{} [UNSUPPORTED]", unsupported.method_name);
    }

    let mut found_success = false;
    for candidate in &plan.candidates {
        let context = wakepy_core::method::ActivationContext::default();
        let mut instance = candidate.build(&context);
        let status = dry_run_status(instance.as_mut(), verbose, found_success);
        println!("{} [{status}]", candidate.name);
        found_success |= status == "SUCCESS";
    }

    Ok(())
}

/// Simulates one candidate's would-be status without ever calling
/// `enter_mode`: `SUCCESS` for the first one whose `caniuse` passes,
/// `FAIL` for ones whose `caniuse` rejects, `*` for everything after the
/// winner — mirroring the real orchestrator's stop-at-first-success
/// semantics.
fn dry_run_status(instance: &mut dyn wakepy_core::method::MethodInstance, verbose: u8, already_found: bool) -> String {
    if already_found {
        return "*".to_owned();
    }
    match instance.caniuse() {
        Ok(()) => "SUCCESS".to_owned(),
        Err(err) => format_failure(err.message(), verbose),
    }
}

fn format_failure(reason: &str, verbose: u8) -> String {
    if verbose > 0 {
        format!("FAIL: {reason}")
    } else {
        "FAIL".to_owned()
    }
}

fn init_tracing(verbose: u8) {
    use tracing_subscriber::EnvFilter;

    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}
