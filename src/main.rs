use std::fs;
use std::io;
use std::process;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use log::{error, info, warn, LevelFilter};
use simplelog::{ColorChoice, Config, TermLogger, TerminalMode};
use tokio::runtime::Runtime;
use tokio::signal;

use sos_collector::cli::Args;
use sos_collector::clusters::{load_profiles, write_options_table};
use sos_collector::config::{AuthConfig, RunConfig};
use sos_collector::models::CancelFlag;
use sos_collector::nodes::{LocalIdentity, SshConnector};
use sos_collector::orchestrator::Orchestrator;
use sos_collector::reporting::{Reporter, RunLog};
use sos_collector::utils::archive::WorkDir;

/// Exit status after Ctrl-C
const INTERRUPT_EXIT_CODE: i32 = 130;

fn main() {
    // Parse arguments
    let args = Args::parse();

    // Initialize logging
    if let Err(e) = initialize_logging(args.verbose) {
        eprintln!("{:#}", e);
    }

    if args.list_options {
        if let Err(e) = write_options_table(&mut io::stdout(), &load_profiles()) {
            error!("Failed to print cluster options: {}", e);
            process::exit(1);
        }
        return;
    }

    if let Err(e) = run(&args) {
        error!("{:#}", e);
        process::exit(1);
    }
}

/// Initialize logging with the specified verbosity level
fn initialize_logging(verbose: bool) -> Result<()> {
    let log_level = if verbose { LevelFilter::Debug } else { LevelFilter::Info };
    TermLogger::init(
        log_level,
        Config::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    )
    .context("Failed to initialize logger")?;
    Ok(())
}

/// Build the configuration, then run the collection on a blocking thread
/// while the runtime watches for Ctrl-C
fn run(args: &Args) -> Result<()> {
    let config = RunConfig::from_args(args)?;
    let auth = config.auth_config()?;

    let runtime = Runtime::new().context("Failed to create async runtime")?;
    let cancel = CancelFlag::new();
    let task_cancel = cancel.clone();

    runtime.block_on(async move {
        let collection = tokio::task::spawn_blocking(move || execute(config, auth, task_cancel));

        tokio::select! {
            result = collection => result.context("Collection task failed")?,
            _ = signal::ctrl_c() => {
                cancel.cancel();
                error!("\nExiting on user cancel");
                process::exit(INTERRUPT_EXIT_CODE);
            }
        }
    })
}

/// One collection run, from working directory setup to cleanup
fn execute(config: RunConfig, auth: AuthConfig, cancel: CancelFlag) -> Result<()> {
    fs::create_dir_all(&config.out_dir)
        .context(format!("Failed to create output directory {}", config.out_dir.display()))?;

    let identity = LocalIdentity::detect();
    let work_dir = WorkDir::create(config.tmp_dir.as_deref()).context("Failed to create working directory")?;
    let reporter = Arc::new(RunLog::create(work_dir.path()).context("Failed to create run logs")?);
    let connector = Arc::new(SshConnector::new(auth, &identity.hostname));

    let result = Orchestrator::new(
        config,
        load_profiles(),
        connector,
        identity,
        Arc::clone(&reporter) as Arc<dyn Reporter>,
        cancel,
        work_dir.path().to_path_buf(),
    )
    .run();

    match result {
        Ok(outcome) => {
            if let Err(e) = work_dir.cleanup() {
                warn!("Failed to clean up {}: {}", work_dir.path().display(), e);
            }
            info!(
                "Collected {} of {} sosreports into {}",
                outcome.tally.succeeded,
                outcome.tally.attempted,
                outcome.archive.path.display()
            );
            Ok(())
        }
        Err(e) => {
            reporter.log(&format!("Run failed: {}", e));
            reporter.flush();
            info!("Run logs kept in {}", work_dir.path().display());
            Err(e.into())
        }
    }
}
