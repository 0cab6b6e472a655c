//! plancheck CLI entrypoint.
//!
//! This is the main entrypoint for the plancheck command-line tool.

use std::io::Write;
use std::path::Path;
use std::process::ExitCode;

use deploy_plan_check::cli::{Cli, Commands, OutputFormatter};
use deploy_plan_check::config::{load_document, load_dotenv, Settings};
use deploy_plan_check::error::Result;
use deploy_plan_check::planner::Plan;
use deploy_plan_check::verifier::{PlanVerifier, RunSnapshot};

use clap::Parser;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

/// Exit code for a run that violates its plan.
const EXIT_VIOLATION: u8 = 1;

/// Exit code for a failure of the checker itself.
const EXIT_ERROR: u8 = 2;

/// Main entrypoint.
fn main() -> ExitCode {
    let cli = Cli::parse();

    let settings = match load_settings(&cli) {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Error: {e}");
            return ExitCode::from(EXIT_ERROR);
        }
    };

    init_logging(cli.verbose, &settings.log_level);

    match run(cli, &settings) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(EXIT_VIOLATION),
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::from(EXIT_ERROR)
        }
    }
}

/// Loads `.env` and the settings file, applying CLI overrides.
fn load_settings(cli: &Cli) -> Result<Settings> {
    let cwd = std::env::current_dir()?;
    load_dotenv(&cwd)?;

    let mut settings = match &cli.settings {
        Some(path) => {
            let mut settings = Settings::load_file(path)?;
            settings.apply_env_overrides(|name| std::env::var(name).ok())?;
            settings
        }
        None => Settings::discover(&cwd)?,
    };

    if let Some(output) = cli.output {
        settings.output = output;
    }

    Ok(settings)
}

/// Initializes the logging system.
///
/// `RUST_LOG` wins over the configured level; `--verbose` wins over both.
fn init_logging(verbose: bool, level: &str) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Runs the selected command. Returns false if a run violated its plan.
fn run(cli: Cli, settings: &Settings) -> Result<bool> {
    let formatter = OutputFormatter::new(settings.output);

    match cli.command {
        Commands::Check {
            plan,
            run,
            fail_on_unresolved,
        } => cmd_check(
            &plan,
            &run,
            fail_on_unresolved || settings.fail_on_unresolved,
            &formatter,
        ),
        Commands::Show { plan, detailed } => cmd_show(&plan, detailed, &formatter).map(|()| true),
        Commands::Manifest { plan } => cmd_manifest(&plan, &formatter),
    }
}

/// Check a run against a plan.
fn cmd_check(
    plan_path: &Path,
    run_path: &Path,
    fail_on_unresolved: bool,
    formatter: &OutputFormatter,
) -> Result<bool> {
    let plan: Plan = load_document(plan_path)?;
    let snapshot: RunSnapshot = load_document(run_path)?;

    if !plan.manifest.verify() {
        warn!("Plan manifest does not match its content; the plan may have been edited");
    }

    let report = PlanVerifier::new(&plan).verify(&snapshot);
    emit(&formatter.format_report(&report))?;

    if fail_on_unresolved && report.has_unresolved() {
        info!("Failing on {} unresolved references", report.unresolved.len());
        return Ok(false);
    }

    Ok(report.is_conforming())
}

/// Show a plan.
fn cmd_show(plan_path: &Path, detailed: bool, formatter: &OutputFormatter) -> Result<()> {
    let plan: Plan = load_document(plan_path)?;
    debug!("Loaded plan with {} resources", plan.len());
    emit(&formatter.format_plan(&plan, detailed))
}

/// Show a plan's manifest. Fails if the manifest does not verify.
fn cmd_manifest(plan_path: &Path, formatter: &OutputFormatter) -> Result<bool> {
    let plan: Plan = load_document(plan_path)?;
    emit(&formatter.format_manifest(&plan.manifest))?;
    Ok(plan.manifest.verify())
}

/// Writes command output to stdout.
fn emit(output: &str) -> Result<()> {
    let mut stdout = std::io::stdout().lock();
    writeln!(stdout, "{output}")?;
    Ok(())
}
