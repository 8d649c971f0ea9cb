use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use pdfgate_core::{
    validate, ActionScanner, Config, DisallowPolicy, LoadError, ScanError, ScanOptions,
};
use serde_json::json;
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "pdfgate", version)]
struct Args {
    /// Raise log verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    #[command(about = "Check PDFs for disallowed interactive actions")]
    Scan {
        #[arg(value_name = "PDF", required = true)]
        pdfs: Vec<PathBuf>,
        #[arg(long)]
        json: bool,
        #[arg(long)]
        config: Option<PathBuf>,
        #[arg(long)]
        profile: Option<String>,
        /// Comma-separated action kinds, replacing the configured policy.
        #[arg(long, value_delimiter = ',', value_name = "KIND")]
        disallow: Vec<String>,
        #[arg(long)]
        max_visits: Option<usize>,
    },
    #[command(about = "List every action reachable in a PDF")]
    Actions {
        #[arg(value_name = "PDF")]
        pdf: PathBuf,
        #[arg(long)]
        json: bool,
        #[arg(long)]
        max_visits: Option<usize>,
    },
}

const EXIT_DISALLOWED: u8 = 1;
const EXIT_ERROR: u8 = 2;

fn main() -> ExitCode {
    let args = Args::parse();
    match run(args) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::from(EXIT_ERROR)
        }
    }
}

fn run(args: Args) -> Result<ExitCode> {
    match args.command {
        Command::Scan { pdfs, json, config, profile, disallow, max_visits } => {
            let config = match config.as_deref() {
                Some(path) => Config::load(path)
                    .with_context(|| format!("failed to load config {}", path.display()))?,
                None => Config::default(),
            };
            init_tracing(args.verbose, config.logging_level());
            let scanner = build_scanner(&config, profile.as_deref(), &disallow, max_visits)?;
            Ok(run_scan(&scanner, &pdfs, json))
        }
        Command::Actions { pdf, json, max_visits } => {
            init_tracing(args.verbose, None);
            let options = ScanOptions { max_visits, ..ScanOptions::default() };
            let scanner = ActionScanner::with_options(DisallowPolicy::default(), options);
            run_actions(&scanner, &pdf, json)
        }
    }
}

/// Installs the global subscriber. Returns `false` when one is already set,
/// in which case the existing subscriber stays in place.
fn init_tracing(verbose: u8, config_level: Option<&str>) -> bool {
    let level = match verbose {
        0 => config_level.unwrap_or("warn"),
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = if verbose == 0 {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level))
    } else {
        EnvFilter::new(level)
    };
    match tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
    {
        Ok(()) => true,
        Err(err) => {
            debug!(error = %err, "Tracing subscriber already installed");
            false
        }
    }
}

fn build_scanner(
    config: &Config,
    profile: Option<&str>,
    disallow: &[String],
    max_visits: Option<usize>,
) -> Result<ActionScanner> {
    let mut options = ScanOptions::default();
    let mut policy = config.apply(&mut options, profile)?.unwrap_or_default();
    if !disallow.is_empty() {
        policy = DisallowPolicy::from_names(disallow).map_err(ScanError::Config)?;
        debug!(kinds = policy.kinds().count(), "CLI override disallow");
    }
    if let Some(max) = max_visits {
        anyhow::ensure!(max > 0, "--max-visits must be greater than zero");
        options.max_visits = Some(max);
    }
    Ok(ActionScanner::with_options(policy, options))
}

fn run_scan(scanner: &ActionScanner, pdfs: &[PathBuf], json: bool) -> ExitCode {
    let mut any_disallowed = false;
    let mut any_error = false;
    for pdf in pdfs {
        match scanner.scan_path(Some(pdf.as_path())) {
            Ok(outcome) => {
                any_disallowed |= outcome.disallowed;
                if json {
                    match serde_json::to_string(&outcome) {
                        Ok(line) => println!("{line}"),
                        Err(err) => {
                            eprintln!("error: failed to serialize result: {err}");
                            any_error = true;
                        }
                    }
                } else {
                    let verdict = if outcome.encrypted {
                        "encrypted, not inspected".to_string()
                    } else {
                        match &outcome.first_match {
                            Some(node) => format!("disallowed: {node}"),
                            None => "clean".to_string(),
                        }
                    };
                    println!("{}: {verdict}", pdf.display());
                }
            }
            Err(err) => {
                any_error = true;
                if json {
                    println!(
                        "{}",
                        json!({ "path": pdf.display().to_string(), "error": err.to_string() })
                    );
                } else {
                    eprintln!("{}: error: {err}", pdf.display());
                }
            }
        }
    }
    if any_error {
        ExitCode::from(EXIT_ERROR)
    } else if any_disallowed {
        ExitCode::from(EXIT_DISALLOWED)
    } else {
        ExitCode::SUCCESS
    }
}

fn run_actions(scanner: &ActionScanner, pdf: &Path, json: bool) -> Result<ExitCode> {
    let validated = validate(Some(pdf)).map_err(ScanError::from)?;
    let doc = match scanner.open(&validated) {
        Ok(doc) => doc,
        Err(LoadError::Encrypted) => {
            if json {
                println!("{}", json!({ "path": validated.to_string(), "encrypted": true, "actions": [] }));
            } else {
                println!("{validated}: encrypted, not inspected");
            }
            return Ok(ExitCode::SUCCESS);
        }
        Err(err) => return Err(ScanError::from(err).into()),
    };
    let inventory = scanner.inventory(&doc);
    if json {
        let report = json!({
            "path": validated.to_string(),
            "encrypted": false,
            "actions": inventory.actions,
            "truncated": inventory.truncated,
        });
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else if inventory.actions.is_empty() {
        println!("{validated}: no actions");
    } else {
        for node in &inventory.actions {
            let verdict = if scanner.policy().is_disallowed(node.kind) { "disallowed" } else { "allowed" };
            println!("{node} {verdict}");
        }
        if inventory.truncated {
            println!("(walk truncated)");
        }
    }
    Ok(ExitCode::SUCCESS)
}
