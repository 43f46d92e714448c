//! twophase - solve a linear program given as a JSON request.

use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use log::{debug, LevelFilter};

use twophase::adapter::Handler;
use twophase::{Method, SolverConfig};

/// Solve `maximize c^Tx subject to Ax {<=, >=, =} b, x >= 0` with the
/// two-phase simplex method.
///
/// The request is a JSON object with `objective`, `constraints` and `rhs`,
/// and optionally `relations`, `sense`, `method` and `maxIterations`.
/// Values in the request take precedence over the flags below.
#[derive(Debug, Parser)]
#[command(name = "twophase", version)]
struct Args {
    /// Request file; reads stdin when absent or `-`
    input: Option<PathBuf>,

    /// Method used when the request names none (`two-phase` or `dual`)
    #[arg(long)]
    method: Option<Method>,

    /// Pivot limit used when the request sets none
    #[arg(long)]
    max_iterations: Option<usize>,

    /// JSON file with solver settings (`maxIterations`, `pivotTolerance`,
    /// `feasibilityTolerance`)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Pretty-print the response
    #[arg(long)]
    pretty: bool,

    /// More logging (-v debug, -vv trace); RUST_LOG takes precedence
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Only log errors
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

fn init_logging(args: &Args) {
    let level = if args.quiet {
        LevelFilter::Error
    } else {
        match args.verbose {
            0 => LevelFilter::Warn,
            1 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();
}

fn load_config(args: &Args) -> Result<SolverConfig> {
    let mut config = match args.config {
        Some(ref path) => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("failed to read config {}", path.display()))?;
            serde_json::from_str(&text)
                .with_context(|| format!("failed to parse config {}", path.display()))?
        },
        None => SolverConfig::default(),
    };
    if let Some(max_iterations) = args.max_iterations {
        config.max_iterations = max_iterations;
    }
    Ok(config)
}

fn read_input(input: Option<&Path>) -> Result<String> {
    match input {
        Some(path) if path != Path::new("-") => fs::read_to_string(path)
            .with_context(|| format!("failed to read request {}", path.display())),
        _ => {
            let mut body = String::new();
            io::stdin()
                .read_to_string(&mut body)
                .context("failed to read request from stdin")?;
            Ok(body)
        },
    }
}

// Returns whether the request was answered with a solver result.
fn run(args: &Args) -> Result<bool> {
    let config = load_config(args)?;
    debug!("solver settings: {:?}", config);
    let handler = Handler::new(config).with_default_method(args.method.unwrap_or_default());

    let body = read_input(args.input.as_deref())?;
    let response = handler.handle("POST", &body);

    let text = if args.pretty {
        serde_json::to_string_pretty(&response.body)?
    } else {
        serde_json::to_string(&response.body)?
    };
    println!("{}", text);
    Ok(response.status_code == 200)
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(&args);
    match run(&args) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(err) => {
            eprintln!("error: {:#}", err);
            ExitCode::from(2)
        },
    }
}
