use std::fs;
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tracing::info;

use paramex::logging::EXTRACT;
use paramex::session::load_parameters;
use paramex::{to_json, ExtractionSession, ExtractorConfig};

#[derive(Parser, Debug)]
#[clap(
    author,
    version,
    about,
    long_about = "Extract datasheet parameters from a converted document session.",
    arg_required_else_help = true
)]
pub struct Args {
    /// Path to the session JSON (flattened text, pages and parameters)
    pub session_path: PathBuf,

    /// Parameter list (.csv, .txt or .json) replacing the session's parameters
    #[clap(long)]
    pub parameters: Option<PathBuf>,

    /// JSON file with matching and reconciliation settings
    #[clap(short, long)]
    pub config: Option<String>,

    /// Optional output file path. If omitted, writes to stdout.
    #[clap(short, long)]
    pub output: Option<PathBuf>,

    /// Optional pretty print output.
    #[clap(short, long)]
    pub pretty: bool,

    /// Wrap results with summary counts
    #[clap(long)]
    pub report: bool,

    /// Enable debug logging of every extraction stage
    #[clap(short, long)]
    pub verbose: bool,

    /// Directory for the extraction log file
    #[clap(long)]
    pub log_dir: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Keep the guard alive so the file writer flushes on exit
    let _guard = match args.log_dir {
        Some(ref log_dir) => Some(
            paramex::logging::init_logging_with_dir(args.verbose, log_dir.clone())
                .with_context(|| format!("creating log directory {}", log_dir.display()))?,
        ),
        None => {
            paramex::logging::init_logging();
            None
        }
    };

    let config = match args.config {
        Some(ref path) => ExtractorConfig::from_path(path)?,
        None => ExtractorConfig::default(),
    };

    let mut session = ExtractionSession::from_path(&args.session_path)?;
    if let Some(ref path) = args.parameters {
        session = session.with_parameters(load_parameters(path)?);
    }

    let results = session.run(&config)?;
    let json = to_json(results, args.report, args.pretty)?;

    match args.output {
        Some(path) => {
            fs::write(&path, json).with_context(|| format!("writing {}", path.display()))?;
            info!(target: EXTRACT, "Output written to: {:?}", path);
        }
        None => println!("{}", json),
    }

    Ok(())
}
