//! Command-line entry point.
//!
//! # Responsibility
//! - Smoke-check `wordmark_core` linkage (`ping`, `version`).
//! - Validate and normalize annotation files against a headless session.
//!
//! # Invariants
//! - Output is deterministic for a given input file.
//! - Usage errors exit with status 2 (clap), processing errors with status 1.

use clap::{Parser, Subcommand};
use log::{error, info};
use std::error::Error;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Instant;
use wordmark_core::{
    default_log_level, init_logging, AnnotationSession, FsFileGateway, HeadlessWaveform,
    SessionConfig,
};

const HEADLESS_SOURCE: &str = "headless:cli";

#[derive(Parser, Debug, Clone, PartialEq, Eq)]
#[command(name = env!("CARGO_PKG_NAME"), version)]
#[command(about = "Validate and normalize word annotation files")]
struct Options {
    #[command(subcommand)]
    command: Option<Command>,

    /// Session config in TOML; defaults apply when omitted
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Absolute directory for rolling log files
    #[arg(long, global = true, value_name = "DIR")]
    log_dir: Option<String>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
enum Command {
    /// Print core linkage and version (default)
    Ping,
    /// Print the core version
    Version,
    /// Import an annotation file and report range warnings
    Check { file: PathBuf },
    /// Import an annotation file and re-export it into a directory
    Normalize { file: PathBuf, out_dir: PathBuf },
}

fn main() -> ExitCode {
    let options = Options::parse();

    if let Some(log_dir) = &options.log_dir {
        if let Err(err) = init_logging(default_log_level(), log_dir) {
            eprintln!("warning: logging disabled: {err}");
        }
    }

    match run(&options) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("event=cli_run module=cli status=error error={err}");
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(options: &Options) -> Result<(), Box<dyn Error>> {
    match options.command.as_ref().unwrap_or(&Command::Ping) {
        Command::Ping => {
            println!("wordmark_core ping={}", wordmark_core::ping());
            println!("wordmark_core version={}", wordmark_core::core_version());
        }
        Command::Version => println!("{}", wordmark_core::core_version()),
        Command::Check { file } => {
            let config = load_config(options)?;
            let mut session = open_session(config)?;
            let mut files = FsFileGateway::new(std::env::temp_dir());
            files.select(file);
            let count = session.import_file(&mut files)?;

            println!("{}: {count} region(s)", file.display());
            for (index, block) in session.blocks().iter().enumerate() {
                if block.range_warning {
                    println!(
                        "  #{} `{}`: end {} is not after start {}",
                        index + 1,
                        block.header_label,
                        block.end_input,
                        block.start_input
                    );
                }
            }
            info!("event=cli_check module=cli status=ok count={count}");
        }
        Command::Normalize { file, out_dir } => {
            let config = load_config(options)?;
            let file_name = config.export_file_name.clone();
            let mut session = open_session(config)?;
            let mut files = FsFileGateway::new(out_dir);
            files.select(file);
            let count = session.import_file(&mut files)?;
            session.export(&mut files)?;

            println!(
                "wrote {count} region(s) to {}",
                out_dir.join(file_name).display()
            );
        }
    }
    Ok(())
}

fn load_config(options: &Options) -> Result<SessionConfig, Box<dyn Error>> {
    match &options.config {
        Some(path) => Ok(SessionConfig::load(path)?),
        None => Ok(SessionConfig::default()),
    }
}

fn open_session(
    config: SessionConfig,
) -> Result<AnnotationSession<HeadlessWaveform>, Box<dyn Error>> {
    let mut session = AnnotationSession::new(HeadlessWaveform::new(), config)?;
    session.load_audio(HEADLESS_SOURCE)?;
    session.pump(Instant::now())?;
    Ok(session)
}
