//! webcase - AI-driven browser test cases
//!
//! Build test cases from natural-language steps and replay them against a
//! real browser from the command line.

use std::process::ExitCode;

use clap::Parser;
use commands::Commands;
use webcase::common::config::Config;
use webcase::common::logging;
use webcase::{cli, commands};

#[derive(Parser)]
#[command(name = "webcase", about = "AI-driven browser test cases")]
#[command(version, long_about = None)]
struct Cli {
    /// Also append logs to the log file
    #[arg(long, global = true)]
    log_file: bool,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    if cli.log_file {
        if let Some(path) = logging::init_with_file() {
            tracing::debug!(path = %path.display(), "Appending logs to file");
        }
    } else {
        logging::init_cli();
    }

    let config = match Config::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {e}");
            return ExitCode::FAILURE;
        }
    };

    match cli::dispatch(cli.command, &config).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}
