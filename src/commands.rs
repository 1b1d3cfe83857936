//! CLI command definitions
//!
//! Defines the clap commands for the webcase CLI.

use clap::Subcommand;
use std::path::PathBuf;

#[derive(Subcommand)]
pub enum Commands {
    /// Run a stored test case against a browser
    Run {
        /// Test case ID
        id: String,

        /// Print the execution result as JSON
        #[arg(long)]
        json: bool,

        /// Give up after this many seconds and tear the browser down
        #[arg(long)]
        timeout: Option<u64>,

        /// Launch the browser without a window (overrides the settings file)
        #[arg(long)]
        headless: bool,

        /// Skip writing the HTML report
        #[arg(long)]
        no_report: bool,
    },

    /// Test case management
    #[command(subcommand)]
    Case(CaseCommands),

    /// AI model configuration
    #[command(subcommand)]
    Config(ConfigCommands),

    /// View run logs
    Logs {
        /// Number of lines to show
        #[arg(long, short = 'n', default_value = "50")]
        lines: usize,

        /// Clear the log file
        #[arg(long)]
        clear: bool,
    },
}

#[derive(Subcommand)]
pub enum CaseCommands {
    /// List stored test cases
    #[command(alias = "ls")]
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show one test case with its steps
    Show {
        /// Test case ID
        id: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Create a test case
    Create {
        /// Human readable name
        #[arg(long)]
        name: Option<String>,

        /// URL the browser opens before the first step
        #[arg(long)]
        base_url: Option<String>,

        /// Read the whole case (name, baseUrl, steps) from a JSON file
        #[arg(long, conflicts_with_all = ["name", "base_url"])]
        file: Option<PathBuf>,
    },

    /// Change a test case's name or base URL
    Update {
        /// Test case ID
        id: String,

        #[arg(long)]
        name: Option<String>,

        #[arg(long)]
        base_url: Option<String>,
    },

    /// Delete a test case
    #[command(alias = "rm")]
    Delete {
        /// Test case ID
        id: String,
    },

    /// Append a step (or insert it at a position)
    AddStep {
        /// Test case ID
        id: String,

        /// Step kind: tap, input, waitFor, assert, navigate
        kind: String,

        /// Natural-language description of the element or condition
        #[arg(long, short)]
        target: Option<String>,

        /// Text to type (input) or condition to check (assert)
        #[arg(long, short)]
        value: Option<String>,

        /// Destination URL (navigate)
        #[arg(long)]
        url: Option<String>,

        /// Wait timeout in milliseconds (waitFor)
        #[arg(long)]
        timeout_ms: Option<u64>,

        /// Zero-based position to insert at (default: end)
        #[arg(long)]
        position: Option<usize>,
    },

    /// Remove a step by its ID
    RemoveStep {
        /// Test case ID
        id: String,

        /// Step ID
        step_id: String,
    },
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Show the model configuration a run would use
    Show,

    /// Save the model configuration
    Set {
        #[arg(long)]
        api_key: String,

        #[arg(long)]
        base_url: String,

        #[arg(long)]
        model_name: String,

        /// Model family (default: openai)
        #[arg(long)]
        model_family: Option<String>,
    },
}
