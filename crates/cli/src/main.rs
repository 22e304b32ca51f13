mod commands;
mod logging;

use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand, ValueEnum};

use commands::{cmd_check, cmd_diff, cmd_layout, cmd_upgrade};

/// Output format for CLI responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum OutputFormat {
    Text,
    Json,
}

/// Storage layout and upgrade-safety checks for smart contracts.
#[derive(Parser)]
#[command(
    name = "slotguard",
    version,
    about = "Storage layout and upgrade-safety checks for smart contracts"
)]
struct Cli {
    /// Output format (text or json)
    #[arg(long, global = true, default_value = "text", value_enum)]
    output: OutputFormat,

    /// Suppress non-essential output
    #[arg(long, global = true)]
    quiet: bool,

    /// Increase log verbosity (-v debug, -vv trace); RUST_LOG overrides
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute the storage layout of a contract
    Layout {
        /// Path to the contract interchange JSON
        file: PathBuf,
        /// Contract to select when the document holds several
        #[arg(long)]
        contract: Option<String>,
    },

    /// Compare the storage layouts of two contract versions
    Diff {
        /// Path to the v1 contract interchange JSON
        v1: PathBuf,
        /// Path to the v2 contract interchange JSON
        v2: PathBuf,
        /// Contract to select in both documents
        #[arg(long)]
        contract: Option<String>,
    },

    /// Analyze upgrade compatibility between two contract versions
    Upgrade {
        /// Path to the v1 contract interchange JSON
        v1: PathBuf,
        /// Path to the v2 contract interchange JSON
        v2: PathBuf,
        /// Contract to select in both documents
        #[arg(long)]
        contract: Option<String>,
        /// Analyzer configuration (TOML)
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Check a serialized slot mapping for overfilled slots
    Check {
        /// Path to the slot mapping JSON
        mapping: PathBuf,
    },
}

fn main() {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    match cli.command {
        Commands::Layout { file, contract } => {
            cmd_layout(&file, contract.as_deref(), cli.output, cli.quiet);
        }
        Commands::Diff { v1, v2, contract } => {
            cmd_diff(&v1, &v2, contract.as_deref(), cli.output, cli.quiet);
        }
        Commands::Upgrade {
            v1,
            v2,
            contract,
            config,
        } => {
            cmd_upgrade(
                &v1,
                &v2,
                contract.as_deref(),
                config.as_deref(),
                cli.output,
                cli.quiet,
            );
        }
        Commands::Check { mapping } => {
            cmd_check(&mapping, cli.output, cli.quiet);
        }
    }
}

/// Report an error message respecting output format and quiet mode.
pub(crate) fn report_error(msg: &str, output: OutputFormat, quiet: bool) {
    if quiet {
        return;
    }
    match output {
        OutputFormat::Text => eprintln!("error: {}", msg),
        OutputFormat::Json => {
            eprintln!("{}", serde_json::json!({ "error": msg }));
        }
    }
}

/// Pretty-print a serializable value to stdout.
pub(crate) fn print_json<T: serde::Serialize>(value: &T) {
    let json = serde_json::to_string_pretty(value)
        .unwrap_or_else(|e| format!("{{\"error\": \"serialization: {}\"}}", e));
    println!("{}", json);
}
