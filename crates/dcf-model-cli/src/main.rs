mod commands;
mod input;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;
use tracing_subscriber::EnvFilter;

use commands::model::ModelArgs;
use commands::sensitivity::SensitivityArgs;

/// Five-year free cash flow DCF valuation from a fixed-layout workbook
#[derive(Parser)]
#[command(
    name = "dcfm",
    version,
    about = "Five-year free cash flow DCF valuation from a fixed-layout workbook",
    long_about = "Loads base assumptions, detailed projection drivers and project impacts \
                  from an xlsx/ods workbook (or a JSON parameter bundle), projects free \
                  cash flow and values it with a Gordon growth terminal value. \
                  Logging goes to stderr and is controlled with RUST_LOG."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a workbook and print the loaded parameters and cell warnings
    Load(ModelArgs),
    /// Full run: projection, valuation and project analysis
    Run(ModelArgs),
    /// Per-year projection rows
    Projection(ModelArgs),
    /// Valuation summary (EV, PV of FCF, PV of terminal value, rates)
    Summary(ModelArgs),
    /// Summary, projection and project-analysis tables
    Export(ModelArgs),
    /// Enterprise value over a WACC x perpetuity-growth grid
    Sensitivity(SensitivityArgs),
    /// Print version information
    Version,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Csv,
    Minimal,
}

fn main() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::Load(args) => commands::model::run_load(args),
        Commands::Run(args) => commands::model::run_full(args),
        Commands::Projection(args) => commands::model::run_projection(args),
        Commands::Summary(args) => commands::model::run_summary(args),
        Commands::Export(args) => commands::model::run_export(args),
        Commands::Sensitivity(args) => commands::sensitivity::run_sensitivity(args),
        Commands::Version => {
            println!("dcfm {}", env!("CARGO_PKG_VERSION"));
            return;
        }
    };

    match result {
        Ok(value) => {
            output::format_output(&cli.output, &value);
            process::exit(0);
        }
        Err(e) => {
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    }
}
