mod commands;
mod input;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;
use tracing::level_filters::LevelFilter;

use commands::project::{AnalyzeArgs, PaymentArgs, ScheduleArgs};
use commands::sensitivity::SensitivityArgs;

/// Financial viability of EV charging + solar projects
#[derive(Parser)]
#[command(
    name = "evsf",
    version,
    about = "Financial viability of EV charging + solar projects",
    long_about = "Projects year-by-year cash flows for an EV charging site with co-located \
                  solar (and optional battery storage) and reports NPV, IRR, payback and ROI \
                  with decimal precision."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,

    /// Log to stderr (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Full metrics bundle: NPV, IRR, payback, ROI and the cash-flow schedule
    Analyze(AnalyzeArgs),
    /// Year-by-year cash-flow schedule only
    Schedule(ScheduleArgs),
    /// Monthly loan payment
    Payment(PaymentArgs),
    /// 2-way sensitivity grid over two assumption drivers
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

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => LevelFilter::WARN,
        1 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::Analyze(args) => commands::project::run_analyze(args),
        Commands::Schedule(args) => commands::project::run_schedule(args),
        Commands::Payment(args) => commands::project::run_payment(args),
        Commands::Sensitivity(args) => commands::sensitivity::run_sensitivity(args),
        Commands::Version => {
            println!("evsf {}", env!("CARGO_PKG_VERSION"));
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
