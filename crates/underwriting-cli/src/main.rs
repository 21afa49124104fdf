mod commands;
mod input;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;

use commands::amortize::AmortizeArgs;
use commands::classify::ClassifyArgs;
use commands::evaluate::{EvaluateArgs, ProjectArgs};
use commands::grade::GradeArgs;

/// Multifamily acquisition underwriting
#[derive(Parser)]
#[command(
    name = "uwr",
    version,
    about = "Multifamily acquisition underwriting and deal grading",
    long_about = "Projects ten years of after-tax cash flow for a multifamily acquisition, \
                  derives cap rate, DSCR, cash-on-cash and horizon returns with decimal \
                  precision, and grades the deal against asset-class and market-tier \
                  benchmarks."
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
    /// Full evaluation: projection, metrics, classification, grade and advice
    Evaluate(EvaluateArgs),
    /// Ten-year cash-flow projection with return metrics
    Project(ProjectArgs),
    /// Year-by-year loan amortization schedule
    Amortize(AmortizeArgs),
    /// Infer asset class and market tier from property characteristics
    Classify(ClassifyArgs),
    /// Grade a pre-computed set of metrics
    Grade(GradeArgs),
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
    env_logger::init();
    let cli = Cli::parse();

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::Evaluate(args) => commands::evaluate::run_evaluate(args),
        Commands::Project(args) => commands::evaluate::run_project(args),
        Commands::Amortize(args) => commands::amortize::run_amortize(args),
        Commands::Classify(args) => commands::classify::run_classify(args),
        Commands::Grade(args) => commands::grade::run_grade(args),
        Commands::Version => {
            println!("uwr {}", env!("CARGO_PKG_VERSION"));
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
