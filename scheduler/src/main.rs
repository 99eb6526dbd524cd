#![forbid(unsafe_code)]
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::Verbosity;
use log::{debug, error};
use rcpsp_mm::Encoding;

mod commands;

#[derive(Debug, Parser)]
/// Multi-mode RCPSP formulation compiler
struct App {
    #[command(flatten)]
    verbose: Verbosity,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Solve an instance with several encodings and compare the runs
    Compare(Compare),
    /// Print start windows, makespan bounds and a serial schedule
    Bounds {
        #[arg(required = true)]
        path: PathBuf,
    },
    /// Divide all time data of an instance by the gcd of its durations
    Normalize {
        #[arg(required = true)]
        path: PathBuf,
        /// Write the normalized instance here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ReportFormat {
    Table,
    Latex,
    Json,
}

#[derive(Args, Debug)]
pub struct Compare {
    #[arg(required = true)]
    path: PathBuf,
    /// Wall clock limit per encoding in seconds
    #[arg(short, long, default_value_t = 300)]
    time_limit: u64,
    /// Relative gap at which an incumbent is accepted
    #[arg(short, long, default_value_t = 0.0)]
    mip_gap: f64,
    /// Run the encodings on all cores
    #[arg(short, long)]
    parallel: bool,
    #[arg(short, long, value_enum, default_value_t = ReportFormat::Table)]
    format: ReportFormat,
    /// Comma separated model names, all encodings when omitted
    #[arg(short, long, value_delimiter = ',')]
    encodings: Vec<Encoding>,
}

fn main() {
    let args: App = App::parse();

    env_logger::Builder::new()
        .filter_level(args.verbose.log_level_filter())
        .init();

    debug!("{args:?}");

    let verbose = args.verbose.log_level_filter() >= log::LevelFilter::Info;

    if let Err(err) = match args.command {
        Commands::Compare(compare) => commands::compare(compare, verbose),
        Commands::Bounds { path } => commands::bounds(path),
        Commands::Normalize { path, output } => commands::normalize(path, output),
    } {
        error!("An error occurred: {:#}", err);
        std::process::exit(1);
    }
}
