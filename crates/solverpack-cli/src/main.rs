mod check;
mod config;
mod env;
mod install;
mod plan;
mod progress;

use anyhow::Result;
use clap::{Parser, Subcommand};
use console::style;
use std::process::ExitCode;

use config::ConfigLoader;

#[derive(Parser, Debug)]
#[command(name = "solverpack")]
#[command(about = "Install SMT solvers and their Python bindings")]
#[command(version)]
struct Args {
    #[command(subcommand)]
    command: Commands,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short = 'v', long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Download, build and install a solver's Python bindings
    Install(install::InstallArgs),

    /// Report the version of the installed bindings (exit 1 if missing)
    Check(check::CheckArgs),

    /// Show the archive, links and paths an install would use
    Plan(plan::PlanArgs),

    /// Print the PYTHONPATH line for the installed bindings
    Env(env::EnvArgs),
}

fn init_logger(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    // RUST_LOG takes precedence over -v
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp(None)
        .init();
}

fn run() -> Result<i32> {
    let args = Args::parse();
    init_logger(args.verbose);

    let loader = ConfigLoader::new(true);

    match args.command {
        Commands::Install(install_args) => install::execute(install_args, &loader),
        Commands::Check(check_args) => check::execute(check_args, &loader),
        Commands::Plan(plan_args) => plan::execute(plan_args, &loader),
        Commands::Env(env_args) => env::execute(env_args, &loader),
    }
}

fn main() -> ExitCode {
    match run() {
        Ok(code) => ExitCode::from(code as u8),
        Err(e) => {
            eprintln!("{} {}", style("Error:").red().bold(), e);
            for cause in e.chain().skip(1) {
                eprintln!("  Caused by: {}", cause);
            }
            ExitCode::FAILURE
        }
    }
}
