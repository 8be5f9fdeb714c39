//! Check command - report the version of installed bindings.

use anyhow::Result;
use clap::Args;
use console::style;
use std::path::PathBuf;

use solverpack::{plugin_for, Toolchain};

use crate::config::{ConfigLoader, Overrides};

#[derive(Args, Debug)]
pub struct CheckArgs {
    /// Solver to check (e.g. msat)
    pub solver: String,

    /// Directory holding the installed bindings
    #[arg(long)]
    pub bindings_dir: Option<PathBuf>,

    /// Python interpreter used to import the bindings
    #[arg(long)]
    pub python: Option<PathBuf>,
}

pub fn execute(args: CheckArgs, loader: &ConfigLoader) -> Result<i32> {
    let settings = loader.load(Overrides {
        bindings_dir: args.bindings_dir,
        python: args.python,
        ..Default::default()
    })?;

    let plugin = plugin_for(&args.solver)?;
    let toolchain = Toolchain::new(&settings.python);

    match plugin.probe(&toolchain, &settings.bindings_dir)? {
        Some(version) => {
            println!(
                "{} {} is installed in {}",
                plugin.name(),
                style(version).green(),
                settings.bindings_dir.display()
            );
            Ok(0)
        }
        None => {
            println!(
                "{} is {} in {}",
                plugin.name(),
                style("not installed").yellow(),
                settings.bindings_dir.display()
            );
            Ok(1)
        }
    }
}
