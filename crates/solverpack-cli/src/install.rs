//! Install command - download, build and install solver bindings.

use anyhow::{Context, Result};
use clap::Args;
use console::style;
use std::path::PathBuf;

use solverpack::{plugin_for, Fetcher, Installer, InstallerConfig, Toolchain};

use crate::config::{ConfigLoader, Overrides};
use crate::progress;

#[derive(Args, Debug)]
pub struct InstallArgs {
    /// Solver to install (e.g. msat)
    pub solver: String,

    /// Solver version (defaults to the solver's default version)
    #[arg(long)]
    pub version: Option<String>,

    /// Directory for downloaded archives and build trees
    #[arg(long)]
    pub install_dir: Option<PathBuf>,

    /// Directory receiving the importable bindings
    #[arg(long)]
    pub bindings_dir: Option<PathBuf>,

    /// Fallback download location (base URL or template with {archive_name})
    #[arg(long)]
    pub mirror: Option<String>,

    /// Python interpreter used to build the bindings
    #[arg(long)]
    pub python: Option<PathBuf>,

    /// Reinstall even if the requested version is already installed
    #[arg(short, long)]
    pub force: bool,

    /// Disable progress output
    #[arg(long)]
    pub no_progress: bool,
}

pub fn execute(args: InstallArgs, loader: &ConfigLoader) -> Result<i32> {
    let settings = loader.load(Overrides {
        install_dir: args.install_dir,
        bindings_dir: args.bindings_dir,
        mirror: args.mirror,
        python: args.python,
    })?;

    let plugin = plugin_for(&args.solver)?;

    let bar = progress::download_bar(!args.no_progress);
    let fetcher = Fetcher::http(settings.http_config())
        .context("Failed to create HTTP client")?
        .with_progress(progress::track(bar.clone()));

    let mut config = InstallerConfig::new(&settings.install_dir, &settings.bindings_dir)
        .with_force(args.force);
    if let Some(mirror) = &settings.mirror {
        config = config.with_mirror(mirror.clone());
    }

    let mut installer = Installer::new(plugin, args.version.as_deref(), config, fetcher)
        .with_toolchain(Toolchain::new(&settings.python));

    println!(
        "{} {} for {}",
        style("Installing").green().bold(),
        installer.identity(),
        installer.platform()
    );

    let result = installer.install();
    bar.finish_and_clear();
    let report = result?;

    if report.already_installed {
        println!(
            "{} {} {} is already installed in {}",
            style("Nothing to do:").cyan(),
            args.solver,
            report.version,
            report.bindings_dir.display()
        );
        return Ok(0);
    }

    for artifact in &report.artifacts {
        println!("  - {}", artifact.display());
    }
    println!(
        "{} {} {} installed in {}",
        style("Success:").green().bold(),
        installer.identity().name,
        report.version,
        report.bindings_dir.display()
    );

    Ok(0)
}
