//! Plan command - show what an install would download, without doing it.

use anyhow::Result;
use clap::Args;
use console::style;

use solverpack::{plugin_for, InstallPlan, InstallerConfig, Platform, SolverIdentity};

use crate::config::{ConfigLoader, Overrides};

#[derive(Args, Debug)]
pub struct PlanArgs {
    /// Solver to plan for (e.g. msat)
    pub solver: String,

    /// Solver version (defaults to the solver's default version)
    #[arg(long)]
    pub version: Option<String>,

    /// Fallback download location (base URL or template with {archive_name})
    #[arg(long)]
    pub mirror: Option<String>,

    /// Print the plan as JSON
    #[arg(long)]
    pub json: bool,
}

pub fn execute(args: PlanArgs, loader: &ConfigLoader) -> Result<i32> {
    let settings = loader.load(Overrides {
        mirror: args.mirror,
        ..Default::default()
    })?;

    let mut config = InstallerConfig::new(&settings.install_dir, &settings.bindings_dir);
    if let Some(mirror) = &settings.mirror {
        config = config.with_mirror(mirror.clone());
    }

    let plugin = plugin_for(&args.solver)?;
    let version = args.version.as_deref().unwrap_or(plugin.default_version());
    let identity = SolverIdentity::new(plugin.name(), version);
    let plan = InstallPlan::resolve(plugin.as_ref(), &identity, &Platform::detect(), &config)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&plan)?);
        return Ok(0);
    }

    println!("{} {}", style("Solver:").bold(), plan.solver);
    println!("{} {}", style("Platform:").bold(), plan.platform);
    println!(
        "{} {} ({})",
        style("Archive:").bold(),
        plan.location.archive_name,
        plan.location.format
    );
    println!("{} {}", style("Download:").bold(), plan.location.native_link);
    if let Some(mirror) = &plan.location.mirror_link {
        println!("{} {}", style("Mirror:").bold(), mirror);
    }
    println!("{} {}", style("Archive path:").bold(), plan.archive_path.display());
    println!("{} {}", style("Build tree:").bold(), plan.extract_path.display());
    println!("{} {}", style("Bindings:").bold(), plan.bindings_dir.display());

    Ok(0)
}
