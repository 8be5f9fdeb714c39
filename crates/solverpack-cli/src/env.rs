//! Env command - print the shell line that makes installed bindings importable.

use anyhow::Result;
use clap::Args;
use std::path::{Path, PathBuf};

use crate::config::{ConfigLoader, Overrides};

#[derive(Args, Debug)]
pub struct EnvArgs {
    /// Directory holding the installed bindings
    #[arg(long)]
    pub bindings_dir: Option<PathBuf>,
}

pub fn execute(args: EnvArgs, loader: &ConfigLoader) -> Result<i32> {
    let settings = loader.load(Overrides {
        bindings_dir: args.bindings_dir,
        ..Default::default()
    })?;

    println!("{}", pythonpath_line(&settings.bindings_dir, cfg!(windows)));
    Ok(0)
}

fn pythonpath_line(bindings_dir: &Path, windows: bool) -> String {
    if windows {
        format!("set PYTHONPATH={};%PYTHONPATH%", bindings_dir.display())
    } else {
        format!(
            "export PYTHONPATH=\"{}${{PYTHONPATH:+:$PYTHONPATH}}\"",
            bindings_dir.display()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pythonpath_line() {
        assert_eq!(
            pythonpath_line(Path::new("/opt/bindings"), false),
            "export PYTHONPATH=\"/opt/bindings${PYTHONPATH:+:$PYTHONPATH}\""
        );
        assert_eq!(
            pythonpath_line(Path::new(r"C:\solvers\bindings"), true),
            r"set PYTHONPATH=C:\solvers\bindings;%PYTHONPATH%"
        );
    }
}
