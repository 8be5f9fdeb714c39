//! Solver plugins.
//!
//! The pipeline in [`crate::installer`] is shared by every solver. What
//! differs per solver (archive naming, how bindings are built, which files
//! make up an installed binding, how to ask it for its version) lives
//! behind [`SolverPlugin`].

mod msat;

use std::path::{Path, PathBuf};

use crate::archive::ArchiveLocation;
use crate::build::Toolchain;
use crate::downloader::Fetcher;
use crate::platform::Platform;
use crate::{Result, SolverError};

pub use msat::MathSat;

/// Everything a plugin may use while building and relocating.
pub struct BuildContext<'a> {
    pub platform: &'a Platform,
    pub fetcher: &'a Fetcher,
    pub toolchain: &'a Toolchain,
}

pub trait SolverPlugin {
    /// Short name used on the command line and for the install subdirectory
    fn name(&self) -> &'static str;

    /// Version installed when the caller does not ask for one
    fn default_version(&self) -> &'static str;

    /// Compute the archive name and download links. Pure; must not touch
    /// the network.
    fn locate(
        &self,
        version: &str,
        platform: &Platform,
        mirror: Option<&str>,
    ) -> Result<ArchiveLocation>;

    /// Patch and build the bindings inside the extracted tree.
    fn compile(&self, ctx: &BuildContext<'_>, extracted_root: &Path) -> Result<()>;

    /// Move the built artifacts into `bindings_dir`, returning their new paths.
    fn relocate(
        &self,
        ctx: &BuildContext<'_>,
        extracted_root: &Path,
        bindings_dir: &Path,
    ) -> Result<Vec<PathBuf>>;

    /// Version reported by the bindings in `bindings_dir`, `None` when they
    /// cannot be imported.
    fn probe(&self, toolchain: &Toolchain, bindings_dir: &Path) -> Result<Option<String>>;
}

/// Names accepted by [`plugin_for`]
pub fn available() -> &'static [&'static str] {
    &["msat"]
}

/// Look up the plugin for a solver name
pub fn plugin_for(name: &str) -> Result<Box<dyn SolverPlugin>> {
    match name.to_lowercase().as_str() {
        "msat" | "mathsat" => Ok(Box::new(MathSat)),
        _ => Err(SolverError::UnknownSolver {
            name: name.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plugin_lookup() {
        assert_eq!(plugin_for("msat").unwrap().name(), "msat");
        assert_eq!(plugin_for("MathSAT").unwrap().name(), "msat");
        assert!(matches!(
            plugin_for("yices"),
            Err(SolverError::UnknownSolver { .. })
        ));
    }

    #[test]
    fn test_every_available_name_resolves() {
        for name in available() {
            assert_eq!(plugin_for(name).unwrap().name(), *name);
        }
    }
}
