//! The installation pipeline.
//!
//! Resolve → Fetch → Extract → Build → Relocate → Probe, strictly in that
//! order. Every step blocks until it is done and the first failure aborts
//! the run. Nothing is rolled back; a re-run reuses the downloaded archive
//! and overwrites the extracted tree.

use std::fs;
use std::path::PathBuf;

use serde::Serialize;

use crate::archive::{ArchiveLocation, SolverIdentity};
use crate::build::Toolchain;
use crate::downloader::{ArchiveExtractor, Fetcher};
use crate::error::{InstallError, Step};
use crate::platform::Platform;
use crate::solvers::{BuildContext, SolverPlugin};
use crate::SolverError;

/// How far an installation got
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum InstallState {
    NotStarted,
    Fetched,
    Extracted,
    Built,
    Relocated,
    Verified,
}

/// Caller-owned settings for one run
#[derive(Debug, Clone)]
pub struct InstallerConfig {
    /// Archives are downloaded and unpacked under `install_dir/<solver>`
    pub install_dir: PathBuf,
    /// Final home of the importable bindings
    pub bindings_dir: PathBuf,
    /// Fallback base URL or `{archive_name}` template
    pub mirror_link: Option<String>,
    /// Reinstall even if the requested version is already importable
    pub force: bool,
}

impl InstallerConfig {
    pub fn new(install_dir: impl Into<PathBuf>, bindings_dir: impl Into<PathBuf>) -> Self {
        Self {
            install_dir: install_dir.into(),
            bindings_dir: bindings_dir.into(),
            mirror_link: None,
            force: false,
        }
    }

    pub fn with_mirror(mut self, mirror_link: impl Into<String>) -> Self {
        self.mirror_link = Some(mirror_link.into());
        self
    }

    pub fn with_force(mut self, force: bool) -> Self {
        self.force = force;
        self
    }
}

/// Everything the pipeline decided before touching the network
#[derive(Debug, Clone, Serialize)]
pub struct InstallPlan {
    pub solver: SolverIdentity,
    pub platform: Platform,
    pub location: ArchiveLocation,
    pub base_dir: PathBuf,
    pub archive_path: PathBuf,
    /// Where the archive is expected to unpack to
    pub extract_path: PathBuf,
    pub bindings_dir: PathBuf,
}

impl InstallPlan {
    /// Validate the identity and compute the archive location and paths
    /// for it. Needs neither network nor filesystem.
    pub fn resolve(
        plugin: &dyn SolverPlugin,
        identity: &SolverIdentity,
        platform: &Platform,
        config: &InstallerConfig,
    ) -> Result<Self, InstallError> {
        identity.validate().map_err(|e| e.at(Step::Resolve))?;

        let location = plugin
            .locate(&identity.version, platform, config.mirror_link.as_deref())
            .map_err(|e| e.at(Step::Resolve))?;

        let base_dir = config.install_dir.join(plugin.name());
        let archive_path = base_dir.join(&location.archive_name);
        let extract_path = base_dir.join(location.stem());

        Ok(Self {
            solver: identity.clone(),
            platform: platform.clone(),
            location,
            base_dir,
            archive_path,
            extract_path,
            bindings_dir: config.bindings_dir.clone(),
        })
    }
}

/// Outcome of a successful [`Installer::install`]
#[derive(Debug, Clone)]
pub struct InstallReport {
    pub version: String,
    pub bindings_dir: PathBuf,
    /// Files placed in the bindings dir by this run
    pub artifacts: Vec<PathBuf>,
    /// True when the requested version was already installed
    pub already_installed: bool,
}

pub struct Installer {
    plugin: Box<dyn SolverPlugin>,
    identity: SolverIdentity,
    config: InstallerConfig,
    platform: Platform,
    fetcher: Fetcher,
    toolchain: Toolchain,
    state: InstallState,
}

impl Installer {
    /// Create an installer for `plugin` at `version` (or the plugin's
    /// default), detecting the platform and using the default interpreter.
    pub fn new(
        plugin: Box<dyn SolverPlugin>,
        version: Option<&str>,
        config: InstallerConfig,
        fetcher: Fetcher,
    ) -> Self {
        let version = version.unwrap_or(plugin.default_version()).to_string();
        let identity = SolverIdentity::new(plugin.name(), version);

        Self {
            plugin,
            identity,
            config,
            platform: Platform::detect(),
            fetcher,
            toolchain: Toolchain::default(),
            state: InstallState::NotStarted,
        }
    }

    pub fn with_platform(mut self, platform: Platform) -> Self {
        self.platform = platform;
        self
    }

    pub fn with_toolchain(mut self, toolchain: Toolchain) -> Self {
        self.toolchain = toolchain;
        self
    }

    pub fn identity(&self) -> &SolverIdentity {
        &self.identity
    }

    pub fn platform(&self) -> &Platform {
        &self.platform
    }

    pub fn state(&self) -> InstallState {
        self.state
    }

    /// Resolve names, links and paths. Pure computation.
    pub fn plan(&self) -> Result<InstallPlan, InstallError> {
        InstallPlan::resolve(self.plugin.as_ref(), &self.identity, &self.platform, &self.config)
    }

    /// Version of the bindings currently in the bindings dir, if importable.
    pub fn installed_version(&self) -> Result<Option<String>, InstallError> {
        self.plugin
            .probe(&self.toolchain, &self.config.bindings_dir)
            .map_err(|e| e.at(Step::Probe))
    }

    /// Run the whole pipeline.
    pub fn install(&mut self) -> Result<InstallReport, InstallError> {
        self.state = InstallState::NotStarted;
        log::info!("Installing {} for {}", self.identity, self.platform);

        let plan = self.plan()?;
        fs::create_dir_all(&plan.base_dir).map_err(|e| SolverError::from(e).at(Step::Resolve))?;
        fs::create_dir_all(&plan.bindings_dir)
            .map_err(|e| SolverError::from(e).at(Step::Resolve))?;

        if !self.config.force {
            if let Some(version) = self.installed_version()? {
                if version == self.identity.version {
                    log::info!(
                        "{} is already installed in {}",
                        self.identity,
                        plan.bindings_dir.display()
                    );
                    self.state = InstallState::Verified;
                    return Ok(InstallReport {
                        version,
                        bindings_dir: plan.bindings_dir,
                        artifacts: Vec::new(),
                        already_installed: true,
                    });
                }
                log::info!(
                    "Found {} {} in {}, replacing it",
                    self.identity.name,
                    version,
                    plan.bindings_dir.display()
                );
            }
        }

        self.fetcher
            .fetch_with_fallback(
                &plan.location.native_link,
                plan.location.mirror_link.as_deref(),
                &plan.archive_path,
            )
            .map_err(|e| e.at(Step::Fetch))?;
        self.state = InstallState::Fetched;

        let root = ArchiveExtractor::extract_with_format(
            &plan.archive_path,
            &plan.base_dir,
            plan.location.format,
        )
        .map_err(|e| e.at(Step::Extract))?;
        if root != plan.extract_path {
            log::debug!(
                "Archive unpacked to {} instead of {}",
                root.display(),
                plan.extract_path.display()
            );
        }
        self.state = InstallState::Extracted;

        let ctx = BuildContext {
            platform: &self.platform,
            fetcher: &self.fetcher,
            toolchain: &self.toolchain,
        };

        log::info!("Building {} bindings", self.identity.name);
        self.plugin
            .compile(&ctx, &root)
            .map_err(|e| e.at(Step::Build))?;
        self.state = InstallState::Built;

        let artifacts = self
            .plugin
            .relocate(&ctx, &root, &plan.bindings_dir)
            .map_err(|e| e.at(Step::Relocate))?;
        log::info!(
            "Moved {} artifacts to {}",
            artifacts.len(),
            plan.bindings_dir.display()
        );
        self.state = InstallState::Relocated;

        let version = self
            .installed_version()?
            .ok_or_else(|| {
                SolverError::VerificationFailed {
                    solver: self.identity.name.clone(),
                    bindings_dir: plan.bindings_dir.clone(),
                }
                .at(Step::Probe)
            })?;
        if version != self.identity.version {
            log::warn!(
                "Requested {} {} but the installed bindings report {}",
                self.identity.name,
                self.identity.version,
                version
            );
        }
        self.state = InstallState::Verified;

        Ok(InstallReport {
            version,
            bindings_dir: plan.bindings_dir,
            artifacts,
            already_installed: false,
        })
    }
}
