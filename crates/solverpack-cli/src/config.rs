use anyhow::{Context, Result};
use serde::Deserialize;
use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

use solverpack::build::default_python;
use solverpack::HttpClientConfig;

pub const CONFIG_FILE: &str = "solverpack.toml";
const DEFAULT_TIMEOUT_SECS: u64 = 300;

/// The solverpack configuration file structure (solverpack.toml)
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SolverpackConfig {
    /// Where archives are downloaded and built
    pub install_dir: Option<PathBuf>,

    /// Where the importable bindings end up
    pub bindings_dir: Option<PathBuf>,

    /// Fallback download location (base URL or `{archive_name}` template)
    pub mirror: Option<String>,

    /// Python interpreter used to build and probe the bindings
    pub python: Option<PathBuf>,

    /// HTTP request timeout in seconds
    pub timeout: Option<u64>,

    /// HTTP proxy URL
    pub proxy: Option<String>,

    /// Extra CA certificate (PEM)
    pub cafile: Option<PathBuf>,
}

impl SolverpackConfig {
    /// Load configuration from solverpack.toml, searching upward from the given directory.
    ///
    /// Relative paths in the file are resolved against the directory holding it.
    pub fn load(start_dir: &Path) -> Result<Option<Self>> {
        let mut current = start_dir.to_path_buf();

        loop {
            let config_path = current.join(CONFIG_FILE);

            if config_path.is_file() {
                let content = std::fs::read_to_string(&config_path)
                    .with_context(|| format!("Failed to read {}", config_path.display()))?;
                let mut config: SolverpackConfig = toml::from_str(&content)
                    .with_context(|| format!("Failed to parse {}", config_path.display()))?;
                config.anchor(&current);
                log::debug!("Loaded configuration from {}", config_path.display());
                return Ok(Some(config));
            }

            if !current.pop() {
                return Ok(None);
            }
        }
    }

    /// Load configuration by searching upward from the current working directory
    pub fn load_from_cwd() -> Result<Option<Self>> {
        let cwd = env::current_dir()?;
        Self::load(&cwd)
    }

    fn anchor(&mut self, base: &Path) {
        for path in [&mut self.install_dir, &mut self.bindings_dir, &mut self.cafile]
            .into_iter()
            .flatten()
        {
            if path.is_relative() {
                *path = base.join(&*path);
            }
        }
        // A bare interpreter name is looked up on PATH
        if let Some(python) = &mut self.python {
            if python.components().count() > 1 && python.is_relative() {
                *python = base.join(&*python);
            }
        }
    }
}

/// Values given on the command line; they win over everything else
#[derive(Debug, Default, Clone)]
pub struct Overrides {
    pub install_dir: Option<PathBuf>,
    pub bindings_dir: Option<PathBuf>,
    pub mirror: Option<String>,
    pub python: Option<PathBuf>,
}

/// Fully resolved settings for one command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub install_dir: PathBuf,
    pub bindings_dir: PathBuf,
    pub mirror: Option<String>,
    pub python: PathBuf,
    pub timeout: Duration,
    pub proxy: Option<String>,
    pub cafile: Option<PathBuf>,
}

impl Settings {
    pub fn http_config(&self) -> HttpClientConfig {
        let mut config = HttpClientConfig::new().with_timeout(self.timeout);
        if let Some(proxy) = &self.proxy {
            config = config.with_proxy(proxy.clone());
        }
        if let Some(cafile) = &self.cafile {
            config = config.with_cafile(cafile.clone());
        }
        config
    }
}

/// Merges CLI flags, `SOLVERPACK_*` variables, the config file and defaults
pub struct ConfigLoader {
    use_environment: bool,
}

impl ConfigLoader {
    pub fn new(use_environment: bool) -> Self {
        Self { use_environment }
    }

    /// Get a SOLVERPACK_* environment variable
    pub fn env(&self, var: &str) -> Option<String> {
        if !self.use_environment {
            return None;
        }

        env::var(var).ok().filter(|s| !s.is_empty())
    }

    /// Platform data directory, e.g. `~/.local/share/solverpack`
    pub fn data_dir(&self) -> PathBuf {
        if let Some(proj_dirs) = directories::ProjectDirs::from("", "", "solverpack") {
            proj_dirs.data_dir().to_path_buf()
        } else if let Some(base) = directories::BaseDirs::new() {
            base.home_dir().join(".solverpack")
        } else {
            PathBuf::from(".solverpack")
        }
    }

    pub fn resolve(&self, file: Option<SolverpackConfig>, cli: Overrides) -> Result<Settings> {
        let file = file.unwrap_or_default();

        let install_dir = cli
            .install_dir
            .or_else(|| self.env("SOLVERPACK_INSTALL_DIR").map(PathBuf::from))
            .or(file.install_dir)
            .unwrap_or_else(|| self.data_dir());

        let bindings_dir = cli
            .bindings_dir
            .or_else(|| self.env("SOLVERPACK_BINDINGS_DIR").map(PathBuf::from))
            .or(file.bindings_dir)
            .unwrap_or_else(|| install_dir.join("bindings"));

        let mirror = cli
            .mirror
            .or_else(|| self.env("SOLVERPACK_MIRROR"))
            .or(file.mirror);

        let python = cli
            .python
            .or_else(|| self.env("SOLVERPACK_PYTHON").map(PathBuf::from))
            .or(file.python)
            .unwrap_or_else(|| PathBuf::from(default_python()));

        let timeout_secs = match self.env("SOLVERPACK_TIMEOUT") {
            Some(raw) => raw
                .trim()
                .parse::<u64>()
                .with_context(|| format!("SOLVERPACK_TIMEOUT must be a number of seconds, got {:?}", raw))?,
            None => file.timeout.unwrap_or(DEFAULT_TIMEOUT_SECS),
        };

        Ok(Settings {
            install_dir,
            bindings_dir,
            mirror,
            python,
            timeout: Duration::from_secs(timeout_secs),
            proxy: file.proxy,
            cafile: file.cafile,
        })
    }

    /// Resolve settings using the solverpack.toml found from the working directory
    pub fn load(&self, cli: Overrides) -> Result<Settings> {
        let file = SolverpackConfig::load_from_cwd()?;
        self.resolve(file, cli)
    }
}
