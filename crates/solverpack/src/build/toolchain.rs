//! Subprocess invocation of the native build toolchain.

use std::ffi::OsStr;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use crate::{Result, SolverError};

/// Lines of build output kept in a [`SolverError::BuildFailed`]
const OUTPUT_TAIL_LINES: usize = 40;

/// The interpreter used to build and import bindings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toolchain {
    python: PathBuf,
}

impl Default for Toolchain {
    fn default() -> Self {
        Self::new(default_python())
    }
}

impl Toolchain {
    pub fn new(python: impl Into<PathBuf>) -> Self {
        Self {
            python: python.into(),
        }
    }

    pub fn python(&self) -> &Path {
        &self.python
    }

    /// Run the interpreter with `args` inside `dir`. Any non-zero exit is a
    /// [`SolverError::BuildFailed`] carrying the tail of the output.
    pub fn run_python<I, S>(&self, args: I, dir: &Path) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        let mut command = Command::new(&self.python);
        command.args(args).current_dir(dir);
        let rendered = render(&command);

        log::info!("Running `{}` in {}", rendered, dir.display());
        let output = self.output(&mut command)?;
        log::trace!("stdout:\n{}", String::from_utf8_lossy(&output.stdout));
        log::trace!("stderr:\n{}", String::from_utf8_lossy(&output.stderr));

        if !output.status.success() {
            return Err(SolverError::BuildFailed {
                command: rendered,
                status: output.status.to_string(),
                output: output_tail(&output),
            });
        }

        Ok(())
    }

    /// Run `python -c script` with `PYTHONPATH` pointing at `path_dir`.
    ///
    /// Returns the trimmed stdout, or `None` if the script exited non-zero.
    pub fn eval_with_path(&self, script: &str, path_dir: &Path) -> Result<Option<String>> {
        let mut command = Command::new(&self.python);
        command.arg("-c").arg(script).env("PYTHONPATH", path_dir);
        log::debug!("Running `{}` with PYTHONPATH={}", render(&command), path_dir.display());

        let output = self.output(&mut command)?;
        if !output.status.success() {
            log::debug!(
                "Script exited with {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            );
            return Ok(None);
        }

        Ok(Some(String::from_utf8_lossy(&output.stdout).trim().to_string()))
    }

    fn output(&self, command: &mut Command) -> Result<Output> {
        command.output().map_err(|e| match e.kind() {
            ErrorKind::NotFound | ErrorKind::PermissionDenied => SolverError::ToolchainMissing {
                program: self.python.display().to_string(),
                reason: e.to_string(),
            },
            _ => SolverError::Io(e),
        })
    }
}

/// Interpreter name used when none is configured
pub fn default_python() -> &'static str {
    if cfg!(windows) {
        "python"
    } else {
        "python3"
    }
}

fn render(command: &Command) -> String {
    std::iter::once(command.get_program())
        .chain(command.get_args())
        .map(|part| part.to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join(" ")
}

fn output_tail(output: &Output) -> String {
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    let lines: Vec<&str> = stdout.lines().chain(stderr.lines()).collect();
    let start = lines.len().saturating_sub(OUTPUT_TAIL_LINES);
    lines[start..].join("\n")
}
