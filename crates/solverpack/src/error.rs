use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

use crate::http::HttpError;

#[derive(Error, Debug)]
pub enum SolverError {
    // Resolution errors
    #[error("Unknown solver: {name}")]
    UnknownSolver { name: String },

    #[error("Invalid version for {solver}: {version:?}")]
    InvalidVersion { solver: String, version: String },

    #[error("No {solver} archive is published for {platform}")]
    UnsupportedPlatform { solver: String, platform: String },

    #[error("Invalid mirror link {link}: {reason}")]
    InvalidMirror { link: String, reason: String },

    // Download errors
    #[error("Download failed for {archive}: {}", DisplayAttempts(.attempts))]
    DownloadFailed {
        archive: String,
        attempts: Vec<FailedAttempt>,
    },

    // Extraction errors
    #[error("Unsupported archive type: {}", .path.display())]
    UnsupportedArchive { path: PathBuf },

    #[error("Corrupt archive {}: {reason}", .path.display())]
    CorruptArchive { path: PathBuf, reason: String },

    // Build errors
    #[error("Patch target not found: {}", .path.display())]
    PatchTargetMissing { path: PathBuf },

    #[error("Could not run {program}: {reason}")]
    ToolchainMissing { program: String, reason: String },

    #[error("Build command `{command}` failed ({status}):\n{output}")]
    BuildFailed {
        command: String,
        status: String,
        output: String,
    },

    // Relocation errors
    #[error("No build output matching {pattern}")]
    BuildOutputMissing { pattern: String },

    #[error("Expected build artifact is missing: {}", .path.display())]
    ArtifactMissing { path: PathBuf },

    // Verification errors
    #[error("Installed {solver} bindings in {} could not be imported", .bindings_dir.display())]
    VerificationFailed {
        solver: String,
        bindings_dir: PathBuf,
    },

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, SolverError>;

/// One failed download attempt, kept so the final error can name every URL tried.
#[derive(Debug)]
pub struct FailedAttempt {
    pub url: String,
    pub error: HttpError,
}

impl fmt::Display for FailedAttempt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.url, self.error)
    }
}

struct DisplayAttempts<'a>(&'a [FailedAttempt]);

impl fmt::Display for DisplayAttempts<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return f.write_str("no download link available");
        }
        for (i, attempt) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{}", attempt)?;
        }
        Ok(())
    }
}

/// Pipeline step, used to report where an installation stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Resolve,
    Fetch,
    Extract,
    Build,
    Relocate,
    Probe,
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Step::Resolve => "resolve",
            Step::Fetch => "fetch",
            Step::Extract => "extract",
            Step::Build => "build",
            Step::Relocate => "relocate",
            Step::Probe => "probe",
        };
        f.write_str(name)
    }
}

/// A fatal pipeline failure together with the step it happened in.
#[derive(Error, Debug)]
#[error("{step} step failed: {source}")]
pub struct InstallError {
    pub step: Step,
    #[source]
    pub source: SolverError,
}

impl SolverError {
    /// Attach the pipeline step this error aborted.
    pub fn at(self, step: Step) -> InstallError {
        InstallError { step, source: self }
    }
}
