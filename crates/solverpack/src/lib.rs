pub mod archive;
pub mod build;
pub mod downloader;
pub mod error;
pub mod http;
pub mod installer;
pub mod platform;
pub mod solvers;

pub use error::{FailedAttempt, InstallError, Result, SolverError, Step};
pub use archive::{ArchiveLocation, PackageFormat, SolverIdentity};
pub use build::{PatchOutcome, Toolchain};
pub use downloader::{ArchiveExtractor, Fetcher};
pub use http::{HttpClient, HttpClientConfig, HttpError, Transport};
pub use installer::{InstallPlan, InstallReport, InstallState, Installer, InstallerConfig};
pub use platform::{OsName, Platform};
pub use solvers::{plugin_for, BuildContext, SolverPlugin};
