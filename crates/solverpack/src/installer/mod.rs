//! Installation pipeline and the steps it shares across solvers.

pub mod pipeline;
pub mod probe;
pub mod relocate;

pub use pipeline::{InstallPlan, InstallReport, InstallState, Installer, InstallerConfig};
pub use probe::{parse_reported_version, probe_version};
