//! Archive naming and download link computation.
//!
//! Everything here is pure: it turns a solver identity, a platform, and
//! the solver's naming policy into file names and URLs without touching
//! the network or the filesystem.

use std::fmt;
use std::path::Path;
use std::sync::OnceLock;

use regex::Regex;
use serde::Serialize;
use url::Url;

use crate::{Result, SolverError};

/// Packaging format of a solver archive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum PackageFormat {
    TarGz,
    Zip,
}

impl PackageFormat {
    /// File extension without the leading dot
    pub fn extension(&self) -> &'static str {
        match self {
            PackageFormat::TarGz => "tar.gz",
            PackageFormat::Zip => "zip",
        }
    }

    /// Detect the format from a file name
    pub fn from_path(path: &Path) -> Option<Self> {
        let name = path.file_name()?.to_string_lossy().to_lowercase();

        if name.ends_with(".tar.gz") || name.ends_with(".tgz") {
            Some(PackageFormat::TarGz)
        } else if name.ends_with(".zip") {
            Some(PackageFormat::Zip)
        } else {
            None
        }
    }
}

impl fmt::Display for PackageFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// Which solver, at which version
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SolverIdentity {
    pub name: String,
    pub version: String,
}

impl SolverIdentity {
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
        }
    }

    /// Reject versions that are not dotted numbers before they end up in a
    /// file name or URL.
    pub fn validate(&self) -> Result<()> {
        static VERSION_RE: OnceLock<Regex> = OnceLock::new();
        let re = VERSION_RE.get_or_init(|| Regex::new(r"^\d+(\.\d+)*$").expect("valid regex"));

        if re.is_match(&self.version) {
            Ok(())
        } else {
            Err(SolverError::InvalidVersion {
                solver: self.name.clone(),
                version: self.version.clone(),
            })
        }
    }
}

impl fmt::Display for SolverIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.name, self.version)
    }
}

/// Where an archive comes from and what it is called on disk
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArchiveLocation {
    pub archive_name: String,
    pub format: PackageFormat,
    pub native_link: String,
    pub mirror_link: Option<String>,
}

impl ArchiveLocation {
    /// Build a location from an archive name, the solver's native URL
    /// template, and an optional caller-supplied mirror.
    pub fn new(
        archive_name: String,
        format: PackageFormat,
        native_template: &str,
        mirror: Option<&str>,
        version: &str,
    ) -> Result<Self> {
        let native_link = expand_template(native_template, &archive_name, version);
        let mirror_link = mirror
            .map(|m| resolve_mirror(m, &archive_name, version))
            .transpose()?;

        Ok(Self {
            archive_name,
            format,
            native_link,
            mirror_link,
        })
    }

    /// Archive name without its extension. Solver archives unpack into a
    /// directory of this name.
    pub fn stem(&self) -> &str {
        let suffix = format!(".{}", self.format.extension());
        self.archive_name
            .strip_suffix(&suffix)
            .unwrap_or(&self.archive_name)
    }
}

/// Substitute `{archive_name}` and `{solver_version}` in a URL template.
pub fn expand_template(template: &str, archive_name: &str, version: &str) -> String {
    template
        .replace("{archive_name}", &urlencoding::encode(archive_name))
        .replace("{solver_version}", version)
}

/// Turn a mirror setting into the URL of one archive.
///
/// A mirror containing `{archive_name}` is a template; anything else is a
/// base URL the archive name is appended to.
pub fn resolve_mirror(mirror: &str, archive_name: &str, version: &str) -> Result<String> {
    let invalid = |reason: String| SolverError::InvalidMirror {
        link: mirror.to_string(),
        reason,
    };

    if mirror.contains("{archive_name}") {
        let link = expand_template(mirror, archive_name, version);
        Url::parse(&link).map_err(|e| invalid(e.to_string()))?;
        return Ok(link);
    }

    let mut base = Url::parse(mirror).map_err(|e| invalid(e.to_string()))?;
    if base.cannot_be_a_base() {
        return Err(invalid("not a base URL".to_string()));
    }
    if !base.path().ends_with('/') {
        let path = format!("{}/", base.path());
        base.set_path(&path);
    }

    base.join(archive_name)
        .map(String::from)
        .map_err(|e| invalid(e.to_string()))
}
