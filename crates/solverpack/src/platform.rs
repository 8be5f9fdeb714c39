//! Platform detection.
//!
//! The platform is resolved once per run into an immutable [`Platform`]
//! value that every other component receives by reference. Raw values are
//! normalized so archive policies only ever see one spelling per OS and
//! architecture, whatever convention the host reports them in.

use std::fmt;

use serde::Serialize;

/// Normalized operating system name
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(into = "String")]
pub enum OsName {
    Linux,
    Darwin,
    Windows,
    Other(String),
}

impl OsName {
    /// Normalize an OS name as reported by Rust (`macos`), Python's
    /// `platform.system()` (`Darwin`), or uname.
    pub fn normalize(raw: &str) -> Self {
        let lower = raw.trim().to_lowercase();
        match lower.as_str() {
            "linux" => OsName::Linux,
            "darwin" | "macos" | "osx" => OsName::Darwin,
            "windows" | "win32" | "win64" => OsName::Windows,
            _ => OsName::Other(lower),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            OsName::Linux => "linux",
            OsName::Darwin => "darwin",
            OsName::Windows => "windows",
            OsName::Other(name) => name,
        }
    }
}

impl fmt::Display for OsName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<OsName> for String {
    fn from(os: OsName) -> Self {
        os.as_str().to_string()
    }
}

/// Normalize a machine/architecture string.
pub fn normalize_arch(raw: &str) -> String {
    let lower = raw.trim().to_lowercase();
    match lower.as_str() {
        "x86_64" | "amd64" | "x64" => "x86_64".to_string(),
        "x86" | "i386" | "i486" | "i586" | "i686" => "x86".to_string(),
        "aarch64" | "arm64" => "aarch64".to_string(),
        _ => lower,
    }
}

/// The (os, architecture, bits) triple archive policies are keyed on.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Platform {
    pub os: OsName,
    pub arch: String,
    pub bits: u8,
}

impl Platform {
    /// Build a platform from raw, unnormalized values.
    pub fn from_raw(os: &str, machine: &str, bits: u8) -> Self {
        Self {
            os: OsName::normalize(os),
            arch: normalize_arch(machine),
            bits,
        }
    }

    /// Detect the platform this process runs on. Never fails; unsupported
    /// combinations are rejected later by the archive policy.
    pub fn detect() -> Self {
        let bits = if cfg!(target_pointer_width = "64") { 64 } else { 32 };
        let platform = Self::from_raw(std::env::consts::OS, std::env::consts::ARCH, bits);
        log::debug!("Detected platform {}", platform);
        platform
    }

    pub fn is_windows(&self) -> bool {
        self.os == OsName::Windows
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{} ({}-bit)", self.os, self.arch, self.bits)
    }
}
