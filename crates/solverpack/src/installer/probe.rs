//! Reading back the version reported by installed bindings.

use std::path::Path;
use std::sync::OnceLock;

use regex::Regex;

use crate::build::Toolchain;
use crate::Result;

/// Import the bindings in `bindings_dir` with `script` and return the
/// version they report.
///
/// Bindings that cannot be imported give `Ok(None)`: that means "not
/// installed", not a failure.
pub fn probe_version(
    toolchain: &Toolchain,
    bindings_dir: &Path,
    script: &str,
) -> Result<Option<String>> {
    if !bindings_dir.is_dir() {
        log::debug!("{} does not exist, nothing installed", bindings_dir.display());
        return Ok(None);
    }

    let reported = toolchain.eval_with_path(script, bindings_dir)?;
    Ok(reported
        .filter(|out| !out.is_empty())
        .map(|out| parse_reported_version(&out)))
}

/// Extract the dotted version from a banner such as
/// `MathSAT5 version 5.6.8 (a1b2c3) (Mar  1 2022 09:00:00, gmp 6.1.2)`.
/// Output without such a banner is returned trimmed.
pub fn parse_reported_version(output: &str) -> String {
    static BANNER_RE: OnceLock<Regex> = OnceLock::new();
    let re = BANNER_RE
        .get_or_init(|| Regex::new(r"(?i)\bversion\s+v?(\d+(?:\.\d+)+)").expect("valid regex"));

    match re.captures(output) {
        Some(caps) => caps[1].to_string(),
        None => output.trim().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_parse_banner() {
        assert_eq!(
            parse_reported_version(
                "MathSAT5 version 5.6.8 (b8f6fa7e7ab2) (Mar  8 2022 09:46:41, gmp 6.1.2, gcc 7.3.0, 64-bit)"
            ),
            "5.6.8"
        );
        assert_eq!(parse_reported_version("Version v4.8.10"), "4.8.10");
    }

    #[test]
    fn test_parse_plain_version() {
        assert_eq!(parse_reported_version(" 5.6.8\n"), "5.6.8");
    }

    #[test]
    fn test_missing_bindings_dir_is_absent() {
        let dir = TempDir::new().unwrap();
        let toolchain = Toolchain::new(dir.path().join("never-run"));

        let version = probe_version(&toolchain, &dir.path().join("bindings"), "import x").unwrap();
        assert_eq!(version, None);
    }

    #[cfg(unix)]
    #[test]
    fn test_probe_reads_version() {
        use std::fs;
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let bindings = dir.path().join("bindings");
        fs::create_dir(&bindings).unwrap();
        let python = dir.path().join("python");
        fs::write(
            &python,
            "#!/bin/sh\n[ -f \"$PYTHONPATH/mathsat.py\" ] || exit 1\necho 'MathSAT5 version 5.6.8 (abc)'\n",
        )
        .unwrap();
        fs::set_permissions(&python, fs::Permissions::from_mode(0o755)).unwrap();
        let toolchain = Toolchain::new(&python);

        // Empty bindings dir: import fails
        assert_eq!(probe_version(&toolchain, &bindings, "import mathsat").unwrap(), None);

        fs::write(bindings.join("mathsat.py"), "").unwrap();
        assert_eq!(
            probe_version(&toolchain, &bindings, "import mathsat").unwrap(),
            Some("5.6.8".to_string())
        );
    }
}
