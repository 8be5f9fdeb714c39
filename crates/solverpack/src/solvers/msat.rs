//! MathSAT 5 and its SWIG-generated Python bindings.

use std::path::{Path, PathBuf};

use crate::archive::{ArchiveLocation, PackageFormat};
use crate::build::{FileOverride, TextPatch, Toolchain};
use crate::installer::probe::probe_version;
use crate::installer::relocate::{find_build_output, move_into, move_matching};
use crate::platform::{OsName, Platform};
use crate::{Result, SolverError};

use super::{BuildContext, SolverPlugin};

const NATIVE_LINK: &str = "http://mathsat.fbk.eu/download.php?file={archive_name}";

/// Directory of the Python bindings inside the extracted tree
const PYTHON_DIR: &str = "python";
const SWIG_WRAPPER: &str = "python/mathsat_python_wrap.c";
const WRAPPER_MODULE: &str = "mathsat.py";

// The SWIG wrapper of MathSAT <= 5.4.1 releases a malloc'd array with
// msat_free, which crashes on windows.
const FREE_PATCH_FIND: &str = "if (arg2) msat_free(arg2);";
const FREE_PATCH_REPLACE: &str = "if (arg2) free(arg2);";

const WIN_SETUP_PY: &str = include_str!("msat_setup_win.py");

const GMP_HEADER_URL: &str =
    "https://raw.githubusercontent.com/mikand/tamer-windows-deps/master/gmp/include/gmp.h";
const MPIR_BASE_URL: &str = "https://github.com/Legrandin/mpir-windows-builds/blob/master";

const PROBE_SCRIPT: &str = "import mathsat; print(mathsat.msat_get_version())";

/// MathSAT plugin
#[derive(Debug, Clone, Copy, Default)]
pub struct MathSat;

impl MathSat {
    /// Archive file name and packaging for a version on a platform.
    pub fn archive_name(version: &str, platform: &Platform) -> Result<(String, PackageFormat)> {
        let (os_label, arch_label, format) = match &platform.os {
            OsName::Windows => {
                let os = if platform.bits == 64 { "win64" } else { "win32" };
                (os.to_string(), "msvc".to_string(), PackageFormat::Zip)
            }
            OsName::Darwin => (
                "darwin-libcxx".to_string(),
                platform.arch.clone(),
                PackageFormat::TarGz,
            ),
            OsName::Linux => (
                platform.os.to_string(),
                platform.arch.clone(),
                PackageFormat::TarGz,
            ),
            OsName::Other(_) => {
                return Err(SolverError::UnsupportedPlatform {
                    solver: "msat".to_string(),
                    platform: platform.to_string(),
                })
            }
        };

        let name = format!(
            "mathsat-{}-{}-{}.{}",
            version,
            os_label,
            arch_label,
            format.extension()
        );
        Ok((name, format))
    }

    /// Extra files the windows build needs and the OS does not provide:
    /// `(url, path relative to the extracted root)`.
    fn windows_dependencies(bits: u8) -> Vec<(String, PathBuf)> {
        let mpir = format!("{}/mpir-2.6.0_VS2015_{}", MPIR_BASE_URL, bits);
        vec![
            (GMP_HEADER_URL.to_string(), Path::new("include").join("gmp.h")),
            (format!("{}/mpir.dll?raw=true", mpir), Path::new("lib").join("mpir.dll")),
            (format!("{}/mpir.lib?raw=true", mpir), Path::new("lib").join("mpir.lib")),
        ]
    }
}

impl SolverPlugin for MathSat {
    fn name(&self) -> &'static str {
        "msat"
    }

    fn default_version(&self) -> &'static str {
        "5.6.8"
    }

    fn locate(
        &self,
        version: &str,
        platform: &Platform,
        mirror: Option<&str>,
    ) -> Result<ArchiveLocation> {
        let (archive_name, format) = Self::archive_name(version, platform)?;
        ArchiveLocation::new(archive_name, format, NATIVE_LINK, mirror, version)
    }

    fn compile(&self, ctx: &BuildContext<'_>, extracted_root: &Path) -> Result<()> {
        TextPatch::new(SWIG_WRAPPER, FREE_PATCH_FIND, FREE_PATCH_REPLACE).apply(extracted_root)?;

        if ctx.platform.is_windows() {
            for (url, relative) in Self::windows_dependencies(ctx.platform.bits) {
                ctx.fetcher.fetch(&url, &extracted_root.join(relative))?;
            }
            FileOverride::new(Path::new(PYTHON_DIR).join("setup.py"), WIN_SETUP_PY)
                .apply(extracted_root)?;
        }

        ctx.toolchain
            .run_python(["./setup.py", "build"], &extracted_root.join(PYTHON_DIR))
    }

    fn relocate(
        &self,
        ctx: &BuildContext<'_>,
        extracted_root: &Path,
        bindings_dir: &Path,
    ) -> Result<Vec<PathBuf>> {
        let python_dir = extracted_root.join(PYTHON_DIR);
        let build_output = find_build_output(&python_dir.join("build"), "lib.*")?;

        let mut moved = move_matching(&build_output, bindings_dir, |name| {
            name.ends_with(".so") || name.ends_with(".pyd")
        })?;
        if moved.is_empty() {
            return Err(SolverError::ArtifactMissing {
                path: build_output.join("_mathsat.*"),
            });
        }

        moved.push(move_into(&python_dir.join(WRAPPER_MODULE), bindings_dir)?);

        // The extension module loads these at import time
        if ctx.platform.is_windows() {
            let lib_dir = extracted_root.join("lib");
            for dll in ["mathsat.dll", "mpir.dll"] {
                moved.push(move_into(&lib_dir.join(dll), bindings_dir)?);
            }
        }

        Ok(moved)
    }

    fn probe(&self, toolchain: &Toolchain, bindings_dir: &Path) -> Result<Option<String>> {
        probe_version(toolchain, bindings_dir, PROBE_SCRIPT)
    }
}
