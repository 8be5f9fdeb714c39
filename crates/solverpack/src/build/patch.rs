//! Source patching applied to an extracted tree before building.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::{Result, SolverError};

/// Result of applying a [`TextPatch`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatchOutcome {
    /// The target text was found and replaced
    Applied,
    /// The target text is absent, the file is taken as already patched
    AlreadyApplied,
}

/// An exact substring replacement in one file of the extracted tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextPatch {
    /// Path relative to the tree root
    pub file: PathBuf,
    pub find: String,
    pub replace: String,
}

impl TextPatch {
    pub fn new(file: impl Into<PathBuf>, find: impl Into<String>, replace: impl Into<String>) -> Self {
        Self {
            file: file.into(),
            find: find.into(),
            replace: replace.into(),
        }
    }

    /// Replace every occurrence of `find` in `root/file`.
    ///
    /// A missing file is an error; a file without the target text is left
    /// untouched and reported as [`PatchOutcome::AlreadyApplied`].
    pub fn apply(&self, root: &Path) -> Result<PatchOutcome> {
        let path = root.join(&self.file);
        let contents = match fs::read_to_string(&path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(SolverError::PatchTargetMissing { path });
            }
            Err(e) => return Err(e.into()),
        };

        let Some(patched) = apply_to_str(&contents, &self.find, &self.replace) else {
            log::debug!("Patch already applied to {}", path.display());
            return Ok(PatchOutcome::AlreadyApplied);
        };

        fs::write(&path, patched)?;
        log::info!("Patched {}", path.display());
        Ok(PatchOutcome::Applied)
    }
}

/// Replace every occurrence of `find` in `source`, or `None` if absent.
pub fn apply_to_str(source: &str, find: &str, replace: &str) -> Option<String> {
    if find.is_empty() || !source.contains(find) {
        return None;
    }
    Some(source.replace(find, replace))
}

/// Replace a whole file with contents embedded in the installer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileOverride {
    /// Path relative to the tree root
    pub file: PathBuf,
    pub contents: &'static str,
}

impl FileOverride {
    pub fn new(file: impl Into<PathBuf>, contents: &'static str) -> Self {
        Self {
            file: file.into(),
            contents,
        }
    }

    /// Overwrite `root/file`. The file's directory must already exist.
    pub fn apply(&self, root: &Path) -> Result<()> {
        let path = root.join(&self.file);
        match path.parent() {
            Some(parent) if !parent.is_dir() => {
                return Err(SolverError::PatchTargetMissing {
                    path: parent.to_path_buf(),
                });
            }
            _ => {}
        }

        fs::write(&path, self.contents)?;
        log::info!("Replaced {}", path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const KEY: &str = "if (arg2) msat_free(arg2);";
    const SUBST: &str = "if (arg2) free(arg2);";

    #[test]
    fn test_apply_to_str_replaces_every_occurrence() {
        let source = "a();\nif (arg2) msat_free(arg2);\nb();\nif (arg2) msat_free(arg2);\n";
        let patched = apply_to_str(source, KEY, SUBST).unwrap();
        assert_eq!(
            patched,
            "a();\nif (arg2) free(arg2);\nb();\nif (arg2) free(arg2);\n"
        );
    }

    #[test]
    fn test_patch_with_two_targets_is_complete_after_one_run() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("wrap.c");
        fs::write(&file, format!("{}\n{}\n", KEY, KEY)).unwrap();

        let patch = TextPatch::new("wrap.c", KEY, SUBST);
        assert_eq!(patch.apply(dir.path()).unwrap(), PatchOutcome::Applied);
        assert_eq!(
            fs::read_to_string(&file).unwrap(),
            format!("{}\n{}\n", SUBST, SUBST)
        );
        assert_eq!(patch.apply(dir.path()).unwrap(), PatchOutcome::AlreadyApplied);
    }

    #[test]
    fn test_apply_to_str_absent_is_none() {
        assert_eq!(apply_to_str("nothing to see", KEY, SUBST), None);
        assert_eq!(apply_to_str("anything", "", SUBST), None);
    }

    #[test]
    fn test_patch_applied_keeps_rest_identical() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("python/mathsat_python_wrap.c");
        fs::create_dir_all(file.parent().unwrap()).unwrap();
        let before = format!("/* head */\r\n{}\n\t/* tail */", KEY);
        fs::write(&file, &before).unwrap();

        let patch = TextPatch::new("python/mathsat_python_wrap.c", KEY, SUBST);
        assert_eq!(patch.apply(dir.path()).unwrap(), PatchOutcome::Applied);
        assert_eq!(
            fs::read_to_string(&file).unwrap(),
            format!("/* head */\r\n{}\n\t/* tail */", SUBST)
        );

        // Second run is a no-op
        assert_eq!(patch.apply(dir.path()).unwrap(), PatchOutcome::AlreadyApplied);
        assert_eq!(
            fs::read_to_string(&file).unwrap(),
            format!("/* head */\r\n{}\n\t/* tail */", SUBST)
        );
    }

    #[test]
    fn test_patch_missing_file_is_error() {
        let dir = TempDir::new().unwrap();
        let patch = TextPatch::new("python/mathsat_python_wrap.c", KEY, SUBST);

        let err = patch.apply(dir.path()).unwrap_err();
        match err {
            SolverError::PatchTargetMissing { path } => {
                assert_eq!(path, dir.path().join("python/mathsat_python_wrap.c"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_file_override() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("python")).unwrap();
        fs::write(dir.path().join("python/setup.py"), "old").unwrap();

        FileOverride::new("python/setup.py", "new contents\n")
            .apply(dir.path())
            .unwrap();
        assert_eq!(
            fs::read_to_string(dir.path().join("python/setup.py")).unwrap(),
            "new contents\n"
        );

        let err = FileOverride::new("missing/setup.py", "x")
            .apply(dir.path())
            .unwrap_err();
        assert!(matches!(err, SolverError::PatchTargetMissing { .. }));
    }
}
