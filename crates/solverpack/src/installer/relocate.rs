//! Moving build artifacts into the bindings directory.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use crate::{Result, SolverError};

/// Find the build output directory matching `pattern` under `build_dir`.
///
/// The directory name is platform qualified (`lib.linux-x86_64-cpython-311`)
/// so it is discovered rather than computed. No match is an error. When
/// several match, the most recently modified one wins.
pub fn find_build_output(build_dir: &Path, pattern: &str) -> Result<PathBuf> {
    let full_pattern = format!(
        "{}/{}",
        glob::Pattern::escape(&build_dir.to_string_lossy()),
        pattern
    );
    let missing = || SolverError::BuildOutputMissing {
        pattern: full_pattern.clone(),
    };

    let mut candidates: Vec<PathBuf> = glob::glob(&full_pattern)
        .map_err(|_| missing())?
        .filter_map(|entry| entry.ok())
        .filter(|path| path.is_dir())
        .collect();

    match candidates.len() {
        0 => Err(missing()),
        1 => Ok(candidates.remove(0)),
        n => {
            candidates.sort_by_key(|path| modified(path));
            let newest = candidates.pop().ok_or_else(missing)?;
            log::warn!(
                "{} build outputs match {}, using the newest: {}",
                n,
                full_pattern,
                newest.display()
            );
            Ok(newest)
        }
    }
}

fn modified(path: &Path) -> SystemTime {
    fs::metadata(path)
        .and_then(|m| m.modified())
        .unwrap_or(SystemTime::UNIX_EPOCH)
}

/// Move `src` into `dest_dir`, replacing a file of the same name.
///
/// Returns the new path.
pub fn move_into(src: &Path, dest_dir: &Path) -> Result<PathBuf> {
    let file_name = src.file_name().ok_or_else(|| SolverError::ArtifactMissing {
        path: src.to_path_buf(),
    })?;
    if !src.exists() {
        return Err(SolverError::ArtifactMissing {
            path: src.to_path_buf(),
        });
    }

    fs::create_dir_all(dest_dir)?;
    let dest = dest_dir.join(file_name);
    if dest.is_file() {
        fs::remove_file(&dest)?;
    }

    match fs::rename(src, &dest) {
        Ok(()) => {}
        // Different filesystems cannot rename; copy then remove
        Err(e) if is_cross_device(&e) && src.is_file() => {
            fs::copy(src, &dest)?;
            fs::remove_file(src)?;
        }
        Err(e) => return Err(e.into()),
    }

    log::debug!("Moved {} to {}", src.display(), dest.display());
    Ok(dest)
}

#[cfg(unix)]
fn is_cross_device(e: &std::io::Error) -> bool {
    // EXDEV
    e.raw_os_error() == Some(18)
}

#[cfg(not(unix))]
fn is_cross_device(e: &std::io::Error) -> bool {
    // ERROR_NOT_SAME_DEVICE
    e.raw_os_error() == Some(17)
}

/// Move every file directly inside `dir` whose name satisfies `select`.
pub fn move_matching<F>(dir: &Path, dest_dir: &Path, select: F) -> Result<Vec<PathBuf>>
where
    F: Fn(&str) -> bool,
{
    let mut names: Vec<PathBuf> = fs::read_dir(dir)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_file())
        .filter(|path| {
            path.file_name()
                .map(|n| select(&n.to_string_lossy()))
                .unwrap_or(false)
        })
        .collect();
    names.sort();

    names.iter().map(|path| move_into(path, dest_dir)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_find_build_output() {
        let dir = TempDir::new().unwrap();
        let build = dir.path().join("build");
        fs::create_dir_all(build.join("lib.linux-x86_64-cpython-311")).unwrap();
        fs::create_dir_all(build.join("temp.linux-x86_64-cpython-311")).unwrap();

        let found = find_build_output(&build, "lib.*").unwrap();
        assert_eq!(found, build.join("lib.linux-x86_64-cpython-311"));
    }

    #[test]
    fn test_find_build_output_none() {
        let dir = TempDir::new().unwrap();
        let build = dir.path().join("build");
        fs::create_dir_all(build.join("temp.linux-x86_64-3.9")).unwrap();
        // A plain file matching the pattern is not a build output
        fs::write(build.join("lib.txt"), "").unwrap();

        let err = find_build_output(&build, "lib.*").unwrap_err();
        assert!(matches!(err, SolverError::BuildOutputMissing { .. }));

        let err = find_build_output(&dir.path().join("missing"), "lib.*").unwrap_err();
        assert!(matches!(err, SolverError::BuildOutputMissing { .. }));
    }

    #[test]
    fn test_find_build_output_escapes_base() {
        let dir = TempDir::new().unwrap();
        let build = dir.path().join("weird[dir]").join("build");
        fs::create_dir_all(build.join("lib.win-amd64-3.8")).unwrap();

        let found = find_build_output(&build, "lib.*").unwrap();
        assert_eq!(found, build.join("lib.win-amd64-3.8"));
    }

    #[test]
    fn test_move_into_replaces_existing() {
        let dir = TempDir::new().unwrap();
        let src = dir.path().join("mathsat.py");
        let dest_dir = dir.path().join("bindings");
        fs::create_dir_all(&dest_dir).unwrap();
        fs::write(&src, "new").unwrap();
        fs::write(dest_dir.join("mathsat.py"), "old").unwrap();

        let moved = move_into(&src, &dest_dir).unwrap();

        assert_eq!(moved, dest_dir.join("mathsat.py"));
        assert_eq!(fs::read_to_string(&moved).unwrap(), "new");
        assert!(!src.exists());
    }

    #[test]
    fn test_move_into_missing_source() {
        let dir = TempDir::new().unwrap();
        let err = move_into(&dir.path().join("mathsat.dll"), dir.path()).unwrap_err();
        assert!(matches!(err, SolverError::ArtifactMissing { .. }));
    }

    #[test]
    fn test_move_matching() {
        let dir = TempDir::new().unwrap();
        let out = dir.path().join("lib.linux");
        let dest = dir.path().join("bindings");
        fs::create_dir_all(&out).unwrap();
        fs::write(out.join("_mathsat.cpython-311-x86_64-linux-gnu.so"), "").unwrap();
        fs::write(out.join("notes.txt"), "").unwrap();

        let moved = move_matching(&out, &dest, |name| name.ends_with(".so")).unwrap();

        assert_eq!(moved, vec![dest.join("_mathsat.cpython-311-x86_64-linux-gnu.so")]);
        assert!(out.join("notes.txt").exists());
    }
}
