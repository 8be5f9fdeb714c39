//! Archive extraction (tar.gz, zip).

use std::collections::BTreeSet;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Component, Path, PathBuf};

use flate2::read::GzDecoder;

use crate::archive::PackageFormat;
use crate::{Result, SolverError};

/// Archive extractor
pub struct ArchiveExtractor;

impl ArchiveExtractor {
    /// Extract an archive into `dest_dir` and return its root directory.
    ///
    /// The format is chosen from the file extension. The returned path is
    /// the single top-level directory shared by every entry, or `dest_dir`
    /// itself when the archive has no such directory.
    pub fn extract(archive_path: &Path, dest_dir: &Path) -> Result<PathBuf> {
        let format = PackageFormat::from_path(archive_path).ok_or_else(|| {
            SolverError::UnsupportedArchive {
                path: archive_path.to_path_buf(),
            }
        })?;

        Self::extract_with_format(archive_path, dest_dir, format)
    }

    /// Extract an archive with an explicit format
    pub fn extract_with_format(
        archive_path: &Path,
        dest_dir: &Path,
        format: PackageFormat,
    ) -> Result<PathBuf> {
        std::fs::create_dir_all(dest_dir)?;
        log::info!(
            "Extracting {} into {}",
            archive_path.display(),
            dest_dir.display()
        );

        let roots = match format {
            PackageFormat::Zip => Self::extract_zip(archive_path, dest_dir)?,
            PackageFormat::TarGz => Self::extract_tar_gz(archive_path, dest_dir)?,
        };

        let root = Self::single_root(dest_dir, &roots);
        log::debug!("Archive root is {}", root.display());
        Ok(root)
    }

    /// Extract a zip archive, returning the top-level names it contained
    fn extract_zip(archive_path: &Path, dest_dir: &Path) -> Result<BTreeSet<TopLevel>> {
        let corrupt = |reason: String| SolverError::CorruptArchive {
            path: archive_path.to_path_buf(),
            reason,
        };

        let file = File::open(archive_path)?;
        let mut archive = zip::ZipArchive::new(BufReader::new(file))
            .map_err(|e| corrupt(format!("Failed to open zip: {}", e)))?;

        let mut roots = BTreeSet::new();

        for i in 0..archive.len() {
            let mut entry = archive
                .by_index(i)
                .map_err(|e| corrupt(format!("Failed to read zip entry: {}", e)))?;

            // enclosed_name rejects absolute paths and `..` traversal
            let relative = entry.enclosed_name().ok_or_else(|| {
                corrupt(format!("Path traversal detected in archive: {}", entry.name()))
            })?;

            if let Some(top) = TopLevel::of(&relative, entry.is_dir()) {
                roots.insert(top);
            }

            let outpath = dest_dir.join(&relative);
            if entry.is_dir() {
                std::fs::create_dir_all(&outpath)?;
                continue;
            }

            if let Some(parent) = outpath.parent() {
                std::fs::create_dir_all(parent)?;
            }
            let mut outfile = File::create(&outpath)?;
            std::io::copy(&mut entry, &mut outfile)
                .map_err(|e| corrupt(format!("Failed to extract {}: {}", relative.display(), e)))?;

            // Set permissions on Unix
            #[cfg(unix)]
            {
                use std::os::unix::fs::PermissionsExt;
                if let Some(mode) = entry.unix_mode() {
                    std::fs::set_permissions(&outpath, std::fs::Permissions::from_mode(mode))?;
                }
            }
        }

        Ok(roots)
    }

    /// Extract a gzipped tar archive
    fn extract_tar_gz(archive_path: &Path, dest_dir: &Path) -> Result<BTreeSet<TopLevel>> {
        let file = File::open(archive_path)?;
        let decoder = GzDecoder::new(BufReader::new(file));
        Self::extract_tar_reader(decoder, archive_path, dest_dir)
    }

    /// Extract from a tar reader, keeping every path component
    fn extract_tar_reader<R: Read>(
        reader: R,
        archive_path: &Path,
        dest_dir: &Path,
    ) -> Result<BTreeSet<TopLevel>> {
        let corrupt = |reason: String| SolverError::CorruptArchive {
            path: archive_path.to_path_buf(),
            reason,
        };

        let mut archive = tar::Archive::new(reader);
        archive.set_preserve_permissions(true);

        let mut roots = BTreeSet::new();
        let mut entries = 0usize;

        for entry in archive
            .entries()
            .map_err(|e| corrupt(format!("Failed to read tar: {}", e)))?
        {
            let mut entry = entry.map_err(|e| corrupt(format!("Failed to read tar entry: {}", e)))?;
            let path = entry
                .path()
                .map_err(|e| corrupt(format!("Invalid path in tar: {}", e)))?
                .into_owned();

            let is_dir = entry.header().entry_type().is_dir();

            // unpack_in refuses entries escaping dest_dir and reports them as false
            let unpacked = entry
                .unpack_in(dest_dir)
                .map_err(|e| corrupt(format!("Failed to extract {}: {}", path.display(), e)))?;
            if !unpacked {
                return Err(corrupt(format!(
                    "Path traversal detected in archive: {}",
                    path.display()
                )));
            }

            entries += 1;
            if let Some(top) = TopLevel::of(&path, is_dir) {
                roots.insert(top);
            }
        }

        if entries == 0 {
            return Err(corrupt("Archive contains no entries".to_string()));
        }

        Ok(roots)
    }

    fn single_root(dest_dir: &Path, roots: &BTreeSet<TopLevel>) -> PathBuf {
        let mut iter = roots.iter();
        match (iter.next(), iter.next()) {
            (Some(TopLevel::Dir(name)), None) => dest_dir.join(name),
            _ => dest_dir.to_path_buf(),
        }
    }
}

/// First path component of an archive entry
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
enum TopLevel {
    Dir(String),
    File(String),
}

impl TopLevel {
    fn of(path: &Path, is_dir: bool) -> Option<Self> {
        let mut normal = path.components().filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        });

        let first = normal.next()?;
        if is_dir || normal.next().is_some() {
            Some(TopLevel::Dir(first))
        } else {
            Some(TopLevel::File(first))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use std::io::Write;
    use tempfile::TempDir;

    fn write_tar_gz(path: &Path, files: &[(&str, &str)]) {
        let file = File::create(path).unwrap();
        let encoder = GzEncoder::new(file, Compression::default());
        let mut builder = tar::Builder::new(encoder);
        for (name, contents) in files {
            let mut header = tar::Header::new_gnu();
            header.set_size(contents.len() as u64);
            header.set_mode(0o644);
            header.set_cksum();
            builder
                .append_data(&mut header, name, contents.as_bytes())
                .unwrap();
        }
        builder.into_inner().unwrap().finish().unwrap();
    }

    fn write_zip(path: &Path, files: &[(&str, &str)]) {
        let file = File::create(path).unwrap();
        let mut writer = zip::ZipWriter::new(file);
        let options = zip::write::SimpleFileOptions::default();
        for (name, contents) in files {
            writer.start_file(*name, options).unwrap();
            writer.write_all(contents.as_bytes()).unwrap();
        }
        writer.finish().unwrap();
    }

    #[test]
    fn test_extract_tar_gz_returns_root() {
        let dir = TempDir::new().unwrap();
        let archive = dir.path().join("mathsat-5.6.8-linux-x86_64.tar.gz");
        write_tar_gz(
            &archive,
            &[
                ("mathsat-5.6.8-linux-x86_64/python/mathsat.py", "import _mathsat\n"),
                ("mathsat-5.6.8-linux-x86_64/include/mathsat.h", "/* api */\n"),
            ],
        );

        let root = ArchiveExtractor::extract(&archive, dir.path()).unwrap();

        assert_eq!(root, dir.path().join("mathsat-5.6.8-linux-x86_64"));
        assert_eq!(
            std::fs::read_to_string(root.join("python/mathsat.py")).unwrap(),
            "import _mathsat\n"
        );
        assert!(root.join("include/mathsat.h").is_file());
    }

    #[test]
    fn test_extract_zip_returns_root() {
        let dir = TempDir::new().unwrap();
        let archive = dir.path().join("mathsat-5.6.8-win64-msvc.zip");
        write_zip(
            &archive,
            &[
                ("mathsat-5.6.8-win64-msvc/python/setup.py", "setup()\n"),
                ("mathsat-5.6.8-win64-msvc/lib/mathsat.dll", "MZ"),
            ],
        );

        let dest = dir.path().join("out");
        let root = ArchiveExtractor::extract(&archive, &dest).unwrap();

        assert_eq!(root, dest.join("mathsat-5.6.8-win64-msvc"));
        assert!(root.join("python/setup.py").is_file());
        assert!(root.join("lib/mathsat.dll").is_file());
    }

    #[test]
    fn test_archive_without_single_root() {
        let dir = TempDir::new().unwrap();
        let archive = dir.path().join("flat.zip");
        write_zip(&archive, &[("a.txt", "a"), ("b/c.txt", "c")]);

        let dest = dir.path().join("out");
        let root = ArchiveExtractor::extract(&archive, &dest).unwrap();

        assert_eq!(root, dest);
        assert!(dest.join("a.txt").is_file());
        assert!(dest.join("b/c.txt").is_file());
    }

    #[test]
    fn test_unsupported_extension() {
        let dir = TempDir::new().unwrap();
        let archive = dir.path().join("mathsat.rar");
        std::fs::write(&archive, b"Rar!").unwrap();

        let err = ArchiveExtractor::extract(&archive, dir.path()).unwrap_err();
        assert!(matches!(err, SolverError::UnsupportedArchive { .. }));
    }

    #[test]
    fn test_corrupt_archives() {
        let dir = TempDir::new().unwrap();

        let zip_path = dir.path().join("broken.zip");
        std::fs::write(&zip_path, b"definitely not a zip").unwrap();
        let err = ArchiveExtractor::extract(&zip_path, &dir.path().join("z")).unwrap_err();
        assert!(matches!(err, SolverError::CorruptArchive { .. }));

        let tgz_path = dir.path().join("broken.tar.gz");
        std::fs::write(&tgz_path, b"definitely not gzip").unwrap();
        let err = ArchiveExtractor::extract(&tgz_path, &dir.path().join("t")).unwrap_err();
        assert!(matches!(err, SolverError::CorruptArchive { .. }));
    }

    #[test]
    fn test_top_level_classification() {
        assert_eq!(
            TopLevel::of(Path::new("root/file.txt"), false),
            Some(TopLevel::Dir("root".to_string()))
        );
        assert_eq!(
            TopLevel::of(Path::new("./root/"), true),
            Some(TopLevel::Dir("root".to_string()))
        );
        assert_eq!(
            TopLevel::of(Path::new("file.txt"), false),
            Some(TopLevel::File("file.txt".to_string()))
        );
        assert_eq!(TopLevel::of(Path::new("./"), true), None);
    }
}
