//! Archive fetching with presence check and single mirror fallback.

use std::fs;
use std::io::{BufWriter, Write};
use std::path::Path;

use tempfile::NamedTempFile;

use crate::error::FailedAttempt;
use crate::http::{HttpClient, HttpClientConfig, HttpError, Transport};
use crate::{Result, SolverError};

type ProgressFn = Box<dyn Fn(&str, u64, Option<u64>)>;

/// Downloads files to deterministic paths.
///
/// A file that already exists at the destination is never downloaded
/// again, and a failed download never leaves anything at the destination.
pub struct Fetcher {
    transport: Box<dyn Transport>,
    progress: Option<ProgressFn>,
}

impl Fetcher {
    /// Create a fetcher over any transport
    pub fn new(transport: impl Transport + 'static) -> Self {
        Self {
            transport: Box::new(transport),
            progress: None,
        }
    }

    /// Create a fetcher backed by a real HTTP client
    pub fn http(config: HttpClientConfig) -> std::result::Result<Self, reqwest::Error> {
        Ok(Self::new(HttpClient::with_config(config)?))
    }

    /// Report `(url, downloaded, total)` while downloading
    pub fn with_progress<F>(mut self, progress: F) -> Self
    where
        F: Fn(&str, u64, Option<u64>) + 'static,
    {
        self.progress = Some(Box::new(progress));
        self
    }

    /// Download `url` to `dest` unless `dest` already exists.
    pub fn fetch(&self, url: &str, dest: &Path) -> Result<()> {
        self.fetch_with_fallback(url, None, dest)
    }

    /// Download `dest` from `native_url`, falling back to `mirror_url` once.
    pub fn fetch_with_fallback(
        &self,
        native_url: &str,
        mirror_url: Option<&str>,
        dest: &Path,
    ) -> Result<()> {
        if dest.exists() {
            log::info!("Using cached {}", dest.display());
            return Ok(());
        }

        let mut attempts = Vec::new();
        let links = std::iter::once(native_url).chain(mirror_url);

        for url in links {
            if !attempts.is_empty() {
                log::warn!("Retrying download from mirror {}", url);
            } else {
                log::info!("Downloading {}", url);
            }

            match self.download(url, dest) {
                Ok(bytes) => {
                    log::debug!("Saved {} bytes to {}", bytes, dest.display());
                    return Ok(());
                }
                Err(error) => {
                    log::warn!("Download of {} failed: {}", url, error);
                    attempts.push(FailedAttempt {
                        url: url.to_string(),
                        error,
                    });
                }
            }
        }

        Err(SolverError::DownloadFailed {
            archive: dest
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| dest.display().to_string()),
            attempts,
        })
    }

    /// Stream one URL into a temporary file next to `dest`, then rename it
    /// into place. The temporary file is removed on drop if anything fails.
    fn download(&self, url: &str, dest: &Path) -> std::result::Result<u64, HttpError> {
        let parent = match dest.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        fs::create_dir_all(parent)?;

        let temp = NamedTempFile::new_in(parent)?;
        let mut report = |downloaded: u64, total: Option<u64>| {
            if let Some(ref progress) = self.progress {
                progress(url, downloaded, total);
            }
        };
        let mut writer = BufWriter::new(temp.as_file());
        let bytes = self.transport.get(url, &mut writer, &mut report)?;
        writer.flush()?;
        drop(writer);

        temp.persist(dest).map_err(|e| HttpError::Io(e.error))?;
        Ok(bytes)
    }
}
