//! Download progress for the terminal.

use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Create a download progress bar, hidden when progress is disabled
pub fn download_bar(enabled: bool) -> ProgressBar {
    if !enabled {
        return ProgressBar::hidden();
    }

    let pb = ProgressBar::new(0);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {bytes}/{total_bytes} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-"),
    );
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

/// Adapt a progress bar to the fetcher's `(url, downloaded, total)` callback.
///
/// A new URL restarts the bar.
pub fn track(bar: ProgressBar) -> impl Fn(&str, u64, Option<u64>) + 'static {
    move |url, downloaded, total| {
        let name = file_label(url);
        if bar.message() != name {
            bar.reset();
            bar.set_message(name);
        }
        if let Some(total) = total {
            bar.set_length(total);
        }
        bar.set_position(downloaded);
    }
}

/// Last path segment of a URL, without the query string
fn file_label(url: &str) -> String {
    let path = url.split(['?', '#']).next().unwrap_or(url);
    let last = path.rsplit('/').find(|s| !s.is_empty()).unwrap_or(path);
    // download.php?file=<name> style links carry the name in the query
    match url.split_once("file=") {
        Some((_, name)) if last.ends_with(".php") => name.split('&').next().unwrap_or(name).to_string(),
        _ => last.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_label() {
        assert_eq!(
            file_label("http://mathsat.fbk.eu/download.php?file=mathsat-5.6.8-linux-x86_64.tar.gz"),
            "mathsat-5.6.8-linux-x86_64.tar.gz"
        );
        assert_eq!(
            file_label("https://github.com/x/y/blob/master/mpir_64/mpir.dll?raw=true"),
            "mpir.dll"
        );
        assert_eq!(file_label("https://mirror.example.org/pkg.zip"), "pkg.zip");
    }

    #[test]
    fn test_hidden_bar_tracks_position() {
        let bar = download_bar(false);
        let report = track(bar.clone());

        report("https://example.org/a.tar.gz", 10, Some(100));
        assert_eq!(bar.position(), 10);
        assert_eq!(bar.length(), Some(100));

        report("https://example.org/b.tar.gz", 5, None);
        assert_eq!(bar.position(), 5);
    }
}
