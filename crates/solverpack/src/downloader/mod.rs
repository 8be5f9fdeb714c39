//! Archive downloading and extraction.
//!
//! This module fetches solver archives and auxiliary files over HTTP with
//! an optional mirror fallback, and unpacks the two supported archive
//! formats.

mod extract;
mod fetch;

pub use extract::ArchiveExtractor;
pub use fetch::Fetcher;
