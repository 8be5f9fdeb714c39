//! Blocking HTTP transport for archive and dependency downloads.
//!
//! This module wraps `reqwest::blocking` with the settings a provisioning
//! tool needs:
//! - Custom User-Agent
//! - Request and connect timeouts
//! - Proxy and custom CA certificate support
//! - Progress reporting while streaming a body
//!
//! Requests are never retried here. The only fallback in the pipeline is the
//! single mirror attempt made by [`crate::downloader::Fetcher`].
//!
//! # Examples
//!
//! ```no_run
//! use solverpack::http::{HttpClient, HttpClientConfig, Transport};
//! use std::time::Duration;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = HttpClientConfig::new()
//!     .with_timeout(Duration::from_secs(120))
//!     .with_proxy("http://proxy.example.com:8080".to_string());
//!
//! let client = HttpClient::with_config(config)?;
//! let mut body = Vec::new();
//! client.get("https://example.com/archive.tar.gz", &mut body, &mut |_, _| {})?;
//! # Ok(())
//! # }
//! ```

use std::io::{Read, Write};
use std::path::PathBuf;
use std::time::Duration;

use reqwest::blocking::Client;
use thiserror::Error;

const DEFAULT_USER_AGENT: &str = concat!("solverpack/", env!("CARGO_PKG_VERSION"));
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(300);
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const CHUNK_SIZE: usize = 64 * 1024;

#[derive(Debug, Error)]
pub enum HttpError {
    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("HTTP {status}: {url}")]
    HttpStatus { status: u16, url: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Something that can stream the body of a GET request into a writer.
///
/// The pipeline only talks to the network through this trait, which keeps
/// the fetch logic testable without sockets.
pub trait Transport {
    /// Write the body of `url` into `out`, reporting `(downloaded, total)`
    /// as bytes arrive. Returns the number of bytes written.
    fn get(
        &self,
        url: &str,
        out: &mut dyn Write,
        progress: &mut dyn FnMut(u64, Option<u64>),
    ) -> Result<u64, HttpError>;
}

pub struct HttpClient {
    client: Client,
    user_agent: String,
}

impl HttpClient {
    pub fn new() -> Result<Self, reqwest::Error> {
        Self::with_config(HttpClientConfig::default())
    }

    pub fn with_config(config: HttpClientConfig) -> Result<Self, reqwest::Error> {
        let mut builder = Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .user_agent(&config.user_agent);

        if config.no_proxy {
            builder = builder.no_proxy();
        } else if let Some(proxy_url) = &config.proxy {
            let proxy = reqwest::Proxy::all(proxy_url)?;
            builder = builder.proxy(proxy);
        }

        // Add custom CA certificate if configured
        if let Some(cafile) = &config.cafile {
            match std::fs::read(cafile) {
                Ok(cert_bytes) => match reqwest::Certificate::from_pem(&cert_bytes) {
                    Ok(cert) => builder = builder.add_root_certificate(cert),
                    Err(e) => log::warn!("Ignoring CA file {}: {}", cafile.display(), e),
                },
                Err(e) => log::warn!("Ignoring CA file {}: {}", cafile.display(), e),
            }
        }

        let client = builder.build()?;

        Ok(Self {
            client,
            user_agent: config.user_agent,
        })
    }

    /// Get the configured user agent
    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }
}

impl Transport for HttpClient {
    fn get(
        &self,
        url: &str,
        out: &mut dyn Write,
        progress: &mut dyn FnMut(u64, Option<u64>),
    ) -> Result<u64, HttpError> {
        log::debug!("GET {}", url);
        let mut response = self.client.get(url).send()?;

        let status = response.status();
        if !status.is_success() {
            return Err(HttpError::HttpStatus {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let total = response.content_length();
        let mut downloaded: u64 = 0;
        let mut buf = vec![0u8; CHUNK_SIZE];
        progress(0, total);

        loop {
            let n = response.read(&mut buf)?;
            if n == 0 {
                break;
            }
            out.write_all(&buf[..n])?;
            downloaded += n as u64;
            progress(downloaded, total);
        }

        out.flush()?;
        log::debug!("Received {} bytes from {}", downloaded, url);

        Ok(downloaded)
    }
}

#[derive(Debug, Clone)]
pub struct HttpClientConfig {
    pub timeout: Duration,
    pub connect_timeout: Duration,
    pub proxy: Option<String>,
    /// Ignore both `proxy` and the `*_PROXY` environment variables.
    pub no_proxy: bool,
    pub cafile: Option<PathBuf>,
    pub user_agent: String,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            proxy: None,
            no_proxy: false,
            cafile: None,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl HttpClientConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_connect_timeout(mut self, connect_timeout: Duration) -> Self {
        self.connect_timeout = connect_timeout;
        self
    }

    pub fn with_proxy(mut self, proxy: String) -> Self {
        self.proxy = Some(proxy);
        self
    }

    pub fn without_proxy(mut self) -> Self {
        self.no_proxy = true;
        self
    }

    pub fn with_cafile(mut self, cafile: PathBuf) -> Self {
        self.cafile = Some(cafile);
        self
    }

    pub fn with_user_agent(mut self, user_agent: String) -> Self {
        self.user_agent = user_agent;
        self
    }
}
