//! Translation tarball download.
//!
//! Tarballs are streamed straight to disk; nothing is cached or verified
//! beyond the HTTP status, since Launchpad regenerates them continuously.

use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use thiserror::Error;
use tracing::{debug, info};

/// Errors that can occur while downloading a file.
#[derive(Debug, Error)]
pub enum FetchError {
  /// The HTTP client could not be constructed.
  #[error("failed to build http client: {0}")]
  Client(#[source] reqwest::Error),

  /// The request failed before or while transferring the body.
  #[error("request to {url} failed: {source}")]
  Request {
    url: String,
    #[source]
    source: reqwest::Error,
  },

  /// The server answered with a non-success status.
  #[error("request to {url} returned HTTP {status}")]
  Status { url: String, status: u16 },

  /// The destination file could not be written.
  #[error("failed to write '{path}': {source}")]
  Io {
    path: PathBuf,
    #[source]
    source: io::Error,
  },
}

/// Downloads a URL to a local file.
pub trait Fetcher {
  /// Download `url` into `dest`, replacing any existing file.
  ///
  /// Returns the number of bytes written.
  fn fetch(&self, url: &str, dest: &Path) -> Result<u64, FetchError>;
}

/// Blocking HTTP downloader with a bounded overall timeout.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
  client: reqwest::blocking::Client,
}

impl HttpFetcher {
  pub fn new(timeout: Duration) -> Result<Self, FetchError> {
    let client = reqwest::blocking::Client::builder()
      .timeout(timeout)
      .user_agent(concat!("langpacks-agent/", env!("CARGO_PKG_VERSION")))
      .build()
      .map_err(FetchError::Client)?;
    Ok(Self { client })
  }
}

impl Fetcher for HttpFetcher {
  fn fetch(&self, url: &str, dest: &Path) -> Result<u64, FetchError> {
    info!(url = %url, dest = %dest.display(), "downloading");

    let mut response = self.client.get(url).send().map_err(|source| FetchError::Request {
      url: url.to_string(),
      source,
    })?;

    let status = response.status();
    if !status.is_success() {
      return Err(FetchError::Status {
        url: url.to_string(),
        status: status.as_u16(),
      });
    }

    let mut file = File::create(dest).map_err(|source| FetchError::Io {
      path: dest.to_path_buf(),
      source,
    })?;

    let size = response.copy_to(&mut file).map_err(|source| FetchError::Request {
      url: url.to_string(),
      source,
    })?;

    debug!(path = %dest.display(), size, "download complete");
    Ok(size)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use tempfile::TempDir;

  fn fetcher() -> HttpFetcher {
    HttpFetcher::new(Duration::from_secs(10)).unwrap()
  }

  #[test]
  fn fetch_writes_body_to_disk() {
    let mut server = mockito::Server::new();
    let mock = server
      .mock("GET", "/ubuntu/questing/+latest-full-language-pack")
      .with_status(200)
      .with_body("tarball-bytes")
      .create();

    let temp = TempDir::new().unwrap();
    let dest = temp.path().join("ubuntu-questing-translations.tar.gz");
    let url = format!("{}/ubuntu/questing/+latest-full-language-pack", server.url());

    let size = fetcher().fetch(&url, &dest).unwrap();

    mock.assert();
    assert_eq!(size, 13);
    assert_eq!(std::fs::read_to_string(&dest).unwrap(), "tarball-bytes");
  }

  #[test]
  fn fetch_replaces_existing_file() {
    let mut server = mockito::Server::new();
    server.mock("GET", "/pack").with_status(200).with_body("new").create();

    let temp = TempDir::new().unwrap();
    let dest = temp.path().join("pack.tar.gz");
    std::fs::write(&dest, "old and longer").unwrap();

    fetcher().fetch(&format!("{}/pack", server.url()), &dest).unwrap();

    assert_eq!(std::fs::read_to_string(&dest).unwrap(), "new");
  }

  #[test]
  fn fetch_non_success_status_is_error() {
    let mut server = mockito::Server::new();
    server.mock("GET", "/missing").with_status(404).create();

    let temp = TempDir::new().unwrap();
    let dest = temp.path().join("missing.tar.gz");

    let err = fetcher().fetch(&format!("{}/missing", server.url()), &dest).unwrap_err();

    assert!(matches!(err, FetchError::Status { status: 404, .. }));
    assert!(!dest.exists());
  }

  #[test]
  fn fetch_unreachable_host_is_request_error() {
    let temp = TempDir::new().unwrap();
    let dest = temp.path().join("x");

    let err = fetcher().fetch("http://127.0.0.1:1/pack", &dest).unwrap_err();

    assert!(matches!(err, FetchError::Request { .. }));
  }
}
