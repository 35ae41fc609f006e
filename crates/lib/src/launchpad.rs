//! Ubuntu series lookup.
//!
//! Builds are only run for series Launchpad still considers active. The
//! lookup sits behind [`SeriesSource`] so the release check can be driven by
//! a fixed list in tests and by the Launchpad web service in production.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

/// Status strings Launchpad uses for the series under development.
const DEVELOPMENT_STATUSES: &[&str] = &["Active Development", "Pre-release Freeze"];

/// Errors that can occur while querying Launchpad.
#[derive(Debug, Error)]
pub enum LaunchpadError {
  #[error("failed to build http client: {0}")]
  Client(#[source] reqwest::Error),

  #[error("request to {url} failed: {source}")]
  Request {
    url: String,
    #[source]
    source: reqwest::Error,
  },

  #[error("request to {url} returned HTTP {status}")]
  Status { url: String, status: u16 },

  #[error("unexpected response from {url}: {source}")]
  Decode {
    url: String,
    #[source]
    source: reqwest::Error,
  },
}

/// Active series together with the one under development.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SeriesInfo {
  pub active: Vec<String>,
  pub development: Option<String>,
}

/// Source of the Ubuntu series names builds may target.
pub trait SeriesSource {
  /// Names of the currently active series.
  fn active_series(&self) -> Result<Vec<String>, LaunchpadError>;

  /// Name of the series currently under development, if known.
  fn development_series(&self) -> Result<Option<String>, LaunchpadError> {
    Ok(None)
  }

  /// Both lookups at once. Sources backed by a remote collection should
  /// answer from a single pass over it.
  fn series_info(&self) -> Result<SeriesInfo, LaunchpadError> {
    Ok(SeriesInfo {
      active: self.active_series()?,
      development: self.development_series()?,
    })
  }
}

#[derive(Debug, Deserialize)]
struct SeriesCollection {
  #[serde(default)]
  entries: Vec<SeriesEntry>,
  next_collection_link: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct SeriesEntry {
  name: String,
  #[serde(default)]
  active: bool,
  #[serde(default)]
  status: String,
}

/// Anonymous client for the Launchpad web service.
#[derive(Debug, Clone)]
pub struct LaunchpadClient {
  client: reqwest::blocking::Client,
  api_url: String,
}

impl LaunchpadClient {
  /// Create a client for the web service rooted at `api_url`
  /// (e.g. `https://api.launchpad.net/devel`).
  pub fn new(api_url: &str, timeout: Duration) -> Result<Self, LaunchpadError> {
    let client = reqwest::blocking::Client::builder()
      .timeout(timeout)
      .user_agent(concat!("langpacks-agent/", env!("CARGO_PKG_VERSION")))
      .build()
      .map_err(LaunchpadError::Client)?;
    Ok(Self {
      client,
      api_url: api_url.trim_end_matches('/').to_string(),
    })
  }

  /// All Ubuntu series, following the collection's pagination links.
  fn series(&self) -> Result<Vec<SeriesEntry>, LaunchpadError> {
    let mut entries = Vec::new();
    let mut next = Some(format!("{}/ubuntu/series", self.api_url));

    while let Some(url) = next {
      debug!(url = %url, "querying launchpad");
      let response = self
        .client
        .get(&url)
        .header(reqwest::header::ACCEPT, "application/json")
        .send()
        .map_err(|source| LaunchpadError::Request {
          url: url.clone(),
          source,
        })?;

      let status = response.status();
      if !status.is_success() {
        return Err(LaunchpadError::Status {
          url,
          status: status.as_u16(),
        });
      }

      let page: SeriesCollection = response.json().map_err(|source| LaunchpadError::Decode {
        url: url.clone(),
        source,
      })?;
      entries.extend(page.entries);
      next = page.next_collection_link;
    }

    Ok(entries)
  }
}

fn development_of(entries: &[SeriesEntry]) -> Option<String> {
  entries
    .iter()
    .find(|s| DEVELOPMENT_STATUSES.contains(&s.status.as_str()))
    .map(|s| s.name.clone())
}

fn active_of(entries: &[SeriesEntry]) -> Vec<String> {
  entries.iter().filter(|s| s.active).map(|s| s.name.clone()).collect()
}

impl SeriesSource for LaunchpadClient {
  fn active_series(&self) -> Result<Vec<String>, LaunchpadError> {
    let active = active_of(&self.series()?);
    debug!(series = ?active, "active series");
    Ok(active)
  }

  fn development_series(&self) -> Result<Option<String>, LaunchpadError> {
    Ok(development_of(&self.series()?))
  }

  fn series_info(&self) -> Result<SeriesInfo, LaunchpadError> {
    let entries = self.series()?;
    let info = SeriesInfo {
      active: active_of(&entries),
      development: development_of(&entries),
    };
    debug!(series = ?info.active, development = ?info.development, "ubuntu series");
    Ok(info)
  }
}

/// Fixed series list, for tests and offline use.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaticSeries {
  active: Vec<String>,
  development: Option<String>,
}

impl StaticSeries {
  pub fn new<I, S>(active: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    Self {
      active: active.into_iter().map(Into::into).collect(),
      development: None,
    }
  }

  pub fn with_development(mut self, name: impl Into<String>) -> Self {
    self.development = Some(name.into());
    self
  }
}

impl Default for StaticSeries {
  fn default() -> Self {
    Self::new(["noble", "plucky", "questing"])
  }
}

impl SeriesSource for StaticSeries {
  fn active_series(&self) -> Result<Vec<String>, LaunchpadError> {
    Ok(self.active.clone())
  }

  fn development_series(&self) -> Result<Option<String>, LaunchpadError> {
    Ok(self.development.clone())
  }
}
