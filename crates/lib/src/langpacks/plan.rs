//! Build plan computation.
//!
//! A build is fully described by the release and whether it is a base or a
//! delta build; everything else (download URL, tarball name, import options)
//! is derived here without touching the system.

use std::fmt;
use std::path::{Path, PathBuf};

use crate::consts::IMPORT_THRESHOLD;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildKind {
  /// Full language pack build from a clean cache.
  Base,
  /// Incremental build on top of the cached base.
  Delta,
}

impl BuildKind {
  pub fn from_base_flag(base: bool) -> Self {
    if base { BuildKind::Base } else { BuildKind::Delta }
  }

  pub fn as_str(&self) -> &'static str {
    match self {
      BuildKind::Base => "base",
      BuildKind::Delta => "delta",
    }
  }

  fn url_suffix(&self) -> &'static str {
    match self {
      BuildKind::Base => "+latest-full-language-pack",
      BuildKind::Delta => "+latest-delta-language-pack",
    }
  }
}

impl fmt::Display for BuildKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.as_str())
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildPlan {
  pub release: String,
  pub kind: BuildKind,
  pub url: String,
  /// Where the downloaded tarball is stored.
  pub tarball: PathBuf,
  /// Options passed to the import script ahead of the positional arguments.
  pub import_options: Vec<String>,
}

impl BuildPlan {
  /// Compute the plan for `release`, downloading from `translations_url`
  /// into `release_dir`.
  pub fn new(kind: BuildKind, release: &str, translations_url: &str, release_dir: &Path) -> Self {
    let url = format!(
      "{}/{}/{}",
      translations_url.trim_end_matches('/'),
      release,
      kind.url_suffix()
    );

    let tarball_name = match kind {
      BuildKind::Base => format!("ubuntu-{}-translations.tar.gz", release),
      BuildKind::Delta => format!("ubuntu-{}-translations-update.tar.gz", release),
    };

    let threshold = format!("--treshold={}", IMPORT_THRESHOLD);
    let import_options = match kind {
      BuildKind::Base => vec!["-v".to_string(), threshold],
      BuildKind::Delta => vec!["-v".to_string(), "--update".to_string(), threshold],
    };

    Self {
      release: release.to_string(),
      kind,
      url,
      tarball: release_dir.join(tarball_name),
      import_options,
    }
  }
}
