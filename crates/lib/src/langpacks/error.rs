use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::apt::PackageError;
use crate::exec::ExecError;
use crate::fetch::FetchError;
use crate::git::GitError;
use crate::launchpad::LaunchpadError;

/// Errors surfaced by the langpacks service steps.
///
/// Each variant keeps the underlying failure intact; callers decide per
/// category how to report it.
#[derive(Debug, Error)]
pub enum LangpacksError {
  #[error(transparent)]
  Package(#[from] PackageError),

  #[error(transparent)]
  Git(#[from] GitError),

  #[error(transparent)]
  Command(#[from] ExecError),

  #[error(transparent)]
  Download(#[from] FetchError),

  #[error("failed to query ubuntu series: {0}")]
  Series(#[from] LaunchpadError),

  #[error("{action} '{}': {source}", path.display())]
  Io {
    action: &'static str,
    path: PathBuf,
    #[source]
    source: io::Error,
  },
}

impl LangpacksError {
  pub(crate) fn io(action: &'static str, path: impl Into<PathBuf>) -> impl FnOnce(io::Error) -> Self {
    let path = path.into();
    move |source| LangpacksError::Io { action, path, source }
  }
}
