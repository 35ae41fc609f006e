//! Build-tool checkout management through the `git` client.

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, info};

use crate::exec::{CommandRunner, CommandSpec, ExecError};

/// Errors that can occur while managing a checkout.
#[derive(Debug, Error)]
pub enum GitError {
  /// Failed to clone a repository.
  #[error("failed to clone repository '{url}': {source}")]
  Clone {
    url: String,
    #[source]
    source: ExecError,
  },

  /// Failed to pull updates into an existing checkout.
  #[error("failed to pull '{}': {source}", path.display())]
  Pull {
    path: PathBuf,
    #[source]
    source: ExecError,
  },
}

/// Clone `branch` of `url` into `dest`.
pub fn clone(runner: &dyn CommandRunner, url: &str, branch: &str, dest: &Path) -> Result<(), GitError> {
  info!(url, branch, path = %dest.display(), "cloning repository");

  let spec = CommandSpec::new("git")
    .args(["clone", "-b", branch, url])
    .arg(dest);

  runner.run(&spec).map_err(|source| {
    debug!(output = source.output().unwrap_or_default(), "git clone failed");
    GitError::Clone {
      url: url.to_string(),
      source,
    }
  })?;

  Ok(())
}

/// Pull the current branch of the checkout at `path`.
pub fn pull(runner: &dyn CommandRunner, path: &Path) -> Result<(), GitError> {
  debug!(path = %path.display(), "pulling updates");

  let spec = CommandSpec::new("git").arg("-C").arg(path).arg("pull");

  runner.run(&spec).map_err(|source| {
    debug!(output = source.output().unwrap_or_default(), "git pull failed");
    GitError::Pull {
      path: path.to_path_buf(),
      source,
    }
  })?;

  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::testutil::FakeRunner;

  #[test]
  fn clone_command_line() {
    let runner = FakeRunner::new();
    clone(
      &runner,
      "https://git.launchpad.net/langpack-o-matic",
      "master",
      Path::new("/home/ubuntu/langpack-o-matic"),
    )
    .unwrap();

    assert_eq!(
      runner.command_lines(),
      vec!["git clone -b master https://git.launchpad.net/langpack-o-matic /home/ubuntu/langpack-o-matic"]
    );
  }

  #[test]
  fn clone_failure_is_clone_error() {
    let runner = FakeRunner::failing_on("clone");
    let err = clone(&runner, "https://example.invalid/repo", "main", Path::new("/tmp/x")).unwrap_err();
    assert!(matches!(err, GitError::Clone { ref url, .. } if url == "https://example.invalid/repo"));
  }

  #[test]
  fn pull_runs_in_checkout() {
    let runner = FakeRunner::new();
    pull(&runner, Path::new("/srv/checkout")).unwrap();
    assert_eq!(runner.command_lines(), vec!["git -C /srv/checkout pull"]);
  }

  #[test]
  fn pull_failure_is_pull_error() {
    let runner = FakeRunner::failing_on("pull");
    let err = pull(&runner, Path::new("/srv/checkout")).unwrap_err();
    assert!(matches!(err, GitError::Pull { .. }));
  }
}
