//! Deb package management through `apt-get`.

use thiserror::Error;
use tracing::{debug, error};

use crate::exec::{CommandRunner, CommandSpec, ExecError};

/// Errors that can occur while managing packages.
#[derive(Debug, Error)]
pub enum PackageError {
  /// Refreshing the package index failed.
  #[error("failed to update package cache: {0}")]
  IndexRefresh(#[source] ExecError),

  /// The package is unknown to the package cache.
  #[error("package '{package}' not found in package cache")]
  NotFound { package: String },

  /// The package is known but could not be installed.
  #[error("failed to install package '{package}': {source}")]
  Install {
    package: String,
    #[source]
    source: ExecError,
  },
}

/// Thin wrapper around the system package manager.
pub struct Apt<'a> {
  runner: &'a dyn CommandRunner,
}

impl<'a> Apt<'a> {
  pub fn new(runner: &'a dyn CommandRunner) -> Self {
    Self { runner }
  }

  /// Refresh the package index.
  pub fn update(&self) -> Result<(), PackageError> {
    self
      .runner
      .run(&apt_get().arg("update"))
      .map_err(PackageError::IndexRefresh)?;
    debug!("apt index refreshed");
    Ok(())
  }

  /// Install `package` unless it is already installed.
  pub fn add_package(&self, package: &str) -> Result<(), PackageError> {
    if self.is_installed(package) {
      debug!(package, "package already installed");
      return Ok(());
    }

    match self.runner.run(&CommandSpec::new("apt-cache").args(["show", package])) {
      Ok(_) => {}
      Err(ExecError::Failed { .. }) => {
        error!(package, "package not found in package cache");
        return Err(PackageError::NotFound {
          package: package.to_string(),
        });
      }
      Err(source) => {
        return Err(PackageError::Install {
          package: package.to_string(),
          source,
        });
      }
    }

    self
      .runner
      .run(&apt_get().args(["install", "-y", package]))
      .map_err(|source| {
        error!(package, error = %source, "package install failed");
        PackageError::Install {
          package: package.to_string(),
          source,
        }
      })?;

    debug!(package, "package installed");
    Ok(())
  }

  fn is_installed(&self, package: &str) -> bool {
    self
      .runner
      .run(&CommandSpec::new("dpkg-query").args(["-W", "-f=${Status}", package]))
      .map(|out| out.output.contains("install ok installed"))
      .unwrap_or(false)
  }
}

fn apt_get() -> CommandSpec {
  CommandSpec::new("apt-get")
    .env("DEBIAN_FRONTEND", "noninteractive")
    .arg("-q")
}
