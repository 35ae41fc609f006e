//! Agent settings.
//!
//! Settings are layered: built-in defaults, then an optional TOML file, then
//! `LANGPACKS_*` environment variables (`LANGPACKS_HOME`, `LANGPACKS_USER`,
//! `LANGPACKS_DOWNLOAD_TIMEOUT_SECS`, ...). Every field has a default matching
//! a stock deployment, so an empty file (or no file at all) yields a working
//! configuration.

use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

use figment::{
  Figment,
  providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::consts::{
  AGENT_PATH, CHECKOUT_DIRNAME, DEFAULT_HOME, DEFAULT_USER, DOWNLOAD_TIMEOUT_SECS, LAUNCHPAD_API_URL,
  LOGS_DIRNAME, REPOSITORY_BRANCH, REPOSITORY_URL, TRANSLATIONS_URL,
};

/// Prefix of the environment variables that override settings.
const ENV_PREFIX: &str = "LANGPACKS_";

/// Settings file consulted when no path is given explicitly.
pub const SYSTEM_CONFIG_PATH: &str = "/etc/langpacks-agent/config.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
  #[error("config file not found: {0}")]
  FileNotFound(PathBuf),

  /// The file could not be read or a layer holds a value of the wrong type.
  #[error("invalid settings: {0}")]
  Invalid(#[source] Box<figment::Error>),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
  /// Home directory of the build user; other paths default relative to it.
  pub home: PathBuf,
  /// User the build tooling runs as. `None` runs everything as the agent.
  pub user: Option<String>,
  pub checkout_dir: Option<PathBuf>,
  pub build_root: Option<PathBuf>,
  pub log_root: Option<PathBuf>,
  /// Installed agent binary, invoked by the crontab.
  pub agent_path: PathBuf,
  pub repository_url: String,
  pub branch: String,
  pub translations_url: String,
  pub launchpad_api_url: String,
  pub download_timeout_secs: u64,
}

impl Default for Settings {
  fn default() -> Self {
    Self {
      home: PathBuf::from(DEFAULT_HOME),
      user: Some(DEFAULT_USER.to_string()),
      checkout_dir: None,
      build_root: None,
      log_root: None,
      agent_path: PathBuf::from(AGENT_PATH),
      repository_url: REPOSITORY_URL.to_string(),
      branch: REPOSITORY_BRANCH.to_string(),
      translations_url: TRANSLATIONS_URL.to_string(),
      launchpad_api_url: LAUNCHPAD_API_URL.to_string(),
      download_timeout_secs: DOWNLOAD_TIMEOUT_SECS,
    }
  }
}

/// Resolved filesystem locations the service works in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Paths {
  /// Checkout of the build tooling.
  pub checkout: PathBuf,
  /// Parent of the per-release build directories.
  pub build_root: PathBuf,
  /// Directory holding the per-release and upload logs.
  pub log_root: PathBuf,
  /// Installed agent binary.
  pub agent: PathBuf,
}

impl Paths {
  /// Conventional layout under a single root directory.
  pub fn under(root: &Path) -> Self {
    Self {
      checkout: root.join(CHECKOUT_DIRNAME),
      build_root: root.to_path_buf(),
      log_root: root.join(LOGS_DIRNAME),
      agent: root.join("bin").join("langpacks-agent"),
    }
  }

  pub fn release_dir(&self, release: &str) -> PathBuf {
    self.build_root.join(release)
  }

  pub fn release_log(&self, release: &str) -> PathBuf {
    self.log_root.join(format!("{}.log", release))
  }
}

impl Settings {
  /// Load settings.
  ///
  /// The file is `path` if given, then `$LANGPACKS_CONFIG`, then
  /// [`SYSTEM_CONFIG_PATH`] if present. A named file must exist. Environment
  /// overrides are merged last.
  pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
    let file = path
      .map(Path::to_path_buf)
      .or_else(|| env::var_os("LANGPACKS_CONFIG").map(PathBuf::from))
      .or_else(|| {
        let system = Path::new(SYSTEM_CONFIG_PATH);
        system.exists().then(|| system.to_path_buf())
      });

    let mut figment = Figment::new().merge(Serialized::defaults(Settings::default()));
    if let Some(file) = &file {
      figment = figment.merge(Self::file_provider(file)?);
    }
    let figment = figment.merge(Env::prefixed(ENV_PREFIX).ignore(&["config"]));

    Self::extract(figment)
  }

  /// Settings from `path` over the defaults, without environment overrides.
  pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
    let figment = Figment::new()
      .merge(Serialized::defaults(Settings::default()))
      .merge(Self::file_provider(path)?);
    Self::extract(figment)
  }

  fn file_provider(path: &Path) -> Result<figment::providers::Data<Toml>, ConfigError> {
    if !path.exists() {
      return Err(ConfigError::FileNotFound(path.to_path_buf()));
    }
    debug!(path = %path.display(), "loading settings file");
    Ok(Toml::file(path))
  }

  fn extract(figment: Figment) -> Result<Self, ConfigError> {
    let mut settings: Settings = figment.extract().map_err(|e| ConfigError::Invalid(Box::new(e)))?;
    // An empty user (`LANGPACKS_USER=""`) means run as the agent.
    if settings.user.as_deref().is_some_and(str::is_empty) {
      settings.user = None;
    }
    Ok(settings)
  }

  pub fn paths(&self) -> Paths {
    let defaults = Paths::under(&self.home);
    Paths {
      checkout: self.checkout_dir.clone().unwrap_or(defaults.checkout),
      build_root: self.build_root.clone().unwrap_or(defaults.build_root),
      log_root: self.log_root.clone().unwrap_or(defaults.log_root),
      agent: self.agent_path.clone(),
    }
  }

  pub fn download_timeout(&self) -> Duration {
    Duration::from_secs(self.download_timeout_secs)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serial_test::serial;
  use std::io::Write;
  use tempfile::NamedTempFile;

  #[test]
  fn defaults_follow_build_user_home() {
    let paths = Settings::default().paths();
    assert_eq!(paths.checkout, PathBuf::from("/home/ubuntu/langpack-o-matic"));
    assert_eq!(paths.build_root, PathBuf::from("/home/ubuntu"));
    assert_eq!(paths.log_root, PathBuf::from("/home/ubuntu/logs"));
    assert_eq!(paths.release_dir("questing"), PathBuf::from("/home/ubuntu/questing"));
    assert_eq!(paths.release_log("questing"), PathBuf::from("/home/ubuntu/logs/questing.log"));
    assert_eq!(paths.agent, PathBuf::from("/usr/local/bin/langpacks-agent"));
  }

  #[test]
  fn from_file_merges_with_defaults() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(
      file,
      r#"
home = "/srv/langpacks"
log_root = "/var/log/langpacks"
download_timeout_secs = 60
"#
    )
    .unwrap();

    let settings = Settings::from_file(file.path()).unwrap();
    let paths = settings.paths();

    assert_eq!(paths.checkout, PathBuf::from("/srv/langpacks/langpack-o-matic"));
    assert_eq!(paths.log_root, PathBuf::from("/var/log/langpacks"));
    assert_eq!(settings.download_timeout(), Duration::from_secs(60));
    assert_eq!(settings.branch, "master");
    assert_eq!(settings.user.as_deref(), Some("ubuntu"));
  }

  #[test]
  fn from_file_rejects_bad_toml() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "download_timeout_secs = \"soon\"").unwrap();

    let err = Settings::from_file(file.path()).unwrap_err();
    assert!(matches!(err, ConfigError::Invalid(_)));
    assert!(err.to_string().contains("download_timeout_secs"));
  }

  #[test]
  #[serial]
  fn load_missing_explicit_file_fails() {
    let err = Settings::load(Some(Path::new("/nonexistent/langpacks.toml"))).unwrap_err();
    assert!(matches!(err, ConfigError::FileNotFound(_)));
  }

  #[test]
  #[serial]
  fn env_overrides_apply_last() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "home = \"/from/file\"").unwrap();

    temp_env::with_vars(
      [
        ("LANGPACKS_CONFIG", Some(file.path().to_str().unwrap())),
        ("LANGPACKS_HOME", Some("/from/env")),
        ("LANGPACKS_USER", Some("")),
      ],
      || {
        let settings = Settings::load(None).unwrap();
        assert_eq!(settings.home, PathBuf::from("/from/env"));
        assert_eq!(settings.user, None);
      },
    );
  }

  #[test]
  #[serial]
  fn env_overrides_any_field() {
    temp_env::with_vars(
      [
        ("LANGPACKS_CONFIG", None::<&str>),
        ("LANGPACKS_HOME", None),
        ("LANGPACKS_USER", None),
        ("LANGPACKS_DOWNLOAD_TIMEOUT_SECS", Some("45")),
        ("LANGPACKS_AGENT_PATH", Some("/opt/langpacks/agent")),
      ],
      || {
        let settings = Settings::load(None).unwrap();
        assert_eq!(settings.download_timeout(), Duration::from_secs(45));
        assert_eq!(settings.paths().agent, PathBuf::from("/opt/langpacks/agent"));
        assert_eq!(settings.user.as_deref(), Some("ubuntu"));
      },
    );
  }

  #[test]
  #[serial]
  fn env_value_of_wrong_type_is_invalid() {
    temp_env::with_vars(
      [
        ("LANGPACKS_CONFIG", None::<&str>),
        ("LANGPACKS_DOWNLOAD_TIMEOUT_SECS", Some("soon")),
      ],
      || {
        let err = Settings::load(None).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
      },
    );
  }

  #[test]
  #[serial]
  fn env_user_override() {
    temp_env::with_vars(
      [
        ("LANGPACKS_CONFIG", None::<&str>),
        ("LANGPACKS_HOME", None),
        ("LANGPACKS_USER", Some("builder")),
      ],
      || {
        let settings = Settings::load(None).unwrap();
        assert_eq!(settings.user.as_deref(), Some("builder"));
      },
    );
  }
}
