//! The langpacks service.
//!
//! Each step is a short, straight-line sequence of external commands or HTTP
//! calls. Failures are logged with context and returned unchanged; deciding
//! what a failure means for the unit is left to the caller.

mod error;
mod plan;

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, error, info, warn};

use crate::apt::Apt;
use crate::config::{Paths, Settings};
use crate::consts::{CACHE_DIRS, DEVEL_SERIES, PACKAGES, REPOSITORY_BRANCH, REPOSITORY_URL, TRANSLATIONS_URL, UPLOAD_LOG};
use crate::exec::{AsUser, CommandRunner, CommandSpec, SystemRunner};
use crate::fetch::{Fetcher, HttpFetcher};
use crate::git;
use crate::launchpad::{LaunchpadClient, SeriesInfo, SeriesSource};

pub use error::LangpacksError;
pub use plan::{BuildKind, BuildPlan};

/// Crontab installed for the build user, with `@AGENT@` standing for the
/// installed agent binary.
pub const CRONTAB_TEMPLATE: &str = include_str!("crontab");

/// Crontab whose jobs invoke the agent installed at `agent`.
pub fn crontab(agent: &Path) -> String {
  CRONTAB_TEMPLATE.replace("@AGENT@", &agent.display().to_string())
}

/// The automation steps the orchestrator drives.
pub trait LangpackService {
  /// Install build dependencies, clone the build tooling and create the
  /// build and log directories.
  ///
  /// Also installs the running agent binary where the crontab expects it.
  fn install(&self) -> Result<(), LangpacksError>;

  /// Pull the build tooling and rebuild its helper binaries.
  fn update_checkout(&self) -> Result<(), LangpacksError>;

  /// Build the language packs of `release`.
  ///
  /// Returns `Ok` without doing anything when the release is not an active
  /// series.
  fn build_langpacks(&self, base: bool, release: &str) -> Result<(), LangpacksError>;

  /// Upload all built packages.
  fn upload_langpacks(&self) -> Result<(), LangpacksError>;

  fn setup_crontab(&self) -> Result<(), LangpacksError>;

  fn disable_crontab(&self) -> Result<(), LangpacksError>;

  /// Import signing key material into the build user's keyring.
  fn import_gpg_key(&self, key: &str) -> Result<(), LangpacksError>;

  /// Whether the build user's keyring holds a secret key.
  ///
  /// Failure to list keys counts as no key.
  fn check_gpg_key(&self) -> bool;
}

impl<T: LangpackService + ?Sized> LangpackService for &T {
  fn install(&self) -> Result<(), LangpacksError> {
    (**self).install()
  }

  fn update_checkout(&self) -> Result<(), LangpacksError> {
    (**self).update_checkout()
  }

  fn build_langpacks(&self, base: bool, release: &str) -> Result<(), LangpacksError> {
    (**self).build_langpacks(base, release)
  }

  fn upload_langpacks(&self) -> Result<(), LangpacksError> {
    (**self).upload_langpacks()
  }

  fn setup_crontab(&self) -> Result<(), LangpacksError> {
    (**self).setup_crontab()
  }

  fn disable_crontab(&self) -> Result<(), LangpacksError> {
    (**self).disable_crontab()
  }

  fn import_gpg_key(&self, key: &str) -> Result<(), LangpacksError> {
    (**self).import_gpg_key(key)
  }

  fn check_gpg_key(&self) -> bool {
    (**self).check_gpg_key()
  }
}

/// Upstream locations the service pulls from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sources {
  pub repository_url: String,
  pub branch: String,
  pub translations_url: String,
}

impl Default for Sources {
  fn default() -> Self {
    Self {
      repository_url: REPOSITORY_URL.to_string(),
      branch: REPOSITORY_BRANCH.to_string(),
      translations_url: TRANSLATIONS_URL.to_string(),
    }
  }
}

impl From<&Settings> for Sources {
  fn from(settings: &Settings) -> Self {
    Self {
      repository_url: settings.repository_url.clone(),
      branch: settings.branch.clone(),
      translations_url: settings.translations_url.clone(),
    }
  }
}

/// The langpacks service acting on the local system.
pub struct Langpacks {
  paths: Paths,
  sources: Sources,
  user: Option<String>,
  runner: Box<dyn CommandRunner>,
  series: Box<dyn SeriesSource>,
  fetcher: Box<dyn Fetcher>,
  /// Binary copied to `paths.agent` on install.
  agent_source: Option<PathBuf>,
}

impl Langpacks {
  pub fn new(
    paths: Paths,
    runner: impl CommandRunner + 'static,
    series: impl SeriesSource + 'static,
    fetcher: impl Fetcher + 'static,
  ) -> Self {
    debug!(?paths, "langpacks service init");
    Self {
      paths,
      sources: Sources::default(),
      user: None,
      runner: Box::new(runner),
      series: Box::new(series),
      fetcher: Box::new(fetcher),
      agent_source: None,
    }
  }

  /// Service backed by the real system, Launchpad and HTTP.
  pub fn from_settings(settings: &Settings) -> Result<Self, LangpacksError> {
    let timeout = settings.download_timeout();
    let series = LaunchpadClient::new(&settings.launchpad_api_url, timeout)?;
    let fetcher = HttpFetcher::new(timeout)?;
    let agent = env::current_exe().map_err(LangpacksError::io("failed to locate agent binary", "/proc/self/exe"))?;
    Ok(
      Self::new(settings.paths(), SystemRunner, series, fetcher)
        .with_user(settings.user.clone())
        .with_sources(Sources::from(settings))
        .with_agent_source(agent),
    )
  }

  /// Run the build tooling as `user` (through `sudo`) instead of the agent.
  pub fn with_user(mut self, user: Option<String>) -> Self {
    self.user = user;
    self
  }

  pub fn with_sources(mut self, sources: Sources) -> Self {
    self.sources = sources;
    self
  }

  /// Copy `binary` into place as the agent on install.
  pub fn with_agent_source(mut self, binary: impl Into<PathBuf>) -> Self {
    self.agent_source = Some(binary.into());
    self
  }

  pub fn paths(&self) -> &Paths {
    &self.paths
  }

  fn as_user(&self) -> AsUser<'_> {
    AsUser::new(self.runner.as_ref(), self.user.as_deref())
  }

  fn script(&self, name: &str) -> String {
    self.paths.checkout.join(name).display().to_string()
  }

  fn crontab_command(&self) -> CommandSpec {
    let spec = CommandSpec::new("crontab");
    match &self.user {
      Some(user) => spec.args(["-u", user.as_str()]),
      None => spec,
    }
  }

  /// Give `path` to the build user, if there is one.
  fn hand_over(&self, path: &Path) -> Result<(), LangpacksError> {
    if let Some(user) = &self.user {
      self
        .runner
        .run(&CommandSpec::new("chown").arg(format!("{}:", user)).arg(path))?;
    }
    Ok(())
  }

  fn ensure_dir(&self, path: &Path) -> Result<(), LangpacksError> {
    if path.is_dir() {
      return Ok(());
    }
    fs::create_dir_all(path).map_err(LangpacksError::io("failed to create directory", path))?;
    debug!(path = %path.display(), "directory created");
    self.hand_over(path)
  }

  /// Remove the build caches of a release so a base build starts clean.
  ///
  /// Removal failures are logged; the build goes ahead regardless.
  fn clean_build_cache(&self, release_dir: &Path) {
    if !release_dir.exists() {
      return;
    }
    for name in CACHE_DIRS {
      let cache_dir = release_dir.join(name);
      if !cache_dir.exists() {
        continue;
      }
      match fs::remove_dir_all(&cache_dir) {
        Ok(()) => debug!(path = %cache_dir.display(), "removed cache directory"),
        Err(e) => error!(path = %cache_dir.display(), error = %e, "failed to remove cache directory"),
      }
    }
  }

  /// Place the agent binary at `paths.agent`, staged next to it and renamed
  /// into place.
  fn install_agent(&self) -> Result<(), LangpacksError> {
    let Some(source) = &self.agent_source else {
      return Ok(());
    };
    let dest = &self.paths.agent;
    if source == dest {
      debug!(path = %dest.display(), "agent already running from its install location");
      return Ok(());
    }
    if let Some(parent) = dest.parent() {
      fs::create_dir_all(parent).map_err(LangpacksError::io("failed to create directory", parent))?;
    }
    let staged = dest.with_extension("new");
    fs::copy(source, &staged).map_err(LangpacksError::io("failed to copy agent binary", &staged))?;
    fs::rename(&staged, dest).map_err(LangpacksError::io("failed to install agent binary", dest))?;
    info!(path = %dest.display(), "agent installed");
    Ok(())
  }
}

/// Normalize a requested release, resolving the `devel` sentinel.
fn resolve_release(release: &str, series: &SeriesInfo) -> Option<String> {
  let release = release.to_lowercase();
  if release != DEVEL_SERIES {
    return Some(release);
  }
  if series.development.is_none() {
    warn!("no development series found");
  }
  series.development.clone()
}

impl LangpackService for Langpacks {
  fn install(&self) -> Result<(), LangpacksError> {
    let apt = Apt::new(self.runner.as_ref());
    apt.update().inspect_err(|e| error!(error = %e, "failed to update package cache"))?;
    for package in PACKAGES {
      apt.add_package(package)?;
    }

    let checkout = &self.paths.checkout;
    if checkout.join(".git").exists() {
      info!(path = %checkout.display(), "checkout already present, skipping clone");
    } else {
      git::clone(
        &self.as_user(),
        &self.sources.repository_url,
        &self.sources.branch,
        checkout,
      )?;
      debug!("langpack-o-matic cloned");
    }

    self.ensure_dir(&self.paths.build_root)?;
    self.ensure_dir(&self.paths.log_root)?;
    self.install_agent()
  }

  fn update_checkout(&self) -> Result<(), LangpacksError> {
    git::pull(&self.as_user(), &self.paths.checkout)?;
    debug!("langpack-o-matic checkout updated");

    let make = CommandSpec::new("make").arg("-C").arg(self.paths.checkout.join("bin"));
    self.as_user().run(&make).inspect_err(|e| {
      error!(error = %e, output = e.output().unwrap_or_default(), "build of langpack-o-matic helpers failed")
    })?;
    debug!("langpack-o-matic helpers built");
    Ok(())
  }

  fn build_langpacks(&self, base: bool, release: &str) -> Result<(), LangpacksError> {
    let series = self.series.series_info()?;
    let Some(release) = resolve_release(release, &series) else {
      return Ok(());
    };

    if !series.active.contains(&release) {
      info!(release = %release, "release isn't an active ubuntu series, nothing to build");
      return Ok(());
    }

    let release_dir = self.paths.release_dir(&release);
    let plan = BuildPlan::new(
      BuildKind::from_base_flag(base),
      &release,
      &self.sources.translations_url,
      &release_dir,
    );
    info!(release = %release, kind = %plan.kind, "building langpacks");

    if plan.kind == BuildKind::Base {
      self.clean_build_cache(&release_dir);
    }
    self.ensure_dir(&release_dir)?;

    self
      .fetcher
      .fetch(&plan.url, &plan.tarball)
      .inspect_err(|e| error!(url = %plan.url, error = %e, "downloading translations failed"))?;
    self.hand_over(&plan.tarball)?;
    debug!(tarball = %plan.tarball.display(), "translations tarball downloaded");

    let import = CommandSpec::new(self.script("import"))
      .args(&plan.import_options)
      .arg(&plan.tarball)
      .arg(&release)
      .arg(&release_dir)
      .append_output_to(self.paths.release_log(&release));
    self
      .as_user()
      .run(&import)
      .inspect_err(|e| error!(release = %release, error = %e, "building the langpacks source failed"))?;

    info!(release = %release, "translation packages prepared");
    Ok(())
  }

  fn upload_langpacks(&self) -> Result<(), LangpacksError> {
    let upload = CommandSpec::new(self.script("packages"))
      .arg("upload")
      .current_dir(&self.paths.build_root)
      .append_output_to(self.paths.log_root.join(UPLOAD_LOG));
    self
      .as_user()
      .run(&upload)
      .inspect_err(|e| error!(error = %e, "uploading the langpacks failed"))?;
    info!("language packs uploaded");
    Ok(())
  }

  fn setup_crontab(&self) -> Result<(), LangpacksError> {
    let spec = self.crontab_command().arg("-").stdin(crontab(&self.paths.agent));
    self
      .runner
      .run(&spec)
      .inspect_err(|e| error!(error = %e, output = e.output().unwrap_or_default(), "installation of the crontab failed"))?;
    debug!("crontab configured");
    Ok(())
  }

  fn disable_crontab(&self) -> Result<(), LangpacksError> {
    let spec = self.crontab_command().arg("-r");
    self
      .runner
      .run(&spec)
      .inspect_err(|e| debug!(error = %e, "disabling of crontab failed"))?;
    debug!("crontab removed");
    Ok(())
  }

  fn import_gpg_key(&self, key: &str) -> Result<(), LangpacksError> {
    let spec = CommandSpec::new("gpg").args(["--batch", "--import"]).stdin(key);
    let out = self
      .as_user()
      .run(&spec)
      .inspect_err(|e| error!(error = %e, output = e.output().unwrap_or_default(), "importing key failed"))?;
    debug!(output = %out.output.trim(), "gpg key imported");
    Ok(())
  }

  fn check_gpg_key(&self) -> bool {
    let spec = CommandSpec::new("gpg").args(["--batch", "--list-secret-keys", "--with-colons"]);
    match self.as_user().run(&spec) {
      Ok(out) => has_secret_key(&out.output),
      Err(e) => {
        warn!(error = %e, "listing secret keys failed");
        false
      }
    }
  }
}

/// Whether a `gpg --with-colons` listing contains a secret key record.
pub fn has_secret_key(listing: &str) -> bool {
  listing.lines().any(|line| line.starts_with("sec:"))
}
