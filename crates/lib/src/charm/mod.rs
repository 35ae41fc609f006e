//! Lifecycle orchestration.
//!
//! Maps platform events to service calls and reports the outcome through the
//! unit status. Service failures are turned into operator-facing status
//! messages here; only platform failures (and a failing crontab setup)
//! fail the hook itself.

mod event;
mod status;
mod unit;

use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::consts::{GPG_SECRET_CONFIG, GPG_SECRET_FIELD};
use crate::langpacks::{LangpackService, LangpacksError};

pub use event::{Dispatch, Event, EventError};
pub use status::{UnitStatus, messages};
pub use unit::{HookTools, SecretError, Unit, UnitError};

#[derive(Debug, Error)]
pub enum CharmError {
  #[error(transparent)]
  Unit(#[from] UnitError),

  #[error(transparent)]
  Event(#[from] EventError),

  #[error(transparent)]
  Service(#[from] LangpacksError),
}

pub struct LangpacksCharm<S, U> {
  service: S,
  unit: U,
}

impl<S: LangpackService, U: Unit> LangpacksCharm<S, U> {
  pub fn new(service: S, unit: U) -> Self {
    Self { service, unit }
  }

  /// Handle whatever the platform dispatch path names.
  pub fn dispatch(&self, path: &str) -> Result<(), CharmError> {
    match Dispatch::parse(path)? {
      Dispatch::Hook(name) => self.hook(name),
      Dispatch::Action(name) => {
        let params = self.unit.action_params()?;
        self.handle(&Event::from_action(name, params)?)
      }
    }
  }

  /// Handle a lifecycle hook by name, ignoring hooks without a handler.
  pub fn hook(&self, name: &str) -> Result<(), CharmError> {
    match Event::from_hook(name) {
      Some(event) => self.handle(&event),
      None => {
        info!(hook = name, "no handler for hook, ignoring");
        Ok(())
      }
    }
  }

  pub fn handle(&self, event: &Event) -> Result<(), CharmError> {
    debug!(?event, "handling event");
    match event {
      Event::Start => self.on_start(),
      Event::Install | Event::UpgradeCharm => self.on_install(),
      Event::ConfigChanged => self.on_config_changed(),
      Event::Stop => self.on_stop(),
      Event::BuildLangpacks { release, base } => self.on_build_langpacks(release, *base),
      Event::UploadLangpacks => self.on_upload_langpacks(),
    }
  }

  fn status(&self, status: UnitStatus) -> Result<(), CharmError> {
    self.unit.set_status(&status)?;
    Ok(())
  }

  fn on_start(&self) -> Result<(), CharmError> {
    self.status(UnitStatus::maintenance(messages::UPDATING_CHECKOUT))?;

    if let Err(e) = self.service.update_checkout() {
      error!(error = %e, "failed to update the checkout");
      return self.status(UnitStatus::blocked(messages::START_FAILED));
    }

    self.status(UnitStatus::active(""))
  }

  fn on_install(&self) -> Result<(), CharmError> {
    self.status(UnitStatus::maintenance(messages::INSTALLING))?;

    if let Err(e) = self.service.install() {
      error!(error = %e, "failed to set up the environment");
      return self.status(UnitStatus::blocked(messages::SETUP_FAILED));
    }

    self.status(UnitStatus::maintenance(messages::SETTING_UP_CRONTAB))?;
    self.service.setup_crontab()?;

    self.status(UnitStatus::active(""))
  }

  fn on_config_changed(&self) -> Result<(), CharmError> {
    self.status(UnitStatus::maintenance(messages::IMPORTING_KEY))?;

    let Some(secret_id) = self.unit.config(GPG_SECRET_CONFIG)? else {
      warn!("no '{}' config, can't set up signing key", GPG_SECRET_CONFIG);
      return self.status(UnitStatus::active(messages::SIGNING_DISABLED));
    };

    let key = match self.unit.secret_content(&secret_id) {
      Ok(mut content) => content.remove(GPG_SECRET_FIELD),
      Err(e) => {
        warn!(secret = %secret_id, error = %e, "signing key secret not available");
        None
      }
    };
    let Some(key) = key else {
      return self.status(UnitStatus::active(messages::SECRET_UNAVAILABLE));
    };

    if let Err(e) = self.service.import_gpg_key(&key) {
      error!(error = %e, "failed to import the signing key");
      return self.status(UnitStatus::active(messages::KEY_IMPORT_FAILED));
    }

    debug!("signing key imported");
    self.status(UnitStatus::active(""))
  }

  fn on_build_langpacks(&self, release: &str, base: bool) -> Result<(), CharmError> {
    self.unit.action_log(messages::BUILD_STARTED_LOG)?;
    self.status(UnitStatus::maintenance(messages::BUILDING))?;

    match self.service.build_langpacks(base, release) {
      Ok(()) => self.status(UnitStatus::active("")),
      Err(
        e @ (LangpacksError::Io { .. }
        | LangpacksError::Download(_)
        | LangpacksError::Command(_)
        | LangpacksError::Series(_)),
      ) => {
        error!(release, base, error = %e, "langpacks build failed");
        self.unit.action_log(messages::BUILD_FAILED_LOG)?;
        self.status(UnitStatus::active(messages::BUILD_FAILED))
      }
      Err(e) => Err(e.into()),
    }
  }

  fn on_upload_langpacks(&self) -> Result<(), CharmError> {
    self.status(UnitStatus::maintenance(messages::UPLOADING))?;

    if !self.service.check_gpg_key() {
      warn!("can't upload langpacks without a signing key");
      self.unit.action_log(messages::UPLOAD_NO_KEY_LOG)?;
      return self.status(UnitStatus::active(messages::UPLOAD_DISABLED));
    }

    self.unit.action_log(messages::UPLOAD_STARTED_LOG)?;
    if let Err(e) = self.service.upload_langpacks() {
      error!(error = %e, "langpacks upload failed");
      self.unit.action_log(messages::UPLOAD_FAILED_LOG)?;
      return self.status(UnitStatus::active(messages::UPLOAD_FAILED));
    }

    self.status(UnitStatus::active(""))
  }

  fn on_stop(&self) -> Result<(), CharmError> {
    self.status(UnitStatus::maintenance(messages::REMOVING_CRONTAB))?;

    if let Err(e) = self.service.disable_crontab() {
      error!(error = %e, "failed to disable the crontab");
    }
    Ok(())
  }
}
