use std::fmt;

/// Status messages shown to operators.
pub mod messages {
  pub const UPDATING_CHECKOUT: &str = "Updating langpack-o-matic checkout";
  pub const INSTALLING: &str = "Installing langpack dependencies";
  pub const SETTING_UP_CRONTAB: &str = "Setting up crontab";
  pub const IMPORTING_KEY: &str = "Importing signing key";
  pub const BUILDING: &str = "Building langpacks";
  pub const UPLOADING: &str = "Uploading langpacks";
  pub const REMOVING_CRONTAB: &str = "Removing crontab";

  pub const START_FAILED: &str = "Failed to start services. Check `juju debug-log` for details.";
  pub const SETUP_FAILED: &str = "Failed to set up the environment. Check `juju debug-log` for details.";
  pub const SIGNING_DISABLED: &str = "Signing disabled. Set the 'gpg-secret-id' to enable.";
  pub const SECRET_UNAVAILABLE: &str = "Secret not available. Check that access was granted.";
  pub const KEY_IMPORT_FAILED: &str = "Failed to import the signing key. Check `juju debug-log` for details.";
  pub const BUILD_FAILED: &str = "Failed to build langpacks. Check `juju debug-log` for details.";
  pub const UPLOAD_DISABLED: &str = "Upload disabled. Set and grant 'gpg-secret-id' to enable.";
  pub const UPLOAD_FAILED: &str = "Failed to upload langpacks. Check `juju debug-log` for details.";

  pub const BUILD_STARTED_LOG: &str = "Building langpacks, it may take a while";
  pub const BUILD_FAILED_LOG: &str = "Langpacks build failed";
  pub const UPLOAD_STARTED_LOG: &str = "Uploading langpacks, it may take a while";
  pub const UPLOAD_NO_KEY_LOG: &str = "Can't upload langpacks without a signing key";
  pub const UPLOAD_FAILED_LOG: &str = "Langpacks upload failed";
}

/// Workload status of the unit as reported to the platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnitStatus {
  Maintenance(String),
  Active(String),
  Blocked(String),
}

impl UnitStatus {
  pub fn maintenance(message: impl Into<String>) -> Self {
    UnitStatus::Maintenance(message.into())
  }

  pub fn active(message: impl Into<String>) -> Self {
    UnitStatus::Active(message.into())
  }

  pub fn blocked(message: impl Into<String>) -> Self {
    UnitStatus::Blocked(message.into())
  }

  /// Status name as understood by `status-set`.
  pub fn name(&self) -> &'static str {
    match self {
      UnitStatus::Maintenance(_) => "maintenance",
      UnitStatus::Active(_) => "active",
      UnitStatus::Blocked(_) => "blocked",
    }
  }

  pub fn message(&self) -> &str {
    match self {
      UnitStatus::Maintenance(m) | UnitStatus::Active(m) | UnitStatus::Blocked(m) => m,
    }
  }
}

impl fmt::Display for UnitStatus {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    if self.message().is_empty() {
      write!(f, "{}", self.name())
    } else {
      write!(f, "{}: {}", self.name(), self.message())
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn display_includes_message_when_present() {
    assert_eq!(UnitStatus::active("").to_string(), "active");
    assert_eq!(
      UnitStatus::maintenance(messages::BUILDING).to_string(),
      "maintenance: Building langpacks"
    );
  }
}
