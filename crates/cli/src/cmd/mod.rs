mod build;
mod dispatch;
mod series;
mod update;
mod upload;

use std::path::Path;

use anyhow::{Context, Result};
use tracing::debug;

use langpacks_lib::config::Settings;
use langpacks_lib::langpacks::Langpacks;

pub use build::cmd_build;
pub use dispatch::{cmd_dispatch, cmd_hook};
pub use series::cmd_series;
pub use update::cmd_update;
pub use upload::cmd_upload;

fn load_settings(config: Option<&Path>) -> Result<Settings> {
  let settings = Settings::load(config).context("Failed to load settings")?;
  debug!(?settings, "settings loaded");
  Ok(settings)
}

fn service(settings: &Settings) -> Result<Langpacks> {
  Langpacks::from_settings(settings).context("Failed to initialize the langpacks service")
}
