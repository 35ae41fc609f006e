use std::path::Path;
use std::time::Instant;

use anyhow::{Context, Result};

use langpacks_lib::langpacks::LangpackService;

use super::{load_settings, service};
use crate::output::{format_duration, print_stat, print_success};

/// Pull the build tooling and rebuild its helpers.
pub fn cmd_update(config: Option<&Path>) -> Result<()> {
  let start = Instant::now();
  let settings = load_settings(config)?;

  service(&settings)?
    .update_checkout()
    .context("Failed to update the langpack-o-matic checkout")?;

  print_success("Checkout updated");
  print_stat("Checkout", &settings.paths().checkout.display().to_string());
  print_stat("Duration", &format_duration(start.elapsed()));
  Ok(())
}
