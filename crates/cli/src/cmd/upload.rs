use std::path::Path;
use std::time::Instant;

use anyhow::{Context, Result, bail};

use langpacks_lib::langpacks::LangpackService;

use super::{load_settings, service};
use crate::output::{format_duration, print_stat, print_success};

pub fn cmd_upload(config: Option<&Path>) -> Result<()> {
  let start = Instant::now();
  let settings = load_settings(config)?;
  let service = service(&settings)?;

  if !service.check_gpg_key() {
    bail!("Can't upload langpacks without a signing key");
  }

  service.upload_langpacks().context("Failed to upload langpacks")?;

  print_success("Langpacks uploaded");
  print_stat("Duration", &format_duration(start.elapsed()));
  Ok(())
}
