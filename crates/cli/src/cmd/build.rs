use std::path::Path;
use std::time::Instant;

use anyhow::{Context, Result};

use langpacks_lib::langpacks::{BuildKind, LangpackService};

use super::{load_settings, service};
use crate::output::{format_duration, print_info, print_stat, print_success};

/// Run a single build outside the platform, as the crontab does.
///
/// A release that is not an active series finishes successfully without
/// building anything; the log explains why.
pub fn cmd_build(config: Option<&Path>, release: &str, base: bool) -> Result<()> {
  let start = Instant::now();
  let settings = load_settings(config)?;
  let service = service(&settings)?;

  print_info(&format!("Building {} langpacks for {}", BuildKind::from_base_flag(base), release));

  service
    .build_langpacks(base, release)
    .with_context(|| format!("Failed to build langpacks for '{}'", release))?;

  print_success("Langpacks build finished");
  print_stat("Logs", &service.paths().log_root.display().to_string());
  print_stat("Duration", &format_duration(start.elapsed()));
  Ok(())
}
