use std::path::Path;

use anyhow::{Context, Result};
use owo_colors::{OwoColorize, Stream};

use langpacks_lib::launchpad::{LaunchpadClient, SeriesSource};

use super::load_settings;
use crate::output::{OutputFormat, print_json, print_warning, symbols};

pub fn cmd_series(config: Option<&Path>, output: OutputFormat) -> Result<()> {
  let settings = load_settings(config)?;
  let client = LaunchpadClient::new(&settings.launchpad_api_url, settings.download_timeout())
    .context("Failed to create Launchpad client")?;

  let series = client.series_info().context("Failed to query ubuntu series")?;

  if output.is_json() {
    return print_json(&series);
  }

  for name in &series.active {
    let development = series.development.as_deref() == Some(name.as_str());
    println!("{}", series_line(name, development));
  }
  if series.development.is_none() {
    print_warning("No development series found");
  }
  Ok(())
}

fn series_line(name: &str, development: bool) -> String {
  if development {
    format!(
      "  {} {} {}",
      symbols::INFO,
      name.if_supports_color(Stream::Stdout, |s| s.cyan()),
      "(development)".if_supports_color(Stream::Stdout, |s| s.dimmed())
    )
  } else {
    format!("  {} {}", symbols::INFO, name)
  }
}
