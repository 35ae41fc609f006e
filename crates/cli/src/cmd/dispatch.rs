//! Platform entry points: `dispatch` and `hook`.
//!
//! Both run the charm handlers with the real service and the platform's hook
//! tools, so they only work inside a hook or action context.

use std::env;
use std::path::Path;

use anyhow::{Context, Result};

use langpacks_lib::charm::{HookTools, LangpacksCharm};
use langpacks_lib::exec::SystemRunner;
use langpacks_lib::langpacks::Langpacks;

use super::{load_settings, service};

const DISPATCH_PATH_ENV: &str = "JUJU_DISPATCH_PATH";

fn charm(config: Option<&Path>) -> Result<LangpacksCharm<Langpacks, HookTools<SystemRunner>>> {
  let settings = load_settings(config)?;
  Ok(LangpacksCharm::new(service(&settings)?, HookTools::new(SystemRunner)))
}

pub fn cmd_dispatch(config: Option<&Path>, path: Option<String>) -> Result<()> {
  let path = match path {
    Some(path) => path,
    None => env::var(DISPATCH_PATH_ENV).with_context(|| format!("{} is not set", DISPATCH_PATH_ENV))?,
  };

  charm(config)?
    .dispatch(&path)
    .with_context(|| format!("Failed to handle '{}'", path))
}

pub fn cmd_hook(config: Option<&Path>, name: &str) -> Result<()> {
  charm(config)?
    .hook(name)
    .with_context(|| format!("Failed to handle hook '{}'", name))
}
