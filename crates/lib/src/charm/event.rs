//! Lifecycle events and actions the agent reacts to.

use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EventError {
  #[error("invalid dispatch path '{0}'")]
  InvalidPath(String),

  #[error("unknown action '{0}'")]
  UnknownAction(String),

  #[error("invalid parameters for action '{action}': {source}")]
  Params {
    action: String,
    #[source]
    source: serde_json::Error,
  },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
  Start,
  Install,
  UpgradeCharm,
  ConfigChanged,
  Stop,
  BuildLangpacks { release: String, base: bool },
  UploadLangpacks,
}

/// What the platform asked the agent to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch<'a> {
  Hook(&'a str),
  Action(&'a str),
}

impl<'a> Dispatch<'a> {
  /// Parse a dispatch path such as `hooks/install` or `actions/build-langpacks`.
  pub fn parse(path: &'a str) -> Result<Self, EventError> {
    match path.trim_matches('/').split_once('/') {
      Some(("hooks", name)) if !name.is_empty() => Ok(Dispatch::Hook(name)),
      Some(("actions", name)) if !name.is_empty() => Ok(Dispatch::Action(name)),
      _ => Err(EventError::InvalidPath(path.to_string())),
    }
  }
}

#[derive(Debug, Deserialize)]
struct BuildParams {
  release: String,
  #[serde(default)]
  base: bool,
}

impl Event {
  /// The event for a lifecycle hook, `None` for hooks the agent ignores.
  pub fn from_hook(name: &str) -> Option<Self> {
    match name {
      "start" => Some(Event::Start),
      "install" => Some(Event::Install),
      "upgrade-charm" => Some(Event::UpgradeCharm),
      "config-changed" => Some(Event::ConfigChanged),
      "stop" => Some(Event::Stop),
      _ => None,
    }
  }

  pub fn from_action(name: &str, params: Value) -> Result<Self, EventError> {
    match name {
      "build-langpacks" => {
        let params: BuildParams = serde_json::from_value(params).map_err(|source| EventError::Params {
          action: name.to_string(),
          source,
        })?;
        Ok(Event::BuildLangpacks {
          release: params.release,
          base: params.base,
        })
      }
      "upload-langpacks" => Ok(Event::UploadLangpacks),
      _ => Err(EventError::UnknownAction(name.to_string())),
    }
  }
}
