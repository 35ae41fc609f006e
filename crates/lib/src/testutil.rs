//! Test doubles shared by the unit tests.
//!
//! The fakes record every call they receive and keep the record behind an
//! `Rc`, so a test can hand a clone to the code under test and inspect the
//! calls afterwards.

use std::cell::RefCell;
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use crate::exec::{CommandOutput, CommandRunner, CommandSpec, ExecError};
use crate::fetch::{FetchError, Fetcher};

type Handler = dyn Fn(&CommandSpec) -> Result<CommandOutput, ExecError>;

/// Command runner that records invocations and answers through a handler.
#[derive(Clone)]
pub struct FakeRunner {
  calls: Rc<RefCell<Vec<CommandSpec>>>,
  handler: Rc<Handler>,
}

impl FakeRunner {
  /// Runner where every command succeeds with empty output.
  pub fn new() -> Self {
    Self::with_handler(|_| Ok(CommandOutput::default()))
  }

  pub fn with_handler(handler: impl Fn(&CommandSpec) -> Result<CommandOutput, ExecError> + 'static) -> Self {
    Self {
      calls: Rc::new(RefCell::new(Vec::new())),
      handler: Rc::new(handler),
    }
  }

  /// Runner where every command whose command line contains `needle` fails.
  pub fn failing_on(needle: &'static str) -> Self {
    Self::with_handler(move |spec| {
      if spec.to_string().contains(needle) {
        Err(failure(spec, 1, "simulated failure"))
      } else {
        Ok(CommandOutput::default())
      }
    })
  }

  pub fn calls(&self) -> Vec<CommandSpec> {
    self.calls.borrow().clone()
  }

  pub fn command_lines(&self) -> Vec<String> {
    self.calls.borrow().iter().map(|c| c.to_string()).collect()
  }
}

impl CommandRunner for FakeRunner {
  fn run(&self, spec: &CommandSpec) -> Result<CommandOutput, ExecError> {
    self.calls.borrow_mut().push(spec.clone());
    (self.handler)(spec)
  }
}

/// Build the error a command exiting with `code` would produce.
pub fn failure(spec: &CommandSpec, code: i32, output: &str) -> ExecError {
  ExecError::Failed {
    cmd: spec.to_string(),
    code: Some(code),
    output: output.to_string(),
  }
}

/// Fetcher that writes a placeholder file instead of downloading.
#[derive(Clone, Default)]
pub struct FakeFetcher {
  calls: Rc<RefCell<Vec<(String, PathBuf)>>>,
  /// Sorted entry names of the destination directory, taken as each fetch starts.
  listings: Rc<RefCell<Vec<Vec<String>>>>,
  fail_status: Option<u16>,
}

impl FakeFetcher {
  pub fn new() -> Self {
    Self::default()
  }

  /// Fetcher whose downloads all fail with the given HTTP status.
  pub fn failing(status: u16) -> Self {
    Self {
      fail_status: Some(status),
      ..Self::default()
    }
  }

  pub fn calls(&self) -> Vec<(String, PathBuf)> {
    self.calls.borrow().clone()
  }

  /// What the destination directory held when each download began.
  pub fn listings(&self) -> Vec<Vec<String>> {
    self.listings.borrow().clone()
  }
}

fn list_dir(dir: Option<&Path>) -> Vec<String> {
  let mut names: Vec<String> = dir
    .and_then(|dir| fs::read_dir(dir).ok())
    .into_iter()
    .flatten()
    .filter_map(Result::ok)
    .map(|entry| entry.file_name().to_string_lossy().into_owned())
    .collect();
  names.sort();
  names
}

impl Fetcher for FakeFetcher {
  fn fetch(&self, url: &str, dest: &Path) -> Result<u64, FetchError> {
    self.calls.borrow_mut().push((url.to_string(), dest.to_path_buf()));
    self.listings.borrow_mut().push(list_dir(dest.parent()));
    if let Some(status) = self.fail_status {
      return Err(FetchError::Status {
        url: url.to_string(),
        status,
      });
    }
    let body = b"translations";
    fs::write(dest, body).map_err(|source| FetchError::Io {
      path: dest.to_path_buf(),
      source,
    })?;
    Ok(body.len() as u64)
  }
}
