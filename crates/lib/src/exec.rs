//! External command execution.
//!
//! Every step of the pipeline is an external program (`apt-get`, `git`,
//! `make`, `gpg`, `crontab`, the checkout's scripts). They all go through the
//! [`CommandRunner`] trait so the steps can be exercised against a recording
//! runner instead of the real system.

use std::collections::BTreeMap;
use std::fmt;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use thiserror::Error;
use tracing::{debug, info};

/// Errors that can occur while running an external command.
#[derive(Debug, Error)]
pub enum ExecError {
  /// The program could not be started.
  #[error("failed to spawn `{cmd}`: {source}")]
  Spawn {
    cmd: String,
    #[source]
    source: io::Error,
  },

  /// Writing the command's standard input or collecting its output failed.
  #[error("i/o error while running `{cmd}`: {source}")]
  Io {
    cmd: String,
    #[source]
    source: io::Error,
  },

  /// The log file for the command could not be opened.
  #[error("failed to open log file '{path}': {source}")]
  LogFile {
    path: PathBuf,
    #[source]
    source: io::Error,
  },

  /// The command ran and exited unsuccessfully.
  #[error("command failed with exit code {code:?}: {cmd}")]
  Failed {
    cmd: String,
    code: Option<i32>,
    output: String,
  },
}

impl ExecError {
  /// Combined output of a command that exited unsuccessfully.
  pub fn output(&self) -> Option<&str> {
    match self {
      ExecError::Failed { output, .. } => Some(output),
      _ => None,
    }
  }
}

/// Description of a single external command invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandSpec {
  pub program: String,
  pub args: Vec<String>,
  pub cwd: Option<PathBuf>,
  pub env: BTreeMap<String, String>,
  /// Data written to the command's standard input.
  pub stdin: Option<String>,
  /// When set, stdout and stderr are appended to this file instead of captured.
  pub log_file: Option<PathBuf>,
}

impl CommandSpec {
  pub fn new(program: impl Into<String>) -> Self {
    Self {
      program: program.into(),
      ..Default::default()
    }
  }

  pub fn arg(mut self, arg: impl AsRef<std::ffi::OsStr>) -> Self {
    self.args.push(arg.as_ref().to_string_lossy().into_owned());
    self
  }

  pub fn args<I, S>(mut self, args: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: AsRef<std::ffi::OsStr>,
  {
    for arg in args {
      self = self.arg(arg);
    }
    self
  }

  pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
    self.cwd = Some(dir.into());
    self
  }

  pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
    self.env.insert(key.into(), value.into());
    self
  }

  pub fn stdin(mut self, input: impl Into<String>) -> Self {
    self.stdin = Some(input.into());
    self
  }

  pub fn append_output_to(mut self, path: impl Into<PathBuf>) -> Self {
    self.log_file = Some(path.into());
    self
  }

  /// Wrap the command so it runs as `user` through `sudo`.
  pub fn run_as(mut self, user: &str) -> Self {
    let mut args = vec!["-u".to_string(), user.to_string(), self.program];
    args.append(&mut self.args);
    self.program = "sudo".to_string();
    self.args = args;
    self
  }
}

impl fmt::Display for CommandSpec {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.program)?;
    for arg in &self.args {
      write!(f, " {}", arg)?;
    }
    Ok(())
  }
}

/// Captured result of a successful command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
  /// Stdout followed by stderr. Empty when the output went to a log file.
  pub output: String,
}

impl CommandOutput {
  pub fn new(output: impl Into<String>) -> Self {
    Self { output: output.into() }
  }
}

/// Runs external commands to completion.
pub trait CommandRunner {
  fn run(&self, spec: &CommandSpec) -> Result<CommandOutput, ExecError>;
}

impl<T: CommandRunner + ?Sized> CommandRunner for &T {
  fn run(&self, spec: &CommandSpec) -> Result<CommandOutput, ExecError> {
    (**self).run(spec)
  }
}

impl<T: CommandRunner + ?Sized> CommandRunner for Box<T> {
  fn run(&self, spec: &CommandSpec) -> Result<CommandOutput, ExecError> {
    (**self).run(spec)
  }
}

/// Runs commands on the local system, blocking until they exit.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
  fn run(&self, spec: &CommandSpec) -> Result<CommandOutput, ExecError> {
    let cmd = spec.to_string();
    info!(cmd = %cmd, "executing command");

    let mut command = Command::new(&spec.program);
    command.args(&spec.args).envs(&spec.env);
    if let Some(cwd) = &spec.cwd {
      command.current_dir(cwd);
    }

    command.stdin(if spec.stdin.is_some() {
      Stdio::piped()
    } else {
      Stdio::null()
    });

    match &spec.log_file {
      Some(path) => {
        let log = open_log(path)?;
        let log_err = log.try_clone().map_err(|source| ExecError::LogFile {
          path: path.clone(),
          source,
        })?;
        command.stdout(Stdio::from(log)).stderr(Stdio::from(log_err));
      }
      None => {
        command.stdout(Stdio::piped()).stderr(Stdio::piped());
      }
    }

    debug!(working_dir = ?spec.cwd, "spawning process");

    let mut child = command.spawn().map_err(|source| ExecError::Spawn {
      cmd: cmd.clone(),
      source,
    })?;

    // The child is always waited on, even when feeding its input fails.
    let mut stdin_error = None;
    if let Some(input) = &spec.stdin
      && let Some(mut pipe) = child.stdin.take()
      && let Err(e) = pipe.write_all(input.as_bytes())
    {
      if e.kind() == io::ErrorKind::BrokenPipe {
        debug!(cmd = %cmd, "command exited before reading all of its input");
      } else {
        stdin_error = Some(e);
      }
    }

    let output = child
      .wait_with_output()
      .map_err(|source| ExecError::Io { cmd: cmd.clone(), source })?;

    let mut combined = String::from_utf8_lossy(&output.stdout).into_owned();
    combined.push_str(&String::from_utf8_lossy(&output.stderr));

    if !output.status.success() {
      if !combined.is_empty() {
        debug!(output = %combined, "command output");
      }
      return Err(ExecError::Failed {
        cmd,
        code: output.status.code(),
        output: combined,
      });
    }

    if let Some(source) = stdin_error {
      return Err(ExecError::Io { cmd, source });
    }

    Ok(CommandOutput { output: combined })
  }
}

fn open_log(path: &Path) -> Result<File, ExecError> {
  let to_err = |source| ExecError::LogFile {
    path: path.to_path_buf(),
    source,
  };
  if let Some(parent) = path.parent() {
    fs::create_dir_all(parent).map_err(to_err)?;
  }
  OpenOptions::new().create(true).append(true).open(path).map_err(to_err)
}

/// Runner adapter that executes every command as another user.
///
/// With no user configured commands run unchanged as the current user.
pub struct AsUser<'a> {
  inner: &'a dyn CommandRunner,
  user: Option<&'a str>,
}

impl<'a> AsUser<'a> {
  pub fn new(inner: &'a dyn CommandRunner, user: Option<&'a str>) -> Self {
    Self { inner, user }
  }
}

impl CommandRunner for AsUser<'_> {
  fn run(&self, spec: &CommandSpec) -> Result<CommandOutput, ExecError> {
    match self.user {
      Some(user) => self.inner.run(&spec.clone().run_as(user)),
      None => self.inner.run(spec),
    }
  }
}

#[cfg(test)]
#[cfg(unix)]
mod tests {
  use super::*;
  use crate::testutil::FakeRunner;
  use tempfile::TempDir;

  fn sh(script: &str) -> CommandSpec {
    CommandSpec::new("/bin/sh").args(["-c", script])
  }

  #[test]
  fn run_simple_command() {
    let out = SystemRunner.run(&sh("echo hello")).unwrap();
    assert_eq!(out.output.trim(), "hello");
  }

  #[test]
  fn run_combines_stdout_and_stderr() {
    let out = SystemRunner.run(&sh("echo out; echo err >&2")).unwrap();
    assert!(out.output.contains("out"));
    assert!(out.output.contains("err"));
  }

  #[test]
  fn run_failure_reports_exit_code_and_output() {
    let err = SystemRunner.run(&sh("echo broken; exit 3")).unwrap_err();
    assert!(matches!(err, ExecError::Failed { code: Some(3), .. }));
    assert_eq!(err.output().map(str::trim), Some("broken"));
  }

  #[test]
  fn run_missing_program_is_spawn_error() {
    let err = SystemRunner
      .run(&CommandSpec::new("/nonexistent/langpacks-test-binary"))
      .unwrap_err();
    assert!(matches!(err, ExecError::Spawn { .. }));
  }

  #[test]
  fn run_feeds_stdin() {
    let out = SystemRunner.run(&CommandSpec::new("cat").stdin("key material")).unwrap();
    assert_eq!(out.output, "key material");
  }

  #[test]
  fn run_early_exit_with_pending_stdin_reports_exit_code() {
    let input = "x".repeat(1 << 20);
    let err = SystemRunner
      .run(&sh("echo rejected; exit 2").stdin(input))
      .unwrap_err();

    assert!(matches!(err, ExecError::Failed { code: Some(2), .. }));
    assert_eq!(err.output().map(str::trim), Some("rejected"));
  }

  #[test]
  fn run_with_env_and_cwd() {
    let temp = TempDir::new().unwrap();
    SystemRunner
      .run(&sh("touch \"$MARKER\"").env("MARKER", "cwd_marker").current_dir(temp.path()))
      .unwrap();
    assert!(temp.path().join("cwd_marker").exists());
  }

  #[test]
  fn run_appends_to_log_file() {
    let temp = TempDir::new().unwrap();
    let log = temp.path().join("logs").join("questing.log");

    SystemRunner.run(&sh("echo first").append_output_to(&log)).unwrap();
    let out = SystemRunner
      .run(&sh("echo second >&2").append_output_to(&log))
      .unwrap();

    assert!(out.output.is_empty());
    let content = fs::read_to_string(&log).unwrap();
    assert_eq!(content, "first\nsecond\n");
  }

  #[test]
  fn run_as_wraps_in_sudo() {
    let spec = CommandSpec::new("git").args(["pull"]).run_as("ubuntu");
    assert_eq!(spec.program, "sudo");
    assert_eq!(spec.args, vec!["-u", "ubuntu", "git", "pull"]);
    assert_eq!(spec.to_string(), "sudo -u ubuntu git pull");
  }

  #[test]
  fn as_user_without_user_passes_through() {
    let fake = FakeRunner::new();
    AsUser::new(&fake, None).run(&CommandSpec::new("make")).unwrap();
    AsUser::new(&fake, Some("ubuntu")).run(&CommandSpec::new("make")).unwrap();

    let calls = fake.calls();
    assert_eq!(calls[0].to_string(), "make");
    assert_eq!(calls[1].to_string(), "sudo -u ubuntu make");
  }
}
