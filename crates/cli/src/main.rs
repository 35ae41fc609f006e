mod cmd;
mod output;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use cmd::{cmd_build, cmd_dispatch, cmd_hook, cmd_series, cmd_update, cmd_upload};
use output::OutputFormat;

/// langpacks-agent - Ubuntu language pack build agent
#[derive(Parser)]
#[command(name = "langpacks-agent")]
#[command(author, version, about, long_about = None)]
struct Cli {
  /// Enable verbose output
  #[arg(short, long, global = true)]
  verbose: bool,

  /// Settings file (default: $LANGPACKS_CONFIG, then /etc/langpacks-agent/config.toml)
  #[arg(short, long, global = true)]
  config: Option<PathBuf>,

  #[command(subcommand)]
  command: Commands,
}

#[derive(Subcommand)]
enum Commands {
  /// Handle the hook or action named by $JUJU_DISPATCH_PATH
  Dispatch {
    /// Dispatch path to handle instead of $JUJU_DISPATCH_PATH (e.g. hooks/install)
    #[arg(long)]
    path: Option<String>,
  },

  /// Handle a lifecycle hook by name
  Hook {
    /// Hook name (e.g. install, config-changed)
    name: String,
  },

  /// Build the language packs of a release
  Build {
    /// Series to build, or "devel" for the series under development
    #[arg(short, long)]
    release: String,

    /// Build full base packs instead of delta updates
    #[arg(long)]
    base: bool,
  },

  /// Upload all built language packs
  Upload,

  /// Update the langpack-o-matic checkout
  Update,

  /// List the active Ubuntu series
  Series {
    /// Output format
    #[arg(short, long, value_enum, default_value_t)]
    output: OutputFormat,
  },
}

fn main() -> Result<()> {
  let cli = Cli::parse();

  let default_level = if cli.verbose { "debug" } else { "info" };
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
  tracing_subscriber::fmt()
    .with_env_filter(filter)
    .without_time()
    .with_writer(std::io::stderr)
    .init();

  let config = cli.config.as_deref();
  match cli.command {
    Commands::Dispatch { path } => cmd_dispatch(config, path),
    Commands::Hook { name } => cmd_hook(config, &name),
    Commands::Build { release, base } => cmd_build(config, &release, base),
    Commands::Upload => cmd_upload(config),
    Commands::Update => cmd_update(config),
    Commands::Series { output } => cmd_series(config, output),
  }
}
