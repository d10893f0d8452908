pub mod completions;
pub mod convert;
pub mod fmt;
pub mod list;
pub mod run;

use std::io::{self, IsTerminal};
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::config::Config;
use crate::error::{DarkroomError, Result};
use crate::script::Vars;

/// darkroom - declarative photo-editing pipelines
#[derive(Parser, Debug)]
#[command(name = "darkroom")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Configuration file (default: ./darkroom.yaml when present)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Script variable, referenced as ${NAME}; repeatable
    #[arg(long = "var", value_name = "NAME=VALUE", value_parser = parse_var, global = true)]
    pub vars: Vec<(String, String)>,

    /// Log every pipeline step with its timing
    #[arg(long, short, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run a script once
    Run(run::RunArgs),

    /// Run a script over every image in a directory
    Convert(convert::ConvertArgs),

    /// Print a script in canonical form
    Fmt(fmt::FmtArgs),

    /// List the available elements
    List(list::ListArgs),

    /// Generate shell completions
    Completions(completions::CompletionsArgs),
}

impl Cli {
    /// The config file plus command-line overrides.
    pub fn load_config(&self) -> Result<Config> {
        let mut config = Config::discover(self.config.as_deref(), Path::new("."))?;
        config.verbose |= self.verbose;
        Ok(config)
    }

    /// Config variables with `--var` pairs applied on top.
    pub fn vars(&self, config: &Config) -> Vars {
        config.merged_vars(&self.vars)
    }
}

/// Parse a `NAME=VALUE` pair.
pub fn parse_var(s: &str) -> std::result::Result<(String, String), String> {
    match s.split_once('=') {
        Some((name, value)) if !name.is_empty() => Ok((name.to_string(), value.to_string())),
        _ => Err(format!("expected NAME=VALUE, found '{}'", s)),
    }
}

/// Install the stderr log subscriber. `RUST_LOG` overrides the level.
pub fn init_tracing(verbose: bool) {
    let default = if verbose { "darkroom=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_ansi(io::stderr().is_terminal())
        .with_target(false)
        .try_init();
}

/// Read a script file.
pub(crate) fn read_script(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(|e| DarkroomError::Io {
        path: path.to_path_buf(),
        message: format!("Failed to read script: {}", e),
    })
}
