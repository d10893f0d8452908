//! Project configuration (darkroom.yaml) parsing.
//!
//! Everything here has a default, so a missing or empty file is valid.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::cache::ImageCache;
use crate::error::{DarkroomError, Result};
use crate::script::Vars;

/// File looked up in the working directory when `--config` is not given.
pub const CONFIG_FILENAME: &str = "darkroom.yaml";

/// Configuration loaded from darkroom.yaml.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Byte budget of the per-run image cache.
    #[serde(default = "default_cache_budget")]
    pub cache_budget: u64,

    /// Per-step timing events.
    #[serde(default)]
    pub verbose: bool,

    /// Script variables, overridden by `--var` on the command line.
    #[serde(default)]
    pub vars: HashMap<String, String>,

    /// Output directory for `convert`.
    #[serde(default = "default_output")]
    pub output: PathBuf,

    /// File extensions `convert` treats as images.
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,
}

fn default_cache_budget() -> u64 {
    ImageCache::DEFAULT_BUDGET
}

fn default_output() -> PathBuf {
    PathBuf::from("dist")
}

fn default_extensions() -> Vec<String> {
    vec!["png".to_string(), "jpg".to_string(), "jpeg".to_string()]
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cache_budget: default_cache_budget(),
            verbose: false,
            vars: HashMap::new(),
            output: default_output(),
            extensions: default_extensions(),
        }
    }
}

impl Config {
    /// Load configuration from a darkroom.yaml file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| DarkroomError::Io {
            path: path.to_path_buf(),
            message: format!("Failed to read config: {}", e),
        })?;

        Self::parse(&content)
    }

    /// Load `explicit` if given, else darkroom.yaml in `dir` if it exists,
    /// else the defaults.
    pub fn discover(explicit: Option<&Path>, dir: &Path) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load(path);
        }
        let path = dir.join(CONFIG_FILENAME);
        if path.is_file() {
            tracing::debug!(path = %path.display(), "loading config");
            Self::load(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Parse configuration from a YAML string.
    pub fn parse(content: &str) -> Result<Self> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(content).map_err(|e| DarkroomError::Config {
            message: format!("Invalid config: {}", e),
            help: Some("Check darkroom.yaml syntax".to_string()),
        })
    }

    /// Config variables with `overrides` applied on top.
    pub fn merged_vars(&self, overrides: &[(String, String)]) -> Vars {
        let mut vars = self.vars.clone();
        for (name, value) in overrides {
            vars.insert(name.clone(), value.clone());
        }
        vars
    }

    /// Whether `path` has one of the configured image extensions.
    pub fn is_image(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .map(|ext| {
                self.extensions
                    .iter()
                    .any(|allowed| allowed.eq_ignore_ascii_case(ext))
            })
            .unwrap_or(false)
    }
}
