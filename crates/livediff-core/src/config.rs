//! Settings file (`livediff.toml`)
//!
//! ```toml
//! context = 5
//! color = false
//! server_side_dry_run = true
//! default_namespace = "staging"
//! definitions = ["defs/worker.yaml", "defs/traits.yaml"]
//! ```
//!
//! Every field is optional; command-line flags override file values.

use crate::errors::{ExError, LiveDiffError, Result};
use crate::report::DEFAULT_CONTEXT;
use livediff_core_types::DEFAULT_NAMESPACE;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LiveDiffConfig {
    /// Unchanged lines shown around each change; `<= 0` shows everything
    pub context: i32,
    pub color: bool,
    /// Submit the application in dry-run mode after rendering
    pub server_side_dry_run: bool,
    pub default_namespace: String,
    /// Definition files loaded as auxiliary definitions
    pub definitions: Vec<PathBuf>,
}

impl Default for LiveDiffConfig {
    fn default() -> Self {
        Self {
            context: DEFAULT_CONTEXT,
            color: true,
            server_side_dry_run: false,
            default_namespace: DEFAULT_NAMESPACE.to_string(),
            definitions: Vec::new(),
        }
    }
}

impl LiveDiffConfig {
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| {
            ExError::from(LiveDiffError::InvalidManifest {
                reason: format!("invalid config: {}", e),
            })
            .with_op("load_config")
        })
    }

    /// Read a TOML settings file
    ///
    /// Relative `definitions` paths are resolved against the file's directory.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            ExError::from(LiveDiffError::Io {
                target: path.display().to_string(),
                reason: e.to_string(),
            })
            .with_op("load_config")
        })?;
        let mut config = Self::from_toml_str(&content)?;
        if let Some(dir) = path.parent() {
            config.definitions = config
                .definitions
                .into_iter()
                .map(|p| if p.is_relative() { dir.join(p) } else { p })
                .collect();
        }
        Ok(config)
    }
}
