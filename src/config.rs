use crate::command::file_exists;
use crate::error::{PrintError, Result};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

/// Printing configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Explicit SumatraPDF executable. `None` (or an empty path) enables auto-detection.
    #[serde(default)]
    pub sumatra_path: Option<PathBuf>,
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_sumatra_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.sumatra_path = Some(path.into());
        self
    }

    /// The configured executable, treating an empty path as unset.
    pub fn sumatra_path(&self) -> Option<&Path> {
        self.sumatra_path
            .as_deref()
            .filter(|path| !path.as_os_str().is_empty())
    }
}

/// Shared handle to a [`Config`].
///
/// Clones refer to the same configuration, so one handle can serve as a
/// process-wide default when passed to every printer that should see it.
#[derive(Debug, Clone, Default)]
pub struct SharedConfig {
    inner: Arc<RwLock<Config>>,
}

impl SharedConfig {
    pub fn new(config: Config) -> Result<Self> {
        let shared = Self::default();
        shared.set(config)?;
        Ok(shared)
    }

    /// Replaces the configuration. A configured path that does not exist is
    /// rejected and the stored configuration is left untouched.
    pub fn set(&self, config: Config) -> Result<()> {
        let mut guard = self.inner.write();

        if let Some(path) = config.sumatra_path() {
            if !file_exists(path) {
                debug!("Rejecting SumatraPDF path {}", path.display());
                return Err(PrintError::SumatraNotFound);
            }
        }

        *guard = config;
        Ok(())
    }

    pub fn get(&self) -> Config {
        self.inner.read().clone()
    }

    /// Clears the configuration back to auto-detection.
    pub fn reset(&self) {
        *self.inner.write() = Config::default();
    }
}
