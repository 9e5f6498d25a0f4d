//! Locating the SumatraPDF executable.

use crate::command::file_exists;
use crate::config::SharedConfig;
use crate::error::{PrintError, Result};
use std::ffi::{OsStr, OsString};
use std::path::PathBuf;
use tracing::debug;

const EXECUTABLE_NAME: &str = "SumatraPDF";

/// Common SumatraPDF install locations, with `%VAR%` placeholders.
pub const WELL_KNOWN_PATHS: &[&str] = &[
    r"C:\Program Files\SumatraPDF\SumatraPDF.exe",
    r"C:\Program Files (x86)\SumatraPDF\SumatraPDF.exe",
    r"C:\Users\%USERNAME%\AppData\Local\SumatraPDF\SumatraPDF.exe",
];

/// One way of finding the executable.
pub trait ResolveStrategy: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// `Ok(Some)` on a hit, `Ok(None)` to fall through to the next
    /// strategy, `Err` to stop the search.
    fn resolve(&self) -> Result<Option<PathBuf>>;
}

/// The path set in the shared configuration. Once a path is configured it
/// must exist; no other strategy is consulted.
pub struct ConfiguredPath {
    config: SharedConfig,
}

impl ConfiguredPath {
    pub fn new(config: SharedConfig) -> Self {
        Self { config }
    }
}

impl ResolveStrategy for ConfiguredPath {
    fn name(&self) -> &'static str {
        "configured"
    }

    fn resolve(&self) -> Result<Option<PathBuf>> {
        let config = self.config.get();
        match config.sumatra_path() {
            Some(path) if file_exists(path) => Ok(Some(path.to_path_buf())),
            Some(_) => Err(PrintError::SumatraNotFound),
            None => Ok(None),
        }
    }
}

/// Fixed install locations, environment-expanded at resolution time.
pub struct WellKnownPaths {
    templates: Vec<String>,
}

impl WellKnownPaths {
    pub fn new<I, S>(templates: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            templates: templates.into_iter().map(Into::into).collect(),
        }
    }
}

impl Default for WellKnownPaths {
    fn default() -> Self {
        Self::new(WELL_KNOWN_PATHS.iter().copied())
    }
}

impl ResolveStrategy for WellKnownPaths {
    fn name(&self) -> &'static str {
        "well-known"
    }

    fn resolve(&self) -> Result<Option<PathBuf>> {
        let found = self
            .templates
            .iter()
            .map(|template| PathBuf::from(expand_env(template, |var| std::env::var(var).ok())))
            .find(|path| file_exists(path));
        Ok(found)
    }
}

/// Search of the directories in a PATH-style list.
pub struct PathSearch {
    name: String,
    path_var: Option<OsString>,
}

impl PathSearch {
    pub fn new(name: impl Into<String>, path_var: Option<OsString>) -> Self {
        Self {
            name: name.into(),
            path_var,
        }
    }

    /// Searches for SumatraPDF using the current `PATH`.
    pub fn from_env() -> Self {
        Self::new(EXECUTABLE_NAME, std::env::var_os("PATH"))
    }
}

impl ResolveStrategy for PathSearch {
    fn name(&self) -> &'static str {
        "path"
    }

    fn resolve(&self) -> Result<Option<PathBuf>> {
        Ok(find_executable(&self.name, self.path_var.as_deref()))
    }
}

/// Looks for `name` as given, then in each directory of `path_var`, also
/// trying a `.exe` suffix when `name` lacks one.
pub fn find_executable(name: &str, path_var: Option<&OsStr>) -> Option<PathBuf> {
    if file_exists(name) {
        return Some(PathBuf::from(name));
    }

    let path_var = path_var.filter(|value| !value.is_empty())?;
    let with_exe = if name.to_lowercase().ends_with(".exe") {
        None
    } else {
        Some(format!("{}.exe", name))
    };

    for dir in std::env::split_paths(path_var) {
        let candidate = dir.join(name);
        if file_exists(&candidate) {
            return Some(candidate);
        }
        if let Some(exe) = &with_exe {
            let candidate = dir.join(exe);
            if file_exists(&candidate) {
                return Some(candidate);
            }
        }
    }

    None
}

/// Replaces `%NAME%` placeholders with values from `lookup`. Unknown and
/// unterminated placeholders are kept as written.
pub fn expand_env<F>(template: &str, lookup: F) -> String
where
    F: Fn(&str) -> Option<String>,
{
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find('%') {
        out.push_str(&rest[..start]);
        let after = &rest[start + 1..];
        match after.find('%') {
            Some(end) => {
                let var = &after[..end];
                match (!var.is_empty()).then(|| lookup(var)).flatten() {
                    Some(value) => {
                        out.push_str(&value);
                        rest = &after[end + 1..];
                    }
                    None => {
                        // keep the opening '%', the closing one may start another placeholder
                        out.push('%');
                        out.push_str(var);
                        rest = &after[end..];
                    }
                }
            }
            None => {
                out.push_str(&rest[start..]);
                rest = "";
            }
        }
    }
    out.push_str(rest);
    out
}

/// Runs resolution strategies in order, stopping at the first hit or error.
pub struct ExecutableLocator {
    strategies: Vec<Box<dyn ResolveStrategy>>,
}

impl ExecutableLocator {
    /// Configured path, then well-known locations, then `PATH`.
    pub fn new(config: SharedConfig) -> Self {
        Self::with_strategies(vec![
            Box::new(ConfiguredPath::new(config)),
            Box::new(WellKnownPaths::default()),
            Box::new(PathSearch::from_env()),
        ])
    }

    pub fn with_strategies(strategies: Vec<Box<dyn ResolveStrategy>>) -> Self {
        Self { strategies }
    }

    pub fn locate(&self) -> Result<PathBuf> {
        for strategy in &self.strategies {
            if let Some(path) = strategy.resolve()? {
                debug!("SumatraPDF resolved by {} strategy: {}", strategy.name(), path.display());
                return Ok(path);
            }
            debug!("SumatraPDF not found by {} strategy", strategy.name());
        }

        Err(PrintError::SumatraNotFound)
    }
}
