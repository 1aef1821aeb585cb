//! Library location and environment settings.

use std::env;
use std::ffi::OsString;
use std::path::PathBuf;

use avisynth_sys as ffi;
use tracing::warn;

/// Directory containing the engine library.
pub const LIB_DIR_VAR: &str = "AVISYNTH_LIB_DIR";
/// File name of the engine library, overriding the platform defaults.
pub const LIB_NAME_VAR: &str = "AVISYNTH_LIB_NAME";
/// Interface version requested from the engine.
pub const INTERFACE_VERSION_VAR: &str = "AVISYNTH_INTERFACE_VERSION";
/// Engine frame cache limit, in megabytes.
pub const MEMORY_MAX_VAR: &str = "AVISYNTH_MEMORY_MAX";

/// Settings used when loading the engine and creating an environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Searched instead of the system library path when set.
    pub library_dir: Option<PathBuf>,
    pub library_name: Option<OsString>,
    pub interface_version: i32,
    pub memory_max: Option<i32>,
    pub working_dir: Option<PathBuf>,
}

impl Default for Config {
    #[inline]
    fn default() -> Self {
        Self {
            library_dir: None,
            library_name: None,
            interface_version: ffi::AVISYNTH_INTERFACE_VERSION,
            memory_max: None,
            working_dir: None,
        }
    }
}

impl Config {
    /// Reads the configuration from the `AVISYNTH_*` environment variables.
    ///
    /// Malformed numbers are ignored with a warning.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| env::var_os(name))
    }

    pub(crate) fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<OsString>,
    {
        let mut config = Self::default();

        config.library_dir = lookup(LIB_DIR_VAR)
            .filter(|dir| !dir.is_empty())
            .map(PathBuf::from);
        config.library_name = lookup(LIB_NAME_VAR).filter(|name| !name.is_empty());

        if let Some(version) = parse_number(&lookup, INTERFACE_VERSION_VAR) {
            config.interface_version = version;
        }
        config.memory_max = parse_number(&lookup, MEMORY_MAX_VAR);

        config
    }

    /// Returns whether the library has to be loaded from a non-default location.
    #[inline]
    pub(crate) fn has_library_override(&self) -> bool {
        self.library_dir.is_some() || self.library_name.is_some()
    }
}

fn parse_number<F>(lookup: &F, name: &str) -> Option<i32>
where
    F: Fn(&str) -> Option<OsString>,
{
    let raw = lookup(name)?;
    match raw.to_str().and_then(|value| value.trim().parse().ok()) {
        Some(value) => Some(value),
        None => {
            warn!(variable = name, value = ?raw, "ignoring malformed configuration value");
            None
        }
    }
}
