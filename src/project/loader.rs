//! `stackgen.toml` loading.
//!
//! Errors carry where the config came from so the CLI can say which file to
//! fix before any generator runs.

use crate::project::schema::{ConfigFile, ValidationError};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Where a config document was read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigOrigin {
    Inline,
    File(PathBuf),
}

impl fmt::Display for ConfigOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigOrigin::Inline => f.write_str("project config"),
            ConfigOrigin::File(path) => write!(f, "project config {}", path.display()),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read project config {} to locate collaborator files: {source}", path.display())]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{origin} is not valid TOML: {source}")]
    Syntax {
        origin: ConfigOrigin,
        #[source]
        source: toml_edit::de::Error,
    },

    #[error("{origin} describes an unusable project layout: {source}")]
    Layout {
        origin: ConfigOrigin,
        #[source]
        source: ValidationError,
    },
}

impl ConfigError {
    fn located(self, path: &Path) -> Self {
        let origin = ConfigOrigin::File(path.to_path_buf());
        match self {
            ConfigError::Syntax { source, .. } => ConfigError::Syntax { origin, source },
            ConfigError::Layout { source, .. } => ConfigError::Layout { origin, source },
            unreadable @ ConfigError::Unreadable { .. } => unreadable,
        }
    }
}

/// Parse and validate a config document. Missing tables and keys keep their
/// defaults; unknown keys are rejected.
pub fn load_from_str(input: &str) -> Result<ConfigFile, ConfigError> {
    let file: ConfigFile = toml_edit::de::from_str(input).map_err(|source| ConfigError::Syntax {
        origin: ConfigOrigin::Inline,
        source,
    })?;
    file.validate().map_err(|source| ConfigError::Layout {
        origin: ConfigOrigin::Inline,
        source,
    })?;
    Ok(file)
}

pub fn load_from_path(path: impl AsRef<Path>) -> Result<ConfigFile, ConfigError> {
    let path = path.as_ref();
    let text = fs::read_to_string(path).map_err(|source| ConfigError::Unreadable {
        path: path.to_path_buf(),
        source,
    })?;
    load_from_str(&text).map_err(|err| err.located(path))
}
