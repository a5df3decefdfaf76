//! Writing brand-new files.
//!
//! Unlike patched collaborators, emitted files are owned by the generator:
//! they are written whole and overwritten without checks. The only guard is
//! [`Emitter::ensure_absent`], run before anything is written.

use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EmitError {
    #[error("{path} already exists; refusing to overwrite")]
    Collision { path: PathBuf },

    #[error("failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// A file the emitter wrote, or would write in a dry run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmittedFile {
    pub path: PathBuf,
    pub contents: String,
}

#[derive(Debug, Default)]
pub struct Emitter {
    dry_run: bool,
    written: Vec<EmittedFile>,
}

impl Emitter {
    pub fn new(dry_run: bool) -> Self {
        Self {
            dry_run,
            written: Vec::new(),
        }
    }

    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    /// Fails with [`EmitError::Collision`] if `path` exists.
    pub fn ensure_absent(&self, path: &Path) -> Result<(), EmitError> {
        if path.exists() {
            return Err(EmitError::Collision {
                path: path.to_path_buf(),
            });
        }
        Ok(())
    }

    /// Create missing parent directories, then write `contents` to `path`.
    pub fn write_file(&mut self, path: &Path, contents: String) -> Result<(), EmitError> {
        if !self.dry_run {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent).map_err(|source| EmitError::Io {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
            fs::write(path, &contents).map_err(|source| EmitError::Io {
                path: path.to_path_buf(),
                source,
            })?;
            tracing::info!(file = %path.display(), bytes = contents.len(), "emitted");
        }

        self.written.push(EmittedFile {
            path: path.to_path_buf(),
            contents,
        });
        Ok(())
    }

    pub fn written(&self) -> &[EmittedFile] {
        &self.written
    }

    pub fn into_written(self) -> Vec<EmittedFile> {
        self.written
    }
}
