//! Idempotent source patching of collaborator files.
//!
//! A patch is described by an [`InsertionTarget`]. Applying one:
//!
//! 1. handles a missing file per [`CollaboratorKind::missing_policy`]
//! 2. reads the full text
//! 3. stops if any marker is already present
//! 4. merges required imports
//! 5. splices the fragment before the kind's anchor
//! 6. writes the whole file back atomically
//!
//! Missing collaborators and missing anchors are warnings, never errors: the
//! caller gets the fragment back so it can print manual instructions.

pub mod anchor;
pub mod imports;
pub mod target;

pub use anchor::AnchorStrategy;
pub use imports::{plan_import, ImportSpec};
pub use target::{CollaboratorKind, InsertionTarget, MissingPolicy, PatchPlan, SCHEMA_PREAMBLE};

use crate::edit::{atomic_write, splice, EditError};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Non-fatal conditions surfaced to the caller for manual follow-up.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PatchWarning {
    #[error("{kind} not found at {file}; skipped")]
    MissingCollaborator {
        kind: CollaboratorKind,
        file: PathBuf,
    },

    #[error("no {anchor} found in {file}; left untouched")]
    AnchorNotFound { anchor: &'static str, file: PathBuf },

    #[error("no {anchor} found in {file}; appended at end of file")]
    AppendedAtEnd { anchor: &'static str, file: PathBuf },
}

/// Fatal patch failures. Files already written stay written.
#[derive(Error, Debug)]
pub enum PatchError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to patch {path}: {source}")]
    Edit {
        path: PathBuf,
        #[source]
        source: EditError,
    },
}

/// Result of applying a single [`InsertionTarget`].
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use = "PatchOutcome carries warnings that need reporting"]
pub enum PatchOutcome {
    /// Fragment spliced into an existing file.
    Applied {
        file: PathBuf,
        before: String,
        after: String,
        warning: Option<PatchWarning>,
    },
    /// File did not exist and was created with a preamble plus the fragment.
    Created { file: PathBuf, after: String },
    /// Markers already present; file untouched.
    AlreadyApplied { file: PathBuf },
    /// Nothing written. `fragment` is what the user should add by hand.
    Skipped {
        file: PathBuf,
        warning: PatchWarning,
        fragment: String,
    },
}

impl PatchOutcome {
    pub fn file(&self) -> &Path {
        match self {
            PatchOutcome::Applied { file, .. }
            | PatchOutcome::Created { file, .. }
            | PatchOutcome::AlreadyApplied { file }
            | PatchOutcome::Skipped { file, .. } => file,
        }
    }

    pub fn warning(&self) -> Option<&PatchWarning> {
        match self {
            PatchOutcome::Applied { warning, .. } => warning.as_ref(),
            PatchOutcome::Skipped { warning, .. } => Some(warning),
            _ => None,
        }
    }

    /// Whether the file's contents changed (or would, in a dry run).
    pub fn changed(&self) -> bool {
        matches!(
            self,
            PatchOutcome::Applied { .. } | PatchOutcome::Created { .. }
        )
    }
}

impl fmt::Display for PatchOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PatchOutcome::Applied { file, .. } => write!(f, "Patched {}", file.display()),
            PatchOutcome::Created { file, .. } => write!(f, "Created {}", file.display()),
            PatchOutcome::AlreadyApplied { file } => {
                write!(f, "Already applied to {}", file.display())
            }
            PatchOutcome::Skipped { warning, .. } => write!(f, "Skipped: {warning}"),
        }
    }
}

/// Applies insertion targets to disk, or only computes them in dry-run mode.
#[derive(Debug, Clone, Copy, Default)]
pub struct Patcher {
    dry_run: bool,
}

impl Patcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn dry_run(dry_run: bool) -> Self {
        Self { dry_run }
    }

    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    pub fn apply(&self, target: &InsertionTarget) -> Result<PatchOutcome, PatchError> {
        let path = target.file.as_path();

        let (before, created) = match fs::read_to_string(path) {
            Ok(text) => (text, false),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                match target.kind.missing_policy() {
                    MissingPolicy::Skip => {
                        return Ok(PatchOutcome::Skipped {
                            file: path.to_path_buf(),
                            warning: PatchWarning::MissingCollaborator {
                                kind: target.kind,
                                file: path.to_path_buf(),
                            },
                            fragment: target.fragment.clone(),
                        });
                    }
                    MissingPolicy::CreateWith(preamble) => (preamble.to_string(), true),
                }
            }
            Err(source) => {
                return Err(PatchError::Io {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };

        let (edits, warning) = match target.plan(&before) {
            PatchPlan::NoOp(reason) => {
                tracing::debug!(file = %path.display(), %reason, "already applied");
                return Ok(PatchOutcome::AlreadyApplied {
                    file: path.to_path_buf(),
                });
            }
            PatchPlan::Unanchored { anchor } => {
                return Ok(PatchOutcome::Skipped {
                    file: path.to_path_buf(),
                    warning: PatchWarning::AnchorNotFound {
                        anchor,
                        file: path.to_path_buf(),
                    },
                    fragment: target.fragment.clone(),
                });
            }
            PatchPlan::Edits {
                edits,
                fell_back_from,
                ..
            } => {
                let warning = fell_back_from.map(|anchor| PatchWarning::AppendedAtEnd {
                    anchor,
                    file: path.to_path_buf(),
                });
                (edits, warning)
            }
        };

        let after = splice(&before, &edits).map_err(|source| PatchError::Edit {
            path: path.to_path_buf(),
            source,
        })?;

        if !self.dry_run {
            write_text(path, &after, created)?;
            tracing::info!(file = %path.display(), edits = edits.len(), "patched");
        }

        if created {
            Ok(PatchOutcome::Created {
                file: path.to_path_buf(),
                after,
            })
        } else {
            Ok(PatchOutcome::Applied {
                file: path.to_path_buf(),
                before,
                after,
                warning,
            })
        }
    }
}

fn write_text(path: &Path, text: &str, create_parents: bool) -> Result<(), PatchError> {
    if create_parents {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|source| PatchError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }
    }
    atomic_write(path, text.as_bytes()).map_err(|source| PatchError::Edit {
        path: path.to_path_buf(),
        source,
    })
}
