//! stackgen: code generator for SolidJS + Hono + sharded-SQLite projects.
//!
//! Generators emit new files from embedded templates and then wire them into
//! four existing collaborator files (vite config, server routes, shared
//! schemas, user shard class) through an idempotent source patcher.
//!
//! # Architecture
//!
//! Every change to a collaborator compiles down to a set of [`Edit`]s: verified
//! byte-span replacements spliced in one pass and written atomically.
//! Intelligence lives in locating the splice point (regex anchors over
//! conventional file shapes) and in marker-based presence checks, not in the
//! write path.
//!
//! # Safety
//!
//! - Names are validated before any file is read or written
//! - Applying the same insertion twice leaves the file byte-identical
//! - Edits verify their expected before-text
//! - Atomic file writes (tempfile + fsync + rename)
//! - A missing anchor never guesses: the fragment is returned for manual use
//!
//! # Example
//!
//! ```no_run
//! use stackgen::generate::{create_page, PageKind};
//! use stackgen::project::ProjectConfig;
//!
//! let config = ProjectConfig::load(".", None)?;
//! let report = create_page(&config, "user-profile", PageKind::Feed, false)?;
//! for step in &report.next_steps {
//!     println!("{step}");
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod edit;
pub mod emit;
pub mod generate;
pub mod naming;
pub mod patch;
pub mod project;
pub mod templates;

pub use edit::{Edit, EditError, EditVerification};
pub use emit::{EmitError, Emitter};
pub use generate::{GenerateError, GenerationReport};
pub use naming::{Identifier, ValidationError};
pub use patch::{
    CollaboratorKind, InsertionTarget, PatchError, PatchOutcome, PatchWarning, Patcher,
};
pub use project::{ConfigError, ProjectConfig};
