//! Generators: validate → render → emit → patch.
//!
//! Each generator parses the name first, so an invalid name fails before any
//! file is read. Collision guards run before the first write. After that the
//! sequence is strictly ordered and aborts on the first fatal error; files
//! already written stay written.

pub mod page;
pub mod table;
pub mod webhook;

pub use page::{create_page, PageKind};
pub use table::create_table;
pub use webhook::create_webhook;

use crate::emit::{EmitError, EmittedFile, Emitter};
use crate::naming::{Identifier, ValidationError};
use crate::patch::{InsertionTarget, PatchError, PatchOutcome, PatchWarning, Patcher};
use crate::project::{module_specifier, ProjectConfig};
use crate::templates::{RenderContext, Template, TemplateError};
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum GenerateError {
    #[error("invalid name: {0}")]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Emit(#[from] EmitError),

    #[error(transparent)]
    Patch(#[from] PatchError),

    #[error(transparent)]
    Template(#[from] TemplateError),
}

/// Everything a generator did (or would do, in a dry run).
#[derive(Debug, Default)]
pub struct GenerationReport {
    pub dry_run: bool,
    pub files: Vec<EmittedFile>,
    pub patches: Vec<PatchOutcome>,
    /// Follow-up instructions for the user, manual patches first.
    pub next_steps: Vec<String>,
}

impl GenerationReport {
    pub fn warnings(&self) -> impl Iterator<Item = &PatchWarning> {
        self.patches.iter().filter_map(PatchOutcome::warning)
    }

    pub fn has_warnings(&self) -> bool {
        self.warnings().next().is_some()
    }
}

/// Shared state threaded through one generator run.
struct Run<'a> {
    config: &'a ProjectConfig,
    id: Identifier,
    emitter: Emitter,
    patcher: Patcher,
    patches: Vec<PatchOutcome>,
    manual_steps: Vec<String>,
}

impl<'a> Run<'a> {
    fn start(config: &'a ProjectConfig, name: &str, dry_run: bool) -> Result<Self, GenerateError> {
        let id = Identifier::parse(name)?;
        tracing::debug!(name = %id, pascal = id.pascal(), dry_run, "generating");
        Ok(Self {
            config,
            id,
            emitter: Emitter::new(dry_run),
            patcher: Patcher::dry_run(dry_run),
            patches: Vec::new(),
            manual_steps: Vec::new(),
        })
    }

    /// Identifier forms plus shard settings. Module paths are per file; see
    /// [`Run::context_for`].
    fn context(&self) -> RenderContext {
        RenderContext::for_identifier(&self.id)
            .with("shard_class", self.config.shard.class_name.as_str())
            .with("shard_binding", self.config.shard.binding.as_str())
    }

    /// [`Run::context`] with `schemas_module` and `shard_module` resolved
    /// relative to `file`.
    fn context_for(&self, file: &Path) -> RenderContext {
        self.context()
            .with(
                "schemas_module",
                module_specifier(file, &self.config.schemas()),
            )
            .with(
                "shard_module",
                module_specifier(file, &self.config.user_shard()),
            )
    }

    /// Comment line opening a shard fragment, also its presence marker.
    /// Bracketed so `notes` never matches inside `notes-archive`.
    fn shard_marker(&self, generator: &str) -> String {
        format!("// stackgen[{generator}:{}]", self.id.kebab())
    }

    fn ensure_absent(&self, path: &Path) -> Result<(), GenerateError> {
        Ok(self.emitter.ensure_absent(path)?)
    }

    fn emit(&mut self, path: &Path, template: &Template) -> Result<(), GenerateError> {
        let contents = template.render(&self.context_for(path))?;
        self.emitter.write_file(path, contents)?;
        Ok(())
    }

    fn patch(&mut self, target: InsertionTarget) -> Result<(), GenerateError> {
        let outcome = self.patcher.apply(&target)?;
        match &outcome {
            PatchOutcome::Skipped {
                file,
                warning,
                fragment,
            } => self
                .manual_steps
                .push(manual_instructions(file, warning, &target, fragment)),
            PatchOutcome::Applied {
                file,
                warning: Some(warning),
                ..
            } => self.manual_steps.push(format!(
                "Review {}: {warning}",
                file.display()
            )),
            _ => {}
        }
        self.patches.push(outcome);
        Ok(())
    }

    fn finish(self, next_steps: Vec<String>) -> GenerationReport {
        let mut steps = self.manual_steps;
        steps.extend(next_steps);
        GenerationReport {
            dry_run: self.emitter.is_dry_run(),
            files: self.emitter.into_written(),
            patches: self.patches,
            next_steps: steps,
        }
    }
}

fn manual_instructions(
    file: &Path,
    warning: &PatchWarning,
    target: &InsertionTarget,
    fragment: &str,
) -> String {
    let mut out = format!("{warning}. Add this to {} by hand:\n", file.display());
    for spec in &target.imports {
        out.push_str(&spec.to_statement('\''));
    }
    if !target.imports.is_empty() {
        out.push('\n');
    }
    out.push_str(fragment.trim_end_matches('\n'));
    out
}
