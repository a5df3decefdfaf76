use crate::generate::{GenerateError, GenerationReport, Run};
use crate::patch::{CollaboratorKind, ImportSpec, InsertionTarget};
use crate::project::{module_specifier, ProjectConfig};
use crate::templates;

/// `create-table <name>`: a row schema plus a shard table with CRUD methods.
///
/// Nothing is emitted; both collaborators are patched. The SQL table is
/// `<snake>_rows`, so it never shares storage with a feed page's
/// `<snake>_feed_items`.
pub fn create_table(
    config: &ProjectConfig,
    name: &str,
    dry_run: bool,
) -> Result<GenerationReport, GenerateError> {
    let mut run = Run::start(config, name, dry_run)?;
    let id = run.id.clone();
    let pascal = id.pascal();

    let schemas = config.schemas();
    let schema = templates::TABLE_SCHEMA.render(&run.context())?;
    run.patch(
        InsertionTarget::new(&schemas, CollaboratorKind::Schema, schema)
            .marker(format!("const {pascal}RowSchema "))
            .import(ImportSpec::named("zod", &["z"])),
    )?;

    let shard = config.user_shard();
    let marker = run.shard_marker("table");
    let methods =
        templates::TABLE_SHARD.render(&run.context().with("marker", marker.as_str()))?;
    let row_type = format!("{pascal}Row");
    run.patch(
        InsertionTarget::new(&shard, CollaboratorKind::UserShard, methods)
            .marker(marker)
            .import(ImportSpec::types(
                module_specifier(&shard, &schemas),
                &[row_type.as_str()],
            )),
    )?;

    let next_steps = vec![
        format!(
            "Call put{pascal}Row, get{pascal}Row, list{pascal}Rows and delete{pascal}Row from your shard RPC methods"
        ),
        format!(
            "Rows live in the `{}_rows` table of each user's shard",
            id.snake()
        ),
    ];

    Ok(run.finish(next_steps))
}
