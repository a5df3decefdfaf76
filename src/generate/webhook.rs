use crate::generate::{GenerateError, GenerationReport, Run};
use crate::patch::{CollaboratorKind, ImportSpec, InsertionTarget};
use crate::project::{module_specifier, ProjectConfig};
use crate::templates;

/// `create-webhook <name>`: a handler stub at `<webhooks_dir>/<name>.ts`, an
/// event schema, and `app.post('/webhooks/<name>', ...)` in the route file.
pub fn create_webhook(
    config: &ProjectConfig,
    name: &str,
    dry_run: bool,
) -> Result<GenerationReport, GenerateError> {
    let mut run = Run::start(config, name, dry_run)?;
    let id = run.id.clone();
    let pascal = id.pascal();
    let module = config.webhook_module(&id);

    run.ensure_absent(&module)?;
    run.emit(&module, &templates::WEBHOOK_HANDLER)?;

    let schemas = config.schemas();
    let schema = templates::WEBHOOK_SCHEMA.render(&run.context())?;
    run.patch(
        InsertionTarget::new(&schemas, CollaboratorKind::Schema, schema)
            .marker(format!("const {pascal}EventSchema "))
            .import(ImportSpec::named("zod", &["z"])),
    )?;

    let routes = config.routes();
    let registration = templates::WEBHOOK_ROUTES.render(&run.context())?;
    let handler = format!("handle{pascal}Webhook");
    run.patch(
        InsertionTarget::new(&routes, CollaboratorKind::Routes, registration)
            .marker(format!("'/webhooks/{}'", id.kebab()))
            .import(ImportSpec::named(
                module_specifier(&routes, &module),
                &[handler.as_str()],
            )),
    )?;

    let next_steps = vec![
        format!(
            "Set the {}_WEBHOOK_SECRET secret used to verify signatures",
            id.screaming_snake()
        ),
        format!(
            "Point the provider at POST /webhooks/{} (signature in the x-signature header)",
            id.kebab()
        ),
    ];

    Ok(run.finish(next_steps))
}
