use crate::generate::{GenerateError, GenerationReport, Run};
use crate::patch::{CollaboratorKind, ImportSpec, InsertionTarget};
use crate::project::{module_specifier, ProjectConfig};
use crate::templates::{self, Template};
use std::fmt;
use std::fs;
use std::str::FromStr;

/// Page flavours. `Static` is markup only; the others are backed by an API
/// route and shard storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PageKind {
    Static,
    Dashboard,
    Feed,
}

impl PageKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PageKind::Static => "static",
            PageKind::Dashboard => "dashboard",
            PageKind::Feed => "feed",
        }
    }

    pub fn is_data_backed(&self) -> bool {
        !matches!(self, PageKind::Static)
    }

    fn app_template(&self) -> Template {
        match self {
            PageKind::Static => templates::STATIC_APP,
            PageKind::Dashboard => templates::DASHBOARD_APP,
            PageKind::Feed => templates::FEED_APP,
        }
    }
}

impl fmt::Display for PageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PageKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "static" => Ok(PageKind::Static),
            "dashboard" => Ok(PageKind::Dashboard),
            "feed" => Ok(PageKind::Feed),
            other => Err(format!(
                "unknown page type '{other}' (expected static, dashboard or feed)"
            )),
        }
    }
}

/// Per-kind names and templates for a data-backed page.
struct DataParts {
    hook_file: String,
    hook: Template,
    api: Template,
    schema: Template,
    schema_marker: String,
    schema_type: String,
    shard: Template,
    routes: Template,
    handlers: Vec<String>,
}

fn data_parts(kind: PageKind, pascal: &str) -> Option<DataParts> {
    match kind {
        PageKind::Static => None,
        PageKind::Dashboard => Some(DataParts {
            hook_file: format!("use{pascal}Stats.ts"),
            hook: templates::DASHBOARD_HOOK,
            api: templates::DASHBOARD_API,
            schema: templates::DASHBOARD_SCHEMA,
            schema_marker: format!("const {pascal}StatsSchema "),
            schema_type: format!("{pascal}Stats"),
            shard: templates::DASHBOARD_SHARD,
            routes: templates::DASHBOARD_ROUTES,
            handlers: vec![format!("get{pascal}StatsHandler")],
        }),
        PageKind::Feed => Some(DataParts {
            hook_file: format!("use{pascal}Items.ts"),
            hook: templates::FEED_HOOK,
            api: templates::FEED_API,
            schema: templates::FEED_SCHEMA,
            schema_marker: format!("const {pascal}ItemSchema "),
            schema_type: format!("{pascal}Item"),
            shard: templates::FEED_SHARD,
            routes: templates::FEED_ROUTES,
            handlers: vec![
                format!("list{pascal}ItemsHandler"),
                format!("create{pascal}ItemHandler"),
            ],
        }),
    }
}

/// `create-page <name> --type <kind>`.
///
/// Emits `<client_dir>/<name>/{index.html,index.tsx,App.tsx}` and registers
/// the vite entry. Data-backed kinds add a data hook, an API module, schema
/// types, shard methods and route registrations.
pub fn create_page(
    config: &ProjectConfig,
    name: &str,
    kind: PageKind,
    dry_run: bool,
) -> Result<GenerationReport, GenerateError> {
    let mut run = Run::start(config, name, dry_run)?;
    let id = run.id.clone();
    let page_dir = config.page_dir(&id);
    let api_module = config.api_module(&id);
    let parts = data_parts(kind, id.pascal());

    run.ensure_absent(&page_dir)?;
    if kind.is_data_backed() {
        run.ensure_absent(&api_module)?;
    }

    run.emit(&page_dir.join("index.html"), &templates::PAGE_HTML)?;
    run.emit(&page_dir.join("index.tsx"), &templates::PAGE_ENTRY)?;
    run.emit(&page_dir.join("App.tsx"), &kind.app_template())?;
    if let Some(parts) = &parts {
        run.emit(&page_dir.join(&parts.hook_file), &parts.hook)?;
        run.emit(&api_module, &parts.api)?;
    }

    let vite = config.vite_config();
    let entry_path = config.vite_entry_path(&id);
    // Follow the style of existing entries.
    let uses_resolve = fs::read_to_string(&vite)
        .map(|text| text.contains("resolve("))
        .unwrap_or(false);
    let entry_template = if uses_resolve {
        templates::VITE_ENTRY_RESOLVE
    } else {
        templates::VITE_ENTRY_PLAIN
    };
    let entry = entry_template.render(&run.context().with("entry_path", entry_path.as_str()))?;
    run.patch(
        InsertionTarget::new(&vite, CollaboratorKind::ViteConfig, entry.trim_end())
            .marker(format!("'{}':", id.kebab()))
            .marker(format!("\"{}\":", id.kebab()))
            .marker(entry_path.as_str()),
    )?;

    let mut next_steps = vec![format!(
        "Start the dev server and open /{entry_path} to see the {kind} page"
    )];

    if let Some(parts) = parts {
        let schemas = config.schemas();
        let schema = parts.schema.render(&run.context())?;
        run.patch(
            InsertionTarget::new(&schemas, CollaboratorKind::Schema, schema)
                .marker(parts.schema_marker.as_str())
                .import(ImportSpec::named("zod", &["z"])),
        )?;

        let shard = config.user_shard();
        let marker = run.shard_marker(kind.as_str());
        let methods = parts
            .shard
            .render(&run.context().with("marker", marker.as_str()))?;
        let mut shard_types = vec![parts.schema_type.as_str()];
        let input_type = format!("{}Input", parts.schema_type);
        if kind == PageKind::Feed {
            shard_types.push(input_type.as_str());
        }
        run.patch(
            InsertionTarget::new(&shard, CollaboratorKind::UserShard, methods)
                .marker(marker)
                .import(ImportSpec::types(
                    module_specifier(&shard, &schemas),
                    &shard_types,
                )),
        )?;

        let routes = config.routes();
        let registration = parts.routes.render(&run.context())?;
        let handlers: Vec<&str> = parts.handlers.iter().map(String::as_str).collect();
        run.patch(
            InsertionTarget::new(&routes, CollaboratorKind::Routes, registration)
                .marker(format!("'/api/{}'", id.kebab()))
                .import(ImportSpec::named(
                    module_specifier(&routes, &api_module),
                    &handlers,
                )),
        )?;

        next_steps.push(format!(
            "Make sure requests to /api/{} pass through middleware that sets `userId`",
            id.kebab()
        ));
    }

    Ok(run.finish(next_steps))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_kind_round_trip() {
        for kind in [PageKind::Static, PageKind::Dashboard, PageKind::Feed] {
            assert_eq!(kind.as_str().parse::<PageKind>().unwrap(), kind);
        }
        assert!("blog".parse::<PageKind>().is_err());
    }

    #[test]
    fn test_data_parts_names() {
        let parts = data_parts(PageKind::Feed, "UserProfile").unwrap();
        assert_eq!(parts.hook_file, "useUserProfileItems.ts");
        assert_eq!(
            parts.handlers,
            vec!["listUserProfileItemsHandler", "createUserProfileItemHandler"]
        );
        assert!(data_parts(PageKind::Static, "UserProfile").is_none());
    }
}
