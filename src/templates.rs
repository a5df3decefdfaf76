//! Embedded template catalog.
//!
//! Templates are plain text with `{{name}}` placeholders. Rendering is pure
//! substitution; every placeholder must resolve or rendering fails.

use crate::naming::Identifier;
use regex::{Captures, Regex};
use std::collections::BTreeMap;
use std::sync::LazyLock;
use thiserror::Error;

static PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{\{\s*(\w+)\s*\}\}").expect("placeholder regex"));

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Template {
    pub name: &'static str,
    source: &'static str,
}

macro_rules! template {
    ($ident:ident, $path:literal) => {
        pub const $ident: Template = Template {
            name: $path,
            source: include_str!(concat!("../templates/", $path)),
        };
    };
}

template!(PAGE_HTML, "page/index.html.tmpl");
template!(PAGE_ENTRY, "page/index.tsx.tmpl");
template!(STATIC_APP, "page/static/App.tsx.tmpl");

template!(DASHBOARD_APP, "page/dashboard/App.tsx.tmpl");
template!(DASHBOARD_HOOK, "page/dashboard/hook.ts.tmpl");
template!(DASHBOARD_API, "page/dashboard/api.ts.tmpl");
template!(DASHBOARD_SCHEMA, "page/dashboard/schema.ts.tmpl");
template!(DASHBOARD_ROUTES, "page/dashboard/routes.ts.tmpl");
template!(DASHBOARD_SHARD, "page/dashboard/shard.ts.tmpl");

template!(FEED_APP, "page/feed/App.tsx.tmpl");
template!(FEED_HOOK, "page/feed/hook.ts.tmpl");
template!(FEED_API, "page/feed/api.ts.tmpl");
template!(FEED_SCHEMA, "page/feed/schema.ts.tmpl");
template!(FEED_ROUTES, "page/feed/routes.ts.tmpl");
template!(FEED_SHARD, "page/feed/shard.ts.tmpl");

template!(TABLE_SCHEMA, "table/schema.ts.tmpl");
template!(TABLE_SHARD, "table/shard.ts.tmpl");

template!(WEBHOOK_HANDLER, "webhook/handler.ts.tmpl");
template!(WEBHOOK_SCHEMA, "webhook/schema.ts.tmpl");
template!(WEBHOOK_ROUTES, "webhook/routes.ts.tmpl");

template!(VITE_ENTRY_RESOLVE, "vite/entry_resolve.tmpl");
template!(VITE_ENTRY_PLAIN, "vite/entry_plain.tmpl");

/// Every template in the catalog.
pub fn all() -> &'static [Template] {
    &[
        PAGE_HTML,
        PAGE_ENTRY,
        STATIC_APP,
        DASHBOARD_APP,
        DASHBOARD_HOOK,
        DASHBOARD_API,
        DASHBOARD_SCHEMA,
        DASHBOARD_ROUTES,
        DASHBOARD_SHARD,
        FEED_APP,
        FEED_HOOK,
        FEED_API,
        FEED_SCHEMA,
        FEED_ROUTES,
        FEED_SHARD,
        TABLE_SCHEMA,
        TABLE_SHARD,
        WEBHOOK_HANDLER,
        WEBHOOK_SCHEMA,
        WEBHOOK_ROUTES,
        VITE_ENTRY_RESOLVE,
        VITE_ENTRY_PLAIN,
    ]
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TemplateError {
    #[error("template {template} uses undefined placeholder `{name}`")]
    UndefinedPlaceholder {
        template: &'static str,
        name: String,
    },
}

/// Values available to placeholders.
#[derive(Debug, Clone, Default)]
pub struct RenderContext {
    vars: BTreeMap<String, String>,
}

impl RenderContext {
    /// Context pre-filled with every form of `id`:
    /// `kebab`, `Pascal`, `camel`, `SCREAMING`, `snake`, `title`.
    pub fn for_identifier(id: &Identifier) -> Self {
        Self::default()
            .with("kebab", id.kebab())
            .with("Pascal", id.pascal())
            .with("camel", id.camel())
            .with("SCREAMING", id.screaming_snake())
            .with("snake", id.snake())
            .with("title", title_case(id.kebab()))
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.vars.insert(key.into(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.vars.get(key).map(String::as_str)
    }
}

impl Template {
    pub fn source(&self) -> &'static str {
        self.source
    }

    /// Names of every placeholder the template uses, deduplicated.
    pub fn placeholders(&self) -> Vec<&'static str> {
        let mut names: Vec<&'static str> = PLACEHOLDER
            .captures_iter(self.source)
            .filter_map(|c| c.get(1).map(|m| m.as_str()))
            .collect();
        names.sort_unstable();
        names.dedup();
        names
    }

    pub fn render(&self, ctx: &RenderContext) -> Result<String, TemplateError> {
        if let Some(name) = self
            .placeholders()
            .into_iter()
            .find(|name| ctx.get(name).is_none())
        {
            return Err(TemplateError::UndefinedPlaceholder {
                template: self.name,
                name: name.to_string(),
            });
        }

        Ok(PLACEHOLDER
            .replace_all(self.source, |caps: &Captures| {
                ctx.get(&caps[1]).unwrap_or_default().to_string()
            })
            .into_owned())
    }
}

fn title_case(kebab: &str) -> String {
    kebab
        .split('-')
        .filter(|s| !s.is_empty())
        .map(|s| {
            let mut chars = s.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}
