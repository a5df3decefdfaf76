//! Named-import merging.
//!
//! Given `import { a, b } from './mod'` already in a file and a request for
//! `{ b, c }` from `./mod`, rewrite the brace list to `{ a, b, c }`. When no
//! statement for the module exists, a new one is inserted after the first
//! import statement (or at the top of the file).

use crate::edit::Edit;
use crate::patch::anchor::{AfterFirstImport, AnchorStrategy};
use regex::Regex;

/// Names to import from one module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportSpec {
    pub module: String,
    pub names: Vec<String>,
    /// Emit `import type { ... }` when a new statement is needed, and mark
    /// each name `type` when merged into a value import.
    pub type_only: bool,
}

impl ImportSpec {
    pub fn named(module: impl Into<String>, names: &[&str]) -> Self {
        Self {
            module: module.into(),
            names: names.iter().map(|n| n.to_string()).collect(),
            type_only: false,
        }
    }

    pub fn types(module: impl Into<String>, names: &[&str]) -> Self {
        Self {
            type_only: true,
            ..Self::named(module, names)
        }
    }

    /// A fresh import statement for this spec, newline-terminated.
    pub fn to_statement(&self, quote: char) -> String {
        format!(
            "import {}{{ {} }} from {quote}{}{quote};\n",
            if self.type_only { "type " } else { "" },
            self.names.join(", "),
            self.module,
        )
    }
}

fn statement_regex(module: &str) -> Regex {
    let pattern = format!(
        r#"(?m)^import\s+(type\s+)?(\{{[^}}]*\}})\s*from\s*(['"]){}['"]"#,
        regex::escape(module)
    );
    Regex::new(&pattern).expect("escaped module path always forms a valid regex")
}

/// The name an import entry binds locally: `a as b` → `b`, `type T` → `T`.
fn local_binding(entry: &str) -> &str {
    let entry = entry.trim();
    let entry = entry.strip_prefix("type ").unwrap_or(entry).trim();
    match entry.rsplit_once(" as ") {
        Some((_, alias)) => alias.trim(),
        None => entry,
    }
}

fn parse_entries(braced: &str) -> Vec<&str> {
    braced
        .trim_start_matches('{')
        .trim_end_matches('}')
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect()
}

fn render_list(braced: &str, entries: &[String]) -> String {
    if braced.contains('\n') {
        let indent = braced
            .lines()
            .skip(1)
            .find(|l| !l.trim().is_empty() && l.trim() != "}")
            .map(|l| &l[..l.len() - l.trim_start().len()])
            .unwrap_or("  ");
        let mut out = String::from("{\n");
        for entry in entries {
            out.push_str(indent);
            out.push_str(entry);
            out.push_str(",\n");
        }
        out.push('}');
        out
    } else {
        format!("{{ {} }}", entries.join(", "))
    }
}

fn quote_style(text: &str) -> char {
    AfterFirstImport
        .locate(text)
        .and_then(|end| {
            text[..end]
                .rfind(|c: char| c == '\'' || c == '"')
                .map(|i| text.as_bytes()[i] as char)
        })
        .unwrap_or('\'')
}

/// Plan the edit that makes every name in `spec` importable, or `None` when
/// all names are already imported from that module.
pub fn plan_import(text: &str, spec: &ImportSpec) -> Option<Edit> {
    let re = statement_regex(&spec.module);

    for caps in re.captures_iter(text) {
        let is_type_import = caps.get(1).is_some();
        // A value import cannot be merged into `import type { ... }`.
        if is_type_import && !spec.type_only {
            continue;
        }

        let Some(list) = caps.get(2) else {
            continue;
        };
        let existing = parse_entries(list.as_str());
        let missing: Vec<&String> = spec
            .names
            .iter()
            .filter(|name| !existing.iter().any(|e| local_binding(e) == name.as_str()))
            .collect();

        if missing.is_empty() {
            return None;
        }

        // Type names joining a value import keep an inline `type` modifier.
        let modifier = if spec.type_only && !is_type_import { "type " } else { "" };
        let mut merged: Vec<String> = existing.iter().map(|s| s.to_string()).collect();
        merged.extend(missing.into_iter().map(|name| format!("{modifier}{name}")));
        return Some(Edit::replace(
            list.start(),
            list.end(),
            render_list(list.as_str(), &merged),
            list.as_str(),
        ));
    }

    let statement = spec.to_statement(quote_style(text));

    match AfterFirstImport.locate(text) {
        Some(offset) => {
            let lead = if text[..offset].ends_with('\n') { "" } else { "\n" };
            Some(Edit::insert(offset, format!("{lead}{statement}")))
        }
        None => {
            let trail = if text.is_empty() || text.starts_with('\n') {
                ""
            } else {
                "\n"
            };
            Some(Edit::insert(0, format!("{statement}{trail}")))
        }
    }
}
