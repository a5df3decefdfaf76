use crate::edit::Edit;
use crate::patch::anchor::{
    line_indent, line_start, starts_line, AnchorStrategy, CatchAllRoute, ClassClosingBrace,
    DefaultExport, EndOfFile, MappingLiteralClose,
};
use crate::patch::imports::{plan_import, ImportSpec};
use std::fmt;
use std::path::PathBuf;

/// Preamble for a schema file created from scratch.
pub const SCHEMA_PREAMBLE: &str = "import { z } from 'zod';\n";

/// The four kinds of pre-existing files the generator wires code into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CollaboratorKind {
    /// Vite config holding the multi-page `input: { ... }` mapping.
    ViteConfig,
    /// Server entry registering Hono routes.
    Routes,
    /// Shared zod schema module.
    Schema,
    /// Per-user shard class backed by SQLite storage.
    UserShard,
}

/// What to do when the collaborator file does not exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MissingPolicy {
    Skip,
    CreateWith(&'static str),
}

impl CollaboratorKind {
    pub fn label(&self) -> &'static str {
        match self {
            CollaboratorKind::ViteConfig => "vite config",
            CollaboratorKind::Routes => "route file",
            CollaboratorKind::Schema => "schema file",
            CollaboratorKind::UserShard => "user shard",
        }
    }

    pub fn missing_policy(&self) -> MissingPolicy {
        match self {
            CollaboratorKind::Schema => MissingPolicy::CreateWith(SCHEMA_PREAMBLE),
            _ => MissingPolicy::Skip,
        }
    }

    /// Anchors tried in order; the first one found wins.
    pub fn anchors(&self) -> Vec<Box<dyn AnchorStrategy>> {
        match self {
            CollaboratorKind::ViteConfig => vec![Box::new(MappingLiteralClose)],
            CollaboratorKind::Routes => vec![Box::new(CatchAllRoute), Box::new(DefaultExport)],
            CollaboratorKind::Schema => vec![Box::new(EndOfFile)],
            CollaboratorKind::UserShard => vec![Box::new(ClassClosingBrace)],
        }
    }

    /// Anchor used when none of [`anchors`](Self::anchors) is found. Using it
    /// produces a warning.
    pub fn fallback(&self) -> Option<Box<dyn AnchorStrategy>> {
        match self {
            CollaboratorKind::Routes => Some(Box::new(EndOfFile)),
            _ => None,
        }
    }
}

impl fmt::Display for CollaboratorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One idempotent insertion: a fragment, the imports it needs, and the
/// markers whose presence means it was already applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InsertionTarget {
    pub file: PathBuf,
    pub kind: CollaboratorKind,
    /// Any of these substrings in the file means the target is already applied.
    pub markers: Vec<String>,
    pub imports: Vec<ImportSpec>,
    /// For [`CollaboratorKind::ViteConfig`] a single `key: value` entry with
    /// no trailing comma; otherwise a block of complete lines.
    pub fragment: String,
}

impl InsertionTarget {
    pub fn new(
        file: impl Into<PathBuf>,
        kind: CollaboratorKind,
        fragment: impl Into<String>,
    ) -> Self {
        Self {
            file: file.into(),
            kind,
            markers: Vec::new(),
            imports: Vec::new(),
            fragment: fragment.into(),
        }
    }

    pub fn marker(mut self, marker: impl Into<String>) -> Self {
        self.markers.push(marker.into());
        self
    }

    pub fn import(mut self, spec: ImportSpec) -> Self {
        self.imports.push(spec);
        self
    }

    /// Whether `text` already carries this target's output.
    pub fn is_present(&self, text: &str) -> bool {
        self.markers.iter().any(|m| text.contains(m.as_str()))
    }

    /// Plan the edits for this target against `text`. Pure.
    pub fn plan(&self, text: &str) -> PatchPlan {
        if self.is_present(text) {
            return PatchPlan::NoOp(format!(
                "{} already contains {}",
                self.kind,
                self.markers.first().map(String::as_str).unwrap_or("fragment")
            ));
        }

        let mut anchor_name = None;
        let mut offset = None;
        for strategy in self.kind.anchors() {
            if let Some(found) = strategy.locate(text) {
                tracing::debug!(
                    file = %self.file.display(),
                    anchor = strategy.name(),
                    offset = found,
                    "anchor located"
                );
                anchor_name = Some(strategy.name());
                offset = Some(found);
                break;
            }
        }

        let mut fell_back = None;
        if offset.is_none() {
            let primary = self
                .kind
                .anchors()
                .first()
                .map(|a| a.name())
                .unwrap_or("anchor");
            match self.kind.fallback() {
                Some(fallback) => {
                    offset = fallback.locate(text);
                    anchor_name = Some(fallback.name());
                    fell_back = Some(primary);
                }
                None => return PatchPlan::Unanchored { anchor: primary },
            }
        }

        let (Some(offset), Some(anchor)) = (offset, anchor_name) else {
            return PatchPlan::Unanchored { anchor: "anchor" };
        };

        let mut edits: Vec<Edit> = self
            .imports
            .iter()
            .filter_map(|spec| plan_import(text, spec))
            .collect();

        match self.kind {
            CollaboratorKind::ViteConfig => {
                edits.extend(mapping_entry_edits(text, offset, &self.fragment))
            }
            CollaboratorKind::UserShard => edits.push(class_member_edit(offset, &self.fragment)),
            _ if offset == text.len() => edits.push(append_edit(text, &self.fragment)),
            _ => edits.push(Edit::insert(offset, format!("{}\n", block(&self.fragment)))),
        }

        PatchPlan::Edits {
            edits,
            anchor,
            fell_back_from: fell_back,
        }
    }
}

/// Result of planning an [`InsertionTarget`] against a file's text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PatchPlan {
    /// Markers already present; nothing to do.
    NoOp(String),
    /// Edits to splice. `fell_back_from` names the anchor that was missing
    /// when the fallback anchor had to be used.
    Edits {
        edits: Vec<Edit>,
        anchor: &'static str,
        fell_back_from: Option<&'static str>,
    },
    /// No anchor and no fallback; the file must be left untouched.
    Unanchored { anchor: &'static str },
}

fn block(fragment: &str) -> String {
    let mut out = fragment.trim_end_matches('\n').to_string();
    out.push('\n');
    out
}

fn append_edit(text: &str, fragment: &str) -> Edit {
    let lead = if text.is_empty() || text.ends_with("\n\n") {
        ""
    } else if text.ends_with('\n') {
        "\n"
    } else {
        "\n\n"
    };
    Edit::insert(text.len(), format!("{lead}{}", block(fragment)))
}

// A one-line `class X {}` gets its body opened up the same way.
fn class_member_edit(offset: usize, fragment: &str) -> Edit {
    Edit::insert(offset, format!("\n{}", block(fragment)))
}

/// `line` up to any `//` comment that is not inside a string literal.
fn strip_line_comment(line: &str) -> &str {
    let mut quote = None;
    let mut escaped = false;
    for (i, c) in line.char_indices() {
        match quote {
            Some(_) if escaped => escaped = false,
            Some(_) if c == '\\' => escaped = true,
            Some(q) if c == q => quote = None,
            Some(_) => {}
            None if matches!(c, '\'' | '"' | '`') => quote = Some(c),
            None if line[i..].starts_with("//") => return &line[..i],
            None => {}
        }
    }
    line
}

// End offset of the last entry's code in `body`, skipping blank and
// comment-only lines and any trailing `//` comment.
fn last_entry_end(body: &str) -> Option<usize> {
    let mut end = body.len();
    loop {
        let begin = body[..end].rfind('\n').map_or(0, |i| i + 1);
        let code = strip_line_comment(&body[begin..end]).trim_end();
        if !code.trim_start().is_empty() {
            return Some(begin + code.len());
        }
        if begin == 0 {
            return None;
        }
        end = begin - 1;
    }
}

fn mapping_entry_edits(text: &str, close: usize, entry: &str) -> Vec<Edit> {
    let open = text[..close].rfind('{').unwrap_or(close);
    let body_start = (open + 1).min(close);
    let body = &text[body_start..close];
    let mut edits = Vec::new();

    if let Some(end) = last_entry_end(body) {
        if !body[..end].ends_with(',') {
            edits.push(Edit::insert(body_start + end, ","));
        }
    }

    if body.contains('\n') && starts_line(text, close) {
        let closing_indent = line_indent(text, close);
        let indent = body
            .lines()
            .skip(1)
            .find(|l| !l.trim().is_empty())
            .map(|l| l[..l.len() - l.trim_start().len()].to_string())
            .unwrap_or_else(|| format!("{closing_indent}  "));
        edits.push(Edit::insert(
            line_start(text, close),
            format!("{indent}{entry},\n"),
        ));
    } else {
        let lead = if body.ends_with(char::is_whitespace) { "" } else { " " };
        edits.push(Edit::insert(close, format!("{lead}{entry}, ")));
    }

    edits
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::edit::splice;

    fn apply(target: &InsertionTarget, text: &str) -> String {
        match target.plan(text) {
            PatchPlan::Edits { edits, .. } => splice(text, &edits).unwrap(),
            other => panic!("expected edits, got {other:?}"),
        }
    }

    #[test]
    fn test_vite_entry_multiline() {
        let text = "export default defineConfig({\n  build: {\n    rollupOptions: {\n      input: {\n        main: resolve(__dirname, 'index.html'),\n      },\n    },\n  },\n});\n";
        let target = InsertionTarget::new(
            "vite.config.ts",
            CollaboratorKind::ViteConfig,
            "'user-profile': resolve(__dirname, 'src/client/user-profile/index.html')",
        )
        .marker("'user-profile':");
        let out = apply(&target, text);
        assert!(out.contains(
            "        main: resolve(__dirname, 'index.html'),\n        'user-profile': resolve(__dirname, 'src/client/user-profile/index.html'),\n      },"
        ));
    }

    #[test]
    fn test_vite_entry_adds_missing_comma() {
        let text = "input: {\n  main: 'index.html'\n}\n";
        let target = InsertionTarget::new("v.ts", CollaboratorKind::ViteConfig, "feed: 'src/client/feed/index.html'");
        let out = apply(&target, text);
        assert_eq!(
            out,
            "input: {\n  main: 'index.html',\n  feed: 'src/client/feed/index.html',\n}\n"
        );
    }

    #[test]
    fn test_vite_entry_comma_goes_before_trailing_comment() {
        let text = "input: {\n  main: 'index.html' // main\n  // more pages below\n}\n";
        let target = InsertionTarget::new("v.ts", CollaboratorKind::ViteConfig, "feed: 'src/client/feed/index.html'");
        assert_eq!(
            apply(&target, text),
            "input: {\n  main: 'index.html', // main\n  // more pages below\n  feed: 'src/client/feed/index.html',\n}\n"
        );
    }

    #[test]
    fn test_strip_line_comment_respects_strings() {
        assert_eq!(strip_line_comment("  a: 'http://x' // b"), "  a: 'http://x' ");
        assert_eq!(strip_line_comment("  a: 'x', "), "  a: 'x', ");
        assert_eq!(strip_line_comment("// only"), "");
    }

    #[test]
    fn test_vite_entry_inline_mapping() {
        let text = "input: { main: 'index.html' }";
        let target = InsertionTarget::new("v.ts", CollaboratorKind::ViteConfig, "feed: 'f.html'");
        assert_eq!(apply(&target, text), "input: { main: 'index.html', feed: 'f.html', }");
    }

    #[test]
    fn test_vite_without_mapping_is_unanchored() {
        let target = InsertionTarget::new("v.ts", CollaboratorKind::ViteConfig, "feed: 'f.html'");
        assert_eq!(
            target.plan("export default defineConfig({});\n"),
            PatchPlan::Unanchored {
                anchor: "input mapping literal"
            }
        );
    }

    #[test]
    fn test_marker_makes_plan_noop() {
        let target = InsertionTarget::new("s.ts", CollaboratorKind::Schema, "x")
            .marker("const FeedItemSchema ");
        assert!(matches!(
            target.plan("export const FeedItemSchema = z.object({});\n"),
            PatchPlan::NoOp(_)
        ));
    }

    #[test]
    fn test_routes_fall_back_to_end_of_file() {
        let text = "import { Hono } from 'hono';\nconst app = new Hono();\n";
        let target = InsertionTarget::new("index.ts", CollaboratorKind::Routes, "app.get('/api/feed', h);");
        match target.plan(text) {
            PatchPlan::Edits {
                anchor,
                fell_back_from,
                ..
            } => {
                assert_eq!(anchor, "end of file");
                assert_eq!(fell_back_from, Some("catch-all route"));
            }
            other => panic!("unexpected plan {other:?}"),
        }
        assert_eq!(
            apply(&target, text),
            "import { Hono } from 'hono';\nconst app = new Hono();\n\napp.get('/api/feed', h);\n"
        );
    }

    #[test]
    fn test_routes_before_default_export() {
        let text = "const app = new Hono();\n\nexport default app;\n";
        let target = InsertionTarget::new("index.ts", CollaboratorKind::Routes, "app.get('/api/feed', h);\n");
        assert_eq!(
            apply(&target, text),
            "const app = new Hono();\n\napp.get('/api/feed', h);\n\nexport default app;\n"
        );
    }

    #[test]
    fn test_shard_member_before_closing_brace() {
        let text = "export class UserShard extends DurableObject {\n  ping() {\n    return 'pong';\n  }\n}\n";
        let target = InsertionTarget::new(
            "user-shard.ts",
            CollaboratorKind::UserShard,
            "  async getFeed() {\n    return [];\n  }",
        );
        assert_eq!(
            apply(&target, text),
            "export class UserShard extends DurableObject {\n  ping() {\n    return 'pong';\n  }\n\n  async getFeed() {\n    return [];\n  }\n}\n"
        );
    }

    #[test]
    fn test_schema_append_spacing() {
        let target = InsertionTarget::new("s.ts", CollaboratorKind::Schema, "export const A = 1;");
        assert_eq!(apply(&target, SCHEMA_PREAMBLE), "import { z } from 'zod';\n\nexport const A = 1;\n");
        assert_eq!(apply(&target, "x;"), "x;\n\nexport const A = 1;\n");
        assert_eq!(apply(&target, ""), "export const A = 1;\n");
    }
}
