//! Anchor strategies: "find the insertion point in this text".
//!
//! Each strategy is a regex over a conventional file shape. They are kept
//! behind [`AnchorStrategy`] so the splicing code never depends on how an
//! offset was found.

use regex::Regex;
use std::sync::LazyLock;

/// Locates a byte offset in file text where a fragment should be spliced in.
pub trait AnchorStrategy {
    /// Human-readable name used in warnings and logs.
    fn name(&self) -> &'static str;

    /// Returns the insertion offset, or `None` when the anchor is absent.
    fn locate(&self, text: &str) -> Option<usize>;
}

// `input: { ... }` with no nested braces inside the mapping.
static INPUT_MAPPING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\binput\s*:\s*\{[^{}]*\}").expect("input mapping regex"));

// `app.get('*', ...)`, `app.all('/*', ...)`, `app.notFound(...)`. Middleware
// registered with `app.use('*', ...)` runs before routes and is not a fallback.
static CATCH_ALL_ROUTE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?m)^[ \t]*\w+\.(?:(?:get|all)\(\s*['"`]/?\*['"`]|notFound\()"#,
    )
    .expect("catch-all route regex")
});

static DEFAULT_EXPORT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^[ \t]*export\s+default\b").expect("default export regex"));

static CLASS_DECL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^[ \t]*(?:export\s+)?(?:default\s+)?(?:abstract\s+)?class\s+\w+")
        .expect("class declaration regex")
});

// One whole import statement, including multi-line `{ ... }` lists.
static IMPORT_STATEMENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?m)^import\s[^;'"]*?['"][^'"\n]+['"][ \t]*;?[^\n]*\n?"#)
        .expect("import statement regex")
});

/// Offset of the first byte of the line containing `offset`.
pub fn line_start(text: &str, offset: usize) -> usize {
    text[..offset].rfind('\n').map_or(0, |i| i + 1)
}

/// Leading whitespace of the line containing `offset`.
pub fn line_indent(text: &str, offset: usize) -> &str {
    let start = line_start(text, offset);
    let line = &text[start..];
    let end = line
        .find(|c: char| c != ' ' && c != '\t')
        .unwrap_or(line.len());
    &line[..end]
}

/// True when only whitespace precedes `offset` on its line.
pub fn starts_line(text: &str, offset: usize) -> bool {
    text[line_start(text, offset)..offset].trim().is_empty()
}

/// The closing brace of the `input: { ... }` mapping literal.
///
/// Returns the offset of the `}` itself; the config patcher decides whether
/// the entry goes on its own line or inline.
#[derive(Debug, Clone, Copy, Default)]
pub struct MappingLiteralClose;

impl AnchorStrategy for MappingLiteralClose {
    fn name(&self) -> &'static str {
        "input mapping literal"
    }

    fn locate(&self, text: &str) -> Option<usize> {
        INPUT_MAPPING.find(text).map(|m| m.end() - 1)
    }
}

/// The last catch-all route registration.
///
/// When several registrations look like catch-alls, the last one wins so new
/// routes land before the terminal fallback.
#[derive(Debug, Clone, Copy, Default)]
pub struct CatchAllRoute;

impl AnchorStrategy for CatchAllRoute {
    fn name(&self) -> &'static str {
        "catch-all route"
    }

    fn locate(&self, text: &str) -> Option<usize> {
        CATCH_ALL_ROUTE
            .find_iter(text)
            .last()
            .map(|m| line_start(text, m.start()))
    }
}

/// The last `export default` statement.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultExport;

impl AnchorStrategy for DefaultExport {
    fn name(&self) -> &'static str {
        "default export"
    }

    fn locate(&self, text: &str) -> Option<usize> {
        DEFAULT_EXPORT
            .find_iter(text)
            .last()
            .map(|m| line_start(text, m.start()))
    }
}

/// The brace that closes the body of the first class declaration.
///
/// Line start when the brace sits on its own line, otherwise the brace itself.
/// Unbalanced braces mean the class end is unknown, so nothing is located.
#[derive(Debug, Clone, Copy, Default)]
pub struct ClassClosingBrace;

impl AnchorStrategy for ClassClosingBrace {
    fn name(&self) -> &'static str {
        "class closing brace"
    }

    fn locate(&self, text: &str) -> Option<usize> {
        let decl = CLASS_DECL.find(text)?;
        let open = decl.end() + text[decl.end()..].find('{')?;
        let brace = matching_brace(text, open)?;
        if starts_line(text, brace) {
            Some(line_start(text, brace))
        } else {
            Some(brace)
        }
    }
}

/// Offset of the `}` that closes the `{` at `open`.
///
/// Braces inside string literals, template literals and comments are not
/// counted. Template substitutions (`${...}`) are skipped whole.
fn matching_brace(text: &str, open: usize) -> Option<usize> {
    let bytes = text.as_bytes();
    let mut depth = 0usize;
    let mut i = open;
    while i < bytes.len() {
        match bytes[i] {
            b'{' => depth += 1,
            b'}' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(i);
                }
            }
            quote @ (b'\'' | b'"' | b'`') => i = skip_string(bytes, i, quote)?,
            b'/' if bytes.get(i + 1) == Some(&b'/') => {
                i = text[i..].find('\n').map_or(bytes.len(), |n| i + n);
            }
            b'/' if bytes.get(i + 1) == Some(&b'*') => {
                i = i + 2 + text[i + 2..].find("*/")? + 1;
            }
            _ => {}
        }
        i += 1;
    }
    None
}

// Offset of the closing quote of the literal opened at `start`.
fn skip_string(bytes: &[u8], start: usize, quote: u8) -> Option<usize> {
    let mut i = start + 1;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 1,
            b'\n' if quote != b'`' => return None,
            c if c == quote => return Some(i),
            _ => {}
        }
        i += 1;
    }
    None
}

/// End of file. Always found.
#[derive(Debug, Clone, Copy, Default)]
pub struct EndOfFile;

impl AnchorStrategy for EndOfFile {
    fn name(&self) -> &'static str {
        "end of file"
    }

    fn locate(&self, text: &str) -> Option<usize> {
        Some(text.len())
    }
}

/// Just past the first import statement (including its newline).
#[derive(Debug, Clone, Copy, Default)]
pub struct AfterFirstImport;

impl AnchorStrategy for AfterFirstImport {
    fn name(&self) -> &'static str {
        "first import"
    }

    fn locate(&self, text: &str) -> Option<usize> {
        IMPORT_STATEMENT.find(text).map(|m| m.end())
    }
}
