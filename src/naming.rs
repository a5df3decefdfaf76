//! Identifier validation and case transforms.
//!
//! Every generated name in a run is derived from one kebab-case identifier
//! supplied on the command line. [`Identifier::parse`] validates it once and
//! computes the PascalCase, camelCase and SCREAMING_SNAKE_CASE forms up front;
//! the forms are never re-derived for the remainder of the run.

use regex::Regex;
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;
use thiserror::Error;

static SHAPE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z][a-z0-9-]*$").expect("identifier shape regex"));

static SEGMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z0-9]+$").expect("segment regex"));

/// Names that cannot be used as identifiers.
///
/// JavaScript/TypeScript reserved words plus names that are structurally
/// special in the generated project (`index` pages, `default` exports,
/// object prototype members, the Hono `app` binding and the `/api` prefix).
pub const RESERVED_WORDS: &[&str] = &[
    "abstract",
    "any",
    "api",
    "app",
    "arguments",
    "as",
    "async",
    "await",
    "boolean",
    "break",
    "case",
    "catch",
    "class",
    "const",
    "constructor",
    "continue",
    "debugger",
    "declare",
    "default",
    "delete",
    "do",
    "else",
    "enum",
    "eval",
    "export",
    "extends",
    "false",
    "finally",
    "for",
    "from",
    "function",
    "get",
    "if",
    "implements",
    "import",
    "in",
    "index",
    "instanceof",
    "interface",
    "let",
    "module",
    "namespace",
    "never",
    "new",
    "null",
    "number",
    "object",
    "of",
    "package",
    "private",
    "protected",
    "prototype",
    "public",
    "readonly",
    "require",
    "return",
    "set",
    "static",
    "string",
    "super",
    "switch",
    "symbol",
    "this",
    "throw",
    "true",
    "try",
    "type",
    "typeof",
    "undefined",
    "unknown",
    "var",
    "void",
    "while",
    "with",
    "yield",
];

/// PascalCase names the generated modules import themselves.
const SHADOWED_IMPORTS: &[&str] = &["Context", "DurableObject", "Hono"];

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("name cannot be empty")]
    Empty,

    #[error("name '{0}' cannot contain whitespace")]
    ContainsWhitespace(String),

    #[error(
        "name '{0}' must start with a lowercase letter and contain only lowercase letters, digits and hyphens"
    )]
    InvalidShape(String),

    #[error("name '{0}' cannot contain consecutive hyphens")]
    ConsecutiveHyphens(String),

    #[error("name '{0}' cannot start or end with a hyphen")]
    EdgeHyphen(String),

    #[error("name '{0}' is a reserved word")]
    Reserved(String),

    #[error("name '{0}' has no segments between its hyphens")]
    NoSegments(String),

    #[error("segment '{segment}' of '{name}' may only contain lowercase letters and digits")]
    InvalidSegment { name: String, segment: String },

    #[error("name '{name}' would generate '{pascal}', which shadows an import in generated code")]
    ShadowsImport { name: String, pascal: String },
}

/// Split a kebab-case name into validated segments.
fn segments(name: &str) -> Result<Vec<&str>, ValidationError> {
    let parts: Vec<&str> = name.split('-').filter(|s| !s.is_empty()).collect();
    if parts.is_empty() {
        return Err(ValidationError::NoSegments(name.to_string()));
    }
    if let Some(bad) = parts.iter().find(|s| !SEGMENT.is_match(s)) {
        return Err(ValidationError::InvalidSegment {
            name: name.to_string(),
            segment: bad.to_string(),
        });
    }
    Ok(parts)
}

fn capitalize(segment: &str) -> String {
    let mut chars = segment.chars();
    match chars.next() {
        None => String::new(),
        Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
    }
}

/// `user-profile` → `UserProfile`
pub fn to_pascal_case(name: &str) -> Result<String, ValidationError> {
    Ok(segments(name)?.into_iter().map(capitalize).collect())
}

/// `user-profile` → `userProfile`
pub fn to_camel_case(name: &str) -> Result<String, ValidationError> {
    let parts = segments(name)?;
    let mut out = parts[0].to_string();
    for part in &parts[1..] {
        out.push_str(&capitalize(part));
    }
    Ok(out)
}

/// `user-profile` → `USER_PROFILE`
///
/// Performs no validation; only call on names that already passed
/// [`validate`].
pub fn to_screaming_snake_case(name: &str) -> String {
    name.to_ascii_uppercase().replace('-', "_")
}

/// Run every naming rule against a raw candidate, stopping at the first failure.
pub fn validate(raw: &str) -> Result<(), ValidationError> {
    if raw.is_empty() {
        return Err(ValidationError::Empty);
    }
    if raw.chars().any(char::is_whitespace) {
        return Err(ValidationError::ContainsWhitespace(raw.to_string()));
    }
    if !SHAPE.is_match(raw) {
        return Err(ValidationError::InvalidShape(raw.to_string()));
    }
    if raw.contains("--") {
        return Err(ValidationError::ConsecutiveHyphens(raw.to_string()));
    }
    if raw.starts_with('-') || raw.ends_with('-') {
        return Err(ValidationError::EdgeHyphen(raw.to_string()));
    }
    if RESERVED_WORDS.contains(&raw) {
        return Err(ValidationError::Reserved(raw.to_string()));
    }

    let pascal = to_pascal_case(raw)?;
    to_camel_case(raw)?;

    if SHADOWED_IMPORTS.contains(&pascal.as_str()) {
        return Err(ValidationError::ShadowsImport {
            name: raw.to_string(),
            pascal,
        });
    }

    Ok(())
}

/// A validated kebab-case name and its derived forms.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Identifier {
    raw: String,
    pascal: String,
    camel: String,
    screaming: String,
}

impl Identifier {
    pub fn parse(raw: &str) -> Result<Self, ValidationError> {
        validate(raw)?;
        Ok(Self {
            raw: raw.to_string(),
            pascal: to_pascal_case(raw)?,
            camel: to_camel_case(raw)?,
            screaming: to_screaming_snake_case(raw),
        })
    }

    /// The kebab-case form as typed by the user.
    pub fn kebab(&self) -> &str {
        &self.raw
    }

    pub fn pascal(&self) -> &str {
        &self.pascal
    }

    pub fn camel(&self) -> &str {
        &self.camel
    }

    pub fn screaming_snake(&self) -> &str {
        &self.screaming
    }

    /// `user-profile` → `user_profile`, used for SQL table names.
    pub fn snake(&self) -> String {
        self.raw.replace('-', "_")
    }
}

impl FromStr for Identifier {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Identifier::parse(s)
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}
