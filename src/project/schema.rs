use regex::Regex;
use serde::Deserialize;
use std::fmt;
use std::path::PathBuf;
use std::sync::LazyLock;

static JS_IDENTIFIER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z_$][A-Za-z0-9_$]*$").expect("js identifier regex"));

/// Contents of `stackgen.toml`. Every table and key is optional.
#[derive(Debug, Deserialize, Default, Clone, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    #[serde(default)]
    pub paths: PathSettings,
    #[serde(default)]
    pub shard: ShardSettings,
}

/// Collaborator files and output directories, relative to the project root
/// unless absolute.
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct PathSettings {
    pub vite_config: PathBuf,
    pub routes: PathBuf,
    pub schemas: PathBuf,
    pub user_shard: PathBuf,
    pub client_dir: PathBuf,
    pub api_dir: PathBuf,
    pub webhooks_dir: PathBuf,
}

impl Default for PathSettings {
    fn default() -> Self {
        Self {
            vite_config: PathBuf::from("vite.config.ts"),
            routes: PathBuf::from("src/server/index.ts"),
            schemas: PathBuf::from("src/shared/schemas.ts"),
            user_shard: PathBuf::from("src/server/durable/user-shard.ts"),
            client_dir: PathBuf::from("src/client"),
            api_dir: PathBuf::from("src/server/api"),
            webhooks_dir: PathBuf::from("src/server/webhooks"),
        }
    }
}

/// How generated handlers reach the per-user shard.
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct ShardSettings {
    /// Exported class name in the shard file.
    pub class_name: String,
    /// Environment binding of the shard namespace.
    pub binding: String,
}

impl Default for ShardSettings {
    fn default() -> Self {
        Self {
            class_name: "UserShard".to_string(),
            binding: "USER_SHARD".to_string(),
        }
    }
}

impl ConfigFile {
    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut issues = Vec::new();

        let paths = [
            ("paths.vite_config", &self.paths.vite_config),
            ("paths.routes", &self.paths.routes),
            ("paths.schemas", &self.paths.schemas),
            ("paths.user_shard", &self.paths.user_shard),
            ("paths.client_dir", &self.paths.client_dir),
            ("paths.api_dir", &self.paths.api_dir),
            ("paths.webhooks_dir", &self.paths.webhooks_dir),
        ];
        for (field, path) in paths {
            if path.as_os_str().is_empty() {
                issues.push(ValidationIssue::EmptyPath { field });
            }
        }

        for (field, value) in [
            ("shard.class_name", &self.shard.class_name),
            ("shard.binding", &self.shard.binding),
        ] {
            if !JS_IDENTIFIER.is_match(value) {
                issues.push(ValidationIssue::NotAnIdentifier {
                    field,
                    value: value.clone(),
                });
            }
        }

        if issues.is_empty() {
            Ok(())
        } else {
            Err(ValidationError { issues })
        }
    }
}

#[derive(Debug, Clone)]
pub struct ValidationError {
    pub issues: Vec<ValidationIssue>,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, issue) in self.issues.iter().enumerate() {
            if idx > 0 {
                writeln!(f)?;
            }
            write!(f, "{issue}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationIssue {
    EmptyPath { field: &'static str },
    NotAnIdentifier { field: &'static str, value: String },
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationIssue::EmptyPath { field } => write!(f, "'{field}' must not be empty"),
            ValidationIssue::NotAnIdentifier { field, value } => {
                write!(f, "'{field}' = {value:?} is not a valid identifier")
            }
        }
    }
}
