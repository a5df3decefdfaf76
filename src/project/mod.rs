//! Project layout: where collaborator files live and where new files go.
//!
//! Resolution order is built-in defaults, then `stackgen.toml` at the project
//! root (or an explicit `--config` file), then per-command path overrides.

pub mod loader;
pub mod schema;

pub use loader::{load_from_path, load_from_str, ConfigError, ConfigOrigin};
pub use schema::{ConfigFile, PathSettings, ShardSettings, ValidationError, ValidationIssue};

use crate::naming::Identifier;
use std::path::{Component, Path, PathBuf};

/// Name of the optional config file looked up at the project root.
pub const CONFIG_FILE_NAME: &str = "stackgen.toml";

/// Per-command path overrides from the command line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathOverrides {
    pub routes: Option<PathBuf>,
    pub schemas: Option<PathBuf>,
    pub user_shard: Option<PathBuf>,
}

/// Every path the generators read or write, threaded explicitly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectConfig {
    root: PathBuf,
    pub paths: PathSettings,
    pub shard: ShardSettings,
}

impl ProjectConfig {
    /// Defaults only; no config file is read.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self::from_file(root, ConfigFile::default())
    }

    pub fn from_file(root: impl Into<PathBuf>, file: ConfigFile) -> Self {
        Self {
            root: root.into(),
            paths: file.paths,
            shard: file.shard,
        }
    }

    /// Load `config` if given, else `<root>/stackgen.toml` if it exists, else
    /// defaults. An explicit config path that cannot be read is an error.
    pub fn load(root: impl Into<PathBuf>, config: Option<&Path>) -> Result<Self, ConfigError> {
        let root = root.into();
        let file = match config {
            Some(path) => Some(load_from_path(path)?),
            None => {
                let default_path = root.join(CONFIG_FILE_NAME);
                if default_path.is_file() {
                    tracing::debug!(path = %default_path.display(), "loading project config");
                    Some(load_from_path(&default_path)?)
                } else {
                    None
                }
            }
        };
        Ok(Self::from_file(root, file.unwrap_or_default()))
    }

    pub fn with_overrides(mut self, overrides: PathOverrides) -> Self {
        if let Some(routes) = overrides.routes {
            self.paths.routes = routes;
        }
        if let Some(schemas) = overrides.schemas {
            self.paths.schemas = schemas;
        }
        if let Some(user_shard) = overrides.user_shard {
            self.paths.user_shard = user_shard;
        }
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        }
    }

    pub fn vite_config(&self) -> PathBuf {
        self.resolve(&self.paths.vite_config)
    }

    pub fn routes(&self) -> PathBuf {
        self.resolve(&self.paths.routes)
    }

    pub fn schemas(&self) -> PathBuf {
        self.resolve(&self.paths.schemas)
    }

    pub fn user_shard(&self) -> PathBuf {
        self.resolve(&self.paths.user_shard)
    }

    pub fn client_dir(&self) -> PathBuf {
        self.resolve(&self.paths.client_dir)
    }

    pub fn api_dir(&self) -> PathBuf {
        self.resolve(&self.paths.api_dir)
    }

    pub fn webhooks_dir(&self) -> PathBuf {
        self.resolve(&self.paths.webhooks_dir)
    }

    /// `<client_dir>/<kebab>`
    pub fn page_dir(&self, id: &Identifier) -> PathBuf {
        self.client_dir().join(id.kebab())
    }

    /// `<api_dir>/<kebab>.ts`
    pub fn api_module(&self, id: &Identifier) -> PathBuf {
        self.api_dir().join(format!("{}.ts", id.kebab()))
    }

    /// `<webhooks_dir>/<kebab>.ts`
    pub fn webhook_module(&self, id: &Identifier) -> PathBuf {
        self.webhooks_dir().join(format!("{}.ts", id.kebab()))
    }

    /// Path of a page's HTML entry as written in the vite input mapping:
    /// relative to the vite config's directory, `/`-separated.
    pub fn vite_entry_path(&self, id: &Identifier) -> String {
        let html = self.page_dir(id).join("index.html");
        let base = parent_dir(&self.vite_config());
        to_slash(&relative_path(&base, &html))
    }
}

/// ES module specifier that imports `to` from a file at `from`.
///
/// The extension is dropped and same-directory or child paths get a `./`
/// prefix: `src/server/index.ts` → `src/server/api/feed.ts` is `./api/feed`.
pub fn module_specifier(from: &Path, to: &Path) -> String {
    let rel = relative_path(&parent_dir(from), &to.with_extension(""));
    let spec = to_slash(&rel);
    if spec.starts_with("../") {
        spec
    } else {
        format!("./{spec}")
    }
}

fn parent_dir(file: &Path) -> PathBuf {
    file.parent().map(Path::to_path_buf).unwrap_or_default()
}

fn to_slash(path: &Path) -> String {
    path.components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect::<Vec<String>>()
        .join("/")
}

/// Lexical `.`/`..` resolution. Nothing is read from disk, so paths that do
/// not exist yet resolve too.
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// Path of `to` relative to directory `from`.
fn relative_path(from: &Path, to: &Path) -> PathBuf {
    let from = normalize(from);
    let to = normalize(to);
    let from: Vec<Component<'_>> = from.components().collect();
    let to: Vec<Component<'_>> = to.components().collect();

    let common = from
        .iter()
        .zip(to.iter())
        .take_while(|(a, b)| a == b)
        .count();

    let mut rel = PathBuf::new();
    for _ in common..from.len() {
        rel.push("..");
    }
    for component in &to[common..] {
        rel.push(component.as_os_str());
    }
    rel
}
