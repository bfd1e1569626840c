//! Environment configuration: one document per environment plus a route table
//!
//! ```text
//! config/
//! ├── dev.json      { "baseUrl": "...", "env": { "api_key": "..." } }
//! ├── staging.json
//! └── routes.json   { "v2": { "pet": "/pet" } }
//! ```

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

/// Environment used when no identifier is given.
pub const DEFAULT_ENVIRONMENT: &str = "dev";

/// File name of the route table inside the config directory.
pub const ROUTES_FILE: &str = "routes.json";

/// Route of the pet resource in the route table.
pub const PET_ROUTE: &str = "v2.pet";

/// Credentials and free-form per-environment values (`env` section).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnvSection {
    pub api_key: String,

    /// Everything else under `env`, e.g. `user_1`; any JSON value, carried as-is
    #[serde(flatten)]
    pub extra: HashMap<String, serde_json::Value>,
}

/// One environment document as stored on disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnvironmentDocument {
    pub base_url: String,
    pub env: EnvSection,
}

/// Logical resource name → path segment, flattened from nested JSON.
///
/// `{"v2": {"pet": "/pet"}}` is addressed as `v2.pet`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RouteTable {
    routes: BTreeMap<String, String>,
}

impl RouteTable {
    /// Build a route table from a (possibly nested) JSON object.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Parse` if a leaf is not a string.
    pub fn from_json(value: &serde_json::Value) -> Result<Self, ConfigError> {
        let mut routes = BTreeMap::new();
        flatten_routes("", value, &mut routes)?;
        Ok(Self { routes })
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.routes.get(name).map(String::as_str)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.routes.keys().map(String::as_str)
    }
}

fn flatten_routes(
    prefix: &str,
    value: &serde_json::Value,
    out: &mut BTreeMap<String, String>,
) -> Result<(), ConfigError> {
    match value {
        serde_json::Value::Object(obj) => {
            for (k, v) in obj {
                let key = if prefix.is_empty() {
                    k.clone()
                } else {
                    format!("{prefix}.{k}")
                };
                flatten_routes(&key, v, out)?;
            }
            Ok(())
        }
        serde_json::Value::String(path) => {
            out.insert(prefix.to_string(), path.clone());
            Ok(())
        }
        other => Err(ConfigError::Parse(format!(
            "route '{prefix}' must be a string, got {other}"
        ))),
    }
}

/// Fully resolved environment: identifier, document and routes.
///
/// Resolved once per run and shared read-only afterwards.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnvironmentConfig {
    pub name: String,
    pub base_url: String,
    pub api_key: String,
    pub extra: HashMap<String, serde_json::Value>,
    pub routes: RouteTable,
}

impl EnvironmentConfig {
    /// Absolute URL of a logical resource, e.g. `v2.pet` → `https://host/v2/pet`.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::MissingRoute` if the route is not in the table.
    pub fn resource_url(&self, route: &str) -> Result<String, ConfigError> {
        let path = self
            .routes
            .get(route)
            .ok_or_else(|| ConfigError::MissingRoute(route.to_string()))?;
        Ok(format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        ))
    }
}

/// Reads environment documents from a config directory.
#[derive(Debug, Clone)]
pub struct ConfigResolver {
    dir: PathBuf,
}

impl ConfigResolver {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Resolve an environment identifier (default: `dev`) to its configuration.
    ///
    /// `<env>.json` is preferred, `<env>.toml` is accepted as an alternative.
    ///
    /// # Errors
    ///
    /// `NotFound` if no document exists for the identifier, `Io`/`Parse` if a
    /// document exists but cannot be read.
    pub fn resolve(&self, env: Option<&str>) -> Result<EnvironmentConfig, ConfigError> {
        let name = env
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or(DEFAULT_ENVIRONMENT);

        let document = self.load_document(name)?;
        let routes = self.load_routes()?;

        Ok(EnvironmentConfig {
            name: name.to_string(),
            base_url: document.base_url,
            api_key: document.env.api_key,
            extra: document.env.extra,
            routes,
        })
    }

    /// Identifiers of every environment document in the directory.
    pub fn available(&self) -> Vec<String> {
        let Ok(entries) = std::fs::read_dir(&self.dir) else {
            return Vec::new();
        };
        let mut names: Vec<String> = entries
            .filter_map(Result::ok)
            .map(|e| e.path())
            .filter(|p| {
                p.extension()
                    .is_some_and(|ext| ext == "json" || ext == "toml")
            })
            .filter(|p| p.file_name().is_some_and(|n| n != ROUTES_FILE))
            .filter_map(|p| p.file_stem().map(|s| s.to_string_lossy().into_owned()))
            .collect();
        names.sort();
        names.dedup();
        names
    }

    fn load_document(&self, name: &str) -> Result<EnvironmentDocument, ConfigError> {
        let json_path = self.dir.join(format!("{name}.json"));
        let toml_path = self.dir.join(format!("{name}.toml"));

        if json_path.exists() {
            let content = read(&json_path)?;
            serde_json::from_str(&content)
                .map_err(|e| ConfigError::Parse(format!("{}: {e}", json_path.display())))
        } else if toml_path.exists() {
            let content = read(&toml_path)?;
            toml::from_str(&content)
                .map_err(|e| ConfigError::Parse(format!("{}: {e}", toml_path.display())))
        } else {
            Err(ConfigError::NotFound {
                env: name.to_string(),
                dir: self.dir.clone(),
            })
        }
    }

    fn load_routes(&self) -> Result<RouteTable, ConfigError> {
        let path = self.dir.join(ROUTES_FILE);
        let content = read(&path)?;
        let value: serde_json::Value = serde_json::from_str(&content)
            .map_err(|e| ConfigError::Parse(format!("{}: {e}", path.display())))?;
        RouteTable::from_json(&value)
    }

    /// Example `dev.json` written by `petcontract init`.
    pub fn example_environment() -> &'static str {
        r#"{
  "baseUrl": "https://petstore.swagger.io/v2",
  "env": {
    "api_key": "special-key",
    "user_1": "development user"
  }
}
"#
    }

    /// Example `routes.json` written by `petcontract init`.
    pub fn example_routes() -> &'static str {
        r#"{
  "v2": {
    "pet": "/pet"
  }
}
"#
    }
}

fn read(path: &Path) -> Result<String, ConfigError> {
    std::fs::read_to_string(path).map_err(|e| ConfigError::Io(path.to_path_buf(), e.to_string()))
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("No configuration for environment '{env}' in {}", dir.display())]
    NotFound { env: String, dir: PathBuf },
    #[error("Cannot read {0}: {1}")]
    Io(PathBuf, String),
    #[error("Parse error: {0}")]
    Parse(String),
    #[error("Route '{0}' not in route table")]
    MissingRoute(String),
}
