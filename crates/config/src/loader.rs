//! Cached loading of configuration files (TOML, YAML, JSON).

use std::{
    collections::HashMap,
    path::{Path, PathBuf},
    sync::{PoisonError, RwLock},
};

use {serde_json::Value, tracing::debug, trellis_service_traits::NamespaceMap};

use crate::{
    env_subst::substitute_env,
    error::{ConfigError, Result},
};

/// Loads configuration files and caches parsed results by path.
///
/// The cache lets one resolution pass read the same file repeatedly for
/// free; it is also why the reload coordinator must [`FileLoader::evict`]
/// every candidate path before re-resolving — the watcher knows the file
/// changed, the cache does not.
#[derive(Default)]
pub struct FileLoader {
    cache: RwLock<HashMap<PathBuf, NamespaceMap>>,
}

impl FileLoader {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Load and parse `path`. The document root must be a table; its keys
    /// are the configuration namespaces.
    pub fn load(&self, path: &Path) -> Result<NamespaceMap> {
        if let Some(cached) = self
            .cache
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(path)
        {
            return Ok(cached.clone());
        }

        let parsed = parse_file(path)?;
        self.cache
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(path.to_path_buf(), parsed.clone());
        Ok(parsed)
    }

    /// Like [`FileLoader::load`], but a missing file is an empty config.
    pub fn load_or_empty(&self, path: &Path) -> Result<NamespaceMap> {
        if path.exists() {
            self.load(path)
        } else {
            Ok(NamespaceMap::new())
        }
    }

    /// Drop the cached parse of `path` so the next load reflects disk.
    pub fn evict(&self, path: &Path) {
        self.cache
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(path);
    }
}

fn parse_file(path: &Path) -> Result<NamespaceMap> {
    let file_error = |reason: String| ConfigError::File {
        path: path.to_path_buf(),
        reason,
    };

    let raw = std::fs::read_to_string(path).map_err(|e| file_error(e.to_string()))?;
    let raw = substitute_env(&raw);

    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
    let value: Value = match ext {
        "toml" => {
            let v: toml::Value = toml::from_str(&raw).map_err(|e| file_error(e.to_string()))?;
            serde_json::to_value(v).map_err(|e| file_error(e.to_string()))?
        },
        "yaml" | "yml" => {
            let v: serde_yaml::Value =
                serde_yaml::from_str(&raw).map_err(|e| file_error(e.to_string()))?;
            serde_json::to_value(v).map_err(|e| file_error(e.to_string()))?
        },
        "json" => serde_json::from_str(&raw).map_err(|e| file_error(e.to_string()))?,
        _ => return Err(file_error(format!("unsupported config format: .{ext}"))),
    };

    match value {
        Value::Object(map) => {
            debug!(path = %path.display(), namespaces = map.len(), "loaded config file");
            Ok(map)
        },
        // An empty YAML document parses to null; treat it as an empty config.
        Value::Null => Ok(NamespaceMap::new()),
        _ => Err(file_error("config root must be a table".into())),
    }
}

// ── Tests ───────────────────────────────────────────────────────────────────
