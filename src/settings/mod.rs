//! Settings loading
//!
//! Every `*.yaml`/`*.yml` file in the settings directory becomes one
//! namespace of a single tree, keyed by file stem:
//!
//! - `system.yaml` -> `system` (persona, debug and reload flags)
//! - `models.yaml` -> `models` (default selection and model library)
//! - `storage.yaml` -> `storage` (storage enable flag)
//!
//! Any other file is kept as a raw namespace for collaborators.
//!
//! A load produces an immutable [`SettingsSnapshot`]. Reloading builds a
//! complete new snapshot and swaps it in; holders of the old `Arc` keep
//! seeing the old values.

use indexmap::IndexMap;
use serde_yaml::Value;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use crate::error::{Error, Result};

pub mod models;
pub mod storage;
pub mod system;

use models::ModelLibrary;
use storage::StorageSettings;
use system::SystemSettings;

/// One fully parsed, read-only view of the settings directory
#[derive(Debug, Clone, Default)]
pub struct SettingsSnapshot {
    /// Raw tree, one namespace per source file
    pub namespaces: IndexMap<String, Value>,
    pub system: SystemSettings,
    pub models: ModelLibrary,
    pub storage: StorageSettings,
}

impl SettingsSnapshot {
    /// Load every source in `dir`. A missing directory yields defaults.
    pub fn load(dir: &Path) -> Result<Self> {
        let mut namespaces = IndexMap::new();

        if !dir.exists() {
            log::warn!("Settings directory {} not found, using defaults", dir.display());
            return Self::from_namespaces(namespaces);
        }

        let mut paths = Vec::new();
        for entry in fs::read_dir(dir).map_err(|e| Error::io(dir, e))? {
            let path = entry.map_err(|e| Error::io(dir, e))?.path();
            if path.is_file() && is_yaml(&path) {
                paths.push(path);
            }
        }
        paths.sort();

        for path in paths {
            let name = path
                .file_stem()
                .map(|s| s.to_string_lossy().to_string())
                .unwrap_or_default();
            let source_id = format!("settings/{}", name);

            let content = fs::read_to_string(&path).map_err(|e| Error::io(&path, e))?;
            let value = parse_source(&source_id, &content)?;

            if namespaces.insert(name, value).is_some() {
                return Err(Error::configuration(source_id, "namespace defined by more than one file"));
            }
            log::debug!("Loaded settings source {}", path.display());
        }

        Self::from_namespaces(namespaces)
    }

    /// Build the typed views from an already loaded tree
    pub fn from_namespaces(namespaces: IndexMap<String, Value>) -> Result<Self> {
        let view = |name: &str| namespaces.get(name).cloned().unwrap_or(Value::Null);

        let system = match view("system") {
            Value::Null => SystemSettings::default(),
            value => SystemSettings::from_value(value)?,
        };
        let models = match view("models") {
            Value::Null => ModelLibrary::default(),
            value => ModelLibrary::from_value(value)?,
        };
        let storage = match view("storage") {
            Value::Null => StorageSettings::default(),
            value => StorageSettings::from_value(value)?,
        };

        Ok(Self {
            namespaces,
            system,
            models,
            storage,
        })
    }

    pub fn namespace(&self, name: &str) -> Option<&Value> {
        self.namespaces.get(name)
    }

    /// Look up a dotted path such as `system.persona.name`
    pub fn get(&self, dotted: &str) -> Option<&Value> {
        let mut parts = dotted.split('.');
        let mut current = self.namespaces.get(parts.next()?)?;
        for part in parts {
            current = current.as_mapping()?.get(part)?;
        }
        Some(current)
    }
}

fn is_yaml(path: &Path) -> bool {
    path.extension().map(|e| e == "yaml" || e == "yml").unwrap_or(false)
}

/// Parse one source; its top level must be a mapping (or empty)
pub(crate) fn parse_source(source_id: &str, content: &str) -> Result<Value> {
    let value: Value = serde_yaml::from_str(content).map_err(|e| Error::configuration(source_id, e.to_string()))?;
    match value {
        Value::Null => Ok(Value::Mapping(Default::default())),
        Value::Mapping(_) => Ok(value),
        _ => Err(Error::configuration(source_id, "top level must be a mapping")),
    }
}

/// Shared access to the current settings snapshot
#[derive(Debug)]
pub struct SettingsStore {
    dir: PathBuf,
    current: RwLock<Arc<SettingsSnapshot>>,
}

impl SettingsStore {
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        let snapshot = SettingsSnapshot::load(&dir)?;
        log::info!(
            "Loaded settings from {} ({} namespaces)",
            dir.display(),
            snapshot.namespaces.len()
        );
        Ok(Self {
            dir,
            current: RwLock::new(Arc::new(snapshot)),
        })
    }

    /// Wrap an in-memory snapshot; `reload` will read from `dir`
    pub fn from_snapshot(dir: impl Into<PathBuf>, snapshot: SettingsSnapshot) -> Self {
        Self {
            dir: dir.into(),
            current: RwLock::new(Arc::new(snapshot)),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn snapshot(&self) -> Arc<SettingsSnapshot> {
        let guard = self.current.read().unwrap_or_else(|poisoned| poisoned.into_inner());
        Arc::clone(&guard)
    }

    /// Re-read the directory. On failure the current snapshot stays in place.
    pub fn reload(&self) -> Result<Arc<SettingsSnapshot>> {
        let fresh = Arc::new(SettingsSnapshot::load(&self.dir)?);
        let mut guard = self.current.write().unwrap_or_else(|poisoned| poisoned.into_inner());
        *guard = Arc::clone(&fresh);
        log::debug!("Reloaded settings from {}", self.dir.display());
        Ok(fresh)
    }
}
