//! Persona loading
//!
//! A persona is a named bag of reusable values (`personas/<name>.yaml`)
//! merged into the render context at the lowest precedence. Mapping-valued
//! top-level sections are flattened one level:
//!
//! ```yaml
//! name: Helper
//! static:
//!   tone: friendly
//!   expertise: cooking
//! ```
//!
//! yields `name`, `tone` and `expertise`.

use indexmap::IndexMap;
use serde_yaml::Value;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// A loaded persona
#[derive(Debug, Clone, PartialEq)]
pub struct Persona {
    pub name: String,
    pub fields: IndexMap<String, Value>,
}

impl Persona {
    /// Parse persona YAML. `name` is only used for error reporting and the record name.
    pub fn from_str(name: &str, content: &str) -> Result<Self> {
        let source_id = format!("personas/{}", name);
        let value: Value = serde_yaml::from_str(content).map_err(|e| Error::configuration(&source_id, e.to_string()))?;

        let mapping = match value {
            Value::Mapping(mapping) => mapping,
            Value::Null => Default::default(),
            _ => return Err(Error::configuration(source_id, "persona must be a mapping")),
        };

        let mut fields = IndexMap::new();
        for (key, value) in mapping {
            let key = key_string(&source_id, key)?;
            match value {
                Value::Mapping(section) => {
                    for (inner_key, inner_value) in section {
                        fields.insert(key_string(&source_id, inner_key)?, inner_value);
                    }
                }
                other => {
                    fields.insert(key, other);
                }
            }
        }

        Ok(Self {
            name: name.to_string(),
            fields,
        })
    }
}

fn key_string(source_id: &str, key: Value) -> Result<String> {
    match key {
        Value::String(s) => Ok(s),
        other => Err(Error::configuration(
            source_id,
            format!("persona keys must be strings, found {:?}", other),
        )),
    }
}

/// Loads personas from a directory
#[derive(Debug, Clone)]
pub struct PersonaStore {
    dir: PathBuf,
    enabled: bool,
}

impl PersonaStore {
    pub fn new(dir: impl Into<PathBuf>, enabled: bool) -> Self {
        Self {
            dir: dir.into(),
            enabled,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn enabled(&self) -> bool {
        self.enabled
    }

    fn path_for(&self, name: &str) -> Option<PathBuf> {
        ["yaml", "yml"]
            .iter()
            .map(|ext| self.dir.join(format!("{}.{}", name, ext)))
            .find(|p| p.exists())
    }

    /// Load a persona; `None` when personas are disabled or no file exists
    pub fn load(&self, name: &str) -> Result<Option<Persona>> {
        if !self.enabled {
            return Ok(None);
        }

        let Some(path) = self.path_for(name) else {
            log::debug!("No persona file for '{}' in {}", name, self.dir.display());
            return Ok(None);
        };

        let content = fs::read_to_string(&path).map_err(|e| Error::io(&path, e))?;
        let persona = Persona::from_str(name, &content)?;
        log::debug!("Loaded persona '{}' ({} fields)", name, persona.fields.len());
        Ok(Some(persona))
    }

    /// Persona names available in the directory, sorted
    pub fn names(&self) -> Result<Vec<String>> {
        if !self.dir.exists() {
            return Ok(Vec::new());
        }
        let mut names = Vec::new();
        for entry in fs::read_dir(&self.dir).map_err(|e| Error::io(&self.dir, e))? {
            let path = entry.map_err(|e| Error::io(&self.dir, e))?.path();
            if !path.extension().map(|e| e == "yaml" || e == "yml").unwrap_or(false) {
                continue;
            }
            if let Some(stem) = path.file_stem() {
                names.push(stem.to_string_lossy().to_string());
            }
        }
        names.sort();
        names.dedup();
        Ok(names)
    }
}
