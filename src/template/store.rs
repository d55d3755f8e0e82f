//! Agent definition loading
//!
//! Agent files live anywhere under the prompts directory and are found by
//! file stem, so `prompts/writing/summarizer.yaml` defines `summarizer`.

use indexmap::IndexMap;
use serde::Deserialize;
use serde_yaml::Value;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use walkdir::WalkDir;

use super::PromptTemplate;
use crate::error::{Error, ReferenceKind, Result};
use crate::resolve::ModelOverride;
use crate::response::ResponseFormat;

/// Everything an agent file declares
#[derive(Debug, Clone)]
pub struct AgentDefinition {
    pub name: String,
    pub path: PathBuf,
    pub template: Arc<PromptTemplate>,
    /// Persona named by the agent, overriding the system default
    pub persona: Option<String>,
    /// Agent-level model override layer
    pub model_overrides: Option<ModelOverride>,
    pub parse_response_as: Option<ResponseFormat>,
    /// Any other top-level keys, for agent hooks
    pub data: IndexMap<String, Value>,
}

#[derive(Debug, Deserialize)]
struct RawDefinition {
    prompts: Value,
    #[serde(default)]
    persona: Option<String>,
    #[serde(default)]
    model_overrides: Option<ModelOverride>,
    #[serde(default)]
    parse_response_as: Option<ResponseFormat>,
    #[serde(flatten)]
    data: IndexMap<String, Value>,
}

impl AgentDefinition {
    pub fn from_str(name: &str, path: &Path, content: &str) -> Result<Self> {
        let source_id = format!("prompts/{}", name);
        let raw: RawDefinition =
            serde_yaml::from_str(content).map_err(|e| Error::configuration(&source_id, e.to_string()))?;
        let template = PromptTemplate::from_value(&source_id, &raw.prompts)?;

        Ok(Self {
            name: name.to_string(),
            path: path.to_path_buf(),
            template: Arc::new(template),
            persona: raw.persona,
            model_overrides: raw.model_overrides.filter(|o| !o.is_empty()),
            parse_response_as: raw.parse_response_as,
            data: raw.data,
        })
    }
}

/// Finds and compiles agent definitions under one directory
#[derive(Debug, Clone)]
pub struct PromptTemplateStore {
    dir: PathBuf,
}

impl PromptTemplateStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Name -> path for every agent file, sorted by name
    pub fn index(&self) -> Result<IndexMap<String, PathBuf>> {
        let mut found: IndexMap<String, PathBuf> = IndexMap::new();
        if !self.dir.exists() {
            return Ok(found);
        }

        for entry in WalkDir::new(&self.dir).sort_by_file_name() {
            let entry = entry.map_err(|e| Error::configuration("prompts", e.to_string()))?;
            let path = entry.path();
            if !entry.file_type().is_file() || !path.extension().map(|e| e == "yaml" || e == "yml").unwrap_or(false) {
                continue;
            }
            let Some(name) = path.file_stem().map(|s| s.to_string_lossy().to_string()) else {
                continue;
            };
            if let Some(previous) = found.insert(name.clone(), path.to_path_buf()) {
                return Err(Error::configuration(
                    format!("prompts/{}", name),
                    format!("defined twice: {} and {}", previous.display(), path.display()),
                ));
            }
        }

        found.sort_keys();
        Ok(found)
    }

    pub fn names(&self) -> Result<Vec<String>> {
        Ok(self.index()?.into_keys().collect())
    }

    /// Load and compile one agent's definition
    pub fn load(&self, agent_name: &str) -> Result<AgentDefinition> {
        let index = self.index()?;
        let path = index
            .get(agent_name)
            .ok_or_else(|| Error::missing(ReferenceKind::Agent, agent_name))?;

        let content = fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        let definition = AgentDefinition::from_str(agent_name, path, &content)?;
        log::debug!("Loaded agent definition '{}' from {}", agent_name, path.display());
        Ok(definition)
    }
}
