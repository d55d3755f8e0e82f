//! Per-invocation agent configuration
//!
//! [`AgentConfigLoader`] holds the agent's definition and persona, loaded at
//! construction. [`AgentConfigLoader::refresh`] is the explicit reload step:
//! it re-reads settings, definition and persona only when
//! `misc.on_the_fly` is set. Everything derived from runtime arguments is
//! rebuilt on every [`AgentConfigLoader::get_agent_config`] call.

use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;

use crate::context::{RenderContext, Vars};
use crate::error::{Error, ReferenceKind, Result};
use crate::persona::{Persona, PersonaStore};
use crate::resolve::{EffectiveModel, ModelOverride, OverrideResolver};
use crate::response::ResponseFormat;
use crate::settings::{SettingsSnapshot, SettingsStore};
use crate::template::PromptTemplate;
use crate::template::render::{RenderedPrompt, render};
use crate::template::store::{AgentDefinition, PromptTemplateStore};
use crate::validate::validate;

/// What the caller supplies for one invocation
#[derive(Debug, Clone, Default)]
pub struct RuntimeOverrides {
    /// Cog-level model override, below the agent's own
    pub cog: Option<ModelOverride>,
    /// Runtime arguments; highest precedence in the render context
    pub args: Vars,
}

impl RuntimeOverrides {
    pub fn with_args(args: Vars) -> Self {
        Self { cog: None, args }
    }
}

/// The resolved, rendered and validated configuration for one invocation
#[derive(Debug, Clone, Serialize)]
pub struct AgentConfig {
    pub agent: String,
    pub model: EffectiveModel,
    #[serde(skip)]
    pub template: Arc<PromptTemplate>,
    pub persona: Option<String>,
    pub context: RenderContext,
    pub prompt: RenderedPrompt,
    pub debug: bool,
    #[serde(skip)]
    pub simulated_response: String,
    pub parse_response_as: Option<ResponseFormat>,
    pub storage_enabled: bool,
}

/// Loads and refreshes the sources for one agent
#[derive(Debug)]
pub struct AgentConfigLoader {
    settings: Arc<SettingsStore>,
    templates: PromptTemplateStore,
    personas_dir: PathBuf,
    snapshot: Arc<SettingsSnapshot>,
    definition: AgentDefinition,
    persona: Option<Arc<Persona>>,
}

impl AgentConfigLoader {
    pub fn new(
        agent_name: &str,
        settings: Arc<SettingsStore>,
        templates: PromptTemplateStore,
        personas_dir: impl Into<PathBuf>,
    ) -> Result<Self> {
        let personas_dir = personas_dir.into();
        let snapshot = settings.snapshot();
        let definition = templates.load(agent_name)?;
        let persona = load_persona(&snapshot, &personas_dir, &definition)?.map(Arc::new);

        Ok(Self {
            settings,
            templates,
            personas_dir,
            snapshot,
            definition,
            persona,
        })
    }

    pub fn name(&self) -> &str {
        &self.definition.name
    }

    pub fn definition(&self) -> &AgentDefinition {
        &self.definition
    }

    pub fn persona(&self) -> Option<&Persona> {
        self.persona.as_deref()
    }

    pub fn snapshot(&self) -> &Arc<SettingsSnapshot> {
        &self.snapshot
    }

    /// Re-read sources if reload-on-change is on. Returns whether anything was read.
    pub fn refresh(&mut self) -> Result<bool> {
        if !self.snapshot.system.reload_on_change() {
            return Ok(false);
        }
        self.reload()?;
        Ok(true)
    }

    /// Unconditionally re-read settings, definition and persona.
    /// The loader keeps its previous sources unless every one loads.
    pub fn reload(&mut self) -> Result<()> {
        let snapshot = self.settings.reload()?;
        let definition = self.templates.load(&self.definition.name)?;
        let persona = load_persona(&snapshot, &self.personas_dir, &definition)?.map(Arc::new);

        log::debug!("Reloaded sources for agent '{}'", definition.name);
        self.snapshot = snapshot;
        self.definition = definition;
        self.persona = persona;
        Ok(())
    }

    /// Resolve the model, build the context, render and validate
    pub fn get_agent_config(&self, overrides: &RuntimeOverrides, additional_data: &Vars) -> Result<AgentConfig> {
        let library = &self.snapshot.models;
        let layers: Vec<&ModelOverride> = overrides
            .cog
            .iter()
            .chain(self.definition.model_overrides.iter())
            .collect();
        let model = OverrideResolver::new(library).resolve(&library.default_model, &layers)?;

        let context = RenderContext::build(self.persona(), additional_data, &overrides.args);
        let prompt = render(&self.definition.template, &context);
        validate(&prompt)?;

        let system = &self.snapshot.system;
        if self.snapshot.storage.enabled() {
            log::debug!("Storage enabled for agent '{}'", self.definition.name);
        }

        Ok(AgentConfig {
            agent: self.definition.name.clone(),
            model,
            template: Arc::clone(&self.definition.template),
            persona: self.persona.as_ref().map(|p| p.name.clone()),
            context,
            prompt,
            debug: system.debug.mode,
            simulated_response: system.debug.simulated_response.clone(),
            parse_response_as: self.definition.parse_response_as,
            storage_enabled: self.snapshot.storage.enabled(),
        })
    }
}

/// An agent-named persona must exist; a missing system default is skipped
fn load_persona(
    snapshot: &SettingsSnapshot,
    personas_dir: &std::path::Path,
    definition: &AgentDefinition,
) -> Result<Option<Persona>> {
    let settings = &snapshot.system.persona;
    let store = PersonaStore::new(personas_dir, settings.enabled);

    if let Some(name) = definition.persona.as_deref() {
        if !store.enabled() {
            return Ok(None);
        }
        return match store.load(name)? {
            Some(persona) => Ok(Some(persona)),
            None => Err(Error::missing(ReferenceKind::Persona, name)),
        };
    }

    match snapshot.system.default_persona() {
        Some(name) => {
            let persona = store.load(name)?;
            if persona.is_none() {
                log::warn!("Default persona '{}' not found in {}", name, personas_dir.display());
            }
            Ok(persona)
        }
        None => Ok(None),
    }
}
