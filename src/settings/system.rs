//! System settings (`settings/system.yaml`)

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct SystemSettings {
    pub persona: PersonaSettings,
    pub debug: DebugSettings,
    pub misc: MiscSettings,

    /// Logging flags for collaborators; not interpreted here
    pub logging: serde_yaml::Value,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PersonaSettings {
    /// Load personas at all
    pub enabled: bool,
    /// Persona used when an agent does not name one
    pub name: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DebugSettings {
    /// Return `simulated_response` instead of calling the model
    pub mode: bool,
    pub simulated_response: String,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct MiscSettings {
    /// Re-read settings, templates and personas before every invocation
    pub on_the_fly: bool,
}

impl Default for PersonaSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            name: None,
        }
    }
}

impl Default for DebugSettings {
    fn default() -> Self {
        Self {
            mode: false,
            simulated_response: "Simulated text goes here.".to_string(),
        }
    }
}

impl SystemSettings {
    pub(crate) fn from_value(value: serde_yaml::Value) -> Result<Self> {
        serde_yaml::from_value(value).map_err(|e| Error::configuration("settings/system", e.to_string()))
    }

    /// Name of the persona to fall back to, if personas are on
    pub fn default_persona(&self) -> Option<&str> {
        if self.persona.enabled { self.persona.name.as_deref() } else { None }
    }

    pub fn reload_on_change(&self) -> bool {
        self.misc.on_the_fly
    }
}
