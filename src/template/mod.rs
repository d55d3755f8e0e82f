//! Prompt templates
//!
//! A template has at most two roles, `system` and `user`. Each role is
//! either a single string or an ordered mapping of named sub-sections:
//!
//! ```yaml
//! system: "You are a helpful assistant."
//! user:
//!   instructions: "Summarize the text below."
//!   text: "{text}"
//!   feedback_section: "Previous feedback: {feedback}"
//! ```
//!
//! Sections are compiled when the template is loaded; rendering only walks
//! the compiled segments.

use indexmap::IndexSet;
use serde::Serialize;
use serde_yaml::Value;
use std::fmt;

use crate::error::{Error, Result};

pub mod parse;
pub mod render;
pub mod store;

use parse::Segment;

/// A prompt role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
}

impl Role {
    pub const ALL: [Role; 2] = [Role::System, Role::User];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
        }
    }

    /// Case-sensitive: only the lowercase names are roles
    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "system" => Some(Role::System),
            "user" => Some(Role::User),
            _ => None,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One compiled piece of template text
#[derive(Debug, Clone, PartialEq)]
pub struct Section {
    /// Sub-section name; `None` for a plain string role
    pub name: Option<String>,
    pub source: String,
    pub(crate) segments: Vec<Segment>,
    required: IndexSet<String>,
}

impl Section {
    pub fn compile(name: Option<String>, source: &str) -> Self {
        let (segments, required) = parse::compile(source);
        Self {
            name,
            source: source.to_string(),
            segments,
            required,
        }
    }

    /// Variables this section references
    pub fn required(&self) -> &IndexSet<String> {
        &self.required
    }
}

/// A role's template
#[derive(Debug, Clone, PartialEq)]
pub enum RoleTemplate {
    Text(Section),
    Sections(Vec<Section>),
}

impl RoleTemplate {
    pub fn sections(&self) -> &[Section] {
        match self {
            RoleTemplate::Text(section) => std::slice::from_ref(section),
            RoleTemplate::Sections(sections) => sections,
        }
    }
}

/// A compiled prompt template
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PromptTemplate {
    pub system: Option<RoleTemplate>,
    pub user: Option<RoleTemplate>,
}

impl PromptTemplate {
    /// Compile from YAML text
    pub fn from_str(source_id: &str, content: &str) -> Result<Self> {
        let value: Value = serde_yaml::from_str(content).map_err(|e| Error::configuration(source_id, e.to_string()))?;
        Self::from_value(source_id, &value)
    }

    /// Compile a `{system, user}` mapping. Any other key is a configuration error.
    pub fn from_value(source_id: &str, value: &Value) -> Result<Self> {
        let mapping = value
            .as_mapping()
            .ok_or_else(|| Error::configuration(source_id, "prompts must be a mapping of roles"))?;

        let mut template = PromptTemplate::default();
        for (key, role_value) in mapping {
            let key = key
                .as_str()
                .ok_or_else(|| Error::configuration(source_id, format!("role keys must be strings, found {:?}", key)))?;
            let role = Role::from_key(key).ok_or_else(|| {
                Error::configuration(
                    source_id,
                    format!("unknown prompt role '{}' (allowed: system, user)", key),
                )
            })?;
            let compiled = compile_role(source_id, role, role_value)?;
            match role {
                Role::System => template.system = Some(compiled),
                Role::User => template.user = Some(compiled),
            }
        }

        Ok(template)
    }

    pub fn role(&self, role: Role) -> Option<&RoleTemplate> {
        match role {
            Role::System => self.system.as_ref(),
            Role::User => self.user.as_ref(),
        }
    }

    /// Every variable referenced anywhere in the template
    pub fn variables(&self) -> IndexSet<String> {
        Role::ALL
            .iter()
            .filter_map(|role| self.role(*role))
            .flat_map(|rt| rt.sections().iter())
            .flat_map(|section| section.required().iter().cloned())
            .collect()
    }
}

fn compile_role(source_id: &str, role: Role, value: &Value) -> Result<RoleTemplate> {
    match value {
        Value::String(text) => Ok(RoleTemplate::Text(Section::compile(None, text))),
        Value::Mapping(sections) => {
            let mut compiled = Vec::with_capacity(sections.len());
            for (name, text) in sections {
                let name = name.as_str().ok_or_else(|| {
                    Error::configuration(source_id, format!("{} sub-section names must be strings", role))
                })?;
                let text = text.as_str().ok_or_else(|| {
                    Error::configuration(source_id, format!("{}.{} must be a string", role, name))
                })?;
                compiled.push(Section::compile(Some(name.to_string()), text));
            }
            Ok(RoleTemplate::Sections(compiled))
        }
        _ => Err(Error::configuration(
            source_id,
            format!("{} must be a string or a mapping of sub-sections", role),
        )),
    }
}
