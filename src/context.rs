//! Render context assembly
//!
//! The context is one flat mapping built from, in increasing precedence:
//! persona fields, agent additional data, runtime arguments.

use indexmap::IndexMap;
use serde::Serialize;
use serde_yaml::Value;

use crate::persona::Persona;

/// Variables supplied by a caller or hook
pub type Vars = IndexMap<String, Value>;

/// The variables available to one render
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct RenderContext {
    vars: Vars,
}

impl RenderContext {
    /// Merge the three sources; later sources overwrite same-named keys
    pub fn build(persona: Option<&Persona>, additional_data: &Vars, runtime_args: &Vars) -> Self {
        let mut vars = Vars::new();
        if let Some(persona) = persona {
            vars.extend(persona.fields.iter().map(|(k, v)| (k.clone(), v.clone())));
        }
        vars.extend(additional_data.iter().map(|(k, v)| (k.clone(), v.clone())));
        vars.extend(runtime_args.iter().map(|(k, v)| (k.clone(), v.clone())));
        Self { vars }
    }

    pub fn from_vars(vars: Vars) -> Self {
        Self { vars }
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.vars.get(name)
    }

    /// Present and non-empty
    pub fn has_value(&self, name: &str) -> bool {
        self.vars.get(name).map(|v| !is_empty_value(v)).unwrap_or(false)
    }

    /// Textual form used at substitution time
    pub fn text(&self, name: &str) -> Option<String> {
        self.vars.get(name).map(value_text)
    }

    pub fn vars(&self) -> &Vars {
        &self.vars
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }
}

/// Null and zero-length strings, sequences and mappings count as empty
pub fn is_empty_value(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        Value::Sequence(seq) => seq.is_empty(),
        Value::Mapping(map) => map.is_empty(),
        Value::Tagged(tagged) => is_empty_value(&tagged.value),
        Value::Bool(_) | Value::Number(_) => false,
    }
}

/// Strings verbatim, scalars via display, collections as compact JSON
pub fn value_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::Tagged(tagged) => value_text(&tagged.value),
        collection => match serde_json::to_string(collection) {
            Ok(json) => json,
            // JSON needs string-like keys; anything else renders as YAML
            Err(_) => yaml_text(collection),
        },
    }
}

fn yaml_text(value: &Value) -> String {
    match serde_yaml::to_string(value) {
        Ok(yaml) => yaml.trim_end().to_string(),
        Err(e) => {
            log::warn!("Could not render value as text: {}", e);
            format!("{:?}", value)
        }
    }
}
