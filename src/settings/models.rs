//! Model library (`settings/models.yaml`)

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::{Error, ReferenceKind, Result};
use crate::resolve::{ModelOverride, ParamBag};

/// Default selection plus the library of apis, classes and models.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct ModelLibrary {
    /// Lowest-precedence selection and params
    pub default_model: ModelOverride,

    /// Api name -> api entry, in file order
    #[serde(rename = "library")]
    pub apis: IndexMap<String, ApiEntry>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct ApiEntry {
    pub params: ParamBag,
    pub classes: IndexMap<String, ClassEntry>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct ClassEntry {
    pub params: ParamBag,
    pub models: IndexMap<String, ModelEntry>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ModelEntry {
    /// Provider-side model identifier (e.g. "gpt-4o")
    pub identifier: String,

    #[serde(default)]
    pub params: ParamBag,
}

/// A model located in the library, with the param bags of every layer above it.
#[derive(Debug, Clone, Copy)]
pub struct LibraryEntry<'a> {
    pub class: &'a str,
    pub identifier: &'a str,
    pub api_params: &'a ParamBag,
    pub class_params: &'a ParamBag,
    pub model_params: &'a ParamBag,
}

impl ModelLibrary {
    /// Parse and validate a library from YAML
    pub fn from_str(content: &str) -> Result<Self> {
        let library: Self =
            serde_yaml::from_str(content).map_err(|e| Error::configuration("settings/models", e.to_string()))?;
        library.validate()?;
        Ok(library)
    }

    pub(crate) fn from_value(value: serde_yaml::Value) -> Result<Self> {
        let library: Self =
            serde_yaml::from_value(value).map_err(|e| Error::configuration("settings/models", e.to_string()))?;
        library.validate()?;
        Ok(library)
    }

    /// Model names must be unique within an api, across all of its classes.
    pub fn validate(&self) -> Result<()> {
        for (api_name, api) in &self.apis {
            let mut seen: IndexMap<&str, &str> = IndexMap::new();
            for (class_name, class) in &api.classes {
                for model_name in class.models.keys() {
                    if let Some(previous) = seen.insert(model_name.as_str(), class_name.as_str()) {
                        return Err(Error::configuration(
                            "settings/models",
                            format!(
                                "model '{}' under api '{}' is declared in both '{}' and '{}'",
                                model_name, api_name, previous, class_name
                            ),
                        ));
                    }
                }
            }
        }
        Ok(())
    }

    /// Locate `model` under `api`
    pub fn find(&self, api: &str, model: &str) -> Result<LibraryEntry<'_>> {
        let api_entry = self.apis.get(api).ok_or_else(|| Error::missing(ReferenceKind::Api, api))?;

        api_entry
            .classes
            .iter()
            .find_map(|(class_name, class)| {
                class.models.get(model).map(|entry| LibraryEntry {
                    class: class_name,
                    identifier: &entry.identifier,
                    api_params: &api_entry.params,
                    class_params: &class.params,
                    model_params: &entry.params,
                })
            })
            .ok_or_else(|| Error::missing(ReferenceKind::Model, format!("{}/{}", api, model)))
    }

    /// All (api, model, identifier) triples in file order
    pub fn models(&self) -> Vec<(&str, &str, &str)> {
        self.apis
            .iter()
            .flat_map(|(api_name, api)| {
                api.classes.values().flat_map(move |class| {
                    class
                        .models
                        .iter()
                        .map(move |(name, entry)| (api_name.as_str(), name.as_str(), entry.identifier.as_str()))
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_model_across_classes() {
        let lib = ModelLibrary::from_str(
            r#"
library:
  anthropic_api:
    classes:
      haiku:
        models:
          fast: { identifier: claude-haiku }
      sonnet:
        params: { max_tokens: 8000 }
        models:
          smart: { identifier: claude-sonnet }
"#,
        )
        .unwrap();

        let entry = lib.find("anthropic_api", "smart").unwrap();
        assert_eq!(entry.class, "sonnet");
        assert_eq!(entry.identifier, "claude-sonnet");
        assert!(entry.class_params.contains_key("max_tokens"));
        assert_eq!(lib.models().len(), 2);
    }

    #[test]
    fn test_duplicate_model_name_rejected() {
        let result = ModelLibrary::from_str(
            r#"
library:
  api:
    classes:
      one:
        models:
          m: { identifier: a }
      two:
        models:
          m: { identifier: b }
"#,
        );
        assert!(matches!(result, Err(Error::Configuration { .. })));
    }

    #[test]
    fn test_model_without_identifier_rejected() {
        let result = ModelLibrary::from_str("library:\n  api:\n    classes:\n      c:\n        models:\n          m: {}\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_empty_library_is_valid() {
        let lib = ModelLibrary::from_str("{}").unwrap();
        assert!(lib.apis.is_empty());
        assert!(lib.default_model.is_empty());
    }
}
