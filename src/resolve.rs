//! Model override resolution
//!
//! Combines the default model selection, the model library and any number
//! of higher-precedence override records into one [`EffectiveModel`].
//!
//! Precedence, lowest to highest:
//!
//! 1. default selection params (`default_model.params` in `models.yaml`)
//! 2. api-level params
//! 3. class-level params
//! 4. model-level params
//! 5. each override record in the order given (cog, then agent)

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_yaml::Value;

use crate::error::{Error, ReferenceKind, Result};
use crate::settings::models::ModelLibrary;

/// Model parameters, in declaration order.
pub type ParamBag = IndexMap<String, Value>;

/// A partial model record. Fields left as `None` are not set and never
/// override a lower layer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ModelOverride {
    pub api: Option<String>,
    pub model: Option<String>,
    pub params: Option<ParamBag>,
}

impl ModelOverride {
    pub fn is_empty(&self) -> bool {
        self.api.is_none() && self.model.is_none() && self.params.is_none()
    }

    /// Field-by-field overlay of `upper` on top of `self`.
    pub fn overlay(&self, upper: &ModelOverride) -> ModelOverride {
        let params = match (&self.params, &upper.params) {
            (Some(lower), Some(higher)) => {
                let mut merged = lower.clone();
                merge_params(&mut merged, higher);
                Some(merged)
            }
            (lower, None) => lower.clone(),
            (None, higher) => higher.clone(),
        };

        ModelOverride {
            api: upper.api.clone().or_else(|| self.api.clone()),
            model: upper.model.clone().or_else(|| self.model.clone()),
            params,
        }
    }
}

/// Deep-merge `upper` into `target`. Mappings present on both sides merge
/// key by key; every other value is replaced.
pub fn merge_params(target: &mut ParamBag, upper: &ParamBag) {
    for (key, value) in upper {
        match target.get_mut(key) {
            Some(existing) => merge_value(existing, value),
            None => {
                target.insert(key.clone(), value.clone());
            }
        }
    }
}

fn merge_value(target: &mut Value, upper: &Value) {
    match (target, upper) {
        (Value::Mapping(lower), Value::Mapping(higher)) => {
            for (key, value) in higher {
                match lower.get_mut(key) {
                    Some(existing) => merge_value(existing, value),
                    None => {
                        lower.insert(key.clone(), value.clone());
                    }
                }
            }
        }
        (slot, value) => *slot = value.clone(),
    }
}

/// The resolved model for one invocation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EffectiveModel {
    pub api: String,
    pub model: String,
    pub class: String,
    pub identifier: String,
    pub params: ParamBag,
}

/// Resolves effective models against one model library.
pub struct OverrideResolver<'a> {
    library: &'a ModelLibrary,
}

impl<'a> OverrideResolver<'a> {
    pub fn new(library: &'a ModelLibrary) -> Self {
        Self { library }
    }

    /// Resolve `base` plus `overrides` (ordered lowest to highest precedence).
    pub fn resolve(&self, base: &ModelOverride, overrides: &[&ModelOverride]) -> Result<EffectiveModel> {
        let selection = overrides
            .iter()
            .fold(base.clone(), |acc, layer| acc.overlay(layer));

        let api = selection
            .api
            .ok_or_else(|| Error::configuration("settings/models", "no api selected by default_model or any override"))?;
        let model = selection
            .model
            .ok_or_else(|| Error::configuration("settings/models", "no model selected by default_model or any override"))?;

        let entry = self.library.find(&api, &model)?;

        let mut params = ParamBag::new();
        let layers = [base.params.as_ref(), Some(entry.api_params), Some(entry.class_params), Some(entry.model_params)]
            .into_iter()
            .chain(overrides.iter().map(|o| o.params.as_ref()));
        for bag in layers.flatten() {
            merge_params(&mut params, bag);
        }

        log::debug!(
            "Resolved model {}/{} ({}) with {} params",
            api,
            model,
            entry.identifier,
            params.len()
        );

        Ok(EffectiveModel {
            api,
            model,
            class: entry.class.to_string(),
            identifier: entry.identifier.to_string(),
            params,
        })
    }
}

/// Shorthand for [`OverrideResolver::resolve`].
pub fn resolve(library: &ModelLibrary, base: &ModelOverride, overrides: &[&ModelOverride]) -> Result<EffectiveModel> {
    OverrideResolver::new(library).resolve(base, overrides)
}
