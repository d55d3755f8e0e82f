//! Storage settings (`settings/storage.yaml`)
//!
//! Only the enable flag is read; everything else belongs to the storage
//! backend and is carried through untouched.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct StorageSettings {
    pub options: StorageOptions,

    #[serde(flatten)]
    pub backend: IndexMap<String, serde_yaml::Value>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct StorageOptions {
    pub enabled: bool,
}

impl StorageSettings {
    pub(crate) fn from_value(value: serde_yaml::Value) -> Result<Self> {
        serde_yaml::from_value(value).map_err(|e| Error::configuration("settings/storage", e.to_string()))
    }

    pub fn enabled(&self) -> bool {
        self.options.enabled
    }
}
