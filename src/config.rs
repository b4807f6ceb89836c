//! Renderer Configuration - Defaults the Pipeline Falls Back To

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid YAML config: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Invalid JSON config: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RendererConfig {
    /// Lowest-precedence tag layer applied to every draft.
    #[serde(default = "default_base_tags")]
    pub base_tags: BTreeMap<String, String>,
    #[serde(default = "default_naming_annotation")]
    pub naming_annotation: String,
    #[serde(default = "default_external_name_annotation")]
    pub external_name_annotation: String,
    #[serde(default = "default_session_duration")]
    pub default_session_duration: String,
    #[serde(default = "default_management_policies")]
    pub default_management_policies: Vec<String>,
}

fn default_base_tags() -> BTreeMap<String, String> {
    BTreeMap::from([("managed-by".to_string(), "idc-render".to_string())])
}

fn default_naming_annotation() -> String {
    "crossplane.io/composition-resource-name".to_string()
}

fn default_external_name_annotation() -> String {
    "crossplane.io/external-name".to_string()
}

fn default_session_duration() -> String {
    "PT1H".to_string()
}

fn default_management_policies() -> Vec<String> {
    vec!["*".to_string()]
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            base_tags: default_base_tags(),
            naming_annotation: default_naming_annotation(),
            external_name_annotation: default_external_name_annotation(),
            default_session_duration: default_session_duration(),
            default_management_policies: default_management_policies(),
        }
    }
}

impl RendererConfig {
    /// Load from a `.yaml`/`.yml` or `.json` file. A path that does not exist
    /// yields the defaults.
    pub fn load_from_path(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "Config file absent, using defaults");
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;

        let config = if path.extension().map_or(false, |e| e == "json") {
            serde_json::from_str(&content)?
        } else {
            serde_yaml::from_str(&content)?
        };
        Ok(config)
    }
}
