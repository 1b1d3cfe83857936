//! AI model configuration
//!
//! Credentials and endpoint the page agent uses to reach its model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::common::{Error, Result};

/// Family assumed when none is configured
pub const DEFAULT_MODEL_FAMILY: &str = "openai";

/// Credentials and model identification for the page agent
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelConfiguration {
    pub api_key: String,
    pub base_url: String,
    pub model_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_family: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl ModelConfiguration {
    /// The configured family, or the default one
    pub fn family(&self) -> &str {
        self.model_family
            .as_deref()
            .filter(|f| !f.is_empty())
            .unwrap_or(DEFAULT_MODEL_FAMILY)
    }
}

// Keep the key out of logs and panic messages.
impl std::fmt::Debug for ModelConfiguration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelConfiguration")
            .field("api_key", &if self.api_key.is_empty() { "<unset>" } else { "<redacted>" })
            .field("base_url", &self.base_url)
            .field("model_name", &self.model_name)
            .field("model_family", &self.model_family)
            .field("updated_at", &self.updated_at)
            .finish()
    }
}

/// Input for saving a model configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewModelConfiguration {
    pub api_key: String,
    pub base_url: String,
    pub model_name: String,
    pub model_family: Option<String>,
}

impl NewModelConfiguration {
    /// Check required fields and produce the record to persist
    pub fn into_config(self) -> Result<ModelConfiguration> {
        for (field, value) in [
            ("apiKey", &self.api_key),
            ("baseUrl", &self.base_url),
            ("modelName", &self.model_name),
        ] {
            if value.trim().is_empty() {
                return Err(Error::Validation(format!("{} is required", field)));
            }
        }

        let model_family = self
            .model_family
            .map(|f| f.trim().to_string())
            .filter(|f| !f.is_empty())
            .unwrap_or_else(|| DEFAULT_MODEL_FAMILY.to_string());

        Ok(ModelConfiguration {
            api_key: self.api_key.trim().to_string(),
            base_url: self.base_url.trim().to_string(),
            model_name: self.model_name.trim().to_string(),
            model_family: Some(model_family),
            updated_at: Some(Utc::now()),
        })
    }
}
