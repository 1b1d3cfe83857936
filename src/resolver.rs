//! Model configuration resolution
//!
//! The persisted configuration wins; otherwise the agent's own environment
//! variables are used. No side effects.

use std::sync::Arc;

use crate::common::Result;
use crate::model::{ModelConfiguration, DEFAULT_MODEL_FAMILY};
use crate::store::CaseStore;

/// Environment variable holding the model API key
pub const ENV_API_KEY: &str = "MIDSCENE_MODEL_API_KEY";
/// Environment variable holding the model endpoint
pub const ENV_BASE_URL: &str = "MIDSCENE_MODEL_BASE_URL";
/// Environment variable holding the model name
pub const ENV_MODEL_NAME: &str = "MIDSCENE_MODEL_NAME";

type EnvLookup = Arc<dyn Fn(&str) -> Option<String> + Send + Sync>;

/// Resolves the model configuration for a run
#[derive(Clone)]
pub struct ConfigResolver {
    store: Arc<dyn CaseStore>,
    env: EnvLookup,
}

impl ConfigResolver {
    /// Resolver reading the real process environment
    pub fn new(store: Arc<dyn CaseStore>) -> Self {
        Self {
            store,
            env: Arc::new(|key| std::env::var(key).ok()),
        }
    }

    /// Replace the environment lookup (tests inject a map here)
    pub fn with_env<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String> + Send + Sync + 'static,
    {
        self.env = Arc::new(lookup);
        self
    }

    /// Persisted configuration, else environment, else `None`
    ///
    /// Store errors other than "absent" are returned as errors.
    pub async fn resolve(&self) -> Result<Option<ModelConfiguration>> {
        if let Some(config) = self.store.get_model_config().await? {
            tracing::debug!(source = "store", model = %config.model_name, "Resolved model configuration");
            return Ok(Some(config));
        }

        let config = from_env(|key| (self.env)(key));
        if let Some(config) = &config {
            tracing::debug!(source = "env", model = %config.model_name, "Resolved model configuration");
        }
        Ok(config)
    }
}

/// Build a configuration from environment variables
///
/// Any one key being set is enough, even to an empty value; unset keys
/// become empty strings.
pub fn from_env<F: Fn(&str) -> Option<String>>(lookup: F) -> Option<ModelConfiguration> {
    let api_key = lookup(ENV_API_KEY);
    let base_url = lookup(ENV_BASE_URL);
    let model_name = lookup(ENV_MODEL_NAME);

    if api_key.is_none() && base_url.is_none() && model_name.is_none() {
        return None;
    }

    Some(ModelConfiguration {
        api_key: api_key.unwrap_or_default(),
        base_url: base_url.unwrap_or_default(),
        model_name: model_name.unwrap_or_default(),
        model_family: Some(DEFAULT_MODEL_FAMILY.to_string()),
        updated_at: None,
    })
}
