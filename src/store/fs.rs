//! JSON document store on the local filesystem
//!
//! Layout under the root directory:
//! ```text
//! test-cases/<id>.json
//! config/model-config.json
//! ```

use std::io;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::common::config::Config;
use crate::common::{Error, Result};
use crate::model::{
    ModelConfiguration, NewModelConfiguration, NewTestCase, TestCase, TestCaseUpdate,
};

use super::CaseStore;

/// Filesystem-backed store
#[derive(Debug, Clone)]
pub struct FsStore {
    root: PathBuf,
}

impl FsStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Store rooted at the configured data directory
    pub fn from_config(config: &Config) -> Self {
        Self::new(config.data_dir())
    }

    fn cases_dir(&self) -> PathBuf {
        self.root.join("test-cases")
    }

    fn model_config_path(&self) -> PathBuf {
        self.root.join("config").join("model-config.json")
    }

    /// Path of a test case document; ids that could escape the directory are rejected
    fn case_path(&self, id: &str) -> Result<PathBuf> {
        if id.is_empty() || id.contains(['/', '\\']) || id.contains("..") {
            return Err(Error::Validation(format!("invalid test case id '{}'", id)));
        }
        Ok(self.cases_dir().join(format!("{}.json", id)))
    }

    /// Create and persist a new test case
    pub async fn create_test_case(&self, input: NewTestCase) -> Result<TestCase> {
        let case = TestCase::create(input)?;
        write_json(&self.case_path(&case.id)?, &case).await?;
        tracing::info!(id = %case.id, name = %case.name, "Created test case");
        Ok(case)
    }

    /// All stored test cases, oldest first
    pub async fn list_test_cases(&self) -> Result<Vec<TestCase>> {
        let dir = self.cases_dir();
        let mut entries = match tokio::fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut cases = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            if let Some(case) = read_json::<TestCase>(&path).await? {
                cases.push(case);
            }
        }

        cases.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(cases)
    }

    /// Apply a partial update to a stored test case
    pub async fn update_test_case(&self, id: &str, update: TestCaseUpdate) -> Result<TestCase> {
        let path = self.case_path(id)?;
        let mut case = read_json::<TestCase>(&path)
            .await?
            .ok_or_else(|| Error::TestCaseNotFound(id.to_string()))?;

        case.apply(update)?;
        write_json(&path, &case).await?;
        tracing::debug!(id, steps = case.steps.len(), "Updated test case");
        Ok(case)
    }

    /// Remove a stored test case
    pub async fn delete_test_case(&self, id: &str) -> Result<()> {
        let path = self.case_path(id)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => {
                tracing::info!(id, "Deleted test case");
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                Err(Error::TestCaseNotFound(id.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Validate and persist the model configuration, replacing any previous one
    pub async fn save_model_config(
        &self,
        input: NewModelConfiguration,
    ) -> Result<ModelConfiguration> {
        let config = input.into_config()?;
        write_json(&self.model_config_path(), &config).await?;
        tracing::info!(model = %config.model_name, family = %config.family(), "Saved model configuration");
        Ok(config)
    }
}

#[async_trait]
impl CaseStore for FsStore {
    async fn get_test_case(&self, id: &str) -> Result<Option<TestCase>> {
        read_json(&self.case_path(id)?).await
    }

    async fn get_model_config(&self) -> Result<Option<ModelConfiguration>> {
        read_json(&self.model_config_path()).await
    }
}

/// Read a JSON document; a missing file is `Ok(None)`
async fn read_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>> {
    let content = match tokio::fs::read_to_string(path).await {
        Ok(content) => content,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(e) => {
            return Err(Error::FileRead {
                path: path.display().to_string(),
                error: e.to_string(),
            })
        }
    };

    serde_json::from_str(&content)
        .map(Some)
        .map_err(|e| Error::store_corrupt(path, e))
}

/// Write a JSON document via a temp file so readers never see a partial write
async fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    let json = serde_json::to_string_pretty(value)?;
    let tmp = path.with_extension("json.tmp");
    tokio::fs::write(&tmp, json).await?;
    tokio::fs::rename(&tmp, path).await?;
    Ok(())
}
