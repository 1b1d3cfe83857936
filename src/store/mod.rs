//! Test case and model configuration storage
//!
//! The engine only reads through [`CaseStore`]; editing operations live on
//! the concrete [`FsStore`].

mod fs;

use async_trait::async_trait;

use crate::common::Result;
use crate::model::{ModelConfiguration, TestCase};

pub use fs::FsStore;

/// Read access the execution engine needs
///
/// `Ok(None)` means the record does not exist; any other problem (such as a
/// corrupt document) is an `Err`.
#[async_trait]
pub trait CaseStore: Send + Sync {
    /// Load a test case by id
    async fn get_test_case(&self, id: &str) -> Result<Option<TestCase>>;

    /// Load the persisted model configuration
    async fn get_model_config(&self) -> Result<Option<ModelConfiguration>>;
}
