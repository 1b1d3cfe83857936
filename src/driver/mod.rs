//! Browser automation and page agent interfaces
//!
//! The engine drives a browser through these traits only. [`process`]
//! implements them by talking to an external bridge process; tests supply
//! in-memory doubles.

pub mod client;
pub mod codec;
pub mod process;
pub mod types;

use std::collections::BTreeMap;
use std::path::PathBuf;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::common::Result;

pub use client::DriverClient;
pub use process::ProcessLauncher;

/// Browser viewport size in CSS pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 768,
        }
    }
}

/// Options for launching a browser instance
#[derive(Debug, Clone, Copy, Default)]
pub struct LaunchOptions {
    pub headless: bool,
}

/// Key/value settings handed to the page agent when it is created
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AgentEnv(BTreeMap<String, String>);

impl AgentEnv {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }
}

/// Starts browser instances
#[async_trait]
pub trait BrowserLauncher: Send + Sync {
    async fn launch(&self, options: &LaunchOptions) -> Result<Box<dyn Browser>>;
}

/// A running browser instance
#[async_trait]
pub trait Browser: Send {
    /// Open an isolated browsing context with a fixed viewport
    async fn new_context(&mut self, viewport: Viewport) -> Result<Box<dyn BrowserContext>>;

    async fn close(&mut self) -> Result<()>;
}

/// An isolated browsing context (cookies, storage)
#[async_trait]
pub trait BrowserContext: Send {
    async fn new_page(&mut self) -> Result<Box<dyn Page>>;

    async fn close(&mut self) -> Result<()>;
}

/// A single page (tab)
#[async_trait]
pub trait Page: Send + Sync {
    /// Plain navigation, no AI involved
    async fn goto(&self, url: &str) -> Result<()>;

    /// Construct a page agent bound to this page
    async fn attach_agent(&self, env: &AgentEnv) -> Result<Box<dyn Agent>>;

    async fn close(&self) -> Result<()>;
}

/// AI-driven interpreter of natural-language page actions
///
/// Failures carry no taxonomy; callers treat the error text as opaque.
#[async_trait]
pub trait Agent: Send {
    async fn tap(&mut self, target: &str) -> Result<()>;

    async fn input(&mut self, value: &str, target: &str) -> Result<()>;

    async fn wait_for(&mut self, condition: &str, timeout_ms: u64) -> Result<()>;

    async fn assert_condition(&mut self, assertion: &str) -> Result<()>;

    /// Report file the agent wrote for this run, if it keeps one
    async fn report_file(&mut self) -> Option<PathBuf> {
        None
    }
}
