//! Settings file handling
//!
//! These are the runner's own settings (where data lives, how the browser
//! is launched). The AI model credentials are stored separately, see
//! [`crate::model::ModelConfiguration`].

use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use super::paths::{config_path, data_dir};
use super::Result;

/// Main configuration structure
#[derive(Debug, Deserialize, Default, Clone)]
pub struct Config {
    /// Where test cases and the model configuration are stored
    #[serde(default)]
    pub store: StoreConfig,

    /// Browser launch settings
    #[serde(default)]
    pub browser: BrowserConfig,

    /// Driver bridge process
    #[serde(default)]
    pub driver: DriverConfig,

    /// Timeout settings
    #[serde(default)]
    pub timeouts: Timeouts,

    /// Report output settings
    #[serde(default)]
    pub report: ReportConfig,
}

/// Storage location settings
#[derive(Debug, Deserialize, Default, Clone)]
pub struct StoreConfig {
    /// Root directory for stored documents (platform data dir when unset)
    pub data_dir: Option<PathBuf>,
}

/// Browser launch settings
#[derive(Debug, Deserialize, Clone)]
pub struct BrowserConfig {
    /// Run without a visible window
    #[serde(default)]
    pub headless: bool,

    #[serde(default = "default_viewport_width")]
    pub viewport_width: u32,

    #[serde(default = "default_viewport_height")]
    pub viewport_height: u32,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            headless: false,
            viewport_width: default_viewport_width(),
            viewport_height: default_viewport_height(),
        }
    }
}

fn default_viewport_width() -> u32 {
    1280
}
fn default_viewport_height() -> u32 {
    768
}

/// Driver bridge process configuration
#[derive(Debug, Deserialize, Clone)]
pub struct DriverConfig {
    /// Path to the bridge executable
    #[serde(default = "default_driver_path")]
    pub path: PathBuf,

    /// Additional arguments to pass to the bridge
    #[serde(default)]
    pub args: Vec<String>,

    /// Extra environment for the bridge process
    #[serde(default)]
    pub env: HashMap<String, String>,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            path: default_driver_path(),
            args: Vec::new(),
            env: HashMap::new(),
        }
    }
}

fn default_driver_path() -> PathBuf {
    PathBuf::from("webcase-driver")
}

/// Timeout settings
#[derive(Debug, Deserialize, Clone)]
pub struct Timeouts {
    /// Default timeout for waitFor steps without their own
    #[serde(default = "default_wait_for")]
    pub wait_for_ms: u64,

    /// Upper bound for a single driver request
    #[serde(default = "default_driver_request")]
    pub driver_request_secs: u64,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            wait_for_ms: default_wait_for(),
            driver_request_secs: default_driver_request(),
        }
    }
}

fn default_wait_for() -> u64 {
    10_000
}
fn default_driver_request() -> u64 {
    120
}

/// Report output configuration
#[derive(Debug, Deserialize, Clone)]
pub struct ReportConfig {
    /// Write an HTML report after each run
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Directory for reports (`<data_dir>/reports` when unset)
    pub dir: Option<PathBuf>,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            dir: None,
        }
    }
}

fn default_true() -> bool {
    true
}

impl Config {
    /// Load configuration from the default settings file
    ///
    /// Returns default configuration if file doesn't exist
    pub fn load() -> Result<Self> {
        match config_path() {
            Some(path) if path.exists() => Self::load_from(&path),
            _ => Ok(Self::default()),
        }
    }

    /// Load configuration from an explicit path
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| super::Error::FileRead {
            path: path.display().to_string(),
            error: e.to_string(),
        })?;
        Self::parse(&content)
    }

    /// Parse configuration from TOML text
    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| super::Error::ConfigParse(e.to_string()))
    }

    /// Root directory for stored documents
    pub fn data_dir(&self) -> PathBuf {
        self.store.data_dir.clone().unwrap_or_else(data_dir)
    }

    /// Directory reports are written to
    pub fn reports_dir(&self) -> PathBuf {
        self.report
            .dir
            .clone()
            .unwrap_or_else(|| self.data_dir().join("reports"))
    }
}
