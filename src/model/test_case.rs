//! Test case and step types
//!
//! These are the stored documents. Keys are camelCase on disk so files
//! written by earlier tooling keep loading.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::common::{Error, Result};

/// The kind of browser action a step performs
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum StepKind {
    /// Click the element described by `target`
    Tap,
    /// Type `value` into the element described by `target`
    Input,
    /// Wait until the condition in `target` holds
    WaitFor,
    /// Check a natural-language condition against the page
    Assert,
    /// Load `url` directly, no AI involved
    Navigate,
    /// A tag this build doesn't know; fails when executed
    Unknown(String),
}

impl StepKind {
    /// All kinds that can be executed
    pub const KNOWN: [StepKind; 5] = [
        StepKind::Tap,
        StepKind::Input,
        StepKind::WaitFor,
        StepKind::Assert,
        StepKind::Navigate,
    ];

    pub fn as_str(&self) -> &str {
        match self {
            Self::Tap => "tap",
            Self::Input => "input",
            Self::WaitFor => "waitFor",
            Self::Assert => "assert",
            Self::Navigate => "navigate",
            Self::Unknown(tag) => tag,
        }
    }

    /// Parse a step tag; the `ai`-prefixed tags of older documents are accepted
    pub fn parse(tag: &str) -> Self {
        match tag {
            "tap" | "aiTap" => Self::Tap,
            "input" | "aiInput" => Self::Input,
            "waitFor" | "aiWaitFor" => Self::WaitFor,
            "assert" | "aiAssert" => Self::Assert,
            "navigate" | "aiNavigate" => Self::Navigate,
            other => Self::Unknown(other.to_string()),
        }
    }
}

impl From<String> for StepKind {
    fn from(tag: String) -> Self {
        Self::parse(&tag)
    }
}

impl From<StepKind> for String {
    fn from(kind: StepKind) -> Self {
        kind.as_str().to_string()
    }
}

impl std::fmt::Display for StepKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parameters of a step; which ones matter depends on the kind
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StepParams {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_ms: Option<u64>,
}

/// One declared action in a test case
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Step {
    /// Stable id used to correlate results
    pub id: String,
    #[serde(rename = "type")]
    pub kind: StepKind,
    #[serde(default)]
    pub params: StepParams,
}

impl Step {
    /// Create a step with a fresh id
    pub fn new(kind: StepKind, params: StepParams) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            kind,
            params,
        }
    }

    /// Edit-time check of the required parameters for this kind
    ///
    /// The engine never calls this: at run time missing parameters are
    /// passed through and left for the agent to reject.
    pub fn validate(&self) -> Result<()> {
        let present = |v: &Option<String>| v.as_deref().is_some_and(|s| !s.trim().is_empty());
        let p = &self.params;

        let missing = match &self.kind {
            StepKind::Tap | StepKind::WaitFor if !present(&p.target) => Some("target is required"),
            StepKind::Input if !present(&p.target) => Some("target is required"),
            StepKind::Input if !present(&p.value) => Some("value is required"),
            StepKind::Assert if !present(&p.target) && !present(&p.value) => {
                Some("target or value is required")
            }
            StepKind::Navigate if !present(&p.url) => Some("url is required"),
            StepKind::Unknown(tag) => {
                return Err(Error::UnsupportedStepKind(tag.clone()));
            }
            _ => None,
        };

        match missing {
            Some(msg) => Err(Error::Validation(format!("{} step: {}", self.kind, msg))),
            None => Ok(()),
        }
    }
}

/// A named, ordered sequence of steps against a base URL
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestCase {
    pub id: String,
    pub name: String,
    pub base_url: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub steps: Vec<Step>,
}

/// Input for creating a test case
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTestCase {
    pub name: String,
    pub base_url: String,
    #[serde(default)]
    pub steps: Vec<Step>,
}

/// Partial update of a test case; `None` fields are left alone
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestCaseUpdate {
    pub name: Option<String>,
    pub base_url: Option<String>,
    pub steps: Option<Vec<Step>>,
}

fn required(field: &str, value: &str) -> Result<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(Error::Validation(format!("{} is required", field)));
    }
    Ok(trimmed.to_string())
}

impl TestCase {
    /// Build a new record with a fresh id and matching timestamps
    pub fn create(input: NewTestCase) -> Result<Self> {
        let name = required("name", &input.name)?;
        let base_url = required("baseUrl", &input.base_url)?;
        let now = Utc::now();

        Ok(Self {
            id: uuid::Uuid::new_v4().to_string(),
            name,
            base_url,
            created_at: now,
            updated_at: now,
            steps: input.steps,
        })
    }

    /// Apply a partial update and refresh `updated_at`
    ///
    /// Nothing is changed if any field is invalid.
    pub fn apply(&mut self, update: TestCaseUpdate) -> Result<()> {
        let name = update.name.as_deref().map(|n| required("name", n)).transpose()?;
        let base_url = update
            .base_url
            .as_deref()
            .map(|u| required("baseUrl", u))
            .transpose()?;

        if let Some(name) = name {
            self.name = name;
        }
        if let Some(base_url) = base_url {
            self.base_url = base_url;
        }
        if let Some(steps) = update.steps {
            self.steps = steps;
        }
        self.updated_at = Utc::now();
        Ok(())
    }
}
