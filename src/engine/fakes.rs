//! In-memory doubles of the store and driver traits for engine tests
//!
//! Every call is appended to a shared log such as `"tap:Login"` or
//! `"close:page"`, so tests can check order and counts.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::common::{Error, Result};
use crate::driver::{Agent, AgentEnv, Browser, BrowserContext, BrowserLauncher, LaunchOptions, Page, Viewport};
use crate::model::{ModelConfiguration, TestCase};
use crate::store::CaseStore;

/// Which calls fail, and how
#[derive(Debug, Clone, Default)]
pub struct Script {
    pub fail_launch: Option<String>,
    pub fail_context: Option<String>,
    pub fail_page: Option<String>,
    pub fail_attach: Option<String>,
    /// Every `goto` fails with this message
    pub fail_goto: Option<String>,
    /// Agent action name (`tap`, `input`, `waitFor`, `assert`) to failure text
    pub fail_on: HashMap<String, String>,
    pub panic_on: Option<String>,
    /// Agent action that never completes
    pub stall_on: Option<String>,
    pub fail_close_page: bool,
    pub fail_close_context: bool,
    pub fail_close_browser: bool,
    pub report_file: Option<PathBuf>,
}

impl Script {
    pub fn failing_on(action: &str, message: &str) -> Self {
        let mut script = Self::default();
        script.fail_on.insert(action.to_string(), message.to_string());
        script
    }
}

/// Shared call log
#[derive(Debug, Clone, Default)]
pub struct CallLog {
    calls: Arc<Mutex<Vec<String>>>,
    last_env: Arc<Mutex<Option<AgentEnv>>>,
}

impl CallLog {
    fn push(&self, call: impl Into<String>) {
        self.calls.lock().unwrap().push(call.into());
    }

    pub fn all(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    /// Number of calls with the given action name
    pub fn count(&self, name: &str) -> usize {
        self.all()
            .iter()
            .filter(|c| c.split(':').next() == Some(name))
            .count()
    }

    pub fn closes(&self) -> Vec<String> {
        self.all()
            .into_iter()
            .filter(|c| c.starts_with("close:"))
            .collect()
    }

    pub fn last_env(&self) -> Option<AgentEnv> {
        self.last_env.lock().unwrap().clone()
    }
}

fn scripted(failure: &Option<String>) -> Result<()> {
    match failure {
        Some(msg) => Err(Error::Capability(msg.clone())),
        None => Ok(()),
    }
}

/// Launcher handing out fake browsers that share one script and log
#[derive(Debug, Clone)]
pub struct FakeLauncher {
    script: Arc<Script>,
    calls: CallLog,
}

impl FakeLauncher {
    pub fn new(script: Script) -> Self {
        Self {
            script: Arc::new(script),
            calls: CallLog::default(),
        }
    }

    pub fn calls(&self) -> &CallLog {
        &self.calls
    }
}

#[async_trait]
impl BrowserLauncher for FakeLauncher {
    async fn launch(&self, options: &LaunchOptions) -> Result<Box<dyn Browser>> {
        self.calls.push(format!("launch:{}", options.headless));
        scripted(&self.script.fail_launch)?;
        Ok(Box::new(FakeBrowser {
            script: self.script.clone(),
            calls: self.calls.clone(),
        }))
    }
}

struct FakeBrowser {
    script: Arc<Script>,
    calls: CallLog,
}

#[async_trait]
impl Browser for FakeBrowser {
    async fn new_context(&mut self, viewport: Viewport) -> Result<Box<dyn BrowserContext>> {
        self.calls
            .push(format!("newContext:{}x{}", viewport.width, viewport.height));
        scripted(&self.script.fail_context)?;
        Ok(Box::new(FakeContext {
            script: self.script.clone(),
            calls: self.calls.clone(),
        }))
    }

    async fn close(&mut self) -> Result<()> {
        self.calls.push("close:browser");
        if self.script.fail_close_browser {
            return Err(Error::DriverCrashed);
        }
        Ok(())
    }
}

struct FakeContext {
    script: Arc<Script>,
    calls: CallLog,
}

#[async_trait]
impl BrowserContext for FakeContext {
    async fn new_page(&mut self) -> Result<Box<dyn Page>> {
        self.calls.push("newPage");
        scripted(&self.script.fail_page)?;
        Ok(Box::new(FakePage {
            script: self.script.clone(),
            calls: self.calls.clone(),
        }))
    }

    async fn close(&mut self) -> Result<()> {
        self.calls.push("close:context");
        if self.script.fail_close_context {
            return Err(Error::DriverCrashed);
        }
        Ok(())
    }
}

struct FakePage {
    script: Arc<Script>,
    calls: CallLog,
}

#[async_trait]
impl Page for FakePage {
    async fn goto(&self, url: &str) -> Result<()> {
        self.calls.push(format!("goto:{}", url));
        scripted(&self.script.fail_goto)
    }

    async fn attach_agent(&self, env: &AgentEnv) -> Result<Box<dyn Agent>> {
        self.calls.push("attach");
        *self.calls.last_env.lock().unwrap() = Some(env.clone());
        scripted(&self.script.fail_attach)?;
        Ok(Box::new(FakeAgent {
            script: self.script.clone(),
            calls: self.calls.clone(),
        }))
    }

    async fn close(&self) -> Result<()> {
        self.calls.push("close:page");
        if self.script.fail_close_page {
            return Err(Error::DriverCrashed);
        }
        Ok(())
    }
}

struct FakeAgent {
    script: Arc<Script>,
    calls: CallLog,
}

impl FakeAgent {
    async fn act(&self, action: &str, detail: String) -> Result<()> {
        self.calls.push(format!("{}:{}", action, detail));
        if self.script.stall_on.as_deref() == Some(action) {
            std::future::pending::<()>().await;
        }
        if self.script.panic_on.as_deref() == Some(action) {
            panic!("agent blew up on {}", action);
        }
        match self.script.fail_on.get(action) {
            Some(msg) => Err(Error::Capability(msg.clone())),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl Agent for FakeAgent {
    async fn tap(&mut self, target: &str) -> Result<()> {
        self.act("tap", target.to_string()).await
    }

    async fn input(&mut self, value: &str, target: &str) -> Result<()> {
        self.act("input", format!("{}|{}", value, target)).await
    }

    async fn wait_for(&mut self, condition: &str, timeout_ms: u64) -> Result<()> {
        self.act("waitFor", format!("{}|{}", condition, timeout_ms)).await
    }

    async fn assert_condition(&mut self, assertion: &str) -> Result<()> {
        self.act("assert", assertion.to_string()).await
    }

    async fn report_file(&mut self) -> Option<PathBuf> {
        self.script.report_file.clone()
    }
}

/// Store holding records in memory
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    cases: HashMap<String, TestCase>,
    model_config: Option<ModelConfiguration>,
    corrupt: bool,
}

impl MemoryStore {
    pub fn with_case(mut self, case: TestCase) -> Self {
        self.cases.insert(case.id.clone(), case);
        self
    }

    pub fn with_model_config(mut self, config: ModelConfiguration) -> Self {
        self.model_config = Some(config);
        self
    }

    /// Every read fails as if the documents were unreadable
    pub fn corrupt(mut self) -> Self {
        self.corrupt = true;
        self
    }
}

#[async_trait]
impl CaseStore for MemoryStore {
    async fn get_test_case(&self, id: &str) -> Result<Option<TestCase>> {
        if self.corrupt {
            return Err(Error::StoreCorrupt {
                path: format!("{}.json", id),
                message: "expected value at line 1 column 1".to_string(),
            });
        }
        Ok(self.cases.get(id).cloned())
    }

    async fn get_model_config(&self) -> Result<Option<ModelConfiguration>> {
        Ok(self.model_config.clone())
    }
}
