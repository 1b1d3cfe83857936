//! Driver traits implemented over a bridge process
//!
//! Every launch spawns its own bridge, so credentials handed to one run's
//! agent are never visible to another run.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};
use tokio::sync::Mutex;

use crate::common::config::{Config, DriverConfig};
use crate::common::Result;

use super::client::DriverClient;
use super::types::*;
use super::{Agent, AgentEnv, Browser, BrowserContext, BrowserLauncher, LaunchOptions, Page, Viewport};

type SharedClient = Arc<Mutex<DriverClient>>;

/// Slack added on top of a waitFor timeout before the request itself times out
const WAIT_FOR_SLACK: Duration = Duration::from_secs(30);

/// Launches browsers through a freshly spawned bridge process
#[derive(Debug, Clone)]
pub struct ProcessLauncher {
    driver: DriverConfig,
    request_timeout: Duration,
}

impl ProcessLauncher {
    pub fn new(driver: DriverConfig, request_timeout: Duration) -> Self {
        Self {
            driver,
            request_timeout,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.driver.clone(),
            Duration::from_secs(config.timeouts.driver_request_secs),
        )
    }
}

#[async_trait]
impl BrowserLauncher for ProcessLauncher {
    async fn launch(&self, options: &LaunchOptions) -> Result<Box<dyn Browser>> {
        let mut client = DriverClient::spawn(
            &self.driver.path,
            &self.driver.args,
            &self.driver.env,
            self.request_timeout,
        )
        .await?;

        let args = LaunchArguments {
            headless: options.headless,
        };
        let launched = client
            .request::<LaunchResponseBody>("launch", Some(serde_json::to_value(&args)?))
            .await;

        let body = match launched {
            Ok(body) => body,
            Err(e) => {
                let _ = client.terminate().await;
                return Err(e);
            }
        };

        tracing::debug!(browser_id = %body.browser_id, "Browser launched");
        Ok(Box::new(ProcessBrowser {
            client: Arc::new(Mutex::new(client)),
            id: body.browser_id,
            request_timeout: self.request_timeout,
        }))
    }
}

struct ProcessBrowser {
    client: SharedClient,
    id: String,
    request_timeout: Duration,
}

#[async_trait]
impl Browser for ProcessBrowser {
    async fn new_context(&mut self, viewport: Viewport) -> Result<Box<dyn BrowserContext>> {
        let args = NewContextArguments {
            browser_id: self.id.clone(),
            viewport,
        };
        let body: NewContextResponseBody = self
            .client
            .lock()
            .await
            .request("newContext", Some(serde_json::to_value(&args)?))
            .await?;

        Ok(Box::new(ProcessContext {
            client: self.client.clone(),
            id: body.context_id,
            request_timeout: self.request_timeout,
        }))
    }

    async fn close(&mut self) -> Result<()> {
        let mut client = self.client.lock().await;
        if client.is_poisoned() {
            return client.terminate().await;
        }
        let closed = client
            .request::<Value>("closeBrowser", Some(json!({ "browserId": self.id })))
            .await;
        // The process goes away even if the close request failed
        client.terminate().await?;
        closed.map(|_| ())
    }
}

struct ProcessContext {
    client: SharedClient,
    id: String,
    request_timeout: Duration,
}

#[async_trait]
impl BrowserContext for ProcessContext {
    async fn new_page(&mut self) -> Result<Box<dyn Page>> {
        let args = NewPageArguments {
            context_id: self.id.clone(),
        };
        let body: NewPageResponseBody = self
            .client
            .lock()
            .await
            .request("newPage", Some(serde_json::to_value(&args)?))
            .await?;

        Ok(Box::new(ProcessPage {
            client: self.client.clone(),
            id: body.page_id,
            request_timeout: self.request_timeout,
        }))
    }

    async fn close(&mut self) -> Result<()> {
        self.client
            .lock()
            .await
            .request::<Value>("closeContext", Some(json!({ "contextId": self.id })))
            .await?;
        Ok(())
    }
}

struct ProcessPage {
    client: SharedClient,
    id: String,
    request_timeout: Duration,
}

#[async_trait]
impl Page for ProcessPage {
    async fn goto(&self, url: &str) -> Result<()> {
        let args = GotoArguments {
            page_id: self.id.clone(),
            url: url.to_string(),
        };
        self.client
            .lock()
            .await
            .request::<Value>("goto", Some(serde_json::to_value(&args)?))
            .await?;
        Ok(())
    }

    async fn attach_agent(&self, env: &AgentEnv) -> Result<Box<dyn Agent>> {
        let args = CreateAgentArguments {
            page_id: self.id.clone(),
            env: env.clone(),
        };
        let body: CreateAgentResponseBody = self
            .client
            .lock()
            .await
            .request("createAgent", Some(serde_json::to_value(&args)?))
            .await?;

        Ok(Box::new(ProcessAgent {
            client: self.client.clone(),
            id: body.agent_id,
            request_timeout: self.request_timeout,
        }))
    }

    async fn close(&self) -> Result<()> {
        self.client
            .lock()
            .await
            .request::<Value>("closePage", Some(json!({ "pageId": self.id })))
            .await?;
        Ok(())
    }
}

struct ProcessAgent {
    client: SharedClient,
    id: String,
    request_timeout: Duration,
}

impl ProcessAgent {
    async fn call(&self, command: &str, arguments: Value, timeout: Duration) -> Result<()> {
        self.client
            .lock()
            .await
            .request_with_timeout::<Value>(command, Some(arguments), timeout)
            .await?;
        Ok(())
    }
}

#[async_trait]
impl Agent for ProcessAgent {
    async fn tap(&mut self, target: &str) -> Result<()> {
        let args = TapArguments {
            agent_id: self.id.clone(),
            target: target.to_string(),
        };
        self.call("aiTap", serde_json::to_value(&args)?, self.request_timeout)
            .await
    }

    async fn input(&mut self, value: &str, target: &str) -> Result<()> {
        let args = InputArguments {
            agent_id: self.id.clone(),
            value: value.to_string(),
            target: target.to_string(),
        };
        self.call("aiInput", serde_json::to_value(&args)?, self.request_timeout)
            .await
    }

    async fn wait_for(&mut self, condition: &str, timeout_ms: u64) -> Result<()> {
        let args = WaitForArguments {
            agent_id: self.id.clone(),
            target: condition.to_string(),
            timeout_ms,
        };
        let timeout = self
            .request_timeout
            .max(Duration::from_millis(timeout_ms) + WAIT_FOR_SLACK);
        self.call("aiWaitFor", serde_json::to_value(&args)?, timeout)
            .await
    }

    async fn assert_condition(&mut self, assertion: &str) -> Result<()> {
        let args = AssertArguments {
            agent_id: self.id.clone(),
            assertion: assertion.to_string(),
        };
        self.call("aiAssert", serde_json::to_value(&args)?, self.request_timeout)
            .await
    }

    async fn report_file(&mut self) -> Option<PathBuf> {
        let response = self
            .client
            .lock()
            .await
            .request::<ReportFileResponseBody>("reportFile", Some(json!({ "agentId": self.id })))
            .await;

        match response {
            Ok(body) => body.path.map(PathBuf::from),
            Err(e) => {
                tracing::debug!("Agent report unavailable: {}", e);
                None
            }
        }
    }
}
