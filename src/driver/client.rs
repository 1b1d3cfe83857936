//! Client for the driver bridge process
//!
//! Spawns the bridge, then exchanges one request at a time over its stdio.
//! Events that arrive while waiting for a response are logged.
//!
//! An exchange that never completes leaves the stream at an unknown
//! position, whether it timed out or was dropped mid-frame. The client is
//! then poisoned: later requests fail at once and `terminate` kills the
//! process without talking to it.

use std::collections::HashMap;
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use serde_json::Value;
use tokio::io::{BufReader, BufWriter};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};

use crate::common::{Error, Result};

use super::codec;
use super::types::*;

/// Connection to one bridge process
pub struct DriverClient {
    /// Bridge subprocess
    process: Child,
    /// Buffered reader for bridge stdout
    reader: BufReader<ChildStdout>,
    /// Buffered writer for bridge stdin
    writer: BufWriter<ChildStdin>,
    /// Sequence number for requests
    seq: i64,
    /// Upper bound for one request/response exchange
    request_timeout: Duration,
    /// Set while an exchange is in flight and left set if it never finishes
    poisoned: bool,
}

impl DriverClient {
    /// Spawn a bridge process and connect to it
    pub async fn spawn(
        path: &Path,
        args: &[String],
        env: &HashMap<String, String>,
        request_timeout: Duration,
    ) -> Result<Self> {
        let mut cmd = Command::new(path);
        cmd.args(args)
            .envs(env)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .kill_on_drop(true);

        let mut process = cmd.spawn().map_err(|e| {
            Error::DriverStartFailed(format!("Failed to start {}: {}", path.display(), e))
        })?;

        let stdin = process
            .stdin
            .take()
            .ok_or_else(|| Error::DriverStartFailed("Failed to get driver stdin".to_string()))?;
        let stdout = process
            .stdout
            .take()
            .ok_or_else(|| Error::DriverStartFailed("Failed to get driver stdout".to_string()))?;

        tracing::debug!(path = %path.display(), pid = ?process.id(), "Spawned driver process");

        Ok(Self {
            process,
            reader: BufReader::new(stdout),
            writer: BufWriter::new(stdin),
            seq: 1,
            request_timeout,
            poisoned: false,
        })
    }

    fn next_seq(&mut self) -> i64 {
        let seq = self.seq;
        self.seq += 1;
        seq
    }

    /// Send a request and return its sequence number
    async fn send_request(&mut self, command: &str, arguments: Option<Value>) -> Result<i64> {
        let seq = self.next_seq();
        let request = RequestMessage {
            seq,
            message_type: "request".to_string(),
            command: command.to_string(),
            arguments,
        };

        let json = serde_json::to_string(&request)?;
        tracing::trace!("driver >>> {}", json);
        codec::write_message(&mut self.writer, &json).await?;

        Ok(seq)
    }

    async fn read_message(&mut self) -> Result<Value> {
        let json = codec::read_message(&mut self.reader).await?;
        tracing::trace!("driver <<< {}", json);
        serde_json::from_str(&json)
            .map_err(|e| Error::DriverProtocol(format!("Invalid JSON: {}", e)))
    }

    /// Send a request and wait for its response, bounded by the default timeout
    pub async fn request<T: serde::de::DeserializeOwned>(
        &mut self,
        command: &str,
        arguments: Option<Value>,
    ) -> Result<T> {
        let timeout = self.request_timeout;
        self.request_with_timeout(command, arguments, timeout).await
    }

    /// Send a request and wait for its response
    ///
    /// A failed response becomes [`Error::Capability`] carrying the bridge's
    /// message unchanged.
    pub async fn request_with_timeout<T: serde::de::DeserializeOwned>(
        &mut self,
        command: &str,
        arguments: Option<Value>,
        timeout: Duration,
    ) -> Result<T> {
        if self.poisoned {
            return Err(Error::DriverUnresponsive(command.to_string()));
        }

        self.poisoned = true;
        match tokio::time::timeout(timeout, self.exchange(command, arguments)).await {
            Ok(result) => result,
            Err(_) => Err(Error::DriverTimeout {
                command: command.to_string(),
                timeout,
            }),
        }
    }

    /// Whether an earlier exchange was left unfinished
    pub fn is_poisoned(&self) -> bool {
        self.poisoned
    }

    async fn exchange<T: serde::de::DeserializeOwned>(
        &mut self,
        command: &str,
        arguments: Option<Value>,
    ) -> Result<T> {
        let seq = self.send_request(command, arguments).await?;

        loop {
            let msg = self.read_message().await?;
            let msg_type = msg
                .get("type")
                .and_then(|v| v.as_str())
                .unwrap_or("unknown");

            match msg_type {
                "response" => {
                    let response: ResponseMessage = serde_json::from_value(msg)?;
                    if response.request_seq != seq {
                        tracing::warn!(
                            expected = seq,
                            got = response.request_seq,
                            "Dropping stale driver response"
                        );
                        continue;
                    }

                    // The frame for this request was read in full
                    self.poisoned = false;

                    if !response.success {
                        return Err(Error::Capability(
                            response
                                .message
                                .unwrap_or_else(|| format!("{} failed", command)),
                        ));
                    }

                    let body = response.body.unwrap_or(Value::Null);
                    return serde_json::from_value(body).map_err(|e| {
                        Error::DriverProtocol(format!("Failed to parse {} response: {}", command, e))
                    });
                }
                "event" => {
                    let event: EventMessage = serde_json::from_value(msg)?;
                    log_event(&event);
                }
                other => {
                    tracing::warn!("Unknown driver message type: {}", other);
                }
            }
        }
    }

    /// Stop the bridge process
    ///
    /// Sends `shutdown` without waiting for an answer, then kills the process
    /// if it is still around. A poisoned client is killed straight away.
    pub async fn terminate(&mut self) -> Result<()> {
        if self.poisoned {
            tracing::debug!(pid = ?self.process.id(), "Killing unresponsive driver");
            let _ = self.process.kill().await;
            return Ok(());
        }

        let _ = self.send_request("shutdown", None).await;

        let exited = tokio::time::timeout(Duration::from_millis(500), self.process.wait()).await;
        if exited.is_err() {
            let _ = self.process.kill().await;
        }

        Ok(())
    }
}

fn log_event(event: &EventMessage) {
    if event.event != "log" {
        tracing::debug!(event = %event.event, "Driver event");
        return;
    }

    let Some(body) = event.body.clone() else {
        return;
    };
    match serde_json::from_value::<LogEventBody>(body) {
        Ok(log) => match log.level.as_str() {
            "error" => tracing::error!(target: "webcase::driver", "{}", log.message),
            "warn" => tracing::warn!(target: "webcase::driver", "{}", log.message),
            "debug" => tracing::debug!(target: "webcase::driver", "{}", log.message),
            _ => tracing::info!(target: "webcase::driver", "{}", log.message),
        },
        Err(e) => tracing::debug!("Malformed driver log event: {}", e),
    }
}

impl Drop for DriverClient {
    fn drop(&mut self) {
        // Best-effort; can't await in drop
        let _ = self.process.start_kill();
    }
}
