//! Mock driver bridge for integration testing
//!
//! Speaks the driver protocol over stdio without a browser. Behavior is
//! scripted through environment variables:
//!
//! - `MOCK_DRIVER_FAIL_ON`: comma-separated commands that fail
//! - `MOCK_DRIVER_FAIL_MESSAGE`: failure text for those commands
//! - `MOCK_DRIVER_LOG`: file that gets one line per received command
//! - `MOCK_DRIVER_REPORT`: path returned by `reportFile`
//! - `MOCK_DRIVER_HANG_ON`: command after which the bridge stops answering

use serde_json::{json, Value};
use std::collections::HashSet;
use std::fs::OpenOptions;
use std::io::{BufRead, BufReader, Read, Write};

fn main() {
    let stdin = std::io::stdin();
    let stdout = std::io::stdout();
    let mut reader = BufReader::new(stdin.lock());
    let mut writer = stdout.lock();

    let mut state = MockState::from_env();

    loop {
        // Read Content-Length header
        let mut header_line = String::new();
        if reader.read_line(&mut header_line).unwrap_or(0) == 0 {
            break; // EOF
        }

        if !header_line.starts_with("Content-Length:") {
            continue;
        }

        let content_length: usize = header_line
            .trim_start_matches("Content-Length:")
            .trim()
            .parse()
            .unwrap_or(0);

        // Read empty line
        let mut empty_line = String::new();
        reader.read_line(&mut empty_line).ok();

        let mut body = vec![0u8; content_length];
        if reader.read_exact(&mut body).is_err() {
            break;
        }

        let message: Value = match serde_json::from_slice(&body) {
            Ok(v) => v,
            Err(_) => continue,
        };

        if state.hung {
            state.record_message(&message);
            continue;
        }

        if message.get("command").and_then(|c| c.as_str()) == Some("shutdown") {
            state.record("shutdown", &Value::Null);
            break;
        }

        if let Some(messages) = state.process_message(&message) {
            for out in messages {
                send_message(&mut writer, &out);
            }
        }
    }
}

fn send_message<W: Write>(writer: &mut W, message: &Value) {
    let body = message.to_string();
    let header = format!("Content-Length: {}\r\n\r\n", body.len());
    writer.write_all(header.as_bytes()).ok();
    writer.write_all(body.as_bytes()).ok();
    writer.flush().ok();
}

struct MockState {
    seq: i64,
    next_handle: u32,
    fail_on: HashSet<String>,
    fail_message: Option<String>,
    log_path: Option<String>,
    report_path: Option<String>,
    hang_on: Option<String>,
    hung: bool,
}

impl MockState {
    fn from_env() -> Self {
        let fail_on = std::env::var("MOCK_DRIVER_FAIL_ON")
            .unwrap_or_default()
            .split(',')
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .map(String::from)
            .collect();

        Self {
            seq: 1,
            next_handle: 1,
            fail_on,
            fail_message: std::env::var("MOCK_DRIVER_FAIL_MESSAGE").ok(),
            log_path: std::env::var("MOCK_DRIVER_LOG").ok(),
            report_path: std::env::var("MOCK_DRIVER_REPORT").ok(),
            hang_on: std::env::var("MOCK_DRIVER_HANG_ON").ok(),
            hung: false,
        }
    }

    fn next_seq(&mut self) -> i64 {
        let seq = self.seq;
        self.seq += 1;
        seq
    }

    fn handle(&mut self, prefix: &str) -> String {
        let id = format!("{}-{}", prefix, self.next_handle);
        self.next_handle += 1;
        id
    }

    fn record(&self, command: &str, arguments: &Value) {
        let Some(path) = &self.log_path else {
            return;
        };
        if let Ok(mut file) = OpenOptions::new().create(true).append(true).open(path) {
            let _ = writeln!(file, "{} {}", command, arguments);
        }
    }

    fn record_message(&self, message: &Value) {
        let command = message
            .get("command")
            .and_then(|c| c.as_str())
            .unwrap_or("unknown");
        let arguments = message.get("arguments").cloned().unwrap_or(Value::Null);
        self.record(command, &arguments);
    }

    fn process_message(&mut self, message: &Value) -> Option<Vec<Value>> {
        if message.get("type")?.as_str()? != "request" {
            return None;
        }

        let command = message.get("command")?.as_str()?.to_string();
        let request_seq = message.get("seq")?.as_i64()?;
        let arguments = message.get("arguments").cloned().unwrap_or(json!({}));
        self.record(&command, &arguments);

        if self.hang_on.as_deref() == Some(command.as_str()) {
            self.hung = true;
            return None;
        }

        let mut messages = Vec::new();

        if self.fail_on.contains(&command) {
            let text = self
                .fail_message
                .clone()
                .unwrap_or_else(|| format!("{} failed in mock driver", command));
            let seq = self.next_seq();
            messages.push(json!({
                "seq": seq,
                "type": "response",
                "request_seq": request_seq,
                "success": false,
                "command": command,
                "message": text
            }));
            return Some(messages);
        }

        let body = match command.as_str() {
            "launch" => json!({ "browserId": self.handle("browser") }),
            "newContext" => json!({ "contextId": self.handle("context") }),
            "newPage" => json!({ "pageId": self.handle("page") }),
            "createAgent" => {
                let model = arguments
                    .pointer("/env/MIDSCENE_MODEL_NAME")
                    .and_then(|m| m.as_str())
                    .unwrap_or("unknown")
                    .to_string();
                let seq = self.next_seq();
                messages.push(json!({
                    "seq": seq,
                    "type": "event",
                    "event": "log",
                    "body": { "level": "info", "message": format!("agent ready for {}", model) }
                }));
                json!({ "agentId": self.handle("agent") })
            }
            "reportFile" => json!({ "path": self.report_path }),
            "goto" | "aiTap" | "aiInput" | "aiWaitFor" | "aiAssert" | "closePage"
            | "closeContext" | "closeBrowser" => json!(null),
            _ => {
                let seq = self.next_seq();
                messages.push(json!({
                    "seq": seq,
                    "type": "response",
                    "request_seq": request_seq,
                    "success": false,
                    "command": command,
                    "message": format!("Unknown command: {}", command)
                }));
                return Some(messages);
            }
        };

        // The response goes out after any events it triggered
        let seq = self.next_seq();
        messages.push(json!({
            "seq": seq,
            "type": "response",
            "request_seq": request_seq,
            "success": true,
            "command": command,
            "body": body
        }));

        Some(messages)
    }
}
