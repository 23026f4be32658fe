//! Newline-delimited JSON client for an engine running as a child process.
//!
//! Requests go out as `{"id", "method", "params"}` lines on the child's
//! stdin; the child answers with `{"id", "result"}` or `{"id", "error"}`
//! lines on stdout. Responses are correlated by id — unparseable lines and
//! stale or unknown ids are skipped, so the client tolerates engines that
//! interleave notifications with answers. The channel is used sequentially
//! under a mutex; the resolvers are sequential by design, so nothing queues
//! behind it in practice.

use super::{AnalysisEngine, EngineError, EngineResult, ReferenceEntry};
use crate::outline::OutlineNode;
use crate::types::{FileSpan, Position, Range};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tokio::sync::Mutex;
use tracing::debug;

#[derive(Serialize)]
struct Request<'a, P: Serialize> {
    id: u64,
    method: &'a str,
    params: P,
}

#[derive(Deserialize)]
struct Response {
    #[serde(default)]
    id: Option<u64>,
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<WireError>,
}

#[derive(Deserialize)]
struct WireError {
    message: String,
}

#[derive(Serialize)]
struct PositionParams<'a> {
    uri: &'a str,
    position: Position,
}

#[derive(Serialize)]
struct RangeParams<'a> {
    uri: &'a str,
    range: Range,
}

#[derive(Serialize)]
struct UriParams<'a> {
    uri: &'a str,
}

struct Channel {
    stdin: ChildStdin,
    stdout: Lines<BufReader<ChildStdout>>,
    next_id: u64,
}

/// An [`AnalysisEngine`] implementation over a spawned engine process.
pub struct StdioEngine {
    channel: Mutex<Channel>,
    child: Mutex<Child>,
    timeout: Duration,
}

impl StdioEngine {
    /// Spawn the engine command and take over its stdio.
    pub async fn spawn(command: &str, args: &[String], timeout: Duration) -> EngineResult<Self> {
        let mut child = Command::new(command)
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()?;

        let stdin = child.stdin.take().ok_or(EngineError::ChannelClosed)?;
        let stdout = child.stdout.take().ok_or(EngineError::ChannelClosed)?;

        Ok(Self {
            channel: Mutex::new(Channel {
                stdin,
                stdout: BufReader::new(stdout).lines(),
                next_id: 1,
            }),
            child: Mutex::new(child),
            timeout,
        })
    }

    /// Terminate the engine process. Errors are ignored; the process may
    /// already have exited.
    pub async fn shutdown(self) {
        let mut child = self.child.into_inner();
        let _ = child.kill().await;
    }

    async fn request<P, R>(&self, method: &str, params: P) -> EngineResult<R>
    where
        P: Serialize,
        R: DeserializeOwned,
    {
        let mut channel = self.channel.lock().await;
        let id = channel.next_id;
        channel.next_id += 1;

        let mut line = serde_json::to_string(&Request { id, method, params })
            .map_err(|e| EngineError::Protocol(e.to_string()))?;
        line.push('\n');

        let exchange = async {
            channel.stdin.write_all(line.as_bytes()).await?;
            channel.stdin.flush().await?;

            loop {
                let reply = channel
                    .stdout
                    .next_line()
                    .await?
                    .ok_or(EngineError::ChannelClosed)?;

                let response: Response = match serde_json::from_str(&reply) {
                    Ok(response) => response,
                    Err(err) => {
                        debug!(target: "engine", "skipping unparseable line: {err}");
                        continue;
                    }
                };

                match response.id {
                    Some(got) if got == id => {}
                    other => {
                        debug!(target: "engine", "skipping response for id {other:?}");
                        continue;
                    }
                }

                if let Some(error) = response.error {
                    return Err(EngineError::Engine(error.message));
                }

                let value = response.result.unwrap_or(Value::Null);
                return serde_json::from_value(value)
                    .map_err(|e| EngineError::Protocol(e.to_string()));
            }
        };

        tokio::time::timeout(self.timeout, exchange)
            .await
            .map_err(|_| EngineError::Timeout(self.timeout))?
    }
}

#[async_trait]
impl AnalysisEngine for StdioEngine {
    async fn definition(&self, uri: &str, position: Position) -> EngineResult<Vec<FileSpan>> {
        self.request("definition", PositionParams { uri, position })
            .await
    }

    async fn references(&self, uri: &str, range: Range) -> EngineResult<Vec<ReferenceEntry>> {
        self.request("references", RangeParams { uri, range }).await
    }

    async fn symbol_outline(&self, uri: &str) -> EngineResult<Option<OutlineNode>> {
        self.request("symbolOutline", UriParams { uri }).await
    }
}
