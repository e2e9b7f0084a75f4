//! Stdio JSON-RPC server — read loop, per-request tasks, single writer.
//!
//! Requests may be served concurrently; each spawns its own task and the
//! writer task owns the output stream, so responses never interleave
//! mid-line. Response order is whatever completion order is — callers match
//! on the JSON-RPC id.

use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncWrite, BufReader};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::rpc::codec::{self, INVALID_REQUEST, PARSE_ERROR};
use crate::rpc::router;
use crate::tools::Dispatcher;
use crate::types::RpcConfig;

/// Protocol endpoint over stdin/stdout.
#[derive(Debug)]
pub struct RpcServer {
    dispatcher: Arc<Dispatcher>,
    config: RpcConfig,
    cancel: CancellationToken,
}

impl RpcServer {
    pub fn new(dispatcher: Dispatcher, config: RpcConfig) -> Self {
        Self {
            dispatcher: Arc::new(dispatcher),
            config,
            cancel: CancellationToken::new(),
        }
    }

    /// Request graceful shutdown.
    pub fn shutdown(&self) {
        self.cancel.cancel();
    }

    /// Serve on stdin/stdout until EOF or shutdown.
    pub async fn serve(&self) -> std::io::Result<()> {
        let reader = BufReader::new(tokio::io::stdin());
        let writer = tokio::io::stdout();
        self.serve_streams(reader, writer).await
    }

    /// Serve on arbitrary streams (used by tests with in-memory pipes).
    pub async fn serve_streams<R, W>(&self, mut reader: R, mut writer: W) -> std::io::Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin + Send + 'static,
    {
        let (tx, mut rx) = mpsc::channel::<serde_json::Value>(self.config.response_channel_capacity);

        // Writer task: sole owner of the output stream.
        let writer_task = tokio::spawn(async move {
            while let Some(message) = rx.recv().await {
                if let Err(e) = codec::write_line(&mut writer, &message).await {
                    tracing::error!("response write failed: {e}");
                    break;
                }
            }
        });

        tracing::info!("hospital bridge listening on stdio");

        loop {
            tokio::select! {
                _ = self.cancel.cancelled() => {
                    tracing::info!("rpc server shutting down");
                    break;
                }
                line = codec::read_line(&mut reader, self.config.max_line_bytes) => {
                    let line = match line? {
                        Some(l) => l,
                        None => {
                            tracing::info!("stdin closed, shutting down");
                            break;
                        }
                    };
                    if line.is_empty() {
                        continue;
                    }
                    self.handle_line(line, tx.clone()).await;
                }
            }
        }

        // Drop our sender so the writer drains and exits.
        drop(tx);
        let _ = writer_task.await;
        Ok(())
    }

    async fn handle_line(&self, line: String, tx: mpsc::Sender<serde_json::Value>) {
        // Parse and request-shape failures are distinct JSON-RPC errors:
        // unparseable text is -32700, valid JSON that is not a request
        // object is -32600.
        let raw: serde_json::Value = match serde_json::from_str(&line) {
            Ok(v) => v,
            Err(e) => {
                tracing::warn!("unparseable request: {e}");
                let reply = codec::error_response(
                    serde_json::Value::Null,
                    PARSE_ERROR,
                    "request is not valid JSON",
                );
                let _ = tx.send(reply).await;
                return;
            }
        };

        let request: codec::Request = match serde_json::from_value(raw.clone()) {
            Ok(r) => r,
            Err(e) => {
                tracing::warn!("malformed request object: {e}");
                // Only answer if the frame carried an id; an id-less
                // malformed frame has nothing to correlate a reply with.
                if let Some(id) = raw.get("id").cloned() {
                    let reply = codec::error_response(
                        id,
                        INVALID_REQUEST,
                        "request is not a valid JSON-RPC request object",
                    );
                    let _ = tx.send(reply).await;
                }
                return;
            }
        };

        if request.is_notification() {
            tracing::debug!(method = %request.method, "notification received");
            return;
        }

        // Per-request task: invocations are independent, only the pool is
        // shared.
        let dispatcher = Arc::clone(&self.dispatcher);
        tokio::spawn(async move {
            let id = request.id.unwrap_or(serde_json::Value::Null);
            let reply = match router::route_request(&dispatcher, &request.method, request.params)
                .await
            {
                Ok(result) => codec::response(id, result),
                Err(err) => {
                    codec::error_response(id, router::jsonrpc_code(&err), &err.to_string())
                }
            };
            let _ = tx.send(reply).await;
        });
    }
}
