//! MCP server over stdio
//!
//! Newline-delimited JSON-RPC 2.0. Tool failures are reported inside the
//! tool result; only malformed traffic gets a JSON-RPC error.

pub mod protocol;
pub mod tools;

use serde_json::{Value, json};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tracing::{debug, info, warn};

use crate::app::App;
use protocol::{
    CallToolParams, INTERNAL_ERROR, INVALID_PARAMS, INVALID_REQUEST, JSONRPC_VERSION,
    JsonRpcRequest, JsonRpcResponse, METHOD_NOT_FOUND, PARSE_ERROR, PROTOCOL_VERSION,
};

type RpcResult = Result<Value, (i32, String)>;

pub struct McpServer<'a> {
    app: &'a App,
}

impl<'a> McpServer<'a> {
    pub fn new(app: &'a App) -> Self {
        Self { app }
    }

    /// Serve stdin/stdout until the client closes stdin.
    pub async fn run_stdio(&self) -> anyhow::Result<()> {
        let reader = BufReader::new(tokio::io::stdin());
        self.serve(reader, tokio::io::stdout()).await
    }

    pub async fn serve<R, W>(&self, reader: R, mut writer: W) -> anyhow::Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut lines = reader.lines();
        while let Some(line) = lines.next_line().await? {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            if let Some(response) = self.handle_message(line).await {
                let encoded = serde_json::to_string(&response)?;
                writer.write_all(encoded.as_bytes()).await?;
                writer.write_all(b"\n").await?;
                writer.flush().await?;
            }
        }
        info!("client closed the connection");
        Ok(())
    }

    async fn handle_message(&self, message: &str) -> Option<JsonRpcResponse> {
        let raw: Value = match serde_json::from_str(message) {
            Ok(v) => v,
            Err(e) => {
                warn!(error = %e, "unparseable message");
                return Some(JsonRpcResponse::error(Value::Null, PARSE_ERROR, format!("parse error: {e}")));
            }
        };
        let id = raw.get("id").cloned();

        let request: JsonRpcRequest = match serde_json::from_value(raw) {
            Ok(r) => r,
            Err(e) => {
                return Some(JsonRpcResponse::error(
                    id.unwrap_or(Value::Null),
                    INVALID_REQUEST,
                    format!("invalid request: {e}"),
                ));
            }
        };
        if request.jsonrpc != JSONRPC_VERSION {
            return Some(JsonRpcResponse::error(
                id.unwrap_or(Value::Null),
                INVALID_REQUEST,
                format!("unsupported jsonrpc version {:?}", request.jsonrpc),
            ));
        }

        let Some(id) = request.id else {
            debug!(method = %request.method, "notification");
            return None;
        };

        Some(match self.handle_request(&request.method, request.params).await {
            Ok(result) => JsonRpcResponse::success(id, result),
            Err((code, message)) => JsonRpcResponse::error(id, code, message),
        })
    }

    async fn handle_request(&self, method: &str, params: Option<Value>) -> RpcResult {
        match method {
            "initialize" => Ok(json!({
                "protocolVersion": PROTOCOL_VERSION,
                "capabilities": {"tools": {}},
                "serverInfo": {"name": "ghctl", "version": env!("CARGO_PKG_VERSION")}
            })),
            "ping" => Ok(json!({})),
            "tools/list" => to_value(&json!({ "tools": tools::all_tools() })),
            "tools/call" => self.call_tool(params).await,
            other => {
                warn!(method = other, "unknown method");
                Err((METHOD_NOT_FOUND, format!("method not found: {other}")))
            }
        }
    }

    async fn call_tool(&self, params: Option<Value>) -> RpcResult {
        let params: CallToolParams = params
            .ok_or_else(|| (INVALID_PARAMS, "missing params".to_string()))
            .and_then(|p| {
                serde_json::from_value(p).map_err(|e| (INVALID_PARAMS, format!("invalid params: {e}")))
            })?;
        if !tools::is_known(&params.name) {
            return Err((INVALID_PARAMS, format!("unknown tool: {}", params.name)));
        }

        info!(tool = %params.name, "tool call");
        let result = tools::call_tool(self.app, &params.name, params.arguments).await;
        to_value(&result)
    }
}

fn to_value<T: serde::Serialize>(value: &T) -> RpcResult {
    serde_json::to_value(value).map_err(|e| (INTERNAL_ERROR, format!("serialization error: {e}")))
}
