//! Method router — routes JSON-RPC methods, delegates tool calls to the
//! dispatcher.
//!
//! Tool-call failures travel the same channel as successes: they come back as
//! tagged `isError` results, never as protocol-level errors. JSON-RPC errors
//! are reserved for malformed frames, unknown methods, and unusable
//! parameters.

use serde_json::Value;

use crate::rpc::codec::{INTERNAL_ERROR, INVALID_PARAMS, METHOD_NOT_FOUND, PARSE_ERROR};
use crate::tools::{Dispatcher, ToolCallRequest, ToolDefinition};
use crate::types::{Error, Result};

/// MCP protocol revision advertised during initialize.
pub const PROTOCOL_VERSION: &str = "2024-11-05";

/// Route one JSON-RPC request to its handler.
///
/// `Err` here means a protocol-level rejection; the server converts it into a
/// JSON-RPC error object via [`jsonrpc_code`].
pub async fn route_request(dispatcher: &Dispatcher, method: &str, params: Value) -> Result<Value> {
    match method {
        "initialize" => Ok(initialize_result()),

        "ping" => Ok(serde_json::json!({})),

        "tools/list" => {
            let tools: Vec<Value> = dispatcher
                .catalog()
                .list()
                .into_iter()
                .map(tool_descriptor)
                .collect();
            Ok(serde_json::json!({ "tools": tools }))
        }

        "tools/call" => {
            let request: ToolCallRequest = serde_json::from_value(params)
                .map_err(|e| Error::invalid_argument(format!("invalid tool call params: {e}")))?;

            tracing::info!(tool = %request.name, "tool call");
            match dispatcher.invoke(&request).await {
                Ok(rows) => {
                    let text = serde_json::to_string(&rows)?;
                    Ok(call_result(text, false))
                }
                Err(err) if err.is_validation() => {
                    // Rejected before any query ran; caller error, not ours.
                    tracing::info!(tool = %request.name, code = err.wire_code(), "tool call rejected: {err}");
                    Ok(call_result(format!("{}: {}", err.wire_code(), err), true))
                }
                Err(err) => {
                    tracing::warn!(tool = %request.name, code = err.wire_code(), "tool call failed: {err}");
                    Ok(call_result(format!("{}: {}", err.wire_code(), err), true))
                }
            }
        }

        other => Err(Error::method_not_found(other)),
    }
}

/// Map an application error to its JSON-RPC error code.
pub fn jsonrpc_code(err: &Error) -> i64 {
    match err {
        Error::MethodNotFound(_) => METHOD_NOT_FOUND,
        Error::MissingArgument(_) | Error::InvalidArgument(_) => INVALID_PARAMS,
        Error::Serialization(_) => PARSE_ERROR,
        _ => INTERNAL_ERROR,
    }
}

fn initialize_result() -> Value {
    serde_json::json!({
        "protocolVersion": PROTOCOL_VERSION,
        "capabilities": {
            "tools": {},
        },
        "serverInfo": {
            "name": env!("CARGO_PKG_NAME"),
            "version": env!("CARGO_PKG_VERSION"),
        },
    })
}

/// Advertised tool descriptor: name, description, argument schema. The
/// catalog's declared surface is all a caller ever sees.
fn tool_descriptor(def: &ToolDefinition) -> Value {
    serde_json::json!({
        "name": def.name,
        "description": def.description,
        "inputSchema": def.input_schema(),
    })
}

/// MCP tool result envelope.
fn call_result(text: String, is_error: bool) -> Value {
    serde_json::json!({
        "content": [{ "type": "text", "text": text }],
        "isError": is_error,
    })
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::adapter::{BindValue, QueryExecutor, RowMap};
    use crate::tools::catalog::ColumnDef;
    use crate::tools::hospital;
    use async_trait::async_trait;
    use std::sync::Arc;

    struct EmptyExecutor;

    #[async_trait]
    impl QueryExecutor for EmptyExecutor {
        async fn execute(
            &self,
            _template: &str,
            _params: &[BindValue],
            _columns: &[ColumnDef],
        ) -> Result<Vec<RowMap>> {
            Ok(Vec::new())
        }
    }

    fn test_dispatcher() -> Dispatcher {
        let catalog = Arc::new(hospital::build_catalog().unwrap());
        Dispatcher::new(catalog, Arc::new(EmptyExecutor))
    }

    #[tokio::test]
    async fn initialize_advertises_tool_capability() {
        let d = test_dispatcher();
        let result = route_request(&d, "initialize", Value::Null).await.unwrap();
        assert_eq!(result["protocolVersion"], PROTOCOL_VERSION);
        assert!(result["capabilities"]["tools"].is_object());
        assert_eq!(result["serverInfo"]["name"], "hospital-bridge");
    }

    #[tokio::test]
    async fn tools_list_contains_all_five() {
        let d = test_dispatcher();
        let result = route_request(&d, "tools/list", Value::Null).await.unwrap();
        let tools = result["tools"].as_array().unwrap();
        assert_eq!(tools.len(), 5);
        assert!(tools.iter().all(|t| t["inputSchema"]["type"] == "object"));
    }

    #[tokio::test]
    async fn tools_call_success_is_not_error() {
        let d = test_dispatcher();
        let params = serde_json::json!({
            "name": "list_doctors_by_department",
            "arguments": {"department_id": 99},
        });
        let result = route_request(&d, "tools/call", params).await.unwrap();
        assert_eq!(result["isError"], false);
        assert_eq!(result["content"][0]["text"], "[]");
    }

    #[tokio::test]
    async fn tools_call_failure_is_tagged_not_protocol_error() {
        let d = test_dispatcher();
        let params = serde_json::json!({
            "name": "drop_all",
            "arguments": {},
        });
        let result = route_request(&d, "tools/call", params).await.unwrap();
        assert_eq!(result["isError"], true);
        let text = result["content"][0]["text"].as_str().unwrap();
        assert!(text.starts_with("UNKNOWN_TOOL"));
    }

    #[tokio::test]
    async fn tools_call_without_name_is_invalid_params() {
        let d = test_dispatcher();
        let err = route_request(&d, "tools/call", serde_json::json!({}))
            .await
            .unwrap_err();
        assert_eq!(jsonrpc_code(&err), INVALID_PARAMS);
    }

    #[tokio::test]
    async fn unknown_method_maps_to_method_not_found() {
        let d = test_dispatcher();
        let err = route_request(&d, "resources/list", Value::Null)
            .await
            .unwrap_err();
        assert_eq!(jsonrpc_code(&err), METHOD_NOT_FOUND);
    }
}
