//! Handler for the `graph_retrieve` tool.

use std::sync::Arc;

use crate::errors::{CoreError, FailureEnvelope, PANIC_CODE, truncate_panic_message};
use crate::mcp::ToolError;
use crate::mcp::format::success_envelope;
use crate::retriever::Retrieve;
use rmcp::{
    ErrorData as McpError,
    model::{CallToolResult, JsonObject},
};
use serde::Deserialize;
use uuid::Uuid;

/// Raw `graph_retrieve` input accepted from MCP clients.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RetrieveToolRequest {
    query: String,
    #[serde(default)]
    limit: Option<usize>,
}

/// Handle the `graph_retrieve` tool by running the full retrieval pipeline.
///
/// Never raises to the host: every outcome, success or failure, is returned as a structured
/// `CallToolResult` so callers can rely on the envelope shapes from the tool contract.
pub(crate) async fn handle_retrieve(
    retriever: &Arc<dyn Retrieve>,
    arguments: Option<JsonObject>,
) -> Result<CallToolResult, McpError> {
    let request_id = Uuid::new_v4().to_string();
    let started = std::time::Instant::now();

    let args: RetrieveToolRequest = match parse_request(arguments) {
        Ok(args) => args,
        Err(err) => {
            tracing::warn!(request_id = %request_id, error = %err, "Rejected graph_retrieve call");
            let envelope = FailureEnvelope::from_error(&err, &request_id);
            return Ok(CallToolResult::structured(
                serde_json::to_value(envelope).unwrap_or_default(),
            ));
        }
    };

    let retriever = retriever.clone();
    let query = args.query;
    let limit = args.limit;

    // The per-call timeout is enforced inside `Retriever::retrieve`, independently for each of
    // the embed/vector-search/expand stages, so the phase-appropriate code (3002 vs. 2004)
    // survives instead of being flattened into one coarse timeout here. This spawn exists solely
    // for panic containment.
    let spawned = tokio::spawn(async move { retriever.retrieve(&query, limit).await });

    let outcome = match spawned.await {
        Ok(retrieve_result) => retrieve_result,
        Err(join_err) => {
            let message = truncate_panic_message(&join_err.to_string());
            tracing::error!(request_id = %request_id, panic = %message, "graph_retrieve task panicked");
            let mut details = std::collections::HashMap::new();
            details.insert("panic".to_string(), message);
            let envelope =
                FailureEnvelope::from_parts(PANIC_CODE, "Internal error", details, &request_id);
            let duration_ms = started.elapsed().as_millis();
            tracing::info!(request_id = %request_id, duration_ms, outcome = "error", code = PANIC_CODE, "retrieve");
            return Ok(CallToolResult::structured(
                serde_json::to_value(envelope).unwrap_or_default(),
            ));
        }
    };

    let duration_ms = started.elapsed().as_millis();
    match outcome {
        Ok(result) => {
            tracing::info!(request_id = %request_id, duration_ms, outcome = "success", total_results = result.total_results, "retrieve");
            let payload = success_envelope(&result.rows, result.total_results, &request_id);
            Ok(CallToolResult::structured(payload))
        }
        Err(err) => {
            tracing::info!(request_id = %request_id, duration_ms, outcome = "error", code = err.code(), "retrieve");
            let mut details = std::collections::HashMap::new();
            if err.is_timeout() {
                details.insert("kind".to_string(), "Timeout".to_string());
            }
            let envelope =
                FailureEnvelope::from_parts(err.code(), err.to_string(), details, &request_id);
            Ok(CallToolResult::structured(
                serde_json::to_value(envelope).unwrap_or_default(),
            ))
        }
    }
}

fn parse_request(arguments: Option<JsonObject>) -> Result<RetrieveToolRequest, ToolError> {
    let value = arguments
        .map(serde_json::Value::Object)
        .unwrap_or_else(|| serde_json::Value::Object(JsonObject::new()));
    serde_json::from_value(value).map_err(|err| ToolError::Params(err.to_string()))
}
