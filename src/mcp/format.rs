//! Formatting helpers shared across MCP handlers and resources.

use crate::embedding::ModelInfo;
use rmcp::model::ResourceContents;
use schemars::JsonSchema;
use serde::Serialize;
use serde_json::{Value, json};

pub(crate) const APPLICATION_JSON: &str = "application/json";

/// Build the health payload summarizing graph reachability and embedding model identity.
pub(crate) fn health_payload(reachable: bool, index_present: bool, embedding: &ModelInfo) -> String {
    let payload = json!({
        "reachable": reachable,
        "index_present": index_present,
        "embedding": {
            "model_id": embedding.model_id,
            "dimension": embedding.dimension,
        },
    });

    serde_json::to_string_pretty(&payload).unwrap_or_else(|_| payload.to_string())
}

/// Top-level settings snapshot describing retrieval defaults.
#[derive(Debug, Serialize, JsonSchema)]
pub(crate) struct SettingsSnapshot {
    /// Default result limit when callers omit `limit`.
    pub(crate) default_limit: usize,
    /// Maximum result limit the server accepts.
    pub(crate) max_limit: usize,
    /// Per-call timeout, in milliseconds, applied to embed/search/expand stages.
    pub(crate) timeout_per_call_millis: u64,
}

/// Serialize a value to JSON, falling back to compact formatting on error.
pub(crate) fn serialize_json<T: Serialize>(value: &T, context_uri: &str) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|error| {
        tracing::warn!(uri = context_uri, %error, "Failed to serialize JSON prettily");
        serde_json::to_string(value).unwrap_or_else(|_| "{}".into())
    })
}

/// Build JSON resource contents for MCP resource responses.
pub(crate) fn json_resource_contents(uri: &str, text: String) -> ResourceContents {
    ResourceContents::TextResourceContents {
        uri: uri.to_string(),
        mime_type: Some(APPLICATION_JSON.into()),
        text,
        meta: None,
    }
}

/// Build the JSON object returned as a successful `graph_retrieve` envelope.
pub(crate) fn success_envelope(
    results: &[crate::retriever::ResultRow],
    total_results: usize,
    request_id: &str,
) -> Value {
    json!({
        "results": results,
        "total_results": total_results,
        "request_id": request_id,
    })
}
