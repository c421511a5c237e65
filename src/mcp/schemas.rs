//! JSON schema builders for MCP tools.

use crate::config::get_config;
use serde_json::{Map, Value};

/// Build the schema describing the `graph_retrieve` tool input.
pub(crate) fn retrieve_input_schema() -> Map<String, Value> {
    let config = get_config();

    let mut properties = Map::new();
    properties.insert(
        "query".into(),
        string_schema("Natural language query to embed and search with"),
    );

    let mut limit_schema = Map::new();
    limit_schema.insert("type".into(), Value::String("integer".into()));
    limit_schema.insert(
        "description".into(),
        Value::String("Maximum number of results to return".into()),
    );
    limit_schema.insert("minimum".into(), Value::Number(1.into()));
    limit_schema.insert(
        "default".into(),
        Value::Number(serde_json::Number::from(config.retrieval_default_limit as u64)),
    );
    limit_schema.insert(
        "maximum".into(),
        Value::Number(serde_json::Number::from(config.retrieval_max_limit as u64)),
    );
    properties.insert("limit".into(), Value::Object(limit_schema));

    finalize_object_schema(properties, &["query"])
}

fn string_schema(description: &str) -> Value {
    let mut schema = Map::new();
    schema.insert("type".into(), Value::String("string".into()));
    schema.insert("description".into(), Value::String(description.into()));
    Value::Object(schema)
}

fn finalize_object_schema(properties: Map<String, Value>, required: &[&str]) -> Map<String, Value> {
    let mut schema = Map::new();
    schema.insert("type".into(), Value::String("object".into()));
    schema.insert("properties".into(), Value::Object(properties));
    if !required.is_empty() {
        schema.insert(
            "required".into(),
            Value::Array(
                required
                    .iter()
                    .map(|&key| Value::String(key.into()))
                    .collect(),
            ),
        );
    }
    schema.insert("additionalProperties".into(), Value::Bool(false));
    schema
}
