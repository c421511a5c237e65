use std::{env, sync::Once};

use graphrag_retriever::config;
use graphrag_retriever::graph::GraphClient;

static INIT: Once = Once::new();

fn set_default_env(key: &str, value: &str) {
    let needs_value = env::var(key).map(|v| v.trim().is_empty()).unwrap_or(true);
    if needs_value {
        // SAFETY: Tests run serially via Once and we intentionally mutate process env.
        unsafe {
            env::set_var(key, value);
        }
    }
}

fn init_config_once() {
    INIT.call_once(|| {
        set_default_env("GRAPH_ENDPOINT", "bolt://127.0.0.1:7687");
        set_default_env("GRAPH_USERNAME", "neo4j");
        set_default_env("GRAPH_PASSWORD", "neo4j");
        set_default_env("GRAPH_DATABASE", "neo4j");
        set_default_env("VECTOR_INDEX_NAME", "chunk_embeddings");
        set_default_env("VECTOR_DIMENSION", "768");
        set_default_env("EMBEDDING_MODEL_ID", "nomic-embed-text");
        config::init_config();
    });
}

#[tokio::test]
#[ignore = "Requires a live Neo4j instance with the configured vector index"]
async fn live_graph_ping_reports_index_presence() {
    init_config_once();
    let config = config::get_config();
    let client = GraphClient::connect(
        &config.graph_endpoint,
        &config.graph_username,
        &config.graph_password,
        &config.graph_database,
        config.vector_index_name.clone(),
    )
    .await
    .expect("failed to connect to graph database");

    let index_present = client.ping().await.expect("ping should succeed");
    assert!(
        index_present,
        "configured vector index should exist: {}",
        config.vector_index_name
    );
}
