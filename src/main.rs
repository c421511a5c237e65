//! CLI entry point driving the same Retriever/GraphClient/Embedder stack as the MCP binary.

use clap::{Parser, Subcommand};
use graphrag_retriever::bootstrap::BootstrapError;
use graphrag_retriever::errors::{CoreError, FailureEnvelope};
use graphrag_retriever::{bootstrap, config, logging};
use serde_json::json;
use std::collections::HashMap;
use uuid::Uuid;

#[derive(Parser)]
#[command(name = "graphrag-retriever", about = "GraphRAG retrieval CLI")]
struct Cli {
    /// Override `APP_CONFIG_PATH` before configuration load for this invocation.
    #[arg(long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Report graph reachability, index presence, and embedding model identity.
    Status,
    /// Run a retrieval for `text` and print the result envelope.
    Query {
        /// Natural language query text.
        text: String,
        /// Maximum number of results to return.
        #[arg(long)]
        limit: Option<usize>,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    if let Some(path) = &cli.config {
        // SAFETY: single-threaded at this point in startup, before any other code reads env.
        unsafe {
            std::env::set_var("APP_CONFIG_PATH", path);
        }
    }

    config::init_config();
    logging::init_tracing();

    let request_id = Uuid::new_v4().to_string();

    let exit_code = match cli.command {
        Command::Status => run_status(&request_id).await,
        Command::Query { text, limit } => run_query(&text, limit, &request_id).await,
    };

    std::process::exit(exit_code);
}

async fn run_status(request_id: &str) -> i32 {
    let stack = match bootstrap::init_stack().await {
        Ok(stack) => stack,
        Err(err) => return print_bootstrap_failure(&err, request_id),
    };

    let (reachable, index_present) = match stack.graph.ping().await {
        Ok(index_present) => (true, index_present),
        Err(_) => (false, false),
    };
    let info = stack.embedder.info();
    stack.graph.close();

    let payload = json!({
        "reachable": reachable,
        "index_present": index_present,
        "embedding": {
            "model_id": info.model_id,
            "dimension": info.dimension,
        },
        "request_id": request_id,
    });
    println!("{}", serde_json::to_string_pretty(&payload).unwrap_or_default());
    0
}

async fn run_query(text: &str, limit: Option<usize>, request_id: &str) -> i32 {
    let stack = match bootstrap::init_stack().await {
        Ok(stack) => stack,
        Err(err) => return print_bootstrap_failure(&err, request_id),
    };

    let result = stack.retriever.retrieve(text, limit).await;
    stack.graph.close();

    match result {
        Ok(result) => {
            let payload = json!({
                "results": result.rows,
                "total_results": result.total_results,
                "request_id": request_id,
            });
            println!("{}", serde_json::to_string_pretty(&payload).unwrap_or_default());
            0
        }
        Err(err) => {
            let envelope = FailureEnvelope::from_error(&err, request_id);
            println!("{}", serde_json::to_string_pretty(&envelope).unwrap_or_default());
            1
        }
    }
}

fn print_bootstrap_failure(err: &BootstrapError, request_id: &str) -> i32 {
    let mut details = HashMap::new();
    details.insert("stage".to_string(), "bootstrap".to_string());
    let envelope = FailureEnvelope::from_parts(err.code(), err.to_string(), details, request_id);
    println!("{}", serde_json::to_string_pretty(&envelope).unwrap_or_default());
    1
}
