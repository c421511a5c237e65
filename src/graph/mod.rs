//! Property-graph access: connection lifecycle, vector search, and context expansion.

mod client;
mod types;

pub use client::{GraphBackend, GraphClient};
pub use types::{Context, GraphError, Hit};
