//! Tool handlers for the MCP server.

pub mod retrieve;
