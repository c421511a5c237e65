//! Closed numeric error taxonomy shared across components.
//!
//! Every component owns its own `thiserror` enum (`ConfigError`, `GraphError`, `EmbedError`,
//! `RetrieveError`, `ToolError`); this module only pins down the stable code a failure carries
//! once it reaches the tool boundary, and the shape of the envelope built from it.

use serde::Serialize;
use std::collections::HashMap;

/// A failure originating anywhere in the stack, reduced to its stable numeric code and message.
///
/// Components implement this to let the `ToolAdapter` build a `FailureEnvelope` without matching
/// on every concrete error type.
pub trait CoreError: std::error::Error {
    /// Stable numeric code for this failure, per the closed taxonomy.
    fn code(&self) -> u32;
}

/// Structured failure returned to a tool caller or printed by the CLI.
///
/// Mutually exclusive with a successful result: exactly one of them is produced per invocation.
#[derive(Debug, Clone, Serialize)]
pub struct FailureEnvelope {
    /// Always `true`; present so callers can discriminate success/failure by key alone.
    pub error: bool,
    /// Stable numeric code, see the error taxonomy table.
    pub error_code: u32,
    /// Human-readable message, derived from the originating error's `Display`.
    pub error_message: String,
    /// Free-form supplementary detail, e.g. `{"kind": "Timeout"}`.
    pub error_details: HashMap<String, String>,
    /// Correlation identifier shared with the log records for this invocation.
    pub request_id: String,
}

impl FailureEnvelope {
    /// Build an envelope from any [`CoreError`], with no extra detail fields.
    pub fn from_error(err: &dyn CoreError, request_id: impl Into<String>) -> Self {
        Self {
            error: true,
            error_code: err.code(),
            error_message: err.to_string(),
            error_details: HashMap::new(),
            request_id: request_id.into(),
        }
    }

    /// Build an envelope from raw parts, for cases with no typed error (e.g. caught panics).
    pub fn from_parts(
        code: u32,
        message: impl Into<String>,
        details: HashMap<String, String>,
        request_id: impl Into<String>,
    ) -> Self {
        Self {
            error: true,
            error_code: code,
            error_message: message.into(),
            error_details: details,
            request_id: request_id.into(),
        }
    }
}

/// Reserved code for a caught panic or unexpected runtime fault at the tool boundary.
pub const PANIC_CODE: u32 = 4099;

/// Maximum length of a panic message copied into `error_details.panic`.
pub const PANIC_MESSAGE_LIMIT: usize = 256;

/// Truncate a panic message to [`PANIC_MESSAGE_LIMIT`] bytes on a char boundary.
pub fn truncate_panic_message(message: &str) -> String {
    if message.len() <= PANIC_MESSAGE_LIMIT {
        return message.to_string();
    }
    let mut end = PANIC_MESSAGE_LIMIT;
    while !message.is_char_boundary(end) {
        end -= 1;
    }
    message[..end].to_string()
}
