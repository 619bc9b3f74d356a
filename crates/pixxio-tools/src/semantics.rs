//! MCP `ToolAnnotations` for DAM tools, derived from the HTTP method each tool issues.

use reqwest::Method;
use rmcp::model::ToolAnnotations;

/// Annotations for a tool backed by a single DAM request with `method`.
///
/// `openWorldHint` is always `true`: every tool talks to the remote DAM.
#[must_use]
pub fn annotations_for_method(title: &str, method: &Method) -> ToolAnnotations {
    let (read_only, destructive, idempotent) = match *method {
        Method::GET | Method::HEAD | Method::OPTIONS => (Some(true), Some(false), Some(true)),
        Method::POST => (Some(false), Some(false), Some(false)),
        Method::PUT | Method::DELETE => (Some(false), Some(true), Some(true)),
        // PATCH may or may not be idempotent; do not guess.
        Method::PATCH => (Some(false), Some(true), None),
        _ => (None, None, None),
    };

    ToolAnnotations {
        title: Some(title.to_string()),
        read_only_hint: read_only,
        destructive_hint: destructive,
        idempotent_hint: idempotent,
        open_world_hint: Some(true),
    }
}

/// Annotations for tools built on `POST /files/{id}/convert`.
///
/// Conversion only generates a download link; the asset itself is never modified.
#[must_use]
pub fn annotations_for_conversion(title: &str) -> ToolAnnotations {
    ToolAnnotations {
        idempotent_hint: Some(false),
        ..annotations_for_method(title, &Method::GET)
    }
}
