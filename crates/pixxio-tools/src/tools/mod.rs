//! The MCP tool surface.
//!
//! Each tool is a thin pipeline: validate arguments, resolve credentials, call the DAM, normalize
//! the response. Tool failures are reported as `isError` results (see [`error_result`]); only an
//! unknown tool name is returned as [`PixxioError::UnknownTool`].

mod assets;
mod create;
mod downloads;
mod listing;
pub mod params;
mod schema;


use crate::client::PixxioClient;
use crate::config::{ApiContext, CredentialOverrides, PixxioSettings};
use crate::error::{PixxioError, Result};
use crate::model::AssetId;
use crate::semantics::{annotations_for_conversion, annotations_for_method};
use reqwest::Method;
use rmcp::model::{CallToolResult, Content, JsonObject, Tool, ToolAnnotations};
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

/// Identifies a served tool independent of the name it was called by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolKind {
    Search,
    Fetch,
    GetDownloadUrl,
    GetPreview,
    DownloadAsset,
    ListDirectories,
    ListCollections,
    GetKeywords,
    UpdateAsset,
    GetMetadataFields,
    GetDownloadFormats,
    CreateCollection,
    CreateExternalShare,
}

struct ToolEntry {
    kind: ToolKind,
    name: &'static str,
    /// Older names still accepted by `tools/call` but not listed.
    aliases: &'static [&'static str],
    description: &'static str,
    input_schema: Value,
    annotations: ToolAnnotations,
}

fn entry(
    kind: ToolKind,
    name: &'static str,
    aliases: &'static [&'static str],
    description: &'static str,
    input_schema: Value,
    annotations: ToolAnnotations,
) -> ToolEntry {
    ToolEntry {
        kind,
        name,
        aliases,
        description,
        input_schema,
        annotations,
    }
}

fn catalog() -> Vec<ToolEntry> {
    vec![
        entry(
            ToolKind::Search,
            "search",
            &["pixxio_search_assets"],
            "Search assets in the pixx.io DAM by text, file type, extension, directory or collection. \
             Supports sorting and offset pagination.",
            schema::search(),
            annotations_for_method("Search assets", &Method::GET),
        ),
        entry(
            ToolKind::Fetch,
            "fetch",
            &["pixxio_get_asset_details"],
            "Get the full details of a single asset by ID.",
            schema::fetch(),
            annotations_for_method("Get asset details", &Method::GET),
        ),
        entry(
            ToolKind::GetDownloadUrl,
            "get_download_url",
            &[],
            "Generate a download URL for an asset: original, preview, custom rendition or a \
             configured download format.",
            schema::convert(),
            annotations_for_conversion("Get download URL"),
        ),
        entry(
            ToolKind::GetPreview,
            "get_preview",
            &[],
            "Return a preview image of an asset inline.",
            schema::preview(),
            annotations_for_conversion("Get preview image"),
        ),
        entry(
            ToolKind::DownloadAsset,
            "download_asset",
            &[],
            "Download an asset to the server's download directory and report the local path.",
            schema::download(),
            annotations_for_conversion("Download asset"),
        ),
        entry(
            ToolKind::ListDirectories,
            "list_directories",
            &[],
            "List directories, optionally below a parent or as a nested tree.",
            schema::directories(),
            annotations_for_method("List directories", &Method::GET),
        ),
        entry(
            ToolKind::ListCollections,
            "list_collections",
            &[],
            "List collections with page-based pagination.",
            schema::paged(),
            annotations_for_method("List collections", &Method::GET),
        ),
        entry(
            ToolKind::GetKeywords,
            "get_keywords",
            &[],
            "List keywords used in the DAM, optionally filtered by a search term.",
            schema::keywords(),
            annotations_for_method("List keywords", &Method::GET),
        ),
        entry(
            ToolKind::UpdateAsset,
            "update_asset",
            &[],
            "Update an asset's description, subject, keywords, rating or metadata fields.",
            schema::update_asset(),
            annotations_for_method("Update asset", &Method::PUT),
        ),
        entry(
            ToolKind::GetMetadataFields,
            "get_metadata_fields",
            &[],
            "List the metadata fields configured in the DAM.",
            schema::format_only(),
            annotations_for_method("List metadata fields", &Method::GET),
        ),
        entry(
            ToolKind::GetDownloadFormats,
            "get_download_formats",
            &[],
            "List the configured download formats (usable as download_format_id).",
            schema::format_only(),
            annotations_for_method("List download formats", &Method::GET),
        ),
        entry(
            ToolKind::CreateCollection,
            "create_collection",
            &[],
            "Create a collection, optionally seeded with assets.",
            schema::create_collection(),
            annotations_for_method("Create collection", &Method::POST),
        ),
        entry(
            ToolKind::CreateExternalShare,
            "create_external_share",
            &[],
            "Create an external share link for one or more assets.",
            schema::external_share(),
            annotations_for_method("Create external share", &Method::POST),
        ),
    ]
}

/// The pixx.io tool set. Cheap to clone; all state is immutable.
#[derive(Clone)]
pub struct PixxioToolSource {
    inner: Arc<Inner>,
}

struct Inner {
    settings: PixxioSettings,
    client: PixxioClient,
    tools: Vec<ToolEntry>,
}

impl PixxioToolSource {
    /// # Errors
    ///
    /// Returns [`PixxioError::Config`] if the HTTP client cannot be built.
    pub fn new(settings: PixxioSettings) -> Result<Self> {
        Ok(Self::with_client(settings, PixxioClient::new()?))
    }

    #[must_use]
    pub fn with_client(settings: PixxioSettings, client: PixxioClient) -> Self {
        Self {
            inner: Arc::new(Inner {
                settings,
                client,
                tools: catalog(),
            }),
        }
    }

    #[must_use]
    pub fn settings(&self) -> &PixxioSettings {
        &self.inner.settings
    }

    /// The MCP `Tool`s served, in catalog order. Aliases are not listed.
    #[must_use]
    pub fn list_tools(&self) -> Vec<Tool> {
        self.inner
            .tools
            .iter()
            .map(|t| {
                let schema_obj = t
                    .input_schema
                    .as_object()
                    .cloned()
                    .unwrap_or_else(JsonObject::new);
                let mut tool = Tool::new(t.name, t.description, Arc::new(schema_obj));
                tool.annotations = Some(t.annotations.clone());
                tool
            })
            .collect()
    }

    /// Resolve a tool name or alias.
    #[must_use]
    pub fn resolve(&self, name: &str) -> Option<ToolKind> {
        self.entry(name).map(|t| t.kind)
    }

    fn entry(&self, name: &str) -> Option<&ToolEntry> {
        self.inner
            .tools
            .iter()
            .find(|t| t.name == name || t.aliases.contains(&name))
    }

    /// Execute a tool call.
    ///
    /// # Errors
    ///
    /// Returns [`PixxioError::UnknownTool`] for unserved names, and any validation, credential,
    /// transport or upstream error raised by the tool. Callers turn the latter into an `isError`
    /// result with [`error_result`].
    pub async fn call_tool(&self, name: &str, arguments: Value) -> Result<CallToolResult> {
        let Some(entry) = self.entry(name) else {
            return Err(PixxioError::UnknownTool(name.to_string()));
        };

        let started = Instant::now();
        let outcome = match entry.kind {
            ToolKind::Search => assets::search(self, arguments).await,
            ToolKind::Fetch => assets::fetch(self, arguments).await,
            ToolKind::UpdateAsset => assets::update(self, arguments).await,
            ToolKind::GetDownloadUrl => downloads::download_url(self, arguments).await,
            ToolKind::GetPreview => downloads::preview(self, arguments).await,
            ToolKind::DownloadAsset => downloads::download(self, arguments).await,
            ToolKind::ListDirectories => listing::directories(self, arguments).await,
            ToolKind::ListCollections => listing::collections(self, arguments).await,
            ToolKind::GetKeywords => listing::keywords(self, arguments).await,
            ToolKind::GetMetadataFields => listing::metadata_fields(self, arguments).await,
            ToolKind::GetDownloadFormats => listing::download_formats(self, arguments).await,
            ToolKind::CreateCollection => create::collection(self, arguments).await,
            ToolKind::CreateExternalShare => create::external_share(self, arguments).await,
        };

        let elapsed_ms = started.elapsed().as_millis() as u64;
        match &outcome {
            Ok(_) => info!(tool = entry.name, called_as = name, elapsed_ms, "tool call succeeded"),
            Err(e) => warn!(tool = entry.name, called_as = name, elapsed_ms, error = %e, "tool call failed"),
        }
        outcome
    }

    fn context(&self, overrides: &CredentialOverrides) -> Result<ApiContext> {
        ApiContext::resolve(&self.inner.settings, overrides)
    }

    fn client(&self) -> &PixxioClient {
        &self.inner.client
    }
}

/// Render a tool failure as an MCP `isError` result.
#[must_use]
pub fn error_result(err: &PixxioError) -> CallToolResult {
    CallToolResult::error(vec![Content::text(format!("Error: {err}"))])
}

fn text_result(text: String) -> CallToolResult {
    CallToolResult::success(vec![Content::text(text)])
}

/// Structured output: `structuredContent` plus the same JSON as text for clients that only
/// render `content`.
fn json_result<T: Serialize>(value: &T) -> Result<CallToolResult> {
    let structured = serde_json::to_value(value)?;
    let text = serde_json::to_string_pretty(&structured)?;
    Ok(CallToolResult {
        content: vec![Content::text(text)],
        structured_content: Some(structured),
        is_error: Some(false),
        meta: None,
    })
}

/// A human summary as text, with machine-readable details in `structuredContent`.
fn summary_result<T: Serialize>(summary: String, value: &T) -> Result<CallToolResult> {
    Ok(CallToolResult {
        content: vec![Content::text(summary)],
        structured_content: Some(serde_json::to_value(value)?),
        is_error: Some(false),
        meta: None,
    })
}

/// An id as a URL path segment. String ids are restricted to a safe alphabet.
fn path_segment(id: &AssetId) -> Result<String> {
    if id.is_unset() {
        return Err(PixxioError::Validation("a non-zero id is required".to_string()));
    }
    let segment = id.to_string();
    if segment
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        Ok(segment)
    } else {
        Err(PixxioError::Validation(format!("Invalid id '{segment}'")))
    }
}
