//! rmcp `ServerHandler` over the pixx.io tool set.

use pixxio_tools::{PixxioError, PixxioToolSource, error_result};
use rmcp::model::{
    CallToolRequestParams, CallToolResult, Implementation, ListToolsResult,
    PaginatedRequestParams, ProtocolVersion, ServerCapabilities, ServerInfo,
};
use rmcp::service::RequestContext;
use rmcp::{ErrorData, RoleServer, ServerHandler};
use serde_json::Value;

const INSTRUCTIONS: &str = "Tools for the pixx.io digital asset management system. \
Use `search` to find assets and `fetch` for details; download tools accept original, preview, \
custom or configured download formats. Every tool accepts optional `api_key` and `base_url` \
arguments that override the server defaults.";

/// One MCP session's view of the shared tool set.
#[derive(Clone)]
pub struct PixxioServer {
    tools: PixxioToolSource,
}

impl PixxioServer {
    #[must_use]
    pub fn new(tools: PixxioToolSource) -> Self {
        Self { tools }
    }
}

impl ServerHandler for PixxioServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::V_2025_06_18,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: "pixxio-mcp".to_string(),
                title: Some("pixx.io DAM".to_string()),
                version: env!("CARGO_PKG_VERSION").to_string(),
                description: None,
                icons: None,
                website_url: Some("https://www.pixx.io".to_string()),
            },
            instructions: Some(INSTRUCTIONS.to_string()),
        }
    }

    async fn list_tools(
        &self,
        _request: Option<PaginatedRequestParams>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, ErrorData> {
        Ok(ListToolsResult {
            tools: self.tools.list_tools(),
            ..Default::default()
        })
    }

    async fn call_tool(
        &self,
        request: CallToolRequestParams,
        _context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, ErrorData> {
        let arguments = request.arguments.map_or(Value::Null, Value::Object);
        match self.tools.call_tool(&request.name, arguments).await {
            Ok(result) => Ok(result),
            Err(e @ PixxioError::UnknownTool(_)) => Err(ErrorData::invalid_params(e.to_string(), None)),
            Err(e) => Ok(error_result(&e)),
        }
    }
}
