//! MCP server bootstrap and request dispatch.

use std::{borrow::Cow, sync::Arc};

use crate::{
    config::get_config,
    embedding::Embedder,
    graph::GraphBackend,
    mcp::{
        format::{SettingsSnapshot, health_payload, json_resource_contents, serialize_json},
        handlers::retrieve::handle_retrieve,
        registry, schemas,
    },
    retriever::Retrieve,
};
use rmcp::{
    ErrorData as McpError,
    handler::server::ServerHandler,
    model::{
        AnnotateAble, CallToolRequestParam, CallToolResult, ListResourceTemplatesResult,
        ListResourcesResult, ListToolsResult, RawResource, ReadResourceRequestParam,
        ReadResourceResult, Resource, ResourceTemplate, ServerCapabilities, ServerInfo, Tool,
        ToolAnnotations,
    },
};

const HEALTH_URI: &str = "mcp://health";
const SETTINGS_URI: &str = "mcp://settings";

/// MCP server implementation exposing the `graph_retrieve` tool.
#[derive(Clone)]
pub struct GraphRetrieverMcpServer {
    retriever: Arc<dyn Retrieve>,
    graph: Arc<dyn GraphBackend>,
    embedder: Arc<dyn Embedder>,
    registry: Arc<registry::Registry>,
}

impl GraphRetrieverMcpServer {
    /// Create a new MCP server over the shared retriever, graph backend, and embedder.
    pub fn new(
        retriever: Arc<dyn Retrieve>,
        graph: Arc<dyn GraphBackend>,
        embedder: Arc<dyn Embedder>,
    ) -> Self {
        let mut registry = registry::Registry::new();
        registry.register_resource(HEALTH_URI, resource_health);
        registry.register_resource(SETTINGS_URI, resource_settings);
        registry.register_tool("graph_retrieve", tool_graph_retrieve);

        Self {
            retriever,
            graph,
            embedder,
            registry: Arc::new(registry),
        }
    }

    fn describe_tools(&self) -> Vec<Tool> {
        let retrieve_schema = Arc::new(schemas::retrieve_input_schema());
        vec![Tool {
            name: Cow::Borrowed("graph_retrieve"),
            title: Some("Graph Retrieve".to_string()),
            description: Some(Cow::Borrowed(
                "Embed a query, search the chunk vector index, and expand matches with author/article context.",
            )),
            input_schema: retrieve_schema,
            output_schema: None,
            annotations: Some(
                ToolAnnotations::with_title("Graph Retrieve")
                    .read_only(true)
                    .idempotent(true)
                    .open_world(false),
            ),
            icons: None,
        }]
    }

    fn describe_resources(&self) -> Vec<Resource> {
        let mut health = RawResource::new(HEALTH_URI, "health");
        health.description = Some("Graph reachability and embedding model identity".into());

        let mut settings = RawResource::new(SETTINGS_URI, "settings");
        settings.description = Some("Effective defaults for retrieval limits and timeout".into());

        vec![health.no_annotation(), settings.no_annotation()]
    }

    fn describe_resource_templates(&self) -> Vec<ResourceTemplate> {
        Vec::new()
    }
}

fn resource_health(
    server: &GraphRetrieverMcpServer,
    _request: ReadResourceRequestParam,
) -> registry::ResourceFuture {
    let graph = server.graph.clone();
    let embedder = server.embedder.clone();
    Box::pin(async move {
        let (reachable, index_present) = match graph.ping().await {
            Ok(index_present) => (true, index_present),
            Err(_) => (false, false),
        };
        let info = embedder.info();
        Ok(ReadResourceResult {
            contents: vec![json_resource_contents(
                HEALTH_URI,
                health_payload(reachable, index_present, &info),
            )],
        })
    })
}

fn resource_settings(
    _server: &GraphRetrieverMcpServer,
    _request: ReadResourceRequestParam,
) -> registry::ResourceFuture {
    Box::pin(async move {
        let config = get_config();
        let payload = SettingsSnapshot {
            default_limit: config.retrieval_default_limit,
            max_limit: config.retrieval_max_limit,
            timeout_per_call_millis: config.timeout_per_call_millis,
        };
        Ok(ReadResourceResult {
            contents: vec![json_resource_contents(
                SETTINGS_URI,
                serialize_json(&payload, SETTINGS_URI),
            )],
        })
    })
}

fn tool_graph_retrieve(
    server: &GraphRetrieverMcpServer,
    request: CallToolRequestParam,
) -> registry::ToolFuture {
    let retriever = server.retriever.clone();
    Box::pin(async move { handle_retrieve(&retriever, request.arguments).await })
}

impl ServerHandler for GraphRetrieverMcpServer {
    fn get_info(&self) -> ServerInfo {
        let mut implementation = rmcp::model::Implementation::from_build_env();
        implementation.name = "graphrag-retriever".to_string();
        implementation.title = Some("GraphRAG Retriever".to_string());
        implementation.version = env!("CARGO_PKG_VERSION").to_string();

        ServerInfo {
            capabilities: ServerCapabilities::builder()
                .enable_resources()
                .enable_tools()
                .build(),
            server_info: implementation,
            instructions: Some(
                "Use graph_retrieve to answer questions grounded in the indexed article graph: it embeds your query, searches the chunk vector index, and expands matches with author/article context.".into(),
            ),
            ..ServerInfo::default()
        }
    }

    fn list_resources(
        &self,
        _request: Option<rmcp::model::PaginatedRequestParam>,
        _context: rmcp::service::RequestContext<rmcp::service::RoleServer>,
    ) -> impl std::future::Future<Output = Result<ListResourcesResult, McpError>> + Send + '_ {
        let resources = self.describe_resources();
        std::future::ready(Ok(ListResourcesResult::with_all_items(resources)))
    }

    fn list_resource_templates(
        &self,
        _request: Option<rmcp::model::PaginatedRequestParam>,
        _context: rmcp::service::RequestContext<rmcp::service::RoleServer>,
    ) -> impl std::future::Future<Output = Result<ListResourceTemplatesResult, McpError>> + Send + '_
    {
        let templates = self.describe_resource_templates();
        std::future::ready(Ok(ListResourceTemplatesResult::with_all_items(templates)))
    }

    fn list_tools(
        &self,
        _request: Option<rmcp::model::PaginatedRequestParam>,
        _context: rmcp::service::RequestContext<rmcp::service::RoleServer>,
    ) -> impl std::future::Future<Output = Result<ListToolsResult, McpError>> + Send + '_ {
        let tools = self.describe_tools();
        std::future::ready(Ok(ListToolsResult::with_all_items(tools)))
    }

    fn read_resource(
        &self,
        request: ReadResourceRequestParam,
        _context: rmcp::service::RequestContext<rmcp::service::RoleServer>,
    ) -> impl std::future::Future<Output = Result<ReadResourceResult, McpError>> + Send + '_ {
        async move {
            let uri = request.uri.clone();
            if let Some(handler) = self.registry.resources.get(uri.as_str()) {
                return handler(self, request).await;
            }

            Err(McpError::invalid_params(
                format!("Unknown resource URI: {uri}"),
                None,
            ))
        }
    }

    #[allow(clippy::manual_async_fn)]
    fn call_tool(
        &self,
        request: CallToolRequestParam,
        _context: rmcp::service::RequestContext<rmcp::service::RoleServer>,
    ) -> impl std::future::Future<Output = Result<CallToolResult, McpError>> + Send + '_ {
        async move {
            if let Some(handler) = self.registry.tools.get(request.name.as_ref()) {
                return handler(self, request).await;
            }

            Err(McpError::invalid_params(
                format!("Unknown tool: {}", request.name),
                None,
            ))
        }
    }
}
