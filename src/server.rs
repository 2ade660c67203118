//! MCP server implementation using rmcp.
//!
//! Serves the Jyotish tool catalog over stdio or Streamable HTTP and hands
//! every `tools/call` to the [`Dispatcher`].

use std::any::Any;
use std::sync::Arc;

use anyhow::Result;
use axum::Router;
use rmcp::transport::streamable_http_server::{
    StreamableHttpService, session::local::LocalSessionManager,
};
use rmcp::{
    ErrorData as McpError,
    handler::server::ServerHandler,
    model::*,
    service::{RequestContext, RoleServer},
};
use tracing::{error, info};

use crate::dispatcher::{Dispatcher, InvocationRequest, ResponseEnvelope};
use crate::failure::{Failure, FailureKind};

const INSTRUCTIONS: &str = "Vedic astrology (Jyotish) calculations. Create a birth chart with chart_create, \
     then pass its chart_id to the other tools for dashas, transits, divisional charts, yogas and \
     compatibility.";

/// MCP server that answers `tools/list` from the catalog and routes
/// `tools/call` through the dispatcher.
#[derive(Clone)]
pub struct McpServer {
    dispatcher: Arc<Dispatcher>,
}

impl McpServer {
    pub fn new(dispatcher: Arc<Dispatcher>) -> Self {
        Self { dispatcher }
    }

    pub fn dispatcher(&self) -> &Arc<Dispatcher> {
        &self.dispatcher
    }

    /// Run one tool call on its own task. A panic anywhere below the
    /// dispatcher is turned into an error response for that call only.
    pub async fn handle_call(&self, tool_name: String, arguments: JsonObject) -> CallToolResult {
        self.handle_call_until(tool_name, arguments, std::future::pending()).await
    }

    /// Like [`handle_call`](Self::handle_call), but gives up as soon as
    /// `cancelled` resolves. The call's task is aborted, which drops the
    /// worker's child handle and kills the process.
    pub async fn handle_call_until<C>(
        &self,
        tool_name: String,
        arguments: JsonObject,
        cancelled: C,
    ) -> CallToolResult
    where
        C: Future<Output = ()> + Send,
    {
        let dispatcher = self.dispatcher.clone();
        let request = InvocationRequest::new(tool_name.clone(), arguments);
        let mut task = tokio::spawn(async move { dispatcher.dispatch(request).await });

        let joined = tokio::select! {
            joined = &mut task => joined,
            _ = cancelled => {
                task.abort();
                info!(tool = %tool_name, "Tool call cancelled by client");
                return ResponseEnvelope::failure(&Failure::new(
                    FailureKind::Cancelled,
                    format!("Tool call {} was cancelled", tool_name),
                ))
                .into_call_tool_result();
            }
        };

        let envelope = match joined {
            Ok(envelope) => envelope,
            Err(join_error) => {
                let message = if join_error.is_panic() {
                    format!(
                        "Internal error while handling {}: {}",
                        tool_name,
                        panic_message(join_error.into_panic())
                    )
                } else {
                    format!("Internal error while handling {}: task cancelled", tool_name)
                };
                error!(tool = %tool_name, "{}", message);
                ResponseEnvelope::failure(&Failure::new(FailureKind::Internal, message))
            }
        };

        envelope.into_call_tool_result()
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

impl ServerHandler for McpServer {
    fn list_tools(
        &self,
        _request: Option<PaginatedRequestParams>,
        _context: RequestContext<RoleServer>,
    ) -> impl Future<Output = Result<ListToolsResult, McpError>> + Send + '_ {
        let result = ListToolsResult {
            tools: self.dispatcher.registry().list_tools(),
            ..Default::default()
        };
        std::future::ready(Ok(result))
    }

    fn call_tool(
        &self,
        request: CallToolRequestParams,
        context: RequestContext<RoleServer>,
    ) -> impl Future<Output = Result<CallToolResult, McpError>> + Send + '_ {
        let tool_name = request.name.to_string();
        let args = request.arguments.unwrap_or_default();
        let ct = context.ct.clone();

        async move {
            let cancelled = async move { ct.cancelled().await };
            Ok(self.handle_call_until(tool_name, args, cancelled).await)
        }
    }

    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::V_2025_06_18,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation::from_build_env(),
            instructions: Some(INSTRUCTIONS.to_string()),
        }
    }
}

/// Start the server as an MCP Streamable HTTP endpoint.
///
/// This exposes the MCP endpoint at `/mcp` on the given bind address,
/// e.g. `127.0.0.1:3942`. Every session shares the same dispatcher.
pub async fn start_mcp_http(server: Arc<McpServer>, bind: &str) -> Result<()> {
    let dispatcher = server.dispatcher().clone();

    let service = StreamableHttpService::new(
        move || Ok(McpServer::new(dispatcher.clone())),
        LocalSessionManager::default().into(),
        Default::default(),
    );

    let router = Router::new().nest_service("/mcp", service);
    let listener = tokio::net::TcpListener::bind(bind).await?;

    tracing::info!("MCP HTTP server listening on http://{}/mcp", bind);

    axum::serve(listener, router).await?;

    Ok(())
}
