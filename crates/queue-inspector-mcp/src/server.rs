//! MCP server handler wiring the tools to an [`InspectorClient`].

use crate::tools::{self, ListParams, PrintMessageParams, ToolError};
use queue_inspector_core::InspectorClient;
use rmcp::handler::server::router::tool::ToolRouter;
use rmcp::handler::server::wrapper::Parameters;
use rmcp::model::{
    CallToolResult, Content, ErrorData, Implementation, ServerCapabilities, ServerInfo,
};
use rmcp::{tool, tool_handler, tool_router, ServerHandler};
use std::sync::Arc;
use tracing::warn;

#[cfg(test)]
#[path = "server_tests.rs"]
mod tests;

/// Name the server reports during initialization
pub const SERVER_NAME: &str = "azure-servicebus-mcp";

const INSTRUCTIONS: &str = "Read-only inspection of an Azure Service Bus queue or topic \
subscription and its dead-letter queue. Nothing is received, locked or deleted.\n\
ListMessages / ListDeadLetters return [{sequenceNumber, enqueuedTime}] and accept optional \
RFC3339 `from` and `to` bounds (inclusive).\n\
PrintMessage returns the full message for a sequence number; set deadLetter to read from \
the dead-letter queue.";

#[derive(Debug, Clone)]
pub struct InspectorMcpServer {
    client: Arc<InspectorClient>,
    tool_router: ToolRouter<Self>,
}

impl InspectorMcpServer {
    pub fn new(client: Arc<InspectorClient>) -> Self {
        Self {
            client,
            tool_router: Self::tool_router(),
        }
    }
}

#[tool_handler]
impl ServerHandler for InspectorMcpServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(INSTRUCTIONS.to_string()),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: SERVER_NAME.to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
                ..Default::default()
            },
            ..Default::default()
        }
    }
}

#[tool_router]
impl InspectorMcpServer {
    #[tool(
        name = "ListMessages",
        description = "List messages in the queue with optional datetime filters"
    )]
    pub async fn list_messages(
        &self,
        Parameters(params): Parameters<ListParams>,
    ) -> Result<CallToolResult, ErrorData> {
        Ok(into_call_result(tools::list_messages(&self.client, &params).await))
    }

    #[tool(
        name = "ListDeadLetters",
        description = "List dead-letter queue messages with filters"
    )]
    pub async fn list_dead_letters(
        &self,
        Parameters(params): Parameters<ListParams>,
    ) -> Result<CallToolResult, ErrorData> {
        Ok(into_call_result(
            tools::list_dead_letters(&self.client, &params).await,
        ))
    }

    #[tool(
        name = "PrintMessage",
        description = "Fetch and display a full message by sequence number"
    )]
    pub async fn print_message(
        &self,
        Parameters(params): Parameters<PrintMessageParams>,
    ) -> Result<CallToolResult, ErrorData> {
        Ok(into_call_result(tools::print_message(&self.client, &params).await))
    }
}

/// Failures are reported to the agent as error results, not protocol errors
fn into_call_result(outcome: Result<String, ToolError>) -> CallToolResult {
    match outcome {
        Ok(text) => CallToolResult::success(vec![Content::text(text)]),
        Err(e) => {
            warn!(error = %e, "Tool call failed");
            CallToolResult::error(vec![Content::text(e.to_string())])
        }
    }
}
