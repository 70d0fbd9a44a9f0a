//! Network transport for the MCP server.
//!
//! Agents that cannot spawn the binary over stdio connect to the streamable
//! HTTP endpoint instead. Each session gets its own [`InspectorMcpServer`]
//! sharing one [`InspectorClient`].

use crate::server::InspectorMcpServer;
use axum::Router;
use queue_inspector_core::InspectorClient;
use rmcp::transport::streamable_http_server::{
    session::local::LocalSessionManager, StreamableHttpServerConfig, StreamableHttpService,
};
use std::future::Future;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::info;

#[cfg(test)]
#[path = "transport_tests.rs"]
mod tests;

/// Path the MCP endpoint is mounted on
pub const MCP_PATH: &str = "/mcp";

/// Streamable HTTP service creating one server per session
pub fn streamable_http_service(
    client: Arc<InspectorClient>,
) -> StreamableHttpService<InspectorMcpServer, LocalSessionManager> {
    StreamableHttpService::new(
        move || Ok(InspectorMcpServer::new(client.clone())),
        Arc::new(LocalSessionManager::default()),
        StreamableHttpServerConfig::default(),
    )
}

/// Router with the MCP endpoint mounted at [`MCP_PATH`]
pub fn create_mcp_router(client: Arc<InspectorClient>) -> Router {
    Router::new()
        .nest_service(MCP_PATH, streamable_http_service(client))
        .layer(TraceLayer::new_for_http())
}

/// Serve MCP over HTTP on an already bound listener until `shutdown`
/// completes
pub async fn serve_http<F>(
    listener: TcpListener,
    client: Arc<InspectorClient>,
    shutdown: F,
) -> std::io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    if let Ok(address) = listener.local_addr() {
        info!("Serving MCP on http://{}{}", address, MCP_PATH);
    }

    axum::serve(listener, create_mcp_router(client))
        .with_graceful_shutdown(shutdown)
        .await
}
