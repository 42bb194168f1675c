//! MCP server over stdio
//!
//! Republishes cache queries, sync and mutation previews as MCP tools so
//! assistants can inspect an organization without shelling out. Mutations
//! are exposed preview-only; executing them stays on the command line.

use std::sync::Arc;

use anyhow::Result;
use rmcp::{ServiceExt, transport::stdio};
use tokio_util::sync::CancellationToken;

use crate::domain::sync::SyncService;

mod tools;
mod types;

use self::tools::McpServer;

/// Serve MCP over stdin/stdout until the client disconnects or the
/// process is cancelled.
pub async fn serve(sync: Arc<SyncService>, org: String, cancel: CancellationToken) -> Result<()> {
    let server = McpServer::new(sync, org, cancel.clone());
    let service = server.serve(stdio()).await?;

    // Bridge the app-level token into the service's own token; waiting()
    // then owns the service and returns once the transport shuts down.
    let transport_ct = service.cancellation_token();
    tokio::spawn(async move {
        cancel.cancelled().await;
        transport_ct.cancel();
    });

    service.waiting().await?;
    Ok(())
}
