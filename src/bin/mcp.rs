use anyhow::Result;
use rmcp::transport::stdio;
use rmcp::ServiceExt;
use tracing::{info, Level};

use neocortica::mcp::PaperService;
use neocortica::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // stdout carries the MCP protocol framing; logs go to stderr
    tracing_subscriber::fmt()
        .with_max_level(Level::INFO)
        .with_writer(std::io::stderr)
        .init();

    let _ = dotenv::dotenv();

    let state = AppState::from_env()?;
    info!("Starting NEOCORTICA MCP server");

    let service = PaperService::new(state);
    let server = service.serve(stdio()).await?;
    server.waiting().await?;

    info!("NEOCORTICA MCP server stopped");
    Ok(())
}
