use anyhow::Result;
use tracing::{info, Level};

use neocortica::routes;
use neocortica::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(Level::DEBUG)
        .init();

    // Load env
    let _ = dotenv::dotenv();

    let state = AppState::from_env()?;
    info!("Paper service initialized");

    let port: u16 = dotenv::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(3000);
    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));

    let app = routes::router(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "NEOCORTICA backend listening");
    axum::serve(listener, app).await?;

    Ok(())
}
