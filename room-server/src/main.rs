//! 对局房间服务端入口

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::info;

use protocol::DEFAULT_PORT;
use room_server::{router, Registry, Storage};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let port = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(DEFAULT_PORT);
    let data_dir = std::env::var("DATA_DIR").unwrap_or_else(|_| "data".to_string());

    let storage = Storage::new(&data_dir)?;
    let registry = Arc::new(Registry::new(storage));
    let app = router::app(registry);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = TcpListener::bind(addr).await?;
    info!("对局服务器启动，监听 {}", addr);

    axum::serve(listener, app).await?;
    Ok(())
}
