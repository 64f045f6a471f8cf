//! Hosts one game of Rummi.
//!
//! Usage: `rummi-server [BIND_ADDR]`. Without an argument the address
//! comes from `RUMMI_BIND`, then defaults to `0.0.0.0:48410`. Log level
//! follows `RUST_LOG` (default `info`).

use rummi::prelude::*;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), RummiError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let mut config = ServerConfig::default();
    if let Some(addr) = std::env::args()
        .nth(1)
        .or_else(|| std::env::var("RUMMI_BIND").ok())
    {
        config.bind_addr = addr;
    }

    let server = RummiServer::builder().config(config).build().await?;
    tracing::info!(addr = %server.local_addr()?, "waiting for players");
    server.run().await
}
