//! Marketplace approval service binary.
//!
//! # Usage
//!
//! ```bash
//! # Run on Base Sepolia with the public RPC endpoint
//! cargo run -p workpay-server
//!
//! # Run on Base mainnet with a dedicated RPC endpoint
//! WORKPAY_NETWORK=base WORKPAY_RPC_URL=https://... cargo run -p workpay-server --release
//! ```
//!
//! Configuration comes from the environment (and a `.env` file when
//! present); see [`workpay_server::config`]. This binary wires the engine
//! to the in-memory store, which is suitable for development only.

use std::net::SocketAddr;
use std::sync::Arc;

use alloy_provider::{Provider, ProviderBuilder};
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;
use workpay_evm::OnChainVerifier;
use workpay_http::{FacilitatorClient, PaymentGate};
use workpay_server::config::ServerConfig;
use workpay_server::handlers::approval_router;
use workpay_server::{ApprovalEngine, MemoryStore};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    if let Err(e) = run().await {
        tracing::error!("Approval service failed: {e}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = ServerConfig::from_env()?;
    tracing::info!(
        host = %config.host,
        port = config.port,
        network = %config.network,
        rpc = %config.rpc_url,
        "Loaded configuration"
    );

    let provider = ProviderBuilder::new()
        .connect_http(config.rpc_url.clone())
        .erased();
    let chain = OnChainVerifier::new(provider, config.network);
    let facilitator = FacilitatorClient::new(config.facilitator_url.clone(), config.network)?;

    let engine = ApprovalEngine::new(
        MemoryStore::new(),
        PaymentGate::new(chain, facilitator),
        config.network,
    );
    let app = approval_router(Arc::new(engine)).layer(TraceLayer::new_for_http());

    let addr = SocketAddr::new(config.host, config.port);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "Approval service listening");
    axum::serve(listener, app).await?;
    Ok(())
}
