//! Task Board Escrow Node
//!
//! Runs an escrow ledger behind a REST API for local development and
//! integration testing.
//!
//! ## Overview
//!
//! 1. Creators fund tasks with native currency and a deadline
//! 2. Creators sign claim authorizations off-ledger (see the `sign_claim` tool)
//! 3. Hunters submit those signatures to receive the bounty
//! 4. Creators reclaim unclaimed funds once the deadline has passed

use anyhow::Result;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::info;
use tracing_subscriber::EnvFilter;

use task_board_escrow::api::ApiServer;
use task_board_escrow::{Config, Eip712Verifier, EscrowLedger, SystemClock};

/// Main application entry point.
///
/// This function:
/// 1. Initializes logging and tracing
/// 2. Loads configuration from TOML file
/// 3. Builds the ledger and credits genesis accounts
/// 4. Runs the API server until shutdown
#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("Starting Task Board Escrow node");

    let config = Config::load()?;
    info!("Configuration loaded successfully");

    let domain = config.domain.to_domain()?;
    info!(
        "Ledger domain: {} v{} chain_id={} contract={} separator=0x{}",
        domain.name,
        domain.version,
        domain.chain_id,
        domain.verifying_contract,
        hex::encode(domain.separator())
    );

    let mut ledger = EscrowLedger::new(domain, Arc::new(Eip712Verifier), Arc::new(SystemClock));
    for (address, balance) in config.genesis_accounts()? {
        ledger
            .fund(address, balance)
            .map_err(|e| anyhow::anyhow!("Failed to fund genesis account {}: {}", address, e))?;
    }

    let api_server = ApiServer::new(config, Arc::new(RwLock::new(ledger)));
    api_server.run().await?;

    Ok(())
}
