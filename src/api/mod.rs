//! REST API Module
//!
//! HTTP surface of a development escrow node. Callers are identified by the
//! address in the request body, the way a local development chain impersonates
//! accounts; claim authorization still rests entirely on the creator signature.

pub mod accounts;
pub mod generic;
pub mod tasks;

use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::info;
use warp::Filter;

use crate::config::Config;
use crate::state::{Address, TaskId};

pub use generic::{handle_rejection, with_ledger, ApiResponse, SharedLedger};

// ============================================================================
// API SERVER IMPLEMENTATION
// ============================================================================

/// REST API server for the escrow node.
pub struct ApiServer {
    /// Service configuration
    config: Arc<Config>,
    /// Ledger shared by all handlers
    ledger: SharedLedger,
}

impl ApiServer {
    pub fn new(config: Config, ledger: SharedLedger) -> Self {
        Self {
            config: Arc::new(config),
            ledger,
        }
    }

    /// Starts the API server and begins handling HTTP requests.
    ///
    /// # Returns
    ///
    /// * `Ok(())` - Server ran until shutdown
    /// * `Err(anyhow::Error)` - Failed to start server
    pub async fn run(&self) -> Result<()> {
        info!(
            "Starting API server on {}:{}",
            self.config.api.host, self.config.api.port
        );

        let routes = self.create_routes();

        let addr: std::net::SocketAddr =
            format!("{}:{}", self.config.api.host, self.config.api.port)
                .parse()
                .context("Failed to parse API server address")?;

        warp::serve(routes).run(addr).await;

        Ok(())
    }

    /// Creates all API routes for the server.
    pub(crate) fn create_routes(
        &self,
    ) -> impl Filter<Extract = impl warp::Reply, Error = std::convert::Infallible> + Clone {
        let ledger = self.ledger.clone();

        // Health check endpoint - returns service status
        let health = warp::path("health")
            .and(warp::path::end())
            .and(warp::get())
            .map(|| {
                warp::reply::json(&ApiResponse::ok(
                    "Task Board Escrow node is running".to_string(),
                ))
            });

        // EIP-712 domain descriptor for off-ledger signers
        let domain = warp::path("domain")
            .and(warp::path::end())
            .and(warp::get())
            .and(with_ledger(ledger.clone()))
            .and_then(tasks::get_domain_handler);

        let next_task_id = warp::path!("tasks" / "next-id")
            .and(warp::get())
            .and(with_ledger(ledger.clone()))
            .and_then(tasks::get_next_task_id_handler);

        let get_task = warp::path!("tasks" / TaskId)
            .and(warp::get())
            .and(with_ledger(ledger.clone()))
            .and_then(tasks::get_task_handler);

        let create_task = warp::path!("tasks")
            .and(warp::post())
            .and(warp::body::json())
            .and(with_ledger(ledger.clone()))
            .and_then(tasks::create_task_handler);

        let claim = warp::path!("tasks" / TaskId / "claim")
            .and(warp::post())
            .and(warp::body::json())
            .and(with_ledger(ledger.clone()))
            .and_then(tasks::claim_handler);

        let refund = warp::path!("tasks" / TaskId / "refund")
            .and(warp::post())
            .and(warp::body::json())
            .and(with_ledger(ledger.clone()))
            .and_then(tasks::refund_handler);

        let events = warp::path!("events")
            .and(warp::get())
            .and(with_ledger(ledger.clone()))
            .and_then(tasks::get_events_handler);

        // Live event feed (server-sent events)
        let event_stream = warp::path!("events" / "stream")
            .and(warp::get())
            .and(with_ledger(ledger.clone()))
            .and_then(tasks::stream_events_handler);

        let balance = warp::path!("accounts" / Address / "balance")
            .and(warp::get())
            .and(with_ledger(ledger.clone()))
            .and_then(accounts::get_balance_handler);

        let fund = warp::path!("accounts" / Address / "fund")
            .and(warp::post())
            .and(warp::body::json())
            .and(with_ledger(ledger.clone()))
            .and_then(accounts::fund_handler);

        let custody = warp::path!("custody")
            .and(warp::get())
            .and(with_ledger(ledger))
            .and_then(accounts::get_custody_handler);

        health
            .or(domain)
            .or(next_task_id)
            .or(get_task)
            .or(create_task)
            .or(claim)
            .or(refund)
            .or(events)
            .or(event_stream)
            .or(balance)
            .or(fund)
            .or(custody)
            .with(generic::create_cors_filter(&self.config.api.cors_origins))
            .recover(handle_rejection)
    }

    /// Public method for testing - exposes routes for integration tests
    pub fn test_routes(
        &self,
    ) -> impl Filter<Extract = impl warp::Reply, Error = std::convert::Infallible> + Clone {
        self.create_routes()
    }
}
