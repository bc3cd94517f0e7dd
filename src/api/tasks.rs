//! Task and event handlers

use futures::stream;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast::error::RecvError;
use tracing::{info, warn};

use super::generic::{ApiResponse, SharedLedger};
use crate::crypto::Eip712Domain;
use crate::state::{amount_serde, Address, Amount, Bytes32, Task, TaskId, TaskStatus, Timestamp};

// ============================================================================
// REQUEST/RESPONSE STRUCTURES
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTaskRequest {
    /// Account funding the task
    pub caller: Address,
    pub deadline: Timestamp,
    /// Value attached to the call, in wei
    #[serde(with = "amount_serde")]
    pub amount: Amount,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTaskResponse {
    pub task_id: TaskId,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClaimRequest {
    pub hunter: Address,
    pub work_hash: Bytes32,
    /// Hex-encoded creator signature
    pub signature: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefundRequest {
    pub caller: Address,
}

/// Stored task plus its derived status.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskView {
    pub task_id: TaskId,
    pub task: Task,
    pub status: TaskStatus,
}

/// Domain descriptor as off-ledger signers need it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DomainView {
    pub domain: Eip712Domain,
    pub separator: String,
    pub primary_type: String,
}

// ============================================================================
// HANDLERS
// ============================================================================

pub async fn get_domain_handler(
    ledger: SharedLedger,
) -> Result<warp::reply::Json, warp::Rejection> {
    let ledger = ledger.read().await;
    let domain = ledger.domain().clone();
    let separator = format!("0x{}", hex::encode(domain.separator()));

    Ok(warp::reply::json(&ApiResponse::ok(DomainView {
        domain,
        separator,
        primary_type: "Claim".to_string(),
    })))
}

pub async fn get_next_task_id_handler(
    ledger: SharedLedger,
) -> Result<warp::reply::Json, warp::Rejection> {
    let ledger = ledger.read().await;
    Ok(warp::reply::json(&ApiResponse::ok(ledger.next_task_id())))
}

pub async fn get_task_handler(
    task_id: TaskId,
    ledger: SharedLedger,
) -> Result<warp::reply::Json, warp::Rejection> {
    let ledger = ledger.read().await;
    let task = ledger.get_task(task_id);
    let status = task.status(ledger.now());

    Ok(warp::reply::json(&ApiResponse::ok(TaskView {
        task_id,
        task,
        status,
    })))
}

pub async fn create_task_handler(
    request: CreateTaskRequest,
    ledger: SharedLedger,
) -> Result<warp::reply::Json, warp::Rejection> {
    let mut ledger = ledger.write().await;

    match ledger.create_task(request.caller, request.deadline, request.amount) {
        Ok(task_id) => {
            info!("Task {} created via API by {}", task_id, request.caller);
            Ok(warp::reply::json(&ApiResponse::ok(CreateTaskResponse {
                task_id,
            })))
        }
        Err(e) => Ok(warp::reply::json(
            &ApiResponse::<CreateTaskResponse>::escrow_failure(e),
        )),
    }
}

pub async fn claim_handler(
    task_id: TaskId,
    request: ClaimRequest,
    ledger: SharedLedger,
) -> Result<warp::reply::Json, warp::Rejection> {
    let signature_hex = request.signature.trim();
    let signature_hex = signature_hex.strip_prefix("0x").unwrap_or(signature_hex);
    // Undecodable hex is passed on as empty bytes and rejected by the ledger
    // like any other bad signature.
    let signature = match hex::decode(signature_hex) {
        Ok(bytes) => bytes,
        Err(e) => {
            warn!("Claim for task {}: undecodable signature hex: {}", task_id, e);
            Vec::new()
        }
    };

    let mut ledger = ledger.write().await;
    match ledger.claim(task_id, request.hunter, request.work_hash, &signature) {
        Ok(()) => Ok(warp::reply::json(&ApiResponse::ok(task_id))),
        Err(e) => Ok(warp::reply::json(&ApiResponse::<TaskId>::escrow_failure(e))),
    }
}

pub async fn refund_handler(
    task_id: TaskId,
    request: RefundRequest,
    ledger: SharedLedger,
) -> Result<warp::reply::Json, warp::Rejection> {
    let mut ledger = ledger.write().await;
    match ledger.refund(request.caller, task_id) {
        Ok(()) => Ok(warp::reply::json(&ApiResponse::ok(task_id))),
        Err(e) => Ok(warp::reply::json(&ApiResponse::<TaskId>::escrow_failure(e))),
    }
}

pub async fn get_events_handler(
    ledger: SharedLedger,
) -> Result<warp::reply::Json, warp::Rejection> {
    let ledger = ledger.read().await;
    Ok(warp::reply::json(&ApiResponse::ok(ledger.events().to_vec())))
}

/// Server-sent event stream of events emitted after the client connects.
pub async fn stream_events_handler(
    ledger: SharedLedger,
) -> Result<impl warp::Reply, warp::Rejection> {
    let receiver = ledger.read().await.subscribe();

    let events = stream::unfold(receiver, |mut receiver| async move {
        loop {
            match receiver.recv().await {
                Ok(event) => {
                    let sse = warp::sse::Event::default()
                        .event(event.name())
                        .json_data(&event);
                    return Some((sse, receiver));
                }
                Err(RecvError::Lagged(skipped)) => {
                    warn!("Event stream subscriber lagged, skipped {} events", skipped);
                }
                Err(RecvError::Closed) => return None,
            }
        }
    });

    Ok(warp::sse::reply(warp::sse::keep_alive().stream(events)))
}
