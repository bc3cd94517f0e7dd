//! Task lifecycle events.
//!
//! Events are emitted only after an operation has committed. Each one is logged,
//! appended to the ledger's event log and broadcast to live subscribers.

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::state::{Address, Amount, Bytes32, TaskId, Timestamp};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "PascalCase")]
pub enum TaskEvent {
    TaskCreated {
        task_id: TaskId,
        creator: Address,
        #[serde(with = "crate::state::amount_serde")]
        amount: Amount,
        deadline: Timestamp,
    },
    TaskClaimed {
        task_id: TaskId,
        hunter: Address,
        work_hash: Bytes32,
    },
    TaskRefunded {
        task_id: TaskId,
    },
}

impl TaskEvent {
    pub fn task_id(&self) -> TaskId {
        match self {
            TaskEvent::TaskCreated { task_id, .. }
            | TaskEvent::TaskClaimed { task_id, .. }
            | TaskEvent::TaskRefunded { task_id } => *task_id,
        }
    }

    /// Event name used on the wire.
    pub fn name(&self) -> &'static str {
        match self {
            TaskEvent::TaskCreated { .. } => "TaskCreated",
            TaskEvent::TaskClaimed { .. } => "TaskClaimed",
            TaskEvent::TaskRefunded { .. } => "TaskRefunded",
        }
    }

    /// Writes the event to the log in the `Name: key=value` form.
    pub fn log(&self) {
        match self {
            TaskEvent::TaskCreated {
                task_id,
                creator,
                amount,
                deadline,
            } => info!(
                "TaskCreated: task_id={}, creator={}, amount={}, deadline={}",
                task_id, creator, amount, deadline
            ),
            TaskEvent::TaskClaimed {
                task_id,
                hunter,
                work_hash,
            } => info!(
                "TaskClaimed: task_id={}, hunter={}, work_hash={}",
                task_id, hunter, work_hash
            ),
            TaskEvent::TaskRefunded { task_id } => info!("TaskRefunded: task_id={}", task_id),
        }
    }
}
