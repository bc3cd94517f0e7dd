//! Escrow ledger
//!
//! Owns every task record and the custody pool, and executes the three
//! state-changing operations. Each operation runs all of its checks before it
//! writes anything, so a rejected call leaves no trace. On the two payout paths
//! the terminal flag is committed before value leaves custody.

use std::collections::BTreeMap;
use std::sync::Arc;

use tokio::sync::broadcast;
use tracing::{info, warn};

use crate::bank::Bank;
use crate::clock::Clock;
use crate::crypto::{ClaimMessage, Eip712Domain, SignatureVerifier};
use crate::error::EscrowError;
use crate::events::TaskEvent;
use crate::state::{Address, Amount, Bytes32, Task, TaskId, Timestamp};

/// First id handed out by a fresh ledger.
pub const FIRST_TASK_ID: TaskId = 1;

/// Capacity of the live event channel. Slow subscribers lag instead of
/// blocking the ledger.
const EVENT_CHANNEL_CAPACITY: usize = 1024;

pub struct EscrowLedger {
    domain: Eip712Domain,
    verifier: Arc<dyn SignatureVerifier>,
    clock: Arc<dyn Clock>,
    tasks: BTreeMap<TaskId, Task>,
    next_task_id: TaskId,
    bank: Bank,
    event_log: Vec<TaskEvent>,
    event_tx: broadcast::Sender<TaskEvent>,
}

impl EscrowLedger {
    /// Creates an empty ledger bound to `domain`.
    ///
    /// # Arguments
    ///
    /// * `domain` - Identity of this deployment; claim signatures must be made under it
    /// * `verifier` - Recovers claim signers
    /// * `clock` - Time source consulted by refunds
    pub fn new(
        domain: Eip712Domain,
        verifier: Arc<dyn SignatureVerifier>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let (event_tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            domain,
            verifier,
            clock,
            tasks: BTreeMap::new(),
            next_task_id: FIRST_TASK_ID,
            bank: Bank::new(),
            event_log: Vec::new(),
            event_tx,
        }
    }

    // ========================================================================
    // OPERATIONS
    // ========================================================================

    /// Opens a task funded with `amount` taken from `caller`.
    ///
    /// The deadline is not checked against the clock: a task whose deadline has
    /// already passed is legal and immediately refundable.
    ///
    /// # Returns
    ///
    /// * `Ok(TaskId)` - Id of the new task
    /// * `Err(EscrowError::ZeroAddress)` - `caller` is the zero address
    /// * `Err(EscrowError::InvalidAmount)` - `amount` is zero
    /// * `Err(EscrowError::InsufficientFunds)` - `caller` cannot attach `amount`
    pub fn create_task(
        &mut self,
        caller: Address,
        deadline: Timestamp,
        amount: Amount,
    ) -> Result<TaskId, EscrowError> {
        // Records with a zero creator are neither claimable nor refundable.
        if caller.is_zero() {
            warn!("CreateTask rejected: zero address caller");
            return Err(EscrowError::ZeroAddress);
        }
        if amount == 0 {
            warn!("CreateTask rejected: zero amount from {}", caller);
            return Err(EscrowError::InvalidAmount);
        }
        let next_task_id = self
            .next_task_id
            .checked_add(1)
            .ok_or(EscrowError::ArithmeticOverflow)?;
        if let Err(e) = self.bank.ensure_can_deposit(&caller, amount) {
            warn!(
                "CreateTask rejected: {} cannot attach {} wei",
                caller, amount
            );
            return Err(e);
        }

        let task_id = self.next_task_id;
        self.bank.deposit(caller, amount)?;
        self.tasks.insert(task_id, Task::new(caller, amount, deadline));
        self.next_task_id = next_task_id;

        self.emit(TaskEvent::TaskCreated {
            task_id,
            creator: caller,
            amount,
            deadline,
        });
        Ok(task_id)
    }

    /// Pays a task out to `hunter` on the strength of the creator's signature.
    ///
    /// Anyone may submit the claim; the signature over `(task_id, hunter,
    /// work_hash)` is the only authorization. The deadline is not consulted.
    ///
    /// # Returns
    ///
    /// * `Ok(())` - Funds moved to `hunter`, work hash recorded
    /// * `Err(EscrowError::AlreadyClaimed)` - Task is claimed or refunded
    /// * `Err(EscrowError::InvalidSignature)` - Signature does not recover to the creator
    pub fn claim(
        &mut self,
        task_id: TaskId,
        hunter: Address,
        work_hash: Bytes32,
        signature: &[u8],
    ) -> Result<(), EscrowError> {
        let task = self.get_task(task_id);
        if !task.is_open() {
            warn!(
                "Claim rejected: task {} is no longer available (claimed={}, refunded={})",
                task_id, task.claimed, task.refunded
            );
            return Err(EscrowError::AlreadyClaimed);
        }

        let message = ClaimMessage::new(task_id, hunter, work_hash);
        let authorized = match self
            .verifier
            .recover_claim_signer(&self.domain, &message, signature)
        {
            // Unassigned ids carry a zero creator, which no signature recovers to.
            Ok(signer) => !task.creator.is_zero() && signer == task.creator,
            Err(e) => {
                warn!("Claim rejected: task {}: {}", task_id, e);
                false
            }
        };
        if !authorized {
            warn!("Claim rejected: task {} signature is not from the creator", task_id);
            return Err(EscrowError::InvalidSignature);
        }

        // Commit the terminal state before any value moves.
        let amount = task.amount;
        if let Some(stored) = self.tasks.get_mut(&task_id) {
            stored.claimed = true;
            stored.work_hash = work_hash;
        }
        self.bank.release(hunter, amount);

        self.emit(TaskEvent::TaskClaimed {
            task_id,
            hunter,
            work_hash,
        });
        Ok(())
    }

    /// Returns a task's funds to its creator once the deadline has passed.
    ///
    /// # Returns
    ///
    /// * `Ok(())` - Funds moved back to the creator
    /// * `Err(EscrowError::NotCreator)` - `caller` did not create the task
    /// * `Err(EscrowError::DeadlineNotReached)` - Clock is not strictly past the deadline
    /// * `Err(EscrowError::AlreadyRefunded)` - Task was already refunded
    /// * `Err(EscrowError::AlreadyClaimed)` - Task was claimed
    pub fn refund(&mut self, caller: Address, task_id: TaskId) -> Result<(), EscrowError> {
        let task = self.get_task(task_id);
        if task.creator.is_zero() || caller != task.creator {
            warn!("Refund rejected: {} is not the creator of task {}", caller, task_id);
            return Err(EscrowError::NotCreator);
        }

        let now = self.clock.now();
        if now <= task.deadline {
            warn!(
                "Refund rejected: task {} deadline {} not reached (now={})",
                task_id, task.deadline, now
            );
            return Err(EscrowError::DeadlineNotReached);
        }
        if task.refunded {
            warn!("Refund rejected: task {} already refunded", task_id);
            return Err(EscrowError::AlreadyRefunded);
        }
        if task.claimed {
            warn!("Refund rejected: task {} already claimed", task_id);
            return Err(EscrowError::AlreadyClaimed);
        }

        // Commit the terminal state before any value moves.
        if let Some(stored) = self.tasks.get_mut(&task_id) {
            stored.refunded = true;
        }
        self.bank.release(task.creator, task.amount);

        self.emit(TaskEvent::TaskRefunded { task_id });
        Ok(())
    }

    /// Returns the stored record, or the zero-value record for unassigned ids.
    pub fn get_task(&self, task_id: TaskId) -> Task {
        self.tasks.get(&task_id).cloned().unwrap_or_default()
    }

    // ========================================================================
    // ACCOUNTS
    // ========================================================================

    /// Credits an account with new value (development genesis / faucet).
    pub fn fund(&mut self, account: Address, amount: Amount) -> Result<(), EscrowError> {
        self.bank.fund(account, amount)?;
        info!("Funded {} with {} wei", account, amount);
        Ok(())
    }

    pub fn balance_of(&self, account: &Address) -> Amount {
        self.bank.balance_of(account)
    }

    /// Value held in custody for open tasks.
    pub fn custody_balance(&self) -> Amount {
        self.bank.custody()
    }

    // ========================================================================
    // READ ACCESSORS
    // ========================================================================

    pub fn domain(&self) -> &Eip712Domain {
        &self.domain
    }

    pub fn next_task_id(&self) -> TaskId {
        self.next_task_id
    }

    pub fn now(&self) -> Timestamp {
        self.clock.now()
    }

    /// All events emitted so far, oldest first.
    pub fn events(&self) -> &[TaskEvent] {
        &self.event_log
    }

    /// Subscribes to events emitted after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<TaskEvent> {
        self.event_tx.subscribe()
    }

    /// Whether custody equals the sum of amounts over open tasks.
    pub fn custody_is_consistent(&self) -> bool {
        let open: Amount = self
            .tasks
            .values()
            .filter(|task| task.is_open())
            .map(|task| task.amount)
            .sum();
        open == self.bank.custody()
    }

    fn emit(&mut self, event: TaskEvent) {
        event.log();
        self.event_log.push(event.clone());
        // No subscribers is fine; the log still has the event.
        let _ = self.event_tx.send(event);
    }
}
