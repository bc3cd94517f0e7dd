//! Task Board Escrow
//!
//! An escrow ledger for bounties. A creator funds a task with native currency
//! and a deadline. The funds go either to a hunter presenting a claim signed
//! off-ledger by the creator (EIP-712 typed data bound to this deployment), or
//! back to the creator once the deadline has passed without a claim.

pub mod api;
pub mod bank;
pub mod clock;
pub mod config;
pub mod crypto;
pub mod error;
pub mod events;
pub mod ledger;
pub mod state;

// Re-export commonly used types
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::Config;
pub use crypto::{ClaimMessage, ClaimSignature, ClaimSigner, Eip712Domain, Eip712Verifier};
pub use error::EscrowError;
pub use events::TaskEvent;
pub use ledger::EscrowLedger;
pub use state::{Address, Amount, Bytes32, Task, TaskId, TaskStatus, Timestamp, ONE_ETHER};
