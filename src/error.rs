//! Error types

use thiserror::Error;

/// Rejections surfaced by the escrow ledger.
///
/// Every variant aborts the triggering operation with no state change and no
/// fund movement. None of them is transient.
#[derive(Error, Debug, Copy, Clone, PartialEq, Eq)]
pub enum EscrowError {
    #[error("Invalid amount")]
    InvalidAmount,

    #[error("Task already claimed")]
    AlreadyClaimed,

    #[error("Invalid signature")]
    InvalidSignature,

    #[error("Caller is not the task creator")]
    NotCreator,

    #[error("Deadline not reached")]
    DeadlineNotReached,

    #[error("Task already refunded")]
    AlreadyRefunded,

    #[error("Insufficient funds")]
    InsufficientFunds,

    #[error("Arithmetic overflow")]
    ArithmeticOverflow,

    #[error("Zero address cannot hold or escrow funds")]
    ZeroAddress,
}

impl EscrowError {
    /// Stable numeric code, suitable for wire responses.
    pub fn code(self) -> u32 {
        self as u32
    }
}

impl From<EscrowError> for u32 {
    fn from(e: EscrowError) -> Self {
        e.code()
    }
}
