//! Native currency balances and escrow custody

use std::collections::HashMap;

use crate::error::EscrowError;
use crate::state::{Address, Amount};

/// Account balances plus the ledger's custody pool.
///
/// `total_supply` is the sum of every account balance and the custody pool.
/// Funding is the only way to raise it, and funding is overflow-checked, so
/// moving value between accounts and custody can never overflow.
#[derive(Debug, Default, Clone)]
pub struct Bank {
    balances: HashMap<Address, Amount>,
    custody: Amount,
    total_supply: Amount,
}

impl Bank {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn balance_of(&self, account: &Address) -> Amount {
        self.balances.get(account).copied().unwrap_or(0)
    }

    /// Value currently held by the ledger on behalf of open tasks.
    pub fn custody(&self) -> Amount {
        self.custody
    }

    pub fn total_supply(&self) -> Amount {
        self.total_supply
    }

    /// Mints new value into an account (development genesis / faucet).
    ///
    /// The zero address is the unset creator of unassigned task records and is
    /// never credited.
    pub fn fund(&mut self, account: Address, amount: Amount) -> Result<(), EscrowError> {
        if account.is_zero() {
            return Err(EscrowError::ZeroAddress);
        }
        let total_supply = self
            .total_supply
            .checked_add(amount)
            .ok_or(EscrowError::ArithmeticOverflow)?;
        self.total_supply = total_supply;
        *self.balances.entry(account).or_insert(0) += amount;
        Ok(())
    }

    /// Fails with `InsufficientFunds` if `from` cannot attach `amount`.
    pub fn ensure_can_deposit(&self, from: &Address, amount: Amount) -> Result<(), EscrowError> {
        if self.balance_of(from) < amount {
            return Err(EscrowError::InsufficientFunds);
        }
        Ok(())
    }

    /// Moves `amount` from `from` into custody.
    pub fn deposit(&mut self, from: Address, amount: Amount) -> Result<(), EscrowError> {
        self.ensure_can_deposit(&from, amount)?;
        if let Some(balance) = self.balances.get_mut(&from) {
            *balance -= amount;
        }
        self.custody += amount;
        Ok(())
    }

    /// Moves `amount` out of custody to `to`.
    ///
    /// Callers guarantee `amount` is one open task's recorded amount, which the
    /// custody pool always covers.
    pub fn release(&mut self, to: Address, amount: Amount) {
        debug_assert!(self.custody >= amount, "custody underflow");
        self.custody -= amount;
        *self.balances.entry(to).or_insert(0) += amount;
    }
}
