//! Account balance handlers

use serde::{Deserialize, Serialize};

use super::generic::{ApiResponse, SharedLedger};
use crate::state::{amount_serde, Address, Amount};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BalanceView {
    pub address: Address,
    #[serde(with = "amount_serde")]
    pub balance: Amount,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FundRequest {
    #[serde(with = "amount_serde")]
    pub amount: Amount,
}

pub async fn get_balance_handler(
    address: Address,
    ledger: SharedLedger,
) -> Result<warp::reply::Json, warp::Rejection> {
    let ledger = ledger.read().await;
    let balance = ledger.balance_of(&address);
    Ok(warp::reply::json(&ApiResponse::ok(BalanceView { address, balance })))
}

/// Development faucet: credits new value to an account.
pub async fn fund_handler(
    address: Address,
    request: FundRequest,
    ledger: SharedLedger,
) -> Result<warp::reply::Json, warp::Rejection> {
    let mut ledger = ledger.write().await;
    match ledger.fund(address, request.amount) {
        Ok(()) => {
            let balance = ledger.balance_of(&address);
            Ok(warp::reply::json(&ApiResponse::ok(BalanceView { address, balance })))
        }
        Err(e) => Ok(warp::reply::json(&ApiResponse::<BalanceView>::escrow_failure(e))),
    }
}

/// Value held by the ledger for open tasks.
pub async fn get_custody_handler(
    ledger: SharedLedger,
) -> Result<warp::reply::Json, warp::Rejection> {
    let ledger = ledger.read().await;
    Ok(warp::reply::json(&ApiResponse::ok(
        ledger.custody_balance().to_string(),
    )))
}
