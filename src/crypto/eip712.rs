//! EIP-712 typed-data hashing for claim authorizations
//!
//! Claims are signed as `Claim(uint256 taskId,address hunter,bytes32 workHash)`
//! under an `EIP712Domain(string name,string version,uint256 chainId,address verifyingContract)`
//! domain. Binding the contract address and chain id into the domain stops a
//! signature from being replayed against another deployment or chain; binding
//! the task id and hunter stops it from being reused for another task or payee.

use serde::{Deserialize, Serialize};

use super::{keccak256, u256_word};
use crate::state::{Address, Bytes32, TaskId};

pub const DOMAIN_TYPE: &str =
    "EIP712Domain(string name,string version,uint256 chainId,address verifyingContract)";
pub const CLAIM_TYPE: &str = "Claim(uint256 taskId,address hunter,bytes32 workHash)";

pub const DEFAULT_DOMAIN_NAME: &str = "TaskBoardEscrow";
pub const DEFAULT_DOMAIN_VERSION: &str = "1";

/// Domain descriptor identifying one ledger deployment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Eip712Domain {
    pub name: String,
    pub version: String,
    pub chain_id: u64,
    pub verifying_contract: Address,
}

impl Eip712Domain {
    /// Domain with the default protocol name and version.
    pub fn new(chain_id: u64, verifying_contract: Address) -> Self {
        Self {
            name: DEFAULT_DOMAIN_NAME.to_string(),
            version: DEFAULT_DOMAIN_VERSION.to_string(),
            chain_id,
            verifying_contract,
        }
    }

    pub fn separator(&self) -> [u8; 32] {
        let mut encoded = Vec::with_capacity(32 * 5);
        encoded.extend_from_slice(&keccak256(DOMAIN_TYPE));
        encoded.extend_from_slice(&keccak256(self.name.as_bytes()));
        encoded.extend_from_slice(&keccak256(self.version.as_bytes()));
        encoded.extend_from_slice(&u256_word(self.chain_id));
        encoded.extend_from_slice(&self.verifying_contract.to_word());
        keccak256(encoded)
    }
}

/// The typed message a creator signs to authorize a payout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClaimMessage {
    pub task_id: TaskId,
    pub hunter: Address,
    pub work_hash: Bytes32,
}

impl ClaimMessage {
    pub fn new(task_id: TaskId, hunter: Address, work_hash: Bytes32) -> Self {
        Self {
            task_id,
            hunter,
            work_hash,
        }
    }

    pub fn struct_hash(&self) -> [u8; 32] {
        let mut encoded = Vec::with_capacity(32 * 4);
        encoded.extend_from_slice(&keccak256(CLAIM_TYPE));
        encoded.extend_from_slice(&u256_word(self.task_id));
        encoded.extend_from_slice(&self.hunter.to_word());
        encoded.extend_from_slice(self.work_hash.as_bytes());
        keccak256(encoded)
    }

    /// Final digest that is signed: `keccak256(0x19 0x01 ‖ domainSeparator ‖ structHash)`.
    pub fn signing_hash(&self, domain: &Eip712Domain) -> [u8; 32] {
        let mut encoded = Vec::with_capacity(2 + 32 + 32);
        encoded.extend_from_slice(&[0x19, 0x01]);
        encoded.extend_from_slice(&domain.separator());
        encoded.extend_from_slice(&self.struct_hash());
        keccak256(encoded)
    }
}
