//! Shared test helpers for ledger tests
//!
//! The module is organized into several categories:
//! - **Constants**: Fixed keys, addresses, amounts and times
//! - **Ledger Builders**: Ledgers wired to a manual clock and a real or fake verifier
//! - **Signing Helpers**: Creator-side claim signatures

#![allow(dead_code)]

use std::sync::Arc;

use task_board_escrow::crypto::{SignatureError, SignatureVerifier};
use task_board_escrow::{
    Address, Amount, Bytes32, ClaimMessage, ClaimSignature, ClaimSigner, Eip712Domain,
    Eip712Verifier, EscrowLedger, ManualClock, TaskId, Timestamp, ONE_ETHER,
};

// ============================================================================
// CONSTANTS
// ============================================================================

/// Well-known development key #0 (creator)
pub const CREATOR_PRIVATE_KEY: &str =
    "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

/// Well-known development key #1 (hunter)
pub const HUNTER_PRIVATE_KEY: &str =
    "0x59c6995e998f97a5a0044966f0945389dc9e86dae88c7a8412f4603b6b78690d";

/// Well-known development key #2 (unrelated third party)
pub const OTHER_PRIVATE_KEY: &str =
    "0x5de4111afa1a4b94908f83103eb1f1706367c2e68ca870fc3fb9a804cdab365a";

/// Local development chain id
pub const TEST_CHAIN_ID: u64 = 31337;

/// Ledger address used in the test domain
pub const TEST_VERIFYING_CONTRACT: &str = "0x5fbdb2315678afecb367f032d93f642f64180aa3";

/// Fixed starting time for the manual clock (2024-01-01T00:00:00Z)
pub const START_TIME: Timestamp = 1_704_067_200;

pub const ONE_DAY: u64 = 24 * 60 * 60;

/// Balance every test account starts with
pub const STARTING_BALANCE: Amount = 100 * ONE_ETHER;

/// Fixed work fingerprint
pub const WORK_HASH: Bytes32 = Bytes32([0x1f; 32]);

/// Converts a decimal ether fraction given in milli-ether to wei.
pub fn milli_ether(milli: u128) -> Amount {
    milli * ONE_ETHER / 1000
}

// ============================================================================
// ACTORS
// ============================================================================

pub fn creator() -> ClaimSigner {
    ClaimSigner::from_hex(CREATOR_PRIVATE_KEY).unwrap()
}

pub fn hunter() -> ClaimSigner {
    ClaimSigner::from_hex(HUNTER_PRIVATE_KEY).unwrap()
}

pub fn other() -> ClaimSigner {
    ClaimSigner::from_hex(OTHER_PRIVATE_KEY).unwrap()
}

pub fn test_domain() -> Eip712Domain {
    Eip712Domain::new(TEST_CHAIN_ID, TEST_VERIFYING_CONTRACT.parse().unwrap())
}

// ============================================================================
// LEDGER BUILDERS
// ============================================================================

/// Ledger with the real EIP-712 verifier, a manual clock at `START_TIME`,
/// and the three actors funded with `STARTING_BALANCE`.
pub fn setup_ledger() -> (EscrowLedger, Arc<ManualClock>) {
    setup_ledger_with_verifier(Arc::new(Eip712Verifier))
}

pub fn setup_ledger_with_verifier(
    verifier: Arc<dyn SignatureVerifier>,
) -> (EscrowLedger, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::new(START_TIME));
    let mut ledger = EscrowLedger::new(test_domain(), verifier, clock.clone());
    for actor in [creator(), hunter(), other()] {
        ledger.fund(actor.address(), STARTING_BALANCE).unwrap();
    }
    (ledger, clock)
}

/// Creates a task funded by the creator and returns its id.
pub fn create_task(ledger: &mut EscrowLedger, amount: Amount, deadline: Timestamp) -> TaskId {
    ledger
        .create_task(creator().address(), deadline, amount)
        .unwrap()
}

// ============================================================================
// SIGNING HELPERS
// ============================================================================

pub fn sign_claim(
    signer: &ClaimSigner,
    domain: &Eip712Domain,
    task_id: TaskId,
    hunter: Address,
    work_hash: Bytes32,
) -> ClaimSignature {
    signer
        .sign_claim(domain, &ClaimMessage::new(task_id, hunter, work_hash))
        .unwrap()
}

/// Creator signature for `(task_id, hunter, WORK_HASH)` under the test domain.
pub fn creator_signature(task_id: TaskId, hunter: Address) -> ClaimSignature {
    sign_claim(&creator(), &test_domain(), task_id, hunter, WORK_HASH)
}

// ============================================================================
// FAKE VERIFIER
// ============================================================================

/// Deterministic verifier double: a "signature" is just the 20 signer
/// address bytes. Anything else fails to recover.
pub struct FakeVerifier;

impl FakeVerifier {
    pub fn signature_for(signer: Address) -> Vec<u8> {
        signer.0.to_vec()
    }
}

impl SignatureVerifier for FakeVerifier {
    fn recover_claim_signer(
        &self,
        _domain: &Eip712Domain,
        _message: &ClaimMessage,
        signature: &[u8],
    ) -> Result<Address, SignatureError> {
        let bytes: [u8; 20] = signature
            .try_into()
            .map_err(|_| SignatureError::InvalidLength(signature.len()))?;
        Ok(Address(bytes))
    }
}
