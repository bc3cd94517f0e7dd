//! Cryptographic Operations Module
//!
//! This module handles the claim authorization protocol: EIP-712 typed-data
//! hashing of claim messages, secp256k1 signing on the creator side, and
//! signer recovery on the ledger side.
//!
//! ## Security Requirements
//!
//! **CRITICAL**: Private keys must never be exposed or logged. The ledger only
//! ever sees signatures and recovered addresses.

pub mod eip712;
pub mod signing;

use sha3::{Digest, Keccak256};

pub use eip712::{ClaimMessage, Eip712Domain};
pub use signing::{
    address_from_verifying_key, recover_address, ClaimSignature, ClaimSigner, Eip712Verifier,
    SignatureError, SignatureVerifier, SIGNATURE_LENGTH,
};

/// Computes keccak256 over the given bytes.
pub fn keccak256(data: impl AsRef<[u8]>) -> [u8; 32] {
    let mut hasher = Keccak256::new();
    hasher.update(data.as_ref());
    hasher.finalize().into()
}

/// Encodes an unsigned integer as a 32-byte big-endian ABI word.
pub fn u256_word(value: u64) -> [u8; 32] {
    let mut word = [0u8; 32];
    word[24..].copy_from_slice(&value.to_be_bytes());
    word
}
