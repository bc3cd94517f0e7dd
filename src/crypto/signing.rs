//! secp256k1 claim signing and signer recovery

use anyhow::{Context, Result};
use k256::ecdsa::{
    RecoveryId, Signature as EcdsaSignature, SigningKey as EcdsaSigningKey,
    VerifyingKey as EcdsaVerifyingKey,
};
use rand::RngCore;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use tracing::debug;

use super::eip712::{ClaimMessage, Eip712Domain};
use super::keccak256;
use crate::state::{Address, ParseHexError};

/// Length of an `r ‖ s ‖ v` signature.
pub const SIGNATURE_LENGTH: usize = 65;

/// Reasons a signature could not be turned into a signer address.
///
/// The ledger collapses all of these into a single invalid-signature
/// rejection; the detail is only logged.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SignatureError {
    #[error("invalid signature length: expected {SIGNATURE_LENGTH} bytes, got {0}")]
    InvalidLength(usize),
    #[error("invalid recovery byte: {0}")]
    InvalidRecoveryId(u8),
    #[error("malformed signature scalars")]
    Malformed,
    #[error("non-canonical signature (high s)")]
    HighS,
    #[error("public key recovery failed")]
    RecoveryFailed,
}

// ============================================================================
// SIGNATURE BYTES
// ============================================================================

/// 65-byte Ethereum-style signature (`r ‖ s ‖ v`, `v` in {27, 28}).
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct ClaimSignature(pub [u8; SIGNATURE_LENGTH]);

impl ClaimSignature {
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn to_vec(&self) -> Vec<u8> {
        self.0.to_vec()
    }
}

impl FromStr for ClaimSignature {
    type Err = ParseHexError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let stripped = s.strip_prefix("0x").unwrap_or(s);
        let bytes =
            hex::decode(stripped).map_err(|e| ParseHexError::InvalidHex(e.to_string()))?;
        let actual = bytes.len();
        bytes
            .try_into()
            .map(ClaimSignature)
            .map_err(|_| ParseHexError::InvalidLength {
                expected: SIGNATURE_LENGTH,
                actual,
            })
    }
}

impl fmt::Display for ClaimSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl fmt::Debug for ClaimSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ClaimSignature({})", self)
    }
}

impl Serialize for ClaimSignature {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for ClaimSignature {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

// ============================================================================
// ADDRESS DERIVATION AND RECOVERY
// ============================================================================

/// Derives the account address of a secp256k1 public key.
///
/// The address is `keccak256(uncompressed_public_key[1..])[12..32]`, i.e. the
/// last 20 bytes of the hash of the point coordinates without the `0x04` tag.
pub fn address_from_verifying_key(key: &EcdsaVerifyingKey) -> Address {
    let point = key.to_encoded_point(false);
    let hash = keccak256(&point.as_bytes()[1..]);
    let mut address = [0u8; 20];
    address.copy_from_slice(&hash[12..32]);
    Address(address)
}

/// Recovers the signer address of a 32-byte prehash.
///
/// Only canonical (low-s) signatures with `v` of 27 or 28 are accepted, so a
/// signature cannot be malleated into a second valid encoding.
pub fn recover_address(prehash: &[u8; 32], signature: &[u8]) -> Result<Address, SignatureError> {
    if signature.len() != SIGNATURE_LENGTH {
        return Err(SignatureError::InvalidLength(signature.len()));
    }

    let v = signature[64];
    let recovery_byte = match v {
        27 | 28 => v - 27,
        _ => return Err(SignatureError::InvalidRecoveryId(v)),
    };
    let recovery_id =
        RecoveryId::from_byte(recovery_byte).ok_or(SignatureError::InvalidRecoveryId(v))?;

    let ecdsa_signature =
        EcdsaSignature::from_slice(&signature[..64]).map_err(|_| SignatureError::Malformed)?;
    if ecdsa_signature.normalize_s().is_some() {
        return Err(SignatureError::HighS);
    }

    let key = EcdsaVerifyingKey::recover_from_prehash(prehash, &ecdsa_signature, recovery_id)
        .map_err(|_| SignatureError::RecoveryFailed)?;
    Ok(address_from_verifying_key(&key))
}

// ============================================================================
// VERIFIER CAPABILITY
// ============================================================================

/// Recovers who authorized a claim.
///
/// Injected into the ledger so tests can substitute a deterministic fake.
pub trait SignatureVerifier: Send + Sync {
    fn recover_claim_signer(
        &self,
        domain: &Eip712Domain,
        message: &ClaimMessage,
        signature: &[u8],
    ) -> Result<Address, SignatureError>;
}

/// Production verifier: EIP-712 digest plus secp256k1 public key recovery.
#[derive(Debug, Clone, Copy, Default)]
pub struct Eip712Verifier;

impl SignatureVerifier for Eip712Verifier {
    fn recover_claim_signer(
        &self,
        domain: &Eip712Domain,
        message: &ClaimMessage,
        signature: &[u8],
    ) -> Result<Address, SignatureError> {
        let digest = message.signing_hash(domain);
        let signer = recover_address(&digest, signature)?;
        debug!(
            "Recovered claim signer {} for task {} (digest 0x{})",
            signer,
            message.task_id,
            hex::encode(digest)
        );
        Ok(signer)
    }
}

// ============================================================================
// CREATOR-SIDE SIGNER
// ============================================================================

/// Off-ledger signer used by task creators to authorize claims.
pub struct ClaimSigner {
    signing_key: EcdsaSigningKey,
}

impl ClaimSigner {
    /// Creates a signer from a 32-byte secp256k1 secret key.
    pub fn from_bytes(secret: [u8; 32]) -> Result<Self> {
        let signing_key = EcdsaSigningKey::from_bytes(&secret.into())
            .map_err(|e| anyhow::anyhow!("Failed to create ECDSA signing key: {}", e))?;
        Ok(Self { signing_key })
    }

    /// Creates a signer from a hex-encoded secret key (with or without `0x`).
    pub fn from_hex(private_key: &str) -> Result<Self> {
        let hex_key = private_key.trim();
        let hex_key = hex_key.strip_prefix("0x").unwrap_or(hex_key);
        let bytes = hex::decode(hex_key).context("Invalid private key hex")?;
        let secret: [u8; 32] = bytes.try_into().map_err(|b: Vec<u8>| {
            anyhow::anyhow!(
                "Invalid private key length: expected 32 bytes, got {}",
                b.len()
            )
        })?;
        Self::from_bytes(secret)
    }

    /// Generates a fresh key from the operating system RNG.
    pub fn random() -> Self {
        let mut rng = rand::rngs::OsRng;
        loop {
            let mut secret = [0u8; 32];
            rng.fill_bytes(&mut secret);
            // Zero or out-of-range scalars are rejected; draw again.
            if let Ok(signer) = Self::from_bytes(secret) {
                return signer;
            }
        }
    }

    pub fn address(&self) -> Address {
        address_from_verifying_key(self.signing_key.verifying_key())
    }

    /// Hex-encoded secret key, `0x`-prefixed. Never log this value.
    pub fn secret_hex(&self) -> String {
        format!("0x{}", hex::encode(self.signing_key.to_bytes()))
    }

    /// Signs a claim authorization under the given domain.
    pub fn sign_claim(
        &self,
        domain: &Eip712Domain,
        message: &ClaimMessage,
    ) -> Result<ClaimSignature> {
        let digest = message.signing_hash(domain);

        use k256::ecdsa::signature::hazmat::PrehashSigner;
        let signature: EcdsaSignature = self
            .signing_key
            .sign_prehash(&digest)
            .map_err(|e| anyhow::anyhow!("Failed to sign precomputed hash: {}", e))?;
        let signature = signature.normalize_s().unwrap_or(signature);

        // Pick the recovery id that yields our own key.
        let expected = self.address();
        let recovery_byte = (0u8..=1)
            .find(|byte| {
                RecoveryId::from_byte(*byte)
                    .and_then(|id| {
                        EcdsaVerifyingKey::recover_from_prehash(&digest, &signature, id).ok()
                    })
                    .map(|key| address_from_verifying_key(&key) == expected)
                    .unwrap_or(false)
            })
            .ok_or_else(|| anyhow::anyhow!("Failed to determine recovery id"))?;

        let mut bytes = [0u8; SIGNATURE_LENGTH];
        bytes[..64].copy_from_slice(&signature.to_bytes());
        bytes[64] = recovery_byte + 27;
        Ok(ClaimSignature(bytes))
    }
}

impl fmt::Debug for ClaimSigner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClaimSigner")
            .field("address", &self.address())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::Bytes32;

    #[test]
    fn test_address_of_secret_key_one() {
        let mut secret = [0u8; 32];
        secret[31] = 1;
        let signer = ClaimSigner::from_bytes(secret).unwrap();
        assert_eq!(
            signer.address().to_string(),
            "0x7e5f4552091a69125d5dfcb7b8c2659029395bdf"
        );
    }

    #[test]
    fn test_address_of_well_known_dev_account() {
        let signer = ClaimSigner::from_hex(
            "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80",
        )
        .unwrap();
        assert_eq!(
            signer.address().to_string(),
            "0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266"
        );
    }

    #[test]
    fn test_sign_and_recover() {
        let signer = ClaimSigner::random();
        let domain = Eip712Domain::new(31337, Address([0x55; 20]));
        let message = ClaimMessage::new(7, Address([0x66; 20]), Bytes32([0x77; 32]));

        let signature = signer.sign_claim(&domain, &message).unwrap();
        assert!(signature.0[64] == 27 || signature.0[64] == 28);

        let recovered = Eip712Verifier
            .recover_claim_signer(&domain, &message, signature.as_bytes())
            .unwrap();
        assert_eq!(recovered, signer.address());
    }

    #[test]
    fn test_rejects_bad_length_and_recovery_byte() {
        let digest = [0x11u8; 32];
        assert_eq!(
            recover_address(&digest, &[0u8; 64]),
            Err(SignatureError::InvalidLength(64))
        );

        let signer = ClaimSigner::random();
        let domain = Eip712Domain::new(1, Address([0x01; 20]));
        let message = ClaimMessage::new(1, Address([0x02; 20]), Bytes32::ZERO);
        let mut bytes = signer.sign_claim(&domain, &message).unwrap().0;
        bytes[64] = 1;
        assert_eq!(
            recover_address(&message.signing_hash(&domain), &bytes),
            Err(SignatureError::InvalidRecoveryId(1))
        );
    }

    #[test]
    fn test_rejects_high_s_malleation() {
        let signer = ClaimSigner::random();
        let domain = Eip712Domain::new(1, Address([0x01; 20]));
        let message = ClaimMessage::new(1, Address([0x02; 20]), Bytes32::ZERO);
        let signature = signer.sign_claim(&domain, &message).unwrap();

        // Flip s to n - s and the parity bit: same signer, second encoding.
        const ORDER: [u8; 32] = [
            0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff,
            0xff, 0xfe, 0xba, 0xae, 0xdc, 0xe6, 0xaf, 0x48, 0xa0, 0x3b, 0xbf, 0xd2, 0x5e, 0x8c,
            0xd0, 0x36, 0x41, 0x41,
        ];
        let mut malleated = signature.0;
        let mut borrow = 0i16;
        for i in (0..32).rev() {
            let diff = ORDER[i] as i16 - signature.0[32 + i] as i16 - borrow;
            borrow = if diff < 0 { 1 } else { 0 };
            malleated[32 + i] = (diff + (borrow << 8)) as u8;
        }
        malleated[64] = if signature.0[64] == 27 { 28 } else { 27 };

        assert_eq!(
            recover_address(&message.signing_hash(&domain), &malleated),
            Err(SignatureError::HighS)
        );
    }

    #[test]
    fn test_signature_hex_roundtrip() {
        let signature = ClaimSignature([0xab; SIGNATURE_LENGTH]);
        let parsed: ClaimSignature = signature.to_string().parse().unwrap();
        assert_eq!(parsed, signature);
        assert!("0x1234".parse::<ClaimSignature>().is_err());
    }
}
