//! secp256k1 Key Generation Utility
//!
//! This binary generates a new secp256k1 key pair for a task creator.
//!
//! ## Usage
//!
//! ```bash
//! cargo run --bin generate_keys
//! ```
//!
//! ## Output
//!
//! - Private key (hex) - export it in the env var named by `[signer].private_key_env`
//! - Address - the creator identity that funds tasks and signs claims

use task_board_escrow::ClaimSigner;

fn main() {
    let signer = ClaimSigner::random();

    println!("Generated secp256k1 Key Pair:");
    println!("Private Key (hex): {}", signer.secret_hex());
    println!("Address: {}", signer.address());
    println!();
    println!("Export the private key, e.g.:");
    println!("  export ESCROW_CREATOR_PRIVATE_KEY={}", signer.secret_hex());
}
