//! Claim Signature Generation Utility
//!
//! Lets a task creator authorize a payout off-ledger: signs the EIP-712
//! `Claim(taskId, hunter, workHash)` message under the ledger's domain. The
//! hunter then submits the signature with their claim.
//!
//! ## Usage
//!
//! ```bash
//! export ESCROW_CREATOR_PRIVATE_KEY=0x...
//! cargo run --bin sign_claim -- \
//!   --task-id 1 \
//!   --hunter 0x70997970c51812dc3a010c7d01b50e0d17dc79c8 \
//!   --work-hash 0x1111111111111111111111111111111111111111111111111111111111111111
//! ```
//!
//! The domain comes from the config file (`ESCROW_CONFIG_PATH`) unless
//! `--chain-id` and `--verifying-contract` are both given.

use anyhow::{Context, Result};
use clap::Parser;

use task_board_escrow::config::SignerConfig;
use task_board_escrow::{Address, Bytes32, ClaimMessage, ClaimSigner, Config, Eip712Domain};

#[derive(Parser, Debug)]
#[command(name = "sign_claim", about = "Sign a claim authorization for a task")]
struct Args {
    /// Task id being paid out
    #[arg(long)]
    task_id: u64,

    /// Payout destination
    #[arg(long)]
    hunter: Address,

    /// 32-byte work fingerprint (hex)
    #[arg(long)]
    work_hash: Bytes32,

    /// Chain id (overrides config; requires --verifying-contract)
    #[arg(long, requires = "verifying_contract")]
    chain_id: Option<u64>,

    /// Ledger address (overrides config; requires --chain-id)
    #[arg(long, requires = "chain_id")]
    verifying_contract: Option<Address>,

    /// Environment variable holding the creator's private key
    #[arg(long)]
    private_key_env: Option<String>,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let (domain, signer_config) = match (args.chain_id, args.verifying_contract) {
        (Some(chain_id), Some(verifying_contract)) => {
            (Eip712Domain::new(chain_id, verifying_contract), SignerConfig::default())
        }
        _ => {
            let config = Config::load().context("Failed to load config for domain")?;
            (config.domain.to_domain()?, config.signer)
        }
    };

    let signer_config = match args.private_key_env {
        Some(private_key_env) => SignerConfig { private_key_env },
        None => signer_config,
    };
    let signer = ClaimSigner::from_hex(&signer_config.get_private_key()?)?;

    let message = ClaimMessage::new(args.task_id, args.hunter, args.work_hash);
    let signature = signer.sign_claim(&domain, &message)?;

    println!("Creator: {}", signer.address());
    println!("Domain separator: 0x{}", hex::encode(domain.separator()));
    println!("Claim digest: 0x{}", hex::encode(message.signing_hash(&domain)));
    println!("Signature: {}", signature);

    Ok(())
}
