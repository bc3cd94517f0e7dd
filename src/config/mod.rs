//! Configuration Management Module
//!
//! This module handles loading and managing configuration for the escrow node.
//! Configuration includes the EIP-712 domain identity of the ledger, API
//! settings, the creator key source for the signing tool, and pre-funded
//! development accounts.

use serde::{Deserialize, Serialize};

use crate::crypto::eip712::{DEFAULT_DOMAIN_NAME, DEFAULT_DOMAIN_VERSION};
use crate::crypto::Eip712Domain;
use crate::state::{amount_serde, Address, Amount};

/// Environment variable that overrides the configuration file path.
pub const CONFIG_PATH_ENV: &str = "ESCROW_CONFIG_PATH";
/// Default configuration file path.
pub const DEFAULT_CONFIG_PATH: &str = "config/escrow.toml";

// ============================================================================
// CONFIGURATION STRUCTURES
// ============================================================================

/// Main configuration structure containing all service settings.
///
/// This structure holds configuration for:
/// - Ledger identity (EIP-712 domain)
/// - API server configuration
/// - Creator signing key source
/// - Genesis account balances
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Ledger identity that claim signatures are bound to
    pub domain: DomainConfig,
    /// API server configuration (host, port, CORS settings)
    pub api: ApiConfig,
    /// Creator-side signing configuration (used by the sign_claim tool)
    #[serde(default)]
    pub signer: SignerConfig,
    /// Pre-funded accounts credited at startup
    #[serde(default)]
    pub genesis: Vec<GenesisAccount>,
}

/// EIP-712 domain fields identifying this ledger deployment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DomainConfig {
    /// Protocol name
    #[serde(default = "default_domain_name")]
    pub name: String,
    /// Protocol version
    #[serde(default = "default_domain_version")]
    pub version: String,
    /// Chain ID (e.g., 31337 for local development)
    pub chain_id: u64,
    /// Address identifying this ledger instance
    pub verifying_contract: String,
}

fn default_domain_name() -> String {
    DEFAULT_DOMAIN_NAME.to_string()
}

fn default_domain_version() -> String {
    DEFAULT_DOMAIN_VERSION.to_string()
}

impl DomainConfig {
    /// Builds the EIP-712 domain descriptor.
    pub fn to_domain(&self) -> anyhow::Result<Eip712Domain> {
        let verifying_contract: Address = self.verifying_contract.parse().map_err(|e| {
            anyhow::anyhow!(
                "Invalid verifying_contract '{}': {}",
                self.verifying_contract,
                e
            )
        })?;
        Ok(Eip712Domain {
            name: self.name.clone(),
            version: self.version.clone(),
            chain_id: self.chain_id,
            verifying_contract,
        })
    }
}

/// Creator signing key source.
///
/// The key itself never lives in the file; only the name of the environment
/// variable that holds it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignerConfig {
    /// Environment variable name containing the hex secp256k1 private key
    pub private_key_env: String,
}

impl Default for SignerConfig {
    fn default() -> Self {
        Self {
            private_key_env: "ESCROW_CREATOR_PRIVATE_KEY".to_string(),
        }
    }
}

impl SignerConfig {
    /// Loads the private key from the environment variable.
    ///
    /// # Returns
    ///
    /// * `Ok(String)` - The private key (hex encoded)
    /// * `Err(anyhow::Error)` - Failed to load from environment
    pub fn get_private_key(&self) -> anyhow::Result<String> {
        std::env::var(&self.private_key_env).map_err(|_| {
            anyhow::anyhow!(
                "Environment variable '{}' not set. Please set it with your secp256k1 private key (hex encoded).",
                self.private_key_env
            )
        })
    }
}

/// A development account credited at startup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenesisAccount {
    pub address: String,
    /// Balance in wei (decimal string or integer)
    #[serde(with = "amount_serde")]
    pub balance: Amount,
}

/// API server configuration for external communication.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Host address to bind the API server to
    pub host: String,
    /// Port number to bind the API server to
    pub port: u16,
    /// Allowed CORS origins for cross-origin requests
    pub cors_origins: Vec<String>,
}

// ============================================================================
// CONFIGURATION LOADING AND MANAGEMENT
// ============================================================================

impl Config {
    /// Validates the configuration.
    ///
    /// # Returns
    ///
    /// * `Ok(())` - Configuration is usable
    /// * `Err(anyhow::Error)` - Description of the first problem found
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.domain.name.trim().is_empty() {
            return Err(anyhow::anyhow!("Configuration error: domain.name must not be empty"));
        }
        if self.domain.version.trim().is_empty() {
            return Err(anyhow::anyhow!(
                "Configuration error: domain.version must not be empty"
            ));
        }
        if self.domain.chain_id == 0 {
            return Err(anyhow::anyhow!(
                "Configuration error: domain.chain_id must be non-zero"
            ));
        }
        let domain = self.domain.to_domain()?;
        if domain.verifying_contract.is_zero() {
            return Err(anyhow::anyhow!(
                "Configuration error: domain.verifying_contract must not be the zero address"
            ));
        }
        if self.api.port == 0 {
            return Err(anyhow::anyhow!("Configuration error: api.port must be non-zero"));
        }
        for account in &self.genesis {
            let address: Address = account.address.parse().map_err(|e| {
                anyhow::anyhow!("Invalid genesis address '{}': {}", account.address, e)
            })?;
            if address.is_zero() {
                return Err(anyhow::anyhow!(
                    "Configuration error: genesis accounts must not use the zero address"
                ));
            }
        }
        Ok(())
    }

    /// Parses and validates configuration from TOML text.
    pub fn from_toml_str(content: &str) -> anyhow::Result<Self> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Loads configuration from the TOML file.
    ///
    /// This function:
    /// 1. Resolves the path from `ESCROW_CONFIG_PATH` (default `config/escrow.toml`)
    /// 2. If it exists, loads, parses and validates the configuration
    /// 3. If it doesn't exist, returns an error asking user to copy template
    pub fn load() -> anyhow::Result<Self> {
        let config_path =
            std::env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());

        if std::path::Path::new(&config_path).exists() {
            let content = std::fs::read_to_string(&config_path)?;
            Self::from_toml_str(&content)
        } else {
            Err(anyhow::anyhow!(
                "Configuration file '{}' not found. Please copy the template:\n\
                cp config/escrow.template.toml config/escrow.toml\n\
                Then edit config/escrow.toml with your actual values.",
                config_path
            ))
        }
    }

    /// Parsed genesis accounts.
    pub fn genesis_accounts(&self) -> anyhow::Result<Vec<(Address, Amount)>> {
        self.genesis
            .iter()
            .map(|account| {
                let address = account.address.parse().map_err(|e| {
                    anyhow::anyhow!("Invalid genesis address '{}': {}", account.address, e)
                })?;
                Ok((address, account.balance))
            })
            .collect()
    }
}

impl Default for Config {
    /// Local development configuration.
    fn default() -> Self {
        Self {
            domain: DomainConfig {
                name: default_domain_name(),
                version: default_domain_version(),
                chain_id: 31337,
                verifying_contract: "0x5fbdb2315678afecb367f032d93f642f64180aa3".to_string(),
            },
            api: ApiConfig {
                host: "127.0.0.1".to_string(),
                port: 3340,
                cors_origins: vec!["http://localhost:3000".to_string()],
            },
            signer: SignerConfig::default(),
            genesis: Vec::new(),
        }
    }
}
