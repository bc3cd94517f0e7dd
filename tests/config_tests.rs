//! Unit tests for configuration loading and validation

use task_board_escrow::config::{CONFIG_PATH_ENV, GenesisAccount};
use task_board_escrow::{Config, ONE_ETHER};

const TEMPLATE: &str = include_str!("../config/escrow.template.toml");

/// 1. Test: Default Config Is Valid
/// Verifies that the built-in local development config passes validation and maps to the
/// expected EIP-712 domain.
/// Why: The node and the signing tool both fall back to these values.
#[test]
fn test_default_config_validates() {
    let config = Config::default();
    config.validate().unwrap();

    let domain = config.domain.to_domain().unwrap();
    assert_eq!(domain.name, "TaskBoardEscrow");
    assert_eq!(domain.version, "1");
    assert_eq!(domain.chain_id, 31337);
    assert_eq!(
        domain.verifying_contract.to_string(),
        "0x5fbdb2315678afecb367f032d93f642f64180aa3"
    );
    assert_eq!(config.signer.private_key_env, "ESCROW_CREATOR_PRIVATE_KEY");
}

/// 2. Test: Template Parses
/// Verifies that the shipped template parses, validates and yields its genesis accounts.
/// Why: Users start from this file.
#[test]
fn test_template_config_parses() {
    let config = Config::from_toml_str(TEMPLATE).unwrap();

    assert_eq!(config.api.port, 3340);
    let genesis = config.genesis_accounts().unwrap();
    assert_eq!(genesis.len(), 2);
    assert_eq!(
        genesis[0].0.to_string(),
        "0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266"
    );
    assert_eq!(genesis[0].1, 10_000 * ONE_ETHER);
}

/// 3. Test: Domain Name And Version Default
/// Verifies that omitted name/version fall back to the protocol defaults and that
/// omitted signer/genesis sections are allowed.
/// Why: Most deployments only vary the chain id and address.
#[test]
fn test_minimal_config_uses_defaults() {
    let config = Config::from_toml_str(
        r#"
        [domain]
        chain_id = 1
        verifying_contract = "0x5fbdb2315678afecb367f032d93f642f64180aa3"

        [api]
        host = "0.0.0.0"
        port = 8080
        cors_origins = ["*"]
        "#,
    )
    .unwrap();

    assert_eq!(config.domain.name, "TaskBoardEscrow");
    assert_eq!(config.domain.version, "1");
    assert!(config.genesis.is_empty());
    assert_eq!(config.signer.private_key_env, "ESCROW_CREATOR_PRIVATE_KEY");
}

/// 4. Test: Genesis Balance Accepts Integers
/// Verifies that a genesis balance may be written as a bare TOML integer.
/// Why: Small development balances are easier to write without quotes.
#[test]
fn test_genesis_balance_integer_form() {
    let account: GenesisAccount = toml::from_str(
        r#"
        address = "0x70997970c51812dc3a010c7d01b50e0d17dc79c8"
        balance = 1000
        "#,
    )
    .unwrap();
    assert_eq!(account.balance, 1000);
}

/// 5. Test: Invalid Configs Rejected
/// Verifies that each validation rule fires.
/// Why: A misconfigured domain would make every claim signature fail.
#[test]
fn test_invalid_configs_rejected() {
    let mut config = Config::default();
    config.domain.chain_id = 0;
    assert!(config.validate().is_err());

    let mut config = Config::default();
    config.domain.name = "  ".to_string();
    assert!(config.validate().is_err());

    let mut config = Config::default();
    config.domain.version = String::new();
    assert!(config.validate().is_err());

    let mut config = Config::default();
    config.domain.verifying_contract = "0x1234".to_string();
    assert!(config.validate().is_err());

    let mut config = Config::default();
    config.domain.verifying_contract = format!("0x{}", "00".repeat(20));
    assert!(config.validate().is_err());

    let mut config = Config::default();
    config.api.port = 0;
    assert!(config.validate().is_err());

    let mut config = Config::default();
    config.genesis.push(GenesisAccount {
        address: "not-an-address".to_string(),
        balance: ONE_ETHER,
    });
    assert!(config.validate().is_err());
}

/// 6. Test: Load From Environment Path
/// Verifies that `Config::load` reads the file named by the path variable and reports a
/// missing file with the copy-the-template hint.
/// Why: Deployments point the node at their own config file.
#[test]
fn test_load_uses_path_from_environment() {
    let path = std::env::temp_dir().join(format!("escrow-config-{}.toml", std::process::id()));
    std::fs::write(&path, TEMPLATE).unwrap();

    std::env::set_var(CONFIG_PATH_ENV, &path);
    let config = Config::load().unwrap();
    assert_eq!(config.domain.chain_id, 31337);

    std::fs::remove_file(&path).unwrap();
    let err = Config::load().unwrap_err();
    assert!(err.to_string().contains("not found"));

    std::env::remove_var(CONFIG_PATH_ENV);
}
