/// Integration tests for credential management
///
/// Run these tests with: cargo test --test credential_tests
/// The round-trip test needs a usable OS keychain and is ignored by default.

use oracle_node_lib::credentials::CredentialManager;
use oracle_node_lib::oracle::ConnectionConfig;

const TEST_CONNECTION_NAME: &str = "test_oracle_connection_12345";

fn test_config() -> ConnectionConfig {
    ConnectionConfig::new(
        "db.example.com".to_string(),
        1522,
        "ORCLPDB1".to_string(),
        "test_user".to_string(),
        "test_password_123".to_string(),
    )
}

#[test]
#[ignore] // Needs a keychain backend: cargo test --test credential_tests -- --ignored
fn test_store_and_retrieve_connection() {
    let _ = CredentialManager::delete_connection(TEST_CONNECTION_NAME);

    let config = test_config().with_connection_string("db.example.com:1522/ORCLPDB1");
    CredentialManager::set_connection(TEST_CONNECTION_NAME, &config)
        .expect("Should store credentials");

    let loaded = CredentialManager::get_connection(TEST_CONNECTION_NAME)
        .expect("Should retrieve credentials");
    assert_eq!(loaded, config);
    assert!(CredentialManager::has_connection(TEST_CONNECTION_NAME));

    CredentialManager::delete_connection(TEST_CONNECTION_NAME).expect("Should delete credentials");
    assert!(!CredentialManager::has_connection(TEST_CONNECTION_NAME));
}

#[test]
fn test_invalid_connection_name() {
    let result = CredentialManager::set_connection("", &test_config());
    let err = result.unwrap_err();
    assert!(err.contains("cannot be empty"), "Error should mention empty name: {}", err);
}

#[test]
fn test_invalid_username() {
    let mut config = test_config();
    config.user = String::new();
    let err = CredentialManager::set_connection("test", &config).unwrap_err();
    assert!(err.contains("Username cannot be empty"));
}

#[test]
fn test_invalid_password() {
    let mut config = test_config();
    config.password = String::new();
    let err = CredentialManager::set_connection("test", &config).unwrap_err();
    assert!(err.contains("Password cannot be empty"));
}

#[test]
fn test_retrieve_nonexistent_connection() {
    let result = CredentialManager::get_connection("nonexistent_connection_xyz_999");
    assert!(result.is_err(), "Should return error for nonexistent credentials");
}

#[test]
fn test_has_connection_for_nonexistent() {
    assert!(!CredentialManager::has_connection("nonexistent_connection_xyz_999"));
}

#[test]
fn test_delete_requires_name() {
    assert!(CredentialManager::delete_connection("").is_err());
}
