/// Credential management for the Oracle node
///
/// This module stores named Oracle connection descriptors in the OS keychain
/// so invocations can refer to them by name instead of carrying passwords.

use keyring::Entry;

use crate::oracle::models::ConnectionConfig;

/// Keychain service identifier for Oracle credentials
const KEYCHAIN_SERVICE_ORACLE: &str = "oracle-node:oracle";

/// Manager for Oracle connection credentials
pub struct CredentialManager;

impl CredentialManager {
    /// Stores a connection descriptor in the keychain
    ///
    /// # Storage format
    /// - Descriptor key: `oracle-node:oracle` / `{name}:descriptor` (JSON, no password)
    /// - Password key: `oracle-node:oracle` / `{name}:password`
    pub fn set_connection(name: &str, config: &ConnectionConfig) -> Result<(), String> {
        if name.is_empty() {
            return Err("Connection name cannot be empty".to_string());
        }
        config.validate()?;

        let mut descriptor = config.clone();
        descriptor.password.clear();
        let descriptor_json = serde_json::to_string(&descriptor)
            .map_err(|e| format!("Failed to serialize connection descriptor: {}", e))?;

        let descriptor_key = format!("{}:descriptor", name);
        let descriptor_entry = Entry::new(KEYCHAIN_SERVICE_ORACLE, &descriptor_key)
            .map_err(|e| format!("Failed to create keychain entry for descriptor: {}", e))?;
        descriptor_entry
            .set_password(&descriptor_json)
            .map_err(|e| format!("Failed to store connection descriptor: {}", e))?;

        let password_key = format!("{}:password", name);
        let password_entry = Entry::new(KEYCHAIN_SERVICE_ORACLE, &password_key)
            .map_err(|e| format!("Failed to create keychain entry for password: {}", e))?;
        password_entry
            .set_password(&config.password)
            .map_err(|e| format!("Failed to store password: {}", e))?;

        log::info!("Stored Oracle credentials for connection: {}", name);
        Ok(())
    }

    /// Retrieves a connection descriptor, password included
    pub fn get_connection(name: &str) -> Result<ConnectionConfig, String> {
        if name.is_empty() {
            return Err("Connection name cannot be empty".to_string());
        }

        let descriptor_key = format!("{}:descriptor", name);
        let descriptor_entry = Entry::new(KEYCHAIN_SERVICE_ORACLE, &descriptor_key)
            .map_err(|e| format!("Failed to create keychain entry for descriptor: {}", e))?;
        let descriptor_json = descriptor_entry
            .get_password()
            .map_err(|e| format!("Failed to retrieve connection '{}': {}", name, e))?;
        let mut config: ConnectionConfig = serde_json::from_str(&descriptor_json)
            .map_err(|e| format!("Stored descriptor for '{}' is corrupt: {}", name, e))?;

        let password_key = format!("{}:password", name);
        let password_entry = Entry::new(KEYCHAIN_SERVICE_ORACLE, &password_key)
            .map_err(|e| format!("Failed to create keychain entry for password: {}", e))?;
        config.password = password_entry
            .get_password()
            .map_err(|e| format!("Failed to retrieve password for '{}': {}", name, e))?;

        Ok(config)
    }

    /// Deletes a stored connection; missing entries are not an error
    pub fn delete_connection(name: &str) -> Result<(), String> {
        if name.is_empty() {
            return Err("Connection name cannot be empty".to_string());
        }

        for suffix in ["descriptor", "password"] {
            let key = format!("{}:{}", name, suffix);
            if let Ok(entry) = Entry::new(KEYCHAIN_SERVICE_ORACLE, &key) {
                let _ = entry.delete_password();
            }
        }

        log::info!("Deleted Oracle credentials for connection: {}", name);
        Ok(())
    }

    /// Checks if both descriptor and password exist for a connection
    pub fn has_connection(name: &str) -> bool {
        if name.is_empty() {
            return false;
        }

        ["descriptor", "password"].iter().all(|suffix| {
            Entry::new(KEYCHAIN_SERVICE_ORACLE, &format!("{}:{}", name, suffix))
                .ok()
                .and_then(|entry| entry.get_password().ok())
                .is_some()
        })
    }
}
