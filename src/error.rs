//! Error types for the Oracle node
//!
//! Every failure the node can surface is one of four kinds. Driver errors keep
//! the ORA code and a short hint so the host can show something actionable.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum NodeError {
    /// Malformed parameters, unknown operation, unsafe identifiers
    #[error("{0}")]
    InvalidInput(String),

    /// The database could not be reached or the login was rejected
    #[error("{0}")]
    ConnectionFailure(String),

    /// SQL or PL/SQL error reported by the driver
    #[error("{message}")]
    ExecutionFailure {
        code: i32,
        message: String,
        hint: Option<String>,
    },

    #[error("{0}")]
    Unknown(String),
}

impl NodeError {
    pub fn invalid_input(message: impl Into<String>) -> Self {
        NodeError::InvalidInput(message.into())
    }

    /// Builds an execution failure from driver text, picking the ORA code
    /// out of the message when there is one.
    pub fn execution(message: impl Into<String>) -> Self {
        let message = message.into();
        let code = ora_code(&message).unwrap_or(0);
        NodeError::ExecutionFailure {
            code,
            hint: hint_for_code(code),
            message,
        }
    }

    pub fn hint(&self) -> Option<&str> {
        match self {
            NodeError::ExecutionFailure { hint, .. } => hint.as_deref(),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for NodeError {
    fn from(e: serde_json::Error) -> Self {
        NodeError::InvalidInput(format!("Invalid JSON: {}", e))
    }
}

#[cfg(feature = "oracle")]
impl From<oracle::Error> for NodeError {
    fn from(e: oracle::Error) -> Self {
        NodeError::execution(e.to_string())
    }
}

/// Extracts `NNNNN` from the first `ORA-NNNNN` in a driver message.
pub fn ora_code(message: &str) -> Option<i32> {
    let start = message.find("ORA-")? + 4;
    let digits: String = message[start..]
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .collect();
    digits.parse().ok()
}

pub fn hint_for_code(code: i32) -> Option<String> {
    let hint = match code {
        1017 => "Check your username and password.",
        12154 => "Verify connection string format: host:port/service_name",
        12170 => "Connection timed out. Check network and firewall.",
        12541 => "No listener at specified host:port. Verify the address.",
        12545 => "Target host or object does not exist.",
        942 => "Table or view does not exist, or you lack permissions.",
        1031 => "Insufficient privileges. Contact your DBA.",
        1405 => "NULL value encountered where not allowed.",
        _ => return None,
    };
    Some(hint.to_string())
}

/// Rewrites a driver connect error into something a workflow author can act on.
pub fn connect_error_message(error_str: &str, connect_string: &str, service_name: &str) -> String {
    // Oracle client library not found
    if error_str.contains("DPI-1047") || error_str.contains("Cannot locate") {
        return "Oracle Instant Client library could not be loaded. Please ensure Oracle Instant Client is installed correctly.".to_string();
    }

    // Network/connection error
    if error_str.contains("ORA-12170") || error_str.contains("ORA-12541") || error_str.contains("timeout") {
        return format!("Could not connect to database at {}: Network error or database not reachable", connect_string);
    }

    if error_str.contains("ORA-01017") {
        return format!("Authentication failed for {}: Invalid username or password", connect_string);
    }

    if error_str.contains("ORA-12514") {
        return format!("Service name '{}' not found on the database server", service_name);
    }

    format!("Failed to connect to {}: {}", connect_string, error_str)
}
