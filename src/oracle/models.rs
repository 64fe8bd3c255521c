/// Data models for Oracle node operations
///
/// This module defines the connection descriptor, the execution options shared
/// by every item of an invocation, and the operation selector.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::NodeError;

pub const DEFAULT_PORT: u16 = 1521;

fn default_port() -> u16 {
    DEFAULT_PORT
}

/// Configuration for an Oracle database connection
#[derive(Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionConfig {
    /// Database host/hostname
    #[serde(default)]
    pub host: String,

    /// Database port (typically 1521)
    #[serde(default = "default_port")]
    pub port: u16,

    /// Oracle service name
    #[serde(default)]
    pub service_name: String,

    /// Database username
    pub user: String,

    /// Database password
    #[serde(default)]
    pub password: String,

    /// Full connect string (EZConnect or TNS descriptor), overrides host/port/service
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connection_string: Option<String>,
}

impl ConnectionConfig {
    /// Creates a new ConnectionConfig addressed by host/port/service
    pub fn new(host: String, port: u16, service_name: String, user: String, password: String) -> Self {
        Self {
            host,
            port,
            service_name,
            user,
            password,
            connection_string: None,
        }
    }

    pub fn with_connection_string(mut self, connection_string: impl Into<String>) -> Self {
        self.connection_string = Some(connection_string.into());
        self
    }

    fn explicit_connect_string(&self) -> Option<&str> {
        self.connection_string
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    /// Validates the connection configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.explicit_connect_string().is_none() {
            if self.host.is_empty() {
                return Err("Host cannot be empty".to_string());
            }
            if self.service_name.is_empty() {
                return Err("Service name cannot be empty".to_string());
            }
            if self.port == 0 {
                return Err("Port must be greater than 0".to_string());
            }
        }
        if self.user.is_empty() {
            return Err("Username cannot be empty".to_string());
        }
        if self.password.is_empty() {
            return Err("Password cannot be empty".to_string());
        }
        Ok(())
    }

    /// Builds the Oracle connect string
    ///
    /// Format: `host:port/service_name`, unless an explicit connection string is set.
    pub fn connect_string(&self) -> String {
        match self.explicit_connect_string() {
            Some(explicit) => explicit.to_string(),
            None => format!("{}:{}/{}", self.host, self.port, self.service_name),
        }
    }
}

impl fmt::Debug for ConnectionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("service_name", &self.service_name)
            .field("user", &self.user)
            .field("password", &"***")
            .field("connection_string", &self.connection_string)
            .finish()
    }
}

/// Options applied to every statement of one invocation
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct ExecutionOptions {
    /// Commit after each statement
    pub auto_commit: bool,

    /// Rows fetched per round trip
    #[serde(rename = "fetchSize")]
    pub fetch_batch_size: u32,

    /// Maximum rows returned by a query, 0 = unlimited
    pub max_rows: u32,

    /// Reject table, column and procedure names that are not plain identifiers
    pub validate_identifiers: bool,
}

impl Default for ExecutionOptions {
    fn default() -> Self {
        Self {
            auto_commit: true,
            fetch_batch_size: 100,
            max_rows: 0,
            validate_identifiers: true,
        }
    }
}

/// The operation a node invocation performs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    ExecuteQuery,
    Insert,
    Update,
    Delete,
    ExecuteProcedure,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::ExecuteQuery => "executeQuery",
            Operation::Insert => "insert",
            Operation::Update => "update",
            Operation::Delete => "delete",
            Operation::ExecuteProcedure => "executeProcedure",
        }
    }
}

impl FromStr for Operation {
    type Err = NodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "executeQuery" => Ok(Operation::ExecuteQuery),
            "insert" => Ok(Operation::Insert),
            "update" => Ok(Operation::Update),
            "delete" => Ok(Operation::Delete),
            "executeProcedure" => Ok(Operation::ExecuteProcedure),
            other => Err(NodeError::invalid_input(format!(
                "Unsupported operation '{}'",
                other
            ))),
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
