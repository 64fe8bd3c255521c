//! Host parameter seam.
//!
//! The workflow host resolves parameters and stores credentials; the node only
//! sees them through [`NodeParameters`]. [`StaticParameters`] is a fixed,
//! serde-loadable implementation for the CLI and tests.

use serde::Deserialize;
use serde_json::{Map, Value};
use std::collections::HashMap;

use crate::error::NodeError;
use crate::oracle::models::{ConnectionConfig, ExecutionOptions, Operation};
use crate::oracle::statement::{
    parse_parameter_object, split_columns, split_names, OperationRequest, Record,
};

/// Credential slot the node reads its connection from
pub const CREDENTIAL_NAME: &str = "oracleDb";

pub trait NodeParameters {
    fn get_credential(&self, name: &str) -> Result<ConnectionConfig, NodeError>;

    /// Value of `name` as resolved for the item at `item_index`, or `default`
    /// when the parameter is not set.
    fn get_parameter(&self, name: &str, item_index: usize, default: Value) -> Value;

    /// Whether per-item failures are reported as data instead of aborting
    fn continue_on_fail(&self) -> bool;
}

/// Parameters fixed for every item of an invocation
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StaticParameters {
    #[serde(default)]
    pub credentials: HashMap<String, ConnectionConfig>,
    #[serde(default)]
    pub parameters: Map<String, Value>,
    #[serde(default)]
    pub continue_on_fail: bool,
}

impl StaticParameters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_credential(mut self, name: &str, config: ConnectionConfig) -> Self {
        self.credentials.insert(name.to_string(), config);
        self
    }

    pub fn with_parameter(mut self, name: &str, value: Value) -> Self {
        self.parameters.insert(name.to_string(), value);
        self
    }

    pub fn with_continue_on_fail(mut self, enabled: bool) -> Self {
        self.continue_on_fail = enabled;
        self
    }
}

impl NodeParameters for StaticParameters {
    fn get_credential(&self, name: &str) -> Result<ConnectionConfig, NodeError> {
        self.credentials
            .get(name)
            .cloned()
            .ok_or_else(|| NodeError::invalid_input(format!("No credentials found for '{}'", name)))
    }

    fn get_parameter(&self, name: &str, _item_index: usize, default: Value) -> Value {
        self.parameters.get(name).cloned().unwrap_or(default)
    }

    fn continue_on_fail(&self) -> bool {
        self.continue_on_fail
    }
}

pub fn read_operation<P: NodeParameters + ?Sized>(parameters: &P) -> Result<Operation, NodeError> {
    match parameters.get_parameter("operation", 0, Value::Null) {
        Value::String(s) => s.parse(),
        Value::Null => Err(NodeError::invalid_input("Missing parameter 'operation'")),
        other => Err(NodeError::invalid_input(format!("Invalid operation {}", other))),
    }
}

pub fn read_options<P: NodeParameters + ?Sized>(parameters: &P) -> Result<ExecutionOptions, NodeError> {
    match parameters.get_parameter("options", 0, Value::Null) {
        Value::Null => Ok(ExecutionOptions::default()),
        value => serde_json::from_value(value)
            .map_err(|e| NodeError::invalid_input(format!("Invalid options: {}", e))),
    }
}

fn text_parameter<P: NodeParameters + ?Sized>(
    parameters: &P,
    name: &str,
    item_index: usize,
) -> Result<String, NodeError> {
    match parameters.get_parameter(name, item_index, Value::Null) {
        Value::String(s) if !s.trim().is_empty() => Ok(s),
        Value::Null | Value::String(_) => Err(NodeError::invalid_input(format!(
            "Missing parameter '{}'",
            name
        ))),
        other => Err(NodeError::invalid_input(format!(
            "Parameter '{}' must be text, got {}",
            name, other
        ))),
    }
}

fn name_parameter<P: NodeParameters + ?Sized>(
    parameters: &P,
    name: &str,
    item_index: usize,
) -> Result<String, NodeError> {
    text_parameter(parameters, name, item_index).map(|s| s.trim().to_string())
}

/// Builds the request for one input item from its record and the node parameters.
pub fn resolve_request<P: NodeParameters + ?Sized>(
    parameters: &P,
    operation: Operation,
    item_index: usize,
    item: &Record,
) -> Result<OperationRequest, NodeError> {
    let request = match operation {
        Operation::ExecuteQuery => OperationRequest::ExecuteQuery {
            sql: text_parameter(parameters, "query", item_index)?,
            params: parse_parameter_object(&parameters.get_parameter(
                "queryParameters",
                item_index,
                Value::Null,
            ))?,
        },
        Operation::Insert => OperationRequest::Insert {
            table: name_parameter(parameters, "table", item_index)?,
            columns: split_columns(&text_parameter(parameters, "columns", item_index)?),
            row: item.clone(),
        },
        Operation::Update => OperationRequest::Update {
            table: name_parameter(parameters, "table", item_index)?,
            key: name_parameter(parameters, "updateKey", item_index)?,
            row: item.clone(),
        },
        Operation::Delete => OperationRequest::Delete {
            table: name_parameter(parameters, "table", item_index)?,
            key: name_parameter(parameters, "deleteKey", item_index)?,
            row: item.clone(),
        },
        Operation::ExecuteProcedure => OperationRequest::ExecuteProcedure {
            name: name_parameter(parameters, "procedureName", item_index)?,
            params: parse_parameter_object(&parameters.get_parameter(
                "procedureParameters",
                item_index,
                Value::Null,
            ))?,
            output_parameters: match parameters.get_parameter("outputParameters", item_index, Value::Null) {
                Value::String(list) => split_names(&list),
                Value::Array(names) => names
                    .iter()
                    .filter_map(Value::as_str)
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect(),
                _ => Vec::new(),
            },
        },
    };
    Ok(request)
}
