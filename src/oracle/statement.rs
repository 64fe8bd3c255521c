/// SQL generation for node operations
///
/// Each operation turns into SQL text with named placeholders plus the bind
/// values that go with them. Values are never spliced into the text; table,
/// column and procedure names are, so they are checked first unless the
/// caller turns validation off.

use serde_json::{Map, Value};

use super::models::Operation;
use super::sanitize::{check_identifier, PROCEDURE_PARTS, TABLE_PARTS};
use super::values::{normalize_json, BindValue};
use crate::error::NodeError;

/// One input item's JSON payload
pub type Record = Map<String, Value>;

/// Ordered bind values keyed by unique placeholder name
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BindMap {
    entries: Vec<(String, BindValue)>,
}

impl BindMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a bind, replacing the value in place if the name is already bound.
    pub fn insert(&mut self, name: impl Into<String>, value: BindValue) {
        let name = name.into();
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some(slot) => slot.1 = value,
            None => self.entries.push((name, value)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&BindValue> {
        self.entries.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn names(&self) -> Vec<&str> {
        self.entries.iter().map(|(n, _)| n.as_str()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &BindValue)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v))
    }
}

/// SQL text ready to execute
#[derive(Debug, Clone, PartialEq)]
pub struct BoundStatement {
    pub sql: String,
    pub binds: BindMap,
    /// OUT bind names (procedure calls only)
    pub outputs: Vec<String>,
}

impl BoundStatement {
    fn new(sql: String, binds: BindMap) -> Self {
        Self {
            sql,
            binds,
            outputs: Vec::new(),
        }
    }
}

/// What to run for a single input item
#[derive(Debug, Clone, PartialEq)]
pub enum OperationRequest {
    ExecuteQuery {
        sql: String,
        params: Record,
    },
    Insert {
        table: String,
        columns: Vec<String>,
        row: Record,
    },
    Update {
        table: String,
        key: String,
        row: Record,
    },
    Delete {
        table: String,
        key: String,
        row: Record,
    },
    ExecuteProcedure {
        name: String,
        params: Record,
        output_parameters: Vec<String>,
    },
}

impl OperationRequest {
    pub fn operation(&self) -> Operation {
        match self {
            OperationRequest::ExecuteQuery { .. } => Operation::ExecuteQuery,
            OperationRequest::Insert { .. } => Operation::Insert,
            OperationRequest::Update { .. } => Operation::Update,
            OperationRequest::Delete { .. } => Operation::Delete,
            OperationRequest::ExecuteProcedure { .. } => Operation::ExecuteProcedure,
        }
    }

    /// Generates the SQL text and binds for this request.
    pub fn build(&self, validate_identifiers: bool) -> Result<BoundStatement, NodeError> {
        let check = |kind: &str, id: &str, parts: usize| -> Result<(), NodeError> {
            if validate_identifiers {
                check_identifier(kind, id, parts)
            } else {
                Ok(())
            }
        };

        match self {
            OperationRequest::ExecuteQuery { sql, params } => {
                let mut binds = BindMap::new();
                for (name, value) in params {
                    binds.insert(name.as_str(), normalize_json(value));
                }
                Ok(BoundStatement::new(sql.clone(), binds))
            }

            OperationRequest::Insert { table, columns, row } => {
                check("table", table, TABLE_PARTS)?;
                if columns.is_empty() {
                    return Err(NodeError::invalid_input("No columns given for insert"));
                }
                let mut binds = BindMap::new();
                let mut placeholders = Vec::with_capacity(columns.len());
                for (i, column) in columns.iter().enumerate() {
                    check("column", column, 1)?;
                    let name = format!("val{}", i + 1);
                    placeholders.push(format!(":{}", name));
                    binds.insert(name, normalize_json(row.get(column).unwrap_or(&Value::Null)));
                }
                let sql = format!(
                    "INSERT INTO {} ({}) VALUES ({})",
                    table,
                    columns.join(", "),
                    placeholders.join(", ")
                );
                Ok(BoundStatement::new(sql, binds))
            }

            OperationRequest::Update { table, key, row } => {
                check("table", table, TABLE_PARTS)?;
                check("key", key, 1)?;
                let mut binds = BindMap::new();
                let mut assignments = Vec::new();
                let mut index = 1;
                for (column, value) in row.iter().filter(|(c, _)| *c != key) {
                    check("column", column, 1)?;
                    let name = format!("val{}", index);
                    assignments.push(format!("{} = :{}", column, name));
                    binds.insert(name, normalize_json(value));
                    index += 1;
                }
                if assignments.is_empty() {
                    return Err(NodeError::invalid_input(format!(
                        "Nothing to update: record has no fields besides key '{}'",
                        key
                    )));
                }
                let key_name = format!("key{}", index);
                let sql = format!(
                    "UPDATE {} SET {} WHERE {} = :{}",
                    table,
                    assignments.join(", "),
                    key,
                    key_name
                );
                binds.insert(key_name, normalize_json(row.get(key).unwrap_or(&Value::Null)));
                Ok(BoundStatement::new(sql, binds))
            }

            OperationRequest::Delete { table, key, row } => {
                check("table", table, TABLE_PARTS)?;
                check("key", key, 1)?;
                let mut binds = BindMap::new();
                binds.insert("key1", normalize_json(row.get(key).unwrap_or(&Value::Null)));
                let sql = format!("DELETE FROM {} WHERE {} = :key1", table, key);
                Ok(BoundStatement::new(sql, binds))
            }

            OperationRequest::ExecuteProcedure {
                name,
                params,
                output_parameters,
            } => {
                check("procedure", name, PROCEDURE_PARTS)?;
                // Each OUT name is bound once however often it was listed
                let mut outputs: Vec<String> = Vec::with_capacity(output_parameters.len());
                for out in output_parameters {
                    check("parameter", out, 1)?;
                    if !outputs.contains(out) {
                        outputs.push(out.clone());
                    }
                }
                let mut binds = BindMap::new();
                let mut placeholders = Vec::new();
                for (param, value) in params {
                    check("parameter", param, 1)?;
                    placeholders.push(format!(":{}", param));
                    if !outputs.contains(param) {
                        binds.insert(param.as_str(), normalize_json(value));
                    }
                }
                for out in &outputs {
                    if !params.contains_key(out) {
                        placeholders.push(format!(":{}", out));
                    }
                }
                let sql = format!("BEGIN {}({}); END;", name, placeholders.join(", "));
                Ok(BoundStatement {
                    sql,
                    binds,
                    outputs,
                })
            }
        }
    }
}

/// Splits a comma separated column list, trimming blanks.
pub fn split_columns(columns: &str) -> Vec<String> {
    split_names(columns)
}

/// Same rules as [`split_columns`], for OUT parameter lists.
pub fn split_names(list: &str) -> Vec<String> {
    list.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Reads a parameter object given either as structured JSON or as JSON text.
/// Null and blank text mean "no parameters".
pub fn parse_parameter_object(value: &Value) -> Result<Record, NodeError> {
    match value {
        Value::Null => Ok(Record::new()),
        Value::Object(map) => Ok(map.clone()),
        Value::String(text) if text.trim().is_empty() => Ok(Record::new()),
        Value::String(text) => match serde_json::from_str::<Value>(text) {
            Ok(Value::Object(map)) => Ok(map),
            Ok(_) => Err(NodeError::invalid_input("Parameters must be a JSON object")),
            Err(e) => Err(NodeError::invalid_input(format!("Invalid JSON parameters: {}", e))),
        },
        _ => Err(NodeError::invalid_input("Parameters must be a JSON object")),
    }
}
