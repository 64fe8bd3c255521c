//! Per-item execution loop of the Oracle node.

use serde::Serialize;
use serde_json::{json, Map, Value};

use super::parameters::{read_operation, read_options, resolve_request, NodeParameters, CREDENTIAL_NAME};
use crate::error::NodeError;
use crate::oracle::models::{ExecutionOptions, Operation};
use crate::oracle::session::{Connector, Outcome, ScopedSession, Session};
use crate::oracle::statement::Record;

/// Index of the input item an output item came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PairedItem {
    pub item: usize,
}

/// One item handed back to the host
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutputItem {
    pub json: Map<String, Value>,
    #[serde(rename = "pairedItem")]
    pub paired_item: PairedItem,
}

impl OutputItem {
    pub fn new(json: Map<String, Value>, item: usize) -> Self {
        Self {
            json,
            paired_item: PairedItem { item },
        }
    }

    pub fn error(message: impl Into<String>, item: usize) -> Self {
        let mut json = Map::new();
        json.insert("error".to_string(), Value::String(message.into()));
        Self::new(json, item)
    }

    pub fn is_error(&self) -> bool {
        self.json.contains_key("error")
    }
}

/// Runs the configured operation once per input item over a single session.
///
/// Parameter and credential problems, and connection failures, abort before
/// any item runs. Item failures abort too unless the host asked to continue
/// on failure, in which case they become `{error}` items. The session is
/// closed exactly once however this returns.
pub fn execute<P, C>(parameters: &P, connector: &C, items: &[Record]) -> Result<Vec<OutputItem>, NodeError>
where
    P: NodeParameters + ?Sized,
    C: Connector,
{
    let operation = read_operation(parameters)?;
    let options = read_options(parameters)?;
    let continue_on_fail = parameters.continue_on_fail();
    let config = parameters.get_credential(CREDENTIAL_NAME)?;

    log::info!("Running {} for {} item(s)", operation, items.len());

    let mut session = ScopedSession::new(connector.connect(&config)?);

    let mut output = Vec::with_capacity(items.len());
    for (index, item) in items.iter().enumerate() {
        match execute_item(&mut session, parameters, operation, &options, index, item) {
            Ok(mut produced) => output.append(&mut produced),
            Err(e) if continue_on_fail => {
                log::warn!("Item {} failed, continuing: {}", index, e);
                output.push(OutputItem::error(e.to_string(), index));
            }
            Err(e) => {
                log::error!("Item {} failed: {}", index, e);
                return Err(e);
            }
        }
    }

    log::info!("{} finished with {} output item(s)", operation, output.len());
    Ok(output)
}

fn execute_item<S, P>(
    session: &mut ScopedSession<S>,
    parameters: &P,
    operation: Operation,
    options: &ExecutionOptions,
    index: usize,
    item: &Record,
) -> Result<Vec<OutputItem>, NodeError>
where
    S: Session,
    P: NodeParameters + ?Sized,
{
    let request = resolve_request(parameters, operation, index, item)?;
    let statement = request.build(options.validate_identifiers)?;
    let outcome = session.execute(&statement, options)?;
    Ok(map_outcome(operation, outcome, index))
}

/// Shapes a driver outcome into host items.
pub fn map_outcome(operation: Operation, outcome: Outcome, index: usize) -> Vec<OutputItem> {
    let mut summary = Map::new();
    summary.insert("success".to_string(), Value::Bool(true));

    if operation == Operation::ExecuteProcedure {
        summary.insert(
            "outputParameters".to_string(),
            Value::Object(outcome.output_parameters),
        );
        return vec![OutputItem::new(summary, index)];
    }

    match outcome.rows {
        Some(rows) => rows.into_iter().map(|row| OutputItem::new(row, index)).collect(),
        None => {
            summary.insert("rowsAffected".to_string(), json!(outcome.rows_affected));
            vec![OutputItem::new(summary, index)]
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_rows_become_items_in_order() {
        let outcome = Outcome::rows(vec![row(json!({"ID": 2})), row(json!({"ID": 1}))]);
        let items = map_outcome(Operation::ExecuteQuery, outcome, 3);
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].json.get("ID"), Some(&json!(2)));
        assert_eq!(items[1].json.get("ID"), Some(&json!(1)));
        assert!(items.iter().all(|i| i.paired_item.item == 3));
    }

    #[test]
    fn test_empty_result_set_yields_no_items() {
        let items = map_outcome(Operation::ExecuteQuery, Outcome::rows(vec![]), 0);
        assert!(items.is_empty());
    }

    #[test]
    fn test_dml_summary() {
        let items = map_outcome(Operation::Update, Outcome::affected(4), 1);
        assert_eq!(items.len(), 1);
        assert_eq!(Value::Object(items[0].json.clone()), json!({"success": true, "rowsAffected": 4}));
    }

    #[test]
    fn test_procedure_summary() {
        let mut outcome = Outcome::affected(0);
        outcome.output_parameters.insert("p_total".to_string(), json!("42"));
        let items = map_outcome(Operation::ExecuteProcedure, outcome, 0);
        assert_eq!(
            Value::Object(items[0].json.clone()),
            json!({"success": true, "outputParameters": {"p_total": "42"}})
        );
    }

    #[test]
    fn test_output_item_serialization() {
        let item = OutputItem::error("ORA-00942: table or view does not exist", 2);
        assert!(item.is_error());
        assert_eq!(
            serde_json::to_value(&item).unwrap(),
            json!({"json": {"error": "ORA-00942: table or view does not exist"}, "pairedItem": {"item": 2}})
        );
    }
}
