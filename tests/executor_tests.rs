/// Integration tests for the per-item execution loop
///
/// A scripted connector stands in for the database so these run without an
/// Oracle client.

use std::cell::RefCell;
use std::rc::Rc;

use oracle_node_lib::node::{execute, StaticParameters, CREDENTIAL_NAME};
use oracle_node_lib::oracle::session::limit_rows;
use oracle_node_lib::oracle::{
    BoundStatement, ConnectionConfig, Connector, ExecutionOptions, Outcome, Record, Session,
};
use oracle_node_lib::NodeError;
use serde_json::{json, Value};

/// Marker value that makes the scripted session fail the statement
const FAIL_MARKER: &str = "boom";

#[derive(Default)]
struct Journal {
    connects: usize,
    closes: usize,
    statements: Vec<BoundStatement>,
    options: Vec<ExecutionOptions>,
}

struct ScriptedConnector {
    journal: Rc<RefCell<Journal>>,
    refuse: bool,
    fail_close: bool,
    rows: Vec<Record>,
    outputs: Record,
}

impl ScriptedConnector {
    fn new() -> Self {
        Self {
            journal: Rc::new(RefCell::new(Journal::default())),
            refuse: false,
            fail_close: false,
            rows: Vec::new(),
            outputs: Record::new(),
        }
    }
}

struct ScriptedSession {
    journal: Rc<RefCell<Journal>>,
    fail_close: bool,
    rows: Vec<Record>,
    outputs: Record,
}

impl Connector for ScriptedConnector {
    type Session = ScriptedSession;

    fn connect(&self, _config: &ConnectionConfig) -> Result<ScriptedSession, NodeError> {
        self.journal.borrow_mut().connects += 1;
        if self.refuse {
            return Err(NodeError::ConnectionFailure(
                "ORA-12541: TNS:no listener".to_string(),
            ));
        }
        Ok(ScriptedSession {
            journal: Rc::clone(&self.journal),
            fail_close: self.fail_close,
            rows: self.rows.clone(),
            outputs: self.outputs.clone(),
        })
    }
}

impl Session for ScriptedSession {
    fn execute(
        &mut self,
        statement: &BoundStatement,
        options: &ExecutionOptions,
    ) -> Result<Outcome, NodeError> {
        let mut journal = self.journal.borrow_mut();
        journal.statements.push(statement.clone());
        journal.options.push(options.clone());

        let poisoned = statement
            .binds
            .iter()
            .any(|(_, v)| format!("{:?}", v).contains(FAIL_MARKER));
        if poisoned {
            return Err(NodeError::execution(
                "ORA-00001: unique constraint (HR.EMP_PK) violated",
            ));
        }

        if statement.sql.trim_start().to_uppercase().starts_with("SELECT") {
            let rows = limit_rows(self.rows.iter().cloned(), options.max_rows).collect();
            return Ok(Outcome::rows(rows));
        }

        let mut outcome = Outcome::affected(1);
        if !statement.outputs.is_empty() {
            outcome.output_parameters = self.outputs.clone();
        }
        Ok(outcome)
    }

    fn close(&mut self) -> Result<(), NodeError> {
        self.journal.borrow_mut().closes += 1;
        if self.fail_close {
            return Err(NodeError::Unknown("ORA-03113: end-of-file on communication channel".to_string()));
        }
        Ok(())
    }
}

fn record(value: Value) -> Record {
    value.as_object().cloned().unwrap()
}

fn credential() -> ConnectionConfig {
    ConnectionConfig::new(
        "dbhost".to_string(),
        1521,
        "ORCLPDB1".to_string(),
        "hr".to_string(),
        "secret".to_string(),
    )
}

fn insert_parameters() -> StaticParameters {
    StaticParameters::new()
        .with_credential(CREDENTIAL_NAME, credential())
        .with_parameter("operation", json!("insert"))
        .with_parameter("table", json!("hr.employees"))
        .with_parameter("columns", json!("employee_id, last_name"))
}

fn three_items() -> Vec<Record> {
    vec![
        record(json!({"employee_id": 1, "last_name": "King"})),
        record(json!({"employee_id": 2, "last_name": FAIL_MARKER})),
        record(json!({"employee_id": 3, "last_name": "Kochhar"})),
    ]
}

#[test]
fn test_insert_builds_positional_binds() {
    let connector = ScriptedConnector::new();
    let items = vec![record(json!({"employee_id": 100, "last_name": "Lee", "ignored": true}))];

    let output = execute(&insert_parameters(), &connector, &items).unwrap();

    assert_eq!(output.len(), 1);
    assert_eq!(
        Value::Object(output[0].json.clone()),
        json!({"success": true, "rowsAffected": 1})
    );
    let journal = connector.journal.borrow();
    assert_eq!(
        journal.statements[0].sql,
        "INSERT INTO hr.employees (employee_id, last_name) VALUES (:val1, :val2)"
    );
    assert_eq!(journal.statements[0].binds.names(), vec!["val1", "val2"]);
    assert_eq!(journal.connects, 1);
    assert_eq!(journal.closes, 1);
}

#[test]
fn test_continue_on_fail_reports_error_items() {
    let connector = ScriptedConnector::new();
    let parameters = insert_parameters().with_continue_on_fail(true);

    let output = execute(&parameters, &connector, &three_items()).unwrap();

    assert_eq!(output.len(), 3);
    assert!(!output[0].is_error());
    assert!(output[1].is_error());
    assert!(!output[2].is_error());
    assert_eq!(output[1].paired_item.item, 1);
    assert_eq!(
        output[1].json.get("error"),
        Some(&json!("ORA-00001: unique constraint (HR.EMP_PK) violated"))
    );

    let journal = connector.journal.borrow();
    assert_eq!(journal.statements.len(), 3);
    assert_eq!(journal.closes, 1);
}

#[test]
fn test_failure_aborts_and_closes_once() {
    let connector = ScriptedConnector::new();

    let result = execute(&insert_parameters(), &connector, &three_items());

    match result {
        Err(NodeError::ExecutionFailure { code, .. }) => assert_eq!(code, 1),
        other => panic!("expected execution failure, got {:?}", other),
    }
    let journal = connector.journal.borrow();
    assert_eq!(journal.statements.len(), 2, "third item must never run");
    assert_eq!(journal.closes, 1);
}

#[test]
fn test_close_error_is_not_surfaced() {
    let mut connector = ScriptedConnector::new();
    connector.fail_close = true;

    let output = execute(&insert_parameters(), &connector, &three_items()[..1]).unwrap();

    assert_eq!(output.len(), 1);
    assert_eq!(connector.journal.borrow().closes, 1);
}

#[test]
fn test_connection_failure_aborts_even_with_continue_on_fail() {
    let mut connector = ScriptedConnector::new();
    connector.refuse = true;
    let parameters = insert_parameters().with_continue_on_fail(true);

    let result = execute(&parameters, &connector, &three_items());

    assert!(matches!(result, Err(NodeError::ConnectionFailure(_))));
    let journal = connector.journal.borrow();
    assert!(journal.statements.is_empty());
    assert_eq!(journal.closes, 0);
}

#[test]
fn test_invalid_operation_fails_before_connecting() {
    let connector = ScriptedConnector::new();
    let parameters = insert_parameters()
        .with_parameter("operation", json!("merge"))
        .with_continue_on_fail(true);

    let result = execute(&parameters, &connector, &three_items());

    assert!(matches!(result, Err(NodeError::InvalidInput(_))));
    assert_eq!(connector.journal.borrow().connects, 0);
}

#[test]
fn test_missing_credential_fails_before_connecting() {
    let connector = ScriptedConnector::new();
    let parameters = StaticParameters::new().with_parameter("operation", json!("delete"));

    let result = execute(&parameters, &connector, &three_items());

    assert!(matches!(result, Err(NodeError::InvalidInput(_))));
    assert_eq!(connector.journal.borrow().connects, 0);
}

#[test]
fn test_query_rows_become_items() {
    let mut connector = ScriptedConnector::new();
    connector.rows = vec![
        record(json!({"EMPLOYEE_ID": 100, "LAST_NAME": "King"})),
        record(json!({"EMPLOYEE_ID": 101, "LAST_NAME": null})),
    ];
    let parameters = StaticParameters::new()
        .with_credential(CREDENTIAL_NAME, credential())
        .with_parameter("operation", json!("executeQuery"))
        .with_parameter("query", json!("SELECT employee_id, last_name FROM employees WHERE dept = :dept"))
        .with_parameter("queryParameters", json!("{\"dept\": 90}"));

    let output = execute(&parameters, &connector, &[Record::new()]).unwrap();

    assert_eq!(output.len(), 2);
    assert_eq!(output[0].json.get("EMPLOYEE_ID"), Some(&json!(100)));
    assert_eq!(output[1].json.get("LAST_NAME"), Some(&Value::Null));
    assert!(output.iter().all(|o| o.paired_item.item == 0));

    let journal = connector.journal.borrow();
    assert_eq!(journal.statements[0].binds.names(), vec!["dept"]);
}

#[test]
fn test_options_reach_the_session() {
    let mut connector = ScriptedConnector::new();
    connector.rows = vec![record(json!({"N": 1})), record(json!({"N": 2})), record(json!({"N": 3}))];
    let parameters = StaticParameters::new()
        .with_credential(CREDENTIAL_NAME, credential())
        .with_parameter("operation", json!("executeQuery"))
        .with_parameter("query", json!("SELECT level AS n FROM dual CONNECT BY level <= 3"))
        .with_parameter(
            "options",
            json!({"autoCommit": false, "maxRows": 2, "fetchSize": 500, "validateIdentifiers": false}),
        );

    let output = execute(&parameters, &connector, &[Record::new(), Record::new()]).unwrap();

    assert_eq!(output.len(), 4);
    assert_eq!(output[1].json.get("N"), Some(&json!(2)));
    assert_eq!(output[2].paired_item.item, 1);

    let journal = connector.journal.borrow();
    let expected = ExecutionOptions {
        auto_commit: false,
        fetch_batch_size: 500,
        max_rows: 2,
        validate_identifiers: false,
    };
    assert_eq!(journal.options, vec![expected.clone(), expected]);
}

#[test]
fn test_default_options_reach_the_session() {
    let connector = ScriptedConnector::new();

    execute(&insert_parameters(), &connector, &three_items()[..1]).unwrap();

    let journal = connector.journal.borrow();
    assert_eq!(journal.options, vec![ExecutionOptions::default()]);
    assert_eq!(journal.options[0].fetch_batch_size, 100);
    assert_eq!(journal.options[0].max_rows, 0);
}

#[test]
fn test_invalid_query_parameters_become_error_item() {
    let connector = ScriptedConnector::new();
    let parameters = StaticParameters::new()
        .with_credential(CREDENTIAL_NAME, credential())
        .with_parameter("operation", json!("executeQuery"))
        .with_parameter("query", json!("SELECT 1 FROM dual"))
        .with_parameter("queryParameters", json!("{not json"))
        .with_continue_on_fail(true);

    let output = execute(&parameters, &connector, &[Record::new()]).unwrap();

    assert_eq!(output.len(), 1);
    assert!(output[0].is_error());
    assert!(connector.journal.borrow().statements.is_empty());
}

#[test]
fn test_procedure_returns_output_parameters() {
    let mut connector = ScriptedConnector::new();
    connector.outputs = record(json!({"p_total": "42"}));
    let parameters = StaticParameters::new()
        .with_credential(CREDENTIAL_NAME, credential())
        .with_parameter("operation", json!("executeProcedure"))
        .with_parameter("procedureName", json!("hr.payroll.calc_total"))
        .with_parameter("procedureParameters", json!({"p_dept": 90}))
        .with_parameter("outputParameters", json!("p_total"));

    let output = execute(&parameters, &connector, &[Record::new()]).unwrap();

    assert_eq!(
        Value::Object(output[0].json.clone()),
        json!({"success": true, "outputParameters": {"p_total": "42"}})
    );
    let journal = connector.journal.borrow();
    assert_eq!(
        journal.statements[0].sql,
        "BEGIN hr.payroll.calc_total(:p_dept, :p_total); END;"
    );
    assert_eq!(journal.statements[0].outputs, vec!["p_total"]);
}

#[test]
fn test_unsafe_table_name_is_rejected_per_item() {
    let connector = ScriptedConnector::new();
    let parameters = insert_parameters()
        .with_parameter("table", json!("employees; DROP TABLE x"))
        .with_continue_on_fail(true);

    let output = execute(&parameters, &connector, &three_items()[..1]).unwrap();

    assert!(output[0].is_error());
    assert!(connector.journal.borrow().statements.is_empty());
}

#[test]
fn test_update_and_delete_statements() {
    let connector = ScriptedConnector::new();
    let item = vec![record(json!({"employee_id": 7, "salary": 5000}))];

    let update = StaticParameters::new()
        .with_credential(CREDENTIAL_NAME, credential())
        .with_parameter("operation", json!("update"))
        .with_parameter("table", json!("employees"))
        .with_parameter("updateKey", json!("employee_id"));
    execute(&update, &connector, &item).unwrap();

    let delete = update
        .with_parameter("operation", json!("delete"))
        .with_parameter("deleteKey", json!("employee_id"));
    execute(&delete, &connector, &item).unwrap();

    let journal = connector.journal.borrow();
    assert_eq!(journal.statements[0].sql, "UPDATE employees SET salary = :val1 WHERE employee_id = :key2");
    assert_eq!(journal.statements[1].sql, "DELETE FROM employees WHERE employee_id = :key1");
    assert_eq!(journal.connects, 2);
    assert_eq!(journal.closes, 2);
}

#[test]
fn test_no_items_still_opens_and_closes() {
    let connector = ScriptedConnector::new();

    let output = execute(&insert_parameters(), &connector, &[]).unwrap();

    assert!(output.is_empty());
    let journal = connector.journal.borrow();
    assert_eq!(journal.connects, 1);
    assert_eq!(journal.closes, 1);
}
