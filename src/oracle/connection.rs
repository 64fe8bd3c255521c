/// Oracle database connection management
///
/// Driver-backed implementation of the session seam. One `OracleSession`
/// wraps one `oracle::Connection` for the length of a node invocation.
/// Requires the `oracle` feature and an Oracle Instant Client at runtime.

use chrono::{DateTime, FixedOffset, NaiveDateTime};
use oracle::sql_type::OracleType;
use oracle::{Connection, Row, Statement};
use serde_json::{Map, Value};

use super::client::init_client;
use super::models::{ConnectionConfig, ExecutionOptions};
use super::session::{limit_rows, Connector, Outcome, Session};
use super::statement::BoundStatement;
use super::values::{number_from_text, BindValue};
use crate::error::{connect_error_message, NodeError};

/// Size of the VARCHAR2 buffer bound for procedure OUT parameters
const OUT_PARAM_SIZE: u32 = 4000;

/// Opens `OracleSession`s, priming the client library on first use
#[derive(Debug, Clone, Default)]
pub struct OracleConnector {
    client_dir: Option<String>,
}

impl OracleConnector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Instant Client directory to prime from instead of the default search
    pub fn with_client_dir(dir: impl Into<String>) -> Self {
        Self {
            client_dir: Some(dir.into()),
        }
    }
}

impl Connector for OracleConnector {
    type Session = OracleSession;

    fn connect(&self, config: &ConnectionConfig) -> Result<OracleSession, NodeError> {
        OracleSession::open(config, self.client_dir.as_deref())
    }
}

/// Represents an open Oracle database connection
pub struct OracleSession {
    conn: Connection,
    connect_string: String,
}

impl OracleSession {
    /// Creates a new database connection
    ///
    /// # Arguments
    /// * `config` - Connection descriptor with credentials
    /// * `client_dir` - Optional Instant Client directory
    pub fn open(config: &ConnectionConfig, client_dir: Option<&str>) -> Result<Self, NodeError> {
        config.validate().map_err(NodeError::InvalidInput)?;

        init_client(client_dir);

        let connect_string = config.connect_string();
        log::info!("Attempting to connect to Oracle database: {}", connect_string);

        let conn = Connection::connect(&config.user, &config.password, &connect_string)
            .map_err(|e| {
                let message = connect_error_message(&e.to_string(), &connect_string, &config.service_name);
                log::error!("{}", message);
                NodeError::ConnectionFailure(message)
            })?;

        log::info!("Successfully connected to {}", connect_string);

        Ok(Self {
            conn,
            connect_string,
        })
    }

    /// Tests the database connection with `SELECT 1 FROM dual`
    pub fn test_connection(&self) -> Result<(), NodeError> {
        log::info!("Testing database connection with SELECT 1 FROM dual");

        let val = self
            .conn
            .query_row_as::<i32>("SELECT 1 FROM dual", &[])
            .map_err(|e| NodeError::ConnectionFailure(format!("Connection test failed: {}", e)))?;

        log::info!("Connection test successful, received: {}", val);
        Ok(())
    }
}

impl Session for OracleSession {
    fn execute(
        &mut self,
        statement: &BoundStatement,
        options: &ExecutionOptions,
    ) -> Result<Outcome, NodeError> {
        self.conn.set_autocommit(options.auto_commit);

        log::debug!("Executing: {}", statement.sql);

        let mut stmt = self
            .conn
            .statement(&statement.sql)
            .fetch_array_size(options.fetch_batch_size.max(1))
            .build()?;

        for (name, value) in statement.binds.iter() {
            bind(&mut stmt, name, value)?;
        }
        for name in &statement.outputs {
            stmt.bind(name.as_str(), &OracleType::Varchar2(OUT_PARAM_SIZE))?;
        }

        if stmt.is_query() {
            let rows = fetch_rows(&mut stmt, options.max_rows)?;
            log::debug!("Fetched {} rows", rows.len());
            return Ok(Outcome::rows(rows));
        }

        stmt.execute(&[])?;

        let mut outcome = Outcome::affected(stmt.row_count()?);
        for name in &statement.outputs {
            let value: Option<String> = stmt.bind_value(name.as_str())?;
            outcome
                .output_parameters
                .insert(name.clone(), value.map(Value::String).unwrap_or(Value::Null));
        }

        log::debug!("{} rows affected", outcome.rows_affected);
        Ok(outcome)
    }

    fn close(&mut self) -> Result<(), NodeError> {
        log::info!("Closing connection to {}", self.connect_string);
        self.conn
            .close()
            .map_err(|e| NodeError::Unknown(format!("Failed to close connection: {}", e)))
    }
}

fn bind(stmt: &mut Statement, name: &str, value: &BindValue) -> Result<(), NodeError> {
    match value {
        BindValue::Null => stmt.bind(name, &None::<String>)?,
        BindValue::Number(n) => {
            if let Some(i) = n.as_i64() {
                stmt.bind(name, &i)?
            } else if let Some(u) = n.as_u64() {
                stmt.bind(name, &u)?
            } else if let Some(f) = n.as_f64() {
                stmt.bind(name, &f)?
            } else {
                stmt.bind(name, &n.to_string())?
            }
        }
        BindValue::Text(s) => stmt.bind(name, s)?,
        BindValue::Timestamp(ts) => stmt.bind(name, ts)?,
        BindValue::Binary(bytes) => stmt.bind(name, bytes)?,
    }
    Ok(())
}

fn fetch_rows(stmt: &mut Statement, max_rows: u32) -> Result<Vec<Map<String, Value>>, NodeError> {
    let rows = stmt.query(&[])?;

    let mut records = Vec::new();
    for row_result in limit_rows(rows, max_rows) {
        let row = row_result?;
        records.push(row_to_json(&row)?);
    }
    Ok(records)
}

/// Converts an Oracle row to a JSON object keyed by column name
fn row_to_json(row: &Row) -> Result<Map<String, Value>, NodeError> {
    let mut map = Map::new();
    for (i, col_info) in row.column_info().iter().enumerate() {
        let value = oracle_value_to_json(row, i, col_info.oracle_type())?;
        map.insert(col_info.name().to_string(), value);
    }
    Ok(map)
}

fn oracle_value_to_json(row: &Row, idx: usize, oracle_type: &OracleType) -> Result<Value, NodeError> {
    if row.sql_values()[idx].is_null()? {
        return Ok(Value::Null);
    }

    let value = match oracle_type {
        // Numeric types: JSON numbers when they fit, text otherwise
        OracleType::Number(_, _)
        | OracleType::Float(_)
        | OracleType::BinaryFloat
        | OracleType::BinaryDouble => {
            let text: String = row.get(idx)?;
            number_from_text(&text)
        }

        OracleType::Date | OracleType::Timestamp(_) => {
            let ts: NaiveDateTime = row.get(idx)?;
            Value::String(ts.format("%Y-%m-%dT%H:%M:%S%.f").to_string())
        }

        OracleType::TimestampTZ(_) | OracleType::TimestampLTZ(_) => {
            let ts: DateTime<FixedOffset> = row.get(idx)?;
            Value::String(ts.to_rfc3339())
        }

        // Binary data
        OracleType::BLOB | OracleType::Raw(_) | OracleType::LongRaw => {
            let bytes: Vec<u8> = row.get(idx)?;
            Value::String(hex::encode(&bytes))
        }

        // Character types, CLOB and anything else the driver can render as text
        _ => match row.get::<usize, String>(idx) {
            Ok(s) => Value::String(s),
            Err(e) => {
                log::debug!("Column {} of type {:?} has no text form: {}", idx, oracle_type, e);
                Value::Null
            }
        },
    };

    Ok(value)
}
