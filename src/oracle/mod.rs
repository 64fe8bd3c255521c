/// Oracle database integration module
///
/// Client library discovery, statement generation, value conversion and the
/// driver-backed session used by the node executor.

pub mod client;
#[cfg(feature = "oracle")]
pub mod connection;
pub mod models;
pub mod sanitize;
pub mod session;
pub mod statement;
pub mod values;

pub use client::{check_client_ready, init_client, prime_client, resolve_client_path};
#[cfg(feature = "oracle")]
pub use connection::{OracleConnector, OracleSession};
pub use models::{ConnectionConfig, ExecutionOptions, Operation};
pub use session::{limit_rows, Connector, Outcome, ScopedSession, Session};
pub use statement::{BindMap, BoundStatement, OperationRequest, Record};
pub use values::{normalize, BindValue, InputValue};
