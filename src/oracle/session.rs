//! The seam between the executor and a database driver.
//!
//! `OracleConnector` implements it on top of the `oracle` crate; tests plug in
//! scripted sessions.

use serde_json::{Map, Value};

use super::models::{ConnectionConfig, ExecutionOptions};
use super::statement::BoundStatement;
use crate::error::NodeError;

/// What a single statement execution produced
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Outcome {
    /// Rows in driver order, `Some` only for statements that return a result set
    pub rows: Option<Vec<Map<String, Value>>>,
    pub rows_affected: u64,
    /// OUT bind values by name
    pub output_parameters: Map<String, Value>,
}

impl Outcome {
    pub fn rows(rows: Vec<Map<String, Value>>) -> Self {
        Self {
            rows: Some(rows),
            ..Self::default()
        }
    }

    pub fn affected(rows_affected: u64) -> Self {
        Self {
            rows_affected,
            ..Self::default()
        }
    }
}

/// Caps a row stream at `max_rows`, 0 meaning unlimited. Rows past the cap
/// are never pulled from the underlying cursor.
pub fn limit_rows<I: Iterator>(rows: I, max_rows: u32) -> std::iter::Take<I> {
    let limit = match max_rows {
        0 => usize::MAX,
        n => n as usize,
    };
    rows.take(limit)
}

/// An open connection
pub trait Session {
    fn execute(
        &mut self,
        statement: &BoundStatement,
        options: &ExecutionOptions,
    ) -> Result<Outcome, NodeError>;

    fn close(&mut self) -> Result<(), NodeError>;
}

/// Opens sessions from a credential descriptor
pub trait Connector {
    type Session: Session;

    fn connect(&self, config: &ConnectionConfig) -> Result<Self::Session, NodeError>;
}

/// Owns a session for the length of one invocation and closes it exactly
/// once when dropped, whichever way the invocation ends.
pub struct ScopedSession<S: Session> {
    inner: Option<S>,
}

impl<S: Session> ScopedSession<S> {
    pub fn new(session: S) -> Self {
        Self {
            inner: Some(session),
        }
    }

    pub fn execute(
        &mut self,
        statement: &BoundStatement,
        options: &ExecutionOptions,
    ) -> Result<Outcome, NodeError> {
        match self.inner.as_mut() {
            Some(session) => session.execute(statement, options),
            None => Err(NodeError::Unknown("Session already closed".to_string())),
        }
    }
}

impl<S: Session> Drop for ScopedSession<S> {
    fn drop(&mut self) {
        if let Some(mut session) = self.inner.take() {
            match session.close() {
                Ok(()) => log::debug!("Oracle session closed"),
                Err(e) => log::warn!("Failed to close Oracle session: {}", e),
            }
        }
    }
}
