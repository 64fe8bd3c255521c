//! Oracle Database workflow node.
//!
//! Runs queries, inserts, updates, deletes and stored procedures against an
//! Oracle database once per input item, returning host-format output items.

pub mod credentials;
pub mod error;
pub mod logging;
pub mod node;
pub mod oracle;

pub use error::NodeError;
pub use node::{execute, NodeParameters, OutputItem, StaticParameters, CREDENTIAL_NAME};
