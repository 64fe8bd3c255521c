/// Workflow node surface
///
/// Reads the host's parameters, runs one statement per input item and hands
/// the results back as host items.

pub mod executor;
pub mod parameters;

pub use executor::{execute, map_outcome, OutputItem, PairedItem};
pub use parameters::{NodeParameters, StaticParameters, CREDENTIAL_NAME};
