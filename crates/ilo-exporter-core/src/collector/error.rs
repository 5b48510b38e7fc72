//! Error types for the collection engine.

use thiserror::Error;

use super::oid::Oid;

/// Failure reported by the transport adapter.
///
/// Engine errors mean the session itself is broken (socket, encoding,
/// timeout). Agent errors mean the device answered but rejected the request.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// Transport or session failure.
    #[error("SNMP engine error: {0}")]
    Engine(String),
    /// No response within the session timeout.
    #[error("SNMP request timed out")]
    Timeout,
    /// The agent rejected the request.
    #[error("SNMP agent error status {status} at {}", describe_address(.address))]
    Agent {
        status: u32,
        index: u32,
        address: Option<Oid>,
    },
}

fn describe_address(address: &Option<Oid>) -> String {
    address
        .as_ref()
        .map(|a| a.to_string())
        .unwrap_or_else(|| "?".to_string())
}

/// Failure while discovering instance identifiers.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScanError {
    /// A simple index walk returned something other than an integer id.
    #[error("index {address} returned a non-integer id: {value}")]
    NotAnInteger { address: Oid, value: String },
    /// A complex index walk returned an address outside the index subtree.
    #[error("cannot derive an instance id from {address} under {base}")]
    MalformedIndex { base: Oid, address: Oid },
    /// The same id was returned twice in one scan.
    #[error("duplicate instance id {id} under {base}")]
    DuplicateId { base: Oid, id: String },
}

/// Failure that aborts one collection cycle.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CollectError {
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error(transparent)]
    Scan(#[from] ScanError),
}
