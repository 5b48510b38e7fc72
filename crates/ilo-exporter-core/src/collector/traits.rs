//! Abstraction over the SNMP request/response client.
//!
//! The `Transport` trait allows collectors to talk to a real iLO agent or to
//! an in-memory mock agent for testing.

use super::error::TransportError;
use super::oid::Oid;
use super::value::RawValue;

/// Request/response access to an SNMP agent.
///
/// Implementations enforce their own timeouts. Both methods either return
/// every value or fail as a whole.
pub trait Transport: Send + Sync {
    /// Fetches the values of `oids`, in the same order.
    ///
    /// # Arguments
    /// * `oids` - Addresses to fetch; callers keep this within the
    ///   batching bound
    ///
    /// # Returns
    /// One raw value per requested address, or a transport error.
    fn get_many(&self, oids: &[Oid]) -> Result<Vec<RawValue>, TransportError>;

    /// Walks the subtree under `base`.
    ///
    /// # Returns
    /// Every `(address, value)` pair whose address lies inside `base`, in
    /// agent order, stopping at the first address outside the subtree.
    fn walk(&self, base: &Oid) -> Result<Vec<(Oid, RawValue)>, TransportError>;
}
