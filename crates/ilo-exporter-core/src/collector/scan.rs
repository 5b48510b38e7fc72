//! Discovery of hardware instances by walking an index column.

use std::collections::HashSet;

use tracing::trace;

use super::error::{CollectError, ScanError};
use super::oid::{InstanceId, Oid};
use super::traits::Transport;
use super::value::{DecodedValue, decode};

/// Walks `index` and returns the integer ids the index column lists as its
/// values, in walk order.
///
/// Used for tables whose index column enumerates instance ids as values
/// (fans, temperature sensors, CPUs, memory modules).
pub fn detect_things<T: Transport + ?Sized>(
    transport: &T,
    index: &Oid,
) -> Result<Vec<InstanceId>, CollectError> {
    let mut seen = HashSet::new();
    let mut ids = Vec::new();

    for (address, raw) in transport.walk(index)? {
        let id = match decode(&raw) {
            DecodedValue::Integer(n) => u32::try_from(n).ok(),
            _ => None,
        };
        let Some(id) = id else {
            return Err(ScanError::NotAnInteger {
                address,
                value: raw.to_string(),
            }
            .into());
        };

        let id = InstanceId::Index(id);
        trace!(%address, %id, "found instance");
        if !seen.insert(id.clone()) {
            return Err(ScanError::DuplicateId {
                base: index.clone(),
                id: id.to_string(),
            }
            .into());
        }
        ids.push(id);
    }

    Ok(ids)
}

/// Walks `index` and derives each instance id from the walked address: the
/// components after the `index` prefix form a tuple id.
///
/// Used for drives, whose index embeds controller and bay position.
pub fn detect_complex<T: Transport + ?Sized>(
    transport: &T,
    index: &Oid,
) -> Result<Vec<InstanceId>, CollectError> {
    let mut seen = HashSet::new();
    let mut ids = Vec::new();

    for (address, _) in transport.walk(index)? {
        let Some(suffix) = address.suffix_after(index) else {
            return Err(ScanError::MalformedIndex {
                base: index.clone(),
                address,
            }
            .into());
        };

        let id = InstanceId::Tuple(suffix.to_vec());
        trace!(%address, %id, "found instance");
        if !seen.insert(id.clone()) {
            return Err(ScanError::DuplicateId {
                base: index.clone(),
                id: id.to_string(),
            }
            .into());
        }
        ids.push(id);
    }

    Ok(ids)
}
