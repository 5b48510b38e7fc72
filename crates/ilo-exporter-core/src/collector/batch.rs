//! Bulk GET requests split into bounded chunks.

use tracing::trace;

use super::error::TransportError;
use super::oid::Oid;
use super::traits::Transport;
use super::value::{DecodedValue, decode};

/// Maximum number of addresses per transport call.
///
/// iLO agents become unreliable when a single request carries more than
/// this many variable bindings.
pub const MAX_CHUNK: usize = 64;

/// Fetches and decodes `oids` in chunks of at most [`MAX_CHUNK`].
///
/// Results keep the input order and length. The first failing chunk aborts
/// the whole request; no partial results are returned.
pub fn get_all<T: Transport + ?Sized>(
    transport: &T,
    oids: &[Oid],
) -> Result<Vec<DecodedValue>, TransportError> {
    let mut results = Vec::with_capacity(oids.len());

    for (i, chunk) in oids.chunks(MAX_CHUNK).enumerate() {
        trace!(chunk = i, size = chunk.len(), "bulk get");
        let raw = transport.get_many(chunk)?;
        if raw.len() != chunk.len() {
            return Err(TransportError::Engine(format!(
                "expected {} values, agent returned {}",
                chunk.len(),
                raw.len()
            )));
        }
        results.extend(raw.iter().map(decode));
    }

    Ok(results)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collector::mock::MockTransport;
    use crate::collector::value::RawValue;

    fn column(n: u32) -> (MockTransport, Vec<Oid>) {
        let agent = MockTransport::new();
        let base = Oid::new(vec![1, 3, 6, 1, 4, 1, 232, 99]);
        let oids: Vec<Oid> = (1..=n).map(|i| base.child(&[i])).collect();
        for (i, oid) in oids.iter().enumerate() {
            agent.insert(oid.clone(), RawValue::Integer(i as i64));
        }
        (agent, oids)
    }

    #[test]
    fn test_chunk_count_and_order() {
        for (n, expected_calls) in [(0, 0), (1, 1), (64, 1), (65, 2), (128, 2), (129, 3)] {
            let (agent, oids) = column(n);
            let values = get_all(&agent, &oids).unwrap();

            assert_eq!(agent.get_calls(), expected_calls, "n = {}", n);
            assert_eq!(values.len(), n as usize);
            for (i, value) in values.iter().enumerate() {
                assert_eq!(*value, DecodedValue::Integer(i as i64));
            }
        }
    }

    #[test]
    fn test_no_dedup() {
        let (agent, oids) = column(2);
        let doubled = vec![oids[1].clone(), oids[0].clone(), oids[1].clone()];
        let values = get_all(&agent, &doubled).unwrap();
        assert_eq!(
            values,
            vec![
                DecodedValue::Integer(1),
                DecodedValue::Integer(0),
                DecodedValue::Integer(1)
            ]
        );
    }

    #[test]
    fn test_failing_chunk_aborts() {
        let (agent, oids) = column(130);
        agent.fail_get_after(1, TransportError::Engine("timeout".to_string()));

        let err = get_all(&agent, &oids).unwrap_err();
        assert_eq!(err, TransportError::Engine("timeout".to_string()));
        assert_eq!(agent.get_calls(), 2);
    }

    #[test]
    fn test_missing_instance_is_a_hole() {
        let (agent, mut oids) = column(1);
        oids.push(Oid::new(vec![1, 3, 6, 1, 4, 1, 232, 99, 42]));
        let values = get_all(&agent, &oids).unwrap();
        assert_eq!(values, vec![DecodedValue::Integer(0), DecodedValue::Absent]);
    }
}
