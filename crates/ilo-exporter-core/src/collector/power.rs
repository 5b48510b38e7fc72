//! Server power draw reading.

use prometheus::IntCounter;
use tracing::{debug, error, warn};

use super::batch;
use super::error::CollectError;
use super::groups::{EnumTable, EnumValue};
use super::oid::Oid;
use super::traits::Transport;
use super::value::DecodedValue;
use crate::metrics::{MetricFamily, NAMESPACE};
use crate::targets::power::{READING, STATUS, STATUS_NAMES, SUPPORT, SUPPORT_NAMES};

/// Reads the power meter scalars and emits `ilo_server_power_draw`.
pub struct PowerCollector<T: Transport> {
    transport: T,
    failures: IntCounter,
}

impl<T: Transport> PowerCollector<T> {
    pub fn new(transport: T, failures: IntCounter) -> Self {
        Self { transport, failures }
    }

    /// Fetches reading, support and status in one batch.
    ///
    /// Non-integer values are replaced (reading `-1`, support
    /// `unsupported`, status `unknown`); only transport failures abort.
    pub fn collect(&mut self) -> Result<Vec<MetricFamily>, CollectError> {
        let name = format!("{}_server_power_draw", NAMESPACE);
        debug!(metric = %name, "collecting");

        let oids = [Oid::from(READING), Oid::from(SUPPORT), Oid::from(STATUS)];
        let values = match batch::get_all(&self.transport, &oids) {
            Ok(values) => values,
            Err(e) => {
                error!(metric = %name, error = %e, "failed to scan SNMP, aborting collection");
                self.failures.inc();
                return Err(e.into());
            }
        };

        let mut values = values.into_iter();
        let reading = match values.next() {
            Some(DecodedValue::Integer(watts)) => watts,
            other => {
                warn!(value = ?other, "expected power meter reading to be an int");
                -1
            }
        };
        let support = describe("support", values.next(), SUPPORT_NAMES, "unsupported");
        let status = describe("status", values.next(), STATUS_NAMES, "unknown");

        let mut family = MetricFamily::new(
            name,
            "Power draw of the server in watts",
            vec!["support".to_string(), "status".to_string()],
        );
        family.add_row(vec![support, status], reading as f64);
        Ok(vec![family])
    }
}

/// Maps a status code to its symbol, `unknown` when out of range and
/// `fallback` when the value is not an integer at all.
fn describe(field: &str, value: Option<DecodedValue>, names: EnumTable, fallback: &str) -> String {
    match value {
        Some(DecodedValue::Integer(code)) => match EnumValue::new(code, names).name() {
            Some(name) => name.to_string(),
            None => {
                warn!(field, code, "iLO returned a power meter value outside of the expected range");
                "unknown".to_string()
            }
        },
        other => {
            warn!(field, value = ?other, "expected power meter value to be an int");
            fallback.to_string()
        }
    }
}
