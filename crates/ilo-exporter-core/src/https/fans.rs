//! Fan speed metrics from the HTTPS side channel.

use prometheus::IntCounter;
use tracing::{debug, error};

use super::client::SideChannel;
use crate::metrics::{MetricFamily, NAMESPACE};

/// Emits `ilo_fan_speed{id,units}` from `json/health_fans`.
pub struct FanSpeedCollector<S: SideChannel> {
    source: S,
    failures: IntCounter,
}

impl<S: SideChannel> FanSpeedCollector<S> {
    pub fn new(source: S, failures: IntCounter) -> Self {
        Self { source, failures }
    }

    /// Fetches fan speeds. A failed fetch is logged, counted and yields no
    /// family.
    pub fn collect(&mut self) -> Vec<MetricFamily> {
        let name = format!("{}_fan_speed", NAMESPACE);
        debug!(metric = %name, "collecting");

        let speeds = match self.source.fan_speeds() {
            Ok(speeds) => speeds,
            Err(e) => {
                error!(error = %e, "failed to fetch fan speed");
                self.failures.inc();
                return Vec::new();
            }
        };

        let mut family = MetricFamily::new(
            name,
            "Detailed fan speed as returned from the ILO over https",
            vec!["id".to_string(), "units".to_string()],
        );
        for (id, fan) in speeds {
            family.add_row(vec![id.to_string(), fan.units], fan.speed);
        }
        vec![family]
    }
}
