//! Temperature sensor enrichment from the HTTPS side channel.

use std::collections::BTreeMap;

use prometheus::IntCounter;
use tracing::{debug, warn};

use super::client::SideChannel;
use super::models::TemperatureSensor;
use crate::collector::{
    CollectError, ExternalTable, GroupValue, InstanceId, MetricGroup, Oid, ScanHook, ScanMethod,
    TargetDefinition, Transport, ValueGroup, ValueMap, detect_things,
};

/// Externally-populated value groups filled from `json/health_temperature`.
///
/// Clones share the same tables.
#[derive(Debug, Clone, Default)]
pub struct TemperatureTables {
    label: ExternalTable,
    x_pos: ExternalTable,
    y_pos: ExternalTable,
    caution: ExternalTable,
    critical: ExternalTable,
}

impl TemperatureTables {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds the label groups to the info metric and the threshold metrics
    /// to a temperature target definition.
    pub fn extend(&self, definition: &mut TargetDefinition) {
        if let Some(info) = definition.groups.first_mut() {
            info.labels.extend([
                ValueGroup::external("label", self.label.clone()),
                ValueGroup::external("x_pos", self.x_pos.clone()),
                ValueGroup::external("y_pos", self.y_pos.clone()),
            ]);
        }
        definition.groups.push(MetricGroup::new(
            "Temperature caution thresholds for each temperature sensor in celsius as returned by the ILO over HTTPS",
            ValueGroup::external("threshold_caution", self.caution.clone()),
            vec![],
        ));
        definition.groups.push(MetricGroup::new(
            "Temperature critical thresholds for each temperature sensor in celsius as returned by the ILO over HTTPS",
            ValueGroup::external("threshold_critical", self.critical.clone()),
            vec![],
        ));
    }

    pub fn clear(&self) {
        for table in self.tables() {
            table.clear();
        }
    }

    /// Refills every table for `sensors`. Sensors missing from `info` get
    /// `unknown` / `-1` placeholders.
    pub fn populate(&self, sensors: &[InstanceId], info: &BTreeMap<u32, TemperatureSensor>) {
        let mut label = ValueMap::new();
        let mut x_pos = ValueMap::new();
        let mut y_pos = ValueMap::new();
        let mut caution = ValueMap::new();
        let mut critical = ValueMap::new();

        let missing = TemperatureSensor::default();
        for id in sensors {
            let sensor = match id {
                InstanceId::Index(n) => info.get(n).unwrap_or(&missing),
                InstanceId::Tuple(_) => &missing,
            };

            let text = sensor.label.clone().unwrap_or_else(|| "unknown".to_string());
            label.insert(id.clone(), GroupValue::Text(text));
            x_pos.insert(id.clone(), GroupValue::Text(sensor.xposition.unwrap_or(-1).to_string()));
            y_pos.insert(id.clone(), GroupValue::Text(sensor.yposition.unwrap_or(-1).to_string()));
            caution.insert(id.clone(), GroupValue::Integer(sensor.caution.unwrap_or(-1)));
            critical.insert(id.clone(), GroupValue::Integer(sensor.critical.unwrap_or(-1)));
        }

        self.label.replace(label);
        self.x_pos.replace(x_pos);
        self.y_pos.replace(y_pos);
        self.caution.replace(caution);
        self.critical.replace(critical);
    }

    fn tables(&self) -> [&ExternalTable; 5] {
        [&self.label, &self.x_pos, &self.y_pos, &self.caution, &self.critical]
    }
}

/// Scan hook that refreshes [`TemperatureTables`] on every sensor scan.
pub struct TemperatureScan<S: SideChannel> {
    source: S,
    tables: TemperatureTables,
    failures: IntCounter,
}

impl<S: SideChannel + 'static> TemperatureScan<S> {
    /// # Arguments
    /// * `source` - HTTPS client (or a test double)
    /// * `failures` - Counter incremented when the HTTPS fetch fails
    pub fn new(source: S, failures: IntCounter) -> Self {
        Self {
            source,
            tables: TemperatureTables::new(),
            failures,
        }
    }

    pub fn tables(&self) -> &TemperatureTables {
        &self.tables
    }

    /// Wires this hook and its tables into a temperature target definition.
    pub fn install(self, mut definition: TargetDefinition) -> TargetDefinition {
        self.tables.extend(&mut definition);
        definition.scan = ScanMethod::Hooked(Box::new(self));
        definition
    }
}

impl<S: SideChannel> ScanHook for TemperatureScan<S> {
    fn scan(
        &mut self,
        transport: &dyn Transport,
        index: &Oid,
    ) -> Result<Vec<InstanceId>, CollectError> {
        let sensors = detect_things(transport, index)?;

        self.tables.clear();
        match self.source.temperature_sensors() {
            Ok(info) => {
                debug!(sensors = info.len(), "fetched temperature sensor info");
                self.tables.populate(&sensors, &info);
            }
            Err(e) => {
                warn!(error = %e, "failed to fetch additional temperature sensor data over HTTPS");
                self.failures.inc();
            }
        }

        Ok(sensors)
    }
}
