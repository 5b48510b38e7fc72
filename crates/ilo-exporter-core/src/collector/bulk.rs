//! Per-class collector: scan, resolve value groups, emit metric families.

use std::collections::HashMap;
use std::fmt;
use std::time::{Duration, Instant};

use prometheus::IntCounter;
use tracing::{debug, error, info, warn};

use super::error::CollectError;
use super::groups::{ValueGroup, ValueMap};
use super::oid::{InstanceId, Oid};
use super::scan::{detect_complex, detect_things};
use super::traits::Transport;
use crate::metrics::{MetricFamily, NAMESPACE};

/// Custom discovery step run in place of a plain index scan.
///
/// Used to attach side work to a scan, e.g. refreshing externally-populated
/// value groups whenever the instance list is refreshed.
pub trait ScanHook: Send {
    fn scan(&mut self, transport: &dyn Transport, index: &Oid)
    -> Result<Vec<InstanceId>, CollectError>;
}

/// How instance ids are discovered.
pub enum ScanMethod {
    /// Ids are the integer values of the index column.
    Simple,
    /// Ids are the address suffixes under the index column.
    Complex,
    Hooked(Box<dyn ScanHook>),
}

impl fmt::Debug for ScanMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScanMethod::Simple => f.write_str("Simple"),
            ScanMethod::Complex => f.write_str("Complex"),
            ScanMethod::Hooked(_) => f.write_str("Hooked"),
        }
    }
}

/// When the instance list is refreshed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanPolicy {
    /// Scan before every collection cycle.
    EveryCycle,
    /// Scan at construction only (and again after a failed first scan).
    Once,
}

impl ScanPolicy {
    /// `EveryCycle` unless `once` is set.
    pub fn from_scan_once(once: bool) -> Self {
        if once {
            ScanPolicy::Once
        } else {
            ScanPolicy::EveryCycle
        }
    }
}

/// One metric family: a value group, its label groups and help text.
#[derive(Debug, Clone)]
pub struct MetricGroup {
    pub documentation: String,
    pub value: ValueGroup,
    pub labels: Vec<ValueGroup>,
}

impl MetricGroup {
    pub fn new(documentation: impl Into<String>, value: ValueGroup, labels: Vec<ValueGroup>) -> Self {
        Self {
            documentation: documentation.into(),
            value,
            labels,
        }
    }
}

/// Everything a collector needs to know about one hardware class.
#[derive(Debug)]
pub struct TargetDefinition {
    /// Class name, used in metric names (`ilo_<target>_<group>`).
    pub target: String,
    /// Index column walked by the scan.
    pub index: Oid,
    pub scan: ScanMethod,
    pub groups: Vec<MetricGroup>,
}

/// Collector lifecycle phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectorState {
    Idle,
    Scanning,
    Collecting,
    Failed,
}

/// Collector for one hardware class.
///
/// Owns the instance id list. A failed cycle keeps the last good list.
pub struct BulkCollector<T: Transport> {
    transport: T,
    target: String,
    index: Oid,
    scan: ScanMethod,
    groups: Vec<MetricGroup>,
    policy: ScanPolicy,
    failures: IntCounter,

    ids: Vec<InstanceId>,
    scanned: bool,
    state: CollectorState,
    last_error: Option<CollectError>,
    last_duration: Option<Duration>,
}

impl<T: Transport> BulkCollector<T> {
    /// Creates a collector and runs the initial scan.
    ///
    /// # Arguments
    /// * `transport` - SNMP client (real or mock)
    /// * `definition` - Target tables and metric groups
    /// * `policy` - Re-scan policy
    /// * `failures` - Counter incremented once per failed cycle
    ///
    /// A failing initial scan is logged and counted; it does not prevent
    /// construction.
    pub fn new(
        transport: T,
        definition: TargetDefinition,
        policy: ScanPolicy,
        failures: IntCounter,
    ) -> Self {
        let mut collector = Self {
            transport,
            target: definition.target,
            index: definition.index,
            scan: definition.scan,
            groups: definition.groups,
            policy,
            failures,
            ids: Vec::new(),
            scanned: false,
            state: CollectorState::Idle,
            last_error: None,
            last_duration: None,
        };

        if let Err(e) = collector.scan() {
            collector.fail(e);
        }
        collector.state = CollectorState::Idle;
        collector
    }

    /// Class name of this collector.
    pub fn target(&self) -> &str {
        &self.target
    }

    /// Current instance id list.
    pub fn ids(&self) -> &[InstanceId] {
        &self.ids
    }

    pub fn state(&self) -> CollectorState {
        self.state
    }

    /// Error of the last cycle, if it failed.
    pub fn last_error(&self) -> Option<&CollectError> {
        self.last_error.as_ref()
    }

    /// Wall time of the last successful cycle.
    pub fn last_duration(&self) -> Option<Duration> {
        self.last_duration
    }

    /// Refreshes the instance id list.
    ///
    /// On failure the previous list is kept.
    pub fn scan(&mut self) -> Result<(), CollectError> {
        self.state = CollectorState::Scanning;
        debug!(class = %self.target, "scanning target");

        let ids = match &mut self.scan {
            ScanMethod::Simple => detect_things(&self.transport, &self.index)?,
            ScanMethod::Complex => detect_complex(&self.transport, &self.index)?,
            ScanMethod::Hooked(hook) => hook.scan(&self.transport, &self.index)?,
        };

        info!(class = %self.target, count = ids.len(), "found {} items for target", ids.len());
        self.ids = ids;
        self.scanned = true;
        Ok(())
    }

    /// Runs one collection cycle.
    ///
    /// Returns one family per metric group, or the error that aborted the
    /// cycle. A failed cycle emits nothing and increments the failure
    /// counter once.
    pub fn collect(&mut self) -> Result<Vec<MetricFamily>, CollectError> {
        let start = Instant::now();
        let result = self.run_cycle();
        self.state = CollectorState::Idle;

        match result {
            Ok(families) => {
                self.last_error = None;
                self.last_duration = Some(start.elapsed());
                Ok(families)
            }
            Err(e) => {
                self.fail(e.clone());
                self.state = CollectorState::Idle;
                Err(e)
            }
        }
    }

    fn fail(&mut self, e: CollectError) {
        self.state = CollectorState::Failed;
        error!(class = %self.target, error = %e, "failed to scan SNMP, aborting collection");
        self.failures.inc();
        self.last_error = Some(e);
    }

    fn run_cycle(&mut self) -> Result<Vec<MetricFamily>, CollectError> {
        if self.policy == ScanPolicy::EveryCycle || !self.scanned {
            self.scan()?;
        }

        self.state = CollectorState::Collecting;

        // Label groups are shared between metric groups, so each is fetched
        // at most once per cycle. Value groups are always fetched.
        let mut labels_cache: HashMap<&str, ValueMap> = HashMap::new();
        let mut families = Vec::with_capacity(self.groups.len());

        for group in &self.groups {
            let metric_name = format!("{}_{}_{}", NAMESPACE, self.target, group.value.name());
            debug!(metric = %metric_name, "collecting");

            let mut label_names = Vec::with_capacity(group.labels.len() + 1);
            label_names.push("id".to_string());
            for label in &group.labels {
                if !labels_cache.contains_key(label.name()) {
                    let values = label.resolve(&self.transport, &self.ids)?;
                    labels_cache.insert(label.name(), values);
                }
                label_names.push(label.name().to_string());
            }

            let values = group.value.resolve(&self.transport, &self.ids)?;

            let mut family = MetricFamily::new(&metric_name, &group.documentation, label_names);
            for id in &self.ids {
                let mut row = Vec::with_capacity(group.labels.len() + 1);
                row.push(id.to_string());
                for label in &group.labels {
                    let text = labels_cache
                        .get(label.name())
                        .and_then(|values| values.get(id))
                        .map(|value| value.to_string())
                        .unwrap_or_default();
                    row.push(text);
                }

                let value = match values.get(id).map(|v| v.as_metric()) {
                    Some(Some(value)) => value,
                    Some(None) => {
                        warn!(metric = %metric_name, %id, "non-numeric value");
                        f64::NAN
                    }
                    None => {
                        warn!(metric = %metric_name, %id, "missing value");
                        f64::NAN
                    }
                };
                family.add_row(row, value);
            }

            families.push(family);
        }

        Ok(families)
    }
}

impl<T: Transport> fmt::Debug for BulkCollector<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BulkCollector")
            .field("target", &self.target)
            .field("index", &self.index)
            .field("policy", &self.policy)
            .field("ids", &self.ids.len())
            .field("state", &self.state)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collector::error::{ScanError, TransportError};
    use crate::collector::groups::{EnumTable, ExternalTable, GroupValue};
    use crate::collector::mock::MockTransport;
    use crate::collector::value::RawValue;

    const INDEX: &[u32] = &[1, 3, 6, 1, 4, 1, 232, 1, 2, 2, 1, 1, 1];
    const NAME: &[u32] = &[1, 3, 6, 1, 4, 1, 232, 1, 2, 2, 1, 1, 3];
    const SPEED: &[u32] = &[1, 3, 6, 1, 4, 1, 232, 1, 2, 2, 1, 1, 4];
    const STATUS: &[u32] = &[1, 3, 6, 1, 4, 1, 232, 1, 2, 2, 1, 1, 6];
    const STATUS_NAMES: EnumTable = &[(1, "unknown"), (2, "ok"), (3, "degraded")];

    fn counter() -> IntCounter {
        IntCounter::new("test_failures_total", "test failures").unwrap()
    }

    fn agent_with_cpus(n: u32) -> MockTransport {
        let agent = MockTransport::new();
        for i in 1..=n {
            agent.insert_int(INDEX, &[i], i64::from(i));
            agent.insert_str(NAME, &[i], &format!("Proc {}", i));
            agent.insert_int(SPEED, &[i], 2400);
            agent.insert_int(STATUS, &[i], 2);
        }
        agent
    }

    fn definition() -> TargetDefinition {
        let name = ValueGroup::strings(NAME, "name");
        let status = ValueGroup::enums(STATUS, "status", STATUS_NAMES);
        TargetDefinition {
            target: "cpu".to_string(),
            index: Oid::from(INDEX),
            scan: ScanMethod::Simple,
            groups: vec![
                MetricGroup::new(
                    "Information about CPUs",
                    ValueGroup::dummy("info"),
                    vec![name.clone(), status],
                ),
                MetricGroup::new(
                    "Speed of CPUs in megahertz",
                    ValueGroup::numbers(SPEED, "speed"),
                    vec![name],
                ),
            ],
        }
    }

    #[test]
    fn test_collect_rows() {
        let agent = agent_with_cpus(2);
        let mut collector =
            BulkCollector::new(agent, definition(), ScanPolicy::EveryCycle, counter());

        let families = collector.collect().unwrap();
        assert_eq!(families.len(), 2);

        let info = &families[0];
        assert_eq!(info.name, "ilo_cpu_info");
        assert_eq!(info.label_names, vec!["id", "name", "status"]);
        assert_eq!(info.rows.len(), 2);
        assert_eq!(info.row("1").unwrap().labels, vec!["1", "Proc 1", "ok"]);
        assert_eq!(info.row("1").unwrap().value, 1.0);

        let speed = &families[1];
        assert_eq!(speed.name, "ilo_cpu_speed");
        assert_eq!(speed.row("2").unwrap().value, 2400.0);
        assert_eq!(collector.state(), CollectorState::Idle);
    }

    #[test]
    fn test_labels_resolved_once_per_cycle() {
        let agent = agent_with_cpus(2);
        let handle = agent.clone();
        let mut collector =
            BulkCollector::new(agent, definition(), ScanPolicy::EveryCycle, counter());

        let name_of_first = Oid::from(NAME).child(&[1]);
        let speed_of_first = Oid::from(SPEED).child(&[1]);

        collector.collect().unwrap();
        assert_eq!(handle.requested(&name_of_first), 1);
        assert_eq!(handle.requested(&speed_of_first), 1);

        collector.collect().unwrap();
        assert_eq!(handle.requested(&name_of_first), 2);
        assert_eq!(handle.requested(&speed_of_first), 2);
    }

    #[test]
    fn test_missing_value_is_nan() {
        let agent = agent_with_cpus(2);
        agent.remove(&Oid::from(SPEED).child(&[2]));
        agent.insert(Oid::from(SPEED).child(&[1]), RawValue::OctetString(b"fast".to_vec()));

        let mut definition = definition();
        definition.groups[1].value = ValueGroup::raw(SPEED, "speed");
        let mut collector =
            BulkCollector::new(agent, definition, ScanPolicy::EveryCycle, counter());

        let families = collector.collect().unwrap();
        let speed = &families[1];
        assert_eq!(speed.rows.len(), 2);
        assert!(speed.row("1").unwrap().value.is_nan());
        assert!(speed.row("2").unwrap().value.is_nan());
    }

    #[test]
    fn test_failed_scan_keeps_ids() {
        let agent = agent_with_cpus(3);
        let handle = agent.clone();
        let failures = counter();
        let mut collector =
            BulkCollector::new(agent, definition(), ScanPolicy::EveryCycle, failures.clone());
        assert_eq!(collector.ids().len(), 3);
        assert_eq!(failures.get(), 0);

        handle.fail_walks(TransportError::Timeout);
        let err = collector.collect().unwrap_err();
        assert_eq!(err, CollectError::Transport(TransportError::Timeout));
        assert_eq!(failures.get(), 1);
        assert_eq!(collector.ids().len(), 3);
        assert_eq!(collector.last_error(), Some(&err));
        assert_eq!(collector.state(), CollectorState::Idle);

        handle.clear_failures();
        collector.collect().unwrap();
        assert_eq!(failures.get(), 1);
        assert!(collector.last_error().is_none());
    }

    #[test]
    fn test_failed_resolution_counts_once() {
        let agent = agent_with_cpus(2);
        let handle = agent.clone();
        let failures = counter();
        let mut collector =
            BulkCollector::new(agent, definition(), ScanPolicy::Once, failures.clone());

        handle.fail_get_after(1, TransportError::Engine("socket closed".to_string()));
        assert!(collector.collect().is_err());
        assert_eq!(failures.get(), 1);
    }

    #[test]
    fn test_rescan_replaces_ids() {
        let agent = agent_with_cpus(2);
        let handle = agent.clone();
        let mut collector =
            BulkCollector::new(agent, definition(), ScanPolicy::EveryCycle, counter());
        assert_eq!(collector.ids().len(), 2);

        handle.insert_int(INDEX, &[3], 3);
        collector.collect().unwrap();
        assert_eq!(
            collector.ids(),
            &[InstanceId::Index(1), InstanceId::Index(2), InstanceId::Index(3)]
        );
    }

    #[test]
    fn test_scan_once_policy() {
        let agent = agent_with_cpus(2);
        let handle = agent.clone();
        let mut collector = BulkCollector::new(agent, definition(), ScanPolicy::Once, counter());
        assert_eq!(handle.walk_calls(), 1);

        handle.insert_int(INDEX, &[3], 3);
        collector.collect().unwrap();
        collector.collect().unwrap();
        assert_eq!(handle.walk_calls(), 1);
        assert_eq!(collector.ids().len(), 2);
    }

    #[test]
    fn test_failed_initial_scan_retries_under_scan_once() {
        let agent = agent_with_cpus(2);
        agent.fail_walks(TransportError::Timeout);
        let handle = agent.clone();
        let failures = counter();
        let mut collector =
            BulkCollector::new(agent, definition(), ScanPolicy::Once, failures.clone());
        assert!(collector.ids().is_empty());
        assert_eq!(failures.get(), 1);

        handle.clear_failures();
        let families = collector.collect().unwrap();
        assert_eq!(families[0].rows.len(), 2);
        assert_eq!(handle.walk_calls(), 2);

        collector.collect().unwrap();
        assert_eq!(handle.walk_calls(), 2);
    }

    #[test]
    fn test_duplicate_ids_abort_cycle() {
        let agent = agent_with_cpus(1);
        let handle = agent.clone();
        let failures = counter();
        let mut collector =
            BulkCollector::new(agent, definition(), ScanPolicy::EveryCycle, failures.clone());

        handle.insert_int(INDEX, &[2], 1);
        let err = collector.collect().unwrap_err();
        assert!(matches!(err, CollectError::Scan(ScanError::DuplicateId { .. })));
        assert_eq!(collector.ids(), &[InstanceId::Index(1)]);
        assert_eq!(failures.get(), 1);
    }

    struct CountingHook {
        table: ExternalTable,
    }

    impl ScanHook for CountingHook {
        fn scan(
            &mut self,
            transport: &dyn Transport,
            index: &Oid,
        ) -> Result<Vec<InstanceId>, CollectError> {
            let ids = detect_things(transport, index)?;
            self.table.replace(
                ids.iter()
                    .map(|id| (id.clone(), GroupValue::Text(format!("sensor {}", id))))
                    .collect(),
            );
            Ok(ids)
        }
    }

    #[test]
    fn test_hooked_scan_feeds_external_labels() {
        let agent = agent_with_cpus(2);
        let table = ExternalTable::new();
        let mut definition = definition();
        definition.scan = ScanMethod::Hooked(Box::new(CountingHook {
            table: table.clone(),
        }));
        definition.groups[1]
            .labels
            .push(ValueGroup::external("label", table.clone()));

        let mut collector =
            BulkCollector::new(agent, definition, ScanPolicy::EveryCycle, counter());
        let families = collector.collect().unwrap();
        assert_eq!(
            families[1].row("2").unwrap().labels,
            vec!["2", "Proc 2", "sensor 2"]
        );
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn test_missing_label_renders_empty() {
        let agent = agent_with_cpus(1);
        let mut definition = definition();
        definition.groups[1]
            .labels
            .push(ValueGroup::external("label", ExternalTable::new()));

        let mut collector =
            BulkCollector::new(agent, definition, ScanPolicy::EveryCycle, counter());
        let families = collector.collect().unwrap();
        assert_eq!(families[1].row("1").unwrap().labels, vec!["1", "Proc 1", ""]);
    }
}
