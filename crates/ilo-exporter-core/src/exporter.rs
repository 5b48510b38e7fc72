//! Aggregates all collectors behind one scrape entry point.

use std::sync::Mutex;
use std::time::Instant;

use prometheus::{Encoder, Registry, TextEncoder, proto};
use tracing::{debug, error};

use crate::collector::{BulkCollector, PowerCollector, Transport};
#[cfg(feature = "https")]
use crate::https::{FanSpeedCollector, SideChannel};
use crate::metrics::{ExporterCounters, MetricFamily, MetricsError, MetricsResult};

/// Something that produces metric families on every scrape.
///
/// Sources handle their own failures: a failed source logs, bumps its
/// failure counter and returns no families.
pub trait MetricSource: Send {
    /// Short name used in logs.
    fn name(&self) -> &str;

    fn collect(&mut self) -> Vec<MetricFamily>;
}

impl<T: Transport> MetricSource for BulkCollector<T> {
    fn name(&self) -> &str {
        self.target()
    }

    fn collect(&mut self) -> Vec<MetricFamily> {
        BulkCollector::collect(self).unwrap_or_default()
    }
}

impl<T: Transport> MetricSource for PowerCollector<T> {
    fn name(&self) -> &str {
        "power"
    }

    fn collect(&mut self) -> Vec<MetricFamily> {
        PowerCollector::collect(self).unwrap_or_default()
    }
}

#[cfg(feature = "https")]
impl<S: SideChannel> MetricSource for FanSpeedCollector<S> {
    fn name(&self) -> &str {
        "fan_speed"
    }

    fn collect(&mut self) -> Vec<MetricFamily> {
        FanSpeedCollector::collect(self)
    }
}

/// The set of collectors served on `/metrics`.
///
/// Each source sits behind its own mutex: concurrent scrapes run different
/// sources in parallel but never the same source twice at once.
pub struct Exporter {
    registry: Registry,
    counters: ExporterCounters,
    sources: Vec<Mutex<Box<dyn MetricSource>>>,
}

impl Exporter {
    /// Creates an exporter with its self-monitoring counters registered.
    pub fn new() -> MetricsResult<Self> {
        let registry = Registry::new();
        let counters = ExporterCounters::new(&registry)?;
        Ok(Self {
            registry,
            counters,
            sources: Vec::new(),
        })
    }

    /// Failure counters to hand to collectors.
    pub fn counters(&self) -> &ExporterCounters {
        &self.counters
    }

    /// Adds a source. Sources are collected in registration order.
    pub fn register(&mut self, source: impl MetricSource + 'static) {
        debug!(source = source.name(), "registered source");
        self.sources.push(Mutex::new(Box::new(source)));
    }

    pub fn source_count(&self) -> usize {
        self.sources.len()
    }

    /// Runs every source once and returns all families, followed by the
    /// exporter's own counters.
    pub fn gather(&self) -> Vec<proto::MetricFamily> {
        let start = Instant::now();
        let mut families = Vec::new();

        for source in &self.sources {
            let mut source = source.lock().unwrap_or_else(|e| e.into_inner());
            for family in source.collect() {
                match family.to_prometheus() {
                    Ok(converted) => families.extend(converted),
                    Err(e) => {
                        error!(source = source.name(), metric = %family.name, error = %e, "dropping metric family");
                    }
                }
            }
        }

        families.extend(self.registry.gather());
        debug!(
            families = families.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "scrape complete"
        );
        families
    }

    /// Runs a scrape and renders it in the Prometheus text format.
    pub fn render(&self) -> MetricsResult<String> {
        let families = self.gather();
        let encoder = TextEncoder::new();
        let mut buffer = Vec::new();
        encoder
            .encode(&families, &mut buffer)
            .map_err(|e| MetricsError::Encoding(e.to_string()))?;
        String::from_utf8(buffer).map_err(|e| MetricsError::Encoding(e.to_string()))
    }
}
