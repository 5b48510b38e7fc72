//! Metric families produced by collectors and their Prometheus rendering.
//!
//! Collectors produce plain [`MetricFamily`] values (name, help, label
//! names, rows). The exporter converts them to Prometheus gauges only when a
//! scrape is rendered, so the collection engine never depends on the wire
//! format.

use prometheus::core::Collector as _;
use prometheus::proto;
use prometheus::{GaugeVec, IntCounter, Opts, Registry};
use thiserror::Error;

/// Prefix of every metric name.
pub const NAMESPACE: &str = "ilo";

/// Errors that can occur while rendering metrics.
#[derive(Debug, Error)]
pub enum MetricsError {
    /// A metric could not be built or registered.
    #[error("failed to register metric: {0}")]
    Registration(#[from] prometheus::Error),

    /// The text exposition could not be produced.
    #[error("failed to encode metrics: {0}")]
    Encoding(String),
}

/// Result type for metrics operations.
pub type MetricsResult<T> = Result<T, MetricsError>;

/// One sample: label values (same order as the family's label names) and
/// the gauge value.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricRow {
    pub labels: Vec<String>,
    pub value: f64,
}

/// A gauge family ready for the metrics sink.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricFamily {
    pub name: String,
    pub help: String,
    pub label_names: Vec<String>,
    pub rows: Vec<MetricRow>,
}

impl MetricFamily {
    pub fn new(name: impl Into<String>, help: impl Into<String>, label_names: Vec<String>) -> Self {
        Self {
            name: name.into(),
            help: help.into(),
            label_names,
            rows: Vec::new(),
        }
    }

    /// Appends a row.
    pub fn add_row(&mut self, labels: Vec<String>, value: f64) {
        self.rows.push(MetricRow { labels, value });
    }

    /// Finds the row whose first label (the id column) equals `id`.
    pub fn row(&self, id: &str) -> Option<&MetricRow> {
        self.rows
            .iter()
            .find(|row| row.labels.first().is_some_and(|first| first == id))
    }

    /// Converts this family to Prometheus protobuf families.
    ///
    /// Returns an empty vector for a family without rows; the text encoder
    /// rejects families with no samples.
    pub fn to_prometheus(&self) -> MetricsResult<Vec<proto::MetricFamily>> {
        if self.rows.is_empty() {
            return Ok(Vec::new());
        }

        let label_names: Vec<&str> = self.label_names.iter().map(String::as_str).collect();
        let gauges = GaugeVec::new(Opts::new(&self.name, &self.help), &label_names)?;

        for row in &self.rows {
            let labels: Vec<&str> = row.labels.iter().map(String::as_str).collect();
            gauges.get_metric_with_label_values(&labels)?.set(row.value);
        }

        Ok(gauges.collect())
    }
}

/// Exporter self-monitoring counters.
#[derive(Clone)]
pub struct ExporterCounters {
    /// Failed SNMP collection cycles, across all collectors.
    pub scrape_failures: IntCounter,
    /// Failed HTTPS side-channel fetches.
    pub https_failures: IntCounter,
}

impl ExporterCounters {
    /// Creates the counters and registers them with `registry`.
    ///
    /// # Errors
    ///
    /// Returns an error if a counter with the same name is already
    /// registered.
    pub fn new(registry: &Registry) -> MetricsResult<Self> {
        let scrape_failures = IntCounter::with_opts(
            Opts::new(
                "scrape_failures_total",
                "Number of times scraping the ILO for SNMP variables has failed.",
            )
            .namespace(NAMESPACE)
            .subsystem("exporter"),
        )?;
        registry.register(Box::new(scrape_failures.clone()))?;

        let https_failures = IntCounter::with_opts(
            Opts::new(
                "https_failures_total",
                "Number of times scraping the ILO over HTTPS has failed.",
            )
            .namespace(NAMESPACE)
            .subsystem("exporter"),
        )?;
        registry.register(Box::new(https_failures.clone()))?;

        Ok(Self {
            scrape_failures,
            https_failures,
        })
    }
}
