//! ilo-exporter-core - iLO hardware metrics over SNMP.
//!
//! Provides:
//! - `collector` - SNMP transport, instance scans, value groups, collectors
//! - `targets` - address tables and collector definitions per hardware class
//! - `metrics` - metric families and Prometheus rendering
//! - `exporter` - scrape entry point over all registered collectors
//!
//! With `https` feature (default):
//! - `https` - iLO web interface side channel (sensor labels, fan speed)

pub mod collector;
pub mod exporter;
pub mod metrics;
pub mod targets;

#[cfg(feature = "https")]
pub mod https;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
