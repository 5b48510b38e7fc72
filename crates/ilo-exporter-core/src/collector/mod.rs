//! SNMP collection engine for iLO hardware metrics.
//!
//! This module discovers hardware instances through an SNMP agent, resolves
//! their attributes in bounded batches and turns them into metric families,
//! with support for mocking the agent in tests.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                       BulkCollector                         │
//! │  ┌─────────────────────┐   ┌─────────────────────────────┐  │
//! │  │  Scan               │   │     Value groups            │  │
//! │  │  - simple / complex │   │  - numeric / text / enum    │  │
//! │  │  - scan hooks       │   │  - constant / external      │  │
//! │  └──────────┬──────────┘   └──────────────┬──────────────┘  │
//! │             └──────────────┬──────────────┘                 │
//! │                     ┌──────▼──────┐                         │
//! │                     │    Batch    │ (≤ 64 per request)      │
//! │                     └──────┬──────┘                         │
//! │                     ┌──────▼──────┐                         │
//! │                     │  Transport  │ (trait)                 │
//! │                     └──────┬──────┘                         │
//! └────────────────────────────┼────────────────────────────────┘
//!              ┌───────────────┼───────────────┐
//!       ┌──────▼──────┐ ┌──────▼──────┐ ┌──────▼──────┐
//!       │SnmpTransport│ │MockTransport│ │  Scenarios  │
//!       │ (UDP, v2c)  │ │ (Testing)   │ │ (Fixtures)  │
//!       └─────────────┘ └─────────────┘ └─────────────┘
//! ```
//!
//! # Usage
//!
//! ## Production
//!
//! ```ignore
//! use ilo_exporter_core::collector::{BulkCollector, ScanPolicy, SnmpConfig};
//! use ilo_exporter_core::targets;
//!
//! let transport = SnmpConfig::new("10.0.0.5", "public").connect()?;
//! let mut collector = BulkCollector::new(
//!     transport,
//!     targets::fan::definition(),
//!     ScanPolicy::EveryCycle,
//!     failures,
//! );
//! let families = collector.collect()?;
//! ```
//!
//! ## Testing (with MockTransport)
//!
//! ```
//! use ilo_exporter_core::collector::{BulkCollector, MockTransport, ScanPolicy};
//! use ilo_exporter_core::targets;
//!
//! let agent = MockTransport::typical_server();
//! let failures = prometheus::IntCounter::new("failures_total", "failures").unwrap();
//! let mut collector =
//!     BulkCollector::new(agent, targets::fan::definition(), ScanPolicy::Once, failures);
//! let families = collector.collect().unwrap();
//! assert_eq!(families[0].rows.len(), 4);
//! ```

mod batch;
mod bulk;
mod error;
mod groups;
pub mod mock;
mod oid;
mod power;
mod scan;
mod session;
pub mod traits;
mod value;
mod wire;

pub use batch::{MAX_CHUNK, get_all};
pub use bulk::{
    BulkCollector, CollectorState, MetricGroup, ScanHook, ScanMethod, ScanPolicy, TargetDefinition,
};
pub use error::{CollectError, ScanError, TransportError};
pub use groups::{
    EnumTable, EnumValue, ExternalTable, GroupKind, GroupValue, NUMERIC_SENTINEL, ValueGroup,
    ValueMap,
};
pub use mock::MockTransport;
pub use oid::{InstanceId, Oid, ParseOidError};
pub use power::PowerCollector;
pub use scan::{detect_complex, detect_things};
pub use session::{SnmpConfig, SnmpTransport};
pub use traits::Transport;
pub use value::{DecodedValue, RawValue, decode};
