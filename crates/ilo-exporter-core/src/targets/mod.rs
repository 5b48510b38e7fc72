//! Address tables and collector definitions for each iLO hardware class.
//!
//! Columns come from the HP/HPE CPQ MIBs (`CPQHLTH-MIB`, `CPQSTDEQ-MIB`,
//! `CPQIDA-MIB`). Instance ids are appended to each column OID.

pub mod cpu;
pub mod drive;
pub mod fan;
pub mod memory;
pub mod power;
pub mod temperature;

use crate::collector::{ScanPolicy, TargetDefinition};

/// Shared name of the placeholder value group of "info" metrics.
pub const INFO: &str = "info";

/// Re-scan policies for the bulk collectors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanPolicies {
    /// Temperature, fan, CPU and memory collectors.
    pub default: ScanPolicy,
    /// Drive collector; drives are hot-swappable.
    pub drives: ScanPolicy,
}

impl ScanPolicies {
    /// Derives the policies from the `--scan-once` / `--scan-drives-once`
    /// flags. Drives keep re-scanning unless both are set.
    pub fn from_flags(scan_once: bool, scan_drives_once: bool) -> Self {
        Self {
            default: ScanPolicy::from_scan_once(scan_once),
            drives: ScanPolicy::from_scan_once(scan_once && scan_drives_once),
        }
    }
}

/// Definitions of all SNMP bulk collectors, in registration order.
pub fn all() -> Vec<TargetDefinition> {
    vec![
        temperature::definition(),
        fan::definition(),
        cpu::definition(),
        drive::definition(),
        memory::definition(),
    ]
}
