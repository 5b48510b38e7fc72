//! Processors (`cpqSeCpuTable`).

use crate::collector::{EnumTable, MetricGroup, Oid, ScanMethod, TargetDefinition, ValueGroup};

pub const INDEX: &[u32] = &[1, 3, 6, 1, 4, 1, 232, 1, 2, 2, 1, 1, 1];
pub const NAME: &[u32] = &[1, 3, 6, 1, 4, 1, 232, 1, 2, 2, 1, 1, 3];
pub const SPEED: &[u32] = &[1, 3, 6, 1, 4, 1, 232, 1, 2, 2, 1, 1, 4];
pub const STEP: &[u32] = &[1, 3, 6, 1, 4, 1, 232, 1, 2, 2, 1, 1, 5];
pub const STATUS: &[u32] = &[1, 3, 6, 1, 4, 1, 232, 1, 2, 2, 1, 1, 6];
pub const CORES_ENABLED: &[u32] = &[1, 3, 6, 1, 4, 1, 232, 1, 2, 2, 1, 1, 15];
pub const THREADS_AVAILABLE: &[u32] = &[1, 3, 6, 1, 4, 1, 232, 1, 2, 2, 1, 1, 25];
pub const POWER_STATUS: &[u32] = &[1, 3, 6, 1, 4, 1, 232, 1, 2, 2, 1, 1, 26];

pub const STATUS_NAMES: EnumTable = &[
    (1, "unknown"),
    (2, "ok"),
    (3, "degraded"),
    (4, "failed"),
    (5, "disabled"),
];

pub const POWER_STATUS_NAMES: EnumTable = &[
    (1, "unknown"),
    (2, "Low Powered"),
    (3, "Normal Powered"),
    (4, "High Powered"),
];

pub fn definition() -> TargetDefinition {
    TargetDefinition {
        target: "cpu".to_string(),
        index: Oid::from(INDEX),
        scan: ScanMethod::Simple,
        groups: vec![
            MetricGroup::new(
                "Information about CPUs",
                ValueGroup::dummy(super::INFO),
                vec![
                    ValueGroup::strings(NAME, "name"),
                    ValueGroup::enums(STATUS, "status", STATUS_NAMES),
                    ValueGroup::enums(POWER_STATUS, "power_status", POWER_STATUS_NAMES),
                ],
            ),
            MetricGroup::new(
                "Speed of CPUs in megahertz",
                ValueGroup::numbers(SPEED, "speed"),
                vec![],
            ),
            // stepping (revision) of the part
            MetricGroup::new("CPU step", ValueGroup::numbers(STEP, "step"), vec![]),
            MetricGroup::new(
                "Number of enabled cores",
                ValueGroup::numbers(CORES_ENABLED, "cores_enabled"),
                vec![],
            ),
            MetricGroup::new(
                "Number of available threads",
                ValueGroup::numbers(THREADS_AVAILABLE, "threads_available"),
                vec![],
            ),
        ],
    }
}
