//! Temperature sensors (`cpqHeTemperatureTable`).

use crate::collector::{EnumTable, MetricGroup, Oid, ScanMethod, TargetDefinition, ValueGroup};

pub const INDEX: &[u32] = &[1, 3, 6, 1, 4, 1, 232, 6, 2, 6, 8, 1, 2, 0];
pub const LOCALE: &[u32] = &[1, 3, 6, 1, 4, 1, 232, 6, 2, 6, 8, 1, 3, 0];
pub const CELSIUS: &[u32] = &[1, 3, 6, 1, 4, 1, 232, 6, 2, 6, 8, 1, 4, 0];
pub const THRESHOLD: &[u32] = &[1, 3, 6, 1, 4, 1, 232, 6, 2, 6, 8, 1, 5, 0];
pub const CONDITION: &[u32] = &[1, 3, 6, 1, 4, 1, 232, 6, 2, 6, 8, 1, 6, 0];
pub const THRESHOLD_TYPE: &[u32] = &[1, 3, 6, 1, 4, 1, 232, 6, 2, 6, 8, 1, 7, 0];

pub const LOCALE_NAMES: EnumTable = &[
    (1, "other"),
    (2, "unknown"),
    (3, "system"),
    (4, "systemBoard"),
    (5, "ioBoard"),
    (6, "cpu"),
    (7, "memory"),
    (8, "storage"),
    (9, "removable media"),
    (10, "power supply"),
    (11, "ambent"),
    (12, "chassis"),
    (13, "bridge card"),
];

pub const THRESHOLD_TYPE_NAMES: EnumTable = &[
    (1, "other"),
    (5, "blowout"),
    (9, "caution"),
    (15, "critical"),
    (16, "noreaction"),
];

pub const CONDITION_NAMES: EnumTable = &[(1, "other"), (2, "normal"), (3, "high")];

pub fn definition() -> TargetDefinition {
    TargetDefinition {
        target: "temperature".to_string(),
        index: Oid::from(INDEX),
        scan: ScanMethod::Simple,
        groups: vec![
            MetricGroup::new(
                "Information temperature sensors",
                ValueGroup::dummy(super::INFO),
                vec![
                    ValueGroup::enums(LOCALE, "sensor_locale", LOCALE_NAMES),
                    ValueGroup::enums(CONDITION, "condition", CONDITION_NAMES),
                    ValueGroup::enums(THRESHOLD_TYPE, "threshold_type", THRESHOLD_TYPE_NAMES),
                ],
            ),
            MetricGroup::new(
                "Temperatures readings of each temperature sensor in celsius",
                ValueGroup::numbers(CELSIUS, "celsius"),
                vec![],
            ),
            MetricGroup::new(
                "Temperature thresholds for each temperature sensor in celsius",
                ValueGroup::numbers(THRESHOLD, "threshold"),
                vec![],
            ),
        ],
    }
}
