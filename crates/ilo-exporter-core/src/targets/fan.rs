//! Fault-tolerant fans (`cpqHeFltTolFanTable`).

use crate::collector::{EnumTable, MetricGroup, Oid, ScanMethod, TargetDefinition, ValueGroup};

pub const INDEX: &[u32] = &[1, 3, 6, 1, 4, 1, 232, 6, 2, 6, 7, 1, 2, 0];
pub const LOCALE: &[u32] = &[1, 3, 6, 1, 4, 1, 232, 6, 2, 6, 7, 1, 3, 0];
pub const PRESENT: &[u32] = &[1, 3, 6, 1, 4, 1, 232, 6, 2, 6, 7, 1, 4, 0];
pub const PRESENCE_TEST: &[u32] = &[1, 3, 6, 1, 4, 1, 232, 6, 2, 6, 7, 1, 5, 0];
pub const SPEED: &[u32] = &[1, 3, 6, 1, 4, 1, 232, 6, 2, 6, 7, 1, 6, 0];
pub const CONDITION: &[u32] = &[1, 3, 6, 1, 4, 1, 232, 6, 2, 6, 7, 1, 9, 0];

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
    (14, "management board"),
    (15, "backplane"),
    (16, "network slot"),
    (17, "blade slot"),
    (18, "virtual"),
];

pub const PRESENT_NAMES: EnumTable = &[(1, "other"), (2, "absent"), (3, "present")];

pub const PRESENCE_TEST_NAMES: EnumTable = &[(1, "other"), (2, "tachOutput"), (3, "spinDetect")];

pub const SPEED_NAMES: EnumTable = &[(1, "other"), (2, "normal"), (3, "high")];

pub const CONDITION_NAMES: EnumTable = &[(1, "other"), (2, "normal"), (3, "degraded"), (4, "failed")];

pub fn definition() -> TargetDefinition {
    TargetDefinition {
        target: "fan".to_string(),
        index: Oid::from(INDEX),
        scan: ScanMethod::Simple,
        groups: vec![MetricGroup::new(
            "Information about system fans",
            ValueGroup::dummy(super::INFO),
            vec![
                ValueGroup::enums(LOCALE, "locale", LOCALE_NAMES),
                ValueGroup::enums(CONDITION, "condition", CONDITION_NAMES),
                ValueGroup::enums(SPEED, "speed", SPEED_NAMES),
                ValueGroup::enums(PRESENT, "presence", PRESENT_NAMES),
                ValueGroup::enums(PRESENCE_TEST, "presence_test", PRESENCE_TEST_NAMES),
            ],
        )],
    }
}
