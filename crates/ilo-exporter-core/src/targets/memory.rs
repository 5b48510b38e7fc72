//! Memory modules (`cpqHeResMem2ModuleTable`).

use crate::collector::{EnumTable, MetricGroup, Oid, ScanMethod, TargetDefinition, ValueGroup};

pub const INDEX: &[u32] = &[1, 3, 6, 1, 4, 1, 232, 6, 2, 14, 13, 1, 1];
pub const SIZE: &[u32] = &[1, 3, 6, 1, 4, 1, 232, 6, 2, 14, 13, 1, 6];
pub const MANUFACTURER: &[u32] = &[1, 3, 6, 1, 4, 1, 232, 6, 2, 14, 13, 1, 9];
pub const PART_NUMBER: &[u32] = &[1, 3, 6, 1, 4, 1, 232, 6, 2, 14, 13, 1, 10];
pub const LOCATION: &[u32] = &[1, 3, 6, 1, 4, 1, 232, 6, 2, 14, 13, 1, 13];
pub const STATUS: &[u32] = &[1, 3, 6, 1, 4, 1, 232, 6, 2, 14, 13, 1, 19];
pub const CONDITION: &[u32] = &[1, 3, 6, 1, 4, 1, 232, 6, 2, 14, 13, 1, 20];

pub const STATUS_NAMES: EnumTable = &[
    (1, "other"),
    (2, "notPresent"),
    (3, "present"),
    (4, "good"),
    (5, "add"),
    (6, "upgrade"),
    (7, "missing"),
    (8, "doesNotMatch"),
    (9, "notSupported"),
    (10, "badConfig"),
    (11, "degraded"),
    (12, "spare"),
    (13, "partial"),
];

pub const CONDITION_NAMES: EnumTable = &[
    (1, "other"),
    (2, "ok"),
    (3, "degraded"),
    (4, "degradedModuleIndexUnknown"),
];

pub fn definition() -> TargetDefinition {
    TargetDefinition {
        target: "memory".to_string(),
        index: Oid::from(INDEX),
        scan: ScanMethod::Simple,
        groups: vec![
            MetricGroup::new(
                "Information about system memory",
                ValueGroup::dummy(super::INFO),
                vec![
                    ValueGroup::strings(LOCATION, "location"),
                    ValueGroup::strings(MANUFACTURER, "manufacturer"),
                    ValueGroup::strings(PART_NUMBER, "part_number"),
                    ValueGroup::enums(STATUS, "status", STATUS_NAMES),
                    ValueGroup::enums(CONDITION, "condition", CONDITION_NAMES),
                ],
            ),
            MetricGroup::new(
                "Sizes of system memory modules in kilobytes",
                ValueGroup::numbers(SIZE, "size"),
                vec![],
            ),
        ],
    }
}
