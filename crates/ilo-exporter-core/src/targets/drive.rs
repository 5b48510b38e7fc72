//! Physical drives (`cpqDaPhyDrvTable`).
//!
//! The table index is `<controller>.<drive>`, so ids are taken from the
//! walked address rather than from the index column values.

use crate::collector::{EnumTable, MetricGroup, Oid, ScanMethod, TargetDefinition, ValueGroup};

pub const INDEX: &[u32] = &[1, 3, 6, 1, 4, 1, 232, 3, 2, 5, 1, 1, 2];
pub const VENDOR: &[u32] = &[1, 3, 6, 1, 4, 1, 232, 3, 2, 5, 1, 1, 3];
pub const FIRMWARE: &[u32] = &[1, 3, 6, 1, 4, 1, 232, 3, 2, 5, 1, 1, 4];
pub const BAY: &[u32] = &[1, 3, 6, 1, 4, 1, 232, 3, 2, 5, 1, 1, 5];
pub const STATUS: &[u32] = &[1, 3, 6, 1, 4, 1, 232, 3, 2, 5, 1, 1, 6];
pub const REFERENCE_TIME: &[u32] = &[1, 3, 6, 1, 4, 1, 232, 3, 2, 5, 1, 1, 9];
pub const CONDITION: &[u32] = &[1, 3, 6, 1, 4, 1, 232, 3, 2, 5, 1, 1, 37];
pub const SIZE: &[u32] = &[1, 3, 6, 1, 4, 1, 232, 3, 2, 5, 1, 1, 45];
pub const SERIAL: &[u32] = &[1, 3, 6, 1, 4, 1, 232, 3, 2, 5, 1, 1, 51];
pub const PREDICTIVE_FAILURE: &[u32] = &[1, 3, 6, 1, 4, 1, 232, 3, 2, 5, 1, 1, 52];
pub const SMART_STATUS: &[u32] = &[1, 3, 6, 1, 4, 1, 232, 3, 2, 5, 1, 1, 57];
pub const ROTATIONAL_SPEED: &[u32] = &[1, 3, 6, 1, 4, 1, 232, 3, 2, 5, 1, 1, 59];
pub const PORT: &[u32] = &[1, 3, 6, 1, 4, 1, 232, 3, 2, 5, 1, 1, 62];
pub const BOX: &[u32] = &[1, 3, 6, 1, 4, 1, 232, 3, 2, 5, 1, 1, 63];
pub const LOCATION: &[u32] = &[1, 3, 6, 1, 4, 1, 232, 3, 2, 5, 1, 1, 64];
pub const LINK_RATE: &[u32] = &[1, 3, 6, 1, 4, 1, 232, 3, 2, 5, 1, 1, 65];
pub const MEDIA_TYPE: &[u32] = &[1, 3, 6, 1, 4, 1, 232, 3, 2, 5, 1, 1, 69];
pub const TEMPERATURE: &[u32] = &[1, 3, 6, 1, 4, 1, 232, 3, 2, 5, 1, 1, 70];
pub const TEMPERATURE_THRESHOLD: &[u32] = &[1, 3, 6, 1, 4, 1, 232, 3, 2, 5, 1, 1, 71];
pub const TEMPERATURE_MAXIMUM: &[u32] = &[1, 3, 6, 1, 4, 1, 232, 3, 2, 5, 1, 1, 72];

pub const LINK_RATE_NAMES: EnumTable = &[
    (1, "other"),
    (2, "1.5Gbps"),
    (3, "3.0Gbps"),
    (4, "6.0Gbps"),
    (5, "12.0Gbps"),
];

pub const STATUS_NAMES: EnumTable = &[
    (1, "Other"),
    (2, "Ok"),
    (3, "Failed"),
    (4, "Predictive Failure"),
    (5, "Erasing"),
    (6, "Erase Done"),
    (7, "Erase Queued"),
    (8, "SSD Wear Out"),
    (9, "Not Authenticated"),
];

pub const CONDITION_NAMES: EnumTable = &[(1, "other"), (2, "ok"), (3, "degraded"), (4, "failed")];

pub const PREDICTIVE_FAILURE_NAMES: EnumTable =
    &[(1, "other"), (2, "notAvailable"), (3, "available")];

pub const SMART_STATUS_NAMES: EnumTable = &[(1, "other"), (2, "ok"), (3, "replaceDrive")];

pub const ROTATIONAL_SPEED_NAMES: EnumTable = &[
    (1, "other"),
    (2, "7200 rpm"),
    (3, "10k rpm"),
    (4, "15k rpm"),
    (5, "ssd"),
];

pub const MEDIA_TYPE_NAMES: EnumTable =
    &[(1, "other"), (2, "rotatingPlatters"), (3, "solidState")];

pub fn definition() -> TargetDefinition {
    TargetDefinition {
        target: "drive".to_string(),
        index: Oid::from(INDEX),
        scan: ScanMethod::Complex,
        groups: vec![
            MetricGroup::new(
                "Information about installed drives",
                ValueGroup::dummy(super::INFO),
                vec![
                    ValueGroup::strings(PORT, "port"),
                    ValueGroup::numbers(BOX, "box"),
                    ValueGroup::numbers(BAY, "bay"),
                    ValueGroup::strings(VENDOR, "vendor"),
                    ValueGroup::strings(SERIAL, "serial"),
                    ValueGroup::strings(FIRMWARE, "firmware"),
                    ValueGroup::strings(LOCATION, "location"),
                    ValueGroup::enums(LINK_RATE, "link_rate", LINK_RATE_NAMES),
                    ValueGroup::enums(
                        PREDICTIVE_FAILURE,
                        "predictive_failure",
                        PREDICTIVE_FAILURE_NAMES,
                    ),
                    ValueGroup::enums(SMART_STATUS, "smart_status", SMART_STATUS_NAMES),
                    ValueGroup::enums(MEDIA_TYPE, "media_type", MEDIA_TYPE_NAMES),
                    ValueGroup::enums(ROTATIONAL_SPEED, "rotational_speed", ROTATIONAL_SPEED_NAMES),
                    ValueGroup::enums(STATUS, "status", STATUS_NAMES),
                    ValueGroup::enums(CONDITION, "condition", CONDITION_NAMES),
                ],
            ),
            MetricGroup::new(
                "Sizes of installed drives in megabytes",
                ValueGroup::numbers(SIZE, "size"),
                vec![],
            ),
            MetricGroup::new(
                "Temperatures of installed drives in celsius",
                ValueGroup::numbers(TEMPERATURE, "temperature"),
                vec![],
            ),
            MetricGroup::new(
                "Temperature thresholds of installed drives in celsius",
                ValueGroup::numbers(TEMPERATURE_THRESHOLD, "temperature_threshold"),
                vec![],
            ),
            MetricGroup::new(
                "Maximum temperatures of installed drives in celsius",
                ValueGroup::numbers(TEMPERATURE_MAXIMUM, "temperature_maximum"),
                vec![],
            ),
            MetricGroup::new(
                "Reference time of installed drives in hours",
                ValueGroup::numbers(REFERENCE_TIME, "reference_time"),
                vec![],
            ),
        ],
    }
}
