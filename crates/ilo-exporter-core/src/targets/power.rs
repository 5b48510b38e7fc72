//! Server power meter (`cpqHePowerMeter` scalars).

use crate::collector::EnumTable;

pub const SUPPORT: &[u32] = &[1, 3, 6, 1, 4, 1, 232, 6, 2, 15, 1, 0];
pub const STATUS: &[u32] = &[1, 3, 6, 1, 4, 1, 232, 6, 2, 15, 2, 0];
pub const READING: &[u32] = &[1, 3, 6, 1, 4, 1, 232, 6, 2, 15, 3, 0];

pub const SUPPORT_NAMES: EnumTable = &[(1, "other"), (2, "supported"), (3, "notSupported")];

pub const STATUS_NAMES: EnumTable = &[(1, "other"), (2, "present"), (3, "absent")];
