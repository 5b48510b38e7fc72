//! JSON payloads of the iLO health endpoints.

use std::collections::BTreeMap;

use serde::Deserialize;

/// `json/health_temperature` response body.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct TemperatureResponse {
    #[serde(default)]
    temperature: Vec<TemperatureSensor>,
}

impl TemperatureResponse {
    /// Keys sensors by 1-based position, matching SNMP sensor ids.
    pub(crate) fn into_sensors(self) -> BTreeMap<u32, TemperatureSensor> {
        (1..).zip(self.temperature).collect()
    }
}

/// One entry of the temperature sensor list.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct TemperatureSensor {
    /// Human readable name, e.g. `01-Inlet Ambient`.
    pub label: Option<String>,
    /// Column on the iLO system board diagram.
    pub xposition: Option<i64>,
    /// Row on the iLO system board diagram.
    pub yposition: Option<i64>,
    /// Caution threshold in celsius.
    pub caution: Option<i64>,
    /// Critical threshold in celsius.
    pub critical: Option<i64>,
}

/// `json/health_fans` response body.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct FansResponse {
    #[serde(default)]
    fans: Vec<FanEntry>,
}

#[derive(Debug, Deserialize)]
struct FanEntry {
    speed: Option<f64>,
    speed_unit: Option<String>,
}

impl FansResponse {
    /// Keys fans by 1-based position. Fans reporting no speed are skipped.
    pub(crate) fn into_speeds(self) -> BTreeMap<u32, FanSpeed> {
        (1..)
            .zip(self.fans)
            .filter_map(|(id, fan)| {
                let speed = fan.speed?;
                Some((
                    id,
                    FanSpeed {
                        speed,
                        units: fan.speed_unit.unwrap_or_else(|| "unknown".to_string()),
                    },
                ))
            })
            .collect()
    }
}

/// Speed of one fan.
#[derive(Debug, Clone, PartialEq)]
pub struct FanSpeed {
    pub speed: f64,
    /// Unit as reported, usually `Percentage`.
    pub units: String,
}
