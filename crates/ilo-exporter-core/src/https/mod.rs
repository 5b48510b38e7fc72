//! HTTPS side channel to the iLO web interface.
//!
//! Some details are not exposed over SNMP (sensor names, fan speed in
//! percent). They are read from the iLO JSON endpoints with basic auth.

mod client;
mod fans;
mod models;
mod temperature;

pub use client::{HttpsClient, HttpsConfig, HttpsError, SideChannel, TlsVerify};
pub use fans::FanSpeedCollector;
pub use models::{FanSpeed, TemperatureSensor};
pub use temperature::{TemperatureScan, TemperatureTables};
