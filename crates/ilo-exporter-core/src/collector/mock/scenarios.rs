//! Pre-built mock agent scenarios for testing.
//!
//! These scenarios provide realistic iLO MIB contents for the hardware
//! classes the exporter knows about.

use super::transport::MockTransport;
use crate::collector::oid::Oid;
use crate::collector::value::RawValue;
use crate::targets::{cpu, drive, fan, memory, power, temperature};

#[allow(dead_code)]
impl MockTransport {
    /// Creates an agent for a typical two-socket server.
    ///
    /// Includes: 4 fans, 3 temperature sensors, 2 CPUs, 2 drives on
    /// controller 0, 2 memory modules and a power meter drawing 212 W.
    pub fn typical_server() -> Self {
        let agent = Self::new();

        // Fans
        for id in 1..=4u32 {
            agent.insert_int(fan::INDEX, &[id], i64::from(id));
            agent.insert_int(fan::LOCALE, &[id], 3);
            agent.insert_int(fan::PRESENT, &[id], 3);
            agent.insert_int(fan::PRESENCE_TEST, &[id], 2);
            agent.insert_int(fan::SPEED, &[id], 2);
            agent.insert_int(fan::CONDITION, &[id], 2);
        }

        // Temperature sensors: (id, locale, celsius, threshold)
        for (id, locale, celsius, threshold) in [(1, 11, 21, 42), (2, 6, 40, 70), (3, 7, 33, 87)] {
            agent.insert_int(temperature::INDEX, &[id], i64::from(id));
            agent.insert_int(temperature::LOCALE, &[id], locale);
            agent.insert_int(temperature::CELSIUS, &[id], celsius);
            agent.insert_int(temperature::THRESHOLD, &[id], threshold);
            agent.insert_int(temperature::CONDITION, &[id], 2);
            agent.insert_int(temperature::THRESHOLD_TYPE, &[id], 9);
        }

        // CPUs
        for id in 1..=2u32 {
            agent.insert_int(cpu::INDEX, &[id], i64::from(id));
            agent.insert_str(
                cpu::NAME,
                &[id],
                " Intel(R) Xeon(R) CPU E5-2680 v4 @ 2.40GHz ",
            );
            agent.insert_int(cpu::SPEED, &[id], 2400);
            agent.insert_int(cpu::STEP, &[id], 1);
            agent.insert_int(cpu::STATUS, &[id], 2);
            agent.insert_int(cpu::CORES_ENABLED, &[id], 14);
            agent.insert_int(cpu::THREADS_AVAILABLE, &[id], 28);
            agent.insert_int(cpu::POWER_STATUS, &[id], 3);
        }

        // Drives, indexed by <controller>.<drive>
        for bay in 1..=2u32 {
            let id = [0, bay];
            agent.insert_int(drive::INDEX, &id, i64::from(bay));
            agent.insert_str(drive::PORT, &id, "1I");
            agent.insert_int(drive::BOX, &id, 1);
            agent.insert_int(drive::BAY, &id, i64::from(bay));
            agent.insert_str(drive::VENDOR, &id, "ATA     MK000480GWXFF");
            agent.insert_str(drive::SERIAL, &id, &format!("S4NENA0N10{:04}", bay));
            agent.insert_str(drive::FIRMWARE, &id, "HPG3");
            agent.insert_str(drive::LOCATION, &id, &format!("Port 1I Box 1 Bay {}", bay));
            agent.insert_int(drive::LINK_RATE, &id, 4);
            agent.insert_int(drive::PREDICTIVE_FAILURE, &id, 3);
            agent.insert_int(drive::SMART_STATUS, &id, 2);
            agent.insert_int(drive::MEDIA_TYPE, &id, 3);
            agent.insert_int(drive::ROTATIONAL_SPEED, &id, 5);
            agent.insert_int(drive::STATUS, &id, 2);
            agent.insert_int(drive::CONDITION, &id, 2);
            agent.insert_int(drive::SIZE, &id, 457_862);
            agent.insert_int(drive::TEMPERATURE, &id, 29);
            agent.insert_int(drive::TEMPERATURE_THRESHOLD, &id, 70);
            agent.insert_int(drive::TEMPERATURE_MAXIMUM, &id, 41);
            agent.insert_int(drive::REFERENCE_TIME, &id, 26_304);
        }

        // Memory modules
        for id in 1..=2u32 {
            agent.insert_int(memory::INDEX, &[id], i64::from(id));
            agent.insert_str(memory::LOCATION, &[id], &format!("PROC 1 DIMM {}", id));
            agent.insert_str(memory::MANUFACTURER, &[id], "HP     ");
            agent.insert_str(memory::PART_NUMBER, &[id], "809082-091");
            agent.insert_int(memory::SIZE, &[id], 16_777_216);
            agent.insert_int(memory::STATUS, &[id], 4);
            agent.insert_int(memory::CONDITION, &[id], 2);
        }

        // Power meter
        agent.insert(Oid::from(power::READING), RawValue::Integer(212));
        agent.insert(Oid::from(power::SUPPORT), RawValue::Integer(2));
        agent.insert(Oid::from(power::STATUS), RawValue::Integer(2));

        agent
    }

    /// Creates an agent whose iLO exposes no hardware tables at all.
    pub fn empty_server() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collector::oid::InstanceId;
    use crate::collector::scan::{detect_complex, detect_things};

    #[test]
    fn test_typical_server_tables() {
        let agent = MockTransport::typical_server();

        assert_eq!(detect_things(&agent, &Oid::from(fan::INDEX)).unwrap().len(), 4);
        assert_eq!(
            detect_things(&agent, &Oid::from(temperature::INDEX))
                .unwrap()
                .len(),
            3
        );
        assert_eq!(detect_things(&agent, &Oid::from(cpu::INDEX)).unwrap().len(), 2);
        assert_eq!(detect_things(&agent, &Oid::from(memory::INDEX)).unwrap().len(), 2);
        assert_eq!(
            detect_complex(&agent, &Oid::from(drive::INDEX)).unwrap(),
            vec![InstanceId::Tuple(vec![0, 1]), InstanceId::Tuple(vec![0, 2])]
        );
    }

    #[test]
    fn test_empty_server() {
        let agent = MockTransport::empty_server();
        assert!(detect_things(&agent, &Oid::from(fan::INDEX)).unwrap().is_empty());
    }
}
