//! Simulated dongle configuration.

use serde::Deserialize;

/// One simulated sensor.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SimulatedSensor {
    /// 8-character identifier the dongle reports.
    pub mac: String,
    /// Raw sensor type code (`0x01` door, `0x02` / `0x0F` motion).
    #[serde(default = "default_sensor_type")]
    pub sensor_type: u8,
    #[serde(default = "default_battery")]
    pub battery: u8,
    /// Raw signal strength, positive as the dongle reports it.
    #[serde(default = "default_signal")]
    pub signal: i32,
}

fn default_sensor_type() -> u8 {
    0x01
}

fn default_battery() -> u8 {
    100
}

fn default_signal() -> i32 {
    50
}

/// Configuration for the built-in simulated dongle.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SimulatedConfig {
    /// Sensors already paired with the dongle; they report periodically.
    pub sensors: Vec<SimulatedSensor>,
    /// Sensors waiting in pairing mode, handed out one per scan.
    pub pairable: Vec<SimulatedSensor>,
    /// Interval between state reports of each sensor, in seconds.
    pub report_interval_secs: u16,
    /// How long a scan takes before returning, in seconds.
    pub scan_delay_secs: u16,
}

impl Default for SimulatedConfig {
    fn default() -> Self {
        Self {
            sensors: Vec::new(),
            pairable: Vec::new(),
            report_interval_secs: 30,
            scan_delay_secs: 5,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_use_defaults_when_empty() {
        let config: SimulatedConfig = toml::from_str("").unwrap();
        assert!(config.sensors.is_empty());
        assert_eq!(config.report_interval_secs, 30);
        assert_eq!(config.scan_delay_secs, 5);
    }

    #[test]
    fn should_parse_sensors_with_defaults() {
        let config: SimulatedConfig = toml::from_str(
            r#"
            scan_delay_secs = 1

            [[sensors]]
            mac = "AABBCCDD"
            sensor_type = 2

            [[pairable]]
            mac = "11223344"
            battery = 80
            "#,
        )
        .unwrap();

        assert_eq!(config.scan_delay_secs, 1);
        assert_eq!(
            config.sensors,
            vec![SimulatedSensor {
                mac: "AABBCCDD".to_string(),
                sensor_type: 2,
                battery: 100,
                signal: 50,
            }]
        );
        assert_eq!(config.pairable[0].sensor_type, 0x01);
        assert_eq!(config.pairable[0].battery, 80);
    }
}
