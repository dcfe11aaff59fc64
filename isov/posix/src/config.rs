//! TOML configuration for the host meter
//!
//! ```toml
//! [device]
//! name = "isov"
//! timer_base = 0x3F003000
//! timer_offset = 4
//!
//! [[channel]]          # exactly five entries when present
//! gpio = 2
//! label = "Voltage to freq 1"
//! coefficient = 7692308
//!
//! [simulation]
//! inputs = [5000, 4000, 3000, 2000, 1000]
//! report_interval_ms = 1000
//! ```
//!
//! Every key is optional; missing keys keep the defaults of [`MeterConfig`].

use std::path::Path;
use std::time::Duration;

use isov_core::{ChannelId, MeterConfig, TimerConfig, CHANNEL_COUNT, DEFAULT_COEFFICIENT};
use serde::Deserialize;

use crate::error::{PortError, PortResult};

/// Simulated converter inputs and reporting cadence
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimulationConfig {
    /// Voltage fed to each simulated converter, in calibration units
    pub inputs: [i32; CHANNEL_COUNT],
    /// Delay between two printed snapshots
    pub report_interval: Duration,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            inputs: [5000, 4000, 3000, 2000, 1000],
            report_interval: Duration::from_secs(1),
        }
    }
}

/// Everything the host port needs at startup
#[derive(Debug, Clone, Default)]
pub struct PortConfig {
    pub meter: MeterConfig,
    pub simulation: SimulationConfig,
}

impl PortConfig {
    /// Load and validate a TOML file
    pub fn load(path: impl AsRef<Path>) -> PortResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Parse and validate TOML text
    pub fn from_toml_str(content: &str) -> PortResult<Self> {
        let file: FileConfig = toml::from_str(content)?;
        file.into_port_config()
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct FileConfig {
    device: DeviceSection,
    channel: Vec<ChannelSection>,
    simulation: SimulationSection,
}

#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct DeviceSection {
    name: String,
    timer_base: u32,
    timer_offset: u32,
}

impl Default for DeviceSection {
    fn default() -> Self {
        let timer = TimerConfig::default();
        Self {
            name: "isov".to_string(),
            timer_base: timer.base,
            timer_offset: timer.offset,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ChannelSection {
    gpio: u32,
    label: Option<String>,
    #[serde(default = "default_coefficient")]
    coefficient: i32,
}

fn default_coefficient() -> i32 {
    DEFAULT_COEFFICIENT
}

#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct SimulationSection {
    inputs: Vec<i32>,
    report_interval_ms: u64,
}

impl Default for SimulationSection {
    fn default() -> Self {
        let defaults = SimulationConfig::default();
        Self {
            inputs: defaults.inputs.to_vec(),
            report_interval_ms: defaults.report_interval.as_millis() as u64,
        }
    }
}

impl FileConfig {
    fn into_port_config(self) -> PortResult<PortConfig> {
        let mut builder = MeterConfig::builder()
            .device_name(&self.device.name)
            .timer(self.device.timer_base, self.device.timer_offset);

        if !self.channel.is_empty() {
            if self.channel.len() != CHANNEL_COUNT {
                return Err(PortError::Config(format!(
                    "expected {} [[channel]] entries, found {}",
                    CHANNEL_COUNT,
                    self.channel.len()
                )));
            }
            for (channel, section) in ChannelId::all().zip(&self.channel) {
                let label = match &section.label {
                    Some(label) => label.clone(),
                    None => format!("Voltage to freq {}", channel.number()),
                };
                builder = builder
                    .line(channel, section.gpio, &label)
                    .coefficient(channel, section.coefficient);
            }
        }

        let inputs: [i32; CHANNEL_COUNT] = self.simulation.inputs.as_slice().try_into().map_err(|_| {
            PortError::Config(format!(
                "expected {} simulation inputs, found {}",
                CHANNEL_COUNT,
                self.simulation.inputs.len()
            ))
        })?;
        if self.simulation.report_interval_ms == 0 {
            return Err(PortError::Config("report_interval_ms must be positive".to_string()));
        }

        Ok(PortConfig {
            meter: builder.build()?,
            simulation: SimulationConfig {
                inputs,
                report_interval: Duration::from_millis(self.simulation.report_interval_ms),
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use isov_core::IsovError;

    #[test]
    fn test_empty_file_uses_defaults() {
        let config = PortConfig::from_toml_str("").unwrap();
        assert_eq!(config.meter, MeterConfig::default());
        assert_eq!(config.simulation, SimulationConfig::default());
    }

    #[test]
    fn test_full_file() {
        let text = r#"
            [device]
            name = "isov1"
            timer_base = 0x20003000

            [[channel]]
            gpio = 4
            coefficient = 1000000
            [[channel]]
            gpio = 17
            label = "battery"
            [[channel]]
            gpio = 27
            [[channel]]
            gpio = 23
            [[channel]]
            gpio = 24

            [simulation]
            inputs = [100, 200, 300, 400, 0]
            report_interval_ms = 250
        "#;
        let config = PortConfig::from_toml_str(text).unwrap();

        assert_eq!(config.meter.device_name.as_str(), "isov1");
        assert_eq!(config.meter.timer.counter_address(), 0x2000_3004);
        assert_eq!(config.meter.line(ChannelId::FIRST).gpio, 4);
        assert_eq!(config.meter.line(ChannelId::FIRST).label.as_str(), "Voltage to freq 1");
        assert_eq!(config.meter.line(ChannelId::SECOND).label.as_str(), "battery");
        assert_eq!(config.meter.calibration.coefficient(ChannelId::FIRST), 1_000_000);
        assert_eq!(config.meter.calibration.coefficient(ChannelId::SECOND), DEFAULT_COEFFICIENT);
        assert_eq!(config.simulation.inputs, [100, 200, 300, 400, 0]);
        assert_eq!(config.simulation.report_interval, Duration::from_millis(250));
    }

    #[test]
    fn test_rejects_partial_channel_list() {
        let text = "[[channel]]\ngpio = 4\n";
        assert!(matches!(PortConfig::from_toml_str(text), Err(PortError::Config(_))));
    }

    #[test]
    fn test_rejects_invalid_meter_values() {
        let text = "[device]\nname = \"\"\n";
        assert!(matches!(
            PortConfig::from_toml_str(text),
            Err(PortError::Meter(IsovError::InvalidConfig))
        ));
    }

    #[test]
    fn test_rejects_unknown_keys() {
        assert!(matches!(
            PortConfig::from_toml_str("[device]\nspeed = 3\n"),
            Err(PortError::Parse(_))
        ));
    }
}
