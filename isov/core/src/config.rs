//! Startup configuration
//!
//! Everything here is read once at startup. The defaults describe the
//! reference shield: five converters on GPIO 2, 22, 10, 5 and 26 and the
//! BCM2837 system timer as the 1 MHz tick source.

use heapless::String;

use crate::calibration::{CalibrationTable, DEFAULT_COEFFICIENT};
use crate::channel::{ChannelId, CHANNEL_COUNT};
use crate::{IsovError, IsovResult};

/// Maximum length of the device name
pub const NAME_CAPACITY: usize = 16;

/// Maximum length of a line label
pub const LABEL_CAPACITY: usize = 32;

const DEFAULT_LINES: [u32; CHANNEL_COUNT] = [2, 22, 10, 5, 26];

/// Input line wired to one channel
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineConfig {
    /// GPIO number of the converter output
    pub gpio: u32,
    /// Consumer label used when requesting the line
    pub label: String<LABEL_CAPACITY>,
}

impl LineConfig {
    /// Create a line description; fails if `label` is too long
    pub fn new(gpio: u32, label: &str) -> IsovResult<Self> {
        let mut text: String<LABEL_CAPACITY> = String::new();
        text.push_str(label).map_err(|_| IsovError::InvalidConfig)?;
        Ok(Self { gpio, label: text })
    }

    fn default_for(channel: ChannelId) -> Self {
        let mut label: String<LABEL_CAPACITY> = String::new();
        // "Voltage to freq N" always fits LABEL_CAPACITY
        let _ = core::fmt::write(&mut label, format_args!("Voltage to freq {}", channel.number()));
        Self {
            gpio: DEFAULT_LINES[channel.index()],
            label,
        }
    }
}

/// Location of the memory-mapped free-running counter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerConfig {
    /// Physical base address of the timer page
    pub base: u32,
    /// Offset of the low 32-bit counter register inside the page
    pub offset: u32,
}

impl TimerConfig {
    /// Physical address of the counter register
    pub const fn counter_address(&self) -> u32 {
        self.base.wrapping_add(self.offset)
    }
}

impl Default for TimerConfig {
    fn default() -> Self {
        Self {
            base: 0x3F00_3000,
            offset: 4,
        }
    }
}

/// Complete startup configuration of the meter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MeterConfig {
    /// Name the read device is published under
    pub device_name: String<NAME_CAPACITY>,
    /// Line of every channel, in channel order
    pub lines: [LineConfig; CHANNEL_COUNT],
    /// Coefficients of every channel
    pub calibration: CalibrationTable,
    /// Tick source location
    pub timer: TimerConfig,
}

impl Default for MeterConfig {
    fn default() -> Self {
        let mut device_name: String<NAME_CAPACITY> = String::new();
        let _ = device_name.push_str("isov");
        Self {
            device_name,
            lines: [
                LineConfig::default_for(ChannelId::FIRST),
                LineConfig::default_for(ChannelId::SECOND),
                LineConfig::default_for(ChannelId::THIRD),
                LineConfig::default_for(ChannelId::FOURTH),
                LineConfig::default_for(ChannelId::FIFTH),
            ],
            calibration: CalibrationTable::default(),
            timer: TimerConfig::default(),
        }
    }
}

impl MeterConfig {
    /// Creates a new configuration builder.
    pub fn builder() -> MeterConfigBuilder {
        MeterConfigBuilder::default()
    }

    /// Line wired to `channel`
    pub fn line(&self, channel: ChannelId) -> &LineConfig {
        &self.lines[channel.index()]
    }

    /// Check coefficients are positive and every channel has its own line
    pub fn validate(&self) -> IsovResult<()> {
        if self.device_name.is_empty() {
            return Err(IsovError::InvalidConfig);
        }
        if self.calibration.coefficients().iter().any(|&c| c <= 0) {
            return Err(IsovError::InvalidConfig);
        }
        for (index, line) in self.lines.iter().enumerate() {
            if self.lines[index + 1..].iter().any(|other| other.gpio == line.gpio) {
                return Err(IsovError::InvalidConfig);
            }
        }
        Ok(())
    }
}

/// Builder for [`MeterConfig`].
///
/// Setters never fail; the first problem is remembered and reported by
/// [`MeterConfigBuilder::build`].
#[derive(Debug, Clone)]
pub struct MeterConfigBuilder {
    config: MeterConfig,
    coefficients: [i32; CHANNEL_COUNT],
    error: Option<IsovError>,
}

impl Default for MeterConfigBuilder {
    fn default() -> Self {
        Self {
            config: MeterConfig::default(),
            coefficients: [DEFAULT_COEFFICIENT; CHANNEL_COUNT],
            error: None,
        }
    }
}

impl MeterConfigBuilder {
    fn fail(&mut self, error: IsovError) {
        self.error.get_or_insert(error);
    }

    /// Sets the device name.
    pub fn device_name(mut self, name: &str) -> Self {
        let mut text: String<NAME_CAPACITY> = String::new();
        match text.push_str(name) {
            Ok(()) => self.config.device_name = text,
            Err(()) => self.fail(IsovError::InvalidConfig),
        }
        self
    }

    /// Sets the line of one channel.
    pub fn line(mut self, channel: ChannelId, gpio: u32, label: &str) -> Self {
        match LineConfig::new(gpio, label) {
            Ok(line) => self.config.lines[channel.index()] = line,
            Err(error) => self.fail(error),
        }
        self
    }

    /// Sets the calibration coefficient of one channel.
    pub fn coefficient(mut self, channel: ChannelId, coefficient: i32) -> Self {
        self.coefficients[channel.index()] = coefficient;
        self
    }

    /// Sets the same calibration coefficient on every channel.
    pub fn uniform_coefficient(mut self, coefficient: i32) -> Self {
        self.coefficients = [coefficient; CHANNEL_COUNT];
        self
    }

    /// Sets the tick source location.
    pub fn timer(mut self, base: u32, offset: u32) -> Self {
        self.config.timer = TimerConfig { base, offset };
        self
    }

    /// Builds and validates the configuration.
    pub fn build(mut self) -> IsovResult<MeterConfig> {
        if let Some(error) = self.error {
            return Err(error);
        }
        self.config.calibration = CalibrationTable::new(self.coefficients);
        self.config.validate()?;
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = MeterConfig::default();
        assert_eq!(config.device_name.as_str(), "isov");
        let gpios: heapless::Vec<u32, CHANNEL_COUNT> = config.lines.iter().map(|l| l.gpio).collect();
        assert_eq!(gpios.as_slice(), &[2, 22, 10, 5, 26]);
        assert_eq!(config.line(ChannelId::FIFTH).label.as_str(), "Voltage to freq 5");
        assert_eq!(config.timer.counter_address(), 0x3F00_3004);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder_overrides() {
        let config = MeterConfig::builder()
            .device_name("meter0")
            .line(ChannelId::SECOND, 17, "aux")
            .uniform_coefficient(1_000_000)
            .coefficient(ChannelId::THIRD, 500_000)
            .timer(0x2000_3000, 8)
            .build()
            .unwrap();

        assert_eq!(config.device_name.as_str(), "meter0");
        assert_eq!(config.line(ChannelId::SECOND).gpio, 17);
        assert_eq!(config.line(ChannelId::SECOND).label.as_str(), "aux");
        assert_eq!(config.calibration.coefficient(ChannelId::FIRST), 1_000_000);
        assert_eq!(config.calibration.coefficient(ChannelId::THIRD), 500_000);
        assert_eq!(config.timer.counter_address(), 0x2000_3008);
    }

    #[test]
    fn test_builder_rejects_bad_values() {
        let duplicate = MeterConfig::builder().line(ChannelId::SECOND, 2, "dup").build();
        assert_eq!(duplicate, Err(IsovError::InvalidConfig));

        let non_positive = MeterConfig::builder().coefficient(ChannelId::FIRST, 0).build();
        assert_eq!(non_positive, Err(IsovError::InvalidConfig));

        let long_name = MeterConfig::builder().device_name("a-name-that-is-way-too-long").build();
        assert_eq!(long_name, Err(IsovError::InvalidConfig));

        let empty_name = MeterConfig::builder().device_name("").build();
        assert_eq!(empty_name, Err(IsovError::InvalidConfig));
    }
}
