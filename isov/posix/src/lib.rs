//! POSIX port of the ISOV meter.
//!
//! Hosts the measurement core on Linux/Unix: the monotonic clock replaces the
//! memory-mapped system timer, threads play the voltage-to-frequency
//! converters, and the device is read through `std::io`. [`PosixPort`] wires
//! these together the same way the board support does on hardware.

use std::io;
use std::sync::Arc;

use isov_core::Meter;
use isov_hal::{EdgeDispatcher, EdgeLines, MeterDevice};
use log::{info, warn};

pub mod clock;
pub mod config;
pub mod error;
pub mod file;
pub mod lines;
pub mod pulse;

pub use clock::{host_clock, HostClock, MonotonicCounter};
pub use config::{PortConfig, SimulationConfig};
pub use error::{PortError, PortResult};
pub use file::DeviceFile;
pub use lines::{LineSignal, SimLine, SimulatedLines};
pub use pulse::{period_for, PulseGenerator, PulseTrain};

/// Running host meter: registered lines, converter threads and the device
pub struct PosixPort {
    device: MeterDevice<Arc<Meter>>,
    provider: SimulatedLines,
    lines: Option<EdgeLines<SimLine>>,
    pulses: Option<PulseGenerator>,
}

impl PosixPort {
    /// Start with every simulated line available
    pub fn start(config: PortConfig) -> PortResult<Self> {
        Self::start_with(config, SimulatedLines::new())
    }

    /// Start on an explicit line provider.
    ///
    /// Registration failures are unwound before the error is returned.
    pub fn start_with(config: PortConfig, mut provider: SimulatedLines) -> PortResult<Self> {
        let meter = Arc::new(Meter::from_config(&config.meter));
        let clock = host_clock()?;
        let lines = EdgeLines::register(&mut provider, &config.meter)?;

        let mut trains = Vec::new();
        for (channel, gpio) in lines.bindings() {
            let Some(signal) = provider.signal(gpio) else {
                continue;
            };
            let coefficient = meter.calibration().coefficient(channel);
            let input = config.simulation.inputs[channel.index()];
            match period_for(coefficient, input) {
                Some(period) => trains.push(PulseTrain {
                    channel,
                    signal,
                    period,
                }),
                None => warn!("{}: input {} produces no pulses", channel, input),
            }
        }

        let dispatcher = EdgeDispatcher::new(Arc::clone(&meter), clock);
        let pulses = PulseGenerator::start(dispatcher, trains);
        let device = MeterDevice::new(meter, &config.meter);
        info!(
            "ISOV: /dev/{} ready, {} converters running",
            device.name(),
            pulses.len()
        );

        Ok(Self {
            device,
            provider,
            lines: Some(lines),
            pulses: Some(pulses),
        })
    }

    /// Get reference to the meter
    pub fn meter(&self) -> &Meter {
        self.device.meter()
    }

    /// Get reference to the device
    pub fn device(&self) -> &MeterDevice<Arc<Meter>> {
        &self.device
    }

    /// Open the device
    pub fn open(&self) -> DeviceFile<'_, Arc<Meter>> {
        DeviceFile::open(&self.device)
    }

    /// Read one fresh record from the device
    pub fn read_record(&self) -> io::Result<String> {
        self.open().read_record()
    }

    /// Stop the converters and release every line
    pub fn shutdown(mut self) {
        self.stop();
    }

    fn stop(&mut self) {
        if let Some(pulses) = self.pulses.take() {
            pulses.stop();
        }
        if let Some(lines) = self.lines.take() {
            lines.teardown(&mut self.provider);
        }
    }
}

impl Drop for PosixPort {
    fn drop(&mut self) {
        self.stop();
    }
}
