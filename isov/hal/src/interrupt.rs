//! Edge line registration and interrupt dispatch
//!
//! [`EdgeLines`] claims one interrupt-capable line per channel and arms it for
//! falling edges. Each claimed line stays bound to the [`ChannelId`] it was
//! registered for, so the interrupt glue hands the core a resolved channel and
//! no lookup by interrupt number happens on the edge path.

use core::ops::Deref;

use isov_core::{ChannelId, EdgeOutcome, Meter, MeterConfig, TickSource, CHANNEL_COUNT};
use log::{error, info, warn};

use crate::error::HalResult;
use crate::gpio::{Edge, InterruptLine, LineProvider};

/// Claimed lines, one per channel
pub struct EdgeLines<L> {
    lines: [Option<L>; CHANNEL_COUNT],
}

impl<L: InterruptLine> EdgeLines<L> {
    /// Claim and arm the line of every channel.
    ///
    /// On the first failure every line already claimed is disarmed and
    /// released in reverse order, then the failure is returned.
    pub fn register<P>(provider: &mut P, config: &MeterConfig) -> HalResult<Self>
    where
        P: LineProvider<Line = L>,
    {
        let mut registered = Self {
            lines: core::array::from_fn(|_| None),
        };

        for channel in ChannelId::all() {
            let line_config = config.line(channel);
            match claim(provider, line_config.gpio, &line_config.label) {
                Ok(line) => registered.lines[channel.index()] = Some(line),
                Err(err) => {
                    error!("ISOV: failed to register {} on GPIO {}: {}", channel, line_config.gpio, err);
                    registered.release_all(provider);
                    return Err(err);
                }
            }
        }

        info!("ISOV: GPIO settings ok");
        Ok(registered)
    }

    /// Disarm and release every line
    pub fn teardown<P>(mut self, provider: &mut P)
    where
        P: LineProvider<Line = L>,
    {
        info!("ISOV: GPIO unregistering");
        self.release_all(provider);
    }

    /// Line bound to `channel`
    pub fn line(&self, channel: ChannelId) -> Option<&L> {
        self.lines[channel.index()].as_ref()
    }

    /// Channel and GPIO number of every claimed line
    pub fn bindings(&self) -> impl Iterator<Item = (ChannelId, u32)> + '_ {
        ChannelId::all().filter_map(move |channel| self.line(channel).map(|line| (channel, line.pin_number())))
    }

    /// Number of claimed lines
    pub fn len(&self) -> usize {
        self.lines.iter().filter(|slot| slot.is_some()).count()
    }

    /// Check if no line is claimed
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn release_all<P>(&mut self, provider: &mut P)
    where
        P: LineProvider<Line = L>,
    {
        for slot in self.lines.iter_mut().rev() {
            if let Some(mut line) = slot.take() {
                if let Err(err) = line.disable_interrupt() {
                    warn!("ISOV: could not disarm GPIO {}: {}", line.pin_number(), err);
                }
                provider.release(line);
            }
        }
    }
}

fn claim<P: LineProvider>(provider: &mut P, gpio: u32, label: &str) -> HalResult<P::Line> {
    let mut line = provider.request(gpio, label)?;
    if let Err(err) = line.enable_interrupt(Edge::Falling) {
        provider.release(line);
        return Err(err);
    }
    Ok(line)
}

/// Interrupt-context entry point: timestamps an edge and feeds the meter
#[derive(Debug, Clone)]
pub struct EdgeDispatcher<M, T> {
    meter: M,
    timer: T,
}

impl<M, T> EdgeDispatcher<M, T>
where
    M: Deref<Target = Meter>,
    T: TickSource,
{
    /// Create a dispatcher over `meter` reading `timer`
    pub fn new(meter: M, timer: T) -> Self {
        Self { meter, timer }
    }

    /// Handle a falling edge on `channel`.
    ///
    /// Reads the timer once and runs the engine; safe from interrupt context.
    #[inline]
    pub fn on_interrupt(&self, channel: ChannelId) -> EdgeOutcome {
        self.meter.on_edge_at(channel, &self.timer)
    }

    /// Get reference to the meter
    pub fn meter(&self) -> &Meter {
        &self.meter
    }

    /// Get reference to the timer
    pub fn timer(&self) -> &T {
        &self.timer
    }
}
