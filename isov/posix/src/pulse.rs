//! Simulated voltage-to-frequency converters
//!
//! One thread per channel produces a square wave on its [`LineSignal`] with
//! period `coefficient / input` microseconds. Every high-to-low transition on an
//! armed line is delivered to the [`EdgeDispatcher`], the way the interrupt
//! controller would deliver it on hardware. Threads sleep until absolute
//! deadlines so the period does not drift.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use isov_core::{ChannelId, Meter, TickSource};
use isov_hal::{EdgeDispatcher, Level};
use log::{debug, warn};

use crate::lines::LineSignal;

/// Period of a converter fed `input` with calibration `coefficient`.
///
/// `None` when the converter would not oscillate (non-positive input) or when
/// the period would round to zero ticks.
pub fn period_for(coefficient: i32, input: i32) -> Option<Duration> {
    if input <= 0 || coefficient <= 0 {
        return None;
    }
    let ticks = coefficient / input;
    if ticks <= 0 {
        return None;
    }
    Some(Duration::from_micros(ticks as u64))
}

/// One simulated converter output
#[derive(Debug, Clone)]
pub struct PulseTrain {
    pub channel: ChannelId,
    pub signal: Arc<LineSignal>,
    pub period: Duration,
}

/// Running converter threads
pub struct PulseGenerator {
    running: Arc<AtomicBool>,
    handles: Vec<JoinHandle<()>>,
}

impl PulseGenerator {
    /// Spawn one thread per train
    pub fn start<T>(dispatcher: EdgeDispatcher<Arc<Meter>, T>, trains: Vec<PulseTrain>) -> Self
    where
        T: TickSource + Clone + Send + 'static,
    {
        let running = Arc::new(AtomicBool::new(true));
        let handles = trains
            .into_iter()
            .map(|train| {
                let running = Arc::clone(&running);
                let dispatcher = dispatcher.clone();
                debug!("{}: pulses every {:?}", train.channel, train.period);
                thread::spawn(move || pulse_thread(train, dispatcher, running))
            })
            .collect();

        Self { running, handles }
    }

    /// Number of running trains
    pub fn len(&self) -> usize {
        self.handles.len()
    }

    /// Check if no train is running
    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    /// Stop every thread and wait for it
    pub fn stop(mut self) {
        self.halt();
    }

    fn halt(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        for handle in self.handles.drain(..) {
            if handle.join().is_err() {
                warn!("pulse thread panicked");
            }
        }
    }
}

impl Drop for PulseGenerator {
    fn drop(&mut self) {
        self.halt();
    }
}

fn pulse_thread<T: TickSource>(
    train: PulseTrain,
    dispatcher: EdgeDispatcher<Arc<Meter>, T>,
    running: Arc<AtomicBool>,
) {
    let half = train.period / 2;
    let mut next_edge = Instant::now();

    while running.load(Ordering::Relaxed) {
        // Advance to next falling edge (absolute time)
        next_edge += train.period;

        sleep_until(next_edge - half);
        train.signal.drive(Level::High);

        sleep_until(next_edge);
        if train.signal.drive(Level::Low) && train.signal.is_armed() {
            dispatcher.on_interrupt(train.channel);
        }
    }
}

fn sleep_until(deadline: Instant) {
    let now = Instant::now();
    if deadline > now {
        thread::sleep(deadline - now);
    }
}
