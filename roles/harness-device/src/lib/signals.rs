//! Output lines observed by the measurement setup.
//!
//! The trigger brackets exactly the cipher call so a scope can align its acquisition window on
//! it. The busy indicator is high while a payload is pending and while a run is in progress.

use std::time::Instant;
use tracing::{debug, trace};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Low,
    High,
}

pub trait Signals {
    fn trigger(&mut self, level: Level);
    fn busy(&mut self, level: Level);
}

/// Signals reported through `tracing`, with the width of every trigger pulse.
#[derive(Debug, Default)]
pub struct TracingSignals {
    raised_at: Option<Instant>,
    pulses: u64,
}

impl TracingSignals {
    pub fn new() -> Self {
        Self::default()
    }

    /// Completed trigger pulses since start-up.
    pub fn pulses(&self) -> u64 {
        self.pulses
    }
}

impl Signals for TracingSignals {
    fn trigger(&mut self, level: Level) {
        match level {
            Level::High => {
                self.raised_at = Some(Instant::now());
            }
            Level::Low => {
                if let Some(raised_at) = self.raised_at.take() {
                    self.pulses += 1;
                    debug!(
                        pulse = self.pulses,
                        width_us = raised_at.elapsed().as_micros() as u64,
                        "Trigger pulse"
                    );
                }
            }
        }
    }

    fn busy(&mut self, level: Level) {
        trace!(?level, "Busy indicator");
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalEvent {
    Trigger(Level),
    Busy(Level),
}

/// Keeps every edge in order, for tests.
#[derive(Debug, Default, Clone)]
pub struct RecordingSignals {
    events: Vec<SignalEvent>,
}

impl RecordingSignals {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> &[SignalEvent] {
        &self.events
    }

    pub fn trigger_pulses(&self) -> usize {
        self.events
            .iter()
            .filter(|e| **e == SignalEvent::Trigger(Level::High))
            .count()
    }

    /// Last level driven on the busy line, low if it was never driven.
    pub fn busy_level(&self) -> Level {
        self.events
            .iter()
            .rev()
            .find_map(|e| match e {
                SignalEvent::Busy(level) => Some(*level),
                _ => None,
            })
            .unwrap_or(Level::Low)
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }
}

impl Signals for RecordingSignals {
    fn trigger(&mut self, level: Level) {
        self.events.push(SignalEvent::Trigger(level));
    }

    fn busy(&mut self, level: Level) {
        self.events.push(SignalEvent::Busy(level));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tracing_signals_count_complete_pulses() {
        let mut signals = TracingSignals::new();
        signals.trigger(Level::Low);
        assert_eq!(signals.pulses(), 0);
        signals.trigger(Level::High);
        signals.trigger(Level::Low);
        signals.trigger(Level::High);
        signals.trigger(Level::Low);
        assert_eq!(signals.pulses(), 2);
    }

    #[test]
    fn recording_signals_track_busy_level() {
        let mut signals = RecordingSignals::new();
        assert_eq!(signals.busy_level(), Level::Low);
        signals.busy(Level::High);
        signals.trigger(Level::High);
        signals.trigger(Level::Low);
        assert_eq!(signals.busy_level(), Level::High);
        assert_eq!(signals.trigger_pulses(), 1);
        signals.busy(Level::Low);
        assert_eq!(signals.busy_level(), Level::Low);
    }
}
