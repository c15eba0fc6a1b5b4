//! Read-only accessors injected at construction. The scene builder resolves
//! waveform peaks and MIDI notes through these instead of reaching into the
//! audio engine; any caching is the implementor's concern.

use crate::model::MidiNote;

/// Min/max peak pairs covering a container's audio, coarse resolution.
/// The render engine downsamples further against the on-screen width.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct WaveformPeaks {
    pub min: Vec<f32>,
    pub max: Vec<f32>,
}

impl WaveformPeaks {
    pub fn len(&self) -> usize {
        self.min.len().min(self.max.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

pub trait WaveformProvider {
    fn peaks(&self, container_id: u64) -> Option<WaveformPeaks>;
    /// Source audio duration in bars, independent of the placed length.
    fn duration_bars(&self, container_id: u64) -> Option<f64>;
}

pub trait MidiProvider {
    fn notes(&self, container_id: u64) -> Option<Vec<MidiNote>>;
}

/// Diagnostics sink for per-frame counters. No-op by default so the core
/// never reads global process state to decide whether to log.
pub trait Diagnostics {
    fn counter(&self, _name: &'static str, _value: u64) {}
    fn event(&self, _name: &'static str) {}
}

pub struct NullDiagnostics;

impl Diagnostics for NullDiagnostics {}

/// Forwards counters to the `log` crate at trace level.
pub struct LogDiagnostics;

impl Diagnostics for LogDiagnostics {
    fn counter(&self, name: &'static str, value: u64) {
        log::trace!("{}={}", name, value);
    }

    fn event(&self, name: &'static str) {
        log::trace!("{}", name);
    }
}

/// Provider with no audio or MIDI content. Useful for tests and for hosts
/// that render structure before media is loaded.
pub struct EmptyProvider;

impl WaveformProvider for EmptyProvider {
    fn peaks(&self, _container_id: u64) -> Option<WaveformPeaks> {
        None
    }

    fn duration_bars(&self, _container_id: u64) -> Option<f64> {
        None
    }
}

impl MidiProvider for EmptyProvider {
    fn notes(&self, _container_id: u64) -> Option<Vec<MidiNote>> {
        None
    }
}
