use serde::{Deserialize, Serialize};

use super::automation::AutomationLaneState;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContainerKind {
    Audio,
    Midi,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FadeCurve {
    Linear,
    Exponential,
    SCurve,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FadeSpec {
    pub duration_bars: f64,
    pub curve: FadeCurve,
}

impl FadeSpec {
    pub fn linear(duration_bars: f64) -> Self {
        Self {
            duration_bars,
            curve: FadeCurve::Linear,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MidiNote {
    pub id: u64,
    pub pitch: u8,
    pub velocity: u8,
    pub start_beat: f64,
    pub duration_beats: f64,
}

/// A placed audio/MIDI region on a track. Start positions are 1-based bars;
/// waveform peaks and resolved notes live behind provider callbacks, not here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContainerState {
    pub id: u64,
    pub name: String,
    pub kind: ContainerKind,
    pub start_bar: f64,
    pub length_bars: f64,
    /// Offset into the source audio, in bars. Trimming the left edge moves it.
    pub audio_offset_bars: f64,
    pub fade_in: Option<FadeSpec>,
    pub fade_out: Option<FadeSpec>,
    pub automation: Vec<AutomationLaneState>,
    pub color: Option<(u8, u8, u8)>,
}

impl ContainerState {
    pub fn end_bar(&self) -> f64 {
        self.start_bar + self.length_bars
    }
}

impl Default for ContainerState {
    fn default() -> Self {
        Self {
            id: 0,
            name: "Container".to_string(),
            kind: ContainerKind::Audio,
            start_bar: 1.0,
            length_bars: 4.0,
            audio_offset_bars: 0.0,
            fade_in: None,
            fade_out: None,
            automation: Vec::new(),
            color: None,
        }
    }
}
