use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use super::section::SectionState;
use super::track::TrackState;
use crate::constants::{DEFAULT_INLINE_LANE_HEIGHT, DEFAULT_PIXELS_PER_BAR};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeSignature {
    pub beats_per_bar: u32,
    pub beat_unit: u32,
}

impl Default for TimeSignature {
    fn default() -> Self {
        Self {
            beats_per_bar: 4,
            beat_unit: 4,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BarRange {
    pub start_bar: f64,
    pub end_bar: f64,
}

impl BarRange {
    pub fn normalized(self) -> BarRange {
        if self.end_bar < self.start_bar {
            BarRange {
                start_bar: self.end_bar,
                end_bar: self.start_bar,
            }
        } else {
            self
        }
    }

    pub fn span(&self) -> f64 {
        (self.end_bar - self.start_bar).abs()
    }
}

/// Inline piano-roll lane settings for a MIDI track.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InlineLaneConfig {
    pub height: f32,
    pub low_pitch: u8,
    pub high_pitch: u8,
}

impl Default for InlineLaneConfig {
    fn default() -> Self {
        Self {
            height: DEFAULT_INLINE_LANE_HEIGHT,
            low_pitch: 48,
            high_pitch: 72,
        }
    }
}

/// Immutable description of everything the grid draws and edits. Produced by
/// the surrounding application each frame; structural equality drives the
/// rebuild-skip in the host view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub tracks: Vec<TrackState>,
    pub sections: Vec<SectionState>,
    pub time_signature: TimeSignature,
    pub pixels_per_bar: f32,
    pub total_bars: u32,
    pub show_headers: bool,

    pub track_height_overrides: BTreeMap<u64, f32>,
    pub inline_lanes: BTreeMap<u64, InlineLaneConfig>,
    pub expanded_automation: BTreeSet<u64>,

    pub selected_containers: BTreeSet<u64>,
    pub selected_section: Option<u64>,
    pub selected_range: Option<BarRange>,

    pub snap_enabled: bool,
    pub grid_snap_bars: f64,

    pub playhead_bar: f64,
    pub cursor_bar: Option<f64>,

    pub min_content_height: f32,
}

impl Default for Snapshot {
    fn default() -> Self {
        Self {
            tracks: Vec::new(),
            sections: Vec::new(),
            time_signature: TimeSignature::default(),
            pixels_per_bar: DEFAULT_PIXELS_PER_BAR,
            total_bars: 64,
            show_headers: true,
            track_height_overrides: BTreeMap::new(),
            inline_lanes: BTreeMap::new(),
            expanded_automation: BTreeSet::new(),
            selected_containers: BTreeSet::new(),
            selected_section: None,
            selected_range: None,
            snap_enabled: true,
            grid_snap_bars: 0.25,
            playhead_bar: 1.0,
            cursor_bar: None,
            min_content_height: 0.0,
        }
    }
}

impl Snapshot {
    pub fn track(&self, id: u64) -> Option<&TrackState> {
        self.tracks.iter().find(|t| t.id == id)
    }

    pub fn container(&self, id: u64) -> Option<(&TrackState, &super::ContainerState)> {
        for track in &self.tracks {
            if let Some(c) = track.containers.iter().find(|c| c.id == id) {
                return Some((track, c));
            }
        }
        None
    }

    pub fn section(&self, id: u64) -> Option<&SectionState> {
        self.sections.iter().find(|s| s.id == id)
    }
}
