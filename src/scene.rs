//! Scene builder: turns a `Snapshot` into pixel-space layout. Pure and
//! deterministic; waveforms and MIDI come in through the injected providers,
//! never fetched here.

use crate::constants::{
    AUTOMATION_LANE_HEIGHT, AUTOMATION_TOOLBAR_HEIGHT, CONTENT_BOTTOM_PADDING,
    DEFAULT_TRACK_HEIGHT, RULER_HEIGHT, SECTION_ROW_HEIGHT,
};
use crate::geometry::Rect;
use crate::model::{FadeSpec, LaneScope, MidiNote, Snapshot, TrackKind};
use crate::providers::{MidiProvider, WaveformPeaks, WaveformProvider};
use crate::time_utils::BarConverter;

/// Horizontal/vertical window the host is currently showing, in canvas
/// pixels. Header rows are pinned: vertical scroll applies only below them.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Viewport {
    pub scroll_x: f32,
    pub scroll_y: f32,
    pub width: f32,
    pub height: f32,
}

impl Viewport {
    pub fn visible_min_x(&self) -> f32 {
        self.scroll_x
    }

    pub fn visible_max_x(&self) -> f32 {
        self.scroll_x + self.width
    }
}

/// One automation sub-row, full width, bound to a stable target path so the
/// lane keeps its identity across rebuilds.
#[derive(Debug, Clone, PartialEq)]
pub struct AutomationLaneLayout {
    pub track_id: u64,
    pub scope: LaneScope,
    pub target_path: String,
    pub rect: Rect,
    pub lane_index: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct InlineLaneLayout {
    pub rect: Rect,
    pub low_pitch: u8,
    pub high_pitch: u8,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ContainerLayout {
    pub container_id: u64,
    pub track_id: u64,
    pub rect: Rect,
    pub peaks: Option<WaveformPeaks>,
    pub notes: Option<Vec<MidiNote>>,
    pub fade_in: Option<FadeSpec>,
    pub fade_out: Option<FadeSpec>,
    pub selected: bool,
    /// Source audio duration in bars, when the waveform provider knows it.
    /// Trim clamping uses this to keep edges inside the audio.
    pub audio_duration_bars: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TrackLayout {
    pub track_id: u64,
    pub y: f32,
    /// Height of the clip band only.
    pub clip_height: f32,
    pub toolbar_height: f32,
    pub lanes: Vec<AutomationLaneLayout>,
    pub inline_lane: Option<InlineLaneLayout>,
    /// clip + toolbar + automation sub-lanes + inline MIDI.
    pub height: f32,
    pub containers: Vec<ContainerLayout>,
}

impl TrackLayout {
    pub fn clip_rect(&self, width: f32) -> Rect {
        Rect::new(0.0, self.y, width, self.clip_height)
    }

    pub fn bounds(&self, width: f32) -> Rect {
        Rect::new(0.0, self.y, width, self.height)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SectionLayout {
    pub section_id: u64,
    pub rect: Rect,
    pub selected: bool,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Scene {
    pub tracks: Vec<TrackLayout>,
    pub sections: Vec<SectionLayout>,
    pub header_height: f32,
    pub content_height: f32,
    pub content_width: f32,
}

impl Scene {
    pub fn track(&self, id: u64) -> Option<&TrackLayout> {
        self.tracks.iter().find(|t| t.track_id == id)
    }

    pub fn container(&self, id: u64) -> Option<&ContainerLayout> {
        self.tracks
            .iter()
            .flat_map(|t| t.containers.iter())
            .find(|c| c.container_id == id)
    }
}

pub struct SceneBuilder;

impl SceneBuilder {
    pub fn build(
        snapshot: &Snapshot,
        waveforms: &dyn WaveformProvider,
        midi: &dyn MidiProvider,
    ) -> Scene {
        let conv = BarConverter::new(
            snapshot.pixels_per_bar,
            snapshot.time_signature.beats_per_bar,
        );
        let content_width = conv.bars_to_px(snapshot.total_bars as f64);

        let header_height = if snapshot.show_headers {
            RULER_HEIGHT + SECTION_ROW_HEIGHT
        } else {
            0.0
        };

        let mut y_offset = header_height;
        let mut tracks = Vec::with_capacity(snapshot.tracks.len());

        for track in &snapshot.tracks {
            let clip_height = snapshot
                .track_height_overrides
                .get(&track.id)
                .copied()
                .unwrap_or(DEFAULT_TRACK_HEIGHT);

            let paths = track.automation_paths();
            let expanded =
                !paths.is_empty() && snapshot.expanded_automation.contains(&track.id);
            let toolbar_height = if expanded {
                AUTOMATION_TOOLBAR_HEIGHT
            } else {
                0.0
            };

            let mut lanes = Vec::new();
            if expanded {
                let lanes_top = y_offset + clip_height + toolbar_height;
                for (lane_index, path) in paths.iter().enumerate() {
                    lanes.push(AutomationLaneLayout {
                        track_id: track.id,
                        scope: Self::lane_scope(track, path),
                        target_path: path.clone(),
                        rect: Rect::new(
                            0.0,
                            lanes_top + lane_index as f32 * AUTOMATION_LANE_HEIGHT,
                            content_width,
                            AUTOMATION_LANE_HEIGHT,
                        ),
                        lane_index,
                    });
                }
            }
            let lanes_height = lanes.len() as f32 * AUTOMATION_LANE_HEIGHT;

            let inline_lane = if track.kind == TrackKind::Midi {
                snapshot.inline_lanes.get(&track.id).map(|cfg| {
                    InlineLaneLayout {
                        rect: Rect::new(
                            0.0,
                            y_offset + clip_height + toolbar_height + lanes_height,
                            content_width,
                            cfg.height,
                        ),
                        low_pitch: cfg.low_pitch,
                        high_pitch: cfg.high_pitch.max(cfg.low_pitch.saturating_add(1)),
                    }
                })
            } else {
                None
            };
            let inline_height = inline_lane.as_ref().map_or(0.0, |l| l.rect.height);

            let containers = track
                .containers
                .iter()
                .map(|c| ContainerLayout {
                    container_id: c.id,
                    track_id: track.id,
                    rect: Rect::new(
                        conv.bar_to_x(c.start_bar),
                        y_offset,
                        conv.bars_to_px(c.length_bars),
                        clip_height,
                    ),
                    peaks: waveforms.peaks(c.id),
                    notes: midi.notes(c.id),
                    fade_in: c.fade_in,
                    fade_out: c.fade_out,
                    selected: snapshot.selected_containers.contains(&c.id),
                    audio_duration_bars: waveforms.duration_bars(c.id),
                })
                .collect();

            let height = clip_height + toolbar_height + lanes_height + inline_height;
            tracks.push(TrackLayout {
                track_id: track.id,
                y: y_offset,
                clip_height,
                toolbar_height,
                lanes,
                inline_lane,
                height,
                containers,
            });
            y_offset += height;
        }

        let sections = if snapshot.show_headers {
            snapshot
                .sections
                .iter()
                .map(|s| SectionLayout {
                    section_id: s.id,
                    rect: Rect::new(
                        conv.bar_to_x(s.start_bar),
                        RULER_HEIGHT,
                        conv.bars_to_px(s.length_bars),
                        SECTION_ROW_HEIGHT,
                    ),
                    selected: snapshot.selected_section == Some(s.id),
                })
                .collect()
        } else {
            Vec::new()
        };

        let mut content_height = (y_offset + CONTENT_BOTTOM_PADDING)
            .max(snapshot.min_content_height);
        if snapshot.show_headers {
            content_height = content_height.max(header_height + CONTENT_BOTTOM_PADDING);
        }

        Scene {
            tracks,
            sections,
            header_height,
            content_height,
            content_width,
        }
    }

    fn lane_scope(track: &crate::model::TrackState, path: &str) -> LaneScope {
        for lane in &track.automation {
            if lane.target.path() == path {
                return LaneScope::Track;
            }
        }
        for container in &track.containers {
            for lane in &container.automation {
                if lane.target.path() == path {
                    return LaneScope::Container(container.id);
                }
            }
        }
        LaneScope::Track
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{
        AutomationLaneState, AutomationTarget, ContainerState, SectionState, TrackState,
    };
    use crate::providers::EmptyProvider;

    fn snapshot_with_one_track() -> Snapshot {
        let container = ContainerState {
            id: 10,
            start_bar: 1.0,
            length_bars: 4.0,
            ..Default::default()
        };
        let track = TrackState {
            id: 1,
            containers: vec![container],
            ..Default::default()
        };
        Snapshot {
            tracks: vec![track],
            pixels_per_bar: 40.0,
            ..Default::default()
        }
    }

    #[test]
    fn build_is_deterministic() {
        let snapshot = snapshot_with_one_track();
        let a = SceneBuilder::build(&snapshot, &EmptyProvider, &EmptyProvider);
        let b = SceneBuilder::build(&snapshot, &EmptyProvider, &EmptyProvider);
        assert_eq!(a, b);
    }

    #[test]
    fn container_rect_from_bars() {
        let snapshot = snapshot_with_one_track();
        let scene = SceneBuilder::build(&snapshot, &EmptyProvider, &EmptyProvider);
        let c = scene.container(10).unwrap();
        assert_eq!(c.rect.x, 0.0);
        assert_eq!(c.rect.width, 160.0);
        assert_eq!(c.rect.y, RULER_HEIGHT + SECTION_ROW_HEIGHT);
        assert_eq!(c.rect.height, DEFAULT_TRACK_HEIGHT);
    }

    #[test]
    fn empty_snapshot_headers_hidden_collapses_to_padding() {
        let snapshot = Snapshot {
            show_headers: false,
            ..Default::default()
        };
        let scene = SceneBuilder::build(&snapshot, &EmptyProvider, &EmptyProvider);
        assert_eq!(scene.header_height, 0.0);
        assert_eq!(scene.content_height, CONTENT_BOTTOM_PADDING);
        assert!(scene.tracks.is_empty());
        assert!(scene.sections.is_empty());
    }

    #[test]
    fn automation_expands_only_when_flagged_and_present() {
        let mut snapshot = snapshot_with_one_track();
        // expanded set contains the track but there are no lanes: no expansion
        snapshot.expanded_automation.insert(1);
        let scene = SceneBuilder::build(&snapshot, &EmptyProvider, &EmptyProvider);
        assert!(scene.tracks[0].lanes.is_empty());
        assert_eq!(scene.tracks[0].height, DEFAULT_TRACK_HEIGHT);

        // add a lane: toolbar + one sub-row appear
        snapshot.tracks[0]
            .automation
            .push(AutomationLaneState::new(AutomationTarget::TrackVolume));
        let scene = SceneBuilder::build(&snapshot, &EmptyProvider, &EmptyProvider);
        assert_eq!(scene.tracks[0].lanes.len(), 1);
        assert_eq!(
            scene.tracks[0].height,
            DEFAULT_TRACK_HEIGHT + AUTOMATION_TOOLBAR_HEIGHT + AUTOMATION_LANE_HEIGHT
        );

        // lane present but track not in expanded set: collapsed again
        snapshot.expanded_automation.clear();
        let scene = SceneBuilder::build(&snapshot, &EmptyProvider, &EmptyProvider);
        assert!(scene.tracks[0].lanes.is_empty());
    }

    #[test]
    fn tracks_stack_without_overlap() {
        let mut snapshot = snapshot_with_one_track();
        let mut second = TrackState {
            id: 2,
            ..Default::default()
        };
        second
            .automation
            .push(AutomationLaneState::new(AutomationTarget::TrackPan));
        snapshot.tracks.push(second);
        snapshot.expanded_automation.insert(2);

        let scene = SceneBuilder::build(&snapshot, &EmptyProvider, &EmptyProvider);
        let first = &scene.tracks[0];
        let second = &scene.tracks[1];
        assert_eq!(second.y, first.y + first.height);
        // expanded lane sits inside its own track's span
        let lane = &second.lanes[0];
        assert!(lane.rect.y >= second.y);
        assert!(lane.rect.bottom() <= second.y + second.height + 1e-3);
    }

    #[test]
    fn sections_pinned_in_header_row() {
        let mut snapshot = snapshot_with_one_track();
        snapshot.sections.push(SectionState {
            id: 77,
            name: "Chorus".to_string(),
            start_bar: 5.0,
            length_bars: 8.0,
            color: None,
        });
        let scene = SceneBuilder::build(&snapshot, &EmptyProvider, &EmptyProvider);
        let s = &scene.sections[0];
        assert_eq!(s.rect.y, RULER_HEIGHT);
        assert_eq!(s.rect.x, 160.0);
        assert_eq!(s.rect.height, SECTION_ROW_HEIGHT);
    }
}
