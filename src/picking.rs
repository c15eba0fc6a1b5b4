//! CPU hit testing. Must agree exactly with what the render engine draws:
//! the precedence chain below mirrors the draw order back to front, so the
//! topmost drawn object always wins the pick.

use crate::constants::{
    BREAKPOINT_HIT_RADIUS, CONTAINER_AUTOMATION_BAND, CONTAINER_EDGE_PX, NOTE_GRAB_INSET,
    NOTE_MAX_EDGE_WIDTH, NOTE_MIN_EDGE_WIDTH, RULER_HEIGHT,
};
use crate::geometry::{Point, Rect};
use crate::model::{LaneRef, LaneScope, MidiNote, Snapshot, TrackState};
use crate::scene::{AutomationLaneLayout, ContainerLayout, InlineLaneLayout, Scene, Viewport};
use crate::time_utils::BarConverter;

/// Sub-region of a container rect: vertical thirds crossed with fixed-width
/// edge bands. Top third is the fade/selector band, middle the resize band,
/// bottom the trim band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContainerZone {
    Selector,
    Move,
    ResizeLeft,
    ResizeRight,
    TrimLeft,
    TrimRight,
    FadeLeft,
    FadeRight,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NoteZone {
    Move,
    ResizeLeft,
    ResizeRight,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Pick {
    None,
    Ruler,
    Section {
        section_id: u64,
    },
    TrackBackground {
        track_id: u64,
    },
    ContainerZone {
        track_id: u64,
        container_id: u64,
        zone: ContainerZone,
    },
    AutomationBreakpoint {
        lane: LaneRef,
        point_id: u64,
    },
    AutomationSegment {
        lane: LaneRef,
    },
    MidiNote {
        track_id: u64,
        container_id: u64,
        note_id: u64,
        zone: NoteZone,
    },
}

const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0100_0000_01b3;

fn fnv1a(hash: u64, bytes: &[u8]) -> u64 {
    let mut h = hash;
    for &b in bytes {
        h ^= b as u64;
        h = h.wrapping_mul(FNV_PRIME);
    }
    h
}

impl Pick {
    pub const NONE_ID: u64 = 0;

    /// Stable identifier for hover diffing: equal picks hash equal, `None`
    /// is 0, and every real pick is coerced non-zero.
    pub fn id(&self) -> u64 {
        let mut h = FNV_OFFSET;
        let tag: u8 = match self {
            Pick::None => return Self::NONE_ID,
            Pick::Ruler => 1,
            Pick::Section { .. } => 2,
            Pick::TrackBackground { .. } => 3,
            Pick::ContainerZone { .. } => 4,
            Pick::AutomationBreakpoint { .. } => 5,
            Pick::AutomationSegment { .. } => 6,
            Pick::MidiNote { .. } => 7,
        };
        h = fnv1a(h, &[tag]);
        match self {
            Pick::None | Pick::Ruler => {}
            Pick::Section { section_id } => h = fnv1a(h, &section_id.to_le_bytes()),
            Pick::TrackBackground { track_id } => h = fnv1a(h, &track_id.to_le_bytes()),
            Pick::ContainerZone {
                track_id,
                container_id,
                zone,
            } => {
                h = fnv1a(h, &track_id.to_le_bytes());
                h = fnv1a(h, &container_id.to_le_bytes());
                h = fnv1a(h, &[*zone as u8]);
            }
            Pick::AutomationBreakpoint { lane, point_id } => {
                h = Self::hash_lane(h, lane);
                h = fnv1a(h, &point_id.to_le_bytes());
            }
            Pick::AutomationSegment { lane } => h = Self::hash_lane(h, lane),
            Pick::MidiNote {
                track_id,
                container_id,
                note_id,
                zone,
            } => {
                h = fnv1a(h, &track_id.to_le_bytes());
                h = fnv1a(h, &container_id.to_le_bytes());
                h = fnv1a(h, &note_id.to_le_bytes());
                h = fnv1a(h, &[*zone as u8]);
            }
        }
        // zero means "no pick"
        if h == 0 { 1 } else { h }
    }

    fn hash_lane(mut h: u64, lane: &LaneRef) -> u64 {
        h = fnv1a(h, &lane.track_id.to_le_bytes());
        match lane.scope {
            LaneScope::Track => h = fnv1a(h, &[0]),
            LaneScope::Container(id) => {
                h = fnv1a(h, &[1]);
                h = fnv1a(h, &id.to_le_bytes());
            }
        }
        fnv1a(h, lane.target_path.as_bytes())
    }
}

/// Zone classification for a point known to be inside `rect`. Thirds are
/// half-open so every interior point lands in exactly one zone.
pub fn detect_zone(rect: Rect, p: Point) -> ContainerZone {
    let edge = CONTAINER_EDGE_PX.min(rect.width / 3.0);
    let near_left = p.x < rect.x + edge;
    let near_right = p.x >= rect.right() - edge;

    let third = rect.height / 3.0;
    if p.y < rect.y + third {
        if near_left {
            ContainerZone::FadeLeft
        } else if near_right {
            ContainerZone::FadeRight
        } else {
            ContainerZone::Selector
        }
    } else if p.y < rect.y + 2.0 * third {
        if near_left {
            ContainerZone::ResizeLeft
        } else if near_right {
            ContainerZone::ResizeRight
        } else {
            ContainerZone::Move
        }
    } else {
        if near_left {
            ContainerZone::TrimLeft
        } else if near_right {
            ContainerZone::TrimRight
        } else {
            ContainerZone::Move
        }
    }
}

/// Note edge threshold grows with the note's pixel width, capped, and
/// disappears entirely for slivers.
pub fn note_zone(note_rect: Rect, p: Point) -> NoteZone {
    if note_rect.width < NOTE_MIN_EDGE_WIDTH {
        return NoteZone::Move;
    }
    let edge = (note_rect.width * 0.25).clamp(NOTE_MIN_EDGE_WIDTH, NOTE_MAX_EDGE_WIDTH);
    if p.x < note_rect.x + edge {
        NoteZone::ResizeLeft
    } else if p.x >= note_rect.right() - edge {
        NoteZone::ResizeRight
    } else {
        NoteZone::Move
    }
}

/// Pixel rect of a note inside an inline lane, in content space.
pub fn note_rect(
    note: &MidiNote,
    container_x: f32,
    lane: &InlineLaneLayout,
    conv: &BarConverter,
) -> Rect {
    let rows = (lane.high_pitch - lane.low_pitch) as f32 + 1.0;
    let row_h = lane.rect.height / rows;
    let x = container_x + conv.bars_to_px(conv.beats_to_bars(note.start_beat));
    let w = conv.bars_to_px(conv.beats_to_bars(note.duration_beats));
    let row = note.pitch.saturating_sub(lane.low_pitch) as f32;
    let y = lane.rect.bottom() - (row + 1.0) * row_h;
    Rect::new(x, y, w, row_h)
}

/// Breakpoint screen position inside a lane rect. Value axis is inverted:
/// value 1.0 draws at the top of the lane.
pub fn breakpoint_pos(
    lane_rect: Rect,
    owner_start_bar: f64,
    position_bars: f64,
    value: f32,
    conv: &BarConverter,
) -> Point {
    Point::new(
        conv.bar_to_x(owner_start_bar + position_bars),
        lane_rect.bottom() - value.clamp(0.0, 1.0) * lane_rect.height,
    )
}

pub struct PickingEngine;

impl PickingEngine {
    /// Hit test a point given in view space. Never errors: out-of-range
    /// points and empty scenes resolve to background sentinels.
    pub fn pick(point: Point, scene: &Scene, snapshot: &Snapshot, viewport: &Viewport) -> Pick {
        let conv = BarConverter::new(
            snapshot.pixels_per_bar,
            snapshot.time_signature.beats_per_bar,
        );

        // Pinned header rows: only horizontal scroll applies.
        if snapshot.show_headers && point.y < scene.header_height {
            let content_x = point.x + viewport.scroll_x;
            if point.y < RULER_HEIGHT {
                return Pick::Ruler;
            }
            let p = Point::new(content_x, point.y);
            for section in scene.sections.iter().rev() {
                if section.rect.contains(p) {
                    return Pick::Section {
                        section_id: section.section_id,
                    };
                }
            }
            return Pick::Ruler;
        }

        let p = Point::new(point.x + viewport.scroll_x, point.y + viewport.scroll_y);

        for layout in scene.tracks.iter().rev() {
            let Some(track) = snapshot.track(layout.track_id) else {
                continue;
            };

            // Expanded automation sub-lanes, handles before segments.
            for lane in layout.lanes.iter().rev() {
                if let Some(pick) = Self::pick_expanded_lane(lane, track, p, &conv) {
                    return pick;
                }
            }

            // Containers, topmost last-drawn first.
            for container in layout.containers.iter().rev() {
                if let Some(pick) =
                    Self::pick_container(container, layout, track, p, &conv)
                {
                    return pick;
                }
            }

            if layout.bounds(scene.content_width).contains(p) {
                return Pick::TrackBackground {
                    track_id: layout.track_id,
                };
            }
        }

        Pick::None
    }

    fn pick_expanded_lane(
        lane: &AutomationLaneLayout,
        track: &TrackState,
        p: Point,
        conv: &BarConverter,
    ) -> Option<Pick> {
        let state = track.lane(lane.scope, &lane.target_path)?;
        let owner_start = match lane.scope {
            LaneScope::Track => 1.0,
            LaneScope::Container(id) => track.container(id)?.start_bar,
        };
        let lane_ref = LaneRef {
            track_id: lane.track_id,
            scope: lane.scope,
            target_path: lane.target_path.clone(),
        };
        for point in &state.points {
            let pos = breakpoint_pos(
                lane.rect,
                owner_start,
                point.position_bars,
                point.value,
                conv,
            );
            if pos.distance(p) <= BREAKPOINT_HIT_RADIUS {
                return Some(Pick::AutomationBreakpoint {
                    lane: lane_ref,
                    point_id: point.id,
                });
            }
        }
        if lane.rect.contains(p) {
            return Some(Pick::AutomationSegment { lane: lane_ref });
        }
        None
    }

    fn pick_container(
        container: &ContainerLayout,
        layout: &crate::scene::TrackLayout,
        track: &TrackState,
        p: Point,
        conv: &BarConverter,
    ) -> Option<Pick> {
        // Notes live in the inline lane; test them before the clip body so a
        // note always beats the lane background underneath it.
        if let (Some(inline), Some(notes)) = (&layout.inline_lane, &container.notes) {
            if inline.rect.contains(p) {
                for note in notes.iter().rev() {
                    let rect =
                        note_rect(note, container.rect.x, inline, conv).inset(-NOTE_GRAB_INSET);
                    if rect.contains(p) {
                        return Some(Pick::MidiNote {
                            track_id: container.track_id,
                            container_id: container.container_id,
                            note_id: note.id,
                            zone: note_zone(rect, p),
                        });
                    }
                }
            }
        }

        // Collapsed-lane automation rides in the bottom band of the clip.
        if layout.lanes.is_empty() {
            let state = track.container(container.container_id);
            if let Some(state) = state {
                let band_h = container.rect.height * CONTAINER_AUTOMATION_BAND;
                let band = Rect::new(
                    container.rect.x,
                    container.rect.bottom() - band_h,
                    container.rect.width,
                    band_h,
                );
                for lane_state in &state.automation {
                    let lane_ref = LaneRef {
                        track_id: container.track_id,
                        scope: LaneScope::Container(container.container_id),
                        target_path: lane_state.target.path(),
                    };
                    for point in &lane_state.points {
                        let pos = breakpoint_pos(
                            band,
                            state.start_bar,
                            point.position_bars,
                            point.value,
                            conv,
                        );
                        if pos.distance(p) <= BREAKPOINT_HIT_RADIUS {
                            return Some(Pick::AutomationBreakpoint {
                                lane: lane_ref,
                                point_id: point.id,
                            });
                        }
                    }
                    if !lane_state.points.is_empty() && band.contains(p) {
                        return Some(Pick::AutomationSegment { lane: lane_ref });
                    }
                }
            }
        }

        if container.rect.contains(p) {
            return Some(Pick::ContainerZone {
                track_id: container.track_id,
                container_id: container.container_id,
                zone: detect_zone(container.rect, p),
            });
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{
        AutomationLaneState, AutomationPoint, AutomationTarget, ContainerState, Snapshot,
        TrackState,
    };
    use crate::providers::EmptyProvider;
    use crate::scene::SceneBuilder;

    fn one_container_snapshot() -> Snapshot {
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
            show_headers: false,
            ..Default::default()
        }
    }

    fn pick_at(x: f32, y: f32, snapshot: &Snapshot) -> Pick {
        let scene = SceneBuilder::build(snapshot, &EmptyProvider, &EmptyProvider);
        PickingEngine::pick(
            Point::new(x, y),
            &scene,
            snapshot,
            &Viewport {
                width: 800.0,
                height: 600.0,
                ..Default::default()
            },
        )
    }

    #[test]
    fn container_beats_track_background() {
        let snapshot = one_container_snapshot();
        match pick_at(10.0, 40.0, &snapshot) {
            Pick::ContainerZone { container_id, .. } => assert_eq!(container_id, 10),
            other => panic!("expected container, got {:?}", other),
        }
        // to the right of the container: track background
        match pick_at(300.0, 40.0, &snapshot) {
            Pick::TrackBackground { track_id } => assert_eq!(track_id, 1),
            other => panic!("expected track background, got {:?}", other),
        }
    }

    #[test]
    fn empty_scene_picks_none() {
        let snapshot = Snapshot {
            show_headers: false,
            ..Default::default()
        };
        assert_eq!(pick_at(100.0, 100.0, &snapshot), Pick::None);
    }

    #[test]
    fn resize_right_within_edge_band() {
        let snapshot = one_container_snapshot();
        // container rect x=0..160, height 80 at y=0; middle third y in 26.7..53.3
        match pick_at(155.0, 40.0, &snapshot) {
            Pick::ContainerZone { zone, .. } => assert_eq!(zone, ContainerZone::ResizeRight),
            other => panic!("expected container zone, got {:?}", other),
        }
    }

    #[test]
    fn zone_partition_is_exhaustive_and_gap_free() {
        let rect = Rect::new(0.0, 0.0, 160.0, 80.0);
        let mut seen = std::collections::HashSet::new();
        let mut y = 0.5f32;
        while y < 80.0 {
            let mut x = 0.5f32;
            while x < 160.0 {
                // detect_zone totally classifies every interior point
                seen.insert(detect_zone(rect, Point::new(x, y)));
                x += 1.0;
            }
            y += 1.0;
        }
        assert_eq!(seen.len(), 8);
    }

    #[test]
    fn breakpoint_radius_beats_segment() {
        let mut snapshot = one_container_snapshot();
        let mut lane = AutomationLaneState::new(AutomationTarget::TrackVolume);
        lane.points.push(AutomationPoint {
            id: 5,
            position_bars: 1.0,
            value: 0.5,
        });
        snapshot.tracks[0].automation.push(lane);
        snapshot.expanded_automation.insert(1);

        let scene = SceneBuilder::build(&snapshot, &EmptyProvider, &EmptyProvider);
        let lane_rect = scene.tracks[0].lanes[0].rect;
        let bp_x = 80.0; // bar 2 at 40 px/bar
        let bp_y = lane_rect.bottom() - 0.5 * lane_rect.height;

        let viewport = Viewport {
            width: 800.0,
            height: 600.0,
            ..Default::default()
        };
        match PickingEngine::pick(Point::new(bp_x, bp_y + 1.0), &scene, &snapshot, &viewport) {
            Pick::AutomationBreakpoint { point_id, .. } => assert_eq!(point_id, 5),
            other => panic!("expected breakpoint, got {:?}", other),
        }
        // outside the 7 px radius but inside the lane: segment
        match PickingEngine::pick(
            Point::new(bp_x + 20.0, bp_y, ),
            &scene,
            &snapshot,
            &viewport,
        ) {
            Pick::AutomationSegment { lane } => {
                assert_eq!(lane.target_path, "track/volume");
            }
            other => panic!("expected segment, got {:?}", other),
        }
        // below the lane entirely
        let below = Point::new(bp_x, lane_rect.bottom() + 10.0);
        match PickingEngine::pick(below, &scene, &snapshot, &viewport) {
            Pick::AutomationBreakpoint { .. } => panic!("breakpoint should not reach this far"),
            _ => {}
        }
    }

    #[test]
    fn ruler_and_sections_pinned() {
        let mut snapshot = one_container_snapshot();
        snapshot.show_headers = true;
        snapshot.sections.push(crate::model::SectionState {
            id: 9,
            name: "A".to_string(),
            start_bar: 1.0,
            length_bars: 4.0,
            color: None,
        });
        assert_eq!(pick_at(50.0, 10.0, &snapshot), Pick::Ruler);
        match pick_at(50.0, RULER_HEIGHT + 5.0, &snapshot) {
            Pick::Section { section_id } => assert_eq!(section_id, 9),
            other => panic!("expected section, got {:?}", other),
        }
        // past the section's extent the row falls back to ruler
        assert_eq!(pick_at(400.0, RULER_HEIGHT + 5.0, &snapshot), Pick::Ruler);
    }

    #[test]
    fn pick_ids_stable_and_nonzero() {
        let a = Pick::ContainerZone {
            track_id: 1,
            container_id: 10,
            zone: ContainerZone::Move,
        };
        let b = Pick::ContainerZone {
            track_id: 1,
            container_id: 10,
            zone: ContainerZone::Move,
        };
        let c = Pick::ContainerZone {
            track_id: 1,
            container_id: 10,
            zone: ContainerZone::Selector,
        };
        assert_eq!(a.id(), b.id());
        assert_ne!(a.id(), c.id());
        assert_ne!(a.id(), Pick::NONE_ID);
        assert_eq!(Pick::None.id(), Pick::NONE_ID);
    }

    #[test]
    fn narrow_note_has_no_edge_zone() {
        let narrow = Rect::new(0.0, 0.0, 2.0, 6.0);
        assert_eq!(note_zone(narrow, Point::new(0.5, 3.0)), NoteZone::Move);
        let wide = Rect::new(0.0, 0.0, 60.0, 6.0);
        assert_eq!(note_zone(wide, Point::new(1.0, 3.0)), NoteZone::ResizeLeft);
        assert_eq!(
            note_zone(wide, Point::new(59.0, 3.0)),
            NoteZone::ResizeRight
        );
        assert_eq!(note_zone(wide, Point::new(30.0, 3.0)), NoteZone::Move);
    }
}
