//! Pointer-driven interaction state machine. Consumes picks and pointer
//! deltas, emits `GridCommand`s on release. Exactly one state is active at a
//! time and every pointer-up (or cancel) returns to `Idle`.

use crate::constants::{
    INLINE_LANE_HANDLE_PX, MAX_INLINE_LANE_HEIGHT, MIN_CONTAINER_BARS, MIN_CREATE_SPAN_BARS,
    MIN_DRAG_PX, MIN_INLINE_LANE_HEIGHT, MIN_NOTE_BEATS, SHAPE_SAMPLE_STEPS,
};
use crate::geometry::Point;
use crate::messages::{CommandSink, GridCommand};
use crate::model::{BarRange, FadeCurve, FadeSpec, LaneRef, LaneScope, LaneUnit, MidiNote, Snapshot};
use crate::picking::{ContainerZone, NoteZone, Pick, PickingEngine};
use crate::scene::{Scene, Viewport};
use crate::time_utils::{BarConverter, quantize_to_grid};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Modifiers {
    /// Bypass grid snapping for fine movement.
    pub fine: bool,
    /// Drag a copy instead of the original.
    pub duplicate: bool,
    /// Add to the selection instead of replacing it.
    pub additive: bool,
    /// Force container creation on track background even with headers shown.
    pub create: bool,
    /// Scroll gesture shifts the inline lane's pitch range.
    pub pitch_pan: bool,
    /// Scroll gesture resizes the inline lane row height.
    pub row_height: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FadeSide {
    Enter,
    Exit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShapeTool {
    Line,
    Exponential,
    SCurve,
    Sine,
    Triangle,
    Square,
}

#[derive(Debug, Clone, PartialEq)]
pub enum InteractionState {
    Idle,
    ScrubbingRuler,
    SelectingRange {
        anchor_bar: f64,
        current_bar: f64,
    },
    DraggingContainer {
        container_id: u64,
        origin_track: u64,
        origin_start_bar: f64,
        grab_offset_bars: f64,
        cloning: bool,
        current_start_bar: f64,
        current_track: u64,
    },
    ResizingContainerLeft {
        container_id: u64,
        origin_start_bar: f64,
        origin_length_bars: f64,
        current_start_bar: f64,
    },
    ResizingContainerRight {
        container_id: u64,
        origin_start_bar: f64,
        origin_length_bars: f64,
        current_length_bars: f64,
    },
    TrimmingContainerLeft {
        container_id: u64,
        origin_start_bar: f64,
        origin_length_bars: f64,
        origin_offset_bars: f64,
        current_delta_bars: f64,
    },
    TrimmingContainerRight {
        container_id: u64,
        origin_length_bars: f64,
        origin_offset_bars: f64,
        audio_duration_bars: Option<f64>,
        current_length_bars: f64,
    },
    AdjustingFade {
        container_id: u64,
        side: FadeSide,
        origin: Option<FadeSpec>,
        container_length_bars: f64,
        current_duration_bars: f64,
    },
    CreatingContainer {
        track_id: u64,
        anchor_bar: f64,
        current_bar: f64,
    },
    ResizingInlineLane {
        track_id: u64,
        origin_height: f32,
    },
    DraggingMidiNote {
        container_id: u64,
        origin: MidiNote,
        zone: NoteZone,
        current: MidiNote,
    },
    CreatingMidiNote {
        container_id: u64,
        pitch: u8,
        anchor_beat: f64,
        current_beat: f64,
    },
    DraggingBreakpoint {
        lane: LaneRef,
        point_id: u64,
        origin_position_bars: f64,
        origin_value: f32,
        extent_bars: f64,
        current_position_bars: f64,
        current_value: f32,
    },
    PendingBreakpointAdd {
        lane: LaneRef,
    },
    DrawingShape {
        lane: LaneRef,
        tool: ShapeTool,
        anchor_bar: f64,
        anchor_value: f32,
        current_bar: f64,
        current_value: f32,
    },
}

pub struct InteractionController {
    state: InteractionState,
    shape_tool: Option<ShapeTool>,
    down_pos: Point,
}

impl Default for InteractionController {
    fn default() -> Self {
        Self::new()
    }
}

impl InteractionController {
    pub fn new() -> Self {
        Self {
            state: InteractionState::Idle,
            shape_tool: None,
            down_pos: Point::ZERO,
        }
    }

    pub fn state(&self) -> &InteractionState {
        &self.state
    }

    pub fn is_idle(&self) -> bool {
        self.state == InteractionState::Idle
    }

    pub fn set_shape_tool(&mut self, tool: Option<ShapeTool>) {
        self.shape_tool = tool;
    }

    /// Discard any in-progress drag without emitting a commit. Used on
    /// window/focus loss.
    pub fn cancel(&mut self) {
        if !self.is_idle() {
            log::debug!("interaction cancelled");
        }
        self.state = InteractionState::Idle;
    }

    fn effective_grid(snapshot: &Snapshot, mods: Modifiers) -> f64 {
        if snapshot.snap_enabled && !mods.fine {
            snapshot.grid_snap_bars
        } else {
            0.0
        }
    }

    fn converter(snapshot: &Snapshot) -> BarConverter {
        BarConverter::new(
            snapshot.pixels_per_bar,
            snapshot.time_signature.beats_per_bar,
        )
    }

    fn bar_at(pos: Point, snapshot: &Snapshot, viewport: &Viewport) -> f64 {
        Self::converter(snapshot).x_to_bar(pos.x + viewport.scroll_x)
    }

    pub fn pointer_down(
        &mut self,
        pos: Point,
        mods: Modifiers,
        scene: &Scene,
        snapshot: &Snapshot,
        viewport: &Viewport,
        sink: &dyn CommandSink,
    ) {
        // A stray down while a drag is somehow live discards the old drag.
        self.state = InteractionState::Idle;
        self.down_pos = pos;

        let pick = PickingEngine::pick(pos, scene, snapshot, viewport);
        match pick {
            Pick::None => {}
            Pick::Ruler => {
                if snapshot.show_headers {
                    self.state = InteractionState::ScrubbingRuler;
                    let bar = Self::bar_at(pos, snapshot, viewport).max(1.0);
                    sink.send(GridCommand::SetPlayhead(quantize_to_grid(
                        bar,
                        Self::effective_grid(snapshot, mods),
                    )));
                }
            }
            Pick::Section { section_id } => {
                sink.send(GridCommand::SelectSection(section_id));
            }
            Pick::TrackBackground { track_id } => {
                self.begin_track_background(pos, mods, track_id, scene, snapshot, viewport, sink);
            }
            Pick::ContainerZone {
                track_id,
                container_id,
                zone,
            } => {
                self.begin_container_zone(
                    pos, mods, track_id, container_id, zone, scene, snapshot, viewport,
                );
            }
            Pick::AutomationBreakpoint { lane, point_id } => {
                self.begin_breakpoint_drag(lane, point_id, snapshot);
            }
            Pick::AutomationSegment { lane } => {
                let bar = quantize_to_grid(
                    Self::bar_at(pos, snapshot, viewport),
                    Self::effective_grid(snapshot, mods),
                );
                if let Some(tool) = self.shape_tool {
                    let value =
                        Self::lane_value_at(pos, &lane, scene, viewport).unwrap_or(0.5);
                    self.state = InteractionState::DrawingShape {
                        lane,
                        tool,
                        anchor_bar: bar,
                        anchor_value: value,
                        current_bar: bar,
                        current_value: value,
                    };
                } else {
                    self.state = InteractionState::PendingBreakpointAdd { lane };
                }
            }
            Pick::MidiNote {
                container_id,
                note_id,
                zone,
                ..
            } => {
                // Resolved notes live in the scene's container layout.
                if let Some(layout) = scene.container(container_id) {
                    if let Some(note) = layout
                        .notes
                        .as_ref()
                        .and_then(|notes| notes.iter().find(|n| n.id == note_id))
                    {
                        self.state = InteractionState::DraggingMidiNote {
                            container_id,
                            origin: *note,
                            zone,
                            current: *note,
                        };
                    }
                }
            }
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn begin_track_background(
        &mut self,
        pos: Point,
        mods: Modifiers,
        track_id: u64,
        scene: &Scene,
        snapshot: &Snapshot,
        viewport: &Viewport,
        sink: &dyn CommandSink,
    ) {
        let bar = Self::bar_at(pos, snapshot, viewport);
        let grid = Self::effective_grid(snapshot, mods);
        let content = Point::new(pos.x + viewport.scroll_x, pos.y + viewport.scroll_y);

        // Inline lane interactions take precedence over range/create.
        if let Some(layout) = scene.track(track_id) {
            if let Some(inline) = &layout.inline_lane {
                if inline.rect.contains(content) {
                    if content.y >= inline.rect.bottom() - INLINE_LANE_HANDLE_PX {
                        self.state = InteractionState::ResizingInlineLane {
                            track_id,
                            origin_height: inline.rect.height,
                        };
                        return;
                    }
                    // New note in whichever container spans this bar.
                    if let Some(track) = snapshot.track(track_id) {
                        if let Some(container) = track
                            .containers
                            .iter()
                            .find(|c| bar >= c.start_bar && bar < c.end_bar())
                        {
                            let rows = (inline.high_pitch - inline.low_pitch) as f32 + 1.0;
                            let row_h = inline.rect.height / rows;
                            let row = ((inline.rect.bottom() - content.y) / row_h)
                                .floor()
                                .clamp(0.0, rows - 1.0);
                            let pitch = inline.low_pitch + row as u8;
                            let conv = Self::converter(snapshot);
                            let beat = conv.bars_to_beats(
                                quantize_to_grid(bar - container.start_bar, grid).max(0.0),
                            );
                            self.state = InteractionState::CreatingMidiNote {
                                container_id: container.id,
                                pitch,
                                anchor_beat: beat,
                                current_beat: beat,
                            };
                            sink.send(GridCommand::PreviewPitchOn { track_id, pitch });
                        }
                    }
                    return;
                }
            }
        }

        let anchor = quantize_to_grid(bar, grid);
        if !snapshot.show_headers || mods.create {
            self.state = InteractionState::CreatingContainer {
                track_id,
                anchor_bar: anchor,
                current_bar: anchor,
            };
        } else {
            self.state = InteractionState::SelectingRange {
                anchor_bar: anchor,
                current_bar: anchor,
            };
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn begin_container_zone(
        &mut self,
        pos: Point,
        mods: Modifiers,
        track_id: u64,
        container_id: u64,
        zone: ContainerZone,
        scene: &Scene,
        snapshot: &Snapshot,
        viewport: &Viewport,
    ) {
        // Stale pick: the container left the snapshot since the scene was
        // built. Stay idle.
        let Some((_, container)) = snapshot.container(container_id) else {
            return;
        };
        let bar = Self::bar_at(pos, snapshot, viewport);

        self.state = match zone {
            ContainerZone::Selector | ContainerZone::Move => InteractionState::DraggingContainer {
                container_id,
                origin_track: track_id,
                origin_start_bar: container.start_bar,
                grab_offset_bars: bar - container.start_bar,
                cloning: mods.duplicate,
                current_start_bar: container.start_bar,
                current_track: track_id,
            },
            ContainerZone::ResizeLeft => InteractionState::ResizingContainerLeft {
                container_id,
                origin_start_bar: container.start_bar,
                origin_length_bars: container.length_bars,
                current_start_bar: container.start_bar,
            },
            ContainerZone::ResizeRight => InteractionState::ResizingContainerRight {
                container_id,
                origin_start_bar: container.start_bar,
                origin_length_bars: container.length_bars,
                current_length_bars: container.length_bars,
            },
            ContainerZone::TrimLeft => InteractionState::TrimmingContainerLeft {
                container_id,
                origin_start_bar: container.start_bar,
                origin_length_bars: container.length_bars,
                origin_offset_bars: container.audio_offset_bars,
                current_delta_bars: 0.0,
            },
            ContainerZone::TrimRight => InteractionState::TrimmingContainerRight {
                container_id,
                origin_length_bars: container.length_bars,
                origin_offset_bars: container.audio_offset_bars,
                audio_duration_bars: scene
                    .container(container_id)
                    .and_then(|c| c.audio_duration_bars),
                current_length_bars: container.length_bars,
            },
            ContainerZone::FadeLeft => InteractionState::AdjustingFade {
                container_id,
                side: FadeSide::Enter,
                origin: container.fade_in,
                container_length_bars: container.length_bars,
                current_duration_bars: container.fade_in.map_or(0.0, |f| f.duration_bars),
            },
            ContainerZone::FadeRight => InteractionState::AdjustingFade {
                container_id,
                side: FadeSide::Exit,
                origin: container.fade_out,
                container_length_bars: container.length_bars,
                current_duration_bars: container.fade_out.map_or(0.0, |f| f.duration_bars),
            },
        };
    }

    fn begin_breakpoint_drag(&mut self, lane: LaneRef, point_id: u64, snapshot: &Snapshot) {
        let Some(track) = snapshot.track(lane.track_id) else {
            return;
        };
        let Some(state) = track.lane(lane.scope, &lane.target_path) else {
            return;
        };
        let Some(point) = state.points.iter().find(|p| p.id == point_id) else {
            return;
        };
        let extent = match lane.scope {
            LaneScope::Track => snapshot.total_bars as f64,
            LaneScope::Container(id) => match track.container(id) {
                Some(c) => c.length_bars,
                None => return,
            },
        };
        self.state = InteractionState::DraggingBreakpoint {
            lane,
            point_id,
            origin_position_bars: point.position_bars,
            origin_value: point.value,
            extent_bars: extent,
            current_position_bars: point.position_bars,
            current_value: point.value,
        };
    }

    fn lane_value_at(
        pos: Point,
        lane: &LaneRef,
        scene: &Scene,
        viewport: &Viewport,
    ) -> Option<f32> {
        let layout = scene.track(lane.track_id)?;
        let lane_layout = layout
            .lanes
            .iter()
            .find(|l| l.target_path == lane.target_path)?;
        let content_y = pos.y + viewport.scroll_y;
        let v = (lane_layout.rect.bottom() - content_y) / lane_layout.rect.height;
        Some(v.clamp(0.0, 1.0))
    }

    fn lane_owner_start(lane: &LaneRef, snapshot: &Snapshot) -> f64 {
        match lane.scope {
            LaneScope::Track => 1.0,
            LaneScope::Container(id) => {
                snapshot.container(id).map_or(1.0, |(_, c)| c.start_bar)
            }
        }
    }

    fn lane_height(lane: &LaneRef, scene: &Scene) -> f32 {
        scene
            .track(lane.track_id)
            .and_then(|t| {
                t.lanes
                    .iter()
                    .find(|l| l.target_path == lane.target_path)
                    .map(|l| l.rect.height)
            })
            .unwrap_or(crate::constants::AUTOMATION_LANE_HEIGHT)
    }

    pub fn pointer_drag(
        &mut self,
        pos: Point,
        mods: Modifiers,
        scene: &Scene,
        snapshot: &Snapshot,
        viewport: &Viewport,
        sink: &dyn CommandSink,
    ) {
        let grid = Self::effective_grid(snapshot, mods);
        let bar = Self::bar_at(pos, snapshot, viewport);
        let conv = Self::converter(snapshot);
        let down_pos = self.down_pos;

        match &mut self.state {
            InteractionState::Idle | InteractionState::PendingBreakpointAdd { .. } => {}
            InteractionState::ScrubbingRuler => {
                sink.send(GridCommand::SetPlayhead(quantize_to_grid(
                    bar.max(1.0),
                    grid,
                )));
            }
            InteractionState::SelectingRange { current_bar, .. } => {
                *current_bar = quantize_to_grid(bar, grid);
            }
            InteractionState::DraggingContainer {
                origin_start_bar,
                grab_offset_bars,
                current_start_bar,
                current_track,
                ..
            } => {
                let target = bar - *grab_offset_bars;
                let delta = quantize_to_grid(target - *origin_start_bar, grid);
                *current_start_bar = (*origin_start_bar + delta).max(1.0);
                let content_y = pos.y + viewport.scroll_y;
                if let Some(t) = scene
                    .tracks
                    .iter()
                    .find(|t| content_y >= t.y && content_y < t.y + t.height)
                {
                    *current_track = t.track_id;
                }
            }
            InteractionState::ResizingContainerLeft {
                origin_start_bar,
                origin_length_bars,
                current_start_bar,
                ..
            } => {
                let end = *origin_start_bar + *origin_length_bars;
                let snapped = quantize_to_grid(bar, grid);
                *current_start_bar = snapped.clamp(1.0, end - MIN_CONTAINER_BARS);
            }
            InteractionState::ResizingContainerRight {
                origin_start_bar,
                current_length_bars,
                ..
            } => {
                let snapped = quantize_to_grid(bar, grid);
                *current_length_bars = (snapped - *origin_start_bar).max(MIN_CONTAINER_BARS);
            }
            InteractionState::TrimmingContainerLeft {
                origin_offset_bars,
                origin_length_bars,
                origin_start_bar,
                current_delta_bars,
                ..
            } => {
                let raw = quantize_to_grid(bar - *origin_start_bar, grid);
                // Trim cannot move past the start of the source audio or eat
                // the whole container.
                *current_delta_bars =
                    raw.clamp(-*origin_offset_bars, *origin_length_bars - MIN_CONTAINER_BARS);
            }
            InteractionState::TrimmingContainerRight {
                origin_length_bars,
                origin_offset_bars,
                audio_duration_bars,
                current_length_bars,
                ..
            } => {
                let delta = conv.px_to_bars(pos.x - down_pos.x);
                let mut len =
                    quantize_to_grid(*origin_length_bars + delta, grid).max(MIN_CONTAINER_BARS);
                if let Some(audio) = *audio_duration_bars {
                    len = len.min((audio - *origin_offset_bars).max(MIN_CONTAINER_BARS));
                }
                *current_length_bars = len;
            }
            InteractionState::AdjustingFade {
                side,
                origin,
                container_length_bars,
                current_duration_bars,
                ..
            } => {
                let delta = conv.px_to_bars(pos.x - down_pos.x);
                let signed = match side {
                    FadeSide::Enter => delta,
                    FadeSide::Exit => -delta,
                };
                let base = origin.map_or(0.0, |f| f.duration_bars);
                *current_duration_bars = (base + signed).clamp(0.0, *container_length_bars);
            }
            InteractionState::CreatingContainer { current_bar, .. } => {
                *current_bar = quantize_to_grid(bar, grid);
            }
            InteractionState::ResizingInlineLane {
                track_id,
                origin_height,
            } => {
                let new_height = (*origin_height + (pos.y - down_pos.y))
                    .clamp(MIN_INLINE_LANE_HEIGHT, MAX_INLINE_LANE_HEIGHT);
                sink.send(GridCommand::SetInlineLaneHeight {
                    track_id: *track_id,
                    height: new_height,
                });
            }
            InteractionState::DraggingMidiNote {
                container_id,
                origin,
                zone,
                current,
            } => {
                let delta_bars = quantize_to_grid(conv.px_to_bars(pos.x - down_pos.x), grid);
                let delta_beats = conv.bars_to_beats(delta_bars);
                match zone {
                    NoteZone::Move => {
                        current.start_beat = (origin.start_beat + delta_beats).max(0.0);
                        if let Some(inline) = scene
                            .tracks
                            .iter()
                            .find(|t| {
                                t.containers.iter().any(|c| c.container_id == *container_id)
                            })
                            .and_then(|t| t.inline_lane.as_ref())
                        {
                            let rows = (inline.high_pitch - inline.low_pitch) as f32 + 1.0;
                            let row_h = inline.rect.height / rows;
                            let d_rows = ((down_pos.y - pos.y) / row_h).round() as i32;
                            let pitch = origin.pitch as i32 + d_rows;
                            current.pitch = pitch.clamp(0, 127) as u8;
                        }
                    }
                    NoteZone::ResizeLeft => {
                        let new_start = (origin.start_beat + delta_beats)
                            .min(origin.start_beat + origin.duration_beats - MIN_NOTE_BEATS)
                            .max(0.0);
                        current.start_beat = new_start;
                        current.duration_beats =
                            origin.start_beat + origin.duration_beats - new_start;
                    }
                    NoteZone::ResizeRight => {
                        current.duration_beats =
                            (origin.duration_beats + delta_beats).max(MIN_NOTE_BEATS);
                    }
                }
            }
            InteractionState::CreatingMidiNote {
                container_id,
                current_beat,
                ..
            } => {
                if let Some((_, container)) = snapshot.container(*container_id) {
                    let rel = quantize_to_grid(bar - container.start_bar, grid).max(0.0);
                    *current_beat = conv.bars_to_beats(rel);
                }
            }
            InteractionState::DraggingBreakpoint {
                lane,
                origin_value,
                extent_bars,
                current_position_bars,
                current_value,
                ..
            } => {
                let owner_start = match lane.scope {
                    LaneScope::Track => 1.0,
                    LaneScope::Container(id) => {
                        snapshot.container(id).map_or(1.0, |(_, c)| c.start_bar)
                    }
                };
                let rel = quantize_to_grid(bar - owner_start, grid);
                *current_position_bars = rel.clamp(0.0, *extent_bars);
                // value axis is inverted: dragging up raises the value
                let lane_height = Self::lane_height(lane, scene).max(1.0);
                let dv = (down_pos.y - pos.y) / lane_height;
                *current_value = (*origin_value + dv).clamp(0.0, 1.0);
            }
            InteractionState::DrawingShape {
                lane,
                current_bar,
                current_value,
                ..
            } => {
                *current_bar = quantize_to_grid(bar, grid);
                if let Some(v) = Self::lane_value_at(pos, lane, scene, viewport) {
                    *current_value = v;
                }
            }
        }
    }

    pub fn pointer_up(
        &mut self,
        pos: Point,
        mods: Modifiers,
        scene: &Scene,
        snapshot: &Snapshot,
        viewport: &Viewport,
        sink: &dyn CommandSink,
    ) {
        let moved = pos.distance(self.down_pos) > MIN_DRAG_PX;
        let grid = Self::effective_grid(snapshot, mods);
        let bar = Self::bar_at(pos, snapshot, viewport);

        let state = std::mem::replace(&mut self.state, InteractionState::Idle);
        match state {
            InteractionState::Idle => {}
            InteractionState::ScrubbingRuler => {
                sink.send(GridCommand::SetPlayhead(quantize_to_grid(
                    bar.max(1.0),
                    grid,
                )));
            }
            InteractionState::SelectingRange {
                anchor_bar,
                current_bar,
            } => {
                let range = BarRange {
                    start_bar: anchor_bar,
                    end_bar: current_bar,
                }
                .normalized();
                if moved && range.span() > 0.0 {
                    sink.send(GridCommand::SelectRange(range));
                } else {
                    sink.send(GridCommand::ClearRangeSelection);
                }
            }
            InteractionState::DraggingContainer {
                container_id,
                current_start_bar,
                current_track,
                cloning,
                ..
            } => {
                if moved {
                    if cloning {
                        sink.send(GridCommand::CloneContainer {
                            id: container_id,
                            track_id: current_track,
                            new_start_bar: current_start_bar,
                        });
                    } else {
                        sink.send(GridCommand::MoveContainer {
                            id: container_id,
                            track_id: current_track,
                            new_start_bar: current_start_bar,
                        });
                    }
                } else {
                    sink.send(GridCommand::SelectContainer {
                        id: container_id,
                        additive: mods.additive,
                    });
                }
            }
            InteractionState::ResizingContainerLeft {
                container_id,
                origin_start_bar,
                origin_length_bars,
                current_start_bar,
            } => {
                if moved {
                    let end = origin_start_bar + origin_length_bars;
                    sink.send(GridCommand::ResizeContainerLeft {
                        id: container_id,
                        new_start_bar: current_start_bar,
                        new_length_bars: (end - current_start_bar).max(MIN_CONTAINER_BARS),
                    });
                } else {
                    sink.send(GridCommand::SelectContainer {
                        id: container_id,
                        additive: mods.additive,
                    });
                }
            }
            InteractionState::ResizingContainerRight {
                container_id,
                current_length_bars,
                ..
            } => {
                if moved {
                    sink.send(GridCommand::ResizeContainerRight {
                        id: container_id,
                        new_length_bars: current_length_bars.max(MIN_CONTAINER_BARS),
                    });
                } else {
                    sink.send(GridCommand::SelectContainer {
                        id: container_id,
                        additive: mods.additive,
                    });
                }
            }
            InteractionState::TrimmingContainerLeft {
                container_id,
                origin_start_bar,
                origin_length_bars,
                origin_offset_bars,
                current_delta_bars,
            } => {
                if moved {
                    sink.send(GridCommand::TrimContainerLeft {
                        id: container_id,
                        new_start_bar: origin_start_bar + current_delta_bars,
                        new_length_bars: origin_length_bars - current_delta_bars,
                        new_offset_bars: origin_offset_bars + current_delta_bars,
                    });
                } else {
                    sink.send(GridCommand::SelectContainer {
                        id: container_id,
                        additive: mods.additive,
                    });
                }
            }
            InteractionState::TrimmingContainerRight {
                container_id,
                current_length_bars,
                ..
            } => {
                if moved {
                    sink.send(GridCommand::TrimContainerRight {
                        id: container_id,
                        new_length_bars: current_length_bars,
                    });
                } else {
                    sink.send(GridCommand::SelectContainer {
                        id: container_id,
                        additive: mods.additive,
                    });
                }
            }
            InteractionState::AdjustingFade {
                container_id,
                side,
                origin,
                current_duration_bars,
                ..
            } => {
                if moved {
                    let fade = if current_duration_bars > 1e-6 {
                        Some(FadeSpec {
                            duration_bars: current_duration_bars,
                            curve: origin.map_or(FadeCurve::Linear, |f| f.curve),
                        })
                    } else {
                        None
                    };
                    match side {
                        FadeSide::Enter => {
                            sink.send(GridCommand::SetEnterFade {
                                id: container_id,
                                fade,
                            });
                        }
                        FadeSide::Exit => {
                            sink.send(GridCommand::SetExitFade {
                                id: container_id,
                                fade,
                            });
                        }
                    }
                } else {
                    sink.send(GridCommand::SelectContainer {
                        id: container_id,
                        additive: mods.additive,
                    });
                }
            }
            InteractionState::CreatingContainer {
                track_id,
                anchor_bar,
                current_bar,
            } => {
                let range = BarRange {
                    start_bar: anchor_bar,
                    end_bar: current_bar,
                }
                .normalized();
                if moved && range.span() >= MIN_CREATE_SPAN_BARS {
                    sink.send(GridCommand::CreateContainer {
                        track_id,
                        start_bar: quantize_to_grid(range.start_bar, grid).max(1.0),
                        length_bars: range.span().max(MIN_CONTAINER_BARS),
                    });
                }
            }
            InteractionState::ResizingInlineLane { .. } => {
                // height already streamed during the drag
            }
            InteractionState::DraggingMidiNote {
                container_id,
                origin,
                current,
                ..
            } => {
                if moved && current != origin {
                    sink.send(GridCommand::UpdateMidiNote {
                        container_id,
                        note: current,
                    });
                }
            }
            InteractionState::CreatingMidiNote {
                container_id,
                pitch,
                anchor_beat,
                current_beat,
            } => {
                if let Some((track, _)) = snapshot.container(container_id) {
                    sink.send(GridCommand::PreviewPitchOff { track_id: track.id });
                }
                let (start, end) = if current_beat >= anchor_beat {
                    (anchor_beat, current_beat)
                } else {
                    (current_beat, anchor_beat)
                };
                sink.send(GridCommand::AddMidiNote {
                    container_id,
                    note: MidiNote {
                        id: 0, // sink assigns the real id
                        pitch,
                        velocity: 100,
                        start_beat: start,
                        duration_beats: (end - start).max(MIN_NOTE_BEATS),
                    },
                });
            }
            InteractionState::DraggingBreakpoint {
                lane,
                point_id,
                current_position_bars,
                current_value,
                ..
            } => {
                if moved {
                    sink.send(GridCommand::UpdateBreakpoint {
                        lane,
                        point_id,
                        position_bars: current_position_bars,
                        value: current_value,
                    });
                }
            }
            InteractionState::PendingBreakpointAdd { lane } => {
                let owner_start = Self::lane_owner_start(&lane, snapshot);
                let rel = (quantize_to_grid(bar, grid) - owner_start).max(0.0);
                let value =
                    Self::lane_value_at(pos, &lane, scene, viewport).unwrap_or(0.5);
                sink.send(GridCommand::AddBreakpoint {
                    lane,
                    position_bars: rel,
                    value,
                });
            }
            InteractionState::DrawingShape {
                lane,
                tool,
                anchor_bar,
                anchor_value,
                current_bar,
                current_value,
            } => {
                if moved && (current_bar - anchor_bar).abs() > 1e-9 {
                    let owner_start = Self::lane_owner_start(&lane, snapshot);
                    let (b0, v0, b1, v1) = if current_bar >= anchor_bar {
                        (anchor_bar, anchor_value, current_bar, current_value)
                    } else {
                        (current_bar, current_value, anchor_bar, anchor_value)
                    };
                    let points =
                        generate_shape(tool, b0 - owner_start, v0, b1 - owner_start, v1);
                    sink.send(GridCommand::ReplaceBreakpointRange {
                        lane,
                        start_bar: b0 - owner_start,
                        end_bar: b1 - owner_start,
                        points,
                    });
                }
            }
        }
    }

    /// Scroll gestures over an inline MIDI lane pan the pitch range or
    /// resize the lane instead of scrolling the canvas. Returns true when
    /// the event was consumed.
    pub fn scroll(
        &mut self,
        pos: Point,
        delta_y: f32,
        mods: Modifiers,
        scene: &Scene,
        viewport: &Viewport,
        sink: &dyn CommandSink,
    ) -> bool {
        if !self.is_idle() {
            return false;
        }
        let content = Point::new(pos.x + viewport.scroll_x, pos.y + viewport.scroll_y);
        for layout in &scene.tracks {
            let Some(inline) = &layout.inline_lane else {
                continue;
            };
            if !inline.rect.contains(content) {
                continue;
            }
            if mods.pitch_pan {
                let step = if delta_y > 0.0 { 1 } else { -1 };
                sink.send(GridCommand::ShiftInlinePitchRange {
                    track_id: layout.track_id,
                    delta_semitones: step,
                });
                return true;
            }
            if mods.row_height {
                let height = (inline.rect.height + delta_y)
                    .clamp(MIN_INLINE_LANE_HEIGHT, MAX_INLINE_LANE_HEIGHT);
                sink.send(GridCommand::SetInlineLaneHeight {
                    track_id: layout.track_id,
                    height,
                });
                return true;
            }
            return false;
        }
        false
    }

    /// Pinch over an inline lane resizes the lane; elsewhere the host zooms
    /// the canvas.
    pub fn magnify(
        &mut self,
        pos: Point,
        delta: f32,
        scene: &Scene,
        viewport: &Viewport,
        sink: &dyn CommandSink,
    ) -> bool {
        if !self.is_idle() {
            return false;
        }
        let content = Point::new(pos.x + viewport.scroll_x, pos.y + viewport.scroll_y);
        for layout in &scene.tracks {
            let Some(inline) = &layout.inline_lane else {
                continue;
            };
            if inline.rect.contains(content) {
                let height = (inline.rect.height * (1.0 + delta))
                    .clamp(MIN_INLINE_LANE_HEIGHT, MAX_INLINE_LANE_HEIGHT);
                sink.send(GridCommand::SetInlineLaneHeight {
                    track_id: layout.track_id,
                    height,
                });
                return true;
            }
        }
        false
    }
}

/// Sample an automation shape across a span. Positions are relative to the
/// lane owner, values normalized. Periodic shapes run one cycle per bar.
pub fn generate_shape(
    tool: ShapeTool,
    start_bar: f64,
    start_value: f32,
    end_bar: f64,
    end_value: f32,
) -> Vec<(f64, f32)> {
    let span = end_bar - start_bar;
    if span <= 0.0 {
        return vec![(start_bar, start_value)];
    }
    match tool {
        ShapeTool::Line => vec![(start_bar, start_value), (end_bar, end_value)],
        ShapeTool::Exponential | ShapeTool::SCurve => (0..=SHAPE_SAMPLE_STEPS)
            .map(|i| {
                let t = i as f64 / SHAPE_SAMPLE_STEPS as f64;
                let eased = match tool {
                    ShapeTool::Exponential => t * t * t,
                    _ => t * t * (3.0 - 2.0 * t), // smoothstep
                };
                (
                    start_bar + t * span,
                    start_value + (end_value - start_value) * eased as f32,
                )
            })
            .collect(),
        ShapeTool::Sine | ShapeTool::Triangle | ShapeTool::Square => (0..=SHAPE_SAMPLE_STEPS)
            .map(|i| {
                let t = i as f64 / SHAPE_SAMPLE_STEPS as f64;
                let lo = start_value.min(end_value);
                let hi = start_value.max(end_value);
                let phase = (start_bar + t * span).rem_euclid(1.0);
                let norm = match tool {
                    ShapeTool::Sine => 0.5 + 0.5 * (phase * std::f64::consts::TAU).sin(),
                    ShapeTool::Triangle => 1.0 - (2.0 * phase - 1.0).abs(),
                    _ => {
                        if phase < 0.5 {
                            1.0
                        } else {
                            0.0
                        }
                    }
                };
                (start_bar + t * span, lo + (hi - lo) * norm as f32)
            })
            .collect(),
    }
}

/// Absolute or relative (`+`/`-` prefixed) numeric entry for the external
/// breakpoint editor, mapped through the lane's display transform.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BreakpointEntry {
    Absolute(f64),
    Relative(f64),
}

impl BreakpointEntry {
    pub fn parse(text: &str) -> Option<Self> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return None;
        }
        if let Some(rest) = trimmed.strip_prefix('+') {
            return rest.trim().parse().ok().map(BreakpointEntry::Relative);
        }
        if let Some(rest) = trimmed.strip_prefix('-') {
            return rest
                .trim()
                .parse::<f64>()
                .ok()
                .map(|v| BreakpointEntry::Relative(-v));
        }
        trimmed.parse().ok().map(BreakpointEntry::Absolute)
    }
}

/// Maps normalized 0..=1 values to display units and back. Frequency-like
/// parameters use a logarithmic mapping.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DisplayTransform {
    pub unit: LaneUnit,
    pub min: f64,
    pub max: f64,
}

impl DisplayTransform {
    pub fn to_display(&self, normalized: f32) -> f64 {
        let v = normalized.clamp(0.0, 1.0) as f64;
        match self.unit {
            LaneUnit::Linear => self.min + v * (self.max - self.min),
            LaneUnit::Frequency => {
                let min = self.min.max(1e-6);
                min * (self.max / min).powf(v)
            }
        }
    }

    pub fn from_display(&self, display: f64) -> f32 {
        match self.unit {
            LaneUnit::Linear => {
                if (self.max - self.min).abs() < 1e-12 {
                    0.0
                } else {
                    (((display - self.min) / (self.max - self.min)).clamp(0.0, 1.0)) as f32
                }
            }
            LaneUnit::Frequency => {
                let min = self.min.max(1e-6);
                let clamped = display.clamp(min, self.max);
                ((clamped / min).ln() / (self.max / min).ln()) as f32
            }
        }
    }

    /// Apply a parsed entry to the current normalized value.
    pub fn apply(&self, current: f32, entry: BreakpointEntry) -> f32 {
        let display = match entry {
            BreakpointEntry::Absolute(v) => v,
            BreakpointEntry::Relative(dv) => self.to_display(current) + dv,
        };
        self.from_display(display)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::messages::test_support::RecordingSink;
    use crate::model::{ContainerState, Snapshot, TrackState};
    use crate::providers::EmptyProvider;
    use crate::scene::SceneBuilder;

    fn snapshot() -> Snapshot {
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
            grid_snap_bars: 1.0,
            ..Default::default()
        }
    }

    fn viewport() -> Viewport {
        Viewport {
            width: 800.0,
            height: 600.0,
            ..Default::default()
        }
    }

    fn drive(
        controller: &mut InteractionController,
        snapshot: &Snapshot,
        down: Point,
        up: Point,
        mods: Modifiers,
    ) -> Vec<GridCommand> {
        let scene = SceneBuilder::build(snapshot, &EmptyProvider, &EmptyProvider);
        let sink = RecordingSink::default();
        let vp = viewport();
        controller.pointer_down(down, mods, &scene, snapshot, &vp, &sink);
        controller.pointer_drag(up, mods, &scene, snapshot, &vp, &sink);
        controller.pointer_up(up, mods, &scene, snapshot, &vp, &sink);
        assert!(controller.is_idle());
        sink.take()
    }

    #[test]
    fn resize_right_commits_snapped_length() {
        // container x=0..160 at 40 px/bar; grab the right edge in the middle
        // third and pull one bar to the right
        let snapshot = snapshot();
        let mut controller = InteractionController::new();
        let sent = drive(
            &mut controller,
            &snapshot,
            Point::new(155.0, 40.0),
            Point::new(195.0, 40.0),
            Modifiers::default(),
        );
        assert_eq!(
            sent,
            vec![GridCommand::ResizeContainerRight {
                id: 10,
                new_length_bars: 5.0
            }]
        );
    }

    #[test]
    fn move_round_trips_through_grid_snap() {
        let snapshot = snapshot();
        let mut controller = InteractionController::new();
        // grab the move band (middle third, center) and drag 2 bars right
        let sent = drive(
            &mut controller,
            &snapshot,
            Point::new(80.0, 40.0),
            Point::new(160.0, 40.0),
            Modifiers::default(),
        );
        assert_eq!(
            sent,
            vec![GridCommand::MoveContainer {
                id: 10,
                track_id: 1,
                new_start_bar: 3.0
            }]
        );
    }

    #[test]
    fn duplicate_modifier_clones() {
        let snapshot = snapshot();
        let mut controller = InteractionController::new();
        let sent = drive(
            &mut controller,
            &snapshot,
            Point::new(80.0, 40.0),
            Point::new(160.0, 40.0),
            Modifiers {
                duplicate: true,
                ..Default::default()
            },
        );
        match &sent[0] {
            GridCommand::CloneContainer { id, new_start_bar, .. } => {
                assert_eq!(*id, 10);
                assert_eq!(*new_start_bar, 3.0);
            }
            other => panic!("expected clone, got {:?}", other),
        }
    }

    #[test]
    fn sub_threshold_drag_is_a_selection_click() {
        let snapshot = snapshot();
        let mut controller = InteractionController::new();
        let sent = drive(
            &mut controller,
            &snapshot,
            Point::new(80.0, 40.0),
            Point::new(81.0, 40.0),
            Modifiers::default(),
        );
        assert_eq!(
            sent,
            vec![GridCommand::SelectContainer {
                id: 10,
                additive: false
            }]
        );
    }

    #[test]
    fn resize_clamps_to_minimum_length() {
        let snapshot = snapshot();
        let mut controller = InteractionController::new();
        // drag the right edge far to the left, past the container start
        let sent = drive(
            &mut controller,
            &snapshot,
            Point::new(155.0, 40.0),
            Point::new(-200.0, 40.0),
            Modifiers::default(),
        );
        match &sent[0] {
            GridCommand::ResizeContainerRight {
                new_length_bars, ..
            } => {
                assert_eq!(*new_length_bars, MIN_CONTAINER_BARS);
            }
            other => panic!("expected resize, got {:?}", other),
        }
    }

    #[test]
    fn trim_left_cannot_cross_audio_start() {
        let mut snapshot = snapshot();
        snapshot.tracks[0].containers[0].audio_offset_bars = 1.0;
        let mut controller = InteractionController::new();
        // trim band is the bottom third; drag far left
        let sent = drive(
            &mut controller,
            &snapshot,
            Point::new(5.0, 75.0),
            Point::new(-400.0, 75.0),
            Modifiers::default(),
        );
        match &sent[0] {
            GridCommand::TrimContainerLeft {
                new_start_bar,
                new_offset_bars,
                new_length_bars,
                ..
            } => {
                // delta clamps at -origin_offset (= -1 bar)
                assert_eq!(*new_start_bar, 0.0);
                assert_eq!(*new_offset_bars, 0.0);
                assert_eq!(*new_length_bars, 5.0);
            }
            other => panic!("expected trim, got {:?}", other),
        }
    }

    #[test]
    fn create_container_requires_minimum_span() {
        let snapshot = snapshot();
        let mut controller = InteractionController::new();
        // below the track: nothing. inside track, right of the container:
        // headers are hidden so background starts container creation
        let sent = drive(
            &mut controller,
            &snapshot,
            Point::new(300.0, 40.0),
            Point::new(302.0, 40.0),
            Modifiers::default(),
        );
        assert!(sent.is_empty());

        let sent = drive(
            &mut controller,
            &snapshot,
            Point::new(300.0, 40.0),
            Point::new(420.0, 40.0),
            Modifiers::default(),
        );
        match &sent[0] {
            GridCommand::CreateContainer {
                track_id,
                start_bar,
                length_bars,
            } => {
                assert_eq!(*track_id, 1);
                assert_eq!(*start_bar, 9.0);
                assert_eq!(*length_bars, 3.0);
            }
            other => panic!("expected create, got {:?}", other),
        }
    }

    #[test]
    fn cancel_discards_without_commit() {
        let snapshot = snapshot();
        let scene = SceneBuilder::build(&snapshot, &EmptyProvider, &EmptyProvider);
        let sink = RecordingSink::default();
        let vp = viewport();
        let mut controller = InteractionController::new();
        controller.pointer_down(
            Point::new(80.0, 40.0),
            Modifiers::default(),
            &scene,
            &snapshot,
            &vp,
            &sink,
        );
        controller.pointer_drag(
            Point::new(200.0, 40.0),
            Modifiers::default(),
            &scene,
            &snapshot,
            &vp,
            &sink,
        );
        controller.cancel();
        assert!(controller.is_idle());
        assert!(sink.take().is_empty());
    }

    #[test]
    fn stale_container_pick_noops() {
        let snapshot = snapshot();
        let scene = SceneBuilder::build(&snapshot, &EmptyProvider, &EmptyProvider);
        // the container disappears before the pointer goes down
        let mut gone = snapshot.clone();
        gone.tracks[0].containers.clear();
        let sink = RecordingSink::default();
        let vp = viewport();
        let mut controller = InteractionController::new();
        controller.pointer_down(
            Point::new(80.0, 40.0),
            Modifiers::default(),
            &scene,
            &gone,
            &vp,
            &sink,
        );
        assert!(controller.is_idle());
        assert!(sink.take().is_empty());
    }

    #[test]
    fn shape_draw_replaces_range() {
        let mut snapshot = snapshot();
        snapshot.tracks[0]
            .automation
            .push(crate::model::AutomationLaneState::new(
                crate::model::AutomationTarget::TrackVolume,
            ));
        snapshot.expanded_automation.insert(1);
        let scene = SceneBuilder::build(&snapshot, &EmptyProvider, &EmptyProvider);
        let lane_rect = scene.tracks[0].lanes[0].rect;

        let sink = RecordingSink::default();
        let vp = viewport();
        let mut controller = InteractionController::new();
        controller.set_shape_tool(Some(ShapeTool::Line));
        let y = lane_rect.y + lane_rect.height * 0.5;
        controller.pointer_down(
            Point::new(40.0, y),
            Modifiers::default(),
            &scene,
            &snapshot,
            &vp,
            &sink,
        );
        controller.pointer_drag(
            Point::new(160.0, y),
            Modifiers::default(),
            &scene,
            &snapshot,
            &vp,
            &sink,
        );
        controller.pointer_up(
            Point::new(160.0, y),
            Modifiers::default(),
            &scene,
            &snapshot,
            &vp,
            &sink,
        );
        let sent = sink.take();
        match &sent[0] {
            GridCommand::ReplaceBreakpointRange {
                start_bar,
                end_bar,
                points,
                ..
            } => {
                assert_eq!(*start_bar, 1.0);
                assert_eq!(*end_bar, 4.0);
                assert_eq!(points.len(), 2);
            }
            other => panic!("expected range replace, got {:?}", other),
        }
    }

    #[test]
    fn inline_lane_click_creates_note_with_preview() {
        let mut snapshot = snapshot();
        snapshot.tracks.push(crate::model::TrackState {
            id: 2,
            kind: crate::model::TrackKind::Midi,
            containers: vec![ContainerState {
                id: 20,
                kind: crate::model::ContainerKind::Midi,
                start_bar: 1.0,
                length_bars: 4.0,
                ..Default::default()
            }],
            ..Default::default()
        });
        snapshot
            .inline_lanes
            .insert(2, crate::model::InlineLaneConfig::default());

        // second track starts at y=80; its inline lane spans y 160..256
        let scene = SceneBuilder::build(&snapshot, &EmptyProvider, &EmptyProvider);
        let inline = scene.tracks[1].inline_lane.clone().unwrap();
        let rows = (inline.high_pitch - inline.low_pitch) as f32 + 1.0;
        let row_h = inline.rect.height / rows;
        // aim for pitch 60 (12 rows above the low pitch of 48)
        let y = inline.rect.bottom() - 12.5 * row_h;

        let sink = RecordingSink::default();
        let vp = viewport();
        let mods = Modifiers::default();
        let mut controller = InteractionController::new();
        controller.pointer_down(Point::new(40.0, y), mods, &scene, &snapshot, &vp, &sink);
        controller.pointer_drag(Point::new(80.0, y), mods, &scene, &snapshot, &vp, &sink);
        controller.pointer_up(Point::new(80.0, y), mods, &scene, &snapshot, &vp, &sink);

        let sent = sink.take();
        assert_eq!(
            sent[0],
            GridCommand::PreviewPitchOn {
                track_id: 2,
                pitch: 60
            }
        );
        assert_eq!(sent[1], GridCommand::PreviewPitchOff { track_id: 2 });
        match &sent[2] {
            GridCommand::AddMidiNote { container_id, note } => {
                assert_eq!(*container_id, 20);
                assert_eq!(note.pitch, 60);
                assert_eq!(note.start_beat, 4.0);
                assert_eq!(note.duration_beats, 4.0);
            }
            other => panic!("expected note add, got {:?}", other),
        }
    }

    #[test]
    fn inline_lane_bottom_edge_resizes() {
        let mut snapshot = snapshot();
        snapshot.tracks.push(crate::model::TrackState {
            id: 2,
            kind: crate::model::TrackKind::Midi,
            ..Default::default()
        });
        snapshot
            .inline_lanes
            .insert(2, crate::model::InlineLaneConfig::default());

        let scene = SceneBuilder::build(&snapshot, &EmptyProvider, &EmptyProvider);
        let inline = scene.tracks[1].inline_lane.clone().unwrap();
        let y = inline.rect.bottom() - 4.0;

        let sink = RecordingSink::default();
        let vp = viewport();
        let mods = Modifiers::default();
        let mut controller = InteractionController::new();
        controller.pointer_down(Point::new(300.0, y), mods, &scene, &snapshot, &vp, &sink);
        assert!(matches!(
            controller.state(),
            InteractionState::ResizingInlineLane { track_id: 2, .. }
        ));
        controller.pointer_drag(Point::new(300.0, y + 40.0), mods, &scene, &snapshot, &vp, &sink);
        let sent = sink.take();
        match &sent[0] {
            GridCommand::SetInlineLaneHeight { track_id, height } => {
                assert_eq!(*track_id, 2);
                assert_eq!(*height, inline.rect.height + 40.0);
            }
            other => panic!("expected lane height, got {:?}", other),
        }
    }

    #[test]
    fn breakpoint_entry_parsing() {
        assert_eq!(
            BreakpointEntry::parse("440"),
            Some(BreakpointEntry::Absolute(440.0))
        );
        assert_eq!(
            BreakpointEntry::parse("+12"),
            Some(BreakpointEntry::Relative(12.0))
        );
        assert_eq!(
            BreakpointEntry::parse("-0.5"),
            Some(BreakpointEntry::Relative(-0.5))
        );
        assert_eq!(BreakpointEntry::parse(""), None);
        assert_eq!(BreakpointEntry::parse("abc"), None);
    }

    #[test]
    fn frequency_transform_round_trips() {
        let t = DisplayTransform {
            unit: LaneUnit::Frequency,
            min: 20.0,
            max: 20000.0,
        };
        let display = t.to_display(0.5);
        // geometric midpoint of 20..20000
        assert!((display - (20.0f64 * 20000.0).sqrt()).abs() < 1.0);
        let back = t.from_display(display);
        assert!((back - 0.5).abs() < 1e-4);

        let linear = DisplayTransform {
            unit: LaneUnit::Linear,
            min: 0.0,
            max: 10.0,
        };
        assert_eq!(linear.apply(0.5, BreakpointEntry::Relative(2.5)), 0.75);
        assert_eq!(linear.apply(0.2, BreakpointEntry::Absolute(10.0)), 1.0);
    }

    #[test]
    fn shape_samples_are_monotonic_in_position() {
        for tool in [
            ShapeTool::Line,
            ShapeTool::Exponential,
            ShapeTool::SCurve,
            ShapeTool::Sine,
            ShapeTool::Triangle,
            ShapeTool::Square,
        ] {
            let pts = generate_shape(tool, 0.0, 0.0, 4.0, 1.0);
            assert!(pts.len() >= 2);
            for pair in pts.windows(2) {
                assert!(pair[1].0 >= pair[0].0);
            }
            for (_, v) in &pts {
                assert!((0.0..=1.0).contains(v));
            }
        }
    }
}
