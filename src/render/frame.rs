//! CPU-side instance building. Pure: turns (Scene, Snapshot, Viewport,
//! focus) into typed instance arrays the engine uploads verbatim. All
//! coordinates emitted here are view-space pixels; header rows are pinned
//! and ignore vertical scroll.

use smallvec::SmallVec;

use crate::constants::*;
use crate::geometry::{Point, Rect, Rgba};
use crate::interaction::InteractionState;
use crate::model::{AutomationPoint, FadeCurve, LaneRef, LaneScope, LaneUnit, Snapshot};
use crate::picking::{self, Pick};
use crate::providers::WaveformPeaks;
use crate::render::instances::{
    FadeVertex, LineInstance, NoteInstance, RectInstance, WaveformParams,
};
use crate::scene::{AutomationLaneLayout, ContainerLayout, InlineLaneLayout, Scene, TrackLayout, Viewport};
use crate::time_utils::BarConverter;

/// Hover/focus inputs that affect drawing but not layout.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FocusState {
    /// `Pick::id()` of the hovered object, 0 for none.
    pub hover_id: u64,
}

/// Geometry-derived buffers, rebuilt only when the host marks them dirty.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrameBuffers {
    /// Bar/beat grid, drawn first.
    pub bg_lines: Vec<LineInstance>,
    /// Backgrounds, container fills, sections, ruler chrome, in draw order.
    pub rects: Vec<RectInstance>,
    pub waveforms: Vec<WaveformParams>,
    /// Shared flat min/max pairs referenced by `waveforms`.
    pub peaks: Vec<f32>,
    pub notes: Vec<NoteInstance>,
    pub fade_vertices: Vec<FadeVertex>,
    /// Guide lines then automation strokes (shadow/glow/main).
    pub curve_lines: Vec<LineInstance>,
    /// Breakpoint handles, drawn over the curves.
    pub handle_rects: Vec<RectInstance>,
    /// Borders, selection, playhead, cursor, ruler ticks.
    pub fg_lines: Vec<LineInstance>,
}

/// Live-drag overlay, rebuilt every frame; intentionally tiny.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OverlayBuffers {
    pub rects: Vec<RectInstance>,
    pub notes: Vec<NoteInstance>,
    pub lines: Vec<LineInstance>,
}

/// Inclusive visible bar range with the cull margin applied.
pub fn visible_bar_range(snapshot: &Snapshot, viewport: &Viewport) -> (f64, f64) {
    let conv = BarConverter::new(
        snapshot.pixels_per_bar,
        snapshot.time_signature.beats_per_bar,
    );
    let min = conv.x_to_bar(viewport.visible_min_x()) - CULL_MARGIN_BARS;
    let max = conv.x_to_bar(viewport.visible_max_x()) + CULL_MARGIN_BARS;
    (min.max(1.0), max.min(snapshot.total_bars as f64 + 1.0))
}

/// Max-of-window reduction to at most one min/max pair per
/// `WAVEFORM_PIXELS_PER_PEAK` screen pixels.
pub fn downsample_peaks(peaks: &WaveformPeaks, width_px: f32) -> Vec<[f32; 2]> {
    let source_len = peaks.len();
    if source_len == 0 || width_px <= 0.0 {
        return Vec::new();
    }
    let target = ((width_px / WAVEFORM_PIXELS_PER_PEAK).ceil() as usize)
        .clamp(1, source_len);
    let mut out = Vec::with_capacity(target);
    for i in 0..target {
        let s0 = i * source_len / target;
        let s1 = (((i + 1) * source_len) / target).max(s0 + 1);
        let mut lo = f32::MAX;
        let mut hi = f32::MIN;
        for s in s0..s1 {
            lo = lo.min(peaks.min[s]);
            hi = hi.max(peaks.max[s]);
        }
        out.push([lo, hi]);
    }
    out
}

/// Fade gain at normalized position t in 0..=1.
pub fn fade_curve_value(curve: FadeCurve, t: f32) -> f32 {
    let t = t.clamp(0.0, 1.0);
    match curve {
        FadeCurve::Linear => t,
        FadeCurve::Exponential => t * t,
        FadeCurve::SCurve => t * t * (3.0 - 2.0 * t),
    }
}

/// Catmull-Rom interpolation over control points, 8 samples per span.
/// Returns the control points unchanged when there are fewer than 3.
pub fn catmull_rom_polyline(points: &[Point]) -> Vec<Point> {
    if points.len() < 3 {
        return points.to_vec();
    }
    const SAMPLES: usize = 8;
    let mut out = Vec::with_capacity((points.len() - 1) * SAMPLES + 1);
    out.push(points[0]);
    for i in 0..points.len() - 1 {
        let p0 = points[i.saturating_sub(1)];
        let p1 = points[i];
        let p2 = points[i + 1];
        let p3 = points[(i + 2).min(points.len() - 1)];
        for s in 1..=SAMPLES {
            let t = s as f32 / SAMPLES as f32;
            let t2 = t * t;
            let t3 = t2 * t;
            let x = 0.5
                * ((2.0 * p1.x)
                    + (-p0.x + p2.x) * t
                    + (2.0 * p0.x - 5.0 * p1.x + 4.0 * p2.x - p3.x) * t2
                    + (-p0.x + 3.0 * p1.x - 3.0 * p2.x + p3.x) * t3);
            let y = 0.5
                * ((2.0 * p1.y)
                    + (-p0.y + p2.y) * t
                    + (2.0 * p0.y - 5.0 * p1.y + 4.0 * p2.y - p3.y) * t2
                    + (-p0.y + 3.0 * p1.y - 3.0 * p2.y + p3.y) * t3);
            out.push(Point::new(x, y));
        }
    }
    out
}

/// Guide positions as fractions of the lane height from the bottom.
/// Frequency lanes use a 1-2-5 log ladder, linear lanes evenly spaced rows.
pub fn guide_fractions(unit: LaneUnit) -> SmallVec<[f32; 12]> {
    match unit {
        LaneUnit::Linear => (1..=GUIDE_LINE_COUNT)
            .map(|i| i as f32 / (GUIDE_LINE_COUNT + 1) as f32)
            .collect(),
        LaneUnit::Frequency => {
            // 20 Hz .. 20 kHz, lines at 1-2-5 steps per decade
            let min = 20.0f32;
            let max = 20_000.0f32;
            let span = (max / min).ln();
            let mut out = SmallVec::new();
            for decade in 0..3 {
                for mult in [1.0f32, 2.0, 5.0] {
                    let f = min * 10.0f32.powi(decade) * mult;
                    if f > min && f < max {
                        out.push((f / min).ln() / span);
                    }
                }
            }
            out
        }
    }
}

struct Ctx<'a> {
    snapshot: &'a Snapshot,
    viewport: &'a Viewport,
    conv: BarConverter,
    focus: FocusState,
}

impl Ctx<'_> {
    fn to_view(&self, r: Rect) -> Rect {
        Rect::new(
            r.x - self.viewport.scroll_x,
            r.y - self.viewport.scroll_y,
            r.width,
            r.height,
        )
    }

    fn to_view_pinned(&self, r: Rect) -> Rect {
        Rect::new(r.x - self.viewport.scroll_x, r.y, r.width, r.height)
    }

    fn container_color(&self, container_id: u64) -> Rgba {
        self.snapshot
            .container(container_id)
            .and_then(|(_, c)| c.color)
            .map(|(r, g, b)| Rgba::from_rgb8(r, g, b))
            .unwrap_or(COLOR_CONTAINER_DEFAULT)
    }

    fn track_visible(&self, layout: &TrackLayout, header_height: f32) -> bool {
        let top = layout.y - self.viewport.scroll_y;
        let bottom = top + layout.height;
        bottom >= header_height && top <= self.viewport.height
    }

    fn x_visible(&self, rect: Rect) -> bool {
        let margin = self.conv.bars_to_px(CULL_MARGIN_BARS);
        rect.intersects_x(
            self.viewport.visible_min_x() - margin,
            self.viewport.visible_max_x() + margin,
        )
    }
}

pub struct FrameBuilder;

impl FrameBuilder {
    pub fn build(
        scene: &Scene,
        snapshot: &Snapshot,
        viewport: &Viewport,
        focus: FocusState,
    ) -> FrameBuffers {
        let ctx = Ctx {
            snapshot,
            viewport,
            conv: BarConverter::new(
                snapshot.pixels_per_bar,
                snapshot.time_signature.beats_per_bar,
            ),
            focus,
        };
        let mut out = FrameBuffers::default();

        Self::build_grid(&ctx, scene, &mut out);
        for layout in &scene.tracks {
            if !ctx.track_visible(layout, scene.header_height) {
                continue;
            }
            Self::build_track(&ctx, scene, layout, &mut out);
        }
        Self::build_range_selection(&ctx, scene, &mut out);
        Self::build_header(&ctx, scene, &mut out);
        Self::build_markers(&ctx, scene, &mut out);
        out
    }

    fn build_grid(ctx: &Ctx, scene: &Scene, out: &mut FrameBuffers) {
        let (min_bar, max_bar) = visible_bar_range(ctx.snapshot, ctx.viewport);
        let top = scene.header_height;
        let bottom = (scene.content_height - ctx.viewport.scroll_y)
            .min(ctx.viewport.height);
        if bottom <= top {
            return;
        }

        let beats = ctx.snapshot.time_signature.beats_per_bar.max(1);
        let beat_px = ctx.snapshot.pixels_per_bar / beats as f32;
        let draw_beats = beat_px >= 10.0;

        let mut bar = min_bar.floor().max(1.0);
        while bar <= max_bar {
            let x = ctx.conv.bar_to_x(bar) - ctx.viewport.scroll_x;
            out.bg_lines.push(LineInstance {
                start: [x, top],
                end: [x, bottom],
                color: COLOR_GRID_BAR.to_array(),
                width: BAR_LINE_WIDTH,
            });
            if draw_beats {
                for beat in 1..beats {
                    let bx = x + beat as f32 * beat_px;
                    out.bg_lines.push(LineInstance {
                        start: [bx, top],
                        end: [bx, bottom],
                        color: COLOR_GRID_BEAT.to_array(),
                        width: GRID_LINE_WIDTH,
                    });
                }
            }
            bar += 1.0;
        }
    }

    fn build_track(ctx: &Ctx, scene: &Scene, layout: &TrackLayout, out: &mut FrameBuffers) {
        let index = scene
            .tracks
            .iter()
            .position(|t| t.track_id == layout.track_id)
            .unwrap_or(0);
        let bg = if index % 2 == 0 {
            COLOR_TRACK_BG_EVEN
        } else {
            COLOR_TRACK_BG_ODD
        };
        let clip_band = ctx.to_view(layout.clip_rect(scene.content_width));
        out.rects.push(RectInstance::new(clip_band, bg, 0.0));

        if layout.toolbar_height > 0.0 {
            let toolbar = ctx.to_view(Rect::new(
                0.0,
                layout.y + layout.clip_height,
                scene.content_width,
                layout.toolbar_height,
            ));
            out.rects.push(RectInstance::new(toolbar, COLOR_TOOLBAR_BG, 0.0));
        }

        for lane in &layout.lanes {
            Self::build_expanded_lane(ctx, lane, out);
        }

        if let Some(inline) = &layout.inline_lane {
            Self::build_inline_lane_background(ctx, inline, out);
        }

        for container in &layout.containers {
            if !ctx.x_visible(container.rect) {
                continue;
            }
            Self::build_container(ctx, layout, container, out);
        }
    }

    fn build_container(
        ctx: &Ctx,
        layout: &TrackLayout,
        container: &ContainerLayout,
        out: &mut FrameBuffers,
    ) {
        let view_rect = ctx.to_view(container.rect);
        let color = ctx.container_color(container.container_id);
        out.rects
            .push(RectInstance::new(view_rect, color.with_alpha(0.55), CORNER_RADIUS));

        if let Some(peaks) = &container.peaks {
            let reduced = downsample_peaks(peaks, view_rect.width);
            if !reduced.is_empty() {
                let offset = (out.peaks.len() / 2) as u32;
                for [lo, hi] in &reduced {
                    out.peaks.push(*lo);
                    out.peaks.push(*hi);
                }
                out.waveforms.push(WaveformParams {
                    origin: [view_rect.x, view_rect.y],
                    size: [view_rect.width, view_rect.height],
                    color: COLOR_WAVEFORM.to_array(),
                    peak_offset: offset,
                    peak_count: reduced.len() as u32,
                    amplitude: 0.8,
                });
            }
        }

        // Clip-body note preview, thin quads at pitch-proportional heights.
        if let Some(notes) = &container.notes {
            let body = view_rect.inset(2.0);
            for note in notes {
                let x = view_rect.x
                    + ctx
                        .conv
                        .bars_to_px(ctx.conv.beats_to_bars(note.start_beat));
                let w = ctx
                    .conv
                    .bars_to_px(ctx.conv.beats_to_bars(note.duration_beats))
                    .max(1.0);
                if x > view_rect.right() || x + w < view_rect.x {
                    continue;
                }
                let y = body.bottom() - (note.pitch as f32 / 127.0) * body.height;
                out.notes.push(NoteInstance {
                    origin: [x, y - 1.0],
                    size: [w.min(view_rect.right() - x), 2.0],
                    color: COLOR_NOTE_ACCENT.to_array(),
                    corner_radius: 0.0,
                });
            }
        }

        // Inline-lane note quads with an accent strip along the top.
        if let Some(inline) = &layout.inline_lane {
            if let Some(notes) = &container.notes {
                for note in notes {
                    let rect = picking::note_rect(note, container.rect.x, inline, &ctx.conv);
                    let view = ctx.to_view(rect).inset(0.5);
                    if view.width <= 0.0 {
                        continue;
                    }
                    out.notes.push(NoteInstance {
                        origin: [view.x, view.y],
                        size: [view.width, view.height],
                        color: COLOR_NOTE.to_array(),
                        corner_radius: 1.5,
                    });
                    if view.height > 4.0 {
                        out.notes.push(NoteInstance {
                            origin: [view.x, view.y],
                            size: [view.width, 1.5],
                            color: COLOR_NOTE_ACCENT.to_array(),
                            corner_radius: 0.0,
                        });
                    }
                }
            }
        }

        Self::build_fades(ctx, container, view_rect, out);

        // Collapsed-lane automation rides in the bottom band of the clip.
        if layout.lanes.is_empty() {
            if let Some((_, state)) = ctx.snapshot.container(container.container_id) {
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
                    Self::build_curve(
                        ctx,
                        band,
                        state.start_bar,
                        &lane_state.sorted_points(),
                        &lane_ref,
                        out,
                    );
                }
            }
        }

        let border_color = if container.selected {
            COLOR_SELECTION_BORDER
        } else {
            COLOR_CONTAINER_BORDER
        };
        let width = if container.selected {
            SELECTION_BORDER_WIDTH
        } else {
            BORDER_WIDTH
        };
        Self::outline(view_rect, border_color, width, &mut out.fg_lines);
    }

    fn build_fades(
        ctx: &Ctx,
        container: &ContainerLayout,
        view_rect: Rect,
        out: &mut FrameBuffers,
    ) {
        let mut emit = |duration_bars: f64, curve: FadeCurve, enter: bool| {
            let w = ctx.conv.bars_to_px(duration_bars);
            if w <= 0.0 {
                return;
            }
            let color = COLOR_FADE.to_array();
            let x0 = if enter {
                view_rect.x
            } else {
                view_rect.right() - w
            };
            // Degenerate join so every ribbon lives in one triangle strip.
            if !out.fade_vertices.is_empty() {
                let last = *out.fade_vertices.last().unwrap();
                out.fade_vertices.push(last);
                out.fade_vertices.push(FadeVertex {
                    position: [x0, view_rect.bottom()],
                    color,
                });
            }
            for step in 0..=FADE_CURVE_STEPS {
                let t = step as f32 / FADE_CURVE_STEPS as f32;
                let x = x0 + t * w;
                let gain = if enter {
                    fade_curve_value(curve, t)
                } else {
                    fade_curve_value(curve, 1.0 - t)
                };
                out.fade_vertices.push(FadeVertex {
                    position: [x, view_rect.bottom()],
                    color,
                });
                out.fade_vertices.push(FadeVertex {
                    position: [x, view_rect.bottom() - gain * view_rect.height],
                    color,
                });
            }
        };
        if let Some(fade) = container.fade_in {
            emit(fade.duration_bars, fade.curve, true);
        }
        if let Some(fade) = container.fade_out {
            emit(fade.duration_bars, fade.curve, false);
        }
    }

    fn build_expanded_lane(ctx: &Ctx, lane: &AutomationLaneLayout, out: &mut FrameBuffers) {
        let view = ctx.to_view(lane.rect);
        out.rects.push(RectInstance::new(view, COLOR_LANE_BG, 0.0));

        let Some(track) = ctx.snapshot.track(lane.track_id) else {
            return;
        };
        let Some(state) = track.lane(lane.scope, &lane.target_path) else {
            return;
        };

        for fraction in guide_fractions(state.target.unit()) {
            let y = view.bottom() - fraction * view.height;
            out.curve_lines.push(LineInstance {
                start: [view.x.max(0.0), y],
                end: [view.right().min(ctx.viewport.width), y],
                color: COLOR_GUIDE_LINE.to_array(),
                width: GRID_LINE_WIDTH,
            });
        }

        let owner_start = match lane.scope {
            LaneScope::Track => 1.0,
            LaneScope::Container(id) => {
                track.container(id).map_or(1.0, |c| c.start_bar)
            }
        };
        let lane_ref = LaneRef {
            track_id: lane.track_id,
            scope: lane.scope,
            target_path: lane.target_path.clone(),
        };
        Self::build_curve(
            ctx,
            lane.rect,
            owner_start,
            &state.sorted_points(),
            &lane_ref,
            out,
        );
    }

    /// Polyline with optional smoothing and the shadow/glow/main triple
    /// stroke, plus breakpoint handles. `rect` is in content space.
    fn build_curve(
        ctx: &Ctx,
        rect: Rect,
        owner_start_bar: f64,
        points: &[AutomationPoint],
        lane_ref: &LaneRef,
        out: &mut FrameBuffers,
    ) {
        if points.is_empty() {
            return;
        }
        let view = ctx.to_view(rect);
        let mut screen: Vec<Point> = points
            .iter()
            .map(|p| {
                let content = picking::breakpoint_pos(
                    rect,
                    owner_start_bar,
                    p.position_bars,
                    p.value,
                    &ctx.conv,
                );
                Point::new(content.x - ctx.viewport.scroll_x, content.y - ctx.viewport.scroll_y)
            })
            .collect();

        if screen.len() >= 2 {
            if screen.len() <= CURVE_SMOOTH_MAX_POINTS {
                screen = catmull_rom_polyline(&screen);
            }
            for p in &mut screen {
                p.y = p.y.clamp(view.y, view.bottom());
            }
            // shadow, then glow, then the line itself
            for (dy, color, width) in [
                (
                    AUTOMATION_SHADOW_OFFSET,
                    COLOR_AUTOMATION_SHADOW,
                    AUTOMATION_LINE_WIDTH,
                ),
                (0.0, COLOR_AUTOMATION_GLOW, AUTOMATION_GLOW_WIDTH),
                (0.0, COLOR_AUTOMATION_LINE, AUTOMATION_LINE_WIDTH),
            ] {
                for pair in screen.windows(2) {
                    if pair[0].x == pair[1].x && pair[0].y == pair[1].y {
                        continue;
                    }
                    out.curve_lines.push(LineInstance {
                        start: [pair[0].x, pair[0].y + dy],
                        end: [pair[1].x, pair[1].y + dy],
                        color: color.to_array(),
                        width,
                    });
                }
            }
        }

        for p in points {
            let content = picking::breakpoint_pos(
                rect,
                owner_start_bar,
                p.position_bars,
                p.value,
                &ctx.conv,
            );
            let pos = Point::new(
                content.x - ctx.viewport.scroll_x,
                content.y - ctx.viewport.scroll_y,
            );
            let hovered = ctx.focus.hover_id != 0
                && Pick::AutomationBreakpoint {
                    lane: lane_ref.clone(),
                    point_id: p.id,
                }
                .id()
                    == ctx.focus.hover_id;
            let color = if hovered {
                COLOR_AUTOMATION_POINT.lighten(0.2)
            } else {
                COLOR_AUTOMATION_POINT
            };
            let half = BREAKPOINT_HANDLE_SIZE / 2.0;
            out.handle_rects.push(RectInstance::new(
                Rect::new(pos.x - half, pos.y - half, BREAKPOINT_HANDLE_SIZE, BREAKPOINT_HANDLE_SIZE),
                color,
                half,
            ));
        }
    }

    fn build_inline_lane_background(
        ctx: &Ctx,
        inline: &InlineLaneLayout,
        out: &mut FrameBuffers,
    ) {
        let view = ctx.to_view(inline.rect);
        out.rects
            .push(RectInstance::new(view, COLOR_INLINE_LANE_BG, 0.0));

        // darker stripes for the black-key rows
        let rows = (inline.high_pitch - inline.low_pitch) as u32 + 1;
        let row_h = view.height / rows as f32;
        if row_h >= 3.0 {
            for row in 0..rows {
                let pitch = inline.low_pitch as u32 + row;
                if matches!(pitch % 12, 1 | 3 | 6 | 8 | 10) {
                    out.rects.push(RectInstance::new(
                        Rect::new(
                            view.x,
                            view.bottom() - (row + 1) as f32 * row_h,
                            view.width,
                            row_h,
                        ),
                        Rgba::gray(0.055),
                        0.0,
                    ));
                }
            }
        }
    }

    fn build_range_selection(ctx: &Ctx, scene: &Scene, out: &mut FrameBuffers) {
        let Some(range) = ctx.snapshot.selected_range else {
            return;
        };
        let range = range.normalized();
        let x0 = ctx.conv.bar_to_x(range.start_bar) - ctx.viewport.scroll_x;
        let x1 = ctx.conv.bar_to_x(range.end_bar) - ctx.viewport.scroll_x;
        let top = scene.header_height;
        let bottom = (scene.content_height - ctx.viewport.scroll_y)
            .min(ctx.viewport.height);
        if bottom > top {
            out.rects.push(RectInstance::new(
                Rect::new(x0, top, x1 - x0, bottom - top),
                COLOR_RANGE_SELECTION,
                0.0,
            ));
        }
    }

    fn build_header(ctx: &Ctx, scene: &Scene, out: &mut FrameBuffers) {
        if scene.header_height <= 0.0 {
            return;
        }
        out.rects.push(RectInstance::new(
            Rect::new(0.0, 0.0, ctx.viewport.width, RULER_HEIGHT),
            COLOR_RULER_BG,
            0.0,
        ));
        out.rects.push(RectInstance::new(
            Rect::new(0.0, RULER_HEIGHT, ctx.viewport.width, SECTION_ROW_HEIGHT),
            COLOR_SECTION_ROW_BG,
            0.0,
        ));

        for section in &scene.sections {
            if !ctx.x_visible(section.rect) {
                continue;
            }
            let view = ctx.to_view_pinned(section.rect);
            let color = ctx
                .snapshot
                .section(section.section_id)
                .and_then(|s| s.color)
                .map(|(r, g, b)| Rgba::from_rgb8(r, g, b))
                .unwrap_or(COLOR_SECTION_DEFAULT);
            out.rects
                .push(RectInstance::new(view.inset(1.0), color, 2.0));
            if section.selected {
                Self::outline(
                    view,
                    COLOR_SELECTION_BORDER,
                    SELECTION_BORDER_WIDTH,
                    &mut out.fg_lines,
                );
            }
        }

        // ruler ticks for visible bars
        let (min_bar, max_bar) = visible_bar_range(ctx.snapshot, ctx.viewport);
        let mut bar = min_bar.floor().max(1.0);
        while bar <= max_bar {
            let x = ctx.conv.bar_to_x(bar) - ctx.viewport.scroll_x;
            out.fg_lines.push(LineInstance {
                start: [x, RULER_HEIGHT * 0.5],
                end: [x, RULER_HEIGHT],
                color: COLOR_GRID_BAR.to_array(),
                width: GRID_LINE_WIDTH,
            });
            bar += 1.0;
        }
    }

    fn build_markers(ctx: &Ctx, scene: &Scene, out: &mut FrameBuffers) {
        let bottom = (scene.content_height - ctx.viewport.scroll_y)
            .min(ctx.viewport.height);

        if let Some(cursor) = ctx.snapshot.cursor_bar {
            let x = ctx.conv.bar_to_x(cursor) - ctx.viewport.scroll_x;
            out.fg_lines.push(LineInstance {
                start: [x, scene.header_height],
                end: [x, bottom],
                color: COLOR_CURSOR.to_array(),
                width: GRID_LINE_WIDTH,
            });
        }

        let x = ctx.conv.bar_to_x(ctx.snapshot.playhead_bar) - ctx.viewport.scroll_x;
        if x >= -PLAYHEAD_WIDTH && x <= ctx.viewport.width + PLAYHEAD_WIDTH {
            out.fg_lines.push(LineInstance {
                start: [x, 0.0],
                end: [x, bottom],
                color: COLOR_PLAYHEAD.to_array(),
                width: PLAYHEAD_WIDTH,
            });
        }
    }

    fn outline(rect: Rect, color: Rgba, width: f32, lines: &mut Vec<LineInstance>) {
        let c = color.to_array();
        let (l, t, r, b) = (rect.x, rect.y, rect.right(), rect.bottom());
        lines.push(LineInstance {
            start: [l, t],
            end: [r, t],
            color: c,
            width,
        });
        lines.push(LineInstance {
            start: [r, t],
            end: [r, b],
            color: c,
            width,
        });
        lines.push(LineInstance {
            start: [r, b],
            end: [l, b],
            color: c,
            width,
        });
        lines.push(LineInstance {
            start: [l, b],
            end: [l, t],
            color: c,
            width,
        });
    }

    /// Overlay for the live drag, rebuilt every frame. Shows the proposed
    /// result without touching the geometry buffers.
    pub fn build_overlay(
        scene: &Scene,
        snapshot: &Snapshot,
        viewport: &Viewport,
        state: &InteractionState,
    ) -> OverlayBuffers {
        let conv = BarConverter::new(
            snapshot.pixels_per_bar,
            snapshot.time_signature.beats_per_bar,
        );
        let ctx = Ctx {
            snapshot,
            viewport,
            conv,
            focus: FocusState::default(),
        };
        let mut out = OverlayBuffers::default();

        match state {
            InteractionState::DraggingContainer {
                container_id,
                current_start_bar,
                current_track,
                ..
            } => {
                if let (Some(container), Some(track)) =
                    (scene.container(*container_id), scene.track(*current_track))
                {
                    let rect = Rect::new(
                        ctx.conv.bar_to_x(*current_start_bar),
                        track.y,
                        container.rect.width,
                        track.clip_height,
                    );
                    out.rects.push(RectInstance::new(
                        ctx.to_view(rect),
                        COLOR_OVERLAY_DRAG,
                        CORNER_RADIUS,
                    ));
                }
            }
            InteractionState::ResizingContainerLeft {
                container_id,
                origin_start_bar,
                origin_length_bars,
                current_start_bar,
            } => {
                if let Some(container) = scene.container(*container_id) {
                    let end = origin_start_bar + origin_length_bars;
                    let rect = Rect::new(
                        ctx.conv.bar_to_x(*current_start_bar),
                        container.rect.y,
                        ctx.conv.bars_to_px(end - current_start_bar),
                        container.rect.height,
                    );
                    out.rects.push(RectInstance::new(
                        ctx.to_view(rect),
                        COLOR_OVERLAY_DRAG,
                        CORNER_RADIUS,
                    ));
                }
            }
            InteractionState::ResizingContainerRight {
                container_id,
                current_length_bars,
                ..
            }
            | InteractionState::TrimmingContainerRight {
                container_id,
                current_length_bars,
                ..
            } => {
                if let Some(container) = scene.container(*container_id) {
                    let rect = Rect::new(
                        container.rect.x,
                        container.rect.y,
                        ctx.conv.bars_to_px(*current_length_bars),
                        container.rect.height,
                    );
                    out.rects.push(RectInstance::new(
                        ctx.to_view(rect),
                        COLOR_OVERLAY_DRAG,
                        CORNER_RADIUS,
                    ));
                }
            }
            InteractionState::TrimmingContainerLeft {
                container_id,
                current_delta_bars,
                ..
            } => {
                if let Some(container) = scene.container(*container_id) {
                    let dx = ctx.conv.bars_to_px(*current_delta_bars);
                    let rect = Rect::new(
                        container.rect.x + dx,
                        container.rect.y,
                        container.rect.width - dx,
                        container.rect.height,
                    );
                    out.rects.push(RectInstance::new(
                        ctx.to_view(rect),
                        COLOR_OVERLAY_DRAG,
                        CORNER_RADIUS,
                    ));
                }
            }
            InteractionState::SelectingRange {
                anchor_bar,
                current_bar,
            } => {
                let x0 = ctx.conv.bar_to_x(anchor_bar.min(*current_bar));
                let x1 = ctx.conv.bar_to_x(anchor_bar.max(*current_bar));
                out.rects.push(RectInstance::new(
                    Rect::new(
                        x0 - viewport.scroll_x,
                        scene.header_height,
                        x1 - x0,
                        viewport.height - scene.header_height,
                    ),
                    COLOR_RANGE_SELECTION,
                    0.0,
                ));
            }
            InteractionState::CreatingContainer {
                track_id,
                anchor_bar,
                current_bar,
            } => {
                if let Some(track) = scene.track(*track_id) {
                    let x0 = ctx.conv.bar_to_x(anchor_bar.min(*current_bar));
                    let x1 = ctx.conv.bar_to_x(anchor_bar.max(*current_bar));
                    let rect = Rect::new(x0, track.y, x1 - x0, track.clip_height);
                    out.rects.push(RectInstance::new(
                        ctx.to_view(rect),
                        COLOR_OVERLAY_DRAG,
                        CORNER_RADIUS,
                    ));
                }
            }
            InteractionState::DraggingMidiNote {
                container_id,
                current,
                ..
            } => {
                if let (Some(container), Some(track)) = (
                    scene.container(*container_id),
                    scene
                        .tracks
                        .iter()
                        .find(|t| t.containers.iter().any(|c| c.container_id == *container_id)),
                ) {
                    if let Some(inline) = &track.inline_lane {
                        let rect =
                            picking::note_rect(current, container.rect.x, inline, &ctx.conv);
                        out.notes.push(NoteInstance {
                            origin: [
                                rect.x - viewport.scroll_x,
                                rect.y - viewport.scroll_y,
                            ],
                            size: [rect.width, rect.height],
                            color: COLOR_NOTE.with_alpha(0.6).to_array(),
                            corner_radius: 1.5,
                        });
                    }
                }
            }
            InteractionState::CreatingMidiNote {
                container_id,
                pitch,
                anchor_beat,
                current_beat,
            } => {
                if let (Some(container), Some(track)) = (
                    scene.container(*container_id),
                    scene
                        .tracks
                        .iter()
                        .find(|t| t.containers.iter().any(|c| c.container_id == *container_id)),
                ) {
                    if let Some(inline) = &track.inline_lane {
                        let note = crate::model::MidiNote {
                            id: 0,
                            pitch: *pitch,
                            velocity: 100,
                            start_beat: anchor_beat.min(*current_beat),
                            duration_beats: (current_beat - anchor_beat).abs().max(MIN_NOTE_BEATS),
                        };
                        let rect =
                            picking::note_rect(&note, container.rect.x, inline, &ctx.conv);
                        out.notes.push(NoteInstance {
                            origin: [
                                rect.x - viewport.scroll_x,
                                rect.y - viewport.scroll_y,
                            ],
                            size: [rect.width, rect.height],
                            color: COLOR_NOTE.with_alpha(0.6).to_array(),
                            corner_radius: 1.5,
                        });
                    }
                }
            }
            InteractionState::DraggingBreakpoint {
                lane,
                current_position_bars,
                current_value,
                ..
            } => {
                if let Some(track) = scene.track(lane.track_id) {
                    if let Some(lane_layout) = track
                        .lanes
                        .iter()
                        .find(|l| l.target_path == lane.target_path)
                    {
                        let owner_start = match lane.scope {
                            LaneScope::Track => 1.0,
                            LaneScope::Container(id) => snapshot
                                .container(id)
                                .map_or(1.0, |(_, c)| c.start_bar),
                        };
                        let pos = picking::breakpoint_pos(
                            lane_layout.rect,
                            owner_start,
                            *current_position_bars,
                            *current_value,
                            &ctx.conv,
                        );
                        let half = BREAKPOINT_HANDLE_SIZE / 2.0;
                        out.rects.push(RectInstance::new(
                            Rect::new(
                                pos.x - viewport.scroll_x - half,
                                pos.y - viewport.scroll_y - half,
                                BREAKPOINT_HANDLE_SIZE,
                                BREAKPOINT_HANDLE_SIZE,
                            ),
                            COLOR_AUTOMATION_POINT.lighten(0.25),
                            half,
                        ));
                    }
                }
            }
            InteractionState::DrawingShape {
                lane,
                tool,
                anchor_bar,
                anchor_value,
                current_bar,
                current_value,
            } => {
                if let Some(track) = scene.track(lane.track_id) {
                    if let Some(lane_layout) = track
                        .lanes
                        .iter()
                        .find(|l| l.target_path == lane.target_path)
                    {
                        let (b0, v0, b1, v1) = if current_bar >= anchor_bar {
                            (*anchor_bar, *anchor_value, *current_bar, *current_value)
                        } else {
                            (*current_bar, *current_value, *anchor_bar, *anchor_value)
                        };
                        let samples =
                            crate::interaction::generate_shape(*tool, b0, v0, b1, v1);
                        let view = ctx.to_view(lane_layout.rect);
                        let pts: Vec<Point> = samples
                            .iter()
                            .map(|(bar, v)| {
                                Point::new(
                                    ctx.conv.bar_to_x(*bar) - viewport.scroll_x,
                                    view.bottom() - v.clamp(0.0, 1.0) * view.height,
                                )
                            })
                            .collect();
                        for pair in pts.windows(2) {
                            out.lines.push(LineInstance {
                                start: [pair[0].x, pair[0].y],
                                end: [pair[1].x, pair[1].y],
                                color: COLOR_AUTOMATION_LINE.to_array(),
                                width: AUTOMATION_LINE_WIDTH,
                            });
                        }
                    }
                }
            }
            _ => {}
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ContainerState, FadeSpec, TrackState};
    use crate::providers::EmptyProvider;
    use crate::scene::SceneBuilder;

    fn snapshot() -> Snapshot {
        let container = ContainerState {
            id: 10,
            start_bar: 1.0,
            length_bars: 4.0,
            fade_in: Some(FadeSpec::linear(1.0)),
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
            total_bars: 64,
            show_headers: false,
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

    #[test]
    fn grid_only_covers_visible_bars() {
        let snapshot = snapshot();
        let vp = viewport();
        let (min_bar, max_bar) = visible_bar_range(&snapshot, &vp);
        assert_eq!(min_bar, 1.0);
        // 800 px / 40 px-per-bar = 20 bars on screen, +1 for origin, +2 cull
        assert_eq!(max_bar, 23.0);
    }

    #[test]
    fn offscreen_containers_are_culled() {
        let mut snapshot = snapshot();
        snapshot.tracks[0].containers.push(ContainerState {
            id: 11,
            start_bar: 200.0,
            length_bars: 4.0,
            ..Default::default()
        });
        snapshot.total_bars = 400;
        let scene = SceneBuilder::build(&snapshot, &EmptyProvider, &EmptyProvider);
        let frame = FrameBuilder::build(&scene, &snapshot, &viewport(), FocusState::default());
        // exactly one container fill (rounded rect) besides the track bg
        let rounded = frame
            .rects
            .iter()
            .filter(|r| r.corner_radius == CORNER_RADIUS)
            .count();
        assert_eq!(rounded, 1);
    }

    #[test]
    fn fade_ribbon_samples_fixed_steps() {
        let snapshot = snapshot();
        let scene = SceneBuilder::build(&snapshot, &EmptyProvider, &EmptyProvider);
        let frame = FrameBuilder::build(&scene, &snapshot, &viewport(), FocusState::default());
        // one fade: (steps + 1) pairs
        assert_eq!(frame.fade_vertices.len(), (FADE_CURVE_STEPS + 1) * 2);
        // linear fade-in rises from the bottom to the full clip height
        let first_top = frame.fade_vertices[1].position[1];
        let last_top = frame.fade_vertices[frame.fade_vertices.len() - 1].position[1];
        assert!(first_top > last_top);
    }

    #[test]
    fn waveform_downsample_caps_resolution() {
        let peaks = WaveformPeaks {
            min: vec![-1.0; 1000],
            max: vec![1.0; 1000],
        };
        let reduced = downsample_peaks(&peaks, 100.0);
        assert_eq!(reduced.len(), 50);
        assert_eq!(reduced[0], [-1.0, 1.0]);

        // narrow containers still get at least one pair
        let reduced = downsample_peaks(&peaks, 1.0);
        assert_eq!(reduced.len(), 1);

        // never upsample beyond the source
        let small = WaveformPeaks {
            min: vec![-0.5; 4],
            max: vec![0.5; 4],
        };
        assert_eq!(downsample_peaks(&small, 500.0).len(), 4);
    }

    #[test]
    fn downsample_reduces_by_window_extrema() {
        let peaks = WaveformPeaks {
            min: vec![-0.1, -0.9, -0.2, -0.3],
            max: vec![0.2, 0.1, 0.8, 0.4],
        };
        let reduced = downsample_peaks(&peaks, 4.0);
        assert_eq!(reduced.len(), 2);
        assert_eq!(reduced[0], [-0.9, 0.2]);
        assert_eq!(reduced[1], [-0.3, 0.8]);
    }

    #[test]
    fn catmull_rom_preserves_endpoints() {
        let pts = vec![
            Point::new(0.0, 0.0),
            Point::new(10.0, 5.0),
            Point::new(20.0, 0.0),
        ];
        let smooth = catmull_rom_polyline(&pts);
        assert!(smooth.len() > pts.len());
        assert_eq!(smooth[0], pts[0]);
        let last = smooth[smooth.len() - 1];
        assert!((last.x - 20.0).abs() < 1e-4);
        assert!((last.y - 0.0).abs() < 1e-4);
    }

    #[test]
    fn frequency_guides_are_log_spaced() {
        let guides = guide_fractions(LaneUnit::Frequency);
        assert!(!guides.is_empty());
        for g in &guides {
            assert!(*g > 0.0 && *g < 1.0);
        }
        // 200 Hz sits a decade above 20 Hz: a third of the 3-decade span
        let f200 = guides
            .iter()
            .find(|g| (**g - (10.0f32.ln() / 1000.0f32.ln())).abs() < 1e-3);
        assert!(f200.is_some());

        let linear = guide_fractions(LaneUnit::Linear);
        assert_eq!(linear.len(), GUIDE_LINE_COUNT);
    }

    #[test]
    fn overlay_tracks_dragged_container() {
        let snapshot = snapshot();
        let scene = SceneBuilder::build(&snapshot, &EmptyProvider, &EmptyProvider);
        let state = InteractionState::DraggingContainer {
            container_id: 10,
            origin_track: 1,
            origin_start_bar: 1.0,
            grab_offset_bars: 0.0,
            cloning: false,
            current_start_bar: 3.0,
            current_track: 1,
        };
        let overlay = FrameBuilder::build_overlay(&scene, &snapshot, &viewport(), &state);
        assert_eq!(overlay.rects.len(), 1);
        assert_eq!(overlay.rects[0].origin[0], 80.0);
        assert_eq!(overlay.rects[0].size[0], 160.0);

        let idle = FrameBuilder::build_overlay(
            &scene,
            &snapshot,
            &viewport(),
            &InteractionState::Idle,
        );
        assert!(idle.rects.is_empty() && idle.notes.is_empty() && idle.lines.is_empty());
    }
}
