use crate::geometry::Rgba;

// Header Rows
pub const RULER_HEIGHT: f32 = 28.0;
pub const SECTION_ROW_HEIGHT: f32 = 22.0;

// Track Layout
pub const DEFAULT_TRACK_HEIGHT: f32 = 80.0;
pub const MIN_TRACK_HEIGHT: f32 = 40.0;
pub const MAX_TRACK_HEIGHT: f32 = 240.0;
pub const AUTOMATION_TOOLBAR_HEIGHT: f32 = 18.0;
pub const AUTOMATION_LANE_HEIGHT: f32 = 30.0;
pub const DEFAULT_INLINE_LANE_HEIGHT: f32 = 96.0;
pub const MIN_INLINE_LANE_HEIGHT: f32 = 48.0;
pub const MAX_INLINE_LANE_HEIGHT: f32 = 320.0;
pub const CONTENT_BOTTOM_PADDING: f32 = 64.0;

// Zoom
pub const DEFAULT_PIXELS_PER_BAR: f32 = 40.0;
pub const MIN_PIXELS_PER_BAR: f32 = 8.0;
pub const MAX_PIXELS_PER_BAR: f32 = 640.0;
pub const ZOOM_FACTOR: f32 = 1.25;

// Interaction Thresholds
pub const CONTAINER_EDGE_PX: f32 = 12.0;
pub const BREAKPOINT_HIT_RADIUS: f32 = 7.0;
pub const NOTE_GRAB_INSET: f32 = 2.0;
pub const NOTE_MIN_EDGE_WIDTH: f32 = 3.0;
pub const NOTE_MAX_EDGE_WIDTH: f32 = 8.0;
pub const INLINE_LANE_HANDLE_PX: f32 = 10.0;
pub const MIN_DRAG_PX: f32 = 3.0;
pub const MIN_CONTAINER_BARS: f64 = 0.25;
pub const MIN_CREATE_SPAN_BARS: f64 = 0.25;
pub const MIN_NOTE_BEATS: f64 = 0.125;

// In-container automation occupies the bottom band of the clip rect when
// lanes are collapsed.
pub const CONTAINER_AUTOMATION_BAND: f32 = 0.25;

// Rendering
pub const CULL_MARGIN_BARS: f64 = 2.0;
pub const FADE_CURVE_STEPS: usize = 24;
pub const SHAPE_SAMPLE_STEPS: usize = 32;
pub const WAVEFORM_PIXELS_PER_PEAK: f32 = 2.0;
pub const CURVE_SMOOTH_MAX_POINTS: usize = 24;
pub const CORNER_RADIUS: f32 = 4.0;
pub const GUIDE_LINE_COUNT: usize = 4;

// Colors
pub const COLOR_CANVAS_BG: Rgba = Rgba::gray(0.08);
pub const COLOR_RULER_BG: Rgba = Rgba::gray(0.09);
pub const COLOR_SECTION_ROW_BG: Rgba = Rgba::gray(0.11);
pub const COLOR_TRACK_BG_EVEN: Rgba = Rgba::gray(0.10);
pub const COLOR_TRACK_BG_ODD: Rgba = Rgba::gray(0.12);
pub const COLOR_GRID_BAR: Rgba = Rgba::gray(0.27);
pub const COLOR_GRID_BEAT: Rgba = Rgba::gray(0.16);
pub const COLOR_PLAYHEAD: Rgba = Rgba::new(1.0, 0.39, 0.39, 1.0);
pub const COLOR_CURSOR: Rgba = Rgba::new(1.0, 1.0, 1.0, 0.4);
pub const COLOR_CONTAINER_DEFAULT: Rgba = Rgba::from_rgb8(100, 150, 200);
pub const COLOR_CONTAINER_BORDER: Rgba = Rgba::gray(0.05);
pub const COLOR_SELECTION_BORDER: Rgba = Rgba::new(1.0, 1.0, 1.0, 0.9);
pub const COLOR_RANGE_SELECTION: Rgba = Rgba::new(0.39, 0.59, 1.0, 0.11);
pub const COLOR_SECTION_DEFAULT: Rgba = Rgba::from_rgb8(160, 120, 60);
pub const COLOR_WAVEFORM: Rgba = Rgba::new(0.85, 0.9, 0.95, 0.85);
pub const COLOR_NOTE: Rgba = Rgba::from_rgb8(220, 225, 235);
pub const COLOR_NOTE_ACCENT: Rgba = Rgba::new(1.0, 1.0, 1.0, 0.35);
pub const COLOR_FADE: Rgba = Rgba::new(0.0, 0.0, 0.0, 0.35);
pub const COLOR_AUTOMATION_LINE: Rgba = Rgba::from_rgb8(120, 170, 255);
pub const COLOR_AUTOMATION_SHADOW: Rgba = Rgba::new(0.0, 0.0, 0.0, 0.5);
pub const COLOR_AUTOMATION_GLOW: Rgba = Rgba::new(0.47, 0.67, 1.0, 0.22);
pub const COLOR_AUTOMATION_POINT: Rgba = Rgba::from_rgb8(150, 180, 255);
pub const COLOR_GUIDE_LINE: Rgba = Rgba::gray(0.18);
pub const COLOR_LANE_BG: Rgba = Rgba::gray(0.085);
pub const COLOR_TOOLBAR_BG: Rgba = Rgba::gray(0.13);
pub const COLOR_INLINE_LANE_BG: Rgba = Rgba::gray(0.07);
pub const COLOR_OVERLAY_DRAG: Rgba = Rgba::new(1.0, 1.0, 1.0, 0.25);

// Stroke Widths
pub const GRID_LINE_WIDTH: f32 = 1.0;
pub const BAR_LINE_WIDTH: f32 = 1.5;
pub const PLAYHEAD_WIDTH: f32 = 2.0;
pub const BORDER_WIDTH: f32 = 1.0;
pub const SELECTION_BORDER_WIDTH: f32 = 2.0;
pub const AUTOMATION_LINE_WIDTH: f32 = 1.5;
pub const AUTOMATION_GLOW_WIDTH: f32 = 4.5;
pub const AUTOMATION_SHADOW_OFFSET: f32 = 1.0;
pub const BREAKPOINT_HANDLE_SIZE: f32 = 8.0;
