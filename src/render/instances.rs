//! CPU-side instance layouts. Each struct is bit-exact with its WGSL
//! counterpart; any change here must be mirrored in the shaders.

use bytemuck::{Pod, Zeroable};

use crate::geometry::Rgba;

/// Filled (optionally rounded) rectangle. One pipeline serves sharp and
/// rounded rects; the corner is cut by a signed-distance function in the
/// fragment stage.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct RectInstance {
    pub origin: [f32; 2],
    pub size: [f32; 2],
    pub color: [f32; 4],
    pub corner_radius: f32,
}

impl RectInstance {
    pub fn new(rect: crate::geometry::Rect, color: Rgba, corner_radius: f32) -> Self {
        Self {
            origin: [rect.x, rect.y],
            size: [rect.width, rect.height],
            color: color.to_array(),
            corner_radius,
        }
    }
}

/// Line segment expanded to a screen-space quad via a perpendicular offset
/// in the vertex stage.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct LineInstance {
    pub start: [f32; 2],
    pub end: [f32; 2],
    pub color: [f32; 4],
    pub width: f32,
}

/// MIDI note quad. Same shape as `RectInstance` but drawn through its own
/// pipeline with the note palette.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct NoteInstance {
    pub origin: [f32; 2],
    pub size: [f32; 2],
    pub color: [f32; 4],
    pub corner_radius: f32,
}

/// Per-container waveform draw parameters. `peak_offset`/`peak_count` index
/// into the shared flat peak buffer (min/max pairs).
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct WaveformParams {
    pub origin: [f32; 2],
    pub size: [f32; 2],
    pub color: [f32; 4],
    pub peak_offset: u32,
    pub peak_count: u32,
    pub amplitude: f32,
}

/// Fade ribbon vertex: pre-expanded triangle-strip geometry.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct FadeVertex {
    pub position: [f32; 2],
    pub color: [f32; 4],
}

/// Per-frame uniforms shared by every pipeline.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct Globals {
    pub projection: [[f32; 4]; 4],
    pub pixels_per_bar: f32,
    pub canvas_height: f32,
    pub view_min_x: f32,
    pub view_max_x: f32,
}

/// Orthographic projection mapping canvas pixels (origin top-left, y down)
/// to clip space.
pub fn ortho_projection(width: f32, height: f32) -> [[f32; 4]; 4] {
    let w = width.max(1.0);
    let h = height.max(1.0);
    [
        [2.0 / w, 0.0, 0.0, 0.0],
        [0.0, -2.0 / h, 0.0, 0.0],
        [0.0, 0.0, 1.0, 0.0],
        [-1.0, 1.0, 0.0, 1.0],
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn instance_layouts_are_bit_exact() {
        // sizes are part of the GPU contract
        assert_eq!(std::mem::size_of::<RectInstance>(), 36);
        assert_eq!(std::mem::size_of::<LineInstance>(), 36);
        assert_eq!(std::mem::size_of::<NoteInstance>(), 36);
        assert_eq!(std::mem::size_of::<WaveformParams>(), 44);
        assert_eq!(std::mem::size_of::<FadeVertex>(), 24);
        assert_eq!(std::mem::size_of::<Globals>(), 80);
    }

    #[test]
    fn ortho_maps_corners() {
        let m = ortho_projection(800.0, 600.0);
        // (0,0) -> (-1, 1)
        let x = m[0][0] * 0.0 + m[3][0];
        let y = m[1][1] * 0.0 + m[3][1];
        assert_eq!((x, y), (-1.0, 1.0));
        // (800,600) -> (1, -1)
        let x = m[0][0] * 800.0 + m[3][0];
        let y = m[1][1] * 600.0 + m[3][1];
        assert_eq!((x, y), (1.0, -1.0));
    }
}
