/// Bar/beat <-> pixel conversion for the grid. Bars are 1-based: bar 1 sits
/// at x = 0.
pub struct BarConverter {
    pixels_per_bar: f32,
    beats_per_bar: u32,
}

impl BarConverter {
    pub fn new(pixels_per_bar: f32, beats_per_bar: u32) -> Self {
        Self {
            pixels_per_bar,
            beats_per_bar: beats_per_bar.max(1),
        }
    }

    #[inline]
    pub fn bar_to_x(&self, bar: f64) -> f32 {
        ((bar - 1.0) * self.pixels_per_bar as f64) as f32
    }

    #[inline]
    pub fn x_to_bar(&self, x: f32) -> f64 {
        x as f64 / self.pixels_per_bar as f64 + 1.0
    }

    #[inline]
    pub fn bars_to_px(&self, bars: f64) -> f32 {
        (bars * self.pixels_per_bar as f64) as f32
    }

    #[inline]
    pub fn px_to_bars(&self, px: f32) -> f64 {
        px as f64 / self.pixels_per_bar as f64
    }

    #[inline]
    pub fn beats_to_bars(&self, beats: f64) -> f64 {
        beats / self.beats_per_bar as f64
    }

    #[inline]
    pub fn bars_to_beats(&self, bars: f64) -> f64 {
        bars * self.beats_per_bar as f64
    }
}

/// Quantize a bar position to the nearest grid point.
#[inline]
pub fn quantize_to_grid(bar: f64, grid_bars: f64) -> f64 {
    if grid_bars > 0.0 {
        (bar / grid_bars).round() * grid_bars
    } else {
        bar
    }
}

/// Format a bar position as bars:beats for ruler labels.
pub fn format_bar_beat(bar: f64, beats_per_bar: u32) -> String {
    let whole_bar = bar.floor() as i64;
    let beat = ((bar - bar.floor()) * beats_per_bar as f64) as i64 + 1;
    format!("{}:{:02}", whole_bar, beat)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bar_pixel_round_trip() {
        let conv = BarConverter::new(40.0, 4);
        assert_eq!(conv.bar_to_x(1.0), 0.0);
        assert_eq!(conv.bar_to_x(5.0), 160.0);
        assert!((conv.x_to_bar(160.0) - 5.0).abs() < 1e-9);
    }

    #[test]
    fn quantize_rounds_to_grid() {
        assert_eq!(quantize_to_grid(1.1, 0.25), 1.0);
        assert_eq!(quantize_to_grid(1.13, 0.25), 1.25);
        // disabled grid passes through
        assert_eq!(quantize_to_grid(1.13, 0.0), 1.13);
    }

    #[test]
    fn bar_beat_labels() {
        assert_eq!(format_bar_beat(1.0, 4), "1:01");
        assert_eq!(format_bar_beat(2.5, 4), "2:03");
    }
}
