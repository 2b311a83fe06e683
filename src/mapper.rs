//! Logical-to-surface coordinate mapping
//!
//! Holds the GDI window/viewport pair and the mapping mode. The output Y axis
//! keeps the metafile's downward-positive convention.

use crate::types::Point;

pub const MM_TEXT: u32 = 1;
pub const MM_LOMETRIC: u32 = 2;
pub const MM_HIMETRIC: u32 = 3;
pub const MM_LOENGLISH: u32 = 4;
pub const MM_HIENGLISH: u32 = 5;
pub const MM_TWIPS: u32 = 6;
pub const MM_ISOTROPIC: u32 = 7;
pub const MM_ANISOTROPIC: u32 = 8;

const DEFAULT_EXTENT: (i32, i32) = (800, 600);

/// GDI mapping mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MapMode {
    Text,
    LoMetric,
    HiMetric,
    LoEnglish,
    HiEnglish,
    Twips,
    Isotropic,
    Anisotropic,
    /// Any value outside the defined range; maps like `Text`
    Other(u32),
}

impl MapMode {
    pub fn from_raw(value: u32) -> Self {
        match value {
            MM_TEXT => MapMode::Text,
            MM_LOMETRIC => MapMode::LoMetric,
            MM_HIMETRIC => MapMode::HiMetric,
            MM_LOENGLISH => MapMode::LoEnglish,
            MM_HIENGLISH => MapMode::HiEnglish,
            MM_TWIPS => MapMode::Twips,
            MM_ISOTROPIC => MapMode::Isotropic,
            MM_ANISOTROPIC => MapMode::Anisotropic,
            other => MapMode::Other(other),
        }
    }

    /// Fixed scale for the metric and English modes
    fn unit_scale(self) -> Option<f64> {
        match self {
            MapMode::LoMetric => Some(0.1),
            MapMode::HiMetric => Some(0.01),
            MapMode::LoEnglish => Some(0.254),
            MapMode::HiEnglish => Some(0.0254),
            MapMode::Twips => Some(1.0 / 1440.0),
            _ => None,
        }
    }
}

/// Window/viewport state for one replay session
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoordinateMapper {
    mode: MapMode,
    window_origin: (i32, i32),
    window_extent: (i32, i32),
    viewport_origin: (i32, i32),
    viewport_extent: (i32, i32),
}

impl Default for CoordinateMapper {
    fn default() -> Self {
        Self {
            mode: MapMode::Text,
            window_origin: (0, 0),
            window_extent: DEFAULT_EXTENT,
            viewport_origin: (0, 0),
            viewport_extent: DEFAULT_EXTENT,
        }
    }
}

impl CoordinateMapper {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mode(&self) -> MapMode {
        self.mode
    }

    pub fn window_origin(&self) -> (i32, i32) {
        self.window_origin
    }

    pub fn window_extent(&self) -> (i32, i32) {
        self.window_extent
    }

    pub fn viewport_origin(&self) -> (i32, i32) {
        self.viewport_origin
    }

    pub fn viewport_extent(&self) -> (i32, i32) {
        self.viewport_extent
    }

    pub fn set_mode(&mut self, mode: u32) {
        self.mode = MapMode::from_raw(mode);
    }

    pub fn set_window_origin(&mut self, x: i32, y: i32) {
        self.window_origin = (x, y);
    }

    pub fn set_window_extent(&mut self, w: i32, h: i32) {
        self.window_extent = (w, h);
    }

    pub fn set_viewport_origin(&mut self, x: i32, y: i32) {
        self.viewport_origin = (x, y);
    }

    pub fn set_viewport_extent(&mut self, w: i32, h: i32) {
        self.viewport_extent = (w, h);
    }

    pub fn offset_window_origin(&mut self, dx: i32, dy: i32) {
        self.window_origin = (
            self.window_origin.0.saturating_add(dx),
            self.window_origin.1.saturating_add(dy),
        );
    }

    pub fn offset_viewport_origin(&mut self, dx: i32, dy: i32) {
        self.viewport_origin = (
            self.viewport_origin.0.saturating_add(dx),
            self.viewport_origin.1.saturating_add(dy),
        );
    }

    /// SCALEWINDOWEXT: `ext = ext * num / denom`; zero denominators are ignored
    pub fn scale_window_extent(&mut self, x_num: i32, x_denom: i32, y_num: i32, y_denom: i32) {
        self.window_extent = scale_extent(self.window_extent, x_num, x_denom, y_num, y_denom);
    }

    pub fn scale_viewport_extent(&mut self, x_num: i32, x_denom: i32, y_num: i32, y_denom: i32) {
        self.viewport_extent = scale_extent(self.viewport_extent, x_num, x_denom, y_num, y_denom);
    }

    /// Map a logical point to surface coordinates
    ///
    /// The surface size plays no part in the mapping, so it is not a parameter.
    pub fn transform(&self, x: f64, y: f64) -> Point {
        let dx = x - self.window_origin.0 as f64;
        let dy = y - self.window_origin.1 as f64;

        if let Some(scale) = self.mode.unit_scale() {
            return Point::new(dx * scale, dy * scale);
        }

        // Text, Isotropic, Anisotropic and unknown modes
        let (ww, wh) = self.window_extent;
        if ww == 0 || wh == 0 {
            return Point::new(x, y);
        }
        let (vw, vh) = self.viewport_extent;
        Point::new(
            dx * (vw as f64 / ww as f64) + self.viewport_origin.0 as f64,
            dy * (vh as f64 / wh as f64) + self.viewport_origin.1 as f64,
        )
    }

    /// Map a logical length along X (pen widths, font heights)
    pub fn scale_length(&self, length: f64) -> f64 {
        if let Some(scale) = self.mode.unit_scale() {
            return length * scale;
        }
        let (ww, _) = self.window_extent;
        if ww == 0 {
            return length;
        }
        length * (self.viewport_extent.0 as f64 / ww as f64).abs()
    }
}

fn scale_extent(extent: (i32, i32), x_num: i32, x_denom: i32, y_num: i32, y_denom: i32) -> (i32, i32) {
    let scale = |value: i32, num: i32, denom: i32| {
        if denom == 0 {
            value
        } else {
            (value as i64 * num as i64 / denom as i64).clamp(i32::MIN as i64, i32::MAX as i64) as i32
        }
    };
    (scale(extent.0, x_num, x_denom), scale(extent.1, y_num, y_denom))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_mode_scaling() {
        let mut mapper = CoordinateMapper::new();
        mapper.set_mode(MM_TEXT);
        mapper.set_window_origin(10, 10);
        mapper.set_window_extent(100, 100);
        mapper.set_viewport_extent(200, 200);
        assert_eq!(mapper.transform(60.0, 60.0), Point::new(100.0, 100.0));
    }

    #[test]
    fn test_default_is_identity() {
        let mapper = CoordinateMapper::new();
        assert_eq!(mapper.transform(123.0, -45.0), Point::new(123.0, -45.0));
    }

    #[test]
    fn test_zero_window_extent_is_identity() {
        let mut mapper = CoordinateMapper::new();
        mapper.set_window_origin(50, 50);
        mapper.set_window_extent(0, 100);
        assert_eq!(mapper.transform(7.0, 8.0), Point::new(7.0, 8.0));
    }

    #[test]
    fn test_viewport_origin_offset() {
        let mut mapper = CoordinateMapper::new();
        mapper.set_mode(MM_ANISOTROPIC);
        mapper.set_window_extent(1000, 500);
        mapper.set_viewport_extent(100, 100);
        mapper.set_viewport_origin(5, 7);
        assert_eq!(mapper.transform(500.0, 250.0), Point::new(55.0, 57.0));
    }

    #[test]
    fn test_metric_modes_ignore_viewport() {
        let mut mapper = CoordinateMapper::new();
        mapper.set_viewport_extent(5000, 5000);
        mapper.set_viewport_origin(100, 100);
        mapper.set_window_origin(100, 0);

        mapper.set_mode(MM_LOMETRIC);
        let p = mapper.transform(200.0, 50.0);
        assert!((p.x - 10.0).abs() < 1e-9);
        assert!((p.y - 5.0).abs() < 1e-9);

        mapper.set_mode(MM_TWIPS);
        let p = mapper.transform(1540.0, 1440.0);
        assert!((p.x - 1.0).abs() < 1e-9);
        assert!((p.y - 1.0).abs() < 1e-9);

        mapper.set_mode(MM_LOENGLISH);
        let p = mapper.transform(200.0, 0.0);
        assert!((p.x - 25.4).abs() < 1e-9);
    }

    #[test]
    fn test_unknown_mode_maps_like_text() {
        let mut mapper = CoordinateMapper::new();
        mapper.set_mode(42);
        assert_eq!(mapper.mode(), MapMode::Other(42));
        mapper.set_window_extent(10, 10);
        mapper.set_viewport_extent(20, 20);
        assert_eq!(mapper.transform(3.0, 4.0), Point::new(6.0, 8.0));
    }

    #[test]
    fn test_scale_and_offset() {
        let mut mapper = CoordinateMapper::new();
        mapper.scale_window_extent(1, 2, 3, 0);
        assert_eq!(mapper.window_extent(), (400, 600));
        mapper.offset_window_origin(5, -5);
        mapper.offset_window_origin(1, 1);
        assert_eq!(mapper.window_origin(), (6, -4));
    }
}
