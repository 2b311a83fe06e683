//! Drawing-surface interface driven by the replay engine

use crate::types::{Color, Point};

/// Target of replayed drawing operations
///
/// Calls arrive in record order. Implementations must accept `move_to` /
/// `line_to` / `stroke_path` sequences without an enclosing begin/close pair.
pub trait DrawingSurface {
    fn set_size(&mut self, width: f64, height: f64);
    fn fill_background(&mut self, color: Color);

    fn move_to(&mut self, x: f64, y: f64);
    fn line_to(&mut self, x: f64, y: f64);
    fn stroke_path(&mut self);

    fn fill_rect(&mut self, x: f64, y: f64, width: f64, height: f64);
    fn stroke_rect(&mut self, x: f64, y: f64, width: f64, height: f64);
    fn polyline(&mut self, points: &[Point]);
    fn polygon_fill_stroke(&mut self, points: &[Point]);
    fn draw_text(&mut self, text: &str, x: f64, y: f64);

    fn set_stroke_color(&mut self, color: Color);
    fn set_fill_color(&mut self, color: Color);
    fn set_line_width(&mut self, width: f64);

    fn save_state(&mut self);
    fn restore_state(&mut self);

    /// Font for later `draw_text` calls; ignored unless overridden
    fn set_font(&mut self, _family: &str, _size: f64) {}

    /// Axis-aligned ellipse, approximated as a polygon unless overridden
    fn ellipse(&mut self, cx: f64, cy: f64, rx: f64, ry: f64) {
        self.polygon_fill_stroke(&ellipse_points(cx, cy, rx, ry));
    }
}

/// Points of an axis-aligned ellipse outline
pub fn ellipse_points(cx: f64, cy: f64, rx: f64, ry: f64) -> Vec<Point> {
    const SEGMENTS: usize = 48;
    (0..SEGMENTS)
        .map(|i| {
            let angle = i as f64 / SEGMENTS as f64 * std::f64::consts::TAU;
            Point::new(cx + rx * angle.cos(), cy + ry * angle.sin())
        })
        .collect()
}

/// One recorded surface call
#[derive(Debug, Clone, PartialEq)]
pub enum SurfaceOp {
    SetSize(f64, f64),
    FillBackground(Color),
    MoveTo(f64, f64),
    LineTo(f64, f64),
    StrokePath,
    FillRect(f64, f64, f64, f64),
    StrokeRect(f64, f64, f64, f64),
    Polyline(Vec<Point>),
    PolygonFillStroke(Vec<Point>),
    DrawText(String, f64, f64),
    SetFont(String, f64),
    SetStrokeColor(Color),
    SetFillColor(Color),
    SetLineWidth(f64),
    SaveState,
    RestoreState,
}

/// Surface that keeps every call it receives
#[derive(Debug, Clone, Default)]
pub struct RecordingSurface {
    pub ops: Vec<SurfaceOp>,
}

impl RecordingSurface {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count of recorded calls matching a predicate
    pub fn count(&self, predicate: impl Fn(&SurfaceOp) -> bool) -> usize {
        self.ops.iter().filter(|op| predicate(op)).count()
    }
}

impl DrawingSurface for RecordingSurface {
    fn set_size(&mut self, width: f64, height: f64) {
        self.ops.push(SurfaceOp::SetSize(width, height));
    }

    fn fill_background(&mut self, color: Color) {
        self.ops.push(SurfaceOp::FillBackground(color));
    }

    fn move_to(&mut self, x: f64, y: f64) {
        self.ops.push(SurfaceOp::MoveTo(x, y));
    }

    fn line_to(&mut self, x: f64, y: f64) {
        self.ops.push(SurfaceOp::LineTo(x, y));
    }

    fn stroke_path(&mut self) {
        self.ops.push(SurfaceOp::StrokePath);
    }

    fn fill_rect(&mut self, x: f64, y: f64, width: f64, height: f64) {
        self.ops.push(SurfaceOp::FillRect(x, y, width, height));
    }

    fn stroke_rect(&mut self, x: f64, y: f64, width: f64, height: f64) {
        self.ops.push(SurfaceOp::StrokeRect(x, y, width, height));
    }

    fn polyline(&mut self, points: &[Point]) {
        self.ops.push(SurfaceOp::Polyline(points.to_vec()));
    }

    fn polygon_fill_stroke(&mut self, points: &[Point]) {
        self.ops.push(SurfaceOp::PolygonFillStroke(points.to_vec()));
    }

    fn draw_text(&mut self, text: &str, x: f64, y: f64) {
        self.ops.push(SurfaceOp::DrawText(text.to_string(), x, y));
    }

    fn set_stroke_color(&mut self, color: Color) {
        self.ops.push(SurfaceOp::SetStrokeColor(color));
    }

    fn set_fill_color(&mut self, color: Color) {
        self.ops.push(SurfaceOp::SetFillColor(color));
    }

    fn set_line_width(&mut self, width: f64) {
        self.ops.push(SurfaceOp::SetLineWidth(width));
    }

    fn save_state(&mut self) {
        self.ops.push(SurfaceOp::SaveState);
    }

    fn restore_state(&mut self) {
        self.ops.push(SurfaceOp::RestoreState);
    }

    fn set_font(&mut self, family: &str, size: f64) {
        self.ops.push(SurfaceOp::SetFont(family.to_string(), size));
    }
}
