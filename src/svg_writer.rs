//! SVG drawing surface for replayed metafiles

use crate::surface::DrawingSurface;
use crate::types::{Color, Point};
use svg::node::element::{Path, Polygon, Polyline, Rectangle, Text};
use svg::node::Text as TextNode;
use svg::Document;

#[derive(Debug, Clone, Copy)]
struct Style {
    stroke: Color,
    fill: Color,
    line_width: f64,
}

impl Default for Style {
    fn default() -> Self {
        Self {
            stroke: Color::BLACK,
            fill: Color::WHITE,
            line_width: 1.0,
        }
    }
}

/// Surface that collects SVG elements
pub struct SvgSurface {
    width: f64,
    height: f64,
    elements: Vec<svg::node::element::Element>,
    style: Style,
    saved: Vec<Style>,
    /// Open subpath built from move_to/line_to calls
    current: Option<String>,
    font_family: String,
    font_size: f64,
}

impl SvgSurface {
    pub fn new() -> Self {
        Self {
            width: 0.0,
            height: 0.0,
            elements: Vec::new(),
            style: Style::default(),
            saved: Vec::new(),
            current: None,
            font_family: "Arial".to_string(),
            font_size: 12.0,
        }
    }

    /// Number of elements emitted so far
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Finish and generate SVG string
    pub fn finish(self) -> String {
        let mut document = Document::new()
            .set("width", self.width)
            .set("height", self.height)
            .set("viewBox", (0.0, 0.0, self.width, self.height));
        for element in self.elements {
            document = document.add(element);
        }
        document.to_string()
    }

    fn stroke(&self) -> String {
        paint(self.style.stroke)
    }

    fn fill(&self) -> String {
        paint(self.style.fill)
    }
}

impl Default for SvgSurface {
    fn default() -> Self {
        Self::new()
    }
}

/// SVG paint value; fully transparent colors become `none`
fn paint(color: Color) -> String {
    if color.a == 0 {
        "none".to_string()
    } else {
        color.to_css()
    }
}

fn points_attr(points: &[Point]) -> String {
    points
        .iter()
        .map(|p| format!("{},{}", p.x, p.y))
        .collect::<Vec<_>>()
        .join(" ")
}

impl DrawingSurface for SvgSurface {
    fn set_size(&mut self, width: f64, height: f64) {
        self.width = width;
        self.height = height;
    }

    fn fill_background(&mut self, color: Color) {
        let rect = Rectangle::new()
            .set("x", 0)
            .set("y", 0)
            .set("width", self.width)
            .set("height", self.height)
            .set("fill", paint(color));
        self.elements.push(rect.into());
    }

    fn move_to(&mut self, x: f64, y: f64) {
        let mut data = self.current.take().unwrap_or_default();
        if !data.is_empty() {
            data.push(' ');
        }
        data.push_str(&format!("M{},{}", x, y));
        self.current = Some(data);
    }

    fn line_to(&mut self, x: f64, y: f64) {
        let data = match self.current.take() {
            Some(data) => format!("{} L{},{}", data, x, y),
            // Segment without a start point
            None => format!("M{},{}", x, y),
        };
        self.current = Some(data);
    }

    fn stroke_path(&mut self) {
        let Some(data) = self.current.take() else {
            return;
        };
        let path = Path::new()
            .set("d", data)
            .set("fill", "none")
            .set("stroke", self.stroke())
            .set("stroke-width", self.style.line_width);
        self.elements.push(path.into());
    }

    fn fill_rect(&mut self, x: f64, y: f64, width: f64, height: f64) {
        let rect = Rectangle::new()
            .set("x", x)
            .set("y", y)
            .set("width", width)
            .set("height", height)
            .set("fill", self.fill());
        self.elements.push(rect.into());
    }

    fn stroke_rect(&mut self, x: f64, y: f64, width: f64, height: f64) {
        let rect = Rectangle::new()
            .set("x", x)
            .set("y", y)
            .set("width", width)
            .set("height", height)
            .set("fill", "none")
            .set("stroke", self.stroke())
            .set("stroke-width", self.style.line_width);
        self.elements.push(rect.into());
    }

    fn polyline(&mut self, points: &[Point]) {
        if points.len() < 2 {
            return;
        }
        let line = Polyline::new()
            .set("points", points_attr(points))
            .set("fill", "none")
            .set("stroke", self.stroke())
            .set("stroke-width", self.style.line_width);
        self.elements.push(line.into());
    }

    fn polygon_fill_stroke(&mut self, points: &[Point]) {
        if points.len() < 2 {
            return;
        }
        let polygon = Polygon::new()
            .set("points", points_attr(points))
            .set("fill", self.fill())
            .set("stroke", self.stroke())
            .set("stroke-width", self.style.line_width);
        self.elements.push(polygon.into());
    }

    fn draw_text(&mut self, text: &str, x: f64, y: f64) {
        let text_elem = Text::new()
            .set("x", x)
            .set("y", y)
            .set("font-family", self.font_family.as_str())
            .set("font-size", self.font_size)
            .set("fill", self.fill())
            .add(TextNode::new(text));
        self.elements.push(text_elem.into());
    }

    fn set_stroke_color(&mut self, color: Color) {
        self.style.stroke = color;
    }

    fn set_fill_color(&mut self, color: Color) {
        self.style.fill = color;
    }

    fn set_line_width(&mut self, width: f64) {
        self.style.line_width = width;
    }

    fn set_font(&mut self, family: &str, size: f64) {
        if !family.is_empty() {
            self.font_family = family.to_string();
        }
        self.font_size = size;
    }

    fn save_state(&mut self) {
        self.saved.push(self.style);
    }

    fn restore_state(&mut self) {
        if let Some(style) = self.saved.pop() {
            self.style = style;
        }
    }
}
