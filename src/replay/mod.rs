//! Replay engine: drives a [`DrawingSurface`] from decoded records
//!
//! One [`ReplayContext`] lives for a single replay session. It owns the
//! coordinate mapper, the GDI object table, the device context and its save
//! stack, plus the EMF path bracket and the EMF+ graphics state. Handlers in
//! the per-format submodules receive the context by mutable reference and
//! return `Ok(false)` for opcodes they do not recognize. A handler error is
//! logged and counted, and the session moves on to the next record.

mod emf;
mod emfplus;
mod wmf;

use crate::error::{MetafileError, MetafileResult};
use crate::mapper::CoordinateMapper;
use crate::objects::{Brush, Font, GdiObject, GdiObjectTable, Pen, BS_SOLID, PS_SOLID};
use crate::options::ReplayOptions;
use crate::record::Record;
use crate::sniff::FileKind;
use crate::surface::{ellipse_points, DrawingSurface};
use crate::types::{Color, Point, RectL, Size};
use crate::{Header, Metafile};
use encoding_rs::WINDOWS_1252;
use log::{debug, trace, warn};

pub(crate) use emfplus::PlusState;

/// Surface size used when the header carries no usable extent
pub const DEFAULT_SURFACE_SIZE: Size = Size {
    width: 800.0,
    height: 600.0,
};

/// Pixels per millimeter at 96 DPI
const PIXELS_PER_MM: f64 = 3.779527559;

/// Object table bound when the header does not declare one
const MAX_OBJECT_HANDLES: u32 = 1 << 16;

/// Text size when the selected font has no usable height
const DEFAULT_FONT_SIZE: f64 = 12.0;

/// TA_UPDATECP text alignment flag
pub(crate) const TA_UPDATECP: u32 = 0x0001;

/// Per-session record counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReplaySummary {
    /// Records handed to a handler
    pub dispatched: usize,
    /// Records whose opcode had no handler
    pub unhandled: usize,
    /// Records whose handler failed on a malformed payload
    pub failed: usize,
}

/// Drawing attributes selected into the device context
#[derive(Debug, Clone, PartialEq)]
pub struct DeviceContext {
    pub pen: Pen,
    pub brush: Brush,
    /// Face and height are passed to the surface before each text call
    pub font: Option<Font>,
    pub text_color: Color,
    pub bk_color: Color,
    pub bk_mode: u32,
    pub rop2: u32,
    pub poly_fill_mode: u32,
    pub stretch_mode: u32,
    pub text_align: u32,
    /// Current position in logical units
    pub position: (f64, f64),
}

impl Default for DeviceContext {
    fn default() -> Self {
        Self {
            pen: Pen {
                style: PS_SOLID,
                width: 1.0,
                color: Color::BLACK,
            },
            brush: Brush {
                style: BS_SOLID,
                color: Color::WHITE,
                hatch: 0,
            },
            font: None,
            text_color: Color::BLACK,
            bk_color: Color::WHITE,
            bk_mode: 2,
            rop2: 13,
            poly_fill_mode: 1,
            stretch_mode: 1,
            text_align: 0,
            position: (0.0, 0.0),
        }
    }
}

#[derive(Debug, Clone)]
struct SavedState {
    dc: DeviceContext,
    mapper: CoordinateMapper,
}

/// EMF path bracket contents, in surface coordinates
#[derive(Debug, Clone, Default)]
pub(crate) struct PathState {
    pub figures: Vec<Vec<Point>>,
    /// True between BEGINPATH and ENDPATH
    pub recording: bool,
}

/// Mutable state of one replay session
pub(crate) struct ReplayContext<'s> {
    pub surface: &'s mut dyn DrawingSurface,
    pub mapper: CoordinateMapper,
    pub objects: GdiObjectTable,
    pub dc: DeviceContext,
    pub path: Option<PathState>,
    pub plus: PlusState,
    pub size: Size,
    /// EMF object indices must stay below this (`nHandles`)
    pub handle_limit: u32,
    saved: Vec<SavedState>,
}

impl<'s> ReplayContext<'s> {
    pub fn new(surface: &'s mut dyn DrawingSurface, size: Size) -> Self {
        Self {
            surface,
            mapper: CoordinateMapper::new(),
            objects: GdiObjectTable::new(),
            dc: DeviceContext::default(),
            path: None,
            plus: PlusState::default(),
            size,
            handle_limit: MAX_OBJECT_HANDLES,
            saved: Vec::new(),
        }
    }

    pub fn point(&self, x: f64, y: f64) -> Point {
        self.mapper.transform(x, y)
    }

    /// Depth of the device-context save stack
    pub fn save_depth(&self) -> usize {
        self.saved.len()
    }

    pub fn save_dc(&mut self) {
        self.saved.push(SavedState {
            dc: self.dc.clone(),
            mapper: self.mapper,
        });
        self.surface.save_state();
    }

    /// RESTOREDC: negative levels are relative to the top, positive ones absolute
    pub fn restore_dc(&mut self, level: i32) {
        let depth = self.saved.len() as i64;
        let target = match level {
            0 => {
                debug!("RESTOREDC with level 0 ignored");
                return;
            }
            l if l < 0 => depth + l as i64,
            l => l as i64 - 1,
        };
        if target < 0 || target >= depth {
            debug!("RESTOREDC level {} out of range (depth {})", level, depth);
            return;
        }

        while self.saved.len() as i64 > target {
            let Some(state) = self.saved.pop() else {
                break;
            };
            self.dc = state.dc;
            self.mapper = state.mapper;
            self.surface.restore_state();
        }
    }

    /// Store an object at a file-supplied index, rejecting indices past the handle limit
    pub fn put_object(&mut self, record: &Record<'_>, index: u32, object: GdiObject) -> MetafileResult<()> {
        if index >= self.handle_limit {
            return Err(MetafileError::malformed(
                record.offset,
                format!("object index {} outside {} handles", index, self.handle_limit),
            ));
        }
        self.objects.put(index, object);
        Ok(())
    }

    /// Apply a resolved object to the device context
    pub fn select(&mut self, handle: u32) {
        match self.objects.resolve(handle) {
            Some(GdiObject::Pen(pen)) => self.dc.pen = pen,
            Some(GdiObject::Brush(brush)) => self.dc.brush = brush,
            Some(GdiObject::Font(font)) => self.dc.font = Some(font),
            Some(GdiObject::Placeholder(kind)) => trace!("Selected {} object {}", kind, handle),
            None => debug!("Select of empty object slot {:#x}", handle),
        }
    }

    /// Push the current pen to the surface; false when the pen draws nothing
    pub fn apply_pen(&mut self) -> bool {
        if self.dc.pen.is_null() {
            self.surface.set_stroke_color(Color::TRANSPARENT);
            return false;
        }
        let width = self.mapper.scale_length(self.dc.pen.width).abs();
        self.surface.set_stroke_color(self.dc.pen.color);
        self.surface.set_line_width(if width > 0.0 { width } else { 1.0 });
        true
    }

    /// Push the current brush to the surface; false when the brush paints nothing
    pub fn apply_brush(&mut self) -> bool {
        if self.dc.brush.is_null() {
            self.surface.set_fill_color(Color::TRANSPARENT);
            return false;
        }
        self.surface.set_fill_color(self.dc.brush.color);
        true
    }

    pub fn is_recording_path(&self) -> bool {
        self.path.as_ref().is_some_and(|path| path.recording)
    }

    pub fn move_to(&mut self, x: f64, y: f64) {
        self.dc.position = (x, y);
        let p = self.point(x, y);
        match self.path.as_mut().filter(|path| path.recording) {
            Some(path) => path.figures.push(vec![p]),
            None => self.surface.move_to(p.x, p.y),
        }
    }

    /// Segment from the current position, stroked immediately outside a path bracket
    pub fn line_to(&mut self, x: f64, y: f64) {
        let (fx, fy) = self.dc.position;
        self.dc.position = (x, y);
        let from = self.point(fx, fy);
        let to = self.point(x, y);

        if let Some(path) = self.path.as_mut().filter(|path| path.recording) {
            match path.figures.last_mut() {
                Some(figure) => figure.push(to),
                None => path.figures.push(vec![from, to]),
            }
            return;
        }

        self.apply_pen();
        self.surface.move_to(from.x, from.y);
        self.surface.line_to(to.x, to.y);
        self.surface.stroke_path();
    }

    pub fn rectangle(&mut self, left: f64, top: f64, right: f64, bottom: f64) {
        let a = self.point(left, top);
        let b = self.point(right, bottom);
        let (x, y) = (a.x.min(b.x), a.y.min(b.y));
        let (w, h) = ((b.x - a.x).abs(), (b.y - a.y).abs());

        if self.is_recording_path() {
            let corners = vec![
                Point::new(x, y),
                Point::new(x + w, y),
                Point::new(x + w, y + h),
                Point::new(x, y + h),
                Point::new(x, y),
            ];
            self.push_figure(corners);
            return;
        }

        if self.apply_brush() {
            self.surface.fill_rect(x, y, w, h);
        }
        if self.apply_pen() {
            self.surface.stroke_rect(x, y, w, h);
        }
    }

    pub fn ellipse(&mut self, left: f64, top: f64, right: f64, bottom: f64) {
        let a = self.point(left, top);
        let b = self.point(right, bottom);
        let (cx, cy) = ((a.x + b.x) / 2.0, (a.y + b.y) / 2.0);
        let (rx, ry) = ((b.x - a.x).abs() / 2.0, (b.y - a.y).abs() / 2.0);

        if self.is_recording_path() {
            self.push_figure(ellipse_points(cx, cy, rx, ry));
            return;
        }

        self.apply_brush();
        self.apply_pen();
        self.surface.ellipse(cx, cy, rx, ry);
    }

    /// Open polyline through logical points
    pub fn polyline(&mut self, points: &[(f64, f64)]) {
        let mapped: Vec<Point> = points.iter().map(|&(x, y)| self.point(x, y)).collect();
        if mapped.is_empty() {
            return;
        }
        if self.is_recording_path() {
            self.push_figure(mapped);
            return;
        }
        if self.apply_pen() {
            self.surface.polyline(&mapped);
        }
    }

    /// Closed, filled and stroked polygon through logical points
    pub fn polygon(&mut self, points: &[(f64, f64)]) {
        let mut mapped: Vec<Point> = points.iter().map(|&(x, y)| self.point(x, y)).collect();
        if mapped.is_empty() {
            return;
        }
        if self.is_recording_path() {
            mapped.push(mapped[0]);
            self.push_figure(mapped);
            return;
        }
        self.apply_brush();
        self.apply_pen();
        self.surface.polygon_fill_stroke(&mapped);
    }

    /// Continue the current figure from the current position (POLYLINETO and friends)
    pub fn polyline_from_current(&mut self, points: &[(f64, f64)]) {
        let Some(&last) = points.last() else {
            return;
        };
        let mut all = Vec::with_capacity(points.len() + 1);
        all.push(self.dc.position);
        all.extend_from_slice(points);
        self.dc.position = last;

        let mapped: Vec<Point> = all.iter().map(|&(x, y)| self.point(x, y)).collect();
        if let Some(path) = self.path.as_mut().filter(|path| path.recording) {
            match path.figures.last_mut() {
                Some(figure) => figure.extend_from_slice(&mapped[1..]),
                None => path.figures.push(mapped),
            }
            return;
        }
        if self.apply_pen() {
            self.surface.polyline(&mapped);
        }
    }

    /// Text at a logical position, painted in the text color with the selected font
    pub fn text(&mut self, text: &str, x: f64, y: f64) {
        if text.is_empty() {
            return;
        }
        if let Some(font) = &self.dc.font {
            let size = self.mapper.scale_length(font.height as f64).abs();
            let size = if size > 0.0 { size } else { DEFAULT_FONT_SIZE };
            self.surface.set_font(&font.face_name, size);
        }
        let p = self.point(x, y);
        self.surface.set_fill_color(self.dc.text_color);
        self.surface.draw_text(text, p.x, p.y);
    }

    fn push_figure(&mut self, figure: Vec<Point>) {
        if let Some(path) = self.path.as_mut() {
            path.figures.push(figure);
        }
    }
}

/// Flatten a start point plus cubic segments (three points each) into a polyline
pub(crate) fn flatten_beziers(start: (f64, f64), controls: &[(f64, f64)]) -> Vec<(f64, f64)> {
    const STEPS: usize = 16;
    let mut out = vec![start];
    let mut p0 = start;
    for segment in controls.chunks_exact(3) {
        let (p1, p2, p3) = (segment[0], segment[1], segment[2]);
        for step in 1..=STEPS {
            let t = step as f64 / STEPS as f64;
            let u = 1.0 - t;
            let (a, b, c, d) = (u * u * u, 3.0 * u * u * t, 3.0 * u * t * t, t * t * t);
            out.push((
                a * p0.0 + b * p1.0 + c * p2.0 + d * p3.0,
                a * p0.1 + b * p1.1 + c * p2.1 + d * p3.1,
            ));
        }
        p0 = p3;
    }
    out
}

/// Windows-1252 text with trailing NULs removed
pub(crate) fn decode_ansi(bytes: &[u8]) -> String {
    let (text, _) = WINDOWS_1252.decode_without_bom_handling(bytes);
    text.trim_end_matches('\0').to_string()
}

/// UTF-16LE text with trailing NULs removed
pub(crate) fn decode_utf16(bytes: &[u8]) -> String {
    let units: Vec<u16> = bytes
        .chunks_exact(2)
        .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
        .collect();
    String::from_utf16_lossy(&units)
        .trim_end_matches('\0')
        .to_string()
}

/// Fail unless the payload holds at least `needed` bytes
pub(crate) fn require(record: &Record<'_>, needed: usize) -> MetafileResult<()> {
    if record.payload.len() < needed {
        return Err(MetafileError::malformed(
            record.offset,
            format!(
                "payload holds {} bytes, {} required",
                record.payload.len(),
                needed
            ),
        ));
    }
    Ok(())
}

type Handler = fn(&mut ReplayContext<'_>, &Record<'_>) -> MetafileResult<bool>;

/// Replay a decoded metafile onto a surface
pub(crate) fn run(
    metafile: &Metafile<'_>,
    surface: &mut dyn DrawingSurface,
    options: &ReplayOptions,
) -> ReplaySummary {
    let Some(header) = metafile.header.as_ref() else {
        debug!("Nothing to replay: {:?}", metafile.error);
        return ReplaySummary::default();
    };

    let handler: Handler = match metafile.kind {
        FileKind::PlaceableWmf | FileKind::Wmf => wmf::dispatch,
        FileKind::Emf => emf::dispatch,
        FileKind::EmfPlus => emfplus::dispatch,
        FileKind::Unknown => return ReplaySummary::default(),
    };

    let size = options
        .surface_size
        .filter(Size::is_drawable)
        .unwrap_or_else(|| surface_size(header));
    surface.set_size(size.width, size.height);
    if let Some(background) = options.background {
        surface.fill_background(background);
    }

    let mut ctx = ReplayContext::new(surface, size);
    match header {
        Header::Wmf(wmf) => {
            if let Some(placeable) = &wmf.placeable {
                ctx.mapper
                    .set_window_origin(placeable.bounds.left, placeable.bounds.top);
            }
        }
        Header::Emf(emf) if emf.handle_count > 0 => ctx.handle_limit = emf.handle_count as u32,
        Header::Emf(_) => {}
    }

    let mut summary = ReplaySummary::default();
    for record in &metafile.records {
        summary.dispatched += 1;
        match handler(&mut ctx, record) {
            Ok(true) => {}
            Ok(false) => summary.unhandled += 1,
            Err(e) => {
                warn!("Skipping record {:#06x}: {}", record.opcode, e);
                summary.failed += 1;
            }
        }
    }

    debug!(
        "Replayed {} records ({} unhandled, {} failed)",
        summary.dispatched, summary.unhandled, summary.failed
    );
    summary
}

/// Surface size implied by a header
pub fn surface_size(header: &Header) -> Size {
    match header {
        Header::Wmf(wmf) => wmf
            .placeable
            .as_ref()
            .map(|placeable| rect_size(&placeable.bounds, false))
            .filter(Size::is_drawable)
            .unwrap_or(DEFAULT_SURFACE_SIZE),
        Header::Emf(emf) => {
            let bounds = rect_size(&emf.bounds, true);
            if bounds.is_drawable() {
                return bounds;
            }
            let (w_mm, h_mm) = emf.frame_millimeters();
            let frame = Size::new(w_mm * PIXELS_PER_MM, h_mm * PIXELS_PER_MM);
            if frame.is_drawable() {
                return frame;
            }
            DEFAULT_SURFACE_SIZE
        }
    }
}

fn rect_size(rect: &RectL, inclusive: bool) -> Size {
    let extra = if inclusive { 1 } else { 0 };
    Size::new(
        (rect.width().abs() + extra) as f64,
        (rect.height().abs() + extra) as f64,
    )
}
