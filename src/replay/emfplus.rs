//! EMF+ record handlers
//!
//! EMF+ keeps its own object table (ids 0-63 from the record flags) and an
//! affine world transform. Coordinates bypass the GDI window/viewport
//! mapping and are only run through the world transform.

use super::{decode_utf16, require, ReplayContext};
use crate::cursor::ByteCursor;
use crate::emfplus_records::{EmfPlusRecordKind, OBJECT_TYPE_BRUSH, OBJECT_TYPE_PEN};
use crate::error::{MetafileError, MetafileResult};
use crate::objects::{Brush, GdiObject, GdiObjectTable, Pen, BS_SOLID, PS_SOLID};
use crate::record::Record;
use crate::types::{Color, Point};
use log::{debug, trace};

const BRUSH_TYPE_SOLID_COLOR: u32 = 0;
const BRUSH_TYPE_HATCH_FILL: u32 = 1;
const BRUSH_TYPE_LINEAR_GRADIENT: u32 = 4;

/// Color in the brush id field instead of an object id
const FLAG_SOLID_COLOR: u16 = 0x8000;
/// Coordinates stored as i16 instead of f32
const FLAG_COMPRESSED: u16 = 0x4000;
/// DrawLines: close the figure. Transform records: post-multiply
const FLAG_CLOSE_OR_APPEND: u16 = 0x2000;

// Optional pen data fields, in storage order
const PEN_DATA_TRANSFORM: u32 = 0x0001;
const PEN_DATA_START_CAP: u32 = 0x0002;
const PEN_DATA_END_CAP: u32 = 0x0004;
const PEN_DATA_JOIN: u32 = 0x0008;
const PEN_DATA_MITER_LIMIT: u32 = 0x0010;
const PEN_DATA_LINE_STYLE: u32 = 0x0020;
const PEN_DATA_DASHED_LINE_CAP: u32 = 0x0040;
const PEN_DATA_DASHED_LINE_OFFSET: u32 = 0x0080;
const PEN_DATA_DASHED_LINE: u32 = 0x0100;
const PEN_DATA_NON_CENTER: u32 = 0x0200;
const PEN_DATA_COMPOUND_LINE: u32 = 0x0400;
const PEN_DATA_CUSTOM_START_CAP: u32 = 0x0800;
const PEN_DATA_CUSTOM_END_CAP: u32 = 0x1000;

/// 2D affine matrix `[m11 m12 m21 m22 dx dy]`
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Transform {
    pub m11: f64,
    pub m12: f64,
    pub m21: f64,
    pub m22: f64,
    pub dx: f64,
    pub dy: f64,
}

impl Transform {
    pub fn identity() -> Self {
        Self {
            m11: 1.0,
            m12: 0.0,
            m21: 0.0,
            m22: 1.0,
            dx: 0.0,
            dy: 0.0,
        }
    }

    fn read(p: &mut ByteCursor<'_>) -> Self {
        Self {
            m11: p.read_f32() as f64,
            m12: p.read_f32() as f64,
            m21: p.read_f32() as f64,
            m22: p.read_f32() as f64,
            dx: p.read_f32() as f64,
            dy: p.read_f32() as f64,
        }
    }

    pub fn apply(&self, x: f64, y: f64) -> Point {
        Point::new(
            self.m11 * x + self.m21 * y + self.dx,
            self.m12 * x + self.m22 * y + self.dy,
        )
    }

    /// `self` followed by `other`
    fn then(&self, other: &Transform) -> Self {
        Self {
            m11: self.m11 * other.m11 + self.m12 * other.m21,
            m12: self.m11 * other.m12 + self.m12 * other.m22,
            m21: self.m21 * other.m11 + self.m22 * other.m21,
            m22: self.m21 * other.m12 + self.m22 * other.m22,
            dx: self.dx * other.m11 + self.dy * other.m21 + other.dx,
            dy: self.dx * other.m12 + self.dy * other.m22 + other.dy,
        }
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::identity()
    }
}

/// EMF+ graphics state of a replay session
#[derive(Debug, Clone, Default)]
pub(crate) struct PlusState {
    pub objects: GdiObjectTable,
    pub transform: Transform,
    /// Save stack keyed by the record's stack index
    saved: Vec<(u32, Transform)>,
}

impl PlusState {
    fn point(&self, x: f64, y: f64) -> Point {
        self.transform.apply(x, y)
    }

    /// Combine with the world transform; `append` post-multiplies
    fn multiply(&mut self, matrix: Transform, append: bool) {
        self.transform = if append {
            self.transform.then(&matrix)
        } else {
            matrix.then(&self.transform)
        };
    }
}

pub(super) fn dispatch(ctx: &mut ReplayContext<'_>, record: &Record<'_>) -> MetafileResult<bool> {
    let kind = EmfPlusRecordKind::from_opcode(record.opcode as u16);
    trace!("EMF+ {} at {}", kind.name(), record.offset);
    let flags = record.flags;
    let mut p = record.payload_cursor();

    match kind {
        EmfPlusRecordKind::Header => {
            require(record, 16)?;
            let version = p.read_u32();
            let plus_flags = p.read_u32();
            let dpi_x = p.read_u32();
            let dpi_y = p.read_u32();
            debug!(
                "EMF+ header - version: {:#010x}, dual: {}, video: {}, dpi: {}x{}",
                version,
                flags & 0x0001 != 0,
                plus_flags & 0x0001 != 0,
                dpi_x,
                dpi_y
            );
        }
        EmfPlusRecordKind::Object => handle_object(ctx, record)?,
        EmfPlusRecordKind::Clear => {
            require(record, 4)?;
            ctx.surface.fill_background(Color::from_argb(p.read_u32()));
        }
        EmfPlusRecordKind::FillRects => {
            require(record, 8)?;
            let color = brush_color(ctx, flags, p.read_u32());
            let rects = read_rects(record, &mut p, flags & FLAG_COMPRESSED != 0)?;
            ctx.surface.set_fill_color(color);
            for (x, y, w, h) in rects {
                let (a, b) = (ctx.plus.point(x, y), ctx.plus.point(x + w, y + h));
                ctx.surface
                    .fill_rect(a.x.min(b.x), a.y.min(b.y), (b.x - a.x).abs(), (b.y - a.y).abs());
            }
        }
        EmfPlusRecordKind::DrawRects => {
            require(record, 4)?;
            apply_pen(ctx, flags);
            let rects = read_rects(record, &mut p, flags & FLAG_COMPRESSED != 0)?;
            for (x, y, w, h) in rects {
                let (a, b) = (ctx.plus.point(x, y), ctx.plus.point(x + w, y + h));
                ctx.surface
                    .stroke_rect(a.x.min(b.x), a.y.min(b.y), (b.x - a.x).abs(), (b.y - a.y).abs());
            }
        }
        EmfPlusRecordKind::FillPolygon => {
            require(record, 8)?;
            let color = brush_color(ctx, flags, p.read_u32());
            let points = read_points(record, &mut p, flags & FLAG_COMPRESSED != 0)?;
            let mapped: Vec<Point> = points.iter().map(|&(x, y)| ctx.plus.point(x, y)).collect();
            ctx.surface.set_fill_color(color);
            ctx.surface.set_stroke_color(Color::TRANSPARENT);
            ctx.surface.polygon_fill_stroke(&mapped);
        }
        EmfPlusRecordKind::DrawLines => {
            require(record, 4)?;
            apply_pen(ctx, flags);
            let points = read_points(record, &mut p, flags & FLAG_COMPRESSED != 0)?;
            let mut mapped: Vec<Point> = points.iter().map(|&(x, y)| ctx.plus.point(x, y)).collect();
            if flags & FLAG_CLOSE_OR_APPEND != 0 {
                if let Some(&first) = mapped.first() {
                    mapped.push(first);
                }
            }
            ctx.surface.polyline(&mapped);
        }
        EmfPlusRecordKind::FillEllipse => {
            require(record, 4)?;
            let color = brush_color(ctx, flags, p.read_u32());
            let rect = read_rect(record, &mut p, flags & FLAG_COMPRESSED != 0)?;
            ctx.surface.set_fill_color(color);
            ctx.surface.set_stroke_color(Color::TRANSPARENT);
            draw_ellipse(ctx, rect);
        }
        EmfPlusRecordKind::DrawEllipse => {
            apply_pen(ctx, flags);
            ctx.surface.set_fill_color(Color::TRANSPARENT);
            let rect = read_rect(record, &mut p, flags & FLAG_COMPRESSED != 0)?;
            draw_ellipse(ctx, rect);
        }
        EmfPlusRecordKind::DrawString => {
            require(record, 28)?;
            let color = brush_color(ctx, flags, p.read_u32());
            let _format_id = p.read_u32();
            let length = p.read_u32() as usize;
            let x = p.read_f32() as f64;
            let y = p.read_f32() as f64;
            let _width = p.read_f32();
            let _height = p.read_f32();
            let bytes = length
                .checked_mul(2)
                .and_then(|n| record.payload.get(28..28 + n))
                .ok_or_else(|| {
                    MetafileError::malformed(
                        record.offset,
                        format!("{} characters run past the record", length),
                    )
                })?;
            let text = decode_utf16(bytes);
            if !text.is_empty() {
                let at = ctx.plus.point(x, y);
                ctx.surface.set_fill_color(color);
                ctx.surface.draw_text(&text, at.x, at.y);
            }
        }

        EmfPlusRecordKind::Save => {
            require(record, 4)?;
            let index = p.read_u32();
            let transform = ctx.plus.transform;
            ctx.plus.saved.push((index, transform));
            ctx.surface.save_state();
        }
        EmfPlusRecordKind::Restore => {
            require(record, 4)?;
            let index = p.read_u32();
            match ctx.plus.saved.iter().rposition(|(i, _)| *i == index) {
                Some(position) => {
                    while ctx.plus.saved.len() > position {
                        if let Some((_, transform)) = ctx.plus.saved.pop() {
                            ctx.plus.transform = transform;
                            ctx.surface.restore_state();
                        }
                    }
                }
                None => debug!("EMF+ restore of unknown state {}", index),
            }
        }
        EmfPlusRecordKind::SetWorldTransform => {
            require(record, 24)?;
            ctx.plus.transform = Transform::read(&mut p);
        }
        EmfPlusRecordKind::ResetWorldTransform => ctx.plus.transform = Transform::identity(),
        EmfPlusRecordKind::MultiplyWorldTransform => {
            require(record, 24)?;
            let matrix = Transform::read(&mut p);
            ctx.plus
                .multiply(matrix, flags & FLAG_CLOSE_OR_APPEND != 0);
        }
        EmfPlusRecordKind::TranslateWorldTransform => {
            require(record, 8)?;
            let matrix = Transform {
                dx: p.read_f32() as f64,
                dy: p.read_f32() as f64,
                ..Transform::identity()
            };
            ctx.plus
                .multiply(matrix, flags & FLAG_CLOSE_OR_APPEND != 0);
        }
        EmfPlusRecordKind::ScaleWorldTransform => {
            require(record, 8)?;
            let matrix = Transform {
                m11: p.read_f32() as f64,
                m22: p.read_f32() as f64,
                ..Transform::identity()
            };
            ctx.plus
                .multiply(matrix, flags & FLAG_CLOSE_OR_APPEND != 0);
        }
        EmfPlusRecordKind::RotateWorldTransform => {
            require(record, 4)?;
            let (sin, cos) = (p.read_f32() as f64).to_radians().sin_cos();
            let matrix = Transform {
                m11: cos,
                m12: sin,
                m21: -sin,
                m22: cos,
                ..Transform::identity()
            };
            ctx.plus
                .multiply(matrix, flags & FLAG_CLOSE_OR_APPEND != 0);
        }

        // Recognized, no drawing effect
        EmfPlusRecordKind::EndOfFile
        | EmfPlusRecordKind::Comment
        | EmfPlusRecordKind::GetDc
        | EmfPlusRecordKind::MultiFormatStart
        | EmfPlusRecordKind::MultiFormatSection
        | EmfPlusRecordKind::MultiFormatEnd
        | EmfPlusRecordKind::FillPie
        | EmfPlusRecordKind::DrawPie
        | EmfPlusRecordKind::DrawArc
        | EmfPlusRecordKind::FillRegion
        | EmfPlusRecordKind::FillPath
        | EmfPlusRecordKind::DrawPath
        | EmfPlusRecordKind::FillClosedCurve
        | EmfPlusRecordKind::DrawClosedCurve
        | EmfPlusRecordKind::DrawCurve
        | EmfPlusRecordKind::DrawBeziers
        | EmfPlusRecordKind::DrawImage
        | EmfPlusRecordKind::DrawImagePoints
        | EmfPlusRecordKind::SetRenderingOrigin
        | EmfPlusRecordKind::SetAntiAliasMode
        | EmfPlusRecordKind::SetTextRenderingHint
        | EmfPlusRecordKind::SetTextContrast
        | EmfPlusRecordKind::SetInterpolationMode
        | EmfPlusRecordKind::SetPixelOffsetMode
        | EmfPlusRecordKind::SetCompositingMode
        | EmfPlusRecordKind::SetCompositingQuality
        | EmfPlusRecordKind::BeginContainer
        | EmfPlusRecordKind::BeginContainerNoParams
        | EmfPlusRecordKind::EndContainer
        | EmfPlusRecordKind::SetPageTransform
        | EmfPlusRecordKind::ResetClip
        | EmfPlusRecordKind::SetClipRect
        | EmfPlusRecordKind::SetClipPath
        | EmfPlusRecordKind::SetClipRegion
        | EmfPlusRecordKind::OffsetClip
        | EmfPlusRecordKind::DrawDriverString
        | EmfPlusRecordKind::StrokeFillPath
        | EmfPlusRecordKind::SerializableObject
        | EmfPlusRecordKind::SetTsGraphics
        | EmfPlusRecordKind::SetTsClip => {}

        EmfPlusRecordKind::Unhandled(record_type) => {
            trace!("No EMF+ handler for {:#06x} at {}", record_type, record.offset);
            return Ok(false);
        }
    }

    Ok(true)
}

/// EmfPlusObject: object id in bits 0-7, object type in bits 8-14
fn handle_object(ctx: &mut ReplayContext<'_>, record: &Record<'_>) -> MetafileResult<()> {
    let id = (record.flags & 0xFF) as u32;
    let object_type = (record.flags >> 8) & 0x7F;
    let mut p = record.payload_cursor();

    match object_type {
        OBJECT_TYPE_BRUSH => {
            let color = read_brush_color(record, &mut p)?;
            ctx.plus.objects.put(
                id,
                GdiObject::Brush(Brush {
                    style: BS_SOLID,
                    color,
                    hatch: 0,
                }),
            );
        }
        OBJECT_TYPE_PEN => {
            require(record, 20)?;
            let _version = p.read_u32();
            let _reserved = p.read_u32();
            let pen_flags = p.read_u32();
            let _unit = p.read_u32();
            let width = p.read_f32() as f64;
            skip_pen_data(record, &mut p, pen_flags)?;
            let color = read_brush_color(record, &mut p)?;
            ctx.plus.objects.put(
                id,
                GdiObject::Pen(Pen {
                    style: PS_SOLID,
                    width,
                    color,
                }),
            );
        }
        other => {
            trace!("EMF+ object type {} stored as placeholder in slot {}", other, id);
            ctx.plus.objects.put(id, GdiObject::Placeholder("EMF+ object"));
        }
    }
    Ok(())
}

/// Representative color of a serialized EmfPlusBrush
fn read_brush_color(record: &Record<'_>, p: &mut ByteCursor<'_>) -> MetafileResult<Color> {
    let start = p.position();
    require(record, start + 12)?;
    let _version = p.read_u32();
    let brush_type = p.read_u32();
    match brush_type {
        BRUSH_TYPE_SOLID_COLOR => Ok(Color::from_argb(p.read_u32())),
        BRUSH_TYPE_HATCH_FILL => {
            // style, then foreground color
            require(record, start + 16)?;
            p.skip(4);
            Ok(Color::from_argb(p.read_u32()))
        }
        BRUSH_TYPE_LINEAR_GRADIENT => {
            // flags, wrap mode, rect, then start color
            require(record, start + 36)?;
            p.skip(24);
            Ok(Color::from_argb(p.read_u32()))
        }
        other => {
            debug!("EMF+ brush type {} drawn in black", other);
            Ok(Color::BLACK)
        }
    }
}

/// Advance past the optional pen data selected by `pen_flags`
fn skip_pen_data(record: &Record<'_>, p: &mut ByteCursor<'_>, pen_flags: u32) -> MetafileResult<()> {
    if pen_flags & PEN_DATA_TRANSFORM != 0 {
        p.skip(24);
    }
    for flag in [
        PEN_DATA_START_CAP,
        PEN_DATA_END_CAP,
        PEN_DATA_JOIN,
        PEN_DATA_MITER_LIMIT,
        PEN_DATA_LINE_STYLE,
        PEN_DATA_DASHED_LINE_CAP,
        PEN_DATA_DASHED_LINE_OFFSET,
    ] {
        if pen_flags & flag != 0 {
            p.skip(4);
        }
    }
    if pen_flags & PEN_DATA_DASHED_LINE != 0 {
        let count = p.read_u32() as usize;
        p.skip(count.saturating_mul(4));
    }
    if pen_flags & PEN_DATA_NON_CENTER != 0 {
        p.skip(4);
    }
    if pen_flags & PEN_DATA_COMPOUND_LINE != 0 {
        let count = p.read_u32() as usize;
        p.skip(count.saturating_mul(4));
    }
    for flag in [PEN_DATA_CUSTOM_START_CAP, PEN_DATA_CUSTOM_END_CAP] {
        if pen_flags & flag != 0 {
            let size = p.read_u32() as usize;
            p.skip(size);
        }
    }
    if p.remaining() == 0 {
        return Err(MetafileError::malformed(
            record.offset,
            "pen data leaves no room for the brush",
        ));
    }
    Ok(())
}

/// Fill color for a brush id field: inline ARGB or an object reference
fn brush_color(ctx: &ReplayContext<'_>, flags: u16, value: u32) -> Color {
    if flags & FLAG_SOLID_COLOR != 0 {
        return Color::from_argb(value);
    }
    match ctx.plus.objects.select(value & 0xFF) {
        Some(GdiObject::Brush(brush)) => brush.color,
        _ => {
            debug!("EMF+ brush {} not defined", value);
            Color::BLACK
        }
    }
}

/// Pen from the object id in the low flag bits
fn apply_pen(ctx: &mut ReplayContext<'_>, flags: u16) {
    let id = (flags & 0xFF) as u32;
    let (color, width) = match ctx.plus.objects.select(id) {
        Some(GdiObject::Pen(pen)) => (pen.color, pen.width),
        _ => {
            debug!("EMF+ pen {} not defined", id);
            (Color::BLACK, 1.0)
        }
    };
    ctx.surface.set_stroke_color(color);
    ctx.surface.set_line_width(if width > 0.0 { width } else { 1.0 });
}

fn draw_ellipse(ctx: &mut ReplayContext<'_>, (x, y, w, h): (f64, f64, f64, f64)) {
    let (a, b) = (ctx.plus.point(x, y), ctx.plus.point(x + w, y + h));
    ctx.surface.ellipse(
        (a.x + b.x) / 2.0,
        (a.y + b.y) / 2.0,
        (b.x - a.x).abs() / 2.0,
        (b.y - a.y).abs() / 2.0,
    );
}

fn read_rect(record: &Record<'_>, p: &mut ByteCursor<'_>, compressed: bool) -> MetafileResult<(f64, f64, f64, f64)> {
    let size = if compressed { 8 } else { 16 };
    require(record, p.position() + size)?;
    Ok(if compressed {
        (
            p.read_i16() as f64,
            p.read_i16() as f64,
            p.read_i16() as f64,
            p.read_i16() as f64,
        )
    } else {
        (
            p.read_f32() as f64,
            p.read_f32() as f64,
            p.read_f32() as f64,
            p.read_f32() as f64,
        )
    })
}

/// Count-prefixed rectangle list
fn read_rects(
    record: &Record<'_>,
    p: &mut ByteCursor<'_>,
    compressed: bool,
) -> MetafileResult<Vec<(f64, f64, f64, f64)>> {
    let count = read_count(record, p, if compressed { 8 } else { 16 })?;
    (0..count).map(|_| read_rect(record, p, compressed)).collect()
}

/// Count-prefixed point list
fn read_points(record: &Record<'_>, p: &mut ByteCursor<'_>, compressed: bool) -> MetafileResult<Vec<(f64, f64)>> {
    let count = read_count(record, p, if compressed { 4 } else { 8 })?;
    Ok((0..count)
        .map(|_| {
            if compressed {
                (p.read_i16() as f64, p.read_i16() as f64)
            } else {
                (p.read_f32() as f64, p.read_f32() as f64)
            }
        })
        .collect())
}

fn read_count(record: &Record<'_>, p: &mut ByteCursor<'_>, item_size: usize) -> MetafileResult<usize> {
    require(record, p.position() + 4)?;
    let count = p.read_u32() as usize;
    let needed = count
        .checked_mul(item_size)
        .and_then(|n| n.checked_add(p.position()))
        .ok_or_else(|| MetafileError::malformed(record.offset, "element count overflows"))?;
    require(record, needed)?;
    Ok(count)
}
