//! EMF record handlers

use super::{decode_ansi, decode_utf16, flatten_beziers, require, PathState, ReplayContext, TA_UPDATECP};
use crate::cursor::ByteCursor;
use crate::emf::read_rectl;
use crate::emf_records::EmfRecordKind;
use crate::error::{MetafileError, MetafileResult};
use crate::objects::{Brush, Font, GdiObject, Pen, BS_NULL, PS_NULL};
use crate::record::Record;
use crate::types::Color;
use log::trace;

/// Bounds RECTL that leads every poly record
const BOUNDS_SIZE: usize = 16;
/// LOGFONTW up to and including the face name
const LOGFONTW_SIZE: usize = 92;
/// Offset of the EMRTEXT structure inside an EXTTEXTOUT payload
const EMRTEXT_OFFSET: usize = 28;
/// Record header bytes stripped from the payload
const RECORD_HEADER_SIZE: usize = 8;

pub(super) fn dispatch(ctx: &mut ReplayContext<'_>, record: &Record<'_>) -> MetafileResult<bool> {
    let kind = EmfRecordKind::from_opcode(record.opcode);
    trace!("EMF {} at {}", kind.name(), record.offset);
    let mut p = record.payload_cursor();

    match kind {
        EmfRecordKind::SetMapMode => {
            require(record, 4)?;
            ctx.mapper.set_mode(p.read_u32());
        }
        EmfRecordKind::SetWindowOrgEx => {
            require(record, 8)?;
            let (x, y) = (p.read_i32(), p.read_i32());
            ctx.mapper.set_window_origin(x, y);
        }
        EmfRecordKind::SetWindowExtEx => {
            require(record, 8)?;
            let (w, h) = (p.read_i32(), p.read_i32());
            ctx.mapper.set_window_extent(w, h);
        }
        EmfRecordKind::SetViewportOrgEx => {
            require(record, 8)?;
            let (x, y) = (p.read_i32(), p.read_i32());
            ctx.mapper.set_viewport_origin(x, y);
        }
        EmfRecordKind::SetViewportExtEx => {
            require(record, 8)?;
            let (w, h) = (p.read_i32(), p.read_i32());
            ctx.mapper.set_viewport_extent(w, h);
        }
        EmfRecordKind::ScaleWindowExtEx | EmfRecordKind::ScaleViewportExtEx => {
            require(record, 16)?;
            let x_num = p.read_i32();
            let x_denom = p.read_i32();
            let y_num = p.read_i32();
            let y_denom = p.read_i32();
            if kind == EmfRecordKind::ScaleWindowExtEx {
                ctx.mapper.scale_window_extent(x_num, x_denom, y_num, y_denom);
            } else {
                ctx.mapper.scale_viewport_extent(x_num, x_denom, y_num, y_denom);
            }
        }

        EmfRecordKind::SetTextColor => {
            require(record, 4)?;
            ctx.dc.text_color = Color::from_colorref(p.read_u32());
        }
        EmfRecordKind::SetBkColor => {
            require(record, 4)?;
            ctx.dc.bk_color = Color::from_colorref(p.read_u32());
        }
        EmfRecordKind::SetBkMode => {
            require(record, 4)?;
            ctx.dc.bk_mode = p.read_u32();
        }
        EmfRecordKind::SetPolyFillMode => {
            require(record, 4)?;
            ctx.dc.poly_fill_mode = p.read_u32();
        }
        EmfRecordKind::SetRop2 => {
            require(record, 4)?;
            ctx.dc.rop2 = p.read_u32();
        }
        EmfRecordKind::SetStretchBltMode => {
            require(record, 4)?;
            ctx.dc.stretch_mode = p.read_u32();
        }
        EmfRecordKind::SetTextAlign => {
            require(record, 4)?;
            ctx.dc.text_align = p.read_u32();
        }

        EmfRecordKind::CreatePen => {
            require(record, 20)?;
            let index = p.read_u32();
            let style = p.read_u32();
            let width = p.read_i32() as f64;
            let _height = p.read_i32();
            let color = Color::from_colorref(p.read_u32());
            ctx.put_object(record, index, GdiObject::Pen(Pen { style, width, color }))?;
        }
        EmfRecordKind::ExtCreatePen => {
            require(record, 36)?;
            let index = p.read_u32();
            // DIB pattern offsets and sizes
            p.skip(16);
            let mut style = p.read_u32();
            let width = p.read_u32() as f64;
            let brush_style = p.read_u32();
            let color = Color::from_colorref(p.read_u32());
            if brush_style == BS_NULL {
                style = PS_NULL;
            }
            ctx.put_object(record, index, GdiObject::Pen(Pen { style, width, color }))?;
        }
        EmfRecordKind::CreateBrushIndirect => {
            require(record, 16)?;
            let index = p.read_u32();
            let style = p.read_u32();
            let color = Color::from_colorref(p.read_u32());
            let hatch = p.read_u32();
            ctx.put_object(record, index, GdiObject::Brush(Brush { style, color, hatch }))?;
        }
        EmfRecordKind::ExtCreateFontIndirectW => {
            require(record, 4 + LOGFONTW_SIZE)?;
            let index = p.read_u32();
            let font = read_logfont(&mut p);
            trace!("EMF font {:?} in slot {}", font, index);
            ctx.put_object(record, index, GdiObject::Font(font))?;
        }
        EmfRecordKind::CreateMonoBrush | EmfRecordKind::CreateDibPatternBrushPt => {
            require(record, 4)?;
            let index = p.read_u32();
            ctx.put_object(record, index, GdiObject::Placeholder("pattern brush"))?;
        }
        EmfRecordKind::CreatePalette => {
            require(record, 4)?;
            let index = p.read_u32();
            ctx.put_object(record, index, GdiObject::Placeholder("palette"))?;
        }
        EmfRecordKind::CreateColorSpace | EmfRecordKind::CreateColorSpaceW => {
            require(record, 4)?;
            let index = p.read_u32();
            ctx.put_object(record, index, GdiObject::Placeholder("color space"))?;
        }
        EmfRecordKind::SelectObject => {
            require(record, 4)?;
            ctx.select(p.read_u32());
        }
        EmfRecordKind::DeleteObject | EmfRecordKind::DeleteColorSpace => {
            require(record, 4)?;
            ctx.objects.delete(p.read_u32());
        }

        EmfRecordKind::MoveToEx => {
            require(record, 8)?;
            let (x, y) = (p.read_i32(), p.read_i32());
            ctx.move_to(x as f64, y as f64);
        }
        EmfRecordKind::LineTo => {
            require(record, 8)?;
            let (x, y) = (p.read_i32(), p.read_i32());
            ctx.line_to(x as f64, y as f64);
        }
        EmfRecordKind::Rectangle | EmfRecordKind::RoundRect | EmfRecordKind::Ellipse => {
            require(record, BOUNDS_SIZE)?;
            let rect = read_rectl(&mut p);
            let (l, t, r, b) = (
                rect.left as f64,
                rect.top as f64,
                rect.right as f64,
                rect.bottom as f64,
            );
            if kind == EmfRecordKind::Ellipse {
                ctx.ellipse(l, t, r, b);
            } else {
                ctx.rectangle(l, t, r, b);
            }
        }
        EmfRecordKind::SetPixelV => {
            require(record, 12)?;
            let (x, y) = (p.read_i32(), p.read_i32());
            let color = Color::from_colorref(p.read_u32());
            let at = ctx.point(x as f64, y as f64);
            ctx.surface.set_fill_color(color);
            ctx.surface.fill_rect(at.x, at.y, 1.0, 1.0);
        }

        EmfRecordKind::Polyline | EmfRecordKind::Polyline16 => {
            let points = read_poly(record, kind == EmfRecordKind::Polyline16)?;
            ctx.polyline(&points);
        }
        EmfRecordKind::Polygon | EmfRecordKind::Polygon16 => {
            let points = read_poly(record, kind == EmfRecordKind::Polygon16)?;
            ctx.polygon(&points);
        }
        EmfRecordKind::PolyLineTo | EmfRecordKind::PolyLineTo16 => {
            let points = read_poly(record, kind == EmfRecordKind::PolyLineTo16)?;
            ctx.polyline_from_current(&points);
        }
        EmfRecordKind::PolyBezier | EmfRecordKind::PolyBezier16 => {
            let points = read_poly(record, kind == EmfRecordKind::PolyBezier16)?;
            if let Some((&start, controls)) = points.split_first() {
                ctx.polyline(&flatten_beziers(start, controls));
            }
        }
        EmfRecordKind::PolyBezierTo | EmfRecordKind::PolyBezierTo16 => {
            let points = read_poly(record, kind == EmfRecordKind::PolyBezierTo16)?;
            let flattened = flatten_beziers(ctx.dc.position, &points);
            ctx.polyline_from_current(&flattened[1..]);
        }
        EmfRecordKind::PolyPolyline | EmfRecordKind::PolyPolyline16 => {
            let compact = kind == EmfRecordKind::PolyPolyline16;
            for points in read_poly_poly(record, compact)? {
                ctx.polyline(&points);
            }
        }
        EmfRecordKind::PolyPolygon | EmfRecordKind::PolyPolygon16 => {
            let compact = kind == EmfRecordKind::PolyPolygon16;
            for points in read_poly_poly(record, compact)? {
                ctx.polygon(&points);
            }
        }

        EmfRecordKind::BeginPath => {
            ctx.path = Some(PathState {
                figures: Vec::new(),
                recording: true,
            });
        }
        EmfRecordKind::EndPath => {
            if let Some(path) = ctx.path.as_mut() {
                path.recording = false;
            }
        }
        EmfRecordKind::CloseFigure => {
            if let Some(figure) = ctx.path.as_mut().and_then(|path| path.figures.last_mut()) {
                if let Some(&first) = figure.first() {
                    figure.push(first);
                }
            }
        }
        EmfRecordKind::AbortPath | EmfRecordKind::SelectClipPath => ctx.path = None,
        EmfRecordKind::FillPath | EmfRecordKind::StrokePath | EmfRecordKind::StrokeAndFillPath => {
            render_path(ctx, kind);
        }

        EmfRecordKind::ExtTextOutA | EmfRecordKind::ExtTextOutW => {
            let (text, x, y) = read_ext_text(record, kind == EmfRecordKind::ExtTextOutW)?;
            if ctx.dc.text_align & TA_UPDATECP != 0 {
                let (cx, cy) = ctx.dc.position;
                ctx.text(&text, cx, cy);
            } else {
                ctx.text(&text, x, y);
            }
        }

        EmfRecordKind::SaveDc => ctx.save_dc(),
        EmfRecordKind::RestoreDc => {
            require(record, 4)?;
            ctx.restore_dc(p.read_i32());
        }

        // Recognized, no drawing effect
        EmfRecordKind::Header
        | EmfRecordKind::Eof
        | EmfRecordKind::Comment
        | EmfRecordKind::SetBrushOrgEx
        | EmfRecordKind::SetMapperFlags
        | EmfRecordKind::SetColorAdjustment
        | EmfRecordKind::OffsetClipRgn
        | EmfRecordKind::SetMetaRgn
        | EmfRecordKind::ExcludeClipRect
        | EmfRecordKind::IntersectClipRect
        | EmfRecordKind::SetWorldTransform
        | EmfRecordKind::ModifyWorldTransform
        | EmfRecordKind::AngleArc
        | EmfRecordKind::Arc
        | EmfRecordKind::Chord
        | EmfRecordKind::Pie
        | EmfRecordKind::SelectPalette
        | EmfRecordKind::SetPaletteEntries
        | EmfRecordKind::ResizePalette
        | EmfRecordKind::RealizePalette
        | EmfRecordKind::ExtFloodFill
        | EmfRecordKind::ArcTo
        | EmfRecordKind::PolyDraw
        | EmfRecordKind::SetArcDirection
        | EmfRecordKind::SetMiterLimit
        | EmfRecordKind::FlattenPath
        | EmfRecordKind::WidenPath
        | EmfRecordKind::FillRgn
        | EmfRecordKind::FrameRgn
        | EmfRecordKind::InvertRgn
        | EmfRecordKind::PaintRgn
        | EmfRecordKind::ExtSelectClipRgn
        | EmfRecordKind::BitBlt
        | EmfRecordKind::StretchBlt
        | EmfRecordKind::MaskBlt
        | EmfRecordKind::PlgBlt
        | EmfRecordKind::SetDiBitsToDevice
        | EmfRecordKind::StretchDiBits
        | EmfRecordKind::PolyDraw16
        | EmfRecordKind::PolyTextOutA
        | EmfRecordKind::PolyTextOutW
        | EmfRecordKind::SetIcmMode
        | EmfRecordKind::SetColorSpace
        | EmfRecordKind::GlsRecord
        | EmfRecordKind::GlsBoundedRecord
        | EmfRecordKind::PixelFormat
        | EmfRecordKind::DrawEscape
        | EmfRecordKind::ExtEscape
        | EmfRecordKind::SmallTextOut
        | EmfRecordKind::ForceUfiMapping
        | EmfRecordKind::NamedEscape
        | EmfRecordKind::ColorCorrectPalette
        | EmfRecordKind::SetIcmProfileA
        | EmfRecordKind::SetIcmProfileW
        | EmfRecordKind::AlphaBlend
        | EmfRecordKind::SetLayout
        | EmfRecordKind::TransparentBlt
        | EmfRecordKind::GradientFill
        | EmfRecordKind::SetLinkedUfis
        | EmfRecordKind::SetTextJustification
        | EmfRecordKind::ColorMatchToTargetW => {}

        EmfRecordKind::Unhandled(opcode) => {
            if record.payload.len() >= BOUNDS_SIZE {
                let bounds = read_rectl(&mut p);
                if !bounds.is_empty() {
                    trace!(
                        "Unhandled EMF record {} at {} with plausible bounds {:?}",
                        opcode,
                        record.offset,
                        bounds
                    );
                }
            }
            return Ok(false);
        }
    }

    Ok(true)
}

fn render_path(ctx: &mut ReplayContext<'_>, kind: EmfRecordKind) {
    let Some(path) = ctx.path.take() else {
        trace!("{} without a path", kind.name());
        return;
    };

    match kind {
        EmfRecordKind::StrokePath => {
            if ctx.apply_pen() {
                for figure in path.figures.iter().filter(|f| f.len() >= 2) {
                    ctx.surface.polyline(figure);
                }
            }
        }
        EmfRecordKind::FillPath => {
            ctx.apply_brush();
            ctx.surface.set_stroke_color(Color::TRANSPARENT);
            for figure in path.figures.iter().filter(|f| f.len() >= 3) {
                ctx.surface.polygon_fill_stroke(figure);
            }
        }
        _ => {
            ctx.apply_brush();
            ctx.apply_pen();
            for figure in path.figures.iter().filter(|f| f.len() >= 2) {
                ctx.surface.polygon_fill_stroke(figure);
            }
        }
    }
}

fn read_point(p: &mut ByteCursor<'_>, compact: bool) -> (f64, f64) {
    if compact {
        (p.read_i16() as f64, p.read_i16() as f64)
    } else {
        (p.read_i32() as f64, p.read_i32() as f64)
    }
}

fn point_size(compact: bool) -> usize {
    if compact {
        4
    } else {
        8
    }
}

/// Bounds, count and points of a single-poly record
fn read_poly(record: &Record<'_>, compact: bool) -> MetafileResult<Vec<(f64, f64)>> {
    require(record, BOUNDS_SIZE + 4)?;
    let mut p = record.payload_cursor();
    p.skip(BOUNDS_SIZE);
    let count = p.read_u32() as usize;
    let needed = count
        .checked_mul(point_size(compact))
        .and_then(|n| n.checked_add(BOUNDS_SIZE + 4))
        .ok_or_else(|| MetafileError::malformed(record.offset, "point count overflows"))?;
    require(record, needed)?;
    Ok((0..count).map(|_| read_point(&mut p, compact)).collect())
}

/// Bounds, polygon count, total points, per-polygon counts, then points
fn read_poly_poly(record: &Record<'_>, compact: bool) -> MetafileResult<Vec<Vec<(f64, f64)>>> {
    require(record, BOUNDS_SIZE + 8)?;
    let mut p = record.payload_cursor();
    p.skip(BOUNDS_SIZE);
    let polys = p.read_u32() as usize;
    let total = p.read_u32() as usize;

    let counts_end = polys
        .checked_mul(4)
        .and_then(|n| n.checked_add(BOUNDS_SIZE + 8))
        .ok_or_else(|| MetafileError::malformed(record.offset, "polygon count overflows"))?;
    require(record, counts_end)?;
    let counts: Vec<usize> = (0..polys).map(|_| p.read_u32() as usize).collect();
    if counts.iter().sum::<usize>() != total {
        return Err(MetafileError::malformed(
            record.offset,
            format!("polygon counts do not add up to {}", total),
        ));
    }
    let needed = total
        .checked_mul(point_size(compact))
        .and_then(|n| n.checked_add(counts_end))
        .ok_or_else(|| MetafileError::malformed(record.offset, "point count overflows"))?;
    require(record, needed)?;

    Ok(counts
        .into_iter()
        .map(|count| (0..count).map(|_| read_point(&mut p, compact)).collect::<Vec<_>>())
        .collect())
}

/// Reference point and decoded string of an EXTTEXTOUTA/W record
fn read_ext_text(record: &Record<'_>, wide: bool) -> MetafileResult<(String, f64, f64)> {
    require(record, EMRTEXT_OFFSET + 16)?;
    let mut p = record.payload_cursor();
    p.seek(EMRTEXT_OFFSET);
    let x = p.read_i32() as f64;
    let y = p.read_i32() as f64;
    let chars = p.read_u32() as usize;
    let string_offset = p.read_u32() as usize;

    // offString counts from the record start, which includes the 8-byte header
    let start = string_offset
        .checked_sub(RECORD_HEADER_SIZE)
        .ok_or_else(|| MetafileError::malformed(record.offset, "string offset inside record header"))?;
    let len = if wide { chars.saturating_mul(2) } else { chars };
    let bytes = start
        .checked_add(len)
        .and_then(|end| record.payload.get(start..end))
        .ok_or_else(|| {
            MetafileError::malformed(
                record.offset,
                format!("{} characters at {} run past the record", chars, string_offset),
            )
        })?;

    let text = if wide {
        decode_utf16(bytes)
    } else {
        decode_ansi(bytes)
    };
    Ok((text, x, y))
}

fn read_logfont(p: &mut ByteCursor<'_>) -> Font {
    let height = p.read_i32();
    let _width = p.read_i32();
    let _escapement = p.read_i32();
    let _orientation = p.read_i32();
    let weight = p.read_i32();
    let italic = p.read_u8() != 0;
    // underline, strike-out, charset, precisions, quality, pitch
    p.skip(7);
    let name = p.read_bytes(64);
    let face_name = decode_utf16(name)
        .split('\0')
        .next()
        .unwrap_or_default()
        .to_string();
    Font {
        height,
        weight,
        italic,
        face_name,
    }
}

#[cfg(test)]
mod tests {
    use crate::emf_records::EMR_EOF;
    use crate::objects::{NULL_BRUSH, WHITE_BRUSH};
    use crate::surface::{RecordingSurface, SurfaceOp};
    use crate::testutil::{dwords, words, EmfBuilder};
    use crate::types::{Color, Point};
    use crate::{decode, replay, ReplaySummary};

    fn run(data: &[u8]) -> (RecordingSurface, ReplaySummary) {
        let metafile = decode(data);
        assert!(metafile.error.is_none(), "{:?}", metafile.error);
        let mut surface = RecordingSurface::new();
        let summary = replay(&metafile, &mut surface);
        (surface, summary)
    }

    fn ext_text_out_w(x: i32, y: i32, text: &str, chars: u32) -> Vec<u8> {
        let mut payload = dwords(&[0, 0, 100, 100, 1]);
        payload.extend_from_slice(&1.0f32.to_le_bytes());
        payload.extend_from_slice(&1.0f32.to_le_bytes());
        // reference, nChars, offString (header + 68-byte fixed part), options, rect, offDx
        payload.extend_from_slice(&dwords(&[x, y, chars as i32, 76, 0, 0, 0, 0, 0, 0]));
        payload.extend(text.encode_utf16().flat_map(|u| u.to_le_bytes()));
        payload
    }

    #[test]
    fn test_size_from_bounds_and_eof_is_noop() {
        let data = EmfBuilder::new()
            .bounds(0, 0, 199, 99)
            .record(EMR_EOF, &[0u8; 12])
            .finish();
        let (surface, summary) = run(&data);
        assert_eq!(surface.ops[0], SurfaceOp::SetSize(200.0, 100.0));
        assert_eq!(surface.ops.len(), 2);
        assert_eq!(summary.dispatched, 1);
        assert_eq!(summary.unhandled, 0);
    }

    #[test]
    fn test_rectangle_with_indexed_objects() {
        let data = EmfBuilder::new()
            .record(38, &dwords(&[1, 0, 2, 0, 0x0000FF00])) // green pen in slot 1
            .record(39, &dwords(&[2, 0, 0x00FF0000, 0])) // blue brush in slot 2
            .record(37, &dwords(&[1]))
            .record(37, &dwords(&[2]))
            .record(43, &dwords(&[10, 20, 30, 60]))
            .finish();
        let (surface, _) = run(&data);
        assert!(surface
            .ops
            .contains(&SurfaceOp::SetStrokeColor(Color::rgb(0, 255, 0))));
        assert!(surface
            .ops
            .contains(&SurfaceOp::SetFillColor(Color::rgb(0, 0, 255))));
        assert!(surface
            .ops
            .contains(&SurfaceOp::FillRect(10.0, 20.0, 20.0, 40.0)));
        assert!(surface
            .ops
            .contains(&SurfaceOp::StrokeRect(10.0, 20.0, 20.0, 40.0)));
    }

    #[test]
    fn test_stock_objects_resolve() {
        let data = EmfBuilder::new()
            .record(37, &dwords(&[NULL_BRUSH as i32]))
            .record(43, &dwords(&[0, 0, 5, 5]))
            .record(37, &dwords(&[WHITE_BRUSH as i32]))
            .record(43, &dwords(&[0, 0, 5, 5]))
            .finish();
        let (surface, _) = run(&data);
        assert_eq!(surface.count(|op| matches!(op, SurfaceOp::FillRect(..))), 1);
        assert_eq!(surface.count(|op| matches!(op, SurfaceOp::StrokeRect(..))), 2);
    }

    #[test]
    fn test_polyline16_and_polygon() {
        let mut polyline = dwords(&[0, 0, 10, 10, 3]);
        polyline.extend_from_slice(&words(&[0, 0, 10, 0, 10, 10]));
        let data = EmfBuilder::new()
            .record(87, &polyline)
            .record(3, &dwords(&[0, 0, 4, 4, 3, 0, 0, 4, 0, 4, 4]))
            .finish();
        let (surface, summary) = run(&data);
        assert_eq!(summary.failed, 0);
        assert!(surface.ops.contains(&SurfaceOp::Polyline(vec![
            Point::new(0.0, 0.0),
            Point::new(10.0, 0.0),
            Point::new(10.0, 10.0)
        ])));
        assert_eq!(
            surface.count(|op| matches!(op, SurfaceOp::PolygonFillStroke(p) if p.len() == 3)),
            1
        );
    }

    #[test]
    fn test_poly_polygon16_with_bad_total_fails() {
        let mut payload = dwords(&[0, 0, 10, 10, 2, 7, 3, 3]);
        payload.extend_from_slice(&words(&[0, 0, 1, 0, 1, 1, 5, 5, 6, 5, 6, 6]));
        let data = EmfBuilder::new().record(91, &payload).finish();
        let (surface, summary) = run(&data);
        assert_eq!(summary.failed, 1);
        assert_eq!(
            surface.count(|op| matches!(op, SurfaceOp::PolygonFillStroke(_))),
            0
        );
    }

    #[test]
    fn test_path_bracket_fills_on_fill_path() {
        let data = EmfBuilder::new()
            .record(59, &[])
            .record(27, &dwords(&[0, 0]))
            .record(54, &dwords(&[10, 0]))
            .record(54, &dwords(&[10, 10]))
            .record(61, &[])
            .record(60, &[])
            .record(62, &dwords(&[0, 0, 10, 10]))
            .finish();
        let (surface, _) = run(&data);
        assert_eq!(surface.count(|op| matches!(op, SurfaceOp::MoveTo(..))), 0);
        let figure = surface.ops.iter().find_map(|op| match op {
            SurfaceOp::PolygonFillStroke(points) => Some(points.clone()),
            _ => None,
        });
        assert_eq!(figure.map(|f| f.len()), Some(4));
    }

    #[test]
    fn test_ext_text_out_w() {
        let data = EmfBuilder::new()
            .record(84, &ext_text_out_w(15, 25, "Hé", 2))
            .finish();
        let (surface, summary) = run(&data);
        assert_eq!(summary.failed, 0);
        assert!(surface
            .ops
            .contains(&SurfaceOp::DrawText("Hé".to_string(), 15.0, 25.0)));
    }

    #[test]
    fn test_ext_text_out_past_payload_fails() {
        let data = EmfBuilder::new()
            .record(84, &ext_text_out_w(0, 0, "Hi", 500))
            .record(27, &dwords(&[1, 1]))
            .finish();
        let (surface, summary) = run(&data);
        assert_eq!(summary.failed, 1);
        assert_eq!(surface.count(|op| matches!(op, SurfaceOp::DrawText(..))), 0);
        assert_eq!(surface.count(|op| matches!(op, SurfaceOp::MoveTo(..))), 1);
    }

    #[test]
    fn test_unknown_record_counts_as_unhandled() {
        let data = EmfBuilder::new()
            .record(200, &dwords(&[0, 0, 50, 50]))
            .record(33, &[])
            .finish();
        let (_, summary) = run(&data);
        assert_eq!(summary.dispatched, 2);
        assert_eq!(summary.unhandled, 1);
    }

    #[test]
    fn test_mapping_mode_metric() {
        let data = EmfBuilder::new()
            .record(17, &dwords(&[2])) // MM_LOMETRIC
            .record(27, &dwords(&[100, 200]))
            .finish();
        let (surface, _) = run(&data);
        let moved = surface.ops.iter().find_map(|op| match op {
            SurfaceOp::MoveTo(x, y) => Some((*x, *y)),
            _ => None,
        });
        let (x, y) = moved.unwrap();
        assert!((x - 10.0).abs() < 1e-9);
        assert!((y - 20.0).abs() < 1e-9);
    }

    fn ext_text_out_a(x: i32, y: i32, text: &[u8]) -> Vec<u8> {
        let mut payload = dwords(&[0, 0, 100, 100, 1]);
        payload.extend_from_slice(&1.0f32.to_le_bytes());
        payload.extend_from_slice(&1.0f32.to_le_bytes());
        payload.extend_from_slice(&dwords(&[x, y, text.len() as i32, 76, 0, 0, 0, 0, 0, 0]));
        payload.extend_from_slice(text);
        payload
    }

    fn polylines(surface: &RecordingSurface) -> Vec<Vec<Point>> {
        surface
            .ops
            .iter()
            .filter_map(|op| match op {
                SurfaceOp::Polyline(points) => Some(points.clone()),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_object_index_past_handle_count_fails_record() {
        let data = EmfBuilder::new()
            .record(38, &dwords(&[0x7FFF_FFFF, 0, 1, 0, 0x0000FF]))
            .record(39, &dwords(&[8, 0, 0x0000FF, 0]))
            .record(27, &dwords(&[4, 4]))
            .finish();
        let (surface, summary) = run(&data);
        assert_eq!(summary.failed, 2);
        assert_eq!(summary.dispatched, 3);
        assert!(surface.ops.contains(&SurfaceOp::MoveTo(4.0, 4.0)));
    }

    #[test]
    fn test_ext_create_pen_with_null_brush_is_null_pen() {
        let data = EmfBuilder::new()
            // index, DIB fields, style, width, brush style, color, hatch, entries
            .record(95, &dwords(&[1, 0, 0, 0, 0, 0, 5, 1, 0x0000FF, 0, 0]))
            .record(95, &dwords(&[2, 0, 0, 0, 0, 0, 5, 0, 0x0000FF, 0, 0]))
            .record(37, &dwords(&[1]))
            .record(43, &dwords(&[0, 0, 10, 10]))
            .record(37, &dwords(&[2]))
            .record(43, &dwords(&[0, 0, 10, 10]))
            .finish();
        let (surface, summary) = run(&data);
        assert_eq!(summary.failed, 0);
        assert_eq!(surface.count(|op| matches!(op, SurfaceOp::StrokeRect(..))), 1);
        assert_eq!(surface.count(|op| matches!(op, SurfaceOp::FillRect(..))), 2);
        assert!(surface
            .ops
            .contains(&SurfaceOp::SetStrokeColor(Color::TRANSPARENT)));
        assert!(surface.ops.contains(&SurfaceOp::SetLineWidth(5.0)));
    }

    #[test]
    fn test_font_lands_in_its_slot() {
        let mut font = dwords(&[1, -20, 0, 0, 0, 700]);
        font.extend_from_slice(&[0u8; 8]);
        let mut face: Vec<u8> = "Arial".encode_utf16().flat_map(|u| u.to_le_bytes()).collect();
        face.resize(64, 0);
        font.extend_from_slice(&face);

        let data = EmfBuilder::new()
            .record(82, &font)
            .record(38, &dwords(&[2, 0, 1, 0, 0x0000FF]))
            .record(37, &dwords(&[2]))
            .record(54, &dwords(&[10, 10]))
            .record(37, &dwords(&[1]))
            .record(84, &ext_text_out_w(5, 5, "Hi", 2))
            .finish();
        let (surface, summary) = run(&data);
        assert_eq!(summary.failed, 0);
        assert!(surface
            .ops
            .contains(&SurfaceOp::SetStrokeColor(Color::rgb(255, 0, 0))));
        assert!(surface
            .ops
            .contains(&SurfaceOp::SetFont("Arial".to_string(), 20.0)));
        assert!(surface
            .ops
            .contains(&SurfaceOp::DrawText("Hi".to_string(), 5.0, 5.0)));
    }

    #[test]
    fn test_poly_bezier16_is_flattened() {
        let mut payload = dwords(&[0, 0, 10, 10, 4]);
        payload.extend_from_slice(&words(&[0, 0, 0, 10, 10, 10, 10, 0]));
        let data = EmfBuilder::new().record(85, &payload).finish();
        let (surface, _) = run(&data);
        let lines = polylines(&surface);
        assert_eq!(lines.len(), 1);
        let line = &lines[0];
        assert_eq!(line.len(), 17);
        assert_eq!(line[0], Point::new(0.0, 0.0));
        assert_eq!(line[16], Point::new(10.0, 0.0));
        assert!((line[8].x - 5.0).abs() < 1e-9);
        assert!((line[8].y - 7.5).abs() < 1e-9);
    }

    #[test]
    fn test_poly_bezier_to_moves_current_position() {
        let data = EmfBuilder::new()
            .record(27, &dwords(&[0, 0]))
            .record(5, &dwords(&[0, 0, 20, 10, 3, 0, 10, 10, 10, 20, 0]))
            .record(54, &dwords(&[30, 0]))
            .finish();
        let (surface, summary) = run(&data);
        assert_eq!(summary.failed, 0);
        let lines = polylines(&surface);
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].len(), 17);
        assert_eq!(lines[0][0], Point::new(0.0, 0.0));
        assert_eq!(lines[0][16], Point::new(20.0, 0.0));
        assert!(surface.ops.contains(&SurfaceOp::MoveTo(20.0, 0.0)));
        assert!(surface.ops.contains(&SurfaceOp::LineTo(30.0, 0.0)));
    }

    #[test]
    fn test_poly_line_to16_continues_from_current() {
        let mut payload = dwords(&[0, 0, 10, 10, 2]);
        payload.extend_from_slice(&words(&[10, 5, 10, 10]));
        let data = EmfBuilder::new()
            .record(27, &dwords(&[5, 5]))
            .record(89, &payload)
            .record(54, &dwords(&[0, 10]))
            .finish();
        let (surface, _) = run(&data);
        assert_eq!(
            polylines(&surface),
            vec![vec![
                Point::new(5.0, 5.0),
                Point::new(10.0, 5.0),
                Point::new(10.0, 10.0)
            ]]
        );
        assert!(surface.ops.contains(&SurfaceOp::MoveTo(10.0, 10.0)));
    }

    #[test]
    fn test_poly_polyline_splits_by_counts() {
        let data = EmfBuilder::new()
            .record(7, &dwords(&[0, 0, 3, 3, 2, 5, 2, 3, 0, 0, 1, 1, 2, 2, 3, 2, 3, 3]))
            .finish();
        let (surface, summary) = run(&data);
        assert_eq!(summary.failed, 0);
        let lines = polylines(&surface);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], vec![Point::new(0.0, 0.0), Point::new(1.0, 1.0)]);
        assert_eq!(lines[1].len(), 3);
        assert_eq!(lines[1][2], Point::new(3.0, 3.0));
    }

    #[test]
    fn test_ellipse_from_bounding_box() {
        let data = EmfBuilder::new()
            .record(42, &dwords(&[0, 0, 20, 10]))
            .finish();
        let (surface, _) = run(&data);
        let outline = surface.ops.iter().find_map(|op| match op {
            SurfaceOp::PolygonFillStroke(points) => Some(points.clone()),
            _ => None,
        });
        let outline = outline.unwrap();
        assert_eq!(outline.len(), 48);
        assert!((outline[0].x - 20.0).abs() < 1e-9);
        assert!((outline[0].y - 5.0).abs() < 1e-9);
    }

    #[test]
    fn test_scale_window_and_viewport_extents() {
        let data = EmfBuilder::new()
            .record(9, &dwords(&[100, 100]))
            .record(11, &dwords(&[100, 100]))
            .record(32, &dwords(&[2, 1, 1, 1])) // window x * 2/1
            .record(31, &dwords(&[1, 1, 3, 1])) // viewport y * 3/1
            .record(27, &dwords(&[100, 50]))
            .finish();
        let (surface, summary) = run(&data);
        assert_eq!(summary.failed, 0);
        let moved = surface.ops.iter().find_map(|op| match op {
            SurfaceOp::MoveTo(x, y) => Some((*x, *y)),
            _ => None,
        });
        let (x, y) = moved.unwrap();
        assert!((x - 50.0).abs() < 1e-9);
        assert!((y - 150.0).abs() < 1e-9);
    }

    #[test]
    fn test_set_pixel_v_paints_one_pixel() {
        let data = EmfBuilder::new()
            .record(15, &dwords(&[3, 4, 0x0000FF]))
            .finish();
        let (surface, _) = run(&data);
        assert!(surface
            .ops
            .contains(&SurfaceOp::SetFillColor(Color::rgb(255, 0, 0))));
        assert!(surface.ops.contains(&SurfaceOp::FillRect(3.0, 4.0, 1.0, 1.0)));
    }

    #[test]
    fn test_ext_text_out_a_decodes_ansi() {
        let data = EmfBuilder::new()
            .record(83, &ext_text_out_a(7, 9, b"caf\xE9"))
            .finish();
        let (surface, summary) = run(&data);
        assert_eq!(summary.failed, 0);
        assert!(surface
            .ops
            .contains(&SurfaceOp::DrawText("café".to_string(), 7.0, 9.0)));
    }
}
