//! WMF record handlers
//!
//! WMF parameters are 16-bit and most records store coordinates in reverse
//! order (y before x, bottom-right before top-left).

use super::{decode_ansi, require, ReplayContext, TA_UPDATECP};
use crate::cursor::ByteCursor;
use crate::error::{MetafileError, MetafileResult};
use crate::objects::{Brush, Font, GdiObject, Pen};
use crate::record::Record;
use crate::types::Color;
use crate::wmf_records::WmfRecordKind;
use log::trace;

const ETO_OPAQUE: u16 = 0x0002;
const ETO_CLIPPED: u16 = 0x0004;
const FACE_NAME_LEN: usize = 32;

pub(super) fn dispatch(ctx: &mut ReplayContext<'_>, record: &Record<'_>) -> MetafileResult<bool> {
    let kind = WmfRecordKind::from_opcode(record.opcode as u16);
    trace!("WMF {} at {}", kind.name(), record.offset);
    let mut p = record.payload_cursor();

    match kind {
        WmfRecordKind::SetMapMode => {
            require(record, 2)?;
            ctx.mapper.set_mode(p.read_u16() as u32);
        }
        WmfRecordKind::SetWindowOrg => {
            require(record, 4)?;
            let (y, x) = (p.read_i16(), p.read_i16());
            ctx.mapper.set_window_origin(x as i32, y as i32);
        }
        WmfRecordKind::SetWindowExt => {
            require(record, 4)?;
            let (h, w) = (p.read_i16(), p.read_i16());
            ctx.mapper.set_window_extent(w as i32, h as i32);
        }
        WmfRecordKind::SetViewportOrg => {
            require(record, 4)?;
            let (y, x) = (p.read_i16(), p.read_i16());
            ctx.mapper.set_viewport_origin(x as i32, y as i32);
        }
        WmfRecordKind::SetViewportExt => {
            require(record, 4)?;
            let (h, w) = (p.read_i16(), p.read_i16());
            ctx.mapper.set_viewport_extent(w as i32, h as i32);
        }
        WmfRecordKind::OffsetWindowOrg => {
            require(record, 4)?;
            let (dy, dx) = (p.read_i16(), p.read_i16());
            ctx.mapper.offset_window_origin(dx as i32, dy as i32);
        }
        WmfRecordKind::OffsetViewportOrg => {
            require(record, 4)?;
            let (dy, dx) = (p.read_i16(), p.read_i16());
            ctx.mapper.offset_viewport_origin(dx as i32, dy as i32);
        }
        WmfRecordKind::ScaleWindowExt | WmfRecordKind::ScaleViewportExt => {
            require(record, 8)?;
            let y_denom = p.read_i16() as i32;
            let y_num = p.read_i16() as i32;
            let x_denom = p.read_i16() as i32;
            let x_num = p.read_i16() as i32;
            if kind == WmfRecordKind::ScaleWindowExt {
                ctx.mapper.scale_window_extent(x_num, x_denom, y_num, y_denom);
            } else {
                ctx.mapper.scale_viewport_extent(x_num, x_denom, y_num, y_denom);
            }
        }

        WmfRecordKind::SetBkColor => {
            require(record, 4)?;
            ctx.dc.bk_color = Color::from_colorref(p.read_u32());
        }
        WmfRecordKind::SetTextColor => {
            require(record, 4)?;
            ctx.dc.text_color = Color::from_colorref(p.read_u32());
        }
        WmfRecordKind::SetBkMode => {
            require(record, 2)?;
            ctx.dc.bk_mode = p.read_u16() as u32;
        }
        WmfRecordKind::SetRop2 => {
            require(record, 2)?;
            ctx.dc.rop2 = p.read_u16() as u32;
        }
        WmfRecordKind::SetPolyFillMode => {
            require(record, 2)?;
            ctx.dc.poly_fill_mode = p.read_u16() as u32;
        }
        WmfRecordKind::SetStretchBltMode => {
            require(record, 2)?;
            ctx.dc.stretch_mode = p.read_u16() as u32;
        }
        WmfRecordKind::SetTextAlign => {
            require(record, 2)?;
            ctx.dc.text_align = p.read_u16() as u32;
        }

        WmfRecordKind::CreatePenIndirect => {
            require(record, 10)?;
            let style = p.read_u16() as u32;
            let width = p.read_i16() as f64;
            let _height = p.read_i16();
            let color = Color::from_colorref(p.read_u32());
            ctx.objects.create(GdiObject::Pen(Pen { style, width, color }));
        }
        WmfRecordKind::CreateBrushIndirect => {
            require(record, 6)?;
            let style = p.read_u16() as u32;
            let color = Color::from_colorref(p.read_u32());
            let hatch = p.read_u16() as u32;
            ctx.objects
                .create(GdiObject::Brush(Brush { style, color, hatch }));
        }
        WmfRecordKind::CreateFontIndirect => {
            require(record, 18)?;
            let font = read_font(&mut p);
            trace!("WMF font {:?}", font);
            ctx.objects.create(GdiObject::Font(font));
        }
        WmfRecordKind::CreatePalette => {
            ctx.objects.create(GdiObject::Placeholder("palette"));
        }
        WmfRecordKind::CreatePatternBrush | WmfRecordKind::DibCreatePatternBrush => {
            ctx.objects.create(GdiObject::Placeholder("pattern brush"));
        }
        WmfRecordKind::CreateRegion => {
            ctx.objects.create(GdiObject::Placeholder("region"));
        }
        WmfRecordKind::SelectObject => {
            require(record, 2)?;
            ctx.select(p.read_u16() as u32);
        }
        WmfRecordKind::DeleteObject => {
            require(record, 2)?;
            ctx.objects.delete(p.read_u16() as u32);
        }

        WmfRecordKind::MoveTo => {
            require(record, 4)?;
            let (y, x) = (p.read_i16(), p.read_i16());
            ctx.move_to(x as f64, y as f64);
        }
        WmfRecordKind::LineTo => {
            require(record, 4)?;
            let (y, x) = (p.read_i16(), p.read_i16());
            ctx.line_to(x as f64, y as f64);
        }
        WmfRecordKind::Rectangle | WmfRecordKind::Ellipse => {
            require(record, 8)?;
            let (bottom, right, top, left) = read_rect16(&mut p);
            if kind == WmfRecordKind::Rectangle {
                ctx.rectangle(left, top, right, bottom);
            } else {
                ctx.ellipse(left, top, right, bottom);
            }
        }
        WmfRecordKind::RoundRect => {
            // Corner radii are dropped
            require(record, 12)?;
            let _corner_h = p.read_i16();
            let _corner_w = p.read_i16();
            let (bottom, right, top, left) = read_rect16(&mut p);
            ctx.rectangle(left, top, right, bottom);
        }
        WmfRecordKind::SetPixel => {
            require(record, 8)?;
            let color = Color::from_colorref(p.read_u32());
            let (y, x) = (p.read_i16(), p.read_i16());
            let at = ctx.point(x as f64, y as f64);
            ctx.surface.set_fill_color(color);
            ctx.surface.fill_rect(at.x, at.y, 1.0, 1.0);
        }
        WmfRecordKind::Polyline | WmfRecordKind::Polygon => {
            require(record, 2)?;
            let count = p.read_i16();
            if count < 0 {
                return Err(MetafileError::malformed(
                    record.offset,
                    format!("negative point count {}", count),
                ));
            }
            require(record, 2 + count as usize * 4)?;
            let points = read_points16(&mut p, count as usize);
            if kind == WmfRecordKind::Polyline {
                ctx.polyline(&points);
            } else {
                ctx.polygon(&points);
            }
        }
        WmfRecordKind::PolyPolygon => {
            require(record, 2)?;
            let polygons = p.read_u16() as usize;
            require(record, 2 + polygons * 2)?;
            let counts: Vec<usize> = (0..polygons).map(|_| p.read_u16() as usize).collect();
            let total: usize = counts.iter().sum();
            require(record, 2 + polygons * 2 + total * 4)?;
            for count in counts {
                let points = read_points16(&mut p, count);
                ctx.polygon(&points);
            }
        }
        WmfRecordKind::TextOut => {
            require(record, 2)?;
            let len = p.read_i16().max(0) as usize;
            let padded = len + len % 2;
            require(record, 2 + padded + 4)?;
            let text = decode_ansi(p.read_bytes(padded).get(..len).unwrap_or_default());
            let (y, x) = (p.read_i16(), p.read_i16());
            draw_text(ctx, &text, x as f64, y as f64);
        }
        WmfRecordKind::ExtTextOut => {
            require(record, 8)?;
            let (y, x) = (p.read_i16(), p.read_i16());
            let len = p.read_i16().max(0) as usize;
            let options = p.read_u16();
            let mut needed = 8 + len;
            if options & (ETO_OPAQUE | ETO_CLIPPED) != 0 {
                needed += 8;
                require(record, needed)?;
                let _clip = read_rect16(&mut p);
            }
            require(record, needed)?;
            let text = decode_ansi(p.read_bytes(len));
            draw_text(ctx, &text, x as f64, y as f64);
        }

        WmfRecordKind::SaveDc => ctx.save_dc(),
        WmfRecordKind::RestoreDc => {
            require(record, 2)?;
            ctx.restore_dc(p.read_i16() as i32);
        }

        // Recognized, no drawing effect
        WmfRecordKind::Eof
        | WmfRecordKind::RealizePalette
        | WmfRecordKind::SetPalEntries
        | WmfRecordKind::SetRelabs
        | WmfRecordKind::SetTextCharExtra
        | WmfRecordKind::InvertRegion
        | WmfRecordKind::PaintRegion
        | WmfRecordKind::SelectClipRegion
        | WmfRecordKind::ResizePalette
        | WmfRecordKind::SetLayout
        | WmfRecordKind::SetTextJustification
        | WmfRecordKind::OffsetClipRgn
        | WmfRecordKind::FillRegion
        | WmfRecordKind::SetMapperFlags
        | WmfRecordKind::SelectPalette
        | WmfRecordKind::ExcludeClipRect
        | WmfRecordKind::IntersectClipRect
        | WmfRecordKind::FloodFill
        | WmfRecordKind::FrameRegion
        | WmfRecordKind::AnimatePalette
        | WmfRecordKind::ExtFloodFill
        | WmfRecordKind::PatBlt
        | WmfRecordKind::Escape
        | WmfRecordKind::Arc
        | WmfRecordKind::Pie
        | WmfRecordKind::Chord
        | WmfRecordKind::BitBlt
        | WmfRecordKind::DibBitBlt
        | WmfRecordKind::StretchBlt
        | WmfRecordKind::DibStretchBlt
        | WmfRecordKind::SetDibToDev
        | WmfRecordKind::StretchDib => {}

        WmfRecordKind::Unhandled(opcode) => {
            trace!("No WMF handler for {:#06x} at {}", opcode, record.offset);
            return Ok(false);
        }
    }

    Ok(true)
}

fn draw_text(ctx: &mut ReplayContext<'_>, text: &str, x: f64, y: f64) {
    if ctx.dc.text_align & TA_UPDATECP != 0 {
        let (cx, cy) = ctx.dc.position;
        ctx.text(text, cx, cy);
    } else {
        ctx.text(text, x, y);
    }
}

/// Four i16 values in storage order
fn read_rect16(p: &mut ByteCursor<'_>) -> (f64, f64, f64, f64) {
    (
        p.read_i16() as f64,
        p.read_i16() as f64,
        p.read_i16() as f64,
        p.read_i16() as f64,
    )
}

fn read_points16(p: &mut ByteCursor<'_>, count: usize) -> Vec<(f64, f64)> {
    (0..count)
        .map(|_| {
            let x = p.read_i16() as f64;
            let y = p.read_i16() as f64;
            (x, y)
        })
        .collect()
}

fn read_font(p: &mut ByteCursor<'_>) -> Font {
    let height = p.read_i16() as i32;
    let _width = p.read_i16();
    let _escapement = p.read_i16();
    let _orientation = p.read_i16();
    let weight = p.read_i16() as i32;
    let italic = p.read_u8() != 0;
    // underline, strike-out, charset, precisions, quality, pitch
    p.skip(7);
    let name = p.read_bytes(FACE_NAME_LEN);
    let end = name.iter().position(|&b| b == 0).unwrap_or(name.len());
    Font {
        height,
        weight,
        italic,
        face_name: decode_ansi(&name[..end]),
    }
}

#[cfg(test)]
mod tests {
    use crate::objects::PS_NULL;
    use crate::surface::{RecordingSurface, SurfaceOp};
    use crate::testutil::{words, WmfBuilder};
    use crate::types::{Color, Point};
    use crate::{decode, replay};

    fn run(data: &[u8]) -> (RecordingSurface, crate::ReplaySummary) {
        let metafile = decode(data);
        assert!(metafile.error.is_none(), "{:?}", metafile.error);
        let mut surface = RecordingSurface::new();
        let summary = replay(&metafile, &mut surface);
        (surface, summary)
    }

    fn is_move(op: &SurfaceOp) -> bool {
        matches!(op, SurfaceOp::MoveTo(..))
    }

    #[test]
    fn test_move_to_issues_single_move() {
        let data = WmfBuilder::new().record(0x0214, &words(&[20, 10])).eof().finish();
        let (surface, summary) = run(&data);
        assert_eq!(surface.count(is_move), 1);
        assert!(surface.ops.contains(&SurfaceOp::MoveTo(10.0, 20.0)));
        assert_eq!(summary.dispatched, 1);
    }

    #[test]
    fn test_setup_calls_come_first() {
        let data = WmfBuilder::new().eof().finish();
        let (surface, _) = run(&data);
        assert_eq!(
            surface.ops,
            vec![
                SurfaceOp::SetSize(800.0, 600.0),
                SurfaceOp::FillBackground(Color::WHITE)
            ]
        );
    }

    #[test]
    fn test_placeable_bounds_seed_origin() {
        let data = WmfBuilder::new()
            .placeable(100, 50, 300, 250, 1440)
            .record(0x0214, &words(&[50, 100]))
            .eof()
            .finish();
        let (surface, _) = run(&data);
        assert_eq!(surface.ops[0], SurfaceOp::SetSize(200.0, 200.0));
        assert!(surface.ops.contains(&SurfaceOp::MoveTo(0.0, 0.0)));
    }

    #[test]
    fn test_window_mapping_scales_line() {
        let data = WmfBuilder::new()
            .record(0x020C, &words(&[300, 400])) // window ext 400x300
            .record(0x020E, &words(&[600, 800])) // viewport ext 800x600
            .record(0x0214, &words(&[0, 0]))
            .record(0x0213, &words(&[30, 40]))
            .eof()
            .finish();
        let (surface, _) = run(&data);
        assert!(surface.ops.contains(&SurfaceOp::LineTo(80.0, 60.0)));
        assert_eq!(surface.count(|op| *op == SurfaceOp::StrokePath), 1);
    }

    #[test]
    fn test_created_pen_is_selected_by_index() {
        let data = WmfBuilder::new()
            .record(0x02FA, &words(&[0, 3, 0, 0x00FF, 0])) // red pen, width 3
            .record(0x012D, &words(&[0]))
            .record(0x0213, &words(&[10, 10]))
            .eof()
            .finish();
        let (surface, _) = run(&data);
        assert!(surface
            .ops
            .contains(&SurfaceOp::SetStrokeColor(Color::rgb(255, 0, 0))));
        assert!(surface.ops.contains(&SurfaceOp::SetLineWidth(3.0)));
    }

    #[test]
    fn test_null_pen_polygon_still_fills() {
        let data = WmfBuilder::new()
            .record(0x02FA, &words(&[PS_NULL as i16, 0, 0, 0, 0]))
            .record(0x02FC, &words(&[0, 0x00FF, 0x0000, 0])) // solid red brush
            .record(0x012D, &words(&[0]))
            .record(0x012D, &words(&[1]))
            .record(0x0324, &words(&[3, 0, 0, 10, 0, 10, 10]))
            .eof()
            .finish();
        let (surface, _) = run(&data);
        assert!(surface
            .ops
            .contains(&SurfaceOp::SetFillColor(Color::rgb(255, 0, 0))));
        assert!(surface
            .ops
            .contains(&SurfaceOp::SetStrokeColor(Color::TRANSPARENT)));
        let polygon = surface.ops.iter().find_map(|op| match op {
            SurfaceOp::PolygonFillStroke(points) => Some(points.clone()),
            _ => None,
        });
        assert_eq!(
            polygon,
            Some(vec![
                Point::new(0.0, 0.0),
                Point::new(10.0, 0.0),
                Point::new(10.0, 10.0)
            ])
        );
    }

    #[test]
    fn test_deleted_slot_is_reused() {
        let data = WmfBuilder::new()
            .record(0x02FC, &words(&[0, 0x00FF, 0, 0]))
            .record(0x02FC, &words(&[0, 0, 0x00FF, 0]))
            .record(0x01F0, &words(&[0]))
            .record(0x02FC, &words(&[0, 0x0000, 0x0000, 0])) // black, lands in slot 0
            .record(0x012D, &words(&[0]))
            .record(0x041B, &words(&[10, 10, 0, 0]))
            .eof()
            .finish();
        let (surface, _) = run(&data);
        let fills: Vec<&SurfaceOp> = surface
            .ops
            .iter()
            .filter(|op| matches!(op, SurfaceOp::SetFillColor(_)))
            .collect();
        assert_eq!(fills, vec![&SurfaceOp::SetFillColor(Color::BLACK)]);
        assert!(surface
            .ops
            .contains(&SurfaceOp::FillRect(0.0, 0.0, 10.0, 10.0)));
    }

    #[test]
    fn test_poly_polygon_draws_each_ring() {
        let data = WmfBuilder::new()
            .record(
                0x0538,
                &words(&[2, 3, 3, 0, 0, 5, 0, 5, 5, 10, 10, 15, 10, 15, 15]),
            )
            .eof()
            .finish();
        let (surface, _) = run(&data);
        assert_eq!(
            surface.count(|op| matches!(op, SurfaceOp::PolygonFillStroke(_))),
            2
        );
    }

    #[test]
    fn test_text_out_decodes_ansi() {
        let mut params = 4i16.to_le_bytes().to_vec();
        params.extend_from_slice(b"caf\xe9");
        params.extend_from_slice(&words(&[40, 30]));
        let data = WmfBuilder::new()
            .record(0x0209, &words(&[0, 0x00FF])) // blue text
            .record(0x0521, &params)
            .eof()
            .finish();
        let (surface, _) = run(&data);
        assert!(surface
            .ops
            .contains(&SurfaceOp::DrawText("café".to_string(), 30.0, 40.0)));
        assert!(surface
            .ops
            .contains(&SurfaceOp::SetFillColor(Color::rgb(0, 0, 255))));
    }

    #[test]
    fn test_ext_text_out_with_clip_rect() {
        let mut params = words(&[12, 7, 2, 0x0004, 0, 0, 50, 50]);
        params.extend_from_slice(b"Hi");
        let data = WmfBuilder::new().record(0x0A32, &params).eof().finish();
        let (surface, summary) = run(&data);
        assert_eq!(summary.failed, 0);
        assert!(surface
            .ops
            .contains(&SurfaceOp::DrawText("Hi".to_string(), 7.0, 12.0)));
    }

    #[test]
    fn test_malformed_record_is_skipped() {
        let data = WmfBuilder::new()
            .record(0x0325, &words(&[50, 0, 0])) // claims 50 points
            .record(0x0214, &words(&[1, 1]))
            .record(0x7777, &[])
            .eof()
            .finish();
        let (surface, summary) = run(&data);
        assert_eq!(summary.dispatched, 3);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.unhandled, 1);
        assert_eq!(surface.count(is_move), 1);
    }

    #[test]
    fn test_restore_dc_undoes_mapping() {
        let data = WmfBuilder::new()
            .record(0x001E, &[])
            .record(0x020B, &words(&[100, 100]))
            .record(0x0127, &words(&[-1]))
            .record(0x0214, &words(&[5, 5]))
            .eof()
            .finish();
        let (surface, _) = run(&data);
        assert!(surface.ops.contains(&SurfaceOp::MoveTo(5.0, 5.0)));
        assert_eq!(surface.count(|op| *op == SurfaceOp::SaveState), 1);
        assert_eq!(surface.count(|op| *op == SurfaceOp::RestoreState), 1);
    }

    #[test]
    fn test_font_occupies_slot_before_pen() {
        let mut font = words(&[-16, 0, 0, 0, 400]);
        font.extend_from_slice(&[0u8; 8]);
        let mut face = b"Arial".to_vec();
        face.resize(32, 0);
        font.extend_from_slice(&face);
        let mut text = 2i16.to_le_bytes().to_vec();
        text.extend_from_slice(b"Hi");
        text.extend_from_slice(&words(&[7, 3]));

        let data = WmfBuilder::new()
            .record(0x02FB, &font) // slot 0
            .record(0x02FA, &words(&[0, 1, 0, 0x00FF, 0])) // red pen, slot 1
            .record(0x012D, &words(&[1]))
            .record(0x0213, &words(&[10, 10]))
            .record(0x012D, &words(&[0]))
            .record(0x0521, &text)
            .eof()
            .finish();
        let (surface, summary) = run(&data);
        assert_eq!(summary.failed, 0);
        assert!(surface
            .ops
            .contains(&SurfaceOp::SetStrokeColor(Color::rgb(255, 0, 0))));
        assert!(surface
            .ops
            .contains(&SurfaceOp::SetFont("Arial".to_string(), 16.0)));
        assert!(surface
            .ops
            .contains(&SurfaceOp::DrawText("Hi".to_string(), 3.0, 7.0)));
    }

    #[test]
    fn test_ellipse_parameters_in_reverse_order() {
        let data = WmfBuilder::new()
            .record(0x0418, &words(&[10, 20, 0, 0]))
            .eof()
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
    fn test_offset_origin_and_scale_window_extent() {
        let data = WmfBuilder::new()
            .record(0x020C, &words(&[100, 100]))
            .record(0x020E, &words(&[100, 100]))
            .record(0x020F, &words(&[5, 10])) // dy, dx
            .record(0x0410, &words(&[1, 1, 1, 2])) // y denom, y num, x denom, x num
            .record(0x0214, &words(&[25, 30]))
            .eof()
            .finish();
        let (surface, summary) = run(&data);
        assert_eq!(summary.failed, 0);
        let moved = surface.ops.iter().find_map(|op| match op {
            SurfaceOp::MoveTo(x, y) => Some((*x, *y)),
            _ => None,
        });
        let (x, y) = moved.unwrap();
        assert!((x - 10.0).abs() < 1e-9);
        assert!((y - 20.0).abs() < 1e-9);
    }

    #[test]
    fn test_set_pixel_paints_one_pixel() {
        let data = WmfBuilder::new()
            .record(0x041F, &words(&[0x00FF, 0, 4, 3]))
            .eof()
            .finish();
        let (surface, _) = run(&data);
        assert!(surface
            .ops
            .contains(&SurfaceOp::SetFillColor(Color::rgb(255, 0, 0))));
        assert!(surface.ops.contains(&SurfaceOp::FillRect(3.0, 4.0, 1.0, 1.0)));
    }
}
