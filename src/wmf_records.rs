//! WMF record function numbers (MS-WMF RecordType enumeration)

use crate::record::record_kinds;

pub const META_EOF: u16 = 0x0000;

record_kinds! {
    /// WMF record kinds, keyed by the 16-bit `rdFunction` field
    pub enum WmfRecordKind: u16 {
        Eof = 0x0000 => "META_EOF",
        RealizePalette = 0x0035 => "META_REALIZEPALETTE",
        SetPalEntries = 0x0037 => "META_SETPALENTRIES",
        SetBkMode = 0x0102 => "META_SETBKMODE",
        SetMapMode = 0x0103 => "META_SETMAPMODE",
        SetRop2 = 0x0104 => "META_SETROP2",
        SetRelabs = 0x0105 => "META_SETRELABS",
        SetPolyFillMode = 0x0106 => "META_SETPOLYFILLMODE",
        SetStretchBltMode = 0x0107 => "META_SETSTRETCHBLTMODE",
        SetTextCharExtra = 0x0108 => "META_SETTEXTCHAREXTRA",
        RestoreDc = 0x0127 => "META_RESTOREDC",
        InvertRegion = 0x012A => "META_INVERTREGION",
        PaintRegion = 0x012B => "META_PAINTREGION",
        SelectClipRegion = 0x012C => "META_SELECTCLIPREGION",
        SelectObject = 0x012D => "META_SELECTOBJECT",
        SetTextAlign = 0x012E => "META_SETTEXTALIGN",
        ResizePalette = 0x0139 => "META_RESIZEPALETTE",
        DibCreatePatternBrush = 0x0142 => "META_DIBCREATEPATTERNBRUSH",
        SetLayout = 0x0149 => "META_SETLAYOUT",
        DeleteObject = 0x01F0 => "META_DELETEOBJECT",
        CreatePatternBrush = 0x01F9 => "META_CREATEPATTERNBRUSH",
        SetBkColor = 0x0201 => "META_SETBKCOLOR",
        SetTextColor = 0x0209 => "META_SETTEXTCOLOR",
        SetTextJustification = 0x020A => "META_SETTEXTJUSTIFICATION",
        SetWindowOrg = 0x020B => "META_SETWINDOWORG",
        SetWindowExt = 0x020C => "META_SETWINDOWEXT",
        SetViewportOrg = 0x020D => "META_SETVIEWPORTORG",
        SetViewportExt = 0x020E => "META_SETVIEWPORTEXT",
        OffsetWindowOrg = 0x020F => "META_OFFSETWINDOWORG",
        OffsetViewportOrg = 0x0211 => "META_OFFSETVIEWPORTORG",
        LineTo = 0x0213 => "META_LINETO",
        MoveTo = 0x0214 => "META_MOVETO",
        OffsetClipRgn = 0x0220 => "META_OFFSETCLIPRGN",
        FillRegion = 0x0228 => "META_FILLREGION",
        SetMapperFlags = 0x0231 => "META_SETMAPPERFLAGS",
        SelectPalette = 0x0234 => "META_SELECTPALETTE",
        CreatePenIndirect = 0x02FA => "META_CREATEPENINDIRECT",
        CreateFontIndirect = 0x02FB => "META_CREATEFONTINDIRECT",
        CreateBrushIndirect = 0x02FC => "META_CREATEBRUSHINDIRECT",
        Polygon = 0x0324 => "META_POLYGON",
        Polyline = 0x0325 => "META_POLYLINE",
        ScaleWindowExt = 0x0410 => "META_SCALEWINDOWEXT",
        ScaleViewportExt = 0x0412 => "META_SCALEVIEWPORTEXT",
        ExcludeClipRect = 0x0415 => "META_EXCLUDECLIPRECT",
        IntersectClipRect = 0x0416 => "META_INTERSECTCLIPRECT",
        Ellipse = 0x0418 => "META_ELLIPSE",
        FloodFill = 0x0419 => "META_FLOODFILL",
        Rectangle = 0x041B => "META_RECTANGLE",
        SetPixel = 0x041F => "META_SETPIXEL",
        FrameRegion = 0x0429 => "META_FRAMEREGION",
        AnimatePalette = 0x0436 => "META_ANIMATEPALETTE",
        TextOut = 0x0521 => "META_TEXTOUT",
        PolyPolygon = 0x0538 => "META_POLYPOLYGON",
        ExtFloodFill = 0x0548 => "META_EXTFLOODFILL",
        RoundRect = 0x061C => "META_ROUNDRECT",
        PatBlt = 0x061D => "META_PATBLT",
        Escape = 0x0626 => "META_ESCAPE",
        CreateRegion = 0x06FF => "META_CREATEREGION",
        Arc = 0x0817 => "META_ARC",
        Pie = 0x081A => "META_PIE",
        Chord = 0x0830 => "META_CHORD",
        BitBlt = 0x0922 => "META_BITBLT",
        DibBitBlt = 0x0940 => "META_DIBBITBLT",
        ExtTextOut = 0x0A32 => "META_EXTTEXTOUT",
        StretchBlt = 0x0B23 => "META_STRETCHBLT",
        DibStretchBlt = 0x0B41 => "META_DIBSTRETCHBLT",
        SetDibToDev = 0x0D33 => "META_SETDIBTODEV",
        StretchDib = 0x0F43 => "META_STRETCHDIB",
        SaveDc = 0x001E => "META_SAVEDC",
        CreatePalette = 0x00F7 => "META_CREATEPALETTE",
    }
}
