//! EMF+ record types (MS-EMFPLUS RecordType enumeration)

use crate::record::record_kinds;

pub const EMFPLUS_TYPE_FIRST: u16 = 0x4001;
pub const EMFPLUS_TYPE_LAST: u16 = 0x4044;

// Object types carried in bits 8-14 of EmfPlusObject flags
pub const OBJECT_TYPE_BRUSH: u16 = 0x01;
pub const OBJECT_TYPE_PEN: u16 = 0x02;
pub const OBJECT_TYPE_PATH: u16 = 0x03;
pub const OBJECT_TYPE_REGION: u16 = 0x04;
pub const OBJECT_TYPE_IMAGE: u16 = 0x05;
pub const OBJECT_TYPE_FONT: u16 = 0x06;
pub const OBJECT_TYPE_STRING_FORMAT: u16 = 0x07;
pub const OBJECT_TYPE_IMAGE_ATTRIBUTES: u16 = 0x08;
pub const OBJECT_TYPE_CUSTOM_LINE_CAP: u16 = 0x09;

record_kinds! {
    /// EMF+ record kinds, keyed by the 16-bit `Type` field
    pub enum EmfPlusRecordKind: u16 {
        Header = 0x4001 => "EmfPlusHeader",
        EndOfFile = 0x4002 => "EmfPlusEndOfFile",
        Comment = 0x4003 => "EmfPlusComment",
        GetDc = 0x4004 => "EmfPlusGetDC",
        MultiFormatStart = 0x4005 => "EmfPlusMultiFormatStart",
        MultiFormatSection = 0x4006 => "EmfPlusMultiFormatSection",
        MultiFormatEnd = 0x4007 => "EmfPlusMultiFormatEnd",
        Object = 0x4008 => "EmfPlusObject",
        Clear = 0x4009 => "EmfPlusClear",
        FillRects = 0x400A => "EmfPlusFillRects",
        DrawRects = 0x400B => "EmfPlusDrawRects",
        FillPolygon = 0x400C => "EmfPlusFillPolygon",
        DrawLines = 0x400D => "EmfPlusDrawLines",
        FillEllipse = 0x400E => "EmfPlusFillEllipse",
        DrawEllipse = 0x400F => "EmfPlusDrawEllipse",
        FillPie = 0x4010 => "EmfPlusFillPie",
        DrawPie = 0x4011 => "EmfPlusDrawPie",
        DrawArc = 0x4012 => "EmfPlusDrawArc",
        FillRegion = 0x4013 => "EmfPlusFillRegion",
        FillPath = 0x4014 => "EmfPlusFillPath",
        DrawPath = 0x4015 => "EmfPlusDrawPath",
        FillClosedCurve = 0x4016 => "EmfPlusFillClosedCurve",
        DrawClosedCurve = 0x4017 => "EmfPlusDrawClosedCurve",
        DrawCurve = 0x4018 => "EmfPlusDrawCurve",
        DrawBeziers = 0x4019 => "EmfPlusDrawBeziers",
        DrawImage = 0x401A => "EmfPlusDrawImage",
        DrawImagePoints = 0x401B => "EmfPlusDrawImagePoints",
        DrawString = 0x401C => "EmfPlusDrawString",
        SetRenderingOrigin = 0x401D => "EmfPlusSetRenderingOrigin",
        SetAntiAliasMode = 0x401E => "EmfPlusSetAntiAliasMode",
        SetTextRenderingHint = 0x401F => "EmfPlusSetTextRenderingHint",
        SetTextContrast = 0x4020 => "EmfPlusSetTextContrast",
        SetInterpolationMode = 0x4021 => "EmfPlusSetInterpolationMode",
        SetPixelOffsetMode = 0x4022 => "EmfPlusSetPixelOffsetMode",
        SetCompositingMode = 0x4023 => "EmfPlusSetCompositingMode",
        SetCompositingQuality = 0x4024 => "EmfPlusSetCompositingQuality",
        Save = 0x4025 => "EmfPlusSave",
        Restore = 0x4026 => "EmfPlusRestore",
        BeginContainer = 0x4027 => "EmfPlusBeginContainer",
        BeginContainerNoParams = 0x4028 => "EmfPlusBeginContainerNoParams",
        EndContainer = 0x4029 => "EmfPlusEndContainer",
        SetWorldTransform = 0x402A => "EmfPlusSetWorldTransform",
        ResetWorldTransform = 0x402B => "EmfPlusResetWorldTransform",
        MultiplyWorldTransform = 0x402C => "EmfPlusMultiplyWorldTransform",
        TranslateWorldTransform = 0x402D => "EmfPlusTranslateWorldTransform",
        ScaleWorldTransform = 0x402E => "EmfPlusScaleWorldTransform",
        RotateWorldTransform = 0x402F => "EmfPlusRotateWorldTransform",
        SetPageTransform = 0x4030 => "EmfPlusSetPageTransform",
        ResetClip = 0x4031 => "EmfPlusResetClip",
        SetClipRect = 0x4032 => "EmfPlusSetClipRect",
        SetClipPath = 0x4033 => "EmfPlusSetClipPath",
        SetClipRegion = 0x4034 => "EmfPlusSetClipRegion",
        OffsetClip = 0x4035 => "EmfPlusOffsetClip",
        DrawDriverString = 0x4036 => "EmfPlusDrawDriverString",
        StrokeFillPath = 0x4037 => "EmfPlusStrokeFillPath",
        SerializableObject = 0x4038 => "EmfPlusSerializableObject",
        SetTsGraphics = 0x4039 => "EmfPlusSetTSGraphics",
        SetTsClip = 0x403A => "EmfPlusSetTSClip",
    }
}
