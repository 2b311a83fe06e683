//! GDI object table
//!
//! Slots are index-stable: deleting an object empties its slot without
//! shifting the others, and the next implicit creation reuses the lowest
//! empty slot. Stock objects live outside the table and are addressed by
//! handles with the high bit set.

use crate::types::Color;

pub const PS_SOLID: u32 = 0;
pub const PS_NULL: u32 = 5;
pub const BS_SOLID: u32 = 0;
pub const BS_NULL: u32 = 1;
pub const BS_HATCHED: u32 = 2;

/// Handles at or above this value name stock objects
pub const STOCK_OBJECT_BASE: u32 = 0x8000_0000;

pub const WHITE_BRUSH: u32 = 0x8000_0000;
pub const LTGRAY_BRUSH: u32 = 0x8000_0001;
pub const GRAY_BRUSH: u32 = 0x8000_0002;
pub const DKGRAY_BRUSH: u32 = 0x8000_0003;
pub const BLACK_BRUSH: u32 = 0x8000_0004;
pub const NULL_BRUSH: u32 = 0x8000_0005;
pub const WHITE_PEN: u32 = 0x8000_0006;
pub const BLACK_PEN: u32 = 0x8000_0007;
pub const NULL_PEN: u32 = 0x8000_0008;

#[derive(Debug, Clone, PartialEq)]
pub struct Pen {
    pub style: u32,
    /// Width in logical units
    pub width: f64,
    pub color: Color,
}

impl Pen {
    pub fn is_null(&self) -> bool {
        self.style & 0x0F == PS_NULL
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Brush {
    pub style: u32,
    pub color: Color,
    pub hatch: u32,
}

impl Brush {
    pub fn is_null(&self) -> bool {
        self.style == BS_NULL
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Font {
    pub height: i32,
    pub weight: i32,
    pub italic: bool,
    pub face_name: String,
}

/// Anything a creation record can place in the table
#[derive(Debug, Clone, PartialEq)]
pub enum GdiObject {
    Pen(Pen),
    Brush(Brush),
    Font(Font),
    /// Palettes, regions, pattern brushes and color spaces; only their slot matters
    Placeholder(&'static str),
}

const fn stock_brush(style: u32, color: Color) -> GdiObject {
    GdiObject::Brush(Brush {
        style,
        color,
        hatch: 0,
    })
}

const fn stock_pen(style: u32, color: Color) -> GdiObject {
    GdiObject::Pen(Pen {
        style,
        width: 1.0,
        color,
    })
}

/// Index-addressed table of created objects
#[derive(Debug, Clone, Default)]
pub struct GdiObjectTable {
    slots: Vec<Option<GdiObject>>,
}

impl GdiObjectTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of slots, including empty ones
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Store in the lowest empty slot, or append
    pub fn create(&mut self, object: GdiObject) -> u32 {
        if let Some(index) = self.slots.iter().position(Option::is_none) {
            self.slots[index] = Some(object);
            return index as u32;
        }
        self.slots.push(Some(object));
        (self.slots.len() - 1) as u32
    }

    pub fn create_pen(&mut self, style: u32, width: f64, color: Color) -> u32 {
        self.create(GdiObject::Pen(Pen { style, width, color }))
    }

    pub fn create_brush(&mut self, style: u32, color: Color) -> u32 {
        self.create(GdiObject::Brush(Brush {
            style,
            color,
            hatch: 0,
        }))
    }

    /// Store at an explicit index, as EMF and EMF+ creation records do
    pub fn put(&mut self, index: u32, object: GdiObject) {
        let index = index as usize;
        if index >= self.slots.len() {
            self.slots.resize(index + 1, None);
        }
        self.slots[index] = Some(object);
    }

    /// Look up a created object; `None` when absent or deleted
    pub fn select(&self, handle: u32) -> Option<&GdiObject> {
        self.slots.get(handle as usize).and_then(Option::as_ref)
    }

    /// Created object or, for stock handles, the stock object
    pub fn resolve(&self, handle: u32) -> Option<GdiObject> {
        if let Some(object) = self.select(handle) {
            return Some(object.clone());
        }
        if handle >= STOCK_OBJECT_BASE {
            return Self::stock_object(handle);
        }
        None
    }

    /// Empty a slot; the index stays reusable
    pub fn delete(&mut self, handle: u32) {
        if let Some(slot) = self.slots.get_mut(handle as usize) {
            *slot = None;
        }
    }

    pub fn clear(&mut self) {
        self.slots.clear();
    }

    pub fn stock_object(handle: u32) -> Option<GdiObject> {
        let object = match handle {
            WHITE_BRUSH => stock_brush(BS_SOLID, Color::WHITE),
            LTGRAY_BRUSH => stock_brush(BS_SOLID, Color::rgb(0xC0, 0xC0, 0xC0)),
            GRAY_BRUSH => stock_brush(BS_SOLID, Color::rgb(0x80, 0x80, 0x80)),
            DKGRAY_BRUSH => stock_brush(BS_SOLID, Color::rgb(0x40, 0x40, 0x40)),
            BLACK_BRUSH => stock_brush(BS_SOLID, Color::BLACK),
            NULL_BRUSH => stock_brush(BS_NULL, Color::BLACK),
            WHITE_PEN => stock_pen(PS_SOLID, Color::WHITE),
            BLACK_PEN => stock_pen(PS_SOLID, Color::BLACK),
            NULL_PEN => stock_pen(PS_NULL, Color::BLACK),
            _ => return None,
        };
        Some(object)
    }
}
