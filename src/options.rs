//! Decode and replay settings

use crate::types::{Color, Size};

/// Limits applied while walking record streams
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodeOptions {
    /// WMF record loop stops after this many records
    pub max_wmf_records: usize,
    /// Cap on EMF+ records unwrapped from a single comment record
    pub max_emfplus_records_per_comment: usize,
}

impl Default for DecodeOptions {
    fn default() -> Self {
        Self {
            max_wmf_records: 1000,
            max_emfplus_records_per_comment: 4096,
        }
    }
}

/// Drawing-surface setup for a replay session
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReplayOptions {
    /// Overrides the surface size derived from the metafile header
    pub surface_size: Option<Size>,
    /// Background fill issued before the first record; `None` skips the fill
    pub background: Option<Color>,
}

impl Default for ReplayOptions {
    fn default() -> Self {
        Self {
            surface_size: None,
            background: Some(Color::WHITE),
        }
    }
}
