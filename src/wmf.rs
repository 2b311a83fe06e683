//! WMF format parser
//!
//! Handles the optional 22-byte placeable header, the 18-byte metafile header
//! and the record stream that follows it. The META_EOF record ends the stream
//! and is not included in the returned records.

use crate::cursor::ByteCursor;
use crate::error::{MetafileError, MetafileResult};
use crate::options::DecodeOptions;
use crate::record::{walk_records, Record, RecoveryPolicy, Step};
use crate::sniff::FileKind;
use crate::types::RectL;
use crate::wmf_records::META_EOF;
use log::{debug, warn};

/// Placeable metafile key, bytes D7 CD C6 9A
pub const PLACEABLE_KEY: u32 = 0x9AC6_CDD7;
pub const PLACEABLE_HEADER_SIZE: usize = 22;
pub const WMF_HEADER_SIZE: usize = 18;

/// Record header: size in words (u32) and function (u16)
const RECORD_HEADER_WORDS: u32 = 3;
/// Bytes skipped after a record fails to decode
const RESYNC_SKIP: usize = 2;

/// Aldus placeable header preceding the standard WMF header
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaceableHeader {
    pub key: u32,
    pub handle: u16,
    /// Device-independent bounding box in logical units
    pub bounds: RectL,
    pub units_per_inch: u16,
    pub reserved: u32,
    pub checksum: u16,
}

impl PlaceableHeader {
    fn parse(cursor: &mut ByteCursor<'_>) -> Self {
        let key = cursor.read_u32();
        let handle = cursor.read_u16();
        let left = cursor.read_i16() as i32;
        let top = cursor.read_i16() as i32;
        let right = cursor.read_i16() as i32;
        let bottom = cursor.read_i16() as i32;
        let units_per_inch = cursor.read_u16();
        let reserved = cursor.read_u32();
        let checksum = cursor.read_u16();
        Self {
            key,
            handle,
            bounds: RectL::new(left, top, right, bottom),
            units_per_inch,
            reserved,
            checksum,
        }
    }

    /// XOR of the ten 16-bit words preceding the checksum field
    pub fn computed_checksum(&self) -> u16 {
        let words = [
            (self.key & 0xFFFF) as u16,
            (self.key >> 16) as u16,
            self.handle,
            self.bounds.left as i16 as u16,
            self.bounds.top as i16 as u16,
            self.bounds.right as i16 as u16,
            self.bounds.bottom as i16 as u16,
            self.units_per_inch,
            (self.reserved & 0xFFFF) as u16,
            (self.reserved >> 16) as u16,
        ];
        words.iter().fold(0, |acc, word| acc ^ word)
    }

    pub fn checksum_matches(&self) -> bool {
        self.computed_checksum() == self.checksum
    }
}

/// Standard WMF header (META_HEADER)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WmfHeader {
    pub placeable: Option<PlaceableHeader>,
    pub file_type: u16,
    pub header_size_words: u16,
    pub version: u16,
    pub file_size_words: u32,
    pub object_count: u16,
    pub max_record_words: u32,
    pub reserved: u16,
}

impl WmfHeader {
    fn parse(cursor: &mut ByteCursor<'_>, placeable: Option<PlaceableHeader>) -> Self {
        Self {
            placeable,
            file_type: cursor.read_u16(),
            header_size_words: cursor.read_u16(),
            version: cursor.read_u16(),
            file_size_words: cursor.read_u32(),
            object_count: cursor.read_u16(),
            max_record_words: cursor.read_u32(),
            reserved: cursor.read_u16(),
        }
    }
}

/// Decoded WMF: header plus records in file order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WmfFile<'a> {
    pub header: WmfHeader,
    pub records: Vec<Record<'a>>,
}

/// Decode a WMF or placeable WMF buffer
pub fn decode<'a>(data: &'a [u8], kind: FileKind, options: &DecodeOptions) -> MetafileResult<WmfFile<'a>> {
    let mut cursor = ByteCursor::new(data);

    let placeable = if kind == FileKind::PlaceableWmf {
        if data.len() < PLACEABLE_HEADER_SIZE {
            return Err(MetafileError::TruncatedHeader {
                needed: PLACEABLE_HEADER_SIZE,
                available: data.len(),
            });
        }
        let header = PlaceableHeader::parse(&mut cursor);
        if header.key != PLACEABLE_KEY {
            warn!("Placeable header key mismatch: {:#010x}", header.key);
        }
        if !header.checksum_matches() {
            warn!(
                "Placeable header checksum mismatch: stored {:#06x}, computed {:#06x}",
                header.checksum,
                header.computed_checksum()
            );
        }
        debug!(
            "WMF placeable header - bounds: {:?}, {} units/inch",
            header.bounds, header.units_per_inch
        );
        Some(header)
    } else {
        None
    };

    let start = cursor.position();
    if data.len() < start + WMF_HEADER_SIZE {
        return Err(MetafileError::TruncatedHeader {
            needed: start + WMF_HEADER_SIZE,
            available: data.len(),
        });
    }

    let header = WmfHeader::parse(&mut cursor, placeable);
    if header.header_size_words == 0 {
        return Err(MetafileError::InvalidHeader(
            "header size must be at least one word".to_string(),
        ));
    }
    debug!(
        "WMF header - type: {}, header words: {}, version: {:#06x}, objects: {}",
        header.file_type, header.header_size_words, header.version, header.object_count
    );

    // Skip non-standard padding beyond the declared header, never backward
    let records_start = start + header.header_size_words as usize * 2;
    cursor.seek(records_start.max(cursor.position()));

    let policy = RecoveryPolicy {
        resync_skip: RESYNC_SKIP,
        max_records: options.max_wmf_records,
    };
    let records = walk_records(&mut cursor, policy, next_record);
    debug!("Parsed {} WMF records", records.len());

    Ok(WmfFile { header, records })
}

fn next_record<'a>(cursor: &mut ByteCursor<'a>) -> MetafileResult<Step<'a>> {
    let offset = cursor.position();
    if cursor.remaining() < RECORD_HEADER_WORDS as usize * 2 {
        return Ok(Step::End);
    }

    let size_words = cursor.read_u32();
    let function = cursor.read_u16();
    if size_words < RECORD_HEADER_WORDS {
        debug!("WMF record at {} declares {} words; stopping", offset, size_words);
        return Ok(Step::End);
    }

    let payload_len = usize::try_from((size_words as u64 - RECORD_HEADER_WORDS as u64) * 2)
        .map_err(|_| MetafileError::malformed(offset, "record size overflows address space"))?;
    if payload_len > cursor.remaining() {
        debug!(
            "WMF record at {} needs {} bytes, {} remain; stopping",
            offset,
            payload_len,
            cursor.remaining()
        );
        return Ok(Step::End);
    }

    if function == META_EOF {
        return Ok(Step::End);
    }

    let payload = cursor.read_bytes(payload_len);
    Ok(Step::Record(Record {
        opcode: function as u32,
        declared_size: size_words,
        flags: 0,
        offset,
        payload,
    }))
}
