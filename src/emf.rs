//! EMF format parser
//!
//! The fixed 88-byte header is validated strictly; any mismatch aborts the
//! file. The record stream after it is walked leniently: a record whose size
//! is below the minimum or runs past the buffer ends the stream.

use crate::cursor::ByteCursor;
use crate::emf_records::EMR_HEADER;
use crate::error::{MetafileError, MetafileResult};
use crate::record::{walk_records, Record, RecoveryPolicy, Step};
use crate::types::RectL;
use log::debug;

/// " EMF" as a little-endian dword
pub const EMF_SIGNATURE: u32 = 0x464D_4520;
pub const EMF_HEADER_MIN_SIZE: usize = 88;

/// Record header: type (u32) and size (u32)
const RECORD_HEADER_SIZE: usize = 8;
/// Bytes skipped after a record fails to decode
const RESYNC_SKIP: usize = 8;

/// EMR_HEADER contents
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmfHeader {
    pub record_type: u32,
    pub header_size: u32,
    /// Inclusive bounds in device units
    pub bounds: RectL,
    /// Picture frame in 0.01 mm units
    pub frame: RectL,
    pub signature: u32,
    pub version: u32,
    pub total_bytes: u32,
    pub record_count: u32,
    pub handle_count: u16,
    pub reserved: u16,
    pub description_len: u32,
    pub description_offset: u32,
    pub palette_entries: u32,
    pub device_pixels: (i32, i32),
    pub device_millimeters: (i32, i32),
}

impl EmfHeader {
    /// Parse and validate the header at the start of `data`
    pub fn parse(data: &[u8]) -> MetafileResult<Self> {
        if data.len() < EMF_HEADER_MIN_SIZE {
            return Err(MetafileError::TruncatedHeader {
                needed: EMF_HEADER_MIN_SIZE,
                available: data.len(),
            });
        }

        let mut cursor = ByteCursor::new(data);
        let record_type = cursor.read_u32();
        let header_size = cursor.read_u32();
        let bounds = read_rectl(&mut cursor);
        let frame = read_rectl(&mut cursor);
        let header = Self {
            record_type,
            header_size,
            bounds,
            frame,
            signature: cursor.read_u32(),
            version: cursor.read_u32(),
            total_bytes: cursor.read_u32(),
            record_count: cursor.read_u32(),
            handle_count: cursor.read_u16(),
            reserved: cursor.read_u16(),
            description_len: cursor.read_u32(),
            description_offset: cursor.read_u32(),
            palette_entries: cursor.read_u32(),
            device_pixels: (cursor.read_i32(), cursor.read_i32()),
            device_millimeters: (cursor.read_i32(), cursor.read_i32()),
        };

        if header.signature != EMF_SIGNATURE {
            return Err(MetafileError::InvalidSignature {
                expected: EMF_SIGNATURE,
                found: header.signature,
            });
        }
        if header.record_type != EMR_HEADER {
            return Err(MetafileError::InvalidRecordType(header.record_type));
        }
        if (header.header_size as usize) < EMF_HEADER_MIN_SIZE {
            return Err(MetafileError::InvalidHeaderSize(header.header_size));
        }

        debug!(
            "EMF header - bounds: {:?}, frame: {:?}, records: {}, handles: {}",
            header.bounds, header.frame, header.record_count, header.handle_count
        );
        Ok(header)
    }

    /// Frame size in millimeters
    pub fn frame_millimeters(&self) -> (f64, f64) {
        (self.frame.width() as f64 / 100.0, self.frame.height() as f64 / 100.0)
    }

    /// UTF-16LE description string, when it lies inside `data`
    pub fn description(&self, data: &[u8]) -> Option<String> {
        if self.description_len == 0 || self.description_offset == 0 {
            return None;
        }
        let start = self.description_offset as usize;
        let end = start.checked_add((self.description_len as usize).checked_mul(2)?)?;
        let bytes = data.get(start..end)?;
        let units: Vec<u16> = bytes
            .chunks_exact(2)
            .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
            .collect();
        let text = String::from_utf16_lossy(&units);
        Some(text.trim_end_matches('\0').replace('\0', " | "))
    }
}

/// Decoded EMF: header plus records in file order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmfFile<'a> {
    pub header: EmfHeader,
    pub records: Vec<Record<'a>>,
}

/// Decode an EMF buffer
///
/// At most `record_count` records are read after the header. EMR_EOF is kept
/// in the output since it counts toward `record_count`.
pub fn decode(data: &[u8]) -> MetafileResult<EmfFile<'_>> {
    let header = EmfHeader::parse(data)?;
    let records = read_records(data, &header);
    debug!("Parsed {} EMF records", records.len());
    Ok(EmfFile { header, records })
}

/// Walk the record stream following a validated header
pub(crate) fn read_records<'a>(data: &'a [u8], header: &EmfHeader) -> Vec<Record<'a>> {
    let mut cursor = ByteCursor::new(data);
    cursor.seek(header.header_size as usize);

    let policy = RecoveryPolicy {
        resync_skip: RESYNC_SKIP,
        max_records: header.record_count as usize,
    };
    walk_records(&mut cursor, policy, next_record)
}

fn next_record<'a>(cursor: &mut ByteCursor<'a>) -> MetafileResult<Step<'a>> {
    let offset = cursor.position();
    if cursor.remaining() < RECORD_HEADER_SIZE {
        return Ok(Step::End);
    }

    let record_type = cursor.read_u32();
    let size = cursor.read_u32();
    if (size as usize) < RECORD_HEADER_SIZE {
        debug!("EMF record at {} declares {} bytes; stopping", offset, size);
        return Ok(Step::End);
    }
    let payload_len = size as usize - RECORD_HEADER_SIZE;
    if payload_len > cursor.remaining() {
        debug!(
            "EMF record at {} needs {} bytes, {} remain; stopping",
            offset,
            payload_len,
            cursor.remaining()
        );
        return Ok(Step::End);
    }
    if size % 4 != 0 {
        return Err(MetafileError::malformed(
            offset,
            format!("record size {} is not a multiple of 4", size),
        ));
    }

    let payload = cursor.read_bytes(payload_len);
    Ok(Step::Record(Record {
        opcode: record_type,
        declared_size: size,
        flags: 0,
        offset,
        payload,
    }))
}

pub(crate) fn read_rectl(cursor: &mut ByteCursor<'_>) -> RectL {
    let left = cursor.read_i32();
    let top = cursor.read_i32();
    let right = cursor.read_i32();
    let bottom = cursor.read_i32();
    RectL::new(left, top, right, bottom)
}
