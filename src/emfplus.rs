//! EMF+ parser for records embedded in EMF comment records
//!
//! The EMF+ view of a file contains only the unwrapped EMF+ records, in file
//! order. Plain EMF records and comments without the "EMF+" identifier are
//! dropped.

use crate::cursor::ByteCursor;
use crate::emf::{self, EmfHeader};
use crate::emf_records::EMR_COMMENT;
use crate::error::{MetafileError, MetafileResult};
use crate::options::DecodeOptions;
use crate::record::{walk_records, Record, RecoveryPolicy, Step};
use log::debug;

/// "EMF+" as a little-endian dword
pub const EMFPLUS_COMMENT_ID: u32 = 0x2B46_4D45;

/// EMF record header (8) plus the comment's data size field (4)
const COMMENT_PREFIX_SIZE: usize = 12;
/// Type (u16), flags (u16), size (u32), data size (u32)
const EMFPLUS_RECORD_HEADER_SIZE: usize = 12;

/// Decoded EMF+ stream
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmfPlusFile<'a> {
    pub header: EmfHeader,
    pub records: Vec<Record<'a>>,
}

/// Decode the EMF+ records of an EMF buffer
pub fn decode<'a>(data: &'a [u8], options: &DecodeOptions) -> MetafileResult<EmfPlusFile<'a>> {
    let header = EmfHeader::parse(data)?;

    let mut records = Vec::new();
    let mut comments = 0usize;
    for record in emf::read_records(data, &header) {
        if record.opcode != EMR_COMMENT {
            continue;
        }
        match unwrap_comment(&record, options) {
            Some(unwrapped) => {
                comments += 1;
                records.extend(unwrapped);
            }
            None => debug!("Skipping non-EMF+ comment at offset {}", record.offset),
        }
    }

    debug!(
        "Parsed {} EMF+ records from {} comment records",
        records.len(),
        comments
    );
    Ok(EmfPlusFile { header, records })
}

/// EMF+ records held by one EMR_COMMENT, or `None` for other comment kinds
fn unwrap_comment<'a>(comment: &Record<'a>, options: &DecodeOptions) -> Option<Vec<Record<'a>>> {
    let payload = comment.payload;
    if payload.len() < 8 {
        return None;
    }

    let cursor = ByteCursor::new(payload);
    let data_size = cursor.peek_u32_at(0) as usize;
    if cursor.peek_u32_at(4) != EMFPLUS_COMMENT_ID {
        return None;
    }

    // data_size counts the identifier plus the EMF+ records
    let end = data_size.saturating_add(4).min(payload.len()).max(8);
    let body = &payload[8..end];
    let base = comment.offset + COMMENT_PREFIX_SIZE + 4;

    let mut cursor = ByteCursor::new(body);
    let policy = RecoveryPolicy {
        resync_skip: EMFPLUS_RECORD_HEADER_SIZE,
        max_records: options.max_emfplus_records_per_comment,
    };
    let records = walk_records(&mut cursor, policy, |c| next_record(c, base));
    Some(records)
}

fn next_record<'a>(cursor: &mut ByteCursor<'a>, base: usize) -> MetafileResult<Step<'a>> {
    let local = cursor.position();
    if cursor.remaining() < EMFPLUS_RECORD_HEADER_SIZE {
        return Ok(Step::End);
    }

    let record_type = cursor.read_u16();
    let flags = cursor.read_u16();
    let size = cursor.read_u32();
    let data_size = cursor.read_u32() as usize;

    if data_size > cursor.remaining() {
        debug!(
            "EMF+ record at {} needs {} bytes, {} remain; stopping",
            base + local,
            data_size,
            cursor.remaining()
        );
        return Ok(Step::End);
    }
    if (size as usize) < EMFPLUS_RECORD_HEADER_SIZE {
        return Err(MetafileError::malformed(
            base + local,
            format!("EMF+ record size {} below header size", size),
        ));
    }

    let payload = cursor.read_bytes(data_size);
    // Size may include padding past the data
    let consumed = (size as usize).max(EMFPLUS_RECORD_HEADER_SIZE + data_size);
    cursor.seek(local.saturating_add(consumed));

    Ok(Step::Record(Record {
        opcode: record_type as u32,
        declared_size: size,
        flags,
        offset: base + local,
        payload,
    }))
}
