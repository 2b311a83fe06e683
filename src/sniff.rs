//! Metafile format detection

use crate::cursor::ByteCursor;
use crate::emf::{EMF_HEADER_MIN_SIZE, EMF_SIGNATURE};
use crate::emf_records::EMR_COMMENT;
use crate::emfplus::EMFPLUS_COMMENT_ID;
use crate::emfplus_records::{EMFPLUS_TYPE_FIRST, EMFPLUS_TYPE_LAST};
use crate::wmf::PLACEABLE_KEY;

/// Metafile flavor, decided once per buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    PlaceableWmf,
    Wmf,
    Emf,
    EmfPlus,
    Unknown,
}

/// First dwords of a standard WMF header (type | header size << 16)
const WMF_HEADER_DWORDS: [u32; 3] = [0x0009_0001, 0x0009_0002, 0x0009_0000];

/// Offset of the `dSignature` field in the EMF header
const EMF_SIGNATURE_OFFSET: usize = 40;

/// Classify a buffer by its leading bytes
pub fn detect(data: &[u8]) -> FileKind {
    if data.len() < 4 {
        return FileKind::Unknown;
    }

    let cursor = ByteCursor::new(data);
    let first = cursor.peek_u32_at(0);

    if first == PLACEABLE_KEY {
        return FileKind::PlaceableWmf;
    }
    if WMF_HEADER_DWORDS.contains(&first) {
        return FileKind::Wmf;
    }
    if data.len() >= EMF_HEADER_MIN_SIZE && cursor.peek_u32_at(EMF_SIGNATURE_OFFSET) == EMF_SIGNATURE {
        if leads_with_emfplus(&cursor) {
            return FileKind::EmfPlus;
        }
        return FileKind::Emf;
    }

    FileKind::Unknown
}

/// Whether the first record after the EMF header carries EMF+ content
fn leads_with_emfplus(cursor: &ByteCursor<'_>) -> bool {
    let header_size = cursor.peek_u32_at(4) as usize;
    let record_type = cursor.peek_u32_at(header_size);
    if is_emfplus_type(record_type) {
        return true;
    }

    // type, size, data size, comment id, then the first EMF+ record header
    if record_type == EMR_COMMENT
        && cursor.peek_u32_at(header_size.saturating_add(12)) == EMFPLUS_COMMENT_ID
    {
        let plus_type = cursor.peek_u16_at(header_size.saturating_add(16)) as u32;
        return is_emfplus_type(plus_type);
    }

    false
}

fn is_emfplus_type(value: u32) -> bool {
    (EMFPLUS_TYPE_FIRST as u32..=EMFPLUS_TYPE_LAST as u32).contains(&value)
}
