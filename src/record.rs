//! Format-independent record representation and the shared record loop

use crate::cursor::ByteCursor;
use crate::error::MetafileResult;
use log::{debug, warn};

/// One decoded metafile record
///
/// `opcode` is the WMF function number, the EMF record type or the EMF+
/// record type. `declared_size` is the size field exactly as stored (16-bit
/// words for WMF, bytes for EMF and EMF+). `payload` excludes the record's own
/// fixed header fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record<'a> {
    pub opcode: u32,
    pub declared_size: u32,
    /// EMF+ record flags; zero for WMF and EMF
    pub flags: u16,
    /// Byte offset of the record start within the buffer it was read from
    pub offset: usize,
    pub payload: &'a [u8],
}

impl<'a> Record<'a> {
    pub fn payload_cursor(&self) -> ByteCursor<'a> {
        ByteCursor::new(self.payload)
    }
}

/// Outcome of decoding a single record
pub(crate) enum Step<'a> {
    Record(Record<'a>),
    /// Natural or forced end of the record stream
    End,
}

/// How the record loop reacts to a record that fails to decode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct RecoveryPolicy {
    /// Bytes to advance past the failed record's start before trying again
    pub resync_skip: usize,
    /// Upper bound on records produced by the loop
    pub max_records: usize,
}

/// Drive `next` over the cursor until the stream ends or a limit is hit
///
/// A failing record is logged and the cursor is moved to
/// `record start + resync_skip`, so the loop always makes forward progress.
pub(crate) fn walk_records<'a, F>(
    cursor: &mut ByteCursor<'a>,
    policy: RecoveryPolicy,
    mut next: F,
) -> Vec<Record<'a>>
where
    F: FnMut(&mut ByteCursor<'a>) -> MetafileResult<Step<'a>>,
{
    let mut records = Vec::new();

    while cursor.remaining() > 0 && records.len() < policy.max_records {
        let start = cursor.position();
        match next(cursor) {
            Ok(Step::Record(record)) => records.push(record),
            Ok(Step::End) => {
                debug!("Record stream ended at offset {}", start);
                break;
            }
            Err(e) => {
                warn!("{}; resynchronizing {} bytes ahead", e, policy.resync_skip);
                cursor.seek(start.saturating_add(policy.resync_skip.max(1)));
            }
        }
    }

    records
}

/// Declare a closed opcode enum with an `Unhandled` catch-all
///
/// Generates `from_opcode`, `opcode` and `name`.
macro_rules! record_kinds {
    (
        $(#[$meta:meta])*
        pub enum $name:ident : $repr:ty {
            $($variant:ident = $value:literal => $label:literal,)+
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        pub enum $name {
            $($variant,)+
            Unhandled($repr),
        }

        impl $name {
            pub fn from_opcode(opcode: $repr) -> Self {
                match opcode {
                    $($value => $name::$variant,)+
                    other => $name::Unhandled(other),
                }
            }

            pub fn opcode(self) -> $repr {
                match self {
                    $($name::$variant => $value,)+
                    $name::Unhandled(other) => other,
                }
            }

            pub fn name(self) -> &'static str {
                match self {
                    $($name::$variant => $label,)+
                    $name::Unhandled(_) => "UNKNOWN",
                }
            }
        }
    };
}

pub(crate) use record_kinds;
