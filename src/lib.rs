//! WMF / EMF / EMF+ decoder and replay engine
//!
//! Decodes Windows metafiles from a byte buffer into a list of records and
//! replays those records onto any [`DrawingSurface`]. Header problems abort
//! decoding and are reported on the returned [`Metafile`]; damaged records
//! inside a stream are skipped or end the stream without failing the call.
//!
//! ```no_run
//! use metafile_replay::{decode, replay, RecordingSurface};
//!
//! let data = std::fs::read("drawing.wmf").unwrap();
//! let metafile = decode(&data);
//! let mut surface = RecordingSurface::new();
//! let summary = replay(&metafile, &mut surface);
//! println!("{} records, {} unhandled", summary.dispatched, summary.unhandled);
//! ```

pub mod cursor;
pub mod emf;
pub mod emf_records;
pub mod emfplus;
pub mod emfplus_records;
pub mod error;
pub mod mapper;
pub mod objects;
pub mod options;
pub mod record;
pub mod replay;
pub mod sniff;
pub mod surface;
pub mod svg_writer;
pub mod types;
pub mod wmf;
pub mod wmf_records;

#[cfg(test)]
mod testutil;

pub use emf::EmfHeader;
pub use error::{MetafileError, MetafileResult};
pub use options::{DecodeOptions, ReplayOptions};
pub use record::Record;
pub use replay::ReplaySummary;
pub use sniff::{detect, FileKind};
pub use surface::{DrawingSurface, RecordingSurface, SurfaceOp};
pub use svg_writer::SvgSurface;
pub use types::{Color, Point, RectL, Size};
pub use wmf::{PlaceableHeader, WmfHeader};

use log::{debug, warn};

/// Header of a decoded file
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Header {
    Wmf(WmfHeader),
    Emf(EmfHeader),
}

/// Result of decoding one buffer
///
/// On a header-level failure `header` is `None`, `records` is empty and
/// `error` holds the reason. Records borrow their payloads from the input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Metafile<'a> {
    pub kind: FileKind,
    pub header: Option<Header>,
    pub records: Vec<Record<'a>>,
    pub error: Option<MetafileError>,
}

impl<'a> Metafile<'a> {
    fn failed(kind: FileKind, error: MetafileError) -> Self {
        Self {
            kind,
            header: None,
            records: Vec::new(),
            error: Some(error),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

/// Decode a buffer with default options
pub fn decode(data: &[u8]) -> Metafile<'_> {
    decode_with(data, &DecodeOptions::default())
}

/// Classify and decode a buffer
///
/// WMF output omits the META_EOF terminator; EMF output keeps EMR_EOF. The
/// EMF+ view holds only the records unwrapped from EMF+ comments.
pub fn decode_with<'a>(data: &'a [u8], options: &DecodeOptions) -> Metafile<'a> {
    let kind = detect(data);
    debug!("Detected {:?} ({} bytes)", kind, data.len());

    let decoded = match kind {
        FileKind::PlaceableWmf | FileKind::Wmf => {
            wmf::decode(data, kind, options).map(|file| (Header::Wmf(file.header), file.records))
        }
        FileKind::Emf => emf::decode(data).map(|file| (Header::Emf(file.header), file.records)),
        FileKind::EmfPlus => {
            emfplus::decode(data, options).map(|file| (Header::Emf(file.header), file.records))
        }
        FileKind::Unknown => Err(MetafileError::UnknownFormat),
    };

    match decoded {
        Ok((header, records)) => Metafile {
            kind,
            header: Some(header),
            records,
            error: None,
        },
        Err(e) => {
            warn!("Failed to decode {:?} metafile: {}", kind, e);
            Metafile::failed(kind, e)
        }
    }
}

/// Replay decoded records with default options
pub fn replay(metafile: &Metafile<'_>, surface: &mut dyn DrawingSurface) -> ReplaySummary {
    replay_with(metafile, surface, &ReplayOptions::default())
}

/// Replay decoded records onto a surface
///
/// The surface first receives `set_size` and, unless disabled, a background
/// fill. A metafile that failed to decode replays nothing.
pub fn replay_with(
    metafile: &Metafile<'_>,
    surface: &mut dyn DrawingSurface,
    options: &ReplayOptions,
) -> ReplaySummary {
    replay::run(metafile, surface, options)
}

/// Decode a buffer and replay it onto a surface in one call
pub fn decode_and_replay<'a>(data: &'a [u8], surface: &mut dyn DrawingSurface) -> Metafile<'a> {
    let metafile = decode(data);
    replay(&metafile, surface);
    metafile
}

/// Render a metafile buffer to an SVG document
pub fn render_svg(data: &[u8]) -> MetafileResult<String> {
    let metafile = decode(data);
    if let Some(error) = &metafile.error {
        return Err(error.clone());
    }
    let mut surface = SvgSurface::new();
    let summary = replay(&metafile, &mut surface);
    debug!(
        "SVG render: {} elements from {} records",
        surface.len(),
        summary.dispatched
    );
    Ok(surface.finish())
}
