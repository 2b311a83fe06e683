//! Synthetic metafile builders for tests

use crate::emf::EMF_SIGNATURE;
use crate::emf_records::EMR_COMMENT;
use crate::emfplus::EMFPLUS_COMMENT_ID;
use crate::wmf::PLACEABLE_KEY;

/// Little-endian 16-bit words
pub fn words(values: &[i16]) -> Vec<u8> {
    values.iter().flat_map(|v| v.to_le_bytes()).collect()
}

/// Little-endian 32-bit dwords
pub fn dwords(values: &[i32]) -> Vec<u8> {
    values.iter().flat_map(|v| v.to_le_bytes()).collect()
}

/// Little-endian 32-bit floats
pub fn floats(values: &[f32]) -> Vec<u8> {
    values.iter().flat_map(|v| v.to_le_bytes()).collect()
}

pub struct WmfBuilder {
    placeable: Option<(i16, i16, i16, i16, u16)>,
    header_words: u16,
    body: Vec<u8>,
}

impl WmfBuilder {
    pub fn new() -> Self {
        Self {
            placeable: None,
            header_words: 9,
            body: Vec::new(),
        }
    }

    pub fn placeable(mut self, left: i16, top: i16, right: i16, bottom: i16, units_per_inch: u16) -> Self {
        self.placeable = Some((left, top, right, bottom, units_per_inch));
        self
    }

    pub fn header_words(mut self, words: u16) -> Self {
        self.header_words = words;
        self
    }

    pub fn record(mut self, function: u16, params: &[u8]) -> Self {
        let mut params = params.to_vec();
        if params.len() % 2 != 0 {
            params.push(0);
        }
        let size_words = 3 + params.len() as u32 / 2;
        self.body.extend_from_slice(&size_words.to_le_bytes());
        self.body.extend_from_slice(&function.to_le_bytes());
        self.body.extend_from_slice(&params);
        self
    }

    pub fn raw(mut self, bytes: &[u8]) -> Self {
        self.body.extend_from_slice(bytes);
        self
    }

    pub fn eof(self) -> Self {
        self.record(0x0000, &[])
    }

    pub fn finish(self) -> Vec<u8> {
        let mut out = Vec::new();

        if let Some((left, top, right, bottom, inch)) = self.placeable {
            let fields: [u16; 10] = [
                (PLACEABLE_KEY & 0xFFFF) as u16,
                (PLACEABLE_KEY >> 16) as u16,
                0,
                left as u16,
                top as u16,
                right as u16,
                bottom as u16,
                inch,
                0,
                0,
            ];
            let checksum = fields.iter().fold(0u16, |acc, w| acc ^ w);
            for field in fields {
                out.extend_from_slice(&field.to_le_bytes());
            }
            out.extend_from_slice(&checksum.to_le_bytes());
        }

        let header_bytes = self.header_words as usize * 2;
        let total_words = ((header_bytes.max(18) + self.body.len()) / 2) as u32;
        out.extend_from_slice(&1u16.to_le_bytes());
        out.extend_from_slice(&self.header_words.to_le_bytes());
        out.extend_from_slice(&0x0300u16.to_le_bytes());
        out.extend_from_slice(&total_words.to_le_bytes());
        out.extend_from_slice(&0u16.to_le_bytes());
        out.extend_from_slice(&0u32.to_le_bytes());
        out.extend_from_slice(&0u16.to_le_bytes());
        if header_bytes > 18 {
            out.resize(out.len() + header_bytes - 18, 0);
        }

        out.extend_from_slice(&self.body);
        out
    }
}

pub struct EmfBuilder {
    bounds: [i32; 4],
    frame: [i32; 4],
    body: Vec<u8>,
    count: u32,
    record_count: Option<u32>,
    description: Option<String>,
}

impl EmfBuilder {
    pub fn new() -> Self {
        Self {
            bounds: [0, 0, 99, 99],
            frame: [0, 0, 2646, 2646],
            body: Vec::new(),
            count: 0,
            record_count: None,
            description: None,
        }
    }

    pub fn bounds(mut self, left: i32, top: i32, right: i32, bottom: i32) -> Self {
        self.bounds = [left, top, right, bottom];
        self
    }

    pub fn record(mut self, record_type: u32, payload: &[u8]) -> Self {
        let mut payload = payload.to_vec();
        while payload.len() % 4 != 0 {
            payload.push(0);
        }
        let size = 8 + payload.len() as u32;
        self.body.extend_from_slice(&record_type.to_le_bytes());
        self.body.extend_from_slice(&size.to_le_bytes());
        self.body.extend_from_slice(&payload);
        self.count += 1;
        self
    }

    pub fn raw(mut self, bytes: &[u8]) -> Self {
        self.body.extend_from_slice(bytes);
        self
    }

    /// EMR_COMMENT carrying arbitrary data
    pub fn comment(self, data: &[u8]) -> Self {
        let mut payload = (data.len() as u32).to_le_bytes().to_vec();
        payload.extend_from_slice(data);
        self.record(EMR_COMMENT, &payload)
    }

    /// EMR_COMMENT wrapping EMF+ records given as (type, flags, data)
    pub fn emfplus_comment(self, records: &[(u16, u16, &[u8])]) -> Self {
        let mut data = EMFPLUS_COMMENT_ID.to_le_bytes().to_vec();
        for (record_type, flags, payload) in records {
            let size = 12 + payload.len() as u32;
            data.extend_from_slice(&record_type.to_le_bytes());
            data.extend_from_slice(&flags.to_le_bytes());
            data.extend_from_slice(&size.to_le_bytes());
            data.extend_from_slice(&(payload.len() as u32).to_le_bytes());
            data.extend_from_slice(payload);
        }
        self.comment(&data)
    }

    pub fn record_count(mut self, count: u32) -> Self {
        self.record_count = Some(count);
        self
    }

    pub fn description(mut self, text: &str) -> Self {
        self.description = Some(text.to_string());
        self
    }

    pub fn finish(self) -> Vec<u8> {
        let description: Vec<u8> = self
            .description
            .as_deref()
            .map(|text| text.encode_utf16().flat_map(|u| u.to_le_bytes()).collect())
            .unwrap_or_default();
        let description_len = description.len() as u32 / 2;
        let header_size = 88 + description.len() as u32;
        let total = header_size + self.body.len() as u32;

        let mut out = Vec::new();
        out.extend_from_slice(&1u32.to_le_bytes());
        out.extend_from_slice(&header_size.to_le_bytes());
        for value in self.bounds.iter().chain(self.frame.iter()) {
            out.extend_from_slice(&value.to_le_bytes());
        }
        out.extend_from_slice(&EMF_SIGNATURE.to_le_bytes());
        out.extend_from_slice(&0x0001_0000u32.to_le_bytes());
        out.extend_from_slice(&total.to_le_bytes());
        out.extend_from_slice(&self.record_count.unwrap_or(self.count).to_le_bytes());
        out.extend_from_slice(&8u16.to_le_bytes());
        out.extend_from_slice(&0u16.to_le_bytes());
        out.extend_from_slice(&description_len.to_le_bytes());
        out.extend_from_slice(&(if description_len > 0 { 88u32 } else { 0 }).to_le_bytes());
        out.extend_from_slice(&0u32.to_le_bytes());
        out.extend_from_slice(&dwords(&[1024, 768, 320, 240]));
        out.extend_from_slice(&description);
        out.extend_from_slice(&self.body);
        out
    }
}
