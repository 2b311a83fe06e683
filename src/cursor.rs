//! Bounds-safe little-endian reader
//!
//! Every read past the end of the buffer yields zero instead of an error, so a
//! truncated file degrades to zero-filled fields. The position never moves
//! past the end of the buffer.

use byteorder::{ByteOrder, LittleEndian};

/// Sequential and random-access reader over an immutable byte buffer
#[derive(Debug, Clone)]
pub struct ByteCursor<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> ByteCursor<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// Underlying buffer
    pub fn data(&self) -> &'a [u8] {
        self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    /// Bytes left between the current position and the end of the buffer
    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    /// Move to an absolute offset, clamped to the buffer length
    pub fn seek(&mut self, offset: usize) {
        self.pos = offset.min(self.data.len());
    }

    /// Advance by `n` bytes, clamped to the buffer length
    pub fn skip(&mut self, n: usize) {
        self.seek(self.pos.saturating_add(n));
    }

    fn field(&self, offset: usize, width: usize) -> Option<&'a [u8]> {
        let end = offset.checked_add(width)?;
        self.data.get(offset..end)
    }

    pub fn peek_u8_at(&self, offset: usize) -> u8 {
        self.data.get(offset).copied().unwrap_or(0)
    }

    pub fn peek_u16_at(&self, offset: usize) -> u16 {
        self.field(offset, 2).map(LittleEndian::read_u16).unwrap_or(0)
    }

    pub fn peek_u32_at(&self, offset: usize) -> u32 {
        self.field(offset, 4).map(LittleEndian::read_u32).unwrap_or(0)
    }

    pub fn read_u8(&mut self) -> u8 {
        let value = self.peek_u8_at(self.pos);
        self.skip(1);
        value
    }

    pub fn read_u16(&mut self) -> u16 {
        let value = self.peek_u16_at(self.pos);
        self.skip(2);
        value
    }

    pub fn read_u32(&mut self) -> u32 {
        let value = self.peek_u32_at(self.pos);
        self.skip(4);
        value
    }

    pub fn read_i16(&mut self) -> i16 {
        let value = self
            .field(self.pos, 2)
            .map(LittleEndian::read_i16)
            .unwrap_or(0);
        self.skip(2);
        value
    }

    pub fn read_i32(&mut self) -> i32 {
        let value = self
            .field(self.pos, 4)
            .map(LittleEndian::read_i32)
            .unwrap_or(0);
        self.skip(4);
        value
    }

    pub fn read_f32(&mut self) -> f32 {
        let value = self
            .field(self.pos, 4)
            .map(LittleEndian::read_f32)
            .unwrap_or(0.0);
        self.skip(4);
        value
    }

    /// Read up to `n` bytes; the count is clamped to what remains
    pub fn read_bytes(&mut self, n: usize) -> &'a [u8] {
        let n = n.min(self.remaining());
        let bytes = &self.data[self.pos..self.pos + n];
        self.pos += n;
        bytes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sequential_reads() {
        let data = [0x01, 0x00, 0x09, 0x00, 0xFE, 0xFF, 0x78, 0x56, 0x34, 0x12];
        let mut cursor = ByteCursor::new(&data);
        assert_eq!(cursor.read_u16(), 1);
        assert_eq!(cursor.read_u16(), 9);
        assert_eq!(cursor.read_i16(), -2);
        assert_eq!(cursor.read_u32(), 0x12345678);
        assert_eq!(cursor.position(), 10);
        assert_eq!(cursor.remaining(), 0);
    }

    #[test]
    fn test_reads_past_end_are_zero() {
        let data = [0xAA, 0xBB, 0xCC];
        let mut cursor = ByteCursor::new(&data);
        cursor.seek(2);
        assert_eq!(cursor.read_u32(), 0);
        assert_eq!(cursor.position(), 3);
        assert_eq!(cursor.read_u8(), 0);
        assert_eq!(cursor.read_i32(), 0);
        assert_eq!(cursor.position(), 3);
    }

    #[test]
    fn test_read_bytes_clamps() {
        let data = [1, 2, 3, 4];
        let mut cursor = ByteCursor::new(&data);
        cursor.skip(1);
        assert_eq!(cursor.read_bytes(100), &[2, 3, 4]);
        assert!(cursor.read_bytes(5).is_empty());
    }

    #[test]
    fn test_peek_does_not_move() {
        let data = [0x20, 0x45, 0x4D, 0x46];
        let cursor = ByteCursor::new(&data);
        assert_eq!(cursor.peek_u32_at(0), 0x464D4520);
        assert_eq!(cursor.peek_u16_at(3), 0);
        assert_eq!(cursor.peek_u32_at(usize::MAX), 0);
        assert_eq!(cursor.position(), 0);
    }

    #[test]
    fn test_seek_clamps() {
        let data = [0u8; 8];
        let mut cursor = ByteCursor::new(&data);
        cursor.seek(100);
        assert_eq!(cursor.position(), 8);
        cursor.skip(usize::MAX);
        assert_eq!(cursor.position(), 8);
    }
}
