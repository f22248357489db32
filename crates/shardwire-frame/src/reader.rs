use crate::error::{FrameError, Result};

/// Big-endian field cursor over one frame.
///
/// The cursor starts after the frame header and can never move past the
/// frame boundary: every read that would cross it returns
/// [`FrameError::Truncated`] and leaves the position unchanged.
///
/// Each opcode keeps its own string encoding, so the reader offers the
/// fixed/NUL-terminated ASCII, UTF-8 and UTF-16 (BE and LE) variants
/// individually instead of a single "read string".
#[derive(Debug, Clone)]
pub struct PacketReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> PacketReader<'a> {
    /// Reader over raw bytes, positioned at offset 0.
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// Reader over a whole frame, positioned after its header.
    pub fn at_payload(frame: &'a [u8], header_len: usize) -> Self {
        Self {
            data: frame,
            pos: header_len.min(frame.len()),
        }
    }

    /// First byte of the underlying frame.
    pub fn opcode(&self) -> Option<u8> {
        self.data.first().copied()
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    /// Length of the underlying frame.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Bytes left before the frame boundary.
    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    /// True when no bytes are left to read.
    pub fn is_exhausted(&self) -> bool {
        self.remaining() == 0
    }

    /// Move to an absolute offset within the frame.
    pub fn seek(&mut self, pos: usize) -> Result<()> {
        if pos > self.data.len() {
            return Err(FrameError::Truncated {
                needed: pos,
                remaining: self.data.len(),
            });
        }
        self.pos = pos;
        Ok(())
    }

    pub fn skip(&mut self, count: usize) -> Result<()> {
        self.read_bytes(count).map(|_| ())
    }

    pub fn read_bytes(&mut self, count: usize) -> Result<&'a [u8]> {
        if count > self.remaining() {
            return Err(FrameError::Truncated {
                needed: count,
                remaining: self.remaining(),
            });
        }
        let bytes = &self.data[self.pos..self.pos + count];
        self.pos += count;
        Ok(bytes)
    }

    /// Everything up to the frame boundary.
    pub fn rest(&mut self) -> &'a [u8] {
        let bytes = &self.data[self.pos..];
        self.pos = self.data.len();
        bytes
    }

    fn read_array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.read_bytes(N)?);
        Ok(out)
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        Ok(self.read_array::<1>()?[0])
    }

    pub fn read_i8(&mut self) -> Result<i8> {
        Ok(self.read_u8()? as i8)
    }

    pub fn read_bool(&mut self) -> Result<bool> {
        Ok(self.read_u8()? != 0)
    }

    pub fn read_u16_be(&mut self) -> Result<u16> {
        Ok(u16::from_be_bytes(self.read_array()?))
    }

    pub fn read_i16_be(&mut self) -> Result<i16> {
        Ok(i16::from_be_bytes(self.read_array()?))
    }

    pub fn read_u32_be(&mut self) -> Result<u32> {
        Ok(u32::from_be_bytes(self.read_array()?))
    }

    pub fn read_i32_be(&mut self) -> Result<i32> {
        Ok(i32::from_be_bytes(self.read_array()?))
    }

    /// Fixed-width single-byte text; stops at the first NUL.
    pub fn read_ascii(&mut self, len: usize) -> Result<String> {
        Ok(latin1(self.read_bytes(len)?))
    }

    /// Single-byte text up to a NUL or the frame boundary.
    pub fn read_ascii_nul(&mut self) -> String {
        let rest = &self.data[self.pos..];
        let end = rest.iter().position(|b| *b == 0);
        let consumed = end.map_or(rest.len(), |idx| idx + 1);
        self.pos += consumed;
        latin1(&rest[..end.unwrap_or(rest.len())])
    }

    /// `len` bytes of UTF-8; invalid sequences are replaced.
    pub fn read_utf8(&mut self, len: usize) -> Result<String> {
        let bytes = self.read_bytes(len)?;
        let end = bytes.iter().position(|b| *b == 0).unwrap_or(bytes.len());
        Ok(String::from_utf8_lossy(&bytes[..end]).into_owned())
    }

    /// `chars` UTF-16 big-endian code units.
    pub fn read_unicode_be(&mut self, chars: usize) -> Result<String> {
        let bytes = self.read_bytes(chars * 2)?;
        Ok(utf16(bytes.chunks_exact(2).map(|c| u16::from_be_bytes([c[0], c[1]]))))
    }

    /// `chars` UTF-16 little-endian code units.
    pub fn read_unicode_le(&mut self, chars: usize) -> Result<String> {
        let bytes = self.read_bytes(chars * 2)?;
        Ok(utf16(bytes.chunks_exact(2).map(|c| u16::from_le_bytes([c[0], c[1]]))))
    }

    /// UTF-16 big-endian up to a NUL unit or the frame boundary.
    pub fn read_unicode_be_nul(&mut self) -> String {
        self.read_unicode_nul(u16::from_be_bytes)
    }

    /// UTF-16 little-endian up to a NUL unit or the frame boundary.
    pub fn read_unicode_le_nul(&mut self) -> String {
        self.read_unicode_nul(u16::from_le_bytes)
    }

    fn read_unicode_nul(&mut self, unit: fn([u8; 2]) -> u16) -> String {
        let mut units = Vec::new();
        while self.remaining() >= 2 {
            let pair = [self.data[self.pos], self.data[self.pos + 1]];
            self.pos += 2;
            let value = unit(pair);
            if value == 0 {
                break;
            }
            units.push(value);
        }
        utf16(units.into_iter())
    }
}

fn latin1(bytes: &[u8]) -> String {
    bytes
        .iter()
        .take_while(|b| **b != 0)
        .map(|b| *b as char)
        .collect()
}

fn utf16(units: impl Iterator<Item = u16>) -> String {
    char::decode_utf16(units.take_while(|u| *u != 0))
        .map(|r| r.unwrap_or(char::REPLACEMENT_CHARACTER))
        .collect()
}
