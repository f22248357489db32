use bytes::{BufMut, Bytes, BytesMut};

use crate::codec::VARIABLE_HEADER_SIZE;
use crate::error::{FrameError, Result};

const INITIAL_BUFFER_CAPACITY: usize = 64;

/// Builds one outbound packet.
///
/// Variable-length packets reserve the 16-bit length after the opcode and
/// back-patch it in [`PacketWriter::finish`].
#[derive(Debug)]
pub struct PacketWriter {
    buf: BytesMut,
    variable: bool,
}

impl PacketWriter {
    /// Start a fixed-length packet.
    pub fn fixed(opcode: u8) -> Self {
        let mut buf = BytesMut::with_capacity(INITIAL_BUFFER_CAPACITY);
        buf.put_u8(opcode);
        Self {
            buf,
            variable: false,
        }
    }

    /// Start a variable-length packet.
    pub fn variable(opcode: u8) -> Self {
        let mut buf = BytesMut::with_capacity(INITIAL_BUFFER_CAPACITY);
        buf.put_u8(opcode);
        buf.put_u16(0);
        Self {
            buf,
            variable: true,
        }
    }

    /// Bytes written so far, header included.
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn put_u8(&mut self, value: u8) -> &mut Self {
        self.buf.put_u8(value);
        self
    }

    pub fn put_u16_be(&mut self, value: u16) -> &mut Self {
        self.buf.put_u16(value);
        self
    }

    pub fn put_u32_be(&mut self, value: u32) -> &mut Self {
        self.buf.put_u32(value);
        self
    }

    pub fn put_bytes(&mut self, bytes: &[u8]) -> &mut Self {
        self.buf.put_slice(bytes);
        self
    }

    /// NUL-padded single-byte text of exactly `len` bytes.
    pub fn put_ascii_fixed(&mut self, text: &str, len: usize) -> &mut Self {
        let bytes: Vec<u8> = text.chars().map(|c| c as u32 as u8).take(len).collect();
        self.buf.put_slice(&bytes);
        self.buf.put_bytes(0, len - bytes.len());
        self
    }

    /// Finish the packet, patching the length of variable packets.
    pub fn finish(mut self) -> Result<Bytes> {
        if self.variable {
            let size = self.buf.len();
            if size > u16::MAX as usize {
                return Err(FrameError::FrameTooLarge {
                    size,
                    max: u16::MAX as usize,
                });
            }
            debug_assert!(size >= VARIABLE_HEADER_SIZE);
            self.buf[1..3].copy_from_slice(&(size as u16).to_be_bytes());
        }
        Ok(self.buf.freeze())
    }
}
