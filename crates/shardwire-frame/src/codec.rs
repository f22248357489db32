use bytes::{Bytes, BytesMut};
use shardwire_transport::RingGuard;

use crate::error::{FrameError, Result};
use crate::table::{PacketLength, PacketTable};

/// Header of a variable-length frame: opcode (1) + total length (2 BE).
pub const VARIABLE_HEADER_SIZE: usize = 3;

/// Header of a fixed-length frame: the opcode alone.
pub const FIXED_HEADER_SIZE: usize = 1;

/// Random-access view of buffered, not yet consumed bytes.
pub trait ByteSource {
    /// Number of bytes currently readable.
    fn available(&self) -> usize;

    /// Byte at `index`, or `None` past the end.
    fn byte_at(&self, index: usize) -> Option<u8>;
}

impl ByteSource for [u8] {
    fn available(&self) -> usize {
        self.len()
    }

    fn byte_at(&self, index: usize) -> Option<u8> {
        self.get(index).copied()
    }
}

impl ByteSource for BytesMut {
    fn available(&self) -> usize {
        self.len()
    }

    fn byte_at(&self, index: usize) -> Option<u8> {
        self.get(index).copied()
    }
}

impl ByteSource for RingGuard<'_> {
    fn available(&self) -> usize {
        self.len()
    }

    fn byte_at(&self, index: usize) -> Option<u8> {
        self.peek(index)
    }
}

/// Boundaries of the frame at the front of a [`ByteSource`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameInfo {
    pub opcode: u8,
    /// Bytes before the first payload field (1 or 3).
    pub header_len: usize,
    /// Whole frame length, header included.
    pub total_len: usize,
}

impl FrameInfo {
    /// True once `available` bytes cover the whole frame.
    pub fn is_complete(&self, available: usize) -> bool {
        available >= self.total_len
    }

    pub fn payload_len(&self) -> usize {
        self.total_len - self.header_len
    }
}

/// A complete, owned frame.
#[derive(Debug, Clone)]
pub struct Frame {
    pub opcode: u8,
    pub header_len: usize,
    /// Whole frame bytes, header included.
    pub data: Bytes,
}

impl Frame {
    /// Payload bytes following the header.
    pub fn payload(&self) -> &[u8] {
        &self.data[self.header_len..]
    }

    /// The total wire size of this frame (header + payload).
    pub fn wire_size(&self) -> usize {
        self.data.len()
    }
}

/// Determine the frame at the front of `src` without consuming anything.
///
/// Returns `Ok(None)` when not even the header is available yet. A returned
/// [`FrameInfo`] may still describe more bytes than are buffered; check
/// [`FrameInfo::is_complete`] before dequeuing.
///
/// Errors:
/// - [`FrameError::UnknownOpcode`] when the table has no entry for the opcode
/// - [`FrameError::MalformedFrame`] when a variable frame declares a length
///   shorter than its own header (including 0)
pub fn peek_frame<S>(src: &S, table: &PacketTable) -> Result<Option<FrameInfo>>
where
    S: ByteSource + ?Sized,
{
    let Some(opcode) = src.byte_at(0) else {
        return Ok(None);
    };

    match table.length(opcode) {
        PacketLength::Unknown => Err(FrameError::UnknownOpcode(opcode)),
        PacketLength::Fixed(len) => Ok(Some(FrameInfo {
            opcode,
            header_len: FIXED_HEADER_SIZE,
            total_len: len as usize,
        })),
        PacketLength::Variable => {
            let (Some(hi), Some(lo)) = (src.byte_at(1), src.byte_at(2)) else {
                return Ok(None); // Need more data
            };
            let declared = u16::from_be_bytes([hi, lo]) as usize;
            if declared < VARIABLE_HEADER_SIZE {
                return Err(FrameError::MalformedFrame { opcode, declared });
            }
            Ok(Some(FrameInfo {
                opcode,
                header_len: VARIABLE_HEADER_SIZE,
                total_len: declared,
            }))
        }
    }
}

/// Decode a frame from a buffer.
///
/// Returns `Ok(None)` if the buffer doesn't contain a complete frame yet.
/// On success, consumes the frame bytes from the buffer. Errors leave the
/// buffer untouched so the caller can decide how to resynchronize.
pub fn decode_frame(src: &mut BytesMut, table: &PacketTable) -> Result<Option<Frame>> {
    let Some(info) = peek_frame(&src[..], table)? else {
        return Ok(None);
    };
    if !info.is_complete(src.len()) {
        return Ok(None); // Need more data
    }

    let data = src.split_to(info.total_len).freeze();
    Ok(Some(Frame {
        opcode: info.opcode,
        header_len: info.header_len,
        data,
    }))
}

/// `tokio_util` codec yielding whole frames from an async byte stream.
///
/// Unknown or malformed frames are skipped one byte at a time, matching
/// the engine's resynchronization policy.
#[cfg(feature = "async")]
#[derive(Debug, Clone, Default)]
pub struct PacketCodec {
    table: PacketTable,
    skipped: u64,
}

#[cfg(feature = "async")]
impl PacketCodec {
    pub fn new(table: PacketTable) -> Self {
        Self { table, skipped: 0 }
    }

    /// Bytes dropped while resynchronizing.
    pub fn skipped(&self) -> u64 {
        self.skipped
    }
}

#[cfg(feature = "async")]
impl tokio_util::codec::Decoder for PacketCodec {
    type Item = Frame;
    type Error = FrameError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Frame>> {
        use bytes::Buf;

        loop {
            match decode_frame(src, &self.table) {
                Ok(frame) => return Ok(frame),
                Err(err @ (FrameError::UnknownOpcode(_) | FrameError::MalformedFrame { .. })) => {
                    tracing::warn!(error = %err, "dropping one byte to resynchronize");
                    src.advance(1);
                    self.skipped += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use bytes::BufMut;
    use shardwire_transport::RingBuffer;

    use super::*;

    fn table() -> PacketTable {
        PacketTable::legacy()
    }

    #[test]
    fn test_fixed_frame_info() {
        let bytes = [0x1D, 0x40, 0x00, 0x00, 0x01];
        let info = peek_frame(&bytes[..], &table()).unwrap().unwrap();
        assert_eq!(info.opcode, 0x1D);
        assert_eq!(info.header_len, 1);
        assert_eq!(info.total_len, 5);
        assert_eq!(info.payload_len(), 4);
    }

    #[test]
    fn test_fixed_frame_reported_before_complete() {
        let bytes = [0x1D, 0x40];
        let info = peek_frame(&bytes[..], &table()).unwrap().unwrap();
        assert!(!info.is_complete(bytes.len()));
    }

    #[test]
    fn test_variable_frame_info() {
        let bytes = [0x98, 0x00, 0x08, 0, 0, 0, 1, b'A'];
        let info = peek_frame(&bytes[..], &table()).unwrap().unwrap();
        assert_eq!(info.header_len, 3);
        assert_eq!(info.total_len, 8);
        assert!(info.is_complete(bytes.len()));
    }

    #[test]
    fn test_variable_needs_three_bytes() {
        let bytes = [0x98, 0x00];
        assert!(peek_frame(&bytes[..], &table()).unwrap().is_none());
    }

    #[test]
    fn test_empty_source() {
        let bytes: [u8; 0] = [];
        assert!(peek_frame(&bytes[..], &table()).unwrap().is_none());
    }

    #[test]
    fn test_unknown_opcode() {
        let bytes = [0xFF, 0x01, 0x02];
        let err = peek_frame(&bytes[..], &table()).unwrap_err();
        assert!(matches!(err, FrameError::UnknownOpcode(0xFF)));
    }

    #[test]
    fn test_declared_length_shorter_than_header() {
        for declared in [0u16, 1, 2] {
            let mut buf = BytesMut::new();
            buf.put_u8(0x98);
            buf.put_u16(declared);
            let err = peek_frame(&buf, &table()).unwrap_err();
            assert!(matches!(err, FrameError::MalformedFrame { opcode: 0x98, .. }));
        }
    }

    #[test]
    fn test_peek_does_not_consume_ring() {
        let ring = RingBuffer::with_capacity(32);
        ring.append(&[0xA1, 0, 0, 0, 1, 0, 10, 0, 5]).unwrap();
        let guard = ring.lock();
        let info = peek_frame(&guard, &table()).unwrap().unwrap();
        assert_eq!(info.total_len, 9);
        assert_eq!(guard.len(), 9);
    }

    #[test]
    fn test_decode_frame_consumes_exactly_one() {
        let mut buf = BytesMut::new();
        buf.put_slice(&[0x73, 0x05]);
        buf.put_slice(&[0x98, 0x00, 0x03]);

        let ping = decode_frame(&mut buf, &table()).unwrap().unwrap();
        assert_eq!(ping.opcode, 0x73);
        assert_eq!(ping.payload(), &[0x05]);

        let name = decode_frame(&mut buf, &table()).unwrap().unwrap();
        assert_eq!(name.opcode, 0x98);
        assert!(name.payload().is_empty());
        assert_eq!(name.wire_size(), 3);
        assert!(buf.is_empty());
    }

    #[test]
    fn test_decode_frame_incomplete_payload() {
        let mut buf = BytesMut::from(&[0x98, 0x00, 0x10, 0x01][..]);
        assert!(decode_frame(&mut buf, &table()).unwrap().is_none());
        assert_eq!(buf.len(), 4);
    }

    #[cfg(feature = "async")]
    #[tokio::test]
    async fn test_codec_resyncs_over_garbage() {
        use futures_util::StreamExt;
        use tokio_util::codec::FramedRead;

        let wire: Vec<u8> = vec![0xFF, 0x73, 0x01, 0xFF, 0xFF, 0x73, 0x02];
        let mut framed = FramedRead::new(&wire[..], PacketCodec::new(table()));

        let first = framed.next().await.unwrap().unwrap();
        let second = framed.next().await.unwrap().unwrap();
        assert_eq!(first.payload(), &[0x01]);
        assert_eq!(second.payload(), &[0x02]);
        assert!(framed.next().await.is_none());
        assert_eq!(framed.decoder().skipped(), 3);
    }
}
