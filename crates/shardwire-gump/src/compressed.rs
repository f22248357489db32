use std::io::{self, Read};

use flate2::read::ZlibDecoder;
use shardwire_frame::PacketReader;

/// Inflate `input` into exactly `out.len()` bytes.
///
/// A stream that ends early leaves the tail zeroed, which the tokenizer
/// treats as a terminator. Extra output beyond `out.len()` is ignored.
pub fn inflate_into(input: &[u8], out: &mut [u8]) -> io::Result<()> {
    out.fill(0);
    let mut decoder = ZlibDecoder::new(input);
    let mut filled = 0;
    while filled < out.len() {
        match decoder.read(&mut out[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    if filled < out.len() {
        tracing::debug!(
            declared = out.len(),
            inflated = filled,
            "zlib block shorter than declared"
        );
    }
    Ok(())
}

/// Parse `count` text lines from an inflated lines block.
///
/// Each record is a big-endian u16 character count followed by that many
/// UTF-16BE units. Records missing from a short block come back empty.
pub fn parse_lines(block: &[u8], count: usize) -> Vec<String> {
    let mut reader = PacketReader::new(block);
    let mut lines = Vec::with_capacity(count);
    for _ in 0..count {
        if reader.remaining() < 2 {
            lines.push(String::new());
            continue;
        }
        let chars = reader.read_u16_be().map_or(0, usize::from);
        let available = chars.min(reader.remaining() / 2);
        lines.push(reader.read_unicode_be(available).unwrap_or_default());
    }
    lines
}
