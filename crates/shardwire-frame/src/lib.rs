//! Opcode-table packet framing for the shardwire protocol engine.
//!
//! Every message on the wire starts with a 1-byte opcode. The opcode's entry
//! in a per-version length table decides the rest:
//! - a fixed length, in which case the header is just the opcode
//! - "variable", in which case a 2-byte big-endian total length follows
//!
//! The framer only peeks; callers decide when to consume. Field access goes
//! through [`PacketReader`], which cannot read past the frame it was given.

pub mod codec;
pub mod error;
pub mod reader;
pub mod scratch;
pub mod table;
pub mod version;
pub mod writer;

#[cfg(feature = "async")]
pub use codec::PacketCodec;
pub use codec::{
    decode_frame, peek_frame, ByteSource, Frame, FrameInfo, FIXED_HEADER_SIZE,
    VARIABLE_HEADER_SIZE,
};
pub use error::{FrameError, Result};
pub use reader::PacketReader;
pub use scratch::{ScratchBuffer, DEFAULT_SCRATCH_CAPACITY};
pub use table::{PacketLength, PacketTable};
pub use version::{
    ClientVersion, CV_500A, CV_5090, CV_6013, CV_60142, CV_60143, CV_6017, CV_7000, CV_70180,
    CV_7090, CV_70331,
};
pub use writer::PacketWriter;
