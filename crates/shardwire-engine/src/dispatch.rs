use shardwire_frame::PacketReader;

use crate::context::Context;
use crate::error::{EngineError, Result};

/// Number of opcode slots.
pub const OPCODE_SLOTS: usize = 256;

/// Handles one opcode's payload.
///
/// Plain functions with the matching signature implement this trait.
pub trait Decoder: Send + Sync {
    fn decode(&self, ctx: &mut Context<'_>, reader: &mut PacketReader<'_>) -> Result<()>;
}

impl<F> Decoder for F
where
    F: Fn(&mut Context<'_>, &mut PacketReader<'_>) -> Result<()> + Send + Sync,
{
    fn decode(&self, ctx: &mut Context<'_>, reader: &mut PacketReader<'_>) -> Result<()> {
        self(ctx, reader)
    }
}

/// Outcome of [`DispatchTable::dispatch`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    Handled,
    /// No decoder for the opcode; the frame was skipped.
    Unhandled,
}

/// Dense opcode-indexed decoder registry.
pub struct DispatchTable {
    slots: Vec<Option<Box<dyn Decoder>>>,
}

impl DispatchTable {
    /// Empty table.
    pub fn new() -> Self {
        let mut slots = Vec::with_capacity(OPCODE_SLOTS);
        slots.resize_with(OPCODE_SLOTS, || None);
        Self { slots }
    }

    /// Register a decoder. Fails if the opcode already has one.
    pub fn register(&mut self, opcode: u8, decoder: impl Decoder + 'static) -> Result<()> {
        let slot = &mut self.slots[usize::from(opcode)];
        if slot.is_some() {
            return Err(EngineError::DuplicateDecoder(opcode));
        }
        *slot = Some(Box::new(decoder));
        Ok(())
    }

    /// Register a decoder, replacing and returning any existing one.
    pub fn register_override(
        &mut self,
        opcode: u8,
        decoder: impl Decoder + 'static,
    ) -> Option<Box<dyn Decoder>> {
        self.slots[usize::from(opcode)].replace(Box::new(decoder))
    }

    pub fn unregister(&mut self, opcode: u8) -> Option<Box<dyn Decoder>> {
        self.slots[usize::from(opcode)].take()
    }

    pub fn get(&self, opcode: u8) -> Option<&dyn Decoder> {
        self.slots[usize::from(opcode)].as_deref()
    }

    pub fn is_registered(&self, opcode: u8) -> bool {
        self.slots[usize::from(opcode)].is_some()
    }

    /// Opcodes with a decoder, ascending.
    pub fn registered(&self) -> impl Iterator<Item = u8> + '_ {
        (0..=u8::MAX).filter(|op| self.is_registered(*op))
    }

    pub fn len(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Run the decoder for a complete frame. `frame` starts at the opcode.
    pub fn dispatch(
        &self,
        ctx: &mut Context<'_>,
        frame: &[u8],
        header_len: usize,
    ) -> Result<Dispatch> {
        let Some(&opcode) = frame.first() else {
            return Ok(Dispatch::Unhandled);
        };
        let Some(decoder) = self.get(opcode) else {
            tracing::trace!(opcode = format_args!("{opcode:#04x}"), "no decoder");
            return Ok(Dispatch::Unhandled);
        };
        let mut reader = PacketReader::at_payload(frame, header_len);
        decoder.decode(ctx, &mut reader)?;
        Ok(Dispatch::Handled)
    }
}

impl Default for DispatchTable {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for DispatchTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DispatchTable")
            .field("registered", &self.len())
            .finish()
    }
}

/// Verdict of a [`PacketFilter`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterVerdict {
    Pass,
    /// Do not decode the frame.
    Drop,
}

/// Mutable view of one inbound frame handed to a [`PacketFilter`].
///
/// The frame can be edited in place and shortened, never lengthened.
#[derive(Debug)]
pub struct FrameMut<'a> {
    data: &'a mut [u8],
    len: usize,
    header_len: usize,
}

impl<'a> FrameMut<'a> {
    pub fn new(data: &'a mut [u8], header_len: usize) -> Self {
        let len = data.len();
        Self {
            data,
            len,
            header_len: header_len.min(len),
        }
    }

    pub fn opcode(&self) -> u8 {
        self.data.first().copied().unwrap_or(0)
    }

    pub fn header_len(&self) -> usize {
        self.header_len
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.data[..self.len]
    }

    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        &mut self.data[..self.len]
    }

    /// Shorten the frame to `len` bytes, never below its header. A
    /// variable-length header is rewritten to the new length.
    pub fn truncate(&mut self, len: usize) {
        let len = len.clamp(self.header_len, self.len);
        self.len = len;
        if self.header_len == shardwire_frame::VARIABLE_HEADER_SIZE {
            if let Ok(declared) = u16::try_from(len) {
                self.data[1..3].copy_from_slice(&declared.to_be_bytes());
            }
        }
    }
}

/// Inspects, edits or drops live network frames before they are decoded.
pub trait PacketFilter: Send {
    fn filter(&mut self, frame: &mut FrameMut<'_>) -> FilterVerdict;
}

impl<F> PacketFilter for F
where
    F: FnMut(&mut FrameMut<'_>) -> FilterVerdict + Send,
{
    fn filter(&mut self, frame: &mut FrameMut<'_>) -> FilterVerdict {
        self(frame)
    }
}
