use std::sync::Arc;

use bytes::Bytes;
use serde::Serialize;
use shardwire_frame::{
    peek_frame, ClientVersion, FrameInfo, PacketTable, PacketWriter, ScratchBuffer,
};
use shardwire_gump::{LayoutDecoder, LayoutTree};
use shardwire_transport::RingBuffer;
use shardwire_world::{PropertyCache, PropertyRequest, RequestQueue, World, WorldEvent};

use crate::cliloc::{ClilocResolver, NumericClilocs};
use crate::config::EngineConfig;
use crate::context::{Context, Session, Source};
use crate::dispatch::{Dispatch, DispatchTable, FilterVerdict, FrameMut, PacketFilter};
use crate::error::Result;
use crate::handlers;

/// Batched property request (5.0.9 and later).
const OP_PROPERTY_BATCH: u8 = 0xD6;
/// Extended command carrying the single-object property request.
const OP_EXTENDED: u8 = 0xBF;
const EXTENDED_PROPERTY_REQUEST: u16 = 0x0010;

/// What happened to one frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FrameOutcome {
    Dispatched,
    Unhandled,
    Filtered,
    Failed,
}

/// Per-frame entry in a [`TickReport`], kept when `record_frames` is set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FrameRecord {
    pub source: Source,
    pub opcode: u8,
    pub len: usize,
    pub outcome: FrameOutcome,
}

/// Log target of the per-frame trace events, separate from the engine's
/// own diagnostics so it can be enabled on its own.
pub const FRAME_TARGET: &str = "shardwire_engine::frames";

/// Counters for one [`Engine::tick`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TickReport {
    /// Complete frames taken off both streams.
    pub frames: usize,
    pub dispatched: usize,
    pub unhandled: usize,
    /// Network frames dropped by the packet filter.
    pub filtered: usize,
    pub decode_errors: usize,
    /// Bytes dropped to resynchronize after an unknown or malformed header.
    pub resync_bytes: usize,
    /// Bytes left buffered (partial frames) after the tick.
    pub pending_bytes: usize,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub records: Vec<FrameRecord>,
}

impl TickReport {
    fn count(&mut self, source: Source, opcode: u8, len: usize, outcome: FrameOutcome, keep: bool) {
        match outcome {
            FrameOutcome::Dispatched => self.dispatched += 1,
            FrameOutcome::Unhandled => self.unhandled += 1,
            FrameOutcome::Filtered => self.filtered += 1,
            FrameOutcome::Failed => self.decode_errors += 1,
        }
        if keep {
            self.records.push(FrameRecord {
                source,
                opcode,
                len,
                outcome,
            });
        }
    }
}

/// The protocol engine.
///
/// Transport code appends raw bytes to the two streams from any thread.
/// The owning thread calls [`Engine::tick`] to frame and decode whatever
/// complete messages are buffered, then reads the results: the world graph,
/// decoded layouts, change events and outbound property requests.
///
/// # Example
///
/// ```
/// use shardwire_engine::{Engine, Source};
///
/// let mut engine = Engine::with_defaults();
/// engine.append(&[0x73, 0x2A], Source::Network).unwrap();
/// let report = engine.tick();
/// assert_eq!(report.dispatched, 1);
/// assert_eq!(engine.session().last_ping, Some(0x2A));
/// ```
pub struct Engine {
    config: EngineConfig,
    version: ClientVersion,
    table: PacketTable,
    dispatch: DispatchTable,
    network: Arc<RingBuffer>,
    plugin: Arc<RingBuffer>,
    scratch: ScratchBuffer,
    filter: Option<Box<dyn PacketFilter>>,
    world: World,
    requests: RequestQueue,
    layouts: LayoutDecoder,
    outbox: Vec<LayoutTree>,
    resolver: Box<dyn ClilocResolver>,
    session: Session,
}

impl Engine {
    /// Build an engine from a validated config with the built-in decoders.
    pub fn new(config: EngineConfig) -> Result<Self> {
        config.validate()?;
        let version = config.version()?;
        let mut dispatch = DispatchTable::new();
        handlers::register_defaults(&mut dispatch)?;
        Ok(Self::assemble(config, version, dispatch))
    }

    /// Engine with the default config.
    pub fn with_defaults() -> Self {
        let config = EngineConfig::default();
        let version = ClientVersion::default();
        let mut dispatch = DispatchTable::new();
        for (opcode, decoder) in handlers::decoders() {
            dispatch.register_override(opcode, decoder);
        }
        Self::assemble(config, version, dispatch)
    }

    fn assemble(config: EngineConfig, version: ClientVersion, dispatch: DispatchTable) -> Self {
        tracing::debug!(
            version = %version,
            ring_capacity = config.ring_capacity,
            decoders = dispatch.len(),
            "engine created"
        );
        Self {
            table: PacketTable::for_version(version),
            dispatch,
            network: Arc::new(RingBuffer::with_capacity(config.ring_capacity)),
            plugin: Arc::new(RingBuffer::with_capacity(config.plugin_ring_capacity)),
            scratch: ScratchBuffer::with_capacity(config.scratch_capacity),
            filter: None,
            world: World::new(),
            requests: RequestQueue::new(),
            layouts: LayoutDecoder::with_config(config.layout),
            outbox: Vec::new(),
            resolver: Box::new(NumericClilocs),
            session: Session::default(),
            version,
            config,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn version(&self) -> ClientVersion {
        self.version
    }

    pub fn table(&self) -> &PacketTable {
        &self.table
    }

    /// Length table, e.g. to declare shard-specific opcodes.
    pub fn table_mut(&mut self) -> &mut PacketTable {
        &mut self.table
    }

    pub fn dispatch_table_mut(&mut self) -> &mut DispatchTable {
        &mut self.dispatch
    }

    pub fn set_resolver(&mut self, resolver: impl ClilocResolver + 'static) {
        self.resolver = Box::new(resolver);
    }

    /// Install the hook that sees live network frames before decoding.
    pub fn set_filter(&mut self, filter: impl PacketFilter + 'static) {
        self.filter = Some(Box::new(filter));
    }

    pub fn clear_filter(&mut self) {
        self.filter = None;
    }

    /// Producer handle for bytes read from the server.
    pub fn network_stream(&self) -> Arc<RingBuffer> {
        Arc::clone(&self.network)
    }

    /// Producer handle for locally injected frames. These bypass the
    /// packet filter.
    pub fn plugin_stream(&self) -> Arc<RingBuffer> {
        Arc::clone(&self.plugin)
    }

    pub fn append(&self, data: &[u8], source: Source) -> Result<()> {
        self.ring(source).append(data)?;
        Ok(())
    }

    fn ring(&self, source: Source) -> &Arc<RingBuffer> {
        match source {
            Source::Network => &self.network,
            Source::Plugin => &self.plugin,
        }
    }

    /// Decode every complete frame buffered on the network stream, then on
    /// the plugin stream.
    ///
    /// A partial frame stays buffered for the next tick. Errors are
    /// contained to the frame that caused them.
    pub fn tick(&mut self) -> TickReport {
        let mut report = TickReport::default();
        self.drain(Source::Network, &mut report);
        self.drain(Source::Plugin, &mut report);
        report.pending_bytes = self.network.len() + self.plugin.len();
        if report.frames > 0 || report.resync_bytes > 0 {
            tracing::trace!(
                frames = report.frames,
                dispatched = report.dispatched,
                errors = report.decode_errors,
                pending = report.pending_bytes,
                "tick"
            );
        }
        report
    }

    fn drain(&mut self, source: Source, report: &mut TickReport) {
        let ring = Arc::clone(self.ring(source));
        let limit = self.config.max_frames_per_tick;
        let capacity = ring.capacity();
        let mut taken = 0;

        while limit == 0 || taken < limit {
            // Hold the ring lock only while copying one frame out.
            let info = {
                let mut guard = ring.lock();
                match peek_frame(&guard, &self.table) {
                    Ok(None) => break,
                    // Can never be buffered whole; treat like a bad header.
                    Ok(Some(info)) if info.total_len > capacity => {
                        report.resync_bytes += guard.discard(1);
                        tracing::warn!(
                            source = ?source,
                            opcode = format_args!("{:#04x}", info.opcode),
                            len = info.total_len,
                            capacity,
                            "frame larger than ring, dropping byte to resynchronize"
                        );
                        continue;
                    }
                    Ok(Some(info)) if !info.is_complete(guard.len()) => break,
                    Ok(Some(info)) => {
                        guard.dequeue_into(self.scratch.frame_mut(info.total_len));
                        info
                    }
                    Err(err) => {
                        report.resync_bytes += guard.discard(1);
                        tracing::warn!(
                            source = ?source,
                            offset = guard.read_cursor(),
                            error = %err,
                            "dropping byte to resynchronize"
                        );
                        continue;
                    }
                }
            };
            taken += 1;
            self.process(source, info, report);
        }
    }

    fn process(&mut self, source: Source, info: FrameInfo, report: &mut TickReport) {
        report.frames += 1;
        let keep = self.config.record_frames;
        let mut len = info.total_len;

        if source == Source::Network {
            if let Some(filter) = self.filter.as_mut() {
                let mut frame = FrameMut::new(self.scratch.frame_mut(len), info.header_len);
                let verdict = filter.filter(&mut frame);
                len = frame.len();
                if verdict == FilterVerdict::Drop {
                    tracing::trace!(opcode = format_args!("{:#04x}", info.opcode), "frame filtered");
                    report.count(source, info.opcode, len, FrameOutcome::Filtered, keep);
                    return;
                }
            }
        }

        let frame = self.scratch.frame(len);
        let opcode = frame.first().copied().unwrap_or(info.opcode);
        let mut ctx = Context {
            world: &mut self.world,
            requests: &mut self.requests,
            layouts: &mut self.layouts,
            outbox: &mut self.outbox,
            session: &mut self.session,
            resolver: self.resolver.as_ref(),
            version: self.version,
            tooltips_enabled: self.config.tooltips_enabled,
            opcode,
            source,
        };

        let outcome = match self.dispatch.dispatch(&mut ctx, frame, info.header_len) {
            Ok(Dispatch::Handled) => FrameOutcome::Dispatched,
            Ok(Dispatch::Unhandled) => FrameOutcome::Unhandled,
            Err(err) => {
                tracing::warn!(
                    opcode = format_args!("{opcode:#04x}"),
                    len,
                    error = %err,
                    "decode failed"
                );
                FrameOutcome::Failed
            }
        };
        self.release_removed();
        tracing::trace!(
            target: FRAME_TARGET,
            source = ?source,
            opcode = format_args!("{opcode:#04x}"),
            len,
            outcome = ?outcome,
            "frame"
        );
        report.count(source, opcode, len, outcome, keep);
    }

    /// Objects that left the world will never answer a property request.
    fn release_removed(&mut self) {
        for serial in self.world.take_removed() {
            self.requests.cancel(serial);
        }
    }

    /// Encode queued property requests for sending. Serials are marked in
    /// flight until their response arrives.
    pub fn flush_requests(&mut self) -> Result<Vec<Bytes>> {
        self.release_removed();
        self.requests
            .flush(self.version)
            .iter()
            .map(encode_request)
            .collect()
    }

    /// Layouts decoded since the last call.
    pub fn take_layouts(&mut self) -> Vec<LayoutTree> {
        std::mem::take(&mut self.outbox)
    }

    pub fn take_events(&mut self) -> Vec<WorldEvent> {
        self.world.take_events()
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    pub fn properties(&self) -> &PropertyCache {
        self.world.properties()
    }

    pub fn requests(&self) -> &RequestQueue {
        &self.requests
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Forget all connection state: buffered bytes, world, requests and
    /// undelivered layouts. Registered decoders and the filter stay.
    pub fn reset(&mut self) {
        self.network.lock().clear();
        self.plugin.lock().clear();
        self.world.clear();
        self.requests.reset();
        self.outbox.clear();
        self.session = Session::default();
        tracing::debug!("engine reset");
    }
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("version", &self.version)
            .field("dispatch", &self.dispatch)
            .field("entities", &self.world.len())
            .field("network_pending", &self.network.len())
            .field("plugin_pending", &self.plugin.len())
            .finish_non_exhaustive()
    }
}

fn encode_request(request: &PropertyRequest) -> Result<Bytes> {
    let packet = match request {
        PropertyRequest::Batch(serials) => {
            let mut writer = PacketWriter::variable(OP_PROPERTY_BATCH);
            for serial in serials {
                writer.put_u32_be(serial.value());
            }
            writer.finish()?
        }
        PropertyRequest::Single(serial) => {
            let mut writer = PacketWriter::variable(OP_EXTENDED);
            writer
                .put_u16_be(EXTENDED_PROPERTY_REQUEST)
                .put_u32_be(serial.value());
            writer.finish()?
        }
    };
    Ok(packet)
}

#[cfg(test)]
mod tests {
    use super::*;
    use shardwire_frame::CV_500A;
    use shardwire_world::Serial;

    #[test]
    fn batch_request_encoding() {
        let bytes = encode_request(&PropertyRequest::Batch(vec![
            Serial(0x4000_0001),
            Serial(0x4000_0002),
        ]))
        .unwrap();
        assert_eq!(
            &bytes[..],
            &[0xD6, 0x00, 0x0B, 0x40, 0, 0, 1, 0x40, 0, 0, 2]
        );
    }

    #[test]
    fn single_request_encoding() {
        let bytes = encode_request(&PropertyRequest::Single(Serial(0x4000_0001))).unwrap();
        assert_eq!(&bytes[..], &[0xBF, 0x00, 0x09, 0x00, 0x10, 0x40, 0, 0, 1]);
    }

    #[test]
    fn old_clients_get_single_requests() {
        let config = EngineConfig {
            protocol_version: CV_500A.to_string(),
            ..EngineConfig::default()
        };
        let mut engine = Engine::new(config).unwrap();
        // 0xDC revision announcements for two unknown items.
        engine
            .append(&[0xDC, 0x40, 0, 0, 1, 0, 0, 0, 1], Source::Network)
            .unwrap();
        engine
            .append(&[0xDC, 0x40, 0, 0, 2, 0, 0, 0, 1], Source::Network)
            .unwrap();
        engine.tick();
        let packets = engine.flush_requests().unwrap();
        assert_eq!(packets.len(), 2);
        assert!(packets.iter().all(|p| p[0] == 0xBF));
    }

    #[test]
    fn reset_drops_buffered_bytes() {
        let mut engine = Engine::with_defaults();
        engine.append(&[0x73], Source::Network).unwrap();
        engine.world_mut().get_or_create(Serial(1), shardwire_world::EntityKind::Mobile);
        engine.reset();
        assert!(engine.world().is_empty());
        assert_eq!(engine.tick().pending_bytes, 0);
    }
}
