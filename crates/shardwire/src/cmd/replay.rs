use std::collections::BTreeMap;
use std::path::Path;

use serde::Serialize;
use shardwire_engine::{Engine, FrameOutcome, Source, TickReport};
use shardwire_world::EntityKind;

use crate::cmd::{load_config, ReplayArgs};
use crate::exit::{engine_error, io_error, CliResult, DATA_INVALID, SUCCESS};
use crate::output::{hex_u8, new_table, print_json, OutputFormat, REPLAY_SCHEMA};

#[derive(Debug, Default, Serialize)]
struct OpcodeStats {
    frames: usize,
    bytes: usize,
    failed: usize,
}

#[derive(Debug, Serialize)]
struct ReplaySummary {
    schema_id: &'static str,
    capture: String,
    protocol_version: String,
    bytes: usize,
    ticks: usize,
    frames: usize,
    dispatched: usize,
    unhandled: usize,
    decode_errors: usize,
    resync_bytes: usize,
    trailing_bytes: usize,
    entities: usize,
    items: usize,
    mobiles: usize,
    player: Option<String>,
    events: usize,
    layouts: usize,
    properties: usize,
    pending_requests: usize,
    request_packets: usize,
    opcodes: BTreeMap<String, OpcodeStats>,
}

impl ReplaySummary {
    fn new(capture: String, protocol_version: String, bytes: usize) -> Self {
        Self {
            schema_id: REPLAY_SCHEMA,
            capture,
            protocol_version,
            bytes,
            ticks: 0,
            frames: 0,
            dispatched: 0,
            unhandled: 0,
            decode_errors: 0,
            resync_bytes: 0,
            trailing_bytes: 0,
            entities: 0,
            items: 0,
            mobiles: 0,
            player: None,
            events: 0,
            layouts: 0,
            properties: 0,
            pending_requests: 0,
            request_packets: 0,
            opcodes: BTreeMap::new(),
        }
    }

    fn absorb(&mut self, report: &TickReport) {
        self.ticks += 1;
        self.frames += report.frames;
        self.dispatched += report.dispatched;
        self.unhandled += report.unhandled;
        self.decode_errors += report.decode_errors;
        self.resync_bytes += report.resync_bytes;
        self.trailing_bytes = report.pending_bytes;
        for record in &report.records {
            let stats = self.opcodes.entry(hex_u8(record.opcode)).or_default();
            stats.frames += 1;
            stats.bytes += record.len;
            if record.outcome == FrameOutcome::Failed {
                stats.failed += 1;
            }
        }
    }
}

pub fn run(args: ReplayArgs, format: OutputFormat, config: Option<&Path>) -> CliResult<i32> {
    let mut config = load_config(config, args.version.as_deref())?;
    config.record_frames = true;
    let protocol_version = config.protocol_version.clone();

    let capture = std::fs::read(&args.capture)
        .map_err(|err| io_error(&format!("read {}", args.capture.display()), err))?;
    let mut engine = Engine::new(config).map_err(|err| engine_error("engine", err))?;

    let mut summary = ReplaySummary::new(
        args.capture.display().to_string(),
        protocol_version,
        capture.len(),
    );

    let ring = engine.network_stream();
    let mut offset = 0;
    while offset < capture.len() {
        // A partial frame can stay buffered across ticks.
        let len = append_len(args.chunk, ring.capacity() - ring.len()).min(capture.len() - offset);
        engine
            .append(&capture[offset..offset + len], Source::Network)
            .map_err(|err| engine_error("append", err))?;
        offset += len;
        let report = engine.tick();
        summary.absorb(&report);
        summary.events += engine.take_events().len();
        for layout in engine.take_layouts() {
            tracing::debug!(
                sender = layout.sender,
                gump_id = layout.gump_id,
                widgets = layout.widgets.len(),
                "layout"
            );
            summary.layouts += 1;
        }
        summary.request_packets += engine
            .flush_requests()
            .map_err(|err| engine_error("flush requests", err))?
            .len();
    }

    let world = engine.world();
    summary.entities = world.len();
    summary.items = world.iter().filter(|e| e.kind == EntityKind::Item).count();
    summary.mobiles = world.iter().filter(|e| e.kind == EntityKind::Mobile).count();
    summary.player = world.player().map(|serial| serial.to_string());
    summary.properties = engine.properties().len();
    summary.pending_requests = engine.requests().pending_len() + engine.requests().in_flight_len();

    tracing::info!(
        frames = summary.frames,
        errors = summary.decode_errors,
        entities = summary.entities,
        "replay finished"
    );
    print_summary(&summary, format);

    if args.strict && summary.decode_errors > 0 {
        return Ok(DATA_INVALID);
    }
    Ok(SUCCESS)
}

/// Bytes to append next: the requested chunk, capped at the ring's free
/// room. Frames larger than the ring are dropped while draining, so a tick
/// always leaves at least one byte free.
fn append_len(requested: u32, room: usize) -> usize {
    (requested as usize).min(room).max(1)
}

fn print_summary(summary: &ReplaySummary, format: OutputFormat) {
    match format {
        OutputFormat::Json => print_json(summary),
        OutputFormat::Table => {
            let mut table = new_table(vec!["FIELD", "VALUE"]);
            let player = summary.player.as_deref().unwrap_or("-");
            table
                .add_row(vec!["capture", summary.capture.as_str()])
                .add_row(vec!["version", summary.protocol_version.as_str()])
                .add_row(vec!["bytes".to_string(), summary.bytes.to_string()])
                .add_row(vec!["frames".to_string(), summary.frames.to_string()])
                .add_row(vec!["dispatched".to_string(), summary.dispatched.to_string()])
                .add_row(vec!["unhandled".to_string(), summary.unhandled.to_string()])
                .add_row(vec!["decode errors".to_string(), summary.decode_errors.to_string()])
                .add_row(vec!["resync bytes".to_string(), summary.resync_bytes.to_string()])
                .add_row(vec!["trailing bytes".to_string(), summary.trailing_bytes.to_string()])
                .add_row(vec!["entities".to_string(), summary.entities.to_string()])
                .add_row(vec!["player", player])
                .add_row(vec!["layouts".to_string(), summary.layouts.to_string()])
                .add_row(vec!["pending requests".to_string(), summary.pending_requests.to_string()]);
            println!("{table}");

            if !summary.opcodes.is_empty() {
                let mut opcodes = new_table(vec!["OPCODE", "FRAMES", "BYTES", "FAILED"]);
                for (opcode, stats) in &summary.opcodes {
                    opcodes.add_row(vec![
                        opcode.clone(),
                        stats.frames.to_string(),
                        stats.bytes.to_string(),
                        stats.failed.to_string(),
                    ]);
                }
                println!("{opcodes}");
            }
        }
        OutputFormat::Pretty => {
            println!(
                "{}: {} bytes, {} frames ({} dispatched, {} unhandled, {} failed), {} resync bytes",
                summary.capture,
                summary.bytes,
                summary.frames,
                summary.dispatched,
                summary.unhandled,
                summary.decode_errors,
                summary.resync_bytes
            );
            println!(
                "world: {} entities ({} items, {} mobiles), player {}",
                summary.entities,
                summary.items,
                summary.mobiles,
                summary.player.as_deref().unwrap_or("unknown")
            );
            println!(
                "layouts: {}, properties: {}, pending requests: {}",
                summary.layouts, summary.properties, summary.pending_requests
            );
        }
    }
}
