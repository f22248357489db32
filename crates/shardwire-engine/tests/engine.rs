use std::io::Write;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use bytes::BufMut;
use flate2::write::ZlibEncoder;
use flate2::Compression;
use shardwire_engine::{
    ClilocTable, Context, Decoder, Engine, EngineConfig, EngineError, FilterVerdict, FrameMut,
    FrameOutcome, Source, TickReport,
};
use shardwire_frame::PacketReader;
use shardwire_world::{EntityKind, Layer, Serial, WorldEvent};

const PLAYER: Serial = Serial(0x0000_0001);
const MOBILE: Serial = Serial(0x0000_0020);
const BACKPACK: Serial = Serial(0x4000_0010);
const CHEST: Serial = Serial(0x4000_0020);
const SWORD: Serial = Serial(0x4000_0001);
const HORSE: Serial = Serial(0x4000_0002);
const CORPSE: Serial = Serial(0x4000_0099);

/// Wrap a body in a variable-length frame.
fn var(opcode: u8, body: &[u8]) -> Vec<u8> {
    let mut out = vec![opcode];
    out.put_u16((body.len() + 3) as u16);
    out.put_slice(body);
    out
}

fn feed(engine: &mut Engine, bytes: &[u8]) -> TickReport {
    engine.append(bytes, Source::Network).unwrap();
    engine.tick()
}

fn enter_world(serial: Serial) -> Vec<u8> {
    let mut out = vec![0x1B];
    out.put_u32(serial.value());
    out.put_u32(0);
    out.put_u16(0x0190);
    out.put_u16(1000);
    out.put_u16(2000);
    out.put_u16(5);
    out.put_u8(0x82);
    out.resize(0x25, 0);
    out
}

/// 0x78 body for a mobile wearing `items` of `(serial, graphic, layer, hue)`.
fn update_object(serial: Serial, items: &[(Serial, u16, Layer, Option<u16>)]) -> Vec<u8> {
    let mut body = Vec::new();
    body.put_u32(serial.value());
    body.put_u16(0x0190);
    body.put_u16(100);
    body.put_u16(200);
    body.put_i8(0);
    body.put_u8(0x03);
    body.put_u16(0x0400);
    body.put_u8(0);
    body.put_u8(3);
    for (item, graphic, layer, hue) in items {
        body.put_u32(item.value());
        match hue {
            Some(hue) => {
                body.put_u16(graphic | 0x8000);
                body.put_u8(layer.0);
                body.put_u16(*hue);
            }
            None => {
                body.put_u16(*graphic);
                body.put_u8(layer.0);
            }
        }
    }
    body.put_u32(0);
    var(0x78, &body)
}

/// One contained-item record in the 6.0.1.7+ layout.
fn contained_record(out: &mut Vec<u8>, serial: Serial, container: Serial) {
    out.put_u32(serial.value());
    out.put_u16(0x0EED);
    out.put_u8(0);
    out.put_u16(0);
    out.put_u16(30);
    out.put_u16(40);
    out.put_u8(0);
    out.put_u32(container.value());
    out.put_u16(0);
}

/// 0xF3 body (without opcode) for the 7.0.9.0+ layout.
fn item_sa_body(out: &mut Vec<u8>, object_type: u8, serial: Serial, graphic: u16, direction: u8) {
    out.put_u16(0x0001);
    out.put_u8(object_type);
    out.put_u32(serial.value());
    out.put_u16(graphic);
    out.put_u8(0);
    out.put_u16(1);
    out.put_u16(1);
    out.put_u16(500);
    out.put_u16(600);
    out.put_i8(10);
    out.put_u8(direction);
    out.put_u16(0);
    out.put_u8(0);
    out.put_u16(0);
}

fn item_sa(object_type: u8, serial: Serial, graphic: u16, direction: u8) -> Vec<u8> {
    let mut out = vec![0xF3];
    item_sa_body(&mut out, object_type, serial, graphic, direction);
    out
}

fn zlib(data: &[u8]) -> Vec<u8> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data).unwrap();
    encoder.finish().unwrap()
}

fn put_layout_header(out: &mut Vec<u8>) {
    out.put_u32(0x0000_1234);
    out.put_u32(0x0000_0777);
    out.put_u32(10);
    out.put_u32(20);
}

/// 0xDD frame carrying `layout` and `lines`, both zlib-compressed.
fn compressed_gump(layout: &str, lines: &[&str]) -> Vec<u8> {
    let mut packed_lines = Vec::new();
    for line in lines {
        let units: Vec<u16> = line.encode_utf16().collect();
        packed_lines.put_u16(units.len() as u16);
        for unit in units {
            packed_lines.put_u16(unit);
        }
    }

    let mut body = Vec::new();
    put_layout_header(&mut body);
    let packed = zlib(layout.as_bytes());
    body.put_u32(packed.len() as u32 + 4);
    body.put_u32(layout.len() as u32);
    body.put_slice(&packed);
    body.put_u32(lines.len() as u32);
    if !lines.is_empty() {
        let packed = zlib(&packed_lines);
        body.put_u32(packed.len() as u32 + 4);
        body.put_u32(packed_lines.len() as u32);
        body.put_slice(&packed);
    }
    var(0xDD, &body)
}

/// 0xD6 property list for `serial` at `revision` with bare cliloc entries.
fn property_list(serial: Serial, revision: u32, clilocs: &[u32]) -> Vec<u8> {
    let mut body = Vec::new();
    body.put_u16(1);
    body.put_u32(serial.value());
    body.put_u16(0);
    body.put_u32(revision);
    for cliloc in clilocs {
        body.put_u32(*cliloc);
        body.put_u16(0);
    }
    body.put_u32(0);
    var(0xD6, &body)
}

fn announce(serial: Serial, revision: u32) -> Vec<u8> {
    let mut frame = vec![0xDC];
    frame.put_u32(serial.value());
    frame.put_u32(revision);
    frame
}

fn delete(serial: Serial) -> Vec<u8> {
    let mut frame = vec![0x1D];
    frame.put_u32(serial.value());
    frame
}

/// Comparable view of the world: every entity as JSON, ordered by serial,
/// plus the child order of the containers the session touches.
fn world_snapshot(engine: &Engine) -> (Vec<(Serial, serde_json::Value)>, Vec<Vec<Serial>>) {
    let mut entities: Vec<(Serial, serde_json::Value)> = engine
        .world()
        .iter()
        .map(|e| (e.serial, serde_json::to_value(e).unwrap()))
        .collect();
    entities.sort_by_key(|(serial, _)| *serial);
    let children = [BACKPACK, CHEST]
        .iter()
        .map(|c| engine.world().children(*c))
        .collect();
    (entities, children)
}

#[test]
fn frame_split_across_appends_waits_for_the_rest() {
    let mut engine = Engine::with_defaults();
    engine.world_mut().get_or_create(MOBILE, EntityKind::Mobile);

    let mut body = Vec::new();
    body.put_u32(MOBILE.value());
    body.put_slice(b"Lord British\0");
    let frame = var(0x98, &body);

    let report = feed(&mut engine, &frame[..2]);
    assert_eq!(report.frames, 0);
    assert_eq!(report.pending_bytes, 2);

    let report = feed(&mut engine, &frame[2..7]);
    assert_eq!(report.frames, 0);

    let report = feed(&mut engine, &frame[7..]);
    assert_eq!(report.dispatched, 1);
    assert_eq!(report.pending_bytes, 0);
    assert_eq!(engine.world().get(MOBILE).unwrap().name, "Lord British");
}

#[test]
fn byte_at_a_time_matches_single_append() {
    let loose = Serial(0x4000_0101);
    let layout = format!(
        "{{ page 0 }}{{ resizepic 0 0 9200 200 100 }}{{ text 10 10 0 0 }}{{ itemproperty {} }}",
        SWORD.value()
    );

    let mut session = compressed_gump(&layout, &["Hello"]);
    let mut body = Vec::new();
    body.put_u16(2);
    contained_record(&mut body, SWORD, BACKPACK);
    contained_record(&mut body, loose, BACKPACK);
    session.extend_from_slice(&var(0x3C, &body));
    session.push(0x25);
    contained_record(&mut session, loose, CHEST);
    session.extend_from_slice(&property_list(SWORD, 3, &[1_020_000, 1_060_639]));
    session.extend_from_slice(&[0x73, 0x11]);

    let mut whole = Engine::with_defaults();
    let whole_report = feed(&mut whole, &session);
    assert_eq!(whole_report.dispatched, 5);
    assert_eq!(whole_report.pending_bytes, 0);

    let mut split = Engine::with_defaults();
    let mut dispatched = 0;
    let mut frames = 0;
    for byte in session.chunks(1) {
        let report = feed(&mut split, byte);
        dispatched += report.dispatched;
        frames += report.frames;
        assert_eq!(report.decode_errors, 0);
        assert_eq!(report.resync_bytes, 0);
    }
    assert_eq!(frames, whole_report.frames);
    assert_eq!(dispatched, whole_report.dispatched);
    assert_eq!(split.tick().pending_bytes, 0);

    assert_eq!(world_snapshot(&split), world_snapshot(&whole));
    assert_eq!(split.take_layouts(), whole.take_layouts());
    assert_eq!(split.take_events(), whole.take_events());
    assert_eq!(split.properties().get(SWORD), whole.properties().get(SWORD));
    assert_eq!(split.requests().pending_len(), whole.requests().pending_len());
    assert_eq!(split.session().last_ping, Some(0x11));
}

#[test]
fn frame_longer_than_ring_is_dropped_not_waited_for() {
    let config = EngineConfig {
        ring_capacity: 64,
        ..EngineConfig::default()
    };
    let mut engine = Engine::new(config).unwrap();

    // A 104-byte name update can never be buffered whole in 64 bytes.
    let mut frame = vec![0x98];
    frame.put_u16(104);
    frame.resize(104, 0);

    let report = feed(&mut engine, &frame[..64]);
    assert_eq!(report.frames, 0);
    assert_eq!(report.resync_bytes, 64);
    assert_eq!(report.pending_bytes, 0);

    let mut rest = frame[64..].to_vec();
    rest.extend_from_slice(&[0x73, 0x07]);
    let report = feed(&mut engine, &rest);
    assert_eq!(report.resync_bytes, 40);
    assert_eq!(report.dispatched, 1);
    assert_eq!(engine.session().last_ping, Some(7));
}

#[test]
fn fixed_frames_consume_exact_lengths() {
    let mut engine = Engine::with_defaults();
    let report = feed(&mut engine, &[0x73, 0x01, 0x73, 0x02, 0x73]);
    assert_eq!(report.dispatched, 2);
    assert_eq!(report.pending_bytes, 1);
    assert_eq!(engine.session().last_ping, Some(2));

    let report = feed(&mut engine, &[0x03]);
    assert_eq!(report.dispatched, 1);
    assert_eq!(engine.session().pings, 3);
}

#[test]
fn unknown_opcode_drops_one_byte_at_a_time() {
    let mut engine = Engine::with_defaults();
    let report = feed(&mut engine, &[0xFF, 0xFF, 0x73, 0x09]);
    assert_eq!(report.resync_bytes, 2);
    assert_eq!(report.dispatched, 1);
    assert_eq!(engine.session().last_ping, Some(9));
}

#[test]
fn short_declared_length_is_dropped() {
    let mut engine = Engine::with_defaults();
    let report = feed(&mut engine, &[0x98, 0x00, 0x02]);
    assert_eq!(report.resync_bytes, 1);
    assert_eq!(report.frames, 0);
    // The leftover bytes now start an opcode 0x00 frame that is incomplete.
    assert_eq!(report.pending_bytes, 2);
}

#[test]
fn opcode_without_decoder_is_skipped() {
    let mut engine = Engine::with_defaults();
    let report = feed(&mut engine, &[0x2C, 0x00, 0x73, 0x04]);
    assert_eq!(report.unhandled, 1);
    assert_eq!(report.dispatched, 1);
}

#[test]
fn decode_error_is_contained_to_its_frame() {
    let mut engine = Engine::with_defaults();
    let mut bytes = var(0x98, &[0x00, 0x00]);
    bytes.extend_from_slice(&[0x73, 0x05]);
    let report = feed(&mut engine, &bytes);
    assert_eq!(report.decode_errors, 1);
    assert_eq!(report.dispatched, 1);
    assert_eq!(engine.session().last_ping, Some(5));
}

/// Drops ping 1 and rewrites ping 2 to 0x20.
fn drop_first_ping(frame: &mut FrameMut<'_>) -> FilterVerdict {
    if frame.opcode() != 0x73 {
        return FilterVerdict::Pass;
    }
    match frame.as_slice()[1] {
        1 => FilterVerdict::Drop,
        2 => {
            frame.as_mut_slice()[1] = 0x20;
            FilterVerdict::Pass
        }
        _ => FilterVerdict::Pass,
    }
}

#[test]
fn filter_can_drop_and_rewrite_network_frames() {
    let mut engine = Engine::with_defaults();
    engine.set_filter(drop_first_ping);

    let report = feed(&mut engine, &[0x73, 0x01, 0x73, 0x02]);
    assert_eq!(report.filtered, 1);
    assert_eq!(report.dispatched, 1);
    assert_eq!(engine.session().last_ping, Some(0x20));
    assert_eq!(engine.session().pings, 1);

    // Injected frames bypass the filter.
    engine.append(&[0x73, 0x01], Source::Plugin).unwrap();
    let report = engine.tick();
    assert_eq!(report.filtered, 0);
    assert_eq!(engine.session().last_ping, Some(1));
}

#[test]
fn network_stream_is_drained_before_plugin_stream() {
    let config = EngineConfig {
        record_frames: true,
        ..EngineConfig::default()
    };
    let mut engine = Engine::new(config).unwrap();
    engine.append(&[0x73, 0x0A], Source::Plugin).unwrap();
    engine.append(&[0x73, 0x0B], Source::Network).unwrap();
    let report = engine.tick();

    let sources: Vec<Source> = report.records.iter().map(|r| r.source).collect();
    assert_eq!(sources, vec![Source::Network, Source::Plugin]);
    assert!(report
        .records
        .iter()
        .all(|r| r.outcome == FrameOutcome::Dispatched));
    assert_eq!(engine.session().last_ping, Some(0x0A));
}

#[test]
fn frame_budget_leaves_the_rest_for_later() {
    let config = EngineConfig {
        max_frames_per_tick: 1,
        ..EngineConfig::default()
    };
    let mut engine = Engine::new(config).unwrap();
    let report = feed(&mut engine, &[0x73, 0x01, 0x73, 0x02]);
    assert_eq!(report.dispatched, 1);
    assert_eq!(report.pending_bytes, 2);
    assert_eq!(engine.tick().dispatched, 1);
}

#[test]
fn producer_thread_feeds_the_network_stream() {
    let mut engine = Engine::with_defaults();
    let stream = engine.network_stream();
    let producer = std::thread::spawn(move || {
        for seq in 0..10u8 {
            stream.append(&[0x73, seq]).unwrap();
        }
    });
    producer.join().unwrap();
    assert_eq!(engine.tick().dispatched, 10);
    assert_eq!(engine.session().last_ping, Some(9));
}

fn noop(_: &mut Context<'_>, _: &mut PacketReader<'_>) -> shardwire_engine::Result<()> {
    Ok(())
}

/// Adds the first payload byte of every frame it sees.
struct Counter(Arc<AtomicUsize>);

impl Decoder for Counter {
    fn decode(
        &self,
        _: &mut Context<'_>,
        reader: &mut PacketReader<'_>,
    ) -> shardwire_engine::Result<()> {
        self.0
            .fetch_add(usize::from(reader.read_u8()?), Ordering::SeqCst);
        Ok(())
    }
}

#[test]
fn custom_decoders_register_and_conflict() {
    let mut engine = Engine::with_defaults();
    let hits = Arc::new(AtomicUsize::new(0));

    let table = engine.dispatch_table_mut();
    let err = table.register(0x73, noop).unwrap_err();
    assert!(matches!(err, EngineError::DuplicateDecoder(0x73)));
    table.register(0x2C, Counter(Arc::clone(&hits))).unwrap();

    let report = feed(&mut engine, &[0x2C, 0x07]);
    assert_eq!(report.dispatched, 1);
    assert_eq!(hits.load(Ordering::SeqCst), 7);
}

#[test]
fn update_object_equips_items_and_mount() {
    let mut engine = Engine::with_defaults();
    feed(&mut engine, &enter_world(PLAYER));
    assert_eq!(engine.world().player(), Some(PLAYER));

    let report = feed(
        &mut engine,
        &update_object(
            MOBILE,
            &[
                (SWORD, 0x0F61, Layer::ONE_HANDED, Some(0x0021)),
                (HORSE, 0x3EA2, Layer::MOUNT, None),
            ],
        ),
    );
    assert_eq!(report.dispatched, 1);

    let world = engine.world();
    let mobile = world.get(MOBILE).unwrap();
    assert!(mobile.is_mobile());
    assert_eq!(mobile.notoriety, 3);
    assert_eq!(mobile.mount(), Some(HORSE));
    assert_eq!(world.children(MOBILE), vec![SWORD, HORSE]);

    let sword = world.get(SWORD).unwrap();
    assert_eq!(sword.graphic, 0x0F61);
    assert_eq!(sword.hue, 0x0021);
    assert_eq!(sword.layer(), Layer::ONE_HANDED);
    assert_eq!(sword.container(), Some(MOBILE));

    // Re-announcing without the sword removes it.
    feed(
        &mut engine,
        &update_object(MOBILE, &[(HORSE, 0x3EA2, Layer::MOUNT, None)]),
    );
    assert!(!engine.world().contains(SWORD));
    assert_eq!(engine.world().get(MOBILE).unwrap().mount(), Some(HORSE));
}

#[test]
fn equip_item_moves_between_holders() {
    let mut engine = Engine::with_defaults();
    let mut frame = vec![0x2E];
    frame.put_u32(SWORD.value());
    frame.put_u16(0x0F60);
    frame.put_i8(1);
    frame.put_u8(Layer::ONE_HANDED.0);
    frame.put_u32(MOBILE.value());
    frame.put_u16(0);
    feed(&mut engine, &frame);

    let world = engine.world();
    assert_eq!(world.get(SWORD).unwrap().graphic, 0x0F61);
    assert_eq!(world.get(SWORD).unwrap().container(), Some(MOBILE));
    // The holder was referenced before it was announced.
    assert_eq!(world.get(MOBILE).unwrap().kind, EntityKind::Unknown);
    assert!(engine
        .take_events()
        .contains(&WorldEvent::PaperdollChanged { mobile: MOBILE }));
}

#[test]
fn failed_equip_leaves_item_untouched() {
    let mut engine = Engine::with_defaults();
    let mut frame = vec![0x25];
    contained_record(&mut frame, SWORD, BACKPACK);
    feed(&mut engine, &frame);

    // Equipping an item onto itself is rejected by the graph.
    let mut frame = vec![0x2E];
    frame.put_u32(SWORD.value());
    frame.put_u16(0x0F60);
    frame.put_i8(0);
    frame.put_u8(Layer::ONE_HANDED.0);
    frame.put_u32(SWORD.value());
    frame.put_u16(0x0021);
    let report = feed(&mut engine, &frame);
    assert_eq!(report.decode_errors, 1);

    let sword = engine.world().get(SWORD).unwrap();
    assert_eq!(sword.graphic, 0x0EED);
    assert_eq!(sword.hue, 0);
    assert_eq!(sword.container(), Some(BACKPACK));
    assert_eq!(sword.layer(), Layer::INVALID);

    // An unknown item is not left behind as a placeholder.
    let stray = Serial(0x4000_0777);
    let mut frame = vec![0x2E];
    frame.put_u32(stray.value());
    frame.put_u16(0x0F60);
    frame.put_i8(0);
    frame.put_u8(Layer::ONE_HANDED.0);
    frame.put_u32(stray.value());
    frame.put_u16(0);
    feed(&mut engine, &frame);
    assert!(!engine.world().contains(stray));
}

#[test]
fn container_contents_replace_previous_list() {
    let mut engine = Engine::with_defaults();
    let a = Serial(0x4000_0101);
    let b = Serial(0x4000_0102);
    let stale = Serial(0x4000_0103);

    let mut body = Vec::new();
    body.put_u16(1);
    contained_record(&mut body, stale, BACKPACK);
    feed(&mut engine, &var(0x3C, &body));
    assert_eq!(engine.world().children(BACKPACK), vec![stale]);

    let mut body = Vec::new();
    body.put_u16(2);
    contained_record(&mut body, a, BACKPACK);
    contained_record(&mut body, b, BACKPACK);
    feed(&mut engine, &var(0x3C, &body));
    assert_eq!(engine.world().children(BACKPACK), vec![a, b]);
    assert!(!engine.world().contains(stale));
    assert_eq!(engine.world().get(a).unwrap().amount, 1);

    // A single-item update moves `a` to another container.
    let mut frame = vec![0x25];
    contained_record(&mut frame, a, CHEST);
    let report = feed(&mut engine, &frame);
    assert_eq!(report.dispatched, 1);
    assert_eq!(engine.world().children(BACKPACK), vec![b]);
    assert_eq!(engine.world().children(CHEST), vec![a]);
    assert_eq!(engine.world().get(a).unwrap().z, 0);
}

#[test]
fn open_container_marks_opened_and_clears_contents() {
    let mut engine = Engine::with_defaults();
    let mut frame = vec![0x25];
    contained_record(&mut frame, SWORD, CHEST);
    feed(&mut engine, &frame);
    engine.world_mut().get_or_create(CHEST, EntityKind::Item);
    engine.take_events();

    let mut frame = vec![0x24];
    frame.put_u32(CHEST.value());
    frame.put_u16(0x003C);
    frame.put_u16(0x007D);
    let report = feed(&mut engine, &frame);
    assert_eq!(report.dispatched, 1);

    assert!(engine.world().get(CHEST).unwrap().opened);
    assert!(engine.world().children(CHEST).is_empty());
    assert!(engine.take_events().contains(&WorldEvent::ContainerOpened {
        serial: CHEST,
        graphic: 0x003C,
    }));
}

#[test]
fn death_aliases_mobile_and_corpse_takes_equipment() {
    let mut engine = Engine::with_defaults();
    feed(&mut engine, &enter_world(PLAYER));
    feed(
        &mut engine,
        &update_object(MOBILE, &[(SWORD, 0x0F61, Layer::ONE_HANDED, None)]),
    );
    engine.take_events();

    let mut death = vec![0xAF];
    death.put_u32(MOBILE.value());
    death.put_u32(CORPSE.value());
    death.put_u32(0);
    feed(&mut engine, &death);

    let alias = MOBILE.corpse_alias();
    assert!(!engine.world().contains(MOBILE));
    assert_eq!(engine.world().children(alias), vec![SWORD]);
    assert!(engine.take_events().contains(&WorldEvent::Died {
        serial: MOBILE,
        alias,
        corpse: CORPSE,
    }));

    // The corpse item appears, then lists what it wears.
    feed(&mut engine, &item_sa(0, CORPSE, 0x2006, 0x02));
    let corpse = engine.world().get(CORPSE).unwrap();
    assert!(corpse.is_corpse());
    assert_eq!(corpse.layer(), Layer(0x02));

    let mut body = Vec::new();
    body.put_u32(CORPSE.value());
    body.put_u8(Layer::ONE_HANDED.0 + 1);
    body.put_u32(SWORD.value());
    body.put_u8(0);
    feed(&mut engine, &var(0x89, &body));

    let sword = engine.world().get(SWORD).unwrap();
    assert_eq!(sword.container(), Some(CORPSE));
    assert_eq!(sword.layer(), Layer::ONE_HANDED);
}

#[test]
fn delete_object_removes_contents() {
    let mut engine = Engine::with_defaults();
    let mut body = Vec::new();
    body.put_u16(1);
    contained_record(&mut body, SWORD, BACKPACK);
    feed(&mut engine, &var(0x3C, &body));
    engine.take_events();

    let mut frame = vec![0x1D];
    frame.put_u32(BACKPACK.value());
    feed(&mut engine, &frame);

    assert!(!engine.world().contains(BACKPACK));
    assert!(!engine.world().contains(SWORD));
    let events = engine.take_events();
    assert!(events.contains(&WorldEvent::Removed {
        serial: SWORD,
        container: Some(BACKPACK),
    }));
}

#[test]
fn player_is_never_deleted() {
    let mut engine = Engine::with_defaults();
    feed(&mut engine, &enter_world(PLAYER));
    let mut frame = vec![0x1D];
    frame.put_u32(PLAYER.value());
    feed(&mut engine, &frame);
    assert!(engine.world().contains(PLAYER));
}

#[test]
fn packet_list_applies_each_record() {
    let mut engine = Engine::with_defaults();
    let mut body = Vec::new();
    body.put_u16(2);
    body.put_u8(0xF3);
    item_sa_body(&mut body, 0, SWORD, 0x0F61, 0);
    body.put_u8(0xF3);
    item_sa_body(&mut body, 2, Serial(0x4000_0500), 0x4064, 0);
    let report = feed(&mut engine, &var(0xF7, &body));
    assert_eq!(report.dispatched, 1);

    let world = engine.world();
    assert_eq!(world.get(SWORD).unwrap().x, 500);
    let multi = world.get(Serial(0x4000_0500)).unwrap();
    assert!(multi.is_multi);
    assert_eq!(multi.graphic, 0x0064);
}

#[test]
fn hitpoints_and_names_update_known_entities() {
    let mut engine = Engine::with_defaults();
    engine.world_mut().get_or_create(MOBILE, EntityKind::Mobile);

    let mut frame = vec![0xA1];
    frame.put_u32(MOBILE.value());
    frame.put_u16(50);
    frame.put_u16(25);
    feed(&mut engine, &frame);

    let mobile = engine.world().get(MOBILE).unwrap();
    assert_eq!((mobile.hits, mobile.hits_max), (25, 50));
    assert!(engine
        .take_events()
        .contains(&WorldEvent::HitsChanged { serial: MOBILE }));
}

#[test]
fn revision_announcement_requests_and_response_completes() {
    let mut engine = Engine::with_defaults();
    let mut table = ClilocTable::new();
    table.insert(500, "longsword");
    table.insert(1060658, "~1_val~: ~2_val~");
    engine.set_resolver(table);
    engine.world_mut().get_or_create(SWORD, EntityKind::Item);

    let mut announce = vec![0xDC];
    announce.put_u32(SWORD.value());
    announce.put_u32(5);
    feed(&mut engine, &announce);
    assert_eq!(engine.requests().pending_len(), 1);

    let packets = engine.flush_requests().unwrap();
    assert_eq!(packets.len(), 1);
    assert_eq!(&packets[0][..], &[0xD6, 0x00, 0x07, 0x40, 0x00, 0x00, 0x01]);
    assert!(engine.requests().is_in_flight(SWORD));

    let mut body = Vec::new();
    body.put_u16(1);
    body.put_u32(SWORD.value());
    body.put_u16(0);
    body.put_u32(5);
    body.put_u32(500);
    body.put_u16(0);
    let args: Vec<u16> = "durability\t20".encode_utf16().collect();
    body.put_u32(1060658);
    body.put_u16((args.len() * 2) as u16);
    for unit in args {
        body.put_u16_le(unit);
    }
    body.put_u32(0);
    feed(&mut engine, &var(0xD6, &body));

    let entry = engine.properties().get(SWORD).unwrap();
    assert_eq!(entry.revision, 5);
    assert_eq!(entry.name, "Longsword");
    assert_eq!(entry.data, "Durability: 20");
    assert_eq!(engine.world().get(SWORD).unwrap().name, "Longsword");
    assert!(!engine.requests().is_in_flight(SWORD));
    assert!(engine
        .take_events()
        .contains(&WorldEvent::PropertiesChanged { serial: SWORD }));

    // The same revision again is already known.
    feed(&mut engine, &announce);
    assert_eq!(engine.requests().pending_len(), 0);
}

#[test]
fn deleted_object_releases_its_property_request() {
    let mut engine = Engine::with_defaults();
    engine.world_mut().get_or_create(SWORD, EntityKind::Item);
    engine.world_mut().get_or_create(CHEST, EntityKind::Item);

    feed(&mut engine, &announce(SWORD, 2));
    assert_eq!(engine.flush_requests().unwrap().len(), 1);
    assert!(engine.requests().is_in_flight(SWORD));

    feed(&mut engine, &delete(SWORD));
    assert!(!engine.world().contains(SWORD));
    assert!(!engine.requests().is_in_flight(SWORD));
    assert_eq!(engine.requests().in_flight_len(), 0);

    // Announced again later, it can be asked for again.
    engine.world_mut().get_or_create(SWORD, EntityKind::Item);
    feed(&mut engine, &announce(SWORD, 2));
    assert_eq!(engine.requests().pending_len(), 1);

    // A request still waiting to be sent is dropped with its object.
    feed(&mut engine, &announce(CHEST, 1));
    feed(&mut engine, &delete(CHEST));
    assert_eq!(engine.requests().pending_len(), 1);
    assert_eq!(engine.flush_requests().unwrap().len(), 1);
    assert!(engine.requests().is_in_flight(SWORD));
    assert!(!engine.requests().is_in_flight(CHEST));
}

#[test]
fn disabled_tooltips_never_request() {
    let config = EngineConfig {
        tooltips_enabled: false,
        ..EngineConfig::default()
    };
    let mut engine = Engine::new(config).unwrap();
    let mut announce = vec![0xDC];
    announce.put_u32(SWORD.value());
    announce.put_u32(1);
    feed(&mut engine, &announce);
    assert_eq!(engine.requests().pending_len(), 0);
}

#[test]
fn compressed_layout_reaches_the_outbox() {
    let mut engine = Engine::with_defaults();
    let layout = format!(
        "{{ page 0 }}{{ resizepic 0 0 9200 200 100 }}{{ text 10 10 0 0 }}{{ itemproperty {} }}",
        SWORD.value()
    );
    let report = feed(&mut engine, &compressed_gump(&layout, &["Hello"]));
    assert_eq!(report.dispatched, 1);

    let layouts = engine.take_layouts();
    assert_eq!(layouts.len(), 1);
    let tree = &layouts[0];
    assert_eq!((tree.sender, tree.gump_id), (0x1234, 0x0777));
    assert_eq!(tree.widgets.len(), 2);
    assert_eq!(tree.lines, vec!["Hello"]);
    assert_eq!(tree.item_properties, vec![SWORD.value()]);
    assert_eq!(engine.requests().pending_len(), 1);
    assert!(engine.take_layouts().is_empty());
}

#[test]
fn corrupt_compressed_layout_is_a_decode_error() {
    let mut engine = Engine::with_defaults();
    let mut body = Vec::new();
    put_layout_header(&mut body);
    body.put_u32(4 + 4);
    body.put_u32(64);
    body.put_slice(&[0xDE, 0xAD, 0xBE, 0xEF]);
    body.put_u32(0);
    let mut bytes = var(0xDD, &body);
    bytes.extend_from_slice(&[0x73, 0x01]);

    let report = feed(&mut engine, &bytes);
    assert_eq!(report.decode_errors, 1);
    assert_eq!(report.dispatched, 1);
    assert!(engine.take_layouts().is_empty());
}

#[test]
fn text_layout_decodes() {
    let mut engine = Engine::with_defaults();
    let layout = "{ button 10 20 4005 4007 1 0 1 }{ text 0 0 0 0 }";
    let mut body = Vec::new();
    put_layout_header(&mut body);
    body.put_u16(layout.len() as u16);
    body.put_slice(layout.as_bytes());
    body.put_u16(1);
    let units: Vec<u16> = "Ok".encode_utf16().collect();
    body.put_u16(units.len() as u16);
    for unit in units {
        body.put_u16(unit);
    }

    feed(&mut engine, &var(0xB0, &body));
    let layouts = engine.take_layouts();
    assert_eq!(layouts.len(), 1);
    assert_eq!(layouts[0].widgets.len(), 2);
    assert_eq!(layouts[0].lines, vec!["Ok"]);
}

#[test]
fn tick_report_serializes() {
    let mut engine = Engine::with_defaults();
    let report = feed(&mut engine, &[0x73, 0x01]);
    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["frames"], 1);
    assert_eq!(json["dispatched"], 1);
    assert!(json.get("records").is_none());
}
