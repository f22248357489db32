//! World object lifecycle: creation, update, equipment, death, deletion.

use shardwire_frame::{PacketReader, CV_70331, CV_7090};
use shardwire_world::{EntityKind, Layer, Placement, Serial, WorldEvent, CORPSE_GRAPHIC};

use crate::context::Context;
use crate::error::Result;

/// Frame that wraps a sequence of 0xF3 records.
const PACKET_LIST: u8 = 0xF7;
const ITEM_SA: u8 = 0xF3;
const UPDATE_OBJECT: u8 = 0x78;

/// Object type value announcing a multi (house, boat).
const TYPE_MULTI: u8 = 2;
/// Object type value announcing a damageable item that uses a mobile serial.
const TYPE_DAMAGEABLE: u8 = 3;

/// Fields shared by the messages that place an object in the world.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct ObjectUpdate {
    pub serial: Serial,
    pub graphic: u16,
    pub graphic_inc: u8,
    pub amount: u16,
    pub x: u16,
    pub y: u16,
    pub z: i8,
    pub direction: u8,
    pub hue: u16,
    pub flags: u8,
    pub object_type: u8,
}

/// Upsert a world object from an update record.
///
/// Known entities keep their kind; new ones become mobiles when the serial
/// is in the mobile range and the type is not "damageable item".
pub(crate) fn update_game_object(ctx: &mut Context<'_>, update: &ObjectUpdate) {
    let serial = update.serial;
    let as_mobile = match ctx.world.get(serial).map(|e| e.kind) {
        Some(EntityKind::Mobile) => true,
        Some(EntityKind::Item) => false,
        _ => serial.is_mobile() && update.object_type != TYPE_DAMAGEABLE,
    };

    if as_mobile {
        let mobile = ctx.world.get_or_create(serial, EntityKind::Mobile);
        mobile.graphic = update.graphic.wrapping_add(u16::from(update.graphic_inc)) & 0x3FFF;
        mobile.set_hue(update.hue);
        mobile.x = update.x;
        mobile.y = update.y;
        mobile.z = update.z;
        mobile.direction = update.direction & 0x07;
        mobile.flags = update.flags;
        return;
    }

    let old_parent = ctx.world.get(serial).and_then(|e| e.container());
    if let Some(parent) = old_parent {
        ctx.world.detach(serial);
        ctx.world.notify(WorldEvent::ContainerChanged { container: parent });
    }

    let mut graphic = update.graphic;
    if graphic != CORPSE_GRAPHIC {
        graphic = graphic.wrapping_add(u16::from(update.graphic_inc));
    }
    let item = ctx.world.get_or_create(serial, EntityKind::Item);
    if update.object_type == TYPE_MULTI {
        item.is_multi = true;
        item.graphic = graphic & 0x3FFF;
    } else {
        item.is_multi = false;
        item.graphic = graphic;
    }
    item.x = update.x;
    item.y = update.y;
    item.z = update.z;
    item.direction = update.direction;
    item.set_hue(update.hue);
    item.amount = update.amount.max(1);
    item.flags = update.flags;

    // Corpses carry the owner's facing in the layer slot.
    if graphic == CORPSE_GRAPHIC {
        ctx.world.set_layer(serial, Layer(update.direction));
    }
}

/// Position and look of the player, applied outside the step queue.
fn update_player(ctx: &mut Context<'_>, update: &ObjectUpdate) {
    let player = ctx.world.get_or_create(update.serial, EntityKind::Mobile);
    player.graphic = update.graphic.wrapping_add(u16::from(update.graphic_inc));
    player.set_hue(update.hue);
    player.flags = update.flags;
    player.x = update.x;
    player.y = update.y;
    player.z = update.z;
    player.direction = update.direction & 0x07;
}

/// Serial that ends a list, or zero once the frame runs out.
fn read_list_serial(reader: &mut PacketReader<'_>) -> Result<Serial> {
    if reader.remaining() < 4 {
        return Ok(Serial::ZERO);
    }
    Ok(Serial(reader.read_u32_be()?))
}

/// 0x1B: the server names the player's mobile.
pub(crate) fn enter_world(ctx: &mut Context<'_>, reader: &mut PacketReader<'_>) -> Result<()> {
    let serial = Serial(reader.read_u32_be()?);
    reader.skip(4)?;
    let graphic = reader.read_u16_be()?;
    let x = reader.read_u16_be()?;
    let y = reader.read_u16_be()?;
    let z = reader.read_u16_be()? as i8;
    let direction = reader.read_u8()? & 0x07;

    let player = ctx.world.get_or_create(serial, EntityKind::Mobile);
    player.graphic = graphic;
    player.x = x;
    player.y = y;
    player.z = z;
    player.direction = direction;
    ctx.world.set_player(serial);
    tracing::info!(serial = %serial, x, y, "entered world");
    Ok(())
}

/// 0x1D
pub(crate) fn delete_object(ctx: &mut Context<'_>, reader: &mut PacketReader<'_>) -> Result<()> {
    let serial = Serial(reader.read_u32_be()?);
    if ctx.world.is_player(serial) {
        return Ok(());
    }
    let Some(entity) = ctx.world.get(serial) else {
        return Ok(());
    };

    if let Some(parent) = entity.container() {
        let event = if entity.layer() == Layer::INVALID {
            WorldEvent::ContainerChanged { container: parent }
        } else {
            WorldEvent::PaperdollChanged { mobile: parent }
        };
        ctx.world.notify(event);
    }
    let removed = ctx.world.remove(serial, true);
    tracing::trace!(serial = %serial, removed, "deleted object");
    Ok(())
}

/// 0x2E
pub(crate) fn equip_item(ctx: &mut Context<'_>, reader: &mut PacketReader<'_>) -> Result<()> {
    let serial = Serial(reader.read_u32_be()?);
    let graphic = reader.read_u16_be()?;
    let graphic_inc = reader.read_i8()?;
    let layer = Layer(reader.read_u8()?);
    let holder = Serial(reader.read_u32_be()?);
    let hue = reader.read_u16_be()?;

    let known = ctx.world.contains(serial);
    ctx.world.get_or_create(serial, EntityKind::Item);
    if let Err(err) = ctx.world.equip(serial, holder, layer) {
        if !known {
            ctx.world.remove(serial, false);
        }
        return Err(err.into());
    }
    if let Some(item) = ctx.world.get_mut(serial) {
        item.graphic = graphic.wrapping_add_signed(i16::from(graphic_inc));
        item.set_hue(hue);
        item.amount = 1;
    }
    if !layer.is_shop() {
        ctx.world.notify(WorldEvent::PaperdollChanged { mobile: holder });
    }
    Ok(())
}

/// 0x78 and 0xD3: a mobile with its visible equipment.
pub(crate) fn update_object(ctx: &mut Context<'_>, reader: &mut PacketReader<'_>) -> Result<()> {
    let serial = Serial(reader.read_u32_be()?);
    let graphic = reader.read_u16_be()?;
    let x = reader.read_u16_be()?;
    let y = reader.read_u16_be()?;
    let z = reader.read_i8()?;
    let direction = reader.read_u8()?;
    let hue = reader.read_u16_be()?;
    let flags = reader.read_u8()?;
    let notoriety = reader.read_u8()?;

    if ctx.world.is_player(serial) {
        let player = ctx.world.get_or_create(serial, EntityKind::Mobile);
        player.graphic = graphic;
        player.set_hue(hue);
        player.flags = flags;
    } else {
        update_game_object(
            ctx,
            &ObjectUpdate {
                serial,
                graphic,
                x,
                y,
                z,
                direction,
                hue,
                flags,
                ..ObjectUpdate::default()
            },
        );
    }

    // Anything not re-announced below is stale, except open containers and
    // the backpack.
    for child in ctx.world.children(serial) {
        let stale = ctx
            .world
            .get(child)
            .is_some_and(|e| !e.opened && e.layer() != Layer::BACKPACK);
        if stale {
            ctx.world.remove(child, true);
        }
    }

    if serial.is_mobile() {
        if let Some(mobile) = ctx.world.get_mut(serial).filter(|e| e.is_mobile()) {
            mobile.notoriety = notoriety;
        }
    }

    if ctx.opcode() != UPDATE_OBJECT {
        reader.skip(6)?;
    }

    let mut item_serial = read_list_serial(reader)?;
    while item_serial != Serial::ZERO && !reader.is_exhausted() {
        let mut item_graphic = reader.read_u16_be()?;
        let layer = Layer(reader.read_u8()?);
        let mut item_hue = 0;
        if ctx.version() >= CV_70331 {
            item_hue = reader.read_u16_be()?;
        } else if item_graphic & 0x8000 != 0 {
            item_graphic &= 0x7FFF;
            item_hue = reader.read_u16_be()?;
        }

        let item = ctx.world.get_or_create(item_serial, EntityKind::Item);
        item.graphic = item_graphic;
        item.set_hue(item_hue);
        item.amount = 1;
        ctx.world.equip(item_serial, serial, layer)?;

        item_serial = read_list_serial(reader)?;
    }

    ctx.world.notify(WorldEvent::PaperdollChanged { mobile: serial });
    Ok(())
}

/// 0x89: items worn by a corpse, one `(layer, serial)` pair each.
pub(crate) fn corpse_equipment(ctx: &mut Context<'_>, reader: &mut PacketReader<'_>) -> Result<()> {
    let serial = Serial(reader.read_u32_be()?);
    match ctx.world.get(serial) {
        Some(corpse) if corpse.is_corpse() => {}
        Some(_) => {
            tracing::debug!(serial = %serial, "equipment list for a non-corpse");
            return Ok(());
        }
        None => return Ok(()),
    }

    let mut layer = reader.read_u8()?;
    while layer != 0 && !reader.is_exhausted() {
        let item_serial = Serial(reader.read_u32_be()?);
        let slot = Layer(layer - 1);
        if slot != Layer::BACKPACK {
            ctx.world.get_or_create(item_serial, EntityKind::Item);
            ctx.world.reparent(item_serial, serial, Placement::Back)?;
            ctx.world.set_layer(item_serial, slot);
        }
        if reader.is_exhausted() {
            break;
        }
        layer = reader.read_u8()?;
    }

    ctx.world.notify(WorldEvent::ContainerChanged { container: serial });
    Ok(())
}

/// 0xAF: re-key the dead mobile so its equipment can move to the corpse.
pub(crate) fn display_death(ctx: &mut Context<'_>, reader: &mut PacketReader<'_>) -> Result<()> {
    let serial = Serial(reader.read_u32_be()?);
    let corpse = Serial(reader.read_u32_be()?);
    let _running = reader.read_u32_be()?;

    let is_mobile = ctx.world.get(serial).is_some_and(|e| e.is_mobile());
    if !is_mobile || ctx.world.is_player(serial) {
        return Ok(());
    }
    if let Some(alias) = ctx.world.alias_as_corpse(serial) {
        tracing::debug!(serial = %serial, alias = %alias, corpse = %corpse, "mobile died");
        ctx.world.notify(WorldEvent::Died {
            serial,
            alias,
            corpse,
        });
    }
    Ok(())
}

/// 0xF3, and each record nested in 0xF7.
pub(crate) fn update_item_sa(ctx: &mut Context<'_>, reader: &mut PacketReader<'_>) -> Result<()> {
    reader.skip(2)?;
    let object_type = reader.read_u8()?;
    let serial = Serial(reader.read_u32_be()?);
    let graphic = reader.read_u16_be()?;
    let graphic_inc = reader.read_u8()?;
    let amount = reader.read_u16_be()?;
    let _amount2 = reader.read_u16_be()?;
    let x = reader.read_u16_be()?;
    let y = reader.read_u16_be()?;
    let z = reader.read_i8()?;
    let direction = reader.read_u8()?;
    let hue = reader.read_u16_be()?;
    let flags = reader.read_u8()?;
    if ctx.version() >= CV_7090 {
        reader.skip(2)?;
    }

    let update = ObjectUpdate {
        serial,
        graphic,
        graphic_inc,
        amount,
        x,
        y,
        z,
        direction,
        hue,
        flags,
        object_type,
    };
    if !ctx.world.is_player(serial) {
        update_game_object(ctx, &update);
    } else if ctx.opcode() == PACKET_LIST {
        update_player(ctx, &update);
    }
    Ok(())
}

/// 0xF7: a count followed by opcode-tagged 0xF3 records.
pub(crate) fn packet_list(ctx: &mut Context<'_>, reader: &mut PacketReader<'_>) -> Result<()> {
    let count = reader.read_u16_be()?;
    for _ in 0..count {
        let id = reader.read_u8()?;
        if id != ITEM_SA {
            tracing::warn!(id = format_args!("{id:#04x}"), "unexpected record in packet list");
            break;
        }
        update_item_sa(ctx, reader)?;
    }
    Ok(())
}
