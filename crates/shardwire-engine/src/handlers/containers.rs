use shardwire_frame::{ClientVersion, PacketReader, CV_6017, CV_7090};
use shardwire_world::{EntityKind, Layer, Placement, Serial, WorldEvent};

use crate::context::Context;
use crate::error::Result;

/// Container graphic used by vendors to open the buy window.
const VENDOR_GUMP: u16 = 0x0030;
/// Container graphic used by spellbooks.
const SPELLBOOK_GUMP: u16 = 0xFFFF;

/// One item placed inside a container.
#[derive(Debug, Clone, Copy)]
struct ContainedItem {
    serial: Serial,
    graphic: u16,
    amount: u16,
    x: u16,
    y: u16,
    container: Serial,
    hue: u16,
}

fn read_contained_item(version: ClientVersion, reader: &mut PacketReader<'_>) -> Result<ContainedItem> {
    let serial = Serial(reader.read_u32_be()?);
    let graphic = reader
        .read_u16_be()?
        .wrapping_add(u16::from(reader.read_u8()?));
    let amount = reader.read_u16_be()?.max(1);
    let x = reader.read_u16_be()?;
    let y = reader.read_u16_be()?;
    if version >= CV_6017 {
        // Grid slot index.
        reader.skip(1)?;
    }
    let container = Serial(reader.read_u32_be()?);
    let hue = reader.read_u16_be()?;
    Ok(ContainedItem {
        serial,
        graphic,
        amount,
        x,
        y,
        container,
        hue,
    })
}

fn add_item_to_container(ctx: &mut Context<'_>, record: &ContainedItem) -> Result<()> {
    let serial = record.serial;
    let world = &mut *ctx.world;

    if serial.is_mobile() && world.get(serial).is_some_and(|e| e.is_mobile()) {
        tracing::warn!(serial = %serial, "mobile serial placed in a container");
        world.remove(serial, true);
    }

    // An item leaving another container is rebuilt from scratch, except
    // equipment that moves onto a corpse.
    let into_corpse = world.get(record.container).is_some_and(|c| c.is_corpse());
    let moved_out = world.get(serial).is_some_and(|item| {
        item.container().is_some_and(|c| c != record.container)
            && (!into_corpse || item.layer() == Layer::INVALID)
    });
    if moved_out {
        world.remove(serial, true);
    }

    let item = world.get_or_create(serial, EntityKind::Item);
    item.graphic = record.graphic;
    item.amount = record.amount;
    item.set_hue(record.hue);
    item.x = record.x;
    item.y = record.y;
    item.z = 0;

    world.reparent(serial, record.container, Placement::Back)?;
    world.notify(WorldEvent::ContainerChanged {
        container: record.container,
    });
    Ok(())
}

/// 0x24
pub(crate) fn open_container(ctx: &mut Context<'_>, reader: &mut PacketReader<'_>) -> Result<()> {
    let serial = Serial(reader.read_u32_be()?);
    let graphic = reader.read_u16_be()?;
    if ctx.version() >= CV_7090 {
        // Container gump type.
        reader.skip(2)?;
    }

    if graphic == VENDOR_GUMP {
        if ctx.world.get(serial).is_some_and(|e| e.is_mobile()) {
            ctx.world
                .notify(WorldEvent::ContainerOpened { serial, graphic });
        }
        return Ok(());
    }

    let Some(container) = ctx.world.get_mut(serial) else {
        tracing::debug!(serial = %serial, "open for unknown container");
        return Ok(());
    };
    container.opened = true;
    let keep_contents = container.is_corpse() || graphic == SPELLBOOK_GUMP;
    if !keep_contents {
        ctx.world.clear_children(serial, false);
    }
    ctx.world
        .notify(WorldEvent::ContainerOpened { serial, graphic });
    Ok(())
}

/// 0x25
pub(crate) fn update_contained_item(
    ctx: &mut Context<'_>,
    reader: &mut PacketReader<'_>,
) -> Result<()> {
    let record = read_contained_item(ctx.version(), reader)?;
    add_item_to_container(ctx, &record)
}

/// 0x3C: a container's full content list.
pub(crate) fn update_contained_items(
    ctx: &mut Context<'_>,
    reader: &mut PacketReader<'_>,
) -> Result<()> {
    let count = reader.read_u16_be()?;
    for index in 0..count {
        let record = read_contained_item(ctx.version(), reader)?;
        if index == 0 {
            if let Some(corpse) = ctx.world.get(record.container).map(|c| c.is_corpse()) {
                ctx.world.clear_children(record.container, corpse);
            }
        }
        add_item_to_container(ctx, &record)?;
    }
    Ok(())
}
