use shardwire_frame::PacketReader;
use shardwire_world::{Serial, WorldEvent};

use crate::context::Context;
use crate::error::Result;

/// 0x73
pub(crate) fn ping(ctx: &mut Context<'_>, reader: &mut PacketReader<'_>) -> Result<()> {
    let sequence = reader.read_u8()?;
    ctx.session.record_ping(sequence);
    Ok(())
}

/// 0x98
pub(crate) fn update_name(ctx: &mut Context<'_>, reader: &mut PacketReader<'_>) -> Result<()> {
    let serial = Serial(reader.read_u32_be()?);
    let name = reader.read_ascii_nul();
    if let Some(entity) = ctx.world.get_mut(serial) {
        entity.name = name;
        ctx.world.notify(WorldEvent::NameChanged { serial });
    }
    Ok(())
}

/// 0xA1
pub(crate) fn update_hitpoints(ctx: &mut Context<'_>, reader: &mut PacketReader<'_>) -> Result<()> {
    let serial = Serial(reader.read_u32_be()?);
    let Some(entity) = ctx.world.get_mut(serial) else {
        return Ok(());
    };
    entity.hits_max = reader.read_u16_be()?;
    entity.hits = reader.read_u16_be()?;
    ctx.world.notify(WorldEvent::HitsChanged { serial });
    Ok(())
}
