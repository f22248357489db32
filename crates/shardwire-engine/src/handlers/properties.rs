use shardwire_frame::PacketReader;
use shardwire_world::{Serial, WorldEvent};

use crate::context::Context;
use crate::error::Result;

/// 0xD6: property list response.
///
/// The first translated entry is the object's name, the rest are joined by
/// newlines. Entries that repeat an earlier id and text replace it.
pub(crate) fn mega_cliloc(ctx: &mut Context<'_>, reader: &mut PacketReader<'_>) -> Result<()> {
    let subtype = reader.read_u16_be()?;
    if subtype > 1 {
        return Ok(());
    }
    let serial = Serial(reader.read_u32_be()?);
    reader.skip(2)?;
    let revision = reader.read_u32_be()?;

    let mut entries: Vec<(u32, String)> = Vec::new();
    while reader.remaining() >= 4 {
        let cliloc = reader.read_u32_be()?;
        if cliloc == 0 {
            break;
        }
        let len = reader.read_u16_be()?;
        let args = if len == 0 {
            String::new()
        } else {
            reader.read_unicode_le(usize::from(len / 2))?
        };
        let Some(text) = ctx.resolver.translate(cliloc, &args) else {
            continue;
        };
        if let Some(pos) = entries.iter().position(|(id, t)| *id == cliloc && *t == text) {
            entries.remove(pos);
        }
        entries.push((cliloc, text));
    }

    let named = !entries.is_empty();
    let mut texts = entries.into_iter().map(|(_, text)| text);
    let name = texts.next().unwrap_or_default();
    let data = texts.collect::<Vec<_>>().join("\n");

    if named && !serial.is_mobile() {
        if let Some(entity) = ctx.world.get_mut(serial) {
            entity.name.clone_from(&name);
        }
    }

    let observation = ctx
        .world
        .properties_mut()
        .observe(serial, revision, name, data);
    ctx.requests.complete(serial);
    tracing::trace!(serial = %serial, revision, ?observation, "property list");
    if observation.changed() {
        ctx.world.notify(WorldEvent::PropertiesChanged { serial });
    }
    Ok(())
}

/// 0xDC: revision announcement. Anything other than the cached revision
/// triggers a request.
pub(crate) fn opl_info(ctx: &mut Context<'_>, reader: &mut PacketReader<'_>) -> Result<()> {
    if !ctx.tooltips_enabled() {
        return Ok(());
    }
    let serial = Serial(reader.read_u32_be()?);
    let revision = reader.read_u32_be()?;
    if ctx.world.properties().revision(serial) != Some(revision) {
        ctx.request_properties(serial);
    }
    Ok(())
}
