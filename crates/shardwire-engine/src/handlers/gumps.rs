use shardwire_frame::PacketReader;
use shardwire_gump::LayoutTree;
use shardwire_world::Serial;

use crate::context::Context;
use crate::error::Result;

/// 0xB0
pub(crate) fn open_gump(ctx: &mut Context<'_>, reader: &mut PacketReader<'_>) -> Result<()> {
    let tree = ctx.layouts.decode_text(reader)?;
    publish(ctx, tree);
    Ok(())
}

/// 0xDD
pub(crate) fn open_compressed_gump(
    ctx: &mut Context<'_>,
    reader: &mut PacketReader<'_>,
) -> Result<()> {
    let tree = ctx.layouts.decode_compressed(reader)?;
    publish(ctx, tree);
    Ok(())
}

/// Queue property requests for referenced objects with no known revision,
/// then hand the layout to the consumer.
fn publish(ctx: &mut Context<'_>, tree: LayoutTree) {
    for &raw in &tree.item_properties {
        let serial = Serial(raw);
        let known = ctx
            .world
            .properties()
            .revision(serial)
            .is_some_and(|rev| rev != 0);
        if !known {
            ctx.request_properties(serial);
        }
    }
    tracing::debug!(
        sender = tree.sender,
        gump_id = tree.gump_id,
        widgets = tree.widgets.len(),
        skipped = tree.skipped,
        "layout decoded"
    );
    ctx.outbox.push(tree);
}
