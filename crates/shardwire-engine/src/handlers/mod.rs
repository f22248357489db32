//! Built-in decoders, one function per opcode.
//!
//! Each decoder reads its payload through the frame-bounded reader and
//! applies the result to the [`Context`](crate::Context). Running past the
//! frame is an error for that frame only.

mod containers;
mod gumps;
mod misc;
mod objects;
mod properties;

use shardwire_frame::PacketReader;

use crate::context::Context;
use crate::dispatch::DispatchTable;
use crate::error::Result;

/// Signature shared by the built-in decoders.
pub type DecoderFn = fn(&mut Context<'_>, &mut PacketReader<'_>) -> Result<()>;

/// Opcodes handled out of the box.
pub fn decoders() -> [(u8, DecoderFn); 19] {
    [
        (0x1B, objects::enter_world),
        (0x1D, objects::delete_object),
        (0x24, containers::open_container),
        (0x25, containers::update_contained_item),
        (0x2E, objects::equip_item),
        (0x3C, containers::update_contained_items),
        (0x73, misc::ping),
        (0x78, objects::update_object),
        (0x89, objects::corpse_equipment),
        (0x98, misc::update_name),
        (0xA1, misc::update_hitpoints),
        (0xAF, objects::display_death),
        (0xB0, gumps::open_gump),
        (0xD3, objects::update_object),
        (0xD6, properties::mega_cliloc),
        (0xDC, properties::opl_info),
        (0xDD, gumps::open_compressed_gump),
        (0xF3, objects::update_item_sa),
        (0xF7, objects::packet_list),
    ]
}

/// Register every built-in decoder. Fails on the first occupied slot.
pub fn register_defaults(table: &mut DispatchTable) -> Result<()> {
    for (opcode, decoder) in decoders() {
        table.register(opcode, decoder)?;
    }
    Ok(())
}
