//! Client-side core for a shard game protocol.
//!
//! shardwire turns a raw server byte stream into typed state: it frames
//! messages by opcode, dispatches them to decoders on a single tick thread,
//! and maintains a graph of world objects, a property-list cache and
//! decoded layout (gump) trees.
//!
//! # Crate Structure
//!
//! - [`transport`]: Ring buffers fed by socket reader threads
//! - [`frame`]: Opcode length tables, framing and payload readers
//! - [`world`]: Object graph, layers and the property cache
//! - [`gump`]: Layout tokenizer, widgets and compressed blocks
//! - [`engine`]: Dispatch table, built-in decoders and the tick loop
//!
//! # Example
//!
//! ```
//! use shardwire::engine::{Engine, Source};
//! use shardwire::world::Serial;
//!
//! let mut engine = Engine::with_defaults();
//! // 0x1D: delete object. Unknown serials are ignored.
//! engine.append(&[0x1D, 0x40, 0x00, 0x00, 0x01], Source::Network).unwrap();
//! let report = engine.tick();
//! assert_eq!(report.dispatched, 1);
//! assert!(engine.world().get(Serial(0x4000_0001)).is_none());
//! ```

/// Re-export transport types.
pub mod transport {
    pub use shardwire_transport::*;
}

/// Re-export frame types.
pub mod frame {
    pub use shardwire_frame::*;
}

/// Re-export world graph types.
pub mod world {
    pub use shardwire_world::*;
}

/// Re-export layout types.
pub mod gump {
    pub use shardwire_gump::*;
}

/// Re-export engine types.
pub mod engine {
    pub use shardwire_engine::*;
}
