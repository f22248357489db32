//! Tick-driven protocol engine.
//!
//! [`Engine`] ties the layers together: bytes arrive in two ring buffers
//! (network and plugin-injected), each tick frames whatever is complete,
//! runs the decoder registered for each opcode against a [`Context`], and
//! collects the results in the world graph, the property cache and the
//! layout outbox.
//!
//! Decoders are plain functions registered in a [`DispatchTable`]. The
//! built-in set in [`handlers`] covers object lifecycle, containers,
//! equipment, property lists and layouts; embedders can add or replace
//! decoders and install a [`PacketFilter`] on the network stream.

pub mod cliloc;
pub mod config;
pub mod context;
pub mod dispatch;
pub mod engine;
pub mod error;
pub mod handlers;

pub use cliloc::{ClilocResolver, ClilocTable, NumericClilocs};
pub use config::EngineConfig;
pub use context::{Context, Session, Source};
pub use dispatch::{Decoder, Dispatch, DispatchTable, FilterVerdict, FrameMut, PacketFilter};
pub use engine::{Engine, FrameOutcome, FrameRecord, TickReport, FRAME_TARGET};
pub use error::{EngineError, Result};
