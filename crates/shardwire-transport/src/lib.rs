//! Byte ingress for the shardwire engine.
//!
//! The transport layer owns nothing protocol-specific. It provides:
//! - [`RingBuffer`], the bounded, mutex-protected byte queue the engine drains
//!   each tick
//! - [`pump`] (and `pump_async` behind the `async` feature), which copy a
//!   socket or capture file into a ring with backpressure
//!
//! This is the lowest layer of shardwire. Everything else builds on top of
//! the bytes queued here.

pub mod error;
pub mod pump;
pub mod ring;

pub use error::{Result, TransportError};
#[cfg(feature = "async")]
pub use pump::pump_async;
pub use pump::{pump, PumpConfig};
pub use ring::{RingBuffer, RingGuard, DEFAULT_RING_CAPACITY};
