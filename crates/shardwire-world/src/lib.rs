//! World state for the shardwire protocol engine.
//!
//! Entities live in a single arena keyed by [`Serial`]. Container, sibling
//! and mount relations are stored as serials and kept consistent by
//! [`World`]; nothing holds a reference into the arena across operations.
//!
//! [`PropertyCache`] and [`RequestQueue`] track per-object property text by
//! revision and the outstanding requests for it.

pub mod entity;
pub mod error;
pub mod layer;
pub mod properties;
pub mod serial;
pub mod world;

pub use entity::{Entity, EntityKind, CORPSE_GRAPHIC};
pub use error::{Result, WorldError};
pub use layer::Layer;
pub use properties::{Observation, PropertyCache, PropertyEntry, PropertyRequest, RequestQueue, MAX_BATCH};
pub use serial::Serial;
pub use world::{Placement, World, WorldEvent};
