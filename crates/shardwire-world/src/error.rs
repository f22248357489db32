use crate::serial::Serial;

/// Errors raised by graph operations.
#[derive(Debug, thiserror::Error)]
pub enum WorldError {
    /// The entity is not in the world.
    #[error("entity {0} not found")]
    NotFound(Serial),

    /// Reparenting would put an entity inside itself.
    #[error("entity {serial} cannot be placed inside {container}")]
    SelfContainment { serial: Serial, container: Serial },
}

pub type Result<T> = std::result::Result<T, WorldError>;
