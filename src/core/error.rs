use thiserror::Error;

/// Errors surfaced at the crate boundary.
///
/// The decision core itself never fails through this type: nodes return a
/// `Status`, registries return `bool`/`Option`. These variants cover what the
/// host does around the core (loading config, looking up entities by id).
#[derive(Error, Debug)]
pub enum SimError {
    #[error("Entity not found: {0}")]
    EntityNotFound(crate::core::types::EntityId),

    #[error("Entity {0} is not an actor")]
    NotAnActor(crate::core::types::EntityId),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Config parse error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("Serialization error: {0}")]
    SerdeError(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, SimError>;
