use bevy::prelude::Entity;
use std::fmt;

/// Failures of the scene composition once it exists. Nothing here is transient;
/// every variant means the caller used a layer outside its lifecycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SceneError {
    /// The layer already ran `cleanup_view`; its physics world is gone.
    Disposed { layer: Entity },
    /// The entity is not (or no longer) the expected layer kind.
    MissingLayer { layer: Entity },
    /// The physics world was disposed before this operation.
    WorldDisposed { world: Entity },
}

impl fmt::Display for SceneError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Disposed { layer } => write!(f, "layer {layer} has been disposed"),
            Self::MissingLayer { layer } => write!(f, "entity {layer} is not a live layer"),
            Self::WorldDisposed { world } => write!(f, "physics world {world} already disposed"),
        }
    }
}

impl std::error::Error for SceneError {}
