use bevy::prelude::*;

/// High-level app lifecycle state.
/// Loading -> Playing; restarting goes back through Loading.
#[derive(States, Debug, Clone, Copy, Eq, PartialEq, Hash, Default)]
pub enum AppState {
    /// Transitional state while the scene is (re)built.
    #[default]
    Loading,
    /// The main layer exists and is registered with the director.
    Playing,
}
