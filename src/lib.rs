pub mod app;
pub mod core;
pub mod event;
pub mod layer;

// Curated re-exports
pub use app::game::GamePlugin;
pub use app::scene::{ActiveScene, ScenePlugin};
pub use app::state::AppState;
pub use core::config::GameConfig;
pub use core::error::SceneError;
pub use event::{ActorEvent, AppEvent, Director};
pub use layer::main_layer::{MainLayer, SceneState};
