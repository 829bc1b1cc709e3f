pub mod game;
pub mod scene;
pub mod state;
