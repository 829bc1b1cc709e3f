pub mod config;

pub use config::{
    ElementConfig, GameConfig, PhysicsConfig, PointerConfig, TouchConfig, WindowConfig,
};
