pub mod components;
pub mod config;
pub mod error;
pub mod resources;
pub mod system;
