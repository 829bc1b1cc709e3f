use std::path::PathBuf;

use anyhow::{anyhow, Result};
use bevy::prelude::*;
use clap::Parser;

use bumpers::{GameConfig, GamePlugin};

const BASE_CONFIG: &str = "assets/config/game.ron";
const LOCAL_CONFIG: &str = "assets/config/game.local.ron";

#[derive(Parser, Debug)]
#[command(about = "Bumpers: clear items by flicking them through a bumper field", version)]
struct Args {
    /// Load exactly this RON file instead of the layered defaults.
    #[arg(long)]
    config: Option<PathBuf>,
}

fn main() -> Result<()> {
    let args = Args::parse();
    let cfg = match &args.config {
        Some(path) => GameConfig::load_from_file(path)
            .map_err(|e| anyhow!("loading {}: {e}", path.display()))?,
        None => {
            let (cfg, used, errors) = GameConfig::load_layered([BASE_CONFIG, LOCAL_CONFIG]);
            for e in errors.iter().filter(|e| !e.starts_with(LOCAL_CONFIG)) {
                eprintln!("config: {e}");
            }
            if used.is_empty() {
                eprintln!("config: no config files loaded; using defaults");
            }
            cfg
        }
    };

    App::new()
        .insert_resource(cfg.clone())
        .add_plugins(DefaultPlugins.set(WindowPlugin {
            primary_window: Some(Window {
                title: cfg.window.title.clone(),
                resolution: (cfg.window.width, cfg.window.height).into(),
                resizable: true,
                ..default()
            }),
            ..default()
        }))
        .add_plugins(GamePlugin)
        .run();
    Ok(())
}
