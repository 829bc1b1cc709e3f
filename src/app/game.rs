// This file is part of Bumpers.
// Copyright (C) 2025 Adam and contributors
// SPDX-License-Identifier: GPL-3.0-or-later

use bevy::prelude::*;
use bevy_rapier2d::prelude::*;

use super::scene::ScenePlugin;
use super::state::AppState;
use crate::core::config::GameConfig;

const LOG_TARGET: &str = "game";

pub struct GamePlugin;

impl Plugin for GamePlugin {
    fn build(&self, app: &mut App) {
        let cfg = app
            .world()
            .get_resource::<GameConfig>()
            .cloned()
            .unwrap_or_default();
        app.add_plugins(RapierPhysicsPlugin::<NoUserData>::pixels_per_meter(
            cfg.physics.pixels_per_metre,
        ));
        if cfg.physics.debug_render {
            app.add_plugins(RapierDebugRenderPlugin::default());
        }
        app.add_plugins(ScenePlugin)
            .add_systems(Startup, (spawn_camera, log_config_warnings))
            .add_systems(Update, (restart_on_key, exit_on_escape));
    }
}

fn spawn_camera(mut commands: Commands) {
    commands.spawn((Camera2d, Name::new("MainCamera")));
}

fn log_config_warnings(cfg: Res<GameConfig>) {
    for w in cfg.validate() {
        warn!(target: "config", "{w}");
    }
}

/// `R` rebuilds the scene by passing back through `Loading`.
fn restart_on_key(
    keys: Res<ButtonInput<KeyCode>>,
    state: Res<State<AppState>>,
    mut next: ResMut<NextState<AppState>>,
) {
    if keys.just_pressed(KeyCode::KeyR) && *state.get() == AppState::Playing {
        info!(target: LOG_TARGET, "restarting scene");
        next.set(AppState::Loading);
    }
}

fn exit_on_escape(keys: Res<ButtonInput<KeyCode>>, mut exit: EventWriter<AppExit>) {
    if keys.just_pressed(KeyCode::Escape) {
        exit.write(AppExit::Success);
    }
}
