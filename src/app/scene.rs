//! Scene lifecycle: builds the main layer on entering `Playing` and tears it down
//! on leaving, in the order the layer requires (exit, cleanup, despawn).

use bevy::prelude::*;

use super::state::AppState;
use crate::core::config::GameConfig;
use crate::core::resources::Scoreboard;
use crate::core::system::system_order::{
    DispatchSet, PointerSampleSet, SceneReactSet, TouchInputSet,
};
use crate::event::DirectorPlugin;
use crate::layer::element_layer::ElementLayerPlugin;
use crate::layer::main_layer::MainLayer;
use crate::layer::pointer_layer::PointerLayerPlugin;
use crate::layer::touch_layer::TouchLayerPlugin;
use crate::layer::world_layer::WorldLayerPlugin;

const LOG_TARGET: &str = "scene";

/// Main layer of the current play session, if any.
#[derive(Resource, Debug, Default)]
pub struct ActiveScene(pub Option<Entity>);

pub struct ScenePlugin;

impl Plugin for ScenePlugin {
    fn build(&self, app: &mut App) {
        app.init_state::<AppState>()
            .init_resource::<GameConfig>()
            .init_resource::<ActiveScene>()
            .configure_sets(
                Update,
                (PointerSampleSet, TouchInputSet, DispatchSet, SceneReactSet).chain(),
            )
            .add_plugins((
                DirectorPlugin,
                WorldLayerPlugin,
                TouchLayerPlugin,
                ElementLayerPlugin,
                PointerLayerPlugin,
            ))
            .add_systems(OnEnter(AppState::Playing), enter_scene)
            .add_systems(OnExit(AppState::Playing), exit_scene)
            .add_systems(
                Update,
                finish_loading.run_if(in_state(AppState::Loading)),
            );
    }
}

fn finish_loading(mut next: ResMut<NextState<AppState>>) {
    next.set(AppState::Playing);
}

pub fn enter_scene(world: &mut World) {
    let (width, height) = {
        let cfg = world.resource::<GameConfig>();
        (cfg.window.width, cfg.window.height)
    };
    world.insert_resource(Scoreboard::default());
    let layer = MainLayer::spawn(world, width, height);
    if let Err(e) = MainLayer::enter(world, layer) {
        error!(target: LOG_TARGET, "scene failed to enter: {e}");
    }
    world.resource_mut::<ActiveScene>().0 = Some(layer);
}

pub fn exit_scene(world: &mut World) {
    let Some(layer) = world.resource_mut::<ActiveScene>().0.take() else {
        return;
    };
    if let Err(e) = MainLayer::exit(world, layer) {
        warn!(target: LOG_TARGET, "scene exit: {e}");
    }
    if let Err(e) = MainLayer::cleanup_view(world, layer) {
        warn!(target: LOG_TARGET, "scene cleanup: {e}");
    }
    let score = *world.resource::<Scoreboard>();
    info!(
        target: LOG_TARGET,
        "scene closed: {} cleared, {} flare(s)", score.cleared, score.flares
    );
    world.despawn(layer);
}
