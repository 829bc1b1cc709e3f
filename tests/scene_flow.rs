use bevy::prelude::*;
use bevy::state::app::StatesPlugin;
use bumpers::core::resources::Scoreboard;
use bumpers::layer::element_layer::Item;
use bumpers::layer::world_layer::world_is_live;
use bumpers::{ActiveScene, AppEvent, AppState, Director, GameConfig, MainLayer, ScenePlugin};

fn scene_app() -> App {
    let mut cfg = GameConfig::default();
    cfg.window.width = 400.0;
    cfg.window.height = 600.0;
    cfg.elements.item_count = 3;
    cfg.elements.bumper_count = 2;

    let mut app = App::new();
    app.add_plugins((MinimalPlugins, StatesPlugin));
    app.insert_resource(cfg);
    app.add_plugins(ScenePlugin);
    app
}

fn items(app: &mut App) -> Vec<Entity> {
    let world = app.world_mut();
    world.query_filtered::<Entity, With<Item>>().iter(world).collect()
}

#[test]
fn loading_advances_into_a_registered_scene() {
    let mut app = scene_app();
    app.update();
    assert_eq!(app.world().resource::<ActiveScene>().0, None);
    app.update();

    assert_eq!(*app.world().resource::<State<AppState>>().get(), AppState::Playing);
    let layer = app.world().resource::<ActiveScene>().0.expect("scene entered");
    assert!(app.world().resource::<Director>().is_registered(layer));
    assert_eq!(items(&mut app).len(), 3);
}

#[test]
fn touch_up_clears_item_through_the_director() {
    let mut app = scene_app();
    app.update();
    app.update();
    let item = items(&mut app)[0];

    app.world_mut()
        .resource_mut::<Director>()
        .send_event(AppEvent::BodyTouchUp, item);
    app.update();

    assert!(app.world().get_entity(item).is_err());
    let score = *app.world().resource::<Scoreboard>();
    assert_eq!((score.cleared, score.flares), (1, 1));
    let kinds: Vec<AppEvent> = app
        .world()
        .resource::<Director>()
        .journal()
        .map(|r| r.event.kind)
        .collect();
    assert_eq!(
        kinds,
        vec![AppEvent::BodyTouchUp, AppEvent::ItemClear, AppEvent::PointerFlare]
    );
}

#[test]
fn leaving_play_tears_the_scene_down() {
    let mut app = scene_app();
    app.update();
    app.update();
    let layer = app.world().resource::<ActiveScene>().0.unwrap();
    let world_layer = app.world().get::<MainLayer>(layer).unwrap().world_layer();
    assert!(world_is_live(app.world(), world_layer));

    app.world_mut()
        .resource_mut::<NextState<AppState>>()
        .set(AppState::Loading);
    app.update();

    assert_eq!(app.world().resource::<ActiveScene>().0, None);
    assert_eq!(app.world().resource::<Director>().observer_count(), 0);
    assert!(app.world().get_entity(layer).is_err());
    assert!(app.world().get_entity(world_layer).is_err());
    assert!(items(&mut app).is_empty());

    // Loading hands straight back to a fresh scene.
    app.update();
    let rebuilt = app.world().resource::<ActiveScene>().0.unwrap();
    assert_ne!(rebuilt, layer);
    assert_eq!(items(&mut app).len(), 3);
}
