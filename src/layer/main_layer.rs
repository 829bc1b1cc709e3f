// This file is part of Bumpers.
// Copyright (C) 2025 Adam and contributors
// SPDX-License-Identifier: GPL-3.0-or-later

//! Main composition layer: builds the play scene out of its four child layers and
//! turns touch releases on labeled items into clear + flare events.
//!
//! Child order is fixed and load-bearing: world, touch, element, pointer. Later
//! children borrow the world handle (and its contact listener) from the first.

use bevy::prelude::*;

use crate::core::components::{LabeledSprite, Layer};
use crate::core::config::GameConfig;
use crate::core::error::SceneError;
use crate::event::{ActorEvent, ActorEventObserver, AppEvent, Director};
use crate::layer::element_layer::ElementLayer;
use crate::layer::pointer_layer::PointerLayer;
use crate::layer::touch_layer::TouchLayer;
use crate::layer::world_layer::WorldLayer;
use crate::layer::{layer_children, LayerHooks};

const LOG_TARGET: &str = "scene";

/// Lifecycle of a [`MainLayer`]. `Disposed` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SceneState {
    Constructed,
    Active,
    Inactive,
    Disposed,
}

#[derive(Component, Debug)]
pub struct MainLayer {
    state: SceneState,
    world_layer: Entity,
    touch_layer: Entity,
    element_layer: Entity,
    pointer_layer: Entity,
}

impl MainLayer {
    /// Constructs the layer and builds its view. Tuning comes from the world's
    /// [`GameConfig`] when present; the director is created if missing.
    pub fn spawn(world: &mut World, width: f32, height: f32) -> Entity {
        world.init_resource::<Director>();
        let cfg = world.get_resource::<GameConfig>().cloned().unwrap_or_default();
        let layer = world
            .spawn((
                Name::new("MainLayer"),
                Layer::new(width, height),
                Transform::default(),
                Visibility::default(),
            ))
            .id();
        let main = Self::create_view(world, layer, width, height, &cfg);
        world.entity_mut(layer).insert(main);
        info!(target: LOG_TARGET, "main layer {layer} built {width:.0}x{height:.0}");
        layer
    }

    fn create_view(
        world: &mut World,
        layer: Entity,
        width: f32,
        height: f32,
        cfg: &GameConfig,
    ) -> Self {
        let world_layer = WorldLayer::spawn(world, layer, width, height, &cfg.physics);
        let ppm = world
            .get::<WorldLayer>(world_layer)
            .map(WorldLayer::pixels_per_metre)
            .unwrap_or(cfg.physics.pixels_per_metre);

        let mut touch = TouchLayer::new(world_layer, ppm, &cfg.touch);
        touch.set_send_touch_down(true);
        touch.set_send_touch_dragged(true);
        touch.set_send_touch_up(true);
        let touch_layer = TouchLayer::spawn(world, layer, width, height, touch);

        let elements = ElementLayer::new(world_layer, ppm, world_layer, cfg.elements.bumper_kick);
        let element_layer =
            ElementLayer::spawn(world, layer, width, height, elements, &cfg.elements);

        let pointer_layer = PointerLayer::spawn(world, layer, width, height, &cfg.pointer);

        Self {
            state: SceneState::Constructed,
            world_layer,
            touch_layer,
            element_layer,
            pointer_layer,
        }
    }

    pub fn state(&self) -> SceneState {
        self.state
    }

    pub fn world_layer(&self) -> Entity {
        self.world_layer
    }

    pub fn touch_layer(&self) -> Entity {
        self.touch_layer
    }

    pub fn element_layer(&self) -> Entity {
        self.element_layer
    }

    pub fn pointer_layer(&self) -> Entity {
        self.pointer_layer
    }

    /// Current state, failing once the layer is gone or disposed.
    fn live_state(world: &World, layer: Entity) -> Result<SceneState, SceneError> {
        let Some(main) = world.get::<MainLayer>(layer) else {
            return Err(SceneError::MissingLayer { layer });
        };
        if main.state == SceneState::Disposed {
            return Err(SceneError::Disposed { layer });
        }
        Ok(main.state)
    }

    fn set_state(world: &mut World, layer: Entity, state: SceneState) {
        if let Some(mut main) = world.get_mut::<MainLayer>(layer) {
            main.state = state;
        }
    }

    /// Registers this layer, then every observing child in order.
    pub fn enter(world: &mut World, layer: Entity) -> Result<(), SceneError> {
        Self::live_state(world, layer)?;
        let observers: Vec<_> = layer_children(world, layer)
            .into_iter()
            .filter_map(|child| {
                world
                    .get::<LayerHooks>(child)
                    .and_then(LayerHooks::observer)
                    .map(|handle| (child, handle))
            })
            .collect();
        let mut director = world.get_resource_or_init::<Director>();
        if !director.register_event_handler::<MainLayer>(layer) {
            debug!(target: LOG_TARGET, "main layer {layer} already registered");
        }
        for (child, handle) in observers {
            director.register_with(child, handle);
        }
        Self::set_state(world, layer, SceneState::Active);
        Ok(())
    }

    /// Deregisters observing children in reverse, then this layer. Does nothing
    /// when the layer is not registered.
    pub fn exit(world: &mut World, layer: Entity) -> Result<(), SceneError> {
        Self::live_state(world, layer)?;
        if !Self::deregister(world, layer) {
            debug!(target: LOG_TARGET, "exit on unregistered main layer {layer}");
            return Ok(());
        }
        Self::set_state(world, layer, SceneState::Inactive);
        Ok(())
    }

    /// Removes the children (reverse order) and then this layer from the director.
    /// Returns `false` if this layer was not registered.
    fn deregister(world: &mut World, layer: Entity) -> bool {
        let children = layer_children(world, layer);
        let Some(mut director) = world.get_resource_mut::<Director>() else {
            return false;
        };
        if !director.is_registered(layer) {
            return false;
        }
        for child in children.into_iter().rev() {
            director.deregister_event_handler(child);
        }
        director.deregister_event_handler(layer);
        true
    }

    /// Cleans every managed child (last inserted first) and only then disposes
    /// the physics world. Children stay attached. A still-active layer is
    /// deregistered first.
    pub fn cleanup_view(world: &mut World, layer: Entity) -> Result<(), SceneError> {
        if Self::live_state(world, layer)? == SceneState::Active && Self::deregister(world, layer) {
            debug!(target: LOG_TARGET, "main layer {layer} deregistered during cleanup");
        }
        let world_layer = world
            .get::<MainLayer>(layer)
            .map(|m| m.world_layer)
            .ok_or(SceneError::MissingLayer { layer })?;
        for child in layer_children(world, layer).into_iter().rev() {
            let cleanup = world.get::<LayerHooks>(child).and_then(LayerHooks::cleanup);
            if let Some(cleanup) = cleanup {
                cleanup(world, child);
            }
        }
        Self::set_state(world, layer, SceneState::Disposed);
        WorldLayer::dispose(world, world_layer)?;
        info!(target: LOG_TARGET, "main layer {layer} disposed");
        Ok(())
    }

    /// Returns whether the event was handled. A touch-up counts as handled even
    /// when its actor is not labeled.
    pub fn handle_event(
        world: &mut World,
        layer: Entity,
        event: &ActorEvent,
    ) -> Result<bool, SceneError> {
        Self::live_state(world, layer)?;
        match event.kind {
            AppEvent::BodyTouchUp => {
                Self::handle_touch_up(world, event.actor);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    fn handle_touch_up(world: &mut World, actor: Entity) {
        let Some(labeled) = world.get::<LabeledSprite>(actor) else {
            return;
        };
        debug!(target: LOG_TARGET, "touch up on {}", labeled.label);
        let mut director = world.get_resource_or_init::<Director>();
        director.send_event(AppEvent::ItemClear, actor);
        director.send_event(AppEvent::PointerFlare, actor);
    }
}

impl ActorEventObserver for MainLayer {
    fn handle_event(world: &mut World, observer: Entity, event: &ActorEvent) -> bool {
        match MainLayer::handle_event(world, observer, event) {
            Ok(handled) => handled,
            Err(e) => {
                warn!(target: LOG_TARGET, "{e}; dropping {:?}", event.kind);
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::resources::Scoreboard;
    use crate::core::system::system_order::{DispatchSet, SceneReactSet};
    use crate::event::DirectorPlugin;
    use crate::layer::element_layer::{ElementLayerPlugin, Item};
    use crate::layer::pointer_layer::{Flare, PointerLayerPlugin};
    use crate::layer::world_layer::{world_is_live, WorldLayerPlugin};
    use crate::layer::ManagedLayer;

    fn events(world: &World) -> Vec<ActorEvent> {
        world.resource::<Director>().pending_events().copied().collect()
    }

    fn main_of(world: &World, layer: Entity) -> &MainLayer {
        world.get::<MainLayer>(layer).unwrap()
    }

    #[test]
    fn view_has_four_children_in_dependency_order() {
        let mut world = World::new();
        let layer = MainLayer::spawn(&mut world, 400.0, 600.0);
        let main = main_of(&world, layer);
        assert_eq!(main.state(), SceneState::Constructed);
        let expected = vec![
            main.world_layer(),
            main.touch_layer(),
            main.element_layer(),
            main.pointer_layer(),
        ];
        assert_eq!(layer_children(&world, layer), expected);

        let touch = world.get::<TouchLayer>(expected[1]).unwrap();
        assert!(touch.sends_touch_down() && touch.sends_touch_dragged() && touch.sends_touch_up());
        assert_eq!(touch.world(), expected[0]);
        let elements = world.get::<ElementLayer>(expected[2]).unwrap();
        assert_eq!(elements.world(), expected[0]);
        assert_eq!(elements.contact_listener(), expected[0]);
        assert!(world.get::<PointerLayer>(expected[3]).is_some());
    }

    #[test]
    fn enter_then_exit_unregisters() {
        let mut world = World::new();
        let layer = MainLayer::spawn(&mut world, 400.0, 600.0);
        MainLayer::enter(&mut world, layer).unwrap();
        assert!(world.resource::<Director>().is_registered(layer));
        assert_eq!(main_of(&world, layer).state(), SceneState::Active);

        MainLayer::exit(&mut world, layer).unwrap();
        let director = world.resource::<Director>();
        assert!(!director.is_registered(layer));
        assert_eq!(director.observer_count(), 0);
        assert_eq!(main_of(&world, layer).state(), SceneState::Inactive);

        MainLayer::enter(&mut world, layer).unwrap();
        assert_eq!(main_of(&world, layer).state(), SceneState::Active);
    }

    #[test]
    fn exit_without_enter_is_harmless() {
        let mut world = World::new();
        let layer = MainLayer::spawn(&mut world, 400.0, 600.0);
        assert_eq!(MainLayer::exit(&mut world, layer), Ok(()));
        assert_eq!(main_of(&world, layer).state(), SceneState::Constructed);
    }

    #[test]
    fn double_enter_registers_once() {
        let mut world = World::new();
        let layer = MainLayer::spawn(&mut world, 400.0, 600.0);
        MainLayer::enter(&mut world, layer).unwrap();
        MainLayer::enter(&mut world, layer).unwrap();
        let main = main_of(&world, layer);
        let order: Vec<Entity> = world.resource::<Director>().observers().collect();
        assert_eq!(order, vec![layer, main.element_layer(), main.pointer_layer()]);
    }

    #[test]
    fn labeled_touch_up_sends_clear_then_flare() {
        let mut world = World::new();
        let layer = MainLayer::spawn(&mut world, 400.0, 600.0);
        let actor = world.spawn(LabeledSprite::new("gem")).id();
        let handled =
            MainLayer::handle_event(&mut world, layer, &ActorEvent::new(AppEvent::BodyTouchUp, actor));
        assert_eq!(handled, Ok(true));
        assert_eq!(
            events(&world),
            vec![
                ActorEvent::new(AppEvent::ItemClear, actor),
                ActorEvent::new(AppEvent::PointerFlare, actor),
            ]
        );
    }

    // Touch-up on an unlabeled actor still reports handled, which hides it from
    // observers registered after the main layer.
    #[test]
    fn unlabeled_touch_up_is_claimed_without_events() {
        let mut world = World::new();
        let layer = MainLayer::spawn(&mut world, 400.0, 600.0);
        let actor = world.spawn(Transform::default()).id();
        let handled =
            MainLayer::handle_event(&mut world, layer, &ActorEvent::new(AppEvent::BodyTouchUp, actor));
        assert_eq!(handled, Ok(true));
        assert!(events(&world).is_empty());
    }

    #[test]
    fn other_kinds_are_left_for_other_observers() {
        let mut world = World::new();
        let layer = MainLayer::spawn(&mut world, 400.0, 600.0);
        let actor = world.spawn(LabeledSprite::new("gem")).id();
        for kind in [
            AppEvent::BodyTouchDown,
            AppEvent::BodyTouchDragged,
            AppEvent::ItemClear,
            AppEvent::PointerFlare,
        ] {
            let handled = MainLayer::handle_event(&mut world, layer, &ActorEvent::new(kind, actor));
            assert_eq!(handled, Ok(false), "{kind:?}");
        }
        assert!(events(&world).is_empty());
    }

    #[derive(Resource, Default)]
    struct CleanupLog(Vec<(&'static str, bool)>);

    #[derive(Component)]
    struct Probe {
        name: &'static str,
        world: Entity,
    }

    impl ManagedLayer for Probe {
        fn cleanup_view(world: &mut World, layer: Entity) {
            let (name, world_entity) = {
                let probe = world.get::<Probe>(layer).unwrap();
                (probe.name, probe.world)
            };
            let live = world_is_live(world, world_entity);
            world.resource_mut::<CleanupLog>().0.push((name, live));
        }
    }

    #[test]
    fn children_are_cleaned_before_world_is_disposed() {
        let mut world = World::new();
        world.init_resource::<CleanupLog>();
        let layer = MainLayer::spawn(&mut world, 400.0, 600.0);
        let world_layer = main_of(&world, layer).world_layer();
        for name in ["first", "second"] {
            world.spawn((
                Probe {
                    name,
                    world: world_layer,
                },
                LayerHooks::default().managed::<Probe>(),
                ChildOf(layer),
            ));
        }

        MainLayer::cleanup_view(&mut world, layer).unwrap();
        assert_eq!(
            world.resource::<CleanupLog>().0,
            vec![("second", true), ("first", true)]
        );
        assert!(!world_is_live(&world, world_layer));
        assert_eq!(main_of(&world, layer).state(), SceneState::Disposed);
    }

    #[test]
    fn operations_after_cleanup_fail() {
        let mut world = World::new();
        let layer = MainLayer::spawn(&mut world, 400.0, 600.0);
        MainLayer::enter(&mut world, layer).unwrap();
        MainLayer::cleanup_view(&mut world, layer).unwrap();

        let disposed = Err(SceneError::Disposed { layer });
        assert_eq!(MainLayer::enter(&mut world, layer), disposed);
        assert_eq!(MainLayer::exit(&mut world, layer), disposed);
        assert_eq!(MainLayer::cleanup_view(&mut world, layer), disposed);
        let actor = world.spawn(LabeledSprite::new("gem")).id();
        let event = ActorEvent::new(AppEvent::BodyTouchUp, actor);
        assert_eq!(
            MainLayer::handle_event(&mut world, layer, &event),
            Err(SceneError::Disposed { layer })
        );
        assert!(!<MainLayer as ActorEventObserver>::handle_event(&mut world, layer, &event));
        assert!(events(&world).is_empty());
        assert_eq!(layer_children(&world, layer).len(), 4);
    }

    #[test]
    fn cleanup_while_active_stops_delivery() {
        let mut world = World::new();
        world.init_resource::<Scoreboard>();
        let layer = MainLayer::spawn(&mut world, 400.0, 600.0);
        MainLayer::enter(&mut world, layer).unwrap();
        MainLayer::cleanup_view(&mut world, layer).unwrap();
        assert_eq!(world.resource::<Director>().observer_count(), 0);

        let actor = world.spawn(Transform::default()).id();
        world
            .resource_mut::<Director>()
            .send_event(AppEvent::PointerFlare, actor);
        crate::event::dispatch_actor_events(&mut world);
        assert_eq!(world.query_filtered::<Entity, With<Flare>>().iter(&world).count(), 0);
        assert_eq!(world.resource::<Scoreboard>().flares, 0);
    }

    #[test]
    fn touch_up_on_item_clears_it_and_flares() {
        let mut app = App::new();
        app.add_plugins(MinimalPlugins)
            .configure_sets(Update, (DispatchSet, SceneReactSet).chain())
            .add_plugins((
                DirectorPlugin,
                WorldLayerPlugin,
                ElementLayerPlugin,
                PointerLayerPlugin,
            ));
        let layer = MainLayer::spawn(app.world_mut(), 400.0, 600.0);
        MainLayer::enter(app.world_mut(), layer).unwrap();
        let item = {
            let world = app.world_mut();
            world
                .query_filtered::<Entity, With<Item>>()
                .iter(world)
                .next()
                .unwrap()
        };
        let item_count = {
            let world = app.world_mut();
            world.query_filtered::<Entity, With<Item>>().iter(world).count()
        };

        app.world_mut()
            .resource_mut::<Director>()
            .send_event(AppEvent::BodyTouchUp, item);
        app.update();

        assert!(app.world().get_entity(item).is_err());
        assert_eq!(
            *app.world().resource::<Scoreboard>(),
            Scoreboard {
                cleared: 1,
                flares: 1
            }
        );
        let world = app.world_mut();
        assert_eq!(
            world.query_filtered::<Entity, With<Item>>().iter(world).count(),
            item_count - 1
        );
        assert_eq!(world.query_filtered::<Entity, With<Flare>>().iter(world).count(), 1);
    }
}
