//! Pointer overlay: an indicator following the pointer and short-lived flares.

use bevy::prelude::*;

use crate::core::components::Layer;
use crate::core::config::PointerConfig;
use crate::core::resources::{PointerState, Scoreboard};
use crate::core::system::system_order::SceneReactSet;
use crate::event::{ActorEvent, ActorEventObserver, AppEvent};
use crate::layer::{layer_children, LayerHooks, ManagedLayer};

const LOG_TARGET: &str = "pointer";

const INDICATOR_COLOR: Color = Color::srgba(1.0, 1.0, 1.0, 0.6);
const OVERLAY_Z: f32 = 10.0;

#[derive(Component, Debug)]
pub struct PointerLayer {
    indicator: Entity,
    flare_duration: f32,
    flare_scale: f32,
}

#[derive(Component)]
pub struct PointerIndicator;

#[derive(Component, Debug)]
pub struct Flare {
    pub elapsed: f32,
    pub duration: f32,
    pub max_scale: f32,
}

impl PointerLayer {
    pub fn spawn(
        world: &mut World,
        parent: Entity,
        width: f32,
        height: f32,
        cfg: &PointerConfig,
    ) -> Entity {
        let layer = world
            .spawn((
                Name::new("PointerLayer"),
                Layer::new(width, height),
                LayerHooks::default()
                    .managed::<PointerLayer>()
                    .observing::<PointerLayer>(),
                Transform::default(),
                Visibility::default(),
                ChildOf(parent),
            ))
            .id();
        let indicator = world
            .spawn((
                Name::new("PointerIndicator"),
                PointerIndicator,
                Sprite::from_color(INDICATOR_COLOR, Vec2::splat(cfg.indicator_radius * 2.0)),
                Transform::from_xyz(0.0, 0.0, OVERLAY_Z),
                Visibility::Hidden,
                ChildOf(layer),
            ))
            .id();
        world.entity_mut(layer).insert(PointerLayer {
            indicator,
            flare_duration: cfg.flare_duration.max(f32::EPSILON),
            flare_scale: cfg.flare_scale,
        });
        layer
    }

    pub fn indicator(&self) -> Entity {
        self.indicator
    }
}

/// Scale and alpha of a flare `elapsed` seconds into its `duration`.
pub fn flare_progress(elapsed: f32, duration: f32, max_scale: f32) -> (f32, f32) {
    let t = if duration > 0.0 {
        (elapsed / duration).clamp(0.0, 1.0)
    } else {
        1.0
    };
    (1.0 + (max_scale - 1.0) * t, 1.0 - t)
}

fn flare_color(alpha: f32) -> Color {
    Color::srgba(1.0, 0.9, 0.5, alpha)
}

impl ActorEventObserver for PointerLayer {
    fn handle_event(world: &mut World, observer: Entity, event: &ActorEvent) -> bool {
        if event.kind != AppEvent::PointerFlare {
            return false;
        }
        let Some((duration, max_scale, size)) = world.get::<PointerLayer>(observer).map(|p| {
            (p.flare_duration, p.flare_scale, p.flare_scale.max(1.0) * 8.0)
        }) else {
            return false;
        };
        let at = world
            .get::<Transform>(event.actor)
            .map(|tf| tf.translation.truncate())
            .or_else(|| world.get_resource::<PointerState>().and_then(|p| p.position));
        let Some(at) = at else {
            debug!(target: LOG_TARGET, "flare for {} has no position", event.actor);
            return true;
        };
        world.spawn((
            Name::new("Flare"),
            Flare {
                elapsed: 0.0,
                duration,
                max_scale,
            },
            Sprite::from_color(flare_color(1.0), Vec2::splat(size)),
            Transform::from_translation(at.extend(OVERLAY_Z - 1.0)),
            ChildOf(observer),
        ));
        if let Some(mut score) = world.get_resource_mut::<Scoreboard>() {
            score.flares += 1;
        }
        true
    }
}

impl ManagedLayer for PointerLayer {
    fn cleanup_view(world: &mut World, layer: Entity) {
        let flares: Vec<Entity> = layer_children(world, layer)
            .into_iter()
            .filter(|e| world.get::<Flare>(*e).is_some())
            .collect();
        for flare in flares {
            world.despawn(flare);
        }
        let indicator = world.get::<PointerLayer>(layer).map(|p| p.indicator);
        if let Some(mut vis) = indicator.and_then(|e| world.get_mut::<Visibility>(e)) {
            *vis = Visibility::Hidden;
        }
    }
}

pub fn follow_pointer(
    pointer: Res<PointerState>,
    mut q: Query<(&mut Transform, &mut Visibility), With<PointerIndicator>>,
) {
    for (mut tf, mut vis) in &mut q {
        match pointer.position {
            Some(pos) => {
                tf.translation.x = pos.x;
                tf.translation.y = pos.y;
                *vis = Visibility::Inherited;
            }
            None => *vis = Visibility::Hidden,
        }
    }
}

pub fn animate_flares(
    time: Res<Time>,
    mut commands: Commands,
    mut q: Query<(Entity, &mut Flare, &mut Transform, &mut Sprite)>,
) {
    let dt = time.delta_secs();
    for (entity, mut flare, mut tf, mut sprite) in &mut q {
        flare.elapsed += dt;
        if flare.elapsed >= flare.duration {
            commands.entity(entity).despawn();
            continue;
        }
        let (scale, alpha) = flare_progress(flare.elapsed, flare.duration, flare.max_scale);
        tf.scale = Vec3::new(scale, scale, 1.0);
        sprite.color = flare_color(alpha);
    }
}

pub struct PointerLayerPlugin;

impl Plugin for PointerLayerPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<PointerState>()
            .init_resource::<Scoreboard>()
            .add_systems(Update, (follow_pointer, animate_flares).in_set(SceneReactSet));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn spawn_layer(world: &mut World) -> Entity {
        let root = world.spawn((Transform::default(), Visibility::default())).id();
        PointerLayer::spawn(world, root, 400.0, 600.0, &PointerConfig::default())
    }

    #[test]
    fn progress_grows_and_fades() {
        assert_eq!(flare_progress(0.0, 1.0, 4.0), (1.0, 1.0));
        assert_eq!(flare_progress(0.5, 1.0, 3.0), (2.0, 0.5));
        assert_eq!(flare_progress(2.0, 1.0, 3.0), (3.0, 0.0));
    }

    #[test]
    fn flare_spawns_at_actor() {
        let mut world = World::new();
        world.init_resource::<Scoreboard>();
        let layer = spawn_layer(&mut world);
        let actor = world.spawn(Transform::from_xyz(12.0, -4.0, 0.0)).id();

        assert!(PointerLayer::handle_event(
            &mut world,
            layer,
            &ActorEvent::new(AppEvent::PointerFlare, actor)
        ));
        assert!(!PointerLayer::handle_event(
            &mut world,
            layer,
            &ActorEvent::new(AppEvent::ItemClear, actor)
        ));
        let flares: Vec<Vec3> = world
            .query_filtered::<&Transform, With<Flare>>()
            .iter(&world)
            .map(|tf| tf.translation)
            .collect();
        assert_eq!(flares.len(), 1);
        assert_eq!(flares[0].truncate(), Vec2::new(12.0, -4.0));
        assert_eq!(world.resource::<Scoreboard>().flares, 1);
    }

    #[test]
    fn flares_expire() {
        let mut app = App::new();
        app.add_plugins(MinimalPlugins).add_plugins(PointerLayerPlugin);
        let layer = spawn_layer(app.world_mut());
        let actor = app.world_mut().spawn(Transform::default()).id();
        PointerLayer::handle_event(
            app.world_mut(),
            layer,
            &ActorEvent::new(AppEvent::PointerFlare, actor),
        );
        let flare = {
            let world = app.world_mut();
            world
                .query_filtered::<Entity, With<Flare>>()
                .iter(world)
                .next()
                .unwrap()
        };
        app.world_mut().get_mut::<Flare>(flare).unwrap().elapsed = 10.0;
        app.world_mut()
            .resource_mut::<Time>()
            .advance_by(Duration::from_millis(16));
        app.update();
        assert!(app.world().get_entity(flare).is_err());
    }

    #[test]
    fn cleanup_removes_flares_and_hides_indicator() {
        let mut world = World::new();
        let layer = spawn_layer(&mut world);
        let actor = world.spawn(Transform::default()).id();
        PointerLayer::handle_event(
            &mut world,
            layer,
            &ActorEvent::new(AppEvent::PointerFlare, actor),
        );
        let indicator = world.get::<PointerLayer>(layer).unwrap().indicator();
        *world.get_mut::<Visibility>(indicator).unwrap() = Visibility::Inherited;

        PointerLayer::cleanup_view(&mut world, layer);
        assert_eq!(
            world.query_filtered::<Entity, With<Flare>>().iter(&world).count(),
            0
        );
        assert_eq!(world.get::<Visibility>(indicator), Some(&Visibility::Hidden));
        assert_eq!(layer_children(&world, layer), vec![indicator]);
    }
}
