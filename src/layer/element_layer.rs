//! Element layer: labeled items and bumpers living in the physics world.
//!
//! Items are dynamic bodies carrying a [`LabeledSprite`]; bumpers are fixed bodies
//! that kick items away on contact. Clearing an item arrives through the director
//! as `ItemClear` and is applied by [`clear_items`] later in the frame, so other
//! observers handling the same touch still see the actor.

use bevy::prelude::*;
use bevy_rapier2d::prelude::*;
use rand::{rngs::StdRng, Rng, SeedableRng};

use crate::core::components::{Body, LabeledSprite, Layer};
use crate::core::config::ElementConfig;
use crate::core::resources::Scoreboard;
use crate::core::system::system_order::SceneReactSet;
use crate::event::{ActorEvent, ActorEventObserver, AppEvent};
use crate::layer::world_layer::{world_is_live, ContactListener};
use crate::layer::{layer_children, LayerHooks, ManagedLayer};

const LOG_TARGET: &str = "elements";

const GLOW_DECAY: f32 = 3.0; // glow units per second

const ITEM_PALETTE: [Color; 4] = [
    Color::srgb(0.95, 0.35, 0.35),
    Color::srgb(0.35, 0.8, 0.45),
    Color::srgb(0.35, 0.55, 0.95),
    Color::srgb(0.95, 0.8, 0.3),
];

#[derive(Component, Debug)]
pub struct ElementLayer {
    world: Entity,
    contact_listener: Entity,
    pixels_per_metre: f32,
    bumper_kick: f32,
}

/// Dynamic body the player can clear.
#[derive(Component)]
pub struct Item;

/// Fixed body that kicks items. `glow` fades from 1 after each hit.
#[derive(Component, Debug, Default)]
pub struct Bumper {
    pub glow: f32,
}

/// Item accepted for clearing; despawned by [`clear_items`].
#[derive(Component)]
pub struct Cleared;

impl ElementLayer {
    /// `bumper_kick` is in metres per second.
    pub fn new(world: Entity, pixels_per_metre: f32, contact_listener: Entity, bumper_kick: f32) -> Self {
        Self {
            world,
            contact_listener,
            pixels_per_metre,
            bumper_kick,
        }
    }

    pub fn world(&self) -> Entity {
        self.world
    }

    pub fn contact_listener(&self) -> Entity {
        self.contact_listener
    }

    /// Kick speed in pixels per second.
    pub fn kick_speed(&self) -> f32 {
        self.bumper_kick * self.pixels_per_metre
    }

    pub fn spawn(
        world: &mut World,
        parent: Entity,
        width: f32,
        height: f32,
        elements: ElementLayer,
        cfg: &ElementConfig,
    ) -> Entity {
        let ppm = elements.pixels_per_metre;
        let layer = world
            .spawn((
                Name::new("ElementLayer"),
                Layer::new(width, height),
                elements,
                LayerHooks::default()
                    .managed::<ElementLayer>()
                    .observing::<ElementLayer>(),
                Transform::default(),
                Visibility::default(),
                ChildOf(parent),
            ))
            .id();
        populate(world, layer, Vec2::new(width, height) * 0.5, ppm, cfg);
        layer
    }
}

fn populate(world: &mut World, layer: Entity, half: Vec2, ppm: f32, cfg: &ElementConfig) {
    let mut rng = StdRng::seed_from_u64(cfg.seed);
    let bumper_r = cfg.bumper_radius * ppm;
    let item_r = cfg.item_radius * ppm;
    // Bumpers sit in the lower two thirds, items drop in from the top band.
    for _ in 0..cfg.bumper_count {
        let pos = random_point(&mut rng, half, bumper_r, -half.y, half.y / 3.0);
        world.spawn((
            Name::new("Bumper"),
            Bumper::default(),
            Body(bumper_r),
            RigidBody::Fixed,
            Collider::ball(bumper_r),
            Restitution::coefficient(1.0),
            ActiveEvents::COLLISION_EVENTS,
            Sprite::from_color(bumper_color(0.0), Vec2::splat(bumper_r * 2.0)),
            Transform::from_translation(pos.extend(0.0)),
            ChildOf(layer),
        ));
    }
    for i in 0..cfg.item_count {
        let pos = random_point(&mut rng, half, item_r, half.y / 3.0, half.y);
        world.spawn((
            Name::new(format!("Item {i}")),
            Item,
            LabeledSprite::new(format!("item-{i}")),
            Body(item_r),
            RigidBody::Dynamic,
            Collider::ball(item_r),
            Restitution::coefficient(cfg.restitution),
            Velocity::zero(),
            ActiveEvents::COLLISION_EVENTS,
            Sprite::from_color(ITEM_PALETTE[i % ITEM_PALETTE.len()], Vec2::splat(item_r * 2.0)),
            Transform::from_translation(pos.extend(1.0)),
            ChildOf(layer),
        ));
    }
    info!(
        target: LOG_TARGET,
        "spawned {} item(s), {} bumper(s)", cfg.item_count, cfg.bumper_count
    );
}

fn random_point(rng: &mut StdRng, half: Vec2, radius: f32, y_min: f32, y_max: f32) -> Vec2 {
    let x_span = (half.x - radius).max(0.0);
    let lo = (y_min + radius).min(y_max - radius);
    let hi = (y_max - radius).max(lo);
    let x = if x_span > 0.0 { rng.gen_range(-x_span..=x_span) } else { 0.0 };
    let y = if hi > lo { rng.gen_range(lo..=hi) } else { lo };
    Vec2::new(x, y)
}

fn bumper_color(glow: f32) -> Color {
    let g = glow.clamp(0.0, 1.0);
    Color::srgb(0.45 + 0.55 * g, 0.45 + 0.4 * g, 0.55 - 0.25 * g)
}

/// Velocity change pushing an item at `item` directly away from a bumper at `bumper`.
pub fn bumper_kick(bumper: Vec2, item: Vec2, speed: f32) -> Vec2 {
    (item - bumper).try_normalize().unwrap_or(Vec2::Y) * speed
}

impl ActorEventObserver for ElementLayer {
    fn handle_event(world: &mut World, observer: Entity, event: &ActorEvent) -> bool {
        if event.kind != AppEvent::ItemClear {
            return false;
        }
        let owned = world
            .get::<ChildOf>(event.actor)
            .is_some_and(|c| c.parent() == observer);
        if !owned || world.get::<Item>(event.actor).is_none() {
            return false;
        }
        if world.get::<Cleared>(event.actor).is_none() {
            world.entity_mut(event.actor).insert(Cleared);
            debug!(target: LOG_TARGET, "item {} marked for clearing", event.actor);
        }
        true
    }
}

impl ManagedLayer for ElementLayer {
    fn cleanup_view(world: &mut World, layer: Entity) {
        let Some(physics_world) = world.get::<ElementLayer>(layer).map(|e| e.world) else {
            return;
        };
        if !world_is_live(world, physics_world) {
            error!(
                target: LOG_TARGET,
                "cleanup of {layer} after world {physics_world} was disposed; bodies left in place"
            );
            return;
        }
        let bodies = layer_children(world, layer);
        let count = bodies.len();
        for body in bodies {
            world.despawn(body);
        }
        info!(target: LOG_TARGET, "released {count} body(ies)");
    }
}

/// Applies bumper kicks for contacts collected by each layer's listener.
pub fn react_to_contacts(
    layers: Query<&ElementLayer>,
    mut listeners: Query<&mut ContactListener>,
    mut bumpers: Query<(&Transform, &mut Bumper)>,
    mut items: Query<(&Transform, &mut Velocity), (With<Item>, Without<Bumper>)>,
) {
    for layer in &layers {
        let Ok(mut listener) = listeners.get_mut(layer.contact_listener) else {
            continue;
        };
        for contact in listener.drain() {
            let (bumper_e, item_e) = if bumpers.contains(contact.a) {
                (contact.a, contact.b)
            } else if bumpers.contains(contact.b) {
                (contact.b, contact.a)
            } else {
                continue;
            };
            let Ok((item_tf, mut vel)) = items.get_mut(item_e) else {
                continue;
            };
            let Ok((bumper_tf, mut bumper)) = bumpers.get_mut(bumper_e) else {
                continue;
            };
            vel.linvel += bumper_kick(
                bumper_tf.translation.truncate(),
                item_tf.translation.truncate(),
                layer.kick_speed(),
            );
            bumper.glow = 1.0;
        }
    }
}

pub fn animate_bumpers(time: Res<Time>, mut q: Query<(&mut Bumper, &mut Sprite)>) {
    let decay = GLOW_DECAY * time.delta_secs();
    for (mut bumper, mut sprite) in &mut q {
        if bumper.glow <= 0.0 {
            continue;
        }
        bumper.glow = (bumper.glow - decay).max(0.0);
        sprite.color = bumper_color(bumper.glow);
    }
}

pub fn clear_items(
    mut commands: Commands,
    cleared: Query<(Entity, Option<&LabeledSprite>), (With<Item>, With<Cleared>)>,
    mut score: ResMut<Scoreboard>,
) {
    for (entity, label) in &cleared {
        commands.entity(entity).despawn();
        score.cleared += 1;
        info!(
            target: LOG_TARGET,
            "cleared {} (total {})",
            label.map_or("<unlabeled>", |l| l.label.as_str()),
            score.cleared
        );
    }
}

pub struct ElementLayerPlugin;

impl Plugin for ElementLayerPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<Scoreboard>().add_systems(
            Update,
            (react_to_contacts, animate_bumpers, clear_items).in_set(SceneReactSet),
        );
    }
}
