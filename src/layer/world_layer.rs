//! Physics world provider: owns the arena, the world scale and the contact listener.
//!
//! Rapier runs as one shared simulation; a [`WorldLayer`] is the handle the rest of
//! the scene borrows. Disposing it tears the arena down and pauses the pipeline,
//! after which every consumer must treat the handle as dead.

use bevy::prelude::*;
use bevy_rapier2d::prelude::*;

use crate::core::components::Layer;
use crate::core::config::PhysicsConfig;
use crate::core::error::SceneError;
use crate::core::system::system_order::SceneReactSet;
use crate::layer::{LayerHooks, ManagedLayer};

const LOG_TARGET: &str = "world";

/// Pair of entities whose colliders started touching.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Contact {
    pub a: Entity,
    pub b: Entity,
}

impl Contact {
    /// The other side of the contact, if `e` takes part in it.
    pub fn other(&self, e: Entity) -> Option<Entity> {
        if self.a == e {
            Some(self.b)
        } else if self.b == e {
            Some(self.a)
        } else {
            None
        }
    }
}

/// Collects contact starts for the element layer to react to.
#[derive(Component, Debug, Default)]
pub struct ContactListener {
    contacts: Vec<Contact>,
    total: u64,
}

impl ContactListener {
    pub fn push(&mut self, contact: Contact) {
        self.contacts.push(contact);
        self.total += 1;
    }

    pub fn drain(&mut self) -> Vec<Contact> {
        std::mem::take(&mut self.contacts)
    }

    pub fn pending(&self) -> usize {
        self.contacts.len()
    }

    pub fn total(&self) -> u64 {
        self.total
    }

    pub fn clear(&mut self) {
        self.contacts.clear();
    }
}

#[derive(Component)]
pub struct ArenaWall;

#[derive(Component, Debug)]
pub struct WorldLayer {
    pixels_per_metre: f32,
    gravity: Vec2,
    walls: Vec<Entity>,
    disposed: bool,
}

impl WorldLayer {
    pub fn spawn(
        world: &mut World,
        parent: Entity,
        width: f32,
        height: f32,
        cfg: &PhysicsConfig,
    ) -> Entity {
        let pixels_per_metre = cfg.pixels_per_metre.max(f32::EPSILON);
        let gravity = Vec2::new(0.0, cfg.gravity_y * pixels_per_metre);
        let layer = world
            .spawn((
                Name::new("WorldLayer"),
                Layer::new(width, height),
                ContactListener::default(),
                LayerHooks::default().managed::<WorldLayer>(),
                Transform::default(),
                Visibility::default(),
                ChildOf(parent),
            ))
            .id();
        let walls = arena_walls(width, height, cfg.wall_thickness)
            .into_iter()
            .map(|(center, half)| {
                world
                    .spawn((
                        Name::new("ArenaWall"),
                        ArenaWall,
                        RigidBody::Fixed,
                        Collider::cuboid(half.x, half.y),
                        Transform::from_translation(center.extend(0.0)),
                        ChildOf(layer),
                    ))
                    .id()
            })
            .collect();
        world.entity_mut(layer).insert(WorldLayer {
            pixels_per_metre,
            gravity,
            walls,
            disposed: false,
        });
        set_pipelines(world, true, Some(gravity));
        info!(
            target: LOG_TARGET,
            "world created {width:.0}x{height:.0} at {pixels_per_metre} px/m"
        );
        layer
    }

    pub fn pixels_per_metre(&self) -> f32 {
        self.pixels_per_metre
    }

    pub fn gravity(&self) -> Vec2 {
        self.gravity
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    /// Release point of the physics world. Runs once; later calls fail.
    pub fn dispose(world: &mut World, layer: Entity) -> Result<(), SceneError> {
        let walls = {
            let Some(mut wl) = world.get_mut::<WorldLayer>(layer) else {
                return Err(SceneError::MissingLayer { layer });
            };
            if wl.disposed {
                return Err(SceneError::WorldDisposed { world: layer });
            }
            wl.disposed = true;
            std::mem::take(&mut wl.walls)
        };
        for wall in walls {
            world.despawn(wall);
        }
        if let Some(mut listener) = world.get_mut::<ContactListener>(layer) {
            listener.clear();
        }
        set_pipelines(world, false, None);
        info!(target: LOG_TARGET, "world {layer} disposed");
        Ok(())
    }
}

impl ManagedLayer for WorldLayer {
    fn cleanup_view(world: &mut World, layer: Entity) {
        if let Some(mut listener) = world.get_mut::<ContactListener>(layer) {
            let dropped = listener.pending();
            listener.clear();
            if dropped > 0 {
                debug!(target: LOG_TARGET, "dropped {dropped} unprocessed contact(s)");
            }
        }
    }
}

/// True while `world_entity` is a world layer that has not been disposed.
pub fn world_is_live(world: &World, world_entity: Entity) -> bool {
    world
        .get::<WorldLayer>(world_entity)
        .is_some_and(|wl| !wl.disposed)
}

/// Wall centres and half extents enclosing a `width × height` arena centred on the origin.
pub fn arena_walls(width: f32, height: f32, thickness: f32) -> [(Vec2, Vec2); 4] {
    let half_w = width * 0.5;
    let half_h = height * 0.5;
    let half_t = thickness.max(1.0) * 0.5;
    [
        (Vec2::new(0.0, -half_h - half_t), Vec2::new(half_w + 2.0 * half_t, half_t)),
        (Vec2::new(0.0, half_h + half_t), Vec2::new(half_w + 2.0 * half_t, half_t)),
        (Vec2::new(-half_w - half_t, 0.0), Vec2::new(half_t, half_h + 2.0 * half_t)),
        (Vec2::new(half_w + half_t, 0.0), Vec2::new(half_t, half_h + 2.0 * half_t)),
    ]
}

fn set_pipelines(world: &mut World, active: bool, gravity: Option<Vec2>) {
    let mut configs = world.query::<&mut RapierConfiguration>();
    for mut cfg in configs.iter_mut(world) {
        cfg.physics_pipeline_active = active;
        if let Some(g) = gravity {
            cfg.gravity = g;
        }
    }
}

/// Copies Rapier contact starts into every live world's listener.
pub fn listen_for_contacts(
    mut collisions: EventReader<CollisionEvent>,
    mut worlds: Query<(&WorldLayer, &mut ContactListener)>,
) {
    let started: Vec<Contact> = collisions
        .read()
        .filter_map(|ev| match ev {
            CollisionEvent::Started(a, b, _flags) => Some(Contact { a: *a, b: *b }),
            CollisionEvent::Stopped(..) => None,
        })
        .collect();
    if started.is_empty() {
        return;
    }
    for (wl, mut listener) in &mut worlds {
        if wl.disposed {
            continue;
        }
        for contact in &started {
            listener.push(*contact);
        }
    }
}

pub struct WorldLayerPlugin;

impl Plugin for WorldLayerPlugin {
    fn build(&self, app: &mut App) {
        app.add_event::<CollisionEvent>().add_systems(
            Update,
            listen_for_contacts.before(SceneReactSet),
        );
    }
}
