//! Touch input layer: turns pointer state into body touch events and drags the
//! grabbed body toward the pointer.

use bevy::prelude::*;
use bevy_rapier2d::prelude::Velocity;

use crate::core::components::{Body, Layer};
use crate::core::config::TouchConfig;
use crate::core::resources::PointerState;
use crate::core::system::system_order::{PointerSampleSet, TouchInputSet};
use crate::event::{ActorEvent, AppEvent, Director};
use crate::layer::world_layer::WorldLayer;
use crate::layer::{LayerHooks, ManagedLayer};

const LOG_TARGET: &str = "touch";

const DIST_EPS: f32 = 1e-4; // distance squared epsilon for tie-breaking

#[derive(Component, Debug)]
pub struct TouchLayer {
    world: Entity,
    pixels_per_metre: f32,
    send_touch_down: bool,
    send_touch_dragged: bool,
    send_touch_up: bool,
    pick_slop: f32,
    drag_threshold: f32,
    pull_strength: f32,
    max_drag_speed: f32,
    grabbed: Option<Entity>,
    last_pos: Option<Vec2>,
}

impl TouchLayer {
    /// Broadcasting starts disabled for every event kind.
    pub fn new(world: Entity, pixels_per_metre: f32, cfg: &TouchConfig) -> Self {
        Self {
            world,
            pixels_per_metre,
            send_touch_down: false,
            send_touch_dragged: false,
            send_touch_up: false,
            pick_slop: cfg.pick_slop,
            drag_threshold: cfg.drag_threshold,
            pull_strength: cfg.pull_strength,
            max_drag_speed: cfg.max_drag_speed,
            grabbed: None,
            last_pos: None,
        }
    }

    pub fn spawn(
        world: &mut World,
        parent: Entity,
        width: f32,
        height: f32,
        touch: TouchLayer,
    ) -> Entity {
        world
            .spawn((
                Name::new("TouchLayer"),
                Layer::new(width, height),
                touch,
                LayerHooks::default().managed::<TouchLayer>(),
                Transform::default(),
                Visibility::default(),
                ChildOf(parent),
            ))
            .id()
    }

    pub fn world(&self) -> Entity {
        self.world
    }

    pub fn pixels_per_metre(&self) -> f32 {
        self.pixels_per_metre
    }

    pub fn set_send_touch_down(&mut self, send: bool) {
        self.send_touch_down = send;
    }

    pub fn set_send_touch_dragged(&mut self, send: bool) {
        self.send_touch_dragged = send;
    }

    pub fn set_send_touch_up(&mut self, send: bool) {
        self.send_touch_up = send;
    }

    pub fn sends_touch_down(&self) -> bool {
        self.send_touch_down
    }

    pub fn sends_touch_dragged(&self) -> bool {
        self.send_touch_dragged
    }

    pub fn sends_touch_up(&self) -> bool {
        self.send_touch_up
    }

    pub fn grabbed(&self) -> Option<Entity> {
        self.grabbed
    }

    fn release(&mut self) -> Option<Entity> {
        self.last_pos = None;
        self.grabbed.take()
    }

    /// Advances the grab state for one pointer sample and returns the events to
    /// broadcast. `pick` is consulted only when a press starts a new grab.
    pub fn process(
        &mut self,
        pointer: &PointerState,
        pick: impl FnOnce(Vec2) -> Option<Entity>,
    ) -> Vec<ActorEvent> {
        let mut out = Vec::new();
        if pointer.just_pressed && self.grabbed.is_none() {
            if let Some(body) = pointer.position.and_then(pick) {
                self.grabbed = Some(body);
                self.last_pos = pointer.position;
                if self.send_touch_down {
                    out.push(ActorEvent::new(AppEvent::BodyTouchDown, body));
                }
            }
        } else if pointer.pressed {
            if let (Some(body), Some(pos), Some(last)) =
                (self.grabbed, pointer.position, self.last_pos)
            {
                if pos.distance(last) > self.drag_threshold {
                    self.last_pos = Some(pos);
                    if self.send_touch_dragged {
                        out.push(ActorEvent::new(AppEvent::BodyTouchDragged, body));
                    }
                }
            }
        }
        if pointer.just_released {
            if let Some(body) = self.release() {
                if self.send_touch_up {
                    out.push(ActorEvent::new(AppEvent::BodyTouchUp, body));
                }
            }
        }
        out
    }
}

impl ManagedLayer for TouchLayer {
    fn cleanup_view(world: &mut World, layer: Entity) {
        if let Some(mut touch) = world.get_mut::<TouchLayer>(layer) {
            if let Some(body) = touch.release() {
                debug!(target: LOG_TARGET, "released grab on {body} during cleanup");
            }
        }
    }
}

/// Nearest body whose radius (plus `slop`) covers `at`. Ties go to the lower entity index.
pub fn pick_body<I>(at: Vec2, slop: f32, bodies: I) -> Option<Entity>
where
    I: IntoIterator<Item = (Entity, Vec2, f32)>,
{
    let mut best: Option<(Entity, f32)> = None;
    for (entity, pos, radius) in bodies {
        let d2 = pos.distance_squared(at);
        if !d2.is_finite() {
            continue;
        }
        let reach = (radius + slop).max(0.0);
        if d2 > reach * reach {
            continue;
        }
        let replace = match best {
            None => true,
            Some((best_entity, best_d2)) => {
                d2 + DIST_EPS < best_d2
                    || ((d2 - best_d2).abs() <= DIST_EPS && entity.index() < best_entity.index())
            }
        };
        if replace {
            best = Some((entity, d2));
        }
    }
    best.map(|(e, _)| e)
}

/// Velocity steering a body at `from` toward `to`, capped at `max_speed` (px/s).
pub fn drag_velocity(from: Vec2, to: Vec2, pull_strength: f32, max_speed: f32) -> Vec2 {
    let desired = (to - from) * pull_strength;
    if max_speed > 0.0 {
        desired.clamp_length_max(max_speed)
    } else {
        desired
    }
}

fn cursor_world_pos(camera_q: &Query<(&Camera, &GlobalTransform)>, screen_pos: Vec2) -> Option<Vec2> {
    let (camera, cam_tf) = camera_q.iter().next()?;
    camera.viewport_to_world_2d(cam_tf, screen_pos).ok()
}

/// Resolves the primary pointer (first touch, else mouse) into [`PointerState`].
pub fn sample_pointer(
    buttons: Option<Res<ButtonInput<MouseButton>>>,
    touches: Option<Res<Touches>>,
    windows_q: Query<&Window>,
    camera_q: Query<(&Camera, &GlobalTransform)>,
    mut state: ResMut<PointerState>,
) {
    let mouse = buttons.as_deref();
    let touches = touches.as_deref();
    let touch_pos = touches.and_then(|t| {
        t.iter()
            .next()
            .or_else(|| t.iter_just_released().next())
            .map(|touch| touch.position())
    });
    let just_pressed = mouse.is_some_and(|b| b.just_pressed(MouseButton::Left))
        || touches.is_some_and(|t| t.iter_just_pressed().next().is_some());
    let just_released = mouse.is_some_and(|b| b.just_released(MouseButton::Left))
        || touches.is_some_and(|t| t.iter_just_released().next().is_some());
    let pressed = mouse.is_some_and(|b| b.pressed(MouseButton::Left))
        || touches.is_some_and(|t| t.iter().next().is_some());
    let screen = touch_pos.or_else(|| windows_q.iter().next().and_then(Window::cursor_position));
    *state = PointerState {
        position: screen.and_then(|p| cursor_world_pos(&camera_q, p)),
        pressed,
        just_pressed,
        just_released,
    };
}

/// Feeds pointer state to every touch layer and broadcasts what they report.
pub fn drive_touch_layers(
    pointer: Res<PointerState>,
    mut layers: Query<&mut TouchLayer>,
    worlds: Query<&WorldLayer>,
    bodies: Query<(Entity, &Transform, &Body)>,
    mut director: ResMut<Director>,
) {
    for mut touch in &mut layers {
        let live = worlds.get(touch.world).is_ok_and(|w| !w.is_disposed());
        if !live {
            touch.release();
            continue;
        }
        let slop = touch.pick_slop;
        let events = touch.process(&pointer, |at| {
            pick_body(
                at,
                slop,
                bodies
                    .iter()
                    .map(|(e, tf, body)| (e, tf.translation.truncate(), body.0)),
            )
        });
        for ev in events {
            debug!(target: LOG_TARGET, "{:?} on {}", ev.kind, ev.actor);
            director.send_event(ev.kind, ev.actor);
        }
    }
}

/// Steers grabbed dynamic bodies toward the pointer.
pub fn apply_drag(
    pointer: Res<PointerState>,
    layers: Query<&TouchLayer>,
    mut bodies: Query<(&Transform, &mut Velocity), With<Body>>,
) {
    let Some(target) = pointer.position else {
        return;
    };
    for touch in &layers {
        let Some(grabbed) = touch.grabbed else {
            continue;
        };
        let Ok((tf, mut vel)) = bodies.get_mut(grabbed) else {
            continue;
        };
        let max_speed = touch.max_drag_speed * touch.pixels_per_metre;
        vel.linvel = drag_velocity(
            tf.translation.truncate(),
            target,
            touch.pull_strength,
            max_speed,
        );
    }
}

pub struct TouchLayerPlugin;

impl Plugin for TouchLayerPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<PointerState>()
            .add_systems(Update, sample_pointer.in_set(PointerSampleSet))
            .add_systems(
                Update,
                (drive_touch_layers, apply_drag.after(drive_touch_layers)).in_set(TouchInputSet),
            );
    }
}
