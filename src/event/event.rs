use bevy::prelude::*;

/// Event kinds carried through the director.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AppEvent {
    BodyTouchDown,
    BodyTouchDragged,
    BodyTouchUp,
    ItemClear,
    PointerFlare,
}

/// A tagged notification plus the actor it concerns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActorEvent {
    pub kind: AppEvent,
    pub actor: Entity,
}

impl ActorEvent {
    pub fn new(kind: AppEvent, actor: Entity) -> Self {
        Self { kind, actor }
    }
}

/// Signature the director stores per registered observer.
pub type ObserverFn = fn(&mut World, Entity, &ActorEvent) -> bool;

/// Capability of a layer component that reacts to director events.
///
/// Returning `true` marks the event handled and stops delivery to observers
/// registered after this one.
pub trait ActorEventObserver: Component {
    fn handle_event(world: &mut World, observer: Entity, event: &ActorEvent) -> bool;
}
