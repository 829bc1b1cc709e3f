//! Layer nodes composing the play scene and the capabilities they declare.
//!
//! A layer is an entity carrying [`Layer`](crate::core::components::Layer). Which
//! lifecycle hooks it supports is declared explicitly through [`LayerHooks`]
//! rather than discovered from its concrete type.

pub mod element_layer;
pub mod main_layer;
pub mod pointer_layer;
pub mod touch_layer;
pub mod world_layer;

use bevy::prelude::*;

use crate::event::{ActorEventObserver, ObserverFn};

pub type CleanupFn = fn(&mut World, Entity);

/// Capability of a layer that owns resources needing explicit release before the
/// physics world goes away.
pub trait ManagedLayer: Component {
    fn cleanup_view(world: &mut World, layer: Entity);
}

/// Capabilities a layer node conforms to.
#[derive(Component, Clone, Copy, Default)]
pub struct LayerHooks {
    observer: Option<ObserverFn>,
    cleanup: Option<CleanupFn>,
}

impl LayerHooks {
    pub fn managed<T: ManagedLayer>(mut self) -> Self {
        self.cleanup = Some(T::cleanup_view);
        self
    }

    pub fn observing<T: ActorEventObserver>(mut self) -> Self {
        self.observer = Some(T::handle_event);
        self
    }

    pub fn observer(&self) -> Option<ObserverFn> {
        self.observer
    }

    pub fn cleanup(&self) -> Option<CleanupFn> {
        self.cleanup
    }
}

/// Children of a layer in insertion order.
pub fn layer_children(world: &World, layer: Entity) -> Vec<Entity> {
    world
        .get::<Children>(layer)
        .map(|children| children.to_vec())
        .unwrap_or_default()
}
