//! Director: the scene's publish/subscribe channel for actor events.
//!
//! Layers send events with [`Director::send_event`]; [`dispatch_actor_events`]
//! delivers them once per frame to registered [`ActorEventObserver`]s.

mod director;
mod event;

pub use director::*;
pub use event::*;

use bevy::prelude::*;

use crate::core::system::system_order::DispatchSet;

pub struct DirectorPlugin;

impl Plugin for DirectorPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<Director>()
            .add_systems(Update, dispatch_actor_events.in_set(DispatchSet));
    }
}
