//! Central system ordering labels to make the frame sequence explicit.
//! Stages (high-level):
//! 1. PointerSample (resolve mouse / touch into world space)
//! 2. TouchInput (touch layers turn pointer state into body events + drag)
//! 3. Dispatch (director delivers queued actor events to observers)
//! 4. SceneReact (layers apply the effects of handled events, contacts, animation)
//! 5. Rapier (handled by plugin)
use bevy::prelude::*;

#[derive(SystemSet, Debug, Hash, PartialEq, Eq, Clone)]
pub struct PointerSampleSet;

#[derive(SystemSet, Debug, Hash, PartialEq, Eq, Clone)]
pub struct TouchInputSet;

#[derive(SystemSet, Debug, Hash, PartialEq, Eq, Clone)]
pub struct DispatchSet;

#[derive(SystemSet, Debug, Hash, PartialEq, Eq, Clone)]
pub struct SceneReactSet;
