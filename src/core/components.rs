use bevy::prelude::*;

/// Scene-space extent of a layer node (pixels). Every layer in the composite carries one.
#[derive(Component, Debug, Clone, Copy, PartialEq)]
pub struct Layer {
    pub width: f32,
    pub height: f32,
}

impl Layer {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }
}

/// Actor carrying an identity used for gameplay item tracking.
#[derive(Component, Debug, Clone, PartialEq, Eq)]
pub struct LabeledSprite {
    pub label: String,
}

impl LabeledSprite {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
        }
    }
}

/// Pickable physics body. Radius in pixels, matching the collider.
#[derive(Component, Debug, Clone, Copy, Deref)]
pub struct Body(pub f32);
