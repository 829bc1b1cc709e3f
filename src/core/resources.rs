use bevy::prelude::*;

/// Running totals of gameplay side effects triggered through the director.
#[derive(Resource, Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Scoreboard {
    pub cleared: u32,
    pub flares: u32,
}

/// Pointer (first touch, else mouse) resolved into world space once per frame.
#[derive(Resource, Debug, Default, Clone, Copy, PartialEq)]
pub struct PointerState {
    pub position: Option<Vec2>,
    pub pressed: bool,
    pub just_pressed: bool,
    pub just_released: bool,
}

#[cfg(test)]
impl PointerState {
    pub fn press(at: Vec2) -> Self {
        Self {
            position: Some(at),
            pressed: true,
            just_pressed: true,
            just_released: false,
        }
    }

    pub fn hold(at: Vec2) -> Self {
        Self {
            position: Some(at),
            pressed: true,
            just_pressed: false,
            just_released: false,
        }
    }

    pub fn release(at: Vec2) -> Self {
        Self {
            position: Some(at),
            pressed: false,
            just_pressed: false,
            just_released: true,
        }
    }
}
