use bevy::prelude::*;
use serde::Deserialize;
use std::{fs, path::Path};

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct WindowConfig {
    pub width: f32,
    pub height: f32,
    pub title: String,
}
impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            width: 720.0,
            height: 1280.0,
            title: "Bumpers".into(),
        }
    }
}

/// World provider tuning. `pixels_per_metre` is the scale shared with the touch
/// and element layers.
#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct PhysicsConfig {
    pub pixels_per_metre: f32,
    pub gravity_y: f32,
    pub wall_thickness: f32,
    pub debug_render: bool,
}
impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            pixels_per_metre: 50.0,
            gravity_y: -9.8,
            wall_thickness: 20.0,
            debug_render: false,
        }
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct TouchConfig {
    /// Extra pick distance (pixels) added to a body's radius.
    pub pick_slop: f32,
    /// Pointer travel (pixels) before a grab counts as a drag.
    pub drag_threshold: f32,
    pub pull_strength: f32,
    /// Metres per second; converted with the world scale.
    pub max_drag_speed: f32,
}
impl Default for TouchConfig {
    fn default() -> Self {
        Self {
            pick_slop: 8.0,
            drag_threshold: 2.0,
            pull_strength: 12.0,
            max_drag_speed: 30.0,
        }
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct ElementConfig {
    pub item_count: usize,
    /// Metres.
    pub item_radius: f32,
    pub bumper_count: usize,
    /// Metres.
    pub bumper_radius: f32,
    /// Metres per second added to an item bouncing off a bumper.
    pub bumper_kick: f32,
    pub restitution: f32,
    pub seed: u64,
}
impl Default for ElementConfig {
    fn default() -> Self {
        Self {
            item_count: 12,
            item_radius: 0.4,
            bumper_count: 5,
            bumper_radius: 0.8,
            bumper_kick: 8.0,
            restitution: 0.6,
            seed: 0x5eed,
        }
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct PointerConfig {
    pub indicator_radius: f32,
    pub flare_duration: f32,
    pub flare_scale: f32,
}
impl Default for PointerConfig {
    fn default() -> Self {
        Self {
            indicator_radius: 14.0,
            flare_duration: 0.45,
            flare_scale: 4.0,
        }
    }
}

#[derive(Debug, Deserialize, Resource, Clone, Default, PartialEq)]
#[serde(default)]
pub struct GameConfig {
    pub window: WindowConfig,
    pub physics: PhysicsConfig,
    pub touch: TouchConfig,
    pub elements: ElementConfig,
    pub pointer: PointerConfig,
}

impl GameConfig {
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self, String> {
        let data = fs::read_to_string(&path).map_err(|e| format!("read config: {e}"))?;
        ron::from_str(&data).map_err(|e| format!("parse RON: {e}"))
    }

    pub fn load_or_default(path: impl AsRef<Path>) -> (Self, Option<String>) {
        match Self::load_from_file(&path) {
            Ok(cfg) => (cfg, None),
            Err(e) => (Self::default(), Some(e)),
        }
    }

    /// Merges every readable file in order (later files override earlier keys) and
    /// deserializes the result. Returns the config, the files used and any errors.
    pub fn load_layered<P, I>(paths: I) -> (Self, Vec<String>, Vec<String>)
    where
        P: AsRef<Path>,
        I: IntoIterator<Item = P>,
    {
        use ron::value::Value;
        fn merge_value(base: &mut Value, overlay: Value) {
            match (base, overlay) {
                (Value::Map(bm), Value::Map(om)) => {
                    for (k, v) in om.into_iter() {
                        let existing = bm.iter_mut().find(|(ek, _)| **ek == k).map(|(_, ev)| ev);
                        match existing {
                            Some(ev) => merge_value(ev, v),
                            None => {
                                bm.insert(k, v);
                            }
                        }
                    }
                }
                (b, o) => *b = o,
            }
        }
        let mut merged: Option<Value> = None;
        let mut used = Vec::new();
        let mut errors = Vec::new();
        for p in paths {
            let path_ref = p.as_ref();
            match fs::read_to_string(path_ref) {
                Ok(txt) => match ron::from_str::<Value>(&txt) {
                    Ok(val) => {
                        if let Some(cur) = &mut merged {
                            merge_value(cur, val);
                        } else {
                            merged = Some(val);
                        }
                        used.push(path_ref.display().to_string());
                    }
                    Err(e) => errors.push(format!("{}: parse error: {e}", path_ref.display())),
                },
                Err(e) => errors.push(format!("{}: read error: {e}", path_ref.display())),
            }
        }
        let Some(val) = merged else {
            return (GameConfig::default(), used, errors);
        };
        match val.into_rust::<GameConfig>() {
            Ok(cfg) => (cfg, used, errors),
            Err(e) => {
                errors.push(format!(
                    "failed to deserialize merged config; using defaults: {e}"
                ));
                (GameConfig::default(), used, errors)
            }
        }
    }

    pub fn validate(&self) -> Vec<String> {
        let mut w = Vec::new();
        if self.window.width <= 0.0 || self.window.height <= 0.0 {
            w.push("window dimensions must be > 0".into());
        }
        if self.physics.pixels_per_metre <= 0.0 {
            w.push(format!(
                "physics.pixels_per_metre {} must be > 0",
                self.physics.pixels_per_metre
            ));
        }
        if self.physics.gravity_y > 0.0 {
            w.push(format!(
                "physics.gravity_y is positive ({}); items will fall upwards",
                self.physics.gravity_y
            ));
        }
        if self.physics.wall_thickness <= 0.0 {
            w.push("physics.wall_thickness must be > 0".into());
        }
        if self.touch.pick_slop < 0.0 {
            w.push("touch.pick_slop negative -> bodies harder to pick than drawn".into());
        }
        if self.touch.max_drag_speed <= 0.0 {
            w.push("touch.max_drag_speed must be > 0".into());
        }
        if self.elements.item_count == 0 {
            w.push("elements.item_count is 0; nothing to clear".into());
        }
        if self.elements.item_radius <= 0.0 || self.elements.bumper_radius <= 0.0 {
            w.push("elements radii must be > 0".into());
        }
        if self.elements.bumper_kick < 0.0 {
            w.push("elements.bumper_kick negative -> bumpers pull items in".into());
        }
        if !(0.0..=1.5).contains(&self.elements.restitution) {
            w.push(format!(
                "elements.restitution {} outside recommended 0..1.5",
                self.elements.restitution
            ));
        }
        let min_side = self.window.width.min(self.window.height);
        let bumper_px = self.elements.bumper_radius * self.physics.pixels_per_metre;
        if bumper_px * 2.0 > min_side {
            w.push(format!(
                "bumper diameter {:.0}px exceeds the smaller window side {:.0}px",
                bumper_px * 2.0,
                min_side
            ));
        }
        if self.pointer.flare_duration <= 0.0 {
            w.push("pointer.flare_duration must be > 0".into());
        }
        w
    }
}
