use std::collections::BTreeMap;
use std::collections::HashMap;

use glam::Vec3;

use crate::{
    core::{Color, Dimensions},
    error::{LumicubeError, LumicubeResult},
    uniforms::Uniforms,
};

pub mod calib;
pub mod gradient;
pub mod ocean;
pub mod solid;

/// External inputs a scene may sample (sensor feeds, baked voxel masks).
/// Empty by default; scenes must tolerate absence of everything here.
#[derive(Clone, Debug, Default)]
pub struct Resources {
    pub sensors: HashMap<String, f64>,
}

/// Read-only per-frame inputs handed to a scene's render call.
pub struct SceneContext<'a> {
    /// Normalized voxel positions, same length as the frame buffer.
    pub positions: &'a [Vec3],
    pub dim: Dimensions,
    /// Scene time in seconds (already scaled by the engine's time scale).
    pub t: f64,
    /// Frame-stable uniform snapshot.
    pub uniforms: &'a Uniforms,
    pub resources: &'a Resources,
}

/// A frame generator. Implementations write exactly `dim.count()` colors,
/// never read the destination's prior contents, and allocate nothing in
/// steady state once warmed up at a given dimension. Internal simulation
/// state (the ocean's height field) lives on the instance; instances are
/// exclusively owned by one engine slot at a time.
pub trait Scene: Send {
    fn name(&self) -> &str;

    fn presets(&self) -> &'static [&'static str];

    /// Select a named look: mutates scene-internal state and writes the
    /// preset's parameter defaults into `uniforms`. Unknown preset names
    /// are ignored; scenes always carry defaults.
    fn apply_preset(&mut self, preset: &str, uniforms: &mut Uniforms);

    fn render(&mut self, frame: &mut [Color], ctx: &SceneContext<'_>);
}

impl std::fmt::Debug for dyn Scene {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scene").field("name", &self.name()).finish()
    }
}

type SceneFactory = Box<dyn Fn() -> Box<dyn Scene> + Send + Sync>;

/// Named scene factories. The engine instantiates a fresh scene per slot so
/// stateful scenes are never shared across the active and armed slots.
#[derive(Default)]
pub struct Registry {
    factories: BTreeMap<String, SceneFactory>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<F>(&mut self, name: impl Into<String>, factory: F) -> LumicubeResult<()>
    where
        F: Fn() -> Box<dyn Scene> + Send + Sync + 'static,
    {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(LumicubeError::invalid_config("scene name must be non-empty"));
        }
        if self.factories.contains_key(&name) {
            return Err(LumicubeError::invalid_config(format!(
                "scene '{name}' is already registered"
            )));
        }
        self.factories.insert(name, Box::new(factory));
        Ok(())
    }

    pub fn create(&self, name: &str) -> LumicubeResult<Box<dyn Scene>> {
        let factory = self
            .factories
            .get(name)
            .ok_or_else(|| LumicubeError::not_found(format!("scene '{name}'")))?;
        Ok(factory())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    pub fn names(&self) -> Vec<String> {
        self.factories.keys().cloned().collect()
    }

    /// Presets advertised by a registered scene.
    pub fn presets(&self, name: &str) -> LumicubeResult<Vec<String>> {
        let scene = self.create(name)?;
        Ok(scene.presets().iter().map(|s| s.to_string()).collect())
    }
}

/// Registry preloaded with the built-in scenes under their canonical names.
pub fn default_registry() -> Registry {
    let mut reg = Registry::new();
    // Names are unique by construction here, so registration cannot fail.
    let _ = reg.register("solid", || {
        Box::new(solid::Solid::new("solid", Color::new(1.0, 0.0, 0.0)))
    });
    let _ = reg.register("grad", || Box::new(gradient::Gradient::new("grad")));
    let _ = reg.register("calib", || Box::new(calib::Calibration::new("calib")));
    let _ = reg.register("ocean", || Box::new(ocean::Ocean::new("ocean")));
    reg
}
