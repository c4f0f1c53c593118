use std::f64::consts::TAU;

use crate::{
    core::Color,
    scene::{Scene, SceneContext},
    uniforms::Uniforms,
};

/// Spatial sine gradient along one axis, optionally rotating over time.
///
/// Params: `Axis` (0=X, 1=Y, 2=Z, default 2) and `Speed` (hue revolutions
/// per second, default 0).
pub struct Gradient {
    name: String,
}

impl Gradient {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl Scene for Gradient {
    fn name(&self) -> &str {
        &self.name
    }

    fn presets(&self) -> &'static [&'static str] {
        &["XZ", "XY", "YZ", "Rainbow"]
    }

    fn apply_preset(&mut self, preset: &str, uniforms: &mut Uniforms) {
        match preset {
            // Preset names describe the plane of variation; the param pins
            // the remaining axis.
            "XZ" => uniforms.set_param("Axis", 1.0),
            "XY" => uniforms.set_param("Axis", 2.0),
            "YZ" => uniforms.set_param("Axis", 0.0),
            "Rainbow" => uniforms.set_param("Speed", 0.1),
            _ => {}
        }
    }

    fn render(&mut self, frame: &mut [Color], ctx: &SceneContext<'_>) {
        let axis = ctx.uniforms.param("Axis", 2.0) as i32;
        let speed = ctx.uniforms.param("Speed", 0.0);
        let drift = ctx.t * TAU * speed;

        for (dst, p) in frame.iter_mut().zip(ctx.positions) {
            let coord = match axis {
                0 => p.x,
                1 => p.y,
                _ => p.z,
            };
            let phase = f64::from(coord) * TAU + drift;
            *dst = Color::new(
                (0.5 + 0.5 * phase.sin()) as f32,
                (0.5 + 0.5 * (phase + TAU / 3.0).sin()) as f32,
                (0.5 + 0.5 * (phase + 2.0 * TAU / 3.0).sin()) as f32,
            );
        }
    }
}
