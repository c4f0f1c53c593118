use std::f64::consts::TAU;

use crate::{
    core::Color,
    scene::{Scene, SceneContext},
    uniforms::Uniforms,
};

/// Fills the whole cube with one color. `PulseHz` modulates brightness as
/// a test hook for the parameter path.
pub struct Solid {
    name: String,
    color: Color,
}

impl Solid {
    pub fn new(name: impl Into<String>, color: Color) -> Self {
        Self {
            name: name.into(),
            color,
        }
    }
}

impl Scene for Solid {
    fn name(&self) -> &str {
        &self.name
    }

    fn presets(&self) -> &'static [&'static str] {
        &["Red", "Green", "Blue", "White", "Black"]
    }

    fn apply_preset(&mut self, preset: &str, _uniforms: &mut Uniforms) {
        match preset {
            "Red" => self.color = Color::new(1.0, 0.0, 0.0),
            "Green" => self.color = Color::new(0.0, 1.0, 0.0),
            "Blue" => self.color = Color::new(0.0, 0.0, 1.0),
            "White" => self.color = Color::new(1.0, 1.0, 1.0),
            "Black" => self.color = Color::new(0.0, 0.0, 0.0),
            _ => {}
        }
    }

    fn render(&mut self, frame: &mut [Color], ctx: &SceneContext<'_>) {
        let mut scale = 1.0f32;
        let hz = ctx.uniforms.param("PulseHz", 0.0);
        if hz > 0.0 {
            scale = (0.5 + 0.5 * (TAU * hz * ctx.t).sin()) as f32;
        }
        let c = self.color.scale(scale);
        frame.fill(c);
    }
}
