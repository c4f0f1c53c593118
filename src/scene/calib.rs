use crate::{
    core::{clamp01, Color},
    scene::{Scene, SceneContext},
    uniforms::Uniforms,
};

/// Wiring calibration pattern: each panel along the chosen axis lights one
/// of R/G/B, brightness ramps left to right, and rows blend toward white
/// bottom to top so flipped panels and reversed rows are obvious at a
/// glance. The top row renders as a solid white reference line.
pub struct Calibration {
    name: String,
}

impl Calibration {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

const PRESET_DEFAULTS: &[(&str, f64)] = &[
    ("PanelAxis", 2.0),
    ("FlipX", 0.0),
    ("FlipY", 0.0),
    ("FlipZ", 0.0),
    ("LRGamma", 1.4),
    ("TopWhitePow", 2.0),
    ("TopWhiteMix", 0.6),
    ("BaseIntensity", 0.17),
    ("RightFloor", 0.0),
    ("Saturation", 1.0),
    ("PreviewScale", 0.65),
];

impl Scene for Calibration {
    fn name(&self) -> &str {
        &self.name
    }

    fn presets(&self) -> &'static [&'static str] {
        &["PanelChanSweep"]
    }

    fn apply_preset(&mut self, preset: &str, uniforms: &mut Uniforms) {
        if preset == "PanelChanSweep" {
            uniforms.ensure_defaults(PRESET_DEFAULTS);
        }
    }

    fn render(&mut self, frame: &mut [Color], ctx: &SceneContext<'_>) {
        let (xn, yn, zn) = (ctx.dim.x, ctx.dim.y, ctx.dim.z);
        let u = ctx.uniforms;

        let panel_axis = u.param("PanelAxis", 2.0) as i32;
        let flip_x = u.truthy("FlipX");
        let flip_y = u.truthy("FlipY");
        let flip_z = u.truthy("FlipZ");
        let lr_pow = u.param("LRGamma", 1.2);
        let top_pow = u.param("TopWhitePow", 0.6);
        let top_mix = clamp01(u.param("TopWhiteMix", 1.0) as f32);
        let right_floor = clamp01(u.param("RightFloor", 0.0) as f32);
        let base_int = clamp01(u.param("BaseIntensity", 1.0) as f32);
        let sat = clamp01(u.param("Saturation", 1.0) as f32);
        let preview = u.preview();
        let preview_scale = clamp01(u.param("PreviewScale", 0.65) as f32);

        let norm = |i: usize, n: usize| -> f64 {
            if n <= 1 {
                0.0
            } else {
                i as f64 / (n - 1) as f64
            }
        };

        let mut i = 0;
        for z in 0..zn {
            for y in 0..yn {
                for x in 0..xn {
                    // Visual flips only; the linear index order is fixed.
                    let vx = if flip_x { xn - 1 - x } else { x };
                    let vy = if flip_y { yn - 1 - y } else { y };
                    let vz = if flip_z { zn - 1 - z } else { z };

                    let panel = match panel_axis {
                        0 => vx,
                        1 => vy,
                        _ => vz,
                    };
                    let mut c = match panel % 3 {
                        0 => Color::new(1.0, 0.0, 0.0),
                        1 => Color::new(0.0, 1.0, 0.0),
                        _ => Color::new(0.0, 0.0, 1.0),
                    };

                    // Left to right: darken with a power curve over a floor.
                    let nx = norm(vx, xn);
                    let lr = right_floor + (1.0 - right_floor) * (1.0 - nx.powf(lr_pow)) as f32;
                    c = c.scale(lr);

                    // Bottom to top: pull toward white.
                    let ny = norm(vy, yn);
                    let mut bt = ny.powf(top_pow) as f32;
                    if vy == yn - 1 {
                        bt = 1.0;
                    } else {
                        bt *= top_mix;
                    }
                    c.r += (1.0 - c.r) * bt;
                    c.g += (1.0 - c.g) * bt;
                    c.b += (1.0 - c.b) * bt;

                    c = c.saturate(sat).scale(base_int).clamped();

                    if preview {
                        c = c.scale(preview_scale).clamped();
                        if y == yn - 1 {
                            c = Color::new(1.0, 1.0, 1.0);
                        }
                    }

                    frame[i] = c;
                    i += 1;
                }
            }
        }
    }
}
