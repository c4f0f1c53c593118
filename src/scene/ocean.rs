use std::f64::consts::TAU;

use crate::{
    core::{clamp01, fract, Color},
    scene::{Scene, SceneContext},
    uniforms::Uniforms,
};

/// Simulated sea inside the cube: a damped 2-D wave equation over the XZ
/// footprint drives a waterline per column, with sky above it. The height
/// and velocity fields persist across frames and reseed when the cube
/// dimensions change.
pub struct Ocean {
    name: String,

    h: Vec<f64>,
    v: Vec<f64>,
    scratch: Vec<f64>,
    x: usize,
    z: usize,
    initialized: bool,
}

impl Ocean {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            h: Vec::new(),
            v: Vec::new(),
            scratch: Vec::new(),
            x: 0,
            z: 0,
            initialized: false,
        }
    }

    fn idx(&self, x: usize, z: usize) -> usize {
        z * self.x + x
    }

    fn ensure_fields(&mut self, x: usize, z: usize) {
        if self.initialized && self.x == x && self.z == z {
            return;
        }
        self.x = x;
        self.z = z;
        self.h = vec![0.0; x * z];
        self.v = vec![0.0; x * z];
        self.scratch = vec![0.0; x * z];
        seed_heights(&mut self.h, x, z);
        self.initialized = true;
    }

    fn step_sim(&mut self, dt: f64, c: f64, damping: f64, wind: f64, choppy: f64) {
        let (xn, zn) = (self.x, self.z);
        if xn * zn == 0 {
            return;
        }

        // Wave equation: laplacian of H accelerates V, then damp.
        for z in 0..zn {
            for x in 0..xn {
                let i = self.idx(x, z);
                let hc = self.h[i];
                let hl = self.h[self.idx(x.saturating_sub(1), z)];
                let hr = self.h[self.idx((x + 1).min(xn - 1), z)];
                let hd = self.h[self.idx(x, z.saturating_sub(1))];
                let hu = self.h[self.idx(x, (z + 1).min(zn - 1))];
                let lap = hl + hr + hd + hu - 4.0 * hc;
                self.v[i] += c * c * lap * dt;
                self.v[i] *= 1.0 - damping;
            }
        }

        // Wind chop: a fixed-phase ripple pushed into the velocity field.
        for z in 0..zn {
            for x in 0..xn {
                let i = self.idx(x, z);
                let phase = (0.11 * x as f64 + 0.13 * z as f64 + 1.7 * choppy).sin();
                self.v[i] += wind * 0.02 * phase;
            }
        }

        for i in 0..xn * zn {
            self.h[i] += self.v[i] * dt;
        }

        // Separable 1-4-1 smoothing, horizontal then vertical.
        for z in 0..zn {
            for x in 0..xn {
                let i = self.idx(x, z);
                let l = self.h[self.idx(x.saturating_sub(1), z)];
                let r = self.h[self.idx((x + 1).min(xn - 1), z)];
                self.scratch[i] = (l + 4.0 * self.h[i] + r) / 6.0;
            }
        }
        for z in 0..zn {
            for x in 0..xn {
                let i = self.idx(x, z);
                let d = self.scratch[self.idx(x, z.saturating_sub(1))];
                let u = self.scratch[self.idx(x, (z + 1).min(zn - 1))];
                self.h[i] = (d + 4.0 * self.scratch[i] + u) / 6.0;
            }
        }
    }

    fn remove_dc_and_clip(&mut self, h_max: f64) {
        let n = self.x * self.z;
        if n == 0 {
            return;
        }
        let mean = self.h.iter().sum::<f64>() / n as f64;
        for h in &mut self.h {
            *h = (*h - mean).clamp(-h_max, h_max);
        }
    }

    fn surface_height(&self, x: usize, z: usize, base_level: f64, y_max: f64, wave_amp: f64) -> f64 {
        let h = base_level + wave_amp * self.h[self.idx(x, z)];
        (h * (y_max - 1.0)).clamp(0.0, y_max - 1.0)
    }

    fn slope(&self, x: usize, z: usize) -> f64 {
        let hl = self.h[self.idx(x.saturating_sub(1), z)];
        let hr = self.h[self.idx((x + 1).min(self.x - 1), z)];
        let hd = self.h[self.idx(x, z.saturating_sub(1))];
        let hu = self.h[self.idx(x, (z + 1).min(self.z - 1))];
        (hr - hl).abs() + (hu - hd).abs()
    }

    fn foamy(&self, x: usize, z: usize, foaminess: f64) -> bool {
        self.slope(x, z) + self.v[self.idx(x, z)].abs() > 0.15 + 0.8 * (1.0 - foaminess)
    }
}

const PRESET_CALM_DAWN: &[(&str, f64)] = &[
    ("TideAmp", 0.2),
    ("TidePeriodS", 120.0),
    ("WaveSpeed", 0.9),
    ("Damping", 0.015),
    ("Wind", 0.05),
    ("Foaminess", 0.15),
    ("Choppiness", 0.35),
    ("SkySat", 0.9),
    ("DayPeriodS", 240.0),
    ("Storminess", 0.0),
    ("WaterHue", 0.58),
    ("WaterAbsorb", 0.20),
    ("BaseIntensity", 1.0),
    ("SkyCycleScale", 0.0),
];

const PRESET_SUNNY_DAY: &[(&str, f64)] = &[
    ("TideAmp", 0.25),
    ("TidePeriodS", 180.0),
    ("WaveSpeed", 1.2),
    ("Damping", 0.01),
    ("Wind", 0.1),
    ("Foaminess", 0.18),
    ("Choppiness", 0.5),
    ("SkySat", 1.0),
    ("DayPeriodS", 240.0),
    ("Storminess", 0.0),
    ("WaterHue", 0.55),
    ("WaterAbsorb", 0.15),
    ("BaseIntensity", 1.1),
    ("SkyCycleScale", 0.0),
];

const PRESET_SUNSET: &[(&str, f64)] = &[
    ("TideAmp", 0.22),
    ("TidePeriodS", 180.0),
    ("WaveSpeed", 1.0),
    ("Damping", 0.012),
    ("Wind", 0.08),
    ("Foaminess", 0.14),
    ("Choppiness", 0.45),
    ("SkySat", 1.1),
    ("DayPeriodS", 240.0),
    ("Storminess", 0.0),
    ("WaterHue", 0.53),
    ("WaterAbsorb", 0.18),
    ("BaseIntensity", 1.0),
    ("SkyCycleScale", 0.0),
];

const PRESET_NIGHT_STORM: &[(&str, f64)] = &[
    ("TideAmp", 0.3),
    ("TidePeriodS", 150.0),
    ("WaveSpeed", 1.3),
    ("Damping", 0.02),
    ("Wind", 0.35),
    ("Foaminess", 0.30),
    ("Choppiness", 0.8),
    ("SkySat", 0.7),
    ("DayPeriodS", 240.0),
    ("Storminess", 0.8),
    ("LightningRate", 0.15),
    ("WaterHue", 0.60),
    ("WaterAbsorb", 0.25),
    ("BaseIntensity", 1.0),
    ("SkyCycleScale", 0.0),
];

impl Scene for Ocean {
    fn name(&self) -> &str {
        &self.name
    }

    fn presets(&self) -> &'static [&'static str] {
        &["CalmDawn", "SunnyDay", "Sunset", "NightStorm"]
    }

    fn apply_preset(&mut self, preset: &str, uniforms: &mut Uniforms) {
        match preset {
            "CalmDawn" => uniforms.assign(PRESET_CALM_DAWN),
            "SunnyDay" => uniforms.assign(PRESET_SUNNY_DAY),
            "Sunset" => uniforms.assign(PRESET_SUNSET),
            "NightStorm" => uniforms.assign(PRESET_NIGHT_STORM),
            _ => {}
        }
    }

    fn render(&mut self, frame: &mut [Color], ctx: &SceneContext<'_>) {
        let (xn, yn, zn) = (ctx.dim.x, ctx.dim.y, ctx.dim.z);
        let u = ctx.uniforms;

        let time_scale = u.param("TimeScale", 1.0).max(0.0);
        let phase_t = ctx.t * time_scale;
        let sim_scale = time_scale.max(0.01);

        self.ensure_fields(xn, zn);

        let tide_amp = u.param("TideAmp", 0.22);
        let tide_period = u.param("TidePeriodS", 180.0);
        let wave_speed = u.param("WaveSpeed", 1.1);
        let damping = u.param("Damping", 0.012);
        let wind = u.param("Wind", 0.08);
        let foaminess = u.param("Foaminess", 0.18);
        let choppy = u.param("Choppiness", 0.45);
        let sky_sat = u.param("SkySat", 1.0);
        let day_period = u.param("DayPeriodS", 240.0);
        let storminess = u.param("Storminess", 0.0);
        let light_rate = u.param("LightningRate", 0.0);
        let water_hue = u.param("WaterHue", 0.56);
        let absorb = u.param("WaterAbsorb", 0.18);
        let base_i = u.param("BaseIntensity", 1.0) as f32;
        let sat = clamp01(u.param("Saturation", 1.0) as f32);
        let sea = u.param("SeaLevel", 0.45).clamp(0.0, 1.0);
        let wave_amp = u.param("WaveAmp", 0.10);
        let h_max = u.param("HMax", 0.35).clamp(0.0, 1.0);
        let flip_x = u.param("FlipX", 0.0) > 0.5;
        let flip_z = u.param("FlipZ", 1.0) > 0.5;

        // Fixed timestep keeps the integration stable regardless of the
        // host frame rate; only the chop phase tracks wall time.
        self.step_sim(0.016, wave_speed * sim_scale, damping, wind * sim_scale, choppy);
        self.remove_dc_and_clip(h_max);

        let tide = tide_amp * (TAU * phase_t / tide_period.max(1e-6)).sin();
        let base_level = (sea + tide).clamp(0.0, 1.0);

        let sky_cycle = u.param("SkyCycleScale", 0.0);
        let day_phase = if sky_cycle > 0.0 {
            ((ctx.t * sky_cycle) / day_period.max(1e-6)).rem_euclid(1.0)
        } else {
            0.0
        };
        let sun_elev = (TAU * day_phase).sin();

        let mut flash = 0.0;
        if storminess > 0.0 && light_rate > 0.0 {
            let p = fract((phase_t * 13.37).sin() * 43758.5453);
            if p < light_rate * 0.02 {
                flash = 1.0;
            }
        }

        let mut i = 0;
        for z in 0..zn {
            for y in 0..yn {
                for x in 0..xn {
                    let vx = if flip_x { xn - 1 - x } else { x };
                    let vz = if flip_z { zn - 1 - z } else { z };

                    let h = self.surface_height(vx, vz, base_level, yn as f64, wave_amp);
                    let c = if (y as f64) <= h + 0.25 {
                        let depth_n = ((h - y as f64) / 4.0).clamp(0.0, 1.0);
                        let mut c = Color::from_hsv(water_hue as f32, 0.85, 0.9);
                        c.g *= 1.0 - (absorb * 0.5 * depth_n) as f32;
                        c.r *= 1.0 - (absorb * 0.8 * depth_n) as f32;
                        c = c.saturate(sat);

                        let near_surf = (1.0 - (y as f64 - h).abs()).clamp(0.0, 1.0);
                        let spec =
                            0.3 * near_surf * (0.2 + 0.8 * sun_elev).clamp(0.0, 1.0);
                        c.r = clamp01(c.r + spec as f32);
                        c.g = clamp01(c.g + spec as f32);
                        c.b = clamp01(c.b + spec as f32);

                        if near_surf > 0.5 && self.foamy(vx, vz, foaminess) {
                            let lift = (0.8 * near_surf) as f32;
                            c.r = clamp01(c.r + lift);
                            c.g = clamp01(c.g + lift);
                            c.b = clamp01(c.b + lift);
                        }
                        c
                    } else {
                        let ynorm = if yn > 1 {
                            y as f64 / (yn - 1) as f64
                        } else {
                            0.0
                        };
                        let mut c = sky_gradient(ynorm, sun_elev, sky_sat as f32);
                        if flash > 0.0 {
                            c.r = clamp01(c.r + flash as f32);
                            c.g = clamp01(c.g + flash as f32);
                            c.b = clamp01(c.b + flash as f32);
                        }
                        c
                    };

                    frame[i] = c.scale(base_i).clamped();
                    i += 1;
                }
            }
        }
    }
}

/// Vertical sky blend between night, day, and dusk anchors driven by sun
/// elevation (-1 night .. 1 noon).
fn sky_gradient(y: f64, sun_elev: f64, sat: f32) -> Color {
    let day = ((sun_elev + 0.2) * 0.7).clamp(0.0, 1.0) as f32;
    let twilight = (1.0 - sun_elev.abs() * 1.8).clamp(0.0, 1.0) as f32;

    let night_top = Color::new(0.02, 0.04, 0.10);
    let night_bot = Color::new(0.05, 0.07, 0.12);
    let day_top = Color::new(0.30, 0.55, 1.00);
    let day_bot = Color::new(0.65, 0.80, 1.00);
    let dusk_top = Color::new(0.35, 0.20, 0.45);
    let dusk_bot = Color::new(1.00, 0.50, 0.20);

    let mut top = lerp(night_top, day_top, day);
    let mut bot = lerp(night_bot, day_bot, day);
    top = lerp(top, dusk_top, twilight * 0.35);
    bot = lerp(bot, dusk_bot, twilight * 0.35);

    let yf = y as f32;
    let c = Color::new(
        bot.r * (1.0 - yf) + top.r * yf,
        bot.g * (1.0 - yf) + top.g * yf,
        bot.b * (1.0 - yf) + top.b * yf,
    );
    c.saturate(sat).clamped()
}

fn lerp(a: Color, b: Color, t: f32) -> Color {
    Color::new(
        a.r + (b.r - a.r) * t,
        a.g + (b.g - a.g) * t,
        a.b + (b.b - a.b) * t,
    )
}

/// Low-amplitude deterministic bumps so the field is never dead flat.
fn seed_heights(h: &mut [f64], xn: usize, zn: usize) {
    for z in 0..zn {
        for x in 0..xn {
            let n = ((37 * x + 57 * z) as f64).sin() * 0.03
                + ((11 * x + 23 * z) as f64).sin() * 0.02;
            h[z * xn + x] = n;
        }
    }
}
