use std::sync::{Arc, RwLock};
use std::time::Instant;

use glam::Vec3;

use crate::{
    core::{Color, Dimensions, BLACK},
    driver::FrameSink,
    error::{LumicubeError, LumicubeResult},
    post::PostPipeline,
    scene::{Registry, Resources, Scene, SceneContext},
    uniforms::Uniforms,
};

/// Last-frame timings in microseconds.
#[derive(Clone, Copy, Debug, Default)]
pub struct FrameTiming {
    pub render_us: u64,
    pub post_us: u64,
    pub total_us: u64,
}

/// Cloneable control surface over the engine's active uniforms. Writers on
/// other threads share the same lock the render snapshot takes, so a value
/// written at tick T is visible to frame T+1 at the earliest and every
/// voxel of one frame sees one consistent view.
#[derive(Clone)]
pub struct EngineHandle {
    active: Arc<RwLock<Uniforms>>,
}

impl EngineHandle {
    pub fn set_param(&self, name: &str, value: f64) {
        if let Ok(mut u) = self.active.write() {
            u.set_param(name, value);
        }
    }

    pub fn set_bool(&self, name: &str, value: bool) {
        if let Ok(mut u) = self.active.write() {
            u.set_flag(name, value);
        }
    }

    pub fn snapshot(&self) -> Uniforms {
        self.active
            .read()
            .map(|u| u.clone())
            .unwrap_or_default()
    }
}

/// Renders frames from an active scene, optionally mixing in an armed next
/// scene during a crossfade, then applies post-processing and hands the
/// result to the driver.
pub struct Engine {
    dim: Dimensions,
    positions: Vec<Vec3>,
    driver: Box<dyn FrameSink>,
    resources: Resources,

    active: Box<dyn Scene>,
    next: Option<Box<dyn Scene>>,
    active_uniforms: Arc<RwLock<Uniforms>>,
    next_uniforms: Arc<RwLock<Option<Uniforms>>>,

    buf_a: Vec<Color>,
    buf_b: Vec<Color>,
    out: Vec<Color>,

    alpha: f64,
    fading: bool,

    started: Instant,
    post: PostPipeline,

    pub last: FrameTiming,
}

impl Engine {
    pub fn new(
        dim: Dimensions,
        positions: Vec<Vec3>,
        driver: Box<dyn FrameSink>,
        active: Box<dyn Scene>,
        uniforms: Uniforms,
        resources: Resources,
    ) -> LumicubeResult<Self> {
        let n = dim.count();
        if n == 0 {
            return Err(LumicubeError::invalid_config("dimensions have zero volume"));
        }
        if positions.len() != n {
            return Err(LumicubeError::invalid_config(format!(
                "position lut has {} entries, expected {n}",
                positions.len()
            )));
        }
        Ok(Self {
            dim,
            positions,
            driver,
            resources,
            active,
            next: None,
            active_uniforms: Arc::new(RwLock::new(uniforms)),
            next_uniforms: Arc::new(RwLock::new(None)),
            buf_a: vec![BLACK; n],
            buf_b: vec![BLACK; n],
            out: vec![BLACK; n],
            alpha: 0.0,
            fading: false,
            started: Instant::now(),
            post: PostPipeline::default(),
            last: FrameTiming::default(),
        })
    }

    pub fn dim(&self) -> Dimensions {
        self.dim
    }

    pub fn set_post(&mut self, post: PostPipeline) {
        self.post = post;
    }

    pub fn handle(&self) -> EngineHandle {
        EngineHandle {
            active: Arc::clone(&self.active_uniforms),
        }
    }

    /// Seconds since engine start, scaled by the active time scale.
    pub fn now(&self) -> f64 {
        let scale = self
            .active_uniforms
            .read()
            .map(|u| if u.time_scale != 0.0 { u.time_scale } else { 1.0 })
            .unwrap_or(1.0);
        self.started.elapsed().as_secs_f64() * scale
    }

    pub fn is_fading(&self) -> bool {
        self.fading
    }

    pub fn crossfade(&self) -> f64 {
        self.alpha
    }

    pub fn active_scene_name(&self) -> &str {
        self.active.name()
    }

    /// The mixed, post-processed frame written on the last render.
    pub fn output(&self) -> &[Color] {
        &self.out
    }

    pub fn snapshot_uniforms(&self) -> Uniforms {
        self.active_uniforms
            .read()
            .map(|u| u.clone())
            .unwrap_or_default()
    }

    fn snapshot_next_uniforms(&self) -> Option<Uniforms> {
        self.next_uniforms.read().ok().and_then(|u| u.clone())
    }

    /// Render one frame at absolute scene time `t` seconds; `t < 0` means
    /// "now". A crossfade that has reached alpha >= 1 promotes the armed
    /// scene here, after the old active produced its final frame; the
    /// promoted scene first renders on the following tick.
    pub fn render_once(&mut self, t: f64) -> LumicubeResult<()> {
        let t = if t < 0.0 { self.now() } else { t };
        let start = Instant::now();

        let u_active = self.snapshot_uniforms();
        let u_next = self.snapshot_next_uniforms();

        self.active.render(
            &mut self.buf_a,
            &SceneContext {
                positions: &self.positions,
                dim: self.dim,
                t,
                uniforms: &u_active,
                resources: &self.resources,
            },
        );

        if let Some(next) = self.next.as_mut() {
            if self.alpha > 0.0 && self.alpha < 1.0 {
                let u_next = u_next.unwrap_or_else(|| u_active.clone());
                next.render(
                    &mut self.buf_b,
                    &SceneContext {
                        positions: &self.positions,
                        dim: self.dim,
                        t,
                        uniforms: &u_next,
                        resources: &self.resources,
                    },
                );
                mix_into(&mut self.out, &self.buf_a, &self.buf_b, self.alpha);
            } else if self.alpha >= 1.0 {
                // Fade complete. Promotion waits until now (not inside
                // set_crossfade) so parameter writes racing the fade keep a
                // stable target slot.
                self.promote_next();
                self.out.copy_from_slice(&self.buf_a);
            } else {
                // alpha == 0: armed but the fade has not started.
                self.out.copy_from_slice(&self.buf_a);
            }
        } else {
            self.out.copy_from_slice(&self.buf_a);
        }

        let render_us = start.elapsed().as_micros() as u64;

        let post_start = Instant::now();
        self.post.apply(&mut self.out, &u_active);
        let post_us = post_start.elapsed().as_micros() as u64;

        self.driver.write(&self.out)?;

        self.last = FrameTiming {
            render_us,
            post_us,
            total_us: start.elapsed().as_micros() as u64,
        };
        Ok(())
    }

    fn promote_next(&mut self) {
        if let Some(next) = self.next.take() {
            self.active = next;
            if let (Ok(mut active_u), Ok(mut next_u)) =
                (self.active_uniforms.write(), self.next_uniforms.write())
            {
                if let Some(u) = next_u.take() {
                    *active_u = u;
                }
            }
            self.buf_b.fill(BLACK);
        }
        self.alpha = 0.0;
        self.fading = false;
    }

    /// Replace the active scene immediately (a hard cut). Clears any fade
    /// and disarms a pending next scene.
    pub fn set_renderer(
        &mut self,
        name: &str,
        preset: &str,
        registry: &Registry,
    ) -> LumicubeResult<()> {
        let mut scene = registry.create(name)?;
        if !preset.is_empty() {
            if let Ok(mut u) = self.active_uniforms.write() {
                scene.apply_preset(preset, &mut u);
            }
        }
        self.active = scene;
        self.next = None;
        if let Ok(mut u) = self.next_uniforms.write() {
            *u = None;
        }
        self.alpha = 0.0;
        self.fading = false;
        Ok(())
    }

    /// Arm the next scene for a crossfade. Next-slot uniforms start as a
    /// deep copy of the active ones so the armed scene inherits the current
    /// look before its preset applies.
    pub fn arm_next(
        &mut self,
        name: &str,
        preset: &str,
        registry: &Registry,
    ) -> LumicubeResult<()> {
        let mut scene = registry.create(name)?;
        if let Ok(mut next_u) = self.next_uniforms.write() {
            if next_u.is_none() {
                *next_u = Some(self.snapshot_uniforms());
            }
            if !preset.is_empty() {
                if let Some(u) = next_u.as_mut() {
                    scene.apply_preset(preset, u);
                }
            }
        }
        self.next = Some(scene);
        self.fading = true;
        Ok(())
    }

    /// Set the mix alpha, clamped to [0,1]. Without an armed next scene the
    /// call resets the fade instead. Reaching 1.0 does not promote here;
    /// promotion happens on the next render so in-flight parameter writes
    /// keep a stable target.
    pub fn set_crossfade(&mut self, alpha: f64) {
        let alpha = alpha.clamp(0.0, 1.0);
        if self.next.is_none() {
            self.alpha = 0.0;
            self.fading = false;
            return;
        }
        self.alpha = alpha;
        self.fading = alpha > 0.0 && alpha < 1.0;
    }

    pub fn set_param(&mut self, name: &str, value: f64) {
        if let Ok(mut u) = self.active_uniforms.write() {
            u.set_param(name, value);
        }
    }

    pub fn set_bool(&mut self, name: &str, value: bool) {
        if let Ok(mut u) = self.active_uniforms.write() {
            u.set_flag(name, value);
        }
    }

    /// Release the driver. Called once when the outer loop exits.
    pub fn shutdown(&mut self) {
        self.driver.shutdown();
    }
}

/// Per-voxel linear blend of two frames: dst = (1-alpha)*a + alpha*b.
pub fn mix_into(dst: &mut [Color], a: &[Color], b: &[Color], alpha: f64) {
    if alpha <= 0.0 {
        dst.copy_from_slice(a);
        return;
    }
    if alpha >= 1.0 {
        dst.copy_from_slice(b);
        return;
    }
    let bf = alpha as f32;
    let af = 1.0 - bf;
    for ((d, &ca), &cb) in dst.iter_mut().zip(a).zip(b) {
        d.r = ca.r * af + cb.r * bf;
        d.g = ca.g * af + cb.g * bf;
        d.b = ca.b * af + cb.b * bf;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mix_endpoints_copy_sources() {
        let a = vec![Color::new(1.0, 0.0, 0.0); 4];
        let b = vec![Color::new(0.0, 0.0, 1.0); 4];
        let mut dst = vec![BLACK; 4];
        mix_into(&mut dst, &a, &b, 0.0);
        assert_eq!(dst, a);
        mix_into(&mut dst, &a, &b, 1.0);
        assert_eq!(dst, b);
    }

    #[test]
    fn mix_midpoint_is_linear() {
        let a = vec![Color::new(1.0, 0.0, 0.0); 2];
        let b = vec![Color::new(0.0, 0.0, 1.0); 2];
        let mut dst = vec![BLACK; 2];
        mix_into(&mut dst, &a, &b, 0.5);
        assert!((dst[0].r - 0.5).abs() < 1e-6);
        assert_eq!(dst[0].g, 0.0);
        assert!((dst[0].b - 0.5).abs() < 1e-6);
    }

    #[test]
    fn mix_is_componentwise_linear_for_any_alpha() {
        let a = vec![Color::new(0.2, 0.4, 0.8)];
        let b = vec![Color::new(0.9, 0.1, 0.3)];
        let mut dst = vec![BLACK];
        for alpha in [0.1, 0.25, 0.6, 0.99] {
            mix_into(&mut dst, &a, &b, alpha);
            let af = 1.0 - alpha as f32;
            let bf = alpha as f32;
            assert_eq!(dst[0].r, a[0].r * af + b[0].r * bf);
            assert_eq!(dst[0].g, a[0].g * af + b[0].g * bf);
            assert_eq!(dst[0].b, a[0].b * af + b[0].b * bf);
        }
    }
}
