use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::{
    diag::{Diagnostic, Diagnostics},
    engine::Engine,
    error::{LumicubeError, LumicubeResult},
    program::Program,
    scene::Registry,
    sequencer::{EngineHooks, Player},
};

/// Cooperative cancellation for the render loop.
#[derive(Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }
}

/// Adapts sequencer hooks onto the engine. Hook failures (an unknown scene
/// in a program, say) must not stop the show, so they are logged and
/// counted instead of propagated.
struct ConductorHooks<'a> {
    engine: &'a mut Engine,
    registry: &'a Registry,
    diagnostics: &'a Diagnostics,
}

impl EngineHooks for ConductorHooks<'_> {
    fn set_renderer(&mut self, name: &str, preset: &str) {
        if let Err(e) = self.engine.set_renderer(name, preset, self.registry) {
            self.diagnostics.hook_error();
            tracing::warn!(scene = name, preset, "set_renderer failed: {e}");
        }
    }

    fn arm_next(&mut self, name: &str, preset: &str) {
        if let Err(e) = self.engine.arm_next(name, preset, self.registry) {
            self.diagnostics.hook_error();
            tracing::warn!(scene = name, preset, "arm_next failed: {e}");
        }
    }

    fn set_crossfade(&mut self, alpha: f64) {
        self.engine.set_crossfade(alpha);
    }

    fn set_param(&mut self, name: &str, value: f64) {
        self.engine.set_param(name, value);
    }

    fn set_bool(&mut self, name: &str, value: bool) {
        self.engine.set_bool(name, value);
    }
}

/// Owns the engine, registry, and sequencer, and runs the fixed-cadence
/// outer loop: sequencer tick, then render, then sleep to the deadline.
pub struct Conductor {
    pub engine: Engine,
    pub registry: Registry,
    pub player: Player,
    pub diagnostics: Arc<Diagnostics>,
    fps: u32,
}

impl Conductor {
    pub fn new(engine: Engine, registry: Registry, fps: u32) -> Self {
        Self {
            engine,
            registry,
            player: Player::new(),
            diagnostics: Diagnostics::shared(),
            fps: if fps == 0 { 60 } else { fps },
        }
    }

    pub fn load_program(&mut self, program: Program) -> LumicubeResult<()> {
        self.player.load(program)
    }

    pub fn start(&mut self) -> LumicubeResult<()> {
        let Self {
            engine,
            registry,
            player,
            diagnostics,
            ..
        } = self;
        player.start(&mut ConductorHooks {
            engine,
            registry,
            diagnostics,
        })
    }

    pub fn stop(&mut self) {
        let Self {
            engine,
            registry,
            player,
            diagnostics,
            ..
        } = self;
        player.stop(&mut ConductorHooks {
            engine,
            registry,
            diagnostics,
        });
    }

    /// One scheduler step: advance the timeline, then render. Exposed for
    /// tests and external loops; `run` calls this at the configured rate.
    pub fn step(&mut self, dt: f64) {
        let Self {
            engine,
            registry,
            player,
            diagnostics,
            ..
        } = self;
        player.tick(
            dt,
            &mut ConductorHooks {
                engine,
                registry,
                diagnostics,
            },
        );

        match engine.render_once(-1.0) {
            Ok(()) => diagnostics.frame_rendered(),
            Err(e) => {
                diagnostics.driver_error();
                tracing::warn!("frame write failed: {e}");
            }
        }
    }

    /// Run until cancelled. A driver write that overruns its tick does not
    /// queue work: the loop realigns on the next deadline and counts the
    /// skipped frames as dropped.
    pub fn run(&mut self, cancel: &CancelToken) {
        let period = Duration::from_secs_f64(1.0 / self.fps as f64);
        let dt = period.as_secs_f64();
        let mut deadline = Instant::now() + period;

        while !cancel.is_cancelled() {
            self.step(dt);

            let now = Instant::now();
            if now < deadline {
                std::thread::sleep(deadline - now);
                deadline += period;
            } else {
                let err = self.deadline_overrun(now.duration_since(deadline), period);
                Diagnostic::warning("tick.overrun", err.to_string()).emit();
                deadline = now + period;
            }
        }

        self.engine.shutdown();
        self.diagnostics.flush();
    }

    /// Classify a blown tick deadline. The overrun frames are dropped,
    /// never queued; the returned error carries the drop count so callers
    /// can match on the kind.
    fn deadline_overrun(&self, behind: Duration, period: Duration) -> LumicubeError {
        let missed = (behind.as_secs_f64() / period.as_secs_f64()) as u64 + 1;
        for _ in 0..missed {
            self.diagnostics.frame_dropped();
        }
        LumicubeError::transient(format!(
            "missed tick deadline by {:.1} ms, dropped {missed} frame(s)",
            behind.as_secs_f64() * 1000.0
        ))
    }

    /// Handle a named test-run request from the control surface. Unknown
    /// names emit a warning diagnostic and change nothing.
    pub fn run_test(&mut self, name: &str) {
        let switched = match name {
            "SolidRed" => self.switch_scene("solid", "Red"),
            "SolidWhite" => self.switch_scene("solid", "White"),
            "GradRainbow" => self.switch_scene("grad", "Rainbow"),
            "PanelChanSweep" => self.switch_scene("calib", "PanelChanSweep"),
            "OceanDawn" => self.switch_scene("ocean", "CalmDawn"),
            "OceanStorm" => self.switch_scene("ocean", "NightStorm"),
            "ProgramDemo" => {
                self.stop();
                if self.load_program(demo_program()).is_ok() {
                    let _ = self.start();
                }
                true
            }
            _ => {
                Diagnostic::warning("test.unknown", "unknown test request")
                    .with_evidence("name", name)
                    .emit();
                false
            }
        };
        if switched {
            tracing::info!(test = name, "test request applied");
        }
    }

    fn switch_scene(&mut self, scene: &str, preset: &str) -> bool {
        self.stop();
        match self.engine.set_renderer(scene, preset, &self.registry) {
            Ok(()) => true,
            Err(e) => {
                self.diagnostics.hook_error();
                tracing::warn!(scene, preset, "test switch failed: {e}");
                false
            }
        }
    }
}

/// The looping red/rainbow crossfade show used by the ProgramDemo request.
pub fn demo_program() -> Program {
    Program::from_str(
        r#"{
          "version": "seq.v1",
          "loop": true,
          "clips": [
            { "name": "Red", "renderer": "solid", "preset": "Red",
              "durationS": 3.0, "xFadeS": 1.0 },
            { "name": "Grad", "renderer": "grad", "preset": "Rainbow",
              "durationS": 3.0, "xFadeS": 1.0 }
          ]
        }"#,
    )
    .expect("demo program is valid")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        core::{Color, Dimensions},
        driver::fake::CaptureDriver,
        layout::build_position_lut,
        post::PostPipeline,
        scene::{default_registry, Resources},
        uniforms::Uniforms,
    };

    fn conductor() -> (Conductor, crate::driver::fake::CaptureHandle) {
        let dim = Dimensions::new(2, 2, 2).unwrap();
        let registry = default_registry();
        let driver = CaptureDriver::new();
        let handle = driver.handle();
        let scene = registry.create("solid").unwrap();
        let mut engine = Engine::new(
            dim,
            build_position_lut(dim),
            Box::new(driver),
            scene,
            Uniforms::default(),
            Resources::default(),
        )
        .unwrap();
        engine.set_post(PostPipeline::disabled());
        (Conductor::new(engine, registry, 60), handle)
    }

    #[test]
    fn step_ticks_and_renders() {
        let (mut c, handle) = conductor();
        c.load_program(demo_program()).unwrap();
        c.start().unwrap();
        c.step(1.0 / 60.0);
        assert_eq!(handle.frames_written(), 1);
        let frame = handle.last_frame();
        assert_eq!(frame.len(), 8);
        assert_eq!(frame[0], Color::new(1.0, 0.0, 0.0));
        assert_eq!(
            c.diagnostics
                .frames_rendered
                .load(std::sync::atomic::Ordering::Relaxed),
            1
        );
    }

    #[test]
    fn unknown_program_scene_is_nonfatal() {
        let (mut c, handle) = conductor();
        let prog = Program::from_str(
            r#"{ "version": "seq.v1",
                 "clips": [ { "name": "X", "renderer": "warp", "durationS": 1.0 } ] }"#,
        )
        .unwrap();
        c.load_program(prog).unwrap();
        c.start().unwrap();
        c.step(0.01);
        // The hook failed but the previous scene kept rendering.
        assert_eq!(handle.frames_written(), 1);
        assert_eq!(
            c.diagnostics
                .hook_errors
                .load(std::sync::atomic::Ordering::Relaxed),
            1
        );
    }

    #[test]
    fn unknown_test_request_changes_nothing() {
        let (mut c, handle) = conductor();
        c.run_test("FlubberSweep");
        c.step(0.01);
        // Still the default solid red scene.
        assert_eq!(handle.last_frame()[0], Color::new(1.0, 0.0, 0.0));
    }

    #[test]
    fn test_request_switches_scene() {
        let (mut c, handle) = conductor();
        c.run_test("SolidWhite");
        c.step(0.01);
        assert_eq!(handle.last_frame()[0], Color::new(1.0, 1.0, 1.0));
    }

    #[test]
    fn deadline_overrun_is_transient_and_drops_frames() {
        let (c, _handle) = conductor();
        // 40 ms behind a 16 ms period: the blown tick plus two more.
        let err = c.deadline_overrun(Duration::from_millis(40), Duration::from_millis(16));
        assert!(matches!(err, LumicubeError::Transient(_)));
        assert!(err.to_string().contains("missed tick deadline"));
        assert_eq!(
            c.diagnostics
                .frames_dropped
                .load(std::sync::atomic::Ordering::Relaxed),
            3
        );
    }

    #[test]
    fn run_exits_on_cancel() {
        let (mut c, _handle) = conductor();
        let cancel = CancelToken::new();
        cancel.cancel();
        c.run(&cancel);
        assert_eq!(
            c.diagnostics
                .frames_rendered
                .load(std::sync::atomic::Ordering::Relaxed),
            0
        );
    }
}
