use crate::{
    error::{LumicubeError, LumicubeResult},
    program::Program,
};

/// Playback state of the program walker.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PlayerState {
    #[default]
    Idle,
    Running,
    Paused,
}

/// Control hooks the sequencer drives into the render engine. A conductor
/// adapts these onto the engine and registry; tests record the calls.
pub trait EngineHooks {
    /// Hard cut to a scene/preset.
    fn set_renderer(&mut self, name: &str, preset: &str);
    /// Prepare a scene/preset for crossfade.
    fn arm_next(&mut self, name: &str, preset: &str);
    /// Mix weight of the armed scene, 0..1.
    fn set_crossfade(&mut self, alpha: f64);
    fn set_param(&mut self, name: &str, value: f64);
    fn set_bool(&mut self, name: &str, value: bool);
}

/// Walks a loaded program: snaps scenes at clip boundaries, evaluates
/// parameter envelopes each tick, and drives the crossfade alpha through
/// each clip's fade window.
pub struct Player {
    state: PlayerState,
    program: Option<Program>,
    now_s: f64,
    clip_index: usize,

    armed: bool,
    armed_index: Option<usize>,
    last_alpha: f64,
}

impl Default for Player {
    fn default() -> Self {
        Self::new()
    }
}

impl Player {
    pub fn new() -> Self {
        Self {
            state: PlayerState::Idle,
            program: None,
            now_s: 0.0,
            clip_index: 0,
            armed: false,
            armed_index: None,
            last_alpha: 0.0,
        }
    }

    pub fn state(&self) -> PlayerState {
        self.state
    }

    /// Position within the program, seconds.
    pub fn position(&self) -> f64 {
        self.now_s
    }

    pub fn clip_index(&self) -> usize {
        self.clip_index
    }

    /// Index of the clip armed for the upcoming crossfade, if any.
    pub fn armed_clip(&self) -> Option<usize> {
        self.armed_index
    }

    /// Replace the current program. Resets position and armed state; the
    /// player returns to Idle.
    pub fn load(&mut self, program: Program) -> LumicubeResult<()> {
        program.validate()?;
        self.program = Some(program);
        self.now_s = 0.0;
        self.clip_index = 0;
        self.state = PlayerState::Idle;
        self.armed = false;
        self.armed_index = None;
        self.last_alpha = 0.0;
        Ok(())
    }

    /// Begin playback and prime the first clip.
    pub fn start(&mut self, hooks: &mut dyn EngineHooks) -> LumicubeResult<()> {
        let program = self
            .program
            .as_ref()
            .ok_or_else(|| LumicubeError::state("no program loaded"))?;
        if self.state == PlayerState::Running {
            return Ok(());
        }
        self.state = PlayerState::Running;
        let clip = &program.clips[self.clip_index];
        hooks.set_renderer(&clip.renderer, &clip.preset);
        hooks.set_crossfade(0.0);
        Ok(())
    }

    pub fn pause(&mut self) {
        if self.state == PlayerState::Running {
            self.state = PlayerState::Paused;
        }
    }

    pub fn resume(&mut self) {
        if self.state == PlayerState::Paused {
            self.state = PlayerState::Running;
        }
    }

    /// Stop playback and rewind to the start of the program.
    pub fn stop(&mut self, hooks: &mut dyn EngineHooks) {
        self.state = PlayerState::Idle;
        self.now_s = 0.0;
        self.clip_index = 0;
        self.armed = false;
        self.armed_index = None;
        self.last_alpha = 0.0;
        hooks.set_crossfade(0.0);
    }

    /// Jump to absolute program time `t`, clamped into [0, total). Snaps
    /// the renderer to the clip under `t` and clears any armed fade.
    pub fn seek(&mut self, t: f64, hooks: &mut dyn EngineHooks) -> LumicubeResult<()> {
        let program = self
            .program
            .as_ref()
            .ok_or_else(|| LumicubeError::state("no program loaded"))?;

        let total = program.total_duration();
        let mut t = t.max(0.0);
        if total > 0.0 && t >= total {
            t = f64::from_bits(total.to_bits() - 1);
        }

        let mut acc = 0.0;
        let mut idx = 0;
        for (i, clip) in program.clips.iter().enumerate() {
            if t < acc + clip.duration_s {
                idx = i;
                break;
            }
            acc += clip.duration_s;
        }
        self.clip_index = idx;
        self.now_s = t;
        self.armed = false;
        self.armed_index = None;
        self.last_alpha = 0.0;

        let clip = &program.clips[self.clip_index];
        hooks.set_renderer(&clip.renderer, &clip.preset);
        hooks.set_crossfade(0.0);
        Ok(())
    }

    /// Advance by `dt` seconds and emit control hooks. Only active while
    /// Running with positive dt.
    pub fn tick(&mut self, dt: f64, hooks: &mut dyn EngineHooks) {
        if self.state != PlayerState::Running || dt <= 0.0 {
            return;
        }
        let Some(program) = self.program.as_ref() else {
            return;
        };
        self.now_s += dt;

        let clip_start: f64 = program.clips[..self.clip_index]
            .iter()
            .map(|c| c.duration_s)
            .sum();
        let local_t = self.now_s - clip_start;
        let clip = &program.clips[self.clip_index];

        for (name, env) in &clip.params {
            hooks.set_param(name, env.eval(local_t));
        }
        for (name, env) in &clip.bools {
            hooks.set_bool(name, env.eval_bool(local_t));
        }

        if clip.xfade_s > 0.0 {
            let remaining = clip.duration_s - local_t;
            if remaining >= 0.0 && remaining <= clip.xfade_s {
                let next_index = self.next_index(program);
                if !self.armed {
                    if let Some(ni) = next_index {
                        let next_clip = &program.clips[ni];
                        hooks.arm_next(&next_clip.renderer, &next_clip.preset);
                        self.armed = true;
                        self.armed_index = Some(ni);
                    }
                }
                let alpha = (1.0 - remaining / clip.xfade_s).clamp(0.0, 1.0);
                if self.armed && alpha != self.last_alpha {
                    hooks.set_crossfade(alpha);
                    self.last_alpha = alpha;
                }
            }
        }

        if local_t >= clip.duration_s {
            self.advance_clip(hooks);
        }
    }

    fn next_index(&self, program: &Program) -> Option<usize> {
        let ni = self.clip_index + 1;
        if ni < program.clips.len() {
            Some(ni)
        } else if program.looped {
            Some(0)
        } else {
            None
        }
    }

    fn advance_clip(&mut self, hooks: &mut dyn EngineHooks) {
        let Some(program) = self.program.as_ref() else {
            return;
        };
        let Some(next) = self.next_index(program) else {
            self.state = PlayerState::Idle;
            hooks.set_crossfade(0.0);
            return;
        };

        // Keep the program-relative clock aligned with the clip index. On a
        // loop wrap the clock rewinds by the full program length.
        if next == 0 {
            self.now_s -= program.total_duration();
        }

        self.clip_index = next;
        let clip = &program.clips[self.clip_index];
        hooks.set_renderer(&clip.renderer, &clip.preset);
        hooks.set_crossfade(0.0);
        self.armed = false;
        self.armed_index = None;
        self.last_alpha = 0.0;
    }
}
