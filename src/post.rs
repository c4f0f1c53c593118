use crate::{
    core::{clamp01, Color},
    uniforms::{keys, Uniforms},
};

/// Tone stage run before the limiter. The preview path wants the full
/// filmic curve; the hardware path keeps the signal linear and only
/// applies exposure, leaving gamma to the strip's own response.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ToneStage {
    #[default]
    Filmic,
    ExposureOnly,
    None,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PostPipeline {
    pub tone: ToneStage,
    pub limiter: bool,
}

impl Default for PostPipeline {
    fn default() -> Self {
        Self::preview()
    }
}

impl PostPipeline {
    /// Exposure + ACES + gamma, no limiter unless forced on.
    pub fn preview() -> Self {
        Self {
            tone: ToneStage::Filmic,
            limiter: true,
        }
    }

    /// Linear exposure + power limiter + final clamp for LED output.
    pub fn hardware() -> Self {
        Self {
            tone: ToneStage::ExposureOnly,
            limiter: true,
        }
    }

    /// No-op pipeline for deterministic tests.
    pub fn disabled() -> Self {
        Self {
            tone: ToneStage::None,
            limiter: false,
        }
    }

    /// Run the configured stages over the frame. The limiter is skipped
    /// whenever the uniforms flag a preview/bypass mode.
    pub fn apply(&self, frame: &mut [Color], uniforms: &Uniforms) {
        match self.tone {
            ToneStage::Filmic => filmic_tone_map(frame, uniforms),
            ToneStage::ExposureOnly => exposure_scale(frame, uniforms),
            ToneStage::None => {}
        }
        if self.limiter && !uniforms.preview() {
            limit_power(frame, uniforms);
        }
        if self.tone == ToneStage::ExposureOnly {
            for c in frame.iter_mut() {
                *c = c.clamped();
            }
        }
    }
}

/// Exposure, approximate ACES, then inverse gamma. Output in [0,1].
pub fn filmic_tone_map(frame: &mut [Color], uniforms: &Uniforms) {
    let ev = uniforms.param(keys::EXPOSURE_EV, 0.0);
    let exposure = 2f64.powf(ev) as f32;
    let gamma = uniforms.param(keys::OUTPUT_GAMMA, 2.2);
    let inv_gamma = (if gamma > 0.0 { 1.0 / gamma } else { 1.0 / 2.2 }) as f32;

    let aces = |x: f32| -> f32 {
        const A: f32 = 2.51;
        const B: f32 = 0.03;
        const C: f32 = 2.43;
        const D: f32 = 0.59;
        const E: f32 = 0.14;
        clamp01((x * (A * x + B)) / (x * (C * x + D) + E))
    };

    for c in frame.iter_mut() {
        c.r = aces(c.r * exposure).powf(inv_gamma);
        c.g = aces(c.g * exposure).powf(inv_gamma);
        c.b = aces(c.b * exposure).powf(inv_gamma);
    }
}

/// Linear 2^EV gain without any curve.
pub fn exposure_scale(frame: &mut [Color], uniforms: &Uniforms) {
    let ev = uniforms.param(keys::EXPOSURE_EV, 0.0);
    if ev == 0.0 {
        return;
    }
    let scale = 2f64.powf(ev) as f32;
    for c in frame.iter_mut() {
        *c = c.scale(scale);
    }
}

/// Two-stage power-aware limiter.
///
/// Stage 1 caps each voxel's channel sum at `WhiteCap`. Stage 2 estimates
/// total current from the per-channel full-scale draw and scales the whole
/// frame to fit `Budget_mA`, softly from the knee up and hard above budget.
pub fn limit_power(frame: &mut [Color], uniforms: &Uniforms) {
    let white_cap = uniforms.param(keys::WHITE_CAP, 3.0) as f32;
    if white_cap > 0.0 {
        for c in frame.iter_mut() {
            let sum = c.sum();
            if sum > white_cap {
                *c = c.scale(white_cap / sum);
            }
        }
    }

    let budget = uniforms.param(keys::BUDGET_MA, 0.0);
    if budget <= 0.0 {
        return;
    }
    let chan_ma = uniforms.param(keys::LED_CHAN_MA, 20.0);
    if chan_ma <= 0.0 {
        return;
    }
    let knee = uniforms.param(keys::LIMITER_KNEE, 0.9).clamp(0.01, 0.99);

    let total: f64 = frame.iter().map(|c| c.sum() as f64).sum::<f64>() * chan_ma;
    if total <= knee * budget {
        return;
    }

    let hard = budget / total;
    let factor = if total >= budget {
        hard
    } else {
        // ratio runs [knee, 1] across the soft region; map linearly onto
        // a gain of [1, budget/total].
        let ratio = total / budget;
        let u = (ratio - knee) / (1.0 - knee);
        1.0 + u * (hard - 1.0)
    };
    let factor = factor as f32;

    for c in frame.iter_mut() {
        *c = c.scale(factor);
    }
}

/// Estimated total frame current in mA, same model as the limiter.
pub fn estimate_current_ma(frame: &[Color], chan_ma: f64) -> f64 {
    frame.iter().map(|c| c.sum() as f64).sum::<f64>() * chan_ma
}

#[cfg(test)]
mod tests {
    use super::*;

    fn uniforms_with(params: &[(&str, f64)]) -> Uniforms {
        let mut u = Uniforms::default();
        for &(k, v) in params {
            u.set_param(k, v);
        }
        u
    }

    #[test]
    fn budget_clamps_total_current() {
        let mut frame = vec![Color::new(1.0, 1.0, 1.0); 10];
        let u = uniforms_with(&[
            (keys::LED_CHAN_MA, 20.0),
            (keys::BUDGET_MA, 300.0),
            (keys::WHITE_CAP, 3.0),
            (keys::LIMITER_KNEE, 0.9),
        ]);
        // Pre-limit draw is 10 * 60 = 600 mA.
        limit_power(&mut frame, &u);
        let cur = estimate_current_ma(&frame, 20.0);
        assert!(cur <= 300.1, "expected <= 300 mA, got {cur:.2}");
        let sum: f32 = frame.iter().map(|c| c.sum()).sum();
        assert!(sum <= 15.001);
    }

    #[test]
    fn white_cap_scales_proportionally() {
        let mut frame = vec![Color::new(1.0, 1.0, 1.0)];
        let u = uniforms_with(&[(keys::WHITE_CAP, 1.5)]);
        limit_power(&mut frame, &u);
        let sum = frame[0].sum();
        assert!(sum <= 1.5001, "expected sum <= 1.5, got {sum}");
        assert!((frame[0].r - frame[0].g).abs() < 1e-6);
        assert!((frame[0].g - frame[0].b).abs() < 1e-6);
    }

    #[test]
    fn below_knee_is_untouched() {
        let mut frame = vec![Color::new(0.1, 0.1, 0.1); 4];
        let u = uniforms_with(&[(keys::LED_CHAN_MA, 20.0), (keys::BUDGET_MA, 1000.0)]);
        let before = frame.clone();
        limit_power(&mut frame, &u);
        assert_eq!(frame, before);
    }

    #[test]
    fn soft_region_stays_within_budget_and_is_continuous() {
        // total = 0.95 * budget: inside the soft region. The factor ramps
        // from 1 at the knee back to 1 at the budget line, never letting
        // the frame exceed the budget.
        let u = uniforms_with(&[
            (keys::LED_CHAN_MA, 1.0),
            (keys::BUDGET_MA, 3.0),
            (keys::LIMITER_KNEE, 0.9),
            (keys::WHITE_CAP, 3.0),
        ]);
        let mut frame = vec![Color::new(0.95, 0.95, 0.95)];
        limit_power(&mut frame, &u);
        let after = estimate_current_ma(&frame, 1.0);
        assert!(after <= 3.0 + 1e-6);
        assert!(after >= 0.95 * 3.0 - 1e-6);

        // Below the knee the limiter is a no-op.
        let mut below = vec![Color::new(0.75, 0.75, 0.75)];
        limit_power(&mut below, &u);
        assert_eq!(below[0], Color::new(0.75, 0.75, 0.75));
    }

    #[test]
    fn preview_mode_bypasses_limiter() {
        let mut frame = vec![Color::new(1.0, 1.0, 1.0)];
        let mut u = uniforms_with(&[(keys::WHITE_CAP, 1.0)]);
        u.set_param(keys::PREVIEW_MODE, 1.0);
        PostPipeline::hardware().apply(&mut frame, &u);
        assert_eq!(frame[0].sum(), 3.0);
    }

    #[test]
    fn filmic_maps_into_unit_range_and_zero_stays_zero() {
        let mut frame = vec![Color::new(4.0, 1.0, 0.0)];
        let u = uniforms_with(&[(keys::EXPOSURE_EV, 1.0)]);
        filmic_tone_map(&mut frame, &u);
        assert!(frame[0].r <= 1.0 && frame[0].r > frame[0].g);
        assert_eq!(frame[0].b, 0.0);
    }

    #[test]
    fn exposure_only_doubles_at_one_ev() {
        let mut frame = vec![Color::new(0.25, 0.1, 0.0)];
        let u = uniforms_with(&[(keys::EXPOSURE_EV, 1.0)]);
        exposure_scale(&mut frame, &u);
        assert!((frame[0].r - 0.5).abs() < 1e-6);
    }

    #[test]
    fn hardware_pipeline_clamps_output() {
        let mut frame = vec![Color::new(2.0, 0.5, 0.0)];
        let u = uniforms_with(&[(keys::EXPOSURE_EV, 0.0), (keys::WHITE_CAP, 3.0)]);
        PostPipeline::hardware().apply(&mut frame, &u);
        assert!(frame[0].r <= 1.0);
    }
}
