use std::collections::HashMap;

use glam::Vec3;

/// Well-known parameter keys consumed by the post pipeline and engine.
pub mod keys {
    pub const GLOBAL_BRIGHTNESS: &str = "GlobalBrightness";
    pub const TIME_SCALE: &str = "TimeScale";
    pub const EXPOSURE_EV: &str = "ExposureEV";
    pub const OUTPUT_GAMMA: &str = "OutputGamma";
    pub const WHITE_CAP: &str = "WhiteCap";
    pub const LED_CHAN_MA: &str = "LEDChan_mA";
    pub const BUDGET_MA: &str = "Budget_mA";
    pub const LIMITER_KNEE: &str = "LimiterKnee";
    pub const PREVIEW_MODE: &str = "PreviewMode";
    pub const PREVIEW_BYPASS: &str = "PreviewBypass";
}

/// Shared configuration snapshot visible to scenes and post-processing.
///
/// The engine deep-copies this at frame start so a scene never observes a
/// mid-tick mutation; every voxel of one frame reads the same view.
#[derive(Clone, Debug)]
pub struct Uniforms {
    pub global_brightness: f64,
    pub time_scale: f64,
    pub sun_dir: Vec3,
    pub moon_dir: Vec3,
    pub params: HashMap<String, f64>,
    pub flags: HashMap<String, bool>,
}

impl Default for Uniforms {
    fn default() -> Self {
        Self {
            global_brightness: 1.0,
            time_scale: 1.0,
            sun_dir: Vec3::new(0.0, 1.0, 0.0),
            moon_dir: Vec3::new(0.0, -1.0, 0.0),
            params: HashMap::new(),
            flags: HashMap::new(),
        }
    }
}

impl Uniforms {
    /// Numeric parameter with fallback. Unknown keys are legal and simply
    /// fall through to the default.
    pub fn param(&self, key: &str, default: f64) -> f64 {
        self.params.get(key).copied().unwrap_or(default)
    }

    pub fn flag(&self, key: &str, default: bool) -> bool {
        self.flags.get(key).copied().unwrap_or(default)
    }

    /// A key is truthy when its boolean flag is set, or its numeric
    /// parameter is >= 0.5.
    pub fn truthy(&self, key: &str) -> bool {
        self.flag(key, false) || self.param(key, 0.0) >= 0.5
    }

    pub fn preview(&self) -> bool {
        self.truthy(keys::PREVIEW_MODE) || self.truthy(keys::PREVIEW_BYPASS)
    }

    pub fn set_param(&mut self, key: impl Into<String>, value: f64) {
        self.params.insert(key.into(), value);
    }

    pub fn set_flag(&mut self, key: impl Into<String>, value: bool) {
        self.flags.insert(key.into(), value);
    }

    /// Write preset defaults without clobbering values the caller already
    /// set. Presets that want to force a value use `set_param` directly.
    pub fn ensure_defaults(&mut self, defaults: &[(&str, f64)]) {
        for &(key, value) in defaults {
            self.params.entry(key.to_string()).or_insert(value);
        }
    }

    /// Overwrite a table of parameters, as scene presets do when selecting
    /// a look.
    pub fn assign(&mut self, values: &[(&str, f64)]) {
        for &(key, value) in values {
            self.params.insert(key.to_string(), value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn param_falls_back_to_default() {
        let u = Uniforms::default();
        assert_eq!(u.param("Missing", 2.5), 2.5);
    }

    #[test]
    fn truthy_reads_flags_and_params() {
        let mut u = Uniforms::default();
        assert!(!u.truthy(keys::PREVIEW_MODE));
        u.set_param(keys::PREVIEW_MODE, 0.5);
        assert!(u.truthy(keys::PREVIEW_MODE));
        u.set_param(keys::PREVIEW_MODE, 0.0);
        assert!(!u.truthy(keys::PREVIEW_MODE));
        u.set_flag(keys::PREVIEW_MODE, true);
        assert!(u.truthy(keys::PREVIEW_MODE));
    }

    #[test]
    fn ensure_defaults_does_not_clobber() {
        let mut u = Uniforms::default();
        u.set_param("TideAmp", 0.9);
        u.ensure_defaults(&[("TideAmp", 0.2), ("Wind", 0.05)]);
        assert_eq!(u.param("TideAmp", 0.0), 0.9);
        assert_eq!(u.param("Wind", 0.0), 0.05);
    }

    #[test]
    fn assign_overwrites() {
        let mut u = Uniforms::default();
        u.set_param("Wind", 0.9);
        u.assign(&[("Wind", 0.35)]);
        assert_eq!(u.param("Wind", 0.0), 0.35);
    }

    #[test]
    fn clone_is_a_deep_snapshot() {
        let mut u = Uniforms::default();
        u.set_param("Speed", 0.1);
        let snap = u.clone();
        u.set_param("Speed", 9.0);
        assert_eq!(snap.param("Speed", 0.0), 0.1);
    }
}
