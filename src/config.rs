use std::path::Path;

use crate::{
    core::Dimensions,
    error::{LumicubeError, LumicubeResult},
    layout::Serpentine,
    wire::ColorOrder,
};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DriverKind {
    Spi,
    Pwm,
    #[default]
    Preview,
    Sim,
}

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct PowerConfig {
    #[serde(default = "default_budget_ma")]
    pub budget_ma: f64,
    #[serde(default = "default_led_chan_ma")]
    pub led_chan_ma: f64,
    #[serde(default = "default_white_cap")]
    pub white_cap: f64,
    #[serde(default = "default_limiter_knee")]
    pub limiter_knee: f64,
}

impl Default for PowerConfig {
    fn default() -> Self {
        Self {
            budget_ma: default_budget_ma(),
            led_chan_ma: default_led_chan_ma(),
            white_cap: default_white_cap(),
            limiter_knee: default_limiter_knee(),
        }
    }
}

fn default_budget_ma() -> f64 {
    3000.0
}
fn default_led_chan_ma() -> f64 {
    20.0
}
fn default_white_cap() -> f64 {
    2.2
}
fn default_limiter_knee() -> f64 {
    0.9
}

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct SpiConfig {
    pub dev: String,
    #[serde(default = "default_spi_speed")]
    pub speed_hz: u32,
    #[serde(default = "default_reset_us")]
    pub reset_us: u32,
}

fn default_spi_speed() -> u32 {
    2_400_000
}
fn default_reset_us() -> u32 {
    300
}

/// Top-level runtime configuration: cube geometry, output driver, and
/// power limits. Loaded from JSON; everything not listed has a default.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct Config {
    #[serde(default)]
    pub driver: DriverKind,
    #[serde(default = "default_color_order")]
    pub color_order: String,
    #[serde(default = "default_brightness")]
    pub brightness: f64,
    #[serde(default = "default_fps")]
    pub fps: u32,

    pub dim: Dimensions,
    #[serde(default)]
    pub serpentine: Serpentine,
    #[serde(default)]
    pub pitch_mm: f64,
    #[serde(default)]
    pub panel_gap_mm: f64,

    #[serde(default)]
    pub power: PowerConfig,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spi: Option<SpiConfig>,
}

fn default_color_order() -> String {
    "GRB".to_string()
}
fn default_brightness() -> f64 {
    0.8
}
fn default_fps() -> u32 {
    60
}

impl Config {
    pub fn from_str(s: &str) -> LumicubeResult<Self> {
        let cfg: Config = serde_json::from_str(s)
            .map_err(|e| LumicubeError::invalid_config(format!("config json: {e}")))?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn from_path(path: impl AsRef<Path>) -> LumicubeResult<Self> {
        let path = path.as_ref();
        let s = std::fs::read_to_string(path)
            .map_err(|e| LumicubeError::io(format!("read '{}': {e}", path.display())))?;
        Self::from_str(&s)
    }

    pub fn validate(&self) -> LumicubeResult<()> {
        if self.dim.count() == 0 {
            return Err(LumicubeError::invalid_config(
                "dimensions must all be positive",
            ));
        }
        if self.fps == 0 {
            return Err(LumicubeError::invalid_config("fps must be > 0"));
        }
        ColorOrder::parse(&self.color_order)?;
        if !(0.0..=1.0).contains(&self.brightness) {
            return Err(LumicubeError::invalid_config(
                "brightness must be within [0, 1]",
            ));
        }
        if self.driver == DriverKind::Spi && self.spi.is_none() {
            return Err(LumicubeError::invalid_config(
                "spi driver selected but no spi block configured",
            ));
        }
        Ok(())
    }

    pub fn color_order(&self) -> ColorOrder {
        // Checked during validate; default order if called on an
        // unvalidated config.
        ColorOrder::parse(&self.color_order).unwrap_or_default()
    }
}
