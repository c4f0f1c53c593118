#![forbid(unsafe_code)]

mod conductor;
mod config;
mod core;
mod diag;
mod driver;
mod engine;
mod envelope;
mod error;
mod layout;
mod post;
mod program;
mod scene;
mod sequencer;
mod uniforms;
mod wire;

pub use conductor::{demo_program, CancelToken, Conductor};
pub use config::{Config, DriverKind, PowerConfig, SpiConfig};
pub use crate::core::{clamp01, Color, Dimensions, BLACK};
pub use diag::{Diagnostic, Diagnostics, Severity};
pub use driver::fake::{CaptureDriver, CaptureHandle};
pub use driver::preview::{LogPreviewSink, PreviewDriver, PreviewSink};
#[cfg(target_os = "linux")]
pub use driver::spi::SpiDriver;
pub use driver::{frame_to_rgb8, FrameSink};
pub use engine::{mix_into, Engine, EngineHandle, FrameTiming};
pub use envelope::{Ease, Envelope, Keyframe};
pub use error::{LumicubeError, LumicubeResult};
pub use layout::{build_position_lut, Layout, Serpentine};
pub use post::{
    estimate_current_ma, exposure_scale, filmic_tone_map, limit_power, PostPipeline, ToneStage,
};
pub use program::{Clip, Program, PROGRAM_VERSION};
pub use scene::{
    calib::Calibration, default_registry, gradient::Gradient, ocean::Ocean, solid::Solid,
    Registry, Resources, Scene, SceneContext,
};
pub use sequencer::{EngineHooks, Player, PlayerState};
pub use uniforms::{keys, Uniforms};
pub use wire::{reset_padding_len, ColorOrder, Ws2812Encoder, BYTES_PER_PIXEL};
