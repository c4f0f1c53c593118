use std::time::{Duration, Instant};

use crate::{
    core::{Color, Dimensions},
    driver::{frame_to_rgb8, FrameSink},
    error::LumicubeResult,
};

/// Receives preview frames from the driver. The GUI/websocket bridge that
/// actually ships the bytes to a browser lives outside this crate.
pub trait PreviewSink: Send {
    fn emit_frame(&mut self, dim: Dimensions, rgb: &[u8]);
}

/// Throttled preview output: converts the linear frame to bytes and pushes
/// it to the sink at roughly 20 Hz, dropping frames in between so a slow
/// UI never backs up the render loop.
pub struct PreviewDriver {
    dim: Dimensions,
    sink: Box<dyn PreviewSink>,
    throttle: Duration,
    last_emit: Option<Instant>,
    scratch: Vec<u8>,
}

impl PreviewDriver {
    pub fn new(dim: Dimensions, sink: Box<dyn PreviewSink>) -> Self {
        Self {
            dim,
            sink,
            throttle: Duration::from_millis(50),
            last_emit: None,
            scratch: Vec::new(),
        }
    }

    pub fn with_throttle(mut self, throttle: Duration) -> Self {
        self.throttle = throttle;
        self
    }
}

impl FrameSink for PreviewDriver {
    fn write(&mut self, frame: &[Color]) -> LumicubeResult<()> {
        let now = Instant::now();
        if let Some(last) = self.last_emit {
            if now.duration_since(last) < self.throttle {
                return Ok(());
            }
        }
        self.last_emit = Some(now);
        frame_to_rgb8(frame, &mut self.scratch);
        self.sink.emit_frame(self.dim, &self.scratch);
        Ok(())
    }
}

/// Sink that reports frame statistics to the log instead of a UI. Used as
/// the headless fallback target.
#[derive(Default)]
pub struct LogPreviewSink;

impl PreviewSink for LogPreviewSink {
    fn emit_frame(&mut self, dim: Dimensions, rgb: &[u8]) {
        let sum: u64 = rgb.iter().map(|&b| b as u64).sum();
        let avg = sum as f64 / rgb.len().max(1) as f64;
        tracing::debug!(x = dim.x, y = dim.y, z = dim.z, avg_level = avg, "preview frame");
    }
}
