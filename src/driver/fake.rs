use std::sync::{Arc, Mutex};

use crate::{core::Color, driver::FrameSink, error::LumicubeResult};

/// Captures written frames for headless runs and test assertions. The
/// shared handle lets a test keep reading after the engine takes ownership
/// of the sink.
#[derive(Default)]
pub struct CaptureDriver {
    state: Arc<Mutex<CaptureState>>,
}

#[derive(Default)]
struct CaptureState {
    last: Vec<Color>,
    frames: u64,
}

#[derive(Clone, Default)]
pub struct CaptureHandle {
    state: Arc<Mutex<CaptureState>>,
}

impl CaptureDriver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn handle(&self) -> CaptureHandle {
        CaptureHandle {
            state: Arc::clone(&self.state),
        }
    }
}

impl CaptureHandle {
    pub fn last_frame(&self) -> Vec<Color> {
        self.state.lock().map(|s| s.last.clone()).unwrap_or_default()
    }

    pub fn frames_written(&self) -> u64 {
        self.state.lock().map(|s| s.frames).unwrap_or(0)
    }
}

impl FrameSink for CaptureDriver {
    fn write(&mut self, frame: &[Color]) -> LumicubeResult<()> {
        if let Ok(mut s) = self.state.lock() {
            s.last.clear();
            s.last.extend_from_slice(frame);
            s.frames += 1;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capture_retains_last_frame() {
        let mut drv = CaptureDriver::new();
        let handle = drv.handle();
        drv.write(&[Color::new(1.0, 0.0, 0.0)]).unwrap();
        drv.write(&[Color::new(0.0, 1.0, 0.0)]).unwrap();
        assert_eq!(handle.frames_written(), 2);
        assert_eq!(handle.last_frame(), vec![Color::new(0.0, 1.0, 0.0)]);
    }
}
