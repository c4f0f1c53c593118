use std::io::Write;

use spidev::{SpiModeFlags, Spidev, SpidevOptions};

use crate::{
    core::Color,
    driver::{frame_to_rgb8, FrameSink},
    error::{LumicubeError, LumicubeResult},
    wire::{ColorOrder, Ws2812Encoder},
};

/// WS2812 strip behind a spidev device. Each frame is expanded through the
/// wire encoder and sent as one transaction: the latch padding rides at the
/// end of the same buffer because any bus gap inside the pixel stream would
/// latch a torn frame.
pub struct SpiDriver {
    dev: Spidev,
    encoder: Ws2812Encoder,
    pixel_count: usize,
    rgb: Vec<u8>,
    encoded: Vec<u8>,
}

impl SpiDriver {
    pub fn open(
        path: &str,
        pixel_count: usize,
        order: ColorOrder,
        speed_hz: u32,
        reset_us: u32,
    ) -> LumicubeResult<Self> {
        if pixel_count == 0 {
            return Err(LumicubeError::invalid_config("pixel count must be > 0"));
        }
        let speed_hz = if speed_hz == 0 { 2_400_000 } else { speed_hz };
        let reset_us = if reset_us == 0 { 300 } else { reset_us };

        let mut dev = Spidev::open(path)
            .map_err(|e| LumicubeError::io(format!("open spi device '{path}': {e}")))?;
        let options = SpidevOptions::new()
            .bits_per_word(8)
            .max_speed_hz(speed_hz)
            .mode(SpiModeFlags::SPI_MODE_0)
            .build();
        dev.configure(&options)
            .map_err(|e| LumicubeError::io(format!("configure spi device '{path}': {e}")))?;

        Ok(Self {
            dev,
            encoder: Ws2812Encoder::new(order, speed_hz, reset_us)?,
            pixel_count,
            rgb: Vec::with_capacity(pixel_count * 3),
            encoded: Vec::new(),
        })
    }
}

impl FrameSink for SpiDriver {
    fn write(&mut self, frame: &[Color]) -> LumicubeResult<()> {
        if frame.len() != self.pixel_count {
            return Err(LumicubeError::invalid_config(format!(
                "frame has {} voxels, strip expects {}",
                frame.len(),
                self.pixel_count
            )));
        }
        frame_to_rgb8(frame, &mut self.rgb);
        self.encoder.encode_frame(&self.rgb, &mut self.encoded)?;
        self.dev
            .write_all(&self.encoded)
            .map_err(|e| LumicubeError::io(format!("spi write: {e}")))?;
        Ok(())
    }

    fn shutdown(&mut self) {
        // Blank the strip on the way out; best effort.
        let dark = vec![0u8; self.pixel_count * 3];
        if self.encoder.encode_frame(&dark, &mut self.encoded).is_ok() {
            let _ = self.dev.write_all(&self.encoded);
        }
    }
}
