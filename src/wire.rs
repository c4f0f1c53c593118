use crate::error::{LumicubeError, LumicubeResult};

/// Channel transmission order of the strip, e.g. GRB for classic WS2812B.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ColorOrder([Channel; 3]);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Channel {
    R,
    G,
    B,
}

impl Default for ColorOrder {
    fn default() -> Self {
        Self([Channel::G, Channel::R, Channel::B])
    }
}

impl ColorOrder {
    /// Parse a permutation of the letters R, G, B (case-insensitive).
    pub fn parse(s: &str) -> LumicubeResult<Self> {
        let upper = s.trim().to_ascii_uppercase();
        let bytes = upper.as_bytes();
        if bytes.len() != 3 {
            return Err(LumicubeError::invalid_config(format!(
                "color order '{s}' must be 3 characters"
            )));
        }
        let mut channels = [Channel::R; 3];
        let mut seen = [false; 3];
        for (i, &b) in bytes.iter().enumerate() {
            let (ch, slot) = match b {
                b'R' => (Channel::R, 0),
                b'G' => (Channel::G, 1),
                b'B' => (Channel::B, 2),
                _ => {
                    return Err(LumicubeError::invalid_config(format!(
                        "color order '{s}' has an invalid channel letter"
                    )));
                }
            };
            if seen[slot] {
                return Err(LumicubeError::invalid_config(format!(
                    "color order '{s}' repeats a channel"
                )));
            }
            seen[slot] = true;
            channels[i] = ch;
        }
        Ok(Self(channels))
    }

    fn select(&self, r: u8, g: u8, b: u8) -> [u8; 3] {
        let pick = |ch: Channel| match ch {
            Channel::R => r,
            Channel::G => g,
            Channel::B => b,
        };
        [pick(self.0[0]), pick(self.0[1]), pick(self.0[2])]
    }
}

/// WS2812 bitstream generator for an SPI bus clocked near 2.4 MHz.
///
/// Each data bit becomes three bus bits, MSB first: 1 -> 110, 0 -> 100, so
/// one color byte expands to exactly 3 bus bytes and one pixel to 9. After
/// the pixel stream the line must idle low long enough for the strip to
/// latch, emulated with zero bytes.
pub struct Ws2812Encoder {
    lut: [[u8; 3]; 256],
    order: ColorOrder,
    reset_len: usize,
}

/// Bus bytes per encoded pixel.
pub const BYTES_PER_PIXEL: usize = 9;

impl Ws2812Encoder {
    pub fn new(order: ColorOrder, speed_hz: u32, reset_us: u32) -> LumicubeResult<Self> {
        if speed_hz == 0 {
            return Err(LumicubeError::invalid_config("spi speed must be > 0"));
        }
        let mut lut = [[0u8; 3]; 256];
        for (value, entry) in lut.iter_mut().enumerate() {
            let mut stream: u32 = 0;
            for bit in (0..8).rev() {
                let tri = if (value >> bit) & 1 == 1 { 0b110 } else { 0b100 };
                stream = (stream << 3) | tri;
            }
            entry[0] = ((stream >> 16) & 0xFF) as u8;
            entry[1] = ((stream >> 8) & 0xFF) as u8;
            entry[2] = (stream & 0xFF) as u8;
        }
        Ok(Self {
            lut,
            order,
            reset_len: reset_padding_len(speed_hz, reset_us),
        })
    }

    /// Zero bytes appended after the pixel stream.
    pub fn reset_len(&self) -> usize {
        self.reset_len
    }

    /// Total encoded size for a pixel count, stream plus latch padding.
    pub fn encoded_len(&self, pixels: usize) -> usize {
        pixels * BYTES_PER_PIXEL + self.reset_len
    }

    pub fn encode_byte(&self, value: u8) -> [u8; 3] {
        self.lut[value as usize]
    }

    /// Expand an RGB byte frame (3 bytes per pixel) into one contiguous bus
    /// buffer: 9 bytes per pixel in channel order, then the latch padding.
    /// The caller must transmit the buffer in a single write; a gap in the
    /// middle of the stream reads as a latch and tears the frame.
    pub fn encode_frame(&self, rgb: &[u8], out: &mut Vec<u8>) -> LumicubeResult<()> {
        if rgb.len() % 3 != 0 {
            return Err(LumicubeError::invalid_config(format!(
                "rgb frame length {} is not a multiple of 3",
                rgb.len()
            )));
        }
        out.clear();
        out.reserve(self.encoded_len(rgb.len() / 3));
        for px in rgb.chunks_exact(3) {
            for value in self.order.select(px[0], px[1], px[2]) {
                out.extend_from_slice(&self.lut[value as usize]);
            }
        }
        out.resize(out.len() + self.reset_len, 0);
        Ok(())
    }
}

/// Latch padding in zero bytes: enough bus time to cover the reset
/// interval, and never fewer than 128 bytes.
pub fn reset_padding_len(speed_hz: u32, reset_us: u32) -> usize {
    let byte_us = 8_000_000.0 / speed_hz as f64;
    let needed = (reset_us as f64 / byte_us).ceil() as usize;
    needed.max(128)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encoder() -> Ws2812Encoder {
        Ws2812Encoder::new(ColorOrder::default(), 2_400_000, 300).unwrap()
    }

    /// Collapse 3 bus bits back into 1 data bit.
    fn decode_byte(enc: &[u8; 3]) -> u8 {
        let stream =
            ((enc[0] as u32) << 16) | ((enc[1] as u32) << 8) | enc[2] as u32;
        let mut value = 0u8;
        for i in 0..8 {
            let tri = (stream >> (21 - 3 * i)) & 0b111;
            value <<= 1;
            if tri == 0b110 {
                value |= 1;
            }
        }
        value
    }

    #[test]
    fn known_byte_vectors() {
        let enc = encoder();
        // 0x00: eight short pulses, 100 repeated.
        assert_eq!(enc.encode_byte(0x00), [0x92, 0x49, 0x24]);
        // 0xFF: eight long pulses, 110 repeated.
        assert_eq!(enc.encode_byte(0xFF), [0xDB, 0x6D, 0xB6]);
    }

    #[test]
    fn every_byte_roundtrips() {
        let enc = encoder();
        for v in 0..=255u8 {
            assert_eq!(decode_byte(&enc.encode_byte(v)), v);
        }
    }

    #[test]
    fn frame_size_is_nine_bytes_per_pixel_plus_reset() {
        let enc = encoder();
        let rgb = vec![0x42u8; 3 * 17];
        let mut out = Vec::new();
        enc.encode_frame(&rgb, &mut out).unwrap();
        assert_eq!(out.len(), 17 * BYTES_PER_PIXEL + enc.reset_len());
        assert!(out[17 * BYTES_PER_PIXEL..].iter().all(|&b| b == 0));
    }

    #[test]
    fn reset_padding_floor_and_scaling() {
        // 2.4 MHz: a byte is ~3.33 us, 300 us needs 90 bytes; the floor wins.
        assert_eq!(reset_padding_len(2_400_000, 300), 128);
        // Slower latch requirements exceed the floor.
        assert_eq!(reset_padding_len(2_400_000, 500), 150);
        // Faster clock packs more bytes into the same interval.
        assert_eq!(reset_padding_len(3_200_000, 500), 200);
    }

    #[test]
    fn channel_order_reorders_bytes() {
        let grb = encoder();
        let rgb_order = Ws2812Encoder::new(ColorOrder::parse("RGB").unwrap(), 2_400_000, 300)
            .unwrap();
        let mut a = Vec::new();
        let mut b = Vec::new();
        grb.encode_frame(&[10, 20, 30], &mut a).unwrap();
        rgb_order.encode_frame(&[10, 20, 30], &mut b).unwrap();
        // GRB sends green first; RGB sends red first.
        assert_eq!(a[0..3], grb.encode_byte(20));
        assert_eq!(b[0..3], rgb_order.encode_byte(10));
    }

    #[test]
    fn bad_color_orders_are_rejected() {
        assert!(ColorOrder::parse("RGG").is_err());
        assert!(ColorOrder::parse("RGBA").is_err());
        assert!(ColorOrder::parse("XYZ").is_err());
        assert!(ColorOrder::parse("grb").is_ok());
    }

    #[test]
    fn ragged_frame_is_rejected() {
        let enc = encoder();
        let mut out = Vec::new();
        assert!(enc.encode_frame(&[1, 2], &mut out).is_err());
    }
}
