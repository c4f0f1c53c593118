use lumicube::{reset_padding_len, ColorOrder, Ws2812Encoder, BYTES_PER_PIXEL};

fn encoder_with(order: &str) -> Ws2812Encoder {
    Ws2812Encoder::new(ColorOrder::parse(order).unwrap(), 2_400_000, 300).unwrap()
}

/// Decode one encoded color byte (3 bus bytes) back to its value.
fn decode(enc: &[u8]) -> u8 {
    let stream = ((enc[0] as u32) << 16) | ((enc[1] as u32) << 8) | enc[2] as u32;
    let mut value = 0u8;
    for i in 0..8 {
        value <<= 1;
        if (stream >> (21 - 3 * i)) & 0b111 == 0b110 {
            value |= 1;
        }
    }
    value
}

#[test]
fn all_zero_and_all_one_bytes() {
    let enc = encoder_with("GRB");
    // 100 repeated eight times.
    assert_eq!(enc.encode_byte(0x00), [0x92, 0x49, 0x24]);
    // 110 repeated eight times.
    assert_eq!(enc.encode_byte(0xFF), [0xDB, 0x6D, 0xB6]);
}

#[test]
fn all_256_bytes_roundtrip() {
    let enc = encoder_with("GRB");
    for v in 0..=255u8 {
        let bytes = enc.encode_byte(v);
        assert_eq!(decode(&bytes), v, "value {v:#04x}");
    }
}

#[test]
fn stream_is_nine_bytes_per_pixel() {
    let enc = encoder_with("GRB");
    for n in [1usize, 2, 10, 650] {
        let rgb = vec![0xA5u8; n * 3];
        let mut out = Vec::new();
        enc.encode_frame(&rgb, &mut out).unwrap();
        assert_eq!(out.len(), n * BYTES_PER_PIXEL + enc.reset_len());
    }
}

#[test]
fn reset_padding_meets_floor_and_latch_time() {
    // At 2.4 MHz a byte covers ~3.33 us; 300 us fits in 90 bytes but the
    // 128-byte floor applies.
    assert_eq!(reset_padding_len(2_400_000, 300), 128);
    assert_eq!(reset_padding_len(2_400_000, 427), 129);
    assert_eq!(reset_padding_len(3_200_000, 500), 200);

    let enc = Ws2812Encoder::new(ColorOrder::parse("GRB").unwrap(), 2_400_000, 500).unwrap();
    assert_eq!(enc.reset_len(), 150);
}

#[test]
fn padding_is_all_zero_and_terminal() {
    let enc = encoder_with("GRB");
    let mut out = Vec::new();
    enc.encode_frame(&[0xFF, 0xFF, 0xFF], &mut out).unwrap();
    let (stream, padding) = out.split_at(BYTES_PER_PIXEL);
    assert!(stream.iter().any(|&b| b != 0));
    assert!(padding.iter().all(|&b| b == 0));
    assert!(padding.len() >= 128);
}

#[test]
fn grb_order_sends_green_first() {
    let enc = encoder_with("GRB");
    let mut out = Vec::new();
    enc.encode_frame(&[0x11, 0x22, 0x33], &mut out).unwrap();
    assert_eq!(decode(&out[0..3]), 0x22);
    assert_eq!(decode(&out[3..6]), 0x11);
    assert_eq!(decode(&out[6..9]), 0x33);
}

#[test]
fn rgb_order_passes_through() {
    let enc = encoder_with("rgb");
    let mut out = Vec::new();
    enc.encode_frame(&[0x11, 0x22, 0x33], &mut out).unwrap();
    assert_eq!(decode(&out[0..3]), 0x11);
    assert_eq!(decode(&out[3..6]), 0x22);
    assert_eq!(decode(&out[6..9]), 0x33);
}

#[test]
fn multi_pixel_frame_keeps_pixel_boundaries() {
    let enc = encoder_with("BRG");
    let mut out = Vec::new();
    enc.encode_frame(&[1, 2, 3, 4, 5, 6], &mut out).unwrap();
    // Second pixel starts at byte 9: B=6, R=4, G=5.
    assert_eq!(decode(&out[9..12]), 6);
    assert_eq!(decode(&out[12..15]), 4);
    assert_eq!(decode(&out[15..18]), 5);
}
