//! Integration tests: drive the pipeline through the raw RGBA buffer API.

#![allow(clippy::unwrap_used, clippy::cast_possible_truncation)]

use retouch_pipeline::adjust::{ToneAdjustment, luma};
use retouch_pipeline::{FilterParams, PipelineError, Session, run_raw, store_channel};

const W: u32 = 11;
const H: u32 = 7;

/// Pseudo-random opaque-ish pixels, deterministic per seed.
fn noise(w: u32, h: u32, seed: u32) -> Vec<u8> {
    let mut state = seed.wrapping_mul(2_654_435_761).wrapping_add(1);
    (0..w * h * 4)
        .map(|_| {
            state ^= state << 13;
            state ^= state >> 17;
            state ^= state << 5;
            (state >> 24) as u8
        })
        .collect()
}

fn pixel(buf: &[u8], w: u32, x: u32, y: u32) -> &[u8] {
    let i = ((y * w + x) * 4) as usize;
    &buf[i..i + 4]
}

#[test]
fn identity_parameters_reproduce_input() {
    for seed in 0..4 {
        let buf = noise(W, H, seed);
        assert_eq!(run_raw(&buf, W, H, &FilterParams::IDENTITY).unwrap(), buf);
    }
}

#[test]
fn grayscale_uses_luma_of_adjusted_channels() {
    let buf = noise(W, H, 9);
    let params = FilterParams::new(120.0, 80.0, 0.0, 0.0);
    let tone = ToneAdjustment::new(&params);
    let out = run_raw(&buf, W, H, &params).unwrap();

    for (src, dst) in buf.chunks_exact(4).zip(out.chunks_exact(4)) {
        let adjusted = [0, 1, 2].map(|c| tone.brightness_contrast(f64::from(src[c])));
        let expected = store_channel(luma(adjusted));
        assert_eq!(&dst[..3], &[expected; 3]);
        assert_eq!(dst[3], src[3]);
    }
}

#[test]
fn border_matches_unsharpened_output() {
    let buf = noise(W, H, 3);
    for sharpness in [0.5, 10.0, 37.0, 100.0] {
        let params = FilterParams::new(90.0, 130.0, 150.0, sharpness);
        let flat = FilterParams { sharpness: 0.0, ..params };
        let sharp = run_raw(&buf, W, H, &params).unwrap();
        let plain = run_raw(&buf, W, H, &flat).unwrap();

        for y in 0..H {
            for x in 0..W {
                if x == 0 || y == 0 || x == W - 1 || y == H - 1 {
                    assert_eq!(pixel(&sharp, W, x, y), pixel(&plain, W, x, y));
                }
            }
        }
    }
}

#[test]
fn alpha_survives_every_stage() {
    let buf = noise(W, H, 5);
    let params = FilterParams::new(200.0, 0.0, 200.0, 100.0);
    let out = run_raw(&buf, W, H, &params).unwrap();
    for (src, dst) in buf.chunks_exact(4).zip(out.chunks_exact(4)) {
        assert_eq!(src[3], dst[3]);
    }
}

#[test]
fn overflowing_channels_saturate() {
    let buf = [250, 5, 128, 255];
    let bright = run_raw(&buf, 1, 1, &FilterParams::new(200.0, 100.0, 100.0, 0.0)).unwrap();
    assert_eq!(bright, [255, 10, 255, 255]);

    let contrasty = run_raw(&buf, 1, 1, &FilterParams::new(100.0, 200.0, 100.0, 0.0)).unwrap();
    assert_eq!(contrasty, [255, 0, 128, 255]);
}

#[test]
fn fractional_channels_round_to_nearest() {
    // Brightness 10 scales by 0.1: 0.7 and 0.9 store as 1, 0.3 as 0.
    let buf = [7, 3, 9, 255];
    let out = run_raw(&buf, 1, 1, &FilterParams::new(10.0, 100.0, 100.0, 0.0)).unwrap();
    assert_eq!(out, [1, 0, 1, 255]);
}

#[test]
fn sharpened_channels_round_to_nearest() {
    // Sharpness 1 scales the kernel by 0.1. A uniform 7 neighborhood sums
    // to 0.1 * 7 = 0.7, stored as 1.
    let buf = [7, 7, 7, 255].repeat(9);
    let out = run_raw(&buf, 3, 3, &FilterParams::new(100.0, 100.0, 100.0, 1.0)).unwrap();
    assert_eq!(pixel(&out, 3, 1, 1), &[1, 1, 1, 255]);
    assert_eq!(pixel(&out, 3, 0, 0), &[7, 7, 7, 255]);
}

#[test]
fn fixed_order_matters() {
    // Brightness first: 100 * 1.5 * 0.5 + 64 = 139.
    // Contrast first would give (100 * 0.5 + 64) * 1.5 = 171.
    let buf = [100, 100, 100, 255];
    let out = run_raw(&buf, 1, 1, &FilterParams::new(150.0, 50.0, 100.0, 0.0)).unwrap();
    assert_eq!(&out[..3], &[139, 139, 139]);
}

#[test]
fn mid_gray_end_to_end() {
    let buf = [128, 128, 128, 255].repeat(9);
    for sharpness in [0.0, 10.0] {
        let params = FilterParams::new(150.0, 100.0, 100.0, sharpness);
        let out = run_raw(&buf, 3, 3, &params).unwrap();
        assert_eq!(out, [192, 192, 192, 255].repeat(9));
    }
}

#[test]
fn mismatched_buffer_is_rejected_not_processed() {
    let buf = noise(4, 4, 1);
    let err = run_raw(&buf[..60], 4, 4, &FilterParams::default()).unwrap_err();
    assert!(matches!(
        err,
        PipelineError::BufferSizeMismatch {
            expected: 64,
            actual: 60,
            ..
        }
    ));
    assert!(err.to_string().contains("64"));
}

#[test]
fn session_render_matches_raw_pipeline() {
    let buf = noise(W, H, 12);
    let image = retouch_pipeline::RgbaImage::from_raw(W, H, buf.clone()).unwrap();
    let params = FilterParams::new(75.0, 140.0, 160.0, 22.0);

    let mut session = Session::new();
    session.load_image(image);
    session.set_params(params);

    assert_eq!(
        session.render().unwrap().into_raw(),
        run_raw(&buf, W, H, &params).unwrap()
    );
}

#[test]
fn params_round_trip_through_json_config() {
    let params: FilterParams = serde_json::from_str(r#"{"brightness": 150.0}"#).unwrap();
    assert_eq!(params, FilterParams::new(150.0, 100.0, 100.0, 0.0));
    let json = serde_json::to_string(&params).unwrap();
    assert_eq!(serde_json::from_str::<FilterParams>(&json).unwrap(), params);
}
