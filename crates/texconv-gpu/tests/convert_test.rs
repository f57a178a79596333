//! Conversion tests for texconv-gpu, run on the reference device.

use std::sync::Arc;

use glam::IVec2;
use texconv_caps::Caps;
use texconv_core::{DeviceCapabilities, Error, TextureTarget, VideoFormat, VideoInfo};
use texconv_gpu::{ColorConvert, ConvertConfig, ConvertState, DeviceProbe, Frame, GpuContext, ReferenceDevice};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn device(caps: DeviceCapabilities) -> (GpuContext, Arc<DeviceProbe>) {
    init_tracing();
    ReferenceDevice::spawn(caps).unwrap()
}

fn info(format: VideoFormat, width: u32, height: u32) -> VideoInfo {
    VideoInfo::new(format, width, height).unwrap()
}

fn session(ctx: &GpuContext, input: &VideoInfo, output: &VideoInfo) -> ColorConvert {
    let mut convert = ColorConvert::new(ctx.clone(), ConvertConfig::default());
    convert.set_info(input, output, TextureTarget::TwoD, TextureTarget::TwoD).unwrap();
    convert
}

fn upload(ctx: &GpuContext, info: &VideoInfo, planes: &[Vec<u8>]) -> Frame {
    let refs: Vec<&[u8]> = planes.iter().map(|p| p.as_slice()).collect();
    Frame::upload(ctx, info, &refs, TextureTarget::TwoD).unwrap()
}

fn solid_rgba(width: u32, height: u32, rgba: [u8; 4]) -> Vec<u8> {
    rgba.repeat((width * height) as usize)
}

/// BT.601 limited range luma of 8-bit R'G'B'.
fn bt601_luma(r: f64, g: f64, b: f64) -> f64 {
    16.0 + 219.0 * (0.299 * r + 0.587 * g + 0.114 * b) / 255.0
}

fn bt601_chroma(r: f64, g: f64, b: f64) -> (f64, f64) {
    let y = 0.299 * r + 0.587 * g + 0.114 * b;
    let cb = 128.0 + 224.0 * (b - y) / (1.772 * 255.0);
    let cr = 128.0 + 224.0 * (r - y) / (1.402 * 255.0);
    (cb, cr)
}

fn gradient(x: u32, y: u32) -> [u8; 4] {
    [(40 + 2 * x) as u8, (40 + 2 * y) as u8, (200 - x - y) as u8, 255]
}

#[test]
fn test_passthrough_forwards_input() {
    let (ctx, probe) = device(DeviceCapabilities::full());
    let rgba = info(VideoFormat::Rgba, 8, 8);
    let mut convert = session(&ctx, &rgba, &rgba);
    assert!(convert.is_passthrough());
    assert_eq!(convert.state(), ConvertState::Ready);

    let input = upload(&ctx, &rgba, &[solid_rgba(8, 8, [1, 2, 3, 4])]);
    let output = convert.convert(&input).unwrap();
    assert!(Frame::ptr_eq(&input, &output));
    assert_eq!(probe.draws(), 0);
    assert_eq!(probe.compiles(), 0);
}

#[test]
fn test_rgba_i420_roundtrip() {
    let (ctx, _probe) = device(DeviceCapabilities::full());
    let rgba = info(VideoFormat::Rgba, 64, 64);
    let i420 = info(VideoFormat::I420, 64, 64);

    let mut pixels = Vec::with_capacity(64 * 64 * 4);
    for y in 0..64 {
        for x in 0..64 {
            pixels.extend_from_slice(&gradient(x, y));
        }
    }
    let input = upload(&ctx, &rgba, &[pixels.clone()]);

    let mut to_yuv = session(&ctx, &rgba, &i420);
    let yuv = to_yuv.convert(&input).unwrap();
    let planes = yuv.download().unwrap();
    assert_eq!(planes.len(), 3);
    assert_eq!(planes[0].len(), 64 * 64);
    assert_eq!(planes[1].len(), 32 * 32);
    assert_eq!(planes[2].len(), 32 * 32);
    for y in 0..64u32 {
        for x in 0..64u32 {
            let [r, g, b, _] = gradient(x, y);
            let expected = bt601_luma(r as f64, g as f64, b as f64);
            let got = planes[0][(y * 64 + x) as usize] as f64;
            assert!((got - expected).abs() <= 1.0, "Y at {x},{y}: {got} vs {expected}");
        }
    }
    // each chroma sample is the mean of its 2x2 block
    for cy in 0..32u32 {
        for cx in 0..32u32 {
            let (mut cb, mut cr) = (0.0, 0.0);
            for (x, y) in [(0, 0), (1, 0), (0, 1), (1, 1)] {
                let [r, g, b, _] = gradient(2 * cx + x, 2 * cy + y);
                let (u, v) = bt601_chroma(r as f64, g as f64, b as f64);
                cb += u / 4.0;
                cr += v / 4.0;
            }
            let i = (cy * 32 + cx) as usize;
            let (u, v) = (planes[1][i] as f64, planes[2][i] as f64);
            assert!((u - cb).abs() <= 4.0, "U at {cx},{cy}: {u} vs {cb}");
            assert!((v - cr).abs() <= 4.0, "V at {cx},{cy}: {v} vs {cr}");
        }
    }

    let mut to_rgb = session(&ctx, &i420, &rgba);
    let back = &to_rgb.convert(&yuv).unwrap().download().unwrap()[0];
    for y in 0..64u32 {
        for x in 0..64u32 {
            let i = ((y * 64 + x) * 4) as usize;
            let interior = (2..62).contains(&x) && (2..62).contains(&y);
            let tolerance = if interior { 3 } else { 5 };
            for c in 0..3 {
                let diff = (back[i + c] as i32 - pixels[i + c] as i32).abs();
                assert!(diff <= tolerance, "channel {c} at {x},{y}: {} vs {}", back[i + c], pixels[i + c]);
            }
            assert_eq!(back[i + 3], 255);
        }
    }
}

#[test]
fn test_nv12_chroma_averages_block_across_edge() {
    let (ctx, _probe) = device(DeviceCapabilities::full());
    let rgba = info(VideoFormat::Rgba, 8, 4);
    let nv12 = info(VideoFormat::Nv12, 8, 4);
    let left = [230u8, 40, 30, 255];
    let right = [20u8, 60, 220, 255];
    // the edge sits inside the second chroma column
    let color = |x: u32| if x < 3 { left } else { right };
    let mut pixels = Vec::with_capacity(8 * 4 * 4);
    for _ in 0..4 {
        for x in 0..8 {
            pixels.extend_from_slice(&color(x));
        }
    }
    let input = upload(&ctx, &rgba, &[pixels]);

    let planes = session(&ctx, &rgba, &nv12).convert(&input).unwrap().download().unwrap();
    assert_eq!(planes[1].len(), 4 * 2 * 2);
    for cy in 0..2u32 {
        for cx in 0..4u32 {
            let (mut cb, mut cr) = (0.0, 0.0);
            for x in [2 * cx, 2 * cx + 1] {
                let [r, g, b, _] = color(x);
                let (u, v) = bt601_chroma(r as f64, g as f64, b as f64);
                cb += u / 2.0;
                cr += v / 2.0;
            }
            let i = ((cy * 4 + cx) * 2) as usize;
            let (u, v) = (planes[1][i] as f64, planes[1][i + 1] as f64);
            assert!((u - cb).abs() <= 2.0, "U at {cx},{cy}: {u} vs {cb}");
            assert!((v - cr).abs() <= 2.0, "V at {cx},{cy}: {v} vs {cr}");
        }
    }
}

#[test]
fn test_planar_rgb_10bit_roundtrip_is_exact() {
    let (ctx, _probe) = device(DeviceCapabilities::full());
    let rgba = info(VideoFormat::Rgba, 16, 16);
    let gbra = info(VideoFormat::Gbra10Le, 16, 16);

    let pixels: Vec<u8> = (0..256u32)
        .flat_map(|i| [i as u8, (255 - i) as u8, (i * 7 % 256) as u8, (i * 3 % 256) as u8])
        .collect();
    let input = upload(&ctx, &rgba, &[pixels.clone()]);

    let planar = session(&ctx, &rgba, &gbra).convert(&input).unwrap();
    let planes = planar.download().unwrap();
    assert_eq!(planes.len(), 4);
    // plane 2 holds red: 255 in 8 bits is 1023 in 10 bits
    let red_last = u16::from_le_bytes([planes[2][510], planes[2][511]]);
    assert_eq!(red_last, 1023);
    let green_first = u16::from_le_bytes([planes[0][0], planes[0][1]]);
    assert_eq!(green_first, 1023);

    let back = session(&ctx, &gbra, &rgba).convert(&planar).unwrap().download().unwrap();
    assert_eq!(back[0], pixels);
}

#[test]
fn test_reorder_bgra() {
    let (ctx, probe) = device(DeviceCapabilities::full());
    let rgba = info(VideoFormat::Rgba, 4, 4);
    let bgra = info(VideoFormat::Bgra, 4, 4);
    let input = upload(&ctx, &rgba, &[solid_rgba(4, 4, [10, 20, 30, 40])]);
    let out = session(&ctx, &rgba, &bgra).convert(&input).unwrap().download().unwrap();
    assert_eq!(out[0], solid_rgba(4, 4, [30, 20, 10, 40]));
    assert_eq!(probe.draws(), 1);
    assert_eq!(probe.copies(), 0);
}

#[test]
fn test_program_cache() {
    let (ctx, probe) = device(DeviceCapabilities::full());
    let rgba = info(VideoFormat::Rgba, 8, 8);
    let nv12 = info(VideoFormat::Nv12, 8, 8);
    let i420 = info(VideoFormat::I420, 8, 8);
    let input = upload(&ctx, &rgba, &[solid_rgba(8, 8, [90, 60, 30, 255])]);

    let mut convert = session(&ctx, &rgba, &nv12);
    assert_eq!(convert.state(), ConvertState::Configured);
    convert.convert(&input).unwrap();
    convert.convert(&input).unwrap();
    assert_eq!(convert.compile_count(), 1);
    assert_eq!(convert.state(), ConvertState::Ready);

    convert.set_info(&rgba, &i420, TextureTarget::TwoD, TextureTarget::TwoD).unwrap();
    convert.convert(&input).unwrap();
    assert_eq!(convert.compile_count(), 2);

    convert.set_info(&rgba, &nv12, TextureTarget::TwoD, TextureTarget::TwoD).unwrap();
    convert.convert(&input).unwrap();
    assert_eq!(convert.compile_count(), 2);
    assert_eq!(probe.compiles(), 2);
}

#[test]
fn test_eager_compile() {
    let (ctx, probe) = device(DeviceCapabilities::full());
    let config = ConvertConfig { eager_compile: true, ..ConvertConfig::default() };
    let mut convert = ColorConvert::new(ctx, config);
    let rgba = info(VideoFormat::Rgba, 8, 8);
    let y444 = info(VideoFormat::Y444, 8, 8);
    convert.set_info(&rgba, &y444, TextureTarget::TwoD, TextureTarget::TwoD).unwrap();
    assert_eq!(convert.state(), ConvertState::Ready);
    assert_eq!(probe.compiles(), 1);
}

#[test]
fn test_compile_failure_keeps_pair_configured() {
    let (ctx, probe) = device(DeviceCapabilities::full());
    let rgba = info(VideoFormat::Rgba, 8, 8);
    let nv12 = info(VideoFormat::Nv12, 8, 8);
    let input = upload(&ctx, &rgba, &[solid_rgba(8, 8, [0, 0, 0, 255])]);
    let mut convert = session(&ctx, &rgba, &nv12);

    probe.fail_compile(true);
    let err = convert.convert(&input).unwrap_err();
    assert!(err.is_compilation());
    assert_eq!(convert.state(), ConvertState::Configured);
    assert_eq!(convert.pool().unwrap().outstanding(), 0);

    probe.fail_compile(false);
    assert!(convert.convert(&input).is_ok());
    assert_eq!(convert.compile_count(), 1);
}

#[test]
fn test_multiview_all_or_nothing() {
    let (ctx, probe) = device(DeviceCapabilities::full());
    let rgba = info(VideoFormat::Rgba, 8, 8).with_views(2);
    let nv12 = info(VideoFormat::Nv12, 8, 8).with_views(2);
    let input = upload(
        &ctx,
        &rgba,
        &[solid_rgba(8, 8, [255, 0, 0, 255]), solid_rgba(8, 8, [0, 0, 255, 255])],
    );
    let mut convert = session(&ctx, &rgba, &nv12);

    probe.fail_draw_on(2);
    assert!(convert.convert(&input).is_err());
    assert_eq!(convert.pool().unwrap().outstanding(), 0);

    let output = convert.convert(&input).unwrap();
    assert_eq!(output.n_memories(), 4);
    let planes = output.download().unwrap();
    let red_y = bt601_luma(255.0, 0.0, 0.0);
    let blue_y = bt601_luma(0.0, 0.0, 255.0);
    assert!(planes[0].iter().all(|&y| (y as f64 - red_y).abs() <= 1.0));
    assert!(planes[2].iter().all(|&y| (y as f64 - blue_y).abs() <= 1.0));
    assert_eq!(planes[1].len(), 4 * 4 * 2);
}

#[test]
fn test_gles2_rejects_multi_plane_output() {
    let (ctx, _probe) = device(DeviceCapabilities::gles2());
    let rgba = info(VideoFormat::Rgba, 8, 8);
    let nv12 = info(VideoFormat::Nv12, 8, 8);
    let mut convert = ColorConvert::new(ctx, ConvertConfig::default());
    let err = convert
        .set_formats(&Caps::from_info(&rgba, TextureTarget::TwoD), &Caps::from_info(&nv12, TextureTarget::TwoD))
        .unwrap_err();
    assert!(matches!(err, Error::Capability { .. }));
    assert!(err.is_fatal_for_pair());
    assert_eq!(convert.state(), ConvertState::Uninitialized);
}

#[test]
fn test_gles2_gray_output_through_intermediate() {
    let (ctx, probe) = device(DeviceCapabilities::gles2());
    let rgba = info(VideoFormat::Rgba, 4, 2);
    let gray = info(VideoFormat::Gray8, 4, 2);
    let mut pixels = solid_rgba(4, 1, [255, 255, 255, 255]);
    pixels.extend(solid_rgba(4, 1, [0, 0, 0, 255]));
    let input = upload(&ctx, &rgba, &[pixels]);

    let out = session(&ctx, &rgba, &gray).convert(&input).unwrap().download().unwrap();
    assert_eq!(out[0], vec![255, 255, 255, 255, 0, 0, 0, 0]);
    assert_eq!(probe.copies(), 1);
}

#[test]
fn test_yuy2_roundtrip() {
    let (ctx, _probe) = device(DeviceCapabilities::full());
    let rgba = info(VideoFormat::Rgba, 8, 4);
    let yuy2 = info(VideoFormat::Yuy2, 8, 4);
    let color = [180u8, 90, 40, 255];
    let input = upload(&ctx, &rgba, &[solid_rgba(8, 4, color)]);

    let packed = session(&ctx, &rgba, &yuy2).convert(&input).unwrap();
    let bytes = packed.download().unwrap();
    let (r, g, b) = (color[0] as f64, color[1] as f64, color[2] as f64);
    let y = bt601_luma(r, g, b);
    let (cb, cr) = bt601_chroma(r, g, b);
    for (got, expected) in bytes[0][..4].iter().zip([y, cb, y, cr]) {
        assert!((*got as f64 - expected).abs() <= 1.0, "{:?} vs {y} {cb} {cr}", &bytes[0][..4]);
    }

    let back = session(&ctx, &yuy2, &rgba).convert(&packed).unwrap().download().unwrap();
    for px in back[0].chunks_exact(4) {
        for c in 0..3 {
            assert!((px[c] as i32 - color[c] as i32).abs() <= 3, "{px:?}");
        }
        assert_eq!(px[3], 255);
    }
}

/// Texel of pixel `(x, y)` in a plane stored in `tile_w` x `tile_h` tiles.
fn tiled_texel(x: i32, y: i32, tile_w: i32, tile_h: i32, width: i32) -> IVec2 {
    let tiles_per_row = width / tile_w;
    let tile_index = (y / tile_h) * tiles_per_row + x / tile_w;
    let linear = tile_index * tile_w * tile_h + (y % tile_h) * tile_w + x % tile_w;
    IVec2::new(linear % width, linear / width)
}

#[test]
fn test_tiled_matches_linear() {
    let (ctx, _probe) = device(DeviceCapabilities::full());
    let nv12 = info(VideoFormat::Nv12, 8, 8);
    let tiled = info(VideoFormat::Nv12_4l4, 8, 8);
    let rgba = info(VideoFormat::Rgba, 8, 8);

    let luma = |x: u32, y: u32| (20 + x * 25 + y * 3) as u8;
    let mut linear_y = Vec::with_capacity(64);
    for y in 0..8 {
        for x in 0..8 {
            linear_y.push(luma(x, y));
        }
    }
    let linear_uv = vec![128u8; 4 * 4 * 2];
    let linear = upload(&ctx, &nv12, &[linear_y, linear_uv]);

    let luma_plane = *tiled.plane(0).unwrap();
    let chroma_plane = *tiled.plane(1).unwrap();
    let mut tiled_y = vec![0u8; (luma_plane.width * luma_plane.height) as usize];
    for y in 0..8 {
        for x in 0..8 {
            let t = tiled_texel(x, y, 4, 4, luma_plane.width as i32);
            tiled_y[(t.y * luma_plane.width as i32 + t.x) as usize] = luma(x as u32, y as u32);
        }
    }
    let tiled_uv = vec![128u8; (chroma_plane.width * chroma_plane.height * 2) as usize];
    let tiled_frame = upload(&ctx, &tiled, &[tiled_y, tiled_uv]);

    let expected = session(&ctx, &nv12, &rgba).convert(&linear).unwrap().download().unwrap();
    let got = session(&ctx, &tiled, &rgba).convert(&tiled_frame).unwrap().download().unwrap();
    for (a, b) in got[0].iter().zip(&expected[0]) {
        assert!((*a as i32 - *b as i32).abs() <= 1, "{a} vs {b}");
    }
}

#[test]
fn test_pool_exhaustion_is_recoverable() {
    let (ctx, _probe) = device(DeviceCapabilities::full());
    let config = ConvertConfig { pool_min_buffers: 0, pool_max_buffers: 1, ..ConvertConfig::default() };
    let mut convert = ColorConvert::new(ctx.clone(), config);
    let rgba = info(VideoFormat::Rgba, 4, 4);
    let bgra = info(VideoFormat::Bgra, 4, 4);
    convert.set_info(&rgba, &bgra, TextureTarget::TwoD, TextureTarget::TwoD).unwrap();
    let input = upload(&ctx, &rgba, &[solid_rgba(4, 4, [1, 2, 3, 4])]);

    let held = convert.convert(&input).unwrap();
    let err = convert.convert(&input).unwrap_err();
    assert!(matches!(err, Error::Resource { .. }));
    assert!(err.is_recoverable());

    drop(held);
    assert!(convert.convert(&input).is_ok());
}

#[test]
fn test_frame_validation() {
    let (ctx, _probe) = device(DeviceCapabilities::full());
    let rgba = info(VideoFormat::Rgba, 4, 4);
    let bgra = info(VideoFormat::Bgra, 4, 4);
    let mut convert = session(&ctx, &rgba, &bgra);

    let wrong_size = upload(&ctx, &info(VideoFormat::Rgba, 2, 2), &[solid_rgba(2, 2, [0; 4])]);
    assert!(matches!(convert.convert(&wrong_size), Err(Error::FrameValidation { .. })));

    let system = Frame::from_system(rgba.clone(), vec![solid_rgba(4, 4, [0; 4])]).unwrap();
    assert!(matches!(convert.convert(&system), Err(Error::FrameValidation { .. })));
}

/// `(pixel of the block, Y/U/V)` of the twelve components of a v210 block, in
/// storage order.
const V210_ORDER: [(u32, usize); 12] = [
    (0, 1), (0, 0), (0, 2), (1, 0),
    (2, 1), (2, 0), (2, 2), (3, 0),
    (4, 1), (4, 0), (4, 2), (5, 0),
];

/// Every 10-bit component of one row of v210 words, in storage order.
fn v210_row(row: &[u8]) -> Vec<i32> {
    row.chunks_exact(4)
        .flat_map(|w| {
            let word = u32::from_le_bytes([w[0], w[1], w[2], w[3]]);
            [word & 0x3ff, (word >> 10) & 0x3ff, (word >> 20) & 0x3ff]
        })
        .map(|c| c as i32)
        .collect()
}

/// 10-bit limited range BT.601 Y, U and V of an 8-bit R'G'B' pixel.
fn bt601_10bit(px: [u8; 4]) -> [f64; 3] {
    let (r, g, b) = (px[0] as f64, px[1] as f64, px[2] as f64);
    let (cb, cr) = bt601_chroma(r, g, b);
    [4.0 * bt601_luma(r, g, b), 4.0 * cb, 4.0 * cr]
}

#[test]
fn test_v210_roundtrip() {
    let (ctx, _probe) = device(DeviceCapabilities::full());
    let (width, height) = (12u32, 2u32);
    let rgba = info(VideoFormat::Rgba, width, height);
    let v210 = info(VideoFormat::V210, width, height);
    // pixel pairs share a color so 4:2:2 chroma loses nothing
    let palette = [
        [200u8, 30, 40, 255],
        [20, 180, 60, 255],
        [30, 50, 210, 255],
        [128, 128, 128, 255],
        [240, 220, 30, 255],
        [60, 20, 90, 255],
    ];
    let color = |x: u32| palette[(x / 2) as usize];
    let pixels: Vec<u8> = (0..height).flat_map(|_| (0..width).flat_map(color)).collect();
    let input = upload(&ctx, &rgba, &[pixels.clone()]);

    let packed = session(&ctx, &rgba, &v210).convert(&input).unwrap();
    let planes = packed.download().unwrap();
    // two six pixel blocks of four words per row
    assert_eq!(planes[0].len(), (8 * 4 * height) as usize);
    for (y, row) in planes[0].chunks_exact(32).enumerate() {
        for (i, got) in v210_row(row).into_iter().enumerate() {
            let (pixel, comp) = V210_ORDER[i % 12];
            let x = (i / 12) as u32 * 6 + pixel;
            let expected = bt601_10bit(color(x))[comp];
            assert!((got as f64 - expected).abs() <= 3.0, "component {i} row {y}: {got} vs {expected}");
        }
    }

    let back = session(&ctx, &v210, &rgba).convert(&packed).unwrap().download().unwrap();
    for (n, (got, want)) in back[0].chunks_exact(4).zip(pixels.chunks_exact(4)).enumerate() {
        for c in 0..3 {
            assert!((got[c] as i32 - want[c] as i32).abs() <= 3, "pixel {n}: {got:?} vs {want:?}");
        }
        assert_eq!(got[3], 255);
    }
}

#[test]
fn test_v210_to_planar_keeps_codes() {
    let (ctx, _probe) = device(DeviceCapabilities::full());
    let rgba = info(VideoFormat::Rgba, 12, 2);
    let v210 = info(VideoFormat::V210, 12, 2);
    let i422 = info(VideoFormat::I422_10le, 12, 2);
    let pixels: Vec<u8> = (0..2).flat_map(|y| (0..12).flat_map(move |x| gradient(x * 4, y))).collect();
    let input = upload(&ctx, &rgba, &[pixels]);

    let packed = session(&ctx, &rgba, &v210).convert(&input).unwrap();
    let words = packed.download().unwrap();
    let planar = session(&ctx, &v210, &i422).convert(&packed).unwrap().download().unwrap();
    assert_eq!(planar[1].len(), 6 * 2 * 2);

    let code = |plane: &[u8], i: usize| u16::from_le_bytes([plane[2 * i], plane[2 * i + 1]]) as i32;
    for (y, row) in words[0].chunks_exact(32).enumerate() {
        let components = v210_row(row);
        for (i, c) in components.iter().enumerate() {
            let (pixel, comp) = V210_ORDER[i % 12];
            let x = (i / 12) * 6 + pixel as usize;
            let got = match comp {
                0 => code(&planar[0], y * 12 + x),
                1 => code(&planar[1], y * 6 + x / 2),
                _ => code(&planar[2], y * 6 + x / 2),
            };
            assert!((got - c).abs() <= 1, "component {i} row {y}: {got} vs {c}");
        }
    }
}

#[test]
fn test_y410_packs_uyva() {
    let (ctx, _probe) = device(DeviceCapabilities::full());
    let rgba = info(VideoFormat::Rgba, 4, 4);
    let y410 = info(VideoFormat::Y410, 4, 4);
    let color = [90u8, 200, 120, 255];
    let input = upload(&ctx, &rgba, &[solid_rgba(4, 4, color)]);

    let packed = session(&ctx, &rgba, &y410).convert(&input).unwrap();
    let bytes = packed.download().unwrap();
    let word = u32::from_le_bytes([bytes[0][0], bytes[0][1], bytes[0][2], bytes[0][3]]);
    let [y, u, v] = bt601_10bit(color);
    let fields = [(word & 0x3ff) as f64, ((word >> 10) & 0x3ff) as f64, ((word >> 20) & 0x3ff) as f64];
    for (got, expected) in fields.into_iter().zip([u, y, v]) {
        assert!((got - expected).abs() <= 3.0, "{fields:?} vs {y} {u} {v}");
    }
    assert_eq!(word >> 30, 3);

    let back = session(&ctx, &y410, &rgba).convert(&packed).unwrap().download().unwrap();
    for px in back[0].chunks_exact(4) {
        for c in 0..3 {
            assert!((px[c] as i32 - color[c] as i32).abs() <= 3, "{px:?}");
        }
    }
}

#[test]
fn test_p012_luma_in_high_bits() {
    let (ctx, _probe) = device(DeviceCapabilities::full());
    let rgba = info(VideoFormat::Rgba, 8, 8);
    let p012 = info(VideoFormat::P012le, 8, 8);
    let color = [70u8, 150, 230, 255];
    let input = upload(&ctx, &rgba, &[solid_rgba(8, 8, color)]);

    let semi = session(&ctx, &rgba, &p012).convert(&input).unwrap();
    let planes = semi.download().unwrap();
    assert_eq!(planes[1].len(), 4 * 4 * 4);
    let luma = u16::from_le_bytes([planes[0][0], planes[0][1]]) >> 4;
    let expected = 16.0 * bt601_luma(color[0] as f64, color[1] as f64, color[2] as f64);
    assert!((luma as f64 - expected).abs() <= 4.0, "{luma} vs {expected}");

    let back = session(&ctx, &p012, &rgba).convert(&semi).unwrap().download().unwrap();
    for px in back[0].chunks_exact(4) {
        for c in 0..3 {
            assert!((px[c] as i32 - color[c] as i32).abs() <= 2, "{px:?}");
        }
    }
}

#[test]
fn test_rgb16_565_bits() {
    let (ctx, _probe) = device(DeviceCapabilities::full());
    let rgba = info(VideoFormat::Rgba, 2, 1);
    let rgb16 = info(VideoFormat::Rgb16, 2, 1);
    let bgr16 = info(VideoFormat::Bgr16, 2, 1);
    let input = upload(&ctx, &rgba, &[vec![255, 0, 0, 255, 0, 255, 0, 255]]);

    let words = session(&ctx, &rgba, &rgb16).convert(&input).unwrap().download().unwrap();
    assert_eq!(words[0], [0x00, 0xf8, 0xe0, 0x07]);
    let words = session(&ctx, &rgba, &bgr16).convert(&input).unwrap().download().unwrap();
    assert_eq!(words[0], [0x1f, 0x00, 0xe0, 0x07]);

    let pixels: Vec<u8> = [[200u8, 100, 50, 255], [10, 240, 130, 255]].concat();
    let input = upload(&ctx, &rgba, &[pixels.clone()]);
    let packed = session(&ctx, &rgba, &rgb16).convert(&input).unwrap();
    let back = session(&ctx, &rgb16, &rgba).convert(&packed).unwrap().download().unwrap();
    for (got, want) in back[0].chunks_exact(4).zip(pixels.chunks_exact(4)) {
        // 5 bits per red and blue step by 8.2, 6 bits of green by 4
        assert!((got[0] as i32 - want[0] as i32).abs() <= 5, "{got:?} vs {want:?}");
        assert!((got[1] as i32 - want[1] as i32).abs() <= 3, "{got:?} vs {want:?}");
        assert!((got[2] as i32 - want[2] as i32).abs() <= 5, "{got:?} vs {want:?}");
        assert_eq!(got[3], 255);
    }
}

#[test]
fn test_y210_roundtrip() {
    let (ctx, _probe) = device(DeviceCapabilities::full());
    let rgba = info(VideoFormat::Rgba, 8, 2);
    let y210 = info(VideoFormat::Y210, 8, 2);
    let color = [40u8, 160, 200, 255];
    let input = upload(&ctx, &rgba, &[solid_rgba(8, 2, color)]);

    let packed = session(&ctx, &rgba, &y210).convert(&input).unwrap();
    let bytes = packed.download().unwrap();
    assert_eq!(bytes[0].len(), 8 * 2 * 4);
    let [y, u, v] = bt601_10bit(color);
    let samples: Vec<f64> = bytes[0][..8]
        .chunks_exact(2)
        .map(|s| (u16::from_le_bytes([s[0], s[1]]) >> 6) as f64)
        .collect();
    for (got, expected) in samples.iter().zip([y, u, y, v]) {
        assert!((got - expected).abs() <= 3.0, "{samples:?} vs {y} {u} {v}");
    }

    let back = session(&ctx, &y210, &rgba).convert(&packed).unwrap().download().unwrap();
    for px in back[0].chunks_exact(4) {
        for c in 0..3 {
            assert!((px[c] as i32 - color[c] as i32).abs() <= 3, "{px:?}");
        }
    }
}

#[test]
fn test_a422_12bit_keeps_alpha() {
    let (ctx, _probe) = device(DeviceCapabilities::full());
    let rgba = info(VideoFormat::Rgba, 4, 4);
    let a422 = info(VideoFormat::A422_12le, 4, 4);
    let input = upload(&ctx, &rgba, &[solid_rgba(4, 4, [120, 60, 30, 255])]);

    let planar = session(&ctx, &rgba, &a422).convert(&input).unwrap();
    let planes = planar.download().unwrap();
    assert_eq!(planes.len(), 4);
    assert_eq!(planes[1].len(), 2 * 4 * 2);
    assert_eq!(u16::from_le_bytes([planes[3][0], planes[3][1]]), 4095);

    let back = session(&ctx, &a422, &rgba).convert(&planar).unwrap().download().unwrap();
    for px in back[0].chunks_exact(4) {
        assert!((px[0] as i32 - 120).abs() <= 2, "{px:?}");
        assert_eq!(px[3], 255);
    }
}
