//! Channel reorder indexes and bit-depth factors.
//!
//! Shaders read texels into a canonical working vector, `(R, G, B, A)` or
//! `(Y, U, V, A)`, through an input swizzle and write them back in the
//! destination's native channel order through an output swizzle.

use texconv_core::{FormatDescriptor, TexelFormat, VideoFormat};
use tracing::trace;

/// Swizzle that leaves a vector unchanged.
pub const IDENTITY: [i32; 4] = [0, 1, 2, 3];

/// Output order of YUY2 (and Y210, Y212): `(Y, U)` on even pixels, `(Y, V)` on odd ones.
pub const YUY2_PACK: [i32; 4] = [0, 1, 0, 2];

/// Output order of UYVY: `(U, Y)` on even pixels, `(V, Y)` on odd ones.
pub const UYVY_PACK: [i32; 4] = [1, 0, 2, 0];

/// Inverse of a channel permutation.
///
/// Entries a non-permutation never writes keep their identity value.
pub fn invert_swizzle(swizzle: [i32; 4]) -> [i32; 4] {
    let mut inv = IDENTITY;
    for (i, &s) in swizzle.iter().enumerate() {
        if (0..4).contains(&s) {
            inv[s as usize] = i as i32;
        }
    }
    inv
}

/// Input and output reorder indexes for a conversion.
///
/// `in_texel` is the texel format the first input plane is stored as. Two
/// channel planes uploaded as luminance-alpha sample their second channel
/// from alpha, so index 1 becomes 3.
pub fn reorder_indexes(
    input: &FormatDescriptor,
    output: &FormatDescriptor,
    in_texel: Option<TexelFormat>,
) -> ([i32; 4], [i32; 4]) {
    let mut in_swizzle = input.swizzle;
    if in_texel == Some(TexelFormat::LuminanceAlpha8) {
        for s in &mut in_swizzle {
            if *s == 1 {
                *s = 3;
            }
        }
    }

    let out_swizzle = match output.format {
        VideoFormat::Yuy2 | VideoFormat::Y210 | VideoFormat::Y212Le => YUY2_PACK,
        VideoFormat::Uyvy => UYVY_PACK,
        VideoFormat::Gray8 | VideoFormat::V210 => IDENTITY,
        _ => invert_swizzle(output.swizzle),
    };

    trace!(from = %input.format, to = %output.format, ?in_swizzle, ?out_swizzle, "reorder indexes");
    (in_swizzle, out_swizzle)
}

/// Factor bringing samples of `desc` to or from their container's full scale.
///
/// Planar formats keep their samples in the low bits of the container, so a
/// 10-bit sample read from a 16-bit texture normalizes to `v / 65535` and
/// needs `65535 / 1023` to reach `[0, 1]`. Returns `(in, out)` factors.
pub fn bitdepth_factors(desc: &FormatDescriptor) -> (f32, f32) {
    if !desc.is_planar() {
        return (1.0, 1.0);
    }
    let bits = desc.bits;
    let container = bits.next_multiple_of(8);
    let full = ((1u64 << container) - 1) as f64;
    let used = ((1u64 << bits) - 1) as f64;
    ((full / used) as f32, (used / full) as f32)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invert() {
        assert_eq!(invert_swizzle([2, 1, 0, 3]), [2, 1, 0, 3]);
        assert_eq!(invert_swizzle([1, 2, 3, 0]), [3, 0, 1, 2]);
        assert_eq!(invert_swizzle([2, 0, 1, 3]), [1, 2, 0, 3]);
    }

    #[test]
    fn test_packed_yuv_bypasses_inverse() {
        let rgba = VideoFormat::Rgba.info();
        let (_, out) = reorder_indexes(rgba, VideoFormat::Yuy2.info(), None);
        assert_eq!(out, YUY2_PACK);
        let (_, out) = reorder_indexes(rgba, VideoFormat::Uyvy.info(), None);
        assert_eq!(out, UYVY_PACK);
        let (_, out) = reorder_indexes(rgba, VideoFormat::Y212Le.info(), None);
        assert_eq!(out, YUY2_PACK);
        let (_, out) = reorder_indexes(rgba, VideoFormat::Y410.info(), None);
        assert_eq!(out, [1, 0, 2, 3]);
    }

    #[test]
    fn test_luminance_alpha_remap() {
        let rgba = VideoFormat::Rgba.info();
        let (sw, _) = reorder_indexes(VideoFormat::Yuy2.info(), rgba, Some(TexelFormat::LuminanceAlpha8));
        assert_eq!(sw, [0, 3, 3, 2]);
        let (sw, _) = reorder_indexes(VideoFormat::Gray16Le.info(), rgba, Some(TexelFormat::LuminanceAlpha8));
        assert_eq!(&sw[..2], &[3, 0]);
        let (sw, _) = reorder_indexes(VideoFormat::Gray16Be.info(), rgba, Some(TexelFormat::Rg8));
        assert_eq!(&sw[..2], &[0, 1]);
    }

    #[test]
    fn test_planar_rgb_output_order() {
        let (_, out) = reorder_indexes(VideoFormat::Rgba.info(), VideoFormat::Gbr.info(), None);
        // plane 0 holds G, plane 1 B, plane 2 R
        assert_eq!(out, [1, 2, 0, 3]);
    }

    #[test]
    fn test_bitdepth_factors() {
        let (i, o) = bitdepth_factors(VideoFormat::I420_10le.info());
        assert!((i - 65535.0 / 1023.0).abs() < 1e-3);
        assert!((o - 1023.0 / 65535.0).abs() < 1e-9);
        assert_eq!(bitdepth_factors(VideoFormat::I420.info()), (1.0, 1.0));
        assert_eq!(bitdepth_factors(VideoFormat::Y444_16le.info()), (1.0, 1.0));
        assert_eq!(bitdepth_factors(VideoFormat::P010_10le.info()), (1.0, 1.0));
        let (i, _) = bitdepth_factors(VideoFormat::I420_12le.info());
        assert!((i - 65535.0 / 4095.0).abs() < 1e-3);
    }
}
