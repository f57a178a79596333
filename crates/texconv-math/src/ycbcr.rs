//! Colorimetry driven conversion matrices.
//!
//! Texel values arrive in shaders normalized to `[0, 1]` by the texture
//! unit. [`to_rgb_matrix`] maps those values of an input format to
//! full-range R'G'B', [`to_yuv_matrix`] maps full-range R'G'B' to the
//! normalized texel values of an output format.

use texconv_core::{ColorMatrix, ColorRange, FormatDescriptor, VideoInfo};

use crate::mat4::Matrix4;

/// Luma weights used when a format carries no usable matrix.
const FALLBACK_MATRIX: ColorMatrix = ColorMatrix::Bt709;

/// Integer offsets and scales of the first four components.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RangeOffsets {
    /// Code value of zero (black / neutral chroma).
    pub offset: [i64; 4],
    /// Code value span of the nominal range.
    pub scale: [i64; 4],
}

/// Offsets and scales of `desc` samples in `range`.
///
/// Full range places neutral chroma at `1 << (depth - 1)` and spans
/// `2^depth - 1`. Limited range places black at `16 << (depth - 8)`, spans
/// `219 << (depth - 8)` for luma and `224 << (depth - 8)` for chroma. Alpha is
/// always full range.
pub fn range_offsets(range: ColorRange, desc: &FormatDescriptor) -> RangeOffsets {
    let yuv = desc.is_yuv();
    let depth = component_depths(desc);
    let mut offset = [0i64; 4];
    let mut scale = [0i64; 4];

    for c in 0..4 {
        let d = depth[c] as i64;
        let chroma = yuv && (c == 1 || c == 2);
        match range {
            ColorRange::Limited if c < 3 => {
                offset[c] = if chroma { 1 << (d - 1) } else { 1 << (d - 4) };
                scale[c] = rescale(if chroma { 224 } else { 219 }, d);
            }
            _ => {
                offset[c] = if chroma { 1 << (d - 1) } else { 0 };
                scale[c] = (1 << d) - 1;
            }
        }
    }
    RangeOffsets { offset, scale }
}

/// Matrix from the normalized texel values of `info` to full-range R'G'B'.
///
/// Removes the range offset, stretches to full scale, then applies the
/// Y'CbCr to R'G'B' transform for YUV formats.
pub fn to_rgb_matrix(info: &VideoInfo) -> Matrix4 {
    let desc = info.desc();
    let depth = max_values(desc);
    let RangeOffsets { offset, scale } = range_offsets(info.colorimetry.range, desc);

    let mut m = Matrix4::IDENTITY
        .offset_components(
            -(offset[0] as f64) / depth[0],
            -(offset[1] as f64) / depth[1],
            -(offset[2] as f64) / depth[2],
        )
        .scale_components(
            depth[0] / scale[0] as f64,
            depth[1] / scale[1] as f64,
            depth[2] / scale[2] as f64,
            1.0,
        );

    if desc.is_yuv() {
        if let Some((kr, kb)) = info.colorimetry.matrix.kr_kb() {
            m = m.ycbcr_to_rgb(kr, kb);
        }
    }
    m
}

/// Matrix from full-range R'G'B' to the normalized texel values of `info`.
///
/// Applies R'G'B' to Y'CbCr for YUV formats (luma only matters for gray),
/// compresses to the nominal range and adds the range offset.
pub fn to_yuv_matrix(info: &VideoInfo) -> Matrix4 {
    let desc = info.desc();
    let mut m = Matrix4::IDENTITY;

    if desc.is_yuv() || desc.is_gray() {
        let weights = info
            .colorimetry
            .matrix
            .kr_kb()
            .or_else(|| FALLBACK_MATRIX.kr_kb());
        if let Some((kr, kb)) = weights {
            m = m.rgb_to_ycbcr(kr, kb);
        }
    }

    let depth = max_values(desc);
    let RangeOffsets { offset, scale } = range_offsets(info.colorimetry.range, desc);
    m.scale_components(
        scale[0] as f64 / depth[0],
        scale[1] as f64 / depth[1],
        scale[2] as f64 / depth[2],
        1.0,
    )
    .offset_components(
        offset[0] as f64 / depth[0],
        offset[1] as f64 / depth[1],
        offset[2] as f64 / depth[2],
    )
}

/// Component depths, with missing components taking the first depth.
/// `v`, an 8-bit code span, moved to `depth` bits.
fn rescale(v: i64, depth: i64) -> i64 {
    if depth >= 8 { v << (depth - 8) } else { v >> (8 - depth) }
}

fn component_depths(desc: &FormatDescriptor) -> [u32; 4] {
    let mut depth = desc.depth;
    for c in desc.n_components as usize..4 {
        depth[c] = desc.depth[0];
    }
    // gray: chroma slots behave like luma
    if desc.n_components < 3 {
        depth[1] = desc.depth[0];
        depth[2] = desc.depth[0];
    }
    depth
}

fn max_values(desc: &FormatDescriptor) -> [f64; 4] {
    component_depths(desc).map(|d| ((1u64 << d) - 1) as f64)
}
