//! Pixel format descriptors.
//!
//! Every [`VideoFormat`] has one static [`FormatDescriptor`] describing how
//! its components are split over planes, their depth, chroma subsampling,
//! the texel format each plane is uploaded as and the channel order inside
//! those texels.
//!
//! # Usage
//!
//! ```rust
//! use texconv_core::format::{FormatFamily, FormatShape, VideoFormat};
//!
//! let nv12 = VideoFormat::Nv12.info();
//! assert_eq!(nv12.family(), FormatFamily::Yuv);
//! assert_eq!(nv12.shape(), FormatShape::SemiPlanar);
//! assert_eq!(nv12.chroma_factors(), (2, 2));
//!
//! let fmt: VideoFormat = "I420_10LE".parse().unwrap();
//! assert_eq!(fmt.info().bits, 10);
//! ```

use std::fmt;
use std::ops::BitOr;
use std::str::FromStr;

use crate::error::Error;
use crate::texture::TexelFormat;

/// Maximum number of components (and planes) of any format.
pub const MAX_COMPONENTS: usize = 4;

/// Format flag bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct FormatFlags(u32);

impl FormatFlags {
    /// No flags.
    pub const NONE: Self = Self(0);
    /// Y'CbCr color family.
    pub const YUV: Self = Self(1);
    /// RGB color family.
    pub const RGB: Self = Self(1 << 1);
    /// Single luma channel.
    pub const GRAY: Self = Self(1 << 2);
    /// Carries an alpha component.
    pub const ALPHA: Self = Self(1 << 3);
    /// Little-endian multi-byte samples.
    pub const LE: Self = Self(1 << 4);
    /// Indexed color with a palette plane.
    pub const PALETTE: Self = Self(1 << 5);
    /// Layout cannot be described by offsets and strides alone.
    pub const COMPLEX: Self = Self(1 << 6);
    /// Samples stored in tiles.
    pub const TILED: Self = Self(1 << 7);
    /// The color family bits.
    pub const COLORSPACE_MASK: Self = Self(1 | (1 << 1) | (1 << 2));

    /// Raw bits.
    #[inline]
    pub const fn bits(self) -> u32 {
        self.0
    }

    /// Union of two flag sets.
    #[inline]
    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    /// Intersection of two flag sets.
    #[inline]
    pub const fn intersect(self, other: Self) -> Self {
        Self(self.0 & other.0)
    }

    /// Flags in `self` that are not in `other`.
    #[inline]
    pub const fn difference(self, other: Self) -> Self {
        Self(self.0 & !other.0)
    }

    /// Whether every bit of `other` is set.
    #[inline]
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// Whether no bit is set.
    #[inline]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl BitOr for FormatFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        self.union(rhs)
    }
}

/// Color family of a format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FormatFamily {
    /// R'G'B'.
    Rgb,
    /// Y'CbCr.
    Yuv,
    /// Luma only.
    Gray,
}

/// Memory shape of a format, as far as shader selection cares.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FormatShape {
    /// All components interleaved in one texel.
    Packed,
    /// 4:2:2 luma/chroma interleaving over pixel pairs (YUY2, UYVY).
    Interleaved422,
    /// One component per plane.
    Planar,
    /// Luma plane plus one interleaved chroma plane.
    SemiPlanar,
    /// Semi-planar with tiled sample order.
    Tiled,
    /// 4:2:2 with three 10-bit components per 32-bit word, six pixels per
    /// four words (v210).
    V210,
}

/// Tile geometry of a tiled format, in texels of each plane.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TileLayout {
    /// Luma tile width.
    pub luma_width: u32,
    /// Luma tile height.
    pub luma_height: u32,
    /// Chroma tile width in two-channel texels.
    pub chroma_width: u32,
    /// Chroma tile height.
    pub chroma_height: u32,
}

/// Pixel formats understood by the converter.
#[allow(non_camel_case_types)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum VideoFormat {
    /// Packed 8-bit R, G, B, A.
    Rgba,
    /// Packed 8-bit B, G, R, A.
    Bgra,
    /// Packed 8-bit A, R, G, B.
    Argb,
    /// Packed 8-bit A, B, G, R.
    Abgr,
    /// Packed 8-bit R, G, B, padding.
    Rgbx,
    /// Packed 8-bit B, G, R, padding.
    Bgrx,
    /// Packed 8-bit padding, R, G, B.
    Xrgb,
    /// Packed 8-bit padding, B, G, R.
    Xbgr,
    /// Packed 8-bit R, G, B.
    Rgb,
    /// Packed 8-bit B, G, R.
    Bgr,
    /// R 5, G 6, B 5 bits in a little-endian 16-bit word, R in the high bits.
    Rgb16,
    /// B 5, G 6, R 5 bits in a little-endian 16-bit word, B in the high bits.
    Bgr16,
    /// Packed 8-bit R, B, G, A.
    Rbga,
    /// Packed 16-bit little-endian R, G, B, A.
    Rgba64Le,
    /// Packed 16-bit A, R, G, B.
    Argb64,
    /// 10-bit R, G, B and 2-bit A in a little-endian 32-bit word.
    Rgb10a2Le,
    /// 10-bit B, G, R and 2-bit A in a little-endian 32-bit word.
    Bgr10a2Le,
    /// Planar 8-bit G, B, R.
    Gbr,
    /// Planar 8-bit G, B, R, A.
    Gbra,
    /// Planar 8-bit R, G, B.
    Rgbp,
    /// Planar 8-bit B, G, R.
    Bgrp,
    /// Planar 10-bit G, B, R in 16-bit little-endian containers.
    Gbr10Le,
    /// Planar 10-bit G, B, R, A in 16-bit little-endian containers.
    Gbra10Le,
    /// 8-bit palette indices plus palette plane.
    Rgb8p,
    /// 8-bit gray.
    Gray8,
    /// 16-bit little-endian gray.
    Gray16Le,
    /// 16-bit big-endian gray.
    Gray16Be,
    /// Packed 8-bit A, Y, U, V.
    Ayuv,
    /// Packed 8-bit V, U, Y, A.
    Vuya,
    /// 10-bit U, Y, V and 2-bit A in a little-endian 32-bit word.
    Y410,
    /// Packed 16-bit little-endian U, Y, V, A holding 12 significant bits.
    Y412Le,
    /// Packed 4:2:2 Y0, U, Y1, V.
    Yuy2,
    /// Packed 4:2:2 U, Y0, V, Y1.
    Uyvy,
    /// YUY2 order in 16-bit little-endian words, 10 significant high bits.
    Y210,
    /// YUY2 order in 16-bit little-endian words, 12 significant high bits.
    Y212Le,
    /// Packed 10-bit 4:2:2, six pixels in four 32-bit words.
    V210,
    /// Planar 4:2:0 Y, U, V.
    I420,
    /// Planar 4:2:0 Y, V, U.
    Yv12,
    /// Planar 4:2:2.
    Y42b,
    /// Planar 4:1:1.
    Y41b,
    /// Planar 4:4:4.
    Y444,
    /// Planar 4:2:0 with alpha.
    A420,
    /// Planar 4:2:2 with alpha.
    A422,
    /// Planar 4:4:4 with alpha.
    A444,
    /// Planar 4:2:0, 10 bits in 16-bit little-endian containers.
    I420_10le,
    /// Planar 4:2:0, 12 bits in 16-bit little-endian containers.
    I420_12le,
    /// Planar 4:2:2, 10 bits in 16-bit little-endian containers.
    I422_10le,
    /// Planar 4:2:2, 12 bits in 16-bit little-endian containers.
    I422_12le,
    /// Planar 4:4:4, 10 bits in 16-bit little-endian containers.
    Y444_10le,
    /// Planar 4:4:4, 16-bit little-endian.
    Y444_16le,
    /// Planar 4:2:0 with alpha, 10 bits in 16-bit little-endian containers.
    A420_10le,
    /// Planar 4:2:0 with alpha, 12 bits in 16-bit little-endian containers.
    A420_12le,
    /// Planar 4:2:0 with alpha, 16-bit little-endian.
    A420_16le,
    /// Planar 4:2:2 with alpha, 10 bits in 16-bit little-endian containers.
    A422_10le,
    /// Planar 4:2:2 with alpha, 12 bits in 16-bit little-endian containers.
    A422_12le,
    /// Planar 4:2:2 with alpha, 16-bit little-endian.
    A422_16le,
    /// Planar 4:4:4 with alpha, 10 bits in 16-bit little-endian containers.
    A444_10le,
    /// Planar 4:4:4 with alpha, 12 bits in 16-bit little-endian containers.
    A444_12le,
    /// Planar 4:4:4 with alpha, 16-bit little-endian.
    A444_16le,
    /// Semi-planar 4:2:0, U/V interleaved.
    Nv12,
    /// Semi-planar 4:2:0, V/U interleaved.
    Nv21,
    /// Semi-planar 4:2:2, U/V interleaved.
    Nv16,
    /// Semi-planar 4:2:2, V/U interleaved.
    Nv61,
    /// Semi-planar 4:2:0 with an alpha plane.
    Av12,
    /// Semi-planar 4:2:0, 10 bits in the high bits of 16-bit words.
    P010_10le,
    /// Semi-planar 4:2:0, 12 bits in the high bits of 16-bit words.
    P012le,
    /// Semi-planar 4:2:0, 16-bit.
    P016le,
    /// NV12 in 4x4 tiles.
    Nv12_4l4,
    /// NV12 in 16x32 luma tiles with 8x16 chroma tiles.
    Nv12_16l32s,
}

impl VideoFormat {
    /// Every format, in declaration order.
    pub const ALL: [VideoFormat; 69] = [
        Self::Rgba, Self::Bgra, Self::Argb, Self::Abgr, Self::Rgbx, Self::Bgrx, Self::Xrgb,
        Self::Xbgr, Self::Rgb, Self::Bgr, Self::Rgb16, Self::Bgr16, Self::Rbga, Self::Rgba64Le,
        Self::Argb64, Self::Rgb10a2Le, Self::Bgr10a2Le, Self::Gbr, Self::Gbra, Self::Rgbp,
        Self::Bgrp, Self::Gbr10Le, Self::Gbra10Le, Self::Rgb8p, Self::Gray8, Self::Gray16Le,
        Self::Gray16Be, Self::Ayuv, Self::Vuya, Self::Y410, Self::Y412Le, Self::Yuy2,
        Self::Uyvy, Self::Y210, Self::Y212Le, Self::V210, Self::I420, Self::Yv12, Self::Y42b,
        Self::Y41b, Self::Y444, Self::A420, Self::A422, Self::A444, Self::I420_10le,
        Self::I420_12le, Self::I422_10le, Self::I422_12le, Self::Y444_10le, Self::Y444_16le,
        Self::A420_10le, Self::A420_12le, Self::A420_16le, Self::A422_10le, Self::A422_12le,
        Self::A422_16le, Self::A444_10le, Self::A444_12le, Self::A444_16le, Self::Nv12,
        Self::Nv21, Self::Nv16, Self::Nv61, Self::Av12, Self::P010_10le, Self::P012le,
        Self::P016le, Self::Nv12_4l4, Self::Nv12_16l32s,
    ];

    /// Static descriptor of this format.
    #[inline]
    pub fn info(self) -> &'static FormatDescriptor {
        &FORMAT_TABLE[self as usize]
    }

    /// Canonical upper-case name.
    #[inline]
    pub fn name(self) -> &'static str {
        self.info().name
    }
}

impl fmt::Display for VideoFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for VideoFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|f| f.name() == s)
            .ok_or_else(|| Error::UnknownFormat { name: s.to_string() })
    }
}

/// Static layout description of a [`VideoFormat`].
///
/// Indices in the per-component arrays follow the canonical order
/// `R, G, B, A` for RGB formats and `Y, U, V, A` for YUV formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormatDescriptor {
    /// The format being described.
    pub format: VideoFormat,
    /// Canonical name.
    pub name: &'static str,
    /// Family and layout flags.
    pub flags: FormatFlags,
    /// Significant bits per component.
    pub bits: u32,
    /// Number of components.
    pub n_components: u32,
    /// Number of planes.
    pub n_planes: u32,
    /// Plane holding each component.
    pub plane: [u32; MAX_COMPONENTS],
    /// Depth of each component.
    pub depth: [u32; MAX_COMPONENTS],
    /// Log2 horizontal subsampling of each component.
    pub w_sub: [u32; MAX_COMPONENTS],
    /// Log2 vertical subsampling of each component.
    pub h_sub: [u32; MAX_COMPONENTS],
    /// Texel channel feeding each canonical component when reading.
    pub swizzle: [i32; MAX_COMPONENTS],
    /// Texel format each plane is uploaded as.
    pub plane_texels: [Option<TexelFormat>; MAX_COMPONENTS],
    /// Tile geometry, for tiled formats.
    pub tile: Option<TileLayout>,
}

impl FormatDescriptor {
    /// Color family.
    pub fn family(&self) -> FormatFamily {
        if self.is_yuv() {
            FormatFamily::Yuv
        } else if self.is_gray() {
            FormatFamily::Gray
        } else {
            FormatFamily::Rgb
        }
    }

    /// Memory shape.
    pub fn shape(&self) -> FormatShape {
        if self.is_tiled() {
            FormatShape::Tiled
        } else if self.format == VideoFormat::V210 {
            FormatShape::V210
        } else if matches!(
            self.format,
            VideoFormat::Yuy2 | VideoFormat::Uyvy | VideoFormat::Y210 | VideoFormat::Y212Le
        ) {
            FormatShape::Interleaved422
        } else if self.is_planar() {
            FormatShape::Planar
        } else if self.is_semi_planar() {
            FormatShape::SemiPlanar
        } else {
            FormatShape::Packed
        }
    }

    /// Y'CbCr family.
    #[inline]
    pub fn is_yuv(&self) -> bool {
        self.flags.contains(FormatFlags::YUV)
    }

    /// RGB family.
    #[inline]
    pub fn is_rgb(&self) -> bool {
        self.flags.contains(FormatFlags::RGB)
    }

    /// Gray family.
    #[inline]
    pub fn is_gray(&self) -> bool {
        self.flags.contains(FormatFlags::GRAY)
    }

    /// Carries alpha.
    #[inline]
    pub fn has_alpha(&self) -> bool {
        self.flags.contains(FormatFlags::ALPHA)
    }

    /// Indexed color.
    #[inline]
    pub fn has_palette(&self) -> bool {
        self.flags.contains(FormatFlags::PALETTE)
    }

    /// Tiled sample order.
    #[inline]
    pub fn is_tiled(&self) -> bool {
        self.flags.contains(FormatFlags::TILED)
    }

    /// One plane per component. Single-plane formats are packed.
    #[inline]
    pub fn is_planar(&self) -> bool {
        self.n_planes > 1 && self.n_planes == self.n_components
    }

    /// Luma plane plus interleaved chroma plane.
    #[inline]
    pub fn is_semi_planar(&self) -> bool {
        self.n_planes > 1 && self.n_planes < self.n_components && !self.has_palette()
    }

    /// Log2 chroma subsampling `(w, h)`, zero for formats without chroma.
    #[inline]
    pub fn chroma_subsampling(&self) -> (u32, u32) {
        (self.w_sub[1], self.h_sub[1])
    }

    /// Chroma decimation factors `(w, h)`.
    #[inline]
    pub fn chroma_factors(&self) -> (u32, u32) {
        let (w, h) = self.chroma_subsampling();
        (1 << w, 1 << h)
    }

    /// First component stored in `plane`.
    pub fn plane_component(&self, plane: usize) -> usize {
        (0..self.n_components as usize)
            .find(|&c| self.plane[c] as usize == plane)
            .unwrap_or(0)
    }

    /// Native texel format of `plane`.
    #[inline]
    pub fn texel_format(&self, plane: usize) -> Option<TexelFormat> {
        self.plane_texels.get(plane).copied().flatten()
    }
}

// =============================================================================
// Descriptor table
// =============================================================================

const RGBA_ORDER: [i32; 4] = [0, 1, 2, 3];
const BGRA_ORDER: [i32; 4] = [2, 1, 0, 3];
const ARGB_ORDER: [i32; 4] = [1, 2, 3, 0];
const ABGR_ORDER: [i32; 4] = [3, 2, 1, 0];
const GBR_ORDER: [i32; 4] = [2, 0, 1, 3];
const SWAP_UV: [i32; 4] = [0, 2, 1, 3];
const UYVA_ORDER: [i32; 4] = [1, 0, 2, 3];

const SUB_420: ([u32; 4], [u32; 4]) = ([0, 1, 1, 0], [0, 1, 1, 0]);
const SUB_422: ([u32; 4], [u32; 4]) = ([0, 1, 1, 0], [0, 0, 0, 0]);
const SUB_411: ([u32; 4], [u32; 4]) = ([0, 2, 2, 0], [0, 0, 0, 0]);
const SUB_444: ([u32; 4], [u32; 4]) = ([0; 4], [0; 4]);

const fn depths(bits: u32, n: u32) -> [u32; 4] {
    let mut d = [0u32; 4];
    let mut i = 0;
    while i < n as usize {
        d[i] = bits;
        i += 1;
    }
    d
}

const fn packed(
    format: VideoFormat,
    name: &'static str,
    flags: FormatFlags,
    bits: u32,
    n_components: u32,
    swizzle: [i32; 4],
    texel: TexelFormat,
) -> FormatDescriptor {
    FormatDescriptor {
        format,
        name,
        flags,
        bits,
        n_components,
        n_planes: 1,
        plane: [0; 4],
        depth: depths(bits, n_components),
        w_sub: [0; 4],
        h_sub: [0; 4],
        swizzle,
        plane_texels: [Some(texel), None, None, None],
        tile: None,
    }
}

const fn planar(
    format: VideoFormat,
    name: &'static str,
    flags: FormatFlags,
    bits: u32,
    n_components: u32,
    plane: [u32; 4],
    sub: ([u32; 4], [u32; 4]),
    swizzle: [i32; 4],
    texel: TexelFormat,
) -> FormatDescriptor {
    let mut plane_texels = [None; 4];
    let mut i = 0;
    while i < n_components as usize {
        plane_texels[i] = Some(texel);
        i += 1;
    }
    FormatDescriptor {
        format,
        name,
        flags,
        bits,
        n_components,
        n_planes: n_components,
        plane,
        depth: depths(bits, n_components),
        w_sub: sub.0,
        h_sub: sub.1,
        swizzle,
        plane_texels,
        tile: None,
    }
}

const fn semi_planar(
    format: VideoFormat,
    name: &'static str,
    flags: FormatFlags,
    bits: u32,
    sub: ([u32; 4], [u32; 4]),
    swizzle: [i32; 4],
    luma: TexelFormat,
    chroma: TexelFormat,
) -> FormatDescriptor {
    FormatDescriptor {
        format,
        name,
        flags,
        bits,
        n_components: 3,
        n_planes: 2,
        plane: [0, 1, 1, 0],
        depth: depths(bits, 3),
        w_sub: sub.0,
        h_sub: sub.1,
        swizzle,
        plane_texels: [Some(luma), Some(chroma), None, None],
        tile: None,
    }
}

const fn with_alpha_plane(mut d: FormatDescriptor) -> FormatDescriptor {
    d.n_components = 4;
    d.n_planes = 3;
    d.plane = [0, 1, 1, 2];
    d.depth[3] = d.bits;
    d.plane_texels[2] = d.plane_texels[0];
    d.flags = d.flags.union(FormatFlags::ALPHA);
    d
}

const fn with_rgb10a2_alpha(mut d: FormatDescriptor) -> FormatDescriptor {
    d.depth[3] = 2;
    d
}

const fn with_565_depth(mut d: FormatDescriptor) -> FormatDescriptor {
    d.depth = [5, 6, 5, 0];
    d
}

const fn tiled(mut d: FormatDescriptor, tile: TileLayout) -> FormatDescriptor {
    d.flags = d.flags.union(FormatFlags::TILED).union(FormatFlags::COMPLEX);
    d.tile = Some(tile);
    d
}

const fn palette() -> FormatDescriptor {
    FormatDescriptor {
        format: VideoFormat::Rgb8p,
        name: "RGB8P",
        flags: FormatFlags::RGB.union(FormatFlags::PALETTE).union(FormatFlags::ALPHA),
        bits: 8,
        n_components: 4,
        n_planes: 2,
        plane: [0; 4],
        depth: [8; 4],
        w_sub: [0; 4],
        h_sub: [0; 4],
        swizzle: RGBA_ORDER,
        plane_texels: [Some(TexelFormat::R8), Some(TexelFormat::Rgba8), None, None],
        tile: None,
    }
}

use FormatFlags as F;
use TexelFormat as T;
use VideoFormat as V;

const RGB: FormatFlags = F::RGB;
const RGBA: FormatFlags = F::RGB.union(F::ALPHA);
const RGBA_LE: FormatFlags = RGBA.union(F::LE);
const RGB_LE: FormatFlags = F::RGB.union(F::LE);
const YUV: FormatFlags = F::YUV;
const YUVA: FormatFlags = F::YUV.union(F::ALPHA);
const YUV_LE: FormatFlags = F::YUV.union(F::LE);
const YUVA_LE: FormatFlags = YUVA.union(F::LE);

static FORMAT_TABLE: [FormatDescriptor; 69] = [
    packed(V::Rgba, "RGBA", RGBA, 8, 4, RGBA_ORDER, T::Rgba8),
    packed(V::Bgra, "BGRA", RGBA, 8, 4, BGRA_ORDER, T::Rgba8),
    packed(V::Argb, "ARGB", RGBA, 8, 4, ARGB_ORDER, T::Rgba8),
    packed(V::Abgr, "ABGR", RGBA, 8, 4, ABGR_ORDER, T::Rgba8),
    packed(V::Rgbx, "RGBx", RGB, 8, 3, RGBA_ORDER, T::Rgba8),
    packed(V::Bgrx, "BGRx", RGB, 8, 3, BGRA_ORDER, T::Rgba8),
    packed(V::Xrgb, "xRGB", RGB, 8, 3, ARGB_ORDER, T::Rgba8),
    packed(V::Xbgr, "xBGR", RGB, 8, 3, ABGR_ORDER, T::Rgba8),
    packed(V::Rgb, "RGB", RGB, 8, 3, RGBA_ORDER, T::Rgb8),
    packed(V::Bgr, "BGR", RGB, 8, 3, BGRA_ORDER, T::Rgb8),
    with_565_depth(packed(V::Rgb16, "RGB16", RGB_LE, 5, 3, RGBA_ORDER, T::Rgb565)),
    with_565_depth(packed(V::Bgr16, "BGR16", RGB_LE, 5, 3, BGRA_ORDER, T::Rgb565)),
    packed(V::Rbga, "RBGA", RGBA, 8, 4, SWAP_UV, T::Rgba8),
    packed(V::Rgba64Le, "RGBA64_LE", RGBA_LE, 16, 4, RGBA_ORDER, T::Rgba16),
    packed(V::Argb64, "ARGB64", RGBA_LE, 16, 4, ARGB_ORDER, T::Rgba16),
    with_rgb10a2_alpha(packed(V::Rgb10a2Le, "RGB10A2_LE", RGBA_LE, 10, 4, RGBA_ORDER, T::Rgb10a2)),
    with_rgb10a2_alpha(packed(V::Bgr10a2Le, "BGR10A2_LE", RGBA_LE, 10, 4, BGRA_ORDER, T::Rgb10a2)),
    planar(V::Gbr, "GBR", RGB, 8, 3, [2, 0, 1, 3], SUB_444, GBR_ORDER, T::R8),
    planar(V::Gbra, "GBRA", RGBA, 8, 4, [2, 0, 1, 3], SUB_444, GBR_ORDER, T::R8),
    planar(V::Rgbp, "RGBP", RGB, 8, 3, [0, 1, 2, 3], SUB_444, RGBA_ORDER, T::R8),
    planar(V::Bgrp, "BGRP", RGB, 8, 3, [2, 1, 0, 3], SUB_444, BGRA_ORDER, T::R8),
    planar(V::Gbr10Le, "GBR_10LE", RGB_LE, 10, 3, [2, 0, 1, 3], SUB_444, GBR_ORDER, T::R16),
    planar(V::Gbra10Le, "GBRA_10LE", RGBA_LE, 10, 4, [2, 0, 1, 3], SUB_444, GBR_ORDER, T::R16),
    palette(),
    packed(V::Gray8, "GRAY8", F::GRAY, 8, 1, [0, 0, 0, 3], T::R8),
    packed(V::Gray16Le, "GRAY16_LE", F::GRAY.union(F::LE), 16, 1, [1, 0, 2, 3], T::Rg8),
    packed(V::Gray16Be, "GRAY16_BE", F::GRAY, 16, 1, [0, 1, 2, 3], T::Rg8),
    packed(V::Ayuv, "AYUV", YUVA, 8, 4, ARGB_ORDER, T::Rgba8),
    packed(V::Vuya, "VUYA", YUVA, 8, 4, BGRA_ORDER, T::Rgba8),
    with_rgb10a2_alpha(packed(V::Y410, "Y410", YUVA_LE, 10, 4, UYVA_ORDER, T::Rgb10a2)),
    packed(V::Y412Le, "Y412_LE", YUVA_LE, 12, 4, UYVA_ORDER, T::Rgba16),
    FormatDescriptor {
        w_sub: SUB_422.0,
        ..packed(V::Yuy2, "YUY2", YUV, 8, 3, [0, 1, 1, 2], T::Rg8)
    },
    FormatDescriptor {
        w_sub: SUB_422.0,
        ..packed(V::Uyvy, "UYVY", YUV, 8, 3, [1, 0, 0, 0], T::Rg8)
    },
    FormatDescriptor {
        w_sub: SUB_422.0,
        ..packed(V::Y210, "Y210", YUV_LE, 10, 3, [0, 1, 1, 2], T::Rg16)
    },
    FormatDescriptor {
        w_sub: SUB_422.0,
        ..packed(V::Y212Le, "Y212_LE", YUV_LE, 12, 3, [0, 1, 1, 2], T::Rg16)
    },
    FormatDescriptor {
        w_sub: SUB_422.0,
        ..packed(V::V210, "v210", YUV_LE, 10, 3, RGBA_ORDER, T::Rgb10a2)
    },
    planar(V::I420, "I420", YUV, 8, 3, [0, 1, 2, 3], SUB_420, RGBA_ORDER, T::R8),
    planar(V::Yv12, "YV12", YUV, 8, 3, [0, 2, 1, 3], SUB_420, SWAP_UV, T::R8),
    planar(V::Y42b, "Y42B", YUV, 8, 3, [0, 1, 2, 3], SUB_422, RGBA_ORDER, T::R8),
    planar(V::Y41b, "Y41B", YUV, 8, 3, [0, 1, 2, 3], SUB_411, RGBA_ORDER, T::R8),
    planar(V::Y444, "Y444", YUV, 8, 3, [0, 1, 2, 3], SUB_444, RGBA_ORDER, T::R8),
    planar(V::A420, "A420", YUVA, 8, 4, [0, 1, 2, 3], SUB_420, RGBA_ORDER, T::R8),
    planar(V::A422, "A422", YUVA, 8, 4, [0, 1, 2, 3], SUB_422, RGBA_ORDER, T::R8),
    planar(V::A444, "A444", YUVA, 8, 4, [0, 1, 2, 3], SUB_444, RGBA_ORDER, T::R8),
    planar(V::I420_10le, "I420_10LE", YUV_LE, 10, 3, [0, 1, 2, 3], SUB_420, RGBA_ORDER, T::R16),
    planar(V::I420_12le, "I420_12LE", YUV_LE, 12, 3, [0, 1, 2, 3], SUB_420, RGBA_ORDER, T::R16),
    planar(V::I422_10le, "I422_10LE", YUV_LE, 10, 3, [0, 1, 2, 3], SUB_422, RGBA_ORDER, T::R16),
    planar(V::I422_12le, "I422_12LE", YUV_LE, 12, 3, [0, 1, 2, 3], SUB_422, RGBA_ORDER, T::R16),
    planar(V::Y444_10le, "Y444_10LE", YUV_LE, 10, 3, [0, 1, 2, 3], SUB_444, RGBA_ORDER, T::R16),
    planar(V::Y444_16le, "Y444_16LE", YUV_LE, 16, 3, [0, 1, 2, 3], SUB_444, RGBA_ORDER, T::R16),
    planar(V::A420_10le, "A420_10LE", YUVA_LE, 10, 4, [0, 1, 2, 3], SUB_420, RGBA_ORDER, T::R16),
    planar(V::A420_12le, "A420_12LE", YUVA_LE, 12, 4, [0, 1, 2, 3], SUB_420, RGBA_ORDER, T::R16),
    planar(V::A420_16le, "A420_16LE", YUVA_LE, 16, 4, [0, 1, 2, 3], SUB_420, RGBA_ORDER, T::R16),
    planar(V::A422_10le, "A422_10LE", YUVA_LE, 10, 4, [0, 1, 2, 3], SUB_422, RGBA_ORDER, T::R16),
    planar(V::A422_12le, "A422_12LE", YUVA_LE, 12, 4, [0, 1, 2, 3], SUB_422, RGBA_ORDER, T::R16),
    planar(V::A422_16le, "A422_16LE", YUVA_LE, 16, 4, [0, 1, 2, 3], SUB_422, RGBA_ORDER, T::R16),
    planar(V::A444_10le, "A444_10LE", YUVA_LE, 10, 4, [0, 1, 2, 3], SUB_444, RGBA_ORDER, T::R16),
    planar(V::A444_12le, "A444_12LE", YUVA_LE, 12, 4, [0, 1, 2, 3], SUB_444, RGBA_ORDER, T::R16),
    planar(V::A444_16le, "A444_16LE", YUVA_LE, 16, 4, [0, 1, 2, 3], SUB_444, RGBA_ORDER, T::R16),
    semi_planar(V::Nv12, "NV12", YUV, 8, SUB_420, RGBA_ORDER, T::R8, T::Rg8),
    semi_planar(V::Nv21, "NV21", YUV, 8, SUB_420, SWAP_UV, T::R8, T::Rg8),
    semi_planar(V::Nv16, "NV16", YUV, 8, SUB_422, RGBA_ORDER, T::R8, T::Rg8),
    semi_planar(V::Nv61, "NV61", YUV, 8, SUB_422, SWAP_UV, T::R8, T::Rg8),
    with_alpha_plane(semi_planar(V::Av12, "AV12", YUV, 8, SUB_420, RGBA_ORDER, T::R8, T::Rg8)),
    semi_planar(V::P010_10le, "P010_10LE", YUV_LE, 10, SUB_420, RGBA_ORDER, T::R16, T::Rg16),
    semi_planar(V::P012le, "P012_LE", YUV_LE, 12, SUB_420, RGBA_ORDER, T::R16, T::Rg16),
    semi_planar(V::P016le, "P016_LE", YUV_LE, 16, SUB_420, RGBA_ORDER, T::R16, T::Rg16),
    tiled(
        semi_planar(V::Nv12_4l4, "NV12_4L4", YUV, 8, SUB_420, RGBA_ORDER, T::R8, T::Rg8),
        TileLayout { luma_width: 4, luma_height: 4, chroma_width: 2, chroma_height: 4 },
    ),
    tiled(
        semi_planar(V::Nv12_16l32s, "NV12_16L32S", YUV, 8, SUB_420, RGBA_ORDER, T::R8, T::Rg8),
        TileLayout { luma_width: 16, luma_height: 32, chroma_width: 8, chroma_height: 16 },
    ),
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_matches_enum_order() {
        for (i, format) in VideoFormat::ALL.iter().enumerate() {
            assert_eq!(FORMAT_TABLE[i].format, *format, "table entry {} out of order", i);
            assert_eq!(*format as usize, i);
        }
    }

    #[test]
    fn test_descriptor_invariants() {
        for format in VideoFormat::ALL {
            let info = format.info();
            assert!(info.n_planes <= info.n_components, "{}", info.name);
            assert!(info.n_planes >= 1, "{}", info.name);
            for p in 0..info.n_planes as usize {
                assert!(info.texel_format(p).is_some(), "{} plane {}", info.name, p);
            }
            let (w, h) = info.chroma_factors();
            assert!(w.is_power_of_two() && h.is_power_of_two());
            let families = info.flags.intersect(FormatFlags::COLORSPACE_MASK).bits().count_ones();
            assert_eq!(families, 1, "{}", info.name);
        }
    }

    #[test]
    fn test_shapes() {
        assert_eq!(VideoFormat::Rgba.info().shape(), FormatShape::Packed);
        assert_eq!(VideoFormat::Yuy2.info().shape(), FormatShape::Interleaved422);
        assert_eq!(VideoFormat::I420.info().shape(), FormatShape::Planar);
        assert_eq!(VideoFormat::Gbra.info().shape(), FormatShape::Planar);
        assert_eq!(VideoFormat::Av12.info().shape(), FormatShape::SemiPlanar);
        assert_eq!(VideoFormat::Nv12_4l4.info().shape(), FormatShape::Tiled);
        assert_eq!(VideoFormat::Gray8.info().shape(), FormatShape::Packed);
        assert_eq!(VideoFormat::Y210.info().shape(), FormatShape::Interleaved422);
        assert_eq!(VideoFormat::V210.info().shape(), FormatShape::V210);
        assert_eq!(VideoFormat::Y410.info().shape(), FormatShape::Packed);
        assert!(!VideoFormat::Rgb8p.info().is_semi_planar());
    }

    #[test]
    fn test_name_roundtrip() {
        for format in VideoFormat::ALL {
            assert_eq!(format.name().parse::<VideoFormat>().unwrap(), format);
        }
        assert!("NOPE".parse::<VideoFormat>().is_err());
    }

    #[test]
    fn test_component_layout() {
        let yv12 = VideoFormat::Yv12.info();
        assert_eq!(yv12.plane_component(1), 2);
        assert_eq!(yv12.plane_component(2), 1);

        let av12 = VideoFormat::Av12.info();
        assert!(av12.has_alpha());
        assert_eq!(av12.n_planes, 3);
        assert_eq!(av12.plane_component(2), 3);

        let rgb10 = VideoFormat::Rgb10a2Le.info();
        assert_eq!(rgb10.depth, [10, 10, 10, 2]);
        assert_eq!(VideoFormat::Y41b.info().chroma_factors(), (4, 1));

        let y410 = VideoFormat::Y410.info();
        assert_eq!(y410.depth, [10, 10, 10, 2]);
        assert_eq!(y410.swizzle[0], 1);
        assert_eq!(VideoFormat::Rgb16.info().depth, [5, 6, 5, 0]);
        assert_eq!(VideoFormat::V210.info().chroma_factors(), (2, 1));
        assert_eq!(VideoFormat::A422_12le.info().n_planes, 4);
        assert_eq!(VideoFormat::P012le.info().bits, 12);
    }
}
