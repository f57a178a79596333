//! Concrete format instances: format + dimensions + colorimetry + plane layout.

use crate::colorimetry::{ChromaSite, Colorimetry};
use crate::error::{Error, Result};
use crate::format::{FormatDescriptor, FormatShape, VideoFormat};
use crate::texture::TexelFormat;

/// How multiple views are stored in one frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum MultiviewMode {
    /// A single view.
    #[default]
    Mono,
    /// Each view has its own set of planes, stored one after the other.
    Separated,
}

/// Size and memory layout of one plane of one view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PlaneLayout {
    /// Width in texels.
    pub width: u32,
    /// Height in rows.
    pub height: u32,
    /// Native texel format.
    pub texel: TexelFormat,
    /// Bytes per row.
    pub stride: usize,
    /// Byte offset of the plane inside one view.
    pub offset: usize,
}

/// A fully specified video format instance.
#[derive(Debug, Clone, PartialEq)]
pub struct VideoInfo {
    /// Pixel format.
    pub format: VideoFormat,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Colorimetry.
    pub colorimetry: Colorimetry,
    /// Chroma siting.
    pub chroma_site: ChromaSite,
    /// Number of views.
    pub views: u32,
    /// Storage of multiple views.
    pub multiview_mode: MultiviewMode,
    planes: Vec<PlaneLayout>,
    size: usize,
}

impl VideoInfo {
    /// Describes a single-view frame with default colorimetry.
    pub fn new(format: VideoFormat, width: u32, height: u32) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(Error::InvalidDimensions {
                width,
                height,
                reason: "width and height must be non-zero".into(),
            });
        }
        let desc = format.info();
        let planes = plane_layouts(desc, width, height);
        let size = planes.iter().map(|p| p.stride * p.height as usize).sum();
        Ok(Self {
            format,
            width,
            height,
            colorimetry: Colorimetry::default_for(desc, height),
            chroma_site: ChromaSite::Unknown,
            views: 1,
            multiview_mode: MultiviewMode::Mono,
            planes,
            size,
        })
    }

    /// Replaces the colorimetry.
    pub fn with_colorimetry(mut self, colorimetry: Colorimetry) -> Self {
        self.colorimetry = colorimetry;
        self
    }

    /// Replaces the chroma siting.
    pub fn with_chroma_site(mut self, site: ChromaSite) -> Self {
        self.chroma_site = site;
        self
    }

    /// Stores `views` views as separate plane sets.
    pub fn with_views(mut self, views: u32) -> Self {
        self.views = views.max(1);
        self.multiview_mode = if self.views > 1 {
            MultiviewMode::Separated
        } else {
            MultiviewMode::Mono
        };
        self
    }

    /// Static descriptor of the format.
    #[inline]
    pub fn desc(&self) -> &'static FormatDescriptor {
        self.format.info()
    }

    /// Number of planes of one view.
    #[inline]
    pub fn n_planes(&self) -> usize {
        self.planes.len()
    }

    /// Layout of plane `index` of one view.
    #[inline]
    pub fn plane(&self, index: usize) -> Option<&PlaneLayout> {
        self.planes.get(index)
    }

    /// All plane layouts of one view.
    #[inline]
    pub fn planes(&self) -> &[PlaneLayout] {
        &self.planes
    }

    /// Bytes of one view.
    #[inline]
    pub fn size(&self) -> usize {
        self.size
    }

    /// Number of plane memories a frame of this info carries.
    #[inline]
    pub fn n_memories(&self) -> usize {
        self.n_planes() * self.views as usize
    }

    /// Whether a frame with `self` can be forwarded unchanged as `other`.
    ///
    /// Requires the same format, dimensions, plane layout, colorimetry,
    /// chroma siting and view layout.
    pub fn is_passthrough_compatible(&self, other: &VideoInfo) -> bool {
        self.format == other.format
            && self.width == other.width
            && self.height == other.height
            && self.size == other.size
            && self.planes == other.planes
            && self.colorimetry == other.colorimetry
            && self.chroma_site == other.chroma_site
            && self.views == other.views
            && self.multiview_mode == other.multiview_mode
    }
}

#[inline]
fn div_round_up(value: u32, log2: u32) -> u32 {
    (value + (1 << log2) - 1) >> log2
}

#[inline]
fn round_up(value: u32, multiple: u32) -> u32 {
    value.div_ceil(multiple) * multiple
}

fn plane_layouts(desc: &FormatDescriptor, width: u32, height: u32) -> Vec<PlaneLayout> {
    let mut planes = Vec::with_capacity(desc.n_planes as usize);
    let mut offset = 0usize;

    for p in 0..desc.n_planes as usize {
        let Some(texel) = desc.texel_format(p) else {
            continue;
        };
        let (w, h) = match desc.tile {
            Some(tile) => {
                let rows_per_chroma_tile = (tile.chroma_height * 2 / tile.luma_height).max(1);
                let luma_w = round_up(width, tile.luma_width);
                let luma_h = round_up(height, tile.luma_height * rows_per_chroma_tile);
                if p == 0 { (luma_w, luma_h) } else { (luma_w / 2, luma_h / 2) }
            }
            // six pixels per four 32-bit words
            None if desc.shape() == FormatShape::V210 => (width.div_ceil(6) * 4, height),
            None => {
                let c = desc.plane_component(p);
                (div_round_up(width, desc.w_sub[c]), div_round_up(height, desc.h_sub[c]))
            }
        };
        let stride = w as usize * texel.bytes_per_texel();
        planes.push(PlaneLayout { width: w, height: h, texel, stride, offset });
        offset += stride * h as usize;
    }
    planes
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_i420_layout() {
        let info = VideoInfo::new(VideoFormat::I420, 63, 33).unwrap();
        assert_eq!(info.n_planes(), 3);
        let u = info.plane(1).unwrap();
        assert_eq!((u.width, u.height), (32, 17));
        assert_eq!(info.plane(0).unwrap().stride, 63);
        assert_eq!(u.offset, 63 * 33);
        assert_eq!(info.size(), 63 * 33 + 2 * 32 * 17);
    }

    #[test]
    fn test_packed_422_layout() {
        let info = VideoInfo::new(VideoFormat::Yuy2, 16, 4).unwrap();
        let p = info.plane(0).unwrap();
        assert_eq!((p.width, p.height, p.stride), (16, 4, 32));
        assert_eq!(p.texel, TexelFormat::Rg8);
    }

    #[test]
    fn test_v210_layout() {
        let info = VideoInfo::new(VideoFormat::V210, 14, 2).unwrap();
        let p = info.plane(0).unwrap();
        assert_eq!((p.width, p.height, p.stride), (12, 2, 48));
        assert_eq!(p.texel, TexelFormat::Rgb10a2);
    }

    #[test]
    fn test_tiled_layout() {
        let info = VideoInfo::new(VideoFormat::Nv12_4l4, 10, 6).unwrap();
        let y = info.plane(0).unwrap();
        let uv = info.plane(1).unwrap();
        assert_eq!((y.width, y.height), (12, 8));
        assert_eq!((uv.width, uv.height), (6, 4));
    }

    #[test]
    fn test_zero_dimensions_rejected() {
        assert!(VideoInfo::new(VideoFormat::Rgba, 0, 4).is_err());
    }

    #[test]
    fn test_passthrough_compare() {
        let a = VideoInfo::new(VideoFormat::Nv12, 64, 48).unwrap();
        let b = a.clone();
        assert!(a.is_passthrough_compatible(&b));
        let c = a.clone().with_colorimetry(Colorimetry::BT709);
        assert!(!a.is_passthrough_compatible(&c));
        let d = a.clone().with_views(2);
        assert!(!a.is_passthrough_compatible(&d));
        assert_eq!(d.n_memories(), 4);
    }
}
