//! Capability flags reported by a GPU device.

use crate::texture::TexelFormat;

/// Features of a GPU device that decide which conversions are possible.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceCapabilities {
    /// Device or adapter name, for logs.
    pub name: String,
    /// Shading language level; 100 is a GLES2-class device.
    pub shading_language_version: u32,
    /// Maximum number of simultaneous color attachments.
    pub max_draw_buffers: u32,
    /// Integer texel fetch in fragment shaders.
    pub texel_fetch: bool,
    /// One and two channel color textures.
    pub rg_textures: bool,
    /// Rendering into two channel targets and reading them back.
    pub rg_render: bool,
    /// Sampling platform external images.
    pub external_textures: bool,
    /// Rectangle (unnormalized) texture addressing.
    pub rectangle_textures: bool,
    /// Texel formats that can be created and sampled.
    pub texel_formats: Vec<TexelFormat>,
}

impl DeviceCapabilities {
    /// A modern device supporting everything the converter can use.
    pub fn full() -> Self {
        Self {
            name: "full".into(),
            shading_language_version: 450,
            max_draw_buffers: 4,
            texel_fetch: true,
            rg_textures: true,
            rg_render: true,
            external_textures: true,
            rectangle_textures: true,
            texel_formats: TexelFormat::ALL.to_vec(),
        }
    }

    /// A GLES2-class device: single render target, no texel fetch, no RG
    /// or 16-bit textures. One and two channel planes use luminance formats.
    pub fn gles2() -> Self {
        Self {
            name: "gles2".into(),
            shading_language_version: 100,
            max_draw_buffers: 1,
            texel_fetch: false,
            rg_textures: false,
            rg_render: false,
            external_textures: true,
            rectangle_textures: false,
            texel_formats: vec![
                TexelFormat::Rgb8,
                TexelFormat::Rgba8,
                TexelFormat::Rgb565,
                TexelFormat::Luminance8,
                TexelFormat::LuminanceAlpha8,
            ],
        }
    }

    /// Whether more than one color attachment can be drawn at once.
    #[inline]
    pub fn has_draw_buffers(&self) -> bool {
        self.max_draw_buffers > 1
    }

    /// Whether `format` can be created and sampled.
    pub fn supports(&self, format: TexelFormat) -> bool {
        self.texel_formats.contains(&format)
    }

    /// Texel format a plane with the given native format is stored as on this
    /// device, or `None` if the device cannot hold it.
    pub fn plane_texel_format(&self, native: TexelFormat) -> Option<TexelFormat> {
        let format = match native {
            TexelFormat::R8 if !self.rg_textures => TexelFormat::Luminance8,
            TexelFormat::Rg8 if !self.rg_textures => TexelFormat::LuminanceAlpha8,
            other => other,
        };
        self.supports(format).then_some(format)
    }
}

impl Default for DeviceCapabilities {
    fn default() -> Self {
        Self::full()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_luminance_fallback() {
        let caps = DeviceCapabilities::gles2();
        assert_eq!(caps.plane_texel_format(TexelFormat::R8), Some(TexelFormat::Luminance8));
        assert_eq!(caps.plane_texel_format(TexelFormat::Rg8), Some(TexelFormat::LuminanceAlpha8));
        assert_eq!(caps.plane_texel_format(TexelFormat::R16), None);
        assert!(!caps.has_draw_buffers());
    }

    #[test]
    fn test_full_keeps_native() {
        let caps = DeviceCapabilities::full();
        assert_eq!(caps.plane_texel_format(TexelFormat::Rg16), Some(TexelFormat::Rg16));
        assert!(caps.has_draw_buffers());
    }
}
