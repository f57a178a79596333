//! Texture level descriptions: texel formats and texture targets.
//!
//! A frame plane lives in one GPU texture. [`TexelFormat`] is the storage
//! format of that texture and [`TextureTarget`] the way shaders address it.

use std::fmt;
use std::str::FromStr;

use crate::error::Error;

/// Storage format of a single plane texture.
///
/// All formats are unsigned normalized. Luminance formats exist for devices
/// without one/two channel color textures; they can be sampled but not
/// rendered to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TexelFormat {
    /// One 8-bit channel.
    R8,
    /// Two 8-bit channels.
    Rg8,
    /// Three 8-bit channels.
    Rgb8,
    /// Four 8-bit channels.
    Rgba8,
    /// One 16-bit channel.
    R16,
    /// Two 16-bit channels.
    Rg16,
    /// Three 16-bit channels.
    Rgb16,
    /// Four 16-bit channels.
    Rgba16,
    /// 10-bit RGB with 2-bit alpha packed in 32 bits, red in the low bits.
    Rgb10a2,
    /// 5-bit red, 6-bit green and 5-bit blue in 16 bits, red in the high bits.
    Rgb565,
    /// 8-bit luminance, sampled as `(l, l, l, 1)`.
    Luminance8,
    /// 8-bit luminance + alpha, sampled as `(l, l, l, a)`.
    LuminanceAlpha8,
}

impl TexelFormat {
    /// Every texel format, in declaration order.
    pub const ALL: [TexelFormat; 12] = [
        Self::R8,
        Self::Rg8,
        Self::Rgb8,
        Self::Rgba8,
        Self::R16,
        Self::Rg16,
        Self::Rgb16,
        Self::Rgba16,
        Self::Rgb10a2,
        Self::Rgb565,
        Self::Luminance8,
        Self::LuminanceAlpha8,
    ];

    /// Number of stored channels.
    #[inline]
    pub const fn channels(self) -> usize {
        match self {
            Self::R8 | Self::R16 | Self::Luminance8 => 1,
            Self::Rg8 | Self::Rg16 | Self::LuminanceAlpha8 => 2,
            Self::Rgb8 | Self::Rgb16 | Self::Rgb565 => 3,
            Self::Rgba8 | Self::Rgba16 | Self::Rgb10a2 => 4,
        }
    }

    /// Bytes per texel in client memory.
    #[inline]
    pub const fn bytes_per_texel(self) -> usize {
        match self {
            Self::R8 | Self::Luminance8 => 1,
            Self::Rg8 | Self::LuminanceAlpha8 | Self::R16 | Self::Rgb565 => 2,
            Self::Rgb8 => 3,
            Self::Rgba8 | Self::Rg16 | Self::Rgb10a2 => 4,
            Self::Rgb16 => 6,
            Self::Rgba16 => 8,
        }
    }

    /// Whether the channels are 16 bits wide.
    #[inline]
    pub const fn is_16bit(self) -> bool {
        matches!(self, Self::R16 | Self::Rg16 | Self::Rgb16 | Self::Rgba16)
    }

    /// Whether this is a legacy luminance format.
    #[inline]
    pub const fn is_luminance(self) -> bool {
        matches!(self, Self::Luminance8 | Self::LuminanceAlpha8)
    }

    /// Whether a framebuffer can render into this format.
    #[inline]
    pub const fn is_color_renderable(self) -> bool {
        !self.is_luminance()
    }

    /// Maximum stored value per channel, used for quantization.
    #[inline]
    pub const fn channel_max(self, channel: usize) -> u32 {
        match self {
            Self::Rgb10a2 => {
                if channel == 3 {
                    3
                } else {
                    1023
                }
            }
            Self::Rgb565 => {
                if channel == 1 {
                    63
                } else {
                    31
                }
            }
            f if f.is_16bit() => 65535,
            _ => 255,
        }
    }

    /// Lower-case name used in logs.
    pub const fn name(self) -> &'static str {
        match self {
            Self::R8 => "r8",
            Self::Rg8 => "rg8",
            Self::Rgb8 => "rgb8",
            Self::Rgba8 => "rgba8",
            Self::R16 => "r16",
            Self::Rg16 => "rg16",
            Self::Rgb16 => "rgb16",
            Self::Rgba16 => "rgba16",
            Self::Rgb10a2 => "rgb10a2",
            Self::Rgb565 => "rgb565",
            Self::Luminance8 => "luminance8",
            Self::LuminanceAlpha8 => "luminance-alpha8",
        }
    }
}

impl fmt::Display for TexelFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// How a shader addresses a texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TextureTarget {
    /// Normalized coordinates.
    #[default]
    TwoD,
    /// Unnormalized (pixel) coordinates.
    Rectangle,
    /// Platform external image, sample-only.
    ExternalOes,
}

impl TextureTarget {
    /// Targets in preference order.
    pub const ALL: [TextureTarget; 3] = [Self::TwoD, Self::Rectangle, Self::ExternalOes];

    /// Canonical caps string.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::TwoD => "2D",
            Self::Rectangle => "rectangle",
            Self::ExternalOes => "external-oes",
        }
    }

    /// Single-bit mask for this target.
    #[inline]
    pub const fn mask(self) -> TargetMask {
        TargetMask(match self {
            Self::TwoD => 1,
            Self::Rectangle => 1 << 1,
            Self::ExternalOes => 1 << 2,
        })
    }
}

impl fmt::Display for TextureTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TextureTarget {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "2D" => Ok(Self::TwoD),
            "rectangle" => Ok(Self::Rectangle),
            "external-oes" => Ok(Self::ExternalOes),
            other => Err(Error::InvalidCaps(format!("unknown texture target '{other}'"))),
        }
    }
}

/// Set of [`TextureTarget`]s. An empty mask means "unrestricted" in caps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct TargetMask(u8);

impl TargetMask {
    /// No targets.
    pub const EMPTY: TargetMask = TargetMask(0);
    /// All targets.
    pub const ALL: TargetMask = TargetMask(0b111);

    /// Builds a mask from a list of targets.
    pub fn from_targets(targets: &[TextureTarget]) -> Self {
        targets.iter().fold(Self::EMPTY, |m, t| m.with(*t))
    }

    /// Whether no target is set.
    #[inline]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Whether `target` is in the mask.
    #[inline]
    pub const fn contains(self, target: TextureTarget) -> bool {
        self.0 & target.mask().0 != 0
    }

    /// Returns the mask with `target` added.
    #[inline]
    pub const fn with(self, target: TextureTarget) -> Self {
        Self(self.0 | target.mask().0)
    }

    /// Returns the mask with `target` removed.
    #[inline]
    pub const fn without(self, target: TextureTarget) -> Self {
        Self(self.0 & !target.mask().0)
    }

    /// Intersection of two masks.
    #[inline]
    pub const fn intersect(self, other: Self) -> Self {
        Self(self.0 & other.0)
    }

    /// Number of targets in the mask.
    #[inline]
    pub const fn len(self) -> u32 {
        self.0.count_ones()
    }

    /// Most preferred target: 2D, then rectangle, then external.
    pub fn first(self) -> Option<TextureTarget> {
        self.iter().next()
    }

    /// Iterates the contained targets in preference order.
    pub fn iter(self) -> impl Iterator<Item = TextureTarget> {
        TextureTarget::ALL.into_iter().filter(move |t| self.contains(*t))
    }
}

impl fmt::Display for TargetMask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.iter().map(TextureTarget::as_str).collect();
        write!(f, "{{ {} }}", names.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_texel_sizes() {
        assert_eq!(TexelFormat::Rgba8.bytes_per_texel(), 4);
        assert_eq!(TexelFormat::Rg16.bytes_per_texel(), 4);
        assert_eq!(TexelFormat::LuminanceAlpha8.channels(), 2);
        assert!(!TexelFormat::Luminance8.is_color_renderable());
        assert_eq!(TexelFormat::Rgb10a2.channel_max(3), 3);
        assert_eq!(TexelFormat::R16.channel_max(0), 65535);
        assert_eq!(TexelFormat::Rgb565.bytes_per_texel(), 2);
        assert_eq!(TexelFormat::Rgb565.channel_max(1), 63);
        assert!(!TexelFormat::Rgb565.is_16bit());
    }

    #[test]
    fn test_target_mask_order() {
        let mask = TargetMask::from_targets(&[TextureTarget::ExternalOes, TextureTarget::Rectangle]);
        assert_eq!(mask.len(), 2);
        assert_eq!(mask.first(), Some(TextureTarget::Rectangle));
        assert!(mask.without(TextureTarget::Rectangle).contains(TextureTarget::ExternalOes));
        assert!(TargetMask::EMPTY.first().is_none());
    }

    #[test]
    fn test_target_parse() {
        assert_eq!("rectangle".parse::<TextureTarget>().unwrap(), TextureTarget::Rectangle);
        assert!("3D".parse::<TextureTarget>().is_err());
    }
}
