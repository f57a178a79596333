//! Colorimetry attached to a concrete format instance.
//!
//! Only [`ColorRange`] and [`ColorMatrix`] influence the conversion matrices;
//! transfer function and primaries are carried so that passthrough detection
//! and negotiation can compare them.

use std::fmt;
use std::str::FromStr;

use crate::error::Error;
use crate::format::FormatDescriptor;

/// Quantization range of the samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ColorRange {
    /// Not specified.
    #[default]
    Unknown,
    /// Full range, 0..2^depth-1.
    Full,
    /// Limited ("studio") range, 16..235 / 16..240 at 8 bits.
    Limited,
}

/// Y'CbCr matrix coefficients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ColorMatrix {
    /// Not specified.
    #[default]
    Unknown,
    /// Identity, used by RGB formats.
    Rgb,
    /// FCC Title 47.
    Fcc,
    /// ITU-R BT.709.
    Bt709,
    /// ITU-R BT.601.
    Bt601,
    /// SMPTE 240M.
    Smpte240m,
    /// ITU-R BT.2020 non-constant luminance.
    Bt2020,
}

impl ColorMatrix {
    /// Luma weights `(Kr, Kb)`, or `None` for identity/unknown matrices.
    pub const fn kr_kb(self) -> Option<(f64, f64)> {
        match self {
            Self::Fcc => Some((0.30, 0.11)),
            Self::Bt709 => Some((0.2126, 0.0722)),
            Self::Bt601 => Some((0.2990, 0.1140)),
            Self::Smpte240m => Some((0.2120, 0.0870)),
            Self::Bt2020 => Some((0.2627, 0.0593)),
            Self::Unknown | Self::Rgb => None,
        }
    }
}

/// Opto-electronic transfer function.
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TransferFunction {
    #[default]
    Unknown,
    Gamma10,
    Gamma22,
    Bt709,
    Smpte240m,
    Srgb,
    Gamma28,
    Log100,
    Bt2020_12,
    Pq,
    Hlg,
    Bt601,
}

/// Color primaries.
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ColorPrimaries {
    #[default]
    Unknown,
    Bt709,
    Bt470m,
    Bt470bg,
    Smpte170m,
    Smpte240m,
    Film,
    Bt2020,
    Smptest428,
    Smpterp431,
    Smpteeg432,
}

/// Position of chroma samples relative to luma samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ChromaSite {
    /// Not specified.
    #[default]
    Unknown,
    /// Centered horizontally and vertically (JPEG).
    Jpeg,
    /// Co-sited horizontally, centered vertically (MPEG-2).
    Mpeg2,
    /// DV: alternating chroma lines.
    Dv,
    /// Co-sited in both directions.
    Cosited,
}

impl ChromaSite {
    /// Caps string.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Unknown => "unknown",
            Self::Jpeg => "jpeg",
            Self::Mpeg2 => "mpeg2",
            Self::Dv => "dv",
            Self::Cosited => "cosited",
        }
    }
}

impl fmt::Display for ChromaSite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Full colorimetry of a format instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Colorimetry {
    /// Sample range.
    pub range: ColorRange,
    /// Y'CbCr matrix.
    pub matrix: ColorMatrix,
    /// Transfer function.
    pub transfer: TransferFunction,
    /// Primaries.
    pub primaries: ColorPrimaries,
}

impl Colorimetry {
    /// SD video.
    pub const BT601: Self = Self {
        range: ColorRange::Limited,
        matrix: ColorMatrix::Bt601,
        transfer: TransferFunction::Bt601,
        primaries: ColorPrimaries::Smpte170m,
    };
    /// HD video.
    pub const BT709: Self = Self {
        range: ColorRange::Limited,
        matrix: ColorMatrix::Bt709,
        transfer: TransferFunction::Bt709,
        primaries: ColorPrimaries::Bt709,
    };
    /// UHD video.
    pub const BT2020: Self = Self {
        range: ColorRange::Limited,
        matrix: ColorMatrix::Bt2020,
        transfer: TransferFunction::Bt2020_12,
        primaries: ColorPrimaries::Bt2020,
    };
    /// SMPTE 240M.
    pub const SMPTE240M: Self = Self {
        range: ColorRange::Limited,
        matrix: ColorMatrix::Smpte240m,
        transfer: TransferFunction::Smpte240m,
        primaries: ColorPrimaries::Smpte240m,
    };
    /// Computer graphics RGB.
    pub const SRGB: Self = Self {
        range: ColorRange::Full,
        matrix: ColorMatrix::Rgb,
        transfer: TransferFunction::Srgb,
        primaries: ColorPrimaries::Bt709,
    };

    const NAMED: [(&'static str, Colorimetry); 5] = [
        ("bt601", Self::BT601),
        ("bt709", Self::BT709),
        ("bt2020", Self::BT2020),
        ("smpte240m", Self::SMPTE240M),
        ("sRGB", Self::SRGB),
    ];

    /// Default colorimetry for a format at a given frame height.
    ///
    /// RGB defaults to sRGB, gray to full range with unknown matrix, YUV to
    /// BT.601 up to 576 lines and BT.709 above.
    pub fn default_for(desc: &FormatDescriptor, height: u32) -> Self {
        if desc.is_yuv() {
            if height > 576 { Self::BT709 } else { Self::BT601 }
        } else if desc.is_gray() {
            Self {
                range: ColorRange::Full,
                ..Self::default()
            }
        } else {
            Self::SRGB
        }
    }

    /// Canonical name if this matches a well-known colorimetry.
    pub fn name(&self) -> Option<&'static str> {
        Self::NAMED.iter().find(|(_, c)| c == self).map(|(n, _)| *n)
    }
}

impl fmt::Display for Colorimetry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => f.write_str(name),
            None => write!(
                f,
                "{}:{}:{}:{}",
                self.range as u32, self.matrix as u32, self.transfer as u32, self.primaries as u32
            ),
        }
    }
}

impl FromStr for Colorimetry {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Some((_, c)) = Self::NAMED.iter().find(|(n, _)| *n == s) {
            return Ok(*c);
        }
        let invalid = || Error::InvalidCaps(format!("invalid colorimetry '{s}'"));
        let parts: Vec<u32> = s
            .split(':')
            .map(|p| p.parse::<u32>().map_err(|_| invalid()))
            .collect::<Result<_, _>>()?;
        let [range, matrix, transfer, primaries] = parts[..] else {
            return Err(invalid());
        };
        Ok(Self {
            range: match range {
                0 => ColorRange::Unknown,
                1 => ColorRange::Full,
                2 => ColorRange::Limited,
                _ => return Err(invalid()),
            },
            matrix: match matrix {
                0 => ColorMatrix::Unknown,
                1 => ColorMatrix::Rgb,
                2 => ColorMatrix::Fcc,
                3 => ColorMatrix::Bt709,
                4 => ColorMatrix::Bt601,
                5 => ColorMatrix::Smpte240m,
                6 => ColorMatrix::Bt2020,
                _ => return Err(invalid()),
            },
            transfer: match transfer {
                0 => TransferFunction::Unknown,
                1 => TransferFunction::Gamma10,
                2 => TransferFunction::Gamma22,
                3 => TransferFunction::Bt709,
                4 => TransferFunction::Smpte240m,
                5 => TransferFunction::Srgb,
                6 => TransferFunction::Gamma28,
                7 => TransferFunction::Log100,
                8 => TransferFunction::Bt2020_12,
                9 => TransferFunction::Pq,
                10 => TransferFunction::Hlg,
                11 => TransferFunction::Bt601,
                _ => return Err(invalid()),
            },
            primaries: match primaries {
                0 => ColorPrimaries::Unknown,
                1 => ColorPrimaries::Bt709,
                2 => ColorPrimaries::Bt470m,
                3 => ColorPrimaries::Bt470bg,
                4 => ColorPrimaries::Smpte170m,
                5 => ColorPrimaries::Smpte240m,
                6 => ColorPrimaries::Film,
                7 => ColorPrimaries::Bt2020,
                8 => ColorPrimaries::Smptest428,
                9 => ColorPrimaries::Smpterp431,
                10 => ColorPrimaries::Smpteeg432,
                _ => return Err(invalid()),
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::VideoFormat;

    #[test]
    fn test_defaults() {
        assert_eq!(Colorimetry::default_for(VideoFormat::I420.info(), 480), Colorimetry::BT601);
        assert_eq!(Colorimetry::default_for(VideoFormat::Nv12.info(), 1080), Colorimetry::BT709);
        assert_eq!(Colorimetry::default_for(VideoFormat::Bgra.info(), 1080), Colorimetry::SRGB);
        assert_eq!(Colorimetry::default_for(VideoFormat::Gray8.info(), 64).range, ColorRange::Full);
    }

    #[test]
    fn test_string_roundtrip() {
        assert_eq!("bt709".parse::<Colorimetry>().unwrap(), Colorimetry::BT709);
        let custom = Colorimetry { range: ColorRange::Full, ..Colorimetry::BT709 };
        let text = custom.to_string();
        assert_eq!(text, "1:3:3:1");
        assert_eq!(text.parse::<Colorimetry>().unwrap(), custom);
        assert!("1:2:3".parse::<Colorimetry>().is_err());
    }

    #[test]
    fn test_kr_kb() {
        assert_eq!(ColorMatrix::Bt601.kr_kb(), Some((0.299, 0.114)));
        assert!(ColorMatrix::Rgb.kr_kb().is_none());
    }
}
