//! # texconv-math
//!
//! Matrix math for color conversion.
//!
//! - [`Matrix4`] - 4x4 affine matrices in double precision
//! - [`to_rgb_matrix`] / [`to_yuv_matrix`] - colorimetry driven transforms
//!   between the normalized texel values of a format and full-range RGB
//!
//! # Convention
//!
//! Matrices are stored **row-major** and transform **column vectors**:
//!
//! ```text
//! result = matrix * (c0, c1, c2, 1)
//! ```
//!
//! Builders such as [`Matrix4::offset_components`] pre-multiply, so the
//! operation applied last to a vector is the one added last.
//!
//! # Usage
//!
//! ```rust
//! use texconv_core::{VideoFormat, VideoInfo};
//! use texconv_math::{to_rgb_matrix, to_yuv_matrix};
//!
//! let info = VideoInfo::new(VideoFormat::I420, 64, 48).unwrap();
//! let to_yuv = to_yuv_matrix(&info);
//! let to_rgb = to_rgb_matrix(&info);
//! let gray = to_rgb.transform(to_yuv.transform([0.5, 0.5, 0.5, 1.0]));
//! assert!((gray[0] - 0.5).abs() < 1e-9);
//! ```
//!
//! # Used By
//!
//! - `texconv-gpu` - conversion uniforms

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod mat4;
pub mod ycbcr;

pub use mat4::Matrix4;
pub use ycbcr::{range_offsets, to_rgb_matrix, to_yuv_matrix, RangeOffsets};
