//! # texconv-core
//!
//! Core types for GPU texture color conversion.
//!
//! This crate holds everything that describes *what* is being converted,
//! independent of any GPU:
//!
//! - [`VideoFormat`] and [`FormatDescriptor`] - static pixel format layouts
//! - [`TexelFormat`], [`TextureTarget`] - how planes live in GPU textures
//! - [`Colorimetry`] - range, matrix, transfer, primaries and chroma siting
//! - [`VideoInfo`] - a concrete format instance with dimensions and plane layout
//! - [`DeviceCapabilities`] - feature flags reported by a GPU device
//! - [`Error`] - the unified error type used by every texconv crate
//!
//! ## Crate Structure
//!
//! ```text
//! texconv-core (this crate)
//!    ^
//!    |
//!    +-- texconv-math (YCbCr matrices)
//!    +-- texconv-caps (negotiation)
//!    +-- texconv-gpu  (shader generation, executor)
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod colorimetry;
pub mod device;
pub mod error;
pub mod format;
pub mod info;
pub mod texture;

pub use colorimetry::*;
pub use device::*;
pub use error::*;
pub use format::*;
pub use info::*;
pub use texture::*;

/// Prelude module for convenient imports.
///
/// ```
/// use texconv_core::prelude::*;
/// ```
pub mod prelude {
    pub use crate::colorimetry::{ChromaSite, ColorMatrix, ColorPrimaries, ColorRange, Colorimetry, TransferFunction};
    pub use crate::device::DeviceCapabilities;
    pub use crate::error::{Error, Result, ShaderStage};
    pub use crate::format::{FormatDescriptor, FormatFamily, FormatShape, VideoFormat};
    pub use crate::info::{MultiviewMode, VideoInfo};
    pub use crate::texture::{TargetMask, TexelFormat, TextureTarget};
}
