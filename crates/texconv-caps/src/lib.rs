//! Format negotiation for the GPU color converter.
//!
//! Two pure operations decide what a converter offers and what it picks:
//!
//! - [`transform_caps`] maps the caps of one side to every format reachable
//!   on the other side, bounded by the device's capabilities.
//! - [`fixate_caps`] narrows the other side's caps down to one format and
//!   texture target by least-loss scoring ([`fixate_format`],
//!   [`fixate_format_target`]).
//!
//! # Example
//!
//! ```rust
//! use texconv_caps::{fixate_caps, transform_caps, Caps, CapsStructure, PadDirection};
//! use texconv_core::{DeviceCapabilities, VideoFormat};
//!
//! let device = DeviceCapabilities::full();
//! let input: Caps = CapsStructure::gpu(&[VideoFormat::Nv12]).with_size(1920, 1080).into();
//!
//! let reachable = transform_caps(Some(&device), PadDirection::Sink, &input, None);
//! let downstream: Caps = CapsStructure::gpu(&[VideoFormat::Bgra, VideoFormat::Rgba]).into();
//! let offered = downstream.intersect(&reachable);
//!
//! let fixed = fixate_caps(PadDirection::Sink, &input, &offered).unwrap();
//! assert_eq!(fixed.first().unwrap().formats, vec![VideoFormat::Bgra]);
//! ```

#![warn(missing_docs)]

pub mod caps;
pub mod fixate;
pub mod supported;
pub mod transform;

pub use caps::{Caps, CapsFeature, CapsStructure, PadDirection};
pub use fixate::{fixate_caps, fixate_format, fixate_format_target, format_loss, FormatTarget};
pub use supported::{
    conversion_formats_are_supported, format_fits_device, supported_formats,
    supported_planar_yuv_formats, supported_rgb_formats, supports_yuv_yuv_conversion,
};
pub use transform::transform_caps;
