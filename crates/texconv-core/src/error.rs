//! Error types shared by every texconv crate.
//!
//! # Overview
//!
//! The [`Error`] enum covers the failure modes of the conversion engine:
//!
//! - negotiation that cannot find an output format
//! - shader programs that fail to compile or link
//! - GPU devices missing a feature a format pair needs
//! - pool and texture allocation failures on the per-frame path
//! - frames that do not belong to the session's device
//!
//! Errors on the per-frame path never leave a partially written output frame
//! behind; the session's compiled state survives them.
//!
//! # Usage
//!
//! ```rust
//! use texconv_core::{Error, Result, VideoFormat};
//!
//! fn require_rgb(format: VideoFormat) -> Result<()> {
//!     if !format.info().is_rgb() {
//!         return Err(Error::UnhandledFormat { from: format, to: VideoFormat::Rgba });
//!     }
//!     Ok(())
//! }
//! assert!(require_rgb(VideoFormat::Nv12).is_err());
//! ```

use std::fmt;

use thiserror::Error;

use crate::format::VideoFormat;

/// Result type alias using [`Error`] as the error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Pipeline stage a shader diagnostic belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderStage {
    /// Vertex shader compilation.
    Vertex,
    /// Fragment shader compilation.
    Fragment,
    /// Program link / pipeline creation.
    Link,
}

impl fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Vertex => "vertex",
            Self::Fragment => "fragment",
            Self::Link => "link",
        })
    }
}

/// Errors produced by negotiation, shader generation and conversion.
///
/// # Categories
///
/// - **Negotiation**: [`NegotiationFailed`](Error::NegotiationFailed), [`InvalidCaps`](Error::InvalidCaps)
/// - **Fatal for a format pair**: [`ShaderCompilation`](Error::ShaderCompilation),
///   [`Capability`](Error::Capability), [`UnhandledFormat`](Error::UnhandledFormat)
/// - **Per frame, retryable**: [`Resource`](Error::Resource)
/// - **Programmer errors**: [`FrameValidation`](Error::FrameValidation), [`NotConfigured`](Error::NotConfigured)
#[derive(Debug, Error)]
pub enum Error {
    /// A format name did not match any known [`VideoFormat`].
    #[error("unknown video format: {name}")]
    UnknownFormat {
        /// The name that failed to parse
        name: String,
    },

    /// Width or height cannot describe a frame.
    #[error("invalid dimensions: {width}x{height} ({reason})")]
    InvalidDimensions {
        /// Requested width
        width: u32,
        /// Requested height
        height: u32,
        /// Why the dimensions were rejected
        reason: String,
    },

    /// Caps are malformed, not fixed, or not GPU-resident.
    #[error("invalid caps: {0}")]
    InvalidCaps(String),

    /// No viable output format was found.
    ///
    /// Recoverable by choosing a different input or failing the link.
    #[error("negotiation failed: {reason}")]
    NegotiationFailed {
        /// Description of what could not be satisfied
        reason: String,
    },

    /// Shader source failed to compile or link.
    ///
    /// Treated as permanent for the (format pair, device) combination.
    #[error("{stage} shader compilation failed: {message}")]
    ShaderCompilation {
        /// Stage that produced the diagnostic
        stage: ShaderStage,
        /// Compiler diagnostic
        message: String,
    },

    /// The device lacks a feature required by an otherwise valid format pair.
    #[error("cannot convert {from} to {to}: {reason}")]
    Capability {
        /// Input format
        from: VideoFormat,
        /// Output format
        to: VideoFormat,
        /// Missing feature
        reason: String,
    },

    /// No shader template handles the format pair.
    #[error("unhandled format conversion from {from} to {to}")]
    UnhandledFormat {
        /// Input format
        from: VideoFormat,
        /// Output format
        to: VideoFormat,
    },

    /// Pool acquisition or texture allocation failed.
    #[error("resource failure: {reason}")]
    Resource {
        /// Failure description
        reason: String,
    },

    /// An input frame is not usable by this session.
    #[error("invalid frame: {reason}")]
    FrameValidation {
        /// Failure description
        reason: String,
    },

    /// `convert` was called before formats were set.
    #[error("conversion session is not configured")]
    NotConfigured,

    /// The device or its context thread failed.
    #[error("device error: {0}")]
    Device(String),
}

impl Error {
    /// Creates a [`Capability`](Error::Capability) error.
    pub fn capability(from: VideoFormat, to: VideoFormat, reason: impl Into<String>) -> Self {
        Self::Capability { from, to, reason: reason.into() }
    }

    /// Creates a [`Resource`](Error::Resource) error.
    pub fn resource(reason: impl Into<String>) -> Self {
        Self::Resource { reason: reason.into() }
    }

    /// Creates a [`FrameValidation`](Error::FrameValidation) error.
    pub fn frame(reason: impl Into<String>) -> Self {
        Self::FrameValidation { reason: reason.into() }
    }

    /// Creates a [`NegotiationFailed`](Error::NegotiationFailed) error.
    pub fn negotiation(reason: impl Into<String>) -> Self {
        Self::NegotiationFailed { reason: reason.into() }
    }

    /// Creates a [`ShaderCompilation`](Error::ShaderCompilation) error.
    pub fn compilation(stage: ShaderStage, message: impl Into<String>) -> Self {
        Self::ShaderCompilation { stage, message: message.into() }
    }

    /// Creates a [`Device`](Error::Device) error.
    pub fn device(message: impl Into<String>) -> Self {
        Self::Device(message.into())
    }

    /// Returns true if the caller may retry the same operation later.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::Resource { .. } | Self::NegotiationFailed { .. })
    }

    /// Returns true if the error is permanent for the configured format pair.
    pub fn is_fatal_for_pair(&self) -> bool {
        matches!(
            self,
            Self::ShaderCompilation { .. } | Self::Capability { .. } | Self::UnhandledFormat { .. }
        )
    }

    /// Returns true for capability failures.
    pub fn is_capability(&self) -> bool {
        matches!(self, Self::Capability { .. })
    }

    /// Returns true for shader compilation failures.
    pub fn is_compilation(&self) -> bool {
        matches!(self, Self::ShaderCompilation { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::compilation(ShaderStage::Fragment, "unknown identifier `Ytex`");
        assert_eq!(
            err.to_string(),
            "fragment shader compilation failed: unknown identifier `Ytex`"
        );

        let err = Error::capability(VideoFormat::Rgba, VideoFormat::Nv12, "multiple render targets");
        assert!(err.to_string().contains("RGBA"));
        assert!(err.to_string().contains("NV12"));
    }

    #[test]
    fn test_error_classes() {
        assert!(Error::resource("pool exhausted").is_recoverable());
        assert!(!Error::resource("pool exhausted").is_fatal_for_pair());
        assert!(Error::UnhandledFormat { from: VideoFormat::Gbr, to: VideoFormat::Nv12 }.is_fatal_for_pair());
        assert!(Error::capability(VideoFormat::Nv12_4l4, VideoFormat::Rgba, "texel fetch").is_capability());
        assert!(!Error::frame("not gpu memory").is_recoverable());
    }
}
