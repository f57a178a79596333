//! GPU color space and pixel format conversion.
//!
//! Converts frames between RGB, YUV and gray formats by drawing a textured
//! quad with a generated fragment program. Planes of both frames are device
//! textures; nothing touches system memory on the conversion path.
//!
//! # Architecture
//!
//! ```text
//! ColorConvert (session: formats, state, program cache)
//!     ├── ConversionInfo   gates, template, uniforms for one format pair
//!     ├── BufferPool       output frames, recycled on drop
//!     └── GpuContext       device thread
//!             └── GpuDevice trait
//!                     ├── ReferenceDevice (CPU, rayon)
//!                     └── WgpuDevice      (render pipelines, `wgpu` feature)
//! ```
//!
//! Shader sources come from [`shaders`]: a template per layout pair, helper
//! functions, `%NAME%` insertion points and per target mangling.
//!
//! # Example
//!
//! ```rust
//! use texconv_core::{DeviceCapabilities, TextureTarget, VideoFormat, VideoInfo};
//! use texconv_gpu::{ColorConvert, ConvertConfig, Frame, ReferenceDevice};
//!
//! let (ctx, _probe) = ReferenceDevice::spawn(DeviceCapabilities::full()).unwrap();
//! let rgba = VideoInfo::new(VideoFormat::Rgba, 4, 4).unwrap();
//! let bgra = VideoInfo::new(VideoFormat::Bgra, 4, 4).unwrap();
//!
//! let mut convert = ColorConvert::new(ctx.clone(), ConvertConfig::default());
//! convert.set_info(&rgba, &bgra, TextureTarget::TwoD, TextureTarget::TwoD).unwrap();
//!
//! let pixels = [10u8, 20, 30, 255].repeat(16);
//! let input = Frame::upload(&ctx, &rgba, &[&pixels], TextureTarget::TwoD).unwrap();
//! let output = convert.convert(&input).unwrap();
//! assert_eq!(&output.download().unwrap()[0][..4], &[30, 20, 10, 255]);
//! ```

#![warn(missing_docs)]

pub mod backend;
pub mod config;
pub mod context;
pub mod convert;
pub mod device;
pub mod frame;
pub mod info;
pub mod pool;
pub mod shaders;
pub mod uniforms;

pub use backend::{DeviceProbe, ReferenceDevice, SoftTexture};
#[cfg(feature = "wgpu")]
pub use backend::WgpuDevice;
pub use config::ConvertConfig;
pub use context::{ContextId, GpuContext};
pub use convert::{ColorConvert, ConvertState};
pub use device::{
    DrawCall, FramebufferId, GeometryId, GpuDevice, ProgramDescriptor, ProgramId, SyncPoint,
    TextureBinding, TextureDescriptor, TextureId,
};
pub use frame::{Frame, Memory, OwnedTexture};
pub use info::{ConversionInfo, ProgramKey};
pub use pool::BufferPool;
pub use uniforms::{UniformBlock, UniformLayout, UniformValue};
