//! Device implementations.
//!
//! - [`ReferenceDevice`] - software rasteriser running the conversion
//!   programs on the CPU (rayon), always available
//! - `WgpuDevice` - Vulkan/Metal/DX12 through wgpu, behind the `wgpu` feature

mod kernels;
mod reference;
mod texture;

#[cfg(feature = "wgpu")]
mod wgpu_backend;

pub use reference::{DeviceProbe, ReferenceDevice};
pub use texture::SoftTexture;

#[cfg(feature = "wgpu")]
pub use wgpu_backend::WgpuDevice;
