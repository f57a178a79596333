//! The GPU primitives the converter depends on.
//!
//! A [`GpuDevice`] lives on its context thread (see [`GpuContext`](crate::GpuContext))
//! and is only ever touched from there, so implementations need not be `Send`.

use std::sync::Arc;

use texconv_core::{DeviceCapabilities, Result, ShaderStage, TexelFormat, TextureTarget};

use crate::shaders::{self, Addressing, KernelSpec, Vertex};
use crate::uniforms::{UniformBlock, UniformLayout};

macro_rules! handle {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(pub u64);
    };
}

handle!(
    /// A linked program.
    ProgramId
);
handle!(
    /// A texture.
    TextureId
);
handle!(
    /// A render target set.
    FramebufferId
);
handle!(
    /// Vertex and index data.
    GeometryId
);
handle!(
    /// Marks completion of the GPU work submitted before it.
    SyncPoint
);

/// Texture creation parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureDescriptor {
    /// Width in texels.
    pub width: u32,
    /// Height in texels.
    pub height: u32,
    /// Storage format.
    pub format: TexelFormat,
    /// Addressing target.
    pub target: TextureTarget,
}

/// Everything needed to build a conversion program.
#[derive(Debug, Clone)]
pub struct ProgramDescriptor {
    /// Template name, for labels and logs.
    pub name: &'static str,
    /// Mangled vertex source.
    pub vertex: String,
    /// Mangled fragment source.
    pub fragment: String,
    /// Formats of the color targets, one per fragment output.
    pub targets: Vec<TexelFormat>,
    /// Target of the input textures.
    pub source_target: TextureTarget,
    /// Input texture names, in binding order.
    pub textures: Vec<&'static str>,
    /// How the program addresses its inputs.
    pub addressing: Addressing,
    /// Uniform block layout.
    pub layout: Arc<UniformLayout>,
    /// Format pair parameters the source was generated from.
    pub spec: KernelSpec,
}

/// An input texture bound to a program.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextureBinding {
    /// Name in the program.
    pub name: &'static str,
    /// Binding slot.
    pub binding: u32,
    /// Bound texture.
    pub texture: TextureId,
}

/// One textured quad draw.
#[derive(Debug, Clone, Copy)]
pub struct DrawCall<'a> {
    /// Program to run.
    pub program: ProgramId,
    /// Render target set; its size is the viewport.
    pub framebuffer: FramebufferId,
    /// Quad to draw.
    pub geometry: GeometryId,
    /// Color attachments, one per program output.
    pub attachments: &'a [TextureId],
    /// Input textures.
    pub textures: &'a [TextureBinding],
    /// Uniform values.
    pub uniforms: &'a UniformBlock,
}

/// GPU execution context collaborator.
///
/// All calls happen on the context thread.
pub trait GpuDevice {
    /// Features of the device.
    fn capabilities(&self) -> &DeviceCapabilities;

    /// Rewrites canonical source for the device and the texture `target` it
    /// samples from.
    fn mangle_shader(&self, source: &str, stage: ShaderStage, target: TextureTarget) -> String {
        shaders::mangle_shader(source, stage, target)
    }

    /// Compiles and links a program.
    fn compile_program(&mut self, desc: &ProgramDescriptor) -> Result<ProgramId>;

    /// Releases a program.
    fn delete_program(&mut self, id: ProgramId);

    /// Allocates a texture with undefined contents.
    fn create_texture(&mut self, desc: &TextureDescriptor) -> Result<TextureId>;

    /// Releases a texture.
    fn delete_texture(&mut self, id: TextureId);

    /// Descriptor of a live texture.
    fn texture_descriptor(&self, id: TextureId) -> Option<TextureDescriptor>;

    /// Replaces the contents of a texture with tightly packed rows.
    fn write_texture(&mut self, id: TextureId, data: &[u8]) -> Result<()>;

    /// Reads a texture back as tightly packed rows.
    fn read_texture(&mut self, id: TextureId) -> Result<Vec<u8>>;

    /// Creates a render target set of the given size.
    fn create_framebuffer(&mut self, width: u32, height: u32) -> Result<FramebufferId>;

    /// Releases a render target set.
    fn delete_framebuffer(&mut self, id: FramebufferId);

    /// Uploads quad geometry.
    fn create_geometry(&mut self, vertices: &[Vertex], indices: &[u16]) -> Result<GeometryId>;

    /// Releases geometry.
    fn delete_geometry(&mut self, id: GeometryId);

    /// Records and submits a draw.
    fn draw(&mut self, call: &DrawCall<'_>) -> Result<()>;

    /// Copies the top-left `width` x `height` region of `src` into `dst`.
    ///
    /// Channel `i` of `dst` receives channel `i` of `src`; formats may differ.
    fn copy_texture(&mut self, src: TextureId, dst: TextureId, width: u32, height: u32) -> Result<()>;

    /// Marks the end of the work submitted so far.
    fn insert_sync_point(&mut self) -> SyncPoint;

    /// Orders subsequent work after `sync`.
    fn wait_sync_point(&mut self, sync: SyncPoint) -> Result<()>;
}
