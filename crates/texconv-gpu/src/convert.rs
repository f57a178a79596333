//! Conversion session.
//!
//! [`ColorConvert`] owns the per session GPU state: compiled programs keyed
//! by format pair, the quad geometry, framebuffers and intermediate render
//! targets. That state lives in plain handles moved onto the context thread
//! for each call and handed back when the call returns.
//!
//! # Example
//!
//! ```ignore
//! use texconv_gpu::{ColorConvert, ConvertConfig, ReferenceDevice};
//!
//! let (ctx, _probe) = ReferenceDevice::spawn(DeviceCapabilities::full())?;
//! let mut convert = ColorConvert::new(ctx.clone(), ConvertConfig::default());
//! convert.set_info(&rgba, &nv12, TextureTarget::TwoD, TextureTarget::TwoD)?;
//! let out = convert.convert(&input)?;
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use texconv_caps::{Caps, CapsFeature};
use texconv_core::{Error, Result, ShaderStage, TexelFormat, TextureTarget, VideoInfo};
use tracing::{debug, info, trace, warn};

use crate::config::ConvertConfig;
use crate::context::GpuContext;
use crate::device::{
    DrawCall, FramebufferId, GeometryId, GpuDevice, ProgramDescriptor, ProgramId, SyncPoint,
    TextureBinding, TextureDescriptor, TextureId,
};
use crate::frame::{Frame, Memory};
use crate::info::{ConversionInfo, ProgramKey};
use crate::pool::BufferPool;
use crate::shaders::{FIRST_TEXTURE_BINDING, QUAD_INDICES, QUAD_VERTICES, VERTEX_SHADER};
use crate::uniforms::UniformBlock;

/// Lifecycle of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ConvertState {
    /// No formats set.
    #[default]
    Uninitialized,
    /// Formats set, program not compiled yet.
    Configured,
    /// Program compiled, frames can be converted.
    Ready,
}

/// Device objects of a session, all owned by the context thread.
#[derive(Debug, Default)]
struct GpuState {
    programs: HashMap<ProgramKey, ProgramId>,
    geometry: Option<GeometryId>,
    framebuffers: HashMap<(u32, u32), FramebufferId>,
    intermediates: HashMap<(usize, u32, u32, TexelFormat), TextureId>,
    /// Programs compiled since the session last collected the count.
    new_compiles: usize,
}

impl GpuState {
    fn release(self, device: &mut dyn GpuDevice) {
        for (_, id) in self.programs {
            device.delete_program(id);
        }
        for (_, id) in self.framebuffers {
            device.delete_framebuffer(id);
        }
        for (_, id) in self.intermediates {
            device.delete_texture(id);
        }
        if let Some(id) = self.geometry {
            device.delete_geometry(id);
        }
    }

    fn release_intermediates(&mut self, device: &mut dyn GpuDevice) {
        for (_, id) in self.intermediates.drain() {
            device.delete_texture(id);
        }
    }
}

/// Configured conversion of one format pair.
struct Session {
    conversion: Arc<ConversionInfo>,
    uniforms: Arc<UniformBlock>,
    pool: BufferPool,
}

/// A color conversion session on one GPU context.
pub struct ColorConvert {
    context: GpuContext,
    config: ConvertConfig,
    state: ConvertState,
    session: Option<Session>,
    passthrough: Option<(VideoInfo, TextureTarget)>,
    gpu: Option<GpuState>,
    compile_count: usize,
}

/// What one draw pass needs, moved onto the context thread.
struct Pass {
    conversion: Arc<ConversionInfo>,
    uniforms: Arc<UniformBlock>,
    inputs: Vec<TextureId>,
    outputs: Vec<TextureId>,
    wait: Option<SyncPoint>,
}

impl ColorConvert {
    /// Creates an unconfigured session.
    pub fn new(context: GpuContext, config: ConvertConfig) -> Self {
        Self {
            context,
            config,
            state: ConvertState::Uninitialized,
            session: None,
            passthrough: None,
            gpu: Some(GpuState::default()),
            compile_count: 0,
        }
    }

    /// Context the session runs on.
    pub fn context(&self) -> &GpuContext {
        &self.context
    }

    /// Current lifecycle state.
    pub fn state(&self) -> ConvertState {
        self.state
    }

    /// Whether input frames are forwarded unchanged.
    pub fn is_passthrough(&self) -> bool {
        self.passthrough.is_some()
    }

    /// Number of programs compiled by this session.
    pub fn compile_count(&self) -> usize {
        self.compile_count
    }

    /// Conversion of the configured pair, if not in passthrough.
    pub fn conversion(&self) -> Option<&ConversionInfo> {
        self.session.as_ref().map(|s| s.conversion.as_ref())
    }

    /// Output pool of the configured pair, if not in passthrough.
    pub fn pool(&self) -> Option<&BufferPool> {
        self.session.as_ref().map(|s| &s.pool)
    }

    /// Configures the session from fixed input and output caps.
    ///
    /// Both sides must be a single fixed GPU memory structure.
    pub fn set_formats(&mut self, in_caps: &Caps, out_caps: &Caps) -> Result<()> {
        for caps in [in_caps, out_caps] {
            match caps.first().map(|s| s.feature) {
                Some(CapsFeature::GpuMemory) => {}
                _ => {
                    self.clear();
                    return Err(Error::InvalidCaps(format!("not GPU memory caps: {caps}")));
                }
            }
        }
        let (in_info, from_target) = in_caps.to_info().inspect_err(|_| self.clear())?;
        let (out_info, to_target) = out_caps.to_info().inspect_err(|_| self.clear())?;
        self.set_info(&in_info, &out_info, from_target, to_target)
    }

    /// Configures the session for an (input, output) pair.
    ///
    /// On failure the session returns to [`ConvertState::Uninitialized`].
    pub fn set_info(
        &mut self,
        in_info: &VideoInfo,
        out_info: &VideoInfo,
        from_target: TextureTarget,
        to_target: TextureTarget,
    ) -> Result<()> {
        let result = self.configure(in_info, out_info, from_target, to_target);
        if let Err(e) = &result {
            warn!(from = %in_info.format, to = %out_info.format, error = %e, "set_formats failed");
            self.clear();
        }
        result
    }

    fn configure(
        &mut self,
        in_info: &VideoInfo,
        out_info: &VideoInfo,
        from_target: TextureTarget,
        to_target: TextureTarget,
    ) -> Result<()> {
        self.clear();

        if in_info.views != out_info.views {
            return Err(Error::InvalidCaps(format!(
                "view count changes from {} to {}",
                in_info.views, out_info.views
            )));
        }
        if in_info.is_passthrough_compatible(out_info) && from_target == to_target {
            info!(format = %in_info.format, width = in_info.width, height = in_info.height, "passthrough");
            self.passthrough = Some((in_info.clone(), from_target));
            self.state = ConvertState::Ready;
            return Ok(());
        }

        let conversion = ConversionInfo::new(
            in_info,
            out_info,
            from_target,
            to_target,
            self.context.capabilities(),
        )?;
        let pool = BufferPool::new(
            &self.context,
            out_info,
            to_target,
            self.config.pool_min_buffers,
            self.config.pool_max_buffers,
        )?;
        let uniforms = Arc::new(conversion.uniforms());
        info!(
            from = %in_info.format,
            to = %out_info.format,
            width = out_info.width,
            height = out_info.height,
            template = conversion.template.name,
            "conversion configured"
        );
        self.session = Some(Session { conversion: Arc::new(conversion), uniforms, pool });
        self.state = ConvertState::Configured;

        if self.config.eager_compile {
            self.compile()?;
        }
        Ok(())
    }

    /// Compiles the program of the configured pair if it is not cached yet.
    pub fn compile(&mut self) -> Result<()> {
        let Some(session) = &self.session else {
            return match self.passthrough {
                Some(_) => Ok(()),
                None => Err(Error::NotConfigured),
            };
        };
        let conversion = session.conversion.clone();
        self.with_gpu(move |device, gpu| ensure_program(device, gpu, &conversion))?;
        self.state = ConvertState::Ready;
        Ok(())
    }

    /// Converts `input` into a new frame from the output pool.
    ///
    /// In passthrough the input itself is returned. On failure no output is
    /// produced and the acquired buffer goes back to the pool.
    pub fn convert(&mut self, input: &Frame) -> Result<Frame> {
        if let Some((info, _)) = &self.passthrough {
            if !input.info().is_passthrough_compatible(info) {
                return Err(Error::frame(format!(
                    "frame is {} {}x{}, session expects {} {}x{}",
                    input.info().format,
                    input.info().width,
                    input.info().height,
                    info.format,
                    info.width,
                    info.height
                )));
            }
            trace!("passthrough frame");
            return Ok(input.clone());
        }
        let Some(session) = &self.session else {
            return Err(Error::NotConfigured);
        };

        let conversion = session.conversion.clone();
        let inputs = self.validate_input(input, &conversion)?;
        let output = session.pool.acquire()?;
        let outputs: Vec<TextureId> = output
            .memories()
            .iter()
            .filter_map(Memory::texture)
            .map(|t| t.id())
            .collect();

        let pass = Pass {
            conversion,
            uniforms: session.uniforms.clone(),
            inputs,
            outputs,
            wait: input.sync_point(),
        };
        let sync = self.with_gpu(move |device, gpu| run_pass(device, gpu, pass))?;

        self.state = ConvertState::Ready;
        output.set_sync_point(sync);
        Ok(output)
    }

    fn validate_input(&self, input: &Frame, conversion: &ConversionInfo) -> Result<Vec<TextureId>> {
        let expected = &conversion.in_info;
        let info = input.info();
        if info.format != expected.format || info.width != expected.width || info.height != expected.height {
            return Err(Error::frame(format!(
                "frame is {} {}x{}, session expects {} {}x{}",
                info.format, info.width, info.height, expected.format, expected.width, expected.height
            )));
        }
        if input.n_memories() != expected.n_memories() {
            return Err(Error::frame(format!(
                "frame has {} memories, expected {}",
                input.n_memories(),
                expected.n_memories()
            )));
        }
        if input.context_id() != Some(self.context.id()) {
            return Err(Error::frame("frame belongs to another GPU context"));
        }
        input
            .memories()
            .iter()
            .map(|m| match m {
                Memory::Gpu(t) => Ok(t.id()),
                Memory::System(_) => Err(Error::frame("frame is in system memory")),
            })
            .collect()
    }

    /// Releases every device object and returns to [`ConvertState::Uninitialized`].
    pub fn reset(&mut self) {
        self.clear();
        if let Some(gpu) = self.gpu.take() {
            let released = self.context.invoke(move |device| gpu.release(device));
            if let Err(e) = released {
                warn!(error = %e, "could not release session objects");
            }
        }
        self.gpu = Some(GpuState::default());
        debug!("session reset");
    }

    fn clear(&mut self) {
        self.session = None;
        self.passthrough = None;
        self.state = ConvertState::Uninitialized;
        if let Some(mut gpu) = self.gpu.take() {
            if gpu.intermediates.is_empty() {
                self.gpu = Some(gpu);
                return;
            }
            let handed_back = self.context.invoke(move |device| {
                gpu.release_intermediates(device);
                gpu
            });
            self.gpu = Some(handed_back.unwrap_or_default());
        }
    }

    /// Runs `f` with the session's device objects on the context thread.
    ///
    /// Programs compiled by `f` are counted even when it fails afterwards.
    fn with_gpu<R, F>(&mut self, f: F) -> Result<R>
    where
        F: FnOnce(&mut dyn GpuDevice, &mut GpuState) -> Result<R> + Send + 'static,
        R: Send + 'static,
    {
        let mut gpu = self.gpu.take().unwrap_or_default();
        let (mut gpu, result) = self.context.invoke(move |device| {
            let result = f(device, &mut gpu);
            (gpu, result)
        })?;
        self.compile_count += gpu.new_compiles;
        gpu.new_compiles = 0;
        self.gpu = Some(gpu);
        result
    }
}

impl Drop for ColorConvert {
    fn drop(&mut self) {
        if let Some(gpu) = self.gpu.take() {
            self.context.submit(move |device| gpu.release(device));
        }
    }
}

impl std::fmt::Debug for ColorConvert {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ColorConvert")
            .field("context", &self.context)
            .field("state", &self.state)
            .field("passthrough", &self.is_passthrough())
            .field("compile_count", &self.compile_count)
            .finish()
    }
}

/// Returns the program of `conversion`, compiling it on a cache miss.
fn ensure_program(
    device: &mut dyn GpuDevice,
    gpu: &mut GpuState,
    conversion: &ConversionInfo,
) -> Result<ProgramId> {
    let key = conversion.program_key();
    if let Some(id) = gpu.programs.get(&key) {
        return Ok(*id);
    }
    let targets = (0..conversion.out_info.n_planes())
        .map(|i| attachment_format(conversion, i))
        .collect();
    let desc = ProgramDescriptor {
        name: conversion.template.name,
        vertex: device.mangle_shader(VERTEX_SHADER, ShaderStage::Vertex, conversion.from_target),
        fragment: device.mangle_shader(&conversion.fragment, ShaderStage::Fragment, conversion.from_target),
        targets,
        source_target: conversion.from_target,
        textures: conversion.texture_names.to_vec(),
        addressing: conversion.template.addressing,
        layout: conversion.layout.clone(),
        spec: conversion.spec,
    };
    let id = device.compile_program(&desc)?;
    debug!(
        template = desc.name,
        from = %key.from,
        to = %key.to,
        target = %key.target,
        "compiled program"
    );
    gpu.programs.insert(key, id);
    gpu.new_compiles += 1;
    Ok(id)
}

fn attachment_format(conversion: &ConversionInfo, plane: usize) -> TexelFormat {
    if conversion.needs_intermediate(plane) {
        conversion.intermediate_format()
    } else {
        conversion.out_texels[plane]
    }
}

/// Draws every view of a frame. Returns the sync point of the finished work.
fn run_pass(device: &mut dyn GpuDevice, gpu: &mut GpuState, pass: Pass) -> Result<SyncPoint> {
    let conversion = &pass.conversion;
    let program = ensure_program(device, gpu, conversion)?;

    let geometry = match gpu.geometry {
        Some(id) => id,
        None => {
            let id = device.create_geometry(&QUAD_VERTICES, &QUAD_INDICES)?;
            gpu.geometry = Some(id);
            id
        }
    };

    let (out_w, out_h) = conversion.render_size();
    let framebuffer = match gpu.framebuffers.get(&(out_w, out_h)) {
        Some(id) => *id,
        None => {
            let id = device.create_framebuffer(out_w, out_h)?;
            gpu.framebuffers.insert((out_w, out_h), id);
            id
        }
    };

    let n_out = conversion.out_info.n_planes();
    let mut intermediates: Vec<Option<TextureId>> = Vec::with_capacity(n_out);
    for plane in 0..n_out {
        if !conversion.needs_intermediate(plane) {
            intermediates.push(None);
            continue;
        }
        let format = conversion.intermediate_format();
        let key = (plane, out_w, out_h, format);
        let id = match gpu.intermediates.get(&key) {
            Some(id) => *id,
            None => {
                let id = device.create_texture(&TextureDescriptor {
                    width: out_w,
                    height: out_h,
                    format,
                    target: TextureTarget::TwoD,
                })?;
                trace!(plane, %format, "created intermediate target");
                gpu.intermediates.insert(key, id);
                id
            }
        };
        intermediates.push(Some(id));
    }

    if let Some(sync) = pass.wait {
        device.wait_sync_point(sync)?;
    }

    let n_in = conversion.in_info.n_planes();
    for view in 0..conversion.in_info.views as usize {
        let inputs = &pass.inputs[view * n_in..(view + 1) * n_in];
        let outputs = &pass.outputs[view * n_out..(view + 1) * n_out];

        let bindings: Vec<TextureBinding> = inputs
            .iter()
            .zip(conversion.texture_names)
            .enumerate()
            .map(|(i, (texture, name))| TextureBinding {
                name: *name,
                binding: FIRST_TEXTURE_BINDING + i as u32,
                texture: *texture,
            })
            .collect();
        let attachments: Vec<TextureId> = outputs
            .iter()
            .zip(&intermediates)
            .map(|(out, inter)| inter.unwrap_or(*out))
            .collect();

        device.draw(&DrawCall {
            program,
            framebuffer,
            geometry,
            attachments: &attachments,
            textures: &bindings,
            uniforms: &pass.uniforms,
        })?;

        for (plane, inter) in intermediates.iter().enumerate() {
            let (Some(src), Some(layout)) = (inter, conversion.out_info.plane(plane)) else {
                continue;
            };
            device.copy_texture(*src, outputs[plane], layout.width, layout.height)?;
        }
        trace!(view, "view converted");
    }

    Ok(device.insert_sync_point())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::ReferenceDevice;
    use texconv_caps::CapsStructure;
    use texconv_core::{DeviceCapabilities, VideoFormat};

    fn session(caps: DeviceCapabilities) -> (ColorConvert, Arc<crate::backend::DeviceProbe>) {
        let (ctx, probe) = ReferenceDevice::spawn(caps).unwrap();
        (ColorConvert::new(ctx, ConvertConfig::default()), probe)
    }

    #[test]
    fn test_state_transitions() {
        let (mut conv, _probe) = session(DeviceCapabilities::full());
        assert_eq!(conv.state(), ConvertState::Uninitialized);
        let input = VideoInfo::new(VideoFormat::Rgba, 8, 8).unwrap();
        let output = VideoInfo::new(VideoFormat::Bgra, 8, 8).unwrap();
        conv.set_info(&input, &output, TextureTarget::TwoD, TextureTarget::TwoD).unwrap();
        assert_eq!(conv.state(), ConvertState::Configured);
        conv.compile().unwrap();
        assert_eq!(conv.state(), ConvertState::Ready);
        assert_eq!(conv.compile_count(), 1);
        conv.reset();
        assert_eq!(conv.state(), ConvertState::Uninitialized);
        assert!(conv.conversion().is_none());
    }

    #[test]
    fn test_compile_counted_when_draw_fails() {
        let (mut conv, probe) = session(DeviceCapabilities::full());
        let input = VideoInfo::new(VideoFormat::Rgba, 4, 4).unwrap();
        let output = VideoInfo::new(VideoFormat::Nv12, 4, 4).unwrap();
        conv.set_info(&input, &output, TextureTarget::TwoD, TextureTarget::TwoD).unwrap();
        let frame = Frame::upload(conv.context(), &input, &[&[0u8; 64]], TextureTarget::TwoD).unwrap();

        probe.fail_draw_on(1);
        assert!(conv.convert(&frame).is_err());
        assert_eq!(probe.compiles(), 1);
        assert_eq!(conv.compile_count(), 1);
        assert_eq!(conv.state(), ConvertState::Configured);

        conv.convert(&frame).unwrap();
        assert_eq!(probe.compiles(), 1);
        assert_eq!(conv.compile_count(), 1);
    }

    #[test]
    fn test_not_configured() {
        let (mut conv, _probe) = session(DeviceCapabilities::full());
        let info = VideoInfo::new(VideoFormat::Rgba, 2, 2).unwrap();
        let frame = Frame::upload(conv.context(), &info, &[&[0u8; 16]], TextureTarget::TwoD).unwrap();
        assert!(matches!(conv.convert(&frame), Err(Error::NotConfigured)));
        assert!(matches!(conv.compile(), Err(Error::NotConfigured)));
    }

    #[test]
    fn test_system_memory_caps_rejected() {
        let (mut conv, _probe) = session(DeviceCapabilities::full());
        let input = Caps::from(CapsStructure::system(&[VideoFormat::Rgba]).with_size(4, 4));
        let output = Caps::from(CapsStructure::gpu(&[VideoFormat::Nv12]).with_size(4, 4));
        assert!(matches!(conv.set_formats(&input, &output), Err(Error::InvalidCaps(_))));
        assert_eq!(conv.state(), ConvertState::Uninitialized);
    }

    #[test]
    fn test_failed_set_formats_clears_session() {
        let (mut conv, _probe) = session(DeviceCapabilities::gles2());
        let input = VideoInfo::new(VideoFormat::Rgba, 8, 8).unwrap();
        let ok = VideoInfo::new(VideoFormat::Bgra, 8, 8).unwrap();
        conv.set_info(&input, &ok, TextureTarget::TwoD, TextureTarget::TwoD).unwrap();
        let nv12 = VideoInfo::new(VideoFormat::Nv12, 8, 8).unwrap();
        let err = conv.set_info(&input, &nv12, TextureTarget::TwoD, TextureTarget::TwoD).unwrap_err();
        assert!(err.is_capability());
        assert_eq!(conv.state(), ConvertState::Uninitialized);
        assert!(conv.pool().is_none());
    }

    #[test]
    fn test_foreign_context_rejected() {
        let (mut conv, _probe) = session(DeviceCapabilities::full());
        let (other, _other_probe) = ReferenceDevice::spawn(DeviceCapabilities::full()).unwrap();
        let input = VideoInfo::new(VideoFormat::Rgba, 2, 2).unwrap();
        let output = VideoInfo::new(VideoFormat::Bgra, 2, 2).unwrap();
        conv.set_info(&input, &output, TextureTarget::TwoD, TextureTarget::TwoD).unwrap();
        let frame = Frame::upload(&other, &input, &[&[0u8; 16]], TextureTarget::TwoD).unwrap();
        assert!(matches!(conv.convert(&frame), Err(Error::FrameValidation { .. })));
    }
}
