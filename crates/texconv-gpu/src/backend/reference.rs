//! Software reference device.
//!
//! Implements [`GpuDevice`] on the CPU: textures are [`SoftTexture`]s,
//! programs are validated and then evaluated by the kernels mirroring the
//! WGSL helpers. A shared [`DeviceProbe`] counts the work submitted and
//! injects faults, so executor behaviour can be tested without hardware.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use texconv_core::{DeviceCapabilities, Error, Result, ShaderStage};
use tracing::{debug, trace, warn};

use super::kernels::Kernel;
use super::texture::SoftTexture;
use crate::context::GpuContext;
use crate::device::{
    DrawCall, FramebufferId, GeometryId, GpuDevice, ProgramDescriptor, ProgramId, SyncPoint,
    TextureDescriptor, TextureId,
};
use crate::shaders::{has_placeholders, Vertex};

/// Counters and fault injection shared with a [`ReferenceDevice`].
#[derive(Debug, Default)]
pub struct DeviceProbe {
    compiles: AtomicUsize,
    draws: AtomicUsize,
    copies: AtomicUsize,
    live_textures: AtomicUsize,
    fail_draw_at: AtomicUsize,
    fail_compile: AtomicBool,
}

impl DeviceProbe {
    /// Programs compiled so far, failed attempts included.
    pub fn compiles(&self) -> usize {
        self.compiles.load(Ordering::SeqCst)
    }

    /// Draws submitted so far, failed ones included.
    pub fn draws(&self) -> usize {
        self.draws.load(Ordering::SeqCst)
    }

    /// Texture copies performed so far.
    pub fn copies(&self) -> usize {
        self.copies.load(Ordering::SeqCst)
    }

    /// Textures currently allocated.
    pub fn live_textures(&self) -> usize {
        self.live_textures.load(Ordering::SeqCst)
    }

    /// Makes the `n`th draw from now fail once; 0 disarms.
    pub fn fail_draw_on(&self, n: usize) {
        let at = if n == 0 { 0 } else { self.draws() + n };
        self.fail_draw_at.store(at, Ordering::SeqCst);
    }

    /// Makes every compilation fail while set.
    pub fn fail_compile(&self, fail: bool) {
        self.fail_compile.store(fail, Ordering::SeqCst);
    }
}

struct SoftProgram {
    desc: ProgramDescriptor,
}

/// CPU implementation of [`GpuDevice`].
pub struct ReferenceDevice {
    caps: DeviceCapabilities,
    probe: Arc<DeviceProbe>,
    textures: HashMap<u64, SoftTexture>,
    programs: HashMap<u64, SoftProgram>,
    framebuffers: HashMap<u64, (u32, u32)>,
    geometries: HashMap<u64, usize>,
    next_id: u64,
    sync: u64,
}

impl ReferenceDevice {
    /// A device reporting `caps`, with its probe.
    pub fn new(caps: DeviceCapabilities) -> (Self, Arc<DeviceProbe>) {
        let probe = Arc::new(DeviceProbe::default());
        let device = Self {
            caps,
            probe: probe.clone(),
            textures: HashMap::new(),
            programs: HashMap::new(),
            framebuffers: HashMap::new(),
            geometries: HashMap::new(),
            next_id: 1,
            sync: 0,
        };
        (device, probe)
    }

    /// Starts a context thread running a reference device.
    pub fn spawn(caps: DeviceCapabilities) -> Result<(GpuContext, Arc<DeviceProbe>)> {
        let (device, probe) = Self::new(caps);
        let context = GpuContext::new(move || Ok(Box::new(device) as Box<dyn GpuDevice>))?;
        Ok((context, probe))
    }

    fn next(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    fn texture(&self, id: TextureId) -> Result<&SoftTexture> {
        self.textures
            .get(&id.0)
            .ok_or_else(|| Error::device(format!("unknown texture {}", id.0)))
    }
}

impl GpuDevice for ReferenceDevice {
    fn capabilities(&self) -> &DeviceCapabilities {
        &self.caps
    }

    fn compile_program(&mut self, desc: &ProgramDescriptor) -> Result<ProgramId> {
        self.probe.compiles.fetch_add(1, Ordering::SeqCst);
        if self.probe.fail_compile.load(Ordering::SeqCst) {
            return Err(Error::compilation(ShaderStage::Link, "injected link failure"));
        }
        if !desc.vertex.contains("fn vs_main") {
            return Err(Error::compilation(ShaderStage::Vertex, "missing entry point vs_main"));
        }
        if !desc.fragment.contains("fn fs_main") {
            return Err(Error::compilation(ShaderStage::Fragment, "missing entry point fs_main"));
        }
        if has_placeholders(&desc.fragment) {
            return Err(Error::compilation(ShaderStage::Fragment, "unresolved insertion point"));
        }
        if desc.fragment.contains("texture2D(") || desc.fragment.contains("texelFetch(") {
            return Err(Error::compilation(ShaderStage::Fragment, "source was not mangled"));
        }
        if desc.targets.len() != desc.spec.n_outputs {
            return Err(Error::compilation(
                ShaderStage::Link,
                format!("{} targets for {} outputs", desc.targets.len(), desc.spec.n_outputs),
            ));
        }
        if let Some(t) = desc.targets.iter().find(|t| !t.is_color_renderable()) {
            return Err(Error::compilation(ShaderStage::Link, format!("{t} is not color renderable")));
        }

        let id = self.next();
        self.programs.insert(id, SoftProgram { desc: desc.clone() });
        debug!(program = id, name = desc.name, "reference program compiled");
        Ok(ProgramId(id))
    }

    fn delete_program(&mut self, id: ProgramId) {
        self.programs.remove(&id.0);
    }

    fn create_texture(&mut self, desc: &TextureDescriptor) -> Result<TextureId> {
        if desc.width == 0 || desc.height == 0 {
            return Err(Error::resource(format!("empty {}x{} texture", desc.width, desc.height)));
        }
        if !self.caps.supports(desc.format) {
            return Err(Error::resource(format!("texel format {} unsupported", desc.format)));
        }
        let id = self.next();
        self.textures
            .insert(id, SoftTexture::new(desc.width, desc.height, desc.format, desc.target));
        self.probe.live_textures.fetch_add(1, Ordering::SeqCst);
        Ok(TextureId(id))
    }

    fn delete_texture(&mut self, id: TextureId) {
        if self.textures.remove(&id.0).is_some() {
            self.probe.live_textures.fetch_sub(1, Ordering::SeqCst);
        }
    }

    fn texture_descriptor(&self, id: TextureId) -> Option<TextureDescriptor> {
        self.textures.get(&id.0).map(|t| TextureDescriptor {
            width: t.width,
            height: t.height,
            format: t.format,
            target: t.target,
        })
    }

    fn write_texture(&mut self, id: TextureId, data: &[u8]) -> Result<()> {
        self.textures
            .get_mut(&id.0)
            .ok_or_else(|| Error::device(format!("unknown texture {}", id.0)))?
            .write_bytes(data)
    }

    fn read_texture(&mut self, id: TextureId) -> Result<Vec<u8>> {
        Ok(self.texture(id)?.to_bytes())
    }

    fn create_framebuffer(&mut self, width: u32, height: u32) -> Result<FramebufferId> {
        let id = self.next();
        self.framebuffers.insert(id, (width, height));
        Ok(FramebufferId(id))
    }

    fn delete_framebuffer(&mut self, id: FramebufferId) {
        self.framebuffers.remove(&id.0);
    }

    fn create_geometry(&mut self, vertices: &[Vertex], indices: &[u16]) -> Result<GeometryId> {
        if indices.iter().any(|&i| i as usize >= vertices.len()) {
            return Err(Error::resource("index out of range"));
        }
        let id = self.next();
        self.geometries.insert(id, indices.len());
        Ok(GeometryId(id))
    }

    fn delete_geometry(&mut self, id: GeometryId) {
        self.geometries.remove(&id.0);
    }

    fn draw(&mut self, call: &DrawCall<'_>) -> Result<()> {
        let n = self.probe.draws.fetch_add(1, Ordering::SeqCst) + 1;
        let fail_at = self.probe.fail_draw_at.load(Ordering::SeqCst);
        if fail_at != 0 && n == fail_at {
            self.probe.fail_draw_at.store(0, Ordering::SeqCst);
            warn!(draw = n, "injected draw failure");
            return Err(Error::device(format!("draw {n} failed")));
        }

        let program = self
            .programs
            .get(&call.program.0)
            .ok_or_else(|| Error::device(format!("unknown program {}", call.program.0)))?;
        let &(width, height) = self
            .framebuffers
            .get(&call.framebuffer.0)
            .ok_or_else(|| Error::device(format!("unknown framebuffer {}", call.framebuffer.0)))?;
        if !self.geometries.contains_key(&call.geometry.0) {
            return Err(Error::device(format!("unknown geometry {}", call.geometry.0)));
        }
        if call.attachments.len() != program.desc.targets.len() {
            return Err(Error::device(format!(
                "{} attachments for {} targets",
                call.attachments.len(),
                program.desc.targets.len()
            )));
        }
        for (id, format) in call.attachments.iter().zip(&program.desc.targets) {
            let t = self.texture(*id)?;
            if t.format != *format || (t.width, t.height) != (width, height) {
                return Err(Error::device(format!(
                    "attachment {} is {}x{} {}, pipeline expects {}x{} {}",
                    id.0, t.width, t.height, t.format, width, height, format
                )));
            }
        }

        let mut bindings = call.textures.to_vec();
        bindings.sort_by_key(|b| b.binding);
        let inputs = bindings
            .iter()
            .map(|b| self.texture(b.texture))
            .collect::<Result<Vec<_>>>()?;

        let kernel = Kernel::new(&program.desc.spec, program.desc.source_target, &inputs, call.uniforms);
        let frags = kernel.run(width, height);
        trace!(program = call.program.0, width, height, "reference draw");

        let attachments = call.attachments.to_vec();
        for (i, id) in attachments.into_iter().enumerate() {
            let Some(target) = self.textures.get_mut(&id.0) else {
                continue;
            };
            for (n, frag) in frags.iter().enumerate() {
                let (x, y) = ((n as u32) % width, (n as u32) / width);
                target.store(x, y, frag[i].to_array());
            }
        }
        Ok(())
    }

    fn copy_texture(&mut self, src: TextureId, dst: TextureId, width: u32, height: u32) -> Result<()> {
        self.probe.copies.fetch_add(1, Ordering::SeqCst);
        let source = self.texture(src)?.clone();
        let target = self
            .textures
            .get_mut(&dst.0)
            .ok_or_else(|| Error::device(format!("unknown texture {}", dst.0)))?;
        if width > source.width.min(target.width) || height > source.height.min(target.height) {
            return Err(Error::device(format!("copy region {width}x{height} out of bounds")));
        }
        for y in 0..height {
            for x in 0..width {
                let mut value = [0.0f32; 4];
                for (c, v) in source.texel(x, y).iter().enumerate() {
                    value[c] = *v;
                }
                target.store(x, y, value);
            }
        }
        Ok(())
    }

    fn insert_sync_point(&mut self) -> SyncPoint {
        self.sync += 1;
        SyncPoint(self.sync)
    }

    fn wait_sync_point(&mut self, sync: SyncPoint) -> Result<()> {
        // work runs to completion on submission
        if sync.0 > self.sync {
            return Err(Error::device(format!("sync point {} was never inserted", sync.0)));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use texconv_core::{TexelFormat, TextureTarget};

    #[test]
    fn test_copy_reformats_channels() {
        let (mut dev, probe) = ReferenceDevice::new(DeviceCapabilities::full());
        let desc = |format| TextureDescriptor { width: 2, height: 2, format, target: TextureTarget::TwoD };
        let src = dev.create_texture(&desc(TexelFormat::Rgba8)).unwrap();
        let dst = dev.create_texture(&TextureDescriptor { width: 1, height: 1, ..desc(TexelFormat::Rg8) }).unwrap();
        dev.write_texture(src, &[10, 20, 30, 40, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0]).unwrap();
        dev.copy_texture(src, dst, 1, 1).unwrap();
        assert_eq!(dev.read_texture(dst).unwrap(), vec![10, 20]);
        assert_eq!(probe.copies(), 1);
        assert!(dev.copy_texture(src, dst, 2, 2).is_err());
        assert_eq!(probe.live_textures(), 2);
        dev.delete_texture(src);
        assert_eq!(probe.live_textures(), 1);
    }

    #[test]
    fn test_unsupported_texel_format() {
        let (mut dev, _) = ReferenceDevice::new(DeviceCapabilities::gles2());
        let desc = TextureDescriptor { width: 4, height: 4, format: TexelFormat::R16, target: TextureTarget::TwoD };
        assert!(matches!(dev.create_texture(&desc), Err(Error::Resource { .. })));
    }

    #[test]
    fn test_sync_points_monotonic() {
        let (mut dev, _) = ReferenceDevice::new(DeviceCapabilities::full());
        let a = dev.insert_sync_point();
        let b = dev.insert_sync_point();
        assert!(b > a);
        assert!(dev.wait_sync_point(a).is_ok());
        assert!(dev.wait_sync_point(SyncPoint(b.0 + 5)).is_err());
    }
}
