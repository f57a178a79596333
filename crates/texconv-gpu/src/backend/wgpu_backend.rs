//! wgpu device.
//!
//! Conversion programs run as render pipelines over the shared quad. Copies
//! between textures of different formats (intermediate to plane) go through
//! a small blit pipeline per destination format.

use std::collections::HashMap;

use texconv_core::{DeviceCapabilities, Error, Result, ShaderStage, TexelFormat, TextureTarget};
use tracing::{debug, info, trace};
use wgpu::util::DeviceExt;

use crate::device::{
    DrawCall, FramebufferId, GeometryId, GpuDevice, ProgramDescriptor, ProgramId, SyncPoint,
    TextureDescriptor, TextureId,
};
use crate::shaders::{Addressing, Vertex, FIRST_TEXTURE_BINDING, SAMPLER_BINDING, UNIFORM_BINDING};

// =============================================================================
// Blit
// =============================================================================

const BLIT_SHADER: &str = r#"
@group(0) @binding(0) var src: texture_2d<f32>;

@vertex
fn vs_main(@builtin(vertex_index) index: u32) -> @builtin(position) vec4<f32> {
    let x = f32(i32(index & 1u) * 4 - 1);
    let y = f32(i32(index >> 1u) * 4 - 1);
    return vec4<f32>(x, y, 0.0, 1.0);
}

@fragment
fn fs_main(@builtin(position) pos: vec4<f32>) -> @location(0) vec4<f32> {
    return textureLoad(src, vec2<i32>(pos.xy), 0);
}
"#;

fn wgpu_format(format: TexelFormat) -> Option<wgpu::TextureFormat> {
    Some(match format {
        TexelFormat::R8 => wgpu::TextureFormat::R8Unorm,
        TexelFormat::Rg8 => wgpu::TextureFormat::Rg8Unorm,
        TexelFormat::Rgba8 => wgpu::TextureFormat::Rgba8Unorm,
        TexelFormat::R16 => wgpu::TextureFormat::R16Unorm,
        TexelFormat::Rg16 => wgpu::TextureFormat::Rg16Unorm,
        TexelFormat::Rgba16 => wgpu::TextureFormat::Rgba16Unorm,
        TexelFormat::Rgb10a2 => wgpu::TextureFormat::Rgb10a2Unorm,
        // no three channel, 5:6:5 or luminance formats
        TexelFormat::Rgb8
        | TexelFormat::Rgb16
        | TexelFormat::Rgb565
        | TexelFormat::Luminance8
        | TexelFormat::LuminanceAlpha8 => {
            return None;
        }
    })
}

struct WgpuTexture {
    texture: wgpu::Texture,
    view: wgpu::TextureView,
    desc: TextureDescriptor,
}

struct WgpuProgram {
    pipeline: wgpu::RenderPipeline,
    layout: wgpu::BindGroupLayout,
    addressing: Addressing,
}

struct WgpuGeometry {
    vertices: wgpu::Buffer,
    indices: wgpu::Buffer,
    count: u32,
}

/// Device backed by wgpu (Vulkan, Metal, DX12).
///
/// Rectangle and external textures are not available, nor are three channel
/// texel formats. 16-bit formats need `TEXTURE_FORMAT_16BIT_NORM`.
pub struct WgpuDevice {
    device: wgpu::Device,
    queue: wgpu::Queue,
    caps: DeviceCapabilities,
    sampler: wgpu::Sampler,
    blit_layout: wgpu::BindGroupLayout,
    blit_pipelines: HashMap<TexelFormat, wgpu::RenderPipeline>,
    programs: HashMap<ProgramId, WgpuProgram>,
    textures: HashMap<TextureId, WgpuTexture>,
    framebuffers: HashMap<FramebufferId, (u32, u32)>,
    geometries: HashMap<GeometryId, WgpuGeometry>,
    next_handle: u64,
    submitted: u64,
}

impl WgpuDevice {
    /// Check if wgpu is available.
    pub fn is_available() -> bool {
        pollster::block_on(async {
            let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
                backends: wgpu::Backends::all(),
                ..Default::default()
            });
            instance
                .request_adapter(&wgpu::RequestAdapterOptions {
                    power_preference: wgpu::PowerPreference::HighPerformance,
                    compatible_surface: None,
                    force_fallback_adapter: false,
                })
                .await
                .is_some()
        })
    }

    /// Creates the device. Call from the context thread, e.g. in the
    /// factory passed to [`GpuContext::new`](crate::GpuContext::new).
    pub fn new() -> Result<Self> {
        pollster::block_on(Self::new_async())
    }

    /// Creates the device asynchronously.
    pub async fn new_async() -> Result<Self> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: None,
                force_fallback_adapter: false,
            })
            .await
            .ok_or_else(|| Error::device("no wgpu adapter"))?;

        let norm16 = adapter.features().contains(wgpu::Features::TEXTURE_FORMAT_16BIT_NORM);
        let required_features = if norm16 {
            wgpu::Features::TEXTURE_FORMAT_16BIT_NORM
        } else {
            wgpu::Features::empty()
        };
        let adapter_limits = adapter.limits();
        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("texconv_device"),
                    required_features,
                    required_limits: adapter_limits.clone(),
                    memory_hints: wgpu::MemoryHints::Performance,
                    ..Default::default()
                },
                None,
            )
            .await
            .map_err(|e| Error::device(e.to_string()))?;

        let adapter_info = adapter.get_info();
        let mut texel_formats = vec![TexelFormat::R8, TexelFormat::Rg8, TexelFormat::Rgba8, TexelFormat::Rgb10a2];
        if norm16 {
            texel_formats.extend([TexelFormat::R16, TexelFormat::Rg16, TexelFormat::Rgba16]);
        }
        let caps = DeviceCapabilities {
            name: adapter_info.name.clone(),
            shading_language_version: 450,
            max_draw_buffers: adapter_limits.max_color_attachments.min(4),
            texel_fetch: true,
            rg_textures: true,
            rg_render: true,
            external_textures: false,
            rectangle_textures: false,
            texel_formats,
        };
        info!(adapter = %adapter_info.name, backend = ?adapter_info.backend, norm16, "wgpu device ready");

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("tex_sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });
        let blit_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("blit_layout"),
            entries: &[texture_entry(0)],
        });

        Ok(Self {
            device,
            queue,
            caps,
            sampler,
            blit_layout,
            blit_pipelines: HashMap::new(),
            programs: HashMap::new(),
            textures: HashMap::new(),
            framebuffers: HashMap::new(),
            geometries: HashMap::new(),
            next_handle: 1,
            submitted: 0,
        })
    }

    fn next_handle(&mut self) -> u64 {
        let h = self.next_handle;
        self.next_handle += 1;
        h
    }

    fn texture(&self, id: TextureId) -> Result<&WgpuTexture> {
        self.textures
            .get(&id)
            .ok_or_else(|| Error::resource(format!("unknown texture {}", id.0)))
    }

    /// Creates a module, reporting validation errors as compilation errors.
    fn shader_module(&self, label: &str, source: &str, stage: ShaderStage) -> Result<wgpu::ShaderModule> {
        self.device.push_error_scope(wgpu::ErrorFilter::Validation);
        let module = self.device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(label),
            source: wgpu::ShaderSource::Wgsl(source.into()),
        });
        match pollster::block_on(self.device.pop_error_scope()) {
            Some(e) => Err(Error::compilation(stage, e.to_string())),
            None => Ok(module),
        }
    }

    fn blit_pipeline(&mut self, format: TexelFormat) -> Result<&wgpu::RenderPipeline> {
        if !self.blit_pipelines.contains_key(&format) {
            let target = wgpu_format(format)
                .ok_or_else(|| Error::resource(format!("{format} cannot be a copy target")))?;
            let module = self.shader_module("blit", BLIT_SHADER, ShaderStage::Fragment)?;
            let layout = self.device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("blit_pipeline_layout"),
                bind_group_layouts: &[&self.blit_layout],
                push_constant_ranges: &[],
            });
            let pipeline = self.device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some("blit_pipeline"),
                layout: Some(&layout),
                vertex: wgpu::VertexState {
                    module: &module,
                    entry_point: Some("vs_main"),
                    buffers: &[],
                    compilation_options: Default::default(),
                },
                fragment: Some(wgpu::FragmentState {
                    module: &module,
                    entry_point: Some("fs_main"),
                    targets: &[Some(target.into())],
                    compilation_options: Default::default(),
                }),
                primitive: wgpu::PrimitiveState::default(),
                depth_stencil: None,
                multisample: wgpu::MultisampleState::default(),
                multiview: None,
                cache: None,
            });
            self.blit_pipelines.insert(format, pipeline);
        }
        self.blit_pipelines
            .get(&format)
            .ok_or_else(|| Error::resource("blit pipeline missing"))
    }

    fn submit(&mut self, encoder: wgpu::CommandEncoder) {
        self.queue.submit(std::iter::once(encoder.finish()));
        self.submitted += 1;
    }
}

fn texture_entry(binding: u32) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::FRAGMENT,
        ty: wgpu::BindingType::Texture {
            sample_type: wgpu::TextureSampleType::Float { filterable: true },
            view_dimension: wgpu::TextureViewDimension::D2,
            multisampled: false,
        },
        count: None,
    }
}

impl GpuDevice for WgpuDevice {
    fn capabilities(&self) -> &DeviceCapabilities {
        &self.caps
    }

    fn compile_program(&mut self, desc: &ProgramDescriptor) -> Result<ProgramId> {
        let vertex = self.shader_module(desc.name, &desc.vertex, ShaderStage::Vertex)?;
        let fragment = self.shader_module(desc.name, &desc.fragment, ShaderStage::Fragment)?;

        let mut entries = vec![wgpu::BindGroupLayoutEntry {
            binding: UNIFORM_BINDING,
            visibility: wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        }];
        for i in 0..desc.textures.len() {
            entries.push(texture_entry(FIRST_TEXTURE_BINDING + i as u32));
        }
        if desc.addressing == Addressing::Sampled {
            entries.push(wgpu::BindGroupLayoutEntry {
                binding: SAMPLER_BINDING,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                count: None,
            });
        }
        let layout = self.device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some(desc.name),
            entries: &entries,
        });
        let pipeline_layout = self.device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some(desc.name),
            bind_group_layouts: &[&layout],
            push_constant_ranges: &[],
        });

        let targets = desc
            .targets
            .iter()
            .map(|f| {
                wgpu_format(*f).map(|format| Some(format.into())).ok_or_else(|| {
                    Error::compilation(ShaderStage::Link, format!("{f} is not renderable"))
                })
            })
            .collect::<Result<Vec<Option<wgpu::ColorTargetState>>>>()?;

        let vertex_layout = wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Vertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x2],
        };

        self.device.push_error_scope(wgpu::ErrorFilter::Validation);
        let pipeline = self.device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some(desc.name),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &vertex,
                entry_point: Some("vs_main"),
                buffers: &[vertex_layout],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &fragment,
                entry_point: Some("fs_main"),
                targets: &targets,
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState::default(),
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        });
        if let Some(e) = pollster::block_on(self.device.pop_error_scope()) {
            return Err(Error::compilation(ShaderStage::Link, e.to_string()));
        }

        let id = ProgramId(self.next_handle());
        debug!(program = id.0, name = desc.name, targets = desc.targets.len(), "render pipeline created");
        self.programs.insert(id, WgpuProgram { pipeline, layout, addressing: desc.addressing });
        Ok(id)
    }

    fn delete_program(&mut self, id: ProgramId) {
        self.programs.remove(&id);
    }

    fn create_texture(&mut self, desc: &TextureDescriptor) -> Result<TextureId> {
        if desc.target != TextureTarget::TwoD {
            return Err(Error::resource(format!("{} textures unsupported", desc.target)));
        }
        let format = wgpu_format(desc.format)
            .filter(|_| self.caps.supports(desc.format))
            .ok_or_else(|| Error::resource(format!("{} textures unsupported", desc.format)))?;
        let texture = self.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("plane"),
            size: wgpu::Extent3d {
                width: desc.width,
                height: desc.height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format,
            usage: wgpu::TextureUsages::TEXTURE_BINDING
                | wgpu::TextureUsages::RENDER_ATTACHMENT
                | wgpu::TextureUsages::COPY_SRC
                | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let id = TextureId(self.next_handle());
        self.textures.insert(id, WgpuTexture { texture, view, desc: *desc });
        Ok(id)
    }

    fn delete_texture(&mut self, id: TextureId) {
        if let Some(t) = self.textures.remove(&id) {
            t.texture.destroy();
        }
    }

    fn texture_descriptor(&self, id: TextureId) -> Option<TextureDescriptor> {
        self.textures.get(&id).map(|t| t.desc)
    }

    fn write_texture(&mut self, id: TextureId, data: &[u8]) -> Result<()> {
        let t = self.texture(id)?;
        let bpr = t.desc.width as usize * t.desc.format.bytes_per_texel();
        if data.len() != bpr * t.desc.height as usize {
            return Err(Error::resource(format!(
                "texture {} expects {} bytes, got {}",
                id.0,
                bpr * t.desc.height as usize,
                data.len()
            )));
        }
        self.queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &t.texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            data,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(bpr as u32),
                rows_per_image: Some(t.desc.height),
            },
            t.texture.size(),
        );
        Ok(())
    }

    fn read_texture(&mut self, id: TextureId) -> Result<Vec<u8>> {
        let t = self.texture(id)?;
        let (width, height) = (t.desc.width, t.desc.height);
        let bpr = width as usize * t.desc.format.bytes_per_texel();
        let align = wgpu::COPY_BYTES_PER_ROW_ALIGNMENT as usize;
        let padded = bpr.div_ceil(align) * align;

        let staging = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("staging_buffer"),
            size: (padded * height as usize) as u64,
            usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
            mapped_at_creation: false,
        });
        let mut encoder = self.device.create_command_encoder(&Default::default());
        encoder.copy_texture_to_buffer(
            t.texture.as_image_copy(),
            wgpu::TexelCopyBufferInfo {
                buffer: &staging,
                layout: wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(padded as u32),
                    rows_per_image: Some(height),
                },
            },
            t.texture.size(),
        );
        self.submit(encoder);

        let slice = staging.slice(..);
        let (tx, rx) = std::sync::mpsc::channel();
        slice.map_async(wgpu::MapMode::Read, move |r| {
            let _ = tx.send(r);
        });
        self.device.poll(wgpu::Maintain::Wait);
        rx.recv()
            .map_err(|_| Error::device("map channel closed"))?
            .map_err(|e| Error::device(format!("map failed: {e}")))?;

        let mapped = slice.get_mapped_range();
        let mut out = Vec::with_capacity(bpr * height as usize);
        for row in mapped.chunks_exact(padded) {
            out.extend_from_slice(&row[..bpr]);
        }
        drop(mapped);
        staging.unmap();
        Ok(out)
    }

    fn create_framebuffer(&mut self, width: u32, height: u32) -> Result<FramebufferId> {
        let id = FramebufferId(self.next_handle());
        self.framebuffers.insert(id, (width, height));
        Ok(id)
    }

    fn delete_framebuffer(&mut self, id: FramebufferId) {
        self.framebuffers.remove(&id);
    }

    fn create_geometry(&mut self, vertices: &[Vertex], indices: &[u16]) -> Result<GeometryId> {
        let vertex_buffer = self.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("quad_vertices"),
            contents: bytemuck::cast_slice(vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index_buffer = self.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("quad_indices"),
            contents: bytemuck::cast_slice(indices),
            usage: wgpu::BufferUsages::INDEX,
        });
        let id = GeometryId(self.next_handle());
        self.geometries.insert(
            id,
            WgpuGeometry { vertices: vertex_buffer, indices: index_buffer, count: indices.len() as u32 },
        );
        Ok(id)
    }

    fn delete_geometry(&mut self, id: GeometryId) {
        self.geometries.remove(&id);
    }

    fn draw(&mut self, call: &DrawCall<'_>) -> Result<()> {
        let program = self
            .programs
            .get(&call.program)
            .ok_or_else(|| Error::resource(format!("unknown program {}", call.program.0)))?;
        let &(width, height) = self
            .framebuffers
            .get(&call.framebuffer)
            .ok_or_else(|| Error::resource(format!("unknown framebuffer {}", call.framebuffer.0)))?;
        let geometry = self
            .geometries
            .get(&call.geometry)
            .ok_or_else(|| Error::resource(format!("unknown geometry {}", call.geometry.0)))?;

        let uniforms = self.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("params"),
            contents: &call.uniforms.to_bytes(),
            usage: wgpu::BufferUsages::UNIFORM,
        });

        let mut entries = vec![wgpu::BindGroupEntry {
            binding: UNIFORM_BINDING,
            resource: uniforms.as_entire_binding(),
        }];
        for binding in call.textures {
            let t = self.texture(binding.texture)?;
            entries.push(wgpu::BindGroupEntry {
                binding: binding.binding,
                resource: wgpu::BindingResource::TextureView(&t.view),
            });
        }
        if program.addressing == Addressing::Sampled {
            entries.push(wgpu::BindGroupEntry {
                binding: SAMPLER_BINDING,
                resource: wgpu::BindingResource::Sampler(&self.sampler),
            });
        }
        let bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("conversion_bind_group"),
            layout: &program.layout,
            entries: &entries,
        });

        let mut attachments = Vec::with_capacity(call.attachments.len());
        for id in call.attachments {
            let t = self.texture(*id)?;
            if (t.desc.width, t.desc.height) != (width, height) {
                return Err(Error::resource(format!(
                    "attachment {} is {}x{}, framebuffer is {width}x{height}",
                    id.0, t.desc.width, t.desc.height
                )));
            }
            attachments.push(Some(wgpu::RenderPassColorAttachment {
                view: &t.view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(wgpu::Color::TRANSPARENT),
                    store: wgpu::StoreOp::Store,
                },
            }));
        }

        let mut encoder = self.device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("conversion_encoder"),
        });
        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("conversion_pass"),
                color_attachments: &attachments,
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });
            pass.set_pipeline(&program.pipeline);
            pass.set_bind_group(0, &bind_group, &[]);
            pass.set_viewport(0.0, 0.0, width as f32, height as f32, 0.0, 1.0);
            pass.set_vertex_buffer(0, geometry.vertices.slice(..));
            pass.set_index_buffer(geometry.indices.slice(..), wgpu::IndexFormat::Uint16);
            pass.draw_indexed(0..geometry.count, 0, 0..1);
        }
        self.submit(encoder);
        trace!(program = call.program.0, width, height, "draw submitted");
        Ok(())
    }

    fn copy_texture(&mut self, src: TextureId, dst: TextureId, width: u32, height: u32) -> Result<()> {
        let dst_format = self.texture(dst)?.desc.format;
        self.blit_pipeline(dst_format)?;
        let s = self.texture(src)?;
        let d = self.texture(dst)?;
        if width > s.desc.width.min(d.desc.width) || height > s.desc.height.min(d.desc.height) {
            return Err(Error::resource(format!(
                "copy of {width}x{height} exceeds textures {} and {}",
                src.0, dst.0
            )));
        }
        let pipeline = self
            .blit_pipelines
            .get(&dst_format)
            .ok_or_else(|| Error::resource("blit pipeline missing"))?;
        let bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("blit_bind_group"),
            layout: &self.blit_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::TextureView(&s.view),
            }],
        });

        let mut encoder = self.device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("blit_encoder"),
        });
        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("blit_pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &d.view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Load,
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });
            pass.set_pipeline(pipeline);
            pass.set_bind_group(0, &bind_group, &[]);
            pass.set_viewport(0.0, 0.0, width as f32, height as f32, 0.0, 1.0);
            pass.set_scissor_rect(0, 0, width, height);
            pass.draw(0..3, 0..1);
        }
        self.submit(encoder);
        Ok(())
    }

    fn insert_sync_point(&mut self) -> SyncPoint {
        SyncPoint(self.submitted)
    }

    fn wait_sync_point(&mut self, sync: SyncPoint) -> Result<()> {
        // one queue: submissions execute in order
        if sync.0 > self.submitted {
            return Err(Error::device(format!("sync point {} was never inserted", sync.0)));
        }
        Ok(())
    }
}
