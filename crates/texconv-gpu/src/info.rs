//! Per format pair conversion state.
//!
//! [`ConversionInfo`] is built once when formats are set and holds everything
//! derived from the pair: the template, the composed source, plane texel
//! formats, swizzles, bit-depth factors and color matrices. Per frame work
//! only copies it into a [`UniformBlock`].

use std::sync::Arc;

use texconv_caps::conversion_formats_are_supported;
use texconv_core::{
    DeviceCapabilities, Error, FormatShape, Result, TexelFormat, TextureTarget, VideoFormat,
    VideoInfo,
};
use texconv_math::{to_rgb_matrix, to_yuv_matrix};
use tracing::{debug, trace};

use crate::shaders::swizzle::{bitdepth_factors, reorder_indexes};
use crate::shaders::{
    compose_fragment, select_template, texture_names, uniform_layout, KernelSpec, ShaderTemplate,
    TemplateKind,
};
use crate::uniforms::{UniformBlock, UniformLayout, UniformValue};

/// Key of a compiled program.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ProgramKey {
    /// Input format.
    pub from: VideoFormat,
    /// Output format.
    pub to: VideoFormat,
    /// Input texture target.
    pub target: TextureTarget,
    /// Texel formats of the input planes.
    pub in_texels: Vec<TexelFormat>,
}

/// Everything derived from an (input, output) format pair.
#[derive(Debug, Clone)]
pub struct ConversionInfo {
    /// Input format instance.
    pub in_info: VideoInfo,
    /// Output format instance.
    pub out_info: VideoInfo,
    /// Target of the input textures.
    pub from_target: TextureTarget,
    /// Target of the output textures.
    pub to_target: TextureTarget,
    /// Selected template.
    pub template: &'static ShaderTemplate,
    /// Format pair parameters.
    pub spec: KernelSpec,
    /// Texel formats of the input planes on the device.
    pub in_texels: Vec<TexelFormat>,
    /// Texel formats of the output planes on the device.
    pub out_texels: Vec<TexelFormat>,
    /// Input texture names in plane order.
    pub texture_names: &'static [&'static str],
    /// Uniform block layout.
    pub layout: Arc<UniformLayout>,
    /// Canonical fragment source, before mangling.
    pub fragment: String,
    /// Input reorder indexes.
    pub in_swizzle: [i32; 4],
    /// Output reorder indexes.
    pub out_swizzle: [i32; 4],
    /// Chroma decimation factors used by the template.
    pub chroma_sampling: [f32; 2],
    /// Rescale of LSB-aligned input samples.
    pub in_bitdepth_factor: f32,
    /// Rescale of LSB-aligned output samples.
    pub out_bitdepth_factor: f32,
    /// Input to R'G'B', column-major.
    pub to_rgb: [f32; 16],
    /// R'G'B' to output, column-major.
    pub to_yuv: [f32; 16],
}

fn plane_texels(
    info: &VideoInfo,
    caps: &DeviceCapabilities,
    from: VideoFormat,
    to: VideoFormat,
) -> Result<Vec<TexelFormat>> {
    info.planes()
        .iter()
        .map(|p| {
            caps.plane_texel_format(p.texel).ok_or_else(|| {
                Error::capability(from, to, format!("device cannot store {} planes", p.texel))
            })
        })
        .collect()
}

impl ConversionInfo {
    /// Validates the pair against the device and derives the conversion.
    pub fn new(
        in_info: &VideoInfo,
        out_info: &VideoInfo,
        from_target: TextureTarget,
        to_target: TextureTarget,
        caps: &DeviceCapabilities,
    ) -> Result<Self> {
        let (from, to) = (in_info.format, out_info.format);
        let in_desc = in_info.desc();
        let out_desc = out_info.desc();

        if to_target == TextureTarget::ExternalOes {
            return Err(Error::InvalidCaps(format!("cannot render into {to_target} textures")));
        }
        if !conversion_formats_are_supported(in_desc, out_desc) {
            return Err(Error::UnhandledFormat { from, to });
        }
        let template = select_template(in_desc, out_desc).ok_or(Error::UnhandledFormat { from, to })?;

        let needs_target = |t: TextureTarget| match t {
            TextureTarget::TwoD => true,
            TextureTarget::Rectangle => caps.rectangle_textures,
            TextureTarget::ExternalOes => caps.external_textures,
        };
        for target in [from_target, to_target] {
            if !needs_target(target) {
                return Err(Error::capability(from, to, format!("{target} textures unsupported")));
            }
        }

        let in_texels = plane_texels(in_info, caps, from, to)?;
        let out_texels = plane_texels(out_info, caps, from, to)?;

        if out_info.n_planes() > 1 && !caps.has_draw_buffers() {
            return Err(Error::capability(from, to, "multiple render targets required"));
        }
        if out_desc.shape() == FormatShape::Interleaved422 && !caps.rg_render {
            return Err(Error::capability(from, to, "two channel render targets required"));
        }
        if in_desc.is_tiled() && !caps.texel_fetch {
            return Err(Error::capability(from, to, "texel fetch required for tiled input"));
        }

        let spec = KernelSpec::new(template, in_desc, out_desc, &in_texels);
        let layout = Arc::new(uniform_layout(template));
        let names = texture_names(in_desc);
        let fragment = compose_fragment(template, &spec, &layout, names)?;

        let (in_swizzle, out_swizzle) = reorder_indexes(in_desc, out_desc, in_texels.first().copied());
        let (in_bitdepth_factor, _) = bitdepth_factors(in_desc);
        let (_, out_bitdepth_factor) = bitdepth_factors(out_desc);
        let chroma_sampling = chroma_sampling(template.kind, out_info);
        let to_rgb = to_rgb_matrix(in_info).to_column_major_f32();
        let to_yuv = to_yuv_matrix(out_info).to_column_major_f32();

        trace!(in_bitdepth_factor, out_bitdepth_factor, ?chroma_sampling, "conversion factors");
        trace!(?to_rgb, ?to_yuv, "conversion matrices");
        debug!(
            from = %from,
            to = %to,
            template = template.name,
            %from_target,
            %to_target,
            "conversion info built"
        );

        Ok(Self {
            in_info: in_info.clone(),
            out_info: out_info.clone(),
            from_target,
            to_target,
            template,
            spec,
            in_texels,
            out_texels,
            texture_names: names,
            layout,
            fragment,
            in_swizzle,
            out_swizzle,
            chroma_sampling,
            in_bitdepth_factor,
            out_bitdepth_factor,
            to_rgb,
            to_yuv,
        })
    }

    /// Key of the program this conversion needs.
    pub fn program_key(&self) -> ProgramKey {
        ProgramKey {
            from: self.in_info.format,
            to: self.out_info.format,
            target: self.from_target,
            in_texels: self.in_texels.clone(),
        }
    }

    /// Uniform values for a draw.
    pub fn uniforms(&self) -> UniformBlock {
        let mut u = UniformBlock::new(self.layout.clone());
        let in_info = &self.in_info;
        let h = in_info.height as f32;
        let data_width = in_info.plane(0).map_or(in_info.width, |p| p.width) as f32;
        // v210 words are addressed as texels of their own
        let w = if in_info.desc().shape() == FormatShape::V210 {
            data_width
        } else {
            in_info.width as f32
        };
        // tiled planes are addressed by their padded width
        let width = if in_info.desc().is_tiled() { data_width } else { w };
        let (out_w, out_h) = self.render_size();

        u.set("width", UniformValue::Float(width));
        u.set("height", UniformValue::Float(h));
        u.set("out_width", UniformValue::Float(out_w as f32));
        u.set("out_height", UniformValue::Float(out_h as f32));

        const SCALES: [&str; 4] = ["tex_scale0", "tex_scale1", "tex_scale2", "tex_scale3"];
        if self.from_target == TextureTarget::Rectangle {
            u.set("poffset_x", UniformValue::Float(1.0));
            u.set("poffset_y", UniformValue::Float(1.0));
            u.set("vert_to_tex", UniformValue::Vec2([w, h]));
            for (name, plane) in SCALES.iter().zip(in_info.planes()) {
                u.set(name, UniformValue::Vec2([plane.width as f32 / w, plane.height as f32 / h]));
            }
        } else {
            u.set("poffset_x", UniformValue::Float(1.0 / w));
            u.set("poffset_y", UniformValue::Float(1.0 / h));
            u.set("vert_to_tex", UniformValue::Vec2([1.0, 1.0]));
            for name in SCALES {
                u.set(name, UniformValue::Vec2([1.0, 1.0]));
            }
        }

        u.set("input_swizzle", UniformValue::IVec4(self.in_swizzle));
        u.set("output_swizzle", UniformValue::IVec4(self.out_swizzle));
        u.set("chroma_sampling", UniformValue::Vec2(self.chroma_sampling));
        u.set("in_bitdepth_factor", UniformValue::Float(self.in_bitdepth_factor));
        u.set("out_bitdepth_factor", UniformValue::Float(self.out_bitdepth_factor));
        u.set("to_rgb_matrix", UniformValue::Mat4(self.to_rgb));
        u.set("to_yuv_matrix", UniformValue::Mat4(self.to_yuv));
        u.set("gray_weights", UniformValue::Vec2(gray_weights(in_info.format)));
        u
    }

    /// Size of the draw. v210 output is drawn one fragment per 32-bit word,
    /// everything else one fragment per pixel.
    pub fn render_size(&self) -> (u32, u32) {
        match self.out_info.plane(0) {
            Some(p) if self.out_info.desc().shape() == FormatShape::V210 => (p.width, p.height),
            _ => (self.out_info.width, self.out_info.height),
        }
    }

    /// Whether the output plane `index` cannot be a color attachment of the
    /// full size draw and goes through an intermediate texture.
    pub fn needs_intermediate(&self, index: usize) -> bool {
        let Some(plane) = self.out_info.plane(index) else {
            return false;
        };
        let renderable = self.out_texels.get(index).is_some_and(|t| t.is_color_renderable());
        !renderable || (plane.width, plane.height) != self.render_size()
    }

    /// Format of the intermediate texture for this output.
    pub fn intermediate_format(&self) -> TexelFormat {
        if self.out_info.desc().bits > 8 {
            TexelFormat::Rgba16
        } else {
            TexelFormat::Rgba8
        }
    }
}

/// Decimation of the output chroma planes, for the templates that average it.
fn chroma_sampling(kind: TemplateKind, out_info: &VideoInfo) -> [f32; 2] {
    match kind {
        TemplateKind::RgbToPlanarYuv
        | TemplateKind::RgbToSemiPlanar
        | TemplateKind::PlanarYuvToPlanarYuv
        | TemplateKind::Yuy2UyvyToPlanarYuv
        | TemplateKind::V210ToPlanarYuv => {
            let (w, h) = out_info.desc().chroma_factors();
            [w as f32, h as f32]
        }
        _ => [1.0, 1.0],
    }
}

fn gray_weights(format: VideoFormat) -> [f32; 2] {
    match format {
        // two bytes of one 16-bit sample: 255 * 256 / 65535 and 255 / 65535
        VideoFormat::Gray16Le | VideoFormat::Gray16Be => [0.996_109, 0.003_891],
        _ => [1.0, 0.0],
    }
}
