//! Shader source generation.
//!
//! A conversion program is composed from a [`ShaderTemplate`] in three steps:
//!
//! 1. [`compose_fragment`] emits the uniform block, texture bindings, the
//!    template's helpers and a `fs_main` wrapper around the template body.
//! 2. [`fill_placeholders`] resolves `%NAME%` insertion points from the
//!    [`KernelSpec`] of the format pair.
//! 3. [`mangle_shader`] rewrites the pseudo built-ins for the texture target
//!    the device samples from. Devices may override this step.
//!
//! Binding layout of every program:
//!
//! ```text
//! @group(0) @binding(0)     uniform block `params`
//! @group(0) @binding(1..=4) input plane textures, in plane order
//! @group(0) @binding(8)     `tex_sampler`, sampled templates only
//! ```

mod helpers;
mod mangle;
pub mod swizzle;
pub mod templates;

use std::fmt::Write as _;

use bytemuck::{Pod, Zeroable};
use texconv_core::{Error, FormatDescriptor, Result, ShaderStage, TexelFormat, TileLayout, VideoFormat};
use tracing::trace;

pub use helpers::Helper;
pub use mangle::{has_placeholders, mangle_shader};
pub use templates::{select_template, Addressing, LayoutClass, ShaderTemplate, TemplateKind};

use crate::uniforms::{UniformLayout, DEFAULT_UNIFORMS};

/// Binding of the uniform block.
pub const UNIFORM_BINDING: u32 = 0;
/// Binding of the first input plane texture.
pub const FIRST_TEXTURE_BINDING: u32 = 1;
/// Binding of `tex_sampler`.
pub const SAMPLER_BINDING: u32 = 8;

/// How RGB samples are laid out on one side of a conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum RgbLayout {
    /// All channels in one texture.
    #[default]
    Packed,
    /// One plane per channel.
    Planar,
}

/// Per format pair parameters of a conversion program.
///
/// Everything a template needs beyond its uniforms is captured here, both to
/// resolve insertion points in WGSL and to drive software evaluation of the
/// same program.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KernelSpec {
    /// Selected template.
    pub kind: TemplateKind,
    /// Layout of RGB input.
    pub rgb_in: RgbLayout,
    /// Layout of RGB output.
    pub rgb_out: RgbLayout,
    /// Packed RGB input without alpha; alpha reads as 1.
    pub opaque_in: bool,
    /// Input has an alpha plane.
    pub in_alpha: bool,
    /// Output has an alpha plane.
    pub out_alpha: bool,
    /// Texel channel holding the second chroma sample: 1 (`g`) or 3 (`a`).
    pub uv_second: usize,
    /// Tile geometry of a tiled input.
    pub tile: Option<TileLayout>,
    /// Output is 16-bit gray split over two 8-bit channels.
    pub gray16_out: bool,
    /// Number of input planes.
    pub n_inputs: usize,
    /// Number of output planes.
    pub n_outputs: usize,
}

impl KernelSpec {
    /// Parameters for converting `input` to `output` with `template`.
    ///
    /// `in_texels` are the texel formats the input planes are stored as on
    /// the device.
    pub fn new(
        template: &ShaderTemplate,
        input: &FormatDescriptor,
        output: &FormatDescriptor,
        in_texels: &[TexelFormat],
    ) -> Self {
        let in_class = LayoutClass::of(input);
        let out_class = LayoutClass::of(output);
        let rgb_layout = |class| match class {
            Some(LayoutClass::PlanarRgb) => RgbLayout::Planar,
            _ => RgbLayout::Packed,
        };
        let alpha_plane = |d: &FormatDescriptor| d.has_alpha() && d.n_planes > 1;
        let uv_second = match in_texels.get(1) {
            Some(TexelFormat::LuminanceAlpha8) => 3,
            _ => 1,
        };
        Self {
            kind: template.kind,
            rgb_in: rgb_layout(in_class),
            rgb_out: rgb_layout(out_class),
            opaque_in: in_class == Some(LayoutClass::PackedRgb) && !input.has_alpha(),
            in_alpha: alpha_plane(input),
            out_alpha: alpha_plane(output),
            uv_second,
            tile: input.tile,
            gray16_out: matches!(output.format, VideoFormat::Gray16Le | VideoFormat::Gray16Be),
            n_inputs: input.n_planes as usize,
            n_outputs: output.n_planes as usize,
        }
    }
}

/// Names the input planes of `desc` are bound as, in plane order.
pub fn texture_names(desc: &FormatDescriptor) -> &'static [&'static str] {
    let names: &'static [&'static str] = match LayoutClass::of(desc) {
        Some(LayoutClass::PlanarRgb) => &["Ptex0", "Ptex1", "Ptex2", "Atex"],
        Some(LayoutClass::PlanarYuv) => &["Ytex", "Utex", "Vtex", "Atex"],
        Some(LayoutClass::SemiPlanarYuv) | Some(LayoutClass::TiledYuv) => &["Ytex", "UVtex", "Atex"],
        Some(LayoutClass::Yuy2Uyvy) | Some(LayoutClass::V210) => &["Ytex"],
        _ => &["tex"],
    };
    &names[..(desc.n_planes as usize).min(names.len())]
}

/// Uniform layout of `template`: the default set followed by its extras.
pub fn uniform_layout(template: &ShaderTemplate) -> UniformLayout {
    let mut decls = DEFAULT_UNIFORMS.to_vec();
    decls.extend_from_slice(template.uniforms);
    UniformLayout::new(&decls)
}

/// Resolves the `%NAME%` insertion points of `source` for `spec`.
pub fn fill_placeholders(source: &str, spec: &KernelSpec) -> String {
    let alpha_overwrite = if spec.opaque_in { "rgba.a = 1.0;" } else { "" };
    let (planar_alpha_read, semi_alpha_read) = if spec.in_alpha {
        (
            "texture2D(Atex, texcoord * params.tex_scale3).r * params.in_bitdepth_factor",
            "texture2D(Atex, texcoord * params.tex_scale2).r",
        )
    } else {
        ("1.0", "1.0")
    };
    let (planar_alpha_write, semi_alpha_write) = if spec.out_alpha {
        (
            "frag_data[3] = vec4<f32>(planes.w, 0.0, 0.0, 1.0);",
            "frag_data[2] = vec4<f32>(yuva.w, 0.0, 0.0, 1.0);",
        )
    } else {
        ("", "")
    };
    let uv_channels = if spec.uv_second == 3 { "ra" } else { "rg" };
    let gray_write = if spec.gray16_out {
        "let level = round(clamp(luma, 0.0, 1.0) * 65535.0);\n    \
         let hi = floor(level / 256.0);\n    \
         frag_data[0] = swizzle(vec4<f32>(hi / 255.0, (level - hi * 256.0) / 255.0, 0.0, 1.0), params.output_swizzle);"
    } else {
        "frag_data[0] = swizzle(vec4<f32>(luma, 0.0, 0.0, 1.0), params.output_swizzle);"
    };
    let (tile_luma, tile_chroma) = match spec.tile {
        Some(t) => (
            format!("vec2<i32>({}, {})", t.luma_width, t.luma_height),
            format!("vec2<i32>({}, {})", t.chroma_width, t.chroma_height),
        ),
        None => ("vec2<i32>(1, 1)".to_string(), "vec2<i32>(1, 1)".to_string()),
    };

    source
        .replace("%ALPHA_OVERWRITE%", alpha_overwrite)
        .replace("%PLANAR_ALPHA_READ%", planar_alpha_read)
        .replace("%PLANAR_ALPHA_WRITE%", planar_alpha_write)
        .replace("%SEMI_ALPHA_READ%", semi_alpha_read)
        .replace("%SEMI_ALPHA_WRITE%", semi_alpha_write)
        .replace("%UV_CHANNELS%", uv_channels)
        .replace("%GRAY_WRITE%", gray_write)
        .replace("%TILE_LUMA_DIM%", &tile_luma)
        .replace("%TILE_CHROMA_DIM%", &tile_chroma)
}

/// Composes the canonical fragment source of `template` for a format pair.
///
/// The result still uses the `texture2D` / `texelFetch` pseudo built-ins;
/// pass it through [`mangle_shader`] before compiling.
pub fn compose_fragment(
    template: &ShaderTemplate,
    spec: &KernelSpec,
    layout: &UniformLayout,
    texture_names: &[&str],
) -> Result<String> {
    let mut src = String::with_capacity(4096);
    let _ = writeln!(src, "// {}", template.name);
    src.push_str(&layout.wgsl_block());
    src.push('\n');

    for (i, name) in texture_names.iter().enumerate() {
        let _ = writeln!(
            src,
            "@group(0) @binding({}) var {name}: texture_2d<f32>;",
            FIRST_TEXTURE_BINDING + i as u32
        );
    }
    if template.addressing == Addressing::Sampled {
        let _ = writeln!(src, "@group(0) @binding({SAMPLER_BINDING}) var tex_sampler: sampler;");
    }

    src.push_str("\nvar<private> frag_data: array<vec4<f32>, 4>;\n\n");
    src.push_str("struct FragmentInput {\n    @builtin(position) position: vec4<f32>,\n    @location(0) v_texcoord: vec2<f32>,\n}\n\n");
    src.push_str("struct FragmentOutput {\n");
    for i in 0..spec.n_outputs {
        let _ = writeln!(src, "    @location({i}) out{i}: vec4<f32>,");
    }
    src.push_str("}\n");

    let mut emitted: Vec<Helper> = Vec::with_capacity(template.helpers.len());
    for helper in template.helpers {
        if emitted.contains(helper) {
            continue;
        }
        emitted.push(*helper);
        src.push_str(helper.source(spec));
    }

    src.push_str("\n@fragment\nfn fs_main(in: FragmentInput) -> FragmentOutput {\n");
    src.push_str("    let v_texcoord = in.v_texcoord;\n");
    src.push_str("    let texcoord = v_texcoord * params.vert_to_tex;\n");
    src.push_str("    let frag_coord = in.position.xy;\n");
    src.push_str(template.body);
    src.push_str("    var out: FragmentOutput;\n");
    for i in 0..spec.n_outputs {
        let _ = writeln!(src, "    out.out{i} = frag_data[{i}];");
    }
    src.push_str("    return out;\n}\n");

    let src = fill_placeholders(&src, spec);
    if has_placeholders(&src) {
        return Err(Error::compilation(
            ShaderStage::Fragment,
            format!("{}: unresolved insertion point", template.name),
        ));
    }
    trace!(template = template.name, len = src.len(), "composed fragment source");
    Ok(src)
}

/// Vertex stage shared by every conversion program.
///
/// Y is flipped so texture coordinate (0, 0) lands on the first row.
pub const VERTEX_SHADER: &str = r#"
struct VertexOutput {
    @builtin(position) position: vec4<f32>,
    @location(0) v_texcoord: vec2<f32>,
}

@vertex
fn vs_main(@location(0) a_position: vec3<f32>, @location(1) a_texcoord: vec2<f32>) -> VertexOutput {
    var out: VertexOutput;
    out.position = vec4<f32>(a_position.x, -a_position.y, a_position.z, 1.0);
    out.v_texcoord = a_texcoord;
    return out;
}
"#;

/// Vertex of the full screen quad.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    /// Clip space position.
    pub position: [f32; 3],
    /// Texture coordinate.
    pub texcoord: [f32; 2],
}

/// Full screen quad.
pub const QUAD_VERTICES: [Vertex; 4] = [
    Vertex { position: [1.0, -1.0, 0.0], texcoord: [1.0, 0.0] },
    Vertex { position: [-1.0, -1.0, 0.0], texcoord: [0.0, 0.0] },
    Vertex { position: [-1.0, 1.0, 0.0], texcoord: [0.0, 1.0] },
    Vertex { position: [1.0, 1.0, 0.0], texcoord: [1.0, 1.0] },
];

/// Two triangles over [`QUAD_VERTICES`].
pub const QUAD_INDICES: [u16; 6] = [0, 1, 2, 0, 2, 3];
