//! Conversion templates and the dispatch table selecting them.

use texconv_core::{FormatDescriptor, FormatFamily, FormatShape};

use super::helpers::Helper;
use crate::uniforms::{
    UniformDecl, CHROMA_SAMPLING, GRAY_WEIGHTS, IN_BITDEPTH_FACTOR, OUT_BITDEPTH_FACTOR,
    OUT_HEIGHT, OUT_WIDTH, TO_RGB_MATRIX, TO_YUV_MATRIX,
};

/// Layout class of one side of a conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LayoutClass {
    /// RGB in one texture.
    PackedRgb,
    /// RGB with one plane per component.
    PlanarRgb,
    /// Gray in one texture.
    Gray,
    /// YUV with all components in one texel (AYUV, VUYA).
    PackedYuv,
    /// 4:2:2 pixel pairs (YUY2, UYVY, Y210, Y212).
    Yuy2Uyvy,
    /// 10-bit 4:2:2 in six pixel blocks.
    V210,
    /// YUV with one plane per component.
    PlanarYuv,
    /// Luma plane plus interleaved chroma plane.
    SemiPlanarYuv,
    /// Semi-planar in tiles.
    TiledYuv,
}

impl LayoutClass {
    /// Class of `desc`, `None` for palette formats.
    pub fn of(desc: &FormatDescriptor) -> Option<Self> {
        if desc.has_palette() {
            return None;
        }
        let class = match (desc.family(), desc.shape()) {
            (FormatFamily::Rgb, FormatShape::Planar) => Self::PlanarRgb,
            (FormatFamily::Rgb, _) => Self::PackedRgb,
            (FormatFamily::Gray, _) => Self::Gray,
            (FormatFamily::Yuv, FormatShape::Packed) => Self::PackedYuv,
            (FormatFamily::Yuv, FormatShape::Interleaved422) => Self::Yuy2Uyvy,
            (FormatFamily::Yuv, FormatShape::Planar) => Self::PlanarYuv,
            (FormatFamily::Yuv, FormatShape::SemiPlanar) => Self::SemiPlanarYuv,
            (FormatFamily::Yuv, FormatShape::Tiled) => Self::TiledYuv,
            (FormatFamily::Yuv, FormatShape::V210) => Self::V210,
        };
        Some(class)
    }

    /// Whether the class is an RGB layout.
    #[inline]
    pub fn is_rgb(self) -> bool {
        matches!(self, Self::PackedRgb | Self::PlanarRgb)
    }
}

/// Fragment programs the converter can generate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TemplateKind {
    /// Packed RGB to packed RGB channel reorder.
    Reorder,
    /// Planar RGB to or from packed or planar RGB.
    PlanarRgb,
    /// 8 or 16-bit gray to RGB.
    GrayToRgb,
    /// RGB to 8 or 16-bit gray.
    RgbToGray,
    /// AYUV/VUYA to RGB.
    PackedYuvToRgb,
    /// RGB to AYUV/VUYA.
    RgbToPackedYuv,
    /// Planar YUV(A) to RGB.
    PlanarYuvToRgb,
    /// RGB to planar YUV(A).
    RgbToPlanarYuv,
    /// Planar YUV to planar YUV.
    PlanarYuvToPlanarYuv,
    /// Semi-planar YUV (and AV12) to RGB.
    SemiPlanarToRgb,
    /// RGB to semi-planar YUV (and AV12).
    RgbToSemiPlanar,
    /// Tiled semi-planar YUV to RGB.
    TiledToRgb,
    /// YUY2/UYVY to RGB.
    Yuy2UyvyToRgb,
    /// RGB to YUY2/UYVY.
    RgbToYuy2Uyvy,
    /// Planar YUV to YUY2/UYVY.
    PlanarYuvToYuy2Uyvy,
    /// YUY2/UYVY to planar YUV.
    Yuy2UyvyToPlanarYuv,
    /// YUY2/UYVY to YUY2/UYVY.
    Yuy2UyvyToYuy2Uyvy,
    /// v210 to RGB.
    V210ToRgb,
    /// RGB to v210.
    RgbToV210,
    /// v210 to planar YUV(A).
    V210ToPlanarYuv,
    /// Planar YUV(A) to v210.
    PlanarYuvToV210,
    /// v210 to YUY2/UYVY.
    V210ToYuy2Uyvy,
    /// YUY2/UYVY to v210.
    Yuy2UyvyToV210,
}

/// How a template addresses its input textures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Addressing {
    /// Filtered sampling through a sampler.
    Sampled,
    /// Integer texel fetches, no sampler.
    TexelFetch,
}

/// Static definition of a fragment program.
#[derive(Debug)]
pub struct ShaderTemplate {
    /// Which program this is.
    pub kind: TemplateKind,
    /// Name, used in logs and as the source header.
    pub name: &'static str,
    /// Uniforms declared on top of [`DEFAULT_UNIFORMS`](crate::uniforms::DEFAULT_UNIFORMS).
    pub uniforms: &'static [UniformDecl],
    /// Helper functions, in emission order.
    pub helpers: &'static [Helper],
    /// Texture addressing.
    pub addressing: Addressing,
    /// Body of the fragment entry point.
    pub body: &'static str,
}

use Helper as H;

const RGB_IO: &[Helper] = &[H::Swizzle, H::ReadRgba, H::WriteRgba];

const REORDER: ShaderTemplate = ShaderTemplate {
    kind: TemplateKind::Reorder,
    name: "reorder",
    uniforms: &[],
    helpers: RGB_IO,
    addressing: Addressing::Sampled,
    body: "    write_rgba(read_rgba(texcoord));\n",
};

const PLANAR_RGB: ShaderTemplate = ShaderTemplate {
    kind: TemplateKind::PlanarRgb,
    name: "planar_rgb",
    uniforms: &[IN_BITDEPTH_FACTOR, OUT_BITDEPTH_FACTOR],
    helpers: RGB_IO,
    addressing: Addressing::Sampled,
    body: "    write_rgba(read_rgba(texcoord));\n",
};

const GRAY_TO_RGB: ShaderTemplate = ShaderTemplate {
    kind: TemplateKind::GrayToRgb,
    name: "gray_to_rgb",
    uniforms: &[GRAY_WEIGHTS, OUT_BITDEPTH_FACTOR],
    helpers: &[H::Swizzle, H::WriteRgba],
    addressing: Addressing::Sampled,
    body: r#"    let t = texture2D(tex, texcoord * params.tex_scale0);
    let g = dot(vec2<f32>(t[params.input_swizzle.x], t[params.input_swizzle.y]), params.gray_weights);
    write_rgba(vec4<f32>(g, g, g, 1.0));
"#,
};

const RGB_TO_GRAY: ShaderTemplate = ShaderTemplate {
    kind: TemplateKind::RgbToGray,
    name: "rgb_to_gray",
    uniforms: &[TO_YUV_MATRIX, IN_BITDEPTH_FACTOR],
    helpers: &[H::Swizzle, H::ColorMatrix, H::ReadRgba],
    addressing: Addressing::Sampled,
    body: r#"    let luma = color_matrix_apply(read_rgba(texcoord), params.to_yuv_matrix).x;
    %GRAY_WRITE%
"#,
};

const PACKED_YUV_TO_RGB: ShaderTemplate = ShaderTemplate {
    kind: TemplateKind::PackedYuvToRgb,
    name: "packed_yuv_to_rgb",
    uniforms: &[TO_RGB_MATRIX, OUT_BITDEPTH_FACTOR],
    helpers: &[H::Swizzle, H::ColorMatrix, H::WriteRgba],
    addressing: Addressing::Sampled,
    body: r#"    let yuva = swizzle(texture2D(tex, texcoord * params.tex_scale0), params.input_swizzle);
    write_rgba(color_matrix_apply(yuva, params.to_rgb_matrix));
"#,
};

const RGB_TO_PACKED_YUV: ShaderTemplate = ShaderTemplate {
    kind: TemplateKind::RgbToPackedYuv,
    name: "rgb_to_packed_yuv",
    uniforms: &[TO_YUV_MATRIX, IN_BITDEPTH_FACTOR],
    helpers: &[H::Swizzle, H::ColorMatrix, H::ReadRgba],
    addressing: Addressing::Sampled,
    body: r#"    let yuva = color_matrix_apply(read_rgba(texcoord), params.to_yuv_matrix);
    frag_data[0] = swizzle(yuva, params.output_swizzle);
"#,
};

const PLANAR_YUV_TO_RGB: ShaderTemplate = ShaderTemplate {
    kind: TemplateKind::PlanarYuvToRgb,
    name: "planar_yuv_to_rgb",
    uniforms: &[TO_RGB_MATRIX, IN_BITDEPTH_FACTOR, OUT_BITDEPTH_FACTOR],
    helpers: &[H::Swizzle, H::ColorMatrix, H::FetchPlanarYuva, H::WriteRgba],
    addressing: Addressing::Sampled,
    body: r#"    let yuva = swizzle(fetch_planar_yuva(texcoord), params.input_swizzle);
    write_rgba(color_matrix_apply(yuva, params.to_rgb_matrix));
"#,
};

const RGB_TO_PLANAR_YUV: ShaderTemplate = ShaderTemplate {
    kind: TemplateKind::RgbToPlanarYuv,
    name: "rgb_to_planar_yuv",
    uniforms: &[TO_YUV_MATRIX, CHROMA_SAMPLING, IN_BITDEPTH_FACTOR, OUT_BITDEPTH_FACTOR],
    helpers: &[H::Swizzle, H::ColorMatrix, H::ReadRgba, H::ChromaSample, H::WritePlanarYuva],
    addressing: Addressing::Sampled,
    body: r#"    let rgba = read_rgba(texcoord);
    let uv_texel = chroma_sample(texcoord);
    let yuva = vec4<f32>(
        color_matrix_apply(rgba, params.to_yuv_matrix).x,
        color_matrix_apply(uv_texel, params.to_yuv_matrix).yz,
        rgba.a);
    write_planar_yuva(swizzle(yuva, params.output_swizzle) * params.out_bitdepth_factor);
"#,
};

const PLANAR_YUV_TO_PLANAR_YUV: ShaderTemplate = ShaderTemplate {
    kind: TemplateKind::PlanarYuvToPlanarYuv,
    name: "planar_yuv_to_planar_yuv",
    uniforms: &[CHROMA_SAMPLING, IN_BITDEPTH_FACTOR, OUT_BITDEPTH_FACTOR],
    helpers: &[H::Swizzle, H::WritePlanarYuva],
    addressing: Addressing::Sampled,
    body: r#"    let f = params.in_bitdepth_factor;
    let chroma_coord = texcoord * params.chroma_sampling;
    var yuva = vec4<f32>(
        texture2D(Ytex, texcoord * params.tex_scale0).r * f,
        texture2D(Utex, chroma_coord * params.tex_scale1).r * f,
        texture2D(Vtex, chroma_coord * params.tex_scale2).r * f,
        %PLANAR_ALPHA_READ%);
    yuva = swizzle(yuva, params.input_swizzle);
    write_planar_yuva(swizzle(yuva, params.output_swizzle) * params.out_bitdepth_factor);
"#,
};

const SEMI_PLANAR_TO_RGB: ShaderTemplate = ShaderTemplate {
    kind: TemplateKind::SemiPlanarToRgb,
    name: "semi_planar_to_rgb",
    uniforms: &[TO_RGB_MATRIX, OUT_BITDEPTH_FACTOR],
    helpers: &[H::Swizzle, H::ColorMatrix, H::WriteRgba],
    addressing: Addressing::Sampled,
    body: r#"    var yuva = vec4<f32>(
        texture2D(Ytex, texcoord * params.tex_scale0).r,
        texture2D(UVtex, texcoord * params.tex_scale1).%UV_CHANNELS%,
        %SEMI_ALPHA_READ%);
    yuva = swizzle(yuva, params.input_swizzle);
    write_rgba(color_matrix_apply(yuva, params.to_rgb_matrix));
"#,
};

const RGB_TO_SEMI_PLANAR: ShaderTemplate = ShaderTemplate {
    kind: TemplateKind::RgbToSemiPlanar,
    name: "rgb_to_semi_planar",
    uniforms: &[TO_YUV_MATRIX, CHROMA_SAMPLING, IN_BITDEPTH_FACTOR],
    helpers: &[H::Swizzle, H::ColorMatrix, H::ReadRgba, H::ChromaSample],
    addressing: Addressing::Sampled,
    body: r#"    let rgba = read_rgba(texcoord);
    let uv_texel = chroma_sample(texcoord);
    var yuva = vec4<f32>(
        color_matrix_apply(rgba, params.to_yuv_matrix).x,
        color_matrix_apply(uv_texel, params.to_yuv_matrix).yz,
        rgba.a);
    yuva = swizzle(yuva, params.output_swizzle);
    frag_data[0] = vec4<f32>(yuva.x, 0.0, 0.0, 1.0);
    frag_data[1] = vec4<f32>(yuva.y, yuva.z, 0.0, 1.0);
    %SEMI_ALPHA_WRITE%
"#,
};

const TILED_TO_RGB: ShaderTemplate = ShaderTemplate {
    kind: TemplateKind::TiledToRgb,
    name: "tiled_to_rgb",
    uniforms: &[TO_RGB_MATRIX, OUT_BITDEPTH_FACTOR],
    helpers: &[H::Swizzle, H::ColorMatrix, H::FragToTile, H::WriteRgba],
    addressing: Addressing::TexelFetch,
    body: r#"    let luma_dim = %TILE_LUMA_DIM%;
    let chroma_dim = %TILE_CHROMA_DIM%;
    let fy = chroma_dim.y * 2 / luma_dim.y;
    let iwidth = i32(params.width);
    let tiles_per_row = iwidth / luma_dim.x;
    let coord = vec2<i32>(frag_coord);
    let tile_coord = coord / luma_dim;
    let delta_coord = coord % luma_dim;
    let luma_texel = frag_to_tile(tile_coord, delta_coord, luma_dim, iwidth, tiles_per_row, 0);
    let chroma_tile = vec2<i32>(tile_coord.x, tile_coord.y / fy);
    let chroma_texel = frag_to_tile(chroma_tile, delta_coord / 2, chroma_dim, iwidth / 2, tiles_per_row, tile_coord.y % fy);
    var yuva = vec4<f32>(
        texelFetch(Ytex, luma_texel, 0).r,
        texelFetch(UVtex, chroma_texel, 0).%UV_CHANNELS%,
        1.0);
    yuva = swizzle(yuva, params.input_swizzle);
    write_rgba(color_matrix_apply(yuva, params.to_rgb_matrix));
"#,
};

const YUY2_UYVY_TO_RGB: ShaderTemplate = ShaderTemplate {
    kind: TemplateKind::Yuy2UyvyToRgb,
    name: "yuy2_uyvy_to_rgb",
    uniforms: &[TO_RGB_MATRIX, OUT_BITDEPTH_FACTOR],
    helpers: &[H::Swizzle, H::ColorMatrix, H::Yuy2UyvyUnpack, H::WriteRgba],
    addressing: Addressing::Sampled,
    body: r#"    let yuva = yuy2_uyvy_unpack(v_texcoord, vec2<f32>(1.0));
    write_rgba(color_matrix_apply(yuva, params.to_rgb_matrix));
"#,
};

const RGB_TO_YUY2_UYVY: ShaderTemplate = ShaderTemplate {
    kind: TemplateKind::RgbToYuy2Uyvy,
    name: "rgb_to_yuy2_uyvy",
    uniforms: &[TO_YUV_MATRIX, IN_BITDEPTH_FACTOR, OUT_WIDTH, OUT_HEIGHT],
    helpers: &[H::Swizzle, H::ColorMatrix, H::ReadRgba, H::Yuy2UyvyPack],
    addressing: Addressing::Sampled,
    body: r#"    let pair = yuy2_uyvy_pack(texcoord, v_texcoord);
    let yuva0 = color_matrix_apply(read_rgba(pair.texcoord0), params.to_yuv_matrix);
    let yuva1 = color_matrix_apply(read_rgba(pair.texcoord1), params.to_yuv_matrix);
    let yuva = vec4<f32>(yuva0.x, (yuva0.yz + yuva1.yz) * 0.5, 1.0);
    frag_data[0] = vec4<f32>(yuva[pair.idx.x], yuva[pair.idx.y], 0.0, 1.0);
"#,
};

const PLANAR_YUV_TO_YUY2_UYVY: ShaderTemplate = ShaderTemplate {
    kind: TemplateKind::PlanarYuvToYuy2Uyvy,
    name: "planar_yuv_to_yuy2_uyvy",
    uniforms: &[IN_BITDEPTH_FACTOR, OUT_WIDTH, OUT_HEIGHT],
    helpers: &[H::Swizzle, H::FetchPlanarYuva, H::Yuy2UyvyPack],
    addressing: Addressing::Sampled,
    body: r#"    let pair = yuy2_uyvy_pack(texcoord, v_texcoord);
    let yuva0 = swizzle(fetch_planar_yuva(pair.texcoord0), params.input_swizzle);
    let yuva1 = swizzle(fetch_planar_yuva(pair.texcoord1), params.input_swizzle);
    let yuva = vec4<f32>(yuva0.x, (yuva0.yz + yuva1.yz) * 0.5, 1.0);
    frag_data[0] = vec4<f32>(yuva[pair.idx.x], yuva[pair.idx.y], 0.0, 1.0);
"#,
};

const YUY2_UYVY_TO_PLANAR_YUV: ShaderTemplate = ShaderTemplate {
    kind: TemplateKind::Yuy2UyvyToPlanarYuv,
    name: "yuy2_uyvy_to_planar_yuv",
    uniforms: &[CHROMA_SAMPLING, OUT_BITDEPTH_FACTOR],
    helpers: &[H::Swizzle, H::Yuy2UyvyUnpack, H::WritePlanarYuva],
    addressing: Addressing::Sampled,
    body: r#"    let yuva = yuy2_uyvy_unpack(v_texcoord, params.chroma_sampling);
    write_planar_yuva(swizzle(yuva, params.output_swizzle) * params.out_bitdepth_factor);
"#,
};

const YUY2_UYVY_TO_YUY2_UYVY: ShaderTemplate = ShaderTemplate {
    kind: TemplateKind::Yuy2UyvyToYuy2Uyvy,
    name: "yuy2_uyvy_to_yuy2_uyvy",
    uniforms: &[OUT_WIDTH, OUT_HEIGHT],
    helpers: &[H::Swizzle, H::Yuy2UyvyUnpack, H::Yuy2UyvyPack],
    addressing: Addressing::Sampled,
    body: r#"    let yuva = yuy2_uyvy_unpack(v_texcoord, vec2<f32>(1.0));
    let pair = yuy2_uyvy_pack(texcoord, v_texcoord);
    frag_data[0] = vec4<f32>(yuva[pair.idx.x], yuva[pair.idx.y], 0.0, 1.0);
"#,
};

const V210_TO_RGB: ShaderTemplate = ShaderTemplate {
    kind: TemplateKind::V210ToRgb,
    name: "v210_to_rgb",
    uniforms: &[TO_RGB_MATRIX, OUT_BITDEPTH_FACTOR, OUT_WIDTH],
    helpers: &[H::Swizzle, H::ColorMatrix, H::V210Unpack, H::WriteRgba],
    addressing: Addressing::Sampled,
    body: r#"    let yuva = v210_unpack(v_texcoord, vec2<f32>(1.0));
    write_rgba(color_matrix_apply(yuva, params.to_rgb_matrix));
"#,
};

const RGB_TO_V210: ShaderTemplate = ShaderTemplate {
    kind: TemplateKind::RgbToV210,
    name: "rgb_to_v210",
    uniforms: &[TO_YUV_MATRIX, IN_BITDEPTH_FACTOR, OUT_WIDTH],
    helpers: &[H::Swizzle, H::ColorMatrix, H::ReadRgba, H::V210Pack],
    addressing: Addressing::Sampled,
    body: r#"    let word = v210_pack(v_texcoord);
    let yuva0 = color_matrix_apply(read_rgba(word.texcoord0), params.to_yuv_matrix);
    let yuva1 = color_matrix_apply(read_rgba(word.texcoord1), params.to_yuv_matrix);
    let yuva2 = color_matrix_apply(read_rgba(word.texcoord2), params.to_yuv_matrix);
    frag_data[0] = vec4<f32>(yuva0[word.idx.x], yuva1[word.idx.y], yuva2[word.idx.z], 1.0);
"#,
};

const V210_TO_PLANAR_YUV: ShaderTemplate = ShaderTemplate {
    kind: TemplateKind::V210ToPlanarYuv,
    name: "v210_to_planar_yuv",
    uniforms: &[CHROMA_SAMPLING, OUT_BITDEPTH_FACTOR, OUT_WIDTH],
    helpers: &[H::Swizzle, H::V210Unpack, H::WritePlanarYuva],
    addressing: Addressing::Sampled,
    body: r#"    let yuva = v210_unpack(v_texcoord, params.chroma_sampling);
    write_planar_yuva(swizzle(yuva, params.output_swizzle) * params.out_bitdepth_factor);
"#,
};

const PLANAR_YUV_TO_V210: ShaderTemplate = ShaderTemplate {
    kind: TemplateKind::PlanarYuvToV210,
    name: "planar_yuv_to_v210",
    uniforms: &[IN_BITDEPTH_FACTOR, OUT_WIDTH],
    helpers: &[H::Swizzle, H::FetchPlanarYuva, H::V210Pack],
    addressing: Addressing::Sampled,
    body: r#"    let word = v210_pack(v_texcoord);
    let yuva0 = swizzle(fetch_planar_yuva(word.texcoord0), params.input_swizzle);
    let yuva1 = swizzle(fetch_planar_yuva(word.texcoord1), params.input_swizzle);
    let yuva2 = swizzle(fetch_planar_yuva(word.texcoord2), params.input_swizzle);
    frag_data[0] = vec4<f32>(yuva0[word.idx.x], yuva1[word.idx.y], yuva2[word.idx.z], 1.0);
"#,
};

const V210_TO_YUY2_UYVY: ShaderTemplate = ShaderTemplate {
    kind: TemplateKind::V210ToYuy2Uyvy,
    name: "v210_to_yuy2_uyvy",
    uniforms: &[OUT_WIDTH, OUT_HEIGHT],
    helpers: &[H::Swizzle, H::V210Unpack, H::Yuy2UyvyPack],
    addressing: Addressing::Sampled,
    body: r#"    let yuva = v210_unpack(v_texcoord, vec2<f32>(1.0));
    let pair = yuy2_uyvy_pack(texcoord, v_texcoord);
    frag_data[0] = vec4<f32>(yuva[pair.idx.x], yuva[pair.idx.y], 0.0, 1.0);
"#,
};

const YUY2_UYVY_TO_V210: ShaderTemplate = ShaderTemplate {
    kind: TemplateKind::Yuy2UyvyToV210,
    name: "yuy2_uyvy_to_v210",
    uniforms: &[OUT_WIDTH],
    helpers: &[H::Swizzle, H::Yuy2UyvyUnpack, H::V210Pack],
    addressing: Addressing::Sampled,
    body: r#"    let word = v210_pack(v_texcoord);
    let yuva0 = yuy2_uyvy_unpack(word.texcoord0 / params.vert_to_tex, vec2<f32>(1.0));
    let yuva1 = yuy2_uyvy_unpack(word.texcoord1 / params.vert_to_tex, vec2<f32>(1.0));
    let yuva2 = yuy2_uyvy_unpack(word.texcoord2 / params.vert_to_tex, vec2<f32>(1.0));
    frag_data[0] = vec4<f32>(yuva0[word.idx.x], yuva1[word.idx.y], yuva2[word.idx.z], 1.0);
"#,
};

/// Every template, one per [`TemplateKind`].
pub static TEMPLATES: [ShaderTemplate; 23] = [
    REORDER,
    PLANAR_RGB,
    GRAY_TO_RGB,
    RGB_TO_GRAY,
    PACKED_YUV_TO_RGB,
    RGB_TO_PACKED_YUV,
    PLANAR_YUV_TO_RGB,
    RGB_TO_PLANAR_YUV,
    PLANAR_YUV_TO_PLANAR_YUV,
    SEMI_PLANAR_TO_RGB,
    RGB_TO_SEMI_PLANAR,
    TILED_TO_RGB,
    YUY2_UYVY_TO_RGB,
    RGB_TO_YUY2_UYVY,
    PLANAR_YUV_TO_YUY2_UYVY,
    YUY2_UYVY_TO_PLANAR_YUV,
    YUY2_UYVY_TO_YUY2_UYVY,
    V210_TO_RGB,
    RGB_TO_V210,
    V210_TO_PLANAR_YUV,
    PLANAR_YUV_TO_V210,
    V210_TO_YUY2_UYVY,
    YUY2_UYVY_TO_V210,
];

use LayoutClass as L;
use TemplateKind as K;

/// `(input class, output class) -> template` for every supported pair.
pub static DISPATCH: &[(LayoutClass, LayoutClass, TemplateKind)] = &[
    (L::PackedRgb, L::PackedRgb, K::Reorder),
    (L::PackedRgb, L::PlanarRgb, K::PlanarRgb),
    (L::PlanarRgb, L::PackedRgb, K::PlanarRgb),
    (L::PlanarRgb, L::PlanarRgb, K::PlanarRgb),
    (L::Gray, L::PackedRgb, K::GrayToRgb),
    (L::Gray, L::PlanarRgb, K::GrayToRgb),
    (L::PackedRgb, L::Gray, K::RgbToGray),
    (L::PlanarRgb, L::Gray, K::RgbToGray),
    (L::PackedYuv, L::PackedRgb, K::PackedYuvToRgb),
    (L::PackedYuv, L::PlanarRgb, K::PackedYuvToRgb),
    (L::PackedRgb, L::PackedYuv, K::RgbToPackedYuv),
    (L::PlanarRgb, L::PackedYuv, K::RgbToPackedYuv),
    (L::PlanarYuv, L::PackedRgb, K::PlanarYuvToRgb),
    (L::PlanarYuv, L::PlanarRgb, K::PlanarYuvToRgb),
    (L::PackedRgb, L::PlanarYuv, K::RgbToPlanarYuv),
    (L::PlanarRgb, L::PlanarYuv, K::RgbToPlanarYuv),
    (L::SemiPlanarYuv, L::PackedRgb, K::SemiPlanarToRgb),
    (L::SemiPlanarYuv, L::PlanarRgb, K::SemiPlanarToRgb),
    (L::PackedRgb, L::SemiPlanarYuv, K::RgbToSemiPlanar),
    (L::PlanarRgb, L::SemiPlanarYuv, K::RgbToSemiPlanar),
    (L::TiledYuv, L::PackedRgb, K::TiledToRgb),
    (L::TiledYuv, L::PlanarRgb, K::TiledToRgb),
    (L::Yuy2Uyvy, L::PackedRgb, K::Yuy2UyvyToRgb),
    (L::Yuy2Uyvy, L::PlanarRgb, K::Yuy2UyvyToRgb),
    (L::PackedRgb, L::Yuy2Uyvy, K::RgbToYuy2Uyvy),
    (L::PlanarRgb, L::Yuy2Uyvy, K::RgbToYuy2Uyvy),
    (L::PlanarYuv, L::PlanarYuv, K::PlanarYuvToPlanarYuv),
    (L::PlanarYuv, L::Yuy2Uyvy, K::PlanarYuvToYuy2Uyvy),
    (L::Yuy2Uyvy, L::PlanarYuv, K::Yuy2UyvyToPlanarYuv),
    (L::Yuy2Uyvy, L::Yuy2Uyvy, K::Yuy2UyvyToYuy2Uyvy),
    (L::V210, L::PackedRgb, K::V210ToRgb),
    (L::V210, L::PlanarRgb, K::V210ToRgb),
    (L::PackedRgb, L::V210, K::RgbToV210),
    (L::PlanarRgb, L::V210, K::RgbToV210),
    (L::V210, L::PlanarYuv, K::V210ToPlanarYuv),
    (L::PlanarYuv, L::V210, K::PlanarYuvToV210),
    (L::V210, L::Yuy2Uyvy, K::V210ToYuy2Uyvy),
    (L::Yuy2Uyvy, L::V210, K::Yuy2UyvyToV210),
];

/// Template registered for `kind`.
pub fn template(kind: TemplateKind) -> &'static ShaderTemplate {
    // TEMPLATES is ordered like TemplateKind
    &TEMPLATES[kind as usize]
}

/// Template converting `input` to `output`, if the pair has one.
pub fn select_template(
    input: &FormatDescriptor,
    output: &FormatDescriptor,
) -> Option<&'static ShaderTemplate> {
    let from = LayoutClass::of(input)?;
    let to = LayoutClass::of(output)?;
    DISPATCH
        .iter()
        .find(|(i, o, _)| *i == from && *o == to)
        .map(|(_, _, kind)| template(*kind))
}
