//! WGSL helper functions shared by the conversion templates.
//!
//! Sources use the pseudo built-ins `texture2D(name, coord)` and
//! `texelFetch(name, coord, 0)`, resolved by [`mangle_shader`](super::mangle_shader),
//! and `%NAME%` insertion points resolved by [`fill_placeholders`](super::fill_placeholders).

use super::{KernelSpec, RgbLayout};

/// A helper function a template can declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Helper {
    /// `swizzle(texel, components)`
    Swizzle,
    /// `color_matrix_apply(texel, matrix)`, alpha preserved.
    ColorMatrix,
    /// `read_rgba(texcoord)` from packed or planar RGB input.
    ReadRgba,
    /// `write_rgba(rgba)` to packed or planar RGB output.
    WriteRgba,
    /// `fetch_planar_yuva(texcoord)` from Y, U, V (and A) planes.
    FetchPlanarYuva,
    /// `write_planar_yuva(planes)` to one target per plane.
    WritePlanarYuva,
    /// `chroma_sample(texcoord)`, block average over the chroma decimation.
    ChromaSample,
    /// `yuy2_uyvy_unpack(v_texcoord, sampling)`.
    Yuy2UyvyUnpack,
    /// `yuy2_uyvy_pack(texcoord, v_texcoord)`.
    Yuy2UyvyPack,
    /// `v210_unpack(v_texcoord, sampling)`.
    V210Unpack,
    /// `v210_pack(v_texcoord)`, the three pixels feeding one output word.
    V210Pack,
    /// `frag_to_tile(...)`, linear position of a pixel in a tiled plane.
    FragToTile,
}

impl Helper {
    /// Source of the helper for the given kernel.
    pub fn source(self, spec: &KernelSpec) -> &'static str {
        match self {
            Self::Swizzle => SWIZZLE,
            Self::ColorMatrix => COLOR_MATRIX,
            Self::ReadRgba => match spec.rgb_in {
                RgbLayout::Packed => READ_RGBA_PACKED,
                RgbLayout::Planar => READ_RGBA_PLANAR,
            },
            Self::WriteRgba => match spec.rgb_out {
                RgbLayout::Packed => WRITE_RGBA_PACKED,
                RgbLayout::Planar => WRITE_RGBA_PLANAR,
            },
            Self::FetchPlanarYuva => FETCH_PLANAR_YUVA,
            Self::WritePlanarYuva => WRITE_PLANAR_YUVA,
            Self::ChromaSample => CHROMA_SAMPLE,
            Self::Yuy2UyvyUnpack => YUY2_UYVY_UNPACK,
            Self::Yuy2UyvyPack => YUY2_UYVY_PACK,
            Self::V210Unpack => V210_UNPACK,
            Self::V210Pack => V210_PACK,
            Self::FragToTile => FRAG_TO_TILE,
        }
    }
}

const SWIZZLE: &str = r#"
fn swizzle(texel: vec4<f32>, components: vec4<i32>) -> vec4<f32> {
    return vec4<f32>(texel[components.x], texel[components.y], texel[components.z], texel[components.w]);
}
"#;

const COLOR_MATRIX: &str = r#"
fn color_matrix_apply(texel: vec4<f32>, colormatrix: mat4x4<f32>) -> vec4<f32> {
    var ret = colormatrix * vec4<f32>(texel.rgb, 1.0);
    ret.a = texel.a;
    return ret;
}
"#;

const READ_RGBA_PACKED: &str = r#"
fn read_rgba(texcoord: vec2<f32>) -> vec4<f32> {
    var rgba = swizzle(texture2D(tex, texcoord * params.tex_scale0), params.input_swizzle);
    %ALPHA_OVERWRITE%
    return rgba;
}
"#;

const READ_RGBA_PLANAR: &str = r#"
fn read_rgba(texcoord: vec2<f32>) -> vec4<f32> {
    let f = params.in_bitdepth_factor;
    let planes = vec4<f32>(
        texture2D(Ptex0, texcoord * params.tex_scale0).r * f,
        texture2D(Ptex1, texcoord * params.tex_scale1).r * f,
        texture2D(Ptex2, texcoord * params.tex_scale2).r * f,
        %PLANAR_ALPHA_READ%);
    return swizzle(planes, params.input_swizzle);
}
"#;

const WRITE_RGBA_PACKED: &str = r#"
fn write_rgba(rgba: vec4<f32>) {
    frag_data[0] = swizzle(rgba, params.output_swizzle);
}
"#;

const WRITE_RGBA_PLANAR: &str = r#"
fn write_rgba(rgba: vec4<f32>) {
    let planes = swizzle(rgba, params.output_swizzle) * params.out_bitdepth_factor;
    frag_data[0] = vec4<f32>(planes.x, 0.0, 0.0, 1.0);
    frag_data[1] = vec4<f32>(planes.y, 0.0, 0.0, 1.0);
    frag_data[2] = vec4<f32>(planes.z, 0.0, 0.0, 1.0);
    %PLANAR_ALPHA_WRITE%
}
"#;

const FETCH_PLANAR_YUVA: &str = r#"
fn fetch_planar_yuva(texcoord: vec2<f32>) -> vec4<f32> {
    let f = params.in_bitdepth_factor;
    return vec4<f32>(
        texture2D(Ytex, texcoord * params.tex_scale0).r * f,
        texture2D(Utex, texcoord * params.tex_scale1).r * f,
        texture2D(Vtex, texcoord * params.tex_scale2).r * f,
        %PLANAR_ALPHA_READ%);
}
"#;

const WRITE_PLANAR_YUVA: &str = r#"
fn write_planar_yuva(planes: vec4<f32>) {
    frag_data[0] = vec4<f32>(planes.x, 0.0, 0.0, 1.0);
    frag_data[1] = vec4<f32>(planes.y, 0.0, 0.0, 1.0);
    frag_data[2] = vec4<f32>(planes.z, 0.0, 0.0, 1.0);
    %PLANAR_ALPHA_WRITE%
}
"#;

const CHROMA_SAMPLE: &str = r#"
fn chroma_sample(texcoord: vec2<f32>) -> vec4<f32> {
    let size = vec2<f32>(params.width, params.height);
    let unnormalization = size / params.vert_to_tex;
    var chroma_pos = texcoord * params.chroma_sampling * unnormalization;
    chroma_pos -= clamp(params.chroma_sampling * 0.5 - 0.5, vec2<f32>(0.0), params.chroma_sampling);
    var uv_texel = vec4<f32>(0.0);
    if (chroma_pos.x < size.x && chroma_pos.y < size.y) {
        let nx = i32(params.chroma_sampling.x);
        let ny = i32(params.chroma_sampling.y);
        for (var i = 0; i < nx; i++) {
            for (var j = 0; j < ny; j++) {
                let n = f32(i * ny + j + 1);
                let offset = vec2<f32>(f32(i), f32(j));
                let s = read_rgba((chroma_pos + offset) / unnormalization);
                uv_texel = ((n - 1.0) * uv_texel + s) / n;
            }
        }
    }
    return uv_texel;
}
"#;

const YUY2_UYVY_UNPACK: &str = r#"
fn yuy2_uyvy_unpack(v_texcoord: vec2<f32>, sampling: vec2<f32>) -> vec4<f32> {
    let vert_to_tex = params.vert_to_tex;
    let half_poffset = vec2<f32>(params.poffset_x, params.poffset_y) * 0.5;
    let coord = v_texcoord * vert_to_tex * params.tex_scale0;
    let y = texture2D(Ytex, coord)[params.input_swizzle.x];
    let pos = ((v_texcoord.x * vert_to_tex.x - half_poffset.x) * sampling.x + half_poffset.x)
        * params.width / vert_to_tex.x;
    var dx1 = -params.poffset_x;
    var dx2 = 0.0;
    if (i32(pos) % 2 == 0) {
        dx2 = -dx1;
        dx1 = 0.0;
    }
    let non_offset = (coord - half_poffset) * sampling + half_poffset;
    let u_texel = texture2D(Ytex, non_offset + vec2<f32>(dx1, 0.0));
    let v_texel = texture2D(Ytex, non_offset + vec2<f32>(dx2, 0.0));
    return vec4<f32>(y, u_texel[params.input_swizzle.y], v_texel[params.input_swizzle.z], 1.0);
}
"#;

const YUY2_UYVY_PACK: &str = r#"
struct PackedPair {
    texcoord0: vec2<f32>,
    texcoord1: vec2<f32>,
    idx: vec2<i32>,
}

fn yuy2_uyvy_pack(texcoord: vec2<f32>, v_texcoord: vec2<f32>) -> PackedPair {
    let inorder = (v_texcoord.x * params.out_width) % 2.0;
    var dx = params.poffset_x;
    if (inorder > 1.0) {
        dx = -dx;
    }
    var pair: PackedPair;
    pair.texcoord0 = texcoord;
    pair.texcoord1 = vec2<f32>(texcoord.x + dx, texcoord.y);
    if (inorder < 1.0) {
        pair.idx = params.output_swizzle.xy;
    } else {
        pair.idx = params.output_swizzle.zw;
    }
    return pair;
}
"#;

// Component c of a six pixel block lives in word c / 3, channel c % 3.
const V210_UNPACK: &str = r#"
fn v210_component_texel(comp: i32) -> vec2<i32> {
    return vec2<i32>(comp / 3, comp % 3);
}

fn v210_unpack(v_texcoord: vec2<f32>, sampling: vec2<f32>) -> vec4<f32> {
    let xpos = i32(v_texcoord.x * params.out_width);
    let chroma_xpos = xpos * i32(sampling.x);
    let y_off = v210_component_texel(xpos * 2 + 1);
    let u_off = v210_component_texel((chroma_xpos / 2) * 4);
    let v_off = v210_component_texel((chroma_xpos / 2) * 4 + 2);
    let row = v_texcoord.y * params.vert_to_tex.y;
    let y_texel = texture2D(Ytex, vec2<f32>(params.poffset_x * (f32(y_off.x) + 0.5), row) * params.tex_scale0);
    let u_texel = texture2D(Ytex, vec2<f32>(params.poffset_x * (f32(u_off.x) + 0.5), row * sampling.y) * params.tex_scale0);
    let v_texel = texture2D(Ytex, vec2<f32>(params.poffset_x * (f32(v_off.x) + 0.5), row * sampling.y) * params.tex_scale0);
    return vec4<f32>(y_texel[y_off.y], u_texel[u_off.y], v_texel[v_off.y], 1.0);
}
"#;

// Word w of a block holds components 3w..3w+2, each (pixel of the block, Y/U/V).
const V210_PACK: &str = r#"
struct V210Word {
    texcoord0: vec2<f32>,
    texcoord1: vec2<f32>,
    texcoord2: vec2<f32>,
    idx: vec3<i32>,
}

fn v210_block_component(i: i32) -> vec2<i32> {
    var block = array<vec2<i32>, 12>(
        vec2<i32>(0, 1), vec2<i32>(0, 0), vec2<i32>(0, 2), vec2<i32>(1, 0),
        vec2<i32>(2, 1), vec2<i32>(2, 0), vec2<i32>(2, 2), vec2<i32>(3, 0),
        vec2<i32>(4, 1), vec2<i32>(4, 0), vec2<i32>(4, 2), vec2<i32>(5, 0));
    return block[i];
}

fn v210_pack(v_texcoord: vec2<f32>) -> V210Word {
    let xpos = i32(v_texcoord.x * params.out_width);
    let first = (xpos % 4) * 3;
    let c0 = v210_block_component(first);
    let c1 = v210_block_component(first + 1);
    let c2 = v210_block_component(first + 2);
    let block_x = (f32((xpos / 4) * 6) + 0.5) * params.poffset_x;
    let row = v_texcoord.y * params.vert_to_tex.y;
    var word: V210Word;
    word.texcoord0 = vec2<f32>(block_x + f32(c0.x) * params.poffset_x, row);
    word.texcoord1 = vec2<f32>(block_x + f32(c1.x) * params.poffset_x, row);
    word.texcoord2 = vec2<f32>(block_x + f32(c2.x) * params.poffset_x, row);
    word.idx = vec3<i32>(c0.y, c1.y, c2.y);
    return word;
}
"#;

const FRAG_TO_TILE: &str = r#"
fn frag_to_tile(tile_coord: vec2<i32>, delta_coord: vec2<i32>, dim: vec2<i32>, width: i32, tiles_per_row: i32, need_offset: i32) -> vec2<i32> {
    let tile_size = dim.x * dim.y;
    let tile_index = tile_coord.y * tiles_per_row + tile_coord.x;
    var linear_index = tile_index * tile_size + delta_coord.y * dim.x + delta_coord.x;
    linear_index += need_offset * tile_size / 2;
    return vec2<i32>(linear_index % width, linear_index / width);
}
"#;
