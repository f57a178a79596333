//! Software evaluation of the conversion programs.
//!
//! Each function mirrors the WGSL helper of the same name, operation for
//! operation, so the reference device produces what a GPU running the
//! generated source would.

use glam::{IVec2, Mat4, Vec2, Vec4};
use rayon::prelude::*;
use texconv_core::TextureTarget;

use super::texture::SoftTexture;
use crate::shaders::{KernelSpec, RgbLayout, TemplateKind};
use crate::uniforms::UniformBlock;

/// Values of `frag_data` after one fragment.
pub(crate) type FragData = [Vec4; 4];

struct Params {
    tex_scale: [Vec2; 4],
    vert_to_tex: Vec2,
    width: f32,
    height: f32,
    poffset: Vec2,
    input_swizzle: [usize; 4],
    output_swizzle: [usize; 4],
    to_rgb: Mat4,
    to_yuv: Mat4,
    chroma_sampling: Vec2,
    in_bitdepth_factor: f32,
    out_bitdepth_factor: f32,
    out_width: f32,
    gray_weights: Vec2,
}

impl Params {
    fn from_block(u: &UniformBlock) -> Self {
        let v2 = |name: &str, d: [f32; 2]| Vec2::from(u.vec2(name, d));
        let sw = |name: &str| u.ivec4(name, [0, 1, 2, 3]).map(|i| i.clamp(0, 3) as usize);
        Self {
            tex_scale: [
                v2("tex_scale0", [1.0; 2]),
                v2("tex_scale1", [1.0; 2]),
                v2("tex_scale2", [1.0; 2]),
                v2("tex_scale3", [1.0; 2]),
            ],
            vert_to_tex: v2("vert_to_tex", [1.0; 2]),
            width: u.float("width", 1.0),
            height: u.float("height", 1.0),
            poffset: Vec2::new(u.float("poffset_x", 0.0), u.float("poffset_y", 0.0)),
            input_swizzle: sw("input_swizzle"),
            output_swizzle: sw("output_swizzle"),
            to_rgb: Mat4::from_cols_array(&u.mat4("to_rgb_matrix", Mat4::IDENTITY.to_cols_array())),
            to_yuv: Mat4::from_cols_array(&u.mat4("to_yuv_matrix", Mat4::IDENTITY.to_cols_array())),
            chroma_sampling: v2("chroma_sampling", [1.0; 2]),
            in_bitdepth_factor: u.float("in_bitdepth_factor", 1.0),
            out_bitdepth_factor: u.float("out_bitdepth_factor", 1.0),
            out_width: u.float("out_width", 1.0),
            gray_weights: v2("gray_weights", [1.0, 0.0]),
        }
    }
}

#[inline]
fn swizzle(t: Vec4, c: [usize; 4]) -> Vec4 {
    Vec4::new(t[c[0]], t[c[1]], t[c[2]], t[c[3]])
}

#[inline]
fn color_matrix_apply(t: Vec4, m: &Mat4) -> Vec4 {
    let mut ret = *m * t.truncate().extend(1.0);
    ret.w = t.w;
    ret
}

#[inline]
fn red(v: f32) -> Vec4 {
    Vec4::new(v, 0.0, 0.0, 1.0)
}

struct PackedPair {
    texcoord0: Vec2,
    texcoord1: Vec2,
    idx: [usize; 2],
}

struct V210Word {
    texcoords: [Vec2; 3],
    idx: [usize; 3],
}

/// `(pixel of the block, Y/U/V)` of the twelve components of a v210 block,
/// in storage order.
const V210_BLOCK: [(i32, usize); 12] = [
    (0, 1), (0, 0), (0, 2), (1, 0),
    (2, 1), (2, 0), (2, 2), (3, 0),
    (4, 1), (4, 0), (4, 2), (5, 0),
];

/// Word and channel holding component `comp` of a v210 block.
#[inline]
fn v210_component_texel(comp: i32) -> (i32, usize) {
    (comp / 3, (comp % 3) as usize)
}

/// A conversion program bound to its inputs and uniforms.
pub(crate) struct Kernel<'a> {
    spec: &'a KernelSpec,
    target: TextureTarget,
    inputs: &'a [&'a SoftTexture],
    p: Params,
}

impl<'a> Kernel<'a> {
    pub(crate) fn new(
        spec: &'a KernelSpec,
        target: TextureTarget,
        inputs: &'a [&'a SoftTexture],
        uniforms: &UniformBlock,
    ) -> Self {
        Self { spec, target, inputs, p: Params::from_block(uniforms) }
    }

    /// Runs the program over a `width` x `height` target, row-major.
    pub(crate) fn run(&self, width: u32, height: u32) -> Vec<FragData> {
        let rows: Vec<Vec<FragData>> = (0..height)
            .into_par_iter()
            .map(|y| (0..width).map(|x| self.fragment(x, y, width, height)).collect())
            .collect();
        rows.into_iter().flatten().collect()
    }

    fn texture2d(&self, plane: usize, coord: Vec2) -> Vec4 {
        let Some(tex) = self.inputs.get(plane) else {
            return Vec4::ZERO;
        };
        let coord = match self.target {
            TextureTarget::Rectangle => coord / Vec2::new(tex.width as f32, tex.height as f32),
            _ => coord,
        };
        tex.sample(coord)
    }

    fn texel_fetch(&self, plane: usize, coord: IVec2) -> Vec4 {
        self.inputs.get(plane).map_or(Vec4::ZERO, |t| t.fetch(coord))
    }

    fn fragment(&self, x: u32, y: u32, width: u32, height: u32) -> FragData {
        let p = &self.p;
        let v_texcoord = Vec2::new((x as f32 + 0.5) / width as f32, (y as f32 + 0.5) / height as f32);
        let texcoord = v_texcoord * p.vert_to_tex;
        let frag_coord = Vec2::new(x as f32 + 0.5, y as f32 + 0.5);
        let mut frag = [Vec4::ZERO; 4];

        match self.spec.kind {
            TemplateKind::Reorder | TemplateKind::PlanarRgb => {
                self.write_rgba(self.read_rgba(texcoord), &mut frag);
            }
            TemplateKind::GrayToRgb => {
                let t = self.texture2d(0, texcoord * p.tex_scale[0]);
                let g = Vec2::new(t[p.input_swizzle[0]], t[p.input_swizzle[1]]).dot(p.gray_weights);
                self.write_rgba(Vec4::new(g, g, g, 1.0), &mut frag);
            }
            TemplateKind::RgbToGray => {
                let luma = color_matrix_apply(self.read_rgba(texcoord), &p.to_yuv).x;
                frag[0] = if self.spec.gray16_out {
                    let level = (luma.clamp(0.0, 1.0) * 65535.0).round();
                    let hi = (level / 256.0).floor();
                    swizzle(Vec4::new(hi / 255.0, (level - hi * 256.0) / 255.0, 0.0, 1.0), p.output_swizzle)
                } else {
                    swizzle(red(luma), p.output_swizzle)
                };
            }
            TemplateKind::PackedYuvToRgb => {
                let yuva = swizzle(self.texture2d(0, texcoord * p.tex_scale[0]), p.input_swizzle);
                self.write_rgba(color_matrix_apply(yuva, &p.to_rgb), &mut frag);
            }
            TemplateKind::RgbToPackedYuv => {
                let yuva = color_matrix_apply(self.read_rgba(texcoord), &p.to_yuv);
                frag[0] = swizzle(yuva, p.output_swizzle);
            }
            TemplateKind::PlanarYuvToRgb => {
                let yuva = swizzle(self.fetch_planar_yuva(texcoord), p.input_swizzle);
                self.write_rgba(color_matrix_apply(yuva, &p.to_rgb), &mut frag);
            }
            TemplateKind::RgbToPlanarYuv => {
                let rgba = self.read_rgba(texcoord);
                let uv_texel = self.chroma_sample(texcoord);
                let uv = color_matrix_apply(uv_texel, &p.to_yuv);
                let yuva = Vec4::new(color_matrix_apply(rgba, &p.to_yuv).x, uv.y, uv.z, rgba.w);
                self.write_planar_yuva(swizzle(yuva, p.output_swizzle) * p.out_bitdepth_factor, &mut frag);
            }
            TemplateKind::PlanarYuvToPlanarYuv => {
                let f = p.in_bitdepth_factor;
                let chroma_coord = texcoord * p.chroma_sampling;
                let mut yuva = Vec4::new(
                    self.texture2d(0, texcoord * p.tex_scale[0]).x * f,
                    self.texture2d(1, chroma_coord * p.tex_scale[1]).x * f,
                    self.texture2d(2, chroma_coord * p.tex_scale[2]).x * f,
                    self.planar_alpha_read(texcoord),
                );
                yuva = swizzle(yuva, p.input_swizzle);
                self.write_planar_yuva(swizzle(yuva, p.output_swizzle) * p.out_bitdepth_factor, &mut frag);
            }
            TemplateKind::SemiPlanarToRgb => {
                let uv = self.texture2d(1, texcoord * p.tex_scale[1]);
                let a = if self.spec.in_alpha {
                    self.texture2d(2, texcoord * p.tex_scale[2]).x
                } else {
                    1.0
                };
                let mut yuva = Vec4::new(
                    self.texture2d(0, texcoord * p.tex_scale[0]).x,
                    uv.x,
                    uv[self.spec.uv_second],
                    a,
                );
                yuva = swizzle(yuva, p.input_swizzle);
                self.write_rgba(color_matrix_apply(yuva, &p.to_rgb), &mut frag);
            }
            TemplateKind::RgbToSemiPlanar => {
                let rgba = self.read_rgba(texcoord);
                let uv = color_matrix_apply(self.chroma_sample(texcoord), &p.to_yuv);
                let yuva = Vec4::new(color_matrix_apply(rgba, &p.to_yuv).x, uv.y, uv.z, rgba.w);
                let yuva = swizzle(yuva, p.output_swizzle);
                frag[0] = red(yuva.x);
                frag[1] = Vec4::new(yuva.y, yuva.z, 0.0, 1.0);
                if self.spec.out_alpha {
                    frag[2] = red(yuva.w);
                }
            }
            TemplateKind::TiledToRgb => {
                let yuva = swizzle(self.tiled_yuva(frag_coord), p.input_swizzle);
                self.write_rgba(color_matrix_apply(yuva, &p.to_rgb), &mut frag);
            }
            TemplateKind::Yuy2UyvyToRgb => {
                let yuva = self.yuy2_uyvy_unpack(v_texcoord, Vec2::ONE);
                self.write_rgba(color_matrix_apply(yuva, &p.to_rgb), &mut frag);
            }
            TemplateKind::RgbToYuy2Uyvy => {
                let pair = self.yuy2_uyvy_pack(texcoord, v_texcoord);
                let yuva0 = color_matrix_apply(self.read_rgba(pair.texcoord0), &p.to_yuv);
                let yuva1 = color_matrix_apply(self.read_rgba(pair.texcoord1), &p.to_yuv);
                frag[0] = pack_pair(yuva0, yuva1, pair.idx);
            }
            TemplateKind::PlanarYuvToYuy2Uyvy => {
                let pair = self.yuy2_uyvy_pack(texcoord, v_texcoord);
                let yuva0 = swizzle(self.fetch_planar_yuva(pair.texcoord0), p.input_swizzle);
                let yuva1 = swizzle(self.fetch_planar_yuva(pair.texcoord1), p.input_swizzle);
                frag[0] = pack_pair(yuva0, yuva1, pair.idx);
            }
            TemplateKind::Yuy2UyvyToPlanarYuv => {
                let yuva = self.yuy2_uyvy_unpack(v_texcoord, p.chroma_sampling);
                self.write_planar_yuva(swizzle(yuva, p.output_swizzle) * p.out_bitdepth_factor, &mut frag);
            }
            TemplateKind::Yuy2UyvyToYuy2Uyvy => {
                let yuva = self.yuy2_uyvy_unpack(v_texcoord, Vec2::ONE);
                let pair = self.yuy2_uyvy_pack(texcoord, v_texcoord);
                frag[0] = Vec4::new(yuva[pair.idx[0]], yuva[pair.idx[1]], 0.0, 1.0);
            }
            TemplateKind::V210ToRgb => {
                let yuva = self.v210_unpack(v_texcoord, Vec2::ONE);
                self.write_rgba(color_matrix_apply(yuva, &p.to_rgb), &mut frag);
            }
            TemplateKind::RgbToV210 => {
                let word = self.v210_pack(v_texcoord);
                frag[0] = pack_word(
                    word.texcoords.map(|t| color_matrix_apply(self.read_rgba(t), &p.to_yuv)),
                    word.idx,
                );
            }
            TemplateKind::V210ToPlanarYuv => {
                let yuva = self.v210_unpack(v_texcoord, p.chroma_sampling);
                self.write_planar_yuva(swizzle(yuva, p.output_swizzle) * p.out_bitdepth_factor, &mut frag);
            }
            TemplateKind::PlanarYuvToV210 => {
                let word = self.v210_pack(v_texcoord);
                frag[0] = pack_word(
                    word.texcoords.map(|t| swizzle(self.fetch_planar_yuva(t), p.input_swizzle)),
                    word.idx,
                );
            }
            TemplateKind::V210ToYuy2Uyvy => {
                let yuva = self.v210_unpack(v_texcoord, Vec2::ONE);
                let pair = self.yuy2_uyvy_pack(texcoord, v_texcoord);
                frag[0] = Vec4::new(yuva[pair.idx[0]], yuva[pair.idx[1]], 0.0, 1.0);
            }
            TemplateKind::Yuy2UyvyToV210 => {
                let word = self.v210_pack(v_texcoord);
                frag[0] = pack_word(
                    word.texcoords.map(|t| self.yuy2_uyvy_unpack(t / p.vert_to_tex, Vec2::ONE)),
                    word.idx,
                );
            }
        }
        frag
    }

    fn planar_alpha_read(&self, texcoord: Vec2) -> f32 {
        if self.spec.in_alpha {
            self.texture2d(3, texcoord * self.p.tex_scale[3]).x * self.p.in_bitdepth_factor
        } else {
            1.0
        }
    }

    fn read_rgba(&self, texcoord: Vec2) -> Vec4 {
        let p = &self.p;
        match self.spec.rgb_in {
            RgbLayout::Packed => {
                let mut rgba = swizzle(self.texture2d(0, texcoord * p.tex_scale[0]), p.input_swizzle);
                if self.spec.opaque_in {
                    rgba.w = 1.0;
                }
                rgba
            }
            RgbLayout::Planar => {
                let f = p.in_bitdepth_factor;
                let planes = Vec4::new(
                    self.texture2d(0, texcoord * p.tex_scale[0]).x * f,
                    self.texture2d(1, texcoord * p.tex_scale[1]).x * f,
                    self.texture2d(2, texcoord * p.tex_scale[2]).x * f,
                    self.planar_alpha_read(texcoord),
                );
                swizzle(planes, p.input_swizzle)
            }
        }
    }

    fn write_rgba(&self, rgba: Vec4, frag: &mut FragData) {
        match self.spec.rgb_out {
            RgbLayout::Packed => frag[0] = swizzle(rgba, self.p.output_swizzle),
            RgbLayout::Planar => {
                let planes = swizzle(rgba, self.p.output_swizzle) * self.p.out_bitdepth_factor;
                self.write_planar_yuva(planes, frag);
            }
        }
    }

    fn fetch_planar_yuva(&self, texcoord: Vec2) -> Vec4 {
        let p = &self.p;
        let f = p.in_bitdepth_factor;
        Vec4::new(
            self.texture2d(0, texcoord * p.tex_scale[0]).x * f,
            self.texture2d(1, texcoord * p.tex_scale[1]).x * f,
            self.texture2d(2, texcoord * p.tex_scale[2]).x * f,
            self.planar_alpha_read(texcoord),
        )
    }

    fn write_planar_yuva(&self, planes: Vec4, frag: &mut FragData) {
        frag[0] = red(planes.x);
        frag[1] = red(planes.y);
        frag[2] = red(planes.z);
        if self.spec.out_alpha {
            frag[3] = red(planes.w);
        }
    }

    fn chroma_sample(&self, texcoord: Vec2) -> Vec4 {
        let p = &self.p;
        let size = Vec2::new(p.width, p.height);
        let unnormalization = size / p.vert_to_tex;
        let mut chroma_pos = texcoord * p.chroma_sampling * unnormalization;
        chroma_pos -= (p.chroma_sampling * 0.5 - 0.5).clamp(Vec2::ZERO, p.chroma_sampling);
        let mut uv_texel = Vec4::ZERO;
        if chroma_pos.x < size.x && chroma_pos.y < size.y {
            let nx = p.chroma_sampling.x as i32;
            let ny = p.chroma_sampling.y as i32;
            for i in 0..nx {
                for j in 0..ny {
                    let n = (i * ny + j + 1) as f32;
                    let offset = Vec2::new(i as f32, j as f32);
                    let s = self.read_rgba((chroma_pos + offset) / unnormalization);
                    uv_texel = ((n - 1.0) * uv_texel + s) / n;
                }
            }
        }
        uv_texel
    }

    fn yuy2_uyvy_unpack(&self, v_texcoord: Vec2, sampling: Vec2) -> Vec4 {
        let p = &self.p;
        let vert_to_tex = p.vert_to_tex;
        let half_poffset = p.poffset * 0.5;
        let coord = v_texcoord * vert_to_tex * p.tex_scale[0];
        let y = self.texture2d(0, coord)[p.input_swizzle[0]];
        let pos = ((v_texcoord.x * vert_to_tex.x - half_poffset.x) * sampling.x + half_poffset.x) * p.width
            / vert_to_tex.x;
        let (mut dx1, mut dx2) = (-p.poffset.x, 0.0);
        if (pos as i32) % 2 == 0 {
            dx2 = -dx1;
            dx1 = 0.0;
        }
        let non_offset = (coord - half_poffset) * sampling + half_poffset;
        let u_texel = self.texture2d(0, non_offset + Vec2::new(dx1, 0.0));
        let v_texel = self.texture2d(0, non_offset + Vec2::new(dx2, 0.0));
        Vec4::new(y, u_texel[p.input_swizzle[1]], v_texel[p.input_swizzle[2]], 1.0)
    }

    fn yuy2_uyvy_pack(&self, texcoord: Vec2, v_texcoord: Vec2) -> PackedPair {
        let p = &self.p;
        let inorder = (v_texcoord.x * p.out_width) % 2.0;
        let dx = if inorder > 1.0 { -p.poffset.x } else { p.poffset.x };
        let sw = p.output_swizzle;
        PackedPair {
            texcoord0: texcoord,
            texcoord1: Vec2::new(texcoord.x + dx, texcoord.y),
            idx: if inorder < 1.0 { [sw[0], sw[1]] } else { [sw[2], sw[3]] },
        }
    }

    fn v210_unpack(&self, v_texcoord: Vec2, sampling: Vec2) -> Vec4 {
        let p = &self.p;
        let xpos = (v_texcoord.x * p.out_width) as i32;
        let chroma_xpos = xpos * sampling.x as i32;
        let y_off = v210_component_texel(xpos * 2 + 1);
        let u_off = v210_component_texel((chroma_xpos / 2) * 4);
        let v_off = v210_component_texel((chroma_xpos / 2) * 4 + 2);
        let row = v_texcoord.y * p.vert_to_tex.y;
        let component = |(word, channel): (i32, usize), y: f32| {
            let coord = Vec2::new(p.poffset.x * (word as f32 + 0.5), y) * p.tex_scale[0];
            self.texture2d(0, coord)[channel]
        };
        Vec4::new(
            component(y_off, row),
            component(u_off, row * sampling.y),
            component(v_off, row * sampling.y),
            1.0,
        )
    }

    fn v210_pack(&self, v_texcoord: Vec2) -> V210Word {
        let p = &self.p;
        let xpos = (v_texcoord.x * p.out_width) as i32;
        let first = ((xpos % 4) * 3) as usize;
        let block_x = (((xpos / 4) * 6) as f32 + 0.5) * p.poffset.x;
        let row = v_texcoord.y * p.vert_to_tex.y;
        let c = [V210_BLOCK[first], V210_BLOCK[first + 1], V210_BLOCK[first + 2]];
        V210Word {
            texcoords: c.map(|(pixel, _)| Vec2::new(block_x + pixel as f32 * p.poffset.x, row)),
            idx: c.map(|(_, comp)| comp),
        }
    }

    fn tiled_yuva(&self, frag_coord: Vec2) -> Vec4 {
        let (luma_dim, chroma_dim) = match self.spec.tile {
            Some(t) => (
                IVec2::new(t.luma_width as i32, t.luma_height as i32),
                IVec2::new(t.chroma_width as i32, t.chroma_height as i32),
            ),
            None => (IVec2::ONE, IVec2::ONE),
        };
        let fy = chroma_dim.y * 2 / luma_dim.y;
        let iwidth = self.p.width as i32;
        let tiles_per_row = iwidth / luma_dim.x;
        let coord = frag_coord.as_ivec2();
        let tile_coord = coord / luma_dim;
        let delta_coord = coord % luma_dim;
        let luma_texel = frag_to_tile(tile_coord, delta_coord, luma_dim, iwidth, tiles_per_row, 0);
        let chroma_tile = IVec2::new(tile_coord.x, tile_coord.y / fy);
        let chroma_texel = frag_to_tile(
            chroma_tile,
            delta_coord / 2,
            chroma_dim,
            iwidth / 2,
            tiles_per_row,
            tile_coord.y % fy,
        );
        let uv = self.texel_fetch(1, chroma_texel);
        Vec4::new(self.texel_fetch(0, luma_texel).x, uv.x, uv[self.spec.uv_second], 1.0)
    }
}

fn pack_pair(yuva0: Vec4, yuva1: Vec4, idx: [usize; 2]) -> Vec4 {
    let chroma = (Vec2::new(yuva0.y, yuva0.z) + Vec2::new(yuva1.y, yuva1.z)) * 0.5;
    let yuva = Vec4::new(yuva0.x, chroma.x, chroma.y, 1.0);
    Vec4::new(yuva[idx[0]], yuva[idx[1]], 0.0, 1.0)
}

fn pack_word(yuva: [Vec4; 3], idx: [usize; 3]) -> Vec4 {
    Vec4::new(yuva[0][idx[0]], yuva[1][idx[1]], yuva[2][idx[2]], 1.0)
}

/// Texel holding pixel `delta_coord` of tile `tile_coord` in a tiled plane
/// stored as rows of `width` texels.
pub(crate) fn frag_to_tile(
    tile_coord: IVec2,
    delta_coord: IVec2,
    dim: IVec2,
    width: i32,
    tiles_per_row: i32,
    need_offset: i32,
) -> IVec2 {
    let tile_size = dim.x * dim.y;
    let tile_index = tile_coord.y * tiles_per_row + tile_coord.x;
    let mut linear_index = tile_index * tile_size + delta_coord.y * dim.x + delta_coord.x;
    linear_index += need_offset * tile_size / 2;
    IVec2::new(linear_index % width, linear_index / width)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frag_to_tile_4l4() {
        let dim = IVec2::new(4, 4);
        // 8 wide plane: tiles 0 and 1 side by side occupy the first 4 rows linearly
        assert_eq!(frag_to_tile(IVec2::ZERO, IVec2::ZERO, dim, 8, 2, 0), IVec2::new(0, 0));
        assert_eq!(frag_to_tile(IVec2::ZERO, IVec2::new(1, 1), dim, 8, 2, 0), IVec2::new(5, 0));
        assert_eq!(frag_to_tile(IVec2::new(1, 0), IVec2::ZERO, dim, 8, 2, 0), IVec2::new(0, 2));
        assert_eq!(frag_to_tile(IVec2::ZERO, IVec2::ZERO, IVec2::new(2, 4), 4, 2, 1), IVec2::new(0, 1));
    }

    #[test]
    fn test_v210_block_covers_six_pixels() {
        let mut seen = [[false; 3]; 6];
        for (pixel, comp) in V210_BLOCK {
            seen[pixel as usize][comp] = true;
        }
        // every pixel has luma, even pixels carry the chroma pair
        for (pixel, comps) in seen.iter().enumerate() {
            assert!(comps[0]);
            assert_eq!(comps[1], pixel % 2 == 0);
            assert_eq!(comps[2], pixel % 2 == 0);
        }
        assert_eq!(v210_component_texel(3 * 2 + 1), (2, 1));
        assert_eq!(v210_component_texel(4 * 2 + 2), (3, 1));
    }

    #[test]
    fn test_color_matrix_keeps_alpha() {
        let m = Mat4::from_scale(glam::Vec3::splat(2.0));
        let out = color_matrix_apply(Vec4::new(0.1, 0.2, 0.3, 0.4), &m);
        assert!((out.x - 0.2).abs() < 1e-6);
        assert_eq!(out.w, 0.4);
    }
}
