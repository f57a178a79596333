//! Uniform declarations, block layout and values.
//!
//! The layout follows WGSL uniform address space rules: `f32` aligns to 4
//! bytes, `vec2<f32>` to 8, `vec4<i32>` and `mat4x4<f32>` to 16, and the
//! block size rounds up to 16.

use std::fmt::Write as _;
use std::sync::Arc;

use tracing::trace;

/// Type of a declared uniform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UniformType {
    /// `f32`
    Float,
    /// `vec2<f32>`
    Vec2,
    /// `vec4<i32>`
    IVec4,
    /// `mat4x4<f32>`, column-major
    Mat4,
}

impl UniformType {
    /// Required alignment in bytes.
    pub const fn align(self) -> usize {
        match self {
            Self::Float => 4,
            Self::Vec2 => 8,
            Self::IVec4 | Self::Mat4 => 16,
        }
    }

    /// Size in bytes.
    pub const fn size(self) -> usize {
        match self {
            Self::Float => 4,
            Self::Vec2 => 8,
            Self::IVec4 => 16,
            Self::Mat4 => 64,
        }
    }

    /// WGSL type name.
    pub const fn wgsl(self) -> &'static str {
        match self {
            Self::Float => "f32",
            Self::Vec2 => "vec2<f32>",
            Self::IVec4 => "vec4<i32>",
            Self::Mat4 => "mat4x4<f32>",
        }
    }
}

/// A uniform a shader declares.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UniformDecl {
    /// Name in the `params` block.
    pub name: &'static str,
    /// Type.
    pub ty: UniformType,
}

const fn decl(name: &'static str, ty: UniformType) -> UniformDecl {
    UniformDecl { name, ty }
}

/// Uniforms every conversion program declares.
pub const DEFAULT_UNIFORMS: &[UniformDecl] = &[
    decl("tex_scale0", UniformType::Vec2),
    decl("tex_scale1", UniformType::Vec2),
    decl("tex_scale2", UniformType::Vec2),
    decl("tex_scale3", UniformType::Vec2),
    decl("vert_to_tex", UniformType::Vec2),
    decl("width", UniformType::Float),
    decl("height", UniformType::Float),
    decl("poffset_x", UniformType::Float),
    decl("poffset_y", UniformType::Float),
    decl("input_swizzle", UniformType::IVec4),
    decl("output_swizzle", UniformType::IVec4),
];

/// Color matrix into R'G'B'.
pub const TO_RGB_MATRIX: UniformDecl = decl("to_rgb_matrix", UniformType::Mat4);
/// Color matrix out of R'G'B'.
pub const TO_YUV_MATRIX: UniformDecl = decl("to_yuv_matrix", UniformType::Mat4);
/// Chroma decimation factors.
pub const CHROMA_SAMPLING: UniformDecl = decl("chroma_sampling", UniformType::Vec2);
/// Rescale of LSB-aligned input samples.
pub const IN_BITDEPTH_FACTOR: UniformDecl = decl("in_bitdepth_factor", UniformType::Float);
/// Rescale of LSB-aligned output samples.
pub const OUT_BITDEPTH_FACTOR: UniformDecl = decl("out_bitdepth_factor", UniformType::Float);
/// Output width in pixels.
pub const OUT_WIDTH: UniformDecl = decl("out_width", UniformType::Float);
/// Output height in pixels.
pub const OUT_HEIGHT: UniformDecl = decl("out_height", UniformType::Float);
/// Weights combining the two bytes of a 16-bit gray sample.
pub const GRAY_WEIGHTS: UniformDecl = decl("gray_weights", UniformType::Vec2);

/// A uniform value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UniformValue {
    /// `f32`
    Float(f32),
    /// `vec2<f32>`
    Vec2([f32; 2]),
    /// `vec4<i32>`
    IVec4([i32; 4]),
    /// `mat4x4<f32>`, column-major
    Mat4([f32; 16]),
}

impl UniformValue {
    /// Type of the value.
    pub fn ty(&self) -> UniformType {
        match self {
            Self::Float(_) => UniformType::Float,
            Self::Vec2(_) => UniformType::Vec2,
            Self::IVec4(_) => UniformType::IVec4,
            Self::Mat4(_) => UniformType::Mat4,
        }
    }

    fn zero(ty: UniformType) -> Self {
        match ty {
            UniformType::Float => Self::Float(0.0),
            UniformType::Vec2 => Self::Vec2([0.0; 2]),
            UniformType::IVec4 => Self::IVec4([0; 4]),
            UniformType::Mat4 => Self::Mat4([0.0; 16]),
        }
    }
}

/// Byte offsets of a list of uniform declarations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UniformLayout {
    entries: Vec<(UniformDecl, usize)>,
    size: usize,
}

impl UniformLayout {
    /// Lays out `decls` in order.
    pub fn new(decls: &[UniformDecl]) -> Self {
        let mut entries = Vec::with_capacity(decls.len());
        let mut offset = 0usize;
        for d in decls {
            if entries.iter().any(|(e, _): &(UniformDecl, usize)| e.name == d.name) {
                continue;
            }
            offset = offset.next_multiple_of(d.ty.align());
            entries.push((*d, offset));
            offset += d.ty.size();
        }
        Self { entries, size: offset.next_multiple_of(16).max(16) }
    }

    /// Block size in bytes.
    #[inline]
    pub fn size(&self) -> usize {
        self.size
    }

    /// Byte offset of `name`.
    pub fn offset(&self, name: &str) -> Option<usize> {
        self.entries.iter().find(|(d, _)| d.name == name).map(|(_, o)| *o)
    }

    /// Declarations in layout order.
    pub fn decls(&self) -> impl Iterator<Item = &UniformDecl> {
        self.entries.iter().map(|(d, _)| d)
    }

    /// WGSL struct declaration `Params` plus the `params` binding.
    pub fn wgsl_block(&self) -> String {
        let mut s = String::from("struct Params {\n");
        for (d, _) in &self.entries {
            let _ = writeln!(s, "    {}: {},", d.name, d.ty.wgsl());
        }
        s.push_str("}\n\n@group(0) @binding(0) var<uniform> params: Params;\n");
        s
    }
}

/// Uniform values of one program, addressed by name.
#[derive(Debug, Clone, PartialEq)]
pub struct UniformBlock {
    layout: Arc<UniformLayout>,
    values: Vec<UniformValue>,
}

impl UniformBlock {
    /// A zeroed block for `layout`.
    pub fn new(layout: Arc<UniformLayout>) -> Self {
        let values = layout.entries.iter().map(|(d, _)| UniformValue::zero(d.ty)).collect();
        Self { layout, values }
    }

    /// Layout of the block.
    pub fn layout(&self) -> &UniformLayout {
        &self.layout
    }

    /// Sets `name`. Names the program does not declare are ignored, as are
    /// values of the wrong type.
    pub fn set(&mut self, name: &str, value: UniformValue) -> bool {
        let Some(i) = self.layout.entries.iter().position(|(d, _)| d.name == name) else {
            trace!(name, "uniform not declared, ignored");
            return false;
        };
        if self.layout.entries[i].0.ty != value.ty() {
            trace!(name, "uniform type mismatch, ignored");
            return false;
        }
        self.values[i] = value;
        true
    }

    /// Value of `name`.
    pub fn get(&self, name: &str) -> Option<UniformValue> {
        let i = self.layout.entries.iter().position(|(d, _)| d.name == name)?;
        Some(self.values[i])
    }

    /// `f32` value of `name`, or `default`.
    pub fn float(&self, name: &str, default: f32) -> f32 {
        match self.get(name) {
            Some(UniformValue::Float(v)) => v,
            _ => default,
        }
    }

    /// `vec2<f32>` value of `name`, or `default`.
    pub fn vec2(&self, name: &str, default: [f32; 2]) -> [f32; 2] {
        match self.get(name) {
            Some(UniformValue::Vec2(v)) => v,
            _ => default,
        }
    }

    /// `vec4<i32>` value of `name`, or `default`.
    pub fn ivec4(&self, name: &str, default: [i32; 4]) -> [i32; 4] {
        match self.get(name) {
            Some(UniformValue::IVec4(v)) => v,
            _ => default,
        }
    }

    /// Column-major matrix value of `name`, or `default`.
    pub fn mat4(&self, name: &str, default: [f32; 16]) -> [f32; 16] {
        match self.get(name) {
            Some(UniformValue::Mat4(v)) => v,
            _ => default,
        }
    }

    /// Block contents as uploaded to a uniform buffer.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = vec![0u8; self.layout.size];
        for ((_, offset), value) in self.layout.entries.iter().zip(&self.values) {
            let src: &[u8] = match value {
                UniformValue::Float(v) => bytemuck::bytes_of(v),
                UniformValue::Vec2(v) => bytemuck::cast_slice(v),
                UniformValue::IVec4(v) => bytemuck::cast_slice(v),
                UniformValue::Mat4(v) => bytemuck::cast_slice(v),
            };
            bytes[*offset..*offset + src.len()].copy_from_slice(src);
        }
        bytes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_layout() {
        let layout = UniformLayout::new(DEFAULT_UNIFORMS);
        assert_eq!(layout.offset("tex_scale0"), Some(0));
        assert_eq!(layout.offset("vert_to_tex"), Some(32));
        assert_eq!(layout.offset("width"), Some(40));
        assert_eq!(layout.offset("poffset_y"), Some(52));
        assert_eq!(layout.offset("input_swizzle"), Some(64));
        assert_eq!(layout.offset("output_swizzle"), Some(80));
        assert_eq!(layout.size(), 96);
    }

    #[test]
    fn test_matrix_alignment() {
        let mut decls = DEFAULT_UNIFORMS.to_vec();
        decls.push(IN_BITDEPTH_FACTOR);
        decls.push(TO_RGB_MATRIX);
        decls.push(CHROMA_SAMPLING);
        let layout = UniformLayout::new(&decls);
        assert_eq!(layout.offset("in_bitdepth_factor"), Some(96));
        assert_eq!(layout.offset("to_rgb_matrix"), Some(112));
        assert_eq!(layout.offset("chroma_sampling"), Some(176));
        assert_eq!(layout.size(), 192);
    }

    #[test]
    fn test_set_by_name() {
        let layout = Arc::new(UniformLayout::new(DEFAULT_UNIFORMS));
        let mut block = UniformBlock::new(layout);
        assert!(block.set("width", UniformValue::Float(64.0)));
        assert!(!block.set("to_rgb_matrix", UniformValue::Mat4([1.0; 16])));
        assert!(!block.set("height", UniformValue::Vec2([1.0, 2.0])));
        assert!(block.set("input_swizzle", UniformValue::IVec4([2, 1, 0, 3])));

        let bytes = block.to_bytes();
        assert_eq!(bytes.len(), 96);
        assert_eq!(&bytes[40..44], &64.0f32.to_ne_bytes());
        assert_eq!(&bytes[64..68], &2i32.to_ne_bytes());
        assert_eq!(block.float("width", 0.0), 64.0);
        assert_eq!(block.float("missing", 7.0), 7.0);
    }

    #[test]
    fn test_wgsl_block() {
        let layout = UniformLayout::new(&[decl("width", UniformType::Float), TO_YUV_MATRIX]);
        let src = layout.wgsl_block();
        assert!(src.contains("    width: f32,\n"));
        assert!(src.contains("to_yuv_matrix: mat4x4<f32>"));
        assert!(src.contains("var<uniform> params: Params;"));
    }
}
