//! Rewrites canonical program source for a texture target.

use std::fmt::Write as _;
use std::sync::LazyLock;

use regex::Regex;
use texconv_core::{ShaderStage, TextureTarget};
use tracing::trace;

static SAMPLE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"texture2D\(\s*(\w+)\s*,").expect("valid regex"));
static FETCH_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"texelFetch\(\s*(\w+)\s*,\s*(\w+)\s*,\s*0\s*\)").expect("valid regex")
});
static PLACEHOLDER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"%[A-Z_0-9]+%").expect("valid regex"));

/// Whether `source` still holds a `%NAME%` insertion point.
///
/// A lone `%` is the modulo operator and does not count.
pub fn has_placeholders(source: &str) -> bool {
    PLACEHOLDER_RE.is_match(source)
}

/// Rewrites `texture2D(name, coord)` and `texelFetch(name, coord, 0)` into
/// calls of generated per-texture functions that address a `target` texture.
///
/// Vertex sources are returned unchanged.
pub fn mangle_shader(source: &str, stage: ShaderStage, target: TextureTarget) -> String {
    if stage == ShaderStage::Vertex {
        return source.to_string();
    }

    let mut sampled: Vec<String> = Vec::new();
    for cap in SAMPLE_RE.captures_iter(source) {
        let name = cap[1].to_string();
        if !sampled.contains(&name) {
            sampled.push(name);
        }
    }
    let mut fetched: Vec<String> = Vec::new();
    for cap in FETCH_RE.captures_iter(source) {
        let name = cap[1].to_string();
        if !fetched.contains(&name) {
            fetched.push(name);
        }
    }

    let mut out = SAMPLE_RE.replace_all(source, "sample_$1(").into_owned();
    out = FETCH_RE.replace_all(&out, "fetch_$1($2)").into_owned();
    if target == TextureTarget::ExternalOes {
        out = out.replace("texture_2d<f32>", "texture_external");
    }

    for name in &sampled {
        let body = match target {
            TextureTarget::TwoD => format!("textureSampleLevel({name}, tex_sampler, coord, 0.0)"),
            TextureTarget::Rectangle => format!(
                "textureSampleLevel({name}, tex_sampler, coord / vec2<f32>(textureDimensions({name})), 0.0)"
            ),
            TextureTarget::ExternalOes => format!("textureSampleBaseClampToEdge({name}, tex_sampler, coord)"),
        };
        let _ = write!(out, "\nfn sample_{name}(coord: vec2<f32>) -> vec4<f32> {{\n    return {body};\n}}\n");
    }
    for name in &fetched {
        let body = match target {
            TextureTarget::ExternalOes => format!("textureLoad({name}, coord)"),
            _ => format!("textureLoad({name}, coord, 0)"),
        };
        let _ = write!(out, "\nfn fetch_{name}(coord: vec2<i32>) -> vec4<f32> {{\n    return {body};\n}}\n");
    }

    trace!(%target, sampled = sampled.len(), fetched = fetched.len(), "mangled fragment source");
    out
}
