//! CPU texture storage with GPU sampling semantics.

use glam::{IVec2, Vec2, Vec4};
use texconv_core::{Error, Result, TexelFormat, TextureTarget};

/// A texture held as normalized `f32` channels.
///
/// Values are quantized to the texel format on every write, so reads see
/// exactly what a GPU texture of that format would hold.
#[derive(Debug, Clone, PartialEq)]
pub struct SoftTexture {
    /// Width in texels.
    pub width: u32,
    /// Height in texels.
    pub height: u32,
    /// Storage format.
    pub format: TexelFormat,
    /// Addressing target.
    pub target: TextureTarget,
    data: Vec<f32>,
}

impl SoftTexture {
    /// A zero filled texture.
    pub fn new(width: u32, height: u32, format: TexelFormat, target: TextureTarget) -> Self {
        let len = width as usize * height as usize * format.channels();
        Self { width, height, format, target, data: vec![0.0; len] }
    }

    /// Size in client memory bytes.
    pub fn byte_size(&self) -> usize {
        self.width as usize * self.height as usize * self.format.bytes_per_texel()
    }

    #[inline]
    fn index(&self, x: u32, y: u32) -> usize {
        (y as usize * self.width as usize + x as usize) * self.format.channels()
    }

    /// Stored channels of texel `(x, y)`.
    pub fn texel(&self, x: u32, y: u32) -> &[f32] {
        let i = self.index(x, y);
        &self.data[i..i + self.format.channels()]
    }

    /// Stores `value` at `(x, y)`, quantized; extra components are dropped.
    pub fn store(&mut self, x: u32, y: u32, value: [f32; 4]) {
        let format = self.format;
        let i = self.index(x, y);
        for c in 0..format.channels() {
            self.data[i + c] = quantize(value[c], format.channel_max(c));
        }
    }

    /// Texel `(x, y)` as a shader reads it.
    pub fn load(&self, x: u32, y: u32) -> Vec4 {
        expand(self.format, self.texel(x, y))
    }

    /// `textureLoad` with clamped coordinates.
    pub fn fetch(&self, coord: IVec2) -> Vec4 {
        let x = coord.x.clamp(0, self.width as i32 - 1) as u32;
        let y = coord.y.clamp(0, self.height as i32 - 1) as u32;
        self.load(x, y)
    }

    /// Bilinear, clamp to edge sample at normalized `coord`.
    pub fn sample(&self, coord: Vec2) -> Vec4 {
        let u = coord.x * self.width as f32 - 0.5;
        let v = coord.y * self.height as f32 - 0.5;
        let (x0, y0) = (u.floor(), v.floor());
        let (fx, fy) = (u - x0, v - y0);
        let clamp_x = |x: f32| x.clamp(0.0, self.width as f32 - 1.0) as u32;
        let clamp_y = |y: f32| y.clamp(0.0, self.height as f32 - 1.0) as u32;
        let (xa, xb) = (clamp_x(x0), clamp_x(x0 + 1.0));
        let (ya, yb) = (clamp_y(y0), clamp_y(y0 + 1.0));
        let top = self.load(xa, ya).lerp(self.load(xb, ya), fx);
        let bottom = self.load(xa, yb).lerp(self.load(xb, yb), fx);
        top.lerp(bottom, fy)
    }

    /// Replaces the contents from tightly packed client bytes.
    pub fn write_bytes(&mut self, bytes: &[u8]) -> Result<()> {
        if bytes.len() != self.byte_size() {
            return Err(Error::resource(format!(
                "{}x{} {} texture expects {} bytes, got {}",
                self.width,
                self.height,
                self.format,
                self.byte_size(),
                bytes.len()
            )));
        }
        let channels = self.format.channels();
        let bpt = self.format.bytes_per_texel();
        for (texel, src) in self.data.chunks_exact_mut(channels).zip(bytes.chunks_exact(bpt)) {
            decode(self.format, src, texel);
        }
        Ok(())
    }

    /// Contents as tightly packed client bytes.
    pub fn to_bytes(&self) -> Vec<u8> {
        let channels = self.format.channels();
        let bpt = self.format.bytes_per_texel();
        let mut out = vec![0u8; self.byte_size()];
        for (texel, dst) in self.data.chunks_exact(channels).zip(out.chunks_exact_mut(bpt)) {
            encode(self.format, texel, dst);
        }
        out
    }
}

/// Rounds `v` to the nearest of `max + 1` levels in `[0, 1]`.
#[inline]
pub fn quantize(v: f32, max: u32) -> f32 {
    let m = max as f32;
    (v.clamp(0.0, 1.0) * m).round() / m
}

fn expand(format: TexelFormat, t: &[f32]) -> Vec4 {
    match format {
        TexelFormat::Luminance8 => Vec4::new(t[0], t[0], t[0], 1.0),
        TexelFormat::LuminanceAlpha8 => Vec4::new(t[0], t[0], t[0], t[1]),
        _ => match t.len() {
            1 => Vec4::new(t[0], 0.0, 0.0, 1.0),
            2 => Vec4::new(t[0], t[1], 0.0, 1.0),
            3 => Vec4::new(t[0], t[1], t[2], 1.0),
            _ => Vec4::new(t[0], t[1], t[2], t[3]),
        },
    }
}

fn decode(format: TexelFormat, src: &[u8], texel: &mut [f32]) {
    match format {
        TexelFormat::Rgb10a2 => {
            let word = u32::from_le_bytes([src[0], src[1], src[2], src[3]]);
            texel[0] = (word & 0x3ff) as f32 / 1023.0;
            texel[1] = ((word >> 10) & 0x3ff) as f32 / 1023.0;
            texel[2] = ((word >> 20) & 0x3ff) as f32 / 1023.0;
            texel[3] = (word >> 30) as f32 / 3.0;
        }
        TexelFormat::Rgb565 => {
            let word = u16::from_le_bytes([src[0], src[1]]);
            texel[0] = (word >> 11) as f32 / 31.0;
            texel[1] = ((word >> 5) & 0x3f) as f32 / 63.0;
            texel[2] = (word & 0x1f) as f32 / 31.0;
        }
        f if f.is_16bit() => {
            for (c, pair) in texel.iter_mut().zip(src.chunks_exact(2)) {
                *c = u16::from_le_bytes([pair[0], pair[1]]) as f32 / 65535.0;
            }
        }
        _ => {
            for (c, b) in texel.iter_mut().zip(src) {
                *c = *b as f32 / 255.0;
            }
        }
    }
}

fn encode(format: TexelFormat, texel: &[f32], dst: &mut [u8]) {
    let level = |v: f32, max: u32| (v.clamp(0.0, 1.0) * max as f32).round() as u32;
    match format {
        TexelFormat::Rgb10a2 => {
            let word = level(texel[0], 1023)
                | (level(texel[1], 1023) << 10)
                | (level(texel[2], 1023) << 20)
                | (level(texel[3], 3) << 30);
            dst.copy_from_slice(&word.to_le_bytes());
        }
        TexelFormat::Rgb565 => {
            let word = (level(texel[0], 31) << 11) | (level(texel[1], 63) << 5) | level(texel[2], 31);
            dst.copy_from_slice(&(word as u16).to_le_bytes());
        }
        f if f.is_16bit() => {
            for (c, pair) in texel.iter().zip(dst.chunks_exact_mut(2)) {
                pair.copy_from_slice(&(level(*c, 65535) as u16).to_le_bytes());
            }
        }
        _ => {
            for (c, b) in texel.iter().zip(dst.iter_mut()) {
                *b = level(*c, 255) as u8;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rgb10a2_bits() {
        let mut t = SoftTexture::new(1, 1, TexelFormat::Rgb10a2, TextureTarget::TwoD);
        let word: u32 = 1023 | (512 << 10) | (3 << 30);
        t.write_bytes(&word.to_le_bytes()).unwrap();
        let v = t.load(0, 0);
        assert_eq!(v.x, 1.0);
        assert!((v.y - 512.0 / 1023.0).abs() < 1e-6);
        assert_eq!(v.z, 0.0);
        assert_eq!(v.w, 1.0);
        assert_eq!(t.to_bytes(), word.to_le_bytes());
    }

    #[test]
    fn test_rgb565_bits() {
        let mut t = SoftTexture::new(1, 1, TexelFormat::Rgb565, TextureTarget::TwoD);
        let word: u16 = (31 << 11) | (21 << 5);
        t.write_bytes(&word.to_le_bytes()).unwrap();
        let v = t.load(0, 0);
        assert_eq!(v.x, 1.0);
        assert!((v.y - 21.0 / 63.0).abs() < 1e-6);
        assert_eq!(v.z, 0.0);
        assert_eq!(v.w, 1.0);
        assert_eq!(t.to_bytes(), word.to_le_bytes());
    }

    #[test]
    fn test_luminance_expansion() {
        let mut t = SoftTexture::new(1, 1, TexelFormat::LuminanceAlpha8, TextureTarget::TwoD);
        t.write_bytes(&[51, 255]).unwrap();
        assert_eq!(t.load(0, 0), Vec4::new(0.2, 0.2, 0.2, 1.0));
        let mut r = SoftTexture::new(1, 1, TexelFormat::R16, TextureTarget::TwoD);
        r.write_bytes(&65535u16.to_le_bytes()).unwrap();
        assert_eq!(r.load(0, 0), Vec4::new(1.0, 0.0, 0.0, 1.0));
    }

    #[test]
    fn test_bilinear_clamp() {
        let mut t = SoftTexture::new(2, 1, TexelFormat::R8, TextureTarget::TwoD);
        t.write_bytes(&[0, 255]).unwrap();
        assert_eq!(t.sample(Vec2::new(0.25, 0.5)).x, 0.0);
        assert_eq!(t.sample(Vec2::new(0.75, 0.5)).x, 1.0);
        assert!((t.sample(Vec2::new(0.5, 0.5)).x - 0.5).abs() < 1e-6);
        assert_eq!(t.sample(Vec2::new(-3.0, 0.5)).x, 0.0);
        assert_eq!(t.sample(Vec2::new(3.0, 0.5)).x, 1.0);
    }

    #[test]
    fn test_size_mismatch() {
        let mut t = SoftTexture::new(2, 2, TexelFormat::Rgba8, TextureTarget::TwoD);
        assert!(t.write_bytes(&[0; 15]).is_err());
    }
}
