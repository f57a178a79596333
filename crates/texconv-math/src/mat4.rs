//! 4x4 affine matrix for color conversion.
//!
//! [`Matrix4`] holds RGB <-> Y'CbCr transforms together with the range
//! offset/scale steps, in double precision. Only the final product is
//! narrowed to `f32` for upload as a shader uniform.

use std::ops::{Index, Mul};

/// A 4x4 matrix, row-major, acting on column vectors.
///
/// # Example
///
/// ```rust
/// use texconv_math::Matrix4;
///
/// let m = Matrix4::IDENTITY.offset_components(0.5, 0.0, 0.0);
/// assert_eq!(m.transform([0.25, 0.0, 0.0, 1.0]), [0.75, 0.0, 0.0, 1.0]);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Matrix4 {
    /// Elements as `[row][column]`.
    pub m: [[f64; 4]; 4],
}

impl Matrix4 {
    /// Identity matrix.
    pub const IDENTITY: Self = Self {
        m: [
            [1.0, 0.0, 0.0, 0.0],
            [0.0, 1.0, 0.0, 0.0],
            [0.0, 0.0, 1.0, 0.0],
            [0.0, 0.0, 0.0, 1.0],
        ],
    };

    /// Creates a matrix from rows.
    #[inline]
    pub const fn from_rows(rows: [[f64; 4]; 4]) -> Self {
        Self { m: rows }
    }

    /// Returns `self` followed by a translation of the first three components.
    ///
    /// The translation lives in the last column, so it applies to vectors
    /// whose fourth component is 1.
    pub fn offset_components(self, a1: f64, a2: f64, a3: f64) -> Self {
        let t = Self::from_rows([
            [1.0, 0.0, 0.0, a1],
            [0.0, 1.0, 0.0, a2],
            [0.0, 0.0, 1.0, a3],
            [0.0, 0.0, 0.0, 1.0],
        ]);
        t * self
    }

    /// Returns `self` followed by a per-component scale.
    pub fn scale_components(self, a1: f64, a2: f64, a3: f64, a4: f64) -> Self {
        let s = Self::from_rows([
            [a1, 0.0, 0.0, 0.0],
            [0.0, a2, 0.0, 0.0],
            [0.0, 0.0, a3, 0.0],
            [0.0, 0.0, 0.0, a4],
        ]);
        s * self
    }

    /// Returns `self` followed by Y'CbCr to R'G'B' with luma weights `kr`, `kb`.
    ///
    /// Expects Cb and Cr centered on zero.
    pub fn ycbcr_to_rgb(self, kr: f64, kb: f64) -> Self {
        let kg = 1.0 - kr - kb;
        let k = Self::from_rows([
            [1.0, 0.0, 2.0 * (1.0 - kr), 0.0],
            [
                1.0,
                -2.0 * kb * (1.0 - kb) / kg,
                -2.0 * kr * (1.0 - kr) / kg,
                0.0,
            ],
            [1.0, 2.0 * (1.0 - kb), 0.0, 0.0],
            [0.0, 0.0, 0.0, 1.0],
        ]);
        k * self
    }

    /// Returns `self` followed by R'G'B' to Y'CbCr with luma weights `kr`, `kb`.
    ///
    /// Produces Cb and Cr centered on zero.
    pub fn rgb_to_ycbcr(self, kr: f64, kb: f64) -> Self {
        let kg = 1.0 - kr - kb;
        let k = Self::from_rows([
            [kr, kg, kb, 0.0],
            [-0.5 * kr / (1.0 - kb), -0.5 * kg / (1.0 - kb), 0.5, 0.0],
            [0.5, -0.5 * kg / (1.0 - kr), -0.5 * kb / (1.0 - kr), 0.0],
            [0.0, 0.0, 0.0, 1.0],
        ]);
        k * self
    }

    /// Applies the matrix to a column vector.
    pub fn transform(&self, v: [f64; 4]) -> [f64; 4] {
        let mut out = [0.0; 4];
        for (i, row) in self.m.iter().enumerate() {
            out[i] = row.iter().zip(v.iter()).map(|(a, b)| a * b).sum();
        }
        out
    }

    /// Elements in column-major order, as shader uniforms expect them.
    pub fn to_column_major_f32(&self) -> [f32; 16] {
        let mut out = [0.0f32; 16];
        for (row, values) in self.m.iter().enumerate() {
            for (col, value) in values.iter().enumerate() {
                out[col * 4 + row] = *value as f32;
            }
        }
        out
    }
}

impl Default for Matrix4 {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Mul for Matrix4 {
    type Output = Matrix4;

    fn mul(self, rhs: Matrix4) -> Matrix4 {
        let mut out = [[0.0; 4]; 4];
        for (i, row) in out.iter_mut().enumerate() {
            for (j, value) in row.iter_mut().enumerate() {
                *value = (0..4).map(|k| self.m[i][k] * rhs.m[k][j]).sum();
            }
        }
        Matrix4 { m: out }
    }
}

impl Index<(usize, usize)> for Matrix4 {
    type Output = f64;

    #[inline]
    fn index(&self, (row, col): (usize, usize)) -> &f64 {
        &self.m[row][col]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn assert_vec_eq(a: [f64; 4], b: [f64; 4]) {
        for i in 0..4 {
            assert_abs_diff_eq!(a[i], b[i], epsilon = 1e-9);
        }
    }

    #[test]
    fn test_builders_apply_in_order() {
        // offset first, then scale
        let m = Matrix4::IDENTITY
            .offset_components(-0.25, 0.0, 0.0)
            .scale_components(2.0, 1.0, 1.0, 1.0);
        assert_vec_eq(m.transform([0.75, 0.0, 0.0, 1.0]), [1.0, 0.0, 0.0, 1.0]);
    }

    #[test]
    fn test_ycbcr_inverse() {
        for (kr, kb) in [(0.299, 0.114), (0.2126, 0.0722), (0.2627, 0.0593)] {
            let m = Matrix4::IDENTITY.rgb_to_ycbcr(kr, kb).ycbcr_to_rgb(kr, kb);
            for r in 0..4 {
                for c in 0..4 {
                    let expected = if r == c { 1.0 } else { 0.0 };
                    assert_abs_diff_eq!(m[(r, c)], expected, epsilon = 1e-12);
                }
            }
        }
    }

    #[test]
    fn test_white_has_no_chroma() {
        let m = Matrix4::IDENTITY.rgb_to_ycbcr(0.2126, 0.0722);
        assert_vec_eq(m.transform([1.0, 1.0, 1.0, 1.0]), [1.0, 0.0, 0.0, 1.0]);
    }

    #[test]
    fn test_column_major_layout() {
        let m = Matrix4::IDENTITY.offset_components(0.1, 0.2, 0.3);
        let cm = m.to_column_major_f32();
        // translation is the last column
        assert_eq!(&cm[12..15], &[0.1f32, 0.2, 0.3]);
        assert_eq!(cm[15], 1.0);
    }
}
