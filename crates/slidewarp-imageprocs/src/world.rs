/*
 * Copyright (c) 2023.
 *
 * This software is free software;
 *
 * You can redistribute it or modify it under terms of the MIT, Apache License or Zlib license
 */

//! Homogeneous world matrices
//!
//! Slides, tiles and deformation grids each have their own pixel
//! grid, a world matrix maps a pixel `(px, py)` of such a grid to a
//! common physical space (millimetres) via
//!
//! ```text
//! | sx  0   0  tx |   | px |
//! | 0   sy  0  ty | * | py |
//! | 0   0   1  0  |   | 0  |
//! | 0   0   0  1  |   | 1  |
//! ```
//! Matrices are stored row major, which is also the byte order of
//! the `W` blob stored in deformation records.
use slidewarp_core::log::warn;

use crate::errors::WarpErrors;

/// A 4x4 row-major homogeneous transform
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WorldMatrix {
    m: [[f64; 4]; 4]
}

impl Default for WorldMatrix {
    fn default() -> Self {
        Self::identity()
    }
}

impl WorldMatrix {
    /// Identity transform (no change)
    pub const fn identity() -> Self {
        Self {
            m: [
                [1.0, 0.0, 0.0, 0.0],
                [0.0, 1.0, 0.0, 0.0],
                [0.0, 0.0, 1.0, 0.0],
                [0.0, 0.0, 0.0, 1.0]
            ]
        }
    }

    pub const fn from_rows(m: [[f64; 4]; 4]) -> Self {
        Self { m }
    }

    /// Create from 16 values in row major order
    pub fn from_row_major(values: &[f64; 16]) -> Self {
        let mut m = [[0.0; 4]; 4];
        for (row, chunk) in m.iter_mut().zip(values.chunks_exact(4)) {
            row.copy_from_slice(chunk);
        }
        Self { m }
    }

    /// Decode 16 little endian `f64` values in row major order
    ///
    /// # Errors
    /// - `bytes` is not exactly 128 bytes long
    pub fn from_le_bytes(bytes: &[u8]) -> Result<Self, WarpErrors> {
        if bytes.len() != 16 * 8 {
            return Err(WarpErrors::WrongBlobLength("W", 16 * 8, bytes.len()));
        }
        let mut values = [0.0; 16];
        for (value, chunk) in values.iter_mut().zip(bytes.chunks_exact(8)) {
            let mut raw = [0; 8];
            raw.copy_from_slice(chunk);
            *value = f64::from_le_bytes(raw);
        }
        Ok(Self::from_row_major(&values))
    }

    /// Diagonal scaling, the pixel size along each axis
    pub fn from_pixel_size(sx: f64, sy: f64) -> Self {
        let mut this = Self::identity();
        this.m[0][0] = sx;
        this.m[1][1] = sy;
        this
    }

    /// Return a copy with the translation column replaced
    #[must_use]
    pub fn with_translation(mut self, tx: f64, ty: f64) -> Self {
        self.m[0][3] = tx;
        self.m[1][3] = ty;
        self
    }

    pub const fn rows(&self) -> &[[f64; 4]; 4] {
        &self.m
    }

    /// Pixel size along x
    pub const fn scale_x(&self) -> f64 {
        self.m[0][0]
    }

    /// Pixel size along y
    pub const fn scale_y(&self) -> f64 {
        self.m[1][1]
    }

    pub const fn translation(&self) -> (f64, f64) {
        (self.m[0][3], self.m[1][3])
    }

    /// Multiply a homogeneous point
    pub fn transform_point(&self, p: [f64; 4]) -> [f64; 4] {
        let mut out = [0.0; 4];
        for (o, row) in out.iter_mut().zip(self.m.iter()) {
            *o = row[0] * p[0] + row[1] * p[1] + row[2] * p[2] + row[3] * p[3];
        }
        out
    }

    /// Map a 2D position in this matrix's grid, returns the
    /// first two output coordinates
    #[inline(always)]
    pub fn transform_pixel(&self, x: f64, y: f64) -> (f64, f64) {
        let r0 = &self.m[0];
        let r1 = &self.m[1];
        (
            r0[0] * x + r0[1] * y + r0[3],
            r1[0] * x + r1[1] * y + r1[3]
        )
    }

    /// Compose two transforms, `self * other`
    ///
    /// The result applies `other` first.
    #[must_use]
    pub fn then(&self, other: &WorldMatrix) -> Self {
        let mut m = [[0.0; 4]; 4];
        for (i, row) in m.iter_mut().enumerate() {
            for (j, value) in row.iter_mut().enumerate() {
                *value = (0..4).map(|k| self.m[i][k] * other.m[k][j]).sum();
            }
        }
        Self { m }
    }

    /// Invert the transform (for reverse mapping)
    ///
    /// Uses Gauss-Jordan elimination with partial pivoting,
    /// returns `None` for singular matrices.
    pub fn inverse(&self) -> Option<Self> {
        let mut a = self.m;
        let mut inv = Self::identity().m;

        // singular pivots are judged relative to the largest entry
        let norm = a.iter().flatten().fold(0.0_f64, |acc, v| acc.max(v.abs()));
        let tolerance = norm * f64::EPSILON;

        for col in 0..4 {
            // pick the largest pivot in this column
            let mut pivot = col;
            for row in col + 1..4 {
                if a[row][col].abs() > a[pivot][col].abs() {
                    pivot = row;
                }
            }
            if a[pivot][col].abs() <= tolerance || !a[pivot][col].is_finite() {
                warn!("Singular world matrix {:?}", self.m);
                return None;
            }
            a.swap(col, pivot);
            inv.swap(col, pivot);

            let scale = 1.0 / a[col][col];
            for j in 0..4 {
                a[col][j] *= scale;
                inv[col][j] *= scale;
            }
            for row in 0..4 {
                if row == col {
                    continue;
                }
                let factor = a[row][col];
                if factor == 0.0 {
                    continue;
                }
                for j in 0..4 {
                    a[row][j] -= factor * a[col][j];
                    inv[row][j] -= factor * inv[col][j];
                }
            }
        }
        Some(Self { m: inv })
    }

    /// Like [`inverse`](Self::inverse) but reports which matrix failed
    ///
    /// # Errors
    /// - The matrix is singular
    pub fn try_inverse(&self, name: &'static str) -> Result<Self, WarpErrors> {
        self.inverse().ok_or(WarpErrors::NonInvertibleMatrix(name))
    }
}

/// World matrix of a pyramid level
///
/// # Arguments
/// - pixel_size_nm_x: Pixel width at the base level in nanometres
/// - pixel_size_nm_y: Pixel height at the base level in nanometres
/// - downsample_factor: Downsampling of the level relative to the base
///
/// # Returns
/// A diagonal matrix in millimetres per pixel
pub fn world_matrix_for_level(
    pixel_size_nm_x: f64, pixel_size_nm_y: f64, downsample_factor: f64
) -> WorldMatrix {
    WorldMatrix::from_pixel_size(
        pixel_size_nm_x / 1e6 * downsample_factor,
        pixel_size_nm_y / 1e6 * downsample_factor
    )
}
