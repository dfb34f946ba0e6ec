/*
 * Copyright (c) 2023.
 *
 * This software is free software;
 *
 * You can redistribute it or modify it under terms of the MIT, Apache License or Zlib license
 */

//! Dense 2D deformation fields
//!
//! A deformation field stores, on a regular grid, the world space
//! displacement that moves a point of the reference slide onto the
//! matching point of the template slide.
//!
//! The grid has its own world matrix `Wdef` mapping grid voxels to
//! world coordinates, a world point is looked up by mapping it back
//! with `Wdef_inv` and bilinearly interpolating both displacement
//! components there.
use slidewarp_core::log::trace;

use crate::errors::WarpErrors;
use crate::field::ScalarField;
use crate::interpolate::linear_interp_point_2d;
use crate::world::WorldMatrix;

/// Displacement components on a `size_x` by `size_y` grid
///
/// Both components are stored with `x` as the fast axis, grid voxel
/// `(ix, iy)` is at `ix + size_x * iy`.
#[derive(Debug, Clone)]
pub struct DeformationField {
    def_x:        Vec<f64>,
    def_y:        Vec<f64>,
    size_x:       usize,
    size_y:       usize,
    w_def:        WorldMatrix,
    w_def_inv:    WorldMatrix,
    out_of_bound: f64
}

impl DeformationField {
    /// Create a deformation field, computing `Wdef_inv`
    ///
    /// # Arguments
    /// - def_x: Displacement along world x for each voxel
    /// - def_y: Displacement along world y for each voxel
    /// - size_x: Number of voxels along x
    /// - size_y: Number of voxels along y
    /// - w_def: Voxel to world matrix of the grid
    ///
    /// # Errors
    /// - A component does not hold `size_x * size_y` values
    /// - `w_def` is singular
    pub fn new(
        def_x: Vec<f64>, def_y: Vec<f64>, size_x: usize, size_y: usize, w_def: WorldMatrix
    ) -> Result<Self, WarpErrors> {
        let w_def_inv = w_def.try_inverse("Wdef")?;
        Self::with_inverse(def_x, def_y, size_x, size_y, w_def, w_def_inv)
    }

    /// Create a deformation field with a caller supplied `Wdef_inv`
    ///
    /// # Errors
    /// - A component does not hold `size_x * size_y` values
    pub fn with_inverse(
        def_x: Vec<f64>, def_y: Vec<f64>, size_x: usize, size_y: usize, w_def: WorldMatrix,
        w_def_inv: WorldMatrix
    ) -> Result<Self, WarpErrors> {
        let expected = voxel_count(size_x, size_y)?;

        if def_x.len() != expected {
            return Err(WarpErrors::WrongBufferSize("deformation_x", expected, def_x.len()));
        }
        if def_y.len() != expected {
            return Err(WarpErrors::WrongBufferSize("deformation_y", expected, def_y.len()));
        }

        Ok(Self {
            def_x,
            def_y,
            size_x,
            size_y,
            w_def,
            w_def_inv,
            out_of_bound: 0.0
        })
    }

    /// A field that displaces nothing
    ///
    /// # Errors
    /// - `w_def` is singular
    pub fn zeros(size_x: usize, size_y: usize, w_def: WorldMatrix) -> Result<Self, WarpErrors> {
        Self::constant(0.0, 0.0, size_x, size_y, w_def)
    }

    /// A field that moves every point inside the grid by `(dx, dy)`
    ///
    /// # Errors
    /// - `size_x * size_y` overflows
    /// - `w_def` is singular
    pub fn constant(
        dx: f64, dy: f64, size_x: usize, size_y: usize, w_def: WorldMatrix
    ) -> Result<Self, WarpErrors> {
        let len = voxel_count(size_x, size_y)?;
        Self::new(vec![dx; len], vec![dy; len], size_x, size_y, w_def)
    }

    /// Decode the raw blobs of a deformation record
    ///
    /// Each displacement blob holds `shape_x * shape_y` little endian
    /// `f64` values with `x` as the fast axis, `w_blob` holds the
    /// 16 row-major values of `Wdef`.
    ///
    /// # Errors
    /// - A blob has the wrong byte length
    /// - `Wdef` is singular
    pub fn from_record_blobs(
        def_x_blob: &[u8], def_y_blob: &[u8], shape_x: usize, shape_y: usize, w_blob: &[u8]
    ) -> Result<Self, WarpErrors> {
        let count = voxel_count(shape_x, shape_y)?;
        let def_x = decode_f64_blob("defX", def_x_blob, count)?;
        let def_y = decode_f64_blob("defY", def_y_blob, count)?;
        let w_def = WorldMatrix::from_le_bytes(w_blob)?;

        trace!("Decoded deformation record of {shape_x}x{shape_y} voxels");

        Self::new(def_x, def_y, shape_x, shape_y, w_def)
    }

    /// Set the displacement returned for world points outside the grid
    #[must_use]
    pub fn set_out_of_bound(mut self, value: f64) -> Self {
        self.out_of_bound = value;
        self
    }

    /// Return `(size_x, size_y)`
    pub const fn dimensions(&self) -> (usize, usize) {
        (self.size_x, self.size_y)
    }

    pub const fn w_def(&self) -> &WorldMatrix {
        &self.w_def
    }

    pub const fn w_def_inv(&self) -> &WorldMatrix {
        &self.w_def_inv
    }

    /// The x component as a field of `size_y` rows of `size_x` voxels
    pub fn def_x(&self) -> ScalarField<'_, f64> {
        ScalarField::plane(&self.def_x, self.size_x, self.size_y)
    }

    pub fn def_y(&self) -> ScalarField<'_, f64> {
        ScalarField::plane(&self.def_y, self.size_x, self.size_y)
    }

    /// Displacement at a world position
    ///
    /// Points outside the grid get the configured out of bound
    /// displacement on both axes.
    #[inline]
    pub fn displacement_at(&self, world_x: f64, world_y: f64) -> (f64, f64) {
        let (vx, vy) = self.w_def_inv.transform_pixel(world_x, world_y);

        let (ux, _) = linear_interp_point_2d(&self.def_x(), vy, vx, self.out_of_bound);
        let (uy, _) = linear_interp_point_2d(&self.def_y(), vy, vx, self.out_of_bound);
        (ux, uy)
    }

    /// Move a world point by the displacement at its position
    #[inline]
    pub fn deform_point(&self, world_x: f64, world_y: f64) -> (f64, f64) {
        let (ux, uy) = self.displacement_at(world_x, world_y);
        (world_x + ux, world_y + uy)
    }
}

fn voxel_count(size_x: usize, size_y: usize) -> Result<usize, WarpErrors> {
    size_x
        .checked_mul(size_y)
        .ok_or(WarpErrors::Generic("Deformation grid size overflows usize"))
}

fn decode_f64_blob(name: &'static str, blob: &[u8], count: usize) -> Result<Vec<f64>, WarpErrors> {
    let expected = count
        .checked_mul(8)
        .ok_or(WarpErrors::Generic("Deformation blob size overflows usize"))?;
    if blob.len() != expected {
        return Err(WarpErrors::WrongBlobLength(name, expected, blob.len()));
    }
    Ok(blob
        .chunks_exact(8)
        .map(|chunk| {
            let mut raw = [0; 8];
            raw.copy_from_slice(chunk);
            f64::from_le_bytes(raw)
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use crate::deformation::DeformationField;
    use crate::world::WorldMatrix;

    /// Grid used by the registration tool, 10 mm voxels centred on the origin
    fn grid_matrix() -> WorldMatrix {
        WorldMatrix::from_pixel_size(10.0, 10.0).with_translation(-5.0, -5.0)
    }

    #[test]
    fn rejects_wrong_component_length() {
        let err = DeformationField::new(vec![0.0; 6], vec![0.0; 5], 2, 3, grid_matrix());
        assert!(err.is_err());
    }

    #[test]
    fn rejects_singular_grid_matrix() {
        let w = WorldMatrix::from_pixel_size(0.0, 10.0);
        assert!(DeformationField::zeros(4, 4, w).is_err());
    }

    #[test]
    fn constant_field_inside_grid() {
        let field = DeformationField::constant(1.0, -2.0, 17, 17, grid_matrix()).unwrap();

        assert_eq!(field.displacement_at(12.3, 47.0), (1.0, -2.0));
        assert_eq!(field.deform_point(12.3, 47.0), (13.3, 45.0));
    }

    #[test]
    fn outside_grid_has_no_displacement() {
        let field = DeformationField::constant(1.0, 1.0, 4, 4, grid_matrix()).unwrap();
        // voxel 0.1 * -20 + 0.5 = -1.5
        assert_eq!(field.displacement_at(-20.0, 0.0), (0.0, 0.0));

        let field = field.set_out_of_bound(f64::NAN);
        assert!(field.displacement_at(-20.0, 0.0).0.is_nan());
    }

    #[test]
    fn varying_field_is_interpolated() {
        // def_x grows by one per voxel along x, def_y by one along y
        let (sx, sy) = (3, 4);
        let def_x: Vec<f64> = (0..sx * sy).map(|i| (i % sx) as f64).collect();
        let def_y: Vec<f64> = (0..sx * sy).map(|i| (i / sx) as f64).collect();
        let field =
            DeformationField::new(def_x, def_y, sx, sy, WorldMatrix::identity()).unwrap();

        let (ux, uy) = field.displacement_at(1.5, 2.25);
        assert!((ux - 1.5).abs() < 1e-12);
        assert!((uy - 2.25).abs() < 1e-12);
    }

    #[test]
    fn decodes_record_blobs() {
        let (sx, sy) = (2, 3);
        let def_x: Vec<u8> = (0..sx * sy)
            .flat_map(|i| (i as f64).to_le_bytes())
            .collect();
        let def_y: Vec<u8> = (0..sx * sy).flat_map(|_| 0.5_f64.to_le_bytes()).collect();
        let w: Vec<u8> = WorldMatrix::identity()
            .rows()
            .iter()
            .flatten()
            .flat_map(|v| v.to_le_bytes())
            .collect();

        let field = DeformationField::from_record_blobs(&def_x, &def_y, sx, sy, &w).unwrap();
        assert_eq!(field.dimensions(), (2, 3));
        assert_eq!(field.def_x().dimensions(), (3, 2));
        assert_eq!(field.displacement_at(1.0, 2.0), (5.0, 0.5));

        assert!(DeformationField::from_record_blobs(&def_x[..40], &def_y, sx, sy, &w).is_err());
    }

    fn identity_blob() -> Vec<u8> {
        WorldMatrix::identity()
            .rows()
            .iter()
            .flatten()
            .flat_map(|v| v.to_le_bytes())
            .collect()
    }

    fn encode(values: impl Iterator<Item = f64>) -> Vec<u8> {
        values.flat_map(f64::to_le_bytes).collect()
    }

    #[test]
    fn record_blobs_have_x_as_fast_axis() {
        // each voxel stores its own x index in def_x and y index in def_y
        let n = 4;
        let def_x = encode((0..n * n).map(|k| (k % n) as f64));
        let def_y = encode((0..n * n).map(|k| (k / n) as f64));

        let field =
            DeformationField::from_record_blobs(&def_x, &def_y, n, n, &identity_blob()).unwrap();

        assert_eq!(field.displacement_at(2.0, 0.0), (2.0, 0.0));
        assert_eq!(field.displacement_at(0.0, 3.0), (0.0, 3.0));
        assert_eq!(field.displacement_at(1.0, 2.0), (1.0, 2.0));
    }

    #[test]
    fn non_square_record_blobs() {
        // 3 voxels along x, 2 along y, value k at raw index k
        let (sx, sy) = (3, 2);
        let raw = encode((0..sx * sy).map(|k| k as f64));

        let field =
            DeformationField::from_record_blobs(&raw, &raw, sx, sy, &identity_blob()).unwrap();

        assert_eq!(field.displacement_at(2.0, 0.0).0, 2.0);
        assert_eq!(field.displacement_at(0.0, 1.0).0, 3.0);
        assert_eq!(field.displacement_at(2.0, 1.0).0, 5.0);
        assert_eq!(field.displacement_at(1.5, 1.0).0, 4.5);
        // past the last voxel along y
        assert_eq!(field.displacement_at(0.0, 2.0).0, 0.0);
    }

    #[test]
    fn oversized_grid_is_an_error() {
        let w = identity_blob();
        assert!(DeformationField::from_record_blobs(&[], &[], usize::MAX, 2, &w).is_err());
        assert!(DeformationField::zeros(usize::MAX, 2, WorldMatrix::identity()).is_err());
        assert!(DeformationField::new(vec![], vec![], usize::MAX, 3, WorldMatrix::identity()).is_err());
    }
}
