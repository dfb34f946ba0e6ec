/*
 * Copyright (c) 2023.
 *
 * This software is free software;
 *
 * You can redistribute it or modify it under terms of the MIT, Apache License or Zlib license
 */

//! Plan and warp whole regions of a deformed slide
//!
//! Serving a region `R` of the reference slide from a template slide
//! takes two steps:
//!
//! 1. [`plan_target_region`] finds which template pixels the deformation
//!    can pull into `R`, so the caller knows what to read.
//! 2. [`warp_region`] resamples that interleaved template image into
//!    the reference grid.
//!
//! ```text
//!   template slide                     reference slide
//!  ┌──────────────────────┐           ┌────────────────────┐
//!  │   margin             │           │                    │
//!  │  ┌───────────────┐   │  warp     │   ┌────────┐       │
//!  │  │ deformed R    │   │ ───────►  │   │   R    │       │
//!  │  └───────────────┘   │           │   └────────┘       │
//!  └──────────────────────┘           └────────────────────┘
//! ```
use slidewarp_core::log::trace;
use slidewarp_core::options::WarpOptions;

use crate::deformation::DeformationField;
use crate::deinterleave::{deinterleave_channels, interleave_channels};
use crate::errors::WarpErrors;
use crate::tile::{interpolate_tile, TileRegion, TileTransforms};
use crate::traits::NumOps;
use crate::world::WorldMatrix;

/// Area of the template slide needed to serve a reference region
#[derive(Copy, Clone, Debug)]
pub struct TargetRegion {
    /// World matrix of the planned area, its translation is the
    /// world position of `start_px`
    pub wt:       WorldMatrix,
    /// First template pixel of the area
    pub start_px: (i64, i64),
    /// Width and height of the area in pixels
    pub size_px:  (usize, usize)
}

impl TargetRegion {
    /// The planned area as a tile placement for [`warp_region`]
    pub const fn tile(&self) -> TileRegion {
        TileRegion::new(self.start_px.0, self.start_px.1, self.size_px.0, self.size_px.1)
    }
}

/// World matrix of a region starting at pixel `(start_x, start_y)`
/// of a level with matrix `w_level`
#[allow(clippy::cast_precision_loss)]
pub fn region_world_matrix(w_level: &WorldMatrix, start_x: i64, start_y: i64) -> WorldMatrix {
    w_level.with_translation(
        start_x as f64 * w_level.scale_x(),
        start_y as f64 * w_level.scale_y()
    )
}

/// World positions of the corners of a region
///
/// Returned in the order origin, `+x`, `+y`, `+x+y`.
#[allow(clippy::cast_precision_loss)]
pub fn four_corners_world(wr: &WorldMatrix, size: (usize, usize)) -> [(f64, f64); 4] {
    let w = size.0 as f64;
    let h = size.1 as f64;

    [
        wr.transform_pixel(0.0, 0.0),
        wr.transform_pixel(w, 0.0),
        wr.transform_pixel(0.0, h),
        wr.transform_pixel(w, h)
    ]
}

/// Find the template area a deformed reference region reads from
///
/// The corners of the region are moved through the deformation, their
/// bounding box (extended by one reference pixel) is grown by
/// `options.get_region_margin()` of its extent on each side and snapped
/// to the pixel grid of `wr_region`.
///
/// # Arguments
/// - deformation: The deformation between the slides
/// - wr_region: World matrix of the reference region, see [`region_world_matrix`]
/// - source_size: Width and height of the reference region
/// - options: Provides the margin
///
/// # Errors
/// - `source_size` has a zero dimension
/// - `wr_region` has a zero pixel size
#[allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
pub fn plan_target_region(
    deformation: &DeformationField, wr_region: &WorldMatrix, source_size: (usize, usize),
    options: &WarpOptions
) -> Result<TargetRegion, WarpErrors> {
    if source_size.0 == 0 || source_size.1 == 0 {
        return Err(WarpErrors::ZeroDimensions("source region"));
    }
    let pixel_x = wr_region.scale_x();
    let pixel_y = wr_region.scale_y();

    if pixel_x == 0.0 || pixel_y == 0.0 {
        return Err(WarpErrors::NonInvertibleMatrix("WR"));
    }

    let mut min_x = f64::INFINITY;
    let mut max_x = f64::NEG_INFINITY;
    let mut min_y = f64::INFINITY;
    let mut max_y = f64::NEG_INFINITY;

    for (x, y) in four_corners_world(wr_region, source_size) {
        let (dx, dy) = deformation.deform_point(x, y);
        min_x = min_x.min(dx);
        max_x = max_x.max(dx);
        min_y = min_y.min(dy);
        max_y = max_y.max(dy);
    }
    // end of the last pixel
    max_x += pixel_x;
    max_y += pixel_y;

    let margin = options.get_region_margin();
    let extent_x = max_x - min_x;
    let extent_y = max_y - min_y;

    let start_x = ((min_x - margin * extent_x) / pixel_x).round() as i64;
    let start_y = ((min_y - margin * extent_y) / pixel_y).round() as i64;

    let grow = 1.0 + 2.0 * margin;
    let size_x = ((grow * extent_x / pixel_x).round() - 1.0).max(0.0) as usize;
    let size_y = ((grow * extent_y / pixel_y).round() - 1.0).max(0.0) as usize;

    let wt = region_world_matrix(wr_region, start_x, start_y);

    trace!("Planned template region at ({start_x},{start_y}) of size {size_x}x{size_y}");

    Ok(TargetRegion {
        wt,
        start_px: (start_x, start_y),
        size_px: (size_x, size_y)
    })
}

/// Warp an interleaved template image into a reference region
///
/// # Arguments
/// - template: Interleaved template pixels covering `template_tile`
/// - template_tile: Placement of `template` in the template level
/// - channels: Number of interleaved channels
/// - wt: World matrix of the template level, without a region offset
/// - wr: World matrix of the reference level, without a region offset
/// - deformation: The deformation between the slides
/// - out_tile: The reference region to produce
/// - options: Out of bound value and threading
///
/// # Returns
/// Interleaved pixels of `out_tile`
///
/// # Errors
/// - `channels` is zero or a tile has a zero dimension
/// - `template` doesn't match `template_tile`
/// - A tile size overflows `usize`
/// - `wt` is singular
pub fn warp_region<T>(
    template: &[T], template_tile: TileRegion, channels: usize, wt: &WorldMatrix,
    wr: &WorldMatrix, deformation: &DeformationField, out_tile: TileRegion,
    options: &WarpOptions
) -> Result<Vec<T>, WarpErrors>
where
    T: Copy + Default + NumOps<T> + Send + Sync
{
    if channels == 0 {
        return Err(WarpErrors::ZeroChannels);
    }
    let expected = template_tile.sample_len(channels)?;
    if template.len() != expected {
        return Err(WarpErrors::WrongBufferSize("template", expected, template.len()));
    }

    let transforms = TileTransforms::from_template_matrix(*wr, wt)?;

    let planar_in = deinterleave_channels(template, channels);
    let mut planar_out = vec![T::default(); out_tile.sample_len(channels)?];

    interpolate_tile(
        &planar_in,
        &mut planar_out,
        template_tile,
        out_tile,
        channels,
        &transforms,
        deformation,
        options
    )?;

    Ok(interleave_channels(&planar_out, channels))
}

#[cfg(test)]
mod tests {
    use slidewarp_core::options::WarpOptions;

    use crate::deformation::DeformationField;
    use crate::region::{
        four_corners_world, plan_target_region, region_world_matrix, warp_region
    };
    use crate::tile::TileRegion;
    use crate::world::WorldMatrix;

    fn grid_matrix() -> WorldMatrix {
        WorldMatrix::from_pixel_size(10.0, 10.0).with_translation(-5.0, -5.0)
    }

    fn reference_region() -> WorldMatrix {
        WorldMatrix::from_pixel_size(0.1, 0.1).with_translation(10.0, 10.0)
    }

    #[test]
    fn corners_of_region() {
        let pts = four_corners_world(&reference_region(), (512, 512));

        assert_eq!(pts[0], (10.0, 10.0));
        assert!((pts[1].0 - 61.2).abs() < 1e-9 && pts[1].1 == 10.0);
        assert!(pts[2].0 == 10.0 && (pts[2].1 - 61.2).abs() < 1e-9);
        assert!((pts[3].0 - 61.2).abs() < 1e-9 && (pts[3].1 - 61.2).abs() < 1e-9);
    }

    #[test]
    fn plan_without_deformation_only_adds_margin() {
        let deformation = DeformationField::zeros(513, 513, grid_matrix()).unwrap();
        let wr = reference_region();

        let plan =
            plan_target_region(&deformation, &wr, (512, 512), &WarpOptions::default()).unwrap();

        // 10% of the 51.3 mm extent before the region start
        assert_eq!(plan.start_px, (49, 49));
        assert!((plan.wt.translation().0 - 4.9).abs() < 1e-9);
        assert!((plan.wt.translation().0 - (10.0 - 5.12)).abs() < 0.1);
        assert_eq!(plan.wt.scale_x(), wr.scale_x());

        let (sx, sy) = plan.size_px;
        assert!(512.0 * 1.15 < sx as f64 && (sx as f64) < 512.0 * 1.25);
        assert!(512.0 * 1.15 < sy as f64 && (sy as f64) < 512.0 * 1.25);
    }

    #[test]
    fn plan_follows_unit_deformation() {
        let deformation = DeformationField::constant(1.0, 1.0, 513, 513, grid_matrix()).unwrap();
        let wr = reference_region();

        let plan =
            plan_target_region(&deformation, &wr, (512, 512), &WarpOptions::default()).unwrap();

        let (tx, ty) = plan.wt.translation();
        assert!(tx < wr.translation().0);
        assert!((tx - (10.0 - 5.12 + 1.0)).abs() < 0.1);
        assert!((ty - (10.0 - 5.12 + 1.0)).abs() < 0.1);
        assert!(plan.size_px.0 as f64 > 512.0 * 1.2);
    }

    #[test]
    fn plan_rejects_empty_region() {
        let deformation = DeformationField::zeros(4, 4, grid_matrix()).unwrap();
        let plan = plan_target_region(
            &deformation,
            &reference_region(),
            (0, 10),
            &WarpOptions::default()
        );
        assert!(plan.is_err());
    }

    #[test]
    fn warp_without_deformation_crops_template() {
        let level = WorldMatrix::from_pixel_size(0.5, 0.5);
        let deformation = DeformationField::zeros(8, 8, grid_matrix()).unwrap();

        let template_tile = TileRegion::new(0, 0, 20, 20);
        let template: Vec<u8> = (0..20 * 20 * 3).map(|i| (i % 251) as u8).collect();
        let out_tile = TileRegion::new(5, 5, 4, 3);

        let out = warp_region(
            &template,
            template_tile,
            3,
            &level,
            &level,
            &deformation,
            out_tile,
            &WarpOptions::default()
        )
        .unwrap();

        assert_eq!(out.len(), 4 * 3 * 3);
        for y in 0..3 {
            for x in 0..4 {
                let src = ((y + 5) * 20 + (x + 5)) * 3;
                let dst = (y * 4 + x) * 3;
                assert_eq!(out[dst..dst + 3], template[src..src + 3]);
            }
        }
    }

    #[test]
    fn plan_then_warp_shifts_content() {
        // 0.5 mm pixels, template displaced by 1 mm (2 pixels) along x
        let level = WorldMatrix::from_pixel_size(0.5, 0.5);
        let deformation = DeformationField::constant(1.0, 0.0, 64, 64, grid_matrix()).unwrap();
        let options = WarpOptions::default();

        let out_tile = TileRegion::new(40, 30, 16, 12);
        let wr_region = region_world_matrix(&level, out_tile.start_x, out_tile.start_y);
        let plan = plan_target_region(
            &deformation,
            &wr_region,
            (out_tile.width, out_tile.height),
            &options
        )
        .unwrap();

        // template pixel value encodes its global position and channel
        let tile = plan.tile();
        let mut template = Vec::with_capacity(tile.plane_len() * 3);
        for y in 0..tile.height as i64 {
            for x in 0..tile.width as i64 {
                for c in 0..3 {
                    let gx = tile.start_x + x;
                    let gy = tile.start_y + y;
                    template.push((gx + 100 * gy + 10_000 * c) as u16);
                }
            }
        }

        let out = warp_region(
            &template,
            tile,
            3,
            &level,
            &level,
            &deformation,
            out_tile,
            &options
        )
        .unwrap();

        for y in 0..out_tile.height as i64 {
            for x in 0..out_tile.width as i64 {
                for c in 0..3 {
                    let gx = out_tile.start_x + x + 2;
                    let gy = out_tile.start_y + y;
                    let idx = ((y * out_tile.width as i64 + x) * 3 + c) as usize;
                    assert_eq!(i64::from(out[idx]), gx + 100 * gy + 10_000 * c);
                }
            }
        }
    }

    #[test]
    fn warp_rejects_short_template() {
        let level = WorldMatrix::identity();
        let deformation = DeformationField::zeros(4, 4, grid_matrix()).unwrap();

        let out = warp_region(
            &[0_u8; 10],
            TileRegion::new(0, 0, 2, 2),
            3,
            &level,
            &level,
            &deformation,
            TileRegion::new(0, 0, 2, 2),
            &WarpOptions::default()
        );
        assert!(out.is_err());
    }
}
