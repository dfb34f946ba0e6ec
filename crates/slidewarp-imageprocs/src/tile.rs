/*
 * Copyright (c) 2023.
 *
 * This software is free software;
 *
 * You can redistribute it or modify it under terms of the MIT, Apache License or Zlib license
 */

//! Resample a template tile into reference space
//!
//! # Algorithm
//!
//! Resampling is done by reverse mapping, every output pixel asks where
//! it comes from:
//!
//! ```text
//!  reference pixel ──WR──► world ──(+ deformation)──► world' ──WTInv──► template pixel
//! ```
//!
//! 1. The output pixel `(x, y)` sits at `out_start + (x, y)` in the
//!    reference level's pixel grid.
//! 2. `WR` maps it to world space.
//! 3. The deformation field is sampled there (through `Wdef_inv`) and
//!    the displacement is added.
//! 4. `WTInv` maps the displaced point into the template level's pixel
//!    grid, subtracting `in_start` gives a position inside the input tile.
//! 5. Each channel of the input tile is bilinearly sampled at that position.
//!
//! Steps 1-4 do not depend on the channel, so the source positions are
//! computed once and shared by all channel planes.
//!
//! # Layout
//! Tiles are planar, channel `c` of a `width x height` tile occupies
//! `[c*width*height, (c+1)*width*height)` and pixel `(x, y)` of a plane
//! is at `y * width + x`.
use slidewarp_core::log::{debug, trace};
use slidewarp_core::options::WarpOptions;

use crate::deformation::DeformationField;
use crate::errors::WarpErrors;
use crate::field::ScalarField;
use crate::interpolate::linear_interp_point_2d;
use crate::traits::NumOps;
use crate::world::WorldMatrix;

/// Placement of a tile in the global pixel grid of its level
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct TileRegion {
    pub start_x: i64,
    pub start_y: i64,
    pub width:   usize,
    pub height:  usize
}

impl TileRegion {
    pub const fn new(start_x: i64, start_y: i64, width: usize, height: usize) -> Self {
        Self {
            start_x,
            start_y,
            width,
            height
        }
    }

    /// Number of pixels in a single channel plane
    ///
    /// Not overflow checked, see [`sample_len`](Self::sample_len)
    pub const fn plane_len(&self) -> usize {
        self.width * self.height
    }

    /// Number of samples in a planar buffer of `channels` planes
    ///
    /// # Errors
    /// - The size overflows `usize`
    pub fn sample_len(&self, channels: usize) -> Result<usize, WarpErrors> {
        self.width
            .checked_mul(self.height)
            .and_then(|plane| plane.checked_mul(channels))
            .ok_or(WarpErrors::Generic("Tile size overflows usize"))
    }
}

/// Matrices mapping reference pixels into template pixels
#[derive(Copy, Clone, Debug)]
pub struct TileTransforms {
    /// Reference pixel to world
    pub wr:     WorldMatrix,
    /// World to template pixel
    pub wt_inv: WorldMatrix
}

impl TileTransforms {
    pub const fn new(wr: WorldMatrix, wt_inv: WorldMatrix) -> Self {
        Self { wr, wt_inv }
    }

    /// Build from the forward template matrix `WT`
    ///
    /// # Errors
    /// - `wt` is singular
    pub fn from_template_matrix(wr: WorldMatrix, wt: &WorldMatrix) -> Result<Self, WarpErrors> {
        Ok(Self {
            wr,
            wt_inv: wt.try_inverse("WT")?
        })
    }
}

/// Resample `input` into `output` through the deformation field
///
/// # Arguments
/// - input: Planar template tile with `channels` planes of `in_tile` size
/// - output: Planar reference tile with `channels` planes of `out_tile` size,
///   every sample is overwritten
/// - in_tile: Placement of the template tile in the template level
/// - out_tile: Placement of the output tile in the reference level
/// - channels: Number of planes in both tiles
/// - transforms: `WR` and `WTInv`
/// - deformation: The deformation field, carrying `Wdef` and `Wdef_inv`
/// - options: Out of bound value and threading
///
/// # Errors
/// - `channels` is zero
/// - A tile has a zero dimension
/// - A buffer length doesn't match its tile size
pub fn interpolate_tile<T>(
    input: &[T], output: &mut [T], in_tile: TileRegion, out_tile: TileRegion, channels: usize,
    transforms: &TileTransforms, deformation: &DeformationField, options: &WarpOptions
) -> Result<(), WarpErrors>
where
    T: Copy + NumOps<T> + Send + Sync
{
    check_tile("input", input.len(), &in_tile, channels)?;
    check_tile("output", output.len(), &out_tile, channels)?;

    trace!(
        "Resampling {}x{} tile from {}x{} template tile, {} channels",
        out_tile.width,
        out_tile.height,
        in_tile.width,
        in_tile.height,
        channels
    );

    let positions = source_positions(&in_tile, &out_tile, transforms, deformation);
    let out_of_bound = options.get_out_of_bound_value();

    let in_plane = in_tile.plane_len();
    let out_plane = out_tile.plane_len();

    let mut outside = 0;

    #[cfg(feature = "threads")]
    {
        if options.get_use_threads() && channels > 1 {
            trace!("Running tile resampling in multithreaded mode");

            std::thread::scope(|s| {
                let mut handles = vec![];
                for (in_channel, out_channel) in input
                    .chunks_exact(in_plane)
                    .zip(output.chunks_exact_mut(out_plane))
                {
                    let positions = &positions;
                    handles.push(s.spawn(move || {
                        resample_plane(in_channel, out_channel, &in_tile, positions, out_of_bound)
                    }));
                }
                for handle in handles {
                    // a panic here is a panic in the worker, surface it as is
                    match handle.join() {
                        Ok(count) => outside += count,
                        Err(payload) => std::panic::resume_unwind(payload)
                    }
                }
            });
            debug!("{outside} of {} output samples fell outside the template tile", output.len());
            return Ok(());
        }
    }

    for (in_channel, out_channel) in input
        .chunks_exact(in_plane)
        .zip(output.chunks_exact_mut(out_plane))
    {
        outside += resample_plane(in_channel, out_channel, &in_tile, &positions, out_of_bound);
    }
    debug!("{outside} of {} output samples fell outside the template tile", output.len());

    Ok(())
}

fn check_tile(
    name: &'static str, len: usize, tile: &TileRegion, channels: usize
) -> Result<(), WarpErrors> {
    if channels == 0 {
        return Err(WarpErrors::ZeroChannels);
    }
    if tile.width == 0 || tile.height == 0 {
        return Err(WarpErrors::ZeroDimensions(name));
    }
    let expected = tile.sample_len(channels)?;

    if len != expected {
        return Err(WarpErrors::WrongBufferSize(name, expected, len));
    }
    Ok(())
}

/// Position inside the input tile for every output pixel
///
/// Returned as `(row, column)` pairs in output raster order.
#[allow(clippy::cast_precision_loss)]
fn source_positions(
    in_tile: &TileRegion, out_tile: &TileRegion, transforms: &TileTransforms,
    deformation: &DeformationField
) -> Vec<(f64, f64)> {
    let mut positions = Vec::with_capacity(out_tile.plane_len());

    let in_start_x = in_tile.start_x as f64;
    let in_start_y = in_tile.start_y as f64;

    let out_start_x = out_tile.start_x as f64;
    let out_start_y = out_tile.start_y as f64;

    for y in 0..out_tile.height {
        let ref_y = out_start_y + y as f64;

        for x in 0..out_tile.width {
            let ref_x = out_start_x + x as f64;

            let (world_x, world_y) = transforms.wr.transform_pixel(ref_x, ref_y);
            let (moved_x, moved_y) = deformation.deform_point(world_x, world_y);
            let (tmp_x, tmp_y) = transforms.wt_inv.transform_pixel(moved_x, moved_y);

            positions.push((tmp_y - in_start_y, tmp_x - in_start_x));
        }
    }
    positions
}

/// Sample one channel plane at precomputed positions
///
/// Returns how many samples fell outside the input plane
fn resample_plane<T>(
    in_channel: &[T], out_channel: &mut [T], in_tile: &TileRegion, positions: &[(f64, f64)],
    out_of_bound: f64
) -> usize
where
    T: Copy + NumOps<T>
{
    let plane = ScalarField::plane(in_channel, in_tile.width, in_tile.height);
    let mut outside = 0;

    for (out, (row, col)) in out_channel.iter_mut().zip(positions) {
        let (value, oob) = linear_interp_point_2d(&plane, *row, *col, out_of_bound);
        outside += usize::from(oob);
        *out = T::from_f64(value);
    }
    outside
}
