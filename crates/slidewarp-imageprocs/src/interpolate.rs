/*
 * Copyright (c) 2023.
 *
 * This software is free software;
 *
 * You can redistribute it or modify it under terms of the MIT, Apache License or Zlib license
 */

//! Bilinear point sampling
//!
//! # Edge policy
//! No extrapolation is done. A point is supported only if
//! it lies inside the closed rectangle spanned by the grid
//! samples, i.e `0 <= x <= m0 - 1` and `0 <= y <= m1 - 1`.
//!
//! On the last row or column the second neighbour collapses onto
//! the edge sample so such points still interpolate along the
//! other axis, everything further out returns the caller's
//! out of bound value.
use crate::field::ScalarField;
use crate::traits::NumOps;

/// Bilinearly interpolate `field` at `(x, y)`
///
/// `x` indexes the first dimension (`m0`) and `y` the second (`m1`).
///
/// # Arguments
/// - field: The samples to interpolate
/// - x: Position along the first axis, may be fractional
/// - y: Position along the second axis, may be fractional
/// - out_of_bound: Value returned when `(x, y)` is not supported
///
/// # Returns
/// The interpolated value and `false`, or `out_of_bound` and `true`
/// when the point lies outside the field. A `true` flag means the value
/// is a substitute, not a sample.
#[allow(
    clippy::cast_precision_loss,
    clippy::cast_sign_loss,
    clippy::cast_possible_truncation
)]
pub fn linear_interp_point_2d<T>(
    field: &ScalarField<'_, T>, x: f64, y: f64, out_of_bound: f64
) -> (f64, bool)
where
    T: Copy + NumOps<T>
{
    if field.is_empty() {
        return (out_of_bound, true);
    }
    let (m0, m1) = field.dimensions();

    let max_x = (m0 - 1) as f64;
    let max_y = (m1 - 1) as f64;

    // written as a negation so NaN is rejected too
    if !(x >= 0.0 && x <= max_x && y >= 0.0 && y <= max_y) {
        return (out_of_bound, true);
    }

    let x0 = x.floor() as usize;
    let y0 = y.floor() as usize;
    let x1 = (x0 + 1).min(m0 - 1);
    let y1 = (y0 + 1).min(m1 - 1);

    let fx = x - x0 as f64;
    let fy = y - y0 as f64;

    let p00 = field.at(x0, y0).to_f64();
    let p01 = field.at(x0, y1).to_f64();
    let p10 = field.at(x1, y0).to_f64();
    let p11 = field.at(x1, y1).to_f64();

    // lerp form keeps grid points and flat regions exact
    let v0 = p00 + fy * (p01 - p00);
    let v1 = p10 + fy * (p11 - p10);

    (v0 + fx * (v1 - v0), false)
}
