/*
 * Copyright (c) 2023.
 *
 * This software is free software;
 *
 * You can redistribute it or modify it under terms of the MIT, Apache License or Zlib license
 */

//! Borrowed 2D views over flat sample buffers
//!
//! ```text
//!        m1 (columns) ───────────►
//!   m0 │ (0,0) (0,1) ... (0,m1-1)
//!      │ (1,0) (1,1) ...
//!      ▼  ...
//! ```
//! Element `(i, j)` lives at `i * m1 + j`.

use crate::errors::WarpErrors;

/// An immutable row-major 2D field of samples
#[derive(Copy, Clone, Debug)]
pub struct ScalarField<'a, T> {
    data: &'a [T],
    m0:   usize,
    m1:   usize
}

impl<'a, T: Copy> ScalarField<'a, T> {
    /// Create a view over `data` with `m0` rows of `m1` columns
    ///
    /// # Errors
    /// - `data.len()` differs from `m0 * m1`
    pub fn new(data: &'a [T], m0: usize, m1: usize) -> Result<Self, WarpErrors> {
        let expected = m0
            .checked_mul(m1)
            .ok_or(WarpErrors::Generic("Field dimensions overflow usize"))?;

        if data.len() != expected {
            return Err(WarpErrors::WrongBufferSize("field", expected, data.len()));
        }
        Ok(Self { data, m0, m1 })
    }

    /// Create a view over one plane of a planar multi-channel buffer
    ///
    /// A plane is an image of `height` rows and `width` columns,
    /// so `m0 = height` and `m1 = width`.
    pub(crate) fn plane(data: &'a [T], width: usize, height: usize) -> Self {
        debug_assert_eq!(data.len(), width * height);
        Self {
            data,
            m0: height,
            m1: width
        }
    }

    /// Return `(m0, m1)`
    pub const fn dimensions(&self) -> (usize, usize) {
        (self.m0, self.m1)
    }

    /// True when the field holds no samples
    pub const fn is_empty(&self) -> bool {
        self.m0 == 0 || self.m1 == 0
    }

    /// Sample stored at `(i, j)`
    ///
    /// # Panics
    /// If `(i, j)` is outside the field
    #[inline(always)]
    pub(crate) fn at(&self, i: usize, j: usize) -> T {
        self.data[i * self.m1 + j]
    }
}
