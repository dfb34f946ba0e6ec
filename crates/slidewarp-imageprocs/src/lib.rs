/*
 * Copyright (c) 2023.
 *
 * This software is free software;
 *
 * You can redistribute it or modify it under terms of the MIT, Apache License or Zlib license
 */

//! Deformation field resampling for whole slide images
//!
//! This crate warps tiles of a template slide into the pixel grid of a
//! reference slide, given the dense deformation field produced by a
//! registration step.
//!
//! It provides
//! - [`interpolate::linear_interp_point_2d`]: bilinear sampling of a 2D field
//!   with an explicit out of bound sentinel
//! - [`tile::interpolate_tile`]: the multi-channel tile resampler
//! - [`world::WorldMatrix`] and [`deformation::DeformationField`]: the
//!   coordinate mappings the resampler composes
//! - [`region`]: planning which template area a region needs and warping
//!   interleaved images
//!
//! # Example
//! - Warp a planar tile through a deformation that moves everything by one pixel
//! ```
//! use slidewarp_core::options::WarpOptions;
//! use slidewarp_imageprocs::deformation::DeformationField;
//! use slidewarp_imageprocs::tile::{interpolate_tile, TileRegion, TileTransforms};
//! use slidewarp_imageprocs::world::WorldMatrix;
//!
//! let in_tile = TileRegion::new(0, 0, 16, 16);
//! let out_tile = TileRegion::new(2, 2, 8, 8);
//! let input: Vec<f64> = (0..16 * 16).map(f64::from).collect();
//! let mut output = vec![0.0; 8 * 8];
//!
//! let deformation = DeformationField::constant(1.0, 0.0, 32, 32, WorldMatrix::identity()).unwrap();
//! let transforms = TileTransforms::new(WorldMatrix::identity(), WorldMatrix::identity());
//!
//! interpolate_tile(
//!     &input, &mut output, in_tile, out_tile, 1, &transforms, &deformation,
//!     &WarpOptions::default()
//! )
//! .unwrap();
//! // output (0,0) is reference pixel (2,2), read from template pixel (3,2)
//! assert_eq!(output[0], input[2 * 16 + 3]);
//! ```
#![warn(
    clippy::correctness,
    clippy::perf,
    clippy::pedantic,
    clippy::inline_always,
    clippy::missing_errors_doc,
    clippy::panic
)]
#![allow(
    clippy::needless_return,
    clippy::similar_names,
    clippy::inline_always,
    clippy::doc_markdown,
    clippy::module_name_repetitions,
    clippy::missing_panics_doc,
    clippy::wildcard_imports,
    clippy::too_many_arguments,
    clippy::float_cmp
)]

pub mod deformation;
pub mod deinterleave;
pub mod errors;
pub mod field;
pub mod interpolate;
pub mod region;
pub mod tile;
pub mod traits;
pub mod world;
