/*
 * Copyright (c) 2023.
 *
 * This software is free software;
 *
 * You can redistribute it or modify it under terms of the MIT, Apache License or Zlib license
 */

//! Core routines shared by the slidewarp crates
//!
//! This crate provides the small set of pieces every slidewarp
//! crate needs but which are not image processing routines themselves.
//!
//! It currently contains
//!
//! - A logging facade that forwards to the [`log`](https://docs.rs/log) crate
//!   when the `log` feature is enabled and compiles to nothing otherwise
//! - Options that influence how tiles and regions are resampled
//!
//! # Features
//!  - `log`: Forward the logging macros to the `log` crate.
//!
#![macro_use]

#[cfg(feature = "log")]
pub use log;

#[cfg(not(feature = "log"))]
pub mod log;

pub mod options;
