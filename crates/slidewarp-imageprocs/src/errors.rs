/*
 * Copyright (c) 2023.
 *
 * This software is free software;
 *
 * You can redistribute it or modify it under terms of the MIT, Apache License or Zlib license
 */

use core::fmt::{Debug, Display, Formatter};

/// Errors raised while resampling tiles and regions
pub enum WarpErrors {
    /// A buffer does not have the length its declared
    /// dimensions imply
    ///
    /// Contains the buffer name, expected and found lengths
    WrongBufferSize(&'static str, usize, usize),
    /// A tile or field was declared with a zero dimension
    ZeroDimensions(&'static str),
    /// Zero channels were requested
    ZeroChannels,
    /// A matrix that must be inverted is singular
    NonInvertibleMatrix(&'static str),
    /// A raw blob cannot be decoded into the requested shape
    ///
    /// Contains the blob name, expected and found byte lengths
    WrongBlobLength(&'static str, usize, usize),
    /// Generic message
    Generic(&'static str)
}

impl Debug for WarpErrors {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        match self {
            WarpErrors::WrongBufferSize(name, expected, found) => {
                writeln!(
                    f,
                    "Buffer {name} has length {found} but its dimensions require {expected}"
                )
            }
            WarpErrors::ZeroDimensions(name) => {
                writeln!(f, "{name} has a zero dimension")
            }
            WarpErrors::ZeroChannels => {
                writeln!(f, "At least one channel is required")
            }
            WarpErrors::NonInvertibleMatrix(name) => {
                writeln!(f, "Matrix {name} is singular and cannot be inverted")
            }
            WarpErrors::WrongBlobLength(name, expected, found) => {
                writeln!(
                    f,
                    "Blob {name} has {found} bytes, expected {expected} bytes"
                )
            }
            WarpErrors::Generic(error) => {
                writeln!(f, "{error}")
            }
        }
    }
}

impl Display for WarpErrors {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        writeln!(f, "{:?}", self)
    }
}

impl std::error::Error for WarpErrors {}

impl From<&'static str> for WarpErrors {
    fn from(value: &'static str) -> Self {
        WarpErrors::Generic(value)
    }
}
