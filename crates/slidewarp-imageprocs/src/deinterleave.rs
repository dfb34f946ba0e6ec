/*
 * Copyright (c) 2023.
 *
 * This software is free software;
 *
 * You can redistribute it or modify it under terms of the MIT, Apache License or Zlib license
 */

//! Convert between interleaved pixels and planar channels
//!
//! Decoded slide regions come interleaved (`RGBRGB...`) while the tile
//! resampler works on planes (`RRR...GGG...BBB...`).

/// Split interleaved samples into a planar buffer
///
/// # Panics
/// If `channels` is zero
pub fn deinterleave_channels<T: Copy + Default>(source: &[T], channels: usize) -> Vec<T> {
    let plane = source.len() / channels;
    let mut out = vec![T::default(); plane * channels];

    for (c, out_plane) in out.chunks_exact_mut(plane.max(1)).enumerate() {
        for (dst, pix) in out_plane.iter_mut().zip(source.chunks_exact(channels)) {
            *dst = pix[c];
        }
    }
    out
}

/// Merge a planar buffer back into interleaved samples
///
/// # Panics
/// If `channels` is zero
pub fn interleave_channels<T: Copy + Default>(source: &[T], channels: usize) -> Vec<T> {
    let plane = source.len() / channels;
    let mut out = vec![T::default(); plane * channels];

    for (c, in_plane) in source.chunks_exact(plane.max(1)).take(channels).enumerate() {
        for (pix, src) in out.chunks_exact_mut(channels).zip(in_plane) {
            pix[c] = *src;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use nanorand::Rng;

    use crate::deinterleave::{deinterleave_channels, interleave_channels};

    #[test]
    fn splits_rgb() {
        let rgb = [1_u8, 2, 3, 4, 5, 6];
        assert_eq!(deinterleave_channels(&rgb, 3), [1, 4, 2, 5, 3, 6]);
        assert_eq!(interleave_channels(&[1_u8, 4, 2, 5, 3, 6], 3), rgb);
    }

    #[test]
    fn restores_random_rgba() {
        let mut rng = nanorand::WyRand::new();
        let mut pixels = vec![0_u16; 37 * 4];
        rng.fill(&mut pixels);

        let planar = deinterleave_channels(&pixels, 4);
        assert_eq!(planar[37], pixels[1]);
        assert_eq!(interleave_channels(&planar, 4), pixels);
    }

    #[test]
    fn empty_input() {
        let empty: [f64; 0] = [];
        assert!(deinterleave_channels(&empty, 3).is_empty());
        assert!(interleave_channels(&empty, 3).is_empty());
    }
}
