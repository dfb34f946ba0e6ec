/*
 * Copyright (c) 2023.
 *
 * This software is free software;
 *
 * You can redistribute it or modify it under terms of the MIT, Apache License or Zlib license
 */

//! Global resampling options

/// Options that influence tile resampling and region planning
///
/// Not every option is respected by every routine, each
/// setter documents which routines read it.
#[derive(Debug, Copy, Clone)]
pub struct WarpOptions {
    /// Value written to output samples whose source position
    /// falls outside the template tile
    ///
    /// - Default value: 0.0
    /// - Respected by: `interpolate_tile`, `warp_region`
    out_of_bound_value: f64,
    /// Whether channel planes may be resampled on separate threads
    ///
    /// Only has an effect when the `threads` feature is enabled
    ///
    /// - Default value: true
    use_threads:        bool,
    /// Fraction of the deformed extent added on each side of a
    /// planned template region
    ///
    /// - Default value: 0.1
    /// - Respected by: `plan_target_region`
    region_margin:      f64
}

impl Default for WarpOptions {
    fn default() -> Self {
        Self {
            out_of_bound_value: 0.0,
            use_threads:        true,
            region_margin:      0.1
        }
    }
}

impl WarpOptions {
    /// Get the value written for samples outside the template tile
    pub const fn get_out_of_bound_value(&self) -> f64 {
        self.out_of_bound_value
    }

    /// Set the value written for samples outside the template tile
    ///
    /// For 8 bit slides, `255.0` gives a white background
    /// matching the usual glass colour.
    ///
    /// # Arguments
    ///
    /// * `value`: The sentinel value
    ///
    /// returns: WarpOptions
    pub fn set_out_of_bound_value(mut self, value: f64) -> Self {
        self.out_of_bound_value = value;
        self
    }

    /// Return true if channel planes may be processed on
    /// separate threads
    pub const fn get_use_threads(&self) -> bool {
        self.use_threads
    }

    /// Allow or forbid multithreaded resampling
    ///
    /// Output is identical either way, this is mainly useful
    /// for debugging or when the caller already parallelizes
    /// over tiles.
    pub fn set_use_threads(mut self, yes: bool) -> Self {
        self.use_threads = yes;
        self
    }

    /// Get the margin added around planned template regions
    pub const fn get_region_margin(&self) -> f64 {
        self.region_margin
    }

    /// Set the margin added on each side of planned template regions,
    /// as a fraction of the deformed extent
    ///
    /// Negative values are clamped to zero.
    pub fn set_region_margin(mut self, margin: f64) -> Self {
        self.region_margin = margin.max(0.0);
        self
    }
}

#[cfg(test)]
mod tests {
    use crate::options::WarpOptions;

    #[test]
    fn defaults_match_plugin_behaviour() {
        let options = WarpOptions::default();
        assert_eq!(options.get_out_of_bound_value(), 0.0);
        assert!(options.get_use_threads());
        assert_eq!(options.get_region_margin(), 0.1);
    }

    #[test]
    fn setters_chain() {
        let options = WarpOptions::default()
            .set_out_of_bound_value(255.0)
            .set_use_threads(false)
            .set_region_margin(-1.0);

        assert_eq!(options.get_out_of_bound_value(), 255.0);
        assert!(!options.get_use_threads());
        assert_eq!(options.get_region_margin(), 0.0);
    }
}
