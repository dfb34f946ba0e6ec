/// Numeric operations needed by the resampling kernels
///
/// Interpolation is always carried out in `f64`, these
/// convert samples in and out of that representation.
pub trait NumOps<T> {
    fn to_f64(self) -> f64;
    /// Convert back from `f64`
    ///
    /// Integer types round to nearest and saturate at their range.
    fn from_f64(value: f64) -> T;
}

macro_rules! numops_for_int {
    ($int:tt) => {
        impl NumOps<$int> for $int {
            #[inline(always)]
            fn to_f64(self) -> f64 {
                f64::from(self)
            }

            #[inline(always)]
            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
            fn from_f64(value: f64) -> $int {
                // `as` saturates and maps NaN to zero
                value.round() as $int
            }
        }
    };
}

numops_for_int!(u8);
numops_for_int!(u16);

impl NumOps<f32> for f32 {
    #[inline(always)]
    fn to_f64(self) -> f64 {
        f64::from(self)
    }

    #[inline(always)]
    #[allow(clippy::cast_possible_truncation)]
    fn from_f64(value: f64) -> f32 {
        value as f32
    }
}

impl NumOps<f64> for f64 {
    #[inline(always)]
    fn to_f64(self) -> f64 {
        self
    }

    #[inline(always)]
    fn from_f64(value: f64) -> f64 {
        value
    }
}

#[cfg(test)]
mod tests {
    use crate::traits::NumOps;

    #[test]
    fn integer_conversion_rounds_and_saturates() {
        assert_eq!(u8::from_f64(254.6), 255);
        assert_eq!(u8::from_f64(300.0), 255);
        assert_eq!(u8::from_f64(-4.0), 0);
        assert_eq!(u16::from_f64(1000.49), 1000);
        assert_eq!(u8::from_f64(f64::NAN), 0);
    }

    #[test]
    fn float_conversion_is_lossless_for_f64() {
        assert_eq!(f64::from_f64(0.125), 0.125);
        assert_eq!(0.25_f32.to_f64(), 0.25);
    }
}
