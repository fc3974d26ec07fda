pub trait FloatExt {
    fn approximately_eq(self, other: Self) -> bool;

    /// Rounds half away from zero to `decimals` places.
    fn round_to(self, decimals: u32) -> Self;
}

impl FloatExt for f64 {
    fn approximately_eq(self, other: Self) -> bool {
        (self - other).abs() < crate::EPSILON
    }

    fn round_to(self, decimals: u32) -> Self {
        let factor = 10f64.powi(decimals as i32);
        (self * factor).round() / factor
    }
}
