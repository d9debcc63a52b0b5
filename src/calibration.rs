//! Dry/wet calibration of a resistive soil probe
//!
//! The probe output falls as the soil gets wetter, so the dry reference code
//! sits above the wet one and percentages are interpolated between them.

/// Raw codes measured with the probe in air (dry) and in water (wet)
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Calibration {
    /// Code at 0% moisture
    pub dry: i32,
    /// Code at 100% moisture
    pub wet: i32,
}

impl Calibration {
    /// Roughly 3V dry and 1V wet on a 5V reference
    pub const DEFAULT: Self = Self {
        dry: 0x60_0000,
        wet: 0x20_0000,
    };

    pub const fn new(dry: i32, wet: i32) -> Self {
        Self { dry, wet }
    }

    /// A usable pair has its dry code strictly above its wet code
    pub const fn is_valid(&self) -> bool {
        self.dry > self.wet
    }

    /// Moisture percentage for a raw code
    ///
    /// Codes at or beyond a reference point clamp to 0% or 100%. Values in
    /// between are interpolated linearly and rounded to one decimal, with
    /// exact halves going to the even tenth (6.25 gives 6.2).
    /// Returns `None` when the pair is not valid.
    pub fn percent(&self, raw: i32) -> Option<f64> {
        if !self.is_valid() {
            return None;
        }
        if raw >= self.dry {
            return Some(0.0);
        }
        if raw <= self.wet {
            return Some(100.0);
        }

        // tenths of a percent, kept as an exact fraction until rounding
        let span = self.dry as i64 - self.wet as i64;
        let scaled = (self.dry as i64 - raw as i64) * 1000;
        Some(round_half_even(scaled, span) as f64 / 10.0)
    }
}

impl Default for Calibration {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// `numerator / denominator` rounded to the nearest integer, ties to even.
/// Both operands are positive.
fn round_half_even(numerator: i64, denominator: i64) -> i64 {
    let quotient = numerator / denominator;
    let twice_remainder = (numerator % denominator) * 2;
    if twice_remainder > denominator || (twice_remainder == denominator && quotient % 2 == 1) {
        quotient + 1
    } else {
        quotient
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn midpoint_is_fifty_percent() {
        let cal = Calibration::new(0x60_0000, 0x20_0000);
        assert_eq!(cal.percent(0x40_0000), Some(50.0));
    }

    #[test]
    fn clamps_at_reference_points() {
        let cal = Calibration::DEFAULT;
        assert_eq!(cal.percent(cal.dry), Some(0.0));
        assert_eq!(cal.percent(cal.dry + 1), Some(0.0));
        assert_eq!(cal.percent(0x7F_FFFF), Some(0.0));
        assert_eq!(cal.percent(cal.wet), Some(100.0));
        assert_eq!(cal.percent(cal.wet - 1), Some(100.0));
        assert_eq!(cal.percent(-0x80_0000), Some(100.0));
    }

    #[test]
    fn decreases_as_raw_rises() {
        let cal = Calibration::DEFAULT;
        let mut previous = 100.0;
        let mut raw = cal.wet;
        while raw <= cal.dry {
            let percent = cal.percent(raw).unwrap();
            assert!(percent <= previous, "{} rose to {} at {}", previous, percent, raw);
            assert!((0.0..=100.0).contains(&percent));
            previous = percent;
            raw += 0x1_0000;
        }
        assert_eq!(previous, 0.0);
    }

    #[test]
    fn rounds_to_one_decimal() {
        let cal = Calibration::new(1000, 0);
        // 1/3 of the way from dry
        assert_eq!(cal.percent(667), Some(33.3));
        assert_eq!(cal.percent(666), Some(33.4));
        assert_eq!(cal.percent(999), Some(0.1));
    }

    #[test]
    fn exact_halves_round_to_even() {
        // 2^18 codes below dry is exactly 6.25%
        assert_eq!(Calibration::DEFAULT.percent(0x5C_0000), Some(6.2));

        let cal = Calibration::new(4000, 0);
        assert_eq!(cal.percent(3990), Some(0.2));
        assert_eq!(cal.percent(3970), Some(0.8));
        assert_eq!(cal.percent(3989), Some(0.3));
    }

    #[test]
    fn inverted_or_equal_pair_is_rejected() {
        assert_eq!(Calibration::new(100, 200).percent(150), None);
        assert_eq!(Calibration::new(100, 100).percent(100), None);
        assert!(!Calibration::new(5, 5).is_valid());
    }
}
