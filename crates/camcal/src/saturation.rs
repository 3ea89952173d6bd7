use serde::{Deserialize, Serialize};

/// Largest integer count an `f64` represents exactly.
const MAX_EXACT_COUNT: f64 = 9_007_199_254_740_992.0; // 2^53

/// Maximum valid digital count of a pixel before it saturates.
///
/// Thresholds come from two sources: the bit depth of the ADC (`2^n - 1`) and
/// measured full-well values such as 54000 or 44185. Both are stored as an `f64`,
/// which holds every value of either kind exactly.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct SaturationThreshold(f64);

impl SaturationThreshold {
    /// Creates a threshold from a measured count.
    pub const fn from_counts(counts: f64) -> Self {
        Self(counts)
    }

    /// Creates the threshold of an ADC with `bits` bits, i.e. `2^bits - 1`.
    ///
    /// # Panics
    ///
    /// Panics if `bits` is zero or larger than 53, evaluated at compile time when used in a constant.
    pub const fn from_bit_depth(bits: u8) -> Self {
        assert!(bits > 0 && bits <= 53, "bit depth must be in 1..=53");
        Self(((1u64 << bits) - 1) as f64)
    }

    /// The threshold in digital counts.
    pub fn counts(&self) -> f64 {
        self.0
    }

    /// The threshold as an integer count, if it is a non-negative whole number.
    pub fn as_integer(&self) -> Option<u64> {
        let v = self.0;
        if v.is_finite() && v >= 0.0 && v.fract() == 0.0 && v <= MAX_EXACT_COUNT {
            Some(v as u64)
        } else {
            None
        }
    }

    /// The ADC bit depth `n` if the threshold is exactly `2^n - 1`.
    pub fn bit_depth(&self) -> Option<u8> {
        let counts = self.as_integer()?;
        let full = counts.checked_add(1)?;
        if full.is_power_of_two() && full > 1 {
            Some(full.trailing_zeros() as u8)
        } else {
            None
        }
    }
}

impl From<f64> for SaturationThreshold {
    fn from(counts: f64) -> Self {
        Self(counts)
    }
}

impl std::fmt::Display for SaturationThreshold {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.as_integer() {
            Some(counts) => write!(f, "{counts}"),
            None => write!(f, "{}", self.0),
        }
    }
}

// integral thresholds go on the wire as integers, the way the tables are written
impl Serialize for SaturationThreshold {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        match self.as_integer() {
            Some(counts) => serializer.serialize_u64(counts),
            None => serializer.serialize_f64(self.0),
        }
    }
}

impl<'de> Deserialize<'de> for SaturationThreshold {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        f64::deserialize(deserializer).map(Self)
    }
}

#[cfg(test)]
mod tests {
    use super::SaturationThreshold;

    #[test]
    fn from_bit_depth() {
        assert_eq!(SaturationThreshold::from_bit_depth(11).counts(), 2047.0);
        assert_eq!(SaturationThreshold::from_bit_depth(14).counts(), 16383.0);
        assert_eq!(SaturationThreshold::from_bit_depth(16).counts(), 65535.0);
    }

    #[test]
    fn bit_depth_recovered() {
        assert_eq!(SaturationThreshold::from_bit_depth(16).bit_depth(), Some(16));
        assert_eq!(SaturationThreshold::from_counts(54000.0).bit_depth(), None);
        assert_eq!(SaturationThreshold::from_counts(0.0).bit_depth(), None);
    }

    #[test]
    fn as_integer() {
        assert_eq!(SaturationThreshold::from_counts(5.4e4).as_integer(), Some(54000));
        assert_eq!(SaturationThreshold::from_counts(1776.5).as_integer(), None);
        assert_eq!(SaturationThreshold::from_counts(-1.0).as_integer(), None);
        assert_eq!(SaturationThreshold::from_counts(f64::NAN).as_integer(), None);
    }

    #[test]
    fn serde_integral_as_integer() -> Result<(), Box<dyn std::error::Error>> {
        let measured = SaturationThreshold::from_counts(5.4e4);
        assert_eq!(serde_json::to_string(&measured)?, "54000");

        let fractional = SaturationThreshold::from_counts(1776.5);
        assert_eq!(serde_json::to_string(&fractional)?, "1776.5");

        let parsed: SaturationThreshold = serde_json::from_str("65535")?;
        assert_eq!(parsed, SaturationThreshold::from_bit_depth(16));
        let parsed: SaturationThreshold = serde_json::from_str("54000.0")?;
        assert_eq!(parsed.as_integer(), Some(54000));
        Ok(())
    }

    #[test]
    fn display() {
        assert_eq!(SaturationThreshold::from_bit_depth(11).to_string(), "2047");
        assert_eq!(SaturationThreshold::from_counts(0.25).to_string(), "0.25");
    }
}
