use serde::{Deserialize, Serialize};

use crate::{error::CalibrationError, saturation::SaturationThreshold};

/// Calibration of one readout mode of an sCMOS camera.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReadoutModeProfile {
    /// Read noise in electrons RMS.
    #[serde(rename = "ReadNoise")]
    pub read_noise_e: f64,
    /// Photoelectrons per digital count (ADU).
    #[serde(rename = "ElectronsPerCount")]
    pub electrons_per_count: f64,
    /// Digital count corresponding to zero signal.
    #[serde(rename = "ADOffset")]
    pub ad_offset: u32,
    /// Maximum valid digital count.
    #[serde(rename = "SaturationThreshold")]
    pub saturation_threshold: SaturationThreshold,
}

impl ReadoutModeProfile {
    /// Checks that every value is finite and non-negative.
    ///
    /// # Arguments
    ///
    /// * `key` - Table key of the record, used in the error message.
    pub fn validate(&self, key: &str) -> Result<(), CalibrationError> {
        check_non_negative(key, "ReadNoise", self.read_noise_e)?;
        check_non_negative(key, "ElectronsPerCount", self.electrons_per_count)?;
        check_non_negative(
            key,
            "SaturationThreshold",
            self.saturation_threshold.counts(),
        )
    }
}

/// Calibration of an EM-CCD camera at its default gain settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GainProfile {
    /// Read noise in electrons RMS.
    #[serde(rename = "ReadNoise")]
    pub read_noise_e: f64,
    /// Photoelectrons per digital count (ADU).
    #[serde(rename = "ElectronsPerCount")]
    pub electrons_per_count: f64,
    /// Number of stages in the electron-multiplying register.
    #[serde(rename = "NGainStages")]
    pub n_gain_stages: u32,
    /// Digital count corresponding to zero signal.
    #[serde(rename = "ADOffset")]
    pub ad_offset: u32,
    /// EM gain the camera is started with.
    #[serde(rename = "DefaultEMGain")]
    pub default_em_gain: u32,
    /// Maximum valid digital count.
    #[serde(rename = "SaturationThreshold")]
    pub saturation_threshold: SaturationThreshold,
}

impl GainProfile {
    /// Checks that every value is finite and non-negative.
    ///
    /// # Arguments
    ///
    /// * `key` - Table key of the record, used in the error message.
    pub fn validate(&self, key: &str) -> Result<(), CalibrationError> {
        check_non_negative(key, "ReadNoise", self.read_noise_e)?;
        check_non_negative(key, "ElectronsPerCount", self.electrons_per_count)?;
        check_non_negative(
            key,
            "SaturationThreshold",
            self.saturation_threshold.counts(),
        )
    }
}

/// Everything registered for one EM-CCD camera.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EmccdProperties {
    /// The camera identifier.
    pub id: u32,
    /// The noise and gain calibration.
    pub gain: GainProfile,
    /// The preamp gain setting index, `None` when the camera has no entry.
    pub preamp_gain_index: Option<u32>,
}

fn check_non_negative(key: &str, field: &str, value: f64) -> Result<(), CalibrationError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(CalibrationError::InvalidProfile {
            key: key.to_string(),
            reason: format!("{field} must be finite and non-negative, got {value}"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_gain() -> GainProfile {
        GainProfile {
            read_noise_e: 61.33,
            electrons_per_count: 25.24,
            n_gain_stages: 536,
            ad_offset: 413,
            default_em_gain: 90,
            saturation_threshold: SaturationThreshold::from_bit_depth(14),
        }
    }

    #[test]
    fn validate_accepts_table_values() -> Result<(), CalibrationError> {
        sample_gain().validate("5414")?;
        let mode = ReadoutModeProfile {
            read_noise_e: 1.21,
            electrons_per_count: 0.45,
            ad_offset: 100,
            saturation_threshold: SaturationThreshold::from_counts(1776.0),
        };
        mode.validate("CSC-00425/12-bit (low noise)")?;
        Ok(())
    }

    #[test]
    fn validate_rejects_negative_and_nan() {
        let mut gain = sample_gain();
        gain.read_noise_e = -1.0;
        let err = gain.validate("5414").unwrap_err();
        assert!(matches!(err, CalibrationError::InvalidProfile { .. }));
        assert!(err.to_string().contains("ReadNoise"));

        let mut gain = sample_gain();
        gain.saturation_threshold = SaturationThreshold::from_counts(f64::INFINITY);
        assert!(gain.validate("5414").is_err());

        let mode = ReadoutModeProfile {
            read_noise_e: 1.0,
            electrons_per_count: f64::NAN,
            ad_offset: 100,
            saturation_threshold: SaturationThreshold::from_bit_depth(16),
        };
        assert!(mode.validate("x").is_err());
    }

    #[test]
    fn serde_field_names() -> Result<(), Box<dyn std::error::Error>> {
        let json = serde_json::to_value(sample_gain())?;
        assert_eq!(json["ReadNoise"], 61.33);
        assert_eq!(json["NGainStages"], 536);
        assert_eq!(json["ADOffset"], 413);
        assert_eq!(json["DefaultEMGain"], 90);
        assert_eq!(json["SaturationThreshold"], 16383);
        Ok(())
    }

    #[test]
    fn serde_rejects_missing_and_unknown_fields() {
        let missing = r#"{"ReadNoise": 1.0, "ElectronsPerCount": 0.5, "ADOffset": 100}"#;
        assert!(serde_json::from_str::<ReadoutModeProfile>(missing).is_err());

        let unknown = r#"{"ReadNoise": 1.0, "ElectronsPerCount": 0.5, "ADOffset": 100,
            "SaturationThreshold": 2047, "Gain": 3}"#;
        assert!(serde_json::from_str::<ReadoutModeProfile>(unknown).is_err());
    }
}
