use crate::{
    profile::{GainProfile, ReadoutModeProfile},
    saturation::SaturationThreshold,
};

/// Readout mode label of the 12-bit low noise amplifier.
pub const MODE_12BIT_LOW_NOISE: &str = "12-bit (low noise)";
/// Readout mode label of the 12-bit high well capacity amplifier.
pub const MODE_12BIT_HIGH_WELL: &str = "12-bit (high well capacity)";
/// Readout mode label of the combined 16-bit mode.
pub const MODE_16BIT_LOW_NOISE_HIGH_WELL: &str = "16-bit (low noise & high well capacity)";
/// Readout mode label of the 16-bit mode of the Sona camera.
pub const MODE_16BIT_HIGH_DYNAMIC_RANGE: &str = "16-bit (high dynamic range)";

// the 12-bit modes clip at 11 bits
const SAT_12BIT_MODE: SaturationThreshold = SaturationThreshold::from_bit_depth(11);
const SAT_16BIT_MODE: SaturationThreshold = SaturationThreshold::from_bit_depth(16);

const fn mode(
    read_noise_e: f64,
    electrons_per_count: f64,
    ad_offset: u32,
    saturation_threshold: SaturationThreshold,
) -> ReadoutModeProfile {
    ReadoutModeProfile {
        read_noise_e,
        electrons_per_count,
        ad_offset,
        saturation_threshold,
    }
}

/// sCMOS cameras by serial, each with its readout modes.
#[rustfmt::skip]
pub const SCMOS_PROFILES: &[(&str, &[(&str, ReadoutModeProfile)])] = &[
    ("VSC-00954", &[
        (MODE_12BIT_LOW_NOISE, mode(1.1, 0.28, 100, SAT_12BIT_MODE)),
        (MODE_12BIT_HIGH_WELL, mode(5.96, 6.97, 100, SAT_12BIT_MODE)),
        (MODE_16BIT_LOW_NOISE_HIGH_WELL, mode(1.33, 0.5, 100, SAT_16BIT_MODE)),
    ]),
    // Sona
    ("CSC-00425", &[
        (MODE_12BIT_LOW_NOISE, mode(1.21, 0.45, 100, SaturationThreshold::from_counts(1776.0))),
        (MODE_16BIT_HIGH_DYNAMIC_RANGE, mode(1.84, 1.08, 100, SaturationThreshold::from_counts(44185.0))),
    ]),
    ("VSC-02858", &[
        (MODE_12BIT_LOW_NOISE, mode(1.19, 0.3, 100, SAT_12BIT_MODE)),
        (MODE_12BIT_HIGH_WELL, mode(6.18, 7.2, 100, SAT_12BIT_MODE)),
        (MODE_16BIT_LOW_NOISE_HIGH_WELL, mode(1.42, 0.5, 100, SAT_16BIT_MODE)),
    ]),
    ("VSC-02698", &[
        (MODE_12BIT_LOW_NOISE, mode(1.16, 0.26, 100, SAT_12BIT_MODE)),
        (MODE_12BIT_HIGH_WELL, mode(6.64, 7.38, 100, SAT_12BIT_MODE)),
        (MODE_16BIT_LOW_NOISE_HIGH_WELL, mode(1.36, 0.49, 100, SAT_16BIT_MODE)),
    ]),
];

/// EM-CCD cameras by identifier.
pub const EMCCD_PROFILES: &[(u32, GainProfile)] = &[
    (
        1823,
        GainProfile {
            read_noise_e: 109.8,
            electrons_per_count: 27.32,
            n_gain_stages: 536,
            ad_offset: 971,
            default_em_gain: 150,
            saturation_threshold: SaturationThreshold::from_bit_depth(14),
        },
    ),
    (
        5414,
        GainProfile {
            read_noise_e: 61.33,
            electrons_per_count: 25.24,
            n_gain_stages: 536,
            ad_offset: 413,
            default_em_gain: 90,
            saturation_threshold: SaturationThreshold::from_bit_depth(14),
        },
    ),
    // measured at gain setting 3
    (
        7863,
        GainProfile {
            read_noise_e: 88.1,
            electrons_per_count: 4.99,
            n_gain_stages: 536,
            ad_offset: 203,
            default_em_gain: 90,
            saturation_threshold: SaturationThreshold::from_counts(54000.0),
        },
    ),
    // most sensitive preamp setting, 17 MHz horizontal shift speed, 16-bit data.
    // ADOffset measured at EM gain 85.
    (
        7546,
        GainProfile {
            read_noise_e: 85.23,
            electrons_per_count: 4.82,
            n_gain_stages: 536,
            ad_offset: 150,
            default_em_gain: 85,
            saturation_threshold: SaturationThreshold::from_bit_depth(16),
        },
    ),
];

/// Preamp gain setting index by EM-CCD identifier. 7546 has no entry.
pub const PREAMP_GAINS: &[(u32, u32)] = &[(1823, 0), (5414, 0), (7863, 2)];
