#![deny(missing_docs)]
#![doc = env!("CARGO_PKG_DESCRIPTION")]

/// Error types for calibration lookups and table loading.
///
/// Defines [`CalibrationError`](error::CalibrationError) with the not-found family
/// returned by every lookup and the failures of loading a JSON table.
pub mod error;

/// Saturation threshold type shared by the sCMOS and EM-CCD records.
pub mod saturation;

/// Calibration records for sCMOS readout modes and EM-CCD gain settings.
pub mod profile;

/// The calibration registry and its read-only lookups.
///
/// See [`CameraCalibrationRegistry::builtin`] for the tables compiled into the crate.
pub mod registry;

/// Built-in calibration tables transcribed from the camera characterization sheets.
pub mod builtin;

/// Serde helpers for the JSON table format.
mod serde_utils;

pub use crate::error::CalibrationError;
pub use crate::profile::{EmccdProperties, GainProfile, ReadoutModeProfile};
pub use crate::registry::CameraCalibrationRegistry;
pub use crate::saturation::SaturationThreshold;
