/// An error type for the calibration registry.
#[derive(thiserror::Error, Debug)]
pub enum CalibrationError {
    /// No sCMOS camera is registered under the serial.
    #[error("Unknown sCMOS camera serial: {0}")]
    UnknownSerial(String),

    /// The sCMOS camera exists but has no profile for the readout mode.
    #[error("Unknown readout mode {mode:?} for sCMOS camera {serial}")]
    UnknownReadoutMode {
        /// The camera serial.
        serial: String,
        /// The requested mode label.
        mode: String,
    },

    /// No EM-CCD camera is registered under the identifier.
    #[error("Unknown EM-CCD camera identifier: {0}")]
    UnknownEmccd(u32),

    /// The EM-CCD camera has no preamp gain index registered.
    #[error("No preamp gain index registered for EM-CCD camera {0}")]
    MissingPreampGain(u32),

    /// A calibration record holds a value outside its valid range.
    #[error("Invalid calibration profile for {key}: {reason}")]
    InvalidProfile {
        /// The table key of the offending record.
        key: String,
        /// What is wrong with it.
        reason: String,
    },

    /// Error to parse or serialize a JSON calibration table.
    #[error("Failed to parse the calibration table. {0}")]
    JsonError(#[from] serde_json::Error),

    /// Error to open the table file.
    #[error("Failed to read the calibration table. {0}")]
    FileError(#[from] std::io::Error),
}

impl CalibrationError {
    /// Returns true when the error comes from a lookup of a key that is not in the registry.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            CalibrationError::UnknownSerial(_)
                | CalibrationError::UnknownReadoutMode { .. }
                | CalibrationError::UnknownEmccd(_)
                | CalibrationError::MissingPreampGain(_)
        )
    }
}
