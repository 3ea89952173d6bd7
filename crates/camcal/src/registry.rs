use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::{
    builtin,
    error::CalibrationError,
    profile::{EmccdProperties, GainProfile, ReadoutModeProfile},
    serde_utils::UniqueMap,
};

static BUILTIN: Lazy<CameraCalibrationRegistry> = Lazy::new(|| {
    CameraCalibrationRegistry::assemble(
        builtin::SCMOS_PROFILES,
        builtin::EMCCD_PROFILES,
        builtin::PREAMP_GAINS,
    )
});

/// Read-only lookup table of camera calibration constants.
///
/// sCMOS cameras are keyed by serial and readout mode label, EM-CCD cameras by an integer
/// identifier. The preamp gain index of an EM-CCD camera is registered separately and may be
/// missing for a camera that has a gain profile.
///
/// A registry is never modified after construction, so it can be shared freely across threads.
///
/// # Example
///
/// ```
/// use camcal::CameraCalibrationRegistry;
///
/// let registry = CameraCalibrationRegistry::builtin();
/// let profile = registry.scmos_profile("VSC-00954", "16-bit (low noise & high well capacity)")?;
/// assert_eq!(profile.ad_offset, 100);
/// # Ok::<(), camcal::CalibrationError>(())
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RegistryTable", into = "RegistryTable")]
pub struct CameraCalibrationRegistry {
    scmos: BTreeMap<String, BTreeMap<String, ReadoutModeProfile>>,
    emccd: BTreeMap<u32, GainProfile>,
    preamp_gains: BTreeMap<u32, u32>,
}

impl CameraCalibrationRegistry {
    /// The registry holding the tables compiled into the crate.
    ///
    /// Built on first access and shared for the rest of the process.
    pub fn builtin() -> &'static CameraCalibrationRegistry {
        &BUILTIN
    }

    /// Creates a registry from constant tables.
    ///
    /// # Arguments
    ///
    /// * `scmos` - sCMOS serials with their `(mode label, profile)` pairs.
    /// * `emccd` - EM-CCD identifiers with their gain profile.
    /// * `preamp_gains` - EM-CCD identifiers with their preamp gain index.
    ///
    /// # Errors
    ///
    /// Returns [`CalibrationError::InvalidProfile`] on a repeated key, a camera without readout
    /// modes, a preamp gain for an unknown EM-CCD, or a record failing validation.
    pub fn from_tables(
        scmos: &[(&str, &[(&str, ReadoutModeProfile)])],
        emccd: &[(u32, GainProfile)],
        preamp_gains: &[(u32, u32)],
    ) -> Result<Self, CalibrationError> {
        let registry = Self::assemble(scmos, emccd, preamp_gains);

        if registry.scmos.len() != scmos.len() {
            return Err(duplicate_key("sCMOS serial"));
        }
        for (serial, modes) in scmos {
            if registry.scmos.get(*serial).map(BTreeMap::len) != Some(modes.len()) {
                return Err(duplicate_key(&format!("readout mode of {serial}")));
            }
        }
        if registry.emccd.len() != emccd.len() {
            return Err(duplicate_key("EM-CCD identifier"));
        }
        if registry.preamp_gains.len() != preamp_gains.len() {
            return Err(duplicate_key("preamp gain identifier"));
        }

        registry.validate()?;
        Ok(registry)
    }

    fn assemble(
        scmos: &[(&str, &[(&str, ReadoutModeProfile)])],
        emccd: &[(u32, GainProfile)],
        preamp_gains: &[(u32, u32)],
    ) -> Self {
        let scmos: BTreeMap<String, BTreeMap<String, ReadoutModeProfile>> = scmos
            .iter()
            .map(|(serial, modes)| {
                let modes: BTreeMap<String, ReadoutModeProfile> = modes
                    .iter()
                    .map(|(label, profile)| (label.to_string(), *profile))
                    .collect();
                (serial.to_string(), modes)
            })
            .collect();

        let registry = Self {
            scmos,
            emccd: emccd.iter().copied().collect(),
            preamp_gains: preamp_gains.iter().copied().collect(),
        };
        log::debug!(
            "assembled calibration registry: {} sCMOS cameras, {} EM-CCD cameras",
            registry.scmos.len(),
            registry.emccd.len()
        );
        registry
    }

    /// Checks every record and the consistency between the EM-CCD tables.
    ///
    /// An EM-CCD camera without a preamp gain index is accepted. A preamp gain index without
    /// an EM-CCD camera is not.
    pub fn validate(&self) -> Result<(), CalibrationError> {
        for (serial, modes) in &self.scmos {
            if modes.is_empty() {
                return Err(CalibrationError::InvalidProfile {
                    key: serial.clone(),
                    reason: "sCMOS camera has no readout modes".to_string(),
                });
            }
            for (label, profile) in modes {
                profile.validate(&format!("{serial}/{label}"))?;
            }
        }

        for (id, profile) in &self.emccd {
            profile.validate(&id.to_string())?;
            if !self.preamp_gains.contains_key(id) {
                log::debug!("EM-CCD camera {id} has no preamp gain index");
            }
        }

        if let Some(orphan) = self
            .preamp_gains
            .keys()
            .find(|id| !self.emccd.contains_key(id))
        {
            return Err(CalibrationError::InvalidProfile {
                key: orphan.to_string(),
                reason: "preamp gain index registered for an unknown EM-CCD camera".to_string(),
            });
        }

        Ok(())
    }

    /// Returns the calibration of an sCMOS camera in the given readout mode.
    ///
    /// # Arguments
    ///
    /// * `serial` - The camera serial, e.g. `VSC-00954`.
    /// * `mode` - The readout mode label, e.g. `12-bit (low noise)`.
    ///
    /// # Errors
    ///
    /// [`CalibrationError::UnknownSerial`] or [`CalibrationError::UnknownReadoutMode`].
    pub fn scmos_profile(
        &self,
        serial: &str,
        mode: &str,
    ) -> Result<&ReadoutModeProfile, CalibrationError> {
        self.scmos_modes_of(serial)?
            .get(mode)
            .ok_or_else(|| CalibrationError::UnknownReadoutMode {
                serial: serial.to_string(),
                mode: mode.to_string(),
            })
    }

    /// Returns the readout mode labels of an sCMOS camera, in lexicographic order.
    ///
    /// # Errors
    ///
    /// [`CalibrationError::UnknownSerial`] if the camera is not registered.
    pub fn scmos_modes(&self, serial: &str) -> Result<Vec<&str>, CalibrationError> {
        Ok(self
            .scmos_modes_of(serial)?
            .keys()
            .map(String::as_str)
            .collect())
    }

    /// Returns the gain profile of an EM-CCD camera.
    ///
    /// # Errors
    ///
    /// [`CalibrationError::UnknownEmccd`] if the camera is not registered.
    pub fn emccd_profile(&self, id: u32) -> Result<&GainProfile, CalibrationError> {
        self.emccd
            .get(&id)
            .ok_or(CalibrationError::UnknownEmccd(id))
    }

    /// Returns the preamp gain setting index of an EM-CCD camera.
    ///
    /// # Errors
    ///
    /// [`CalibrationError::MissingPreampGain`] if no index is registered for `id`, whether or
    /// not the camera has a gain profile.
    pub fn preamp_gain_index(&self, id: u32) -> Result<u32, CalibrationError> {
        self.preamp_gains
            .get(&id)
            .copied()
            .ok_or(CalibrationError::MissingPreampGain(id))
    }

    /// Returns the gain profile and, if registered, the preamp gain index of an EM-CCD camera.
    pub fn emccd_properties(&self, id: u32) -> Result<EmccdProperties, CalibrationError> {
        let gain = *self.emccd_profile(id)?;
        Ok(EmccdProperties {
            id,
            gain,
            preamp_gain_index: self.preamp_gains.get(&id).copied(),
        })
    }

    /// Serials of the registered sCMOS cameras, in ascending order.
    pub fn scmos_serials(&self) -> impl Iterator<Item = &str> + '_ {
        self.scmos.keys().map(String::as_str)
    }

    /// Identifiers of the registered EM-CCD cameras, in ascending order.
    pub fn emccd_ids(&self) -> impl Iterator<Item = u32> + '_ {
        self.emccd.keys().copied()
    }

    /// Reads a registry from a JSON table.
    ///
    /// The table has an `scmos` object keyed by serial then mode label, and an `emccd` object
    /// holding `noiseProperties` and `preampGain`, both keyed by identifier.
    ///
    /// # Errors
    ///
    /// [`CalibrationError::JsonError`] on malformed JSON, repeated keys or missing fields, and
    /// [`CalibrationError::InvalidProfile`] when a record fails validation.
    pub fn from_json_str(json: &str) -> Result<Self, CalibrationError> {
        let table: RegistryTable = serde_json::from_str(json)?;
        Self::try_from(table)
    }

    /// Reads a registry from a JSON table. See [`Self::from_json_str`].
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, CalibrationError> {
        let table: RegistryTable = serde_json::from_reader(reader)?;
        Self::try_from(table)
    }

    /// Reads a registry from a JSON table file. See [`Self::from_json_str`].
    ///
    /// # Errors
    ///
    /// [`CalibrationError::FileError`] if the file cannot be opened.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, CalibrationError> {
        let path = path.as_ref();
        log::debug!("loading calibration table from {}", path.display());
        let file = File::open(path)?;
        Self::from_reader(BufReader::new(file))
    }

    /// Serializes the registry into a compact JSON table.
    pub fn to_json_string(&self) -> Result<String, CalibrationError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Serializes the registry into an indented JSON table.
    pub fn to_json_string_pretty(&self) -> Result<String, CalibrationError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    fn scmos_modes_of(
        &self,
        serial: &str,
    ) -> Result<&BTreeMap<String, ReadoutModeProfile>, CalibrationError> {
        self.scmos
            .get(serial)
            .ok_or_else(|| CalibrationError::UnknownSerial(serial.to_string()))
    }
}

fn duplicate_key(what: &str) -> CalibrationError {
    CalibrationError::InvalidProfile {
        key: what.to_string(),
        reason: "repeated key".to_string(),
    }
}

/// Wire layout of the JSON table.
#[derive(Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct RegistryTable {
    scmos: UniqueMap<String, UniqueMap<String, ReadoutModeProfile>>,
    emccd: EmccdTable,
}

#[derive(Serialize, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
struct EmccdTable {
    noise_properties: UniqueMap<u32, GainProfile>,
    #[serde(default)]
    preamp_gain: UniqueMap<u32, u32>,
}

impl TryFrom<RegistryTable> for CameraCalibrationRegistry {
    type Error = CalibrationError;

    fn try_from(table: RegistryTable) -> Result<Self, Self::Error> {
        let registry = Self {
            scmos: table
                .scmos
                .0
                .into_iter()
                .map(|(serial, modes)| (serial, modes.0))
                .collect(),
            emccd: table.emccd.noise_properties.0,
            preamp_gains: table.emccd.preamp_gain.0,
        };
        registry.validate()?;
        log::debug!(
            "loaded calibration table: {} sCMOS cameras, {} EM-CCD cameras",
            registry.scmos.len(),
            registry.emccd.len()
        );
        Ok(registry)
    }
}

impl From<CameraCalibrationRegistry> for RegistryTable {
    fn from(registry: CameraCalibrationRegistry) -> Self {
        Self {
            scmos: UniqueMap(
                registry
                    .scmos
                    .into_iter()
                    .map(|(serial, modes)| (serial, UniqueMap(modes)))
                    .collect(),
            ),
            emccd: EmccdTable {
                noise_properties: UniqueMap(registry.emccd),
                preamp_gain: UniqueMap(registry.preamp_gains),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::saturation::SaturationThreshold;

    const PROFILE: ReadoutModeProfile = ReadoutModeProfile {
        read_noise_e: 1.0,
        electrons_per_count: 0.5,
        ad_offset: 100,
        saturation_threshold: SaturationThreshold::from_bit_depth(11),
    };

    const GAIN: GainProfile = GainProfile {
        read_noise_e: 80.0,
        electrons_per_count: 5.0,
        n_gain_stages: 536,
        ad_offset: 200,
        default_em_gain: 90,
        saturation_threshold: SaturationThreshold::from_bit_depth(16),
    };

    #[test]
    fn from_tables_small() -> Result<(), CalibrationError> {
        let registry = CameraCalibrationRegistry::from_tables(
            &[("CAM-1", &[("a", PROFILE), ("b", PROFILE)])],
            &[(1, GAIN), (2, GAIN)],
            &[(1, 4)],
        )?;
        assert_eq!(registry.scmos_modes("CAM-1")?, vec!["a", "b"]);
        assert_eq!(registry.preamp_gain_index(1)?, 4);
        assert!(matches!(
            registry.preamp_gain_index(2),
            Err(CalibrationError::MissingPreampGain(2))
        ));
        assert_eq!(registry.emccd_ids().collect::<Vec<_>>(), vec![1, 2]);
        Ok(())
    }

    #[test]
    fn from_tables_rejects_repeated_keys() {
        let res = CameraCalibrationRegistry::from_tables(
            &[("CAM-1", &[("a", PROFILE)]), ("CAM-1", &[("b", PROFILE)])],
            &[],
            &[],
        );
        assert!(matches!(res, Err(CalibrationError::InvalidProfile { .. })));

        let res = CameraCalibrationRegistry::from_tables(
            &[("CAM-1", &[("a", PROFILE), ("a", PROFILE)])],
            &[],
            &[],
        );
        assert!(res.is_err());

        let res = CameraCalibrationRegistry::from_tables(&[], &[(1, GAIN), (1, GAIN)], &[]);
        assert!(res.is_err());
    }

    #[test]
    fn from_tables_rejects_orphan_preamp_gain() {
        let res = CameraCalibrationRegistry::from_tables(&[], &[(1, GAIN)], &[(2, 0)]);
        let err = res.unwrap_err();
        assert!(err.to_string().contains("unknown EM-CCD camera"));
    }

    #[test]
    fn from_tables_rejects_camera_without_modes() {
        let res = CameraCalibrationRegistry::from_tables(&[("CAM-1", &[])], &[], &[]);
        assert!(matches!(res, Err(CalibrationError::InvalidProfile { .. })));
    }

    #[test]
    fn unknown_mode_of_known_camera() -> Result<(), CalibrationError> {
        let registry =
            CameraCalibrationRegistry::from_tables(&[("CAM-1", &[("a", PROFILE)])], &[], &[])?;
        let err = registry.scmos_profile("CAM-1", "z").unwrap_err();
        assert!(matches!(
            err,
            CalibrationError::UnknownReadoutMode { ref serial, ref mode } if serial == "CAM-1" && mode == "z"
        ));
        assert!(err.is_not_found());
        Ok(())
    }

    #[test]
    fn emccd_properties_without_preamp() -> Result<(), CalibrationError> {
        let registry = CameraCalibrationRegistry::from_tables(&[], &[(1, GAIN)], &[])?;
        let props = registry.emccd_properties(1)?;
        assert_eq!(props.gain, GAIN);
        assert_eq!(props.preamp_gain_index, None);
        assert!(registry.emccd_properties(9).unwrap_err().is_not_found());
        Ok(())
    }

    #[test]
    fn empty_registry() {
        let registry = CameraCalibrationRegistry::default();
        assert_eq!(registry.scmos_serials().count(), 0);
        assert_eq!(registry.emccd_ids().count(), 0);
        assert!(registry.scmos_modes("CAM-1").unwrap_err().is_not_found());
    }
}
