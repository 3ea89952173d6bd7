use argh::FromArgs;
use std::path::PathBuf;

use camcal::{CameraCalibrationRegistry, EmccdProperties, ReadoutModeProfile};

/// Query camera calibration constants
#[derive(Debug, FromArgs)]
struct Args {
    /// path to a JSON calibration table, the built-in tables are used otherwise
    #[argh(option, short = 't')]
    table: Option<PathBuf>,

    /// sCMOS camera serial
    #[argh(option, short = 's')]
    serial: Option<String>,

    /// sCMOS readout mode label, requires --serial
    #[argh(option, short = 'm')]
    mode: Option<String>,

    /// EM-CCD camera identifier
    #[argh(option, short = 'e')]
    emccd: Option<u32>,

    /// print the whole registry as JSON
    #[argh(switch, short = 'd')]
    dump: bool,
}

fn print_mode(serial: &str, mode: &str, profile: &ReadoutModeProfile) {
    println!(
        "{serial} [{mode}] read noise: {} e-, e-/count: {}, offset: {}, saturation: {}",
        profile.read_noise_e,
        profile.electrons_per_count,
        profile.ad_offset,
        profile.saturation_threshold
    );
}

fn print_emccd(props: &EmccdProperties) {
    let preamp = props
        .preamp_gain_index
        .map_or_else(|| "n/a".to_string(), |index| index.to_string());
    println!(
        "{} read noise: {} e-, e-/count: {}, gain stages: {}, offset: {}, default EM gain: {}, saturation: {}, preamp gain: {}",
        props.id,
        props.gain.read_noise_e,
        props.gain.electrons_per_count,
        props.gain.n_gain_stages,
        props.gain.ad_offset,
        props.gain.default_em_gain,
        props.gain.saturation_threshold,
        preamp
    );
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let args: Args = argh::from_env();

    let loaded;
    let registry = match &args.table {
        Some(path) => {
            log::info!("using calibration table {}", path.display());
            loaded = CameraCalibrationRegistry::from_path(path)?;
            &loaded
        }
        None => CameraCalibrationRegistry::builtin(),
    };

    if args.dump {
        println!("{}", registry.to_json_string_pretty()?);
        return Ok(());
    }

    if args.mode.is_some() && args.serial.is_none() {
        return Err("--mode requires --serial".into());
    }

    let mut queried = false;

    if let Some(serial) = &args.serial {
        queried = true;
        match &args.mode {
            Some(mode) => print_mode(serial, mode, registry.scmos_profile(serial, mode)?),
            None => {
                for mode in registry.scmos_modes(serial)? {
                    print_mode(serial, mode, registry.scmos_profile(serial, mode)?);
                }
            }
        }
    }

    if let Some(id) = args.emccd {
        queried = true;
        print_emccd(&registry.emccd_properties(id)?);
    }

    if !queried {
        println!("sCMOS cameras:");
        for serial in registry.scmos_serials() {
            println!("  {serial}: {}", registry.scmos_modes(serial)?.join(", "));
        }
        println!("EM-CCD cameras:");
        for id in registry.emccd_ids() {
            print_emccd(&registry.emccd_properties(id)?);
        }
    }

    Ok(())
}
