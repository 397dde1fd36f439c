//! Chamber controller binary for the Raspberry Pi.
//!
//! Wires the real adapters (1-Wire probes, GPIO relays, console, JSON
//! setpoint store, CSV telemetry) to the control session and runs the
//! operator menu loop.
//!
//! Data lives under `$FERMCTL_DATA` (default `/var/lib/fermctl`):
//! `config.json` (optional overrides), `setpoints.json`, `logs/`.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use log::{info, warn};

use fermctl::adapters::clock::SystemClock;
use fermctl::adapters::gpio::{ActuatorPins, ConsoleOperator, GpioActuators, MenuChoice};
use fermctl::adapters::store::JsonSetpointStore;
use fermctl::adapters::telemetry::CsvTelemetrySink;
use fermctl::adapters::w1::W1Probes;
use fermctl::app::ports::TelemetrySink;
use fermctl::app::{CalibrationOutcome, ControlSession, ExitReason};
use fermctl::config::ChamberConfig;

fn data_dir() -> PathBuf {
    std::env::var_os("FERMCTL_DATA")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("/var/lib/fermctl"))
}

fn load_config(dir: &Path) -> ChamberConfig {
    let path = dir.join("config.json");
    match fs::read_to_string(&path) {
        Ok(contents) => match serde_json::from_str(&contents) {
            Ok(config) => {
                info!("loaded config from {}", path.display());
                config
            }
            Err(e) => {
                warn!("config at {} is invalid ({e}), using defaults", path.display());
                ChamberConfig::default()
            }
        },
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => ChamberConfig::default(),
        Err(e) => {
            warn!("config at {} unreadable ({e}), using defaults", path.display());
            ChamberConfig::default()
        }
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let dir = data_dir();
    fs::create_dir_all(&dir).with_context(|| format!("creating {}", dir.display()))?;
    let log_dir = dir.join("logs");
    fs::create_dir_all(&log_dir).with_context(|| format!("creating {}", log_dir.display()))?;

    let config = load_config(&dir);

    let mut probes = W1Probes::new(config.probes.clone());
    let mut hw = GpioActuators::new(ActuatorPins::default()).context("initialising GPIO")?;
    let clock = SystemClock;
    let mut operator = ConsoleOperator::new();
    let mut store = JsonSetpointStore::new(dir.join("setpoints.json"));
    let mut telemetry = CsvTelemetrySink::new(log_dir);

    let mut session = ControlSession::new(config);
    telemetry.mark("*** STARTUP ***");
    info!("chamber controller up, data dir {}", dir.display());

    loop {
        match operator.main_menu() {
            MenuChoice::Run(mode) => {
                let band = session.resolve_band(&store, mode);
                info!("running {mode} at {:.2}-{:.2} C", band.low, band.high);
                let reason = session.run_mode(
                    mode,
                    band,
                    &mut probes,
                    &mut hw,
                    &clock,
                    &mut operator,
                    &mut telemetry,
                );
                if reason == ExitReason::Shutdown {
                    break;
                }
            }
            MenuChoice::Calibrate(mode) => {
                info!("calibrating {mode}");
                let outcome = session.run_calibration(
                    mode,
                    &mut probes,
                    &mut hw,
                    &clock,
                    &mut operator,
                    &mut store,
                    &mut telemetry,
                );
                match outcome {
                    CalibrationOutcome::Completed(band) => {
                        println!("calibration done: hold {:.2}-{:.2} C", band.low, band.high);
                    }
                    CalibrationOutcome::NoData => {
                        println!("calibration ended without data; setpoints unchanged");
                    }
                    CalibrationOutcome::Exited(ExitReason::Shutdown) => break,
                    CalibrationOutcome::Exited(ExitReason::ChangeMode) => {}
                }
            }
            MenuChoice::Quit => break,
        }
    }

    telemetry.mark("*** SHUTDOWN ***");
    info!("shutdown");
    Ok(())
}
