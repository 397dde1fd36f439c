//! Application core — pure domain logic, zero I/O.
//!
//! The session orchestrates the control cadence for one chamber:
//! thermostat decisions, the fan cooldown, calibration windows, and
//! operator pause flow. All interaction with hardware happens through
//! **port traits** defined in [`ports`], keeping this layer fully
//! testable without real peripherals.

pub mod ports;
pub mod session;
pub mod snapshot;

pub use session::{CalibrationOutcome, ControlSession, ExitReason};
