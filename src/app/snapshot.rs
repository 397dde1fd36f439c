//! Per-cycle snapshot handed to the telemetry sink.

use crate::config::{Band, Mode};
use crate::control::{ControlState, MotorCmd};
use crate::reading::Reading;

/// Everything a telemetry row needs about one control cycle.
///
/// `motor` and `fans_on` reflect the actuator state *after* the cycle's
/// decision (or the held state when no decision fired), so the log shows
/// what the hardware is actually doing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CycleSnapshot {
    pub mode: Mode,
    pub reading: Reading,
    pub band: Band,
    pub state: ControlState,
    pub motor: MotorCmd,
    pub fans_on: bool,
    /// Set during calibration runs; rows carry it so a log reader can
    /// tell a calibration hold apart from a normal run.
    pub calibrating: bool,
}
