//! Port traits — the boundary between the control domain and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ ControlSession (domain)
//! ```
//!
//! Driven adapters (1-Wire probes, GPIO actuators, the setpoint file, the
//! CSV log, buttons) implement these traits. The
//! [`ControlSession`](super::session::ControlSession) consumes them via
//! generics, so the domain core never touches hardware directly and the
//! whole session runs against mocks in tests.

use std::time::{Duration, Instant};

use crate::calibration::CalibrationResult;
use crate::config::{Band, Mode};
use crate::error::{ProbeError, StoreError};
use crate::reading::{ProbeId, Reading};

// ───────────────────────────────────────────────────────────────
// Probe port (driven adapter: hardware → domain)
// ───────────────────────────────────────────────────────────────

/// Read-side port: the domain calls this once per cycle for a snapshot.
pub trait ProbePort {
    /// Read all three probes. Individual failures surface as `None`
    /// slots in the [`Reading`]; the port reports them via
    /// [`ProbePort::take_faults`] so they can be logged once per cycle.
    fn read_all(&mut self) -> Reading;

    /// Drain the probe failures seen during the last `read_all`.
    fn take_faults(&mut self) -> Vec<(ProbeId, ProbeError)>;
}

// ───────────────────────────────────────────────────────────────
// Actuator port (driven adapter: domain → hardware)
// ───────────────────────────────────────────────────────────────

/// Write-side port: motor H-bridge and fan PWM.
///
/// The session is the *only* writer. Implementations apply each call
/// immediately and must make `all_off` unconditionally safe.
pub trait ActuatorPort {
    /// Drive the motor at full power. `forward = false` reverses polarity.
    fn motor_on(&mut self, forward: bool);

    /// Stop the motor, leaving the polarity relays in forward position.
    fn motor_off(&mut self);

    /// Switch the fans on at `speed` duty (0.0–1.0) or off.
    fn set_fans(&mut self, on: bool, speed: f32);

    /// Kill motor and fans — safe shutdown.
    fn all_off(&mut self);
}

// ───────────────────────────────────────────────────────────────
// Clock port
// ───────────────────────────────────────────────────────────────

/// Time source and sleeper, mockable for deterministic session tests.
pub trait Clock {
    fn now(&self) -> Instant;
    fn sleep(&self, d: Duration);
}

// ───────────────────────────────────────────────────────────────
// Operator port (driven adapter: buttons / console → domain)
// ───────────────────────────────────────────────────────────────

/// Edge-triggered operator input, one event per press.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperatorEvent {
    /// Confirm button: finishes a calibration window early. Ignored in
    /// normal runs.
    Confirm,
    /// Pause request: the session stops actuators and asks the operator
    /// what to do next via [`OperatorPort::resolve_pause`].
    Pause,
}

/// What the operator chose at a pause prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PauseChoice {
    /// Continue the interrupted run where it left off.
    Resume,
    /// Leave the run and return to mode selection.
    ChangeMode,
    /// Shut the controller down.
    Shutdown,
}

pub trait OperatorPort {
    /// Non-blocking poll, called on every fine sub-poll step.
    fn poll(&mut self) -> Option<OperatorEvent>;

    /// Blocking prompt shown after a pause. Actuators are already safe
    /// when this is called, so it may take as long as the operator needs.
    fn resolve_pause(&mut self) -> PauseChoice;
}

// ───────────────────────────────────────────────────────────────
// Setpoint store (driven adapter: domain ↔ persisted bands)
// ───────────────────────────────────────────────────────────────

/// Persists calibrated bands per mode.
///
/// `load` failures must not be fatal — callers fall back to the mode's
/// built-in default band. `save` must be atomic: a crash mid-write may
/// lose the update but never corrupt the previously stored bands.
pub trait SetpointStore {
    /// The stored band for `mode`, or `None` if never calibrated.
    fn load(&self, mode: Mode) -> Result<Option<Band>, StoreError>;

    /// Persist the band for `mode`, replacing any previous value.
    fn save(&mut self, mode: Mode, band: Band) -> Result<(), StoreError>;
}

// ───────────────────────────────────────────────────────────────
// Telemetry sink (driven adapter: domain → CSV log)
// ───────────────────────────────────────────────────────────────

/// Receives one row per control cycle plus lifecycle markers.
///
/// Sink failures are logged and swallowed — telemetry never stops the
/// control cadence.
pub trait TelemetrySink {
    /// Append one cycle row.
    fn record(&mut self, snapshot: &super::snapshot::CycleSnapshot);

    /// Append a lifecycle marker row (startup, shutdown, pause, ...).
    fn mark(&mut self, marker: &str);

    /// Write the human-readable report for a completed calibration.
    fn calibration_report(&mut self, mode: Mode, result: &CalibrationResult);
}
