//! Error types for the chamber controller.
//!
//! One enum per failure family. Probe failures are absorbed within the
//! cycle that saw them, calibration failures abort only the save/apply
//! step, and store failures downgrade to defaults — none of them may
//! terminate the control cadence.

use core::fmt;

// ---------------------------------------------------------------------------
// Probe errors
// ---------------------------------------------------------------------------

/// A single probe read failed. Non-fatal: the reading is treated as
/// unavailable and excluded from aggregates for that cycle.
#[derive(Debug)]
pub enum ProbeError {
    /// The 1-Wire device file could not be opened or read.
    Io(std::io::Error),
    /// The sensor reported a failed CRC (no `YES` in the status line).
    CrcFailed,
    /// The device file did not contain a parsable `t=` field.
    Malformed,
}

impl fmt::Display for ProbeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "probe I/O: {e}"),
            Self::CrcFailed => write!(f, "probe CRC check failed"),
            Self::Malformed => write!(f, "probe output malformed"),
        }
    }
}

impl std::error::Error for ProbeError {}

impl From<std::io::Error> for ProbeError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

// ---------------------------------------------------------------------------
// Calibration errors
// ---------------------------------------------------------------------------

/// Closing a calibration window failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CalibrationError {
    /// The window held no complete (air, sample) pair at finish.
    /// No setpoint change is made.
    InsufficientData,
}

impl fmt::Display for CalibrationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InsufficientData => write!(f, "no calibration data collected"),
        }
    }
}

impl std::error::Error for CalibrationError {}

// ---------------------------------------------------------------------------
// Setpoint store errors
// ---------------------------------------------------------------------------

/// The persisted setpoint file could not be read or written.
///
/// Load failures are never fatal: callers fall back to the built-in
/// default band and log a warning.
#[derive(Debug)]
pub enum StoreError {
    Io(std::io::Error),
    /// The file exists but is not valid JSON, or holds an invalid band.
    Corrupted,
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "setpoint store I/O: {e}"),
            Self::Corrupted => write!(f, "setpoint store corrupted"),
        }
    }
}

impl std::error::Error for StoreError {}

impl From<std::io::Error> for StoreError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}
