//! Probe reading model and air-signal aggregation.
//!
//! A [`Reading`] is the point-in-time snapshot taken at the top of every
//! control cycle: two redundant air probes plus the product ("sample")
//! probe. Each slot is either a temperature or unavailable. The two
//! derived air signals feed different parts of the state machine:
//!
//! - [`Reading::air`] — mean of the present air probes; used for the
//!   boost phase maths and the calibration statistic.
//! - [`Reading::air_max`] — max of the present air probes; used for hold
//!   hysteresis and the emergency-reverse guard, so one hot probe is
//!   enough to stop heating.
//!
//! The sample probe is always carried for telemetry but never drives a
//! control decision outside calibration.

/// Identity of a physical probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeId {
    Air1,
    Air2,
    Sample,
}

impl ProbeId {
    /// Stable name used in telemetry rows and log lines.
    pub fn label(&self) -> &'static str {
        match self {
            ProbeId::Air1 => "air1",
            ProbeId::Air2 => "air2",
            ProbeId::Sample => "sample",
        }
    }
}

/// One cycle's probe snapshot. `None` = probe unavailable this cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Reading {
    pub t1: Option<f32>,
    pub t2: Option<f32>,
    pub sample: Option<f32>,
}

impl Reading {
    pub fn new(t1: Option<f32>, t2: Option<f32>, sample: Option<f32>) -> Self {
        Self { t1, t2, sample }
    }

    /// Aggregate air signal: mean of the present air probes.
    /// `None` iff both probes are unavailable.
    pub fn air(&self) -> Option<f32> {
        match (self.t1, self.t2) {
            (Some(a), Some(b)) => Some((a + b) / 2.0),
            (Some(a), None) => Some(a),
            (None, Some(b)) => Some(b),
            (None, None) => None,
        }
    }

    /// Hottest present air probe. `None` iff both are unavailable.
    pub fn air_max(&self) -> Option<f32> {
        match (self.t1, self.t2) {
            (Some(a), Some(b)) => Some(a.max(b)),
            (Some(a), None) => Some(a),
            (None, Some(b)) => Some(b),
            (None, None) => None,
        }
    }

    /// True if at least one air probe responded this cycle.
    pub fn has_air(&self) -> bool {
        self.t1.is_some() || self.t2.is_some()
    }
}
