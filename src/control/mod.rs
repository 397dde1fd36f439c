//! Control state machine for the chamber thermostat.
//!
//! Per-cycle decision logic, pure apart from the retained state:
//!
//! ```text
//!            air_max >= high+5
//!   ┌────────────────────────────────▶ REVERSING
//!   │                                      │ air_max <= high-1
//!   │  air <= center-3                     ▼
//!  HOLD ◀──────────────────▶ BOOST       OFF (+cooldown)
//!   (band hysteresis         (full drive,
//!    on air_max)              capped at min(31, center+1))
//!                air >= center-1.5
//! ```
//!
//! Rule priority each cycle: emergency engage, emergency recover, boost
//! entry/exit, boost drive, hold hysteresis. The emergency phase always
//! overrides boost and hold; boost and hold are mutually exclusive.
//!
//! Missing-sensor policy: with both air probes unavailable, [`Thermostat::step`]
//! returns `None` and the previous actuator command stands unchanged — the
//! same policy in normal runs and calibration runs.

pub mod cooldown;

use crate::config::{Band, ControlTuning};
use log::{info, warn};

/// Motor command. Exactly one of the three is in effect at any time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MotorCmd {
    Off,
    /// Full power, forward polarity (wiring "Mode A").
    Forward,
    /// Full power, reversed polarity — emergency heat extraction.
    Reverse,
}

/// What the actuators should do after a cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActuatorCommand {
    pub motor: MotorCmd,
    /// Force fans on. Fans are only ever turned *off* by the cooldown
    /// timer firing or by a safe stop, never directly by a decision.
    pub fans_on: bool,
}

impl ActuatorCommand {
    /// Everything stopped — the state at mode entry and safe stop.
    pub fn all_off() -> Self {
        Self {
            motor: MotorCmd::Off,
            fans_on: false,
        }
    }
}

/// Cooldown side effect accompanying a decision.
///
/// `Arm` schedules the delayed fan-off; `Cancel` drops any pending one.
/// Cancellation always precedes re-enabling fans so a stale deadline can
/// never switch fans off after the motor restarted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CooldownAction {
    None,
    Arm,
    Cancel,
}

/// One cycle's output: the actuator command plus the cooldown effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Decision {
    pub command: ActuatorCommand,
    pub cooldown: CooldownAction,
}

/// Control phase. `Reversing` is mutually exclusive with the others;
/// within `Running { boosting: true }` the motor may be momentarily
/// stopped at the boost cap while the phase itself persists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlState {
    /// Hold phase, motor stopped.
    Off,
    /// Motor phase: hold-driving (`boosting: false`) or boost phase.
    Running { boosting: bool },
    /// Emergency polarity reversal on severe over-temperature.
    Reversing,
}

impl ControlState {
    pub fn is_reversing(&self) -> bool {
        matches!(self, ControlState::Reversing)
    }

    pub fn is_boosting(&self) -> bool {
        matches!(self, ControlState::Running { boosting: true })
    }
}

/// The bang-bang thermostat with boost and emergency-reverse phases.
///
/// Created fresh (state `Off`, not boosting) at mode entry and stepped
/// once per control cycle.
#[derive(Debug)]
pub struct Thermostat {
    state: ControlState,
    band: Band,
    tuning: ControlTuning,
    /// Last issued command — held verbatim on cycles where no rule fires.
    last: ActuatorCommand,
}

impl Thermostat {
    pub fn new(band: Band, tuning: ControlTuning) -> Self {
        Self {
            state: ControlState::Off,
            band,
            tuning,
            last: ActuatorCommand::all_off(),
        }
    }

    pub fn state(&self) -> ControlState {
        self.state
    }

    pub fn band(&self) -> Band {
        self.band
    }

    /// The most recently issued actuator command.
    pub fn last_command(&self) -> ActuatorCommand {
        self.last
    }

    /// Evaluate one control cycle.
    ///
    /// * `air` — mean of present air probes (boost maths).
    /// * `air_max` — hottest present air probe (hold + emergency guard).
    ///
    /// Returns `None` when the previous actuator command should stand:
    /// either both probes were unavailable, or no threshold was crossed.
    pub fn step(&mut self, air: Option<f32>, air_max: Option<f32>) -> Option<Decision> {
        // Both signals derive from the same probe pair, so they are
        // present or absent together.
        let (air, tmax) = match (air, air_max) {
            (Some(a), Some(m)) => (a, m),
            _ => return None,
        };

        let t = self.tuning;
        let center = self.band.center();

        // 1. Emergency engage: flip polarity, full power, fans on.
        if !self.state.is_reversing() && tmax >= self.band.high + t.emergency_over_c {
            warn!(
                "emergency reverse engaged: air_max {tmax:.1}C >= {:.1}C",
                self.band.high + t.emergency_over_c
            );
            self.state = ControlState::Reversing;
            return Some(self.issue(MotorCmd::Reverse, true, CooldownAction::Cancel));
        }

        // 2. Emergency recover / persist. Boost and hold are skipped
        //    entirely while reversing.
        if self.state.is_reversing() {
            if tmax <= self.band.high - t.emergency_recover_c {
                info!("emergency reverse recovered: air_max {tmax:.1}C");
                self.state = ControlState::Off;
                return Some(self.issue(MotorCmd::Off, true, CooldownAction::Arm));
            }
            return None;
        }

        // 3. Boost entry/exit — hysteretic, never toggled by one threshold.
        if t.boost_enable {
            match self.state {
                ControlState::Running { boosting: true }
                    if air >= center - t.boost_exit_gap_c =>
                {
                    info!("boost exit: air {air:.1}C near center {center:.1}C");
                    self.state = if self.last.motor == MotorCmd::Forward {
                        ControlState::Running { boosting: false }
                    } else {
                        ControlState::Off
                    };
                }
                ControlState::Off | ControlState::Running { boosting: false }
                    if air <= center - t.boost_delta_c =>
                {
                    info!("boost entry: air {air:.1}C well below center {center:.1}C");
                    self.state = ControlState::Running { boosting: true };
                }
                _ => {}
            }
        }

        // 4. Boost drive: push hard, capped so the air cannot overshoot.
        if self.state.is_boosting() {
            if air >= t.boost_max_air_c.min(center + 1.0) {
                return Some(self.issue(MotorCmd::Off, true, CooldownAction::Arm));
            }
            return Some(self.issue(MotorCmd::Forward, true, CooldownAction::Cancel));
        }

        // 5. Hold hysteresis on the hottest probe.
        match self.state {
            ControlState::Running { boosting: false } if tmax > self.band.high => {
                self.state = ControlState::Off;
                Some(self.issue(MotorCmd::Off, true, CooldownAction::Arm))
            }
            ControlState::Off if tmax <= self.band.low => {
                self.state = ControlState::Running { boosting: false };
                Some(self.issue(MotorCmd::Forward, true, CooldownAction::Cancel))
            }
            _ => None,
        }
    }

    fn issue(&mut self, motor: MotorCmd, fans_on: bool, cooldown: CooldownAction) -> Decision {
        let command = ActuatorCommand { motor, fans_on };
        self.last = command;
        Decision { command, cooldown }
    }
}
