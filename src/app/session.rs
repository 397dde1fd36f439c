//! Control session — the hexagonal core.
//!
//! [`ControlSession`] owns the per-run control state (thermostat, fan
//! cooldown timer, actuator shadow) and drives the whole cadence. All
//! I/O flows through port traits injected at call sites, so the entire
//! session runs against mock adapters in tests.
//!
//! ```text
//!   ProbePort ──▶ ┌─────────────────────────┐ ──▶ TelemetrySink
//!                 │      ControlSession      │
//! ActuatorPort ◀──│ thermostat · cooldown ·  │ ◀─▶ SetpointStore
//! OperatorPort ──▶│ calibration window       │
//!                 └─────────────────────────┘
//! ```
//!
//! Cadence: one coarse control cycle every `loop_interval_secs`, split
//! into 100 ms fine sub-polls. Probes are read and decisions taken only
//! at coarse-cycle boundaries; operator input and the cooldown deadline
//! are serviced on every sub-poll so button latency and fan-off jitter
//! stay around 100 ms. The session is the single writer of actuator
//! state — the cooldown firing is just another event it handles in-loop.

use std::time::Duration;

use log::{info, warn};

use crate::calibration::CalibrationWindow;
use crate::config::{Band, ChamberConfig, Mode};
use crate::control::{ActuatorCommand, CooldownAction, Decision, MotorCmd, Thermostat};
use crate::control::cooldown::FanCooldownTimer;

use super::ports::{
    ActuatorPort, Clock, OperatorEvent, OperatorPort, PauseChoice, ProbePort, SetpointStore,
    TelemetrySink,
};
use super::snapshot::CycleSnapshot;

const SUB_POLL: Duration = Duration::from_millis(100);
const SUB_POLLS_PER_SEC: u32 = 10;

/// Why a run returned control to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitReason {
    /// Operator chose a different mode; return to mode selection.
    ChangeMode,
    /// Operator requested shutdown.
    Shutdown,
}

/// How a calibration run ended.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CalibrationOutcome {
    /// Window closed with data; the recommended band was computed and
    /// (best-effort) persisted.
    Completed(Band),
    /// Window closed empty — no setpoint change was made.
    NoData,
    /// Operator left before the window closed.
    Exited(ExitReason),
}

/// What a sub-poll pass asks the coarse loop to do.
enum Interrupt {
    /// Nothing happened; proceed to the next coarse cycle.
    None,
    /// Confirm pressed (only surfaced when the caller asked for it).
    Confirm,
    /// A pause was resolved with Resume; control state was reset.
    Resumed,
    /// Leave the run.
    Exit(ExitReason),
}

/// Drives one chamber. Construct once, then run modes and calibrations
/// against it; each run starts from a fresh control state.
pub struct ControlSession {
    config: ChamberConfig,
    thermostat: Thermostat,
    cooldown: FanCooldownTimer,
    /// Actuator state as last applied — what the hardware is doing now.
    shadow: ActuatorCommand,
    cycles: u64,
}

impl ControlSession {
    pub fn new(config: ChamberConfig) -> Self {
        // Placeholder thermostat; every run re-initialises it for its band.
        let thermostat = Thermostat::new(Band::new(0.0, 1.0), config.tuning);
        Self {
            config,
            thermostat,
            cooldown: FanCooldownTimer::new(),
            shadow: ActuatorCommand::all_off(),
            cycles: 0,
        }
    }

    /// Total coarse control cycles executed across all runs.
    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    /// The band a normal run of `mode` should hold: the stored calibrated
    /// band when one exists and is valid, else the built-in default.
    /// Store failures downgrade to the default with a warning.
    pub fn resolve_band(&self, store: &impl SetpointStore, mode: Mode) -> Band {
        match store.load(mode) {
            Ok(Some(band)) if band.is_valid() => band,
            Ok(Some(band)) => {
                warn!("stored band for {mode} is invalid ({band:?}), using default");
                mode.default_band()
            }
            Ok(None) => mode.default_band(),
            Err(e) => {
                warn!("setpoint store unreadable ({e}), using default for {mode}");
                mode.default_band()
            }
        }
    }

    // ── Normal run ────────────────────────────────────────────

    /// Hold `band` for `mode` until the operator leaves.
    ///
    /// Blocks for the whole run. Actuators are guaranteed safe (all off,
    /// cooldown cancelled) on return.
    pub fn run_mode(
        &mut self,
        mode: Mode,
        band: Band,
        probes: &mut impl ProbePort,
        hw: &mut impl ActuatorPort,
        clock: &impl Clock,
        operator: &mut impl OperatorPort,
        telemetry: &mut impl TelemetrySink,
    ) -> ExitReason {
        self.enter_run(band, hw, telemetry, &format!("RUN {mode} {:.2}-{:.2}", band.low, band.high));

        let reason = loop {
            self.cycle(mode, false, probes, hw, clock, telemetry);
            match self.sub_poll(false, hw, clock, operator, telemetry) {
                Interrupt::Exit(reason) => break reason,
                Interrupt::None | Interrupt::Resumed | Interrupt::Confirm => {}
            }
        };

        self.leave_run(hw, telemetry);
        reason
    }

    // ── Calibration run ───────────────────────────────────────

    /// Calibrate `mode`: hold its default band while recording paired
    /// (air, sample) readings, then derive and persist a recommended
    /// band. Ends when the window span elapses or on Confirm; the
    /// operator can still pause out like in a normal run.
    pub fn run_calibration(
        &mut self,
        mode: Mode,
        probes: &mut impl ProbePort,
        hw: &mut impl ActuatorPort,
        clock: &impl Clock,
        operator: &mut impl OperatorPort,
        store: &mut impl SetpointStore,
        telemetry: &mut impl TelemetrySink,
    ) -> CalibrationOutcome {
        let band = mode.default_band();
        self.enter_run(band, hw, telemetry, &format!("CAL {mode}"));

        let capacity =
            CalibrationWindow::capacity_for(self.config.cal_window_minutes, self.config.loop_interval_secs);
        let mut window = CalibrationWindow::new(capacity);
        let span = Duration::from_secs(u64::from(self.config.cal_window_minutes) * 60);
        let started = clock.now();

        let outcome = loop {
            let reading = self.cycle(mode, true, probes, hw, clock, telemetry);
            window.push(reading.air(), reading.sample);

            if clock.now().duration_since(started) >= span {
                info!("calibration window for {mode} elapsed");
                break self.finish_calibration(mode, &window, store, telemetry);
            }
            match self.sub_poll(true, hw, clock, operator, telemetry) {
                Interrupt::Confirm => {
                    info!("calibration for {mode} confirmed early");
                    break self.finish_calibration(mode, &window, store, telemetry);
                }
                Interrupt::Exit(reason) => break CalibrationOutcome::Exited(reason),
                Interrupt::None | Interrupt::Resumed => {}
            }
        };

        self.leave_run(hw, telemetry);
        outcome
    }

    // ── Run lifecycle ─────────────────────────────────────────

    fn enter_run(
        &mut self,
        band: Band,
        hw: &mut impl ActuatorPort,
        telemetry: &mut impl TelemetrySink,
        marker: &str,
    ) {
        self.thermostat = Thermostat::new(band, self.config.tuning);
        self.cooldown = FanCooldownTimer::new();
        hw.all_off();
        self.shadow = ActuatorCommand::all_off();
        telemetry.mark(marker);
        info!("{marker}");
    }

    fn leave_run(&mut self, hw: &mut impl ActuatorPort, telemetry: &mut impl TelemetrySink) {
        self.safe_stop(hw);
        telemetry.mark("STOP");
        info!("run stopped, actuators off");
    }

    /// Unconditional safe state: motor and fans off, no pending deadline.
    fn safe_stop(&mut self, hw: &mut impl ActuatorPort) {
        hw.all_off();
        self.cooldown.cancel();
        self.shadow = ActuatorCommand::all_off();
    }

    // ── One coarse cycle ──────────────────────────────────────

    /// Read probes, step the thermostat, apply any decision, log the row.
    fn cycle(
        &mut self,
        mode: Mode,
        calibrating: bool,
        probes: &mut impl ProbePort,
        hw: &mut impl ActuatorPort,
        clock: &impl Clock,
        telemetry: &mut impl TelemetrySink,
    ) -> crate::reading::Reading {
        self.cycles += 1;
        let reading = probes.read_all();
        for (id, e) in probes.take_faults() {
            warn!("probe {} read failed: {e}", id.label());
            telemetry.mark(&format!("ERR {} {e}", id.label()));
        }

        if let Some(decision) = self.thermostat.step(reading.air(), reading.air_max()) {
            self.apply(decision, hw, clock);
        } else if !reading.has_air() {
            warn!("no air probe available, holding previous command");
        }

        telemetry.record(&CycleSnapshot {
            mode,
            reading,
            band: self.thermostat.band(),
            state: self.thermostat.state(),
            motor: self.shadow.motor,
            fans_on: self.shadow.fans_on,
            calibrating,
        });
        reading
    }

    /// Apply one decision to the hardware. Cooldown bookkeeping comes
    /// first so a cancel always lands before the fans are re-enabled.
    fn apply(&mut self, decision: Decision, hw: &mut impl ActuatorPort, clock: &impl Clock) {
        match decision.cooldown {
            CooldownAction::Arm => self.cooldown.arm(
                clock.now(),
                Duration::from_secs(u64::from(self.config.fan_cooldown_secs)),
            ),
            CooldownAction::Cancel => self.cooldown.cancel(),
            CooldownAction::None => {}
        }

        let cmd = decision.command;
        match cmd.motor {
            MotorCmd::Off => hw.motor_off(),
            MotorCmd::Forward => hw.motor_on(true),
            MotorCmd::Reverse => hw.motor_on(false),
        }
        hw.set_fans(cmd.fans_on, self.config.fan_speed);
        self.shadow = cmd;
    }

    // ── Fine sub-poll loop ────────────────────────────────────

    /// Sleep out the remainder of a coarse cycle in 100 ms steps,
    /// servicing operator input and the cooldown deadline on each step.
    ///
    /// `capture_confirm`: surface Confirm presses to the caller
    /// (calibration); otherwise they are ignored.
    fn sub_poll(
        &mut self,
        capture_confirm: bool,
        hw: &mut impl ActuatorPort,
        clock: &impl Clock,
        operator: &mut impl OperatorPort,
        telemetry: &mut impl TelemetrySink,
    ) -> Interrupt {
        let steps = self.config.loop_interval_secs * SUB_POLLS_PER_SEC;
        for _ in 0..steps {
            match operator.poll() {
                Some(OperatorEvent::Confirm) if capture_confirm => return Interrupt::Confirm,
                Some(OperatorEvent::Confirm) => {}
                Some(OperatorEvent::Pause) => match self.pause(hw, operator, telemetry) {
                    Interrupt::Resumed => return Interrupt::Resumed,
                    other => return other,
                },
                None => {}
            }

            if self.cooldown.poll(clock.now()) {
                info!("fan cooldown elapsed, fans off");
                hw.set_fans(false, self.config.fan_speed);
                self.shadow.fans_on = false;
            }

            clock.sleep(SUB_POLL);
        }
        Interrupt::None
    }

    /// Stop everything, then block on the operator's choice. A resumed
    /// run restarts from a fresh control state: the thermostat will
    /// re-derive the right phase from the next reading.
    fn pause(
        &mut self,
        hw: &mut impl ActuatorPort,
        operator: &mut impl OperatorPort,
        telemetry: &mut impl TelemetrySink,
    ) -> Interrupt {
        self.safe_stop(hw);
        telemetry.mark("PAUSE");
        info!("paused, actuators off");

        match operator.resolve_pause() {
            PauseChoice::Resume => {
                self.thermostat = Thermostat::new(self.thermostat.band(), self.config.tuning);
                telemetry.mark("RESUME");
                info!("resumed");
                Interrupt::Resumed
            }
            PauseChoice::ChangeMode => Interrupt::Exit(ExitReason::ChangeMode),
            PauseChoice::Shutdown => Interrupt::Exit(ExitReason::Shutdown),
        }
    }

    // ── Calibration finish ────────────────────────────────────

    fn finish_calibration(
        &mut self,
        mode: Mode,
        window: &CalibrationWindow,
        store: &mut impl SetpointStore,
        telemetry: &mut impl TelemetrySink,
    ) -> CalibrationOutcome {
        match window.compute_result(mode.cal_target_c(), self.config.band_width_c) {
            Ok(result) => {
                info!(
                    "calibration {mode}: air {:.2}C sample {:.2}C offset {:+.2}C -> band {:.2}-{:.2}",
                    result.air_avg,
                    result.sample_avg,
                    result.offset,
                    result.recommended.low,
                    result.recommended.high
                );
                telemetry.calibration_report(mode, &result);
                if let Err(e) = store.save(mode, result.recommended) {
                    warn!("saving calibrated band for {mode} failed: {e}");
                }
                CalibrationOutcome::Completed(result.recommended)
            }
            Err(e) => {
                warn!("calibration for {mode} ended without data: {e}");
                telemetry.mark("CAL NO DATA");
                CalibrationOutcome::NoData
            }
        }
    }
}
