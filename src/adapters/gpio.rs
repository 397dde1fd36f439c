//! Raspberry Pi hardware: relay-driven motor H-bridge, fan PWM, and the
//! operator console.
//!
//! The Peltier motor sits behind two relays: `power` switches the supply
//! and `direction` flips the H-bridge polarity (de-energised = forward,
//! wiring "Mode A"). Fans run on software PWM from the `fans` pin.
//!
//! Relay ordering matters when reversing: the polarity relay is switched
//! with the power relay open, never under load.

use std::io::{BufRead, Write};
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread;

use anyhow::Context;
use log::warn;
use rppal::gpio::{Gpio, OutputPin};

use crate::app::ports::{ActuatorPort, OperatorEvent, OperatorPort, PauseChoice};
use crate::config::Mode;

const FAN_PWM_HZ: f64 = 25.0;

/// BCM pin numbers for the actuator relays and fan MOSFET.
#[derive(Debug, Clone, Copy)]
pub struct ActuatorPins {
    pub motor_power: u8,
    pub motor_direction: u8,
    pub fans: u8,
}

impl Default for ActuatorPins {
    fn default() -> Self {
        Self {
            motor_power: 17,
            motor_direction: 27,
            fans: 18,
        }
    }
}

pub struct GpioActuators {
    power: OutputPin,
    direction: OutputPin,
    fans: OutputPin,
}

impl GpioActuators {
    pub fn new(pins: ActuatorPins) -> anyhow::Result<Self> {
        let gpio = Gpio::new().context("opening GPIO")?;
        let mut power = gpio
            .get(pins.motor_power)
            .context("claiming motor power pin")?
            .into_output();
        let mut direction = gpio
            .get(pins.motor_direction)
            .context("claiming motor direction pin")?
            .into_output();
        let mut fans = gpio
            .get(pins.fans)
            .context("claiming fan pin")?
            .into_output();

        power.set_low();
        direction.set_low();
        fans.set_low();
        Ok(Self {
            power,
            direction,
            fans,
        })
    }

    fn set_direction(&mut self, forward: bool) {
        // Only ever flip polarity with the supply open.
        if self.power.is_set_high() {
            self.power.set_low();
        }
        if forward {
            self.direction.set_low();
        } else {
            self.direction.set_high();
        }
    }
}

impl ActuatorPort for GpioActuators {
    fn motor_on(&mut self, forward: bool) {
        self.set_direction(forward);
        self.power.set_high();
    }

    fn motor_off(&mut self) {
        self.power.set_low();
        self.direction.set_low();
    }

    fn set_fans(&mut self, on: bool, speed: f32) {
        let result = if on {
            self.fans
                .set_pwm_frequency(FAN_PWM_HZ, f64::from(speed.clamp(0.0, 1.0)))
        } else {
            self.fans.clear_pwm()
        };
        if let Err(e) = result {
            warn!("fan PWM update failed: {e}");
        }
        if !on {
            self.fans.set_low();
        }
    }

    fn all_off(&mut self) {
        self.motor_off();
        self.set_fans(false, 0.0);
    }
}

// ───────────────────────────────────────────────────────────────
// Operator console
// ───────────────────────────────────────────────────────────────

/// Top-level menu choice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuChoice {
    Run(Mode),
    Calibrate(Mode),
    Quit,
}

/// Line-oriented operator console on stdin.
///
/// A background thread owns the blocking stdin reads and forwards lines
/// over a channel, so [`OperatorPort::poll`] stays non-blocking for the
/// 100 ms sub-poll cadence.
pub struct ConsoleOperator {
    lines: Receiver<String>,
}

impl ConsoleOperator {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel();
        thread::spawn(move || {
            let stdin = std::io::stdin();
            for line in stdin.lock().lines() {
                let Ok(line) = line else { break };
                if tx.send(line).is_err() {
                    break;
                }
            }
        });
        Self { lines: rx }
    }

    /// Blocking top-level menu. EOF on stdin quits.
    pub fn main_menu(&mut self) -> MenuChoice {
        loop {
            println!("select: [1] Sourdough  [2] Kombucha  [3] Water Kefir");
            println!("        [c1/c2/c3] calibrate mode   [q] quit");
            prompt();
            let Ok(line) = self.lines.recv() else {
                return MenuChoice::Quit;
            };
            match line.trim() {
                "1" => return MenuChoice::Run(Mode::Sourdough),
                "2" => return MenuChoice::Run(Mode::Kombucha),
                "3" => return MenuChoice::Run(Mode::WaterKefir),
                "c1" => return MenuChoice::Calibrate(Mode::Sourdough),
                "c2" => return MenuChoice::Calibrate(Mode::Kombucha),
                "c3" => return MenuChoice::Calibrate(Mode::WaterKefir),
                "q" => return MenuChoice::Quit,
                other => println!("unrecognised: {other:?}"),
            }
        }
    }
}

impl Default for ConsoleOperator {
    fn default() -> Self {
        Self::new()
    }
}

impl OperatorPort for ConsoleOperator {
    fn poll(&mut self) -> Option<OperatorEvent> {
        match self.lines.try_recv() {
            Ok(line) => match line.trim() {
                "p" => Some(OperatorEvent::Pause),
                "" | "c" => Some(OperatorEvent::Confirm),
                other => {
                    println!("unrecognised: {other:?} ([p]ause, [c]onfirm)");
                    None
                }
            },
            Err(TryRecvError::Empty) => None,
            // stdin closed: treat as a pause request so the run can be
            // wound down through the normal path.
            Err(TryRecvError::Disconnected) => Some(OperatorEvent::Pause),
        }
    }

    fn resolve_pause(&mut self) -> PauseChoice {
        loop {
            println!("paused: [r] resume  [m] change mode  [q] shutdown");
            prompt();
            let Ok(line) = self.lines.recv() else {
                return PauseChoice::Shutdown;
            };
            match line.trim() {
                "r" => return PauseChoice::Resume,
                "m" => return PauseChoice::ChangeMode,
                "q" => return PauseChoice::Shutdown,
                other => println!("unrecognised: {other:?}"),
            }
        }
    }
}

fn prompt() {
    print!("> ");
    let _ = std::io::stdout().flush();
}
