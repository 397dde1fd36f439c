//! Adapters — concrete implementations of the hexagonal port traits.
//!
//! | Adapter     | Implements      | Connects to                     |
//! |-------------|-----------------|---------------------------------|
//! | `w1`        | ProbePort       | DS18B20 over 1-Wire sysfs       |
//! | `gpio`      | ActuatorPort    | H-bridge relays + fan PWM       |
//! |             | OperatorPort    | console prompt / stdin          |
//! | `clock`     | Clock           | std monotonic time              |
//! | `store`     | SetpointStore   | JSON file, atomic replace       |
//! | `telemetry` | TelemetrySink   | daily CSV files                 |
//!
//! `gpio` is only compiled with the `rpi` feature; everything else is
//! plain filesystem / std and runs anywhere.

pub mod clock;
#[cfg(feature = "rpi")]
pub mod gpio;
pub mod store;
pub mod telemetry;
pub mod w1;
