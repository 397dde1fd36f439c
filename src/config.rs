//! Chamber configuration parameters.
//!
//! All tunable parameters for the fermentation chamber controller.
//! Defaults match the deployed unit; values can be overridden by
//! deserialising a JSON config file over [`ChamberConfig::default`].

use serde::{Deserialize, Serialize};

/// Target air-temperature band, in °C.
///
/// Invariant: `low < high`. The band drives the hold-phase hysteresis and
/// all boost/emergency thresholds are expressed relative to it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Band {
    pub low: f32,
    pub high: f32,
}

impl Band {
    pub fn new(low: f32, high: f32) -> Self {
        Self { low, high }
    }

    /// Band midpoint — the reference for boost entry/exit.
    pub fn center(&self) -> f32 {
        (self.low + self.high) / 2.0
    }

    /// `low < high` and both values are finite.
    pub fn is_valid(&self) -> bool {
        self.low.is_finite() && self.high.is_finite() && self.low < self.high
    }
}

/// Operating modes. Each mode carries its own default band and calibration
/// target; calibrated bands override the defaults via the setpoint store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Mode {
    Sourdough,
    Kombucha,
    WaterKefir,
}

impl Mode {
    pub const ALL: [Mode; 3] = [Mode::Sourdough, Mode::Kombucha, Mode::WaterKefir];

    /// Stable label used in telemetry rows and the setpoint store.
    pub fn label(&self) -> &'static str {
        match self {
            Mode::Sourdough => "Sourdough",
            Mode::Kombucha => "Kombucha",
            Mode::WaterKefir => "Water Kefir",
        }
    }

    /// Built-in air band, used until a calibration has been saved.
    pub fn default_band(&self) -> Band {
        match self {
            Mode::Sourdough => Band::new(24.0, 28.0),
            Mode::Kombucha => Band::new(24.0, 26.0),
            Mode::WaterKefir => Band::new(20.0, 25.0),
        }
    }

    /// Target product (sample) temperature for calibration.
    pub fn cal_target_c(&self) -> f32 {
        25.0
    }
}

impl core::fmt::Display for Mode {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.label())
    }
}

/// Thresholds for the control state machine, all in °C.
///
/// Boost pushes hard while the air is far below the band center; the
/// emergency pair reverses motor polarity on a severe over-temperature
/// excursion and recovers with its own hysteresis gap.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ControlTuning {
    /// Enable the two-phase boost behaviour.
    pub boost_enable: bool,
    /// Enter boost when `air <= center - boost_delta_c`.
    pub boost_delta_c: f32,
    /// Exit boost once `air >= center - boost_exit_gap_c`.
    pub boost_exit_gap_c: f32,
    /// Hard cap: never push the air above this while boosting.
    pub boost_max_air_c: f32,
    /// Engage emergency reverse at `air_max >= high + emergency_over_c`.
    pub emergency_over_c: f32,
    /// Recover from reverse at `air_max <= high - emergency_recover_c`.
    pub emergency_recover_c: f32,
}

impl Default for ControlTuning {
    fn default() -> Self {
        Self {
            boost_enable: true,
            boost_delta_c: 3.0,
            boost_exit_gap_c: 1.5,
            boost_max_air_c: 31.0,
            emergency_over_c: 5.0,
            emergency_recover_c: 1.0,
        }
    }
}

/// DS18B20 1-Wire device ids for the three probes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProbeMap {
    pub air1: String,
    pub air2: String,
    pub sample: String,
}

impl Default for ProbeMap {
    fn default() -> Self {
        Self {
            air1: "28-7db6d445e7a7".to_string(),
            air2: "28-37e5d44570c3".to_string(),
            sample: "28-3ce1e3800798".to_string(),
        }
    }
}

/// Core chamber configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChamberConfig {
    // --- Timing ---
    /// Main control cadence (seconds between cycles).
    pub loop_interval_secs: u32,
    /// Fans keep running this long after the motor stops on a High.
    pub fan_cooldown_secs: u32,

    // --- Fans ---
    /// Fan PWM duty when fans are on (0.0–1.0).
    pub fan_speed: f32,

    // --- Calibration ---
    /// Minutes of data in the calibration window.
    pub cal_window_minutes: u32,
    /// Total width in °C of a recommended band.
    pub band_width_c: f32,

    // --- Control thresholds ---
    pub tuning: ControlTuning,

    // --- Probes ---
    pub probes: ProbeMap,
}

impl Default for ChamberConfig {
    fn default() -> Self {
        Self {
            loop_interval_secs: 15,
            fan_cooldown_secs: 10,
            fan_speed: 0.75,
            cal_window_minutes: 200,
            band_width_c: 1.0,
            tuning: ControlTuning::default(),
            probes: ProbeMap::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_sane() {
        let c = ChamberConfig::default();
        assert!(c.loop_interval_secs > 0);
        assert!(c.fan_cooldown_secs > 0);
        assert!(c.fan_speed > 0.0 && c.fan_speed <= 1.0);
        assert!(c.cal_window_minutes > 0);
        assert!(c.band_width_c > 0.0);
    }

    #[test]
    fn boost_thresholds_are_hysteretic() {
        let t = ControlTuning::default();
        // Entry must sit strictly below exit, otherwise the flag chatters.
        assert!(
            t.boost_delta_c > t.boost_exit_gap_c,
            "boost entry threshold must be below the exit threshold"
        );
    }

    #[test]
    fn emergency_thresholds_are_hysteretic() {
        let t = ControlTuning::default();
        assert!(t.emergency_over_c > 0.0);
        assert!(t.emergency_recover_c > 0.0);
    }

    #[test]
    fn default_bands_are_valid() {
        for mode in Mode::ALL {
            let band = mode.default_band();
            assert!(band.is_valid(), "{mode}: bad default band");
        }
    }

    #[test]
    fn band_center() {
        let band = Band::new(24.0, 28.0);
        assert_eq!(band.center(), 26.0);
    }

    #[test]
    fn inverted_band_is_invalid() {
        assert!(!Band::new(28.0, 24.0).is_valid());
        assert!(!Band::new(24.0, 24.0).is_valid());
        assert!(!Band::new(f32::NAN, 24.0).is_valid());
    }

    #[test]
    fn serde_roundtrip() {
        let c = ChamberConfig::default();
        let json = serde_json::to_string(&c).unwrap();
        let c2: ChamberConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(c.loop_interval_secs, c2.loop_interval_secs);
        assert!((c.tuning.boost_max_air_c - c2.tuning.boost_max_air_c).abs() < 0.001);
        assert_eq!(c.probes.air1, c2.probes.air1);
    }

    #[test]
    fn mode_labels_are_stable() {
        // The setpoint store keys on these; they must not drift.
        assert_eq!(Mode::Sourdough.label(), "Sourdough");
        assert_eq!(Mode::Kombucha.label(), "Kombucha");
        assert_eq!(Mode::WaterKefir.label(), "Water Kefir");
    }
}
