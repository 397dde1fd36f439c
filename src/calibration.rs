//! Sliding-window calibration.
//!
//! A calibration run records paired (air, sample) temperatures at the
//! control cadence while holding the mode's default band. At finish the
//! averaged air-to-sample offset is turned into a recommended air band
//! that should keep the *sample* at the mode's target temperature:
//!
//! ```text
//! offset = mean(air) - mean(sample)
//! center = target + offset
//! band   = center ± width / 2
//! ```
//!
//! The window is a bounded FIFO over the most recent `cal_window_minutes`
//! of data. Cycles where either probe was unavailable contribute nothing;
//! the averages are taken over whatever pairs remain.

use std::collections::VecDeque;

use crate::config::Band;
use crate::error::CalibrationError;

/// Outcome of a completed calibration window.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CalibrationResult {
    pub air_avg: f32,
    pub sample_avg: f32,
    /// `air_avg - sample_avg`: how much warmer the air runs than the product.
    pub offset: f32,
    /// The band to hold so the sample settles at the target.
    pub recommended: Band,
}

/// Bounded FIFO of paired (air, sample) readings.
#[derive(Debug)]
pub struct CalibrationWindow {
    pairs: VecDeque<(f32, f32)>,
    capacity: usize,
}

impl CalibrationWindow {
    pub fn new(capacity: usize) -> Self {
        Self {
            pairs: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Window capacity for a given span at a given cadence. Never zero.
    pub fn capacity_for(window_minutes: u32, loop_interval_secs: u32) -> usize {
        let secs = u64::from(window_minutes) * 60;
        let n = secs / u64::from(loop_interval_secs.max(1));
        (n as usize).max(1)
    }

    /// Record one cycle. Only complete pairs enter the window; once full,
    /// the oldest pair is evicted so the window slides.
    pub fn push(&mut self, air: Option<f32>, sample: Option<f32>) {
        if let (Some(a), Some(s)) = (air, sample) {
            if self.pairs.len() == self.capacity {
                self.pairs.pop_front();
            }
            self.pairs.push_back((a, s));
        }
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.pairs.len() == self.capacity
    }

    /// Close the window: average the collected pairs and derive the
    /// recommended band for `target`.
    ///
    /// Fails with [`CalibrationError::InsufficientData`] on an empty
    /// window, in which case no setpoint change may be made.
    pub fn compute_result(
        &self,
        target: f32,
        band_width: f32,
    ) -> Result<CalibrationResult, CalibrationError> {
        if self.pairs.is_empty() {
            return Err(CalibrationError::InsufficientData);
        }

        let n = self.pairs.len() as f64;
        let (air_sum, sample_sum) = self
            .pairs
            .iter()
            .fold((0.0f64, 0.0f64), |(a, s), &(pa, ps)| {
                (a + f64::from(pa), s + f64::from(ps))
            });
        let air_avg = (air_sum / n) as f32;
        let sample_avg = (sample_sum / n) as f32;
        let offset = air_avg - sample_avg;

        let center = target + offset;
        let half = band_width / 2.0;
        Ok(CalibrationResult {
            air_avg,
            sample_avg,
            offset,
            recommended: Band::new(center - half, center + half),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capacity_matches_window_span() {
        // 200 minutes at a 15 s cadence.
        assert_eq!(CalibrationWindow::capacity_for(200, 15), 800);
        assert_eq!(CalibrationWindow::capacity_for(1, 60), 1);
        // Degenerate inputs still give a usable window.
        assert_eq!(CalibrationWindow::capacity_for(0, 15), 1);
        assert_eq!(CalibrationWindow::capacity_for(1, 0), 1);
    }

    #[test]
    fn worked_example() {
        // Air runs 2 °C warmer than the sample; target 25 → hold 27 ± 0.5.
        let mut w = CalibrationWindow::new(10);
        for _ in 0..4 {
            w.push(Some(20.0), Some(18.0));
        }
        let r = w.compute_result(25.0, 1.0).unwrap();
        assert!((r.air_avg - 20.0).abs() < 1e-4);
        assert!((r.sample_avg - 18.0).abs() < 1e-4);
        assert!((r.offset - 2.0).abs() < 1e-4);
        assert!((r.recommended.low - 26.5).abs() < 1e-4);
        assert!((r.recommended.high - 27.5).abs() < 1e-4);
        assert!(r.recommended.is_valid());
    }

    #[test]
    fn negative_offset_shifts_band_down() {
        // Sample warmer than air (self-heating ferment).
        let mut w = CalibrationWindow::new(10);
        w.push(Some(24.0), Some(26.0));
        let r = w.compute_result(25.0, 1.0).unwrap();
        assert!((r.offset + 2.0).abs() < 1e-4);
        assert!((r.recommended.low - 22.5).abs() < 1e-4);
        assert!((r.recommended.high - 23.5).abs() < 1e-4);
    }

    #[test]
    fn incomplete_pairs_are_skipped() {
        let mut w = CalibrationWindow::new(10);
        w.push(Some(20.0), None);
        w.push(None, Some(18.0));
        w.push(None, None);
        assert!(w.is_empty());

        w.push(Some(21.0), Some(19.0));
        assert_eq!(w.len(), 1);
        let r = w.compute_result(25.0, 1.0).unwrap();
        assert!((r.offset - 2.0).abs() < 1e-4);
    }

    #[test]
    fn empty_window_is_insufficient_data() {
        let w = CalibrationWindow::new(10);
        assert_eq!(
            w.compute_result(25.0, 1.0),
            Err(CalibrationError::InsufficientData)
        );
    }

    #[test]
    fn full_window_slides() {
        let mut w = CalibrationWindow::new(3);
        w.push(Some(10.0), Some(10.0));
        w.push(Some(20.0), Some(18.0));
        w.push(Some(20.0), Some(18.0));
        assert!(w.is_full());

        // A fourth push evicts the (10, 10) outlier.
        w.push(Some(20.0), Some(18.0));
        assert_eq!(w.len(), 3);
        let r = w.compute_result(25.0, 1.0).unwrap();
        assert!((r.air_avg - 20.0).abs() < 1e-4);
        assert!((r.offset - 2.0).abs() < 1e-4);
    }
}
