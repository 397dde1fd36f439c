//! Daily CSV telemetry files.
//!
//! One file per local day, `YYYY-MM-DD.csv`, header written on
//! creation. Cycle rows and lifecycle markers share the file so the
//! day's history reads in order; calibration reports go to a separate
//! `calibrations.log` since they are multi-line and rare.
//!
//! All write failures are logged and swallowed — losing a telemetry row
//! must never stall the control loop.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::Local;
use log::warn;

use crate::app::ports::TelemetrySink;
use crate::app::snapshot::CycleSnapshot;
use crate::calibration::CalibrationResult;
use crate::config::Mode;
use crate::control::{ControlState, MotorCmd};

const HEADER: &str = "timestamp,mode,calibrating,t1_c,t2_c,sample_c,state,motor,direction,fans\n";

pub struct CsvTelemetrySink {
    dir: PathBuf,
}

impl CsvTelemetrySink {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    fn day_file(&self) -> PathBuf {
        self.dir.join(format!("{}.csv", Local::now().format("%Y-%m-%d")))
    }

    fn append(&self, path: &Path, line: &str, header: Option<&str>) {
        let fresh = !path.exists();
        let result = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .and_then(|mut f| {
                if fresh {
                    if let Some(h) = header {
                        f.write_all(h.as_bytes())?;
                    }
                }
                f.write_all(line.as_bytes())
            });
        if let Err(e) = result {
            warn!("telemetry write to {} failed: {e}", path.display());
        }
    }

    fn append_row(&self, line: &str) {
        self.append(&self.day_file(), line, Some(HEADER));
    }
}

fn timestamp() -> String {
    Local::now().format("%Y-%m-%d %H:%M:%S").to_string()
}

/// An unavailable probe shows as an explicit error marker, never a
/// blank that a reader could mistake for lost data.
fn temp_field(t: Option<f32>) -> String {
    match t {
        Some(v) => format!("{v:.3}"),
        None => "ERR".to_string(),
    }
}

fn state_label(state: ControlState) -> &'static str {
    match state {
        ControlState::Off => "off",
        ControlState::Running { boosting: false } => "hold",
        ControlState::Running { boosting: true } => "boost",
        ControlState::Reversing => "reverse",
    }
}

/// H-bridge wiring direction: `A` forward, `B` reversed, empty when off.
fn direction_field(motor: MotorCmd) -> &'static str {
    match motor {
        MotorCmd::Off => "",
        MotorCmd::Forward => "A",
        MotorCmd::Reverse => "B",
    }
}

impl TelemetrySink for CsvTelemetrySink {
    fn record(&mut self, s: &CycleSnapshot) {
        let mode = if s.calibrating {
            format!("CAL-{}", s.mode.label())
        } else {
            s.mode.label().to_string()
        };
        let line = format!(
            "{},{},{},{},{},{},{},{},{},{}\n",
            timestamp(),
            mode,
            if s.calibrating { 1 } else { 0 },
            temp_field(s.reading.t1),
            temp_field(s.reading.t2),
            temp_field(s.reading.sample),
            state_label(s.state),
            if s.motor == MotorCmd::Off { 0 } else { 1 },
            direction_field(s.motor),
            if s.fans_on { 1 } else { 0 },
        );
        self.append_row(&line);
    }

    fn mark(&mut self, marker: &str) {
        // Marker rows keep the column count so CSV readers stay happy;
        // free-form text (I/O error strings) gets its separators folded.
        let clean = marker.replace(['\n', '\r'], " ").replace(',', ";");
        let line = format!("{},{clean},,,,,,,,\n", timestamp());
        self.append_row(&line);
    }

    fn calibration_report(&mut self, mode: Mode, r: &CalibrationResult) {
        let report = format!(
            "[{}] {mode}: air avg {:.3} C, sample avg {:.3} C, offset {:+.3} C, \
             recommended band {:.2}-{:.2} C\n",
            timestamp(),
            r.air_avg,
            r.sample_avg,
            r.offset,
            r.recommended.low,
            r.recommended.high,
        );
        self.append(&self.dir.join("calibrations.log"), &report, None);
        self.mark("CAL DONE");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Band;
    use crate::reading::Reading;

    fn temp_sink(tag: &str) -> (CsvTelemetrySink, PathBuf) {
        let dir = std::env::temp_dir().join(format!("telemetry-{tag}-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        (CsvTelemetrySink::new(dir.clone()), dir)
    }

    fn snapshot() -> CycleSnapshot {
        CycleSnapshot {
            mode: Mode::Sourdough,
            reading: Reading::new(Some(24.5), None, Some(23.062)),
            band: Band::new(24.0, 28.0),
            state: ControlState::Running { boosting: false },
            motor: MotorCmd::Forward,
            fans_on: true,
            calibrating: false,
        }
    }

    #[test]
    fn row_has_header_and_fields() {
        let (mut sink, dir) = temp_sink("row");
        sink.record(&snapshot());

        let day = std::fs::read_dir(&dir)
            .unwrap()
            .map(|e| e.unwrap().path())
            .find(|p| p.extension().is_some_and(|x| x == "csv"))
            .expect("day file created");
        let contents = std::fs::read_to_string(day).unwrap();

        assert!(contents.starts_with(HEADER));
        assert!(contents.contains("Sourdough,0,24.500,ERR,23.062,hold,1,A,1"));

        std::fs::remove_dir_all(dir).unwrap();
    }

    #[test]
    fn unavailable_probes_render_err_in_their_columns() {
        let (mut sink, dir) = temp_sink("err");
        let mut s = snapshot();
        s.reading = Reading::new(None, None, None);
        sink.record(&s);

        let contents = std::fs::read_to_string(sink.day_file()).unwrap();
        assert!(contents.contains(",ERR,ERR,ERR,"));

        std::fs::remove_dir_all(dir).unwrap();
    }

    #[test]
    fn calibration_rows_carry_the_cal_mode_label() {
        let (mut sink, dir) = temp_sink("calmode");
        let mut s = snapshot();
        s.calibrating = true;
        sink.record(&s);

        let contents = std::fs::read_to_string(sink.day_file()).unwrap();
        assert!(contents.contains(",CAL-Sourdough,1,"));

        std::fs::remove_dir_all(dir).unwrap();
    }

    #[test]
    fn header_written_once() {
        let (mut sink, dir) = temp_sink("once");
        sink.record(&snapshot());
        sink.record(&snapshot());

        let day = sink.day_file();
        let contents = std::fs::read_to_string(day).unwrap();
        assert_eq!(contents.matches("timestamp,mode").count(), 1);

        std::fs::remove_dir_all(dir).unwrap();
    }

    #[test]
    fn marker_keeps_column_count() {
        let (mut sink, dir) = temp_sink("marker");
        sink.mark("STARTUP");

        let contents = std::fs::read_to_string(sink.day_file()).unwrap();
        let marker_row = contents.lines().nth(1).unwrap();
        assert_eq!(marker_row.matches(',').count(), 9);
        assert!(marker_row.contains("STARTUP"));

        std::fs::remove_dir_all(dir).unwrap();
    }

    #[test]
    fn marker_with_free_form_text_keeps_column_count() {
        // I/O error displays can carry commas and newlines.
        let (mut sink, dir) = temp_sink("dirty-marker");
        sink.mark("ERR air1 probe I/O: No such file, or directory\nextra");

        let contents = std::fs::read_to_string(sink.day_file()).unwrap();
        assert_eq!(contents.lines().count(), 2, "header plus one row");
        let marker_row = contents.lines().nth(1).unwrap();
        assert_eq!(marker_row.matches(',').count(), 9);
        assert!(marker_row.contains("No such file; or directory extra"));

        std::fs::remove_dir_all(dir).unwrap();
    }

    #[test]
    fn calibration_report_goes_to_its_own_file() {
        let (mut sink, dir) = temp_sink("cal");
        let r = CalibrationResult {
            air_avg: 20.0,
            sample_avg: 18.0,
            offset: 2.0,
            recommended: Band::new(26.5, 27.5),
        };
        sink.calibration_report(Mode::Kombucha, &r);

        let report = std::fs::read_to_string(dir.join("calibrations.log")).unwrap();
        assert!(report.contains("Kombucha"));
        assert!(report.contains("offset +2.000"));
        assert!(report.contains("26.50-27.50"));

        std::fs::remove_dir_all(dir).unwrap();
    }
}
