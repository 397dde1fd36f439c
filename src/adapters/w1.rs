//! DS18B20 probes over the kernel 1-Wire (w1) sysfs interface.
//!
//! Each probe is a file `<base>/<device-id>/w1_slave` containing two
//! lines from the w1_therm driver:
//!
//! ```text
//! 53 01 4b 46 7f ff 0c 10 fd : crc=fd YES
//! 53 01 4b 46 7f ff 0c 10 fd t=21187
//! ```
//!
//! The first line carries the driver's CRC verdict, the second the raw
//! temperature in millidegrees. A read with `NO` on the CRC line or a
//! missing `t=` field is a per-cycle fault: the slot becomes `None` and
//! the control loop carries on.

use std::fs;
use std::path::PathBuf;

use crate::app::ports::ProbePort;
use crate::config::ProbeMap;
use crate::error::ProbeError;
use crate::reading::{ProbeId, Reading};

pub const W1_DEVICES_DIR: &str = "/sys/bus/w1/devices";

/// Parse the two-line `w1_slave` payload into degrees Celsius.
pub fn parse_w1_slave(contents: &str) -> Result<f32, ProbeError> {
    let mut lines = contents.lines();
    let crc_line = lines.next().ok_or(ProbeError::Malformed)?;
    if !crc_line.trim_end().ends_with("YES") {
        return Err(ProbeError::CrcFailed);
    }
    let data_line = lines.next().ok_or(ProbeError::Malformed)?;
    let (_, raw) = data_line.split_once("t=").ok_or(ProbeError::Malformed)?;
    let milli: i32 = raw.trim().parse().map_err(|_| ProbeError::Malformed)?;
    Ok(milli as f32 / 1000.0)
}

/// [`ProbePort`] over three DS18B20 devices.
pub struct W1Probes {
    base: PathBuf,
    ids: ProbeMap,
    faults: Vec<(ProbeId, ProbeError)>,
}

impl W1Probes {
    pub fn new(ids: ProbeMap) -> Self {
        Self::with_base(PathBuf::from(W1_DEVICES_DIR), ids)
    }

    /// Point at a different sysfs root (tests use a temp directory).
    pub fn with_base(base: PathBuf, ids: ProbeMap) -> Self {
        Self {
            base,
            ids,
            faults: Vec::new(),
        }
    }

    fn read_one(&mut self, id: ProbeId, device: &str) -> Option<f32> {
        let path = self.base.join(device).join("w1_slave");
        let result = fs::read_to_string(&path)
            .map_err(ProbeError::from)
            .and_then(|s| parse_w1_slave(&s));
        match result {
            Ok(t) => Some(t),
            Err(e) => {
                self.faults.push((id, e));
                None
            }
        }
    }
}

impl ProbePort for W1Probes {
    fn read_all(&mut self) -> Reading {
        let air1 = self.ids.air1.clone();
        let air2 = self.ids.air2.clone();
        let sample = self.ids.sample.clone();
        Reading {
            t1: self.read_one(ProbeId::Air1, &air1),
            t2: self.read_one(ProbeId::Air2, &air2),
            sample: self.read_one(ProbeId::Sample, &sample),
        }
    }

    fn take_faults(&mut self) -> Vec<(ProbeId, ProbeError)> {
        std::mem::take(&mut self.faults)
    }
}
