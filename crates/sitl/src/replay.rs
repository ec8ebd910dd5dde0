//! Recorded sensor log replay.
//!
//! A replay log is CSV with one row per loop iteration:
//!
//! ```text
//! t_us,ax,ay,az,gx,gy,gz,dist_mm,status
//! 10000,12,-30,4101,98,-52,20,512,0
//! 20000,,,,,,,515,0
//! 30000,10,-28,4099,97,-50,21,,
//! ```
//!
//! Raw IMU counts and range values are as read from the sensors. Leaving all
//! six IMU columns empty records an IMU bus failure; leaving both range
//! columns empty records a ranging failure. Blank lines, `#` comments and a
//! header row starting with `t_us` are skipped.

use std::collections::VecDeque;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::str::FromStr;

use tiltrange_core::orientation::RawImuSample;
use tiltrange_core::ranging::DistanceSample;
use tiltrange_core::traits::{ImuBus, RangingDevice, SensorError};

use crate::error::SitlError;

const COLUMNS: usize = 9;

/// One logged loop iteration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReplayRecord {
    pub t_us: u64,
    /// `None` if the IMU read failed
    pub imu: Option<RawImuSample>,
    /// `None` if the ranging read failed
    pub range: Option<DistanceSample>,
}

/// Parse one CSV row; `Ok(None)` for lines that carry no record.
pub fn parse_line(line: &str, line_no: usize) -> Result<Option<ReplayRecord>, SitlError> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') || line.starts_with("t_us") {
        return Ok(None);
    }

    let err = |message: String| SitlError::Parse {
        line: line_no,
        message,
    };

    let fields: Vec<&str> = line.split(',').map(str::trim).collect();
    if fields.len() != COLUMNS {
        return Err(err(format!(
            "expected {COLUMNS} columns, found {}",
            fields.len()
        )));
    }

    let t_us: u64 = parse_field(fields[0], "t_us").map_err(err)?;

    let imu_fields = &fields[1..7];
    let imu = if imu_fields.iter().all(|f| f.is_empty()) {
        None
    } else {
        let mut counts = [0i16; 6];
        for (i, (count, field)) in counts.iter_mut().zip(imu_fields).enumerate() {
            *count = parse_field(field, IMU_COLUMNS[i]).map_err(err)?;
        }
        Some(RawImuSample::new(
            [counts[0], counts[1], counts[2]],
            [counts[3], counts[4], counts[5]],
        ))
    };

    let range = match (fields[7], fields[8]) {
        ("", "") => None,
        (dist, status) => Some(DistanceSample::new(
            parse_field(dist, "dist_mm").map_err(err)?,
            parse_field(status, "status").map_err(err)?,
        )),
    };

    Ok(Some(ReplayRecord { t_us, imu, range }))
}

const IMU_COLUMNS: [&str; 6] = ["ax", "ay", "az", "gx", "gy", "gz"];

fn parse_field<T: FromStr>(field: &str, name: &str) -> Result<T, String> {
    if field.is_empty() {
        return Err(format!("missing {name}"));
    }
    field
        .parse()
        .map_err(|_| format!("invalid {name}: {field:?}"))
}

/// A fully loaded replay log
#[derive(Debug, Clone, Default)]
pub struct ReplayLog {
    records: Vec<ReplayRecord>,
}

impl ReplayLog {
    /// Read every record; timestamps must not go backwards.
    pub fn from_reader<R: BufRead>(reader: R) -> Result<Self, SitlError> {
        let mut records: Vec<ReplayRecord> = Vec::new();
        for (i, line) in reader.lines().enumerate() {
            let line_no = i + 1;
            let Some(record) = parse_line(&line?, line_no)? else {
                continue;
            };
            if let Some(prev) = records.last() {
                if record.t_us < prev.t_us {
                    return Err(SitlError::Parse {
                        line: line_no,
                        message: format!("t_us {} before previous {}", record.t_us, prev.t_us),
                    });
                }
            }
            records.push(record);
        }
        Ok(Self { records })
    }

    pub fn from_path(path: &Path) -> Result<Self, SitlError> {
        let file = File::open(path)?;
        Self::from_reader(BufReader::new(file))
    }

    pub fn records(&self) -> &[ReplayRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Loop timestamps in order
    pub fn timestamps(&self) -> Vec<u64> {
        self.records.iter().map(|r| r.t_us).collect()
    }

    /// Split into devices that hand back the logged reads one by one.
    pub fn into_devices(self) -> (ReplayImu, ReplayRanging) {
        let imu = self
            .records
            .iter()
            .map(|r| r.imu.ok_or(SensorError::Bus))
            .collect();
        let range = self
            .records
            .iter()
            .map(|r| r.range.ok_or(SensorError::Bus))
            .collect();
        (ReplayImu { reads: imu }, ReplayRanging { reads: range })
    }
}

/// IMU replaying logged reads; `NotReady` once the log is exhausted.
#[derive(Debug, Default)]
pub struct ReplayImu {
    reads: VecDeque<Result<RawImuSample, SensorError>>,
}

impl ReplayImu {
    pub fn remaining(&self) -> usize {
        self.reads.len()
    }
}

impl ImuBus for ReplayImu {
    fn read_raw(&mut self) -> Result<RawImuSample, SensorError> {
        self.reads.pop_front().unwrap_or(Err(SensorError::NotReady))
    }
}

/// Ranging device replaying logged reads; `NotReady` once exhausted.
#[derive(Debug, Default)]
pub struct ReplayRanging {
    reads: VecDeque<Result<DistanceSample, SensorError>>,
}

impl ReplayRanging {
    pub fn remaining(&self) -> usize {
        self.reads.len()
    }
}

impl RangingDevice for ReplayRanging {
    fn measure(&mut self) -> Result<DistanceSample, SensorError> {
        self.reads.pop_front().unwrap_or(Err(SensorError::NotReady))
    }
}
