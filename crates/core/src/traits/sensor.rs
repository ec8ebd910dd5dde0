//! Sensor collaborator traits
//!
//! Bus transactions, power-up sequencing and the ranging driver live outside
//! this crate. They hand samples to the filters through these traits.

use core::fmt;

use heapless::Deque;

use crate::orientation::RawImuSample;
use crate::ranging::DistanceSample;

/// Maximum number of scripted results a mock sensor can queue
pub const MOCK_QUEUE_LEN: usize = 64;

/// Sensor read errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SensorError {
    /// Bus transaction did not complete
    Bus,
    /// Device not initialised or not responding
    NotReady,
    /// Transfer completed but the payload was short or malformed
    InvalidData,
}

impl SensorError {
    /// Return variant name as a static string (usable with defmt on embedded)
    pub fn as_str(&self) -> &'static str {
        match self {
            SensorError::Bus => "Bus",
            SensorError::NotReady => "NotReady",
            SensorError::InvalidData => "InvalidData",
        }
    }
}

impl fmt::Display for SensorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SensorError::Bus => write!(f, "bus transaction failed"),
            SensorError::NotReady => write!(f, "sensor not ready"),
            SensorError::InvalidData => write!(f, "invalid sensor data"),
        }
    }
}

/// Source of raw 6-axis IMU counts
pub trait ImuBus {
    /// Read one accel + gyro sample.
    fn read_raw(&mut self) -> Result<RawImuSample, SensorError>;
}

/// Source of time-of-flight range measurements
pub trait RangingDevice {
    /// Perform (or collect) one ranging measurement.
    fn measure(&mut self) -> Result<DistanceSample, SensorError>;
}

impl<T: ImuBus + ?Sized> ImuBus for &mut T {
    fn read_raw(&mut self) -> Result<RawImuSample, SensorError> {
        (**self).read_raw()
    }
}

impl<T: RangingDevice + ?Sized> RangingDevice for &mut T {
    fn measure(&mut self) -> Result<DistanceSample, SensorError> {
        (**self).measure()
    }
}

// ============================================================================
// Mock Implementations (always available for testing)
// ============================================================================

/// Mock IMU returning scripted results in order, then a default sample.
///
/// ```
/// use tiltrange_core::orientation::RawImuSample;
/// use tiltrange_core::traits::{ImuBus, MockImu, SensorError};
///
/// let mut imu = MockImu::with_default(RawImuSample::new([0, 0, 4096], [0; 3]));
/// imu.push_error(SensorError::Bus);
/// assert_eq!(imu.read_raw(), Err(SensorError::Bus));
/// assert_eq!(imu.read_raw().unwrap().accel[2], 4096);
/// ```
pub struct MockImu {
    script: Deque<Result<RawImuSample, SensorError>, MOCK_QUEUE_LEN>,
    default_sample: RawImuSample,
    reads: u32,
}

impl MockImu {
    /// Mock that always returns `sample` once the script is empty
    pub fn with_default(sample: RawImuSample) -> Self {
        Self {
            script: Deque::new(),
            default_sample: sample,
            reads: 0,
        }
    }

    /// Mock with a scripted sequence of samples
    pub fn with_samples(samples: &[RawImuSample]) -> Self {
        let mut imu = Self::with_default(RawImuSample::default());
        for sample in samples.iter().take(MOCK_QUEUE_LEN) {
            imu.push_sample(*sample);
        }
        imu
    }

    /// Queue a sample (dropped if the queue is full)
    pub fn push_sample(&mut self, sample: RawImuSample) {
        let _ = self.script.push_back(Ok(sample));
    }

    /// Queue a failed read (dropped if the queue is full)
    pub fn push_error(&mut self, error: SensorError) {
        let _ = self.script.push_back(Err(error));
    }

    pub fn set_default(&mut self, sample: RawImuSample) {
        self.default_sample = sample;
    }

    /// Number of reads performed
    pub fn reads(&self) -> u32 {
        self.reads
    }
}

impl ImuBus for MockImu {
    fn read_raw(&mut self) -> Result<RawImuSample, SensorError> {
        self.reads += 1;
        self.script.pop_front().unwrap_or(Ok(self.default_sample))
    }
}

/// Mock ranging sensor returning scripted results in order.
///
/// Once the script runs dry it reports `SensorError::NotReady`.
pub struct MockRanging {
    script: Deque<Result<DistanceSample, SensorError>, MOCK_QUEUE_LEN>,
    reads: u32,
}

impl MockRanging {
    pub fn new() -> Self {
        Self {
            script: Deque::new(),
            reads: 0,
        }
    }

    /// Mock with a scripted sequence of measurements
    pub fn with_samples(samples: &[DistanceSample]) -> Self {
        let mut mock = Self::new();
        for sample in samples.iter().take(MOCK_QUEUE_LEN) {
            mock.push_sample(*sample);
        }
        mock
    }

    pub fn push_sample(&mut self, sample: DistanceSample) {
        let _ = self.script.push_back(Ok(sample));
    }

    pub fn push_error(&mut self, error: SensorError) {
        let _ = self.script.push_back(Err(error));
    }

    pub fn reads(&self) -> u32 {
        self.reads
    }
}

impl Default for MockRanging {
    fn default() -> Self {
        Self::new()
    }
}

impl RangingDevice for MockRanging {
    fn measure(&mut self) -> Result<DistanceSample, SensorError> {
        self.reads += 1;
        self.script
            .pop_front()
            .unwrap_or(Err(SensorError::NotReady))
    }
}
