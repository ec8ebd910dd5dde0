//! Orientation source: raw IMU counts to calibrated orientation data
//!
//! Owns the calibration offsets and the last good estimate. A failed bus
//! read leaves the previous estimate in place and reports it as stale.

use embedded_hal::delay::DelayNs;

use super::calibration::{
    AngleBiasAccumulator, CalibrationError, CalibrationOffsets, CalibrationReport,
    GyroBiasAccumulator,
};
use super::types::{absolute_angles, ImuScale, OrientationEstimate, RawImuSample};
use crate::parameters::{CalibrationParams, ImuParams};
use crate::traits::{ImuBus, SensorError};

/// Result of polling the IMU once
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ReadOutcome {
    /// A new sample was converted
    Fresh,
    /// The read failed; the previous estimate is still current
    Stale(SensorError),
}

impl ReadOutcome {
    pub fn is_fresh(&self) -> bool {
        matches!(self, ReadOutcome::Fresh)
    }
}

/// Calibrated roll/pitch source over an [`ImuBus`].
pub struct OrientationSource<B: ImuBus> {
    bus: B,
    scale: ImuScale,
    calibration: CalibrationParams,
    offsets: CalibrationOffsets,
    last_raw: RawImuSample,
    estimate: OrientationEstimate,
}

impl<B: ImuBus> OrientationSource<B> {
    /// Source with the default ±8 g / ±500 °/s scales and no offsets
    pub fn new(bus: B) -> Self {
        Self::with_params(bus, &ImuParams::default(), &CalibrationParams::default())
    }

    pub fn with_params(bus: B, imu: &ImuParams, calibration: &CalibrationParams) -> Self {
        Self {
            bus,
            scale: imu.scale(),
            calibration: calibration.clone(),
            offsets: CalibrationOffsets::default(),
            last_raw: RawImuSample::default(),
            estimate: OrientationEstimate::default(),
        }
    }

    /// Convert one raw sample with the current offsets.
    ///
    /// Pure: does not touch the stored estimate. Implausible input just runs
    /// through the formulas.
    pub fn read_sample(&self, raw: &RawImuSample) -> OrientationEstimate {
        let accel_g = self.scale.accel_g(raw);
        let rate_dps = self.scale.rate_dps(raw) - self.offsets.gyro_bias();
        let (roll, pitch) = absolute_angles(&accel_g);

        OrientationEstimate {
            accel_g,
            rate_dps,
            accel_roll: roll - self.offsets.accel_roll,
            accel_pitch: pitch - self.offsets.accel_pitch,
        }
    }

    /// Read the bus and refresh the estimate.
    pub fn update(&mut self) -> ReadOutcome {
        match self.bus.read_raw() {
            Ok(raw) => {
                self.last_raw = raw;
                self.estimate = self.read_sample(&raw);
                ReadOutcome::Fresh
            }
            Err(e) => {
                crate::log_trace!("imu read failed: {}", e.as_str());
                ReadOutcome::Stale(e)
            }
        }
    }

    /// Latest estimate (stale if the last read failed)
    pub fn estimate(&self) -> &OrientationEstimate {
        &self.estimate
    }

    pub fn offsets(&self) -> &CalibrationOffsets {
        &self.offsets
    }

    pub fn scale(&self) -> &ImuScale {
        &self.scale
    }

    pub fn bus(&self) -> &B {
        &self.bus
    }

    pub fn bus_mut(&mut self) -> &mut B {
        &mut self.bus
    }

    /// Average `samples` uncorrected gyro readings into the gyro bias.
    ///
    /// The platform must be stationary. Blocks for `samples` times the
    /// configured gyro settle delay. A failed read counts the previous raw
    /// sample again.
    pub fn calibrate_gyro<D: DelayNs>(
        &mut self,
        delay: &mut D,
        samples: u32,
    ) -> Result<CalibrationReport, CalibrationError> {
        if samples == 0 {
            return Err(CalibrationError::NoSamples);
        }

        crate::log_info!("gyro calibration: {} samples", samples);
        self.offsets.gyro_roll = 0.0;
        self.offsets.gyro_pitch = 0.0;
        self.offsets.gyro_yaw = 0.0;

        let mut acc = GyroBiasAccumulator::new();
        let mut bus_failures = 0;
        for _ in 0..samples {
            if !self.update().is_fresh() {
                bus_failures += 1;
            }
            acc.add(&self.last_raw);
            delay.delay_ms(self.calibration.gyro_delay_ms);
        }

        let bias = acc
            .mean_dps(&self.scale)
            .ok_or(CalibrationError::NoSamples)?;
        self.offsets.gyro_roll = bias.x;
        self.offsets.gyro_pitch = bias.y;
        self.offsets.gyro_yaw = bias.z;
        self.estimate = self.read_sample(&self.last_raw);

        crate::log_info!(
            "gyro bias: roll={} pitch={} yaw={} dps ({} bus failures)",
            bias.x,
            bias.y,
            bias.z,
            bus_failures
        );
        Ok(CalibrationReport {
            samples,
            bus_failures,
        })
    }

    /// Average `samples` absolute roll/pitch readings into the accel bias.
    ///
    /// The platform must be level. Blocks for `samples` times the
    /// configured accel settle delay.
    pub fn calibrate_accel<D: DelayNs>(
        &mut self,
        delay: &mut D,
        samples: u32,
    ) -> Result<CalibrationReport, CalibrationError> {
        if samples == 0 {
            return Err(CalibrationError::NoSamples);
        }

        crate::log_info!("accel calibration: {} samples", samples);
        self.offsets.accel_roll = 0.0;
        self.offsets.accel_pitch = 0.0;

        let mut acc = AngleBiasAccumulator::new();
        let mut bus_failures = 0;
        for _ in 0..samples {
            if !self.update().is_fresh() {
                bus_failures += 1;
            }
            acc.add(&self.last_raw, &self.scale);
            delay.delay_ms(self.calibration.accel_delay_ms);
        }

        let (roll, pitch) = acc.mean_deg().ok_or(CalibrationError::NoSamples)?;
        self.offsets.accel_roll = roll;
        self.offsets.accel_pitch = pitch;
        self.estimate = self.read_sample(&self.last_raw);

        crate::log_info!(
            "accel bias: roll={} pitch={} deg ({} bus failures)",
            roll,
            pitch,
            bus_failures
        );
        Ok(CalibrationReport {
            samples,
            bus_failures,
        })
    }

    /// Gyro then accel calibration with the configured sample counts.
    pub fn calibrate<D: DelayNs>(
        &mut self,
        delay: &mut D,
    ) -> Result<(CalibrationReport, CalibrationReport), CalibrationError> {
        let gyro = self.calibrate_gyro(delay, self.calibration.gyro_samples)?;
        let accel = self.calibrate_accel(delay, self.calibration.accel_samples)?;
        Ok((gyro, accel))
    }
}
