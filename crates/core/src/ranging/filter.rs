//! Time-of-flight distance filter
//!
//! Per sample:
//!
//! 1. Invalid status (sensor sentinel) → hold the previous output
//! 2. Raw value outside the operating range → hold the previous output
//! 3. Accepted value enters the median window
//! 4. `filtered = β · median + (1 − β) · filtered`
//!
//! Rejected samples never enter the window. A sensor that keeps failing
//! leaves the output coasting on the last good value; the freshness tag on
//! [`RangeReading`] is the only way to tell.

use super::median::{MedianWindow, MEDIAN_WINDOW};
use super::types::{DistanceSample, Freshness, RangeReading, StaleReason};
use crate::parameters::RangingParams;
use crate::traits::RangingDevice;

/// Default weight of the newest median in the smoothed output
pub const DEFAULT_BETA: f32 = 0.6;

/// Median + exponential smoothing filter over a [`RangingDevice`].
pub struct RangingFilter<R: RangingDevice> {
    device: R,
    window: MedianWindow<MEDIAN_WINDOW>,
    filtered: f32,
    beta: f32,
    min_mm: u16,
    max_mm: u16,
    invalid_status: u8,
}

impl<R: RangingDevice> RangingFilter<R> {
    /// Filter with default bounds (30-2000 mm), β = 0.6 and status 4 as the
    /// invalid sentinel
    pub fn new(device: R) -> Self {
        Self::with_params(device, &RangingParams::default())
    }

    pub fn with_params(device: R, params: &RangingParams) -> Self {
        Self {
            device,
            window: MedianWindow::new(),
            filtered: 0.0,
            beta: params.beta.clamp(0.0, 1.0),
            min_mm: params.min_mm,
            max_mm: params.max_mm,
            invalid_status: params.invalid_status,
        }
    }

    /// Zero the window, cursor and smoothed output.
    pub fn begin(&mut self) {
        self.window.reset();
        self.filtered = 0.0;
        crate::log_info!("ranging filter started, beta={}", self.beta);
    }

    /// Measure once and return the filtered distance in whole millimetres.
    pub fn read_distance(&mut self) -> u16 {
        self.read_distance_with_status().distance_mm
    }

    /// Measure once and return the filtered distance with its freshness.
    pub fn read_distance_with_status(&mut self) -> RangeReading {
        match self.device.measure() {
            Ok(sample) => self.process(sample),
            Err(e) => {
                crate::log_trace!("ranging read failed: {}", e.as_str());
                self.hold(StaleReason::ReadFailed)
            }
        }
    }

    /// Run one already-acquired sample through the filter.
    pub fn process(&mut self, sample: DistanceSample) -> RangeReading {
        if sample.status == self.invalid_status {
            crate::log_trace!("range rejected: status {}", sample.status);
            return self.hold(StaleReason::InvalidStatus);
        }

        let raw = sample.distance_mm;
        if raw < self.min_mm || raw > self.max_mm {
            crate::log_trace!("range rejected: {}mm out of bounds", raw);
            return self.hold(StaleReason::OutOfBounds);
        }

        let median = self.window.push(raw);
        self.filtered = self.beta * f32::from(median) + (1.0 - self.beta) * self.filtered;

        RangeReading {
            distance_mm: self.output_mm(),
            freshness: Freshness::Fresh,
        }
    }

    fn hold(&self, reason: StaleReason) -> RangeReading {
        RangeReading {
            distance_mm: self.output_mm(),
            freshness: Freshness::Stale(reason),
        }
    }

    fn output_mm(&self) -> u16 {
        // Saturating float-to-int cast truncates toward zero
        self.filtered as u16
    }

    /// Current smoothed value before truncation
    pub fn filtered(&self) -> f32 {
        self.filtered
    }

    pub fn window(&self) -> &MedianWindow<MEDIAN_WINDOW> {
        &self.window
    }

    pub fn device_mut(&mut self) -> &mut R {
        &mut self.device
    }
}
