//! Ranging sample and output types

/// Status code the VL53L0X reports for a phase failure / out-of-range target
pub const RANGE_STATUS_OUT_OF_RANGE: u8 = 4;

/// Smallest distance the sensor measures reliably (mm)
pub const MIN_VALID_MM: u16 = 30;

/// Largest distance the sensor measures reliably (mm)
pub const MAX_VALID_MM: u16 = 2000;

/// One measurement from the time-of-flight sensor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DistanceSample {
    /// Raw range in millimetres
    pub distance_mm: u16,
    /// Sensor-reported range status
    pub status: u8,
}

impl DistanceSample {
    pub const fn new(distance_mm: u16, status: u8) -> Self {
        Self {
            distance_mm,
            status,
        }
    }

    /// A sample with status 0 (valid)
    pub const fn valid(distance_mm: u16) -> Self {
        Self::new(distance_mm, 0)
    }
}

/// Why an output was held instead of refreshed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StaleReason {
    /// Sensor flagged the measurement invalid
    InvalidStatus,
    /// Raw value outside the physical operating range
    OutOfBounds,
    /// The read itself failed
    ReadFailed,
}

/// Whether an output reflects the latest sample
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Freshness {
    Fresh,
    Stale(StaleReason),
}

/// Filtered distance plus its freshness
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RangeReading {
    /// Smoothed distance truncated to whole millimetres
    pub distance_mm: u16,
    pub freshness: Freshness,
}

impl RangeReading {
    pub fn is_fresh(&self) -> bool {
        self.freshness == Freshness::Fresh
    }
}
