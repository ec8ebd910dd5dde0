//! Complementary filter for roll and pitch
//!
//! Blends gyro rate integration (smooth, drifts) with accelerometer absolute
//! angles (noisy, no drift):
//!
//! ```text
//! roll = α · (roll + gyro_roll · dt) + (1 − α) · accel_roll
//! ```
//!
//! α is fixed at construction. Two guards protect the estimate: updates with
//! an implausible `dt` are dropped, and absolute angles that jump more than
//! the spike threshold away from the current estimate are replaced by the
//! current estimate for that update.

use libm::fabsf;

use crate::parameters::FusionParams;
use crate::traits::TimeSource;

/// Default weight of the rate-integrated term
pub const DEFAULT_ALPHA: f32 = 0.96;

/// Shortest accepted interval between updates (µs)
pub const MIN_DT_US: u64 = 2_000;

/// Longest accepted interval between updates (µs)
pub const MAX_DT_US: u64 = 50_000;

/// Largest accepted jump between absolute input and estimate (degrees)
pub const SPIKE_THRESHOLD_DEG: f32 = 45.0;

/// Read-side clamp for roll and pitch (degrees)
pub const ANGLE_LIMIT_DEG: f32 = 90.0;

/// Lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FilterState {
    /// Constructed, `begin` not yet called
    Uninitialized,
    /// `begin` called; `reset` keeps it here
    Running,
}

/// What a single `update` call did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum UpdateOutcome {
    /// Attitude was fused. Spike flags mark axes whose absolute input was
    /// replaced by the current estimate.
    Fused { roll_spike: bool, pitch_spike: bool },
    /// `dt` outside the accepted window; attitude untouched
    DiscardedTiming { dt_us: u64 },
}

impl UpdateOutcome {
    pub fn is_fused(&self) -> bool {
        matches!(self, UpdateOutcome::Fused { .. })
    }
}

/// Fused roll/pitch and the time of the last update.
///
/// Stored values are not clamped and may briefly exceed ±90°.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FusedAttitude {
    pub roll: f32,
    pub pitch: f32,
    pub timestamp_us: u64,
}

/// First-order complementary filter over an injected clock.
pub struct ComplementaryFilter<T: TimeSource> {
    time: T,
    alpha: f32,
    min_dt_us: u64,
    max_dt_us: u64,
    spike_threshold_deg: f32,
    state: FilterState,
    attitude: FusedAttitude,
}

impl<T: TimeSource> ComplementaryFilter<T> {
    /// Filter with the given α and default guards.
    ///
    /// α is clamped to [0.0, 1.0].
    pub fn new(time: T, alpha: f32) -> Self {
        Self::with_params(
            time,
            &FusionParams {
                alpha,
                ..FusionParams::default()
            },
        )
    }

    pub fn with_params(time: T, params: &FusionParams) -> Self {
        Self {
            time,
            alpha: params.alpha.clamp(0.0, 1.0),
            min_dt_us: params.min_dt_us,
            max_dt_us: params.max_dt_us,
            spike_threshold_deg: params.spike_threshold_deg,
            state: FilterState::Uninitialized,
            attitude: FusedAttitude::default(),
        }
    }

    /// Zero the attitude, sync the timestamp to now, enter `Running`.
    pub fn begin(&mut self) {
        self.clear();
        self.state = FilterState::Running;
        crate::log_info!("complementary filter started, alpha={}", self.alpha);
    }

    /// Zero the attitude and resync the timestamp. Callable at any time.
    pub fn reset(&mut self) {
        self.clear();
        self.state = FilterState::Running;
        crate::log_info!("complementary filter reset");
    }

    fn clear(&mut self) {
        self.attitude = FusedAttitude {
            roll: 0.0,
            pitch: 0.0,
            timestamp_us: self.time.now_us(),
        };
    }

    /// Fuse one set of rate (deg/s) and absolute angle (deg) inputs.
    ///
    /// The timestamp always moves to now, even when the update is
    /// discarded, so a burst of calls less than `min_dt` apart never fuses.
    pub fn update(
        &mut self,
        gyro_roll: f32,
        gyro_pitch: f32,
        accel_roll: f32,
        accel_pitch: f32,
    ) -> UpdateOutcome {
        let now = self.time.now_us();
        let dt_us = now.saturating_sub(self.attitude.timestamp_us);
        self.attitude.timestamp_us = now;

        if dt_us < self.min_dt_us || dt_us > self.max_dt_us {
            crate::log_trace!("fusion update discarded: dt={}us", dt_us);
            return UpdateOutcome::DiscardedTiming { dt_us };
        }

        let dt = dt_us as f32 * 1e-6;
        let (roll, pitch) = (self.attitude.roll, self.attitude.pitch);

        let predicted_roll = roll + gyro_roll * dt;
        let predicted_pitch = pitch + gyro_pitch * dt;

        let roll_spike = fabsf(accel_roll - roll) > self.spike_threshold_deg;
        let pitch_spike = fabsf(accel_pitch - pitch) > self.spike_threshold_deg;
        let accel_roll = if roll_spike { roll } else { accel_roll };
        let accel_pitch = if pitch_spike { pitch } else { accel_pitch };
        if roll_spike || pitch_spike {
            crate::log_debug!(
                "absolute angle spike rejected (roll={} pitch={})",
                roll_spike,
                pitch_spike
            );
        }

        let a = self.alpha;
        self.attitude.roll = a * predicted_roll + (1.0 - a) * accel_roll;
        self.attitude.pitch = a * predicted_pitch + (1.0 - a) * accel_pitch;

        UpdateOutcome::Fused {
            roll_spike,
            pitch_spike,
        }
    }

    /// Fused roll clamped to ±90°
    pub fn roll(&self) -> f32 {
        self.attitude.roll.clamp(-ANGLE_LIMIT_DEG, ANGLE_LIMIT_DEG)
    }

    /// Fused pitch clamped to ±90°
    pub fn pitch(&self) -> f32 {
        self.attitude.pitch.clamp(-ANGLE_LIMIT_DEG, ANGLE_LIMIT_DEG)
    }

    /// Unclamped internal state
    pub fn attitude(&self) -> &FusedAttitude {
        &self.attitude
    }

    pub fn state(&self) -> FilterState {
        self.state
    }

    pub fn alpha(&self) -> f32 {
        self.alpha
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::MockTime;

    const EPSILON: f32 = 1e-4;

    fn running(time: &MockTime) -> ComplementaryFilter<&MockTime> {
        let mut filter = ComplementaryFilter::new(time, DEFAULT_ALPHA);
        filter.begin();
        filter
    }

    /// Drive the filter to a known non-zero attitude
    fn settle_at(filter: &mut ComplementaryFilter<&MockTime>, time: &MockTime, angle: f32) {
        for _ in 0..400 {
            time.advance(10_000);
            filter.update(0.0, 0.0, angle, angle);
        }
    }

    #[test]
    fn test_begin_enters_running_with_zero_attitude() {
        let time = MockTime::with_initial(123_456);
        let mut filter = ComplementaryFilter::new(&time, DEFAULT_ALPHA);
        assert_eq!(filter.state(), FilterState::Uninitialized);

        filter.begin();
        assert_eq!(filter.state(), FilterState::Running);
        assert_eq!(filter.roll(), 0.0);
        assert_eq!(filter.pitch(), 0.0);
        assert_eq!(filter.attitude().timestamp_us, 123_456);
    }

    #[test]
    fn test_fusion_formula() {
        let time = MockTime::new();
        let mut filter = running(&time);

        time.advance(10_000);
        let outcome = filter.update(20.0, -10.0, 5.0, -3.0);
        assert_eq!(
            outcome,
            UpdateOutcome::Fused {
                roll_spike: false,
                pitch_spike: false
            }
        );

        let dt = 0.01;
        let expected_roll = 0.96 * (0.0 + 20.0 * dt) + 0.04 * 5.0;
        let expected_pitch = 0.96 * (0.0 - 10.0 * dt) + 0.04 * -3.0;
        assert!((filter.roll() - expected_roll).abs() < EPSILON);
        assert!((filter.pitch() - expected_pitch).abs() < EPSILON);
    }

    #[test]
    fn test_fusion_formula_from_nonzero_state() {
        let time = MockTime::new();
        let mut filter = running(&time);
        settle_at(&mut filter, &time, 30.0);
        let prev = filter.attitude().roll;

        time.advance(20_000);
        filter.update(15.0, 0.0, 32.0, 30.0);

        let expected = 0.96 * (prev + 15.0 * 0.02) + 0.04 * 32.0;
        assert!((filter.attitude().roll - expected).abs() < EPSILON);
    }

    #[test]
    fn test_dt_window_edges() {
        let time = MockTime::new();
        let mut filter = running(&time);

        time.advance(MIN_DT_US - 1);
        assert_eq!(
            filter.update(100.0, 100.0, 10.0, 10.0),
            UpdateOutcome::DiscardedTiming { dt_us: 1_999 }
        );
        assert_eq!(filter.roll(), 0.0);

        time.advance(MIN_DT_US);
        assert!(filter.update(100.0, 100.0, 10.0, 10.0).is_fused());

        time.advance(MAX_DT_US);
        assert!(filter.update(0.0, 0.0, 0.0, 0.0).is_fused());

        let before = *filter.attitude();
        time.advance(MAX_DT_US + 1);
        assert_eq!(
            filter.update(100.0, 100.0, 10.0, 10.0),
            UpdateOutcome::DiscardedTiming { dt_us: 50_001 }
        );
        assert_eq!(filter.attitude().roll, before.roll);
        assert_eq!(filter.attitude().pitch, before.pitch);
    }

    #[test]
    fn test_discard_still_advances_timestamp() {
        let time = MockTime::new();
        let mut filter = running(&time);

        // 60 ms gap is discarded but becomes the new baseline
        time.advance(60_000);
        assert!(!filter.update(0.0, 0.0, 1.0, 1.0).is_fused());
        assert_eq!(filter.attitude().timestamp_us, 60_000);

        time.advance(10_000);
        assert!(filter.update(0.0, 0.0, 1.0, 1.0).is_fused());
    }

    #[test]
    fn test_fast_burst_never_fuses() {
        let time = MockTime::new();
        let mut filter = running(&time);

        for _ in 0..50 {
            time.advance(1_500);
            assert!(!filter.update(50.0, 50.0, 20.0, 20.0).is_fused());
        }
        assert_eq!(filter.roll(), 0.0);
        assert_eq!(filter.pitch(), 0.0);
    }

    #[test]
    fn test_spike_substitutes_current_estimate() {
        let time = MockTime::new();
        let mut filter = running(&time);
        settle_at(&mut filter, &time, 10.0);
        let prev_roll = filter.attitude().roll;
        let prev_pitch = filter.attitude().pitch;

        time.advance(10_000);
        let outcome = filter.update(0.0, 0.0, prev_roll + 60.0, prev_pitch + 5.0);
        assert_eq!(
            outcome,
            UpdateOutcome::Fused {
                roll_spike: true,
                pitch_spike: false
            }
        );

        // Spiked axis: accel term replaced by the previous estimate
        let expected_roll = 0.96 * prev_roll + 0.04 * prev_roll;
        let expected_pitch = 0.96 * prev_pitch + 0.04 * (prev_pitch + 5.0);
        assert!((filter.attitude().roll - expected_roll).abs() < EPSILON);
        assert!((filter.attitude().pitch - expected_pitch).abs() < EPSILON);
    }

    #[test]
    fn test_spike_threshold_is_exclusive() {
        let time = MockTime::new();
        let mut filter = running(&time);

        time.advance(10_000);
        let outcome = filter.update(0.0, 0.0, 45.0, -45.0);
        assert_eq!(
            outcome,
            UpdateOutcome::Fused {
                roll_spike: false,
                pitch_spike: false
            }
        );
        assert!((filter.roll() - 0.04 * 45.0).abs() < EPSILON);
    }

    #[test]
    fn test_reset_clears_state() {
        let time = MockTime::new();
        let mut filter = running(&time);
        settle_at(&mut filter, &time, 25.0);
        assert!(filter.roll() > 20.0);

        time.advance(7_777);
        filter.reset();
        assert_eq!(filter.roll(), 0.0);
        assert_eq!(filter.pitch(), 0.0);
        assert_eq!(filter.attitude().timestamp_us, time.now_us());
        assert_eq!(filter.state(), FilterState::Running);
    }

    #[test]
    fn test_read_clamps_without_mutating() {
        let time = MockTime::new();
        // α = 1: pure rate integration drives the stored angles past ±90°
        let mut filter = ComplementaryFilter::new(&time, 1.0);
        filter.begin();
        for _ in 0..10 {
            time.advance(50_000);
            filter.update(400.0, -400.0, 0.0, 0.0);
        }

        assert_eq!(filter.roll(), 90.0);
        assert_eq!(filter.pitch(), -90.0);
        assert!(filter.attitude().roll > 90.0);
        assert!(filter.attitude().pitch < -90.0);
    }

    #[test]
    fn test_update_before_begin_measures_from_time_zero() {
        let time = MockTime::new();
        let mut filter = ComplementaryFilter::new(&time, DEFAULT_ALPHA);

        time.advance(10_000);
        assert!(filter.update(0.0, 0.0, 5.0, 5.0).is_fused());
        assert_eq!(filter.state(), FilterState::Uninitialized);
    }

    #[test]
    fn test_alpha_is_clamped() {
        let time = MockTime::new();
        assert_eq!(ComplementaryFilter::new(&time, 1.5).alpha(), 1.0);
        assert_eq!(ComplementaryFilter::new(&time, -0.2).alpha(), 0.0);
    }

    #[test]
    fn test_converges_to_static_tilt() {
        let time = MockTime::new();
        let mut filter = running(&time);
        settle_at(&mut filter, &time, 12.0);
        assert!((filter.roll() - 12.0).abs() < 0.01);
        assert!((filter.pitch() - 12.0).abs() < 0.01);
    }
}
