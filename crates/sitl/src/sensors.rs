//! Simulated IMU and time-of-flight sensors.
//!
//! Both sensors synthesize readings from a motion profile evaluated at the
//! shared simulation clock, then add seeded Gaussian noise and inject the
//! faults the filters are meant to survive: accelerometer spikes, range
//! outliers, invalid range statuses and bus failures.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use tiltrange_core::orientation::{RawImuSample, ACCEL_LSB_PER_G, GYRO_LSB_PER_DPS};
use tiltrange_core::ranging::{DistanceSample, RANGE_STATUS_OUT_OF_RANGE};
use tiltrange_core::traits::{ImuBus, RangingDevice, SensorError, TimeSource};

use crate::time::SitlClock;

/// Platform attitude over time.
#[derive(Debug, Clone, PartialEq)]
pub enum MotionProfile {
    /// Fixed tilt
    Static { roll_deg: f32, pitch_deg: f32 },
    /// Sinusoidal sway around level, both axes in phase
    Sway {
        roll_amplitude_deg: f32,
        pitch_amplitude_deg: f32,
        period_us: u64,
    },
}

impl Default for MotionProfile {
    fn default() -> Self {
        Self::level()
    }
}

impl MotionProfile {
    pub fn level() -> Self {
        Self::Static {
            roll_deg: 0.0,
            pitch_deg: 0.0,
        }
    }

    /// Roll and pitch in degrees at `t_us`
    pub fn attitude_at(&self, t_us: u64) -> (f32, f32) {
        match *self {
            Self::Static {
                roll_deg,
                pitch_deg,
            } => (roll_deg, pitch_deg),
            Self::Sway {
                roll_amplitude_deg,
                pitch_amplitude_deg,
                period_us,
            } => {
                let s = phase(t_us, period_us).sin();
                (roll_amplitude_deg * s, pitch_amplitude_deg * s)
            }
        }
    }

    /// Roll and pitch rates in deg/s at `t_us`
    pub fn rates_at(&self, t_us: u64) -> (f32, f32) {
        match *self {
            Self::Static { .. } => (0.0, 0.0),
            Self::Sway {
                roll_amplitude_deg,
                pitch_amplitude_deg,
                period_us,
            } => {
                if period_us == 0 {
                    return (0.0, 0.0);
                }
                let omega = std::f32::consts::TAU / (period_us as f32 * 1e-6);
                let c = phase(t_us, period_us).cos() * omega;
                (roll_amplitude_deg * c, pitch_amplitude_deg * c)
            }
        }
    }
}

fn phase(t_us: u64, period_us: u64) -> f32 {
    if period_us == 0 {
        return 0.0;
    }
    std::f32::consts::TAU * (t_us % period_us) as f32 / period_us as f32
}

/// Configuration for the simulated IMU.
#[derive(Debug, Clone)]
pub struct ImuSimConfig {
    /// Accelerometer LSB per g
    pub accel_lsb_per_g: f32,
    /// Gyroscope LSB per deg/s
    pub gyro_lsb_per_dps: f32,
    /// Accelerometer noise standard deviation in g.
    pub accel_noise_g: f32,
    /// Gyroscope noise standard deviation in deg/s.
    pub gyro_noise_dps: f32,
    /// Constant gyro bias in deg/s (roll, pitch, yaw).
    pub gyro_bias_dps: [f32; 3],
    /// Probability per read of a lateral acceleration spike.
    pub spike_probability: f64,
    /// Spike magnitude in g, added to the x axis.
    pub spike_g: f32,
    /// Probability per read of a bus failure.
    pub failure_probability: f64,
    /// RNG seed for deterministic mode. None = random.
    pub seed: Option<u64>,
}

impl Default for ImuSimConfig {
    fn default() -> Self {
        Self {
            accel_lsb_per_g: ACCEL_LSB_PER_G,
            gyro_lsb_per_dps: GYRO_LSB_PER_DPS,
            accel_noise_g: 0.01,
            gyro_noise_dps: 0.1,
            gyro_bias_dps: [1.5, -0.8, 0.3],
            spike_probability: 0.0,
            spike_g: 2.0,
            failure_probability: 0.0,
            seed: None,
        }
    }
}

impl ImuSimConfig {
    /// Noise and bias off, only the motion profile
    pub fn ideal() -> Self {
        Self {
            accel_noise_g: 0.0,
            gyro_noise_dps: 0.0,
            gyro_bias_dps: [0.0; 3],
            seed: Some(0),
            ..Self::default()
        }
    }
}

/// Simulated 6-axis IMU producing raw counts.
pub struct SimulatedImu {
    config: ImuSimConfig,
    profile: MotionProfile,
    clock: SitlClock,
    rng: StdRng,
    reads: u64,
}

impl SimulatedImu {
    pub fn new(clock: SitlClock, profile: MotionProfile, config: ImuSimConfig) -> Self {
        let rng = seeded_rng(config.seed);
        Self {
            config,
            profile,
            clock,
            rng,
            reads: 0,
        }
    }

    pub fn set_profile(&mut self, profile: MotionProfile) {
        self.profile = profile;
    }

    pub fn profile(&self) -> &MotionProfile {
        &self.profile
    }

    /// Adjust noise and fault injection mid-run
    pub fn config_mut(&mut self) -> &mut ImuSimConfig {
        &mut self.config
    }

    /// Number of reads attempted
    pub fn reads(&self) -> u64 {
        self.reads
    }

    /// Gravity vector in g for a roll/pitch attitude.
    fn gravity_g(roll_deg: f32, pitch_deg: f32) -> [f32; 3] {
        let (sr, cr) = roll_deg.to_radians().sin_cos();
        let (sp, cp) = pitch_deg.to_radians().sin_cos();
        [-sp, sr * cp, cr * cp]
    }

    fn synthesize(&mut self, t_us: u64) -> RawImuSample {
        let (roll, pitch) = self.profile.attitude_at(t_us);
        let (roll_rate, pitch_rate) = self.profile.rates_at(t_us);

        let mut accel = Self::gravity_g(roll, pitch);
        for a in accel.iter_mut() {
            *a += gaussian_noise(&mut self.rng, self.config.accel_noise_g);
        }
        if self.config.spike_probability > 0.0 && self.rng.gen_bool(self.config.spike_probability)
        {
            accel[0] += self.config.spike_g;
        }

        let bias = self.config.gyro_bias_dps;
        let gyro = [roll_rate + bias[0], pitch_rate + bias[1], bias[2]];
        let mut gyro_counts = [0i16; 3];
        for (count, rate) in gyro_counts.iter_mut().zip(gyro) {
            let noisy = rate + gaussian_noise(&mut self.rng, self.config.gyro_noise_dps);
            *count = to_counts(noisy, self.config.gyro_lsb_per_dps);
        }

        RawImuSample::new(
            accel.map(|a| to_counts(a, self.config.accel_lsb_per_g)),
            gyro_counts,
        )
    }
}

impl ImuBus for SimulatedImu {
    fn read_raw(&mut self) -> Result<RawImuSample, SensorError> {
        self.reads += 1;
        if self.config.failure_probability > 0.0
            && self.rng.gen_bool(self.config.failure_probability)
        {
            return Err(SensorError::Bus);
        }
        let t_us = self.clock.now_us();
        Ok(self.synthesize(t_us))
    }
}

/// Configuration for the simulated time-of-flight sensor.
#[derive(Debug, Clone)]
pub struct RangeSimConfig {
    /// Noise standard deviation in mm.
    pub noise_mm: f32,
    /// Probability per read of a single-sample outlier.
    pub spike_probability: f64,
    /// Outlier offset in mm.
    pub spike_mm: f32,
    /// Probability per read of an out-of-range status.
    pub invalid_probability: f64,
    /// Probability per read of a bus failure.
    pub failure_probability: f64,
    /// RNG seed for deterministic mode. None = random.
    pub seed: Option<u64>,
}

impl Default for RangeSimConfig {
    fn default() -> Self {
        Self {
            noise_mm: 3.0,
            spike_probability: 0.0,
            spike_mm: 800.0,
            invalid_probability: 0.0,
            failure_probability: 0.0,
            seed: None,
        }
    }
}

impl RangeSimConfig {
    pub fn ideal() -> Self {
        Self {
            noise_mm: 0.0,
            seed: Some(0),
            ..Self::default()
        }
    }
}

/// Simulated time-of-flight sensor measuring a settable true distance.
pub struct SimulatedRanging {
    config: RangeSimConfig,
    true_mm: f32,
    rng: StdRng,
    reads: u64,
}

impl SimulatedRanging {
    pub fn new(true_mm: u16, config: RangeSimConfig) -> Self {
        let rng = seeded_rng(config.seed);
        Self {
            config,
            true_mm: f32::from(true_mm),
            rng,
            reads: 0,
        }
    }

    pub fn set_distance_mm(&mut self, mm: u16) {
        self.true_mm = f32::from(mm);
    }

    pub fn distance_mm(&self) -> u16 {
        self.true_mm as u16
    }

    pub fn config_mut(&mut self) -> &mut RangeSimConfig {
        &mut self.config
    }

    pub fn reads(&self) -> u64 {
        self.reads
    }
}

impl RangingDevice for SimulatedRanging {
    fn measure(&mut self) -> Result<DistanceSample, SensorError> {
        self.reads += 1;
        let cfg = &self.config;
        if cfg.failure_probability > 0.0 && self.rng.gen_bool(cfg.failure_probability) {
            return Err(SensorError::Bus);
        }

        let mut mm = self.true_mm + gaussian_noise(&mut self.rng, cfg.noise_mm);
        if cfg.spike_probability > 0.0 && self.rng.gen_bool(cfg.spike_probability) {
            mm += cfg.spike_mm;
        }
        // Float-to-int casts saturate, so negative noise clamps at 0
        let distance_mm = mm.round() as u16;

        if cfg.invalid_probability > 0.0 && self.rng.gen_bool(cfg.invalid_probability) {
            return Ok(DistanceSample::new(distance_mm, RANGE_STATUS_OUT_OF_RANGE));
        }
        Ok(DistanceSample::valid(distance_mm))
    }
}

fn seeded_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    }
}

/// Convert a physical value to saturated sensor counts.
fn to_counts(value: f32, lsb_per_unit: f32) -> i16 {
    (value * lsb_per_unit).round() as i16
}

/// Generate Gaussian noise using Box-Muller transform.
fn gaussian_noise(rng: &mut StdRng, stddev: f32) -> f32 {
    if stddev == 0.0 {
        return 0.0;
    }
    let u1: f32 = rng.gen::<f32>().max(f32::EPSILON);
    let u2: f32 = rng.gen();
    let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f32::consts::PI * u2).cos();
    z * stddev
}

#[cfg(test)]
mod tests {
    use super::*;
    use tiltrange_core::orientation::{absolute_angles, ImuScale};

    fn level_imu(config: ImuSimConfig) -> SimulatedImu {
        SimulatedImu::new(SitlClock::new(), MotionProfile::level(), config)
    }

    #[test]
    fn test_level_ideal_imu_reads_one_g() {
        let mut imu = level_imu(ImuSimConfig::ideal());
        let raw = imu.read_raw().unwrap();
        assert_eq!(raw.accel, [0, 0, 4096]);
        assert_eq!(raw.gyro, [0, 0, 0]);
    }

    #[test]
    fn test_static_tilt_recovered_by_absolute_angles() {
        let profile = MotionProfile::Static {
            roll_deg: 0.0,
            pitch_deg: 20.0,
        };
        let mut imu = SimulatedImu::new(SitlClock::new(), profile, ImuSimConfig::ideal());
        let raw = imu.read_raw().unwrap();
        let (roll, pitch) = absolute_angles(&ImuScale::default().accel_g(&raw));
        assert!(roll.abs() < 0.05);
        assert!((pitch - 20.0).abs() < 0.05, "pitch = {pitch}");
    }

    #[test]
    fn test_gyro_bias_in_counts() {
        let mut imu = level_imu(ImuSimConfig {
            gyro_bias_dps: [1.0, -2.0, 0.5],
            ..ImuSimConfig::ideal()
        });
        let raw = imu.read_raw().unwrap();
        // 65.5 LSB per deg/s, rounded
        assert_eq!(raw.gyro, [66, -131, 33]);
    }

    #[test]
    fn test_sway_follows_clock() {
        let clock = SitlClock::new();
        let profile = MotionProfile::Sway {
            roll_amplitude_deg: 10.0,
            pitch_amplitude_deg: 0.0,
            period_us: 4_000_000,
        };
        assert_eq!(profile.attitude_at(0), (0.0, 0.0));
        let (roll, _) = profile.attitude_at(1_000_000);
        assert!((roll - 10.0).abs() < 1e-3);

        let mut imu = SimulatedImu::new(clock.clone(), profile, ImuSimConfig::ideal());
        clock.set_us(1_000_000);
        let raw = imu.read_raw().unwrap();
        let (roll, _) = absolute_angles(&ImuScale::default().accel_g(&raw));
        assert!((roll - 10.0).abs() < 0.05, "roll = {roll}");
    }

    #[test]
    fn test_sway_rate_peaks_at_zero_crossing() {
        let profile = MotionProfile::Sway {
            roll_amplitude_deg: 10.0,
            pitch_amplitude_deg: 5.0,
            period_us: 2_000_000,
        };
        let (roll_rate, pitch_rate) = profile.rates_at(0);
        // A * 2π / T
        assert!((roll_rate - 10.0 * std::f32::consts::PI).abs() < 1e-3);
        assert!((pitch_rate - 5.0 * std::f32::consts::PI).abs() < 1e-3);
    }

    #[test]
    fn test_seeded_imu_is_deterministic() {
        let config = ImuSimConfig {
            seed: Some(42),
            ..ImuSimConfig::default()
        };
        let mut a = level_imu(config.clone());
        let mut b = level_imu(config);
        for _ in 0..20 {
            assert_eq!(a.read_raw(), b.read_raw());
        }
    }

    #[test]
    fn test_imu_failures_injected() {
        let mut imu = level_imu(ImuSimConfig {
            failure_probability: 1.0,
            ..ImuSimConfig::ideal()
        });
        assert_eq!(imu.read_raw(), Err(SensorError::Bus));
        assert_eq!(imu.reads(), 1);
    }

    #[test]
    fn test_imu_spike_on_x_axis() {
        let mut imu = level_imu(ImuSimConfig {
            spike_probability: 1.0,
            spike_g: 1.0,
            ..ImuSimConfig::ideal()
        });
        let raw = imu.read_raw().unwrap();
        assert_eq!(raw.accel, [4096, 0, 4096]);
    }

    #[test]
    fn test_ranging_ideal() {
        let mut tof = SimulatedRanging::new(750, RangeSimConfig::ideal());
        assert_eq!(tof.measure(), Ok(DistanceSample::valid(750)));
        tof.set_distance_mm(1200);
        assert_eq!(tof.measure(), Ok(DistanceSample::valid(1200)));
        assert_eq!(tof.reads(), 2);
    }

    #[test]
    fn test_ranging_invalid_status_injected() {
        let mut tof = SimulatedRanging::new(
            750,
            RangeSimConfig {
                invalid_probability: 1.0,
                ..RangeSimConfig::ideal()
            },
        );
        let sample = tof.measure().unwrap();
        assert_eq!(sample.status, RANGE_STATUS_OUT_OF_RANGE);
    }

    #[test]
    fn test_ranging_noise_has_spread() {
        let mut tof = SimulatedRanging::new(
            1000,
            RangeSimConfig {
                noise_mm: 5.0,
                seed: Some(7),
                ..RangeSimConfig::default()
            },
        );
        let readings: Vec<u16> = (0..200)
            .map(|_| tof.measure().unwrap().distance_mm)
            .collect();
        let mean = readings.iter().map(|&r| f32::from(r)).sum::<f32>() / 200.0;
        assert!((mean - 1000.0).abs() < 2.0, "mean = {mean}");
        assert!(readings.iter().any(|&r| r != 1000));
    }

    #[test]
    fn test_to_counts_saturates() {
        assert_eq!(to_counts(100.0, 4096.0), i16::MAX);
        assert_eq!(to_counts(-100.0, 4096.0), i16::MIN);
    }
}
