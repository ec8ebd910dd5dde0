//! The driving loop.
//!
//! Each step reads the IMU, fuses roll and pitch, measures and filters the
//! distance, and emits one telemetry frame. The runner owns the simulation
//! clock; every component that needs time shares it.

use std::io::Write;

use tiltrange_core::fusion::{ComplementaryFilter, UpdateOutcome};
use tiltrange_core::orientation::{CalibrationReport, OrientationSource, ReadOutcome};
use tiltrange_core::parameters::{
    self, CalibrationParams, FusionParams, ImuParams, ParameterStore, RangingParams,
};
use tiltrange_core::ranging::{RangeReading, RangingFilter};
use tiltrange_core::telemetry::TelemetryFrame;
use tiltrange_core::traits::{ImuBus, RangingDevice, TimeSource};

use crate::error::SitlError;
use crate::time::SitlClock;

/// Default loop period (100 Hz)
pub const DEFAULT_PERIOD_US: u64 = 10_000;

/// Store holding every group's defaults with `NAME=VALUE` overrides applied
pub fn parameter_store<S: AsRef<str>>(overrides: &[S]) -> Result<ParameterStore, SitlError> {
    let mut store = ParameterStore::new();
    parameters::register_all(&mut store).map_err(|error| SitlError::Parameter {
        name: String::from("*"),
        error,
    })?;

    for item in overrides {
        let item = item.as_ref();
        let Some((name, value)) = item.split_once('=') else {
            return Err(SitlError::InvalidArgument(format!(
                "expected NAME=VALUE, got '{item}'"
            )));
        };
        let name = name.trim();
        store
            .set_from_str(name, value)
            .map_err(|error| SitlError::Parameter {
                name: name.to_string(),
                error,
            })?;
    }
    Ok(store)
}

/// Everything one loop iteration produced
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepOutput {
    pub t_us: u64,
    pub imu: ReadOutcome,
    pub fusion: UpdateOutcome,
    pub range: RangeReading,
    pub frame: TelemetryFrame,
}

/// Counters over a run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunStats {
    pub steps: u64,
    pub fused: u64,
    pub discarded: u64,
    pub spikes: u64,
    pub imu_failures: u64,
    pub stale_ranges: u64,
}

impl RunStats {
    fn record(&mut self, out: &StepOutput) {
        self.steps += 1;
        match out.fusion {
            UpdateOutcome::Fused {
                roll_spike,
                pitch_spike,
            } => {
                self.fused += 1;
                if roll_spike || pitch_spike {
                    self.spikes += 1;
                }
            }
            UpdateOutcome::DiscardedTiming { .. } => self.discarded += 1,
        }
        if !out.imu.is_fresh() {
            self.imu_failures += 1;
        }
        if !out.range.is_fresh() {
            self.stale_ranges += 1;
        }
    }
}

/// Orientation source, complementary filter and ranging filter wired to one
/// clock.
pub struct SitlRunner<B: ImuBus, R: RangingDevice> {
    clock: SitlClock,
    source: OrientationSource<B>,
    fusion: ComplementaryFilter<SitlClock>,
    ranging: RangingFilter<R>,
    period_us: u64,
    stats: RunStats,
}

impl<B: ImuBus, R: RangingDevice> SitlRunner<B, R> {
    /// Runner with default parameters
    pub fn new(clock: SitlClock, imu: B, tof: R) -> Self {
        Self::with_store(clock, imu, tof, &ParameterStore::new())
    }

    /// Runner configured from a parameter store; missing entries use defaults.
    pub fn with_store(clock: SitlClock, imu: B, tof: R, store: &ParameterStore) -> Self {
        let fusion_params = FusionParams::from_store(store);
        let ranging_params = RangingParams::from_store(store);
        let source = OrientationSource::with_params(
            imu,
            &ImuParams::from_store(store),
            &CalibrationParams::from_store(store),
        );
        Self {
            fusion: ComplementaryFilter::with_params(clock.clone(), &fusion_params),
            ranging: RangingFilter::with_params(tof, &ranging_params),
            clock,
            source,
            period_us: DEFAULT_PERIOD_US,
            stats: RunStats::default(),
        }
    }

    pub fn set_period_us(&mut self, period_us: u64) {
        self.period_us = period_us;
    }

    pub fn period_us(&self) -> u64 {
        self.period_us
    }

    /// Run gyro and accel calibration; simulation time advances by the
    /// configured settle delays.
    pub fn calibrate(&mut self) -> Result<(CalibrationReport, CalibrationReport), SitlError> {
        let mut delay = self.clock.clone();
        let start_us = self.clock.now_us();
        let reports = self.source.calibrate(&mut delay)?;
        eprintln!(
            "[sitl] calibration done in {} ms simulated ({} + {} bus failures)",
            self.clock.elapsed_since(start_us) / 1000,
            reports.0.bus_failures,
            reports.1.bus_failures
        );
        Ok(reports)
    }

    /// Start both filters at the current time.
    pub fn begin(&mut self) {
        self.fusion.begin();
        self.ranging.begin();
        self.stats = RunStats::default();
    }

    /// Advance one period and run an iteration.
    pub fn step(&mut self) -> StepOutput {
        self.clock.advance_us(self.period_us);
        self.step_now()
    }

    /// Jump to `t_us` and run an iteration.
    pub fn step_at(&mut self, t_us: u64) -> StepOutput {
        self.clock.set_us(t_us);
        self.step_now()
    }

    fn step_now(&mut self) -> StepOutput {
        // A failed read leaves the previous estimate in place, which is what
        // gets fused
        let imu = self.source.update();
        let est = *self.source.estimate();
        let fusion = self.fusion.update(
            est.gyro_roll(),
            est.gyro_pitch(),
            est.accel_roll,
            est.accel_pitch,
        );
        let range = self.ranging.read_distance_with_status();

        let out = StepOutput {
            t_us: self.clock.now_us(),
            imu,
            fusion,
            range,
            frame: TelemetryFrame::from_outputs(
                self.fusion.roll(),
                self.fusion.pitch(),
                range.distance_mm,
            ),
        };
        self.stats.record(&out);
        out
    }

    /// Run `steps` periods, writing one telemetry line per step.
    pub fn run<W: Write>(&mut self, steps: u64, out: &mut W) -> Result<RunStats, SitlError> {
        for _ in 0..steps {
            let step = self.step();
            writeln!(out, "{}", step.frame)?;
        }
        Ok(self.stats)
    }

    /// Run one step per timestamp, writing one telemetry line per step.
    pub fn run_schedule<W, I>(&mut self, schedule: I, out: &mut W) -> Result<RunStats, SitlError>
    where
        W: Write,
        I: IntoIterator<Item = u64>,
    {
        for t_us in schedule {
            let step = self.step_at(t_us);
            writeln!(out, "{}", step.frame)?;
        }
        Ok(self.stats)
    }

    pub fn stats(&self) -> &RunStats {
        &self.stats
    }

    pub fn clock(&self) -> &SitlClock {
        &self.clock
    }

    pub fn source(&self) -> &OrientationSource<B> {
        &self.source
    }

    pub fn fusion(&self) -> &ComplementaryFilter<SitlClock> {
        &self.fusion
    }

    pub fn ranging(&self) -> &RangingFilter<R> {
        &self.ranging
    }

    pub fn imu_mut(&mut self) -> &mut B {
        self.source.bus_mut()
    }

    pub fn tof_mut(&mut self) -> &mut R {
        self.ranging.device_mut()
    }
}
