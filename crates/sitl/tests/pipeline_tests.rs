use tiltrange_core::fusion::UpdateOutcome;
use tiltrange_core::telemetry::TelemetryFrame;
use tiltrange_core::traits::TimeSource;
use tiltrange_sitl::{
    ImuSimConfig, MotionProfile, RangeSimConfig, ReplayLog, SimulatedImu, SimulatedRanging,
    SitlClock, SitlRunner,
};

type SimRunner = SitlRunner<SimulatedImu, SimulatedRanging>;

fn sim_runner(imu_config: ImuSimConfig, range_config: RangeSimConfig, true_mm: u16) -> SimRunner {
    let clock = SitlClock::new();
    let imu = SimulatedImu::new(clock.clone(), MotionProfile::level(), imu_config);
    let tof = SimulatedRanging::new(true_mm, range_config);
    SitlRunner::new(clock, imu, tof)
}

fn biased_ideal_imu() -> ImuSimConfig {
    ImuSimConfig {
        gyro_bias_dps: [1.5, -0.8, 0.3],
        ..ImuSimConfig::ideal()
    }
}

#[test]
fn gyro_calibration_measures_bias() {
    let mut runner = sim_runner(biased_ideal_imu(), RangeSimConfig::ideal(), 500);
    let (gyro, accel) = runner.calibrate().unwrap();
    assert_eq!(gyro.bus_failures, 0);
    assert_eq!(accel.bus_failures, 0);

    let offsets = runner.source().offsets();
    // Bias is quantised to whole counts: 98, -52, 20 at 65.5 LSB/(deg/s)
    assert!((offsets.gyro_roll - 98.0 / 65.5).abs() < 1e-5);
    assert!((offsets.gyro_pitch + 52.0 / 65.5).abs() < 1e-5);
    assert!((offsets.gyro_yaw - 20.0 / 65.5).abs() < 1e-5);
    assert!(offsets.accel_roll.abs() < 1e-4);
    assert!(offsets.accel_pitch.abs() < 1e-4);
    assert_eq!(runner.clock().now_us(), 3_500_000);
}

#[test]
fn gyro_calibration_removes_drift() {
    let mut calibrated = sim_runner(biased_ideal_imu(), RangeSimConfig::ideal(), 500);
    calibrated.calibrate().unwrap();
    calibrated.begin();

    let mut uncalibrated = sim_runner(biased_ideal_imu(), RangeSimConfig::ideal(), 500);
    uncalibrated.begin();

    for _ in 0..500 {
        calibrated.step();
        uncalibrated.step();
    }

    // Steady-state error alpha * bias * dt / (1 - alpha), about 0.36 deg
    let drifted = uncalibrated.fusion().roll();
    assert!(drifted > 0.3 && drifted < 0.4, "uncalibrated roll = {drifted}");
    assert!(calibrated.fusion().roll().abs() < 1e-3);
    assert!(calibrated.fusion().pitch().abs() < 1e-3);
}

#[test]
fn fused_pitch_converges_to_static_tilt() {
    let mut runner = sim_runner(biased_ideal_imu(), RangeSimConfig::ideal(), 500);
    runner.calibrate().unwrap();
    runner.imu_mut().set_profile(MotionProfile::Static {
        roll_deg: 0.0,
        pitch_deg: 20.0,
    });
    runner.begin();

    for _ in 0..400 {
        runner.step();
    }
    let pitch = runner.fusion().pitch();
    assert!((pitch - 20.0).abs() < 0.1, "pitch = {pitch}");
    assert!(runner.fusion().roll().abs() < 0.1);
}

#[test]
fn fusion_tracks_slow_sway() {
    let mut runner = sim_runner(ImuSimConfig::ideal(), RangeSimConfig::ideal(), 500);
    runner.calibrate().unwrap();
    runner.imu_mut().set_profile(MotionProfile::Sway {
        roll_amplitude_deg: 15.0,
        pitch_amplitude_deg: 0.0,
        period_us: 4_000_000,
    });
    runner.begin();

    let mut worst: f32 = 0.0;
    for i in 0..800 {
        let out = runner.step();
        if i >= 100 {
            let (truth, _) = runner.imu_mut().profile().attitude_at(out.t_us);
            worst = worst.max((out.frame.roll - truth).abs());
        }
    }
    assert!(worst < 0.5, "worst roll error = {worst}");
}

#[test]
fn ranging_settles_near_true_distance() {
    let range_config = RangeSimConfig {
        noise_mm: 3.0,
        seed: Some(11),
        ..RangeSimConfig::default()
    };
    let mut runner = sim_runner(ImuSimConfig::ideal(), range_config, 800);
    runner.begin();

    for _ in 0..100 {
        runner.step();
    }
    let out = runner.step();
    assert!(out.range.is_fresh());
    assert!(
        (790..=810).contains(&out.range.distance_mm),
        "distance = {}",
        out.range.distance_mm
    );
    assert!((out.frame.height_m - 0.8).abs() < 0.011);
}

#[test]
fn faults_are_absorbed() {
    let imu_config = ImuSimConfig {
        seed: Some(5),
        ..ImuSimConfig::default()
    };
    let range_config = RangeSimConfig {
        spike_probability: 0.01,
        invalid_probability: 0.1,
        failure_probability: 0.05,
        seed: Some(6),
        ..RangeSimConfig::default()
    };
    let mut runner = sim_runner(imu_config, range_config, 800);
    runner.calibrate().unwrap();

    // Spikes during accel calibration would bias the level reference
    let faults = runner.imu_mut().config_mut();
    faults.spike_probability = 0.05;
    faults.spike_g = 2.0;
    faults.failure_probability = 0.02;
    runner.begin();

    for i in 0..500 {
        let out = runner.step();
        assert!(out.frame.pitch.abs() < 2.0, "step {i}: pitch {}", out.frame.pitch);
        assert!(out.frame.roll.abs() < 2.0, "step {i}: roll {}", out.frame.roll);
        if i >= 50 {
            assert!(
                (780..=820).contains(&out.range.distance_mm),
                "step {i}: distance {}",
                out.range.distance_mm
            );
        }
    }

    let stats = runner.stats();
    assert_eq!(stats.steps, 500);
    assert!(stats.spikes > 0);
    assert!(stats.imu_failures > 0);
    assert!(stats.stale_ranges > 0);
}

#[test]
fn seeded_runs_are_identical() {
    let run = || {
        let imu_config = ImuSimConfig {
            seed: Some(99),
            ..ImuSimConfig::default()
        };
        let range_config = RangeSimConfig {
            seed: Some(100),
            ..RangeSimConfig::default()
        };
        let mut runner = sim_runner(imu_config, range_config, 600);
        runner.calibrate().unwrap();
        runner.begin();
        let mut buf = Vec::new();
        runner.run(200, &mut buf).unwrap();
        buf
    };
    assert_eq!(run(), run());
}

#[test]
fn telemetry_lines_parse_back() {
    let mut runner = sim_runner(ImuSimConfig::ideal(), RangeSimConfig::ideal(), 1234);
    runner.begin();
    let mut buf = Vec::new();
    runner.run(50, &mut buf).unwrap();

    let text = String::from_utf8(buf).unwrap();
    let frames: Vec<TelemetryFrame> = text
        .lines()
        .map(|line| TelemetryFrame::parse(line).unwrap())
        .collect();
    assert_eq!(frames.len(), 50);
    assert!((frames[49].height_m - 1.234).abs() < 0.002);
}

#[test]
fn replay_drives_pipeline() {
    let mut csv = String::from("t_us,ax,ay,az,gx,gy,gz,dist_mm,status\n");
    for i in 0..60u64 {
        let t = 1_000_000 + i * 10_000;
        match i {
            // Logged IMU failure
            20 => csv.push_str(&format!("{t},,,,,,,700,0\n")),
            // Logged invalid range
            30 => csv.push_str(&format!("{t},0,0,4096,0,0,0,700,4\n")),
            // Logged 1 ms jitter
            40 => csv.push_str(&format!("{},0,0,4096,0,0,0,700,0\n", t - 9_000)),
            _ => csv.push_str(&format!("{t},0,0,4096,0,0,0,700,0\n")),
        }
    }

    let log = ReplayLog::from_reader(csv.as_bytes()).unwrap();
    assert_eq!(log.len(), 60);
    let schedule = log.timestamps();
    let clock = SitlClock::new();
    clock.set_us(schedule[0]);
    let (imu, tof) = log.into_devices();
    let mut runner = SitlRunner::new(clock, imu, tof);
    runner.begin();

    let mut outputs = Vec::new();
    for &t in &schedule {
        outputs.push(runner.step_at(t));
    }

    // First record sits on the begin timestamp: dt = 0
    assert_eq!(outputs[0].fusion, UpdateOutcome::DiscardedTiming { dt_us: 0 });
    assert!(!outputs[20].imu.is_fresh());
    assert!(!outputs[30].range.is_fresh());
    assert_eq!(outputs[40].fusion, UpdateOutcome::DiscardedTiming { dt_us: 1_000 });
    // 19 ms after the jittered record, still inside the window
    assert!(outputs[41].fusion.is_fused());

    let stats = runner.stats();
    assert_eq!(stats.steps, 60);
    assert_eq!(stats.discarded, 2);
    assert_eq!(stats.imu_failures, 1);
    assert_eq!(stats.stale_ranges, 1);
    assert!((699..=700).contains(&outputs[59].range.distance_mm));
    assert_eq!(runner.clock().now_us(), schedule[59]);
}
