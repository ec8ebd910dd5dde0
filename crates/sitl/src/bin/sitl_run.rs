//! Run the tiltrange pipeline against simulated sensors or a recorded log.
//!
//! Telemetry lines (`roll,pitch,height`) go to stdout; progress and the run
//! summary go to stderr.
//!
//! Usage:
//!   cargo run -p tiltrange_sitl --bin sitl_run -- [OPTIONS]
//!
//! Options:
//!   --steps <N>          Loop iterations to simulate (default: 1000)
//!   --period-us <US>     Loop period in microseconds (default: 10000)
//!   --seed <N>           Noise seed (default: 1)
//!   --roll <DEG>         Static roll after calibration (default: 0)
//!   --pitch <DEG>        Static pitch after calibration (default: 0)
//!   --distance <MM>      True distance (default: 500)
//!   --faults             Inject spikes, invalid ranges and bus failures
//!   --replay <CSV>       Replay a recorded log instead of simulating
//!   --param <NAME=VALUE> Override a tuning parameter (repeatable)

use std::env;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::process;
use std::str::FromStr;

use tiltrange_core::parameters::ParameterStore;
use tiltrange_sitl::{
    parameter_store, ImuSimConfig, MotionProfile, RangeSimConfig, ReplayLog, RunStats, SimulatedImu,
    SimulatedRanging, SitlClock, SitlError, SitlRunner, DEFAULT_PERIOD_US,
};

struct Args {
    steps: u64,
    period_us: u64,
    seed: u64,
    roll: f32,
    pitch: f32,
    distance: u16,
    faults: bool,
    replay: Option<PathBuf>,
    params: Vec<String>,
}

fn parse_args() -> Args {
    let mut args = Args {
        steps: 1000,
        period_us: DEFAULT_PERIOD_US,
        seed: 1,
        roll: 0.0,
        pitch: 0.0,
        distance: 500,
        faults: false,
        replay: None,
        params: Vec::new(),
    };

    let raw: Vec<String> = env::args().collect();
    let mut i = 1;
    while i < raw.len() {
        match raw[i].as_str() {
            "--steps" => {
                i += 1;
                args.steps = parse_arg(&raw, i, "steps");
            }
            "--period-us" => {
                i += 1;
                args.period_us = parse_arg(&raw, i, "period-us");
            }
            "--seed" => {
                i += 1;
                args.seed = parse_arg(&raw, i, "seed");
            }
            "--roll" => {
                i += 1;
                args.roll = parse_arg(&raw, i, "roll");
            }
            "--pitch" => {
                i += 1;
                args.pitch = parse_arg(&raw, i, "pitch");
            }
            "--distance" => {
                i += 1;
                args.distance = parse_arg(&raw, i, "distance");
            }
            "--faults" => args.faults = true,
            "--replay" => {
                i += 1;
                args.replay = Some(parse_arg(&raw, i, "replay"));
            }
            "--param" => {
                i += 1;
                args.params.push(parse_arg(&raw, i, "param"));
            }
            "-h" | "--help" => {
                print_usage();
                process::exit(0);
            }
            other => {
                eprintln!("Unknown option: {other}");
                print_usage();
                process::exit(1);
            }
        }
        i += 1;
    }

    if args.period_us == 0 {
        eprintln!("Error: period-us must be at least 1");
        process::exit(1);
    }

    args
}

fn parse_arg<T: FromStr>(raw: &[String], i: usize, name: &str) -> T {
    raw.get(i)
        .unwrap_or_else(|| {
            eprintln!("Error: --{name} requires a value");
            process::exit(1);
        })
        .parse()
        .unwrap_or_else(|_| {
            eprintln!("Error: invalid value for --{name}");
            process::exit(1);
        })
}

fn print_usage() {
    eprintln!(
        "Usage: sitl_run [OPTIONS]\n\
         \n\
         Options:\n\
         \x20 --steps <N>          Loop iterations to simulate (default: 1000)\n\
         \x20 --period-us <US>     Loop period in microseconds (default: 10000)\n\
         \x20 --seed <N>           Noise seed (default: 1)\n\
         \x20 --roll <DEG>         Static roll after calibration (default: 0)\n\
         \x20 --pitch <DEG>        Static pitch after calibration (default: 0)\n\
         \x20 --distance <MM>      True distance (default: 500)\n\
         \x20 --faults             Inject spikes, invalid ranges and bus failures\n\
         \x20 --replay <CSV>       Replay a recorded log instead of simulating\n\
         \x20 --param <NAME=VALUE> Override a tuning parameter (repeatable)\n\
         \x20 -h, --help           Show this help"
    );
}

fn simulate(
    args: &Args,
    store: &ParameterStore,
    out: &mut impl Write,
) -> Result<RunStats, SitlError> {
    let clock = SitlClock::new();

    let imu_config = ImuSimConfig {
        seed: Some(args.seed),
        ..ImuSimConfig::default()
    };
    let range_config = RangeSimConfig {
        seed: Some(args.seed.wrapping_add(1)),
        ..RangeSimConfig::default()
    };

    // Calibration assumes a level, fault-free platform; tilt and faults
    // apply afterwards
    let imu = SimulatedImu::new(clock.clone(), MotionProfile::level(), imu_config);
    let tof = SimulatedRanging::new(args.distance, range_config);
    let mut runner = SitlRunner::with_store(clock, imu, tof, store);
    runner.set_period_us(args.period_us);

    runner.calibrate()?;
    runner.imu_mut().set_profile(MotionProfile::Static {
        roll_deg: args.roll,
        pitch_deg: args.pitch,
    });
    if args.faults {
        let imu = runner.imu_mut().config_mut();
        imu.spike_probability = 0.01;
        imu.failure_probability = 0.005;
        let tof = runner.tof_mut().config_mut();
        tof.spike_probability = 0.02;
        tof.invalid_probability = 0.02;
        tof.failure_probability = 0.005;
    }
    runner.begin();
    runner.run(args.steps, out)
}

fn replay(
    path: &Path,
    store: &ParameterStore,
    out: &mut impl Write,
) -> Result<RunStats, SitlError> {
    let log = ReplayLog::from_path(path)?;
    if log.is_empty() {
        return Err(SitlError::InvalidArgument(format!(
            "{} contains no records",
            path.display()
        )));
    }
    eprintln!("[sitl] replaying {} records from {}", log.len(), path.display());

    let schedule = log.timestamps();
    let clock = SitlClock::new();
    clock.set_us(schedule[0]);
    let (imu, tof) = log.into_devices();

    // Logged data is already raw; no calibration pass
    let mut runner = SitlRunner::with_store(clock, imu, tof, store);
    runner.begin();
    runner.run_schedule(schedule, out)
}

fn run(args: &Args, out: &mut impl Write) -> Result<RunStats, SitlError> {
    let store = parameter_store(args.params.as_slice())?;
    let stats = match &args.replay {
        Some(path) => replay(path, &store, out)?,
        None => simulate(args, &store, out)?,
    };
    out.flush()?;
    Ok(stats)
}

fn main() {
    let args = parse_args();

    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    match run(&args, &mut out) {
        Ok(stats) => eprintln!(
            "[sitl] {} steps: {} fused, {} discarded, {} spikes, {} imu failures, {} stale ranges",
            stats.steps,
            stats.fused,
            stats.discarded,
            stats.spikes,
            stats.imu_failures,
            stats.stale_ranges
        ),
        Err(e) => {
            eprintln!("Error: {e}");
            process::exit(1);
        }
    }
}
