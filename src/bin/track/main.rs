mod cli;
mod progress;

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();
    let args = Cli::parse();
    let mut timing = Timing::new();

    // Before starting the potentially long computation, make sure that we can
    // write the result to the requested destination.
    if let Some(dir) = args.out.parent() { std::fs::create_dir_all(dir)? }

    // --- Read and check everything before any tracking starts ----------------------
    timing.start("Reading configuration and inputs");
    let mut config = read_config_file(&args.config)?;
    if let Some(seed) = args.rng_seed { config.tracking.rng_seed = seed }
    let LoadedInputs { grid, pmf, fa, seed_mask, stop_mask } = config.load()?;
    timing.done();

    timing.start("Placing seeds");
    let seeds = config.seeding.seeding().seeds(&seed_mask)?;
    timing.done_with_message(&format!("{} seeds", group_digits(seeds.len())));

    // --- Track ---------------------------------------------------------------------
    let pool = rayon::ThreadPoolBuilder::new().num_threads(args.threads).build()?;
    let control = BatchControl {
        cancel: None,
        deadline: args.time_limit.map(|t| deadline_after(s_(t))).transpose()?,
    };
    let progress = Progress::new(seeds.len(), args.quiet);
    let tc = &config.tracking;
    let parameters = tc.parameters();
    let pmf_threshold = ratio(tc.pmf_threshold);

    // Each combination of direction getter and stopping criterion is a
    // different `Tracker` type
    macro_rules! go {
        ($getter:expr) => {{
            let getter = $getter;
            match stop_mask {
                Some(mask) => run(Tracker::new(getter, BinaryCriterion::new(mask), parameters)?, &seeds, tc.rng_seed, control, &pool, &progress),
                None => {
                    let stopping = ThresholdCriterion::new(fa, tc.fa_threshold, tc.interpolation)?;
                    run(Tracker::new(getter, stopping, parameters)?, &seeds, tc.rng_seed, control, &pool, &progress)
                }
            }
        }};
    }
    timing.startln("Tracking");
    let outcome = match tc.direction {
        DirectionKind::Probabilistic => go!(Probabilistic       ::new(pmf, tc.max_angle, pmf_threshold)?),
        DirectionKind::Deterministic => go!(DeterministicMaximum::new(pmf, tc.max_angle, pmf_threshold)?),
    };
    progress.final_report(&outcome);
    timing.done_with_message("Tracking finished");

    // --- Write streamlines ---------------------------------------------------------
    timing.start(&format!("Writing streamlines to {}", args.out.display()));
    io::trk::write(&args.out, &grid, &outcome.streamlines)?;
    timing.done();
    Ok(())
}

/// The moment `seconds` from now, if that can be represented
fn deadline_after(seconds: f32) -> Result<Instant, String> {
    Duration::try_from_secs_f32(seconds).ok()
        .and_then(|limit| Instant::now().checked_add(limit))
        .ok_or_else(|| format!("unusable time limit: {seconds} s"))
}

fn run<D, S>(
    tracker: Tracker<D, S>,
    seeds: &[Point],
    rng_seed: u64,
    control: BatchControl,
    pool: &rayon::ThreadPool,
    progress: &Progress,
) -> TrackingOutcome
where
    D: DirectionGetter,
    S: StoppingCriterion,
{
    pool.install(|| track_all(&tracker, seeds, rng_seed, control, |_, outcome| progress.seed_done(outcome)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest(/**/ seconds         , usable,
             case(0.0             , true ),
             case(90.0            , true ),
             case(-1.0            , false),
             case(f32::NAN        , false),
             case(f32::INFINITY   , false),
             case(1e30            , false),
    )]
    fn time_limits(seconds: f32, usable: bool) {
        assert_eq!(deadline_after(seconds).is_ok(), usable);
    }
}

// ----- Imports -----------------------------------------------------------------------------------------
use std::error::Error;
use std::time::{Duration, Instant};

use clap::Parser;
use env_logger::Env;
use units::{ratio, s_};

use tractus::{
    Point,
    config::tracking::{read_config_file, DirectionKind, LoadedInputs},
    direction::{DeterministicMaximum, DirectionGetter, Probabilistic},
    io,
    stopping::{BinaryCriterion, StoppingCriterion, ThresholdCriterion},
    tracking::Tracker,
    tracking::batch::{track_all, BatchControl, TrackingOutcome},
    utils::{group_digits, timing::Progress as Timing},
};

use cli::Cli;
use progress::Progress;
