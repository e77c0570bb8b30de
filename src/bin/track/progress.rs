/// Progress bar and running counts for `track` executable
pub (super) struct Progress(Mutex<Inner>);

struct Inner {
    n_seeds: u64,
    n_done: u64,
    n_streamlines: u64,
    n_points: u64,
    bar: ProgressBar,
}

impl Inner {
    fn update(&self) {
        let Inner { n_done, n_streamlines, n_points, bar, .. } = self;
        bar.set_position(*n_done);
        if n_done % 256 == 0 {
            bar.set_message(format!("{} streamlines, {} points", group_digits(n_streamlines), group_digits(n_points)));
        }
    }
}

impl Progress {

    pub (super) fn new(n_seeds: usize, quiet: bool) -> Self {
        let bar = if quiet { ProgressBar::hidden() } else { ProgressBar::new(n_seeds as u64) };
        if let Ok(style) = ProgressStyle::default_bar()
            .template("Tracking: {msg}\n[{elapsed_precise}] {wide_bar} {pos}/{len} ({eta_precise})")
        {
            bar.set_style(style);
        }
        bar.tick();
        Self (
            Mutex::new(
                Inner {
                    n_seeds: n_seeds as u64,
                    n_done: 0,
                    n_streamlines: 0,
                    n_points: 0,
                    bar,
                }
            )
        )
    }

    pub (super) fn seed_done(&self, outcome: &SeedOutcome) {
        let Ok(mut data) = self.0.lock() else { return };
        data.n_done += 1;
        if let SeedOutcome::Tracked(streamline) = outcome {
            data.n_streamlines += 1;
            data.n_points += streamline.len() as u64;
        }
        data.update();
    }

    pub (super) fn final_report(&self, outcome: &TrackingOutcome) {
        let Ok(data) = self.0.lock() else { return };
        data.bar.finish_with_message(format!("{} streamlines", group_digits(data.n_streamlines)));
        let stats = &outcome.statistics;
        let percent = if data.n_seeds > 0 { 100 * stats.streamlines as u64 / data.n_seeds } else { 0 };
        println!("{} / {} ({percent}%) seeds produced streamlines", group_digits(stats.streamlines), group_digits(data.n_seeds));
        for t in Termination::ALL {
            println!("  {:>16}: {:>12} pass endings", t.name(), group_digits(stats.passes_ending(t)));
        }
        if let Some(why) = outcome.interrupted {
            println!("Interrupted ({why:?}): {} seeds were not tracked", group_digits(stats.not_started));
        }
    }
}

// ----- Imports -----------------------------------------------------------------------------------------
use std::sync::Mutex;
use indicatif::{ProgressBar, ProgressStyle};
use tractus::{
    streamline::Termination,
    tracking::batch::{SeedOutcome, TrackingOutcome},
    utils::group_digits,
};
