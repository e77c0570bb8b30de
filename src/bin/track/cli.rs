/// Command line interface for `track` executable
#[derive(clap::Parser, Debug, Clone)]
#[clap(
    name = "track",
    about = "Probabilistic fibre tractography over diffusion tensor data",
)]
pub (super) struct Cli {
    /// TOML configuration file describing inputs and tracking parameters
    pub config: PathBuf,

    /// TrackVis (.trk) output file
    #[clap(short, long)]
    pub out: PathBuf,

    /// Maximum number of rayon threads used for tracking
    #[clap(short = 'j', long, default_value = "4")]
    pub threads: usize,

    /// Stop starting new seeds after this time (e.g. "90 s", "2 min")
    #[clap(short = 't', long)]
    pub time_limit: Option<Time>,

    /// Override the random number generator seed given in the config file
    #[clap(short = 's', long)]
    pub rng_seed: Option<u64>,

    /// Don't show the progress bar
    #[clap(short, long)]
    pub quiet: bool,
}

// ----- Imports -----------------------------------------------------------------------------------------
use std::path::PathBuf;
use units::Time;
