/// Summarize the contents of TrackVis (.trk) files
#[derive(clap::Parser, Debug, Clone)]
#[clap(name = "trkinfo", about = "Print header and streamline statistics of TRK files")]
pub struct Cli {
    /// TRK files to inspect
    #[clap(required = true)]
    pub files: Vec<PathBuf>,

    /// Only print the header
    #[clap(long)]
    pub header_only: bool,
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::Builder::from_env(Env::default().default_filter_or("warn")).init();
    let args = Cli::parse();
    for path in &args.files {
        println!("===== {} =====", path.display());
        let Tractogram { header, streamlines, .. } = io::trk::read(path)?;
        let [nx, ny, nz] = header.dim;
        let [dx, dy, dz] = header.voxel_size;
        println!("dimensions   : {nx} x {ny} x {nz}");
        println!("voxel size   : {dx} x {dy} x {dz} mm");
        println!("voxel order  : {}", header.voxel_order());
        println!("streamlines  : {} (according to header)", group_digits(header.n_count));
        println!("scalars      : {:?}", header.scalar_names());
        println!("properties   : {:?}", header.property_names());
        if args.header_only { continue }

        let lengths = streamlines.iter().map(|s| mm_(s.arc_length())).collect::<Vec<_>>();
        let n_points: usize = streamlines.iter().map(Streamline::len).sum();
        println!("read         : {} streamlines, {} points", group_digits(streamlines.len()), group_digits(n_points));
        let (min, max) = match lengths.iter().copied().minmax() {
            MinMaxResult::NoElements       => continue,
            MinMaxResult::OneElement(l)    => (l, l),
            MinMaxResult::MinMax(min, max) => (min, max),
        };
        let mean = lengths.iter().sum::<f32>() / lengths.len() as f32;
        println!("arc length   : min {min:.1} mean {mean:.1} max {max:.1} mm");
    }
    Ok(())
}

// ----- Imports -----------------------------------------------------------------------------------------
use std::error::Error;
use std::path::PathBuf;

use clap::Parser;
use env_logger::Env;
use itertools::{Itertools, MinMaxResult};
use units::mm_;

use tractus::{
    io::{self, trk::Tractogram},
    streamline::Streamline,
    utils::group_digits,
};
