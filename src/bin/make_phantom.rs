/// Write a synthetic single-bundle dataset, ready to be tracked
#[derive(clap::Parser, Debug, Clone)]
#[clap(name = "make_phantom", about = "Create tensor data of a straight fibre bundle, with seeds and config")]
pub struct Cli {
    /// Directory in which tensors.raw, seeds.raw and tracking.toml are written
    pub out_dir: PathBuf,

    /// Number of voxels in each dimension
    #[clap(short, long, value_parser = parse_triplet::<usize>, default_value = "20,20,20")]
    pub dims: (usize, usize, usize),

    /// Voxel size (isotropic)
    #[clap(short, long, default_value = "2 mm")]
    pub voxel_size: Length,

    /// Radius of the bundle
    #[clap(short, long, default_value = "5 mm")]
    pub radius: Length,

    /// Direction of the fibres
    #[clap(long, value_parser = parse_triplet::<f32>, default_value = "1,0,0")]
    pub direction: (f32, f32, f32),
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();
    let args = Cli::parse();
    let mut progress = Progress::new();

    let (nx, ny, nz) = args.dims;
    let (dx, dy, dz) = args.direction;
    let phantom = BundlePhantom {
        n: [nx, ny, nz],
        voxel_size: args.voxel_size,
        direction: Vector::new(dx, dy, dz),
        radius: args.radius,
        ..BundlePhantom::default()
    };
    std::fs::create_dir_all(&args.out_dir)?;

    progress.start("Generating tensors");
    let tensors = phantom.tensors()?;
    let seeds = phantom.seed_mask()?;
    progress.done_with_message(&format!("{} seed voxels", group_digits(seeds.nonzero().count())));

    progress.start("Writing files");
    tensors.write_to_raw_file(&args.out_dir.join("tensors.raw"))?;
    seeds  .write_to_raw_file(&args.out_dir.join("seeds.raw"))?;
    std::fs::write(args.out_dir.join("tracking.toml"), config_text(&phantom, &tensors.grid))?;
    progress.done();
    Ok(())
}

fn config_text(phantom: &BundlePhantom, grid: &Grid) -> String {
    let [nx, ny, nz] = phantom.n;
    let size = mm_(phantom.voxel_size);
    let origin = grid.voxel_centre([0, 0, 0]);
    format!(r#"[volume]
dims       = [{nx}, {ny}, {nz}]
voxel_size = ["{size} mm", "{size} mm", "{size} mm"]
origin     = ["{} mm", "{} mm", "{} mm"]

[inputs]
tensors   = "tensors.raw"
seed_mask = "seeds.raw"

[seeding]
density = [2, 2, 2]

[tracking]
step         = "{} mm"
max_angle    = "30 °"
fa_threshold = 0.2
"#, origin.x, origin.y, origin.z, size / 4.0)
}

// ----- Imports -----------------------------------------------------------------------------------------
use std::error::Error;
use std::path::PathBuf;

use clap::Parser;
use env_logger::Env;
use units::mm_;

use tractus::{
    Length, Vector,
    grid::Grid,
    phantom::BundlePhantom,
    utils::{group_digits, parse_triplet, timing::Progress},
};
