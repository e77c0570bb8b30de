//! Configuration file parser for tractography runs
//!
//! ```toml
//! [volume]
//! dims       = [20, 20, 20]
//! voxel_size = ["2 mm", "2 mm", "2 mm"]  # or: affine = [[...], [...], [...], [...]]
//! origin     = ["-19 mm", "-19 mm", "-19 mm"]
//!
//! [inputs]
//! tensors   = "tensors.raw"   # or: pmf = "pmf.raw" together with fa = "fa.raw"
//! seed_mask = "seeds.raw"
//!
//! [sphere]
//! subdivisions = 3
//!
//! [seeding]
//! density = [2, 2, 2]
//!
//! [tracking]
//! step         = "0.5 mm"
//! max_angle    = "30 °"
//! fa_threshold = 0.2
//! ```
//!
//! Relative input paths are taken relative to the directory containing the
//! configuration file.

use std::fs;
use std::path::{Path, PathBuf};

use log::info;
use serde::Deserialize;
use units::{degree, mm};

use crate::{Affine, Angle, BoxDim_u, Length, Point};
use crate::direction::Restriction;
use crate::grid::Grid;
use crate::pmf::PmfVolume;
use crate::seeds::Seeding;
use crate::sphere::{Sphere, MAX_SUBDIVISIONS};
use crate::tensor::TensorVolume;
use crate::tracking::{OutsidePolicy, TrackingParameters};
use crate::volume::{Interpolation, ScalarVolume};
use crate::error::{Result, TractError};

use super::{deserialize_uom, deserialize_uom_3d_opt};

#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Config {
    pub volume: Volume,
    pub inputs: Inputs,
    #[serde(default)] pub sphere: SphereConfig,
    #[serde(default)] pub seeding: SeedingConfig,
    #[serde(default)] pub tracking: TrackingConfig,
}

/// Geometry shared by all input volumes
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Volume {
    pub dims: BoxDim_u,

    #[serde(default)]
    #[serde(deserialize_with = "deserialize_uom_3d_opt")]
    pub voxel_size: Option<(Length, Length, Length)>,

    /// World position of the centre of voxel `[0, 0, 0]`
    #[serde(default)]
    #[serde(deserialize_with = "deserialize_uom_3d_opt")]
    pub origin: Option<(Length, Length, Length)>,

    /// Voxel to world transform, by rows. Excludes `voxel_size` and `origin`.
    pub affine: Option<[[f32; 4]; 4]>,
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Inputs {
    /// 6 components per voxel: `Dxx, Dxy, Dyy, Dxz, Dyz, Dzz`
    pub tensors: Option<PathBuf>,
    /// One weight per voxel per sphere vertex. Requires `fa`.
    pub pmf: Option<PathBuf>,
    /// Overrides the FA derived from `tensors`
    pub fa: Option<PathBuf>,
    pub seed_mask: PathBuf,
    /// If given, tracking continues inside this mask, instead of wherever FA
    /// exceeds the threshold
    pub stop_mask: Option<PathBuf>,
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct SphereConfig {
    #[serde(default = "default_subdivisions")]
    pub subdivisions: u32,
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct SeedingConfig {
    #[serde(default = "default_density")]
    pub density: BoxDim_u,
    #[serde(default)]
    pub labels: Vec<f32>,
    pub jitter: Option<u64>,
}

#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum DirectionKind {
    #[default]
    Probabilistic,
    Deterministic,
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct TrackingConfig {
    #[serde(default = "default_step")]
    #[serde(deserialize_with = "deserialize_uom")]
    pub step: Length,

    #[serde(default = "default_max_angle")]
    #[serde(deserialize_with = "deserialize_uom")]
    pub max_angle: Angle,

    #[serde(default = "default_fa_threshold")]
    pub fa_threshold: f32,

    /// Relative to the largest mass of the local PMF
    #[serde(default = "default_pmf_threshold")]
    pub pmf_threshold: f32,

    #[serde(default = "default_max_steps")]
    pub max_steps: usize,

    #[serde(default = "default_min_points")]
    pub min_points: usize,

    #[serde(default)] pub outside: OutsidePolicy,
    #[serde(default)] pub direction: DirectionKind,
    #[serde(default)] pub interpolation: Interpolation,
    #[serde(default)] pub rng_seed: u64,
}

fn default_subdivisions()  -> u32      { 3 }
fn default_density()       -> BoxDim_u { [1, 1, 1] }
fn default_step()          -> Length   { mm(0.5) }
fn default_max_angle()     -> Angle    { degree(30.0) }
fn default_fa_threshold()  -> f32      { 0.2 }
fn default_pmf_threshold() -> f32      { 0.1 }
fn default_max_steps()     -> usize    { 2000 }
fn default_min_points()    -> usize    { 1 }

impl Default for SphereConfig  { fn default() -> Self { Self { subdivisions: default_subdivisions() } } }
impl Default for SeedingConfig { fn default() -> Self { Self { density: default_density(), labels: vec![], jitter: None } } }
impl Default for TrackingConfig {
    fn default() -> Self {
        Self {
            step: default_step(),
            max_angle: default_max_angle(),
            fa_threshold: default_fa_threshold(),
            pmf_threshold: default_pmf_threshold(),
            max_steps: default_max_steps(),
            min_points: default_min_points(),
            outside: OutsidePolicy::default(),
            direction: DirectionKind::default(),
            interpolation: Interpolation::default(),
            rng_seed: 0,
        }
    }
}

pub fn read_config_file(path: &Path) -> Result<Config> {
    let text = fs::read_to_string(path)?;
    let mut config: Config = toml::from_str(&text)?;
    if let Some(dir) = path.parent() { config.inputs.resolve_relative_to(dir) }
    Ok(config)
}

impl Volume {
    pub fn grid(&self) -> Result<Grid> {
        let affine = match (&self.affine, self.voxel_size) {
            (Some(rows), None) => {
                if self.origin.is_some() {
                    return Err(TractError::invalid_parameter("origin", "cannot be combined with `affine`"))
                }
                Affine::from_rows(*rows)
            }
            (None, Some(size)) => {
                let (x, y, z) = self.origin.unwrap_or((mm(0.0), mm(0.0), mm(0.0)));
                Affine::scaling(size, Point::new(units::mm_(x), units::mm_(y), units::mm_(z)))
            }
            (Some(_), Some(_)) => return Err(TractError::invalid_parameter("volume", "give `affine` or `voxel_size`, not both")),
            (None   , None   ) => return Err(TractError::invalid_parameter("volume", "one of `affine` or `voxel_size` is required")),
        };
        Grid::new(self.dims, affine.ok_or(TractError::InvalidAffine)?)
    }
}

impl Inputs {
    fn resolve_relative_to(&mut self, dir: &Path) {
        let resolve = |p: &mut PathBuf| if p.is_relative() { *p = dir.join(&p) };
        for p in [&mut self.tensors, &mut self.pmf, &mut self.fa, &mut self.stop_mask].into_iter().flatten() {
            resolve(p)
        }
        resolve(&mut self.seed_mask);
    }
}

impl TrackingConfig {
    pub fn parameters(&self) -> TrackingParameters {
        TrackingParameters {
            step_size: self.step,
            max_steps: self.max_steps,
            outside: self.outside,
            min_points: self.min_points,
        }
    }
}

impl SeedingConfig {
    pub fn seeding(&self) -> Seeding {
        Seeding { density: self.density, labels: self.labels.clone(), jitter: self.jitter }
    }
}

/// Everything read from disk, checked against the configured geometry.
pub struct LoadedInputs {
    pub grid: Grid,
    pub pmf: PmfVolume,
    pub fa: ScalarVolume,
    pub seed_mask: ScalarVolume,
    pub stop_mask: Option<ScalarVolume>,
}

impl Config {

    /// Read and validate all inputs. Any problem with the data or the
    /// parameters is reported here, before any tracking starts.
    pub fn load(&self) -> Result<LoadedInputs> {
        self.validate()?;
        let grid = self.volume.grid()?;
        let sphere = Sphere::icosphere(self.sphere.subdivisions);
        info!("Grid {:?}, voxel size {:?} mm, {} sphere directions",
              grid.n, grid.affine.voxel_size(), sphere.len());

        let scalar = |path: &Path| ScalarVolume::from_raw_file(grid, path);

        let (pmf, fa) = match (&self.inputs.tensors, &self.inputs.pmf) {
            (Some(tensors), None) => {
                let tensors = TensorVolume::from_raw_file(grid, tensors)?;
                let fa = match &self.inputs.fa {
                    Some(path) => scalar(path)?,
                    None       => tensors.fa(),
                };
                (tensors.pmf(sphere)?, fa)
            }
            (None, Some(pmf)) => {
                let fa = self.inputs.fa.as_deref()
                    .ok_or_else(|| TractError::invalid_parameter("inputs", "`fa` is required with `pmf`"))?;
                (PmfVolume::from_raw_file(grid, sphere, pmf)?, scalar(fa)?)
            }
            (Some(_), Some(_)) => return Err(TractError::invalid_parameter("inputs", "give `tensors` or `pmf`, not both")),
            (None   , None   ) => return Err(TractError::invalid_parameter("inputs", "one of `tensors` or `pmf` is required")),
        };

        let seed_mask = scalar(&self.inputs.seed_mask)?;
        let stop_mask = self.inputs.stop_mask.as_deref().map(scalar).transpose()?;
        Ok(LoadedInputs { grid, pmf, fa, seed_mask, stop_mask })
    }

    /// Check parameters which do not need the input data
    pub fn validate(&self) -> Result<()> {
        self.tracking.parameters().validate()?;
        self.seeding.seeding().validate()?;
        Restriction::new(self.tracking.max_angle, units::ratio(self.tracking.pmf_threshold))?;
        if self.sphere.subdivisions > MAX_SUBDIVISIONS {
            return Err(TractError::invalid_parameter(
                "subdivisions", format!("{} is more than the maximum of {MAX_SUBDIVISIONS}", self.sphere.subdivisions)))
        }
        if !self.tracking.fa_threshold.is_finite() {
            return Err(TractError::invalid_parameter("fa_threshold", "must be finite"))
        }
        Ok(())
    }
}
