//! Read / write streamlines in the TrackVis (`.trk`, version 2) format.
//!
//! A 1000-byte little-endian header is followed by one record per
//! streamline: the number of points, then `x y z` (and any per-point scalars)
//! for each point, then any per-streamline properties. Points are stored in
//! *voxmm* space: voxel coordinates, shifted so that the corner (not the
//! centre) of the first voxel is at zero, and scaled by the voxel size.

use std::fs::File;
use std::io::{BufWriter, Cursor, Read, Write};
use std::path::Path;

use binrw::{binrw, BinReaderExt, BinWrite};
use log::info;

use crate::{Affine, Point};
use crate::grid::Grid;
use crate::streamline::Streamline;
use crate::error::{Result, TractError};
use crate::utils::group_digits;

pub const HEADER_SIZE: i32 = 1000;

#[binrw]
#[brw(little, magic = b"TRACK\0")]
#[derive(Clone, Debug, PartialEq)]
pub struct TrkHeader {                                                                     //       bytes  offset
    pub dim                       : [i16; 3],                                              //           6       6
    pub voxel_size                : [f32; 3],                                              //          12      12
    pub origin                    : [f32; 3],                                              //          12      24
    pub n_scalars                 : i16,                                                   //           2      36
    pub scalar_name               : [[u8; 20]; 10],                                        //         200      38
    pub n_properties              : i16,                                                   //           2     238
    pub property_name             : [[u8; 20]; 10],                                        //         200     240
    pub vox_to_ras                : [[f32; 4]; 4],                                         //          64     440
    pub reserved                  : [u8; 444],                                             //         444     504
    pub voxel_order               : [u8; 4],                                               //           4     948
    pub pad2                      : [u8; 4],                                               //           4     952
    pub image_orientation_patient : [f32; 6],                                              //          24     956
    pub pad1                      : [u8; 2],                                               //           2     980
    pub invert_x                  : u8,                                                    //           1     982
    pub invert_y                  : u8,                                                    //           1     983
    pub invert_z                  : u8,                                                    //           1     984
    pub swap_xy                   : u8,                                                    //           1     985
    pub swap_yz                   : u8,                                                    //           1     986
    pub swap_zx                   : u8,                                                    //           1     987
    pub n_count                   : i32,                                                   //           4     988
    #[br(assert(version == 2, "unsupported TRK version {}", version))]
    pub version                   : i32,                                                   //           4     992
    #[br(assert(hdr_size == HEADER_SIZE, "TRK header size is {}, should be {}", hdr_size, HEADER_SIZE))]
    pub hdr_size                  : i32,                                                   //           4     996
}

/// One streamline, as stored in the file
#[binrw]
#[brw(little)]
#[br(import(n_scalars: usize, n_properties: usize))]
#[derive(Clone, Debug, PartialEq)]
pub struct TrkRecord {
    #[br(temp)]
    #[bw(calc = points.len() as i32)]
    n_points: i32,

    #[br(args { count: n_points as usize, inner: (n_scalars,) })]
    pub points: Vec<TrkPoint>,

    #[br(count = n_properties)]
    pub properties: Vec<f32>,
}

#[binrw]
#[brw(little)]
#[br(import(n_scalars: usize))]
#[derive(Clone, Debug, PartialEq)]
pub struct TrkPoint {
    /// voxmm coordinates
    pub xyz: [f32; 3],
    #[br(count = n_scalars)]
    pub scalars: Vec<f32>,
}

impl TrkHeader {

    /// Header describing streamlines tracked in `grid`, without scalars or
    /// properties.
    pub fn for_grid(grid: &Grid, n_count: usize) -> Result<Self> {
        let dim = dims_as_i16(grid)?;
        let n_count = i32::try_from(n_count)
            .map_err(|_| TractError::invalid_parameter("n_count", format!("{n_count} streamlines do not fit in a TRK header")))?;
        Ok(Self {
            dim,
            voxel_size: grid.affine.voxel_size(),
            origin: [0.0; 3],
            n_scalars: 0,
            scalar_name: [[0; 20]; 10],
            n_properties: 0,
            property_name: [[0; 20]; 10],
            vox_to_ras: grid.affine.rows(),
            reserved: [0; 444],
            voxel_order: *b"RAS\0",
            pad2: [0; 4],
            image_orientation_patient: [0.0; 6],
            pad1: [0; 2],
            invert_x: 0, invert_y: 0, invert_z: 0,
            swap_xy : 0, swap_yz : 0, swap_zx : 0,
            n_count,
            version: 2,
            hdr_size: HEADER_SIZE,
        })
    }

    /// The voxel to world transform recorded in the header. Files written
    /// by old tools leave it all zero: fall back to plain voxel scaling.
    pub fn affine(&self) -> Result<Affine> {
        if self.vox_to_ras[3][3] == 0.0 {
            let [dx, dy, dz] = self.voxel_size.map(units::mm);
            return Affine::scaling((dx, dy, dz), Point::origin()).ok_or(TractError::InvalidAffine)
        }
        Affine::from_rows(self.vox_to_ras).ok_or(TractError::InvalidAffine)
    }

    pub fn grid(&self) -> Result<Grid> {
        let n = self.dim.map(|d| d.max(0) as usize);
        Grid::new(n, self.affine()?)
    }

    pub fn voxel_order(&self) -> String {
        String::from_utf8_lossy(&self.voxel_order).trim_end_matches('\0').to_string()
    }

    pub fn scalar_names(&self) -> Vec<String> {
        names(&self.scalar_name, self.n_scalars)
    }

    pub fn property_names(&self) -> Vec<String> {
        names(&self.property_name, self.n_properties)
    }
}

fn names(fields: &[[u8; 20]; 10], n: i16) -> Vec<String> {
    fields.iter()
        .take(n.clamp(0, 10) as usize)
        .map(|f| String::from_utf8_lossy(f).trim_end_matches('\0').to_string())
        .collect()
}

fn dims_as_i16(grid: &Grid) -> Result<[i16; 3]> {
    let mut dim = [0; 3];
    for (d, &n) in dim.iter_mut().zip(&grid.n) {
        *d = i16::try_from(n)
            .map_err(|_| TractError::invalid_parameter("dims", format!("{:?} too large for TRK header", grid.n)))?;
    }
    Ok(dim)
}

// ----- Coordinate conversion -------------------------------------------------

/// Convert world points to the voxmm convention of TRK files, and back.
#[derive(Clone, Copy, Debug)]
pub struct VoxmmConverter {
    affine: Affine,
    voxel_size: [f32; 3],
}

impl VoxmmConverter {

    pub fn new(affine: Affine) -> Self {
        Self { affine, voxel_size: affine.voxel_size() }
    }

    pub fn to_voxmm(&self, p: &Point) -> [f32; 3] {
        let v = self.affine.to_voxel(p);
        [0, 1, 2].map(|d| (v[d] + 0.5) * self.voxel_size[d])
    }

    pub fn to_world(&self, xyz: &[f32; 3]) -> Point {
        let [x, y, z] = [0, 1, 2].map(|d| xyz[d] / self.voxel_size[d] - 0.5);
        self.affine.to_world(&Point::new(x, y, z))
    }
}

// ----- Whole files -----------------------------------------------------------

/// Write `streamlines`, tracked in `grid`, to a TRK file.
pub fn write(path: &Path, grid: &Grid, streamlines: &[Streamline]) -> Result<()> {
    let header = TrkHeader::for_grid(grid, streamlines.len())?;
    let convert = VoxmmConverter::new(grid.affine);
    let mut out = BufWriter::new(File::create(path)?);
    write_header(&mut out, &header)?;
    for streamline in streamlines {
        let record = TrkRecord {
            points: streamline.points().iter()
                .map(|p| TrkPoint { xyz: convert.to_voxmm(p), scalars: vec![] })
                .collect(),
            properties: vec![],
        };
        write_record(&mut out, &record)?;
    }
    out.flush()?;
    info!("Wrote {} streamlines to {}", group_digits(streamlines.len()), path.display());
    Ok(())
}

fn write_header(out: &mut impl Write, header: &TrkHeader) -> Result<()> {
    let mut bytes = Cursor::new(Vec::with_capacity(HEADER_SIZE as usize));
    header.write(&mut bytes)?;
    out.write_all(bytes.get_ref())?;
    Ok(())
}

fn write_record(out: &mut impl Write, record: &TrkRecord) -> Result<()> {
    let mut bytes = Cursor::new(vec![]);
    record.write(&mut bytes)?;
    out.write_all(bytes.get_ref())?;
    Ok(())
}

/// Contents of a TRK file, with points converted back to world space.
#[derive(Clone, Debug)]
pub struct Tractogram {
    pub header: TrkHeader,
    pub records: Vec<TrkRecord>,
    pub streamlines: Vec<Streamline>,
}

pub fn read(path: &Path) -> Result<Tractogram> {
    let mut bytes = vec![];
    File::open(path)?.read_to_end(&mut bytes)?;
    let len = bytes.len() as u64;
    let mut cursor = Cursor::new(bytes);

    let header: TrkHeader = cursor.read_le()?;
    let args = (header.n_scalars.max(0) as usize, header.n_properties.max(0) as usize);

    // A count of zero means unknown: read until the end of the file
    let mut records = vec![];
    while cursor.position() < len && (header.n_count <= 0 || records.len() < header.n_count as usize) {
        records.push(cursor.read_le_args::<TrkRecord>(args)?);
    }

    let convert = VoxmmConverter::new(header.affine()?);
    let streamlines = records.iter()
        .map(|r| Streamline::from_points(r.points.iter().map(|p| convert.to_world(&p.xyz)).collect()))
        .collect();
    Ok(Tractogram { header, records, streamlines })
}
