//! `.vxi` voxel model codec.
//!
//! Layout (little-endian): three `u32` extents, three `i32` offsets, one palette index per
//! cell with X outermost and Z innermost (`255` = empty), a 256-entry RGB palette, then a
//! `u8` count of anchor points, each a length-prefixed UTF-8 name and three `i32`.

use std::io::{self, Read, Write};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use thiserror::Error;
use voxdae_geom::GridPos;

use crate::{AnchorPoint, EMPTY_INDEX, PALETTE_LEN, Rgb, VoxelModel};

#[derive(Debug, Error)]
pub enum VxiError {
    #[error("i/o error: {0}")]
    Io(#[from] io::Error),
    #[error("grid extents {0}x{1}x{2} overflow")]
    ExtentsOverflow(u32, u32, u32),
    #[error("anchor point name is not valid UTF-8")]
    InvalidName(#[from] std::string::FromUtf8Error),
    #[error("anchor point name `{0}` is longer than 255 bytes")]
    NameTooLong(String),
    #[error("{0} anchor points exceed the limit of 255")]
    TooManyPoints(usize),
    #[error("cell ({}, {}, {}) lies below the grid origin", .0.x, .0.y, .0.z)]
    NegativeCoordinate(GridPos),
    #[error("cell ({}, {}, {}) uses the reserved empty palette index", .0.x, .0.y, .0.z)]
    ReservedIndex(GridPos),
    #[error("position ({}, {}, {}) cannot be mirrored into output axes", .0.x, .0.y, .0.z)]
    CoordinateOutOfRange(GridPos),
}

/// The axis transform negates X on offsets and anchors, so `x == i32::MIN` has no image.
fn check_mirrorable(p: GridPos) -> Result<GridPos, VxiError> {
    if p.x == i32::MIN {
        return Err(VxiError::CoordinateOutOfRange(p));
    }
    Ok(p)
}

fn read_extent(r: &mut impl Read) -> io::Result<(u32, u32, u32)> {
    Ok((
        r.read_u32::<LittleEndian>()?,
        r.read_u32::<LittleEndian>()?,
        r.read_u32::<LittleEndian>()?,
    ))
}

fn read_pos(r: &mut impl Read) -> io::Result<GridPos> {
    Ok(GridPos::new(
        r.read_i32::<LittleEndian>()?,
        r.read_i32::<LittleEndian>()?,
        r.read_i32::<LittleEndian>()?,
    ))
}

fn write_pos(w: &mut impl Write, p: GridPos) -> io::Result<()> {
    w.write_i32::<LittleEndian>(p.x)?;
    w.write_i32::<LittleEndian>(p.y)?;
    w.write_i32::<LittleEndian>(p.z)
}

/// Decodes a model. Truncated input surfaces as an `UnexpectedEof` I/O error.
pub fn read_vxi(r: &mut impl Read) -> Result<VoxelModel, VxiError> {
    let (sx, sy, sz) = read_extent(r)?;
    let offset = check_mirrorable(read_pos(r)?)?;
    let cells = (sx as u64)
        .checked_mul(sy as u64)
        .and_then(|n| n.checked_mul(sz as u64))
        .ok_or(VxiError::ExtentsOverflow(sx, sy, sz))?;

    // Grow with the data actually present instead of trusting the header.
    let mut dense = Vec::new();
    r.by_ref().take(cells).read_to_end(&mut dense)?;
    if dense.len() as u64 != cells {
        return Err(io::Error::new(io::ErrorKind::UnexpectedEof, "voxel data truncated").into());
    }

    let mut model = VoxelModel {
        offset,
        ..VoxelModel::default()
    };
    let plane = sy as u64 * sz as u64;
    for (i, &v) in dense.iter().enumerate() {
        if v == EMPTY_INDEX {
            continue;
        }
        let i = i as u64;
        let x = (i / plane) as i32;
        let y = ((i / sz as u64) % sy as u64) as i32;
        let z = (i % sz as u64) as i32;
        model.blocks.insert(GridPos::new(x, y, z), v);
    }

    for i in 0..PALETTE_LEN {
        let r8 = r.read_u8()?;
        let g8 = r.read_u8()?;
        let b8 = r.read_u8()?;
        model.palette.set(i as u8, Rgb::new(r8, g8, b8));
    }

    let count = r.read_u8()?;
    model.points.reserve(count as usize);
    for _ in 0..count {
        let len = r.read_u8()? as usize;
        let mut name = vec![0u8; len];
        r.read_exact(&mut name)?;
        let name = String::from_utf8(name)?;
        let pos = check_mirrorable(read_pos(r)?)?;
        model.points.push(AnchorPoint { name, pos });
    }

    log::debug!(
        "vxi: {}x{}x{} grid, {} cells, {} points",
        sx,
        sy,
        sz,
        model.blocks.len(),
        model.points.len()
    );
    Ok(model)
}

/// Encodes a model. The dense box spans from the origin to the largest occupied cell.
pub fn write_vxi(model: &VoxelModel, w: &mut impl Write) -> Result<(), VxiError> {
    if model.points.len() > u8::MAX as usize {
        return Err(VxiError::TooManyPoints(model.points.len()));
    }
    check_mirrorable(model.offset)?;
    for pt in &model.points {
        check_mirrorable(pt.pos)?;
    }
    let mut ext = (0u32, 0u32, 0u32);
    for (&p, &v) in &model.blocks {
        if p.x < 0 || p.y < 0 || p.z < 0 {
            return Err(VxiError::NegativeCoordinate(p));
        }
        if v == EMPTY_INDEX {
            return Err(VxiError::ReservedIndex(p));
        }
        ext.0 = ext.0.max(p.x as u32 + 1);
        ext.1 = ext.1.max(p.y as u32 + 1);
        ext.2 = ext.2.max(p.z as u32 + 1);
    }

    w.write_u32::<LittleEndian>(ext.0)?;
    w.write_u32::<LittleEndian>(ext.1)?;
    w.write_u32::<LittleEndian>(ext.2)?;
    write_pos(w, model.offset)?;

    let mut dense = Vec::with_capacity(ext.0 as usize * ext.1 as usize * ext.2 as usize);
    for x in 0..ext.0 as i32 {
        for y in 0..ext.1 as i32 {
            for z in 0..ext.2 as i32 {
                dense.push(model.get(GridPos::new(x, y, z)).unwrap_or(EMPTY_INDEX));
            }
        }
    }
    w.write_all(&dense)?;

    for c in model.palette.iter() {
        w.write_all(&[c.r, c.g, c.b])?;
    }

    w.write_u8(model.points.len() as u8)?;
    for pt in &model.points {
        let bytes = pt.name.as_bytes();
        if bytes.len() > u8::MAX as usize {
            return Err(VxiError::NameTooLong(pt.name.clone()));
        }
        w.write_u8(bytes.len() as u8)?;
        w.write_all(bytes)?;
        write_pos(w, pt.pos)?;
    }
    Ok(())
}

impl VoxelModel {
    pub fn from_vxi_bytes(bytes: &[u8]) -> Result<Self, VxiError> {
        read_vxi(&mut io::Cursor::new(bytes))
    }

    pub fn to_vxi_bytes(&self) -> Result<Vec<u8>, VxiError> {
        let mut out = Vec::new();
        write_vxi(self, &mut out)?;
        Ok(out)
    }
}
