//! Voxel model source: sparse grid, palette and anchor points.
#![forbid(unsafe_code)]

use std::collections::BTreeMap;

use voxdae_geom::GridPos;

pub mod vxi;

pub use vxi::{VxiError, read_vxi, write_vxi};

/// Palette slot that marks an empty cell in the dense on-disk layout.
pub const EMPTY_INDEX: u8 = 255;
pub const PALETTE_LEN: usize = 256;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    #[inline]
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Channels scaled into `[0, 1]`.
    #[inline]
    pub fn to_unit(self) -> [f32; 3] {
        [
            self.r as f32 / 255.0,
            self.g as f32 / 255.0,
            self.b as f32 / 255.0,
        ]
    }
}

/// Fixed 256-entry color table; every `u8` is a valid index.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Palette {
    colors: Box<[Rgb; PALETTE_LEN]>,
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            colors: Box::new([Rgb::default(); PALETTE_LEN]),
        }
    }
}

impl Palette {
    #[inline]
    pub fn get(&self, index: u8) -> Rgb {
        self.colors[index as usize]
    }

    #[inline]
    pub fn set(&mut self, index: u8, color: Rgb) {
        self.colors[index as usize] = color;
    }

    pub fn iter(&self) -> impl Iterator<Item = Rgb> + '_ {
        self.colors.iter().copied()
    }
}

/// Named reference position carried through to the scene as a transform-only node.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AnchorPoint {
    pub name: String,
    pub pos: GridPos,
}

impl AnchorPoint {
    pub fn new(name: impl Into<String>, pos: GridPos) -> Self {
        Self {
            name: name.into(),
            pos,
        }
    }
}

/// Read-only view of a voxel model as consumed by the mesher and scene assembly.
pub trait VoxelSource {
    /// Occupied cells with their palette index.
    fn voxels(&self) -> impl Iterator<Item = (GridPos, u8)> + '_;
    fn is_solid(&self, pos: GridPos) -> bool;
    fn color(&self, index: u8) -> Rgb;
    /// Grid origin in native coordinates.
    fn offset(&self) -> GridPos;
    fn points(&self) -> &[AnchorPoint];
}

/// In-memory voxel model. Cells live in an ordered map so traversal is stable.
#[derive(Clone, Debug, Default)]
pub struct VoxelModel {
    pub offset: GridPos,
    pub palette: Palette,
    pub blocks: BTreeMap<GridPos, u8>,
    pub points: Vec<AnchorPoint>,
}

impl VoxelModel {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn set(&mut self, pos: GridPos, index: u8) {
        self.blocks.insert(pos, index);
    }

    #[inline]
    pub fn remove(&mut self, pos: GridPos) -> Option<u8> {
        self.blocks.remove(&pos)
    }

    #[inline]
    pub fn get(&self, pos: GridPos) -> Option<u8> {
        self.blocks.get(&pos).copied()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Inclusive min/max corners of the occupied cells, or `None` when empty.
    pub fn bounds(&self) -> Option<(GridPos, GridPos)> {
        let mut it = self.blocks.keys();
        let first = *it.next()?;
        Some(it.fold((first, first), |(lo, hi), p| {
            (
                GridPos::new(lo.x.min(p.x), lo.y.min(p.y), lo.z.min(p.z)),
                GridPos::new(hi.x.max(p.x), hi.y.max(p.y), hi.z.max(p.z)),
            )
        }))
    }
}

impl VoxelSource for VoxelModel {
    fn voxels(&self) -> impl Iterator<Item = (GridPos, u8)> + '_ {
        self.blocks.iter().map(|(p, v)| (*p, *v))
    }

    #[inline]
    fn is_solid(&self, pos: GridPos) -> bool {
        self.blocks.contains_key(&pos)
    }

    #[inline]
    fn color(&self, index: u8) -> Rgb {
        self.palette.get(index)
    }

    #[inline]
    fn offset(&self) -> GridPos {
        self.offset
    }

    fn points(&self) -> &[AnchorPoint] {
        &self.points
    }
}
