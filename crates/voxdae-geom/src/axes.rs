//! Axis convention adapter between the voxel grid and the output document.
//!
//! The grid is Z-up; the document is Y-up with the X axis mirrored. The mapping swaps Y and Z
//! and negates X. It is its own inverse and has determinant +1, so triangle winding survives it.

use crate::{GridPos, Vec3};

/// Maps native grid coordinates to output coordinates: `(x, y, z) -> (-x, z, y)`.
#[inline]
pub const fn to_output(p: (i32, i32, i32)) -> (i32, i32, i32) {
    (-p.0, p.2, p.1)
}

/// Inverse of [`to_output`].
#[inline]
pub const fn to_native(p: (i32, i32, i32)) -> (i32, i32, i32) {
    (-p.0, p.2, p.1)
}

#[inline]
pub const fn grid_to_output(p: GridPos) -> GridPos {
    let (x, y, z) = to_output((p.x, p.y, p.z));
    GridPos::new(x, y, z)
}

#[inline]
pub fn vec_to_output(v: Vec3) -> Vec3 {
    Vec3::new(-v.x, v.z, v.y)
}

#[inline]
pub fn vec_to_native(v: Vec3) -> Vec3 {
    Vec3::new(-v.x, v.z, v.y)
}
