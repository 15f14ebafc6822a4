use std::collections::HashMap;

use voxdae_geom::Vec3;
use voxdae_model::Rgb;

use crate::face::Face;
use crate::mesh_build::{MeshBuild, Quad};

/// Identifies the material a quad belongs to: the exact voxel color, plus the palette
/// index of the voxel that produced it (used to label the material on first sight).
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct MaterialKey {
    pub color: Rgb,
    pub palette_index: u8,
}

/// Receives every emitted quad with its material.
pub trait QuadSink {
    fn add_quad(&mut self, key: MaterialKey, quad: &Quad);
}

impl QuadSink for HashMap<Rgb, MeshBuild> {
    #[inline]
    fn add_quad(&mut self, key: MaterialKey, quad: &Quad) {
        self.entry(key.color).or_default().add_quad(quad);
    }
}

impl QuadSink for Vec<(MaterialKey, Quad)> {
    #[inline]
    fn add_quad(&mut self, key: MaterialKey, quad: &Quad) {
        self.push((key, *quad));
    }
}

/// The eight corners of an axis-aligned box; bit0/bit1/bit2 of the index select max x/y/z.
#[inline]
pub fn box_corners(min: Vec3, max: Vec3) -> [Vec3; 8] {
    std::array::from_fn(|i| {
        Vec3::new(
            if i & 1 != 0 { max.x } else { min.x },
            if i & 2 != 0 { max.y } else { min.y },
            if i & 4 != 0 { max.z } else { min.z },
        )
    })
}

/// Emits the faces of a box for which `visible` returns true. Returns the number emitted.
#[inline]
pub fn emit_box_faces(
    sink: &mut impl QuadSink,
    key: MaterialKey,
    min: Vec3,
    max: Vec3,
    mut visible: impl FnMut(Face) -> bool,
) -> usize {
    let corners = box_corners(min, max);
    let mut emitted = 0;
    for face in Face::ALL {
        if !visible(face) {
            continue;
        }
        let [a, b, c, d] = face.corners();
        let quad = Quad {
            normal: face.normal(),
            corners: [corners[a], corners[b], corners[c], corners[d]],
        };
        sink.add_quad(key, &quad);
        emitted += 1;
    }
    emitted
}
