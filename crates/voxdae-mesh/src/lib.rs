//! CPU face-culling mesher for voxel models (no quad merging).
#![forbid(unsafe_code)]

use std::time::Instant;

use voxdae_geom::{Vec3, axes};
use voxdae_model::VoxelSource;

mod emit;
mod face;
mod material;
mod mesh_build;

pub use emit::{MaterialKey, QuadSink, box_corners, emit_box_faces};
pub use face::Face;
pub use material::{MaterialSet, ModelMesh};
pub use mesh_build::{IndexPair, MeshBuild, Quad, VertexData, triangles};

/// Placement of the emitted geometry: every voxel is a cube of edge `scale`, shifted by `origin`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MeshParams {
    pub scale: f32,
    pub origin: Vec3,
}

impl Default for MeshParams {
    fn default() -> Self {
        Self {
            scale: 1.0,
            origin: Vec3::ZERO,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MeshStats {
    pub voxels: usize,
    pub quads: usize,
    pub culled: usize,
}

/// Walks every occupied voxel and emits one quad per face whose native neighbor is empty.
///
/// Occupancy is tested in native grid coordinates; corners are built after the axis
/// transform, offset by the model origin (shifted one cell along output X to account for
/// the mirrored axis).
pub fn mesh_voxels<S: VoxelSource>(
    src: &S,
    params: &MeshParams,
    sink: &mut impl QuadSink,
) -> MeshStats {
    let t0 = Instant::now();
    let off = axes::grid_to_output(src.offset());
    let base = Vec3::new((off.x - 1) as f32, off.y as f32, off.z as f32);
    let s = params.scale;

    let mut stats = MeshStats::default();
    for (pos, v) in src.voxels() {
        let cell = axes::grid_to_output(pos).as_vec3() + base;
        let min = cell * s + params.origin;
        let max = (cell + Vec3::splat(1.0)) * s + params.origin;
        let key = MaterialKey {
            color: src.color(v),
            palette_index: v,
        };
        let n = emit_box_faces(sink, key, min, max, |face| {
            !src.is_solid(pos.offset(face.native_delta()))
        });
        stats.voxels += 1;
        stats.quads += n;
        stats.culled += 6 - n;
    }

    let ms = t0.elapsed().as_millis();
    log::info!(target: "perf", "ms={} mesher_cull voxels={} quads={} culled={}", ms, stats.voxels, stats.quads, stats.culled);
    stats
}

/// Meshes a whole model into per-material sets plus the shared buffer.
pub fn build_model_mesh<S: VoxelSource>(src: &S, params: &MeshParams) -> ModelMesh {
    let mut mesh = ModelMesh::new();
    let stats = mesh_voxels(src, params, &mut mesh);
    log::debug!(
        "meshed {} voxels into {} quads across {} materials",
        stats.voxels,
        stats.quads,
        mesh.sets().len()
    );
    mesh
}
