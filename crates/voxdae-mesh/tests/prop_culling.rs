use std::collections::{BTreeMap, BTreeSet};

use proptest::prelude::*;
use voxdae_geom::GridPos;
use voxdae_mesh::{MaterialKey, MeshParams, Quad, build_model_mesh, mesh_voxels};
use voxdae_model::{Rgb, VoxelModel, VoxelSource};

fn arb_model() -> impl Strategy<Value = VoxelModel> {
    let cell = ((-3i32..3, -3i32..3, -3i32..3), 0u8..4);
    (
        prop::collection::btree_map(cell.0, cell.1, 0..60),
        (-5i32..5, -5i32..5, -5i32..5),
    )
        .prop_map(|(cells, off)| {
            let mut m = VoxelModel::new();
            m.offset = GridPos::from(off);
            // Slots 0 and 3 share a color.
            m.palette.set(0, Rgb::new(200, 10, 10));
            m.palette.set(1, Rgb::new(10, 200, 10));
            m.palette.set(2, Rgb::new(10, 10, 200));
            m.palette.set(3, Rgb::new(200, 10, 10));
            for (p, v) in cells {
                m.set(GridPos::from(p), v);
            }
            m
        })
}

const NATIVE_STEPS: [(i32, i32, i32); 6] = [
    (1, 0, 0),
    (-1, 0, 0),
    (0, 1, 0),
    (0, -1, 0),
    (0, 0, 1),
    (0, 0, -1),
];

fn exposed_faces_by_color(m: &VoxelModel) -> BTreeMap<Rgb, usize> {
    let mut out = BTreeMap::new();
    for (p, v) in m.voxels() {
        let n = NATIVE_STEPS
            .iter()
            .filter(|d| !m.is_solid(p.offset(**d)))
            .count();
        if n > 0 {
            *out.entry(m.color(v)).or_insert(0) += n;
        }
    }
    out
}

proptest! {
    // Emitted quads per color equal the (voxel, direction) pairs facing an empty cell.
    #[test]
    fn quads_match_exposed_faces(m in arb_model()) {
        let mesh = build_model_mesh(&m, &MeshParams::default());
        let want = exposed_faces_by_color(&m);
        let got: BTreeMap<Rgb, usize> =
            mesh.sets().iter().map(|s| (s.color, s.quad_count())).collect();
        prop_assert_eq!(got, want);
    }

    // Buffer sizes follow the quad count and normals never repeat.
    #[test]
    fn buffer_invariants(m in arb_model()) {
        let mesh = build_model_mesh(&m, &MeshParams::default());
        let quads = mesh.quad_count();
        prop_assert_eq!(mesh.shared().vertex_count(), quads * 4);
        prop_assert!(mesh.shared().normal_count() <= 6);
        let uniq: BTreeSet<[u32; 3]> = mesh.shared().norm.chunks_exact(3)
            .map(|c| [c[0].to_bits(), c[1].to_bits(), c[2].to_bits()])
            .collect();
        prop_assert_eq!(uniq.len(), mesh.shared().normal_count());
        for set in mesh.sets() {
            prop_assert_eq!(set.build.idx.len(), set.quad_count() * 6);
            prop_assert_eq!(set.shared_idx.len(), set.quad_count() * 6);
            prop_assert_eq!(set.build.data.vertex_count(), set.quad_count() * 4);
            prop_assert!(set.build.data.normal_count() <= 6);
            let max_v = set.shared_idx.iter().map(|p| p[0]).max().unwrap_or(0) as usize;
            prop_assert!(max_v < mesh.shared().vertex_count());
        }
    }

    // Every quad is a unit square (times scale) wound toward its normal.
    #[test]
    fn quads_are_outward_squares(m in arb_model(), scale in 0.25f32..4.0) {
        let params = MeshParams { scale, ..MeshParams::default() };
        let mut quads: Vec<(MaterialKey, Quad)> = Vec::new();
        mesh_voxels(&m, &params, &mut quads);
        let area: f32 = quads.iter().map(|(_, q)| q.winding_normal().length()).sum();
        let want = quads.len() as f32 * scale * scale;
        prop_assert!((area - want).abs() <= 1e-3 * want.max(1.0));
        for (key, q) in &quads {
            prop_assert!(q.winding_normal().dot(q.normal) > 0.0);
            prop_assert_eq!(m.color(key.palette_index), key.color);
        }
    }
}
