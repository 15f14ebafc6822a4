use hashbrown::HashMap;
use voxdae_model::Rgb;

use crate::emit::{MaterialKey, QuadSink};
use crate::mesh_build::{IndexPair, MeshBuild, Quad, VertexData};

/// Per-color accumulator. Holds a standalone build with local indices and the index
/// list into the model-wide shared buffer.
#[derive(Clone, Debug)]
pub struct MaterialSet {
    pub color: Rgb,
    /// Palette index of the voxel that created this set; names the material.
    pub label: u8,
    pub build: MeshBuild,
    pub shared_idx: Vec<IndexPair>,
}

impl MaterialSet {
    fn new(key: MaterialKey) -> Self {
        Self {
            color: key.color,
            label: key.palette_index,
            build: MeshBuild::default(),
            shared_idx: Vec::new(),
        }
    }

    #[inline]
    pub fn quad_count(&self) -> usize {
        self.build.quad_count()
    }

    /// Diffuse color in `[0, 1]`.
    #[inline]
    pub fn diffuse(&self) -> [f32; 3] {
        self.color.to_unit()
    }
}

/// Output of one meshing pass: the merged vertex/normal buffer plus one material set per
/// distinct color, in first-encounter order.
#[derive(Default, Clone, Debug)]
pub struct ModelMesh {
    shared: VertexData,
    sets: Vec<MaterialSet>,
    by_color: HashMap<Rgb, usize>,
}

impl ModelMesh {
    pub fn new() -> Self {
        Self::default()
    }

    /// Model-wide positions and normals; indexed by every set's `shared_idx`.
    #[inline]
    pub fn shared(&self) -> &VertexData {
        &self.shared
    }

    #[inline]
    pub fn sets(&self) -> &[MaterialSet] {
        &self.sets
    }

    pub fn set_for(&self, color: Rgb) -> Option<&MaterialSet> {
        self.by_color.get(&color).map(|&i| &self.sets[i])
    }

    pub fn quad_count(&self) -> usize {
        self.sets.iter().map(MaterialSet::quad_count).sum()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.sets.is_empty()
    }

    fn set_mut(&mut self, key: MaterialKey) -> &mut MaterialSet {
        let ix = match self.by_color.get(&key.color) {
            Some(&ix) => ix,
            None => {
                let ix = self.sets.len();
                self.sets.push(MaterialSet::new(key));
                self.by_color.insert(key.color, ix);
                log::trace!(
                    "material set {} for rgb({}, {}, {})",
                    key.palette_index,
                    key.color.r,
                    key.color.g,
                    key.color.b
                );
                ix
            }
        };
        &mut self.sets[ix]
    }
}

impl QuadSink for ModelMesh {
    fn add_quad(&mut self, key: MaterialKey, quad: &Quad) {
        let tris = self.shared.push_quad(quad);
        let set = self.set_mut(key);
        set.build.add_quad(quad);
        set.shared_idx.extend_from_slice(&tris);
    }
}
