use voxdae_geom::Vec3;

/// `(vertex_index, normal_index)` as written to an interleaved triangle list.
pub type IndexPair = [u32; 2];

/// Four corners plus the face normal; corners run counter-clockwise seen from outside.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Quad {
    pub normal: Vec3,
    pub corners: [Vec3; 4],
}

impl Quad {
    /// Normal implied by the winding of the first triangle.
    #[inline]
    pub fn winding_normal(&self) -> Vec3 {
        let [a, b, c, _] = self.corners;
        (b - a).cross(c - a)
    }
}

/// Growable position/normal streams. Normals are deduplicated by exact value.
#[derive(Default, Clone, Debug)]
pub struct VertexData {
    pub pos: Vec<f32>,
    pub norm: Vec<f32>,
}

impl VertexData {
    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.pos.len() / 3
    }

    #[inline]
    pub fn normal_count(&self) -> usize {
        self.norm.len() / 3
    }

    #[inline]
    pub fn vertex(&self, i: u32) -> Vec3 {
        let i = i as usize * 3;
        Vec3::new(self.pos[i], self.pos[i + 1], self.pos[i + 2])
    }

    #[inline]
    pub fn normal(&self, i: u32) -> Vec3 {
        let i = i as usize * 3;
        Vec3::new(self.norm[i], self.norm[i + 1], self.norm[i + 2])
    }

    /// Index of `n`, appending it on first use.
    pub fn normal_index(&mut self, n: Vec3) -> u32 {
        let key = n.to_array();
        if let Some(i) = self.norm.chunks_exact(3).position(|c| c == &key[..]) {
            return i as u32;
        }
        self.norm.extend_from_slice(&key);
        (self.normal_count() - 1) as u32
    }

    /// Appends four fresh vertices and returns the two triangles `(v0,v1,v2)` and `(v2,v3,v0)`.
    pub fn push_quad(&mut self, q: &Quad) -> [IndexPair; 6] {
        let base = self.vertex_count() as u32;
        let n = self.normal_index(q.normal);
        for v in &q.corners {
            self.pos.extend_from_slice(&[v.x, v.y, v.z]);
        }
        [
            [base, n],
            [base + 1, n],
            [base + 2, n],
            [base + 2, n],
            [base + 3, n],
            [base, n],
        ]
    }
}

/// Self-contained triangle list with its own vertex and normal streams.
#[derive(Default, Clone, Debug)]
pub struct MeshBuild {
    pub data: VertexData,
    pub idx: Vec<IndexPair>,
}

impl MeshBuild {
    #[inline]
    pub fn add_quad(&mut self, q: &Quad) {
        let tris = self.data.push_quad(q);
        self.idx.extend_from_slice(&tris);
    }

    #[inline]
    pub fn quad_count(&self) -> usize {
        self.idx.len() / 6
    }
}

/// Resolves an index list against vertex data into triangle corner positions and normals.
pub fn triangles<'a>(
    data: &'a VertexData,
    idx: &'a [IndexPair],
) -> impl Iterator<Item = ([Vec3; 3], Vec3)> + 'a {
    idx.chunks_exact(3).map(move |t| {
        (
            [data.vertex(t[0][0]), data.vertex(t[1][0]), data.vertex(t[2][0])],
            data.normal(t[0][1]),
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_quad(normal: Vec3) -> Quad {
        Quad {
            normal,
            corners: [
                Vec3::new(0.0, 0.0, 0.0),
                Vec3::new(1.0, 0.0, 0.0),
                Vec3::new(1.0, 1.0, 0.0),
                Vec3::new(0.0, 1.0, 0.0),
            ],
        }
    }

    #[test]
    fn quad_appends_four_vertices_and_six_pairs() {
        let mut mb = MeshBuild::default();
        mb.add_quad(&unit_quad(Vec3::new(0.0, 0.0, 1.0)));
        mb.add_quad(&unit_quad(Vec3::new(0.0, 0.0, 1.0)));
        assert_eq!(mb.data.vertex_count(), 8);
        assert_eq!(mb.data.normal_count(), 1);
        assert_eq!(mb.quad_count(), 2);
        assert_eq!(
            &mb.idx[6..],
            &[[4, 0], [5, 0], [6, 0], [6, 0], [7, 0], [4, 0]]
        );
    }

    #[test]
    fn normals_are_appended_once() {
        let mut vd = VertexData::default();
        let up = Vec3::new(0.0, 1.0, 0.0);
        let down = Vec3::new(0.0, -1.0, 0.0);
        assert_eq!(vd.normal_index(up), 0);
        assert_eq!(vd.normal_index(down), 1);
        assert_eq!(vd.normal_index(up), 0);
        assert_eq!(vd.normal_count(), 2);
    }

    #[test]
    fn winding_normal_of_ccw_quad_points_out() {
        let q = unit_quad(Vec3::new(0.0, 0.0, 1.0));
        assert!(q.winding_normal().dot(q.normal) > 0.0);
    }

    #[test]
    fn triangles_resolve_shared_normal() {
        let mut mb = MeshBuild::default();
        mb.add_quad(&unit_quad(Vec3::new(0.0, 0.0, 1.0)));
        let tris: Vec<_> = triangles(&mb.data, &mb.idx).collect();
        assert_eq!(tris.len(), 2);
        assert_eq!(tris[1].0[0], Vec3::new(1.0, 1.0, 0.0));
        assert_eq!(tris[1].0[2], Vec3::new(0.0, 0.0, 0.0));
        assert!(tris.iter().all(|(_, n)| *n == Vec3::new(0.0, 0.0, 1.0)));
    }
}
