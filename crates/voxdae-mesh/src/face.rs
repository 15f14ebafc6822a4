use voxdae_geom::Vec3;
use voxdae_geom::axes;

/// Output-space cube faces, in the order they are emitted for each voxel.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum Face {
    PosY = 0,
    NegY = 1,
    PosZ = 2,
    NegZ = 3,
    PosX = 4,
    NegX = 5,
}

impl Face {
    pub const ALL: [Face; 6] = [
        Face::PosY,
        Face::NegY,
        Face::PosZ,
        Face::NegZ,
        Face::PosX,
        Face::NegX,
    ];

    /// Returns the `[0..6)` index of this face.
    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    /// Returns the unit-normal vector for this face.
    #[inline]
    pub fn normal(self) -> Vec3 {
        let (x, y, z) = self.delta();
        Vec3::new(x as f32, y as f32, z as f32)
    }

    /// Returns the output-space step `(dx,dy,dz)` when leaving through this face.
    #[inline]
    pub fn delta(self) -> (i32, i32, i32) {
        match self {
            Face::PosY => (0, 1, 0),
            Face::NegY => (0, -1, 0),
            Face::PosZ => (0, 0, 1),
            Face::NegZ => (0, 0, -1),
            Face::PosX => (1, 0, 0),
            Face::NegX => (-1, 0, 0),
        }
    }

    /// Same step expressed in native grid coordinates; used for occupancy tests.
    #[inline]
    pub fn native_delta(self) -> (i32, i32, i32) {
        axes::to_native(self.delta())
    }

    /// Indices into the box corner table (bit0 = max x, bit1 = max y, bit2 = max z),
    /// counter-clockwise when seen from outside.
    #[inline]
    pub fn corners(self) -> [usize; 4] {
        match self {
            Face::PosY => [2, 6, 7, 3],
            Face::NegY => [0, 1, 5, 4],
            Face::PosZ => [4, 5, 7, 6],
            Face::NegZ => [0, 2, 3, 1],
            Face::PosX => [1, 3, 7, 5],
            Face::NegX => [0, 4, 6, 2],
        }
    }
}
